//! Helical trajectory of a charged particle in a homogeneous magnetic field.

use crate::config::CURVATURE_THRESHOLD;
use crate::geom::{Point3, Scalar, Vector3};

#[cfg(test)]
mod tests {

    use super::*;
    use crate::geom::perp;

    const TOL: Scalar = 1e-9;

    #[test]
    fn straight_line_without_field() {
        let h = Helix::new(
            Point3::new(1.0, 2.0, 3.0),
            Vector3::new(0.0, 3.0, 4.0),
            -1.0,
            Vector3::zeros(),
        );
        assert!(h.is_straight());
        let p = h.pos(10.0);
        assert!((p - Point3::new(1.0, 8.0, 11.0)).norm() < TOL);
        assert!((h.dir(10.0) - Vector3::new(0.0, 0.6, 0.8)).norm() < TOL);
    }

    #[test]
    fn circle_in_transverse_plane() {
        // qop = 0.5 in a field of 2 gives a unit radius
        let b = Vector3::new(0.0, 0.0, 2.0);
        let h = Helix::new(Point3::origin(), Vector3::x(), 0.5, b);
        let radius = h.radius();
        assert!((radius - 1.0).abs() < TOL);

        // Half a turn later the particle is back on the y axis, travelling in -x
        let s = std::f64::consts::PI * radius;
        let p = h.pos(s);
        assert!(p.x.abs() < TOL);
        assert!((p.y.abs() - 2.0 * radius).abs() < TOL);
        assert!((h.dir(s) + Vector3::x()).norm() < TOL);

        // The transverse distance to the circle centre stays constant
        let centre = Point3::new(0.0, p.y / 2.0, 0.0);
        for i in 0..20 {
            let s = i as Scalar * 0.37;
            assert!((perp(&(h.pos(s) - centre)) - radius).abs() < TOL);
            assert!((h.dir(s).norm() - 1.0).abs() < TOL);
        }
    }

    #[test]
    fn pitch_advances_along_field() {
        let b = Vector3::new(0.0, 0.0, 1.0);
        let dir = Vector3::new(1.0, 0.0, 1.0);
        let h = Helix::new(Point3::origin(), dir, 0.1, b);
        // Longitudinal motion is uniform
        let s = 3.0;
        assert!((h.pos(s).z - s / 2f64.sqrt()).abs() < TOL);
    }

    #[test]
    fn direction_along_field_stays_straight() {
        let b = Vector3::new(0.0, 0.0, 2.0);
        let h = Helix::new(Point3::new(5.0, 0.0, 0.0), Vector3::z(), 1.0, b);
        let d = h.dir(7.0);
        assert_eq!(d.x, 0.0);
        assert_eq!(d.y, 0.0);
        assert!((h.pos(7.0) - Point3::new(5.0, 0.0, 7.0)).norm() < TOL);
    }
}

/// Helix parametrised by its arc length `s`.
///
/// The particle starts at `pos` with direction `dir` and bends around the
/// magnetic field with curvature `K = -qop * |B|`. A vanishing field or
/// charge gives a straight line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Helix {
    origin: Point3,
    /// Unit vector along the field
    h0: Vector3,
    /// Unit tangent at s = 0
    t0: Vector3,
    /// h0 x t0, its norm is the sine of the pitch angle
    n0: Vector3,
    /// Signed curvature
    k: Scalar,
    /// Cosine between field and initial tangent
    delta: Scalar,
}

impl Helix {
    pub fn new(pos: Point3, dir: Vector3, qop: Scalar, b_field: Vector3) -> Self {
        let b = b_field.norm();
        let t0 = dir.normalize();
        let h0 = if b > 0.0 { b_field / b } else { t0 };

        Self {
            origin: pos,
            h0,
            t0,
            n0: h0.cross(&t0),
            k: -qop * b,
            delta: h0.dot(&t0),
        }
    }

    pub fn is_straight(&self) -> bool {
        self.k.abs() < CURVATURE_THRESHOLD
    }

    pub fn curvature(&self) -> Scalar {
        self.k
    }

    /// Radius of the helix projected onto the plane transverse to the field.
    pub fn radius(&self) -> Scalar {
        if self.is_straight() {
            Scalar::INFINITY
        } else {
            (1.0 - self.delta * self.delta).sqrt() / self.k.abs()
        }
    }

    pub fn pos0(&self) -> Point3 {
        self.origin
    }

    pub fn dir0(&self) -> Vector3 {
        self.t0
    }

    /// Position after the arc length `s`.
    pub fn pos(&self, s: Scalar) -> Point3 {
        if self.is_straight() {
            return self.origin + s * self.t0;
        }

        let ks = self.k * s;
        let (sin_ks, cos_ks) = ks.sin_cos();

        self.origin
            + self.delta * (ks - sin_ks) / self.k * self.h0
            + sin_ks / self.k * self.t0
            + (1.0 - cos_ks) / self.k * self.n0
    }

    /// Unit tangent after the arc length `s`.
    pub fn dir(&self, s: Scalar) -> Vector3 {
        if self.is_straight() {
            return self.t0;
        }

        let (sin_ks, cos_ks) = (self.k * s).sin_cos();

        self.delta * (1.0 - cos_ks) * self.h0 + cos_ks * self.t0 + sin_ks * self.n0
    }
}
