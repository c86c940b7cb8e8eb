//! Surface and volume boundaries.
//!
//! A [`Mask`] restricts an unbounded surface (plane, cylinder, line) to a
//! finite extent. It stores the boundary values of its [`Shape`] and the
//! index of the volume a track reaches when it crosses the surface.

use std::fmt;
use std::ops::Index;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::config::RADIAL_TOLERANCE;
use crate::frames::FrameId;
use crate::geom::{perp, phi, Point3, Scalar};
use crate::intersection::Status;

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn rectangle_status() {
        let mask = Mask::new(Shape::Rectangle2, &[2.0, 3.0], Some(1));
        assert_eq!(mask.is_inside(&Point3::new(1.0, -2.0, 0.0), 0.0), Status::Inside);
        assert_eq!(mask.is_inside(&Point3::new(2.05, 0.0, 0.0), 0.0), Status::Outside);
        assert_eq!(
            mask.is_inside(&Point3::new(2.05, 0.0, 0.0), 0.1),
            Status::OnBoundary
        );
        assert_eq!(mask.volume_link(), Some(1));
    }

    #[test]
    fn trapezoid_widens_with_y() {
        let mask = Mask::new(Shape::Trapezoid2, &[1.0, 3.0, 2.0], None);
        assert_eq!(mask.is_inside(&Point3::new(2.5, 1.9, 0.0), 0.0), Status::Inside);
        assert_eq!(mask.is_inside(&Point3::new(2.5, -1.9, 0.0), 0.0), Status::Outside);
    }

    #[test]
    fn cylinder_radial_check() {
        let mask = Mask::new(Shape::Cylinder2, &[5.0, -10.0, 10.0], None);
        // Off the cylinder, but the plain check only looks at z
        let p = Point3::new(4.0, 0.0, 1.0);
        assert_eq!(mask.is_inside(&p, 0.0), Status::Inside);
        assert_eq!(mask.is_inside_radially(&p, 0.0), Status::Outside);

        let on = Point3::new(0.0, 5.0 + 0.5 * RADIAL_TOLERANCE, 1.0);
        assert_eq!(mask.is_inside_radially(&on, 0.0), Status::Inside);
        let beyond_z = Point3::new(0.0, 5.0, 10.5);
        assert_eq!(mask.is_inside_radially(&beyond_z, 0.0), Status::Outside);
        assert_eq!(mask.is_inside_radially(&beyond_z, 1.0), Status::OnBoundary);
    }

    #[test]
    fn ring_and_annulus() {
        let ring = Mask::new(Shape::Ring2, &[1.0, 4.0], None);
        assert_eq!(ring.is_inside(&Point3::new(0.0, 2.0, 0.0), 0.0), Status::Inside);
        assert_eq!(ring.is_inside(&Point3::new(0.5, 0.0, 0.0), 0.0), Status::Outside);

        let annulus = Mask::new(Shape::Annulus2, &[1.0, 4.0, -0.5, 0.5], None);
        assert_eq!(annulus.is_inside(&Point3::new(2.0, 0.1, 0.0), 0.0), Status::Inside);
        assert_eq!(annulus.is_inside(&Point3::new(0.0, 2.0, 0.0), 0.0), Status::Outside);
    }

    #[test]
    fn volume_shapes() {
        let cuboid = Mask::new(Shape::Cuboid3, &[-1.0, -1.0, -1.0, 1.0, 1.0, 1.0], None);
        assert_eq!(cuboid.is_inside(&Point3::new(0.5, 0.5, -0.5), 0.0), Status::Inside);
        assert_eq!(cuboid.is_inside(&Point3::new(0.5, 1.5, -0.5), 0.0), Status::Outside);

        let cylinder = Mask::new(
            Shape::Cylinder3,
            &[1.0, -std::f64::consts::PI, -5.0, 3.0, std::f64::consts::PI, 5.0],
            None,
        );
        assert_eq!(cylinder.is_inside(&Point3::new(2.0, 0.0, 4.0), 0.0), Status::Inside);
        assert_eq!(cylinder.is_inside(&Point3::new(0.5, 0.0, 4.0), 0.0), Status::Outside);
    }

    #[test]
    fn self_check_rejects_bad_values() {
        assert!(Mask::new(Shape::Cylinder2, &[5.0, -10.0, 10.0], None)
            .self_check()
            .is_ok());
        assert!(Mask::new(Shape::Cylinder2, &[5.0, -10.0], None)
            .self_check()
            .is_err());
        assert!(Mask::new(Shape::Cylinder2, &[-5.0, -10.0, 10.0], None)
            .self_check()
            .is_err());
        assert!(Mask::new(Shape::Ring2, &[4.0, 1.0], None).self_check().is_err());
        assert!(Mask::new(Shape::Single2, &[0.0, 1.0], None).self_check().is_ok());
        assert!(Mask::new(Shape::Rectangle2, &[Scalar::NAN, 1.0], None)
            .self_check()
            .is_err());
    }

    #[test]
    fn display() {
        let mask = Mask::new(Shape::Rectangle2, &[2.0, 3.0], None);
        assert_eq!(mask.to_string(), "rectangle2 [2, 3] -> vol none");
    }
}

/// Maximum number of boundary values of any shape.
pub const MAX_MASK_VALUES: usize = 6;

/// Closed set of boundary shapes.
///
/// Boundary values per shape:
/// - `Annulus2`: min r, max r, min phi, max phi
/// - `Cuboid3`: min x, min y, min z, max x, max y, max z
/// - `Cylinder2`, `ConcentricCylinder2`: r, lower z, upper z
/// - `Cylinder3`: min r, min phi, min z, max r, max phi, max z
/// - `Rectangle2`: half x, half y
/// - `Ring2`: inner r, outer r
/// - `Trapezoid2`: half x at -half y, half x at +half y, half y
/// - `WireCell`: half cell size, half z
/// - `StrawTube`: radius, half z
/// - `Single1..3`: lower, upper bound on the first/second/third coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shape {
    Annulus2,
    Cuboid3,
    Cylinder2,
    Cylinder3,
    ConcentricCylinder2,
    Rectangle2,
    Ring2,
    Trapezoid2,
    WireCell,
    StrawTube,
    Single1,
    Single2,
    Single3,
}

impl Shape {
    pub const ALL: [Shape; 13] = [
        Shape::Annulus2,
        Shape::Cuboid3,
        Shape::Cylinder2,
        Shape::Cylinder3,
        Shape::ConcentricCylinder2,
        Shape::Rectangle2,
        Shape::Ring2,
        Shape::Trapezoid2,
        Shape::WireCell,
        Shape::StrawTube,
        Shape::Single1,
        Shape::Single2,
        Shape::Single3,
    ];

    /// Local frame in which the boundaries are expressed. Line and single
    /// value shapes are checked in the local cartesian frame.
    pub fn frame(&self) -> FrameId {
        match self {
            Shape::Annulus2 | Shape::Ring2 => FrameId::Polar2,
            Shape::Rectangle2 | Shape::Trapezoid2 => FrameId::Cartesian2,
            Shape::Cylinder2 => FrameId::Cylindrical2,
            Shape::ConcentricCylinder2 => FrameId::ConcentricCylindrical2,
            Shape::Cylinder3 => FrameId::Cylindrical3,
            Shape::Cuboid3
            | Shape::WireCell
            | Shape::StrawTube
            | Shape::Single1
            | Shape::Single2
            | Shape::Single3 => FrameId::Cartesian3,
        }
    }

    pub fn n_values(&self) -> usize {
        match self {
            Shape::Annulus2 => 4,
            Shape::Cuboid3 | Shape::Cylinder3 => 6,
            Shape::Cylinder2 | Shape::ConcentricCylinder2 | Shape::Trapezoid2 => 3,
            Shape::Rectangle2
            | Shape::Ring2
            | Shape::WireCell
            | Shape::StrawTube
            | Shape::Single1
            | Shape::Single2
            | Shape::Single3 => 2,
        }
    }

    /// Whether the shape is the lateral face of a cylinder.
    pub fn is_cylinder(&self) -> bool {
        matches!(self, Shape::Cylinder2 | Shape::ConcentricCylinder2)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Shape::Annulus2 => "annulus2",
            Shape::Cuboid3 => "cuboid3",
            Shape::Cylinder2 => "cylinder2",
            Shape::Cylinder3 => "cylinder3",
            Shape::ConcentricCylinder2 => "concentric_cylinder2",
            Shape::Rectangle2 => "rectangle2",
            Shape::Ring2 => "ring2",
            Shape::Trapezoid2 => "trapezoid2",
            Shape::WireCell => "wire_cell",
            Shape::StrawTube => "straw_tube",
            Shape::Single1 => "single1",
            Shape::Single2 => "single2",
            Shape::Single3 => "single3",
        }
    }
}

/// Boundary values of a shape and the volume behind the surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mask {
    pub shape: Shape,
    values: [Scalar; MAX_MASK_VALUES],
    n_values: usize,
    volume_link: Option<usize>,
}

impl Index<usize> for Mask {
    type Output = Scalar;

    fn index(&self, i: usize) -> &Scalar {
        &self.values()[i]
    }
}

impl Mask {
    /// Extra values beyond [`MAX_MASK_VALUES`] are dropped, which the self
    /// check then reports as a wrong number of values.
    pub fn new(shape: Shape, values: &[Scalar], volume_link: Option<usize>) -> Self {
        let mut stored = [0.0; MAX_MASK_VALUES];
        let n_values = values.len().min(MAX_MASK_VALUES);
        stored[..n_values].copy_from_slice(&values[..n_values]);

        Self {
            shape,
            values: stored,
            n_values: values.len(),
            volume_link,
        }
    }

    pub fn values(&self) -> &[Scalar] {
        &self.values[..self.n_values.min(MAX_MASK_VALUES)]
    }

    /// Index of the volume a track enters through this boundary, `None` if
    /// it leaves the detector.
    pub fn volume_link(&self) -> Option<usize> {
        self.volume_link
    }

    /// First boundary value, which is the radius of cylindrical shapes.
    pub fn radius(&self) -> Scalar {
        self.values[0]
    }

    /// Status of a point given in the local cartesian frame of the mask.
    /// Points outside but within `tolerance` of the boundary are on the
    /// boundary. The radial distance to cylinders is not checked.
    pub fn is_inside(&self, local3: &Point3, tolerance: Scalar) -> Status {
        self.status(local3, tolerance, false)
    }

    /// As [`Mask::is_inside`], but points on cylinders must also lie on the
    /// cylinder radius, up to [`RADIAL_TOLERANCE`] plus `tolerance`.
    pub fn is_inside_radially(&self, local3: &Point3, tolerance: Scalar) -> Status {
        self.status(local3, tolerance, true)
    }

    fn status(&self, local3: &Point3, tolerance: Scalar, radial: bool) -> Status {
        if self.contains(local3, 0.0, radial) {
            Status::Inside
        } else if tolerance > 0.0 && self.contains(local3, tolerance, radial) {
            Status::OnBoundary
        } else {
            Status::Outside
        }
    }

    fn contains(&self, p: &Point3, tol: Scalar, radial: bool) -> bool {
        let v = &self.values;
        let in_range = |x: Scalar, lower: Scalar, upper: Scalar| lower - tol <= x && x <= upper + tol;
        let in_phi = |phi: Scalar, r: Scalar, lower: Scalar, upper: Scalar| {
            let dphi = if r > 0.0 { tol / r } else { 0.0 };
            lower - dphi <= phi && phi <= upper + dphi
        };

        match self.shape {
            Shape::Rectangle2 => p.x.abs() <= v[0] + tol && p.y.abs() <= v[1] + tol,
            Shape::Trapezoid2 => {
                let half_x = v[0] + (p.y + v[2]) * (v[1] - v[0]) / (2.0 * v[2]);
                p.y.abs() <= v[2] + tol && p.x.abs() <= half_x + tol
            }
            Shape::Ring2 => in_range(perp(&p.coords), v[0], v[1]),
            Shape::Annulus2 => {
                let r = perp(&p.coords);
                in_range(r, v[0], v[1]) && in_phi(phi(&p.coords), r, v[2], v[3])
            }
            Shape::Cylinder2 | Shape::ConcentricCylinder2 => {
                let on_radius =
                    !radial || (perp(&p.coords) - v[0]).abs() <= tol + RADIAL_TOLERANCE;
                on_radius && in_range(p.z, v[1], v[2])
            }
            Shape::Cylinder3 => {
                let r = perp(&p.coords);
                in_range(r, v[0], v[3])
                    && in_phi(phi(&p.coords), r, v[1], v[4])
                    && in_range(p.z, v[2], v[5])
            }
            Shape::Cuboid3 => {
                in_range(p.x, v[0], v[3]) && in_range(p.y, v[1], v[4]) && in_range(p.z, v[2], v[5])
            }
            Shape::WireCell => {
                p.x.abs() <= v[0] + tol && p.y.abs() <= v[0] + tol && p.z.abs() <= v[1] + tol
            }
            Shape::StrawTube => perp(&p.coords) <= v[0] + tol && p.z.abs() <= v[1] + tol,
            Shape::Single1 => in_range(p.x, v[0], v[1]),
            Shape::Single2 => in_range(p.y, v[0], v[1]),
            Shape::Single3 => in_range(p.z, v[0], v[1]),
        }
    }

    /// Checks that the boundary values describe a valid shape.
    pub fn self_check(&self) -> Result<(), String> {
        if self.n_values != self.shape.n_values() {
            return Err(format!(
                "{} mask needs {} boundary values, found {}",
                self.shape.name(),
                self.shape.n_values(),
                self.n_values
            ));
        }
        if let Some(v) = self.values().iter().find(|v| !v.is_finite()) {
            return Err(format!("{} mask has non-finite boundary value {}", self.shape.name(), v));
        }

        let v = self.values();
        let ordered = |lower: usize, upper: usize| v[lower] < v[upper];
        let ok = match self.shape {
            Shape::Rectangle2 => v[0] > 0.0 && v[1] > 0.0,
            Shape::Trapezoid2 => v[0] >= 0.0 && v[1] >= 0.0 && v[2] > 0.0,
            Shape::Ring2 => v[0] >= 0.0 && ordered(0, 1),
            Shape::Annulus2 => v[0] >= 0.0 && ordered(0, 1) && ordered(2, 3),
            Shape::Cylinder2 | Shape::ConcentricCylinder2 => v[0] > 0.0 && ordered(1, 2),
            Shape::Cylinder3 => v[0] >= 0.0 && ordered(0, 3) && ordered(1, 4) && ordered(2, 5),
            Shape::Cuboid3 => ordered(0, 3) && ordered(1, 4) && ordered(2, 5),
            Shape::WireCell | Shape::StrawTube => v[0] > 0.0 && v[1] > 0.0,
            Shape::Single1 | Shape::Single2 | Shape::Single3 => ordered(0, 1),
        };

        if ok {
            Ok(())
        } else {
            Err(format!("{} mask has degenerate boundaries: {}", self.shape.name(), self))
        }
    }
}

impl fmt::Display for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let link = match self.volume_link {
            Some(idx) => idx.to_string(),
            None => "none".to_string(),
        };
        write!(
            f,
            "{} [{}] -> vol {}",
            self.shape.name(),
            self.values().iter().join(", "),
            link
        )
    }
}
