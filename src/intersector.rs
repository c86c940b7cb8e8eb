//! Intersection of helical trajectories with cylinder surfaces.
//!
//! There is no closed form for the crossing of a helix with an arbitrarily
//! placed cylinder, so the path length of the crossing is found with a
//! Newton-Raphson iteration on the unbounded cylinder. The mask is applied
//! afterwards, with the radial distance check switched on.

use crate::config::{NEWTON_MAX_TRIES, NEWTON_SEED_OFFSET, NEWTON_TOLERANCE};
use crate::frames::{ConcentricCylindrical2, Cylindrical2, LocalFrame};
use crate::geom::{perp, Point3, Scalar, Transform3};
use crate::helix::Helix;
use crate::intersection::{Direction, Intersection};
use crate::mask::{Mask, Shape};

#[cfg(test)]
mod tests {

    use super::*;
    use crate::geom::Vector3;
    use crate::intersection::Status;
    use nalgebra::UnitQuaternion;

    const B_Z: Scalar = 2.0;

    fn cylinder(r: Scalar, link: Option<usize>) -> Mask {
        Mask::new(Shape::Cylinder2, &[r, -100.0, 100.0], link)
    }

    #[test]
    fn straight_line_hits_at_analytic_path() {
        let dir = Vector3::new(1.0, 1.0, 0.5);
        let h = Helix::new(Point3::origin(), dir, 0.0, Vector3::zeros());
        let r = 4.0;
        let trf = Transform3::identity();

        let expected = r / perp(&dir.normalize());
        let solution = HelixCylinderIntersector
            .solve_path(&h, r, &trf)
            .expect("line must cross the cylinder");
        assert!((solution.path - expected).abs() < 1e-6, "{:?}", solution);
        assert!(solution.iterations < NEWTON_MAX_TRIES);
    }

    #[test]
    fn curved_helix_converges_onto_radius() {
        let dir = Vector3::new(1.0, 0.2, 0.7);
        let qop = 0.1;
        let h = Helix::new(Point3::origin(), dir, qop, Vector3::new(0.0, 0.0, B_Z));
        let r = 3.0;
        let trf = Transform3::identity();
        let mask = cylinder(r, Some(7));

        // Chord length of the transverse circle starting at the origin
        let k = h.curvature().abs();
        let expected = 2.0 / k * (r / (2.0 * h.radius())).asin();

        let solution = HelixCylinderIntersector
            .solve_path(&h, r, &trf)
            .expect("helix must cross the cylinder");
        assert!((solution.path - expected).abs() < 1e-6);
        assert!(solution.iterations < NEWTON_MAX_TRIES);

        let [is, second] = HelixCylinderIntersector.intersect(&h, &mask, &trf, 0.0);
        assert!(is.is_valid());
        assert_eq!(is.status, Status::Inside);
        assert!((perp(&is.p3.coords) - r).abs() < 1e-6);
        assert!((is.path - is.p3.coords.norm()).abs() < 1e-12);
        assert_eq!(is.direction, Direction::Along);
        assert_eq!(is.volume_link, Some(7));

        // Local frame of a cylinder2 mask is (r * phi, z)
        let phi = is.p3.y.atan2(is.p3.x);
        assert!((is.p2.x - r * phi).abs() < 1e-6);
        assert!((is.p2.y - is.p3.z).abs() < 1e-12);

        assert!(!second.is_valid());
        assert_eq!(second, Intersection::default());
    }

    #[test]
    fn parallel_to_axis_has_no_solution() {
        let b = Vector3::new(0.0, 0.0, B_Z);
        let h = Helix::new(Point3::new(10.0, 0.0, 0.0), Vector3::z(), 0.5, b);
        let trf = Transform3::identity();
        assert!(HelixCylinderIntersector.solve_path(&h, 4.0, &trf).is_none());

        let out = HelixCylinderIntersector.intersect(&h, &cylinder(4.0, None), &trf, 0.0);
        assert!(out.iter().all(|is| !is.is_valid()));
    }

    #[test]
    fn unreachable_cylinder_does_not_converge() {
        // Transverse radius 1, cylinder radius 10: the helix never gets there
        let b = Vector3::new(0.0, 0.0, B_Z);
        let h = Helix::new(Point3::origin(), Vector3::x(), 0.5, b);
        let trf = Transform3::identity();
        assert!(HelixCylinderIntersector.solve_path(&h, 10.0, &trf).is_none());
    }

    #[test]
    fn outside_z_extent() {
        let dir = Vector3::new(1.0, 0.0, 3.0);
        let h = Helix::new(Point3::origin(), dir, 0.0, Vector3::zeros());
        let trf = Transform3::identity();
        let mask = Mask::new(Shape::Cylinder2, &[2.0, -1.0, 1.0], None);

        let [is, _] = HelixCylinderIntersector.intersect(&h, &mask, &trf, 0.0);
        assert!(is.is_valid());
        assert_eq!(is.status, Status::Outside);
        assert!((is.p3.z - 6.0).abs() < 1e-6);

        let [is, _] = HelixCylinderIntersector.intersect(&h, &mask, &trf, 5.5);
        assert_eq!(is.status, Status::OnBoundary);
    }

    #[test]
    fn placed_cylinder() {
        // Cylinder along the global x axis, shifted in y
        let trf = Transform3::from_axes(
            Vector3::new(0.0, 5.0, 0.0),
            Vector3::x(),
            Vector3::y(),
        );
        let h = Helix::new(Point3::origin(), Vector3::y(), 0.0, Vector3::zeros());
        let mask = cylinder(1.0, Some(2));

        let [is, _] = HelixCylinderIntersector.intersect(&h, &mask, &trf, 0.0);
        assert!(is.is_valid());
        assert!(is.is_inside());
        assert!((is.p3 - Point3::new(0.0, 4.0, 0.0)).norm() < 1e-6);
        assert!((is.path - 4.0).abs() < 1e-6);
        assert_eq!(is.volume_link, Some(2));
    }

    #[test]
    fn portal_cylinder_uses_concentric_frame() {
        let h = Helix::new(
            Point3::origin(),
            Vector3::new(0.0, 1.0, 1.0),
            0.0,
            Vector3::zeros(),
        );
        let trf = Transform3::identity();
        let mask = Mask::new(Shape::ConcentricCylinder2, &[5.0, -10.0, 10.0], None);

        let [is, _] = HelixCylinderIntersector.intersect(&h, &mask, &trf, 0.0);
        assert!(is.is_inside());
        assert!((is.p2.x - std::f64::consts::FRAC_PI_2).abs() < 1e-6);
        assert!((is.p2.y - 5.0).abs() < 1e-6);
    }

    #[test]
    fn opposite_direction() {
        // Start outside the cylinder heading inwards
        let h = Helix::new(
            Point3::new(-8.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            0.0,
            Vector3::zeros(),
        );
        let trf = Transform3::from_translation(Vector3::new(0.0, 0.0, 0.0));
        let [is, _] = HelixCylinderIntersector.intersect(&h, &cylinder(2.0, None), &trf, 0.0);
        assert!(is.is_valid());
        assert_eq!(is.direction, Direction::Opposite);
        assert!((is.p3.x + 2.0).abs() < 1e-6);
    }

    #[test]
    fn non_cylinder_mask_is_ignored() {
        let h = Helix::new(Point3::origin(), Vector3::x(), 0.0, Vector3::zeros());
        let mask = Mask::new(Shape::Rectangle2, &[1.0, 1.0], None);
        let rotated = Transform3::new(
            Vector3::zeros(),
            UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 1.0),
        );
        let out = HelixCylinderIntersector.intersect(&h, &mask, &rotated, 0.0);
        assert_eq!(out, [Intersection::default(); 2]);
    }
}

/// Converged path length of the Newton iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewtonSolution {
    pub path: Scalar,
    pub iterations: usize,
}

/// Two intersection slots. The helix search fills only the first one, the
/// second is left for a caller searching from the other half turn.
pub type CylinderIntersections = [Intersection; 2];

/// Intersects helices with `Cylinder2` and `ConcentricCylinder2` masks.
#[derive(Debug, Clone, Copy, Default)]
pub struct HelixCylinderIntersector;

impl HelixCylinderIntersector {
    /// Finds the path length at which the helix crosses the unbounded
    /// cylinder of radius `r` placed by `trf`.
    ///
    /// Solves `f(s) = |(h.pos(s) - c) x z|^2 - r^2 = 0` with
    /// `f'(s) = 2 ((h.pos(s) - c) x z) . (h.dir(s) x z)`, where `c` is the
    /// cylinder centre and `z` its axis. Returns `None` if the derivative
    /// vanishes or the iteration does not settle within the allowed tries.
    pub fn solve_path(&self, h: &Helix, r: Scalar, trf: &Transform3) -> Option<NewtonSolution> {
        let axis = trf.z_axis();
        let centre = Point3::from(trf.translation());

        let mut s = r * perp(&h.dir(NEWTON_TOLERANCE));
        let mut s_prev = s - NEWTON_SEED_OFFSET;

        let mut n_tries = 0;
        while (s - s_prev).abs() > NEWTON_TOLERANCE && n_tries < NEWTON_MAX_TRIES {
            let crp = (h.pos(s) - centre).cross(&axis);
            let denom = 2.0 * crp.dot(&h.dir(s).cross(&axis));
            if denom == 0.0 {
                return None;
            }

            s_prev = s;
            s -= (crp.dot(&crp) - r * r) / denom;

            n_tries += 1;
        }

        if n_tries == NEWTON_MAX_TRIES {
            return None;
        }

        Some(NewtonSolution {
            path: s,
            iterations: n_tries,
        })
    }

    /// Intersects the helix with a cylinder mask placed by `trf`.
    ///
    /// The path of the resulting record is the distance of the intersection
    /// from the global origin.
    pub fn intersect(
        &self,
        h: &Helix,
        mask: &Mask,
        trf: &Transform3,
        mask_tolerance: Scalar,
    ) -> CylinderIntersections {
        let mut ret = CylinderIntersections::default();

        if !mask.shape.is_cylinder() {
            return ret;
        }

        let Some(solution) = self.solve_path(h, mask.radius(), trf) else {
            return ret;
        };

        let s = solution.path;
        let p3 = h.pos(s);
        let dir = h.dir(s);

        let is = &mut ret[0];
        is.path = p3.coords.norm();
        is.p3 = p3;
        is.p2 = match mask.shape {
            Shape::ConcentricCylinder2 => ConcentricCylindrical2.global_to_local(trf, &p3, &dir),
            _ => Cylindrical2.global_to_local(trf, &p3, &dir),
        };

        let local3 = trf.point_to_local(&p3);
        is.status = mask.is_inside_radially(&local3, mask_tolerance);
        is.direction = if p3.coords.dot(&dir) > 0.0 {
            Direction::Along
        } else {
            Direction::Opposite
        };
        is.volume_link = mask.volume_link();

        ret
    }
}
