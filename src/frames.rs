//! Local coordinate frames of surfaces and grids.
//!
//! Every surface shape lives in one of a small, closed set of local frames.
//! A frame converts between the global 3D position of a point and the two
//! bound parameters a track has on the surface, and provides the rotational
//! part of the jacobians between bound and free track parametrisations.
//!
//! # Frames
//!
//! - [`Cartesian2`]: planar `(x, y)`
//! - [`Polar2`]: planar `(r, phi)`
//! - [`Cylindrical2`]: `(r * phi, z)` on a placed cylinder
//! - [`ConcentricCylindrical2`]: `(phi, z)` on a cylinder around the global z axis
//!
//! The frame structs carry no state, so the hot per-point math is statically
//! dispatched through the [`LocalFrame`] trait. [`FrameId`] tags the frames
//! where only runtime information is available (grids, material maps, IO).

use nalgebra::{Matrix2x3, Matrix3x2};
use serde::{Deserialize, Serialize};

use crate::geom::{perp, phi, Point2, Point3, Scalar, Transform3, Vector3};
use crate::mask::Mask;

#[cfg(test)]
mod tests {

    use super::*;
    use crate::mask::Shape;
    use nalgebra::{Matrix2, UnitQuaternion};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    const TOL: Scalar = 1e-9;

    fn placements() -> Vec<Transform3> {
        vec![
            Transform3::identity(),
            Transform3::from_translation(Vector3::new(2.0, -3.0, 7.5)),
            Transform3::new(
                Vector3::new(-1.0, 4.0, 0.5),
                UnitQuaternion::from_euler_angles(0.3, -1.1, 2.4),
            ),
        ]
    }

    fn check_round_trip<F: LocalFrame>(frame: F, mask: &Mask, points: &[Point2]) {
        let dir = Vector3::new(0.0, 0.0, 1.0);
        for trf in placements() {
            for p in points {
                let global = frame.local_to_global(&trf, mask, p, &dir);
                let local = frame.global_to_local(&trf, &global, &dir);
                assert!(
                    (local - p).norm() < TOL,
                    "{:?}: {} -> {} -> {}",
                    F::ID,
                    p,
                    global,
                    local
                );
            }
        }
    }

    fn check_jacobians<F: LocalFrame>(frame: F, mask: &Mask, p: Point2) {
        let dir = Vector3::new(0.0, 0.0, 1.0);
        for trf in placements() {
            let global = frame.local_to_global(&trf, mask, &p, &dir);
            let b2f = frame.bound_to_free_rotation(&trf, &global);
            let f2b = frame.free_to_bound_rotation(&trf, &global);
            let id = f2b * b2f;
            assert!(
                (id - Matrix2::identity()).norm() < TOL,
                "{:?}: {}",
                F::ID,
                id
            );
        }
    }

    #[test]
    fn cartesian2_projection() {
        let frame = Cartesian2;
        assert_eq!(
            frame.project(&Point3::new(1.0, 2.0, 3.0)),
            Point2::new(1.0, 2.0)
        );
        assert_eq!(frame.project2(&Point2::new(4.0, 5.0)), Point2::new(4.0, 5.0));

        let trf = Transform3::from_translation(Vector3::new(0.0, 0.0, 5.0));
        let mask = Mask::new(Shape::Rectangle2, &[10.0, 10.0], None);
        let global = frame.local_to_global(&trf, &mask, &Point2::new(1.0, 2.0), &Vector3::z());
        assert_eq!(global, Point3::new(1.0, 2.0, 5.0));
    }

    #[test]
    fn cartesian2_jacobian_is_rotation_block() {
        let trf = placements()[2];
        let p = Point3::new(1.0, 1.0, 1.0);
        let b2f = Cartesian2.bound_to_free_rotation(&trf, &p);
        let rot = trf.rotation();
        assert_eq!(b2f.column(0), rot.column(0));
        assert_eq!(b2f.column(1), rot.column(1));
        let f2b = Cartesian2.free_to_bound_rotation(&trf, &p);
        assert_eq!(f2b, b2f.transpose());
    }

    #[test]
    fn round_trips() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut points = Vec::new();
        for _ in 0..50 {
            points.push(Point2::new(
                rng.random_range(-2.5..2.5),
                rng.random_range(-2.5..2.5),
            ));
        }
        let rect = Mask::new(Shape::Rectangle2, &[10.0, 10.0], None);
        check_round_trip(Cartesian2, &rect, &points);

        let polar_points: Vec<Point2> = points
            .iter()
            .map(|p| Point2::new(p.x.abs() + 0.1, p.y))
            .collect();
        let ring = Mask::new(Shape::Ring2, &[0.0, 10.0], None);
        check_round_trip(Polar2, &ring, &polar_points);

        let cyl = Mask::new(Shape::Cylinder2, &[3.0, -10.0, 10.0], None);
        let cyl_points: Vec<Point2> = points
            .iter()
            .map(|p| Point2::new(p.x * 3.0 / 2.5 * 0.99, p.y))
            .collect();
        check_round_trip(Cylindrical2, &cyl, &cyl_points);

        let portal = Mask::new(Shape::ConcentricCylinder2, &[3.0, -10.0, 10.0], None);
        check_round_trip(ConcentricCylindrical2, &portal, &points);
    }

    #[test]
    fn jacobians_invert() {
        let rect = Mask::new(Shape::Rectangle2, &[10.0, 10.0], None);
        check_jacobians(Cartesian2, &rect, Point2::new(0.3, -0.7));

        let ring = Mask::new(Shape::Ring2, &[0.0, 10.0], None);
        check_jacobians(Polar2, &ring, Point2::new(2.0, 0.8));

        let cyl = Mask::new(Shape::Cylinder2, &[3.0, -10.0, 10.0], None);
        check_jacobians(Cylindrical2, &cyl, Point2::new(1.5, 2.0));

        let portal = Mask::new(Shape::ConcentricCylinder2, &[3.0, -10.0, 10.0], None);
        check_jacobians(ConcentricCylindrical2, &portal, Point2::new(-2.0, 4.0));
    }

    #[test]
    fn frame_id_dispatch_matches_static_frames() {
        let trf = placements()[1];
        let p = Point3::new(3.0, 1.0, -4.0);
        let dir = Vector3::x();
        assert_eq!(
            FrameId::Polar2.global_to_local(&trf, &p, &dir),
            Some(Polar2.global_to_local(&trf, &p, &dir))
        );
        assert_eq!(FrameId::Cylindrical3.global_to_local(&trf, &p, &dir), None);
        assert_eq!(FrameId::Cartesian3.dim(), 3);
        assert_eq!(FrameId::ConcentricCylindrical2.dim(), 2);
    }
}

/// Tag of a local frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameId {
    Cartesian2,
    Cartesian3,
    Polar2,
    Cylindrical2,
    Cylindrical3,
    ConcentricCylindrical2,
}

impl FrameId {
    pub const ALL: [FrameId; 6] = [
        FrameId::Cartesian2,
        FrameId::Cartesian3,
        FrameId::Polar2,
        FrameId::Cylindrical2,
        FrameId::Cylindrical3,
        FrameId::ConcentricCylindrical2,
    ];

    /// Number of local coordinates of the frame.
    pub fn dim(&self) -> usize {
        match self {
            FrameId::Cartesian3 | FrameId::Cylindrical3 => 3,
            _ => 2,
        }
    }

    /// Native coordinates of a point given in the local cartesian frame.
    /// Unused trailing coordinates of 2D frames are zero.
    pub fn coordinates(&self, local3: &Point3) -> Point3 {
        let v = local3.coords;
        match self {
            FrameId::Cartesian2 => Point3::new(v.x, v.y, 0.0),
            FrameId::Cartesian3 => *local3,
            FrameId::Polar2 => Point3::new(perp(&v), phi(&v), 0.0),
            FrameId::Cylindrical2 => Point3::new(perp(&v) * phi(&v), v.z, 0.0),
            FrameId::Cylindrical3 => Point3::new(perp(&v), phi(&v), v.z),
            FrameId::ConcentricCylindrical2 => Point3::new(phi(&v), v.z, 0.0),
        }
    }

    /// Runtime dispatch of [`LocalFrame::global_to_local`]. 3D frames have no
    /// bound parametrisation and return `None`.
    pub fn global_to_local(&self, trf: &Transform3, p: &Point3, dir: &Vector3) -> Option<Point2> {
        match self {
            FrameId::Cartesian2 => Some(Cartesian2.global_to_local(trf, p, dir)),
            FrameId::Polar2 => Some(Polar2.global_to_local(trf, p, dir)),
            FrameId::Cylindrical2 => Some(Cylindrical2.global_to_local(trf, p, dir)),
            FrameId::ConcentricCylindrical2 => {
                Some(ConcentricCylindrical2.global_to_local(trf, p, dir))
            }
            FrameId::Cartesian3 | FrameId::Cylindrical3 => None,
        }
    }

    /// Runtime dispatch of [`LocalFrame::local_to_global`].
    pub fn local_to_global(
        &self,
        trf: &Transform3,
        mask: &Mask,
        p: &Point2,
        dir: &Vector3,
    ) -> Option<Point3> {
        match self {
            FrameId::Cartesian2 => Some(Cartesian2.local_to_global(trf, mask, p, dir)),
            FrameId::Polar2 => Some(Polar2.local_to_global(trf, mask, p, dir)),
            FrameId::Cylindrical2 => Some(Cylindrical2.local_to_global(trf, mask, p, dir)),
            FrameId::ConcentricCylindrical2 => {
                Some(ConcentricCylindrical2.local_to_global(trf, mask, p, dir))
            }
            FrameId::Cartesian3 | FrameId::Cylindrical3 => None,
        }
    }
}

/// Projection between the global frame and the bound parameters of a surface.
pub trait LocalFrame: Copy + Default {
    const ID: FrameId;

    /// Bound parameters are already local.
    fn project2(&self, local2: &Point2) -> Point2 {
        *local2
    }

    /// Reduces a point in the local cartesian 3D frame to the two bound
    /// parameters of the frame.
    fn project(&self, local3: &Point3) -> Point2;

    fn global_to_local(&self, trf: &Transform3, p: &Point3, _dir: &Vector3) -> Point2 {
        self.project(&trf.point_to_local(p))
    }

    /// Embeds bound parameters into 3D and places them in the global frame.
    /// Frames that need a radius take it from the mask.
    fn local_to_global(&self, trf: &Transform3, mask: &Mask, p: &Point2, dir: &Vector3)
        -> Point3;

    /// d(x, y, z) / d(loc0, loc1) at the global position `p`.
    fn bound_to_free_rotation(&self, trf: &Transform3, p: &Point3) -> Matrix3x2<Scalar>;

    /// d(loc0, loc1) / d(x, y, z) at the global position `p`.
    fn free_to_bound_rotation(&self, trf: &Transform3, p: &Point3) -> Matrix2x3<Scalar>;
}

/// Planar frame with cartesian bound parameters `(x, y)`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Cartesian2;

impl LocalFrame for Cartesian2 {
    const ID: FrameId = FrameId::Cartesian2;

    fn project(&self, local3: &Point3) -> Point2 {
        Point2::new(local3.x, local3.y)
    }

    fn local_to_global(
        &self,
        trf: &Transform3,
        _mask: &Mask,
        p: &Point2,
        _dir: &Vector3,
    ) -> Point3 {
        trf.point_to_global(&Point3::new(p.x, p.y, 0.0))
    }

    fn bound_to_free_rotation(&self, trf: &Transform3, _p: &Point3) -> Matrix3x2<Scalar> {
        trf.rotation().fixed_view::<3, 2>(0, 0).into_owned()
    }

    fn free_to_bound_rotation(&self, trf: &Transform3, _p: &Point3) -> Matrix2x3<Scalar> {
        trf.rotation().transpose().fixed_view::<2, 3>(0, 0).into_owned()
    }
}

/// Planar frame with polar bound parameters `(r, phi)`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Polar2;

impl LocalFrame for Polar2 {
    const ID: FrameId = FrameId::Polar2;

    fn project(&self, local3: &Point3) -> Point2 {
        Point2::new(perp(&local3.coords), phi(&local3.coords))
    }

    fn local_to_global(
        &self,
        trf: &Transform3,
        _mask: &Mask,
        p: &Point2,
        _dir: &Vector3,
    ) -> Point3 {
        let (sin_phi, cos_phi) = p.y.sin_cos();
        trf.point_to_global(&Point3::new(p.x * cos_phi, p.x * sin_phi, 0.0))
    }

    fn bound_to_free_rotation(&self, trf: &Transform3, p: &Point3) -> Matrix3x2<Scalar> {
        let local = self.project(&trf.point_to_local(p));
        let (sin_phi, cos_phi) = local.y.sin_cos();
        let local_jac = Matrix3x2::new(
            cos_phi,
            -local.x * sin_phi,
            sin_phi,
            local.x * cos_phi,
            0.0,
            0.0,
        );
        trf.rotation() * local_jac
    }

    fn free_to_bound_rotation(&self, trf: &Transform3, p: &Point3) -> Matrix2x3<Scalar> {
        let local = self.project(&trf.point_to_local(p));
        let (sin_phi, cos_phi) = local.y.sin_cos();
        let local_jac = Matrix2x3::new(
            cos_phi,
            sin_phi,
            0.0,
            -sin_phi / local.x,
            cos_phi / local.x,
            0.0,
        );
        local_jac * trf.rotation().transpose()
    }
}

/// Frame on a placed cylinder with bound parameters `(r * phi, z)`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Cylindrical2;

impl LocalFrame for Cylindrical2 {
    const ID: FrameId = FrameId::Cylindrical2;

    fn project(&self, local3: &Point3) -> Point2 {
        Point2::new(perp(&local3.coords) * phi(&local3.coords), local3.z)
    }

    fn local_to_global(&self, trf: &Transform3, mask: &Mask, p: &Point2, _dir: &Vector3) -> Point3 {
        let r = mask.radius();
        let (sin_phi, cos_phi) = (p.x / r).sin_cos();
        trf.point_to_global(&Point3::new(r * cos_phi, r * sin_phi, p.y))
    }

    fn bound_to_free_rotation(&self, trf: &Transform3, p: &Point3) -> Matrix3x2<Scalar> {
        let (sin_phi, cos_phi) = phi(&trf.point_to_local(p).coords).sin_cos();
        let local_jac = Matrix3x2::new(-sin_phi, 0.0, cos_phi, 0.0, 0.0, 1.0);
        trf.rotation() * local_jac
    }

    fn free_to_bound_rotation(&self, trf: &Transform3, p: &Point3) -> Matrix2x3<Scalar> {
        let (sin_phi, cos_phi) = phi(&trf.point_to_local(p).coords).sin_cos();
        let local_jac = Matrix2x3::new(-sin_phi, cos_phi, 0.0, 0.0, 0.0, 1.0);
        local_jac * trf.rotation().transpose()
    }
}

/// Frame on a cylinder whose axis is the global z axis, bound parameters
/// `(phi, z)`. Only the translation of the placement is used.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConcentricCylindrical2;

impl LocalFrame for ConcentricCylindrical2 {
    const ID: FrameId = FrameId::ConcentricCylindrical2;

    fn project(&self, local3: &Point3) -> Point2 {
        Point2::new(phi(&local3.coords), local3.z)
    }

    fn global_to_local(&self, trf: &Transform3, p: &Point3, _dir: &Vector3) -> Point2 {
        self.project(&(p - trf.translation()))
    }

    fn local_to_global(&self, trf: &Transform3, mask: &Mask, p: &Point2, _dir: &Vector3) -> Point3 {
        let r = mask.radius();
        let (sin_phi, cos_phi) = p.x.sin_cos();
        Point3::new(r * cos_phi, r * sin_phi, p.y) + trf.translation()
    }

    fn bound_to_free_rotation(&self, trf: &Transform3, p: &Point3) -> Matrix3x2<Scalar> {
        let local = p - trf.translation();
        let r = perp(&local.coords);
        let (sin_phi, cos_phi) = phi(&local.coords).sin_cos();
        Matrix3x2::new(-r * sin_phi, 0.0, r * cos_phi, 0.0, 0.0, 1.0)
    }

    fn free_to_bound_rotation(&self, trf: &Transform3, p: &Point3) -> Matrix2x3<Scalar> {
        let local = p - trf.translation();
        let r = perp(&local.coords);
        let (sin_phi, cos_phi) = phi(&local.coords).sin_cos();
        Matrix2x3::new(-sin_phi / r, cos_phi / r, 0.0, 0.0, 0.0, 1.0)
    }
}
