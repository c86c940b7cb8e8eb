use nalgebra::{Isometry3, Matrix3, Matrix4, Rotation3, Translation3, UnitQuaternion};
use serde::{Deserialize, Serialize};


/// Floating point type used throughout the geometry.
pub type Scalar = f64;
pub type Point2 = nalgebra::Point2<Scalar>;
pub type Point3 = nalgebra::Point3<Scalar>;
pub type Vector3 = nalgebra::Vector3<Scalar>;

/// Transverse component of a vector, i.e. its distance to the z axis.
pub fn perp(v: &Vector3) -> Scalar {
    v.x.hypot(v.y)
}

/// Azimuthal angle of a vector in the xy plane.
pub fn phi(v: &Vector3) -> Scalar {
    v.y.atan2(v.x)
}

/// Placement of a local frame in the global 3D frame.
///
/// The placement is rigid (rotation followed by translation) and immutable
/// once built. Detector surfaces and volumes refer to their placement by its
/// index in the detector's transform store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform3 {
    iso: Isometry3<Scalar>,
}

impl Default for Transform3 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform3 {
    pub fn new(translation: Vector3, rotation: UnitQuaternion<Scalar>) -> Self {
        Self {
            iso: Isometry3::from_parts(Translation3::from(translation), rotation),
        }
    }

    pub fn identity() -> Self {
        Self {
            iso: Isometry3::identity(),
        }
    }

    pub fn from_translation(translation: Vector3) -> Self {
        Self::new(translation, UnitQuaternion::identity())
    }

    /// Builds a placement from its local z and x axes. The y axis completes a
    /// right handed frame. The x axis is orthogonalised against z.
    pub fn from_axes(translation: Vector3, z_axis: Vector3, x_axis: Vector3) -> Self {
        let z = z_axis.normalize();
        let x = (x_axis - z * x_axis.dot(&z)).normalize();
        let y = z.cross(&x);
        let rotation = Rotation3::from_matrix_unchecked(Matrix3::from_columns(&[x, y, z]));

        Self::new(translation, UnitQuaternion::from_rotation_matrix(&rotation))
    }

    pub fn point_to_local(&self, p: &Point3) -> Point3 {
        self.iso.inverse_transform_point(p)
    }

    pub fn point_to_global(&self, p: &Point3) -> Point3 {
        self.iso.transform_point(p)
    }

    pub fn vector_to_local(&self, v: &Vector3) -> Vector3 {
        self.iso.inverse_transform_vector(v)
    }

    pub fn vector_to_global(&self, v: &Vector3) -> Vector3 {
        self.iso.transform_vector(v)
    }

    /// Homogeneous 4x4 matrix: rotation block in the upper left, translation
    /// in the last column.
    pub fn matrix(&self) -> Matrix4<Scalar> {
        self.iso.to_homogeneous()
    }

    pub fn rotation(&self) -> Matrix3<Scalar> {
        self.iso.rotation.to_rotation_matrix().into_inner()
    }

    pub fn translation(&self) -> Vector3 {
        self.iso.translation.vector
    }

    /// Local z axis expressed in the global frame.
    pub fn z_axis(&self) -> Vector3 {
        self.rotation().column(2).into_owned()
    }

    pub fn inverse(&self) -> Self {
        Self {
            iso: self.iso.inverse(),
        }
    }
}
