use serde::{Deserialize, Serialize};

use crate::geom::{Point2, Point3, Scalar};

/// Position of an intersection relative to the mask boundaries.
///
/// `Undefined` marks a record that no solver filled, e.g. because the
/// trajectory never reaches the surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Undefined,
    Outside,
    OnBoundary,
    Inside,
}

/// Orientation of the trajectory at the intersection, relative to the
/// position vector of the intersection point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Undefined,
    Along,
    Opposite,
}

/// Result of intersecting a trajectory with a masked surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Intersection {
    pub path: Scalar,
    pub p3: Point3,
    pub p2: Point2,
    pub status: Status,
    pub direction: Direction,
    pub volume_link: Option<usize>,
}

impl Default for Intersection {
    fn default() -> Self {
        Self {
            path: Scalar::MAX,
            p3: Point3::origin(),
            p2: Point2::origin(),
            status: Status::Undefined,
            direction: Direction::Undefined,
            volume_link: None,
        }
    }
}

impl Intersection {
    /// Whether a solver produced this record.
    pub fn is_valid(&self) -> bool {
        self.status != Status::Undefined
    }

    /// Whether the intersection lies within the mask, boundary included.
    pub fn is_inside(&self) -> bool {
        matches!(self.status, Status::Inside | Status::OnBoundary)
    }
}
