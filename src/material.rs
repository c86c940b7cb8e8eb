//! Material description of surfaces and volumes.
//!
//! Surfaces carry either a homogeneous slab (planes, cylinders) or rod (wires)
//! or a material map binned over the surface's local frame. Volumes carry
//! homogeneous raw material or a 3D material map.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::frames::FrameId;
use crate::geom::Scalar;
use crate::grid::Grid;
use crate::store::MultiStore;

#[cfg(test)]
mod tests {

    use super::*;
    use crate::grid::Axis;

    #[test]
    fn vacuum_sentinel() {
        assert!(Material::vacuum().is_vacuum());
        assert!(!Material::silicon().is_vacuum());
        assert_eq!(Material::default(), Material::vacuum());
    }

    #[test]
    fn slab_validity() {
        assert!(MaterialSlab::new(Material::silicon(), 0.15).is_valid());
        assert!(!MaterialSlab::new(Material::silicon(), 0.0).is_valid());
        assert!(!MaterialSlab::new(Material::vacuum(), 1.0).is_valid());
        assert!(!MaterialSlab::default().is_valid());

        let slab = MaterialSlab::new(Material::silicon(), 2.0 * 93.7);
        assert!((slab.thickness_in_x0() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn rod_validity() {
        assert!(MaterialRod::new(Material::aluminium(), 0.5).is_valid());
        assert!(!MaterialRod::new(Material::aluminium(), -0.5).is_valid());
        assert!(!MaterialRod::new(Material::vacuum(), 0.5).is_valid());
        assert!(!MaterialRod::default().is_valid());
    }

    #[test]
    fn store_emptiness() {
        let mut store = MaterialStore::default();
        assert!(store.all_empty());
        store.slabs.push(MaterialSlab::new(Material::beryllium(), 0.8));
        assert!(!store.all_empty());
        assert!(!store.empty(MaterialKind::Slab));
        assert!(store.empty(MaterialKind::Rod));
        assert!(store.empty(MaterialKind::Map(FrameId::Cylindrical2)));

        let map = MaterialMap::new(FrameId::Polar2, vec![Axis::new(0.0, 1.0, 1), Axis::new(-3.2, 3.2, 1)]);
        let idx = store.maps.push(FrameId::Polar2, map);
        assert_eq!(idx, 0);
        assert!(!store.empty(MaterialKind::Map(FrameId::Polar2)));
    }
}

/// Physical properties of a material. Lengths in mm, density in g/cm3.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Radiation length
    pub x0: Scalar,
    /// Nuclear interaction length
    pub l0: Scalar,
    /// Relative atomic mass
    pub ar: Scalar,
    /// Atomic number
    pub z: Scalar,
    pub mass_density: Scalar,
}

impl Default for Material {
    fn default() -> Self {
        Self::vacuum()
    }
}

impl Material {
    pub fn new(x0: Scalar, l0: Scalar, ar: Scalar, z: Scalar, mass_density: Scalar) -> Self {
        Self {
            x0,
            l0,
            ar,
            z,
            mass_density,
        }
    }

    /// Sentinel for "no material".
    pub fn vacuum() -> Self {
        Self::new(Scalar::INFINITY, Scalar::INFINITY, 0.0, 0.0, 0.0)
    }

    pub fn is_vacuum(&self) -> bool {
        *self == Self::vacuum()
    }

    pub fn silicon() -> Self {
        Self::new(93.7, 465.2, 28.0855, 14.0, 2.329)
    }

    pub fn beryllium() -> Self {
        Self::new(352.8, 421.0, 9.012, 4.0, 1.848)
    }

    pub fn aluminium() -> Self {
        Self::new(88.97, 397.0, 26.98, 13.0, 2.699)
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_vacuum() {
            return write!(f, "vacuum");
        }
        write!(
            f,
            "X0: {} | L0: {} | Ar: {} | Z: {} | rho: {}",
            self.x0, self.l0, self.ar, self.z, self.mass_density
        )
    }
}

/// Homogeneous material of a given thickness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialSlab {
    pub material: Material,
    pub thickness: Scalar,
}

impl MaterialSlab {
    pub fn new(material: Material, thickness: Scalar) -> Self {
        Self {
            material,
            thickness,
        }
    }

    /// False for vacuum or non-positive thickness.
    pub fn is_valid(&self) -> bool {
        self.thickness > 0.0 && !self.material.is_vacuum()
    }

    pub fn thickness_in_x0(&self) -> Scalar {
        self.thickness / self.material.x0
    }
}

impl fmt::Display for MaterialSlab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slab [{}] thickness: {}", self.material, self.thickness)
    }
}

/// Homogeneous material of a wire with a given radius.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialRod {
    pub material: Material,
    pub radius: Scalar,
}

impl MaterialRod {
    pub fn new(material: Material, radius: Scalar) -> Self {
        Self { material, radius }
    }

    pub fn is_valid(&self) -> bool {
        self.radius > 0.0 && !self.material.is_vacuum()
    }
}

impl fmt::Display for MaterialRod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rod [{}] radius: {}", self.material, self.radius)
    }
}

/// Material slabs binned over a local frame.
pub type MaterialMap = Grid<MaterialSlab>;

/// Type of a material description. `None` marks an unset link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaterialKind {
    None,
    Slab,
    Rod,
    Raw,
    Map(FrameId),
}

impl fmt::Display for MaterialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaterialKind::None => write!(f, "none"),
            MaterialKind::Slab => write!(f, "slab"),
            MaterialKind::Rod => write!(f, "rod"),
            MaterialKind::Raw => write!(f, "raw material"),
            MaterialKind::Map(frame) => write!(f, "material map ({:?})", frame),
        }
    }
}

impl MaterialKind {
    /// Every kind that owns a collection in the [`MaterialStore`].
    pub fn stored() -> impl Iterator<Item = MaterialKind> {
        [MaterialKind::Slab, MaterialKind::Rod, MaterialKind::Raw]
            .into_iter()
            .chain(FrameId::ALL.into_iter().map(MaterialKind::Map))
    }
}

/// Link from a surface or volume into the [`MaterialStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaterialLink {
    pub kind: MaterialKind,
    pub index: usize,
}

impl MaterialLink {
    pub fn new(kind: MaterialKind, index: usize) -> Self {
        Self { kind, index }
    }
}

/// All material descriptions of a detector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialStore {
    pub slabs: Vec<MaterialSlab>,
    pub rods: Vec<MaterialRod>,
    pub raw: Vec<Material>,
    pub maps: MultiStore<FrameId, MaterialMap>,
}

impl MaterialStore {
    pub fn empty(&self, kind: MaterialKind) -> bool {
        match kind {
            MaterialKind::None => true,
            MaterialKind::Slab => self.slabs.is_empty(),
            MaterialKind::Rod => self.rods.is_empty(),
            MaterialKind::Raw => self.raw.is_empty(),
            MaterialKind::Map(frame) => self.maps.empty(frame),
        }
    }

    pub fn all_empty(&self) -> bool {
        MaterialKind::stored().all(|kind| self.empty(kind))
    }

    /// Whether the link points at an existing entry.
    pub fn contains(&self, link: &MaterialLink) -> bool {
        match link.kind {
            MaterialKind::None => false,
            MaterialKind::Slab => link.index < self.slabs.len(),
            MaterialKind::Rod => link.index < self.rods.len(),
            MaterialKind::Raw => link.index < self.raw.len(),
            MaterialKind::Map(frame) => link.index < self.maps.size(frame),
        }
    }
}
