//! Detector description: volumes, surfaces and the stores they link into.
//!
//! Surfaces and volumes are plain descriptors holding indices into the
//! transform, mask, material and accelerator stores of the [`Detector`].
//! Every surface lives in the flat surface list and in at least one
//! acceleration structure of the volume that owns it.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::frames::FrameId;
use crate::geom::{Point3, Transform3};
use crate::grid::Grid;
use crate::mask::{Mask, Shape};
use crate::material::{MaterialKind, MaterialLink, MaterialStore};
use crate::store::MultiStore;


/// Role of a surface in the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurfaceKind {
    /// Boundary between two volumes
    Portal,
    Sensitive,
    Passive,
}

/// Shape tag and index into the mask store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaskLink {
    pub shape: Shape,
    pub index: usize,
}

/// Type of a surface acceleration structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccelKind {
    BruteForce,
    Grid(FrameId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccelLink {
    pub kind: AccelKind,
    pub index: usize,
}

/// Surface descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    /// Position in the flat surface list of the detector
    pub index: usize,
    /// Owning volume
    pub volume: usize,
    pub kind: SurfaceKind,
    /// Index into the transform store
    pub transform: usize,
    pub mask: MaskLink,
    pub material: Option<MaterialLink>,
}

impl Surface {
    pub fn is_portal(&self) -> bool {
        self.kind == SurfaceKind::Portal
    }

    /// Checks that the links of the surface resolve in `det`.
    pub fn self_check(&self, det: &Detector) -> Result<(), String> {
        if self.transform >= det.transforms.len() {
            return Err(format!(
                "transform index {} out of range ({} transforms)",
                self.transform,
                det.transforms.len()
            ));
        }

        let mask = det.mask(&self.mask).ok_or_else(|| {
            format!(
                "no {} mask at index {}",
                self.mask.shape.name(),
                self.mask.index
            )
        })?;
        mask.self_check()?;

        if !self.is_portal() && mask.volume_link() != Some(self.volume) {
            return Err(format!(
                "{:?} surface must link back to its volume {}, mask is {}",
                self.kind, self.volume, mask
            ));
        }

        if let Some(link) = self.material {
            if link.kind == MaterialKind::None {
                return Err("material link is set, but of kind none".to_string());
            }
            if matches!(link.kind, MaterialKind::Raw)
                || matches!(link.kind, MaterialKind::Map(frame) if frame.dim() == 3)
            {
                return Err(format!("{} cannot be attached to a surface", link.kind));
            }
        }

        Ok(())
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "surface {} ({:?}) | volume: {} | transform: {} | mask: {} [{}]",
            self.index,
            self.kind,
            self.volume,
            self.transform,
            self.mask.shape.name(),
            self.mask.index
        )?;
        match self.material {
            Some(link) => write!(f, " | material: {} [{}]", link.kind, link.index),
            None => write!(f, " | material: none"),
        }
    }
}

/// Volume descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    /// Position in the volume list of the detector
    pub index: usize,
    /// `Cylinder3` or `Cuboid3` extent in the local frame
    pub bounds: Mask,
    pub transform: usize,
    pub material: Option<MaterialLink>,
    pub accelerators: Vec<AccelLink>,
}

impl Volume {
    pub fn self_check(&self, det: &Detector) -> Result<(), String> {
        if !matches!(self.bounds.shape, Shape::Cylinder3 | Shape::Cuboid3) {
            return Err(format!("unsupported volume shape {}", self.bounds.shape.name()));
        }
        self.bounds.self_check()?;

        if self.transform >= det.transforms.len() {
            return Err(format!(
                "transform index {} out of range ({} transforms)",
                self.transform,
                det.transforms.len()
            ));
        }

        if self.accelerators.is_empty() {
            return Err("no surface acceleration structure".to_string());
        }
        if let Some(link) = self
            .accelerators
            .iter()
            .find(|link| !det.accelerators.contains(link))
        {
            return Err(format!(
                "acceleration structure {:?} [{}] does not exist",
                link.kind, link.index
            ));
        }

        if let Some(link) = self.material {
            match link.kind {
                MaterialKind::Raw => {}
                MaterialKind::Map(frame) if frame.dim() == 3 => {}
                kind => return Err(format!("{} cannot be attached to a volume", kind)),
            }
        }

        Ok(())
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "volume {} | bounds: {} | transform: {} | accelerators: {}",
            self.index,
            self.bounds,
            self.transform,
            self.accelerators.len()
        )?;
        match self.material {
            Some(link) => write!(f, " | material: {} [{}]", link.kind, link.index),
            None => write!(f, " | material: none"),
        }
    }
}

/// Surface acceleration structures of all volumes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AcceleratorStore {
    pub brute_force: Vec<Vec<Surface>>,
    pub grids: MultiStore<FrameId, Grid<Surface>>,
}

impl AcceleratorStore {
    pub fn contains(&self, link: &AccelLink) -> bool {
        match link.kind {
            AccelKind::BruteForce => link.index < self.brute_force.len(),
            AccelKind::Grid(frame) => link.index < self.grids.size(frame),
        }
    }

    /// Surfaces held by the acceleration structure, grid entries once per bin.
    pub fn surfaces(&self, link: &AccelLink) -> Box<dyn Iterator<Item = &Surface> + '_> {
        match link.kind {
            AccelKind::BruteForce => match self.brute_force.get(link.index) {
                Some(list) => Box::new(list.iter()),
                None => Box::new(std::iter::empty()),
            },
            AccelKind::Grid(frame) => match self.grids.get(frame, link.index) {
                Some(grid) => Box::new(grid.all()),
                None => Box::new(std::iter::empty()),
            },
        }
    }

    pub fn all_empty(&self) -> bool {
        self.brute_force.is_empty() && self.grids.all_empty()
    }
}

/// Maps a global position to the volume containing it. Binned in `(r, phi, z)`.
pub type VolumeFinder = Grid<usize>;

/// Complete detector geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Detector {
    pub name: String,
    pub volumes: Vec<Volume>,
    pub surfaces: Vec<Surface>,
    pub transforms: Vec<Transform3>,
    pub masks: MultiStore<Shape, Mask>,
    pub materials: MaterialStore,
    pub accelerators: AcceleratorStore,
    pub volume_finder: VolumeFinder,
    /// Volume names by volume index
    pub names: BTreeMap<usize, String>,
}

impl Detector {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            volumes: Vec::new(),
            surfaces: Vec::new(),
            transforms: Vec::new(),
            masks: MultiStore::new(),
            materials: MaterialStore::default(),
            accelerators: AcceleratorStore::default(),
            volume_finder: Grid::new(FrameId::Cylindrical3, Vec::new()),
            names: BTreeMap::new(),
        }
    }

    pub fn surface(&self, index: usize) -> Option<&Surface> {
        self.surfaces.get(index)
    }

    pub fn mask(&self, link: &MaskLink) -> Option<&Mask> {
        self.masks.get(link.shape, link.index)
    }

    pub fn transform(&self, index: usize) -> Option<&Transform3> {
        self.transforms.get(index)
    }

    pub fn portals(&self) -> impl Iterator<Item = &Surface> {
        self.surfaces.iter().filter(|sf| sf.is_portal())
    }

    /// Volume at a global position, if the volume finder knows one.
    pub fn find_volume(&self, p: &Point3) -> Option<usize> {
        self.volume_finder.search(p).first().copied()
    }

    /// Calls `f` on every surface entry in the acceleration structures of
    /// `volume`. Stops at the first error.
    pub fn visit_surfaces<E, F>(&self, volume: &Volume, mut f: F) -> Result<(), E>
    where
        F: FnMut(&Surface) -> Result<(), E>,
    {
        for link in &volume.accelerators {
            for sf in self.accelerators.surfaces(link) {
                f(sf)?;
            }
        }
        Ok(())
    }

    /// Distinct surfaces reachable from the volume, ordered by index.
    pub fn volume_surfaces(&self, volume: &Volume) -> Vec<Surface> {
        let mut found: BTreeMap<usize, Surface> = BTreeMap::new();
        let visited = self.visit_surfaces(volume, |sf| -> Result<(), Infallible> {
            found.entry(sf.index).or_insert(*sf);
            Ok(())
        });
        match visited {
            Ok(()) => found.into_values().collect(),
            Err(never) => match never {},
        }
    }

    pub fn add_transform(&mut self, trf: Transform3) -> usize {
        self.transforms.push(trf);
        self.transforms.len() - 1
    }

    pub fn add_mask(&mut self, mask: Mask) -> MaskLink {
        MaskLink {
            shape: mask.shape,
            index: self.masks.push(mask.shape, mask),
        }
    }

    /// Adds a volume with an empty brute force surface list and returns its
    /// index.
    pub fn add_volume(
        &mut self,
        bounds: Mask,
        trf: Transform3,
        material: Option<MaterialLink>,
    ) -> usize {
        let index = self.volumes.len();
        let transform = self.add_transform(trf);

        self.accelerators.brute_force.push(Vec::new());
        let brute_force = AccelLink {
            kind: AccelKind::BruteForce,
            index: self.accelerators.brute_force.len() - 1,
        };

        self.volumes.push(Volume {
            index,
            bounds,
            transform,
            material,
            accelerators: vec![brute_force],
        });
        index
    }

    /// Adds a surface to the flat surface list and to the brute force list of
    /// its volume. Returns the surface index.
    ///
    /// # Panics
    /// If `volume` does not exist.
    pub fn add_surface(
        &mut self,
        volume: usize,
        kind: SurfaceKind,
        trf: Transform3,
        mask: Mask,
        material: Option<MaterialLink>,
    ) -> usize {
        let sf = Surface {
            index: self.surfaces.len(),
            volume,
            kind,
            transform: self.add_transform(trf),
            mask: self.add_mask(mask),
            material,
        };
        self.surfaces.push(sf);

        let brute_force = self.volumes[volume]
            .accelerators
            .iter()
            .find(|link| link.kind == AccelKind::BruteForce)
            .map(|link| link.index);
        match brute_force {
            Some(idx) => self.accelerators.brute_force[idx].push(sf),
            None => {
                self.accelerators.brute_force.push(vec![sf]);
                self.volumes[volume].accelerators.push(AccelLink {
                    kind: AccelKind::BruteForce,
                    index: self.accelerators.brute_force.len() - 1,
                });
            }
        }
        sf.index
    }

    /// Attaches a surface grid to a volume.
    ///
    /// # Panics
    /// If `volume` does not exist.
    pub fn add_surface_grid(&mut self, volume: usize, grid: Grid<Surface>) -> AccelLink {
        let frame = grid.frame;
        let link = AccelLink {
            kind: AccelKind::Grid(frame),
            index: self.accelerators.grids.push(frame, grid),
        };
        self.volumes[volume].accelerators.push(link);
        link
    }
}

impl fmt::Display for Detector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "detector '{}': {} volumes, {} surfaces, {} transforms, {} masks",
            self.name,
            self.volumes.len(),
            self.surfaces.len(),
            self.transforms.len(),
            self.masks.len()
        )?;
        for vol in &self.volumes {
            let name = self.names.get(&vol.index).map(String::as_str).unwrap_or("");
            writeln!(f, "  {} {}", vol, name)?;
        }
        Ok(())
    }
}
