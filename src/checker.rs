//! Consistency checks on a fully built detector.
//!
//! [`check_consistency`] walks the volumes and the flat surface list and
//! verifies that every link between volumes, surfaces, masks, materials and
//! acceleration structures resolves. It stops at the first fault. Problems
//! that do not make the detector unusable are collected as warnings and also
//! logged.

use log::warn;
use thiserror::Error;

use crate::detector::{Detector, Surface, Volume};
use crate::material::{MaterialKind, MaterialLink, MaterialMap, MaterialStore};


/// Fault found in a detector. Each fault names the offending entity.
#[derive(Debug, Error)]
pub enum ConsistencyError {
    #[error("no volumes in detector")]
    NoVolumes,

    #[error("no surfaces found")]
    NoSurfaces,

    #[error("no transforms in detector")]
    NoTransforms,

    #[error("no masks in detector")]
    NoMasks,

    #[error("no portals in detector")]
    NoPortals,

    /// A volume failed its own check.
    #[error("invalid volume {index}: {details}")]
    InvalidVolume { index: usize, details: String },

    #[error("incorrect volume index, found {volume} at position {position}")]
    VolumeIndexMismatch { position: usize, volume: String },

    /// A surface failed its own check.
    #[error("invalid surface {index}: {details}")]
    InvalidSurface { index: usize, details: String },

    #[error("incorrect surface index, found {surface} at position {position}")]
    SurfaceIndexMismatch { position: usize, surface: String },

    /// A surface in the acceleration structures of a volume claims another owner.
    #[error("incorrect volume index on surface in volume {volume}: {surface}")]
    SurfaceVolumeMismatch { volume: usize, surface: String },

    #[error("volume link to non-existent volume {link} on {surface}")]
    DanglingVolumeLink { link: usize, surface: String },

    /// Volume acceleration structure and flat surface list disagree.
    #[error("surfaces in volume and detector lookups differ:\n in volume: {in_volume}\n in lookup: {in_lookup}")]
    SurfaceLookupMismatch { in_volume: String, in_lookup: String },

    #[error("surface is not part of its volume's acceleration structures: {surface}")]
    UnregisteredSurface { surface: String },

    #[error("invalid material in {kind} at index {index}: {details}")]
    InvalidMaterial {
        kind: MaterialKind,
        index: usize,
        details: String,
    },

    #[error("empty material grid: {kind} at index {index}")]
    EmptyMaterialMap { kind: MaterialKind, index: usize },

    #[error("empty material bin {bin}: {kind} at index {index}")]
    EmptyMaterialBin {
        kind: MaterialKind,
        index: usize,
        bin: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    NoMaterial,
    /// A single collection of a store is empty
    EmptyCollection,
    EmptyVolumeFinder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

/// Outcome of a successful check.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckReport {
    pub warnings: Vec<Warning>,
}

impl CheckReport {
    fn warn(&mut self, kind: WarningKind, message: String) {
        warn!("{}", message);
        self.warnings.push(Warning { kind, message });
    }

    pub fn has_warning(&self, kind: WarningKind) -> bool {
        self.warnings.iter().any(|w| w.kind == kind)
    }
}

/// Runs [`check_consistency`] and discards the report.
pub fn is_consistent(det: &Detector, verbose: bool) -> bool {
    check_consistency(det, verbose).is_ok()
}

/// Checks the internal consistency of a detector.
///
/// With `verbose`, every empty collection of the material, mask and
/// accelerator stores is reported as a warning.
pub fn check_consistency(det: &Detector, verbose: bool) -> Result<CheckReport, ConsistencyError> {
    let report = check_empty(det, verbose)?;

    for (idx, vol) in det.volumes.iter().enumerate() {
        vol.self_check(det)
            .map_err(|details| ConsistencyError::InvalidVolume { index: idx, details })?;

        if vol.index != idx {
            return Err(ConsistencyError::VolumeIndexMismatch {
                position: idx,
                volume: vol.to_string(),
            });
        }

        det.visit_surfaces(vol, |sf| check_volume_surface(det, vol, sf))?;

        if let Some(link) = vol.material {
            check_material(&det.materials, &link)?;
        }
    }

    for (idx, sf) in det.surfaces.iter().enumerate() {
        sf.self_check(det)
            .map_err(|details| ConsistencyError::InvalidSurface {
                index: idx,
                details: format!("{}\nat surface no. {}", details, idx),
            })?;

        if sf.index != idx {
            return Err(ConsistencyError::SurfaceIndexMismatch {
                position: idx,
                surface: sf.to_string(),
            });
        }

        let vol = det
            .volumes
            .get(sf.volume)
            .ok_or_else(|| ConsistencyError::InvalidSurface {
                index: idx,
                details: format!("owning volume {} does not exist", sf.volume),
            })?;

        let mut is_registered = false;
        det.visit_surfaces(vol, |candidate| {
            if candidate.volume != sf.volume {
                return Err(ConsistencyError::SurfaceVolumeMismatch {
                    volume: vol.index,
                    surface: candidate.to_string(),
                });
            }
            if candidate == sf {
                is_registered = true;
            }
            Ok(())
        })?;

        if !is_registered {
            return Err(ConsistencyError::UnregisteredSurface {
                surface: sf.to_string(),
            });
        }

        if let Some(link) = sf.material {
            check_material(&det.materials, &link)?;
        }
    }

    Ok(report)
}

/// Structural presence is fatal, everything else only warns.
fn check_empty(det: &Detector, verbose: bool) -> Result<CheckReport, ConsistencyError> {
    if det.volumes.is_empty() {
        return Err(ConsistencyError::NoVolumes);
    }
    if det.surfaces.is_empty() {
        return Err(ConsistencyError::NoSurfaces);
    }
    if det.transforms.is_empty() {
        return Err(ConsistencyError::NoTransforms);
    }
    if det.masks.all_empty() {
        return Err(ConsistencyError::NoMasks);
    }
    if det.portals().next().is_none() {
        return Err(ConsistencyError::NoPortals);
    }

    let mut report = CheckReport::default();

    if det.materials.all_empty() {
        report.warn(WarningKind::NoMaterial, "no material in detector".to_string());
    } else if verbose {
        for kind in MaterialKind::stored() {
            if det.materials.empty(kind) {
                report.warn(
                    WarningKind::EmptyCollection,
                    format!("material store has empty collection: {}", kind),
                );
            }
        }
    }

    if verbose {
        for (shape, masks) in det.masks.iter() {
            if masks.is_empty() {
                report.warn(
                    WarningKind::EmptyCollection,
                    format!("mask store has empty collection: {}", shape.name()),
                );
            }
        }

        if det.accelerators.brute_force.is_empty() {
            report.warn(
                WarningKind::EmptyCollection,
                "acceleration structure store has empty collection: brute force".to_string(),
            );
        }
        for (frame, grids) in det.accelerators.grids.iter() {
            if grids.is_empty() {
                report.warn(
                    WarningKind::EmptyCollection,
                    format!(
                        "acceleration structure store has empty collection: {:?} grid",
                        frame
                    ),
                );
            }
        }
    }

    if det.volume_finder.all().next().is_none() {
        report.warn(
            WarningKind::EmptyVolumeFinder,
            "no entries in volume finder".to_string(),
        );
    }

    Ok(report)
}

/// Checks a surface found in the acceleration structures of `vol`.
fn check_volume_surface(det: &Detector, vol: &Volume, sf: &Surface) -> Result<(), ConsistencyError> {
    sf.self_check(det)
        .map_err(|details| ConsistencyError::InvalidSurface {
            index: sf.index,
            details,
        })?;

    if sf.volume != vol.index {
        return Err(ConsistencyError::SurfaceVolumeMismatch {
            volume: vol.index,
            surface: sf.to_string(),
        });
    }

    // The mask was resolved by the self check
    if let Some(link) = det.mask(&sf.mask).and_then(|mask| mask.volume_link()) {
        if link >= det.volumes.len() {
            return Err(ConsistencyError::DanglingVolumeLink {
                link,
                surface: sf.to_string(),
            });
        }
    }

    match det.surface(sf.index) {
        Some(from_lookup) if from_lookup == sf => Ok(()),
        from_lookup => Err(ConsistencyError::SurfaceLookupMismatch {
            in_volume: sf.to_string(),
            in_lookup: from_lookup.map_or_else(|| "none".to_string(), Surface::to_string),
        }),
    }
}

fn check_material(store: &MaterialStore, link: &MaterialLink) -> Result<(), ConsistencyError> {
    let invalid = |details: String| ConsistencyError::InvalidMaterial {
        kind: link.kind,
        index: link.index,
        details,
    };
    let missing = || invalid("no such material".to_string());

    match link.kind {
        MaterialKind::None => Err(invalid("material link of kind none".to_string())),
        MaterialKind::Slab => {
            let slab = store.slabs.get(link.index).ok_or_else(missing)?;
            if slab.is_valid() {
                Ok(())
            } else {
                Err(invalid(format!("homogeneous surface material {}", slab)))
            }
        }
        MaterialKind::Rod => {
            let rod = store.rods.get(link.index).ok_or_else(missing)?;
            if rod.is_valid() {
                Ok(())
            } else {
                Err(invalid(format!("homogeneous surface material {}", rod)))
            }
        }
        MaterialKind::Raw => {
            let mat = store.raw.get(link.index).ok_or_else(missing)?;
            if mat.is_vacuum() {
                Err(invalid(format!("homogeneous volume material {}", mat)))
            } else {
                Ok(())
            }
        }
        MaterialKind::Map(frame) => {
            let map = store.maps.get(frame, link.index).ok_or_else(missing)?;
            check_material_map(map, link)
        }
    }
}

fn check_material_map(map: &MaterialMap, link: &MaterialLink) -> Result<(), ConsistencyError> {
    if map.n_bins() == 0 {
        return Err(ConsistencyError::EmptyMaterialMap {
            kind: link.kind,
            index: link.index,
        });
    }
    if let Some(bin) = map.bins().iter().position(Vec::is_empty) {
        return Err(ConsistencyError::EmptyMaterialBin {
            kind: link.kind,
            index: link.index,
            bin,
        });
    }
    match map.all().find(|slab| !slab.is_valid()) {
        Some(slab) => Err(ConsistencyError::InvalidMaterial {
            kind: link.kind,
            index: link.index,
            details: format!("material map entry {}", slab),
        }),
        None => Ok(()),
    }
}
