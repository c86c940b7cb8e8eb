//! Conversion of detector data into serialisable payloads.
//!
//! Payloads are plain data carrying the registry ids of the types they
//! describe. [`MaterialMapWriter`] turns the material maps of a detector into
//! one grid payload per mapped surface, grouped by volume.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::detector::Detector;
use crate::geom::Scalar;
use crate::grid::{Axis, Grid};
use crate::material::{MaterialKind, MaterialSlab};
use crate::registry::MaterialId;


/// Version string written into every header.
pub fn version() -> String {
    format!("{} - {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

/// Current UTC date and time, `yyyy-mm-ddT hh:mm:ssZ`.
pub fn current_date() -> String {
    chrono::Utc::now().format("%FT %TZ").to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommonHeaderPayload {
    pub version: String,
    pub detector: String,
    pub tag: String,
    pub date: String,
}

impl CommonHeaderPayload {
    pub fn new(detector: &str, tag: &str) -> Self {
        Self {
            version: version(),
            detector: detector.to_string(),
            tag: tag.to_string(),
            date: current_date(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridHeaderPayload {
    pub common: CommonHeaderPayload,
    pub n_grids: usize,
}

/// Homogeneous material, `mat` holds X0, L0, Ar, Z and the mass density.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialSlabPayload {
    pub mat_type: MaterialId,
    pub index_in_coll: usize,
    pub thickness: Scalar,
    pub mat: [Scalar; 5],
}

impl MaterialSlabPayload {
    pub fn new(slab: &MaterialSlab, index_in_coll: usize) -> Self {
        let m = &slab.material;
        Self {
            mat_type: MaterialId::Slab,
            index_in_coll,
            thickness: slab.thickness,
            mat: [m.x0, m.l0, m.ar, m.z, m.mass_density],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedLinkPayload<Id> {
    #[serde(rename = "type")]
    pub id: Id,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinPayload<T> {
    /// Bin index on each axis
    pub loc_index: Vec<usize>,
    pub content: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridPayload<T, Id> {
    /// Volume-local index of the surface owning the grid
    pub owner_link: usize,
    pub grid_link: TypedLinkPayload<Id>,
    pub axes: Vec<Axis>,
    pub bins: Vec<BinPayload<T>>,
}

/// Grids keyed by the index of the volume they belong to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorGridsPayload<T, Id> {
    pub grids: BTreeMap<usize, Vec<GridPayload<T, Id>>>,
}

impl<T, Id> Default for DetectorGridsPayload<T, Id> {
    fn default() -> Self {
        Self {
            grids: BTreeMap::new(),
        }
    }
}

/// Header and data, as written to file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridFilePayload<T, Id> {
    pub header: GridHeaderPayload,
    pub data: DetectorGridsPayload<T, Id>,
}

/// Splits a global bin index into one index per axis, first axis fastest.
pub fn local_bin_indices(axes: &[Axis], global_bin: usize) -> Vec<usize> {
    let mut rest = global_bin;
    axes.iter()
        .map(|axis| {
            let n = axis.n_bins.max(1);
            let idx = rest % n;
            rest /= n;
            idx
        })
        .collect()
}

/// Converts a grid, mapping every entry through `convert`.
pub fn grid_to_payload<T, U, Id, F>(
    grid: &Grid<T>,
    grid_link: TypedLinkPayload<Id>,
    owner_link: usize,
    mut convert: F,
) -> GridPayload<U, Id>
where
    F: FnMut(&T) -> U,
{
    let bins = grid
        .bins()
        .iter()
        .enumerate()
        .map(|(global, entries)| BinPayload {
            loc_index: local_bin_indices(&grid.axes, global),
            content: entries.iter().map(&mut convert).collect(),
        })
        .collect();

    GridPayload {
        owner_link,
        grid_link,
        axes: grid.axes.clone(),
        bins,
    }
}

pub type MaterialGridsPayload = DetectorGridsPayload<MaterialSlabPayload, MaterialId>;

/// Writes the surface material maps of a detector.
pub struct MaterialMapWriter;

impl MaterialMapWriter {
    pub const TAG: &'static str = "material_maps";

    pub fn header_to_payload(det: &Detector, det_name: &str) -> GridHeaderPayload {
        GridHeaderPayload {
            common: CommonHeaderPayload::new(det_name, Self::TAG),
            n_grids: det.materials.maps.len(),
        }
    }

    /// One grid payload per surface with a material map. Surfaces are
    /// identified by their index within the volume.
    pub fn to_payload(det: &Detector, _names: &BTreeMap<usize, String>) -> MaterialGridsPayload {
        let mut payload = MaterialGridsPayload::default();

        for vol in &det.volumes {
            let surfaces = det.volume_surfaces(vol);
            let offset = surfaces.iter().map(|sf| sf.index).min().unwrap_or(0);

            for sf in &surfaces {
                let Some(link) = sf.material else {
                    continue;
                };
                let MaterialKind::Map(frame) = link.kind else {
                    continue;
                };
                let Some(map) = det.materials.maps.get(frame, link.index) else {
                    continue;
                };

                let grid_link = TypedLinkPayload {
                    id: MaterialId::from(link.kind),
                    index: link.index,
                };
                let grid = grid_to_payload(map, grid_link, sf.index - offset, |slab| {
                    MaterialSlabPayload::new(slab, sf.index)
                });
                payload.grids.entry(vol.index).or_default().push(grid);
            }
        }

        payload
    }

    pub fn write_payload(
        det: &Detector,
        names: &BTreeMap<usize, String>,
    ) -> GridFilePayload<MaterialSlabPayload, MaterialId> {
        GridFilePayload {
            header: Self::header_to_payload(det, &det.name),
            data: Self::to_payload(det, names),
        }
    }

    pub fn write(det: &Detector, names: &BTreeMap<usize, String>, path: &Path) -> Result<()> {
        write_json(path, &Self::write_payload(det, names))
    }
}

/// Writes `payload` as pretty-printed JSON.
pub fn write_json<T: Serialize>(path: &Path, payload: &T) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("could not create output file {}", path.display()))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, payload)
        .with_context(|| format!("could not write payload to {}", path.display()))?;
    Ok(())
}
