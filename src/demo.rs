//! A small cylindrical barrel detector.
//!
//! The innermost volume around the beam line is followed by one volume per
//! layer. Every volume is closed by concentric cylinder portals in r and by
//! ring portals at both ends in z, the layer volumes hold one sensitive
//! cylinder each.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::detector::{Detector, SurfaceKind};
use crate::frames::FrameId;
use crate::geom::{Scalar, Transform3, Vector3};
use crate::grid::{Axis, Grid};
use crate::mask::{Mask, Shape};
use crate::material::{Material, MaterialKind, MaterialLink, MaterialMap, MaterialSlab};

#[cfg(test)]
mod tests {

    use super::*;
    use crate::checker::{check_consistency, WarningKind};
    use crate::geom::Point3;

    #[test]
    fn default_barrel_is_consistent() {
        let config = DemoConfig::default();
        let det = barrel_detector(&config);
        assert_eq!(det.volumes.len(), config.layer_radii.len() + 1);

        let report = check_consistency(&det, false).unwrap();
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    }

    #[test]
    fn material_map_barrel_is_consistent() {
        let config = DemoConfig {
            use_material_maps: true,
            surface_grids: false,
            ..DemoConfig::default()
        };
        let det = barrel_detector(&config);
        assert!(det.materials.slabs.is_empty());
        assert_eq!(
            det.materials.maps.size(FrameId::ConcentricCylindrical2),
            config.layer_radii.len()
        );
        assert!(check_consistency(&det, true).is_ok());
    }

    #[test]
    fn portal_links_chain_volumes() {
        let det = barrel_detector(&DemoConfig::default());
        let n = det.volumes.len();
        for vol in &det.volumes {
            for sf in det.volume_surfaces(vol) {
                let link = det.mask(&sf.mask).and_then(|m| m.volume_link());
                match sf.kind {
                    SurfaceKind::Portal => {
                        if let Some(next) = link {
                            assert!(next + 1 == vol.index || next == vol.index + 1);
                            assert!(next < n);
                        }
                    }
                    _ => assert_eq!(link, Some(vol.index)),
                }
            }
        }
    }

    #[test]
    fn volume_finder_matches_layers() {
        let config = DemoConfig::default();
        let det = barrel_detector(&config);
        assert_eq!(det.find_volume(&Point3::new(0.0, 1.0, 0.0)), Some(0));
        for (i, r) in config.layer_radii.iter().enumerate() {
            assert_eq!(det.find_volume(&Point3::new(*r, 0.0, 10.0)), Some(i + 1));
        }
        assert_eq!(det.find_volume(&Point3::new(0.0, 0.0, 2.0 * config.half_z)), None);
        assert_eq!(det.names.get(&0).map(String::as_str), Some("beampipe"));
    }

    #[test]
    fn no_layers_gives_no_volumes() {
        let config = DemoConfig {
            layer_radii: Vec::new(),
            ..DemoConfig::default()
        };
        let det = barrel_detector(&config);
        assert!(det.volumes.is_empty());
        assert!(det.surfaces.is_empty());
        assert!(matches!(
            check_consistency(&det, false),
            Err(crate::checker::ConsistencyError::NoVolumes)
        ));
    }

    #[test]
    fn layer_edges_are_between_radii() {
        let edges = layer_edges(&[30.0, 70.0, 110.0]);
        assert_eq!(edges, vec![15.0, 50.0, 90.0, 130.0]);
        assert_eq!(layer_edges(&[40.0]), vec![20.0, 60.0]);
    }
}

/// Layout of the demo barrel. Lengths in mm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoConfig {
    /// Radii of the sensitive layers, increasing
    pub layer_radii: Vec<Scalar>,
    pub half_z: Scalar,
    pub sensor_thickness: Scalar,
    /// Attach material maps instead of homogeneous slabs
    pub use_material_maps: bool,
    /// Bins of the material maps in phi and z
    pub map_bins: (usize, usize),
    /// Also register the sensitive layers in a (phi, z) surface grid
    pub surface_grids: bool,
    /// Number of radial bins of the volume finder
    pub finder_bins: usize,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            layer_radii: vec![32.0, 72.0, 116.0, 172.0],
            half_z: 500.0,
            sensor_thickness: 0.15,
            use_material_maps: false,
            map_bins: (20, 10),
            surface_grids: true,
            finder_bins: 200,
        }
    }
}

/// Radial volume boundaries: halfway between neighbouring layers, half the
/// first radius on the inside and mirrored on the outside.
pub fn layer_edges(radii: &[Scalar]) -> Vec<Scalar> {
    let Some((first, last)) = radii.first().zip(radii.last()) else {
        return Vec::new();
    };

    let mut edges = vec![0.5 * first];
    edges.extend(radii.windows(2).map(|w| 0.5 * (w[0] + w[1])));
    let outer_gap = match radii.len() {
        1 => 0.5 * first,
        n => 0.5 * (radii[n - 1] - radii[n - 2]),
    };
    edges.push(last + outer_gap);
    edges
}

/// Builds the barrel. The layout values are assumed to be sane, see
/// [`crate::settings::validate_config`]. Without layers the detector has no
/// volumes.
pub fn barrel_detector(config: &DemoConfig) -> Detector {
    let mut det = Detector::new("barrel");
    let edges = layer_edges(&config.layer_radii);
    if edges.is_empty() {
        return det;
    }
    let n_volumes = config.layer_radii.len() + 1;
    let half_z = config.half_z;

    for vol_idx in 0..n_volumes {
        let r_min = if vol_idx == 0 { 0.0 } else { edges[vol_idx - 1] };
        let r_max = edges[vol_idx];

        let vol = det.add_volume(
            Mask::new(Shape::Cylinder3, &[r_min, -PI, -half_z, r_max, PI, half_z], None),
            Transform3::identity(),
            None,
        );
        let name = if vol == 0 {
            "beampipe".to_string()
        } else {
            format!("layer_{}", vol)
        };
        det.names.insert(vol, name);

        // Portals in r
        if vol > 0 {
            det.add_surface(
                vol,
                SurfaceKind::Portal,
                Transform3::identity(),
                Mask::new(Shape::ConcentricCylinder2, &[r_min, -half_z, half_z], Some(vol - 1)),
                None,
            );
        }
        let outer_link = (vol + 1 < n_volumes).then_some(vol + 1);
        det.add_surface(
            vol,
            SurfaceKind::Portal,
            Transform3::identity(),
            Mask::new(Shape::ConcentricCylinder2, &[r_max, -half_z, half_z], outer_link),
            None,
        );

        // Portals in z leave the detector
        for z in [-half_z, half_z] {
            det.add_surface(
                vol,
                SurfaceKind::Portal,
                Transform3::from_translation(Vector3::new(0.0, 0.0, z)),
                Mask::new(Shape::Ring2, &[r_min, r_max], None),
                None,
            );
        }

        if vol > 0 {
            add_layer(&mut det, config, vol, config.layer_radii[vol - 1]);
        }
    }

    det.volume_finder = volume_finder(&edges, config);
    det
}

fn add_layer(det: &mut Detector, config: &DemoConfig, vol: usize, radius: Scalar) {
    let half_z = config.half_z;
    let slab = MaterialSlab::new(Material::silicon(), config.sensor_thickness);

    let material = if config.use_material_maps {
        let (n_phi, n_z) = config.map_bins;
        let frame = FrameId::ConcentricCylindrical2;
        let mut map = MaterialMap::new(
            frame,
            vec![Axis::new(-PI, PI, n_phi), Axis::new(-half_z, half_z, n_z)],
        );
        for bin in 0..map.n_bins() {
            if let Some(entries) = map.bin_mut(bin) {
                entries.push(slab);
            }
        }
        MaterialLink::new(MaterialKind::Map(frame), det.materials.maps.push(frame, map))
    } else {
        det.materials.slabs.push(slab);
        MaterialLink::new(MaterialKind::Slab, det.materials.slabs.len() - 1)
    };

    let sf_idx = det.add_surface(
        vol,
        SurfaceKind::Sensitive,
        Transform3::identity(),
        Mask::new(Shape::Cylinder2, &[radius, -half_z, half_z], Some(vol)),
        Some(material),
    );

    if config.surface_grids {
        let sf = det.surfaces[sf_idx];
        let mut grid = Grid::new(
            FrameId::ConcentricCylindrical2,
            vec![Axis::new(-PI, PI, 4), Axis::new(-half_z, half_z, 2)],
        );
        // A full cylinder covers every bin
        for bin in 0..grid.n_bins() {
            if let Some(entries) = grid.bin_mut(bin) {
                entries.push(sf);
            }
        }
        det.add_surface_grid(vol, grid);
    }
}

/// Radially binned lookup from global position to volume index.
fn volume_finder(edges: &[Scalar], config: &DemoConfig) -> Grid<usize> {
    let r_max = edges.last().copied().unwrap_or(0.0);
    let mut finder = Grid::new(
        FrameId::Cylindrical3,
        vec![
            Axis::new(0.0, r_max, config.finder_bins),
            Axis::new(-PI, PI, 1),
            Axis::new(-config.half_z, config.half_z, 1),
        ],
    );

    let r_axis = finder.axes[0];
    for bin in 0..r_axis.n_bins {
        let r = r_axis.bin_centre(bin);
        let vol = edges.iter().position(|edge| r < *edge);
        if let (Some(vol), Some(entries)) = (vol, finder.bin_mut(bin)) {
            entries.push(vol);
        }
    }
    finder
}
