//! Shoots helices from the origin through the cylinders of a detector.
//!
//! Each helix is intersected with every cylindrical surface independently,
//! so the helices are distributed over the rayon thread pool.

use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::TESLA;
use crate::detector::Detector;
use crate::geom::{Point3, Scalar, Vector3};
use crate::helix::Helix;
use crate::intersection::Intersection;
use crate::intersector::HelixCylinderIntersector;


/// Helix gun and field. Momentum in GeV, field in tesla along z.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    pub n_helices: usize,
    pub momentum: Scalar,
    pub charge: Scalar,
    pub b_field: Scalar,
    /// Directions are drawn with `|cos(theta)| <= max_cos_theta`
    pub max_cos_theta: Scalar,
    pub mask_tolerance: Scalar,
    pub seed: Option<u64>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            n_helices: 1000,
            momentum: 1.0,
            charge: -1.0,
            b_field: 2.0,
            max_cos_theta: 0.5,
            mask_tolerance: 1e-3,
            seed: None,
        }
    }
}

/// Intersection of a helix with a surface, inside the mask.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    pub surface: usize,
    pub volume: usize,
    pub intersection: Intersection,
}

/// Helices starting at the origin with random direction.
pub fn generate_helices(config: &ScanConfig) -> Vec<Helix> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let b_field = Vector3::new(0.0, 0.0, config.b_field * TESLA);
    let qop = config.charge / config.momentum;
    let m = config.max_cos_theta;

    (0..config.n_helices)
        .map(|_| {
            let phi: Scalar = rng.random_range(-PI..PI);
            let cos_theta: Scalar = rng.random_range(-m..=m);
            let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();
            let dir = Vector3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta);
            Helix::new(Point3::origin(), dir, qop, b_field)
        })
        .collect()
}

/// All cylinders the helix crosses inside their masks, ordered by path.
pub fn shoot_helix(det: &Detector, h: &Helix, mask_tolerance: Scalar) -> Vec<SurfaceHit> {
    let intersector = HelixCylinderIntersector;

    let mut hits: Vec<SurfaceHit> = det
        .surfaces
        .iter()
        .filter(|sf| sf.mask.shape.is_cylinder())
        .filter_map(|sf| {
            let mask = det.mask(&sf.mask)?;
            let trf = det.transform(sf.transform)?;
            let [is, _] = intersector.intersect(h, mask, trf, mask_tolerance);
            is.is_inside().then_some(SurfaceHit {
                surface: sf.index,
                volume: sf.volume,
                intersection: is,
            })
        })
        .collect();

    hits.sort_by(|a, b| a.intersection.path.total_cmp(&b.intersection.path));
    hits
}

/// Shoots every helix in parallel. The result keeps the order of `helices`.
pub fn scan(det: &Detector, helices: &[Helix], mask_tolerance: Scalar) -> Vec<Vec<SurfaceHit>> {
    helices
        .par_iter()
        .map(|h| shoot_helix(det, h, mask_tolerance))
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub n_helices: usize,
    pub n_hits: usize,
    /// Helices that crossed no cylinder
    pub n_empty: usize,
    pub hits_per_volume: BTreeMap<usize, usize>,
}

impl ScanSummary {
    pub fn new(hits: &[Vec<SurfaceHit>]) -> Self {
        let mut summary = Self {
            n_helices: hits.len(),
            ..Self::default()
        };
        for record in hits {
            if record.is_empty() {
                summary.n_empty += 1;
            }
            summary.n_hits += record.len();
            for hit in record {
                *summary.hits_per_volume.entry(hit.volume).or_insert(0) += 1;
            }
        }
        summary
    }
}

/// Average time spent per helix. No division for an empty scan.
pub fn time_per_helix(duration: Duration, n_helices: usize) -> Duration {
    duration.div_f64(n_helices.max(1) as f64)
}
