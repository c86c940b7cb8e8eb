//! Regular binned grids over the coordinates of a local frame.
//!
//! Grids back the surface acceleration structures of volumes and the
//! material maps of surfaces and volumes. A bin holds any number of entries.

use serde::{Deserialize, Serialize};

use crate::frames::FrameId;
use crate::geom::{Point3, Scalar};


/// Closed, equidistant axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub min: Scalar,
    pub max: Scalar,
    pub n_bins: usize,
}

impl Axis {
    pub fn new(min: Scalar, max: Scalar, n_bins: usize) -> Self {
        Self { min, max, n_bins }
    }

    pub fn bin_width(&self) -> Scalar {
        (self.max - self.min) / self.n_bins as Scalar
    }

    pub fn bin_centre(&self, bin: usize) -> Scalar {
        self.min + (bin as Scalar + 0.5) * self.bin_width()
    }

    /// Bin containing `x`. The upper edge belongs to the last bin.
    pub fn bin(&self, x: Scalar) -> Option<usize> {
        if self.n_bins == 0 || !(self.min..=self.max).contains(&x) {
            return None;
        }
        let bin = ((x - self.min) / self.bin_width()) as usize;
        Some(bin.min(self.n_bins - 1))
    }
}

/// Grid over the native coordinates of a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid<T> {
    pub frame: FrameId,
    pub axes: Vec<Axis>,
    bins: Vec<Vec<T>>,
}

impl<T> Grid<T> {
    pub fn new(frame: FrameId, axes: Vec<Axis>) -> Self {
        let n_bins = axes.iter().map(|a| a.n_bins).product::<usize>();
        Self {
            frame,
            axes,
            bins: (0..n_bins).map(|_| Vec::new()).collect(),
        }
    }

    pub fn n_bins(&self) -> usize {
        self.bins.len()
    }

    pub fn bins(&self) -> &[Vec<T>] {
        &self.bins
    }

    pub fn bin_mut(&mut self, global_bin: usize) -> Option<&mut Vec<T>> {
        self.bins.get_mut(global_bin)
    }

    /// All entries of all bins.
    pub fn all(&self) -> impl Iterator<Item = &T> {
        self.bins.iter().flatten()
    }

    /// Global bin index of a point given in the frame's native coordinates.
    /// `None` outside the grid, or if the grid has more than three axes.
    pub fn global_bin(&self, coords: &Point3) -> Option<usize> {
        if self.axes.len() > coords.len() {
            return None;
        }
        let mut global = 0;
        let mut stride = 1;
        for (i, axis) in self.axes.iter().enumerate() {
            global += axis.bin(coords[i])? * stride;
            stride *= axis.n_bins;
        }
        Some(global)
    }

    /// Adds `value` to the bin of a point given in the local cartesian frame.
    /// Returns `false` if the point is outside the grid.
    pub fn populate(&mut self, local3: &Point3, value: T) -> bool {
        let coords = self.frame.coordinates(local3);
        match self.global_bin(&coords) {
            Some(bin) => {
                self.bins[bin].push(value);
                true
            }
            None => false,
        }
    }

    /// Entries of the bin of a point given in the local cartesian frame.
    pub fn search(&self, local3: &Point3) -> &[T] {
        let coords = self.frame.coordinates(local3);
        match self.global_bin(&coords) {
            Some(bin) => &self.bins[bin],
            None => &[],
        }
    }
}
