// THEORY:
// A `WaterSample` is one spatially coherent region of open water discovered by a
// single flood fill. It is a "dumb" data container: the detector grows it, the
// refinement step reads its extents, and the in-water candidate is picked from its
// members. It lives for one detection pass only.
//
// Member order is insertion order, i.e. the order the fill reached the cells. The
// in-water candidate is the first member close enough to the sample mean, so this
// order is part of the result and must not be re-sorted.

use std::collections::HashSet;

use crate::core_modules::pixel::pixel::Pixel;
use crate::core_modules::utils::stats;

#[derive(Debug, Clone)]
pub struct WaterSample<'a> {
    /// Identifier assigned in discovery order for the current pass only.
    pub id: u64,
    pixels: Vec<&'a Pixel>,
    rows: HashSet<u32>,
    cols: HashSet<u32>,
}

impl<'a> WaterSample<'a> {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            pixels: Vec::new(),
            rows: HashSet::new(),
            cols: HashSet::new(),
        }
    }

    /// Adds `pixel`, found by the fill at grid position (x, y).
    pub fn add_pixel(&mut self, pixel: &'a Pixel, x: u32, y: u32) {
        self.rows.insert(y);
        self.cols.insert(x);
        self.pixels.push(pixel);
    }

    pub fn pixels(&self) -> &[&'a Pixel] {
        &self.pixels
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Number of distinct rows the sample touches.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of distinct columns the sample touches.
    pub fn col_count(&self) -> usize {
        self.cols.len()
    }

    pub fn mean_ts(&self) -> Option<f64> {
        stats::mean(self.pixels.iter().map(|p| p.ts))
    }
}
