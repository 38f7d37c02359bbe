// THEORY:
// The `Tile` module represents a spatial grouping of pixels, the unit of the
// homogeneity test. A tile is a transient, borrowed view: it is cut from the grid,
// measured, its pixels possibly copied into candidate pools, and then dropped.
//
// Key architectural principles:
// 1.  **Clipped, Never Padded**: Tiles at the right and bottom edges of a scene are
//     cut to whatever is left of the image. No synthetic pixels are ever invented.
// 2.  **Column-Major Gathering**: Pixels of a tile are gathered column by column.
//     The order in which accepted pixels enter the pools is the order in which the
//     "first qualifying pixel" picks later break ties, so it is part of the result.
// 3.  **Single Statistic**: A tile only knows how to judge the homogeneity of its
//     own vegetation index. It does not know what happens to it afterwards.

pub mod tile {
    use crate::core_modules::pixel::pixel::Pixel;
    use crate::core_modules::pixel_grid::PixelGrid;
    use crate::core_modules::utils::stats;

    /// Coefficient of variation reported when a tile holds too many invalid samples.
    pub const FAIL_CV: f64 = 1.0;

    /// Outcome of the vegetation-index homogeneity test of one tile.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub enum NdviHomogeneity {
        /// The invalid-sample budget was exhausted before the scan finished.
        TooManyInvalid,
        /// Every pixel was cloud or non-positive, so there is nothing to measure.
        NoValidSamples,
        /// Sample standard deviation over mean of the valid vegetation indices.
        Measured(f64),
    }

    impl NdviHomogeneity {
        pub fn coefficient_of_variation(&self) -> Option<f64> {
            match self {
                NdviHomogeneity::TooManyInvalid => Some(FAIL_CV),
                NdviHomogeneity::NoValidSamples => None,
                NdviHomogeneity::Measured(cv) => Some(*cv),
            }
        }

        pub fn is_homogeneous(&self, max_cv: f64) -> bool {
            matches!(self.coefficient_of_variation(), Some(cv) if cv < max_cv)
        }
    }

    /// Position and extent of a tile in the scene.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TileBounds {
        pub x0: u32,
        pub y0: u32,
        pub width: u32,
        pub height: u32,
    }

    impl TileBounds {
        pub fn area(&self) -> usize {
            self.width as usize * self.height as usize
        }

        pub fn contains(&self, x: u32, y: u32) -> bool {
            x >= self.x0 && x < self.x0 + self.width && y >= self.y0 && y < self.y0 + self.height
        }
    }

    /// A borrowed rectangular block of pixels.
    pub struct Tile<'a> {
        pub bounds: TileBounds,
        /// Pixels of the block, gathered column by column.
        pub pixels: Vec<&'a Pixel>,
    }

    impl<'a> Tile<'a> {
        /// Cuts the block starting at (x0, y0), clipped to the grid.
        pub fn cut(grid: &'a PixelGrid, x0: u32, y0: u32, width: u32, height: u32) -> Self {
            let width = width.min(grid.width().saturating_sub(x0));
            let height = height.min(grid.height().saturating_sub(y0));
            let mut pixels = Vec::with_capacity(width as usize * height as usize);
            for x in x0..x0 + width {
                for y in y0..y0 + height {
                    pixels.push(grid.at(x, y));
                }
            }
            Self {
                bounds: TileBounds {
                    x0,
                    y0,
                    width,
                    height,
                },
                pixels,
            }
        }

        pub fn len(&self) -> usize {
            self.pixels.len()
        }

        pub fn is_empty(&self) -> bool {
            self.pixels.is_empty()
        }

        /// Measures how uniform the vegetation index of the block is. Cloud pixels
        /// and non-positive indices count against `max_invalid`; once that many have
        /// been seen the scan stops.
        pub fn ndvi_homogeneity(&self, max_invalid: u32) -> NdviHomogeneity {
            let mut valid = Vec::with_capacity(self.pixels.len());
            let mut invalid = 0u32;
            for pixel in &self.pixels {
                if !pixel.has_valid_ndvi() {
                    invalid += 1;
                    if invalid >= max_invalid {
                        return NdviHomogeneity::TooManyInvalid;
                    }
                    continue;
                }
                valid.push(pixel.ndvi);
            }

            match stats::coefficient_of_variation(&valid) {
                Some(cv) => NdviHomogeneity::Measured(cv),
                None => NdviHomogeneity::NoValidSamples,
            }
        }
    }
}
