// THEORY:
// The `ClusterScanner` is the orchestrator of the tiling layer. It slices the scene
// into fixed-size tiles, asks each `Tile` how homogeneous its vegetation index is,
// and collects the pixels of every homogeneous tile into the two candidate pools
// the pixel selector draws from.
//
// Key architectural principles:
// 1.  **Orchestration**: It is not an analyzer itself. The statistic belongs to the
//     `Tile`; the scanner only walks tile origins and routes accepted pixels.
// 2.  **Deterministic Walk**: Tile origins advance column of tiles by column of
//     tiles (x0 outer, y0 inner). Together with the column-major gathering inside a
//     tile, this fixes the pool order used by every later tie-break.
// 3.  **Exact Cover**: Origins step by exactly one tile size and edge tiles are
//     clipped, so every cell of the scene lands in exactly one tile.
// 4.  **Borrowing Pools**: Pools hold references into the grid. Nothing is copied
//     until a final pixel is handed back to the caller.

use log::debug;

use crate::config::SelectionConfig;
use crate::core_modules::pixel::pixel::Pixel;
use crate::core_modules::pixel_grid::PixelGrid;
use crate::core_modules::tile::tile::{Tile, TileBounds};
use crate::error::SelectionResult;

/// Pixels of all homogeneous tiles, ready for percentile filtering.
#[derive(Debug, Clone, Default)]
pub struct CandidatePools<'a> {
    /// Pool the cold (wet) anchor is searched in.
    pub cold: Vec<&'a Pixel>,
    /// Pool the hot (dry) anchor is searched in.
    pub hot: Vec<&'a Pixel>,
    pub tiles_scanned: usize,
    pub accepted_tiles: Vec<TileBounds>,
}

/// Tiles a scene and tests the vegetation-index homogeneity of each tile.
#[derive(Debug, Clone)]
pub struct ClusterScanner {
    tile_width: u32,
    tile_height: u32,
    max_cv_for_ndvi: f64,
    max_invalid_ndvi: u32,
}

impl ClusterScanner {
    /// Fails on a configuration that cannot tile a scene, such as a zero tile size.
    pub fn new(config: &SelectionConfig) -> SelectionResult<Self> {
        config.validate()?;
        Ok(Self {
            tile_width: config.tile_width,
            tile_height: config.tile_height,
            max_cv_for_ndvi: config.max_cv_for_ndvi,
            max_invalid_ndvi: config.max_invalid_ndvi,
        })
    }

    /// Tile origins and extents for a `width` x `height` scene, in scan order.
    pub fn tile_layout(&self, width: u32, height: u32) -> Vec<TileBounds> {
        let mut layout = Vec::new();
        for x0 in (0..width).step_by(self.tile_width as usize) {
            for y0 in (0..height).step_by(self.tile_height as usize) {
                layout.push(TileBounds {
                    x0,
                    y0,
                    width: self.tile_width.min(width - x0),
                    height: self.tile_height.min(height - y0),
                });
            }
        }
        layout
    }

    /// Walks every tile of the grid once and pools the pixels of the homogeneous ones.
    pub fn scan<'a>(&self, grid: &'a PixelGrid) -> CandidatePools<'a> {
        let mut pools = CandidatePools::default();

        for bounds in self.tile_layout(grid.width(), grid.height()) {
            let tile = Tile::cut(grid, bounds.x0, bounds.y0, bounds.width, bounds.height);
            pools.tiles_scanned += 1;

            let homogeneity = tile.ndvi_homogeneity(self.max_invalid_ndvi);
            if homogeneity.is_homogeneous(self.max_cv_for_ndvi) {
                pools.cold.extend(tile.pixels.iter().copied());
                pools.hot.extend(tile.pixels.iter().copied());
                pools.accepted_tiles.push(tile.bounds);
            }
        }

        debug!(
            "scanned {} tiles, {} homogeneous, {} pooled pixels",
            pools.tiles_scanned,
            pools.accepted_tiles.len(),
            pools.cold.len()
        );
        pools
    }
}
