// THEORY:
// The `pipeline` module is the top-level API of the anchor selection engine. It
// wires the tiling layer, the water layer and the percentile filters into the two
// decision procedures that pick the cold and the hot anchor pixel of one scene.
//
// A run is a single synchronous batch over an immutable grid:
// scan tiles -> detect water -> filter pools -> pick cold -> pick hot.
// Nothing in it suspends, locks or performs I/O, and running it twice on the same
// input yields the same pixels. "No pixel found" is an ordinary outcome, reported
// as `None`, never as an error.

use std::time::Instant;

use log::{debug, info, warn};

use crate::config::SelectionConfig;
use crate::core_modules::candidate_filter::{self, RankAttribute};
use crate::core_modules::cluster_scanner::ClusterScanner;
use crate::core_modules::pixel_grid::PixelGrid;
use crate::core_modules::utils::stats;
use crate::core_modules::water_detector::water_detector::WaterBodyDetector;
use crate::error::SelectionResult;

// Re-export key data structures for the public API.
pub use crate::core_modules::pixel::pixel::Pixel;
pub use crate::core_modules::tile::tile::TileBounds;

/// Cold search: keep the greenest 5% of the pool...
const COLD_BIGGEST_NDVI_PERCENT: f64 = 5.0;
/// ...then the coolest 20% of those.
const COLD_SMALLEST_TS_PERCENT: f64 = 20.0;
/// Hot search: keep the barest 10% of the vegetated pool...
const HOT_SMALLEST_NDVI_PERCENT: f64 = 10.0;
/// ...then the hottest 20% of those.
const HOT_BIGGEST_TS_PERCENT: f64 = 20.0;

/// The two anchors of a scene, borrowed from its grid.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Selection<'a> {
    pub cold: Option<&'a Pixel>,
    pub hot: Option<&'a Pixel>,
}

impl Selection<'_> {
    pub fn to_anchors(&self) -> AnchorPixels {
        AnchorPixels {
            cold: self.cold.copied(),
            hot: self.hot.copied(),
        }
    }
}

/// Owned copy of a `Selection`, for results that outlive their grid.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnchorPixels {
    pub cold: Option<Pixel>,
    pub hot: Option<Pixel>,
}

/// The full account of one selection run.
#[derive(Debug, Clone, Default)]
pub struct SelectionReport<'a> {
    pub selection: Selection<'a>,
    /// Cold candidate found in the best water sample.
    pub in_water_candidate: Option<&'a Pixel>,
    /// Cold candidate found among the filtered land pixels.
    pub out_of_water_candidate: Option<&'a Pixel>,
    pub tiles_scanned: usize,
    pub accepted_tiles: Vec<TileBounds>,
    pub cold_pool_size: usize,
    pub hot_pool_size: usize,
    pub cold_filtered_size: usize,
    pub hot_filtered_size: usize,
    pub water_samples_found: usize,
    pub water_samples_retained: usize,
    /// Members of the best water sample, as (column, row).
    pub best_water_sample: Vec<(u32, u32)>,
}

/// The main, top-level struct for the selection engine.
#[derive(Debug, Clone)]
pub struct PixelSelector {
    config: SelectionConfig,
    scanner: ClusterScanner,
    water_detector: WaterBodyDetector,
}

impl PixelSelector {
    /// Validates the configuration once and prepares the analyzers.
    pub fn new(config: SelectionConfig) -> SelectionResult<Self> {
        // The scanner refuses an invalid configuration.
        Ok(Self {
            scanner: ClusterScanner::new(&config)?,
            water_detector: WaterBodyDetector::new(&config),
            config,
        })
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    /// Picks the cold and hot anchors of `grid`.
    pub fn select<'a>(&self, grid: &'a PixelGrid) -> SelectionReport<'a> {
        debug!(
            "selecting anchors over {}x{} pixels",
            grid.width(),
            grid.height()
        );

        // Stage 1: Tiling & Homogeneity
        let started = Instant::now();
        let pools = self.scanner.scan(grid);
        debug!("cluster scan took {:?}", started.elapsed());

        // Stage 2: Water Detection
        let started = Instant::now();
        let water = self.water_detector.detect(grid);
        debug!("water detection took {:?}", started.elapsed());

        // Stage 3: Decision Procedures
        let started = Instant::now();
        let (out_of_water, cold_filtered_size) = self.select_cold_out_of_water(&pools.cold);
        let cold = choose_cold(water.candidate, out_of_water);
        let (hot, hot_filtered_size) = self.select_hot(&pools.hot);
        debug!("anchor selection took {:?}", started.elapsed());

        match cold {
            Some(pixel) => info!(
                "cold pixel at (row {}, col {}) with Ts {}",
                pixel.row, pixel.col, pixel.ts
            ),
            None => warn!("no cold pixel could be selected"),
        }
        match hot {
            Some(pixel) => info!(
                "hot pixel at (row {}, col {}) with Ts {}",
                pixel.row, pixel.col, pixel.ts
            ),
            None => warn!("no hot pixel could be selected"),
        }

        SelectionReport {
            selection: Selection { cold, hot },
            in_water_candidate: water.candidate,
            out_of_water_candidate: out_of_water,
            tiles_scanned: pools.tiles_scanned,
            cold_pool_size: pools.cold.len(),
            hot_pool_size: pools.hot.len(),
            cold_filtered_size,
            hot_filtered_size,
            water_samples_found: water.samples_found,
            water_samples_retained: water.samples_retained,
            best_water_sample: water
                .best_sample
                .map(|sample| sample.pixels().iter().map(|p| (p.col, p.row)).collect())
                .unwrap_or_default(),
            accepted_tiles: pools.accepted_tiles,
        }
    }

    /// Convenience wrapper returning only the anchors.
    pub fn select_anchors<'a>(&self, grid: &'a PixelGrid) -> Selection<'a> {
        self.select(grid).selection
    }

    /// Greenest 5%, then coolest 20% of those; first pixel close to both the mean
    /// temperature and the mean albedo of the survivors.
    fn select_cold_out_of_water<'a>(&self, pool: &[&'a Pixel]) -> (Option<&'a Pixel>, usize) {
        debug!("cold candidate pool holds {} pixels", pool.len());
        let greenest = candidate_filter::biggest(pool, RankAttribute::Ndvi, COLD_BIGGEST_NDVI_PERCENT);
        let candidates = candidate_filter::smallest(
            &greenest,
            RankAttribute::SurfaceTemperature,
            COLD_SMALLEST_TS_PERCENT,
        );

        let picked = pick_near_means(
            &candidates,
            self.config.max_ts_deviation,
            Some(self.config.max_albedo_deviation),
        );
        (picked, candidates.len())
    }

    /// Barest 10% of the vegetated pixels, then hottest 20% of those; first pixel
    /// close to their mean temperature.
    fn select_hot<'a>(&self, pool: &[&'a Pixel]) -> (Option<&'a Pixel>, usize) {
        debug!("hot candidate pool holds {} pixels", pool.len());
        let barest = candidate_filter::smallest_positive_ndvi(pool, HOT_SMALLEST_NDVI_PERCENT);
        let candidates = candidate_filter::biggest(
            &barest,
            RankAttribute::SurfaceTemperature,
            HOT_BIGGEST_TS_PERCENT,
        );

        let picked = pick_near_means(&candidates, self.config.max_ts_deviation, None);
        (picked, candidates.len())
    }
}

/// The in-water candidate must be strictly cooler to win; otherwise the land
/// candidate is kept.
fn choose_cold<'a>(in_water: Option<&'a Pixel>, out_of_water: Option<&'a Pixel>) -> Option<&'a Pixel> {
    match (in_water, out_of_water) {
        (Some(water), Some(land)) => Some(if water.ts < land.ts { water } else { land }),
        (Some(water), None) => Some(water),
        (None, land) => land,
    }
}

/// First candidate whose temperature (and, when given, albedo) lies within the
/// allowed deviation of the candidates' mean.
fn pick_near_means<'a>(
    candidates: &[&'a Pixel],
    max_ts_deviation: f64,
    max_albedo_deviation: Option<f64>,
) -> Option<&'a Pixel> {
    let Some(mean_ts) = stats::mean(candidates.iter().map(|p| p.ts)) else {
        warn!("candidate pool is empty after filtering");
        return None;
    };
    let mean_albedo = stats::mean(candidates.iter().map(|p| p.albedo))?;

    candidates.iter().copied().find(|pixel| {
        pixel.ts_within(mean_ts, max_ts_deviation)
            && max_albedo_deviation.is_none_or(|dev| pixel.albedo_within(mean_albedo, dev))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn land(ts: f64, albedo: f64) -> Pixel {
        Pixel::new(0, 0, 0.5, ts, albedo)
    }

    #[test]
    fn near_mean_pick_is_the_exact_mean_pixel() {
        let data: Vec<Pixel> = [10.0, 12.0, 14.0, 16.0, 18.0]
            .iter()
            .enumerate()
            .map(|(i, &ts)| Pixel::new(0, i as u32, 0.5, ts, 0.2))
            .collect();
        let pool: Vec<&Pixel> = data.iter().collect();

        let picked = pick_near_means(&pool, 1.0, Some(0.02)).unwrap();
        assert_eq!(picked.ts, 14.0);
        assert_eq!(picked.col, 2);
    }

    #[test]
    fn near_mean_pick_is_absent_without_a_close_pixel() {
        let data = [land(10.0, 0.2), land(12.0, 0.2), land(16.0, 0.2), land(18.0, 0.2)];
        let pool: Vec<&Pixel> = data.iter().collect();
        assert!(pick_near_means(&pool, 1.0, Some(0.02)).is_none());
    }

    #[test]
    fn albedo_deviation_can_veto_a_temperature_match() {
        let data = [land(14.0, 0.5), land(14.0, 0.1), land(14.0, 0.3)];
        let pool: Vec<&Pixel> = data.iter().collect();
        let picked = pick_near_means(&pool, 0.2, Some(0.02)).unwrap();
        assert_eq!(picked.albedo, 0.3);
        // Without the albedo test the first temperature match wins.
        assert_eq!(pick_near_means(&pool, 0.2, None).unwrap().albedo, 0.5);
    }

    #[test]
    fn empty_candidates_pick_nothing() {
        assert!(pick_near_means(&[], 1.0, None).is_none());
    }

    #[test]
    fn cold_prefers_strictly_cooler_water() {
        let water = land(280.0, 0.05);
        let field = land(290.0, 0.2);
        let equal = land(280.0, 0.2);

        assert_eq!(choose_cold(Some(&water), Some(&field)), Some(&water));
        assert_eq!(choose_cold(Some(&field), Some(&water)), Some(&water));
        assert_eq!(choose_cold(Some(&water), Some(&equal)), Some(&equal));
        assert_eq!(choose_cold(Some(&water), None), Some(&water));
        assert_eq!(choose_cold(None, Some(&field)), Some(&field));
        assert_eq!(choose_cold(None, None), None);
    }

    #[test]
    fn selector_rejects_invalid_config() {
        let config = SelectionConfig {
            tile_height: 0,
            ..SelectionConfig::default()
        };
        assert!(PixelSelector::new(config).is_err());
    }

    #[test]
    fn empty_grid_selects_nothing() {
        let grid = PixelGrid::new(0, 0, Vec::new()).unwrap();
        let selector = PixelSelector::new(SelectionConfig::default()).unwrap();
        let report = selector.select(&grid);
        assert_eq!(report.selection, Selection::default());
        assert_eq!(report.tiles_scanned, 0);
    }
}
