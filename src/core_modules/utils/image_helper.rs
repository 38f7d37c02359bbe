// Debug rendering of a selection run. Produces an in-memory RGB picture of the
// scene so a human can see which tiles were homogeneous, which lake won and where
// the anchors landed. Nothing here is read back by the engine.

pub mod image_helper {
    use image::{Rgb, RgbImage};

    use crate::core_modules::pixel_grid::PixelGrid;
    use crate::pipeline::SelectionReport;

    const ACCEPTED_TILE_TINT: Rgb<u8> = Rgb([40, 200, 60]);
    const WATER_COLOR: Rgb<u8> = Rgb([30, 90, 230]);
    const COLD_COLOR: Rgb<u8> = Rgb([0, 255, 255]);
    const HOT_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
    const TINT_WEIGHT: f64 = 0.35;

    /// Surface temperature as grayscale (cool dark, hot bright), accepted tiles
    /// tinted green, the best water sample in blue, the anchors in cyan and red.
    pub fn render_overlay(grid: &PixelGrid, report: &SelectionReport<'_>) -> RgbImage {
        let (min_ts, max_ts) = ts_range(grid);
        let span = (max_ts - min_ts).max(f64::EPSILON);

        let mut image = RgbImage::from_fn(grid.width(), grid.height(), |x, y| {
            let ts = grid.at(x, y).ts;
            let level = if ts.is_finite() {
                (((ts - min_ts) / span) * 255.0).round() as u8
            } else {
                0
            };
            Rgb([level, level, level])
        });

        for bounds in &report.accepted_tiles {
            for x in bounds.x0..bounds.x0 + bounds.width {
                for y in bounds.y0..bounds.y0 + bounds.height {
                    if let Some(pixel) = image.get_pixel_mut_checked(x, y) {
                        *pixel = blend(*pixel, ACCEPTED_TILE_TINT);
                    }
                }
            }
        }

        for &(x, y) in &report.best_water_sample {
            paint(&mut image, x, y, WATER_COLOR);
        }

        if let Some(hot) = report.selection.hot {
            paint(&mut image, hot.col, hot.row, HOT_COLOR);
        }
        if let Some(cold) = report.selection.cold {
            paint(&mut image, cold.col, cold.row, COLD_COLOR);
        }

        image
    }

    /// Positions outside the image (a report from another grid) are skipped.
    fn paint(image: &mut RgbImage, x: u32, y: u32, color: Rgb<u8>) {
        if let Some(pixel) = image.get_pixel_mut_checked(x, y) {
            *pixel = color;
        }
    }

    fn ts_range(grid: &PixelGrid) -> (f64, f64) {
        grid.pixels()
            .iter()
            .map(|p| p.ts)
            .filter(|ts| ts.is_finite())
            .fold(None, |range: Option<(f64, f64)>, ts| match range {
                None => Some((ts, ts)),
                Some((lo, hi)) => Some((lo.min(ts), hi.max(ts))),
            })
            .unwrap_or((0.0, 0.0))
    }

    fn blend(base: Rgb<u8>, tint: Rgb<u8>) -> Rgb<u8> {
        let mix = |a: u8, b: u8| (a as f64 * (1.0 - TINT_WEIGHT) + b as f64 * TINT_WEIGHT).round() as u8;
        Rgb([
            mix(base[0], tint[0]),
            mix(base[1], tint[1]),
            mix(base[2], tint[2]),
        ])
    }
}
