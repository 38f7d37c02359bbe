// THEORY:
// The `WaterBodyDetector` is the engine of the in-water cold candidate. Open water
// is the wettest, coolest surface a scene can offer, so a coherent lake is a strong
// cold anchor. The detector finds such regions with a flood fill and reduces them
// to a single representative pixel.
//
// Key architectural principles & algorithm steps:
// 1.  **Seeding**: Cells are scanned in row-major order. A clear (non-cloud) cell
//     that passes the spectral water test starts a new fill.
// 2.  **Region Growing**: The fill marks every cell it touches as visited, once and
//     for all fills. A touched cell joins the sample only if its vegetation index is
//     negative; otherwise it is a shoreline and the fill stops there. The seed test
//     and the membership test differ: members need no water flag and no cloud check.
//     The fill runs on an explicit heap-allocated stack: a lake can cover most of
//     a scene, far more than a call stack can hold.
// 3.  **Traversal Order**: Neighbours are explored right, left, down, up, depth
//     first, and a cell is checked when it is popped rather than when it is pushed.
//     This reproduces the pre-order of a recursive fill, which fixes the member
//     order of each sample.
// 4.  **Refinement**: Samples smaller than the configured total, row span or column
//     span are dropped.
// 5.  **Selection**: The largest surviving sample wins (first one on ties). Its
//     candidate is the first member, in fill order, whose temperature lies within
//     the configured deviation of the sample mean.
// 6.  **Scoped State**: The visited mask lives inside one `detect` call, so
//     concurrent detections over different scenes share nothing mutable.

pub mod water_detector {
    use log::debug;

    use crate::config::SelectionConfig;
    use crate::core_modules::pixel::pixel::Pixel;
    use crate::core_modules::pixel_grid::PixelGrid;
    use crate::core_modules::water_sample::WaterSample;

    /// Everything one detection pass learned about the scene's water.
    #[derive(Debug, Clone, Default)]
    pub struct WaterDetection<'a> {
        /// Number of samples the flood fill produced before refinement.
        pub samples_found: usize,
        /// Number of samples that survived refinement.
        pub samples_retained: usize,
        pub best_sample: Option<WaterSample<'a>>,
        /// The in-water cold candidate, if any member of the best sample qualifies.
        pub candidate: Option<&'a Pixel>,
    }

    #[derive(Debug, Clone)]
    pub struct WaterBodyDetector {
        min_total: usize,
        min_rows: usize,
        min_cols: usize,
        max_ts_deviation: f64,
    }

    impl WaterBodyDetector {
        pub fn new(config: &SelectionConfig) -> Self {
            Self {
                min_total: config.min_total_water,
                min_rows: config.min_row_water,
                min_cols: config.min_col_water,
                max_ts_deviation: config.max_ts_deviation,
            }
        }

        /// Runs the full pass: fill, refine, pick the best sample and its candidate.
        pub fn detect<'a>(&self, grid: &'a PixelGrid) -> WaterDetection<'a> {
            let samples = self.find_samples(grid);
            let samples_found = samples.len();
            debug!("flood fill found {} water samples", samples_found);
            if samples.is_empty() {
                return WaterDetection::default();
            }

            let refined = self.refine(samples);
            let samples_retained = refined.len();
            let best_sample = select_best_sample(refined);
            let candidate = best_sample
                .as_ref()
                .and_then(|sample| self.select_candidate(sample));

            if let Some(sample) = &best_sample {
                debug!(
                    "best water sample #{} has {} pixels over {} rows and {} columns",
                    sample.id,
                    sample.len(),
                    sample.row_count(),
                    sample.col_count()
                );
            }

            WaterDetection {
                samples_found,
                samples_retained,
                best_sample,
                candidate,
            }
        }

        /// Flood-fills every water region of the grid. Samples come back in discovery
        /// order and are pairwise disjoint.
        pub fn find_samples<'a>(&self, grid: &'a PixelGrid) -> Vec<WaterSample<'a>> {
            let mut visited = vec![false; grid.len()];
            let mut stack: Vec<(u32, u32)> = Vec::new();
            let mut samples = Vec::new();
            let mut sample_id = 0u64;

            for y in 0..grid.height() {
                for x in 0..grid.width() {
                    if visited[grid.linear(x, y)] || !grid.at(x, y).is_water_seed() {
                        continue;
                    }

                    let sample = grow_sample(grid, &mut visited, &mut stack, (x, y), sample_id);
                    sample_id += 1;
                    // A seed that is itself not a member yields no sample.
                    if !sample.is_empty() {
                        samples.push(sample);
                    }
                }
            }

            samples
        }

        /// Drops samples below the configured total size, row span or column span.
        pub fn refine<'a>(&self, samples: Vec<WaterSample<'a>>) -> Vec<WaterSample<'a>> {
            samples
                .into_iter()
                .filter(|sample| {
                    sample.len() >= self.min_total
                        && sample.row_count() >= self.min_rows
                        && sample.col_count() >= self.min_cols
                })
                .collect()
        }

        /// First member, in fill order, whose temperature is within the configured
        /// deviation of the sample mean.
        pub fn select_candidate<'a>(&self, sample: &WaterSample<'a>) -> Option<&'a Pixel> {
            let mean = sample.mean_ts()?;
            sample
                .pixels()
                .iter()
                .copied()
                .find(|pixel| pixel.ts_within(mean, self.max_ts_deviation))
        }
    }

    /// Largest sample wins; on equal sizes the earliest discovered one is kept.
    pub fn select_best_sample<'a>(samples: Vec<WaterSample<'a>>) -> Option<WaterSample<'a>> {
        let mut best: Option<WaterSample<'a>> = None;
        for sample in samples {
            let is_better = match &best {
                None => true,
                Some(current) => sample.len() > current.len(),
            };
            if is_better {
                best = Some(sample);
            }
        }
        best
    }

    /// Grows one sample from `seed` with an explicit depth-first stack.
    fn grow_sample<'a>(
        grid: &'a PixelGrid,
        visited: &mut [bool],
        stack: &mut Vec<(u32, u32)>,
        seed: (u32, u32),
        sample_id: u64,
    ) -> WaterSample<'a> {
        let mut sample = WaterSample::new(sample_id);
        let (width, height) = (grid.width(), grid.height());
        stack.clear();
        stack.push(seed);

        while let Some((x, y)) = stack.pop() {
            let index = grid.linear(x, y);
            if visited[index] {
                continue;
            }
            visited[index] = true;

            let pixel = grid.at(x, y);
            if !pixel.is_water_member() {
                continue;
            }
            sample.add_pixel(pixel, x, y);

            // Pushed in reverse so that right is explored first, then left, down, up.
            if y > 0 {
                stack.push((x, y - 1));
            }
            if y + 1 < height {
                stack.push((x, y + 1));
            }
            if x > 0 {
                stack.push((x - 1, y));
            }
            if x + 1 < width {
                stack.push((x + 1, y));
            }
        }

        sample
    }
}

#[cfg(test)]
mod tests {
    use super::water_detector::*;
    use crate::config::SelectionConfig;
    use crate::core_modules::pixel::pixel::Pixel;
    use crate::core_modules::pixel_grid::PixelGrid;

    fn land() -> Pixel {
        Pixel::new(0, 0, 0.4, 300.0, 0.2)
    }

    fn water(ts: f64) -> Pixel {
        Pixel::new(0, 0, -0.5, ts, 0.05).with_water_test(true)
    }

    /// Builds a grid from rows of characters: `W` water seed, `w` negative NDVI
    /// without the water test, `c` cloudy water, anything else land.
    fn grid_from(rows: &[&str]) -> PixelGrid {
        let height = rows.len() as u32;
        let width = rows[0].len() as u32;
        PixelGrid::from_fn(width, height, |x, y| {
            match rows[y as usize].as_bytes()[x as usize] {
                b'W' => water(290.0 + x as f64),
                b'w' => Pixel::new(0, 0, -0.2, 291.0, 0.05),
                b'c' => water(290.0).with_cloud(true),
                _ => land(),
            }
        })
    }

    fn detector(config: SelectionConfig) -> WaterBodyDetector {
        WaterBodyDetector::new(&config)
    }

    #[test]
    fn single_water_pixel_forms_one_sample() {
        let grid = grid_from(&["....", "....", "..W.", "...."]);
        let detection = detector(SelectionConfig::default()).detect(&grid);

        assert_eq!(detection.samples_found, 1);
        assert_eq!(detection.samples_retained, 1);
        let sample = detection.best_sample.as_ref().unwrap();
        assert_eq!(sample.len(), 1);
        let candidate = detection.candidate.unwrap();
        assert_eq!((candidate.col, candidate.row), (2, 2));
    }

    #[test]
    fn single_water_pixel_is_refined_out_by_min_total() {
        let grid = grid_from(&["....", "....", "..W.", "...."]);
        let detection = detector(SelectionConfig {
            min_total_water: 2,
            ..SelectionConfig::default()
        })
        .detect(&grid);

        assert_eq!(detection.samples_found, 1);
        assert_eq!(detection.samples_retained, 0);
        assert!(detection.best_sample.is_none());
        assert!(detection.candidate.is_none());
    }

    #[test]
    fn no_water_means_no_candidate() {
        let grid = grid_from(&["...", "..."]);
        let detection = detector(SelectionConfig::default()).detect(&grid);
        assert_eq!(detection.samples_found, 0);
        assert!(detection.candidate.is_none());
    }

    #[test]
    fn fill_follows_negative_ndvi_not_the_water_test() {
        // The seed passes the water test; its neighbours only have negative NDVI.
        let grid = grid_from(&["Www.", "..w.", "...."]);
        let samples = detector(SelectionConfig::default()).find_samples(&grid);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].len(), 4);
    }

    #[test]
    fn negative_ndvi_without_a_seed_is_ignored() {
        let grid = grid_from(&["ww..", "ww.."]);
        let samples = detector(SelectionConfig::default()).find_samples(&grid);
        assert!(samples.is_empty());
    }

    #[test]
    fn cloudy_cells_do_not_seed_but_can_join() {
        let grid = grid_from(&["cW", ".."]);
        let samples = detector(SelectionConfig::default()).find_samples(&grid);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].len(), 2);

        let only_cloud = grid_from(&["c.", ".."]);
        assert!(detector(SelectionConfig::default())
            .find_samples(&only_cloud)
            .is_empty());
    }

    #[test]
    fn seed_with_non_negative_ndvi_produces_no_sample() {
        let grid = PixelGrid::from_fn(3, 1, |x, _| {
            if x == 0 {
                Pixel::new(0, 0, 0.1, 300.0, 0.2).with_water_test(true)
            } else {
                water(290.0)
            }
        });
        let samples = detector(SelectionConfig::default()).find_samples(&grid);
        // The dry seed is visited alone; its wet neighbours seed their own sample.
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].len(), 2);
    }

    #[test]
    fn samples_partition_visited_cells() {
        let grid = grid_from(&[
            "WW..WW", //
            "W...W.",
            "..W...",
            "WWWW.W",
        ]);
        let samples = detector(SelectionConfig::default()).find_samples(&grid);
        let mut seen = std::collections::HashSet::new();
        let mut total = 0;
        for sample in &samples {
            for pixel in sample.pixels() {
                assert!(seen.insert((pixel.col, pixel.row)), "cell in two samples");
                total += 1;
            }
        }
        assert!(total <= grid.len());
        // (2,2) joins the bottom strip through (2,3).
        assert_eq!(samples.len(), 4);
        assert_eq!(total, 12);
    }

    #[test]
    fn member_order_matches_recursive_preorder() {
        // Plus-shaped lake seeded at its top cell.
        let grid = grid_from(&[".W.", "WWW", ".W."]);
        let samples = detector(SelectionConfig::default()).find_samples(&grid);
        let order: Vec<(u32, u32)> = samples[0]
            .pixels()
            .iter()
            .map(|p| (p.col, p.row))
            .collect();
        // (1,0) -> down (1,1) -> right (2,1) -> left (0,1) -> down (1,2)
        assert_eq!(order, vec![(1, 0), (1, 1), (2, 1), (0, 1), (1, 2)]);
    }

    #[test]
    fn refinement_applies_row_and_column_spans() {
        // A horizontal strip of 4 and a vertical strip of 3.
        let grid = grid_from(&["WWWW.W", ".....W", ".....W"]);
        let d = detector(SelectionConfig {
            min_row_water: 2,
            ..SelectionConfig::default()
        });
        let refined = d.refine(d.find_samples(&grid));
        assert_eq!(refined.len(), 1);
        assert_eq!(refined[0].col_count(), 1);

        let d = detector(SelectionConfig {
            min_col_water: 2,
            ..SelectionConfig::default()
        });
        let refined = d.refine(d.find_samples(&grid));
        assert_eq!(refined.len(), 1);
        assert_eq!(refined[0].row_count(), 1);
    }

    #[test]
    fn best_sample_keeps_first_on_ties() {
        let grid = grid_from(&["WW.WW", ".....", "WWW.."]);
        let d = detector(SelectionConfig::default());
        let samples = d.find_samples(&grid);
        assert_eq!(samples.len(), 3);

        let best = select_best_sample(samples).unwrap();
        assert_eq!(best.len(), 3);
        assert_eq!(best.id, 2);

        let tied = grid_from(&["WW.WW"]);
        let best = select_best_sample(d.find_samples(&tied)).unwrap();
        assert_eq!(best.id, 0);
        assert_eq!(best.pixels()[0].col, 0);
    }

    #[test]
    fn candidate_is_first_member_near_the_mean() {
        // Temperatures along the row are 290, 291, 292, 293, 294 -> mean 292.
        let grid = grid_from(&["WWWWW"]);
        let d = detector(SelectionConfig {
            max_ts_deviation: 1.0,
            ..SelectionConfig::default()
        });
        let candidate = d.detect(&grid).candidate.unwrap();
        assert_eq!(candidate.ts, 291.0);

        let strict = detector(SelectionConfig {
            max_ts_deviation: 0.0,
            ..SelectionConfig::default()
        });
        assert_eq!(strict.detect(&grid).candidate.unwrap().ts, 292.0);
    }

    #[test]
    fn candidate_absent_when_no_member_is_near_the_mean() {
        let grid = PixelGrid::from_fn(2, 1, |x, _| water(if x == 0 { 280.0 } else { 300.0 }));
        let detection = detector(SelectionConfig::default()).detect(&grid);
        assert!(detection.best_sample.is_some());
        assert!(detection.candidate.is_none());
    }

    #[test]
    fn lake_covering_the_whole_scene_does_not_overflow() {
        let grid = PixelGrid::from_fn(400, 400, |_, _| water(290.0));
        let samples = detector(SelectionConfig::default()).find_samples(&grid);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].len(), 160_000);
    }

    #[test]
    fn extents_follow_grid_geometry_not_pixel_metadata() {
        // Every pixel claims (0, 0); only the grid knows where they are.
        let pixels = (0..9)
            .map(|i| if i % 3 == 1 { water(290.0) } else { land() })
            .collect();
        let grid = PixelGrid::new(3, 3, pixels).unwrap();
        let d = detector(SelectionConfig {
            min_row_water: 2,
            ..SelectionConfig::default()
        });

        let detection = d.detect(&grid);
        assert_eq!(detection.samples_found, 1);
        assert_eq!(detection.samples_retained, 1);
        let sample = detection.best_sample.unwrap();
        assert_eq!((sample.row_count(), sample.col_count()), (3, 1));
        let candidate = detection.candidate.unwrap();
        assert_eq!((candidate.col, candidate.row), (1, 0));
    }
}
