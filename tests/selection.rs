use std::collections::HashMap;

use sebal_anchor::{Pixel, PixelGrid, PixelSelector, SelectionConfig, SelectionError};

fn field() -> Pixel {
    Pixel::new(0, 0, 0.8, 300.0, 0.18)
}

fn soil() -> Pixel {
    Pixel::new(0, 0, 0.1, 320.0, 0.30)
}

fn lake() -> Pixel {
    Pixel::new(0, 0, -0.4, 288.0, 0.06).with_water_test(true)
}

/// Columns 0-4 irrigated field, 5-9 bare soil, 10-14 (when `with_lake`) open water.
fn farm_scene(with_lake: bool) -> PixelGrid {
    let width = if with_lake { 15 } else { 10 };
    PixelGrid::from_fn(width, 10, |x, _| match x {
        0..=4 => field(),
        5..=9 => soil(),
        _ => lake(),
    })
}

fn position(pixel: Option<&Pixel>) -> Option<(u32, u32)> {
    pixel.map(|p| (p.col, p.row))
}

#[test]
fn land_only_scene_picks_field_and_soil_anchors() {
    let grid = farm_scene(false);
    let selector = PixelSelector::new(SelectionConfig::default()).unwrap();
    let report = selector.select(&grid);

    assert_eq!(report.tiles_scanned, 4);
    assert_eq!(report.accepted_tiles.len(), 4);
    assert_eq!(report.cold_pool_size, 100);
    assert_eq!(report.water_samples_found, 0);
    assert!(report.in_water_candidate.is_none());

    // Greenest 5 are the last field pixels of the pool, read backwards.
    assert_eq!(report.cold_filtered_size, 1);
    assert_eq!(position(report.selection.cold), Some((4, 9)));

    // Barest 10 are the first two soil columns of the top soil tile; the hottest
    // 2 of those, read backwards, start at (6, 4).
    assert_eq!(report.hot_filtered_size, 2);
    assert_eq!(position(report.selection.hot), Some((6, 4)));
    assert_eq!(report.selection.hot.unwrap().ts, 320.0);
}

#[test]
fn colder_lake_wins_the_cold_anchor() {
    let grid = farm_scene(true);
    let selector = PixelSelector::new(SelectionConfig::default()).unwrap();
    let report = selector.select(&grid);

    // The lake tiles are all-invalid and never reach the pools.
    assert_eq!(report.tiles_scanned, 6);
    assert_eq!(report.accepted_tiles.len(), 4);
    assert_eq!(report.water_samples_found, 1);
    assert_eq!(report.best_water_sample.len(), 50);

    assert_eq!(position(report.out_of_water_candidate), Some((4, 9)));
    assert_eq!(position(report.in_water_candidate), Some((10, 0)));
    assert_eq!(position(report.selection.cold), Some((10, 0)));
    assert_eq!(position(report.selection.hot), Some((6, 4)));
}

#[test]
fn lone_water_pixel_competes_only_when_big_enough() {
    let grid = PixelGrid::from_fn(4, 4, |x, y| {
        if (x, y) == (2, 2) {
            Pixel::new(0, 0, -0.5, 290.0, 0.05).with_water_test(true)
        } else {
            Pixel::new(0, 0, 0.5, 300.0, 0.2)
        }
    });

    let selector = PixelSelector::new(SelectionConfig::default()).unwrap();
    let report = selector.select(&grid);
    assert_eq!(report.water_samples_found, 1);
    assert_eq!(report.best_water_sample, vec![(2, 2)]);
    assert_eq!(position(report.selection.cold), Some((2, 2)));
    assert_eq!(position(report.selection.hot), Some((0, 1)));

    let strict = PixelSelector::new(SelectionConfig {
        min_total_water: 2,
        ..SelectionConfig::default()
    })
    .unwrap();
    let report = strict.select(&grid);
    assert_eq!(report.water_samples_retained, 0);
    assert!(report.in_water_candidate.is_none());
    assert_eq!(position(report.selection.cold), Some((3, 3)));
}

#[test]
fn row_major_pixels_report_their_grid_positions() {
    // Pixels arrive without positions, as a raster reader would hand them over.
    let pixels: Vec<Pixel> = (0..16)
        .map(|i| {
            if i == 2 * 4 + 2 {
                Pixel::new(0, 0, -0.5, 290.0, 0.05).with_water_test(true)
            } else {
                Pixel::new(0, 0, 0.5, 300.0, 0.2)
            }
        })
        .collect();
    let grid = PixelGrid::new(4, 4, pixels).unwrap();

    let selector = PixelSelector::new(SelectionConfig::default()).unwrap();
    let report = selector.select(&grid);
    assert_eq!(report.best_water_sample, vec![(2, 2)]);
    assert_eq!(position(report.selection.cold), Some((2, 2)));
    assert_eq!(position(report.selection.hot), Some((0, 1)));
}

#[test]
fn fully_clouded_scene_has_no_anchors() {
    let grid = PixelGrid::from_fn(12, 12, |_, _| field().with_cloud(true));
    let selector = PixelSelector::new(SelectionConfig::default()).unwrap();
    let report = selector.select(&grid);

    assert!(report.accepted_tiles.is_empty());
    assert!(report.selection.cold.is_none());
    assert!(report.selection.hot.is_none());
}

#[test]
fn selection_is_idempotent() {
    let grid = PixelGrid::from_fn(33, 27, |x, y| {
        let texture = ((x * 13 + y * 7) % 17) as f64 / 17.0;
        if x < 6 && y < 6 {
            Pixel::new(0, 0, -0.3, 290.0 + texture, 0.05).with_water_test(true)
        } else {
            Pixel::new(0, 0, 0.3 + 0.02 * texture, 305.0 + 4.0 * texture, 0.2)
        }
    });
    let selector = PixelSelector::new(SelectionConfig::default()).unwrap();

    let first = selector.select_anchors(&grid).to_anchors();
    let second = selector.select_anchors(&grid).to_anchors();
    assert_eq!(first, second);
}

#[test]
fn malformed_grid_is_rejected_up_front() {
    let err = PixelGrid::new(4, 4, vec![field(); 15]).unwrap_err();
    assert!(matches!(err, SelectionError::InvalidGrid { expected: 16, actual: 15, .. }));
}

#[test]
fn property_bag_configures_the_selector() {
    let properties: HashMap<String, String> = [
        ("cluster_width", "10"),
        ("cluster_height", "10"),
        ("cluster_min_total_water_pixels", "100"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    let config = SelectionConfig::from_properties(&properties).unwrap();
    let selector = PixelSelector::new(config).unwrap();
    assert_eq!(selector.config().min_total_water, 100);
    assert_eq!(selector.config().max_cv_for_ndvi, 0.2);

    let grid = farm_scene(true);
    let report = selector.select(&grid);
    // One tile straddles field and soil, the other is all lake: neither is homogeneous.
    assert_eq!(report.tiles_scanned, 2);
    assert!(report.accepted_tiles.is_empty());
    // A 50 pixel lake is below the 100 pixel minimum.
    assert_eq!(report.water_samples_found, 1);
    assert_eq!(report.water_samples_retained, 0);
    assert!(report.selection.cold.is_none());
    assert!(report.selection.hot.is_none());
}

#[test]
fn unparseable_property_is_reported_by_key() {
    let properties: HashMap<String, String> =
        [("cluster_max_cv_for_ndvi".to_string(), "lots".to_string())].into();
    let err = SelectionConfig::from_properties(&properties).unwrap_err();
    assert!(matches!(err, SelectionError::ConfigValue { ref key, .. } if key == "cluster_max_cv_for_ndvi"));
}
