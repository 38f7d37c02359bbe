// THEORY:
// This file is the main entry point for the `sebal_anchor` library crate. It picks
// the two calibration anchors of a surface-energy-balance run: a cold, well-watered
// pixel and a hot, dry pixel, from a scene whose per-pixel indices (NDVI, surface
// temperature, albedo, cloud and water masks) have already been derived.
//
// The primary exports are the `PixelSelector` (one scene, synchronous) and the
// `BatchSelector` (many scenes, concurrently), together with `SelectionConfig` and
// the `PixelGrid` input. The analyzers in `core_modules` are public for callers that
// want a single stage, but the pipelines are the intended interface.
//
// The `weather_station` module is a separate collaborator: it prepares the ground
// weather records the same energy-balance run needs, and is never called by the
// selection itself.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod logging;
pub mod parallel_pipeline;
pub mod pipeline;
pub mod weather_station;

pub use config::SelectionConfig;
pub use core_modules::pixel::pixel::Pixel;
pub use core_modules::pixel_grid::PixelGrid;
pub use error::{SelectionError, SelectionResult};
pub use parallel_pipeline::{BatchSelector, SceneJob, SceneOutcome};
pub use pipeline::{AnchorPixels, PixelSelector, Selection, SelectionReport};
