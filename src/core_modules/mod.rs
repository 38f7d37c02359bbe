pub mod candidate_filter;
pub mod cluster_scanner;
pub mod pixel;
pub mod pixel_grid;
pub mod tile;
pub mod utils;
pub mod water_detector;
pub mod water_sample;
