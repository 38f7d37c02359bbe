// THEORY:
// The `Pixel` module is the most fundamental unit of the anchor selection engine.
// It is a "dumb" data container for the attributes an upstream index pipeline has
// already derived for a single position of the scene: vegetation index, surface
// temperature, albedo and the two boolean masks (cloud, open-water spectral test).
//
// Key architectural principles:
// 1.  **Read Only**: Pixels are produced upstream and never modified here. Every
//     analyzer downstream borrows them; pools and samples hold references.
// 2.  **Self Locating**: A pixel knows its own (row, column). Once a pixel has been
//     moved into a candidate pool, the pool order no longer says where it came
//     from, and the downstream energy-balance step needs the position.
// 3.  **Single-Pixel Heuristics Only**: Anything that needs neighbours (tiles,
//     flood fill) or populations (percentiles, means) lives in the higher modules.

pub mod pixel {
    pub type Ndvi = f64;
    pub type Temperature = f64;
    pub type Albedo = f64;

    /// Per-pixel attributes of a scene, as derived by the index pipeline.
    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    pub struct Pixel {
        /// Row (y) of the pixel in the scene.
        pub row: u32,
        /// Column (x) of the pixel in the scene.
        pub col: u32,
        /// Normalized difference vegetation index.
        pub ndvi: Ndvi,
        /// Retrieved surface temperature.
        pub ts: Temperature,
        /// Surface albedo.
        pub albedo: Albedo,
        pub cloud: bool,
        /// Pre-computed spectral test for open water.
        pub water_test: bool,
    }

    impl Pixel {
        pub fn new(row: u32, col: u32, ndvi: Ndvi, ts: Temperature, albedo: Albedo) -> Self {
            Self {
                row,
                col,
                ndvi,
                ts,
                albedo,
                cloud: false,
                water_test: false,
            }
        }

        pub fn with_cloud(mut self, cloud: bool) -> Self {
            self.cloud = cloud;
            self
        }

        pub fn with_water_test(mut self, water_test: bool) -> Self {
            self.water_test = water_test;
            self
        }

        /// A pixel whose vegetation index can take part in a homogeneity test.
        pub fn has_valid_ndvi(&self) -> bool {
            !self.cloud && self.ndvi > 0.0
        }

        /// A pixel that can start a new water sample.
        pub fn is_water_seed(&self) -> bool {
            !self.cloud && self.water_test
        }

        /// A pixel that belongs to a water sample once a fill reaches it.
        pub fn is_water_member(&self) -> bool {
            self.ndvi < 0.0
        }

        pub fn ts_within(&self, mean: Temperature, max_deviation: f64) -> bool {
            self.ts >= mean - max_deviation && self.ts <= mean + max_deviation
        }

        pub fn albedo_within(&self, mean: Albedo, max_deviation: f64) -> bool {
            self.albedo >= mean - max_deviation && self.albedo <= mean + max_deviation
        }
    }
}
