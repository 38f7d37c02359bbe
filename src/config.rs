// THEORY:
// `SelectionConfig` is the one set of tunables for a selection run. It is built
// once, validated once, and then shared read-only by every analyzer (and, in the
// batch pipeline, by every worker). Field names on the wire are the property keys
// scene-processing deployments already use, so the same keys work from a YAML
// file or from a flat key/value property bag.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{SelectionError, SelectionResult};

pub const KEY_TILE_WIDTH: &str = "cluster_width";
pub const KEY_TILE_HEIGHT: &str = "cluster_height";
pub const KEY_MAX_CV_FOR_NDVI: &str = "cluster_max_cv_for_ndvi";
pub const KEY_MAX_INVALID_NDVI: &str = "cluster_max_invalid_ndvi";
pub const KEY_MIN_TOTAL_WATER: &str = "cluster_min_total_water_pixels";
pub const KEY_MIN_ROW_WATER: &str = "cluster_min_lat_water_pixels";
pub const KEY_MIN_COL_WATER: &str = "cluster_min_lon_water_pixels";
pub const KEY_MAX_TS_DEVIATION: &str = "cluster_max_difference_from_ts_mean";
pub const KEY_MAX_ALBEDO_DEVIATION: &str = "cluster_max_difference_from_albedo_mean";

/// Configuration for the `PixelSelector`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    #[serde(rename = "cluster_width")]
    pub tile_width: u32,
    #[serde(rename = "cluster_height")]
    pub tile_height: u32,
    /// Tiles whose NDVI coefficient of variation is not below this are rejected.
    #[serde(rename = "cluster_max_cv_for_ndvi")]
    pub max_cv_for_ndvi: f64,
    /// Number of cloud or non-positive NDVI pixels that forces a tile rejection.
    #[serde(rename = "cluster_max_invalid_ndvi")]
    pub max_invalid_ndvi: u32,
    #[serde(rename = "cluster_min_total_water_pixels")]
    pub min_total_water: usize,
    /// Minimum number of distinct rows a water sample must touch.
    #[serde(rename = "cluster_min_lat_water_pixels")]
    pub min_row_water: usize,
    /// Minimum number of distinct columns a water sample must touch.
    #[serde(rename = "cluster_min_lon_water_pixels")]
    pub min_col_water: usize,
    #[serde(rename = "cluster_max_difference_from_ts_mean")]
    pub max_ts_deviation: f64,
    #[serde(rename = "cluster_max_difference_from_albedo_mean")]
    pub max_albedo_deviation: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            tile_width: 5,
            tile_height: 5,
            max_cv_for_ndvi: 0.2,
            max_invalid_ndvi: 10,
            min_total_water: 1,
            min_row_water: 1,
            min_col_water: 1,
            max_ts_deviation: 0.2,
            max_albedo_deviation: 0.02,
        }
    }
}

impl SelectionConfig {
    /// Reads the recognized keys from a flat property bag. Absent and unknown keys
    /// are left at their defaults; a recognized key with an unparseable value is an
    /// error.
    pub fn from_properties(properties: &HashMap<String, String>) -> SelectionResult<Self> {
        let mut config = Self::default();
        read_property(properties, KEY_TILE_WIDTH, &mut config.tile_width)?;
        read_property(properties, KEY_TILE_HEIGHT, &mut config.tile_height)?;
        read_property(properties, KEY_MAX_CV_FOR_NDVI, &mut config.max_cv_for_ndvi)?;
        read_property(properties, KEY_MAX_INVALID_NDVI, &mut config.max_invalid_ndvi)?;
        read_property(properties, KEY_MIN_TOTAL_WATER, &mut config.min_total_water)?;
        read_property(properties, KEY_MIN_ROW_WATER, &mut config.min_row_water)?;
        read_property(properties, KEY_MIN_COL_WATER, &mut config.min_col_water)?;
        read_property(properties, KEY_MAX_TS_DEVIATION, &mut config.max_ts_deviation)?;
        read_property(
            properties,
            KEY_MAX_ALBEDO_DEVIATION,
            &mut config.max_albedo_deviation,
        )?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(yaml: &str) -> SelectionResult<Self> {
        // An empty document deserializes to unit, not to an empty map.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> SelectionResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    pub fn to_yaml_string(&self) -> SelectionResult<String> {
        Ok(serde_yml::to_string(self)?)
    }

    pub fn validate(&self) -> SelectionResult<()> {
        if self.tile_width == 0 || self.tile_height == 0 {
            return Err(SelectionError::config(format!(
                "tile size must be positive, got {}x{}",
                self.tile_width, self.tile_height
            )));
        }
        if self.max_invalid_ndvi == 0 {
            return Err(SelectionError::config(format!(
                "{KEY_MAX_INVALID_NDVI} must be at least 1"
            )));
        }
        for (key, value) in [
            (KEY_MAX_CV_FOR_NDVI, self.max_cv_for_ndvi),
            (KEY_MAX_TS_DEVIATION, self.max_ts_deviation),
            (KEY_MAX_ALBEDO_DEVIATION, self.max_albedo_deviation),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SelectionError::config(format!(
                    "{key} must be a finite non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

fn read_property<T: FromStr>(
    properties: &HashMap<String, String>,
    key: &str,
    target: &mut T,
) -> SelectionResult<()> {
    if let Some(raw) = properties.get(key) {
        *target = raw
            .trim()
            .parse()
            .map_err(|_| SelectionError::config_value(key, raw))?;
    }
    Ok(())
}
