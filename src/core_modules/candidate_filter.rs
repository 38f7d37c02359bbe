// THEORY:
// The `CandidateFilter` trims a candidate pool down to its extreme percentile by a
// single attribute. It is the building block of both decision procedures: the cold
// search keeps the greenest and then the coolest pixels, the hot search keeps the
// barest and then the hottest.
//
// Every filter is a pure function over a borrowed pool: it returns a new ordered
// sequence and never reorders the caller's data, so the same pool can feed several
// filters without one run disturbing the next.
//
// The kept count is `round(size * percent / 100 + 0.4)`. The extra 0.4 biases the
// count upwards so that small pools still yield at least one candidate.

use std::cmp::Ordering;

use crate::core_modules::pixel::pixel::Pixel;

/// The numeric pixel attribute a pool is ranked by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankAttribute {
    Ndvi,
    SurfaceTemperature,
    Albedo,
}

impl RankAttribute {
    pub fn of(&self, pixel: &Pixel) -> f64 {
        match self {
            RankAttribute::Ndvi => pixel.ndvi,
            RankAttribute::SurfaceTemperature => pixel.ts,
            RankAttribute::Albedo => pixel.albedo,
        }
    }
}

const ROUNDING_BIAS: f64 = 0.4;

/// Number of pixels kept from a pool of `size` when filtering to `percent`.
pub fn percentile_count(size: usize, percent: f64) -> usize {
    let count = (size as f64 * (percent / 100.0) + ROUNDING_BIAS).round();
    if count <= 0.0 {
        return 0;
    }
    (count as usize).min(size)
}

/// The lowest `percent` of `pool` by `attribute`, lowest first.
pub fn smallest<'a>(pool: &[&'a Pixel], attribute: RankAttribute, percent: f64) -> Vec<&'a Pixel> {
    let mut ranked = sorted_ascending(pool, attribute);
    ranked.truncate(percentile_count(ranked.len(), percent));
    ranked
}

/// The highest `percent` of `pool` by `attribute`, highest first.
///
/// Equal values come out in reverse pool order: the ranking is an ascending stable
/// sort read backwards.
pub fn biggest<'a>(pool: &[&'a Pixel], attribute: RankAttribute, percent: f64) -> Vec<&'a Pixel> {
    let mut ranked = sorted_ascending(pool, attribute);
    ranked.reverse();
    ranked.truncate(percentile_count(ranked.len(), percent));
    ranked
}

/// The lowest `percent` of the strictly positive vegetation indices of `pool`.
/// Non-positive pixels are dropped before the pool is sized.
pub fn smallest_positive_ndvi<'a>(pool: &[&'a Pixel], percent: f64) -> Vec<&'a Pixel> {
    let vegetated: Vec<&'a Pixel> = pool.iter().copied().filter(|p| p.ndvi > 0.0).collect();
    smallest(&vegetated, RankAttribute::Ndvi, percent)
}

fn sorted_ascending<'a>(pool: &[&'a Pixel], attribute: RankAttribute) -> Vec<&'a Pixel> {
    let mut ranked = pool.to_vec();
    ranked.sort_by(|a, b| compare(attribute.of(a), attribute.of(b)));
    ranked
}

fn compare(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}
