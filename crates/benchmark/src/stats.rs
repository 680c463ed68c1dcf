//! Percentile Statistics
//!
//! Deterministic summary of a qualifying peer pool. Percentiles use linear
//! interpolation between closest ranks; std_dev is the population standard
//! deviation. A pool below `MIN_PEERS_FOR_PERCENTILES` produces no summary
//! at all rather than one computed from too few points.

use serde::{Deserialize, Serialize};

/// Minimum qualifying peers before percentiles are computed
pub const MIN_PEERS_FOR_PERCENTILES: usize = 3;

/// Seven-number summary of a peer target-value pool
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileSummary {
    pub min: f64,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

/// Summarize a value pool, or None when fewer than
/// `MIN_PEERS_FOR_PERCENTILES` finite values exist.
pub fn summarize(values: &[f64]) -> Option<PercentileSummary> {
    let mut finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.len() < MIN_PEERS_FOR_PERCENTILES {
        return None;
    }
    finite.sort_by(f64::total_cmp);

    let n = finite.len() as f64;
    let mean = finite.iter().sum::<f64>() / n;
    let variance = finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    Some(PercentileSummary {
        min: finite[0],
        p25: percentile_sorted(&finite, 0.25),
        median: percentile_sorted(&finite, 0.50),
        p75: percentile_sorted(&finite, 0.75),
        max: finite[finite.len() - 1],
        mean,
        std_dev: variance.sqrt(),
    })
}

/// Linear-interpolation percentile over an already-sorted slice
fn percentile_sorted(sorted: &[f64], fraction: f64) -> f64 {
    let rank = fraction * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let weight = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * weight
}
