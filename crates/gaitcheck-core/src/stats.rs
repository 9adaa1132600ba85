// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Small deterministic statistics helpers shared by the tuner and the
//! outlier detector. All functions are seed-free and return `None` when
//! the statistic is undefined for the input size.

/// Arithmetic mean. `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator). `None` for fewer than
/// two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let sum_sq = values
        .iter()
        .map(|value| {
            let centered = *value - m;
            centered * centered
        })
        .sum::<f64>();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

/// Percentile in [0, 100] using linear interpolation between closest
/// ranks (`rank = p/100 * (n-1)` over the sorted sample). `None` for an
/// empty slice or a percentile outside [0, 100].
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=100.0).contains(&p) {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return Some(sorted[lower]);
    }
    let weight = rank - lower as f64;
    Some(sorted[lower] * (1.0 - weight) + sorted[upper] * weight)
}

/// Median (50th percentile).
pub fn median(values: &[f64]) -> Option<f64> {
    percentile(values, 50.0)
}

/// First and third quartiles (25th and 75th percentiles).
pub fn quartiles(values: &[f64]) -> Option<(f64, f64)> {
    Some((percentile(values, 25.0)?, percentile(values, 75.0)?))
}

/// Median absolute deviation from the median, unscaled.
pub fn mad(values: &[f64]) -> Option<f64> {
    let m = median(values)?;
    let deviations = values.iter().map(|v| (v - m).abs()).collect::<Vec<_>>();
    median(&deviations)
}
