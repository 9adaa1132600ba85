// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use gaitcheck_core::{CYCLE_POINTS, CycleSet, GaitError};

const DEFAULT_THRESHOLD: f64 = 2.0;

/// Flags cycles that deviate from the group mean pattern, independently
/// of any specification bounds.
///
/// Rule: per variable, compute the per-phase-point mean and sample
/// standard deviation across cycles. A cycle's deviation score for a
/// variable is the mean over the 150 phase points of its absolute
/// deviation from the group mean curve; the variable's dispersion scale
/// is the mean of the per-phase-point stds. A cycle is an outlier when
/// any variable's score exceeds `threshold * scale`. With fewer than two
/// cycles the std is undefined and no cycle is flagged.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OutlierDetector {
    threshold: f64,
}

impl Default for OutlierDetector {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl OutlierDetector {
    pub fn new(threshold: f64) -> Result<Self, GaitError> {
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(GaitError::invalid_input(format!(
                "outlier threshold must be finite and > 0, got {threshold}"
            )));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Returns outlier cycle indices in ascending order.
    pub fn find_outliers(&self, cycles: &CycleSet) -> Vec<usize> {
        let n_cycles = cycles.n_cycles();
        if n_cycles < 2 {
            return vec![];
        }

        let mut flagged = vec![false; n_cycles];
        let mut column = Vec::with_capacity(n_cycles);

        for var in 0..cycles.n_vars() {
            let mut mean_curve = [0.0_f64; CYCLE_POINTS];
            let mut std_sum = 0.0_f64;

            for sample in 0..CYCLE_POINTS {
                column.clear();
                column.extend((0..n_cycles).map(|cycle| cycles.value(cycle, sample, var)));

                let mean = column.iter().sum::<f64>() / n_cycles as f64;
                mean_curve[sample] = mean;

                let var_sum = column
                    .iter()
                    .map(|value| {
                        let centered = *value - mean;
                        centered * centered
                    })
                    .sum::<f64>();
                std_sum += (var_sum / (n_cycles - 1) as f64).sqrt();
            }
            let scale = std_sum / CYCLE_POINTS as f64;

            for (cycle, flag) in flagged.iter_mut().enumerate() {
                if *flag {
                    continue;
                }
                let score = (0..CYCLE_POINTS)
                    .map(|sample| (cycles.value(cycle, sample, var) - mean_curve[sample]).abs())
                    .sum::<f64>()
                    / CYCLE_POINTS as f64;
                if score > self.threshold * scale {
                    *flag = true;
                }
            }
        }

        flagged
            .iter()
            .enumerate()
            .filter_map(|(cycle, flag)| flag.then_some(cycle))
            .collect()
    }
}
