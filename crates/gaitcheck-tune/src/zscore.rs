// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::method::{RangeMethod, checkpoint_stat};
use gaitcheck_core::{GaitError, ValidationRange, mean, sample_std};

/// mean ± 3σ: covers ~99.7% of normally distributed checkpoint values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Mean3Std;

/// mean ± 2σ: a tighter ~95% normal interval.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Mean2Std;

fn mean_k_std(name: &str, samples: &[f64], k: f64) -> Result<ValidationRange, GaitError> {
    let center = checkpoint_stat(name, mean(samples))?;
    // A single sample has undefined std; the bound degenerates to the
    // observed point.
    let spread = sample_std(samples).unwrap_or(0.0);
    ValidationRange::new(center - k * spread, center + k * spread)
}

impl RangeMethod for Mean3Std {
    fn name(&self) -> &'static str {
        "mean_3std"
    }

    fn derive(&self, samples: &[f64]) -> Result<ValidationRange, GaitError> {
        mean_k_std(self.name(), samples, 3.0)
    }
}

impl RangeMethod for Mean2Std {
    fn name(&self) -> &'static str {
        "mean_2std"
    }

    fn derive(&self, samples: &[f64]) -> Result<ValidationRange, GaitError> {
        mean_k_std(self.name(), samples, 2.0)
    }
}
