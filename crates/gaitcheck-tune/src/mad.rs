// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::method::{RangeMethod, checkpoint_stat};
use gaitcheck_core::{GaitError, ValidationRange, mad, median};

/// Consistency factor making the MAD estimate the standard deviation
/// under a normal distribution.
const NORMAL_CONSISTENCY: f64 = 1.4826;
const K_SIGMA: f64 = 3.0;

/// Robust z-interval: median ± 3 · 1.4826 · MAD. The scaled MAD stands
/// in for the standard deviation, so heavy-tailed checkpoint samples do
/// not inflate the bound the way mean ± kσ does.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MadEstimate;

impl RangeMethod for MadEstimate {
    fn name(&self) -> &'static str {
        "mad_estimate"
    }

    fn derive(&self, samples: &[f64]) -> Result<ValidationRange, GaitError> {
        let center = checkpoint_stat(self.name(), median(samples))?;
        let spread = checkpoint_stat(self.name(), mad(samples))?;
        let half_width = K_SIGMA * NORMAL_CONSISTENCY * spread;
        ValidationRange::new(center - half_width, center + half_width)
    }
}
