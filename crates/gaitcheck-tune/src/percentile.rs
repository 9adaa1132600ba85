// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::method::{RangeMethod, checkpoint_stat};
use gaitcheck_core::{GaitError, ValidationRange, percentile};

const LOWER_PERCENTILE: f64 = 2.5;
const UPPER_PERCENTILE: f64 = 97.5;

/// Central 95% interval: [2.5th, 97.5th] percentile of the checkpoint
/// values, with linear interpolation between closest ranks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Percentile95;

impl RangeMethod for Percentile95 {
    fn name(&self) -> &'static str {
        "percentile_95"
    }

    fn derive(&self, samples: &[f64]) -> Result<ValidationRange, GaitError> {
        let min = checkpoint_stat(self.name(), percentile(samples, LOWER_PERCENTILE))?;
        let max = checkpoint_stat(self.name(), percentile(samples, UPPER_PERCENTILE))?;
        ValidationRange::new(min, max)
    }
}
