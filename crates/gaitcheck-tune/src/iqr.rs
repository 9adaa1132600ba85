// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::method::{RangeMethod, checkpoint_stat};
use gaitcheck_core::{GaitError, ValidationRange, quartiles};

const IQR_MULTIPLIER: f64 = 1.5;

/// Tukey fence: [Q1 − 1.5·IQR, Q3 + 1.5·IQR]. Robust to moderate
/// outliers in the checkpoint sample.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IqrExpansion;

impl RangeMethod for IqrExpansion {
    fn name(&self) -> &'static str {
        "iqr_expansion"
    }

    fn derive(&self, samples: &[f64]) -> Result<ValidationRange, GaitError> {
        let (q1, q3) = checkpoint_stat(self.name(), quartiles(samples))?;
        let iqr = q3 - q1;
        ValidationRange::new(q1 - IQR_MULTIPLIER * iqr, q3 + IQR_MULTIPLIER * iqr)
    }
}
