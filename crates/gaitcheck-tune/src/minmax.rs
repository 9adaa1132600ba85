// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::method::{RangeMethod, checkpoint_stat};
use gaitcheck_core::{GaitError, ValidationRange, percentile};

const MARGIN_FRACTION: f64 = 0.05;

/// Observed envelope with a safety margin: [min − m, max + m] where m is
/// 5% of the observed span. A constant sample has zero span and yields a
/// degenerate point range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MinMaxMargin;

impl RangeMethod for MinMaxMargin {
    fn name(&self) -> &'static str {
        "minmax_margin"
    }

    fn derive(&self, samples: &[f64]) -> Result<ValidationRange, GaitError> {
        let min = checkpoint_stat(self.name(), percentile(samples, 0.0))?;
        let max = checkpoint_stat(self.name(), percentile(samples, 100.0))?;
        let margin = MARGIN_FRACTION * (max - min);
        ValidationRange::new(min - margin, max + margin)
    }
}
