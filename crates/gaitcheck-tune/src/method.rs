// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use gaitcheck_core::{GaitError, ValidationRange};

/// One statistical strategy for deriving a validation bound from the
/// empirical values observed at a single phase checkpoint.
///
/// Implementations must be deterministic and seed-free: the same sample
/// slice always yields the same range. Samples arrive unsorted, in cycle
/// order, and are guaranteed finite by the cycle arena.
pub trait RangeMethod {
    /// Stable method name recorded in provenance headers.
    fn name(&self) -> &'static str;

    /// Derives a bound from at least one sample; empty input is an
    /// invalid-input error.
    fn derive(&self, samples: &[f64]) -> Result<ValidationRange, GaitError>;
}

/// Lifts an optional statistic into the method's error contract: `None`
/// only ever means the checkpoint column was empty.
pub(crate) fn checkpoint_stat<T>(method: &str, value: Option<T>) -> Result<T, GaitError> {
    value.ok_or_else(|| {
        GaitError::invalid_input(format!(
            "{method} requires at least one sample, got none"
        ))
    })
}
