// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Automated derivation of validation ranges from empirical cycle data.
//!
//! Each statistical method is an independent strategy behind
//! [`RangeMethod`], so callers can compare the bounds different methods
//! produce for the same dataset. All methods are deterministic and
//! seed-free, and all sample only the four phase checkpoints, the same
//! points the classifier validates.

pub mod iqr;
pub mod mad;
pub mod method;
pub mod minmax;
pub mod percentile;
pub mod tuner;
pub mod zscore;

pub use iqr::IqrExpansion;
pub use mad::MadEstimate;
pub use method::RangeMethod;
pub use minmax::MinMaxMargin;
pub use percentile::Percentile95;
pub use tuner::Tuner;
pub use zscore::{Mean2Std, Mean3Std};

use gaitcheck_core::GaitError;

/// Selects one of the built-in range-derivation strategies.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TuningMethod {
    Percentile95,
    Mean3Std,
    Mean2Std,
    IqrExpansion,
    MinMaxMargin,
    MadEstimate,
}

impl TuningMethod {
    pub const ALL: [Self; 6] = [
        Self::Percentile95,
        Self::Mean3Std,
        Self::Mean2Std,
        Self::IqrExpansion,
        Self::MinMaxMargin,
        Self::MadEstimate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Percentile95 => "percentile_95",
            Self::Mean3Std => "mean_3std",
            Self::Mean2Std => "mean_2std",
            Self::IqrExpansion => "iqr_expansion",
            Self::MinMaxMargin => "minmax_margin",
            Self::MadEstimate => "mad_estimate",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, GaitError> {
        match raw {
            "percentile_95" => Ok(Self::Percentile95),
            "mean_3std" => Ok(Self::Mean3Std),
            "mean_2std" => Ok(Self::Mean2Std),
            "iqr_expansion" => Ok(Self::IqrExpansion),
            "minmax_margin" => Ok(Self::MinMaxMargin),
            "mad_estimate" => Ok(Self::MadEstimate),
            _ => Err(GaitError::invalid_input(format!(
                "unknown tuning method '{raw}'; expected one of: percentile_95, mean_3std, \
                 mean_2std, iqr_expansion, minmax_margin, mad_estimate"
            ))),
        }
    }

    /// The strategy implementation behind this selector.
    pub fn strategy(self) -> &'static dyn RangeMethod {
        match self {
            Self::Percentile95 => &Percentile95,
            Self::Mean3Std => &Mean3Std,
            Self::Mean2Std => &Mean2Std,
            Self::IqrExpansion => &IqrExpansion,
            Self::MinMaxMargin => &MinMaxMargin,
            Self::MadEstimate => &MadEstimate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TuningMethod;

    #[test]
    fn parse_accepts_every_method_name() {
        for method in TuningMethod::ALL {
            let parsed = TuningMethod::parse(method.as_str())
                .expect("every listed method should parse");
            assert_eq!(parsed, method);
            assert_eq!(method.strategy().name(), method.as_str());
        }
    }

    #[test]
    fn parse_rejects_unknown_method() {
        let err = TuningMethod::parse("bootstrap").expect_err("unknown method must fail");
        assert!(err.to_string().contains("unknown tuning method 'bootstrap'"));
        assert!(err.to_string().contains("percentile_95"));
    }

    #[test]
    fn methods_disagree_on_skewed_data() {
        // A heavy upper tail separates the robust methods from the
        // moment-based ones; the strategies must be genuinely
        // interchangeable but distinct.
        let samples: Vec<f64> = (0..40)
            .map(|i| if i < 36 { i as f64 * 0.01 } else { 50.0 })
            .collect();
        let minmax = TuningMethod::MinMaxMargin
            .strategy()
            .derive(&samples)
            .expect("derivation should succeed");
        let mad = TuningMethod::MadEstimate
            .strategy()
            .derive(&samples)
            .expect("derivation should succeed");
        assert!(minmax.max() > 49.0);
        assert!(mad.max() < 10.0);
    }
}
