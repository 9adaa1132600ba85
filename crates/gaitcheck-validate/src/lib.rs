// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Validation stage of the gaitcheck pipeline: checkpoint classification
//! against a specification store, purely statistical outlier detection,
//! and deterministic report aggregation.

pub mod classifier;
pub mod outlier;
pub mod report;

pub use classifier::{ClassificationOutcome, StepClassifier};
pub use outlier::OutlierDetector;
pub use report::{FailureExample, MAX_EXAMPLES_PER_VARIABLE, Report, ReportBuilder};
