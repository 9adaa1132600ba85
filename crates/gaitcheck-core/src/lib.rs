// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Core shared types for the gaitcheck workspace: parsed variable names,
//! phase checkpoints, the fixed-length cycle arena, validation results,
//! and run diagnostics.

pub mod cycle;
pub mod diagnostics;
pub mod error;
pub mod phase;
pub mod range;
pub mod result;
pub mod stats;
pub mod task;
pub mod variable;

pub use cycle::{CYCLE_POINTS, CycleSet};
pub use diagnostics::{DIAGNOSTICS_SCHEMA_VERSION, RunDiagnostics};
pub use error::GaitError;
pub use phase::PhaseCheckpoint;
pub use range::{Provenance, ValidationRange};
pub use result::{CheckpointFailure, CycleClassification, RunWarning, ValidationResult, WarningKind};
pub use stats::{mad, mean, median, percentile, quartiles, sample_std};
pub use task::Task;
pub use variable::{Side, VariableName};
