// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use std::fmt;

/// Error type shared across the gaitcheck crates.
///
/// `Structural` and `SpecFormat` are fatal to the current run or spec
/// load; `InvalidInput` is recoverable at the group level (the caller
/// decides whether to skip the offending group or abort).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GaitError {
    /// Malformed input data that invalidates the whole run.
    Structural(String),
    /// Malformed specification table content.
    SpecFormat(String),
    /// A locally recoverable input problem, e.g. one bad subject/task group.
    InvalidInput(String),
}

impl GaitError {
    pub fn structural(msg: impl Into<String>) -> Self {
        Self::Structural(msg.into())
    }

    pub fn spec_format(msg: impl Into<String>) -> Self {
        Self::SpecFormat(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Stable machine-readable code for structured error output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Structural(_) => "structural",
            Self::SpecFormat(_) => "spec_format",
            Self::InvalidInput(_) => "invalid_input",
        }
    }

    /// Returns true when the caller may skip the offending group and continue.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

impl fmt::Display for GaitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structural(msg) | Self::SpecFormat(msg) | Self::InvalidInput(msg) => {
                write!(f, "{msg}")
            }
        }
    }
}

impl std::error::Error for GaitError {}
