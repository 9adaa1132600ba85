// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::{PhaseCheckpoint, ValidationRange, VariableName};
use std::fmt;

/// Outcome of validating one cycle.
///
/// `InvalidLocal` means every failing checkpoint belongs to the same
/// anatomical (joint, side) group as the worst-offending variable, the
/// signature of an isolated sensor issue. `InvalidOther` means failures
/// are spread across unrelated variables. The split guides triage only;
/// both count as failed cycles in aggregate pass rates.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleClassification {
    Valid,
    InvalidLocal,
    InvalidOther,
}

impl CycleClassification {
    pub fn is_valid(self) -> bool {
        matches!(self, Self::Valid)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::InvalidLocal => "invalid_local",
            Self::InvalidOther => "invalid_other",
        }
    }
}

impl fmt::Display for CycleClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One out-of-range observation at a phase checkpoint.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct CheckpointFailure {
    pub variable: VariableName,
    pub phase: PhaseCheckpoint,
    pub observed: f64,
    pub expected: ValidationRange,
    pub message: String,
}

impl CheckpointFailure {
    pub fn new(
        variable: VariableName,
        phase: PhaseCheckpoint,
        observed: f64,
        expected: ValidationRange,
    ) -> Self {
        let message = format!(
            "{variable} at {phase}: observed {observed} outside expected {expected}"
        );
        Self {
            variable,
            phase,
            observed,
            expected,
            message,
        }
    }

    /// Distance outside the expected range, used to pick the
    /// worst-offending variable of a cycle.
    pub fn exceedance(&self) -> f64 {
        self.expected.exceedance(self.observed)
    }
}

/// Validation outcome for one cycle. Produced fresh per run and never
/// mutated afterward.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ValidationResult {
    pub subject: String,
    pub task: String,
    pub cycle_index: usize,
    pub classification: CycleClassification,
    pub failures: Vec<CheckpointFailure>,
}

/// Category of a non-fatal data-quality warning.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WarningKind {
    /// A (subject, task) group was skipped, e.g. row count not divisible
    /// by 150.
    GroupSkipped,
    /// A variable present in the data has no spec entry for the task.
    VariableUnspecified,
    /// A cycle deviates from the group mean pattern beyond the outlier
    /// threshold.
    OutlierCycle,
}

impl WarningKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GroupSkipped => "group_skipped",
            Self::VariableUnspecified => "variable_unspecified",
            Self::OutlierCycle => "outlier_cycle",
        }
    }
}

/// Non-fatal warning surfaced in the final report without stopping
/// processing.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunWarning {
    pub kind: WarningKind,
    pub message: String,
}

impl RunWarning {
    pub fn group_skipped(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::GroupSkipped,
            message: message.into(),
        }
    }

    pub fn variable_unspecified(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::VariableUnspecified,
            message: message.into(),
        }
    }

    pub fn outlier_cycle(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::OutlierCycle,
            message: message.into(),
        }
    }
}

impl fmt::Display for RunWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.as_str(), self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::{CheckpointFailure, CycleClassification, RunWarning, WarningKind};
    use crate::{PhaseCheckpoint, ValidationRange, VariableName};

    fn knee() -> VariableName {
        VariableName::parse("knee_flexion_angle_ipsi_rad").expect("test variable should parse")
    }

    #[test]
    fn classification_validity_and_labels() {
        assert!(CycleClassification::Valid.is_valid());
        assert!(!CycleClassification::InvalidLocal.is_valid());
        assert!(!CycleClassification::InvalidOther.is_valid());
        assert_eq!(CycleClassification::InvalidLocal.as_str(), "invalid_local");
    }

    #[test]
    fn failure_message_names_variable_phase_and_range() {
        let range = ValidationRange::new(0.0, 0.2).expect("range should be valid");
        let failure = CheckpointFailure::new(knee(), PhaseCheckpoint::P0, 0.3, range);
        assert_eq!(
            failure.message,
            "knee_flexion_angle_ipsi_rad at 0%: observed 0.3 outside expected [0, 0.2]"
        );
        assert!((failure.exceedance() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn warning_constructors_set_kind_and_render_with_tag() {
        let warning = RunWarning::group_skipped("S01/level_walking has 149 rows");
        assert_eq!(warning.kind, WarningKind::GroupSkipped);
        assert_eq!(
            warning.to_string(),
            "[group_skipped] S01/level_walking has 149 rows"
        );

        assert_eq!(
            RunWarning::variable_unspecified("x").kind,
            WarningKind::VariableUnspecified
        );
        assert_eq!(RunWarning::outlier_cycle("x").kind, WarningKind::OutlierCycle);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn validation_result_serde_roundtrip() {
        let range = ValidationRange::new(0.0, 0.2).expect("range should be valid");
        let result = super::ValidationResult {
            subject: "S01".to_string(),
            task: "level_walking".to_string(),
            cycle_index: 2,
            classification: CycleClassification::InvalidLocal,
            failures: vec![CheckpointFailure::new(
                knee(),
                PhaseCheckpoint::P0,
                0.3,
                range,
            )],
        };
        let encoded = serde_json::to_string(&result).expect("result should serialize");
        let decoded: super::ValidationResult =
            serde_json::from_str(&encoded).expect("result should deserialize");
        assert_eq!(decoded, result);
    }
}
