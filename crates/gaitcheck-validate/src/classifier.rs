// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use gaitcheck_core::{
    CheckpointFailure, CycleClassification, CycleSet, GaitError, PhaseCheckpoint, RunWarning,
    ValidationResult,
};
use gaitcheck_spec::SpecificationStore;

/// Classification output for one cycle set: per-cycle results plus the
/// data-quality warnings gathered along the way.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassificationOutcome {
    pub results: Vec<ValidationResult>,
    pub warnings: Vec<RunWarning>,
}

/// Evaluates cycles at the four phase checkpoints against a
/// specification store.
///
/// Only the checkpoints are validated, never all 150 samples; that
/// sampling is what keeps whole-dataset validation tractable.
/// Contralateral bounds resolve through the store's half-cycle rotation,
/// so an ipsi-only spec covers both legs. Out-of-range observations are
/// data, not errors: the classifier fails only on structural problems
/// (task missing from the store entirely).
pub struct StepClassifier<'a> {
    store: &'a SpecificationStore,
}

impl<'a> StepClassifier<'a> {
    pub fn new(store: &'a SpecificationStore) -> Self {
        Self { store }
    }

    /// Classifies every cycle of a (subject, task) group.
    pub fn classify(&self, cycles: &CycleSet) -> Result<ClassificationOutcome, GaitError> {
        let task = cycles.task();
        if !self.store.contains_task(task) {
            return Err(GaitError::structural(format!(
                "task '{task}' is absent from the specification store"
            )));
        }

        // Variables with no resolvable bound at any checkpoint are
        // skipped wholesale; absence of a rule is not a violation, but it
        // is reportable.
        let mut warnings = Vec::new();
        let mut checked_vars = Vec::new();
        for (var_idx, variable) in cycles.variable_names().iter().enumerate() {
            if self.store.has_any_range(task, variable) {
                checked_vars.push(var_idx);
            } else {
                warnings.push(RunWarning::variable_unspecified(format!(
                    "{variable} has no spec entry for task '{task}'"
                )));
            }
        }

        let mut results = Vec::with_capacity(cycles.n_cycles());
        for cycle in 0..cycles.n_cycles() {
            results.push(self.classify_cycle(cycles, cycle, &checked_vars));
        }

        Ok(ClassificationOutcome { results, warnings })
    }

    fn classify_cycle(
        &self,
        cycles: &CycleSet,
        cycle: usize,
        checked_vars: &[usize],
    ) -> ValidationResult {
        let task = cycles.task();
        let mut failures: Vec<CheckpointFailure> = Vec::new();

        for &var_idx in checked_vars {
            let variable = &cycles.variable_names()[var_idx];
            for checkpoint in PhaseCheckpoint::ALL {
                let Some(range) = self.store.resolve_range(task, variable, checkpoint) else {
                    continue;
                };
                let observed = cycles.checkpoint_value(cycle, checkpoint, var_idx);
                if !range.contains(observed) {
                    failures.push(CheckpointFailure::new(
                        variable.clone(),
                        checkpoint,
                        observed,
                        range,
                    ));
                }
            }
        }

        let classification = classify_failures(&failures);
        ValidationResult {
            subject: cycles.subject().to_string(),
            task: task.to_string(),
            cycle_index: cycle,
            classification,
            failures,
        }
    }
}

/// Applies the triage policy: failures confined to the worst offender's
/// (joint, side) group mean an isolated issue, anything else a systemic
/// one.
fn classify_failures(failures: &[CheckpointFailure]) -> CycleClassification {
    let Some(worst) = failures
        .iter()
        .max_by(|a, b| a.exceedance().total_cmp(&b.exceedance()))
    else {
        return CycleClassification::Valid;
    };

    let worst_group = worst.variable.joint_group();
    if failures
        .iter()
        .all(|failure| failure.variable.joint_group() == worst_group)
    {
        CycleClassification::InvalidLocal
    } else {
        CycleClassification::InvalidOther
    }
}

#[cfg(test)]
mod tests {
    use super::StepClassifier;
    use gaitcheck_core::{
        CYCLE_POINTS, CycleClassification, CycleSet, PhaseCheckpoint, Provenance, Task,
        ValidationRange, VariableName, WarningKind,
    };
    use gaitcheck_spec::{RangeTable, SpecificationStore};
    use std::collections::BTreeMap;

    fn var(name: &str) -> VariableName {
        VariableName::parse(name).expect("test variable should parse")
    }

    fn range(min: f64, max: f64) -> ValidationRange {
        ValidationRange::new(min, max).expect("test range should be valid")
    }

    fn store_with(entries: &[(&str, PhaseCheckpoint, f64, f64)]) -> SpecificationStore {
        let mut ranges: RangeTable = BTreeMap::new();
        for (name, checkpoint, min, max) in entries {
            ranges
                .entry(var(name))
                .or_default()
                .insert(*checkpoint, range(*min, *max));
        }
        let mut store = SpecificationStore::new();
        store.upsert_task_ranges(
            Task::new("level_walking").expect("task name should be valid"),
            ranges,
            Provenance {
                dataset: "unit_test".to_string(),
                method: "manual".to_string(),
                generated_at_unix: 0,
            },
        );
        store
    }

    /// One cycle per variable; each variable is flat except for explicit
    /// checkpoint overrides.
    fn cycle_set(vars: &[&str], overrides: &[(usize, PhaseCheckpoint, f64)]) -> CycleSet {
        let n_vars = vars.len();
        let mut values = vec![0.1; CYCLE_POINTS * n_vars];
        for (var_idx, checkpoint, value) in overrides {
            values[checkpoint.sample_index() * n_vars + var_idx] = *value;
        }
        CycleSet::new(
            "S01",
            "level_walking",
            vars.iter().map(|name| var(name)).collect(),
            values,
        )
        .expect("test cycle set should be valid")
    }

    #[test]
    fn in_range_cycle_is_valid_with_no_failures() {
        let store = store_with(&[("knee_flexion_angle_ipsi_rad", PhaseCheckpoint::P0, 0.0, 0.2)]);
        let cycles = cycle_set(&["knee_flexion_angle_ipsi_rad"], &[]);
        let outcome = StepClassifier::new(&store)
            .classify(&cycles)
            .expect("classification should succeed");

        assert_eq!(outcome.results.len(), 1);
        let result = &outcome.results[0];
        assert_eq!(result.classification, CycleClassification::Valid);
        assert!(result.failures.is_empty());
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn out_of_range_checkpoint_produces_exactly_one_failure() {
        // The worked example: spec [0.0, 0.2] at 0%, observed 0.30.
        let store = store_with(&[("knee_flexion_angle_ipsi_rad", PhaseCheckpoint::P0, 0.0, 0.2)]);
        let cycles = cycle_set(
            &["knee_flexion_angle_ipsi_rad"],
            &[(0, PhaseCheckpoint::P0, 0.30)],
        );
        let outcome = StepClassifier::new(&store)
            .classify(&cycles)
            .expect("classification should succeed");

        let result = &outcome.results[0];
        assert_eq!(result.failures.len(), 1);
        let failure = &result.failures[0];
        assert_eq!(failure.phase, PhaseCheckpoint::P0);
        assert_eq!(failure.observed, 0.30);
        assert_eq!(failure.expected, range(0.0, 0.2));
        assert_eq!(result.classification, CycleClassification::InvalidLocal);
    }

    #[test]
    fn failures_within_one_joint_group_classify_as_invalid_local() {
        let store = store_with(&[
            ("knee_flexion_angle_ipsi_rad", PhaseCheckpoint::P0, 0.0, 0.2),
            ("knee_rotation_moment_ipsi_Nm", PhaseCheckpoint::P25, 0.0, 0.2),
            ("hip_flexion_angle_ipsi_rad", PhaseCheckpoint::P0, 0.0, 1.0),
        ]);
        let cycles = cycle_set(
            &[
                "knee_flexion_angle_ipsi_rad",
                "knee_rotation_moment_ipsi_Nm",
                "hip_flexion_angle_ipsi_rad",
            ],
            &[
                (0, PhaseCheckpoint::P0, 0.9),
                (1, PhaseCheckpoint::P25, 0.5),
            ],
        );
        let outcome = StepClassifier::new(&store)
            .classify(&cycles)
            .expect("classification should succeed");

        let result = &outcome.results[0];
        assert_eq!(result.failures.len(), 2);
        assert_eq!(result.classification, CycleClassification::InvalidLocal);
    }

    #[test]
    fn failures_across_joints_classify_as_invalid_other() {
        let store = store_with(&[
            ("knee_flexion_angle_ipsi_rad", PhaseCheckpoint::P0, 0.0, 0.2),
            ("hip_flexion_angle_ipsi_rad", PhaseCheckpoint::P50, 0.0, 0.2),
        ]);
        let cycles = cycle_set(
            &["knee_flexion_angle_ipsi_rad", "hip_flexion_angle_ipsi_rad"],
            &[
                (0, PhaseCheckpoint::P0, 0.9),
                (1, PhaseCheckpoint::P50, 0.4),
            ],
        );
        let outcome = StepClassifier::new(&store)
            .classify(&cycles)
            .expect("classification should succeed");

        assert_eq!(
            outcome.results[0].classification,
            CycleClassification::InvalidOther
        );
    }

    #[test]
    fn same_joint_different_side_is_not_local() {
        // Ipsi and contra of the same joint are different anatomical
        // groups; a knee spec violation on both legs is systemic.
        let store = store_with(&[
            ("knee_flexion_angle_ipsi_rad", PhaseCheckpoint::P0, 0.0, 0.2),
            ("knee_flexion_angle_ipsi_rad", PhaseCheckpoint::P50, 0.0, 0.2),
        ]);
        let cycles = cycle_set(
            &["knee_flexion_angle_ipsi_rad", "knee_flexion_angle_contra_rad"],
            &[
                (0, PhaseCheckpoint::P0, 0.9),
                // contra at 50% resolves to the ipsi 0% bound.
                (1, PhaseCheckpoint::P50, 0.8),
            ],
        );
        let outcome = StepClassifier::new(&store)
            .classify(&cycles)
            .expect("classification should succeed");

        let result = &outcome.results[0];
        assert_eq!(result.failures.len(), 2);
        assert_eq!(result.classification, CycleClassification::InvalidOther);
    }

    #[test]
    fn contra_variable_validates_against_rotated_ipsi_bounds() {
        let store = store_with(&[("knee_flexion_angle_ipsi_rad", PhaseCheckpoint::P50, 0.0, 0.2)]);
        // The contra variable's 0% checkpoint maps onto the ipsi 50%
        // bound; its other checkpoints have no resolvable rule.
        let cycles = cycle_set(
            &["knee_flexion_angle_contra_rad"],
            &[(0, PhaseCheckpoint::P0, 0.7)],
        );
        let outcome = StepClassifier::new(&store)
            .classify(&cycles)
            .expect("classification should succeed");

        let result = &outcome.results[0];
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].phase, PhaseCheckpoint::P0);
        assert_eq!(result.failures[0].expected, range(0.0, 0.2));
    }

    #[test]
    fn unspecified_variable_is_skipped_with_warning() {
        let store = store_with(&[("knee_flexion_angle_ipsi_rad", PhaseCheckpoint::P0, 0.0, 0.2)]);
        let cycles = cycle_set(
            &["knee_flexion_angle_ipsi_rad", "pelvis_tilt_angle_ipsi_rad"],
            // Would fail wildly if it were validated.
            &[(1, PhaseCheckpoint::P0, 99.0)],
        );
        let outcome = StepClassifier::new(&store)
            .classify(&cycles)
            .expect("classification should succeed");

        assert_eq!(outcome.results[0].classification, CycleClassification::Valid);
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].kind, WarningKind::VariableUnspecified);
        assert!(outcome.warnings[0].message.contains("pelvis_tilt_angle_ipsi_rad"));
    }

    #[test]
    fn missing_task_is_a_structural_error() {
        let store = store_with(&[("knee_flexion_angle_ipsi_rad", PhaseCheckpoint::P0, 0.0, 0.2)]);
        let cycles = CycleSet::new(
            "S01",
            "backflip",
            vec![var("knee_flexion_angle_ipsi_rad")],
            vec![0.1; CYCLE_POINTS],
        )
        .expect("cycle set should be valid");

        let err = StepClassifier::new(&store)
            .classify(&cycles)
            .expect_err("missing task must fail");
        assert_eq!(err.code(), "structural");
        assert!(err.to_string().contains("'backflip'"));
    }

    #[test]
    fn multiple_cycles_are_classified_independently() {
        let store = store_with(&[("knee_flexion_angle_ipsi_rad", PhaseCheckpoint::P0, 0.0, 0.2)]);
        let n_vars = 1;
        let mut values = vec![0.1; CYCLE_POINTS * n_vars * 3];
        // Only the second of three cycles breaks the bound.
        values[CYCLE_POINTS * n_vars + PhaseCheckpoint::P0.sample_index()] = 0.5;
        let cycles = CycleSet::new(
            "S01",
            "level_walking",
            vec![var("knee_flexion_angle_ipsi_rad")],
            values,
        )
        .expect("cycle set should be valid");

        let outcome = StepClassifier::new(&store)
            .classify(&cycles)
            .expect("classification should succeed");
        let classifications = outcome
            .results
            .iter()
            .map(|result| result.classification)
            .collect::<Vec<_>>();
        assert_eq!(
            classifications,
            vec![
                CycleClassification::Valid,
                CycleClassification::InvalidLocal,
                CycleClassification::Valid,
            ]
        );
        assert_eq!(outcome.results[1].cycle_index, 1);
    }
}
