// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::TuningMethod;
use gaitcheck_core::{CycleSet, GaitError, PhaseCheckpoint};
use gaitcheck_spec::RangeTable;
use std::collections::BTreeMap;

/// Derives per-variable, per-checkpoint bounds from empirical cycles.
///
/// The tuner samples exactly the four checkpoint indices the classifier
/// validates, so tuner and classifier stay symmetric and the authored
/// spec surface stays small. Derived tables are written back through
/// `SpecificationStore::upsert_task_ranges`, which requires provenance,
/// so regenerated bounds always stay traceable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tuner {
    method: TuningMethod,
}

impl Tuner {
    pub fn new(method: TuningMethod) -> Self {
        Self { method }
    }

    pub fn method(&self) -> TuningMethod {
        self.method
    }

    /// Derives bounds from one (subject, task) group.
    pub fn tune(&self, cycles: &CycleSet) -> Result<RangeTable, GaitError> {
        self.tune_pooled(std::slice::from_ref(cycles))
    }

    /// Derives bounds from several groups of the same task pooled
    /// together (typically one group per subject).
    ///
    /// All sets must agree on task and variable layout; the pooled
    /// sample for a checkpoint is the concatenation of every set's
    /// checkpoint column, in input order.
    pub fn tune_pooled(&self, sets: &[CycleSet]) -> Result<RangeTable, GaitError> {
        let Some(first) = sets.first() else {
            return Err(GaitError::invalid_input(
                "tuning requires at least one cycle set",
            ));
        };
        for set in &sets[1..] {
            if set.task() != first.task() {
                return Err(GaitError::invalid_input(format!(
                    "cannot pool cycles across tasks '{}' and '{}'",
                    first.task(),
                    set.task()
                )));
            }
            if set.variable_names() != first.variable_names() {
                return Err(GaitError::invalid_input(format!(
                    "cycle sets for task '{}' disagree on variable layout",
                    first.task()
                )));
            }
        }
        let total_cycles: usize = sets.iter().map(CycleSet::n_cycles).sum();
        if total_cycles == 0 {
            return Err(GaitError::invalid_input(format!(
                "no cycles to tune for task '{}'",
                first.task()
            )));
        }

        let strategy = self.method.strategy();
        let mut table: RangeTable = BTreeMap::new();
        let mut samples = Vec::with_capacity(total_cycles);

        for (var_idx, variable) in first.variable_names().iter().enumerate() {
            let mut by_phase = BTreeMap::new();
            for checkpoint in PhaseCheckpoint::ALL {
                samples.clear();
                for set in sets {
                    samples.extend(set.checkpoint_column(checkpoint, var_idx));
                }
                by_phase.insert(checkpoint, strategy.derive(&samples)?);
            }
            table.insert(variable.clone(), by_phase);
        }

        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::Tuner;
    use crate::TuningMethod;
    use gaitcheck_core::{CYCLE_POINTS, CycleSet, PhaseCheckpoint, VariableName};

    fn var(name: &str) -> VariableName {
        VariableName::parse(name).expect("test variable should parse")
    }

    /// Cycles whose checkpoint values are `base + cycle_index`, with a
    /// distinctive filler elsewhere to prove non-checkpoint samples are
    /// never consulted.
    fn set_with_checkpoint_ramp(task: &str, n_cycles: usize, base: f64) -> CycleSet {
        let mut values = vec![9999.0; n_cycles * CYCLE_POINTS];
        for cycle in 0..n_cycles {
            for checkpoint in PhaseCheckpoint::ALL {
                values[cycle * CYCLE_POINTS + checkpoint.sample_index()] = base + cycle as f64;
            }
        }
        CycleSet::new(
            "S01",
            task,
            vec![var("knee_flexion_angle_ipsi_rad")],
            values,
        )
        .expect("test cycle set should be valid")
    }

    #[test]
    fn derives_bounds_for_every_variable_and_checkpoint() {
        let cycles = set_with_checkpoint_ramp("level_walking", 5, 0.0);
        let table = Tuner::new(TuningMethod::MinMaxMargin)
            .tune(&cycles)
            .expect("tuning should succeed");

        assert_eq!(table.len(), 1);
        let by_phase = table
            .get(&var("knee_flexion_angle_ipsi_rad"))
            .expect("variable should be tuned");
        assert_eq!(by_phase.len(), 4);
        for checkpoint in PhaseCheckpoint::ALL {
            let range = by_phase.get(&checkpoint).expect("checkpoint should be tuned");
            // Samples are 0..=4; minmax_margin adds 5% of the span.
            assert!((range.min() - (-0.2)).abs() < 1e-9);
            assert!((range.max() - 4.2).abs() < 1e-9);
        }
    }

    #[test]
    fn only_checkpoint_samples_are_consulted() {
        // Filler is 9999.0 everywhere off-checkpoint; any leak into the
        // sample would explode the envelope.
        let cycles = set_with_checkpoint_ramp("level_walking", 3, 0.0);
        let table = Tuner::new(TuningMethod::MinMaxMargin)
            .tune(&cycles)
            .expect("tuning should succeed");
        let by_phase = table
            .get(&var("knee_flexion_angle_ipsi_rad"))
            .expect("variable should be tuned");
        for range in by_phase.values() {
            assert!(range.max() < 100.0);
        }
    }

    #[test]
    fn pooling_concatenates_subject_samples() {
        let a = set_with_checkpoint_ramp("level_walking", 2, 0.0); // 0, 1
        let b = set_with_checkpoint_ramp("level_walking", 2, 10.0); // 10, 11
        let tuner = Tuner::new(TuningMethod::MinMaxMargin);

        let pooled = tuner
            .tune_pooled(&[a.clone(), b])
            .expect("pooled tuning should succeed");
        let by_phase = pooled
            .get(&var("knee_flexion_angle_ipsi_rad"))
            .expect("variable should be tuned");
        let range = by_phase
            .get(&PhaseCheckpoint::P0)
            .expect("checkpoint should be tuned");
        // Envelope spans both subjects: [0, 11] plus 5% margin.
        assert!((range.min() - (-0.55)).abs() < 1e-9);
        assert!((range.max() - 11.55).abs() < 1e-9);

        let solo = tuner.tune(&a).expect("solo tuning should succeed");
        let solo_range = solo
            .get(&var("knee_flexion_angle_ipsi_rad"))
            .and_then(|by_phase| by_phase.get(&PhaseCheckpoint::P0))
            .copied()
            .expect("checkpoint should be tuned");
        assert!(solo_range.max() < 2.0);
    }

    #[test]
    fn rejects_mismatched_tasks_and_layouts() {
        let walking = set_with_checkpoint_ramp("level_walking", 1, 0.0);
        let stairs = set_with_checkpoint_ramp("stair_ascent", 1, 0.0);
        let tuner = Tuner::new(TuningMethod::Percentile95);

        let err = tuner
            .tune_pooled(&[walking.clone(), stairs])
            .expect_err("task mismatch must fail");
        assert!(err.to_string().contains("cannot pool cycles across tasks"));

        let other_layout = CycleSet::new(
            "S02",
            "level_walking",
            vec![var("hip_flexion_angle_ipsi_rad")],
            vec![0.0; CYCLE_POINTS],
        )
        .expect("cycle set should be valid");
        let err = tuner
            .tune_pooled(&[walking, other_layout])
            .expect_err("layout mismatch must fail");
        assert!(err.to_string().contains("disagree on variable layout"));
    }

    #[test]
    fn rejects_empty_input() {
        let tuner = Tuner::new(TuningMethod::Mean3Std);
        let err = tuner.tune_pooled(&[]).expect_err("no sets must fail");
        assert!(err.to_string().contains("at least one cycle set"));

        let empty = CycleSet::new(
            "S01",
            "level_walking",
            vec![var("knee_flexion_angle_ipsi_rad")],
            vec![],
        )
        .expect("zero-cycle set should be valid");
        let err = tuner.tune(&empty).expect_err("zero cycles must fail");
        assert!(err.to_string().contains("no cycles to tune"));
    }

    #[test]
    fn every_method_produces_a_table_on_the_same_input() {
        let cycles = set_with_checkpoint_ramp("level_walking", 6, 0.0);
        for method in TuningMethod::ALL {
            let table = Tuner::new(method)
                .tune(&cycles)
                .expect("every method should succeed on well-formed input");
            assert_eq!(table.len(), 1, "method {}", method.as_str());
        }
    }
}
