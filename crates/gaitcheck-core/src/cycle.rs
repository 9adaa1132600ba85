// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::{GaitError, PhaseCheckpoint, VariableName};

/// Number of phase-normalized samples in one gait cycle (0–100%).
pub const CYCLE_POINTS: usize = 150;

/// Arena-style storage for all cycles of one (subject, task) group.
///
/// Values live in one contiguous buffer laid out cycle-major:
/// `values[((cycle * CYCLE_POINTS) + sample) * n_vars + var]`. The
/// 150-sample invariant is structural: the only constructor rejects any
/// buffer whose length is not `n_cycles * 150 * n_vars`, so downstream
/// code never re-checks cycle shape.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct CycleSet {
    subject: String,
    task: String,
    variable_names: Vec<VariableName>,
    values: Vec<f64>,
    n_cycles: usize,
}

impl CycleSet {
    /// Constructs a validated cycle set.
    ///
    /// `values` must hold `n * CYCLE_POINTS * variable_names.len()`
    /// finite numbers for some integer `n >= 0`, row-major by
    /// (cycle, sample, variable).
    pub fn new(
        subject: impl Into<String>,
        task: impl Into<String>,
        variable_names: Vec<VariableName>,
        values: Vec<f64>,
    ) -> Result<Self, GaitError> {
        let subject = subject.into();
        let task = task.into();
        if variable_names.is_empty() {
            return Err(GaitError::structural(
                "cycle set requires at least one variable column",
            ));
        }
        let row_width = variable_names.len();
        let cycle_len = CYCLE_POINTS
            .checked_mul(row_width)
            .ok_or_else(|| GaitError::structural("cycle width overflow"))?;
        if cycle_len == 0 || !values.len().is_multiple_of(cycle_len) {
            return Err(GaitError::invalid_input(format!(
                "value buffer length {} is not a multiple of {} ({} samples x {} variables) \
                 for subject '{subject}', task '{task}'",
                values.len(),
                cycle_len,
                CYCLE_POINTS,
                row_width
            )));
        }
        if let Some(idx) = values.iter().position(|v| !v.is_finite()) {
            return Err(GaitError::structural(format!(
                "non-finite value at flat index {idx} for subject '{subject}', task '{task}'"
            )));
        }
        let n_cycles = values.len() / cycle_len;

        Ok(Self {
            subject,
            task,
            variable_names,
            values,
            n_cycles,
        })
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn n_cycles(&self) -> usize {
        self.n_cycles
    }

    pub fn n_vars(&self) -> usize {
        self.variable_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.n_cycles == 0
    }

    pub fn variable_names(&self) -> &[VariableName] {
        &self.variable_names
    }

    pub fn variable_index(&self, name: &VariableName) -> Option<usize> {
        self.variable_names.iter().position(|v| v == name)
    }

    /// Value at (cycle, sample, variable). Panics on out-of-range
    /// indices, which the validated constructor makes a caller bug.
    pub fn value(&self, cycle: usize, sample: usize, var: usize) -> f64 {
        assert!(cycle < self.n_cycles, "cycle index out of range");
        assert!(sample < CYCLE_POINTS, "sample index out of range");
        assert!(var < self.n_vars(), "variable index out of range");
        self.values[(cycle * CYCLE_POINTS + sample) * self.n_vars() + var]
    }

    /// Value of one variable at a phase checkpoint of one cycle.
    pub fn checkpoint_value(&self, cycle: usize, checkpoint: PhaseCheckpoint, var: usize) -> f64 {
        self.value(cycle, checkpoint.sample_index(), var)
    }

    /// All values of one variable at a checkpoint, across cycles, in
    /// cycle order. This is the tuner's sampling surface.
    pub fn checkpoint_column(&self, checkpoint: PhaseCheckpoint, var: usize) -> Vec<f64> {
        (0..self.n_cycles)
            .map(|cycle| self.checkpoint_value(cycle, checkpoint, var))
            .collect()
    }
}
