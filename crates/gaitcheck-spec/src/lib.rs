// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Per-task validation range tables: the single source of truth for
//! bounds. The store is an explicit object passed by reference into the
//! classifier and the tuner, so several stores (e.g. per-population) can
//! coexist in one process.

pub mod format;

use gaitcheck_core::{
    GaitError, PhaseCheckpoint, Provenance, Side, Task, ValidationRange, VariableName,
};
use std::collections::BTreeMap;
use std::path::Path;

/// Ranges for one task: variable -> checkpoint -> bound.
pub type RangeTable = BTreeMap<VariableName, BTreeMap<PhaseCheckpoint, ValidationRange>>;

/// One task's block in the store.
#[derive(Clone, Debug, PartialEq)]
pub struct TaskSpec {
    pub task: Task,
    pub provenance: Option<Provenance>,
    pub ranges: RangeTable,
}

/// Parsed specification table, keyed by task name in stable order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpecificationStore {
    tasks: BTreeMap<String, TaskSpec>,
}

impl SpecificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads and parses a specification file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GaitError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| {
            GaitError::structural(format!("failed to read spec '{}': {err}", path.display()))
        })?;
        Self::load_str(&raw)
    }

    /// Parses a specification table from text. See [`format`] for the
    /// grammar.
    pub fn load_str(raw: &str) -> Result<Self, GaitError> {
        format::parse(raw)
    }

    /// Serializes the store; tasks and variables emerge in stable order
    /// so repeated writes of the same store are byte-identical.
    pub fn write_str(&self) -> String {
        format::write(self)
    }

    /// Writes the serialized store to a file.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), GaitError> {
        let path = path.as_ref();
        std::fs::write(path, self.write_str()).map_err(|err| {
            GaitError::structural(format!("failed to write spec '{}': {err}", path.display()))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn contains_task(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    pub fn task(&self, name: &str) -> Option<&TaskSpec> {
        self.tasks.get(name)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &TaskSpec> {
        self.tasks.values()
    }

    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(String::as_str)
    }

    /// Resolves the bound for (task, variable, checkpoint).
    ///
    /// A directly authored entry always wins. For a `contra` variable of
    /// a bilateral-symmetric task with no direct entry, the ipsilateral
    /// mirror's bound at the half-cycle offset applies: the contra bound
    /// at phase P is defined as the ipsi bound at (P + 50) mod 100. Only
    /// ipsi ranges need be authored. `None` means no rule exists, which
    /// is a skip, never a violation.
    pub fn resolve_range(
        &self,
        task: &str,
        variable: &VariableName,
        checkpoint: PhaseCheckpoint,
    ) -> Option<ValidationRange> {
        let spec = self.tasks.get(task)?;
        if let Some(range) = spec
            .ranges
            .get(variable)
            .and_then(|by_phase| by_phase.get(&checkpoint))
        {
            return Some(*range);
        }
        if spec.task.bilateral_symmetric && variable.side() == Side::Contra {
            return spec
                .ranges
                .get(&variable.mirrored())
                .and_then(|by_phase| by_phase.get(&checkpoint.offset()))
                .copied();
        }
        None
    }

    /// True when the task has any resolvable bound for the variable at
    /// any checkpoint.
    pub fn has_any_range(&self, task: &str, variable: &VariableName) -> bool {
        PhaseCheckpoint::ALL
            .iter()
            .any(|checkpoint| self.resolve_range(task, variable, *checkpoint).is_some())
    }

    /// Replaces (or creates) a task block with freshly derived ranges.
    ///
    /// This is the tuner's write path: provenance is mandatory here so a
    /// regenerated block is always traceable to its dataset and method.
    pub fn upsert_task_ranges(&mut self, task: Task, ranges: RangeTable, provenance: Provenance) {
        self.tasks.insert(
            task.name.clone(),
            TaskSpec {
                task,
                provenance: Some(provenance),
                ranges,
            },
        );
    }

    pub(crate) fn insert_parsed(&mut self, spec: TaskSpec) -> Result<(), GaitError> {
        if self.tasks.contains_key(&spec.task.name) {
            return Err(GaitError::spec_format(format!(
                "duplicate task block '{}'",
                spec.task.name
            )));
        }
        self.tasks.insert(spec.task.name.clone(), spec);
        Ok(())
    }
}
