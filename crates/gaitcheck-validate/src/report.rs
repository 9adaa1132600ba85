// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use gaitcheck_core::{
    CycleClassification, PhaseCheckpoint, RunDiagnostics, RunWarning, ValidationRange,
    ValidationResult, VariableName,
};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Maximum example failures rendered per variable; the rest collapse
/// into an "...and N more" suffix so report size stays bounded.
pub const MAX_EXAMPLES_PER_VARIABLE: usize = 5;

/// One rendered failure example.
#[derive(Clone, Debug, PartialEq)]
pub struct FailureExample {
    pub phase: PhaseCheckpoint,
    pub observed: f64,
    pub expected: ValidationRange,
}

#[derive(Clone, Debug, Default, PartialEq)]
struct TaskCounts {
    total: usize,
    valid: usize,
}

#[derive(Clone, Debug, Default, PartialEq)]
struct VariableFailures {
    count: usize,
    examples: Vec<FailureExample>,
}

impl VariableFailures {
    fn absorb(&mut self, other: VariableFailures) {
        self.count += other.count;
        self.examples.extend(other.examples);
        self.examples.truncate(MAX_EXAMPLES_PER_VARIABLE);
    }
}

/// Accumulates validation results into monotonic counters.
///
/// `add` and `merge` are plain additions, so chunked runs can accumulate
/// per-group builders in any order and `finish` into one report.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReportBuilder {
    total_cycles: usize,
    valid_cycles: usize,
    invalid_local: usize,
    invalid_other: usize,
    per_task: BTreeMap<String, TaskCounts>,
    failures: BTreeMap<String, BTreeMap<VariableName, VariableFailures>>,
    warnings: Vec<RunWarning>,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, result: &ValidationResult) {
        self.total_cycles += 1;
        let task_counts = self.per_task.entry(result.task.clone()).or_default();
        task_counts.total += 1;
        match result.classification {
            CycleClassification::Valid => {
                self.valid_cycles += 1;
                task_counts.valid += 1;
            }
            CycleClassification::InvalidLocal => self.invalid_local += 1,
            CycleClassification::InvalidOther => self.invalid_other += 1,
        }

        for failure in &result.failures {
            let per_variable = self
                .failures
                .entry(result.task.clone())
                .or_default()
                .entry(failure.variable.clone())
                .or_default();
            per_variable.count += 1;
            if per_variable.examples.len() < MAX_EXAMPLES_PER_VARIABLE {
                per_variable.examples.push(FailureExample {
                    phase: failure.phase,
                    observed: failure.observed,
                    expected: failure.expected,
                });
            }
        }
    }

    pub fn add_all<'a>(&mut self, results: impl IntoIterator<Item = &'a ValidationResult>) {
        for result in results {
            self.add(result);
        }
    }

    pub fn warn(&mut self, warning: RunWarning) {
        self.warnings.push(warning);
    }

    pub fn warn_all(&mut self, warnings: impl IntoIterator<Item = RunWarning>) {
        self.warnings.extend(warnings);
    }

    /// Combines another builder's counters into this one.
    pub fn merge(&mut self, other: ReportBuilder) {
        self.total_cycles += other.total_cycles;
        self.valid_cycles += other.valid_cycles;
        self.invalid_local += other.invalid_local;
        self.invalid_other += other.invalid_other;
        for (task, counts) in other.per_task {
            let entry = self.per_task.entry(task).or_default();
            entry.total += counts.total;
            entry.valid += counts.valid;
        }
        for (task, variables) in other.failures {
            let task_entry = self.failures.entry(task).or_default();
            for (variable, stats) in variables {
                task_entry.entry(variable).or_default().absorb(stats);
            }
        }
        self.warnings.extend(other.warnings);
    }

    pub fn finish(self, diagnostics: RunDiagnostics) -> Report {
        Report {
            builder: self,
            diagnostics,
        }
    }
}

/// Aggregated validation report, rendered as markdown.
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    builder: ReportBuilder,
    diagnostics: RunDiagnostics,
}

impl Report {
    pub fn total_cycles(&self) -> usize {
        self.builder.total_cycles
    }

    pub fn valid_cycles(&self) -> usize {
        self.builder.valid_cycles
    }

    pub fn invalid_cycles(&self) -> usize {
        self.builder.invalid_local + self.builder.invalid_other
    }

    pub fn diagnostics(&self) -> &RunDiagnostics {
        &self.diagnostics
    }

    /// Renders the report. Ordering is fully deterministic: tasks and
    /// variables alphabetically, the ranking by descending failure count
    /// with name as tiebreak, so identical inputs produce byte-identical
    /// text.
    pub fn render_markdown(&self) -> String {
        let mut out = String::new();
        let b = &self.builder;

        let _ = writeln!(out, "# Gait validation report");
        let _ = writeln!(out);
        let _ = writeln!(out, "- total cycles: {}", b.total_cycles);
        let _ = writeln!(
            out,
            "- valid cycles: {}{}",
            b.valid_cycles,
            pass_rate_suffix(b.valid_cycles, b.total_cycles)
        );
        let _ = writeln!(out, "- invalid (local): {}", b.invalid_local);
        let _ = writeln!(out, "- invalid (other): {}", b.invalid_other);
        let _ = writeln!(out);

        let _ = writeln!(out, "## Per-task pass rates");
        let _ = writeln!(out);
        let _ = writeln!(out, "| task | cycles | valid | pass rate |");
        let _ = writeln!(out, "|---|---|---|---|");
        for (task, counts) in &b.per_task {
            let _ = writeln!(
                out,
                "| {task} | {} | {} | {} |",
                counts.total,
                counts.valid,
                pass_rate_cell(counts.valid, counts.total)
            );
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "## Most-failing variables");
        let _ = writeln!(out);
        let ranked = self.ranked_variables();
        if ranked.is_empty() {
            let _ = writeln!(out, "No checkpoint failures.");
        } else {
            for (task, variable, count) in &ranked {
                let _ = writeln!(out, "- {variable} ({task}): {count} failing checkpoint values");
            }
        }
        let _ = writeln!(out);

        if !b.failures.is_empty() {
            let _ = writeln!(out, "## Failure detail");
            let _ = writeln!(out);
            for (task, variables) in &b.failures {
                let _ = writeln!(out, "### {task}");
                let _ = writeln!(out);
                for (variable, stats) in variables {
                    let _ = writeln!(out, "#### {variable}");
                    for example in &stats.examples {
                        let _ = writeln!(
                            out,
                            "- {}: observed {} outside expected {}",
                            example.phase, example.observed, example.expected
                        );
                    }
                    if stats.count > stats.examples.len() {
                        let _ = writeln!(
                            out,
                            "- ...and {} more",
                            stats.count - stats.examples.len()
                        );
                    }
                    let _ = writeln!(out);
                }
            }
        }

        if !b.warnings.is_empty() {
            let _ = writeln!(out, "## Data-quality warnings");
            let _ = writeln!(out);
            for warning in &b.warnings {
                let _ = writeln!(out, "- {warning}");
            }
            let _ = writeln!(out);
        }

        let d = &self.diagnostics;
        let _ = writeln!(out, "## Run diagnostics");
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "- engine version: {}",
            d.engine_version.as_deref().unwrap_or("unknown")
        );
        let _ = writeln!(out, "- groups seen: {}", d.groups_seen);
        let _ = writeln!(out, "- groups skipped: {}", d.groups_skipped);
        let _ = writeln!(out, "- cycles seen: {}", d.cycles_seen);
        for warning in &d.warnings {
            let _ = writeln!(out, "- warning: {warning}");
        }
        for note in &d.notes {
            let _ = writeln!(out, "- note: {note}");
        }

        out
    }

    /// Variables ranked by descending failure count; ties break on
    /// (task, variable) name order.
    fn ranked_variables(&self) -> Vec<(&str, &VariableName, usize)> {
        let mut ranked = self
            .builder
            .failures
            .iter()
            .flat_map(|(task, variables)| {
                variables
                    .iter()
                    .map(move |(variable, stats)| (task.as_str(), variable, stats.count))
            })
            .collect::<Vec<_>>();
        ranked.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| (a.0, a.1).cmp(&(b.0, b.1))));
        ranked
    }
}

fn pass_rate_suffix(valid: usize, total: usize) -> String {
    if total == 0 {
        String::new()
    } else {
        format!(" ({:.1}%)", valid as f64 * 100.0 / total as f64)
    }
}

fn pass_rate_cell(valid: usize, total: usize) -> String {
    if total == 0 {
        "-".to_string()
    } else {
        format!("{:.1}%", valid as f64 * 100.0 / total as f64)
    }
}
