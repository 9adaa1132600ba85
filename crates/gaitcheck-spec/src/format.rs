// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Text format for specification tables.
//!
//! One block per task: directive header lines, a fixed column header,
//! then one row per variable with a (min, max) cell pair per checkpoint:
//!
//! ```text
//! # task: level_walking
//! # classification: cyclic_gait bilateral_symmetric
//! # source: umich_2021.csv
//! # method: percentile_95
//! # generated_at: 1754524800
//! variable,min@0,max@0,min@25,max@25,min@50,max@50,min@75,max@75
//! knee_flexion_angle_ipsi_rad,0,0.2,0.1,0.5,0.2,0.8,0.3,1.1
//! ```
//!
//! An empty (min, max) cell pair means "no bound authored at this
//! checkpoint". `#` lines that are not recognized directives are
//! comments. Floats are written with Rust's shortest round-trip
//! formatting, so `load_str(write_str(store)) == store` exactly.

use crate::{SpecificationStore, TaskSpec};
use gaitcheck_core::{
    GaitError, PhaseCheckpoint, Provenance, Task, ValidationRange, VariableName,
};
use std::collections::BTreeMap;
use std::fmt::Write as _;

const COLUMN_HEADER: [&str; 9] = [
    "variable", "min@0", "max@0", "min@25", "max@25", "min@50", "max@50", "min@75", "max@75",
];

#[derive(Default)]
struct BlockBuilder {
    name: String,
    started_at_line: usize,
    classification: Option<(bool, bool)>,
    source: Option<String>,
    method: Option<String>,
    generated_at: Option<u64>,
    header_seen: bool,
    ranges: BTreeMap<VariableName, BTreeMap<PhaseCheckpoint, ValidationRange>>,
}

impl BlockBuilder {
    fn finish(self) -> Result<TaskSpec, GaitError> {
        let (cyclic_gait, bilateral_symmetric) = self.classification.unwrap_or((true, true));
        let task = Task::with_classification(&self.name, cyclic_gait, bilateral_symmetric)
            .map_err(|err| {
                GaitError::spec_format(format!("line {}: {err}", self.started_at_line))
            })?;

        let provenance = match (self.source, self.method, self.generated_at) {
            (Some(dataset), Some(method), Some(generated_at_unix)) => Some(Provenance {
                dataset,
                method,
                generated_at_unix,
            }),
            (None, None, None) => None,
            _ => {
                return Err(GaitError::spec_format(format!(
                    "task '{}': provenance requires 'source', 'method', and 'generated_at' \
                     together",
                    self.name
                )));
            }
        };

        Ok(TaskSpec {
            task,
            provenance,
            ranges: self.ranges,
        })
    }
}

pub(crate) fn parse(raw: &str) -> Result<SpecificationStore, GaitError> {
    let mut store = SpecificationStore::new();
    let mut block: Option<BlockBuilder> = None;

    for (idx, line) in raw.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix('#') {
            if let Some((key, value)) = rest.split_once(':') {
                let key = key.trim();
                let value = value.trim();
                match key {
                    "task" => {
                        if let Some(done) = block.take() {
                            store.insert_parsed(done.finish()?)?;
                        }
                        if value.is_empty() {
                            return Err(GaitError::spec_format(format!(
                                "line {line_no}: '# task:' requires a task name"
                            )));
                        }
                        block = Some(BlockBuilder {
                            name: value.to_string(),
                            started_at_line: line_no,
                            ..BlockBuilder::default()
                        });
                    }
                    "classification" => {
                        let current = require_block(&mut block, line_no, key)?;
                        if current.classification.is_some() {
                            return Err(duplicate_directive(line_no, key));
                        }
                        current.classification = Some(parse_classification(value, line_no)?);
                    }
                    "source" => {
                        let current = require_block(&mut block, line_no, key)?;
                        if current.source.is_some() {
                            return Err(duplicate_directive(line_no, key));
                        }
                        current.source = Some(value.to_string());
                    }
                    "method" => {
                        let current = require_block(&mut block, line_no, key)?;
                        if current.method.is_some() {
                            return Err(duplicate_directive(line_no, key));
                        }
                        current.method = Some(value.to_string());
                    }
                    "generated_at" => {
                        let current = require_block(&mut block, line_no, key)?;
                        if current.generated_at.is_some() {
                            return Err(duplicate_directive(line_no, key));
                        }
                        let parsed = value.parse::<u64>().map_err(|_| {
                            GaitError::spec_format(format!(
                                "line {line_no}: 'generated_at' expects unix seconds, got \
                                 '{value}'"
                            ))
                        })?;
                        current.generated_at = Some(parsed);
                    }
                    // Unrecognized directives are comments.
                    _ => {}
                }
            }
            continue;
        }

        let Some(current) = block.as_mut() else {
            return Err(GaitError::spec_format(format!(
                "line {line_no}: data before any '# task:' directive"
            )));
        };

        let cells = trimmed.split(',').map(str::trim).collect::<Vec<_>>();
        if !current.header_seen {
            if cells != COLUMN_HEADER {
                return Err(GaitError::spec_format(format!(
                    "line {line_no}: expected column header '{}', got '{trimmed}'",
                    COLUMN_HEADER.join(",")
                )));
            }
            current.header_seen = true;
            continue;
        }

        parse_row(current, &cells, line_no)?;
    }

    if let Some(done) = block.take() {
        store.insert_parsed(done.finish()?)?;
    }

    Ok(store)
}

fn require_block<'a>(
    block: &'a mut Option<BlockBuilder>,
    line_no: usize,
    key: &str,
) -> Result<&'a mut BlockBuilder, GaitError> {
    block.as_mut().ok_or_else(|| {
        GaitError::spec_format(format!(
            "line {line_no}: '# {key}:' must follow a '# task:' directive"
        ))
    })
}

fn duplicate_directive(line_no: usize, key: &str) -> GaitError {
    GaitError::spec_format(format!(
        "line {line_no}: duplicate '# {key}:' directive in task block"
    ))
}

fn parse_classification(value: &str, line_no: usize) -> Result<(bool, bool), GaitError> {
    if value == "none" {
        return Ok((false, false));
    }
    let mut cyclic_gait = false;
    let mut bilateral_symmetric = false;
    if value.is_empty() {
        return Err(GaitError::spec_format(format!(
            "line {line_no}: 'classification' requires at least one token or 'none'"
        )));
    }
    for token in value.split_whitespace() {
        match token {
            "cyclic_gait" => cyclic_gait = true,
            "bilateral_symmetric" => bilateral_symmetric = true,
            other => {
                return Err(GaitError::spec_format(format!(
                    "line {line_no}: unknown classification token '{other}'; expected \
                     'cyclic_gait', 'bilateral_symmetric', or 'none'"
                )));
            }
        }
    }
    Ok((cyclic_gait, bilateral_symmetric))
}

fn parse_row(current: &mut BlockBuilder, cells: &[&str], line_no: usize) -> Result<(), GaitError> {
    if cells.len() != COLUMN_HEADER.len() {
        return Err(GaitError::spec_format(format!(
            "line {line_no}: expected {} cells, got {}",
            COLUMN_HEADER.len(),
            cells.len()
        )));
    }

    let variable = VariableName::parse(cells[0])
        .map_err(|err| GaitError::spec_format(format!("line {line_no}: {err}")))?;
    if current.ranges.contains_key(&variable) {
        return Err(GaitError::spec_format(format!(
            "line {line_no}: duplicate variable row '{variable}' in task '{}'",
            current.name
        )));
    }

    let mut by_phase = BTreeMap::new();
    for (slot, checkpoint) in PhaseCheckpoint::ALL.into_iter().enumerate() {
        let min_cell = cells[1 + 2 * slot];
        let max_cell = cells[2 + 2 * slot];
        match (min_cell.is_empty(), max_cell.is_empty()) {
            (true, true) => continue,
            (false, false) => {
                let min = parse_bound(min_cell, line_no, 2 + 2 * slot)?;
                let max = parse_bound(max_cell, line_no, 3 + 2 * slot)?;
                let range = ValidationRange::new(min, max)
                    .map_err(|err| GaitError::spec_format(format!("line {line_no}: {err}")))?;
                by_phase.insert(checkpoint, range);
            }
            _ => {
                return Err(GaitError::spec_format(format!(
                    "line {line_no}: checkpoint {checkpoint} of '{variable}' has exactly one \
                     empty bound cell; provide both or neither"
                )));
            }
        }
    }

    current.ranges.insert(variable, by_phase);
    Ok(())
}

fn parse_bound(cell: &str, line_no: usize, column: usize) -> Result<f64, GaitError> {
    cell.parse::<f64>().map_err(|_| {
        GaitError::spec_format(format!(
            "line {line_no} column {}: '{cell}' is not a valid number",
            column + 1
        ))
    })
}

pub(crate) fn write(store: &SpecificationStore) -> String {
    let mut out = String::new();
    for spec in store.tasks() {
        let _ = writeln!(out, "# task: {}", spec.task.name);
        let _ = writeln!(
            out,
            "# classification: {}",
            classification_tokens(&spec.task)
        );
        if let Some(provenance) = &spec.provenance {
            let _ = writeln!(out, "# source: {}", provenance.dataset);
            let _ = writeln!(out, "# method: {}", provenance.method);
            let _ = writeln!(out, "# generated_at: {}", provenance.generated_at_unix);
        }
        let _ = writeln!(out, "{}", COLUMN_HEADER.join(","));
        for (variable, by_phase) in &spec.ranges {
            let _ = write!(out, "{variable}");
            for checkpoint in PhaseCheckpoint::ALL {
                match by_phase.get(&checkpoint) {
                    Some(range) => {
                        let _ = write!(out, ",{},{}", range.min(), range.max());
                    }
                    None => out.push_str(",,"),
                }
            }
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

fn classification_tokens(task: &Task) -> String {
    match (task.cyclic_gait, task.bilateral_symmetric) {
        (true, true) => "cyclic_gait bilateral_symmetric".to_string(),
        (true, false) => "cyclic_gait".to_string(),
        (false, true) => "bilateral_symmetric".to_string(),
        (false, false) => "none".to_string(),
    }
}
