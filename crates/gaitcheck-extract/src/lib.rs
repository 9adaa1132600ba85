// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Flat-table parsing and gait-cycle extraction.
//!
//! The input is a CSV table with required columns `subject`, `task`,
//! `phase` plus one column per canonical variable name. Rows for a
//! (subject, task) pair must be contiguous; each group must contain an
//! exact multiple of 150 rows, phase ascending within each 150-row
//! block. Extraction copies values into the [`CycleSet`] arena; no
//! interpolation or resampling is ever performed.

use gaitcheck_core::{CYCLE_POINTS, CycleSet, GaitError, VariableName};
use std::collections::HashSet;
use std::path::Path;

const REQUIRED_COLUMNS: [&str; 3] = ["subject", "task", "phase"];

/// Contiguous run of rows belonging to one (subject, task) pair,
/// addressed as half-open row offsets into the table arena.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupSpan {
    pub subject: String,
    pub task: String,
    pub start: usize,
    pub end: usize,
}

impl GroupSpan {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Clone, Debug)]
struct Header {
    subject_col: usize,
    task_col: usize,
    phase_col: usize,
    /// (source column, parsed name) per variable, in table order.
    variable_cols: Vec<(usize, VariableName)>,
    width: usize,
}

impl Header {
    fn parse(line: &str) -> Result<Self, GaitError> {
        let cells = line.split(',').map(str::trim).collect::<Vec<_>>();

        let mut subject_col = None;
        let mut task_col = None;
        let mut phase_col = None;
        let mut variable_cols = Vec::new();
        let mut seen_variables = HashSet::new();

        for (col, cell) in cells.iter().enumerate() {
            match *cell {
                "subject" => assign_required(&mut subject_col, col, "subject")?,
                "task" => assign_required(&mut task_col, col, "task")?,
                "phase" => assign_required(&mut phase_col, col, "phase")?,
                other => {
                    let name = VariableName::parse(other).map_err(|err| {
                        GaitError::structural(format!(
                            "header column {}: {err}",
                            col + 1
                        ))
                    })?;
                    if !seen_variables.insert(name.clone()) {
                        return Err(GaitError::structural(format!(
                            "header column {}: duplicate variable column '{name}'",
                            col + 1
                        )));
                    }
                    variable_cols.push((col, name));
                }
            }
        }

        let subject_col = subject_col
            .ok_or_else(|| GaitError::structural("missing required column 'subject'"))?;
        let task_col =
            task_col.ok_or_else(|| GaitError::structural("missing required column 'task'"))?;
        let phase_col =
            phase_col.ok_or_else(|| GaitError::structural("missing required column 'phase'"))?;
        if variable_cols.is_empty() {
            return Err(GaitError::structural(
                "table requires at least one variable column besides subject/task/phase",
            ));
        }

        Ok(Self {
            subject_col,
            task_col,
            phase_col,
            variable_cols,
            width: cells.len(),
        })
    }

    fn variable_names(&self) -> Vec<VariableName> {
        self.variable_cols
            .iter()
            .map(|(_, name)| name.clone())
            .collect()
    }
}

fn assign_required(
    slot: &mut Option<usize>,
    col: usize,
    name: &str,
) -> Result<(), GaitError> {
    if slot.is_some() {
        return Err(GaitError::structural(format!(
            "header column {}: duplicate required column '{name}'",
            col + 1
        )));
    }
    *slot = Some(col);
    Ok(())
}

#[derive(Clone, Debug)]
struct ParsedRow {
    subject: String,
    task: String,
    phase: f64,
    values: Vec<f64>,
}

fn parse_row(header: &Header, line: &str, line_no: usize) -> Result<ParsedRow, GaitError> {
    let cells = line.split(',').map(str::trim).collect::<Vec<_>>();
    if cells.len() != header.width {
        return Err(GaitError::structural(format!(
            "line {line_no}: expected {} cells, got {}",
            header.width,
            cells.len()
        )));
    }

    let subject = cells[header.subject_col];
    if subject.is_empty() {
        return Err(GaitError::structural(format!(
            "line {line_no}: empty 'subject' cell"
        )));
    }
    let task = cells[header.task_col];
    if task.is_empty() {
        return Err(GaitError::structural(format!(
            "line {line_no}: empty 'task' cell"
        )));
    }

    let phase_cell = cells[header.phase_col];
    let phase = phase_cell.parse::<f64>().map_err(|_| {
        GaitError::structural(format!(
            "line {line_no}: 'phase' cell '{phase_cell}' is not a valid number"
        ))
    })?;
    if !(0.0..=100.0).contains(&phase) {
        return Err(GaitError::structural(format!(
            "line {line_no}: phase {phase} outside [0, 100]"
        )));
    }

    let mut values = Vec::with_capacity(header.variable_cols.len());
    for (col, name) in &header.variable_cols {
        let cell = cells[*col];
        let value = cell.parse::<f64>().map_err(|_| {
            GaitError::structural(format!(
                "line {line_no}: '{name}' cell '{cell}' is not a valid number"
            ))
        })?;
        if !value.is_finite() {
            return Err(GaitError::structural(format!(
                "line {line_no}: '{name}' cell '{cell}' is not finite"
            )));
        }
        values.push(value);
    }

    Ok(ParsedRow {
        subject: subject.to_string(),
        task: task.to_string(),
        phase,
        values,
    })
}

/// Fully materialized input table with group spans precomputed.
#[derive(Clone, Debug, PartialEq)]
pub struct GaitTable {
    variable_names: Vec<VariableName>,
    phase: Vec<f64>,
    values: Vec<f64>,
    spans: Vec<GroupSpan>,
}

impl GaitTable {
    /// Reads and parses a table file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GaitError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| {
            GaitError::structural(format!("failed to read table '{}': {err}", path.display()))
        })?;
        Self::parse_str(&raw)
    }

    /// Parses a table from CSV text.
    pub fn parse_str(raw: &str) -> Result<Self, GaitError> {
        let mut lines = raw
            .lines()
            .enumerate()
            .map(|(idx, line)| (idx + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty());

        let Some((_, header_line)) = lines.next() else {
            return Err(GaitError::structural("table is empty; expected a header row"));
        };
        let header = Header::parse(header_line)?;

        let n_vars = header.variable_cols.len();
        let mut phase = Vec::new();
        let mut values = Vec::new();
        let mut spans: Vec<GroupSpan> = Vec::new();
        let mut seen_pairs = HashSet::new();
        let mut row_count = 0usize;

        for (line_no, line) in lines {
            let row = parse_row(&header, line, line_no)?;

            let same_group = spans
                .last()
                .is_some_and(|span| span.subject == row.subject && span.task == row.task);
            if !same_group {
                if let Some(last) = spans.last_mut() {
                    last.end = row_count;
                }
                if !seen_pairs.insert((row.subject.clone(), row.task.clone())) {
                    return Err(GaitError::structural(format!(
                        "line {line_no}: rows for subject '{}', task '{}' are not contiguous",
                        row.subject, row.task
                    )));
                }
                spans.push(GroupSpan {
                    subject: row.subject,
                    task: row.task,
                    start: row_count,
                    end: row_count,
                });
            }

            phase.push(row.phase);
            values.extend_from_slice(&row.values);
            row_count += 1;
        }
        if let Some(last) = spans.last_mut() {
            last.end = row_count;
        }

        debug_assert_eq!(values.len(), row_count * n_vars);

        Ok(Self {
            variable_names: header.variable_names(),
            phase,
            values,
            spans,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.phase.len()
    }

    pub fn variable_names(&self) -> &[VariableName] {
        &self.variable_names
    }

    /// Contiguous (subject, task) spans in table order.
    pub fn group_spans(&self) -> &[GroupSpan] {
        &self.spans
    }

    /// Extracts all cycles for one (subject, task) pair.
    ///
    /// Returns a recoverable error when the pair has no rows or when the
    /// group violates the 150-row cycle structure; the caller decides
    /// whether to skip the group or abort.
    pub fn extract(&self, subject: &str, task: &str) -> Result<CycleSet, GaitError> {
        let span = self
            .spans
            .iter()
            .find(|span| span.subject == subject && span.task == task)
            .ok_or_else(|| {
                GaitError::invalid_input(format!(
                    "no rows for subject '{subject}', task '{task}'"
                ))
            })?;
        self.extract_span(span)
    }

    /// Extracts the cycles of one precomputed span.
    pub fn extract_span(&self, span: &GroupSpan) -> Result<CycleSet, GaitError> {
        let rows = span.len();
        if rows == 0 || !rows.is_multiple_of(CYCLE_POINTS) {
            return Err(GaitError::invalid_input(format!(
                "subject '{}', task '{}' has {rows} rows, not a positive multiple of \
                 {CYCLE_POINTS}; group skipped",
                span.subject, span.task
            )));
        }

        let phase = &self.phase[span.start..span.end];
        for (cycle, block) in phase.chunks_exact(CYCLE_POINTS).enumerate() {
            for i in 1..block.len() {
                if block[i] < block[i - 1] {
                    return Err(GaitError::invalid_input(format!(
                        "subject '{}', task '{}', cycle {cycle}: phase decreases from {} to {} \
                         within a {CYCLE_POINTS}-row block",
                        span.subject, span.task, block[i - 1], block[i]
                    )));
                }
            }
        }

        let n_vars = self.variable_names.len();
        let values = self.values[span.start * n_vars..span.end * n_vars].to_vec();
        CycleSet::new(
            span.subject.clone(),
            span.task.clone(),
            self.variable_names.clone(),
            values,
        )
    }

    /// Per-group extraction over the whole table, in table order. Cycle
    /// arenas are materialized one group at a time.
    pub fn groups(&self) -> impl Iterator<Item = (&GroupSpan, Result<CycleSet, GaitError>)> {
        self.spans.iter().map(|span| (span, self.extract_span(span)))
    }
}
