// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::result::RunWarning;

/// Diagnostics schema version for validation-run metadata.
pub const DIAGNOSTICS_SCHEMA_VERSION: u32 = 1;

/// Structured metadata accumulated over one validation run.
///
/// Warnings are data, not errors: a run either completes with a full
/// diagnostics record or fails fast with a structural error.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct RunDiagnostics {
    pub schema_version: u32,
    pub engine_version: Option<String>,
    pub groups_seen: usize,
    pub groups_skipped: usize,
    pub cycles_seen: usize,
    pub warnings: Vec<RunWarning>,
    pub notes: Vec<String>,
}

impl Default for RunDiagnostics {
    fn default() -> Self {
        Self {
            schema_version: DIAGNOSTICS_SCHEMA_VERSION,
            engine_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            groups_seen: 0,
            groups_skipped: 0,
            cycles_seen: 0,
            warnings: vec![],
            notes: vec![],
        }
    }
}

impl RunDiagnostics {
    pub fn warn(&mut self, warning: RunWarning) {
        self.warnings.push(warning);
    }

    /// Combines counters and warning lists from another chunk of the same
    /// run. Plain addition, so accumulation is order-independent.
    pub fn absorb(&mut self, other: RunDiagnostics) {
        self.groups_seen += other.groups_seen;
        self.groups_skipped += other.groups_skipped;
        self.cycles_seen += other.cycles_seen;
        self.warnings.extend(other.warnings);
        self.notes.extend(other.notes);
    }
}
