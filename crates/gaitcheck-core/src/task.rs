// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::GaitError;

/// A named locomotion activity, e.g. `level_walking`.
///
/// Tasks are immutable reference data carried in the specification store
/// header. `bilateral_symmetric` controls whether contralateral bounds
/// may be derived from ipsilateral ones by the half-cycle rotation.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Task {
    pub name: String,
    pub cyclic_gait: bool,
    pub bilateral_symmetric: bool,
}

impl Task {
    /// Creates a cyclic, bilateral-symmetric task, the common case for
    /// locomotion activities.
    pub fn new(name: impl Into<String>) -> Result<Self, GaitError> {
        Self::with_classification(name, true, true)
    }

    pub fn with_classification(
        name: impl Into<String>,
        cyclic_gait: bool,
        bilateral_symmetric: bool,
    ) -> Result<Self, GaitError> {
        let name = name.into();
        if name.is_empty() {
            return Err(GaitError::spec_format("task name must be non-empty"));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(GaitError::spec_format(format!(
                "task name '{name}' must contain only alphanumerics and underscores"
            )));
        }
        Ok(Self {
            name,
            cyclic_gait,
            bilateral_symmetric,
        })
    }
}
