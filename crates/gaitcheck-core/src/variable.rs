// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::GaitError;
use std::cmp::Ordering;
use std::fmt;

const NAME_SEGMENTS: usize = 5;

/// Which leg a variable belongs to, relative to the reference leg of the
/// gait cycle.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Ipsi,
    Contra,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ipsi => "ipsi",
            Self::Contra => "contra",
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Ipsi => Self::Contra,
            Self::Contra => Self::Ipsi,
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "ipsi" => Some(Self::Ipsi),
            "contra" => Some(Self::Contra),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed biomechanical variable identity.
///
/// The canonical textual form is
/// `<joint>_<motion>_<measurement>_<side>_<unit>`, e.g.
/// `knee_flexion_angle_ipsi_rad`. Parsing is the single place where the
/// naming convention is enforced; every other component works with the
/// typed fields instead of re-matching strings.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VariableName {
    joint: String,
    motion: String,
    measurement: String,
    side: Side,
    unit: String,
}

impl VariableName {
    /// Parses a canonical variable name.
    ///
    /// Fails with a spec-format error when the name does not split into
    /// exactly five non-empty alphanumeric segments with a recognized
    /// side segment in fourth position.
    pub fn parse(raw: &str) -> Result<Self, GaitError> {
        let segments = raw.split('_').collect::<Vec<_>>();
        if segments.len() != NAME_SEGMENTS {
            return Err(GaitError::spec_format(format!(
                "variable '{raw}' does not match <joint>_<motion>_<measurement>_<side>_<unit>: \
                 expected {NAME_SEGMENTS} segments, got {}",
                segments.len()
            )));
        }
        for segment in &segments {
            if segment.is_empty() || !segment.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(GaitError::spec_format(format!(
                    "variable '{raw}' has invalid segment '{segment}': segments must be \
                     non-empty and alphanumeric"
                )));
            }
        }
        let side = Side::parse(segments[3]).ok_or_else(|| {
            GaitError::spec_format(format!(
                "variable '{raw}' has side segment '{}'; expected 'ipsi' or 'contra'",
                segments[3]
            ))
        })?;

        Ok(Self {
            joint: segments[0].to_string(),
            motion: segments[1].to_string(),
            measurement: segments[2].to_string(),
            side,
            unit: segments[4].to_string(),
        })
    }

    pub fn joint(&self) -> &str {
        &self.joint
    }

    pub fn motion(&self) -> &str {
        &self.motion
    }

    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// The same variable on the opposite leg.
    pub fn mirrored(&self) -> Self {
        Self {
            side: self.side.opposite(),
            ..self.clone()
        }
    }

    /// Anatomical grouping used by the Invalid-Local classification
    /// policy: failures confined to one `(joint, side)` group indicate an
    /// isolated sensor issue rather than a systemic one.
    pub fn joint_group(&self) -> (&str, Side) {
        (self.joint.as_str(), self.side)
    }
}

impl fmt::Display for VariableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}_{}",
            self.joint, self.motion, self.measurement, self.side, self.unit
        )
    }
}

impl PartialOrd for VariableName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VariableName {
    /// Field-wise lexicographic order (joint, motion, measurement, side,
    /// unit). Stable across runs, used for all report/spec ordering.
    fn cmp(&self, other: &Self) -> Ordering {
        (
            &self.joint,
            &self.motion,
            &self.measurement,
            self.side.as_str(),
            &self.unit,
        )
            .cmp(&(
                &other.joint,
                &other.motion,
                &other.measurement,
                other.side.as_str(),
                &other.unit,
            ))
    }
}
