// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::cycle::CYCLE_POINTS;
use std::fmt;

/// Discrete gait-cycle percentage at which validation bounds are authored
/// and checked. Only these four points carry bounds; the remaining 146
/// samples of a cycle are never validated individually.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PhaseCheckpoint {
    P0,
    P25,
    P50,
    P75,
}

impl PhaseCheckpoint {
    /// All checkpoints in ascending phase order.
    pub const ALL: [Self; 4] = [Self::P0, Self::P25, Self::P50, Self::P75];

    pub fn percent(self) -> u32 {
        match self {
            Self::P0 => 0,
            Self::P25 => 25,
            Self::P50 => 50,
            Self::P75 => 75,
        }
    }

    pub fn from_percent(percent: u32) -> Option<Self> {
        match percent {
            0 => Some(Self::P0),
            25 => Some(Self::P25),
            50 => Some(Self::P50),
            75 => Some(Self::P75),
            _ => None,
        }
    }

    /// Sample index of this checkpoint in a 150-point cycle.
    ///
    /// Uses the truncating integer mapping `percent * 150 / 100`, giving
    /// indices 0, 37, 75, 112. The mapping is exact at 0% and 50% and
    /// rounds 37.5 and 112.5 down; one rule everywhere so the classifier
    /// and the tuner always sample the same point.
    pub fn sample_index(self) -> usize {
        self.percent() as usize * CYCLE_POINTS / 100
    }

    /// The checkpoint half a cycle away: `(percent + 50) mod 100`.
    ///
    /// Contralateral bounds are defined as the ipsilateral bounds rotated
    /// by this offset, so an ipsi-only specification covers both legs.
    pub fn offset(self) -> Self {
        match self {
            Self::P0 => Self::P50,
            Self::P25 => Self::P75,
            Self::P50 => Self::P0,
            Self::P75 => Self::P25,
        }
    }
}

impl fmt::Display for PhaseCheckpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percent())
    }
}
