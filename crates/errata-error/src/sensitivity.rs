// SPDX-License-Identifier: MIT OR Apache-2.0
//! Disclosure classification.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How widely an error's details may be disclosed, from least to most
/// restricted.
///
/// The core only classifies; consumers decide what to show by comparing
/// against the audience's clearance.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
)]
#[serde(rename_all = "snake_case")]
#[repr(u16)]
pub enum Sensitivity {
    /// May be shown anywhere, even to third parties.
    #[default]
    None = 0,
    /// May cross domains within the same system but not leave it.
    Edge = 100,
    /// Internal diagnostic surfaces only.
    Bug = 200,
    /// Only within the originating domain.
    All = 1000,
}

impl Sensitivity {
    /// Every level, ascending.
    pub const LEVELS: [Sensitivity; 4] = [Self::None, Self::Edge, Self::Bug, Self::All];

    /// Numeric level: 0, 100, 200 or 1000.
    pub const fn level(self) -> u16 {
        self as u16
    }

    /// Inverse of [`level`](Self::level). Only exact levels map back.
    pub fn from_level(level: u16) -> Option<Self> {
        Self::LEVELS.into_iter().find(|s| s.level() == level)
    }

    /// Lowercase name, as used in configuration files.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Edge => "edge",
            Self::Bug => "bug",
            Self::All => "all",
        }
    }

    /// Whether an audience cleared for `clearance` may see this error.
    pub fn visible_at(self, clearance: Sensitivity) -> bool {
        self <= clearance
    }
}

impl fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no [`Sensitivity`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sensitivity '{0}' (expected none, edge, bug or all)")]
pub struct ParseSensitivityError(pub String);

impl FromStr for Sensitivity {
    type Err = ParseSensitivityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::LEVELS
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseSensitivityError(s.to_owned()))
    }
}
