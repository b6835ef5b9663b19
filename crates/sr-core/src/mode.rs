//! Travel modes a street query can run in.

use std::str::FromStr;

use crate::CoreError;

/// The means by which a street search travels.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Mode {
    /// On foot.
    Walk,
    /// Bicycle.
    Bike,
    /// Private vehicle.
    Car,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Walk, Mode::Bike, Mode::Car];

    /// Lowercase label, useful for CSV values and log lines.
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Walk => "walk",
            Mode::Bike => "bike",
            Mode::Car  => "car",
        }
    }
}

impl FromStr for Mode {
    type Err = CoreError;

    /// Case-insensitive: `"WALK"`, `"walk"` and `"Walk"` all parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "walk" => Ok(Mode::Walk),
            "bike" | "bicycle" => Ok(Mode::Bike),
            "car" => Ok(Mode::Car),
            _ => Err(CoreError::UnknownMode(s.to_owned())),
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
