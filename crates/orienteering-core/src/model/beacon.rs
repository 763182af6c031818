use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Number of cells in a punch grid (5x5).
pub const PUNCH_CELLS: usize = 25;
const PUNCH_SIDE: usize = 5;

/// Difficulty level of a beacon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    N1,
    N2,
    N3,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::N1, Level::N2, Level::N3];

    /// Conventional point value; beacons may override it.
    pub fn default_points(self) -> u32 {
        match self {
            Level::N1 => 10,
            Level::N2 => 20,
            Level::N3 => 30,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Level::N1 => "N1",
            Level::N2 => "N2",
            Level::N3 => "N3",
        };
        f.write_str(s)
    }
}

impl FromStr for Level {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "N1" => Ok(Level::N1),
            "N2" => Ok(Level::N2),
            "N3" => Ok(Level::N3),
            other => Err(ValidationError::Level(other.to_string())),
        }
    }
}

/// 5x5 punch pattern printed on the beacon, row-major, `1` = punched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PunchCode(String);

impl PunchCode {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let valid = raw.len() == PUNCH_CELLS && raw.bytes().all(|b| b == b'0' || b == b'1');
        if !valid {
            return Err(ValidationError::PunchCode(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.bytes().all(|b| b == b'0')
    }

    pub fn grid(&self) -> [[bool; PUNCH_SIDE]; PUNCH_SIDE] {
        let mut grid = [[false; PUNCH_SIDE]; PUNCH_SIDE];
        for (i, b) in self.0.bytes().enumerate() {
            grid[i / PUNCH_SIDE][i % PUNCH_SIDE] = b == b'1';
        }
        grid
    }

    /// Five lines of `#` (punched) and `.` (blank).
    pub fn render(&self) -> String {
        self.grid()
            .iter()
            .map(|row| row.iter().map(|&on| if on { '#' } else { '.' }).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for PunchCode {
    fn default() -> Self {
        Self("0".repeat(PUNCH_CELLS))
    }
}

impl TryFrom<String> for PunchCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        PunchCode::parse(&value)
    }
}

impl From<PunchCode> for String {
    fn from(code: PunchCode) -> Self {
        code.0
    }
}

impl fmt::Display for PunchCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A checkpoint placed on the course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Beacon {
    pub id: String,
    /// Number painted on the post.
    pub code: String,
    pub level: Level,
    pub points: u32,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub punch_code: PunchCode,
    /// Distance from the start in meters.
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub distance: f64,
}

/// Editable fields of a beacon; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BeaconPatch {
    pub code: Option<String>,
    pub level: Option<Level>,
    pub points: Option<u32>,
    pub punch_code: Option<PunchCode>,
    pub distance: Option<f64>,
}

impl BeaconPatch {
    pub fn apply_to(&self, beacon: &mut Beacon) {
        if let Some(code) = &self.code {
            beacon.code = code.clone();
        }
        if let Some(level) = self.level {
            beacon.level = level;
        }
        if let Some(points) = self.points {
            beacon.points = points;
        }
        if let Some(punch) = &self.punch_code {
            beacon.punch_code = punch.clone();
        }
        if let Some(distance) = self.distance {
            beacon.distance = distance;
        }
    }
}
