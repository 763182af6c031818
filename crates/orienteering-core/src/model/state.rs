use serde::{Deserialize, Serialize};

use super::{Beacon, ClassRoom, Group, Level, PunchCode, Run};
use crate::error::Result;

/// The whole race, persisted as one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub beacons: Vec<Beacon>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub classes: Vec<ClassRoom>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub groups: Vec<Group>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub runs: Vec<Run>,
}

impl GameState {
    /// Course used when the shared document does not exist yet.
    pub fn seeded() -> Self {
        let seed = [
            ("b1", "31", Level::N1),
            ("b2", "32", Level::N1),
            ("b3", "45", Level::N2),
            ("b4", "46", Level::N2),
            ("b5", "60", Level::N3),
        ];
        let beacons = seed
            .iter()
            .map(|&(id, code, level)| Beacon {
                id: id.to_string(),
                code: code.to_string(),
                level,
                points: level.default_points(),
                punch_code: PunchCode::default(),
                distance: 0.0,
            })
            .collect();
        Self {
            beacons,
            ..Self::default()
        }
    }

    /// Decode a persisted document, filling fields older clients did not write.
    pub fn from_document(document: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(document)?)
    }

    pub fn to_document(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn beacon(&self, id: &str) -> Option<&Beacon> {
        self.beacons.iter().find(|b| b.id == id)
    }

    pub fn group(&self, id: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn class(&self, id: &str) -> Option<&ClassRoom> {
        self.classes.iter().find(|c| c.id == id)
    }

    pub fn run(&self, id: &str) -> Option<&Run> {
        self.runs.iter().find(|r| r.id == id)
    }

    /// The running or checking run of a group, if any.
    pub fn active_run_for_group(&self, group_id: &str) -> Option<&Run> {
        self.runs
            .iter()
            .find(|r| r.group_id == group_id && r.is_active())
    }

    pub fn active_runs(&self) -> impl Iterator<Item = &Run> {
        self.runs.iter().filter(|r| r.is_active())
    }
}
