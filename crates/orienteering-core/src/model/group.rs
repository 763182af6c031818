use serde::{Deserialize, Serialize};

/// A team of students racing together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    /// Student names, copied from the roster when the group was formed.
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub members: Vec<String>,
    /// Only ever increased by completing a run.
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub total_points: u32,
}

/// A saved class roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRoom {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub students: Vec<String>,
}
