//! Class roster helpers: name import from spreadsheet exports and random
//! group formation.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

const HEADER_WORDS: [&str; 10] = [
    "first name", "firstname", "first", "last name", "lastname", "last", "name", "prénom",
    "prenom", "nom",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedName {
    pub first_name: String,
    pub last_name: String,
}

impl ImportedName {
    pub fn display_name(&self) -> String {
        match (self.first_name.is_empty(), self.last_name.is_empty()) {
            (false, false) => format!("{} {}", self.first_name, self.last_name),
            (false, true) => self.first_name.clone(),
            _ => self.last_name.clone(),
        }
    }
}

/// Parse delimited text into `(first name, last name)` pairs.
///
/// Each line is split on `;`, `,` or tab, whichever appears first in that
/// order. A single column is taken as the full name. A first line made of
/// column titles is skipped, as are blank lines.
pub fn parse_rows(text: &str) -> Vec<ImportedName> {
    let mut rows = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let fields = split_fields(line);
        if fields.iter().all(|f| f.is_empty()) {
            continue;
        }
        if index == 0 && is_header(&fields) {
            continue;
        }
        let mut cells = fields.into_iter().filter(|f| !f.is_empty());
        let first_name = cells.next().unwrap_or_default();
        let last_name = cells.next().unwrap_or_default();
        rows.push(ImportedName {
            first_name,
            last_name,
        });
    }
    rows
}

/// Parse delimited text into display names.
pub fn parse_names(text: &str) -> Vec<String> {
    parse_rows(text).iter().map(ImportedName::display_name).collect()
}

fn split_fields(line: &str) -> Vec<String> {
    let delimiter = [';', ',', '\t'].into_iter().find(|d| line.contains(*d));
    let raw: Vec<&str> = match delimiter {
        Some(d) => line.split(d).collect(),
        None => vec![line],
    };
    raw.into_iter()
        .map(|f| f.trim().trim_matches('"').trim().to_string())
        .collect()
}

fn is_header(fields: &[String]) -> bool {
    fields
        .iter()
        .filter(|f| !f.is_empty())
        .all(|f| HEADER_WORDS.contains(&f.to_lowercase().as_str()))
}

/// How to cut a roster into groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum GroupSplit {
    /// Exactly this many groups (fewer if there are not enough students).
    Count(usize),
    /// Groups of at most this many students.
    Size(usize),
}

/// Shuffle `students` and deal them round-robin into groups.
pub fn split_into_groups<R: Rng + ?Sized>(
    students: &[String],
    split: GroupSplit,
    rng: &mut R,
) -> Result<Vec<Vec<String>>, ValidationError> {
    let group_count = match split {
        GroupSplit::Count(0) | GroupSplit::Size(0) => {
            return Err(ValidationError::InvalidValue {
                field: "group split".into(),
                message: "must be at least 1".into(),
            })
        }
        GroupSplit::Count(n) => n,
        GroupSplit::Size(size) => students.len().div_ceil(size),
    };
    if students.is_empty() {
        return Err(ValidationError::EmptyCollection("students".into()));
    }

    let mut shuffled = students.to_vec();
    shuffled.shuffle(rng);

    let mut groups = vec![Vec::new(); group_count];
    for (i, student) in shuffled.into_iter().enumerate() {
        groups[i % group_count].push(student);
    }
    groups.retain(|g| !g.is_empty());
    Ok(groups)
}
