//! Core data types for word tree datasets.
//!
//! This module defines the records delivered by the lookup server, the dataset
//! wrapper built from them, and the error raised when a dataset does not form
//! a single connected tree.

use crate::constants::{PATH_SEPARATOR, WORD_MARKERS};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single word in the steal hierarchy, as delivered by the lookup server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Dot-delimited path from the root word, e.g. `"CARE.RACE.ACRE"`
    pub id: String,
    /// Dictionary definition, if the lexicon provides one
    #[serde(default)]
    pub def: Option<String>,
    /// Playability score of the steal leading to this word
    #[serde(default)]
    pub prob: f64,
    /// Letters added by the steal from the parent word
    #[serde(default)]
    pub shortsteal: Option<String>,
    /// Letters added along the whole chain from the root word
    #[serde(default)]
    pub longsteal: Option<String>,
}

impl NodeRecord {
    /// Creates a record with only an id set.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            def: None,
            prob: 0.0,
            shortsteal: None,
            longsteal: None,
        }
    }

    /// Id of the parent record, or `None` for a root.
    pub fn parent_id(&self) -> Option<&str> {
        self.id
            .rfind(PATH_SEPARATOR)
            .map(|idx| &self.id[..idx])
            .filter(|parent| !parent.is_empty())
    }

    /// Number of ancestors, i.e. separators in the id.
    pub fn depth(&self) -> usize {
        self.id.matches(PATH_SEPARATOR).count()
    }

    /// Last segment of the path, exactly as sent by the server.
    pub fn terminal_segment(&self) -> &str {
        match self.id.rfind(PATH_SEPARATOR) {
            Some(idx) => &self.id[idx + PATH_SEPARATOR.len_utf8()..],
            None => &self.id,
        }
    }

    /// Word shown in word mode: the terminal segment with its first lexicon marker removed.
    pub fn display_word(&self) -> String {
        let segment = self.terminal_segment();
        match segment.find(&WORD_MARKERS[..]) {
            Some(idx) => {
                let mut word = segment.to_string();
                word.remove(idx);
                word
            }
            None => segment.to_string(),
        }
    }
}

/// A flat, ordered list of node records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    /// Records in server order; the first record is the root word
    pub records: Vec<NodeRecord>,
}

impl Dataset {
    /// Wraps a list of records.
    pub fn new(records: Vec<NodeRecord>) -> Self {
        Self { records }
    }

    /// Parses the raw response body of the lookup server.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serializes the dataset back to the server's wire format.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Maximum path depth over all records.
    pub fn depth(&self) -> usize {
        self.records.iter().map(NodeRecord::depth).max().unwrap_or(0)
    }

    /// Id of the first record, used for titles and export file names.
    pub fn title(&self) -> Option<&str> {
        self.records.first().map(|r| r.id.as_str())
    }

    /// Whether the dataset holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Which text labels display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LabelMode {
    /// Each node shows its own word
    #[default]
    Word,
    /// Each node shows the letters stolen to form it
    Steal,
}

/// Raised when node records do not form a single connected tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// The dataset has no records
    Empty,
    /// Two records share the same id
    DuplicateId(String),
    /// A record's parent id is not present in the dataset
    MissingParent {
        /// Id of the orphaned record
        id: String,
        /// Parent id that could not be resolved
        parent: String,
    },
    /// More than one record has no parent
    MultipleRoots(String, String),
    /// No record is parentless
    NoRoot,
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::Empty => write!(f, "dataset is empty"),
            TreeError::DuplicateId(id) => write!(f, "duplicate node id: {id}"),
            TreeError::MissingParent { id, parent } => {
                write!(f, "node {id} references missing parent {parent}")
            }
            TreeError::MultipleRoots(a, b) => write!(f, "multiple roots: {a} and {b}"),
            TreeError::NoRoot => write!(f, "dataset has no root"),
        }
    }
}

impl std::error::Error for TreeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_id_truncates_at_last_separator() {
        assert_eq!(NodeRecord::new("CARE.RACE.ACRE").parent_id(), Some("CARE.RACE"));
        assert_eq!(NodeRecord::new("CARE").parent_id(), None);
    }

    #[test]
    fn depth_counts_separators() {
        assert_eq!(NodeRecord::new("CARE").depth(), 0);
        assert_eq!(NodeRecord::new("CARE.RACE.ACRE").depth(), 2);
    }

    #[test]
    fn display_word_strips_first_marker() {
        let record = NodeRecord::new("CARE.SCARE#");
        assert_eq!(record.terminal_segment(), "SCARE#");
        assert_eq!(record.display_word(), "SCARE");
        assert_eq!(NodeRecord::new("A.B$#").display_word(), "B#");
    }

    #[test]
    fn dataset_parses_server_json() {
        let json = r#"[
            {"id":"CARE","shortsteal":"","longsteal":"","prob":100.0,"def":"to be concerned"},
            {"id":"CARE.RACE","shortsteal":"","prob":12.5},
            {"id":"CARE.RACE.ACRE","def":null}
        ]"#;
        let dataset = Dataset::from_json(json).expect("valid json");
        assert_eq!(dataset.records.len(), 3);
        assert_eq!(dataset.depth(), 2);
        assert_eq!(dataset.title(), Some("CARE"));
        assert_eq!(dataset.records[0].def.as_deref(), Some("to be concerned"));
        assert_eq!(dataset.records[1].prob, 12.5);
        assert_eq!(dataset.records[2].def, None);
        assert_eq!(dataset.records[2].prob, 0.0);
    }

    #[test]
    fn dataset_rejects_non_array() {
        assert!(Dataset::from_json(r#"{"id":"CARE"}"#).is_err());
    }
}
