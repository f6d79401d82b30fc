//! # Mutation Journal
//!
//! An optional audit trail of every mutation the console performs. Each successful
//! `create`, `destroy`, and `update` appends one line of JSON to the journal file.
//!
//! The journal is write-only from the console's point of view: it is never replayed, and the
//! object store file remains the single source of truth. The console reports a failed
//! append on stderr and does not fail the command.
//!
//! ## File Format
//!
//! ```json
//! {"id":"journal_1760616000000000000","timestamp":"2026-10-16T12:00:00Z","operation":{"RecordCreate":{"key":"User.6f1e..."}},"metadata":{"source":"console","line":"create User"}}
//! ```
//!
//! ## Usage Examples
//!
//! ```rust,no_run
//! use roost::{Journal, JournalEntry, JournalMetadata, JournalOperation};
//!
//! let journal = Journal::new("roost.jsonl");
//! let operation = JournalOperation::RecordCreate { key: "User.1234".to_string() };
//! journal
//!     .append(&JournalEntry::new(operation, JournalMetadata::console("create User")))
//!     .unwrap();
//! ```

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::StoreError;

/// A single journaled mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Unique identifier for this entry
    pub id: String,

    /// When the mutation happened
    pub timestamp: DateTime<Utc>,

    /// What changed
    pub operation: JournalOperation,

    /// Where the mutation came from
    pub metadata: JournalMetadata,
}

/// The mutations the console can perform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JournalOperation {
    /// A record was created.
    RecordCreate {
        /// The new record's store key
        key: String,
    },

    /// A record was destroyed.
    RecordDestroy {
        /// The destroyed record's store key
        key: String,
    },

    /// Attributes of a record were assigned.
    RecordUpdate {
        /// The record's store key
        key: String,
        /// The values assigned, after coercion
        changes: Map<String, Value>,
    },
}

/// Context recorded alongside each mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalMetadata {
    /// Source of the mutation
    pub source: String,

    /// The command line as the user typed it
    pub line: Option<String>,
}

impl JournalMetadata {
    /// Metadata for a mutation typed at the console.
    pub fn console(line: impl Into<String>) -> Self {
        Self {
            source: "console".to_string(),
            line: Some(line.into()),
        }
    }
}

impl JournalEntry {
    /// Creates an entry with a generated ID and the current timestamp.
    pub fn new(operation: JournalOperation, metadata: JournalMetadata) -> Self {
        Self {
            id: Self::generate_id(),
            timestamp: Utc::now(),
            operation,
            metadata,
        }
    }

    fn generate_id() -> String {
        use std::time::{SystemTime, UNIX_EPOCH};
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        format!("journal_{}", nanos)
    }

    /// Returns the operation type as a string for filtering
    pub fn operation_type(&self) -> &'static str {
        match &self.operation {
            JournalOperation::RecordCreate { .. } => "RecordCreate",
            JournalOperation::RecordDestroy { .. } => "RecordDestroy",
            JournalOperation::RecordUpdate { .. } => "RecordUpdate",
        }
    }

    /// The store key of the record this entry concerns.
    pub fn key(&self) -> &str {
        match &self.operation {
            JournalOperation::RecordCreate { key }
            | JournalOperation::RecordDestroy { key }
            | JournalOperation::RecordUpdate { key, .. } => key,
        }
    }
}

/// Appends journal entries to a JSONL file.
#[derive(Debug, Clone)]
pub struct Journal {
    path: PathBuf,
}

impl Journal {
    /// Creates a journal writing to `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Appends `entry` as one line. The line is written with a single write so a failure
    /// never leaves half an entry behind it.
    pub fn append(&self, entry: &JournalEntry) -> Result<(), StoreError> {
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?
            .write_all(&line)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_helpers::{TestPath, read_journal_entries};
    use serde_json::json;

    fn create(key: &str) -> JournalEntry {
        JournalEntry::new(
            JournalOperation::RecordCreate {
                key: key.to_string(),
            },
            JournalMetadata::console(format!("create {}", key)),
        )
    }

    #[test]
    fn entries_append_in_order() {
        let path = TestPath::new("journal", "append");
        let journal = Journal::new(path.path());

        journal.append(&create("User.1")).unwrap();
        let mut changes = Map::new();
        changes.insert("first_name".to_string(), json!("Betty"));
        let update = JournalEntry::new(
            JournalOperation::RecordUpdate {
                key: "User.1".to_string(),
                changes,
            },
            JournalMetadata::console("update User 1 first_name Betty"),
        );
        journal.append(&update).unwrap();

        let entries = read_journal_entries(path.path());
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].operation_type(), "RecordCreate");
        assert_eq!(entries[1].operation_type(), "RecordUpdate");
        assert_eq!(entries[1].key(), "User.1");
        assert_eq!(entries[1], update);
    }

    #[test]
    fn nothing_is_written_until_the_first_entry() {
        let path = TestPath::new("journal", "lazy");
        let journal = Journal::new(path.path());
        assert!(!path.path().exists());

        journal.append(&create("State.9")).unwrap();
        let contents = std::fs::read_to_string(path.path()).unwrap();
        assert_eq!(contents.lines().count(), 1);
        assert!(contents.ends_with('\n'));
    }

    #[test]
    fn unwritable_journal_is_an_io_error() {
        let journal = Journal::new("no_such_directory_for_roost/journal.jsonl");
        assert!(matches!(
            journal.append(&create("City.3")),
            Err(StoreError::Io(_))
        ));
    }

    #[test]
    fn entry_ids_are_prefixed() {
        let entry = create("City.3");
        assert!(entry.id.starts_with("journal_"));
        assert_eq!(entry.metadata.source, "console");
    }
}
