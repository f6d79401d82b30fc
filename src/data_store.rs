//! # Object Store
//!
//! The registry of live records, keyed by `<Class>.<id>`, and its persistence.
//!
//! ## Architecture
//!
//! ```text
//! Console (command executor)
//!      ↓
//! ObjectStore trait (all / get / insert / remove / persist / reload)
//!      ↓
//! ┌──────────────────┬──────────────────────────────┐
//! │ InMemoryStore    │ FileStore                    │
//! │ (no durability)  │ (one JSON object per file)   │
//! └──────────────────┴──────────────────────────────┘
//! ```
//!
//! The console is the only mutator and runs one command at a time, so stores are plain
//! owned values with `&mut self` mutation; there is no locking.
//!
//! ## File Format
//!
//! A `FileStore` writes the whole registry on every `persist`:
//!
//! ```json
//! {
//!   "User.6f1e...": {
//!     "__class__": "User",
//!     "id": "6f1e...",
//!     "created_at": "2026-10-16T12:00:00.000000Z",
//!     "updated_at": "2026-10-16T12:00:00.000000Z",
//!     "email": "a@b.c"
//!   }
//! }
//! ```
//!
//! ## Usage Examples
//!
//! ```rust
//! use roost::{InMemoryStore, ObjectStore, Record, RecordClass};
//!
//! let mut store = InMemoryStore::new();
//! let record = Record::new(RecordClass::User);
//! let key = record.key();
//!
//! store.insert(record);
//! assert!(store.get(&key).is_some());
//!
//! store.remove(&key);
//! assert!(store.all().is_empty());
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde_json::{Map, Value};

use crate::{Record, StoreError};

/// Live records keyed by `<Class>.<id>`.
pub type RecordMap = BTreeMap<String, Record>;

/// The storage interface the console executes against.
///
/// `persist` is a full rewrite of durable state; `reload` replaces the live records with
/// whatever durable state holds.
pub trait ObjectStore {
    /// Every live record, keyed by `<Class>.<id>`.
    fn all(&self) -> &RecordMap;

    /// Looks up one record.
    fn get(&self, key: &str) -> Option<&Record> {
        self.all().get(key)
    }

    /// Looks up one record for in-place mutation.
    fn get_mut(&mut self, key: &str) -> Option<&mut Record>;

    /// Registers a record under its key, replacing any record already there.
    fn insert(&mut self, record: Record);

    /// Unregisters a record.
    ///
    /// # Returns
    /// * `Some(Record)` - The record was live and has been removed
    /// * `None` - Nothing was stored under `key`
    fn remove(&mut self, key: &str) -> Option<Record>;

    /// Writes every live record to durable storage.
    fn persist(&mut self) -> Result<(), StoreError>;

    /// Replaces the live records with the contents of durable storage.
    fn reload(&mut self) -> Result<ReloadReport, StoreError>;
}

/// Outcome of reloading a store from durable storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReloadReport {
    /// The number of records loaded
    pub loaded: u32,
    /// The number of entries that could not be decoded and were left out
    pub skipped: u32,
    /// One message per skipped entry
    pub errors: Vec<String>,
}

impl std::fmt::Display for ReloadReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Reload completed: {} loaded, {} skipped",
            self.loaded, self.skipped
        )?;
        if !self.errors.is_empty() {
            write!(f, "\nErrors:\n{}", self.errors.join("\n"))?;
        }
        Ok(())
    }
}

////////////////////////////////////////////// InMemoryStore //////////////////////////////////////////

/// A store with no durable backing.
///
/// `persist` only counts how many times it was asked to save, which lets callers check
/// that a command saved exactly once.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RecordMap,
    persist_count: usize,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times `persist` has been called.
    pub fn persist_count(&self) -> usize {
        self.persist_count
    }
}

impl ObjectStore for InMemoryStore {
    fn all(&self) -> &RecordMap {
        &self.records
    }

    fn get_mut(&mut self, key: &str) -> Option<&mut Record> {
        self.records.get_mut(key)
    }

    fn insert(&mut self, record: Record) {
        self.records.insert(record.key(), record);
    }

    fn remove(&mut self, key: &str) -> Option<Record> {
        self.records.remove(key)
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        self.persist_count += 1;
        Ok(())
    }

    fn reload(&mut self) -> Result<ReloadReport, StoreError> {
        Ok(ReloadReport {
            loaded: self.records.len() as u32,
            ..ReloadReport::default()
        })
    }
}

//////////////////////////////////////////////// FileStore ////////////////////////////////////////////

/// A store persisted as a single JSON document.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    records: RecordMap,
}

impl FileStore {
    /// Creates an empty store bound to `path` without reading it.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: RecordMap::new(),
        }
    }

    /// Creates a store bound to `path` and loads whatever the file holds.
    pub fn open(path: impl Into<PathBuf>) -> Result<(Self, ReloadReport), StoreError> {
        let mut store = Self::new(path);
        let report = store.reload()?;
        Ok((store, report))
    }

    fn scratch_path(&self) -> PathBuf {
        let mut scratch = self.path.clone().into_os_string();
        scratch.push(".tmp");
        PathBuf::from(scratch)
    }
}

impl ObjectStore for FileStore {
    fn all(&self) -> &RecordMap {
        &self.records
    }

    fn get_mut(&mut self, key: &str) -> Option<&mut Record> {
        self.records.get_mut(key)
    }

    fn insert(&mut self, record: Record) {
        self.records.insert(record.key(), record);
    }

    fn remove(&mut self, key: &str) -> Option<Record> {
        self.records.remove(key)
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        let document: Map<String, Value> = self
            .records
            .iter()
            .map(|(key, record)| (key.clone(), record.to_document()))
            .collect();
        let json = serde_json::to_string(&Value::Object(document))?;

        // Write beside the target and rename so a failed write never truncates the store.
        let scratch = self.scratch_path();
        fs::write(&scratch, json)?;
        fs::rename(&scratch, &self.path)?;
        Ok(())
    }

    fn reload(&mut self) -> Result<ReloadReport, StoreError> {
        let mut report = ReloadReport::default();
        if !self.path.exists() {
            self.records.clear();
            return Ok(report);
        }

        let contents = fs::read_to_string(&self.path)?;
        let document: Value = serde_json::from_str(&contents)?;
        let Value::Object(entries) = document else {
            return Err(StoreError::Malformed(format!(
                "{} does not hold a JSON object",
                self.path.display()
            )));
        };

        let mut records = RecordMap::new();
        for (key, doc) in entries {
            match Record::from_document(&doc) {
                Ok(record) if record.key() == key => {
                    records.insert(key, record);
                    report.loaded += 1;
                }
                Ok(record) => {
                    report.skipped += 1;
                    report.errors.push(format!(
                        "{}: key does not match record {}",
                        key,
                        record.key()
                    ));
                }
                Err(e) => {
                    report.skipped += 1;
                    report.errors.push(format!("{}: {}", key, e));
                }
            }
        }
        self.records = records;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordClass;
    use crate::test_utils::test_helpers::TestPath;
    use serde_json::json;

    #[test]
    fn in_memory_insert_get_remove() {
        let mut store = InMemoryStore::new();
        let record = Record::new(RecordClass::City);
        let key = record.key();

        store.insert(record.clone());
        assert_eq!(store.get(&key), Some(&record));

        store.get_mut(&key).unwrap().set("name", json!("Fremont"));
        assert_eq!(store.get(&key).unwrap().get("name"), Some(json!("Fremont")));

        assert!(store.remove(&key).is_some());
        assert!(store.get(&key).is_none());
        assert!(store.remove(&key).is_none());
    }

    #[test]
    fn in_memory_counts_persists() {
        let mut store = InMemoryStore::new();
        assert_eq!(store.persist_count(), 0);
        store.persist().unwrap();
        store.persist().unwrap();
        assert_eq!(store.persist_count(), 2);
    }

    #[test]
    fn file_store_round_trip() {
        let path = TestPath::new("data_store", "round_trip");
        let mut store = FileStore::new(path.path());

        let mut place = Record::new(RecordClass::Place);
        place.set("max_guest", json!(98));
        place.set("latitude", json!(7.2));
        place.set("amenity_ids", json!(["a1", "a2"]));
        let user = Record::new(RecordClass::User);
        store.insert(place.clone());
        store.insert(user.clone());
        store.persist().unwrap();

        let (reloaded, report) = FileStore::open(path.path()).unwrap();
        assert_eq!(report.loaded, 2);
        assert_eq!(report.skipped, 0);
        assert_eq!(reloaded.get(&place.key()), Some(&place));
        assert_eq!(reloaded.get(&user.key()), Some(&user));
    }

    #[test]
    fn persist_writes_keys_and_class() {
        let path = TestPath::new("data_store", "keys");
        let mut store = FileStore::new(path.path());
        let record = Record::new(RecordClass::BaseModel);
        let key = record.key();
        store.insert(record);
        store.persist().unwrap();

        let contents = std::fs::read_to_string(path.path()).unwrap();
        let doc: Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(doc[&key]["__class__"], "BaseModel");
        assert!(!store.scratch_path().exists());
    }

    #[test]
    fn missing_file_reloads_empty() {
        let path = TestPath::new("data_store", "missing");
        let (store, report) = FileStore::open(path.path()).unwrap();
        assert!(store.all().is_empty());
        assert_eq!(report, ReloadReport::default());
    }

    #[test]
    fn reload_discards_unsaved_changes() {
        let path = TestPath::new("data_store", "discard");
        let mut store = FileStore::new(path.path());
        store.insert(Record::new(RecordClass::State));
        store.persist().unwrap();
        store.insert(Record::new(RecordClass::State));
        assert_eq!(store.all().len(), 2);

        store.reload().unwrap();
        assert_eq!(store.all().len(), 1);
    }

    #[test]
    fn undecodable_entries_are_skipped() {
        let path = TestPath::new("data_store", "skipped");
        let good = Record::new(RecordClass::Review);
        let doc = json!({
            good.key(): good.to_document(),
            "Ghost.1": {"__class__": "Ghost", "id": "1"},
            "User.wrong": Record::new(RecordClass::User).to_document(),
        });
        std::fs::write(path.path(), doc.to_string()).unwrap();

        let (store, report) = FileStore::open(path.path()).unwrap();
        assert_eq!(report.loaded, 1);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.errors.len(), 2);
        assert!(store.get(&good.key()).is_some());
        assert!(report.to_string().starts_with("Reload completed: 1 loaded, 2 skipped"));
    }

    #[test]
    fn non_object_file_is_malformed() {
        let path = TestPath::new("data_store", "malformed");
        std::fs::write(path.path(), "[1, 2, 3]").unwrap();
        assert!(matches!(
            FileStore::open(path.path()),
            Err(StoreError::Malformed(_))
        ));

        std::fs::write(path.path(), "{not json").unwrap();
        assert!(matches!(
            FileStore::open(path.path()),
            Err(StoreError::Serialization(_))
        ));
    }
}
