//! # Records
//!
//! A [`Record`] is one stored object. The base fields (class, id and both timestamps) live
//! in the struct; everything assigned through `update` lives in an ordered attribute bag.
//!
//! Records have two textual forms. The canonical form is what `show` prints:
//!
//! ```text
//! [User] (1234) {'id': '1234', 'created_at': '2026-10-16T12:00:00.000000', ...}
//! ```
//!
//! The document form is the JSON object the store file holds under `"User.1234"`, with a
//! `__class__` field added.

use std::fmt::{Display, Formatter, Result as FmtResult};

use chrono::{DateTime, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::literal;
use crate::schema::RecordClass;

/// Attribute names owned by the record's base structure.
///
/// These never appear in the attribute bag and cannot be patched from the console.
pub const RESERVED_ATTRIBUTES: [&str; 4] = ["id", "created_at", "updated_at", "__class__"];

const CLASS_FIELD: &str = "__class__";
const DISPLAY_TIMESTAMP: &str = "%Y-%m-%dT%H:%M:%S%.6f";
const NAIVE_TIMESTAMP: &str = "%Y-%m-%dT%H:%M:%S%.f";

// The store file keeps microseconds; records never hold more.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Builds the store key `<Class>.<id>`.
pub fn record_key(class: RecordClass, id: &str) -> String {
    format!("{}.{}", class.name(), id)
}

/////////////////////////////////////////////// Record ////////////////////////////////////////////////

/// A stored object: the base fields every class shares, plus an ordered bag of the
/// attributes that have been assigned to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    class: RecordClass,
    id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    attributes: Map<String, Value>,
}

impl Record {
    /// Allocates a fresh record with a random id and both timestamps set to now.
    pub fn new(class: RecordClass) -> Self {
        let at = now();
        Self::with_id(class, Uuid::new_v4().to_string(), at, at)
    }

    /// Builds a record with explicit base fields and an empty attribute bag.
    pub fn with_id(
        class: RecordClass,
        id: impl Into<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            class,
            id: id.into(),
            created_at,
            updated_at,
            attributes: Map::new(),
        }
    }

    /// The record's class.
    pub fn class(&self) -> RecordClass {
        self.class
    }

    /// The record's id, unique within its class.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The store key `<Class>.<id>`.
    pub fn key(&self) -> String {
        record_key(self.class, &self.id)
    }

    /// When the record was first allocated.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the record was last modified.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// The assigned attributes, in assignment order.
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Reads an attribute, falling back to the class's declared default.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.attributes
            .get(name)
            .cloned()
            .or_else(|| self.class.kind_of(name).map(|kind| kind.default_value()))
    }

    /// Assigns an attribute. Overwriting keeps the attribute's original position.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.attributes.insert(name.into(), value);
    }

    /// Marks the record as modified now.
    pub fn touch(&mut self) {
        self.updated_at = now();
    }

    /// The document written to the store file.
    pub fn to_document(&self) -> Value {
        let mut doc = Map::new();
        doc.insert(
            CLASS_FIELD.to_string(),
            Value::String(self.class.name().to_string()),
        );
        doc.insert("id".to_string(), Value::String(self.id.clone()));
        doc.insert(
            "created_at".to_string(),
            Value::String(
                self.created_at
                    .to_rfc3339_opts(SecondsFormat::Micros, true),
            ),
        );
        doc.insert(
            "updated_at".to_string(),
            Value::String(
                self.updated_at
                    .to_rfc3339_opts(SecondsFormat::Micros, true),
            ),
        );
        for (name, value) in &self.attributes {
            doc.insert(name.clone(), value.clone());
        }
        Value::Object(doc)
    }

    /// Rebuilds a record from a store-file document.
    pub fn from_document(doc: &Value) -> Result<Self, RecordDecodeError> {
        let fields = doc.as_object().ok_or(RecordDecodeError::NotAnObject)?;

        let class_name = string_field(fields, CLASS_FIELD)?;
        let class = class_name
            .parse::<RecordClass>()
            .map_err(|_| RecordDecodeError::UnknownClass(class_name.to_string()))?;
        let id = string_field(fields, "id")?;
        let created_at = timestamp_field(fields, "created_at")?;
        let updated_at = timestamp_field(fields, "updated_at")?;

        let mut record = Record::with_id(class, id, created_at, updated_at);
        for (name, value) in fields {
            if !RESERVED_ATTRIBUTES.contains(&name.as_str()) {
                record.set(name.clone(), value.clone());
            }
        }
        Ok(record)
    }
}

impl Display for Record {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let mut shown = Map::new();
        shown.insert("id".to_string(), Value::String(self.id.clone()));
        shown.insert(
            "created_at".to_string(),
            Value::String(self.created_at.format(DISPLAY_TIMESTAMP).to_string()),
        );
        shown.insert(
            "updated_at".to_string(),
            Value::String(self.updated_at.format(DISPLAY_TIMESTAMP).to_string()),
        );
        for (name, value) in &self.attributes {
            shown.insert(name.clone(), value.clone());
        }
        write!(
            f,
            "[{}] ({}) {}",
            self.class,
            self.id,
            literal::render(&Value::Object(shown))
        )
    }
}

fn string_field<'a>(
    fields: &'a Map<String, Value>,
    name: &'static str,
) -> Result<&'a str, RecordDecodeError> {
    fields
        .get(name)
        .and_then(Value::as_str)
        .ok_or(RecordDecodeError::MissingField(name))
}

fn timestamp_field(
    fields: &Map<String, Value>,
    name: &'static str,
) -> Result<DateTime<Utc>, RecordDecodeError> {
    let text = string_field(fields, name)?;
    parse_timestamp(text).ok_or_else(|| RecordDecodeError::InvalidTimestamp {
        field: name,
        value: text.to_string(),
    })
}

/// Parses an RFC 3339 timestamp, or a naive `YYYY-MM-DDTHH:MM:SS[.ffffff]` taken as UTC.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, NAIVE_TIMESTAMP)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Reasons a store-file document cannot be turned back into a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordDecodeError {
    /// The document is not a JSON object.
    NotAnObject,
    /// A required base field is absent or not a string.
    MissingField(&'static str),
    /// `__class__` names a class outside the registry.
    UnknownClass(String),
    /// A timestamp field does not parse.
    InvalidTimestamp {
        /// The field name
        field: &'static str,
        /// The text found
        value: String,
    },
}

impl Display for RecordDecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            RecordDecodeError::NotAnObject => write!(f, "record document is not an object"),
            RecordDecodeError::MissingField(name) => write!(f, "missing field '{}'", name),
            RecordDecodeError::UnknownClass(name) => write!(f, "unknown class '{}'", name),
            RecordDecodeError::InvalidTimestamp { field, value } => {
                write!(f, "invalid timestamp '{}' in field '{}'", value, field)
            }
        }
    }
}

impl std::error::Error for RecordDecodeError {}
