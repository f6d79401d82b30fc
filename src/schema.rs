//! # Class Registry
//!
//! The fixed set of record classes the console knows about, and the attributes each class
//! declares. The declared kind of an attribute is the authority for coercing untyped input
//! on `update`; names a class does not declare are stored as given.
//!
//! The table is static configuration. It is consulted on every write and never modified.
//!
//! ```rust
//! use roost::{AttributeKind, RecordClass};
//!
//! let place: RecordClass = "Place".parse().unwrap();
//! assert_eq!(place.kind_of("max_guest"), Some(AttributeKind::Integer));
//! assert_eq!(place.kind_of("latitude"), Some(AttributeKind::Float));
//! assert_eq!(place.kind_of("nickname"), None);
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde_json::Value;

use AttributeKind::{Float, Integer, List, String as Text};

////////////////////////////////////////////// AttributeKind ///////////////////////////////////////////

/// The semantic type of a declared attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    /// Text; the default is the empty string.
    String,
    /// A signed 64-bit integer; the default is `0`.
    Integer,
    /// A double-precision float; the default is `0.0`.
    Float,
    /// A list of values; the default is the empty list.
    List,
}

impl AttributeKind {
    /// The value an attribute of this kind holds before anything is assigned to it.
    pub fn default_value(&self) -> Value {
        match self {
            AttributeKind::String => Value::String(String::new()),
            AttributeKind::Integer => Value::from(0i64),
            AttributeKind::Float => Value::from(0.0f64),
            AttributeKind::List => Value::Array(Vec::new()),
        }
    }

    /// True for the kinds a mapping-literal update coerces into.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, AttributeKind::List)
    }
}

impl Display for AttributeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let s = match self {
            AttributeKind::String => "string",
            AttributeKind::Integer => "integer",
            AttributeKind::Float => "float",
            AttributeKind::List => "list",
        };
        write!(f, "{}", s)
    }
}

//////////////////////////////////////////////// Attribute /////////////////////////////////////////////

/// One declared attribute of a record class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute {
    /// The attribute name as typed on the console
    pub name: &'static str,
    /// The declared kind
    pub kind: AttributeKind,
}

impl Attribute {
    const fn new(name: &'static str, kind: AttributeKind) -> Self {
        Self { name, kind }
    }
}

const BASE_MODEL: &[Attribute] = &[];

const USER: &[Attribute] = &[
    Attribute::new("email", Text),
    Attribute::new("password", Text),
    Attribute::new("first_name", Text),
    Attribute::new("last_name", Text),
];

const STATE: &[Attribute] = &[Attribute::new("name", Text)];

const CITY: &[Attribute] = &[
    Attribute::new("state_id", Text),
    Attribute::new("name", Text),
];

const AMENITY: &[Attribute] = &[Attribute::new("name", Text)];

const PLACE: &[Attribute] = &[
    Attribute::new("city_id", Text),
    Attribute::new("user_id", Text),
    Attribute::new("name", Text),
    Attribute::new("description", Text),
    Attribute::new("number_rooms", Integer),
    Attribute::new("number_bathrooms", Integer),
    Attribute::new("max_guest", Integer),
    Attribute::new("price_by_night", Integer),
    Attribute::new("latitude", Float),
    Attribute::new("longitude", Float),
    Attribute::new("amenity_ids", List),
];

const REVIEW: &[Attribute] = &[
    Attribute::new("place_id", Text),
    Attribute::new("user_id", Text),
    Attribute::new("text", Text),
];

/////////////////////////////////////////////// RecordClass ////////////////////////////////////////////

/// The record classes known to the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordClass {
    /// A generic record with only the base fields.
    BaseModel,
    /// A person with an account.
    User,
    /// A top-level location.
    State,
    /// A location within a state.
    City,
    /// A feature a place can offer.
    Amenity,
    /// A listing.
    Place,
    /// A user's review of a place.
    Review,
}

impl RecordClass {
    /// Every class, in registry order.
    pub const ALL: [RecordClass; 7] = [
        RecordClass::BaseModel,
        RecordClass::User,
        RecordClass::State,
        RecordClass::City,
        RecordClass::Amenity,
        RecordClass::Place,
        RecordClass::Review,
    ];

    /// The class name used in commands, store keys, and the store file.
    pub fn name(&self) -> &'static str {
        match self {
            RecordClass::BaseModel => "BaseModel",
            RecordClass::User => "User",
            RecordClass::State => "State",
            RecordClass::City => "City",
            RecordClass::Amenity => "Amenity",
            RecordClass::Place => "Place",
            RecordClass::Review => "Review",
        }
    }

    /// The attributes this class declares, in declaration order.
    pub fn attributes(&self) -> &'static [Attribute] {
        match self {
            RecordClass::BaseModel => BASE_MODEL,
            RecordClass::User => USER,
            RecordClass::State => STATE,
            RecordClass::City => CITY,
            RecordClass::Amenity => AMENITY,
            RecordClass::Place => PLACE,
            RecordClass::Review => REVIEW,
        }
    }

    /// Looks up a declared attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&'static Attribute> {
        self.attributes().iter().find(|a| a.name == name)
    }

    /// The declared kind of `name`, or `None` for a schema-less attribute.
    pub fn kind_of(&self, name: &str) -> Option<AttributeKind> {
        self.attribute(name).map(|a| a.kind)
    }
}

impl Display for RecordClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.name())
    }
}

/// Returned when a class name is not in the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownClass(pub String);

impl Display for UnknownClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "unknown class '{}'", self.0)
    }
}

impl std::error::Error for UnknownClass {}

impl FromStr for RecordClass {
    type Err = UnknownClass;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordClass::ALL
            .iter()
            .find(|c| c.name() == s)
            .copied()
            .ok_or_else(|| UnknownClass(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_every_class() {
        for class in RecordClass::ALL {
            assert_eq!(class.name().parse::<RecordClass>(), Ok(class));
        }
    }

    #[test]
    fn class_names_are_case_sensitive() {
        assert!("user".parse::<RecordClass>().is_err());
        assert!("MyModel".parse::<RecordClass>().is_err());
        assert!("".parse::<RecordClass>().is_err());
    }

    #[test]
    fn place_declares_numeric_attributes() {
        let place = RecordClass::Place;
        assert_eq!(place.kind_of("number_rooms"), Some(AttributeKind::Integer));
        assert_eq!(place.kind_of("price_by_night"), Some(AttributeKind::Integer));
        assert_eq!(place.kind_of("longitude"), Some(AttributeKind::Float));
        assert_eq!(place.kind_of("amenity_ids"), Some(AttributeKind::List));
        assert_eq!(place.kind_of("description"), Some(AttributeKind::String));
    }

    #[test]
    fn base_model_declares_nothing() {
        assert!(RecordClass::BaseModel.attributes().is_empty());
        assert_eq!(RecordClass::BaseModel.kind_of("name"), None);
    }

    #[test]
    fn defaults_match_kind() {
        assert_eq!(AttributeKind::String.default_value(), Value::from(""));
        assert_eq!(AttributeKind::Integer.default_value(), Value::from(0));
        assert_eq!(AttributeKind::Float.default_value(), Value::from(0.0));
        assert_eq!(AttributeKind::List.default_value(), Value::Array(vec![]));
        assert!(AttributeKind::Float.is_scalar());
        assert!(!AttributeKind::List.is_scalar());
    }
}
