//! # Attribute Coercion
//!
//! `update` receives its values as text or as a parsed mapping literal. The class schema
//! decides what each declared attribute becomes; undeclared attributes are stored as given.
//!
//! A patch is resolved completely before anything is written, so one bad value leaves the
//! record untouched.
//!
//! ```rust
//! use roost::{AttributePatch, RecordClass};
//! use serde_json::json;
//!
//! let patch = AttributePatch::Single {
//!     name: "max_guest".to_string(),
//!     raw: "98".to_string(),
//! };
//! let changes = patch.resolve(RecordClass::Place).unwrap();
//! assert_eq!(changes, vec![("max_guest".to_string(), json!(98))]);
//! ```

use serde_json::{Map, Number, Value};

use crate::literal::{self, LiteralParser};
use crate::record::RESERVED_ATTRIBUTES;
use crate::{AttributeKind, ConsoleError, RecordClass};

/// The assignment part of an `update` command.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributePatch {
    /// `<name> <value>`, with the value still untyped text.
    Single {
        /// The attribute name
        name: String,
        /// The value as typed, quotes removed
        raw: String,
    },
    /// A mapping literal of names to parsed values, applied in order.
    Mapping(Map<String, Value>),
}

impl AttributePatch {
    /// Builds a patch from the tokens that follow the class and id.
    ///
    /// # Returns
    /// * `Err(ConsoleError::AttributeNameMissing)` - There are no tokens
    /// * `Err(ConsoleError::ValueMissing)` - There is one token and it is not a mapping literal
    pub fn from_tokens(tokens: &[String]) -> Result<Self, ConsoleError> {
        match tokens {
            [] => Err(ConsoleError::AttributeNameMissing),
            [only] => LiteralParser::parse_mapping(only)
                .map(AttributePatch::Mapping)
                .map_err(|_| ConsoleError::ValueMissing),
            [name, raw, ..] => Ok(AttributePatch::Single {
                name: name.clone(),
                raw: raw.clone(),
            }),
        }
    }

    /// Coerces every value against `class`'s schema.
    ///
    /// The result lists the assignments in application order. No assignment is returned
    /// unless all of them coerce.
    pub fn resolve(&self, class: RecordClass) -> Result<Vec<(String, Value)>, ConsoleError> {
        match self {
            AttributePatch::Single { name, raw } => {
                check_writable(name)?;
                let value = match class.kind_of(name) {
                    Some(kind) => coerce_text(raw, kind).ok_or_else(|| invalid(name, kind))?,
                    None => Value::String(raw.clone()),
                };
                Ok(vec![(name.clone(), value)])
            }
            AttributePatch::Mapping(pairs) => {
                let mut changes = Vec::with_capacity(pairs.len());
                for (name, value) in pairs {
                    check_writable(name)?;
                    let value = match class.kind_of(name) {
                        Some(kind) if kind.is_scalar() => {
                            coerce_value(value, kind).ok_or_else(|| invalid(name, kind))?
                        }
                        _ => value.clone(),
                    };
                    changes.push((name.clone(), value));
                }
                Ok(changes)
            }
        }
    }
}

fn check_writable(name: &str) -> Result<(), ConsoleError> {
    if RESERVED_ATTRIBUTES.contains(&name) {
        return Err(ConsoleError::ReadOnlyAttribute(name.to_string()));
    }
    Ok(())
}

fn invalid(name: &str, kind: AttributeKind) -> ConsoleError {
    ConsoleError::InvalidValue {
        attribute: name.to_string(),
        expected: kind,
    }
}

/// Converts typed text to `kind`, or `None` if the text is not a value of that kind.
pub fn coerce_text(raw: &str, kind: AttributeKind) -> Option<Value> {
    match kind {
        AttributeKind::String => Some(Value::String(raw.to_string())),
        AttributeKind::Integer => raw.trim().parse::<i64>().ok().map(Value::from),
        AttributeKind::Float => float(raw.trim().parse::<f64>().ok()?),
        AttributeKind::List => match LiteralParser::parse(raw).ok()? {
            list @ Value::Array(_) => Some(list),
            _ => None,
        },
    }
}

/// Converts a parsed literal value to a scalar `kind`.
///
/// Numbers convert between integer and float (floats truncate toward zero), numeric
/// strings parse, and booleans count as 0 or 1. Any value becomes a string: strings are kept
/// and everything else is written in its literal form.
pub fn coerce_value(value: &Value, kind: AttributeKind) -> Option<Value> {
    match (kind, value) {
        (AttributeKind::String, Value::String(_)) => Some(value.clone()),
        (AttributeKind::String, _) => Some(Value::String(literal::render(value))),
        (AttributeKind::Integer, Value::Number(n)) => match n.as_i64() {
            Some(i) => Some(Value::from(i)),
            None => truncate(n.as_f64()?),
        },
        (AttributeKind::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::from),
        (AttributeKind::Integer, Value::Bool(b)) => Some(Value::from(i64::from(*b))),
        (AttributeKind::Float, Value::Number(n)) => float(n.as_f64()?),
        (AttributeKind::Float, Value::String(s)) => float(s.trim().parse::<f64>().ok()?),
        (AttributeKind::Float, Value::Bool(b)) => float(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn float(f: f64) -> Option<Value> {
    Number::from_f64(f).map(Value::Number)
}

fn truncate(f: f64) -> Option<Value> {
    if !f.is_finite() || f >= i64::MAX as f64 || f < i64::MIN as f64 {
        return None;
    }
    Some(Value::from(f.trunc() as i64))
}
