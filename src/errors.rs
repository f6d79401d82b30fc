//! Error types for roost operations.
//!
//! Every error the console can produce is reported to the user as a single line. The
//! [`UserError`] extraction through [`handled::Handle`] gives the binary a uniform way to
//! pull that line (and an optional hint) out of any of them.

use handled::Handle;

use crate::AttributeKind;

/// User-friendly error information that can be extracted from the error types in this crate.
#[derive(Debug, Clone)]
pub struct UserError {
    /// The main error message to display to the user
    pub message: String,
    /// Optional usage hint to help the user correct the error
    pub usage_hint: Option<String>,
}

impl std::fmt::Display for UserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Handle<UserError> for UserError {
    fn handle(&self) -> Option<UserError> {
        Some(self.clone())
    }
}

/// Errors that can occur while persisting or reloading an object store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// An I/O operation on the backing file failed.
    Io(String),
    /// JSON serialization or deserialization failed.
    Serialization(String),
    /// The backing file parsed, but its top-level shape is not a store document.
    Malformed(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "IO error: {}", msg),
            Self::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            Self::Malformed(msg) => write!(f, "Malformed store file: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl Handle<UserError> for StoreError {
    fn handle(&self) -> Option<UserError> {
        let hint = match self {
            StoreError::Io(_) => {
                Some("Check that the store file's directory exists and is writable".to_string())
            }
            StoreError::Serialization(_) | StoreError::Malformed(_) => Some(
                "The store file must hold a single JSON object keyed by \"<Class>.<id>\""
                    .to_string(),
            ),
        };
        Some(UserError {
            message: self.to_string(),
            usage_hint: hint,
        })
    }
}

/// A diagnostic produced by a console command.
///
/// Diagnostics are reported, not raised: the console prints the `Display` form and the
/// command leaves the store untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleError {
    /// The command needs a class name and none was given.
    ClassNameMissing,
    /// The class name is not in the class registry.
    ClassDoesntExist,
    /// The command needs an instance id and none was given.
    InstanceIdMissing,
    /// No record is stored under `<Class>.<id>`.
    NoInstanceFound,
    /// `update` was given a class and id but nothing to assign.
    AttributeNameMissing,
    /// `update` was given an attribute name but no value.
    ValueMissing,
    /// A value could not be coerced to the attribute's declared kind.
    InvalidValue {
        /// The attribute being assigned
        attribute: String,
        /// The kind declared by the class schema
        expected: AttributeKind,
    },
    /// The attribute belongs to the record's base structure and cannot be patched.
    ReadOnlyAttribute(String),
    /// The line matched neither command syntax.
    UnknownSyntax(String),
    /// The store could not be persisted after a mutation.
    SaveFailed(StoreError),
}

impl std::fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ClassNameMissing => write!(f, "** class name missing **"),
            Self::ClassDoesntExist => write!(f, "** class doesn't exist **"),
            Self::InstanceIdMissing => write!(f, "** instance id missing **"),
            Self::NoInstanceFound => write!(f, "** no instance found **"),
            Self::AttributeNameMissing => write!(f, "** attribute name missing **"),
            Self::ValueMissing => write!(f, "** value missing **"),
            Self::InvalidValue {
                attribute,
                expected,
            } => write!(f, "** invalid value for {}: expected {} **", attribute, expected),
            Self::ReadOnlyAttribute(name) => write!(f, "** attribute {} is read-only **", name),
            Self::UnknownSyntax(line) => write!(f, "*** Unknown syntax: {}", line),
            Self::SaveFailed(e) => write!(f, "** save failed: {} **", e),
        }
    }
}

impl std::error::Error for ConsoleError {}

impl Handle<UserError> for ConsoleError {
    fn handle(&self) -> Option<UserError> {
        let hint = match self {
            ConsoleError::ClassDoesntExist => Some(format!(
                "Known classes: {}",
                crate::RecordClass::ALL
                    .iter()
                    .map(|c| c.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
            ConsoleError::ValueMissing => Some(
                "Usage: update <class> <id> <attribute_name> <attribute_value>".to_string(),
            ),
            ConsoleError::InvalidValue { expected, .. } => match expected {
                AttributeKind::Integer => Some("Integers look like 42 or -7".to_string()),
                AttributeKind::Float => Some("Floats look like 3.14 or 2".to_string()),
                AttributeKind::List => Some("Lists look like ['a', 'b']".to_string()),
                AttributeKind::String => None,
            },
            ConsoleError::UnknownSyntax(_) => Some("Type 'help' for a list of commands".to_string()),
            ConsoleError::SaveFailed(e) => e.handle().and_then(|u| u.usage_hint),
            _ => None,
        };
        Some(UserError {
            message: self.to_string(),
            usage_hint: hint,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_are_exact() {
        assert_eq!(ConsoleError::ClassNameMissing.to_string(), "** class name missing **");
        assert_eq!(ConsoleError::ClassDoesntExist.to_string(), "** class doesn't exist **");
        assert_eq!(ConsoleError::InstanceIdMissing.to_string(), "** instance id missing **");
        assert_eq!(ConsoleError::NoInstanceFound.to_string(), "** no instance found **");
        assert_eq!(
            ConsoleError::AttributeNameMissing.to_string(),
            "** attribute name missing **"
        );
        assert_eq!(ConsoleError::ValueMissing.to_string(), "** value missing **");
        assert_eq!(
            ConsoleError::UnknownSyntax("MyModel.fly()".to_string()).to_string(),
            "*** Unknown syntax: MyModel.fly()"
        );
    }

    #[test]
    fn invalid_value_names_kind() {
        let err = ConsoleError::InvalidValue {
            attribute: "max_guest".to_string(),
            expected: AttributeKind::Integer,
        };
        assert_eq!(
            err.to_string(),
            "** invalid value for max_guest: expected integer **"
        );
        let user_error = err.handle().unwrap();
        assert!(user_error.usage_hint.is_some());
    }

    #[test]
    fn store_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(matches!(StoreError::from(io), StoreError::Io(_)));

        let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(StoreError::from(json), StoreError::Serialization(_)));
    }

    #[test]
    fn save_failure_carries_store_hint() {
        let err = ConsoleError::SaveFailed(StoreError::Io("disk full".to_string()));
        assert_eq!(err.to_string(), "** save failed: IO error: disk full **");
        assert!(err.handle().unwrap().usage_hint.is_some());
    }
}
