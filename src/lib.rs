//! # Roost: A Command Console over a File-Backed Object Store
//!
//! Roost is a line-oriented console for a small set of record classes (users, states,
//! cities, amenities, places, reviews, and a generic base record). Records live in memory
//! while the console runs and are written to a single JSON file after every change.
//!
//! This crate provides:
//!
//! - **Dual-Syntax Commands**: `show User 1234` and `User.show("1234")` normalize to the
//!   same command before anything runs
//! - **Schema-Driven Updates**: untyped console input is coerced to each class's declared
//!   attribute kinds; undeclared attributes are stored as typed
//! - **A Literal Grammar**: values and multi-attribute patches are written as literals
//!   (`98`, `'text'`, `['a', 'b']`, `{'name': 'Loft', 'max_guest': 4}`), parsed without
//!   evaluating anything
//! - **Persistence**: an `ObjectStore` trait with an in-memory store for tests and a JSON
//!   file store for the binary
//! - **Journaling**: an optional JSONL audit trail of every mutation
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ Binary (read-eval-print loop on stdin)  │
//! ├─────────────────────────────────────────┤
//! │ Command Normalizer (two syntaxes → one) │
//! ├─────────────────────────────────────────┤
//! │ Console (validation, coercion, replies) │
//! ├─────────────────────────────────────────┤
//! │ Object Store (trait, memory, JSON file) │
//! ├─────────────────────────────────────────┤
//! │ Journal (JSONL mutation log)            │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage Examples
//!
//! ```rust
//! # use roost::{Console, InMemoryStore, ObjectStore, Reply};
//! let mut console = Console::new(InMemoryStore::new());
//!
//! let Ok(Reply::Output(id)) = console.execute("create Place") else { panic!() };
//! console
//!     .execute(&format!("update Place {} {{'max_guest': 4, 'latitude': 37.7}}", id))
//!     .unwrap();
//!
//! assert_eq!(console.execute("Place.count()"), Ok(Reply::Output("1".to_string())));
//! assert_eq!(
//!     console.execute("show Place"),
//!     Err(roost::ConsoleError::InstanceIdMissing)
//! );
//! ```

#![deny(missing_docs)]
mod coerce;
mod console;
mod data_store;
mod errors;
mod journal;
mod literal;
mod normalize;
mod record;
mod schema;

/// Command-line interface utilities for program termination and diagnostics.
///
/// This module provides the exit and reporting helpers shared by the roost binary.
pub mod cli_utils;

pub use coerce::{AttributePatch, coerce_text, coerce_value};
pub use console::{Console, Reply, help_text};
pub use data_store::{FileStore, InMemoryStore, ObjectStore, RecordMap, ReloadReport};
pub use errors::{ConsoleError, StoreError, UserError};
pub use journal::{Journal, JournalEntry, JournalMetadata, JournalOperation};
pub use literal::{LiteralParseError, LiteralParser, Position, render};
pub use normalize::{CanonicalCommand, Verb, normalize, rewrite_dot_call, tokenize};
pub use record::{RESERVED_ATTRIBUTES, Record, RecordDecodeError, parse_timestamp, record_key};
pub use schema::{Attribute, AttributeKind, RecordClass, UnknownClass};
