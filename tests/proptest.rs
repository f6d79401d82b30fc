use std::fs;
use std::path::PathBuf;
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

use proptest::prelude::*;
use serde_json::{Value, json};

use roost::{
    Console, FileStore, LiteralParser, ObjectStore, RecordClass, Reply, normalize, render,
};

/// Test infrastructure for property testing the console against a real store file
pub struct ConsoleHarness {
    pub console: Console<FileStore>,
    pub store_path: PathBuf,
}

impl Default for ConsoleHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleHarness {
    /// Create a console over a fresh, empty store file
    pub fn new() -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let pid = process::id();
        let store_path = PathBuf::from(format!("prop_test_{}_{}.json", pid, timestamp));
        let console = Console::new(FileStore::new(store_path.clone()));
        Self {
            console,
            store_path,
        }
    }

    /// Run a line and return what the binary would print
    pub fn output(&mut self, line: &str) -> String {
        match self.console.execute(line) {
            Ok(Reply::Output(text)) => text,
            Ok(Reply::Silent) => String::new(),
            Ok(Reply::Exit(text)) => text.unwrap_or_default(),
            Err(e) => e.to_string(),
        }
    }
}

impl Drop for ConsoleHarness {
    fn drop(&mut self) {
        if self.store_path.exists() {
            if let Err(e) = fs::remove_file(&self.store_path) {
                eprintln!(
                    "Warning: failed to cleanup test store file {:?}: {}",
                    self.store_path, e
                );
            }
        }
    }
}

/// Property test strategies for generating test data
pub mod strategies {
    use super::*;
    use proptest::collection::{btree_map, vec};
    use proptest::string::string_regex;

    /// Strategy for picking a registered class
    pub fn class_strategy() -> impl Strategy<Value = RecordClass> {
        proptest::sample::select(RecordClass::ALL.to_vec())
    }

    /// Strategy for ids and attribute names that need no quoting
    pub fn word_strategy() -> impl Strategy<Value = String> {
        string_regex(r"[A-Za-z][A-Za-z0-9_-]{0,15}").unwrap()
    }

    /// Strategy for attribute values that may contain spaces
    pub fn text_strategy() -> impl Strategy<Value = String> {
        string_regex(r"[A-Za-z0-9][A-Za-z0-9 .@]{0,20}").unwrap()
    }

    /// Strategy for literal values, nested up to two levels
    pub fn literal_strategy() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            any::<String>().prop_map(Value::String),
            (-1_000_000_000_000i64..1_000_000_000_000i64).prop_map(|i| json!(i)),
            (-1.0e6f64..1.0e6f64).prop_map(|f| json!(f)),
            any::<bool>().prop_map(Value::Bool),
            Just(Value::Null),
        ];
        leaf.prop_recursive(2, 16, 4, |inner| {
            prop_oneof![
                vec(inner.clone(), 0..4).prop_map(Value::Array),
                btree_map(any::<String>(), inner, 0..4)
                    .prop_map(|map| Value::Object(map.into_iter().collect())),
            ]
        })
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn dot_call_matches_verb_first(
        class in strategies::class_strategy(),
        id in strategies::word_strategy(),
        name in strategies::word_strategy(),
        value in strategies::text_strategy(),
    ) {
        for verb in ["show", "destroy"] {
            let verb_first = normalize(&format!("{} {} {}", verb, class, id)).unwrap();
            let dot_call = normalize(&format!("{}.{}(\"{}\")", class, verb, id)).unwrap();
            prop_assert_eq!(verb_first, dot_call);
        }

        let verb_first = normalize(&format!("update {} {} {} \"{}\"", class, id, name, value)).unwrap();
        let dot_call = normalize(&format!(
            "{}.update(\"{}\", \"{}\", \"{}\")",
            class, id, name, value
        ))
        .unwrap();
        prop_assert_eq!(verb_first, dot_call);
    }

    #[test]
    fn count_tracks_creates(
        class in strategies::class_strategy(),
        other in strategies::class_strategy(),
        n in 0usize..8,
    ) {
        prop_assume!(class != other);
        let mut harness = ConsoleHarness::new();
        for _ in 0..n {
            harness.output(&format!("create {}", class));
        }
        prop_assert_eq!(harness.output(&format!("count {}", class)), n.to_string());
        prop_assert_eq!(harness.output(&format!("{}.count()", other)), "0");
    }

    #[test]
    fn undeclared_attributes_store_text(
        name in strategies::word_strategy(),
        value in strategies::text_strategy(),
    ) {
        prop_assume!(!["id", "created_at", "updated_at"].contains(&name.as_str()));
        let mut harness = ConsoleHarness::new();
        let id = harness.output("create BaseModel");
        prop_assert_eq!(
            harness.output(&format!("update BaseModel {} {} \"{}\"", id, name, value)),
            ""
        );

        let (reloaded, _) = FileStore::open(harness.store_path.clone()).unwrap();
        let record = reloaded.get(&format!("BaseModel.{}", id)).unwrap();
        prop_assert_eq!(record.get(&name), Some(Value::String(value)));
    }

    #[test]
    fn integer_attributes_coerce(guests in -10_000i64..10_000) {
        let mut harness = ConsoleHarness::new();
        let id = harness.output("create Place");
        harness.output(&format!("Place.update(\"{}\", \"max_guest\", \"{}\")", id, guests));
        let record = harness
            .console
            .store()
            .get(&format!("Place.{}", id))
            .unwrap();
        prop_assert_eq!(record.get("max_guest"), Some(json!(guests)));
    }

    #[test]
    fn rendered_literals_parse_back(value in strategies::literal_strategy()) {
        let rendered = render(&value);
        prop_assert_eq!(LiteralParser::parse(&rendered).unwrap(), value);
    }
}
