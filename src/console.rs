//! # Command Executor
//!
//! [`Console`] runs normalized commands against an [`ObjectStore`]. Every command either
//! produces a [`Reply`] or fails with exactly one [`ConsoleError`]; a failed command leaves
//! the store as it found it.
//!
//! Checks run in a fixed order and the first failure wins:
//!
//! ```text
//! class name missing → class doesn't exist → instance id missing → no instance found
//!     → attribute name missing → value missing → (coercion) invalid value / read-only
//! ```
//!
//! `create`, `destroy` and a successful `update` persist the whole store once. If the store
//! cannot be persisted, the mutation is rolled back and the command reports
//! `** save failed: <reason> **`.
//!
//! ## Usage Examples
//!
//! ```rust
//! use roost::{Console, InMemoryStore, ObjectStore, Reply};
//!
//! let mut console = Console::new(InMemoryStore::new());
//! let Ok(Reply::Output(id)) = console.execute("create User") else { panic!() };
//!
//! console.execute(&format!("User.update(\"{}\", \"first_name\", \"Betty\")", id)).unwrap();
//! let Ok(Reply::Output(shown)) = console.execute(&format!("show User {}", id)) else { panic!() };
//! assert!(shown.contains("'first_name': 'Betty'"));
//! assert_eq!(console.store().all().len(), 1);
//! ```

use serde_json::{Map, Value};

use crate::{
    AttributePatch, CanonicalCommand, ConsoleError, Journal, JournalEntry, JournalMetadata,
    JournalOperation, ObjectStore, Record, RecordClass, Verb, normalize, record_key,
};

/// What a command asks the caller to do after it ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Nothing to print.
    Silent,
    /// Print one line.
    Output(String),
    /// Stop reading commands, printing the line first if there is one.
    Exit(Option<String>),
}

/// The interactive command interpreter.
pub struct Console<S: ObjectStore> {
    store: S,
    journal: Option<Journal>,
}

impl<S: ObjectStore> Console<S> {
    /// Creates a console over `store`.
    pub fn new(store: S) -> Self {
        Self {
            store,
            journal: None,
        }
    }

    /// Records every successful mutation in `journal`.
    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    /// The store commands run against.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Normalizes and runs one console line.
    pub fn execute(&mut self, line: &str) -> Result<Reply, ConsoleError> {
        match normalize(line)? {
            Some(command) => self.run(&command, line),
            None => Ok(Reply::Silent),
        }
    }

    /// Runs a command already in canonical form. `line` is what the user typed.
    pub fn run(&mut self, command: &CanonicalCommand, line: &str) -> Result<Reply, ConsoleError> {
        match command.verb {
            Verb::Create => self.create(command, line),
            Verb::Show => self.show(command),
            Verb::Destroy => self.destroy(command, line),
            Verb::All => self.all(command),
            Verb::Count => self.count(command),
            Verb::Update => self.update(command, line),
            Verb::Help => Ok(Reply::Output(help(command.token(0)))),
            Verb::Quit => Ok(Reply::Exit(None)),
            Verb::Eof => Ok(Reply::Exit(Some(String::new()))),
        }
    }

    fn create(&mut self, command: &CanonicalCommand, line: &str) -> Result<Reply, ConsoleError> {
        let class = class_of(command)?;
        let record = Record::new(class);
        let id = record.id().to_string();
        let key = record.key();

        self.store.insert(record);
        if let Err(e) = self.store.persist() {
            self.store.remove(&key);
            return Err(ConsoleError::SaveFailed(e));
        }
        self.journal(JournalOperation::RecordCreate { key }, line);
        Ok(Reply::Output(id))
    }

    fn show(&self, command: &CanonicalCommand) -> Result<Reply, ConsoleError> {
        let key = self.existing_key(command)?;
        let record = self.store.get(&key).ok_or(ConsoleError::NoInstanceFound)?;
        Ok(Reply::Output(record.to_string()))
    }

    fn destroy(&mut self, command: &CanonicalCommand, line: &str) -> Result<Reply, ConsoleError> {
        let key = self.existing_key(command)?;
        let removed = self
            .store
            .remove(&key)
            .ok_or(ConsoleError::NoInstanceFound)?;
        if let Err(e) = self.store.persist() {
            self.store.insert(removed);
            return Err(ConsoleError::SaveFailed(e));
        }
        self.journal(JournalOperation::RecordDestroy { key }, line);
        Ok(Reply::Silent)
    }

    fn all(&self, command: &CanonicalCommand) -> Result<Reply, ConsoleError> {
        let class = match command.token(0) {
            Some(name) => Some(
                name.parse::<RecordClass>()
                    .map_err(|_| ConsoleError::ClassDoesntExist)?,
            ),
            None => None,
        };
        let shown: Vec<Value> = self
            .store
            .all()
            .values()
            .filter(|record| class.is_none_or(|c| record.class() == c))
            .map(|record| Value::String(record.to_string()))
            .collect();
        Ok(Reply::Output(Value::Array(shown).to_string()))
    }

    fn count(&self, command: &CanonicalCommand) -> Result<Reply, ConsoleError> {
        let name = command.token(0).ok_or(ConsoleError::ClassNameMissing)?;
        let count = self
            .store
            .all()
            .values()
            .filter(|record| record.class().name() == name)
            .count();
        Ok(Reply::Output(count.to_string()))
    }

    fn update(&mut self, command: &CanonicalCommand, line: &str) -> Result<Reply, ConsoleError> {
        let key = self.existing_key(command)?;
        let patch = AttributePatch::from_tokens(command.tokens.get(2..).unwrap_or_default())?;
        let record = self
            .store
            .get_mut(&key)
            .ok_or(ConsoleError::NoInstanceFound)?;
        let changes = patch.resolve(record.class())?;

        let previous = record.clone();
        for (name, value) in &changes {
            record.set(name.clone(), value.clone());
        }
        record.touch();
        if let Err(e) = self.store.persist() {
            self.store.insert(previous);
            return Err(ConsoleError::SaveFailed(e));
        }

        let changes: Map<String, Value> = changes.into_iter().collect();
        self.journal(JournalOperation::RecordUpdate { key, changes }, line);
        Ok(Reply::Silent)
    }

    /// Resolves `tokens[0..2]` to the key of a live record.
    fn existing_key(&self, command: &CanonicalCommand) -> Result<String, ConsoleError> {
        let class = class_of(command)?;
        let id = command.token(1).ok_or(ConsoleError::InstanceIdMissing)?;
        let key = record_key(class, id);
        if self.store.get(&key).is_none() {
            return Err(ConsoleError::NoInstanceFound);
        }
        Ok(key)
    }

    fn journal(&self, operation: JournalOperation, line: &str) {
        if let Some(journal) = &self.journal {
            let entry = JournalEntry::new(operation, JournalMetadata::console(line));
            if let Err(e) = journal.append(&entry) {
                eprintln!("Failed to write journal entry: {}", e);
            }
        }
    }
}

fn class_of(command: &CanonicalCommand) -> Result<RecordClass, ConsoleError> {
    command
        .token(0)
        .ok_or(ConsoleError::ClassNameMissing)?
        .parse::<RecordClass>()
        .map_err(|_| ConsoleError::ClassDoesntExist)
}

/////////////////////////////////////////////////// help ///////////////////////////////////////////////

/// The usage text for one command.
pub fn help_text(verb: Verb) -> &'static str {
    match verb {
        Verb::Create => "Usage: create <class>\nCreates a new class instance and prints its id.",
        Verb::Show => {
            "Usage: show <class> <id> or <class>.show(<id>)\n\
             Displays the string representation of a class instance of a given id."
        }
        Verb::Destroy => {
            "Usage: destroy <class> <id> or <class>.destroy(<id>)\n\
             Deletes a class instance of a given id."
        }
        Verb::All => {
            "Usage: all or all <class> or <class>.all()\n\
             Displays the string representations of all instances of a given class.\n\
             If no class is specified, displays all instantiated objects."
        }
        Verb::Count => {
            "Usage: count <class> or <class>.count()\n\
             Retrieves the number of instances of a given class."
        }
        Verb::Update => {
            "Usage: update <class> <id> <attribute_name> <attribute_value> or\n\
             <class>.update(<id>, <attribute_name>, <attribute_value>) or\n\
             <class>.update(<id>, <dictionary>)\n\
             Updates a class instance of a given id by adding or updating\n\
             a given attribute key/value pair or dictionary."
        }
        Verb::Help => "Usage: help [<command>]\nLists commands, or shows the usage of one.",
        Verb::Quit => "Quit command to exit the program.",
        Verb::Eof => "EOF signal to exit the program.",
    }
}

fn help(topic: Option<&str>) -> String {
    match topic {
        None => {
            let header = "Documented commands (type help <topic>):";
            let names: Vec<&str> = Verb::ALL.iter().map(Verb::name).collect();
            format!("{}\n{}\n{}", header, "=".repeat(header.len()), names.join("  "))
        }
        Some(topic) => match topic.parse::<Verb>() {
            Ok(verb) => help_text(verb).to_string(),
            Err(()) => format!("*** No help on {}", topic),
        },
    }
}
