//! # Command Normalizer
//!
//! Turns one console line into a [`CanonicalCommand`]: a verb plus positional tokens, where
//! `tokens[0]` is the class name and `tokens[1]` the instance id when present.
//!
//! Two surface syntaxes reach the same command:
//!
//! ```text
//! show User 1234                 verb-first
//! User.show("1234")              dot-call, rewritten to `show User "1234"`
//! ```
//!
//! The line's leading identifier selects the verb when it names a console command.
//! Anything else is tried as a dot-call; a line that is neither reports unknown syntax.
//!
//! ```rust
//! use roost::{Verb, normalize};
//!
//! let verb_first = normalize("update User 1234 first_name \"Betty\"").unwrap().unwrap();
//! let dot_call = normalize("User.update(\"1234\", \"first_name\", \"Betty\")").unwrap().unwrap();
//! assert_eq!(verb_first, dot_call);
//! assert_eq!(verb_first.verb, Verb::Update);
//! assert_eq!(verb_first.tokens, vec!["User", "1234", "first_name", "Betty"]);
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::ConsoleError;

// Greedy, so a nested literal is captured whole.
static MAPPING_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{.*\}").expect("mapping pattern compiles"));
static LIST_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[.*\]").expect("list pattern compiles"));
static CALL_ARGUMENTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((.*?)\)").expect("call pattern compiles"));

/////////////////////////////////////////////////// Verb ///////////////////////////////////////////////

/// The console's commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// `create <class>`
    Create,
    /// `show <class> <id>`
    Show,
    /// `destroy <class> <id>`
    Destroy,
    /// `all [<class>]`
    All,
    /// `count <class>`
    Count,
    /// `update <class> <id> <name> <value>` or `update <class> <id> <mapping>`
    Update,
    /// `quit`
    Quit,
    /// `EOF`, also produced by end of input
    Eof,
    /// `help [<topic>]`
    Help,
}

impl Verb {
    /// Every command, in the order `help` lists them.
    pub const ALL: [Verb; 9] = [
        Verb::Eof,
        Verb::All,
        Verb::Count,
        Verb::Create,
        Verb::Destroy,
        Verb::Help,
        Verb::Quit,
        Verb::Show,
        Verb::Update,
    ];

    /// The command word as typed.
    pub fn name(&self) -> &'static str {
        match self {
            Verb::Create => "create",
            Verb::Show => "show",
            Verb::Destroy => "destroy",
            Verb::All => "all",
            Verb::Count => "count",
            Verb::Update => "update",
            Verb::Quit => "quit",
            Verb::Eof => "EOF",
            Verb::Help => "help",
        }
    }

    /// True for the verbs reachable through `<class>.<verb>(...)`.
    pub fn is_dot_callable(&self) -> bool {
        matches!(
            self,
            Verb::All | Verb::Show | Verb::Destroy | Verb::Count | Verb::Update
        )
    }
}

impl Display for Verb {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Verb {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Verb::ALL.iter().find(|v| v.name() == s).copied().ok_or(())
    }
}

/////////////////////////////////////////// CanonicalCommand ///////////////////////////////////////////

/// A command in normalized form, independent of the syntax it was typed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalCommand {
    /// The command to run
    pub verb: Verb,
    /// Positional arguments: class, id, then the attribute patch
    pub tokens: Vec<String>,
}

impl CanonicalCommand {
    /// The token at `index`, if there is one.
    pub fn token(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }
}

/// Normalizes one console line.
///
/// # Returns
/// * `Ok(Some(command))` - The line names a command
/// * `Ok(None)` - The line is empty or whitespace
/// * `Err(ConsoleError::UnknownSyntax)` - The line matches neither syntax, or its quotes do
///   not balance
pub fn normalize(line: &str) -> Result<Option<CanonicalCommand>, ConsoleError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let word_end = trimmed
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(trimmed.len());
    if let Ok(verb) = trimmed[..word_end].parse::<Verb>() {
        return command(verb, &trimmed[word_end..], line).map(Some);
    }

    let (verb, arguments) = rewrite_dot_call(trimmed)
        .ok_or_else(|| ConsoleError::UnknownSyntax(line.to_string()))?;
    command(verb, &arguments, line).map(Some)
}

fn command(verb: Verb, arguments: &str, line: &str) -> Result<CanonicalCommand, ConsoleError> {
    let tokens = tokenize(arguments).ok_or_else(|| ConsoleError::UnknownSyntax(line.to_string()))?;
    Ok(CanonicalCommand { verb, tokens })
}

/// Rewrites `<class>.<verb>(<args>)` to its verb and the argument text `<class> <args>`.
///
/// Returns `None` when the line has no `.`, no parenthesized group after it, or names a
/// verb that is not dot-callable.
pub fn rewrite_dot_call(line: &str) -> Option<(Verb, String)> {
    let (prefix, suffix) = line.split_once('.')?;
    let call = CALL_ARGUMENTS.captures(suffix)?;
    let group = call.get(0)?;
    let interior = call.get(1)?;

    let verb = suffix[..group.start()].parse::<Verb>().ok()?;
    if !verb.is_dot_callable() {
        return None;
    }
    Some((verb, format!("{} {}", prefix, interior.as_str())))
}

/// Splits argument text into tokens.
///
/// A mapping literal (`{...}`), or failing that a list literal (`[...]`), is kept whole as
/// the final token; text after it is dropped. Everything before it is split shell-style
/// with quotes removed and one trailing comma stripped from each token.
///
/// Returns `None` when the quotes do not balance.
pub fn tokenize(text: &str) -> Option<Vec<String>> {
    let literal = MAPPING_LITERAL.find(text).or_else(|| LIST_LITERAL.find(text));
    let (head, literal) = match literal {
        Some(m) => (&text[..m.start()], Some(m.as_str())),
        None => (text, None),
    };

    let mut tokens: Vec<String> = shlex::split(head)?
        .into_iter()
        .map(|token| match token.strip_suffix(',') {
            Some(stripped) => stripped.to_string(),
            None => token,
        })
        .collect();
    if let Some(literal) = literal {
        tokens.push(literal.to_string());
    }
    Some(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalized(line: &str) -> CanonicalCommand {
        normalize(line).unwrap().unwrap()
    }

    fn unknown(line: &str) {
        assert_eq!(
            normalize(line),
            Err(ConsoleError::UnknownSyntax(line.to_string())),
            "{}",
            line
        );
    }

    #[test]
    fn verbs_parse_by_name() {
        for verb in Verb::ALL {
            assert_eq!(verb.name().parse::<Verb>(), Ok(verb));
        }
        assert!("eof".parse::<Verb>().is_err());
        assert!("Show".parse::<Verb>().is_err());
    }

    #[test]
    fn empty_lines_do_nothing() {
        assert_eq!(normalize(""), Ok(None));
        assert_eq!(normalize("   \t"), Ok(None));
    }

    #[test]
    fn verb_first_tokens() {
        let cmd = normalized("show BaseModel 1234-1234");
        assert_eq!(cmd.verb, Verb::Show);
        assert_eq!(cmd.tokens, vec!["BaseModel", "1234-1234"]);
        assert_eq!(cmd.token(0), Some("BaseModel"));
        assert_eq!(cmd.token(2), None);

        let cmd = normalized("all");
        assert_eq!(cmd.verb, Verb::All);
        assert!(cmd.tokens.is_empty());
    }

    #[test]
    fn quoted_values_become_one_token() {
        let cmd = normalized("update Place 42 name \"My little house\"");
        assert_eq!(cmd.tokens, vec!["Place", "42", "name", "My little house"]);
    }

    #[test]
    fn mapping_literal_is_kept_raw() {
        let cmd = normalized("update User 42 {'first_name': \"Betty\", 'age': 89}");
        assert_eq!(
            cmd.tokens,
            vec!["User", "42", "{'first_name': \"Betty\", 'age': 89}"]
        );
    }

    #[test]
    fn nested_literals_stay_whole() {
        let cmd = normalized("update Place 42 {'amenity_ids': ['a', 'b'], 'meta': {'x': 1}}");
        assert_eq!(cmd.tokens[2], "{'amenity_ids': ['a', 'b'], 'meta': {'x': 1}}");
    }

    #[test]
    fn second_mapping_joins_the_first() {
        let cmd = normalized("update User 42 {'a': 1} {'b': 2}");
        assert_eq!(cmd.tokens, vec!["User", "42", "{'a': 1} {'b': 2}"]);
        assert_eq!(
            tokenize("Place 7 {'x': [1]} and [2]").unwrap(),
            vec!["Place", "7", "{'x': [1]} and [2]"]
        );
    }

    #[test]
    fn list_literal_is_kept_raw() {
        let cmd = normalized("update Place 42 amenity_ids [\"a\", \"b\"] trailing");
        assert_eq!(cmd.tokens, vec!["Place", "42", "amenity_ids", "[\"a\", \"b\"]"]);
    }

    #[test]
    fn trailing_commas_are_stripped() {
        assert_eq!(
            tokenize("User 42, first_name, Betty").unwrap(),
            vec!["User", "42", "first_name", "Betty"]
        );
    }

    #[test]
    fn unbalanced_quotes_are_unknown_syntax() {
        unknown("show User \"42");
        unknown("User.show(\"42)");
    }

    #[test]
    fn dot_calls_match_verb_first() {
        let pairs = [
            ("User.all()", "all User"),
            ("User.count()", "count User"),
            ("User.show(\"42\")", "show User 42"),
            ("User.destroy(\"42\")", "destroy User 42"),
            (
                "User.update(\"42\", \"first_name\", \"Betty\")",
                "update User 42 first_name Betty",
            ),
            (
                "User.update(\"42\", {'first_name': 'Betty'})",
                "update User 42 {'first_name': 'Betty'}",
            ),
        ];
        for (dot_call, verb_first) in pairs {
            assert_eq!(normalized(dot_call), normalized(verb_first), "{}", dot_call);
        }
    }

    #[test]
    fn dot_call_with_empty_prefix() {
        let cmd = normalized(".show()");
        assert_eq!(cmd.verb, Verb::Show);
        assert!(cmd.tokens.is_empty());
    }

    #[test]
    fn dot_call_unknown_class_still_rewrites() {
        let cmd = normalized("MyModel.all()");
        assert_eq!(cmd.verb, Verb::All);
        assert_eq!(cmd.tokens, vec!["MyModel"]);
    }

    #[test]
    fn unrecognized_lines() {
        unknown("hello");
        unknown("User.fly()");
        unknown("User.show");
        unknown("User.create()");
        unknown("Usershow()");
    }

    #[test]
    fn leading_word_must_be_whole_identifier() {
        unknown("showUser 42");
        let cmd = normalized("count,User");
        assert_eq!(cmd.verb, Verb::Count);
        assert_eq!(cmd.tokens, vec![",User"]);
    }

    #[test]
    fn eof_and_help() {
        assert_eq!(normalized("EOF").verb, Verb::Eof);
        let cmd = normalized("help show");
        assert_eq!(cmd.verb, Verb::Help);
        assert_eq!(cmd.tokens, vec!["show"]);
    }
}
