//! # Literal Grammar
//!
//! `update` accepts attribute values written as literals, and a mapping literal can patch
//! several attributes at once. This module parses that literal syntax into
//! [`serde_json::Value`] and renders values back in the same syntax for display.
//!
//! ## Syntax
//!
//! ```text
//! value   := string | number | boolean | null | list | mapping
//! string  := '...' | "..."            (escapes: \n \t \r \\ \' \")
//! number  := [+-]? digits [. digits]? [(e|E) [+-]? digits]?
//! boolean := true | false | True | False
//! null    := null | None
//! list    := '[' (value (',' value)* ','?)? ']'
//! mapping := '{' (string ':' value (',' string ':' value)* ','?)? '}'
//! ```
//!
//! Bare words are not values: `attr_name` fails to parse, which is how the console tells a
//! missing value apart from a mapping patch.
//!
//! ```rust
//! use roost::LiteralParser;
//! use serde_json::json;
//!
//! let value = LiteralParser::parse("{'max_guest': 98, 'latitude': 9.8}").unwrap();
//! assert_eq!(value, json!({"max_guest": 98, "latitude": 9.8}));
//! assert!(LiteralParser::parse("attr_name").is_err());
//! ```

use std::fmt;

use handled::Handle;
use serde_json::{Map, Number, Value};

use crate::UserError;

/// Position information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based)
    pub column: usize,
}

impl Position {
    /// Create a new position
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Errors that can occur while parsing a literal
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralParseError {
    /// Unexpected token during parsing
    UnexpectedToken {
        /// What was found
        found: String,
        /// What was expected
        expected: String,
        /// Where the error occurred
        position: Position,
    },
    /// A bare word that is not a keyword
    BareWord {
        /// The word
        word: String,
        /// Where the word started
        position: Position,
    },
    /// Invalid numeric literal
    InvalidNumber {
        /// The invalid text
        text: String,
        /// Where the error occurred
        position: Position,
    },
    /// Unterminated string literal
    UnterminatedString {
        /// Where the string started
        position: Position,
    },
    /// Invalid character in input
    InvalidCharacter {
        /// The invalid character
        character: char,
        /// Where the error occurred
        position: Position,
    },
    /// The literal parsed, but is not a mapping
    NotAMapping,
}

impl fmt::Display for LiteralParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralParseError::UnexpectedToken {
                found,
                expected,
                position,
            } => write!(
                f,
                "Unexpected token '{}' at {}, expected {}",
                found, position, expected
            ),
            LiteralParseError::BareWord { word, position } => {
                write!(f, "Bare word '{}' at {} is not a value", word, position)
            }
            LiteralParseError::InvalidNumber { text, position } => {
                write!(f, "Invalid number '{}' at {}", text, position)
            }
            LiteralParseError::UnterminatedString { position } => {
                write!(f, "Unterminated string literal at {}", position)
            }
            LiteralParseError::InvalidCharacter {
                character,
                position,
            } => write!(f, "Invalid character '{}' at {}", character, position),
            LiteralParseError::NotAMapping => write!(f, "Literal is not a mapping"),
        }
    }
}

impl std::error::Error for LiteralParseError {}

impl Handle<UserError> for LiteralParseError {
    fn handle(&self) -> Option<UserError> {
        let hint = match self {
            LiteralParseError::BareWord { .. } => {
                Some("Quote text values: 'like this' or \"like this\"".to_string())
            }
            LiteralParseError::InvalidNumber { .. } => {
                Some("Numbers should be integers (42) or decimals (3.14)".to_string())
            }
            LiteralParseError::UnterminatedString { .. } => {
                Some("String literals must be closed with the quote that opened them".to_string())
            }
            LiteralParseError::NotAMapping => {
                Some("Mappings look like {'name': 'value', 'count': 3}".to_string())
            }
            LiteralParseError::UnexpectedToken { .. }
            | LiteralParseError::InvalidCharacter { .. } => None,
        };
        Some(UserError {
            message: self.to_string(),
            usage_hint: hint,
        })
    }
}

/// Parser for the literal syntax
pub struct LiteralParser;

impl LiteralParser {
    /// Parse one complete literal
    pub fn parse(input: &str) -> Result<Value, LiteralParseError> {
        let mut lexer = Lexer::new(input);
        let mut parser = Parser::new(&mut lexer)?;
        let value = parser.parse_value()?;
        parser.expect_end()?;
        Ok(value)
    }

    /// Parse a literal that must be a mapping
    pub fn parse_mapping(input: &str) -> Result<Map<String, Value>, LiteralParseError> {
        match Self::parse(input)? {
            Value::Object(map) => Ok(map),
            _ => Err(LiteralParseError::NotAMapping),
        }
    }
}

/// Renders a value in literal syntax.
///
/// Strings are single-quoted and booleans are `True`/`False`, with null as `None`. The
/// output of `render` parses back to the same value.
pub fn render(value: &Value) -> String {
    let mut out = String::new();
    render_into(value, &mut out);
    out
}

fn render_into(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("None"),
        Value::Bool(b) => out.push_str(if *b { "True" } else { "False" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => render_string(s, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                render_into(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            out.push('{');
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                render_string(key, out);
                out.push_str(": ");
                render_into(item, out);
            }
            out.push('}');
        }
    }
}

fn render_string(s: &str, out: &mut String) {
    out.push('\'');
    for ch in s.chars() {
        match ch {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(ch),
        }
    }
    out.push('\'');
}

/// Token types for the lexer
#[derive(Debug, Clone, PartialEq)]
enum TokenType {
    StringLiteral(String),
    IntegerLiteral(i64),
    FloatLiteral(f64),
    BooleanLiteral(bool),
    Null,
    Word(String),
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Colon,
    Comma,
    EndOfInput,
}

/// A token with position information
#[derive(Debug, Clone)]
struct Token {
    token_type: TokenType,
    position: Position,
}

/// Lexer for tokenizing input
struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    fn current_position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.current_char()?;
        self.position += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn punctuation(&mut self, token_type: TokenType, position: Position) -> Token {
        self.advance();
        Token {
            token_type,
            position,
        }
    }

    fn next_token(&mut self) -> Result<Token, LiteralParseError> {
        self.skip_whitespace();

        let position = self.current_position();

        match self.current_char() {
            None => Ok(Token {
                token_type: TokenType::EndOfInput,
                position,
            }),
            Some(ch) => match ch {
                '{' => Ok(self.punctuation(TokenType::LeftBrace, position)),
                '}' => Ok(self.punctuation(TokenType::RightBrace, position)),
                '[' => Ok(self.punctuation(TokenType::LeftBracket, position)),
                ']' => Ok(self.punctuation(TokenType::RightBracket, position)),
                ':' => Ok(self.punctuation(TokenType::Colon, position)),
                ',' => Ok(self.punctuation(TokenType::Comma, position)),
                '\'' | '"' => self.read_string_literal(ch, position),
                ch if ch.is_ascii_digit() || ch == '-' || ch == '+' => {
                    self.read_number_literal(position)
                }
                '.' if self.peek_char().is_some_and(|c| c.is_ascii_digit()) => {
                    self.read_number_literal(position)
                }
                ch if ch.is_alphabetic() || ch == '_' => Ok(self.read_word(position)),
                _ => Err(LiteralParseError::InvalidCharacter {
                    character: ch,
                    position,
                }),
            },
        }
    }

    fn read_string_literal(
        &mut self,
        quote: char,
        start_position: Position,
    ) -> Result<Token, LiteralParseError> {
        self.advance();
        let mut value = String::new();

        while let Some(ch) = self.current_char() {
            if ch == quote {
                self.advance();
                return Ok(Token {
                    token_type: TokenType::StringLiteral(value),
                    position: start_position,
                });
            } else if ch == '\\' {
                self.advance();
                match self.current_char() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some(escape_ch @ ('\\' | '\'' | '"')) => value.push(escape_ch),
                    Some(other) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => break,
                }
                self.advance();
            } else {
                value.push(ch);
                self.advance();
            }
        }

        Err(LiteralParseError::UnterminatedString {
            position: start_position,
        })
    }

    fn read_word(&mut self, position: Position) -> Token {
        let mut value = String::new();

        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' {
                value.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let token_type = match value.as_str() {
            "true" | "True" => TokenType::BooleanLiteral(true),
            "false" | "False" => TokenType::BooleanLiteral(false),
            "null" | "None" => TokenType::Null,
            _ => TokenType::Word(value),
        };

        Token {
            token_type,
            position,
        }
    }

    fn read_number_literal(&mut self, position: Position) -> Result<Token, LiteralParseError> {
        let mut value = String::new();
        let mut is_float = false;

        if let Some(sign @ ('-' | '+')) = self.current_char() {
            value.push(sign);
            self.advance();
        }
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                value.push(ch);
                self.advance();
            } else if ch == '.' && !is_float {
                is_float = true;
                value.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        if let Some(e @ ('e' | 'E')) = self.current_char() {
            is_float = true;
            value.push(e);
            self.advance();
            if let Some(sign @ ('-' | '+')) = self.current_char() {
                value.push(sign);
                self.advance();
            }
            while let Some(ch) = self.current_char() {
                if ch.is_ascii_digit() {
                    value.push(ch);
                    self.advance();
                } else {
                    break;
                }
            }
        }

        // A number glued to letters (`12abc`) is not a number.
        if self
            .current_char()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            return Err(LiteralParseError::InvalidNumber {
                text: value,
                position,
            });
        }

        let token_type = if is_float {
            value
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(TokenType::FloatLiteral)
        } else {
            value.parse::<i64>().ok().map(TokenType::IntegerLiteral)
        };
        match token_type {
            Some(token_type) => Ok(Token {
                token_type,
                position,
            }),
            None => Err(LiteralParseError::InvalidNumber {
                text: value,
                position,
            }),
        }
    }
}

/// Recursive descent parser
struct Parser<'a> {
    lexer: &'a mut Lexer,
    current_token: Token,
}

impl<'a> Parser<'a> {
    fn new(lexer: &'a mut Lexer) -> Result<Self, LiteralParseError> {
        let current_token = lexer.next_token()?;
        Ok(Self {
            lexer,
            current_token,
        })
    }

    fn advance(&mut self) -> Result<(), LiteralParseError> {
        self.current_token = self.lexer.next_token()?;
        Ok(())
    }

    fn unexpected(&self, expected: &str) -> LiteralParseError {
        match &self.current_token.token_type {
            TokenType::Word(word) => LiteralParseError::BareWord {
                word: word.clone(),
                position: self.current_token.position,
            },
            other => LiteralParseError::UnexpectedToken {
                found: format!("{:?}", other),
                expected: expected.to_string(),
                position: self.current_token.position,
            },
        }
    }

    fn expect_end(&self) -> Result<(), LiteralParseError> {
        if matches!(self.current_token.token_type, TokenType::EndOfInput) {
            Ok(())
        } else {
            Err(self.unexpected("end of input"))
        }
    }

    fn parse_value(&mut self) -> Result<Value, LiteralParseError> {
        let value = match &self.current_token.token_type {
            TokenType::StringLiteral(s) => Value::String(s.clone()),
            TokenType::IntegerLiteral(i) => Value::from(*i),
            TokenType::FloatLiteral(f) => match Number::from_f64(*f) {
                Some(n) => Value::Number(n),
                None => {
                    return Err(LiteralParseError::InvalidNumber {
                        text: f.to_string(),
                        position: self.current_token.position,
                    });
                }
            },
            TokenType::BooleanLiteral(b) => Value::Bool(*b),
            TokenType::Null => Value::Null,
            TokenType::LeftBracket => return self.parse_list(),
            TokenType::LeftBrace => return self.parse_mapping(),
            _ => return Err(self.unexpected("value")),
        };
        self.advance()?;
        Ok(value)
    }

    fn parse_list(&mut self) -> Result<Value, LiteralParseError> {
        self.advance()?;
        let mut items = Vec::new();
        loop {
            if matches!(self.current_token.token_type, TokenType::RightBracket) {
                self.advance()?;
                return Ok(Value::Array(items));
            }
            items.push(self.parse_value()?);
            match self.current_token.token_type {
                TokenType::Comma => self.advance()?,
                TokenType::RightBracket => {}
                _ => return Err(self.unexpected("',' or ']'")),
            }
        }
    }

    fn parse_mapping(&mut self) -> Result<Value, LiteralParseError> {
        self.advance()?;
        let mut map = Map::new();
        loop {
            let key = match &self.current_token.token_type {
                TokenType::RightBrace => {
                    self.advance()?;
                    return Ok(Value::Object(map));
                }
                TokenType::StringLiteral(key) => key.clone(),
                _ => return Err(self.unexpected("string key or '}'")),
            };
            self.advance()?;
            if !matches!(self.current_token.token_type, TokenType::Colon) {
                return Err(self.unexpected("':'"));
            }
            self.advance()?;
            let value = self.parse_value()?;
            map.insert(key, value);
            match self.current_token.token_type {
                TokenType::Comma => self.advance()?,
                TokenType::RightBrace => {}
                _ => return Err(self.unexpected("',' or '}'")),
            }
        }
    }
}
