use std::io::{self, BufRead};
use std::process;

use crate::UserError;

/// Exits the program with an error message
pub fn exit_with_error(message: &str) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

/// Exits the program with an error message and usage information
pub fn exit_with_usage_error(message: &str, usage: &str) -> ! {
    eprintln!("Error: {}", message);
    eprintln!("{}", usage);
    process::exit(1);
}

/// Prints a console diagnostic, and its usage hint on stderr when `verbose` is set
pub fn print_diagnostic(error: &UserError, verbose: bool) {
    println!("{}", error.message);
    if verbose {
        if let Some(hint) = &error.usage_hint {
            eprintln!("hint: {}", hint);
        }
    }
}

/// Reads one input line, without its line ending.
///
/// Bytes that are not valid UTF-8 are replaced rather than failing the read, so one garbled
/// line becomes one failed command. Returns `Ok(None)` at end of input.
pub fn read_console_line(
    reader: &mut impl BufRead,
    buffer: &mut Vec<u8>,
) -> io::Result<Option<String>> {
    buffer.clear();
    if reader.read_until(b'\n', buffer)? == 0 {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(buffer);
    Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Console, ConsoleError, InMemoryStore, Reply};

    #[test]
    fn lines_lose_their_endings() {
        let mut input: &[u8] = b"create User\r\ncount User\nall";
        let mut buffer = Vec::new();
        let mut lines = Vec::new();
        while let Some(line) = read_console_line(&mut input, &mut buffer).unwrap() {
            lines.push(line);
        }
        assert_eq!(lines, vec!["create User", "count User", "all"]);
    }

    #[test]
    fn invalid_utf8_does_not_end_the_session() {
        let mut input: &[u8] = b"create User\nshow User \xff\ncount User\n";
        let mut buffer = Vec::new();
        let mut console = Console::new(InMemoryStore::new());
        let mut replies = Vec::new();
        while let Some(line) = read_console_line(&mut input, &mut buffer).unwrap() {
            replies.push(console.execute(&line));
        }

        assert_eq!(replies.len(), 3);
        assert!(matches!(replies[0], Ok(Reply::Output(_))));
        assert_eq!(replies[1], Err(ConsoleError::NoInstanceFound));
        assert_eq!(replies[2], Ok(Reply::Output("1".to_string())));
    }
}
