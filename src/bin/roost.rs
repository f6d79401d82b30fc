use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use arrrg::CommandLine;
use arrrg_derive::CommandLine;
use handled::Handle;

use roost::cli_utils::{
    exit_with_error, exit_with_usage_error, print_diagnostic, read_console_line,
};
use roost::{Console, FileStore, Journal, ObjectStore, Reply};

#[derive(CommandLine, Default, PartialEq, Eq)]
struct Args {
    #[arrrg(optional, "Path to the JSON object store")]
    file: Option<String>,
    #[arrrg(optional, "Path to a JSONL journal of every mutation")]
    journal: Option<String>,
    #[arrrg(flag, "Enable verbose logging")]
    verbose: bool,
}

const USAGE: &str = "USAGE: roost [OPTIONS]";

const PROMPT: &str = "(roost) ";

const HELP_TEXT: &str = r#"roost - command console over a file-backed object store

USAGE:
    roost [OPTIONS]

OPTIONS:
    --file <PATH>       Path to the JSON object store [default: file.json]
    --journal <PATH>    Path to a JSONL journal of every mutation [default: none]
    --verbose           Enable verbose logging

DESCRIPTION:
    Reads one command per line from stdin. The store is loaded at startup
    and rewritten after every create, destroy, and update.

    Every command except create also accepts the dot-call form
    <class>.<command>(<args>).

COMMANDS:
    create <class>                               Create a record and print its id
    show <class> <id>                            Print a record
    destroy <class> <id>                         Delete a record
    all [<class>]                                Print every record, or every record of a class
    count <class>                                Print the number of records of a class
    update <class> <id> <name> <value>           Assign one attribute
    update <class> <id> {<name>: <value>, ...}   Assign several attributes
    help [<command>]                             List commands or show one command's usage
    quit                                         Exit

CLASSES:
    BaseModel, User, State, City, Amenity, Place, Review"#;

struct ConsoleConfig {
    store_path: PathBuf,
    journal_path: Option<PathBuf>,
    verbose: bool,
}

impl ConsoleConfig {
    fn from_args(args: Args) -> Self {
        Self {
            store_path: args
                .file
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("file.json")),
            journal_path: args.journal.map(PathBuf::from),
            verbose: args.verbose,
        }
    }
}

fn main() {
    let (args, free) = Args::from_command_line(USAGE);

    if !free.is_empty() {
        if free[0] == "help" {
            println!("{}", HELP_TEXT);
            return;
        }
        exit_with_usage_error(&format!("unexpected argument '{}'", free[0]), USAGE);
    }

    let config = ConsoleConfig::from_args(args);

    if config.verbose {
        eprintln!("roost starting with configuration:");
        eprintln!("  Store: {}", config.store_path.display());
        match &config.journal_path {
            Some(path) => eprintln!("  Journal: {}", path.display()),
            None => eprintln!("  Journal: disabled"),
        }
    }

    let (store, report) = match FileStore::open(&config.store_path) {
        Ok(opened) => opened,
        Err(e) => exit_with_error(&format!(
            "Failed to load {}: {}",
            config.store_path.display(),
            e
        )),
    };
    if config.verbose || report.skipped > 0 {
        eprintln!("{}", report);
    }

    let mut console = Console::new(store);
    if let Some(path) = &config.journal_path {
        console = console.with_journal(Journal::new(path));
    }

    let interactive = io::stdin().is_terminal();
    let mut input = io::stdin().lock();
    let mut buffer = Vec::new();
    loop {
        if interactive {
            print!("{}", PROMPT);
            io::stdout().flush().ok();
        }

        // End of input behaves as EOF.
        let line = match read_console_line(&mut input, &mut buffer) {
            Ok(Some(line)) => line,
            Ok(None) => "EOF".to_string(),
            Err(e) => exit_with_error(&format!("Failed to read input: {}", e)),
        };

        match console.execute(&line) {
            Ok(Reply::Silent) => {}
            Ok(Reply::Output(text)) => println!("{}", text),
            Ok(Reply::Exit(farewell)) => {
                if let Some(text) = farewell {
                    println!("{}", text);
                }
                break;
            }
            Err(e) => {
                if let Some(user_error) = e.handle() {
                    print_diagnostic(&user_error, config.verbose);
                }
            }
        }
    }

    if config.verbose {
        eprintln!(
            "roost stopped with {} records in {}",
            console.store().all().len(),
            config.store_path.display()
        );
    }
}
