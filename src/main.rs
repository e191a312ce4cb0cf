use docopt::Docopt;
use serde::Deserialize;
use std::fmt::Display;
use std::fs::File;
use std::io;
use tracing::{debug, Level};

use libmt94x::parser::read_statements;
use libmt94x::statement::Statement;

const USAGE: &str = "
MT940/MT942 Statement Reader

Usage:
  mt94x statements <file> [--compact] [--verbose]
  mt94x balances <file> [--verbose]
  mt94x (-h | --help)
  mt94x --version

Options:
  -h --help                         Show this screen.
  --version                         Show version.
  --compact                         Print JSON on a single line.
  --verbose                         Log parsing details to stderr.

Use - as <file> to read from stdin.
";

#[derive(Debug, Deserialize)]
struct Args {
    cmd_statements: bool,
    cmd_balances: bool,
    arg_file: String,
    flag_compact: bool,
    flag_verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Args = Docopt::new(USAGE)
        .map(|d| d.version(Some(env!("CARGO_PKG_VERSION").to_string())))
        .and_then(|d| d.deserialize())
        .unwrap_or_else(|e| e.exit());

    tracing_subscriber::fmt()
        .with_max_level(if args.flag_verbose {
            Level::DEBUG
        } else {
            Level::WARN
        })
        .with_writer(io::stderr)
        .init();

    let statements = load_statements(&args.arg_file)?;
    debug!("read {} statements from {}", statements.len(), args.arg_file);

    if args.cmd_statements {
        show_statements(&statements, args.flag_compact)?;
    }

    if args.cmd_balances {
        show_balances(&statements);
    }

    Ok(())
}

fn load_statements(filename: &str) -> Result<Vec<Statement>, Box<dyn std::error::Error>> {
    let statements = if filename == "-" {
        read_statements(io::stdin())?
    } else {
        read_statements(File::open(filename)?)?
    };
    Ok(statements)
}

fn show_statements(statements: &[Statement], compact: bool) -> Result<(), Box<dyn std::error::Error>> {
    let j = if compact {
        serde_json::to_string(statements)?
    } else {
        serde_json::to_string_pretty(statements)?
    };
    println!("{}", j);
    Ok(())
}

fn show_balances(statements: &[Statement]) {
    println!("reference,account,currency,opening,closing,closing_available,forward_available");
    for statement in statements {
        println!(
            "{},{},{},{},{},{},{}",
            statement.transaction_reference(),
            statement.account_identification(),
            statement.currency().unwrap_or("-"),
            or_dash(statement.opening_balance()),
            or_dash(statement.closing_balance()),
            or_dash(statement.closing_available_balance()),
            or_dash(statement.forward_available_balance()),
        );
    }
}

fn or_dash<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}
