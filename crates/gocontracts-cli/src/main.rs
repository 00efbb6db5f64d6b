use clap::Parser;
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::filter::LevelFilter;

use gocontracts_core::{process_file, process_in_place, Error, ErrorKind};

/// gocontracts - design-by-contract for Go
///
/// Reads the contracts documented on each function of a Go file and keeps
/// the matching pre-condition, preamble and post-condition checks at the top
/// of the function bodies in sync.
#[derive(Parser)]
#[command(name = "gocontracts", version, about, long_about = None)]
struct Cli {
    /// Path to the .go file
    path: PathBuf,

    /// Write the result back to the file instead of printing it
    #[arg(short, long)]
    write: bool,

    /// Remove the generated checks (documentation is left untouched)
    #[arg(short, long)]
    remove: bool,

    /// Print a JSON report
    #[arg(long)]
    json: bool,

    /// Log debug information to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    path: &'a Path,
    #[serde(flatten)]
    outcome: Outcome,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Outcome {
    Success {
        changed: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        output: Option<String>,
    },
    Failure {
        error: ErrorReport,
    },
}

#[derive(Serialize)]
struct ErrorReport {
    kind: ErrorKind,
    message: String,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version land here too
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            process::exit(code);
        }
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose { LevelFilter::DEBUG } else { LevelFilter::WARN })
        .init();

    process::exit(run(&cli));
}

fn run(cli: &Cli) -> i32 {
    let result = if cli.write {
        process_in_place(&cli.path, cli.remove).map(|changed| (changed, None))
    } else {
        process_file(&cli.path, cli.remove).map(|output| (changed_on_disk(&cli.path, &output), Some(output)))
    };

    match (result, cli.json) {
        (Ok((changed, output)), false) => {
            if let Some(output) = output {
                print!("{}", output);
            }
            tracing::debug!(path = %cli.path.display(), changed, "done");
            0
        }
        (Ok((changed, output)), true) => print_report(&Report {
            path: &cli.path,
            outcome: Outcome::Success { changed, output },
        }),
        (Err(e), false) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            1
        }
        (Err(e), true) => {
            print_report(&Report {
                path: &cli.path,
                outcome: Outcome::Failure { error: error_report(&e) },
            });
            1
        }
    }
}

/// Whether `output` differs from what is currently stored at `path`.
fn changed_on_disk(path: &Path, output: &str) -> bool {
    std::fs::read_to_string(path).map_or(true, |current| current != output)
}

fn error_report(e: &Error) -> ErrorReport {
    ErrorReport {
        kind: e.kind(),
        message: e.to_string(),
    }
}

fn print_report(report: &Report<'_>) -> i32 {
    match serde_json::to_string_pretty(report) {
        Ok(json) => {
            println!("{}", json);
            0
        }
        Err(e) => {
            eprintln!("{} failed to serialize the report: {}", "error:".red().bold(), e);
            1
        }
    }
}
