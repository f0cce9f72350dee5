mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{check, diff, select, transform, CheckArgs, DiffArgs, SelectArgs, TransformArgs};
use tracing_subscriber::EnvFilter;

/// ABC notation structural editing from the command line
#[derive(Parser, Debug)]
#[command(name = "abc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the cursors a selector chain picks out
    Select(SelectArgs),

    /// Apply a transform and print or write the result
    Transform(TransformArgs),

    /// Report parse diagnostics and round-trip failures
    Check(CheckArgs),

    /// Print the edit records between two files
    Diff(DiffArgs),
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cwd = match std::env::current_dir() {
        Ok(dir) => dir.to_string_lossy().into_owned(),
        Err(err) => {
            eprintln!("{} {}", "Error:".red().bold(), err);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Select(args) => select(args, &cwd),
        Command::Transform(args) => transform(args, &cwd),
        Command::Check(args) => check(args, &cwd),
        Command::Diff(args) => diff(args, &cwd),
    };

    if let Err(err) = result {
        eprintln!("{} {}", "Error:".red().bold(), err);
        std::process::exit(1);
    }
}
