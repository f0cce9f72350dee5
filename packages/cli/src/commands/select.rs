use super::{load_file, run_selector_chain};
use abc_editor::cursor_ranges;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde_json::json;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct SelectArgs {
    /// ABC file to read
    pub file: PathBuf,

    /// Selectors applied left to right, e.g. `selectChords selectNthFromTop:[1]`
    #[arg(required = true)]
    pub selectors: Vec<String>,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

pub fn select(args: SelectArgs, cwd: &str) -> Result<()> {
    let path = PathBuf::from(cwd).join(&args.file);
    let loaded = load_file(&path)?;
    let selection = run_selector_chain(&loaded.tree, &args.selectors)?;
    let ranges = cursor_ranges(&loaded.tree, &selection);

    if args.format == "json" {
        let cursors: Vec<Vec<_>> = selection
            .cursors
            .iter()
            .map(|cursor| cursor.iter().copied().collect())
            .collect();
        let output = json!({ "cursorNodeIds": cursors, "ranges": ranges });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "{} {} cursor(s) in {}",
        "✓".green(),
        selection.len(),
        args.file.display()
    );
    for range in ranges {
        // Editor positions are zero-based; print them one-based
        println!(
            "   {}:{}-{}:{}",
            range.start.line + 1,
            range.start.character + 1,
            range.end.line + 1,
            range.end.character + 1
        );
    }
    Ok(())
}
