use abc_editor::diff::{diff as diff_text, render_patches};
use anyhow::{Context, Result};
use clap::Args;
use std::fs;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Original text
    pub old: PathBuf,

    /// Edited text
    pub new: PathBuf,

    /// Output format (patches, json)
    #[arg(short, long, default_value = "patches")]
    pub format: String,
}

pub fn diff(args: DiffArgs, cwd: &str) -> Result<()> {
    let read = |path: &PathBuf| {
        let path = PathBuf::from(cwd).join(path);
        fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))
    };
    let records = diff_text(&read(&args.old)?, &read(&args.new)?);

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        for patch in render_patches(&records) {
            println!("{}", patch);
        }
    }
    Ok(())
}
