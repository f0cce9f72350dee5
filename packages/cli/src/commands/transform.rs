use super::{load_file, parse_json_args, run_selector_chain};
use abc_editor::diff::render_patches;
use abc_editor::EditPipeline;
use abc_workspace::lookup_transform;
use anyhow::{anyhow, Context, Result};
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct TransformArgs {
    /// ABC file to edit
    pub file: PathBuf,

    /// Transform name, e.g. `transpose`
    pub transform: String,

    /// Transform arguments as a JSON array, e.g. `[2]`
    #[arg(short, long)]
    pub args: Option<String>,

    /// Selectors narrowing the edit; the whole file when omitted
    #[arg(short, long, num_args = 1..)]
    pub select: Vec<String>,

    /// Write the result back to the file
    #[arg(short, long)]
    pub write: bool,

    /// Print the patch list instead of the new text
    #[arg(short, long)]
    pub patches: bool,
}

pub fn transform(args: TransformArgs, cwd: &str) -> Result<()> {
    let path = PathBuf::from(cwd).join(&args.file);
    let loaded = load_file(&path)?;

    let entry = lookup_transform(&args.transform)
        .ok_or_else(|| anyhow!("Unknown transform: {}", args.transform))?;
    let transform = entry
        .transform(&parse_json_args(args.args.as_deref())?)
        .map_err(|e| anyhow!("{}", e.message))?;

    let selection = run_selector_chain(&loaded.tree, &args.select)?;
    let mut tree = loaded.tree;
    let mut pipeline = EditPipeline::new(loaded.output.ids);
    let outcome = pipeline.apply(&loaded.text, &mut tree, &selection, &transform)?;

    if args.patches {
        for patch in render_patches(&outcome.records) {
            println!("{}", patch);
        }
    } else if !args.write {
        print!("{}", outcome.new_text);
    }

    if args.write {
        if outcome.records.is_empty() {
            println!("{} {} unchanged", "✓".green(), args.file.display());
        } else {
            fs::write(&path, &outcome.new_text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "{} {} ({} edit(s))",
                "✓".green(),
                args.file.display(),
                outcome.records.len()
            );
        }
    }
    Ok(())
}
