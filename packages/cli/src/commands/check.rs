use abc_parser::{format_errors, parse, stringify, ParseOutput};
use abc_workspace::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// ABC file or directory to check
    pub input: PathBuf,

    /// Print a line for files without problems too
    #[arg(short, long)]
    pub verbose: bool,

    /// Extensions to collect from directories; overrides `fileExtensions`
    #[arg(short, long = "extension")]
    pub extensions: Vec<String>,
}

/// Problems found in one file
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FileReport {
    pub diagnostics: usize,
    pub roundtrip_ok: bool,
}

pub fn check(args: CheckArgs, cwd: &str) -> Result<()> {
    let input = PathBuf::from(cwd).join(&args.input);
    let mut config = Config::load(Path::new(cwd))?;
    if !args.extensions.is_empty() {
        config.file_extensions = args.extensions.clone();
    }

    let files = if input.is_file() {
        vec![input.clone()]
    } else if input.is_dir() {
        find_abc_files(&input, &config)
    } else {
        return Err(anyhow::anyhow!(
            "Input path does not exist: {}",
            input.display()
        ));
    };

    let mut failed = 0;
    for file in &files {
        let report = check_file(file, args.verbose)?;
        if report.diagnostics > 0 || !report.roundtrip_ok {
            failed += 1;
        }
    }

    println!();
    println!("   Files checked: {}", files.len());
    if failed > 0 {
        println!("   {} {}", "Failed:".red(), failed);
        std::process::exit(1);
    }
    println!("   {} No issues found!", "✓".green());
    Ok(())
}

/// Parse `path`, print its diagnostics and confirm it prints back unchanged
pub fn check_file(path: &Path, verbose: bool) -> Result<FileReport> {
    let source = fs::read_to_string(path)?;
    let output = parse(&source);
    let report = report_for(&source, &output);

    if !output.errors.is_empty() {
        eprint!(
            "{}",
            format_errors(&source, &path.to_string_lossy(), &output.errors)
        );
    }
    if !report.roundtrip_ok {
        eprintln!(
            "{} {} does not print back to its source",
            "✗".red(),
            path.display()
        );
    } else if verbose && report.diagnostics == 0 {
        println!("{} {}", "✓".green(), path.display());
    }
    Ok(report)
}

fn report_for(source: &str, output: &ParseOutput) -> FileReport {
    FileReport {
        diagnostics: output.errors.len(),
        roundtrip_ok: stringify(&output.file) == source,
    }
}

fn find_abc_files(dir: &Path, config: &Config) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && config.accepts(&e.path().to_string_lossy()))
        .map(|e| e.path().to_path_buf())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_source() {
        let source = "X:1\nT:Scale\nK:C\nCDEF GABc|\n";
        let report = report_for(source, &parse(source));
        assert_eq!(
            report,
            FileReport {
                diagnostics: 0,
                roundtrip_ok: true
            }
        );
    }

    #[test]
    fn test_find_abc_files_uses_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.abc"), "X:1\nK:C\nC\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("b.abc"), "X:2\nK:G\nG\n").unwrap();

        let files = find_abc_files(dir.path(), &Config::default());
        assert_eq!(files.len(), 2);
    }
}
