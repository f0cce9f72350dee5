pub mod check;
pub mod diff;
pub mod select;
pub mod transform;

pub use check::{check, CheckArgs};
pub use diff::{diff, DiffArgs};
pub use select::{select, SelectArgs};
pub use transform::{transform, TransformArgs};

use abc_editor::{CsTree, Selection};
use abc_parser::{parse, ParseOutput};
use abc_workspace::lookup_selector;
use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// A file read from disk with its parse and tree
pub struct LoadedFile {
    pub text: String,
    pub output: ParseOutput,
    pub tree: CsTree,
}

pub fn load_file(path: &Path) -> Result<LoadedFile> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let output = parse(&text);
    let tree = CsTree::from_file(&output.file);
    Ok(LoadedFile { text, output, tree })
}

/// Arguments given as a JSON array, e.g. `[2]` or `["T1", {}]`
pub fn parse_json_args(raw: Option<&str>) -> Result<Vec<Value>> {
    match raw {
        None => Ok(Vec::new()),
        Some(raw) => match serde_json::from_str(raw)? {
            Value::Array(values) => Ok(values),
            other => Ok(vec![other]),
        },
    }
}

/// Run selectors left to right, starting from the whole file
///
/// Each step is a selector name, optionally with JSON arguments after a
/// colon: `selectChords`, `selectNthFromTop:[1]`.
pub fn run_selector_chain(tree: &CsTree, chain: &[String]) -> Result<Selection> {
    let mut selection = Selection::whole(tree);
    for step in chain {
        let (name, args) = match step.split_once(':') {
            Some((name, args)) => (name, Some(args)),
            None => (step.as_str(), None),
        };
        let entry = lookup_selector(name).ok_or_else(|| anyhow!("Unknown selector: {}", name))?;
        let args = parse_json_args(args)?;
        selection = entry
            .apply(tree, &selection, &args)
            .map_err(|e| anyhow!("{}", e.message))?;
    }
    Ok(selection)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_args() {
        assert!(parse_json_args(None).unwrap().is_empty());
        assert_eq!(parse_json_args(Some("[2]")).unwrap(), vec![Value::from(2)]);
        assert_eq!(parse_json_args(Some("-3")).unwrap(), vec![Value::from(-3)]);
        assert!(parse_json_args(Some("[")).is_err());
    }

    #[test]
    fn test_selector_chain() {
        let tree = CsTree::from_file(&parse("X:1\nK:C\n[CEG] [DF] A\n").file);
        let chain = vec!["selectChords".to_string(), "selectNthFromTop:[1]".to_string()];
        let selection = run_selector_chain(&tree, &chain).unwrap();
        assert_eq!(selection.len(), 2);

        let unknown = run_selector_chain(&tree, &["selectEverything".to_string()]);
        assert!(unknown.is_err());
    }
}
