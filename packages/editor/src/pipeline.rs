//! # Edit Pipeline
//!
//! Coordinates one edit: Transform → Serialize → Diff → Re-parse → Remap
//!
//! The mutated tree keeps the old identities but its token positions go
//! stale, so after serializing, the new text is parsed again (continuing the
//! document's identity space) and cursors are carried over to the fresh tree,
//! whose positions match the new text.

use crate::cursors::{remap_ordinal, surviving_cursors};
use crate::diff::{diff, to_text_edits, EditRecord, TextEdit};
use crate::position::Range;
use crate::{CsTree, EditorError, Selection, Transform};
use abc_parser::ast::File;
use abc_parser::{parse_with_ids, stringify, IdGenerator};

/// Runs transforms for one document
pub struct EditPipeline {
    ids: IdGenerator,
}

impl EditPipeline {
    /// Continue the identity space of the document's last parse
    pub fn new(ids: IdGenerator) -> Self {
        Self { ids }
    }

    /// Apply `transform` to `tree` and produce the edit for `source`
    ///
    /// `tree` must be the tree of `source`; it is mutated in place. On error
    /// the text is unchanged and no edit is produced.
    pub fn apply(
        &mut self,
        source: &str,
        tree: &mut CsTree,
        selection: &Selection,
        transform: &Transform,
    ) -> Result<EditOutcome, EditorError> {
        // 1. Mutate
        let selection = transform.apply(tree, selection, &mut self.ids)?;

        // 2. Drop identities the transform detached
        let surviving = surviving_cursors(tree, &selection);

        // 3. Serialize
        let new_text = stringify(&tree.to_file()?);

        // 4. Diff against the old text
        let records = diff(source, &new_text);
        let edits = to_text_edits(source, &records);

        // 5. Re-parse so positions match the new text
        let output = parse_with_ids(&new_text, self.ids.clone());
        self.ids = output.ids;
        let fresh = CsTree::from_file(&output.file);

        // 6. Carry cursors over
        let cursors = remap_ordinal(tree, &fresh, &surviving);
        let cursor_ranges = cursor_ranges(&fresh, &cursors);

        tracing::debug!(
            "[Pipeline] {}: {} edit(s), {} cursor(s)",
            transform.name(),
            edits.len(),
            cursors.len()
        );

        Ok(EditOutcome {
            new_text,
            records,
            edits,
            cursors,
            cursor_ranges,
            tree: fresh,
            file: output.file,
        })
    }
}

/// One range per cursor, covering all of its nodes
pub fn cursor_ranges(tree: &CsTree, selection: &Selection) -> Vec<Range> {
    selection
        .cursors
        .iter()
        .filter_map(|cursor| {
            cursor
                .iter()
                .filter_map(|id| tree.span_of(*id))
                .reduce(|acc, span| acc.union(&span))
        })
        .collect()
}

/// Result of one pipeline run
#[derive(Debug, Clone)]
pub struct EditOutcome {
    pub new_text: String,

    /// Raw records, offsets into the old text
    pub records: Vec<EditRecord>,

    /// The same edits in editor coordinates
    pub edits: Vec<TextEdit>,

    /// Cursors over `tree`
    pub cursors: Selection,

    pub cursor_ranges: Vec<Range>,

    /// Tree of `new_text`
    pub tree: CsTree,

    /// AST of `new_text`
    pub file: File,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::apply_records;
    use crate::position::Position;
    use crate::selectors::{select_chords, select_notes};
    use crate::transforms::Duration;
    use abc_parser::parse;

    fn setup(source: &str) -> (CsTree, EditPipeline) {
        let output = parse(source);
        (CsTree::from_file(&output.file), EditPipeline::new(output.ids))
    }

    #[test]
    fn test_transpose_produces_minimal_edits() {
        let source = "X:1\nK:C\nCDE|\n";
        let (mut tree, mut pipeline) = setup(source);
        let notes = select_notes(&tree, &Selection::whole(&tree));

        let outcome = pipeline
            .apply(source, &mut tree, &notes, &Transform::Transpose(2))
            .unwrap();
        assert_eq!(outcome.new_text, "X:1\nK:C\nDE^F|\n");
        assert_eq!(apply_records(source, &outcome.records), outcome.new_text);

        assert_eq!(outcome.cursors.len(), 3);
        assert_eq!(
            outcome.cursor_ranges[2],
            Range::new(Position::new(2, 2), Position::new(2, 4))
        );
    }

    #[test]
    fn test_fresh_tree_uses_new_identities() {
        let source = "X:1\nK:C\nC\n";
        let (mut tree, mut pipeline) = setup(source);
        let old_ids = tree.reachable_ids();
        let whole = Selection::whole(&tree);

        let outcome = pipeline
            .apply(source, &mut tree, &whole, &Transform::SetRhythm(Duration::new(2, 1)))
            .unwrap();
        assert_eq!(outcome.new_text, "X:1\nK:C\nC2\n");
        assert!(outcome
            .tree
            .reachable_ids()
            .iter()
            .all(|id| !old_ids.contains(id)));
        assert_eq!(outcome.cursors.root, outcome.tree.root_id());
    }

    #[test]
    fn test_failed_transform_produces_no_edit() {
        let source = "X:1\nK:C\nC\n";
        let (mut tree, mut pipeline) = setup(source);
        let whole = Selection::whole(&tree);

        let result = pipeline.apply(source, &mut tree, &whole, &Transform::MultiplyRhythm(0));
        assert!(matches!(result, Err(EditorError::Transform(_))));
        assert_eq!(stringify(&tree.to_file().unwrap()), source);
    }

    #[test]
    fn test_overflowing_transforms_leave_text_alone() {
        let long_slashes = format!("X:1\nK:C\nC{} D\n", "/".repeat(31));
        let cases = [
            ("X:1\nK:C\nC2147483647 D\n", Transform::AddToRhythm(Duration::new(1, 1))),
            ("X:1\nK:C\nC2147483647 D\n", Transform::MultiplyRhythm(3)),
            (long_slashes.as_str(), Transform::SetRhythm(Duration::new(2, 1))),
            ("X:1\nK:C\nC D\n", Transform::Transpose(i32::MAX)),
            ("X:1\nK:C\nC D\n", Transform::Transpose(i32::MIN)),
        ];

        for (source, transform) in cases {
            let (mut tree, mut pipeline) = setup(source);
            let whole = Selection::whole(&tree);
            let result = pipeline.apply(source, &mut tree, &whole, &transform);
            assert!(
                matches!(result, Err(EditorError::Transform(_))),
                "{:?} on {:?}",
                transform,
                source
            );
            assert_eq!(stringify(&tree.to_file().unwrap()), source);
        }
    }

    #[test]
    fn test_unwrap_keeps_cursor_on_element() {
        let source = "X:1\nK:C\n[C]2 D\n";
        let (mut tree, mut pipeline) = setup(source);
        let chords = select_chords(&tree, &Selection::whole(&tree));

        let outcome = pipeline
            .apply(source, &mut tree, &chords, &Transform::UnwrapSingle)
            .unwrap();
        assert_eq!(outcome.new_text, "X:1\nK:C\nC2 D\n");
        assert_eq!(
            outcome.cursor_ranges,
            vec![Range::new(Position::new(2, 0), Position::new(2, 2))]
        );
    }
}
