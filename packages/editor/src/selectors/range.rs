use crate::cstree::{CsTree, NodeIdx};
use crate::position::Range;
use crate::selection::{Cursor, Selection};

/// Largest in-scope nodes whose span lies within `range`
///
/// Spans and `range` are half-open, so a node starting exactly at
/// `range.end` is never selected. Each input cursor yields at most one
/// output cursor.
pub fn select_range(tree: &CsTree, selection: &Selection, range: Range) -> Selection {
    let cursors = selection
        .cursors
        .iter()
        .filter_map(|cursor| {
            let mut found = Cursor::new();
            collect_contained(tree, tree.root(), false, cursor, &range, &mut found);
            (!found.is_empty()).then_some(found)
        })
        .collect();
    selection.with_cursors(cursors)
}

/// One cursor per editor range, each searched over the whole tree
pub fn select_ranges(tree: &CsTree, ranges: &[Range]) -> Selection {
    let whole = Selection::whole(tree);
    let cursors = ranges
        .iter()
        .flat_map(|range| select_range(tree, &whole, *range).cursors)
        .collect();
    whole.with_cursors(cursors)
}

fn collect_contained(
    tree: &CsTree,
    idx: NodeIdx,
    inherited: bool,
    cursor: &Cursor,
    range: &Range,
    found: &mut Cursor,
) {
    let in_scope = inherited || cursor.contains(&tree.id(idx));
    if in_scope {
        if let Some(span) = tree.span(idx) {
            if range.contains_range(&span) {
                found.insert(tree.id(idx));
                return;
            }
        }
    }
    for child in tree.children(idx) {
        collect_contained(tree, child, in_scope, cursor, range, found);
    }
}
