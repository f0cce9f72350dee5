//! # Selectors
//!
//! Pure functions from a selection to a new selection over the same tree.
//!
//! All of them are built on the scoped walk: the tree is traversed
//! depth-first from the root, and a node is in scope once its identity is in
//! the input cursor or one of its ancestors was. Since nodes have no parent
//! links, anything a selector needs to know about ancestors (the direct
//! parent, the nearest enclosing chord) is passed down the recursion.

mod chord;
mod delimiters;
mod range;
mod types;

pub use chord::{
    select_all_but_bottom, select_all_but_top, select_bottom, select_nth_from_top, select_top,
};
pub use delimiters::{
    select_around, select_around_chord, select_around_grace_group, select_around_grouping,
    select_around_inline_field, select_inside, select_inside_chord, select_inside_grace_group,
    select_inside_grouping, select_inside_inline_field, Delimiters,
};
pub use range::{select_range, select_ranges};
pub use types::{
    select_bar_lines, select_chord_notes, select_chords, select_grace_groups, select_info_lines,
    select_music, select_non_chord_notes, select_notes, select_rests, select_tune,
};

use crate::cstree::{CsTree, NodeIdx, NodeTag};
use crate::selection::Cursor;
use std::collections::HashSet;

/// A node reached by a scoped walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scoped {
    pub node: NodeIdx,
    pub parent: Option<NodeIdx>,
}

/// Nodes in scope of `cursor`, in document order
pub fn scoped_nodes(tree: &CsTree, cursor: &Cursor) -> Vec<Scoped> {
    let mut out = Vec::new();
    walk_scoped(tree, tree.root(), None, false, cursor, &mut out);
    out
}

fn walk_scoped(
    tree: &CsTree,
    idx: NodeIdx,
    parent: Option<NodeIdx>,
    inherited: bool,
    cursor: &Cursor,
    out: &mut Vec<Scoped>,
) {
    let in_scope = inherited || cursor.contains(&tree.id(idx));
    if in_scope {
        out.push(Scoped { node: idx, parent });
    }
    for child in tree.children(idx) {
        walk_scoped(tree, child, Some(idx), in_scope, cursor, out);
    }
}

/// Nearest `tag` nodes enclosing (or equal to) any in-scope node
///
/// Each enclosing node is reported once, in the order it is first reached.
pub fn enclosing_nodes(tree: &CsTree, cursor: &Cursor, tag: NodeTag) -> Vec<NodeIdx> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    walk_enclosing(
        tree,
        tree.root(),
        None,
        false,
        &EnclosingSearch { cursor, tag },
        &mut seen,
        &mut out,
    );
    out
}

struct EnclosingSearch<'a> {
    cursor: &'a Cursor,
    tag: NodeTag,
}

fn walk_enclosing(
    tree: &CsTree,
    idx: NodeIdx,
    enclosing: Option<NodeIdx>,
    inherited: bool,
    search: &EnclosingSearch<'_>,
    seen: &mut HashSet<NodeIdx>,
    out: &mut Vec<NodeIdx>,
) {
    let enclosing = if tree.tag(idx) == search.tag {
        Some(idx)
    } else {
        enclosing
    };
    let in_scope = inherited || search.cursor.contains(&tree.id(idx));

    if in_scope {
        if let Some(found) = enclosing {
            if seen.insert(found) {
                out.push(found);
            }
        }
    }

    for child in tree.children(idx) {
        walk_enclosing(tree, child, enclosing, in_scope, search, seen, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abc_parser::parse;

    #[test]
    fn test_scope_is_inherited_by_subtree() {
        let tree = CsTree::from_file(&parse("X:1\nK:C\n[CE] D\n").file);
        let chord = tree
            .preorder()
            .into_iter()
            .find(|&idx| tree.tag(idx) == NodeTag::Chord)
            .unwrap();
        let scoped = scoped_nodes(&tree, &Cursor::from([tree.id(chord)]));

        assert_eq!(scoped[0].node, chord);
        assert_eq!(scoped.len(), tree.preorder_from(chord).len());
        assert!(scoped[1..].iter().all(|s| s.parent.is_some()));
    }

    #[test]
    fn test_enclosing_nodes_search_outward() {
        let tree = CsTree::from_file(&parse("X:1\nK:C\n[CE] [DF]\n").file);
        let chords: Vec<NodeIdx> = tree
            .preorder()
            .into_iter()
            .filter(|&idx| tree.tag(idx) == NodeTag::Chord)
            .collect();
        let inner_note = tree
            .preorder_from(chords[1])
            .into_iter()
            .find(|&idx| tree.tag(idx) == NodeTag::Note)
            .unwrap();

        let found = enclosing_nodes(&tree, &Cursor::from([tree.id(inner_note)]), NodeTag::Chord);
        assert_eq!(found, vec![chords[1]]);
    }
}
