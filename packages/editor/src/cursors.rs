//! Cursor preservation across an edit
//!
//! After a transform the mutated tree still holds the old identities, but its
//! token positions no longer match the new text. The pipeline re-parses the
//! new text and carries cursors over to the fresh tree by ordinal
//! correspondence: the Nth music element of the old tree is taken to be the
//! Nth music element of the new one, and the Nth bar line the Nth bar line.
//! That only holds while a transform keeps the count and order of elements;
//! when music counts differ the remap is best-effort.

use crate::cstree::{CsTree, NodeIdx, NodeTag};
use crate::selection::{Cursor, Selection};
use abc_parser::NodeId;
use std::collections::HashMap;

/// Intersect every cursor with the identities still reachable from the root
///
/// Cursors left empty are dropped.
pub fn surviving_cursors(tree: &CsTree, selection: &Selection) -> Selection {
    let reachable = tree.reachable_ids();
    let cursors = selection
        .cursors
        .iter()
        .map(|cursor| {
            cursor
                .iter()
                .copied()
                .filter(|id| reachable.contains(id))
                .collect::<Cursor>()
        })
        .filter(|cursor| !cursor.is_empty())
        .collect();
    selection.with_cursors(cursors)
}

/// Ordinal class of a node
///
/// Notes, chords and rests share one class at element level. Anything
/// nested inside one of them (chord members, pitches, rhythms) is counted
/// apart, so edits inside a chord do not shift the elements around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct OrdinalClass {
    tag: NodeTag,
    nested: bool,
}

const MUSIC: OrdinalClass = OrdinalClass {
    tag: NodeTag::Note,
    nested: false,
};

fn is_music(tag: NodeTag) -> bool {
    matches!(tag, NodeTag::Note | NodeTag::Chord | NodeTag::Rest)
}

/// Per class, the non-token nodes in document order
fn ordinals(tree: &CsTree) -> HashMap<OrdinalClass, Vec<NodeId>> {
    let mut out: HashMap<OrdinalClass, Vec<NodeId>> = HashMap::new();
    collect_ordinals(tree, tree.root(), false, &mut out);
    out
}

fn collect_ordinals(
    tree: &CsTree,
    idx: NodeIdx,
    nested: bool,
    out: &mut HashMap<OrdinalClass, Vec<NodeId>>,
) {
    let tag = tree.tag(idx);
    if tag == NodeTag::Token {
        return;
    }
    let class = OrdinalClass {
        tag: if is_music(tag) { NodeTag::Note } else { tag },
        nested,
    };
    out.entry(class).or_default().push(tree.id(idx));
    for child in tree.children(idx) {
        collect_ordinals(tree, child, nested || is_music(tag), out);
    }
}

/// Map cursors over `old` onto the equivalent nodes of `new`
///
/// Identities with no counterpart are dropped, and so are cursors left
/// empty.
pub fn remap_ordinal(old: &CsTree, new: &CsTree, selection: &Selection) -> Selection {
    let old_ordinals = ordinals(old);
    let new_ordinals = ordinals(new);

    let old_music = old_ordinals.get(&MUSIC).map_or(0, Vec::len);
    let new_music = new_ordinals.get(&MUSIC).map_or(0, Vec::len);
    if old_music != new_music {
        tracing::warn!(
            "[Cursors] music element count changed from {} to {}, remapping the common prefix only",
            old_music,
            new_music
        );
    }

    let mut mapping: HashMap<NodeId, NodeId> = HashMap::new();
    for (class, old_ids) in &old_ordinals {
        if let Some(new_ids) = new_ordinals.get(class) {
            mapping.extend(old_ids.iter().copied().zip(new_ids.iter().copied()));
        }
    }

    let cursors = selection
        .cursors
        .iter()
        .map(|cursor| {
            cursor
                .iter()
                .filter_map(|id| mapping.get(id).copied())
                .collect::<Cursor>()
        })
        .filter(|cursor| !cursor.is_empty())
        .collect();
    Selection::new(new.root_id(), cursors)
}
