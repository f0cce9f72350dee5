//! Fan-out selectors: one singleton cursor per matching node in scope

use super::{scoped_nodes, Scoped};
use crate::cstree::{CsTree, NodeTag};
use crate::selection::{Cursor, Selection};

fn fan_out<P>(tree: &CsTree, selection: &Selection, predicate: P) -> Selection
where
    P: Fn(&CsTree, Scoped) -> bool,
{
    let cursors = selection
        .cursors
        .iter()
        .flat_map(|cursor| {
            scoped_nodes(tree, cursor)
                .into_iter()
                .filter(|&scoped| predicate(tree, scoped))
                .map(|scoped| Cursor::from([tree.id(scoped.node)]))
                .collect::<Vec<_>>()
        })
        .collect();
    selection.with_cursors(cursors)
}

fn has_tag(tag: NodeTag) -> impl Fn(&CsTree, Scoped) -> bool {
    move |tree, scoped| tree.tag(scoped.node) == tag
}

fn parent_is_chord(tree: &CsTree, scoped: Scoped) -> bool {
    scoped
        .parent
        .map(|parent| tree.tag(parent) == NodeTag::Chord)
        .unwrap_or(false)
}

pub fn select_chords(tree: &CsTree, selection: &Selection) -> Selection {
    fan_out(tree, selection, has_tag(NodeTag::Chord))
}

/// Every note, including notes inside chords and grace groups
pub fn select_notes(tree: &CsTree, selection: &Selection) -> Selection {
    fan_out(tree, selection, has_tag(NodeTag::Note))
}

/// Notes that are not direct members of a chord
pub fn select_non_chord_notes(tree: &CsTree, selection: &Selection) -> Selection {
    fan_out(tree, selection, |tree, scoped| {
        tree.tag(scoped.node) == NodeTag::Note && !parent_is_chord(tree, scoped)
    })
}

/// Notes that are direct members of a chord
pub fn select_chord_notes(tree: &CsTree, selection: &Selection) -> Selection {
    fan_out(tree, selection, |tree, scoped| {
        tree.tag(scoped.node) == NodeTag::Note && parent_is_chord(tree, scoped)
    })
}

pub fn select_rests(tree: &CsTree, selection: &Selection) -> Selection {
    fan_out(tree, selection, has_tag(NodeTag::Rest))
}

pub fn select_bar_lines(tree: &CsTree, selection: &Selection) -> Selection {
    fan_out(tree, selection, has_tag(NodeTag::BarLine))
}

/// Notes, chords and rests, treating a chord as one element
pub fn select_music(tree: &CsTree, selection: &Selection) -> Selection {
    fan_out(tree, selection, |tree, scoped| match tree.tag(scoped.node) {
        NodeTag::Chord | NodeTag::Rest => true,
        NodeTag::Note => !parent_is_chord(tree, scoped),
        _ => false,
    })
}

pub fn select_grace_groups(tree: &CsTree, selection: &Selection) -> Selection {
    fan_out(tree, selection, has_tag(NodeTag::GraceGroup))
}

pub fn select_info_lines(tree: &CsTree, selection: &Selection) -> Selection {
    fan_out(tree, selection, has_tag(NodeTag::InfoLine))
}

pub fn select_tune(tree: &CsTree, selection: &Selection) -> Selection {
    fan_out(tree, selection, has_tag(NodeTag::Tune))
}
