//! Structural rewrites: notes to rests, single-note chords, removal

use super::{anchor, element_targets, new_token};
use crate::cstree::{CsTree, NodeIdx, NodeTag};
use crate::errors::TransformError;
use crate::selection::{Cursor, Selection};
use abc_parser::{IdGenerator, NodeId, TokenKind};
use std::collections::{HashMap, HashSet};

/// Turn notes and chords into rests of the same duration
///
/// Notes that belong to a chord or grace group are skipped; a rest cannot
/// stand there.
pub fn to_rest(
    tree: &mut CsTree,
    selection: &Selection,
    ids: &mut IdGenerator,
) -> Result<Selection, TransformError> {
    let targets = element_targets(tree, selection, &[NodeTag::Note, NodeTag::Chord]);

    for target in targets {
        let inside_group = target
            .parent
            .map(|parent| matches!(tree.tag(parent), NodeTag::Chord | NodeTag::GraceGroup))
            .unwrap_or(false);
        if inside_group {
            continue;
        }

        let near = anchor(tree, target.node);
        let rhythm = tree.child_with_tag(target.node, NodeTag::Rhythm);
        let rest = new_token(tree, ids, TokenKind::Rest, "z", near.as_ref());

        let mut children = vec![rest];
        children.extend(rhythm);
        tree.node_mut(target.node).tag = NodeTag::Rest;
        tree.set_children(target.node, &children);
    }

    Ok(selection.clone())
}

/// Replace chords holding exactly one note by that note
///
/// The node keeps the chord's identity. The chord's rhythm and tie win over
/// the note's own; annotations and decorations move in front of the note.
pub fn unwrap_single(tree: &mut CsTree, selection: &Selection) -> Result<Selection, TransformError> {
    let targets = element_targets(tree, selection, &[NodeTag::Chord]);

    for target in targets {
        let chord = target.node;
        let children = tree.child_vec(chord);
        let notes: Vec<NodeIdx> = children
            .iter()
            .copied()
            .filter(|&child| tree.tag(child) == NodeTag::Note)
            .collect();
        let [note] = notes.as_slice() else {
            continue;
        };
        let note = *note;
        let Some(pitch) = tree.child_with_tag(note, NodeTag::Pitch) else {
            continue;
        };

        let rhythm = tree
            .child_with_tag(chord, NodeTag::Rhythm)
            .or_else(|| tree.child_with_tag(note, NodeTag::Rhythm));
        let tie = tree
            .token_child(chord, TokenKind::Tie)
            .or_else(|| tree.token_child(note, TokenKind::Tie));

        let carried: Vec<NodeIdx> = children
            .iter()
            .copied()
            .filter(|&child| {
                let node = tree.node(child);
                node.is_token(TokenKind::Annotation)
                    || node.is_token(TokenKind::Decoration)
                    || node.is_token(TokenKind::Symbol)
            })
            .collect();
        if !carried.is_empty() {
            if let Some(parent) = target.parent {
                let mut siblings = tree.child_vec(parent);
                if let Some(position) = siblings.iter().position(|&s| s == chord) {
                    siblings.splice(position..position, carried);
                    tree.set_children(parent, &siblings);
                }
            }
        }

        let mut note_children = vec![pitch];
        note_children.extend(rhythm);
        note_children.extend(tie);
        tree.node_mut(chord).tag = NodeTag::Note;
        tree.set_children(chord, &note_children);
    }

    Ok(selection.clone())
}

/// Detach every node named by a cursor
///
/// Only nodes whose absence still leaves a valid tree are removed: whole
/// elements, optional rhythms and ties, and free-standing tokens. Removed
/// identities are dropped from the returned cursors.
pub fn remove(tree: &mut CsTree, selection: &Selection) -> Result<Selection, TransformError> {
    let wanted = selection.ids();
    let mut doomed: HashMap<NodeIdx, HashSet<NodeIdx>> = HashMap::new();
    let mut removed: HashSet<NodeId> = HashSet::new();

    for parent in tree.preorder() {
        for child in tree.children(parent) {
            let id = tree.id(child);
            if wanted.contains(&id) && is_removable(tree, parent, child) {
                doomed.entry(parent).or_default().insert(child);
                removed.insert(id);
            }
        }
    }

    for (parent, children) in &doomed {
        let kept: Vec<NodeIdx> = tree
            .children(*parent)
            .filter(|child| !children.contains(child))
            .collect();
        tree.set_children(*parent, &kept);
    }
    tracing::debug!("[Transform] removed {} node(s)", removed.len());

    let cursors = selection
        .cursors
        .iter()
        .map(|cursor| {
            cursor
                .iter()
                .copied()
                .filter(|id| !removed.contains(id))
                .collect::<Cursor>()
        })
        .filter(|cursor| !cursor.is_empty())
        .collect();
    Ok(selection.with_cursors(cursors))
}

fn is_removable(tree: &CsTree, parent: NodeIdx, child: NodeIdx) -> bool {
    match tree.tag(child) {
        NodeTag::File | NodeTag::TuneHeader | NodeTag::Pitch => false,
        NodeTag::Token => {
            let node = tree.node(child);
            if node.is_token(TokenKind::Tie) {
                return true;
            }
            let free_parent = matches!(
                tree.tag(parent),
                NodeTag::File
                    | NodeTag::FileHeader
                    | NodeTag::TuneHeader
                    | NodeTag::TuneBody
                    | NodeTag::Chord
                    | NodeTag::GraceGroup
                    | NodeTag::Grouping
            );
            let delimiter = [
                TokenKind::ChordLeftBracket,
                TokenKind::ChordRightBracket,
                TokenKind::GraceGroupLeftBrace,
                TokenKind::GraceGroupRightBrace,
                TokenKind::GroupingLeftParen,
                TokenKind::GroupingRightParen,
            ]
            .into_iter()
            .any(|kind| node.is_token(kind));
            free_parent && !delimiter
        }
        _ => true,
    }
}
