//! # Transforms
//!
//! Semantic rewrites of the tree under a selection.
//!
//! ## Semantics
//!
//! - Transforms mutate the tree in place and return the selection to carry
//!   forward (usually the input, filtered when nodes were removed).
//! - Fresh nodes take identities from the document's [`IdGenerator`].
//! - Nodes outside the selection's scope are never touched.
//! - Arguments are validated before any mutation, so a failing transform
//!   leaves the tree as it was.

mod pitch;
mod rhythm;
mod structure;
mod voice;

pub use pitch::{enharmonize, transpose, Spelling};
pub use rhythm::{
    add_to_rhythm, divide_rhythm, multiply_rhythm, set_rhythm, Duration,
};
pub use structure::{remove, to_rest, unwrap_single};
pub use voice::{add_voice, VoiceParams};

use crate::cstree::{CsTree, NodeIdx, NodeTag, TokenData};
use crate::errors::TransformError;
use crate::selection::Selection;
use abc_parser::{IdGenerator, TokenKind};
use std::collections::HashSet;

/// A transform with its arguments
#[derive(Debug, Clone, PartialEq)]
pub enum Transform {
    Transpose(i32),
    Enharmonize,
    SetRhythm(Duration),
    AddToRhythm(Duration),
    MultiplyRhythm(i32),
    DivideRhythm(i32),
    ToRest,
    UnwrapSingle,
    Remove,
    AddVoice { id: String, params: VoiceParams },
}

impl Transform {
    pub fn name(&self) -> &'static str {
        match self {
            Transform::Transpose(_) => "transpose",
            Transform::Enharmonize => "enharmonize",
            Transform::SetRhythm(_) => "setRhythm",
            Transform::AddToRhythm(_) => "addToRhythm",
            Transform::MultiplyRhythm(_) => "multiplyRhythm",
            Transform::DivideRhythm(_) => "divideRhythm",
            Transform::ToRest => "toRest",
            Transform::UnwrapSingle => "unwrapSingle",
            Transform::Remove => "remove",
            Transform::AddVoice { .. } => "addVoice",
        }
    }

    pub fn apply(
        &self,
        tree: &mut CsTree,
        selection: &Selection,
        ids: &mut IdGenerator,
    ) -> Result<Selection, TransformError> {
        tracing::debug!(
            "[Transform] {} over {} cursor(s)",
            self.name(),
            selection.len()
        );
        match self {
            Transform::Transpose(semitones) => transpose(tree, selection, ids, *semitones),
            Transform::Enharmonize => enharmonize(tree, selection, ids),
            Transform::SetRhythm(value) => set_rhythm(tree, selection, ids, *value),
            Transform::AddToRhythm(delta) => add_to_rhythm(tree, selection, ids, *delta),
            Transform::MultiplyRhythm(factor) => multiply_rhythm(tree, selection, ids, *factor),
            Transform::DivideRhythm(divisor) => divide_rhythm(tree, selection, ids, *divisor),
            Transform::ToRest => to_rest(tree, selection, ids),
            Transform::UnwrapSingle => unwrap_single(tree, selection),
            Transform::Remove => remove(tree, selection),
            Transform::AddVoice { id, params } => add_voice(tree, selection, ids, id, params),
        }
    }
}

/// An element picked by [`element_targets`], with its direct parent
#[derive(Debug, Clone, Copy)]
pub(crate) struct Target {
    pub node: NodeIdx,
    pub parent: Option<NodeIdx>,
}

/// In-scope nodes with one of `tags`, without descending into a match
///
/// A chord in scope is one target; a note inside a chord is only a target
/// when the note itself is in scope and the chord is not. Each node appears
/// once, in the order first reached.
pub(crate) fn element_targets(
    tree: &CsTree,
    selection: &Selection,
    tags: &[NodeTag],
) -> Vec<Target> {
    let mut seen = HashSet::new();
    let mut targets = Vec::new();
    for cursor in &selection.cursors {
        let mut stack = vec![(tree.root(), None, false)];
        while let Some((idx, parent, inherited)) = stack.pop() {
            let in_scope = inherited || cursor.contains(&tree.id(idx));
            if in_scope && tags.contains(&tree.tag(idx)) {
                if seen.insert(idx) {
                    targets.push(Target { node: idx, parent });
                }
                continue;
            }
            let children = tree.child_vec(idx);
            for child in children.into_iter().rev() {
                stack.push((child, Some(idx), in_scope));
            }
        }
    }
    targets
}

/// Allocate a token with a fresh identity, positioned at `near`
pub(crate) fn new_token(
    tree: &mut CsTree,
    ids: &mut IdGenerator,
    kind: TokenKind,
    lexeme: impl Into<String>,
    near: Option<&TokenData>,
) -> NodeIdx {
    let (line, column) = near.map(|data| (data.line, data.column)).unwrap_or((0, 0));
    tree.alloc_token(
        ids.new_id(),
        TokenData {
            lexeme: lexeme.into(),
            kind,
            line,
            column,
        },
    )
}

/// Position data of the leftmost token under `idx`
pub(crate) fn anchor(tree: &CsTree, idx: NodeIdx) -> Option<TokenData> {
    tree.leftmost_token(idx).cloned()
}
