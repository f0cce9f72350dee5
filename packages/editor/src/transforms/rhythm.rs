//! Duration rewrites
//!
//! Durations are multiples of the tune's unit note length. A unit duration
//! is written as no rhythm at all; an existing broken-rhythm marker (`>`,
//! `<`) survives every rewrite.

use super::{anchor, element_targets, new_token, Target};
use crate::cstree::{CsTree, NodeIdx, NodeTag};
use crate::errors::TransformError;
use crate::selection::Selection;
use abc_parser::{IdGenerator, TokenKind};
use num_rational::{Rational32, Rational64};

pub type Duration = Rational32;

const RHYTHM_TARGETS: [NodeTag; 3] = [NodeTag::Note, NodeTag::Rest, NodeTag::Chord];

/// Read the duration written by a rhythm node (unit when absent)
///
/// Lengths that do not fit a `Duration` are an error rather than being
/// guessed at, so a rewrite never silently changes them.
pub fn read_duration(tree: &CsTree, rhythm: Option<NodeIdx>) -> Result<Duration, TransformError> {
    let Some(rhythm) = rhythm else {
        return Ok(Duration::from_integer(1));
    };
    let out_of_range = || {
        TransformError::InvalidArgument(format!(
            "rhythm of node {} is out of range",
            tree.id(rhythm)
        ))
    };
    let number = |kind| -> Result<Option<i32>, TransformError> {
        match tree.token_child(rhythm, kind).and_then(|idx| tree.node(idx).lexeme()) {
            Some(lexeme) => lexeme.parse::<i32>().map(Some).map_err(|_| out_of_range()),
            None => Ok(None),
        }
    };

    let numerator = number(TokenKind::RhythmNumerator)?.unwrap_or(1);
    let denominator = match tree.token_child(rhythm, TokenKind::RhythmSeparator) {
        None => 1,
        Some(separator) => match number(TokenKind::RhythmDenominator)? {
            Some(denominator) => denominator,
            // Each bare slash halves the duration
            None => {
                let slashes = tree.node(separator).lexeme().map(str::len).unwrap_or(1);
                u32::try_from(slashes)
                    .ok()
                    .and_then(|slashes| 2i32.checked_pow(slashes))
                    .ok_or_else(out_of_range)?
            }
        },
    };

    if denominator == 0 {
        return Ok(Duration::from_integer(numerator));
    }
    Ok(Duration::new(numerator, denominator))
}

fn widen(duration: Duration) -> Rational64 {
    Rational64::new(i64::from(*duration.numer()), i64::from(*duration.denom()))
}

/// Back to a `Duration`, or `None` when either part overflows
fn narrow(wide: Rational64) -> Option<Duration> {
    let numerator = i32::try_from(*wide.numer()).ok()?;
    let denominator = i32::try_from(*wide.denom()).ok()?;
    Some(Duration::new(numerator, denominator))
}

/// Canonical tokens for a duration: `2`, `/`, `3/`, `/4`, `3/4`
pub fn render_duration(duration: Duration) -> Vec<(TokenKind, String)> {
    let numerator = *duration.numer();
    let denominator = *duration.denom();
    let mut tokens = Vec::new();

    if denominator == 1 {
        if numerator != 1 {
            tokens.push((TokenKind::RhythmNumerator, numerator.to_string()));
        }
        return tokens;
    }

    if numerator != 1 {
        tokens.push((TokenKind::RhythmNumerator, numerator.to_string()));
    }
    tokens.push((TokenKind::RhythmSeparator, "/".to_string()));
    if denominator != 2 {
        tokens.push((TokenKind::RhythmDenominator, denominator.to_string()));
    }
    tokens
}

/// Rewrite the rhythm of `target` to `duration`
fn write_duration(tree: &mut CsTree, ids: &mut IdGenerator, target: NodeIdx, duration: Duration) {
    let existing = tree.child_with_tag(target, NodeTag::Rhythm);
    let broken = existing.and_then(|rhythm| tree.token_child(rhythm, TokenKind::BrokenRhythm));
    let rendered = render_duration(duration);
    let mut children = tree.child_vec(target);

    if rendered.is_empty() && broken.is_none() {
        if let Some(rhythm) = existing {
            children.retain(|&child| child != rhythm);
            tree.set_children(target, &children);
        }
        return;
    }

    let near = anchor(tree, target);
    let mut rhythm_children: Vec<NodeIdx> = rendered
        .into_iter()
        .map(|(kind, lexeme)| new_token(tree, ids, kind, lexeme, near.as_ref()))
        .collect();
    rhythm_children.extend(broken);

    match existing {
        Some(rhythm) => tree.set_children(rhythm, &rhythm_children),
        None => {
            let rhythm = tree.alloc_node(NodeTag::Rhythm, ids.new_id(), &rhythm_children);
            // Rhythm goes before a trailing tie, otherwise last
            let position = children
                .iter()
                .position(|&child| tree.node(child).is_token(TokenKind::Tie))
                .unwrap_or(children.len());
            children.insert(position, rhythm);
            tree.set_children(target, &children);
        }
    }
}

/// Chords without a closing bracket cannot carry a rhythm
fn accepts_rhythm(tree: &CsTree, target: NodeIdx) -> bool {
    tree.tag(target) != NodeTag::Chord
        || tree.token_child(target, TokenKind::ChordRightBracket).is_some()
}

/// Compute every new duration first, then write them all
fn rewrite_durations<F>(
    tree: &mut CsTree,
    selection: &Selection,
    ids: &mut IdGenerator,
    update: F,
) -> Result<Selection, TransformError>
where
    F: Fn(Rational64) -> Rational64,
{
    let targets: Vec<Target> = element_targets(tree, selection, &RHYTHM_TARGETS)
        .into_iter()
        .filter(|target| accepts_rhythm(tree, target.node))
        .collect();

    let mut planned = Vec::with_capacity(targets.len());
    for target in targets {
        let current = read_duration(tree, tree.child_with_tag(target.node, NodeTag::Rhythm))?;
        let next = update(widen(current));
        if next <= Rational64::from_integer(0) {
            return Err(TransformError::NonPositiveDuration {
                id: tree.id(target.node),
                value: next.to_string(),
            });
        }
        let next = narrow(next).ok_or_else(|| {
            TransformError::InvalidArgument(format!(
                "duration of node {} would overflow ({})",
                tree.id(target.node),
                next
            ))
        })?;
        planned.push((target.node, next));
    }

    tracing::debug!("[Transform] rewriting {} duration(s)", planned.len());
    for (node, duration) in planned {
        write_duration(tree, ids, node, duration);
    }
    Ok(selection.clone())
}

pub fn set_rhythm(
    tree: &mut CsTree,
    selection: &Selection,
    ids: &mut IdGenerator,
    value: Duration,
) -> Result<Selection, TransformError> {
    if value <= Duration::from_integer(0) {
        return Err(TransformError::InvalidArgument(format!(
            "duration must be positive, got {}",
            value
        )));
    }
    rewrite_durations(tree, selection, ids, |_| widen(value))
}

pub fn add_to_rhythm(
    tree: &mut CsTree,
    selection: &Selection,
    ids: &mut IdGenerator,
    delta: Duration,
) -> Result<Selection, TransformError> {
    let delta = widen(delta);
    rewrite_durations(tree, selection, ids, |current| current + delta)
}

pub fn multiply_rhythm(
    tree: &mut CsTree,
    selection: &Selection,
    ids: &mut IdGenerator,
    factor: i32,
) -> Result<Selection, TransformError> {
    if factor <= 0 {
        return Err(TransformError::InvalidArgument(format!(
            "factor must be positive, got {}",
            factor
        )));
    }
    let factor = i64::from(factor);
    rewrite_durations(tree, selection, ids, |current| current * factor)
}

pub fn divide_rhythm(
    tree: &mut CsTree,
    selection: &Selection,
    ids: &mut IdGenerator,
    divisor: i32,
) -> Result<Selection, TransformError> {
    if divisor <= 0 {
        return Err(TransformError::InvalidArgument(format!(
            "divisor must be positive, got {}",
            divisor
        )));
    }
    let divisor = i64::from(divisor);
    rewrite_durations(tree, selection, ids, |current| current / divisor)
}
