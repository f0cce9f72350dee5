//! Chord member selectors
//!
//! Chord notes are taken in the order they are written: the first note is
//! the bottom and the last is the top, whatever their pitches.

use super::scoped_nodes;
use crate::cstree::{CsTree, NodeIdx, NodeTag};
use crate::selection::{Cursor, Selection};

fn chord_notes(tree: &CsTree, chord: NodeIdx) -> Vec<NodeIdx> {
    tree.children(chord)
        .filter(|&child| tree.tag(child) == NodeTag::Note)
        .collect()
}

/// Apply `pick` to the notes of every chord in scope
fn per_chord<F>(tree: &CsTree, selection: &Selection, pick: F) -> Selection
where
    F: Fn(&[NodeIdx]) -> Vec<NodeIdx>,
{
    let mut cursors = Vec::new();
    for cursor in &selection.cursors {
        for scoped in scoped_nodes(tree, cursor) {
            if tree.tag(scoped.node) != NodeTag::Chord {
                continue;
            }
            let notes = chord_notes(tree, scoped.node);
            cursors.extend(
                pick(&notes)
                    .into_iter()
                    .map(|note| Cursor::from([tree.id(note)])),
            );
        }
    }
    selection.with_cursors(cursors)
}

pub fn select_top(tree: &CsTree, selection: &Selection) -> Selection {
    per_chord(tree, selection, |notes| notes.last().copied().into_iter().collect())
}

pub fn select_bottom(tree: &CsTree, selection: &Selection) -> Selection {
    per_chord(tree, selection, |notes| notes.first().copied().into_iter().collect())
}

/// `n = 0` is the top note; out of range picks nothing
pub fn select_nth_from_top(tree: &CsTree, selection: &Selection, n: usize) -> Selection {
    per_chord(tree, selection, |notes| {
        notes
            .len()
            .checked_sub(n + 1)
            .map(|index| notes[index])
            .into_iter()
            .collect()
    })
}

pub fn select_all_but_top(tree: &CsTree, selection: &Selection) -> Selection {
    per_chord(tree, selection, |notes| match notes.split_last() {
        Some((_, rest)) => rest.to_vec(),
        None => Vec::new(),
    })
}

pub fn select_all_but_bottom(tree: &CsTree, selection: &Selection) -> Selection {
    per_chord(tree, selection, |notes| match notes.split_first() {
        Some((_, rest)) => rest.to_vec(),
        None => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selectors::select_chords;
    use abc_parser::parse;

    fn chords(source: &str) -> (CsTree, Selection) {
        let tree = CsTree::from_file(&parse(source).file);
        let chords = select_chords(&tree, &Selection::whole(&tree));
        (tree, chords)
    }

    fn letters(tree: &CsTree, selection: &Selection) -> Vec<String> {
        selection
            .ids()
            .iter()
            .map(|id| {
                let idx = tree.lookup(*id).unwrap();
                tree.leftmost_token(idx).unwrap().lexeme.clone()
            })
            .collect()
    }

    #[test]
    fn test_top_and_bottom_follow_written_order() {
        let (tree, chords) = chords("X:1\nK:C\n[GEC]\n");
        assert_eq!(letters(&tree, &select_top(&tree, &chords)), vec!["C"]);
        assert_eq!(letters(&tree, &select_bottom(&tree, &chords)), vec!["G"]);
    }

    #[test]
    fn test_nth_from_top() {
        let (tree, chords) = chords("X:1\nK:C\n[CEG]\n");
        assert_eq!(
            select_nth_from_top(&tree, &chords, 0),
            select_top(&tree, &chords)
        );
        assert_eq!(
            letters(&tree, &select_nth_from_top(&tree, &chords, 1)),
            vec!["E"]
        );
        assert!(select_nth_from_top(&tree, &chords, 3).is_empty());
    }

    #[test]
    fn test_top_and_all_but_top_partition_chord() {
        let (tree, chords) = chords("X:1\nK:C\n[CEG] [DF]\n");
        let top = select_top(&tree, &chords).ids();
        let rest = select_all_but_top(&tree, &chords).ids();
        let all = crate::selectors::select_chord_notes(&tree, &chords).ids();

        assert!(top.is_disjoint(&rest));
        assert_eq!(top.len() + rest.len(), all.len());
        assert_eq!(select_all_but_top(&tree, &chords).len(), 3);
    }

    #[test]
    fn test_all_but_bottom() {
        let (tree, chords) = chords("X:1\nK:C\n[CEG]\n");
        let selected = select_all_but_bottom(&tree, &chords);
        assert_eq!(selected.len(), 2);
        assert!(!letters(&tree, &selected).contains(&"C".to_string()));
    }

    #[test]
    fn test_non_chord_scope_selects_nothing() {
        let tree = CsTree::from_file(&parse("X:1\nK:C\nCDE\n").file);
        assert!(select_top(&tree, &Selection::whole(&tree)).is_empty());
    }
}
