//! Inside/around selectors for bracketed constructs

use super::enclosing_nodes;
use crate::cstree::{CsTree, NodeIdx, NodeTag};
use crate::selection::{Cursor, Selection};
use abc_parser::TokenKind;

/// A bracketed construct and the token kinds that open and close it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiters {
    pub tag: NodeTag,
    pub open: TokenKind,
    pub close: TokenKind,
}

impl Delimiters {
    pub const CHORD: Delimiters = Delimiters {
        tag: NodeTag::Chord,
        open: TokenKind::ChordLeftBracket,
        close: TokenKind::ChordRightBracket,
    };

    pub const GRACE_GROUP: Delimiters = Delimiters {
        tag: NodeTag::GraceGroup,
        open: TokenKind::GraceGroupLeftBrace,
        close: TokenKind::GraceGroupRightBrace,
    };

    pub const INLINE_FIELD: Delimiters = Delimiters {
        tag: NodeTag::InlineField,
        open: TokenKind::InlineFieldLeftBracket,
        close: TokenKind::InlineFieldRightBracket,
    };

    pub const GROUPING: Delimiters = Delimiters {
        tag: NodeTag::Grouping,
        open: TokenKind::GroupingLeftParen,
        close: TokenKind::GroupingRightParen,
    };
}

/// The enclosing construct itself, once per construct per input cursor
pub fn select_around(tree: &CsTree, selection: &Selection, delimiters: Delimiters) -> Selection {
    let cursors = selection
        .cursors
        .iter()
        .flat_map(|cursor| enclosing_nodes(tree, cursor, delimiters.tag))
        .map(|enclosing| Cursor::from([tree.id(enclosing)]))
        .collect();
    selection.with_cursors(cursors)
}

/// Everything strictly between the delimiters, as one cursor per construct
pub fn select_inside(tree: &CsTree, selection: &Selection, delimiters: Delimiters) -> Selection {
    let cursors = selection
        .cursors
        .iter()
        .flat_map(|cursor| enclosing_nodes(tree, cursor, delimiters.tag))
        .filter_map(|enclosing| between_delimiters(tree, enclosing, delimiters))
        .collect();
    selection.with_cursors(cursors)
}

fn between_delimiters(tree: &CsTree, node: NodeIdx, delimiters: Delimiters) -> Option<Cursor> {
    let children = tree.child_vec(node);
    let open = children
        .iter()
        .position(|&child| tree.node(child).is_token(delimiters.open))?;
    let close = children
        .iter()
        .rposition(|&child| tree.node(child).is_token(delimiters.close))?;
    if close <= open {
        return None;
    }

    let inner: Cursor = children[open + 1..close]
        .iter()
        .map(|&child| tree.id(child))
        .collect();
    (!inner.is_empty()).then_some(inner)
}

pub fn select_inside_chord(tree: &CsTree, selection: &Selection) -> Selection {
    select_inside(tree, selection, Delimiters::CHORD)
}

pub fn select_around_chord(tree: &CsTree, selection: &Selection) -> Selection {
    select_around(tree, selection, Delimiters::CHORD)
}

pub fn select_inside_grace_group(tree: &CsTree, selection: &Selection) -> Selection {
    select_inside(tree, selection, Delimiters::GRACE_GROUP)
}

pub fn select_around_grace_group(tree: &CsTree, selection: &Selection) -> Selection {
    select_around(tree, selection, Delimiters::GRACE_GROUP)
}

pub fn select_inside_inline_field(tree: &CsTree, selection: &Selection) -> Selection {
    select_inside(tree, selection, Delimiters::INLINE_FIELD)
}

pub fn select_around_inline_field(tree: &CsTree, selection: &Selection) -> Selection {
    select_around(tree, selection, Delimiters::INLINE_FIELD)
}

pub fn select_inside_grouping(tree: &CsTree, selection: &Selection) -> Selection {
    select_inside(tree, selection, Delimiters::GROUPING)
}

pub fn select_around_grouping(tree: &CsTree, selection: &Selection) -> Selection {
    select_around(tree, selection, Delimiters::GROUPING)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selectors::select_notes;
    use abc_parser::parse;

    fn setup(source: &str) -> (CsTree, Selection) {
        let tree = CsTree::from_file(&parse(source).file);
        let selection = Selection::whole(&tree);
        (tree, selection)
    }

    #[test]
    fn test_around_from_note_inside_chord() {
        let (tree, whole) = setup("X:1\nK:C\n[CEG] D\n");
        let notes = select_notes(&tree, &whole);
        let first_note = whole.with_cursors(vec![notes.cursors[0].clone()]);

        let around = select_around_chord(&tree, &first_note);
        assert_eq!(around.len(), 1);
        let chord = tree.lookup(*around.cursors[0].iter().next().unwrap()).unwrap();
        assert_eq!(tree.tag(chord), NodeTag::Chord);
    }

    #[test]
    fn test_one_cursor_per_construct_per_input() {
        let (tree, whole) = setup("X:1\nK:C\n[CEG] [DF]\n");
        let notes = select_notes(&tree, &whole);
        let merged: Cursor = notes.ids();
        let one_input = whole.with_cursors(vec![merged]);

        assert_eq!(select_around_chord(&tree, &one_input).len(), 2);
    }

    #[test]
    fn test_around_is_idempotent() {
        let (tree, whole) = setup("X:1\nK:C\n{ag}[CE] (AB) [K:G]\n");
        for delimiters in [
            Delimiters::CHORD,
            Delimiters::GRACE_GROUP,
            Delimiters::INLINE_FIELD,
            Delimiters::GROUPING,
        ] {
            let once = select_around(&tree, &whole, delimiters);
            assert_eq!(once.len(), 1);
            assert_eq!(select_around(&tree, &once, delimiters), once);
        }
    }

    #[test]
    fn test_inside_excludes_delimiters() {
        let (tree, whole) = setup("X:1\nK:C\n[CEG]2\n");
        let inside = select_inside_chord(&tree, &whole);
        assert_eq!(inside.len(), 1);
        assert_eq!(inside.cursors[0].len(), 3);
        for id in &inside.cursors[0] {
            assert_eq!(tree.tag(tree.lookup(*id).unwrap()), NodeTag::Note);
        }
    }

    #[test]
    fn test_inside_unclosed_chord_selects_nothing() {
        let (tree, whole) = setup("X:1\nK:C\n[CE\n");
        assert!(select_inside_chord(&tree, &whole).is_empty());
        assert_eq!(select_around_chord(&tree, &whole).len(), 1);
    }

    #[test]
    fn test_outside_any_construct_selects_nothing() {
        let (tree, whole) = setup("X:1\nK:C\nCDE\n");
        let notes = select_notes(&tree, &whole);
        assert!(select_around_grouping(&tree, &notes).is_empty());
    }

    #[test]
    fn test_inside_inline_field() {
        let (tree, whole) = setup("X:1\nK:C\nC[K:G]D\n");
        let inside = select_inside_inline_field(&tree, &whole);
        assert_eq!(inside.cursors[0].len(), 2);
    }
}
