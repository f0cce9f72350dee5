//! Pitch rewrites
//!
//! Pitches are computed from a note's own tokens only; key signatures and
//! accidentals carried through the bar are not applied.

use super::new_token;
use crate::cstree::{CsTree, NodeIdx, NodeTag};
use crate::errors::TransformError;
use crate::selection::Selection;
use crate::selectors::scoped_nodes;
use abc_parser::{IdGenerator, TokenKind};
use std::collections::HashSet;
use std::ops::RangeInclusive;

const LETTERS: [char; 7] = ['C', 'D', 'E', 'F', 'G', 'A', 'B'];
const NATURALS: [i32; 7] = [0, 2, 4, 5, 7, 9, 11];

/// Canonical spelling for each pitch class, preferring sharps
const SHARP_SPELLINGS: [(usize, i32); 12] = [
    (0, 0),
    (0, 1),
    (1, 0),
    (1, 1),
    (2, 0),
    (3, 0),
    (3, 1),
    (4, 0),
    (4, 1),
    (5, 0),
    (5, 1),
    (6, 0),
];

/// A pitch as letter, accidental and octave
///
/// `octave` is the scientific octave number: `C` is C4 (MIDI 60) and `c`
/// is C5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spelling {
    /// Index into C D E F G A B
    pub letter: usize,
    /// Semitones, -2 to 2
    pub accidental: i32,
    pub octave: i32,
}

impl Spelling {
    pub fn midi(&self) -> i32 {
        (self.octave + 1) * 12 + NATURALS[self.letter] + self.accidental
    }

    pub fn canonical(midi: i32) -> Self {
        let (letter, accidental) = SHARP_SPELLINGS[midi.rem_euclid(12) as usize];
        Spelling {
            letter,
            accidental,
            octave: midi.div_euclid(12) - 1,
        }
    }

    /// Parse `^^`, `c`, `''` style lexemes
    pub fn from_lexemes(alteration: Option<&str>, letter: &str, octave: Option<&str>) -> Option<Self> {
        let c = letter.chars().next()?;
        let letter_index = LETTERS.iter().position(|&l| l == c.to_ascii_uppercase())?;
        let base_octave = if c.is_ascii_lowercase() { 5 } else { 4 };
        let marks = octave.unwrap_or("");
        let up = marks.chars().filter(|&m| m == '\'').count() as i32;
        let down = marks.chars().filter(|&m| m == ',').count() as i32;

        Some(Spelling {
            letter: letter_index,
            accidental: alteration.map(accidental_offset).unwrap_or(0),
            octave: base_octave + up - down,
        })
    }

    pub fn letter_lexeme(&self) -> String {
        let letter = LETTERS[self.letter];
        if self.octave >= 5 {
            letter.to_ascii_lowercase().to_string()
        } else {
            letter.to_string()
        }
    }

    pub fn octave_lexeme(&self) -> Option<String> {
        if self.octave > 5 {
            Some("'".repeat((self.octave - 5) as usize))
        } else if self.octave < 4 {
            Some(",".repeat((4 - self.octave) as usize))
        } else {
            None
        }
    }

    pub fn accidental_lexeme(&self) -> Option<&'static str> {
        match self.accidental {
            2 => Some("^^"),
            1 => Some("^"),
            -1 => Some("_"),
            -2 => Some("__"),
            _ => None,
        }
    }
}

fn accidental_offset(lexeme: &str) -> i32 {
    match lexeme {
        "^^" => 2,
        "^" => 1,
        "_" => -1,
        "__" => -2,
        _ => 0,
    }
}

/// Tokens of a pitch node, by kind
struct PitchTokens {
    alteration: Option<NodeIdx>,
    letter: NodeIdx,
    octave: Option<NodeIdx>,
}

fn pitch_tokens(tree: &CsTree, pitch: NodeIdx) -> Option<PitchTokens> {
    Some(PitchTokens {
        alteration: tree.token_child(pitch, TokenKind::Accidental),
        letter: tree.token_child(pitch, TokenKind::NoteLetter)?,
        octave: tree.token_child(pitch, TokenKind::Octave),
    })
}

fn read_spelling(tree: &CsTree, tokens: &PitchTokens) -> Option<Spelling> {
    Spelling::from_lexemes(
        tokens.alteration.and_then(|idx| tree.node(idx).lexeme()),
        tree.node(tokens.letter).lexeme()?,
        tokens.octave.and_then(|idx| tree.node(idx).lexeme()),
    )
}

/// Rewrite a pitch's tokens, reusing existing token nodes where possible
fn write_spelling(
    tree: &mut CsTree,
    ids: &mut IdGenerator,
    pitch: NodeIdx,
    tokens: &PitchTokens,
    spelling: &Spelling,
) {
    let near = tree.node(tokens.letter).data.clone();
    let mut children = Vec::with_capacity(3);

    if let Some(accidental) = spelling.accidental_lexeme() {
        let idx = match tokens.alteration {
            Some(idx) => idx,
            None => new_token(tree, ids, TokenKind::Accidental, "", near.as_ref()),
        };
        set_lexeme(tree, idx, accidental);
        children.push(idx);
    }

    set_lexeme(tree, tokens.letter, &spelling.letter_lexeme());
    children.push(tokens.letter);

    if let Some(marks) = spelling.octave_lexeme() {
        let idx = match tokens.octave {
            Some(idx) => idx,
            None => new_token(tree, ids, TokenKind::Octave, "", near.as_ref()),
        };
        set_lexeme(tree, idx, &marks);
        children.push(idx);
    }

    tree.set_children(pitch, &children);
}

fn set_lexeme(tree: &mut CsTree, idx: NodeIdx, lexeme: &str) {
    if let Some(data) = tree.node_mut(idx).data.as_mut() {
        data.lexeme = lexeme.to_string();
    }
}

/// Pitch nodes of every note in scope, each once
fn scoped_pitches(tree: &CsTree, selection: &Selection) -> Vec<NodeIdx> {
    let mut seen = HashSet::new();
    let mut pitches = Vec::new();
    for cursor in &selection.cursors {
        for scoped in scoped_nodes(tree, cursor) {
            if tree.tag(scoped.node) != NodeTag::Note || !seen.insert(scoped.node) {
                continue;
            }
            if let Some(pitch) = tree.child_with_tag(scoped.node, NodeTag::Pitch) {
                pitches.push(pitch);
            }
        }
    }
    pitches
}

/// Notes are kept within the MIDI range
pub const MIDI_RANGE: RangeInclusive<i32> = 0..=127;

/// Shift every note in scope by `semitones`, respelling canonically
///
/// Fails without touching the tree if any shifted note would leave
/// [`MIDI_RANGE`].
pub fn transpose(
    tree: &mut CsTree,
    selection: &Selection,
    ids: &mut IdGenerator,
    semitones: i32,
) -> Result<Selection, TransformError> {
    if semitones == 0 {
        return Ok(selection.clone());
    }

    let mut planned = Vec::new();
    for pitch in scoped_pitches(tree, selection) {
        let Some(tokens) = pitch_tokens(tree, pitch) else {
            continue;
        };
        let Some(current) = read_spelling(tree, &tokens) else {
            continue;
        };
        let midi = current
            .midi()
            .checked_add(semitones)
            .filter(|midi| MIDI_RANGE.contains(midi))
            .ok_or_else(|| {
                TransformError::InvalidArgument(format!(
                    "transposing node {} by {} leaves the MIDI range",
                    tree.id(pitch),
                    semitones
                ))
            })?;
        planned.push((pitch, tokens, Spelling::canonical(midi)));
    }

    for (pitch, tokens, target) in planned {
        write_spelling(tree, ids, pitch, &tokens, &target);
    }
    Ok(selection.clone())
}

/// Respell sharps and flats on the neighbouring letter, keeping the pitch
///
/// Sharps move up a letter and flats move down one. Notes without an
/// accidental, or with an explicit natural, are left alone.
pub fn enharmonize(
    tree: &mut CsTree,
    selection: &Selection,
    ids: &mut IdGenerator,
) -> Result<Selection, TransformError> {
    for pitch in scoped_pitches(tree, selection) {
        let Some(tokens) = pitch_tokens(tree, pitch) else {
            continue;
        };
        let step = match tokens.alteration.and_then(|idx| tree.node(idx).lexeme()) {
            Some("^") | Some("^^") => 1,
            Some("_") | Some("__") => -1,
            _ => continue,
        };
        let Some(current) = read_spelling(tree, &tokens) else {
            continue;
        };

        let shifted = current.letter as i32 + step;
        let letter = shifted.rem_euclid(7) as usize;
        let octave = current.octave + shifted.div_euclid(7);
        let natural = Spelling {
            letter,
            accidental: 0,
            octave,
        };
        let target = Spelling {
            accidental: current.midi() - natural.midi(),
            ..natural
        };
        write_spelling(tree, ids, pitch, &tokens, &target);
    }

    Ok(selection.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selectors::select_notes;
    use crate::transforms::test_support::fixture;

    fn midis(tree: &CsTree) -> Vec<i32> {
        tree.preorder()
            .into_iter()
            .filter(|&idx| tree.tag(idx) == NodeTag::Pitch)
            .map(|pitch| {
                let tokens = pitch_tokens(tree, pitch).unwrap();
                read_spelling(tree, &tokens).unwrap().midi()
            })
            .collect()
    }

    #[test]
    fn test_spelling_midi_values() {
        assert_eq!(Spelling::from_lexemes(None, "C", None).unwrap().midi(), 60);
        assert_eq!(Spelling::from_lexemes(None, "c", None).unwrap().midi(), 72);
        assert_eq!(Spelling::from_lexemes(Some("^"), "f", Some("'")).unwrap().midi(), 90);
        assert_eq!(Spelling::from_lexemes(Some("__"), "B", Some(",,")).unwrap().midi(), 45);
    }

    #[test]
    fn test_transpose_whole_tone() {
        let mut f = fixture("X:1\nK:C\nCDE|\n");
        let whole = f.whole.clone();
        transpose(&mut f.tree, &whole, &mut f.ids, 2).unwrap();
        assert!(f.text().contains("DE^F"));
    }

    #[test]
    fn test_transpose_crosses_octaves() {
        let mut f = fixture("X:1\nK:C\nB c\n");
        let whole = f.whole.clone();
        transpose(&mut f.tree, &whole, &mut f.ids, 1).unwrap();
        assert_eq!(f.text(), "X:1\nK:C\nc ^c\n");

        transpose(&mut f.tree, &whole, &mut f.ids, -13).unwrap();
        assert_eq!(f.text(), "X:1\nK:C\nB, C\n");
    }

    #[test]
    fn test_transpose_inverse_restores_midi() {
        let mut f = fixture("X:1\nK:C\n_E2 ^f' [C,G,e] {=b}a,,\n");
        let before = midis(&f.tree);
        let whole = f.whole.clone();
        for n in [-14, -1, 5, 12, 23] {
            transpose(&mut f.tree, &whole, &mut f.ids, n).unwrap();
            transpose(&mut f.tree, &whole, &mut f.ids, -n).unwrap();
            assert_eq!(midis(&f.tree), before);
        }
    }

    #[test]
    fn test_transpose_zero_is_noop() {
        let source = "X:1\nK:C\n=C _D\n";
        let mut f = fixture(source);
        let whole = f.whole.clone();
        transpose(&mut f.tree, &whole, &mut f.ids, 0).unwrap();
        assert_eq!(f.text(), source);
    }

    #[test]
    fn test_transpose_only_touches_scope() {
        let mut f = fixture("X:1\nK:C\nC D E\n");
        let notes = select_notes(&f.tree, &f.whole);
        let middle = f.whole.with_cursors(vec![notes.cursors[1].clone()]);
        transpose(&mut f.tree, &middle, &mut f.ids, 1).unwrap();
        assert_eq!(f.text(), "X:1\nK:C\nC ^D E\n");
    }

    #[test]
    fn test_enharmonize_sharp_to_flat() {
        let mut f = fixture("X:1\nK:C\n^C|\n");
        let whole = f.whole.clone();
        enharmonize(&mut f.tree, &whole, &mut f.ids).unwrap();
        assert!(f.text().contains("_D"));
    }

    #[test]
    fn test_enharmonize_respellings() {
        let mut f = fixture("X:1\nK:C\n_D ^^C __E ^B _c ^E =F G\n");
        let before = midis(&f.tree);
        let whole = f.whole.clone();
        enharmonize(&mut f.tree, &whole, &mut f.ids).unwrap();
        assert_eq!(f.text(), "X:1\nK:C\n^C D D c B F =F G\n");
        assert_eq!(midis(&f.tree), before);
    }

    #[test]
    fn test_enharmonize_keeps_rhythm_and_tie() {
        let mut f = fixture("X:1\nK:C\n^c3/2- c\n");
        let whole = f.whole.clone();
        enharmonize(&mut f.tree, &whole, &mut f.ids).unwrap();
        assert_eq!(f.text(), "X:1\nK:C\n_d3/2- c\n");
    }

    #[test]
    fn test_transpose_out_of_midi_range_is_an_error() {
        let source = "X:1\nK:C\nC c''\n";
        let mut f = fixture(source);
        let whole = f.whole.clone();
        for n in [i32::MAX, i32::MIN, 1_000_000, -61] {
            let result = transpose(&mut f.tree, &whole, &mut f.ids, n);
            assert!(matches!(result, Err(TransformError::InvalidArgument(_))));
            assert_eq!(f.text(), source);
        }

        // c'' is MIDI 96, so 31 semitones reaches the top of the range
        transpose(&mut f.tree, &whole, &mut f.ids, 31).unwrap();
        assert_eq!(midis(&f.tree), vec![91, 127]);
        assert!(transpose(&mut f.tree, &whole, &mut f.ids, 1).is_err());
    }
}
