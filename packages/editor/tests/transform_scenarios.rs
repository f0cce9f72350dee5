//! End-to-end edits: select, transform, diff, remap

use abc_editor::diff::{apply_records, diff, EditKind};
use abc_editor::selectors::{select_chords, select_music, select_notes, select_rests};
use abc_editor::transforms::Spelling;
use abc_editor::{CsTree, EditPipeline, NodeTag, Selection, Transform, VoiceParams};
use abc_parser::parse;

fn edit(source: &str, select: fn(&CsTree, &Selection) -> Selection, transform: Transform) -> String {
    let output = parse(source);
    let mut tree = CsTree::from_file(&output.file);
    let selection = select(&tree, &Selection::whole(&tree));
    let mut pipeline = EditPipeline::new(output.ids);
    let outcome = pipeline
        .apply(source, &mut tree, &selection, &transform)
        .unwrap();
    assert_eq!(apply_records(source, &outcome.records), outcome.new_text);
    outcome.new_text
}

fn whole(_: &CsTree, selection: &Selection) -> Selection {
    selection.clone()
}

/// MIDI value, rhythm text and tie presence of every note, in order
fn note_facts(source: &str) -> Vec<(i32, String, bool)> {
    let tree = CsTree::from_file(&parse(source).file);
    tree.preorder()
        .into_iter()
        .filter(|&idx| tree.tag(idx) == NodeTag::Note)
        .map(|note| {
            let pitch = tree.child_with_tag(note, NodeTag::Pitch).unwrap();
            let lexeme = |kind| {
                tree.token_child(pitch, kind)
                    .and_then(|idx| tree.node(idx).lexeme())
            };
            let spelling = Spelling::from_lexemes(
                lexeme(abc_parser::TokenKind::Accidental),
                lexeme(abc_parser::TokenKind::NoteLetter).unwrap(),
                lexeme(abc_parser::TokenKind::Octave),
            )
            .unwrap();
            let rhythm = tree
                .child_with_tag(note, NodeTag::Rhythm)
                .map(|rhythm| {
                    tree.preorder_from(rhythm)
                        .into_iter()
                        .filter_map(|idx| tree.node(idx).lexeme())
                        .collect::<String>()
                })
                .unwrap_or_default();
            let tie = tree.token_child(note, abc_parser::TokenKind::Tie).is_some();
            (spelling.midi(), rhythm, tie)
        })
        .collect()
}

#[test]
fn test_scenario_transpose_up_a_tone() {
    let text = edit("X:1\nK:C\nCDE|\n", whole, Transform::Transpose(2));
    assert!(text.contains("DE^F"), "{text}");
}

#[test]
fn test_scenario_enharmonize_sharp() {
    let text = edit("X:1\nK:C\n^C|\n", whole, Transform::Enharmonize);
    assert!(text.contains("_D"), "{text}");
}

#[test]
fn test_scenario_add_voice() {
    let text = edit(
        "X:1\nK:C\nCDE|\n",
        whole,
        Transform::AddVoice {
            id: "T1".to_string(),
            params: VoiceParams::default(),
        },
    );
    let voice = text.find("V:T1").unwrap();
    let key = text.find("K:").unwrap();
    assert!(voice < key);
}

#[test]
fn test_scenario_single_replacement() {
    let records = diff("C D E|", "C F E|");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, EditKind::Replace);
    assert_eq!(records[0].start, 2);
    assert_eq!(records[0].new_content, "F");
}

#[test]
fn test_transpose_inverse_restores_midi() {
    let source = "X:1\nK:C\nC,, ^^F _B' =c [_EG^c]2- {g}a z B,|\n";
    for n in [1, 5, 7, 12, -3, -13] {
        let there = edit(source, whole, Transform::Transpose(n));
        let back = edit(&there, whole, Transform::Transpose(-n));
        let expected: Vec<i32> = note_facts(source).into_iter().map(|f| f.0).collect();
        let actual: Vec<i32> = note_facts(&back).into_iter().map(|f| f.0).collect();
        assert_eq!(actual, expected, "transpose by {n}");
    }
}

#[test]
fn test_transpose_zero_is_a_no_op() {
    let source = "X:1\nK:C\n_D ^^F =c\n";
    assert_eq!(edit(source, whole, Transform::Transpose(0)), source);
}

#[test]
fn test_enharmonize_preserves_midi_rhythm_and_ties() {
    let source = "X:1\nK:C\n^C2- _E/ ^^F __B, =G [^F_B]3/4 ^e>_c\n";
    let text = edit(source, whole, Transform::Enharmonize);
    assert_eq!(note_facts(&text), note_facts(source));
}

#[test]
fn test_chords_only_rhythm_leaves_loose_notes() {
    let text = edit(
        "X:1\nK:C\n[CE]2 G2 [DF]\n",
        select_chords,
        Transform::MultiplyRhythm(2),
    );
    assert_eq!(text, "X:1\nK:C\n[CE]4 G2 [DF]2\n");
}

#[test]
fn test_to_rest_then_notes_are_gone() {
    let source = "X:1\nK:C\nC2 [EG] D/|\n";
    let text = edit(source, select_music, Transform::ToRest);
    assert_eq!(text, "X:1\nK:C\nz2 z z/|\n");

    let tree = CsTree::from_file(&parse(&text).file);
    let whole = Selection::whole(&tree);
    assert!(select_notes(&tree, &whole).is_empty());
    assert_eq!(select_rests(&tree, &whole).len(), 3);
}

#[test]
fn test_remove_notes_drops_their_cursors() {
    let source = "X:1\nK:C\nC D E|\n";
    let output = parse(source);
    let mut tree = CsTree::from_file(&output.file);
    let notes = select_notes(&tree, &Selection::whole(&tree));
    let mut pipeline = EditPipeline::new(output.ids);

    let outcome = pipeline
        .apply(source, &mut tree, &notes, &Transform::Remove)
        .unwrap();
    assert_eq!(outcome.new_text, "X:1\nK:C\n  |\n");
    assert!(outcome.cursors.is_empty());
    assert!(outcome.cursor_ranges.is_empty());
}

#[test]
fn test_unrelated_tune_is_untouched() {
    let source = "X:1\nK:C\nC D|\n\nX:2\nK:G\n^F G|\n";
    let output = parse(source);
    let mut tree = CsTree::from_file(&output.file);
    let notes = select_notes(&tree, &Selection::whole(&tree));
    let first_tune = notes.with_cursors(notes.cursors[..2].to_vec());
    let mut pipeline = EditPipeline::new(output.ids);

    let outcome = pipeline
        .apply(source, &mut tree, &first_tune, &Transform::Transpose(12))
        .unwrap();
    assert_eq!(outcome.new_text, "X:1\nK:C\nc d|\n\nX:2\nK:G\n^F G|\n");
    assert_eq!(outcome.cursors.len(), 2);
}
