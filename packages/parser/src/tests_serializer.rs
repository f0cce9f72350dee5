/// Tests to verify the serializer reproduces its input exactly
use crate::ast::{Expr, FileItem};
use crate::*;

fn assert_roundtrip(source: &str) {
    let output = parse(source);
    assert_eq!(stringify(&output.file), source, "roundtrip failed");
}

#[test]
fn test_roundtrip_simple_tune() {
    assert_roundtrip("X:1\nT:Simple\nM:4/4\nL:1/8\nK:G\nGABc dedB|dedB dedB|\n");
}

#[test]
fn test_roundtrip_rhythms_and_ties() {
    assert_roundtrip("X:1\nK:C\nC2 D/ E3/4 F// G>A B<c z2 x/ C-C\n");
}

#[test]
fn test_roundtrip_chords_and_grace_groups() {
    assert_roundtrip("X:1\nK:D\n[DFA]2 [CEG]/ {/g}a {ab}c [C\"Am\"E]|\n");
}

#[test]
fn test_roundtrip_decorations_and_annotations() {
    assert_roundtrip("X:1\nK:C\n\"C\"!trill!c .d ~e +fermata+f|\n");
}

#[test]
fn test_roundtrip_groupings_tuplets_and_fields() {
    assert_roundtrip("X:1\nK:C\n(3abc (de) [K:G] (f |: g :| [1 a :|2 b |]\n");
}

#[test]
fn test_roundtrip_multiple_tunes_and_free_text() {
    assert_roundtrip(
        "%abc-2.1\nR:reel\n\nX:1\nK:C\nC\n\nSome notes about the tunes\n\nX:2\nT:Two\nK:D\nD\n",
    );
}

#[test]
fn test_roundtrip_invalid_and_crlf() {
    assert_roundtrip("X:1\r\nK:C\r\nC#D@E\r\n");
}

#[test]
fn test_roundtrip_without_trailing_newline() {
    assert_roundtrip("X:1\nK:C\nCDE|");
}

#[test]
fn test_stringify_single_expr() {
    let output = parse("X:1\nK:C\n[CEG]2-\n");
    let tune = output.file.tunes().next().unwrap();
    let body = tune.body.as_ref().unwrap();
    let chord = body.systems[0]
        .iter()
        .find(|e| matches!(e, Expr::Chord(_)))
        .unwrap();
    assert_eq!(stringify_expr(chord), "[CEG]2-");
}

#[test]
fn test_file_header_serializes_first() {
    let output = parse("%%pagewidth 21cm\n\nX:1\nK:C\nC\n");
    assert!(matches!(output.file.contents[0], FileItem::Header(_)));
    assert!(stringify(&output.file).starts_with("%%pagewidth"));
}
