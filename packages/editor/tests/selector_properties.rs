//! Algebraic properties of the selectors over realistic tunes

use abc_editor::selectors::*;
use abc_editor::{CsTree, NodeTag, Position, Range, Selection};
use abc_parser::{parse, stringify};
use std::collections::BTreeSet;

const TUNES: &[&str] = &[
    "X:1\nK:C\n[CEG]2 C2 D2|\n",
    "X:1\nT:Reel\nM:4/4\nL:1/8\nK:D\n|:A|FA (3AAA BAFA|dfed [Bd]dA|{/g}FA [K:G] (AB) [DFA]2:|\n",
    "X:1\nK:C\n[C\"Am\"EG]/ {ab}c z [GB] (c d) e|\nC,, ^^F _B' =c|]\n\nX:2\nK:G\n[GBd]4|\n",
];

fn tree_of(source: &str) -> (CsTree, Selection) {
    let tree = CsTree::from_file(&parse(source).file);
    let whole = Selection::whole(&tree);
    (tree, whole)
}

#[test]
fn test_roundtrip_through_tree() {
    for source in TUNES {
        let file = parse(source).file;
        let tree = CsTree::from_file(&file);
        assert_eq!(stringify(&tree.to_file().unwrap()), stringify(&file));
    }
}

#[test]
fn test_scenario_chords_then_notes() {
    let (tree, whole) = tree_of(TUNES[0]);
    let chords = select_chords(&tree, &whole);
    assert_eq!(chords.len(), 1);

    let notes = select_notes(&tree, &chords);
    assert_eq!(notes.len(), 3);
    let letters: Vec<String> = notes
        .cursors
        .iter()
        .map(|cursor| {
            let idx = tree.lookup(*cursor.iter().next().unwrap()).unwrap();
            tree.preorder_from(idx)
                .into_iter()
                .filter_map(|child| tree.node(child).lexeme().map(str::to_string))
                .collect()
        })
        .collect();
    assert_eq!(letters, vec!["C", "E", "G"]);
}

#[test]
fn test_type_selectors_are_idempotent() {
    for source in TUNES {
        let (tree, whole) = tree_of(source);
        let chords = select_chords(&tree, &whole);
        assert_eq!(select_chords(&tree, &chords), chords);

        let notes = select_notes(&tree, &whole);
        assert_eq!(select_notes(&tree, &notes), notes);
    }
}

#[test]
fn test_around_is_idempotent() {
    let selectors: [fn(&CsTree, &Selection) -> Selection; 4] = [
        select_around_chord,
        select_around_grace_group,
        select_around_inline_field,
        select_around_grouping,
    ];
    for source in TUNES {
        let (tree, whole) = tree_of(source);
        let notes = select_notes(&tree, &whole);
        for around in selectors {
            let once = around(&tree, &notes);
            assert_eq!(around(&tree, &once), once);
        }
    }
}

#[test]
fn test_chord_and_non_chord_notes_partition_notes() {
    for source in TUNES {
        let (tree, whole) = tree_of(source);
        let all = select_notes(&tree, &whole).ids();
        let inside = select_chord_notes(&tree, &whole).ids();
        let outside = select_non_chord_notes(&tree, &whole).ids();

        assert!(inside.is_disjoint(&outside));
        let union: BTreeSet<_> = inside.union(&outside).copied().collect();
        assert_eq!(union, all);
    }
}

#[test]
fn test_top_and_rest_partition_each_chord() {
    for source in TUNES {
        let (tree, whole) = tree_of(source);
        let chords = select_chords(&tree, &whole);
        for chord in &chords.cursors {
            let one = whole.with_cursors(vec![chord.clone()]);
            let top = select_top(&tree, &one).ids();
            let rest = select_all_but_top(&tree, &one).ids();
            let members = select_chord_notes(&tree, &one).ids();

            assert!(top.is_disjoint(&rest));
            let union: BTreeSet<_> = top.union(&rest).copied().collect();
            assert_eq!(union, members);
        }
        assert_eq!(select_nth_from_top(&tree, &chords, 0), select_top(&tree, &chords));
    }
}

#[test]
fn test_inside_chord_excludes_brackets_and_rhythm() {
    let (tree, whole) = tree_of("X:1\nK:C\n[CE]2\n");
    let notes = select_notes(&tree, &whole);
    let inside = select_inside_chord(&tree, &notes);

    // Both notes share one enclosing chord, so each note cursor reports it
    assert_eq!(inside.len(), 2);
    for cursor in &inside.cursors {
        let tags: Vec<NodeTag> = cursor
            .iter()
            .map(|id| tree.tag(tree.lookup(*id).unwrap()))
            .collect();
        assert_eq!(tags, vec![NodeTag::Note, NodeTag::Note]);
    }
}

#[test]
fn test_ranges_never_pick_node_at_exclusive_end() {
    let (tree, _) = tree_of("X:1\nK:C\nC D E|\n");
    let selected = select_ranges(
        &tree,
        &[Range::new(Position::new(2, 0), Position::new(2, 2))],
    );
    let notes: Vec<NodeTag> = selected
        .ids()
        .iter()
        .map(|id| tree.tag(tree.lookup(*id).unwrap()))
        .filter(|tag| *tag == NodeTag::Note)
        .collect();
    assert_eq!(notes.len(), 1);
}
