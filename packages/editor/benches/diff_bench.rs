use abc_editor::diff::diff;
use abc_editor::selectors::select_notes;
use abc_editor::{CsTree, EditPipeline, Selection, Transform};
use abc_parser::parse;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const REEL: &str = "X:1
T:The Silver Spear
R:reel
M:4/4
L:1/8
K:D
|:A|FA (3AAA BAFA|dfed BddA|FA (3AAA BAFA|dfeg fdd:|
|:g|fa (3aaa bafa|dfed Bdde|fa (3aaa bafa|dfeg fdd:|
";

fn diff_small_change(c: &mut Criterion) {
    let new = REEL.replace("dfed", "dfeD");
    c.bench_function("diff_small_change", |b| {
        b.iter(|| diff(black_box(REEL), black_box(&new)))
    });
}

fn transpose_pipeline(c: &mut Criterion) {
    c.bench_function("transpose_pipeline", |b| {
        b.iter(|| {
            let output = parse(black_box(REEL));
            let mut tree = CsTree::from_file(&output.file);
            let notes = select_notes(&tree, &Selection::whole(&tree));
            let mut pipeline = EditPipeline::new(output.ids);
            pipeline.apply(REEL, &mut tree, &notes, &Transform::Transpose(5))
        })
    });
}

criterion_group!(benches, diff_small_change, transpose_pipeline);
criterion_main!(benches);
