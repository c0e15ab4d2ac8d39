use criterion::{Criterion, criterion_group, criterion_main};
use markdown_lists_engine::editing::{Cmd, EditSession};
use markdown_lists_engine::lists::ListEditWatcher;

fn generate_ordered_list(items: usize) -> String {
    (1..=items).map(|n| format!("{n}. item number {n}\n")).collect()
}

fn bench_list_editing(c: &mut Criterion) {
    let mut group = c.benchmark_group("list_editing");
    group.sample_size(10);

    let content = generate_ordered_list(500);

    group.bench_function("split_first_item_and_renumber", |b| {
        b.iter(|| {
            let mut session = EditSession::new(&content, ListEditWatcher::new(true));
            let patch = session.apply(Cmd::SplitListItem {
                at: std::hint::black_box(16),
            });
            std::hint::black_box(patch).ok();
        });
    });

    group.bench_function("type_character_in_list", |b| {
        let mut session = EditSession::new(&content, ListEditWatcher::new(true));
        b.iter(|| {
            let patch = session.apply(Cmd::InsertText {
                at: std::hint::black_box(3),
                text: std::hint::black_box("x".to_string()),
            });
            std::hint::black_box(patch).ok();
        });
    });

    group.finish();
}

criterion_group!(benches, bench_list_editing);
criterion_main!(benches);
