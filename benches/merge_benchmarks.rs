use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use prismerge::engine::{GreedyMerger, QueryBox};
use prismerge::ids::SequentialIds;
use prismerge::index::{BoxIndex, IndexedBox};
use prismerge::{Bounds, cost};
use std::time::Duration;

/// Boxes in well-separated clusters of eight. Members of a cluster overlap
/// along a chain, so most of the merging happens inside clusters.
fn clustered_boxes(count: usize) -> Vec<QueryBox> {
    let mut boxes = Vec::with_capacity(count);
    for i in 0..count {
        let cluster = i / 8;
        let cx = (cluster % 32) as f64 * 50.0;
        let cy = (cluster / 32) as f64 * 50.0;
        let offset = (i % 8) as f64 * 0.4;
        boxes.push(QueryBox::new(
            i as u64 + 1,
            Bounds::new(
                cx + offset,
                cy + offset,
                offset,
                cx + offset + 1.0,
                cy + offset + 1.0,
                offset + 1.0,
            ),
            None,
        ));
    }
    boxes
}

fn benchmark_merge_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_engine");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(20));

    for input_size in [100, 1000, 5000].iter() {
        let boxes = clustered_boxes(*input_size);

        group.bench_with_input(
            BenchmarkId::new("greedy_run", input_size),
            input_size,
            |b, &_size| {
                b.iter(|| {
                    GreedyMerger::new()
                        .with_ids(SequentialIds::starting_at(1_000_000))
                        .run(black_box(boxes.clone()))
                        .unwrap()
                })
            },
        );
    }

    group.finish();
}

fn benchmark_index_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_operations");

    let entries: Vec<IndexedBox> = clustered_boxes(10_000)
        .into_iter()
        .map(|b| IndexedBox {
            id: b.id,
            bounds: b.bounds,
        })
        .collect();

    group.bench_function("bulk_load_10k", |b| {
        b.iter(|| BoxIndex::bulk_load(black_box(entries.clone())))
    });

    let index = BoxIndex::bulk_load(entries.clone());
    let window = Bounds::new(0.0, 0.0, 0.0, 4.0, 4.0, 4.0);
    group.bench_function("query_overlap_10k", |b| {
        b.iter(|| index.query_overlap(black_box(&window), black_box(0)))
    });

    group.bench_function("insert_remove_cycle", |b| {
        let mut index = BoxIndex::bulk_load(entries.clone());
        let bounds = Bounds::new(5.0, 5.0, 5.0, 6.0, 6.0, 6.0);
        b.iter(|| {
            index.insert(black_box(u64::MAX), black_box(bounds));
            index.remove(u64::MAX, &bounds).unwrap();
        })
    });

    group.finish();
}

fn benchmark_cost_model(c: &mut Criterion) {
    let mut group = c.benchmark_group("cost_model");

    let b1 = Bounds::new(0.0, 0.0, 0.0, 2.0, 4.0, 5.0);
    let b2 = Bounds::new(1.0, 2.0, 3.0, 6.0, 7.0, 8.0);

    group.bench_function("padded_bounds", |b| {
        b.iter(|| cost::padded_bounds(black_box(&b1), black_box(40.0)).unwrap())
    });

    group.bench_function("combined_and_delta", |b| {
        b.iter(|| {
            let merged = black_box(&b1).combined(black_box(&b2));
            cost::delta_c(&b1, &b2, &merged, black_box(0.0))
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_merge_engine,
    benchmark_index_operations,
    benchmark_cost_model
);

criterion_main!(benches);
