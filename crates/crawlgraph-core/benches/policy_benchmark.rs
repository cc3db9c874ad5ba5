//! Benchmarks for the storage policies over the in-process store.
//!
//! Measures:
//! - In-memory edge insertion
//! - Record encode / decode
//! - Snapshot load and dirty-vertex commit
//! - Write-through single-edge insertion

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use crawlgraph_core::store::{decode_edges, encode_edges};
use crawlgraph_core::{
    EdgeKind, EdgeValue, InMemoryPolicy, InsertEdge, MemoryPool, MemoryStore, SnapshotPolicy,
    StoragePolicy, WriteThroughPolicy,
};

/// Deterministic link set: each page links to the next `fanout` pages.
#[allow(clippy::cast_precision_loss)]
fn generate_links(pages: usize, fanout: usize) -> Vec<InsertEdge> {
    let mut links = Vec::with_capacity(pages * fanout);
    for page in 0..pages {
        for step in 1..=fanout {
            let kind = if step % 3 == 0 {
                EdgeKind::Resource
            } else {
                EdgeKind::Base
            };
            links.push(InsertEdge::new(
                format!("page{page}"),
                format!("page{}", (page + step) % pages),
                EdgeValue::new(1.0 / step as f64, kind),
            ));
        }
    }
    links
}

fn seeded_store(pages: usize, fanout: usize) -> MemoryStore {
    let store = MemoryStore::new();
    let mut snapshot = SnapshotPolicy::open("bench", store.connect()).expect("open snapshot");
    snapshot
        .insert_edges(&generate_links(pages, fanout))
        .expect("insert links");
    snapshot.commit().expect("commit seed graph");
    store
}

// =============================================================================
// In-memory
// =============================================================================

fn bench_in_memory_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("in_memory_insert");
    for pages in [100_usize, 1_000, 10_000] {
        let links = generate_links(pages, 8);
        group.throughput(Throughput::Elements(links.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(pages), &links, |b, links| {
            b.iter(|| {
                let mut graph = InMemoryPolicy::with_capacity("bench", pages);
                let _ = graph.insert_edges(black_box(links));
                black_box(graph.vertex_count())
            });
        });
    }
    group.finish();
}

// =============================================================================
// Codec
// =============================================================================

fn bench_codec(c: &mut Criterion) {
    let mut graph = InMemoryPolicy::new("bench");
    let _ = graph.insert_edges(&generate_links(64, 32));
    let Some(record) = graph.record("page0").cloned() else {
        return;
    };
    let Ok(encoded) = encode_edges(&record) else {
        return;
    };

    c.bench_function("codec_encode_64_edges", |b| {
        b.iter(|| black_box(encode_edges(black_box(&record))));
    });
    c.bench_function("codec_decode_64_edges", |b| {
        b.iter(|| black_box(decode_edges("bench", "page0", black_box(&encoded))));
    });
}

// =============================================================================
// Snapshot
// =============================================================================

fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot");
    for pages in [100_usize, 1_000] {
        let store = seeded_store(pages, 8);

        group.bench_with_input(BenchmarkId::new("open", pages), &store, |b, store| {
            b.iter(|| black_box(SnapshotPolicy::open("bench", store.connect()).is_ok()));
        });

        let link = [InsertEdge::new(
            "page0",
            "page1",
            EdgeValue::new(0.5, EdgeKind::Patch),
        )];
        group.bench_with_input(
            BenchmarkId::new("commit_one_edge", pages),
            &store,
            |b, store| {
                b.iter(|| {
                    let Ok(mut snapshot) = SnapshotPolicy::open("bench", store.connect()) else {
                        return;
                    };
                    let _ = snapshot.insert_edges(&link);
                    let _ = black_box(snapshot.commit());
                });
            },
        );
    }
    group.finish();
}

// =============================================================================
// Write-through
// =============================================================================

fn bench_write_through(c: &mut Criterion) {
    let store = seeded_store(1_000, 8);
    let mut graph = WriteThroughPolicy::new("bench", Arc::new(MemoryPool::new(store)));
    let link = [InsertEdge::new(
        "page10",
        "page20",
        EdgeValue::new(0.25, EdgeKind::Base),
    )];

    c.bench_function("write_through_insert_edge", |b| {
        b.iter(|| black_box(graph.insert_edges(&link)));
    });
    c.bench_function("write_through_read_vertex", |b| {
        b.iter(|| black_box(graph.edges("page10")));
    });
}

criterion_group!(
    benches,
    bench_in_memory_insert,
    bench_codec,
    bench_snapshot,
    bench_write_through
);
criterion_main!(benches);
