//! Criterion microbenches for the ETA search (group "eta").
//!
//! - Candidate index build over a random geometric graph.
//! - Full search without and with a turn bound, for a few graph sizes.
//!
//! Graphs are drawn once per size from a fixed seed so runs stay comparable.

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use eta::api::*;

fn graph(nodes: usize) -> RandomGraph {
    let cfg = RandomGraphCfg {
        nodes,
        radius: 0.25,
        ..RandomGraphCfg::default()
    };
    random_geometric_graph(cfg, 2024).unwrap()
}

fn bench_candidates(c: &mut Criterion) {
    let mut group = c.benchmark_group("eta");
    let rg = graph(200);
    group.throughput(Throughput::Elements(rg.graph.edges().len() as u64));
    group.bench_function(BenchmarkId::new("candidate_index_build", "n200"), |b| {
        b.iter(|| {
            let _ = CandidateEdgeIndex::build(rg.graph.edges(), SeedLimit::Unlimited).unwrap();
        })
    });
    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("eta");
    for n in [30usize, 80, 150] {
        let rg = graph(n);
        let cfg = SearchCfg {
            seed_limit: SeedLimit::Top(500),
            iteration_limit: IterationLimit::Bounded(20_000),
            ..SearchCfg::default()
        };
        group.bench_function(BenchmarkId::new("search_free", n), |b| {
            b.iter_batched(
                || cfg,
                |cfg| {
                    let _ = eta_search(&rg.graph, rg.graph.edges(), cfg, None).unwrap();
                },
                BatchSize::SmallInput,
            )
        });
        let turned = SearchCfg {
            turn: Some(TurnCfg::with_limit(2)),
            ..cfg
        };
        group.bench_function(BenchmarkId::new("search_turn2", n), |b| {
            b.iter(|| {
                let _ = eta_search(&rg.graph, rg.graph.edges(), turned, Some(&rg.coords)).unwrap();
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_candidates, bench_search);
criterion_main!(benches);
