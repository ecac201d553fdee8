// Criterion benchmarks for generation expansion.
//
// Covers the three costs that matter: replaying a deterministic system from
// scratch, replaying a branching system (recursion into sub-sequences), and
// serving a generation straight from the cache. Run with:
//
//   cargo bench -p bracken_engine

use bracken_engine::lsystem::LSystem;
use bracken_engine::rule::Rule;
use bracken_engine::successor::Successor;
use bracken_engine::symbol::{label_sequence, Symbol};
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};

fn algae() -> LSystem {
    LSystem::new(label_sequence("A"))
        .with_rules([
            Rule::for_label("A", Successor::Sequence(label_sequence("AB"))),
            Rule::for_label("B", Successor::Single(Symbol::new("A"))),
        ])
        .unwrap()
}

fn branching() -> LSystem {
    LSystem::new(label_sequence("A"))
        .with_rules([
            Rule::for_label(
                "A",
                Successor::Single(Symbol::new("B").with_branch(label_sequence("AC"))),
            ),
            Rule::for_label("C", Successor::Sequence(label_sequence("ZCAB"))),
        ])
        .unwrap()
}

fn stochastic(size: usize) -> LSystem {
    LSystem::new(label_sequence(&"A".repeat(size)))
        .with_seed(7)
        .with_rules([Rule::for_label(
            "A",
            Successor::stochastic([
                (Successor::Sequence(label_sequence("AB")), 0.3),
                (Successor::Single(Symbol::new("A")), 0.7),
            ]),
        )])
        .unwrap()
}

fn bench_flat_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("expansion/algae");

    for &generation in &[8u32, 12, 16] {
        group.bench_with_input(
            BenchmarkId::new("replay", generation),
            &generation,
            |b, &generation| {
                b.iter_batched(
                    algae,
                    |mut system| system.output(generation).unwrap().len(),
                    BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

fn bench_branching_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("expansion/branching");

    for &generation in &[6u32, 8, 10] {
        group.bench_with_input(
            BenchmarkId::new("replay", generation),
            &generation,
            |b, &generation| {
                b.iter_batched(
                    branching,
                    |mut system| system.output(generation).unwrap().len(),
                    BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

fn bench_stochastic_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("expansion/stochastic");

    for &size in &[1_000usize, 10_000] {
        group.bench_with_input(BenchmarkId::new("one_pass", size), &size, |b, &size| {
            b.iter_batched(
                || stochastic(size),
                |mut system| system.output(1).unwrap().len(),
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_cached_read(c: &mut Criterion) {
    let mut system = algae();
    let _ = system.output(14).unwrap();

    c.bench_function("expansion/cached_read", |b| {
        b.iter(|| system.output(14).unwrap().len())
    });
}

criterion_group!(
    benches,
    bench_flat_replay,
    bench_branching_replay,
    bench_stochastic_pass,
    bench_cached_read,
);
criterion_main!(benches);
