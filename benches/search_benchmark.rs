use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mythos::ablation::{dimensionality_search_with, SearchOptions};
use mythos::significance::permutation_test_with;
use mythos::stats::CorrelationMethod;
use mythos::synthetic::planted_corpus;

fn search_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("dimensionality_search");
    group.sample_size(20);

    for n_entities in [20, 40] {
        let corpus = planted_corpus(n_entities, 42);
        for parallel in [false, true] {
            let options = SearchOptions {
                min_dims: 3,
                max_dims: 7,
                parallel,
                ..SearchOptions::default()
            };
            let label = if parallel { "parallel" } else { "serial" };
            group.bench_with_input(
                BenchmarkId::new(label, corpus.len()),
                &corpus,
                |b, corpus| b.iter(|| dimensionality_search_with(black_box(corpus), &options, None)),
            );
        }
    }
    group.finish();
}

fn permutation_benchmark(c: &mut Criterion) {
    let corpus = planted_corpus(30, 7);
    let mut group = c.benchmark_group("permutation_test");
    group.sample_size(20);

    for parallel in [false, true] {
        let label = if parallel { "parallel" } else { "serial" };
        group.bench_function(label, |b| {
            b.iter(|| {
                permutation_test_with(
                    black_box(&corpus),
                    500,
                    1,
                    CorrelationMethod::Spearman,
                    parallel,
                )
            })
        });
    }
    group.finish();
}

criterion_group!(benches, search_benchmark, permutation_benchmark);
criterion_main!(benches);
