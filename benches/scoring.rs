//! Scoring and analysis benchmarks.
//!
//! - Scorer throughput for different ensemble sizes
//! - Sequential vs parallel scoring
//! - Tree-wise analysis (prefix sums) vs rescoring every checkpoint

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use rankeval::analysis::{tree_steps, tree_wise_performance};
use rankeval::metrics::{Metric, Ndcg};
use rankeval::testing::{random_dataset, random_ensemble};
use rankeval::{AnalysisConfig, DatasetView, Parallelism, Scorer};

const N_FEATURES: usize = 50;

// =============================================================================
// Scorer
// =============================================================================

fn bench_scorer_model_sizes(c: &mut Criterion) {
    let dataset = random_dataset("bench", 100, 50, N_FEATURES, 42);
    let mut group = c.benchmark_group("scorer/model_size");
    group.throughput(Throughput::Elements(dataset.n_instances() as u64));

    for n_trees in [10, 100, 500] {
        let ensemble = random_ensemble("bench", n_trees, 6, N_FEATURES, 7);
        group.bench_with_input(BenchmarkId::from_parameter(n_trees), &ensemble, |b, ensemble| {
            let scorer = Scorer::new(ensemble);
            b.iter(|| black_box(scorer.score(black_box(&dataset), false)))
        });
    }

    group.finish();
}

fn bench_scorer_parallelism(c: &mut Criterion) {
    let dataset = random_dataset("bench", 200, 50, N_FEATURES, 42);
    let ensemble = random_ensemble("bench", 200, 6, N_FEATURES, 7);
    let mut group = c.benchmark_group("scorer/parallelism");

    for (label, parallelism) in [("sequential", Parallelism::Sequential), ("parallel", Parallelism::Parallel)] {
        let scorer = Scorer::new(&ensemble).with_parallelism(parallelism);
        group.bench_function(label, |b| {
            b.iter(|| black_box(scorer.score(black_box(&dataset), true)))
        });
    }

    group.finish();
}

// =============================================================================
// Tree-wise analysis
// =============================================================================

fn bench_tree_wise(c: &mut Criterion) {
    let dataset = random_dataset("bench", 100, 30, N_FEATURES, 42);
    let ensemble = random_ensemble("bench", 300, 5, N_FEATURES, 7);
    let ndcg = Ndcg::at(10);
    let metrics: [&dyn Metric; 1] = [&ndcg];
    let config = AnalysisConfig::builder().step(25).n_threads(1).build().unwrap();

    let mut group = c.benchmark_group("tree_wise");

    group.bench_function("prefix_sums", |b| {
        b.iter(|| {
            black_box(tree_wise_performance(
                std::slice::from_ref(&dataset),
                std::slice::from_ref(&ensemble),
                &metrics,
                &config,
            ))
        })
    });

    group.bench_function("rescore_each_checkpoint", |b| {
        let scorer = Scorer::new(&ensemble);
        b.iter(|| {
            for checkpoint in tree_steps(ensemble.n_trees(), config.step) {
                let preds = scorer.score_trees(&dataset, checkpoint + 1, false).unwrap();
                black_box(ndcg.eval(&dataset, preds.y_pred.view()));
            }
        })
    });

    group.finish();
}

criterion_group!(benches, bench_scorer_model_sizes, bench_scorer_parallelism, bench_tree_wise);
criterion_main!(benches);
