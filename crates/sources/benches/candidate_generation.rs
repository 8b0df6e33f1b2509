//! Benchmarks for the refresh-time and request-time paths
//!
//! Run with: cargo bench --package sources
//!
//! Uses a synthetic watchlist so it runs without any dataset on disk.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use data_loader::{Interaction, WatchStatus};
use sources::{
    InteractionIndex, LatentFactorEstimator, LatentFactorSource, PopularitySource,
    build_user_context, build_utility_matrix, score_interactions,
};
use std::sync::Arc;

const USERS: u32 = 300;
const MOVIES: u32 = 400;

fn synthetic_interactions() -> Vec<Interaction> {
    let mut rows = Vec::new();
    for user_id in 1..=USERS {
        for k in 0..25 {
            let movie_id = (user_id * 31 + k * 17) % MOVIES + 1;
            let status = match (user_id + k) % 3 {
                0 => WatchStatus::PlanToWatch,
                1 => WatchStatus::Watching,
                _ => WatchStatus::Watched,
            };
            let rating = (k % 2 == 0).then(|| ((user_id + k) % 10) as f32);
            rows.push(Interaction::new(user_id, movie_id, status, rating));
        }
    }
    rows
}

fn bench_factorization(c: &mut Criterion) {
    let scored = score_interactions(&synthetic_interactions());
    let matrix = build_utility_matrix(&scored);
    let estimator = LatentFactorEstimator::new();

    c.bench_function("latent_factor_estimate", |b| {
        b.iter(|| {
            let table = estimator.estimate(black_box(&matrix)).unwrap();
            black_box(table)
        })
    });
}

fn bench_latent_candidates(c: &mut Criterion) {
    let scored = score_interactions(&synthetic_interactions());
    let matrix = build_utility_matrix(&scored);
    let table = Arc::new(LatentFactorEstimator::new().estimate(&matrix).unwrap());
    let source = LatentFactorSource::new(table);
    let index = InteractionIndex::new(&scored);
    let context = build_user_context(&index, 1);

    c.bench_function("latent_get_candidates", |b| {
        b.iter(|| {
            let candidates = source.get_candidates(black_box(&context), black_box(5));
            black_box(candidates)
        })
    });
}

fn bench_popularity(c: &mut Criterion) {
    let scored = score_interactions(&synthetic_interactions());
    let catalog: Vec<u32> = (1..=MOVIES).rev().collect();

    c.bench_function("popularity_build_and_top", |b| {
        b.iter(|| {
            let source = PopularitySource::new(black_box(&scored), catalog.clone());
            black_box(source.top(20))
        })
    });
}

criterion_group!(
    benches,
    bench_factorization,
    bench_latent_candidates,
    bench_popularity
);
criterion_main!(benches);
