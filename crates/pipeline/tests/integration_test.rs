//! Integration tests for the pipeline.
//!
//! These run the whole request path on a small watchlist: scoring, the
//! utility matrix, factorization, popularity and the hybrid merge.

use data_loader::{DataIndex, Interaction, Movie, MovieId, WatchStatus};
use pipeline::filters::*;
use pipeline::{FilterPipeline, HybridSelector, MergePolicy, RecommendationKind};
use sources::{
    InteractionIndex, LatentFactorEstimator, LatentFactorSource, PopularitySource,
    build_user_context, build_utility_matrix, score_interactions,
};
use std::collections::HashSet;
use std::sync::Arc;

struct Setup {
    index: DataIndex,
    latent: LatentFactorSource,
    popularity: PopularitySource,
    interactions: InteractionIndex,
}

fn create_test_setup() -> Setup {
    let movies: Vec<Movie> = (1..=12)
        .map(|id| Movie {
            id,
            title: format!("Movie {id} ({})", 2000 + id),
            year: Some(2000 + id as u16),
            added_at: i64::from(id) * 100,
        })
        .collect();

    let mut rows = Vec::new();
    // Two taste groups: users 1-4 like 1..=6, users 5-8 like 7..=12
    for user_id in 1..=8u32 {
        let range: Vec<MovieId> = if user_id <= 4 { (1..=6).collect() } else { (7..=12).collect() };
        for (k, &movie_id) in range.iter().enumerate() {
            // each user skips one movie of their group
            if (k as u32 + user_id) % 6 == 0 {
                continue;
            }
            let rating = Some(6.0 + (k % 3) as f32);
            rows.push(Interaction::new(user_id, movie_id, WatchStatus::Watched, rating));
        }
    }
    // User 9 only saved one movie for later
    rows.push(Interaction::new(9, 1, WatchStatus::PlanToWatch, None));

    let index = DataIndex::from_parts(movies, rows);
    let scored = score_interactions(index.interactions());
    let matrix = build_utility_matrix(&scored);
    // Rank 2 matches the two taste groups
    let table = LatentFactorEstimator::new()
        .with_max_rank(2)
        .estimate(&matrix)
        .unwrap();

    Setup {
        latent: LatentFactorSource::new(Arc::new(table)),
        popularity: PopularitySource::new(&scored, index.catalog_ids().to_vec()),
        interactions: InteractionIndex::new(&scored),
        index,
    }
}

#[test]
fn test_personalized_recommendations_exclude_seen() {
    let setup = create_test_setup();
    let selector = HybridSelector::default();

    for user_id in 1..=9 {
        let context = build_user_context(&setup.interactions, user_id);
        let result = selector
            .select(&context, 10, &setup.latent, &setup.popularity)
            .unwrap();

        let unique: HashSet<_> = result.recommendations.iter().collect();
        assert_eq!(unique.len(), result.recommendations.len());
        assert!(result.len() <= 10);
        for movie_id in &result.recommendations {
            assert!(
                !context.has_interacted(*movie_id),
                "user {user_id} was recommended seen movie {movie_id}"
            );
        }
    }
}

#[test]
fn test_personalized_prefers_own_taste_group() {
    let setup = create_test_setup();
    // User 1 skipped exactly one movie of group 1..=6
    let context = build_user_context(&setup.interactions, 1);
    let result = HybridSelector::new(MergePolicy::Quota(1))
        .select(&context, 1, &setup.latent, &setup.popularity)
        .unwrap();

    assert_eq!(result.kind, RecommendationKind::HybridPersonalized);
    assert!((1..=6).contains(&result.recommendations[0]));
}

#[test]
fn test_unknown_user_gets_popular() {
    let setup = create_test_setup();
    let context = build_user_context(&setup.interactions, 999);
    let result = HybridSelector::default()
        .select(&context, 10, &setup.latent, &setup.popularity)
        .unwrap();

    assert_eq!(result.kind, RecommendationKind::PopularityFallback);
    assert_eq!(result.recommendations, setup.popularity.top(10));
}

#[test]
fn test_popular_is_capped_by_distinct_movies() {
    let setup = create_test_setup();
    // Every catalog movie has interactions, so there is nothing left to pad with
    assert_eq!(setup.popularity.top(20).len(), setup.index.catalog_ids().len());
}

#[test]
fn test_filter_pipeline_keeps_popularity_order() {
    let setup = create_test_setup();
    let context = build_user_context(&setup.interactions, 9);
    let pool = setup.popularity.get_candidates(12);
    let expected: Vec<MovieId> = pool
        .iter()
        .map(|c| c.movie_id)
        .filter(|&id| id != 1 && id != 7)
        .collect();

    let filtered = FilterPipeline::new()
        .add_filter(AlreadyInteractedFilter)
        .add_filter(ExcludeMoviesFilter::new([7]))
        .apply(pool, &context)
        .unwrap();

    let ids: Vec<MovieId> = filtered.iter().map(|c| c.movie_id).collect();
    assert_eq!(ids, expected);
}
