//! Popularity Source - Global Ranking
//!
//! Ranks movies by aggregate engagement, independent of any user:
//!
//! ```text
//! popularity_score = interaction_count * avg_score
//! ```
//!
//! Ties go to the lower movie id. When engagement runs out before the
//! requested length is reached, the list is padded from the catalog (most
//! recently added first), skipping anything already ranked.

use crate::scoring::ScoredInteraction;
use crate::types::{Candidate, CandidateSource};
use data_loader::MovieId;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, instrument, warn};

/// Aggregate engagement for one movie
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopularityStats {
    /// Number of interaction rows, duplicates included
    pub interaction_count: u32,
    pub avg_score: f64,
    pub popularity_score: f64,
}

/// Precomputed popularity ranking plus catalog padding
#[derive(Debug, Clone, Default)]
pub struct PopularitySource {
    /// Movies with at least one interaction, best first
    ranking: Vec<(MovieId, PopularityStats)>,

    /// Movie id -> position in `ranking`
    positions: HashMap<MovieId, usize>,

    /// Catalog ids, most recently added first
    catalog: Vec<MovieId>,
}

impl PopularitySource {
    /// Aggregate `interactions` per movie and rank them
    pub fn new(interactions: &[ScoredInteraction], catalog: Vec<MovieId>) -> Self {
        let mut totals: BTreeMap<MovieId, (u32, f64)> = BTreeMap::new();
        for interaction in interactions {
            let entry = totals.entry(interaction.movie_id).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += interaction.score;
        }

        let mut ranking: Vec<(MovieId, PopularityStats)> = totals
            .into_iter()
            .map(|(movie_id, (count, total))| {
                let avg_score = total / f64::from(count);
                (
                    movie_id,
                    PopularityStats {
                        interaction_count: count,
                        avg_score,
                        popularity_score: f64::from(count) * avg_score,
                    },
                )
            })
            .collect();
        ranking.sort_by(|a, b| {
            b.1.popularity_score
                .total_cmp(&a.1.popularity_score)
                .then(a.0.cmp(&b.0))
        });

        if ranking.is_empty() {
            warn!("No interactions available, popularity falls back to catalog order");
        }
        if catalog.is_empty() {
            warn!("Catalog is empty, popularity padding unavailable");
        }
        debug!(
            "Ranked {} movies by popularity ({} catalog ids for padding)",
            ranking.len(),
            catalog.len()
        );

        let positions = ranking
            .iter()
            .enumerate()
            .map(|(position, (movie_id, _))| (*movie_id, position))
            .collect();

        Self {
            ranking,
            positions,
            catalog,
        }
    }

    /// Stats for a movie, if anyone interacted with it
    pub fn stats(&self, movie_id: MovieId) -> Option<&PopularityStats> {
        self.positions
            .get(&movie_id)
            .map(|&position| &self.ranking[position].1)
    }

    /// Movies with at least one interaction, best first
    pub fn ranking(&self) -> &[(MovieId, PopularityStats)] {
        &self.ranking
    }

    pub fn catalog(&self) -> &[MovieId] {
        &self.catalog
    }

    /// Top `limit` movie ids: ranked movies first, then catalog padding
    pub fn top(&self, limit: usize) -> Vec<MovieId> {
        self.get_candidates(limit)
            .into_iter()
            .map(|c| c.movie_id)
            .collect()
    }

    /// Top `limit` candidates, distinct by movie id.
    ///
    /// Shorter than `limit` only when ranking and catalog together hold
    /// fewer distinct movies.
    #[instrument(skip(self))]
    pub fn get_candidates(&self, limit: usize) -> Vec<Candidate> {
        let mut seen: HashSet<MovieId> = HashSet::with_capacity(limit.min(self.len_hint()));
        let mut candidates = Vec::with_capacity(limit.min(self.len_hint()));

        let ranked = self.ranking.iter().map(|(movie_id, stats)| {
            Candidate::new(*movie_id, CandidateSource::Popularity, stats.popularity_score)
        });
        let padding = self
            .catalog
            .iter()
            .map(|&movie_id| Candidate::new(movie_id, CandidateSource::Catalog, 0.0));

        for candidate in ranked.chain(padding) {
            if candidates.len() >= limit {
                break;
            }
            if seen.insert(candidate.movie_id) {
                candidates.push(candidate);
            }
        }

        debug!("Generated {} popularity candidates", candidates.len());
        candidates
    }

    fn len_hint(&self) -> usize {
        self.ranking.len() + self.catalog.len()
    }
}
