//! Filter to remove movies the user already has on their watchlist.
//!
//! Any status counts, including `plan_to_watch`: a movie the user saved
//! for later is not a discovery.

use crate::traits::Filter;
use anyhow::Result;
use sources::{Candidate, UserContext};

/// Removes candidates the user has any interaction with.
///
/// ## Algorithm
/// Uses the HashSet in UserContext.interacted_movies for O(1) lookups.
pub struct AlreadyInteractedFilter;

impl Filter for AlreadyInteractedFilter {
    fn name(&self) -> &str {
        "AlreadyInteractedFilter"
    }

    fn apply(
        &self,
        candidates: Vec<Candidate>,
        context: &UserContext,
    ) -> Result<Vec<Candidate>> {
        let filtered: Vec<Candidate> = candidates
            .into_iter()
            .filter(|candidate| !context.has_interacted(candidate.movie_id))
            .collect();
        Ok(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sources::CandidateSource;

    #[test]
    fn test_already_interacted_filter() {
        let mut context = UserContext::new(1);
        context.interacted_movies.insert(100);
        context.interacted_movies.insert(200);

        let candidates = vec![
            Candidate::new(100, CandidateSource::LatentFactor, 0.9),
            Candidate::new(101, CandidateSource::LatentFactor, 0.8),
            Candidate::new(200, CandidateSource::Popularity, 0.7),
            Candidate::new(300, CandidateSource::Catalog, 0.0),
        ];

        let filtered = AlreadyInteractedFilter.apply(candidates, &context).unwrap();

        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].movie_id, 101);
        assert_eq!(filtered[1].movie_id, 300);
    }
}
