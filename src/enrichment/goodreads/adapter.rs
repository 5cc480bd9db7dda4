//! Adapter layer: convert Goodreads DTOs to domain models.
//!
//! The provider reports unrated books with a zero or missing average;
//! both map to "no match" here so the job layer only ever sees usable
//! ratings.

use super::dto;
use crate::enrichment::domain::RatingMatch;

/// Convert one provider book entry into a rating match.
///
/// Returns `None` when the entry carries no usable rating (missing or
/// not greater than zero).
pub fn to_rating_match(stub: dto::BookStub) -> Option<RatingMatch> {
    let rating = stub.average_rating?;
    if rating <= 0.0 {
        return None;
    }
    Some(RatingMatch {
        provider_id: stub.id.to_string(),
        rating,
        ratings_count: stub.ratings_count.unwrap_or(0),
    })
}

/// Pick the best usable entry from a search result list.
///
/// Search results come back relevance-ordered, so the first entry with a
/// usable rating wins.
pub fn best_search_match(results: Vec<dto::BookStub>) -> Option<RatingMatch> {
    results.into_iter().find_map(to_rating_match)
}
