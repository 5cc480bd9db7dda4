//! Internal domain models for book enrichment.
//!
//! These types are OUR types - they don't change when external APIs change.
//! All external API responses get converted into these types via adapters.

use crate::model::SummaryType;

/// Everything the AI adapter needs to generate one summary.
#[derive(Debug, Clone)]
pub struct SummaryRequest {
    /// Book title (always present - title-less books never reach the adapter)
    pub title: String,
    /// Author name, included in the prompt when known
    pub author: Option<String>,
    /// Description / blurb used as generation context
    pub description: Option<String>,
    /// Extracted page content. The batch job never supplies this; manual
    /// regeneration may.
    pub excerpt: Option<String>,
    /// Which artifact kind to generate
    pub summary_type: SummaryType,
}

impl SummaryRequest {
    /// Build a request from book fields with no excerpt.
    pub fn from_book(
        title: &str,
        author: Option<&str>,
        description: Option<&str>,
        summary_type: SummaryType,
    ) -> Self {
        Self {
            title: title.to_string(),
            author: author.map(String::from),
            description: description.map(String::from),
            excerpt: None,
            summary_type,
        }
    }
}

/// One generated summary plus its usage/cost metadata.
#[derive(Debug, Clone)]
pub struct GeneratedSummary {
    /// Generated text (non-empty)
    pub content: String,
    /// Model that produced it
    pub model_used: String,
    /// Prompt tokens consumed
    pub input_tokens: i64,
    /// Completion tokens consumed
    pub output_tokens: i64,
    /// Computed cost in USD
    pub cost_usd: f64,
}

/// A resolved ratings-provider match for one book.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingMatch {
    /// Provider-side book id
    pub provider_id: String,
    /// Average rating (provider scale, typically 0-5)
    pub rating: f64,
    /// Number of ratings behind the average
    pub ratings_count: i64,
}

/// Per-run counters for one job invocation.
///
/// Ephemeral - returned and logged at run end, never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunStats {
    /// Candidates fully attempted
    pub succeeded: u32,
    /// Candidates that produced nothing or whose lookups errored
    pub failed: u32,
    /// Candidates skipped before any external call
    pub skipped: u32,
    /// Cost accumulated across all successful generations this run
    pub total_cost_usd: f64,
}

/// Format a rating to the fixed 2-decimal precision used in storage.
pub fn format_rating(rating: f64) -> String {
    format!("{rating:.2}")
}

/// Errors that can occur during enrichment.
///
/// "No usable result" is not an error - adapters signal it with `Ok(None)`
/// so callers can tell a definitive miss apart from a transient failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EnrichmentError {
    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Rate limited - try again later")]
    RateLimited,

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),
}
