//! Trait definitions for external API clients.
//!
//! These traits enable dependency injection and mocking for tests.
//! Production code uses the real client implementations, while tests
//! can substitute mock implementations.
//!
//! Both traits share one convention: `Ok(None)` is a definitive "nothing
//! usable" answer, `Err` is a failed request. The job runners treat the
//! two very differently.

use async_trait::async_trait;

use super::domain::{EnrichmentError, GeneratedSummary, RatingMatch, SummaryRequest};

/// Trait for AI summary generation.
///
/// Implement this trait to create mock implementations for testing.
#[async_trait]
pub trait SummaryApi: Send + Sync {
    /// Generate one summary for one (book, type) pair.
    async fn generate(
        &self,
        request: &SummaryRequest,
    ) -> Result<Option<GeneratedSummary>, EnrichmentError>;
}

/// Trait for ratings lookups.
///
/// Implement this trait to create mock implementations for testing.
#[async_trait]
pub trait RatingsApi: Send + Sync {
    /// Look up a book by ISBN.
    async fn search_by_isbn(&self, isbn: &str) -> Result<Option<RatingMatch>, EnrichmentError>;

    /// Search for a book by title, optionally narrowed by author.
    async fn search_by_title(
        &self,
        title: &str,
        author: Option<&str>,
    ) -> Result<Option<RatingMatch>, EnrichmentError>;

    /// Fetch a book directly by its provider id.
    async fn fetch_by_id(
        &self,
        provider_id: &str,
    ) -> Result<Option<RatingMatch>, EnrichmentError>;
}

// Implement traits for real clients

#[async_trait]
impl SummaryApi for super::openai::OpenAiClient {
    async fn generate(
        &self,
        request: &SummaryRequest,
    ) -> Result<Option<GeneratedSummary>, EnrichmentError> {
        self.generate(request).await
    }
}

#[async_trait]
impl RatingsApi for super::goodreads::GoodreadsClient {
    async fn search_by_isbn(&self, isbn: &str) -> Result<Option<RatingMatch>, EnrichmentError> {
        self.search_by_isbn(isbn).await
    }

    async fn search_by_title(
        &self,
        title: &str,
        author: Option<&str>,
    ) -> Result<Option<RatingMatch>, EnrichmentError> {
        self.search_by_title(title, author).await
    }

    async fn fetch_by_id(
        &self,
        provider_id: &str,
    ) -> Result<Option<RatingMatch>, EnrichmentError> {
        self.fetch_by_id(provider_id).await
    }
}
