//! Goodreads HTTP client.
//!
//! Three lookups: by ISBN (precise), by title search (fallback), and by
//! provider id (cheapest, used by manual refresh when an id is already
//! on file). There is no formal API agreement with this provider, so the
//! ratings job paces these calls generously.
//!
//! A 404 means "this book is not in their catalog" - that is a normal
//! no-match, not an error.

use super::{adapter, dto};
use crate::enrichment::domain::{EnrichmentError, RatingMatch};

/// Goodreads API client
pub struct GoodreadsClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl GoodreadsClient {
    /// Create a new client. The API key is optional; anonymous requests
    /// work but may be throttled harder.
    pub fn new(api_key: Option<String>) -> Self {
        let http_client = reqwest::Client::builder()
            .gzip(true)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http_client,
            base_url: "https://www.goodreads.com".to_string(),
            api_key,
        }
    }

    /// Create a client for testing with custom base URL
    #[cfg(test)]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: None,
        }
    }

    /// Look up a book by ISBN.
    pub async fn search_by_isbn(
        &self,
        isbn: &str,
    ) -> Result<Option<RatingMatch>, EnrichmentError> {
        let url = self.keyed(format!(
            "{}/book/isbn/{}.json",
            self.base_url,
            urlencoding::encode(isbn)
        ));
        let Some(response) = self.get_json::<dto::BookResponse>(&url).await? else {
            return Ok(None);
        };
        Ok(response.book.and_then(adapter::to_rating_match))
    }

    /// Search for a book by title, optionally narrowed by author.
    pub async fn search_by_title(
        &self,
        title: &str,
        author: Option<&str>,
    ) -> Result<Option<RatingMatch>, EnrichmentError> {
        let query = match author {
            Some(author) => format!("{title} {author}"),
            None => title.to_string(),
        };
        let url = self.keyed(format!(
            "{}/search.json?q={}",
            self.base_url,
            urlencoding::encode(&query)
        ));
        let Some(response) = self.get_json::<dto::SearchResponse>(&url).await? else {
            return Ok(None);
        };
        Ok(adapter::best_search_match(response.results))
    }

    /// Fetch a book directly by its provider id.
    pub async fn fetch_by_id(
        &self,
        provider_id: &str,
    ) -> Result<Option<RatingMatch>, EnrichmentError> {
        let url = self.keyed(format!(
            "{}/book/show/{}.json",
            self.base_url,
            urlencoding::encode(provider_id)
        ));
        let Some(response) = self.get_json::<dto::BookResponse>(&url).await? else {
            return Ok(None);
        };
        Ok(response.book.and_then(adapter::to_rating_match))
    }

    /// Append the API key query parameter when one is configured.
    fn keyed(&self, url: String) -> String {
        match &self.api_key {
            Some(key) => {
                let sep = if url.contains('?') { '&' } else { '?' };
                format!("{url}{sep}key={}", urlencoding::encode(key))
            }
            None => url,
        }
    }

    /// GET a JSON payload; `Ok(None)` on 404.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<Option<T>, EnrichmentError> {
        let response = self
            .http_client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| EnrichmentError::Network(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(EnrichmentError::RateLimited);
        }

        if !status.is_success() {
            return Err(EnrichmentError::Network(format!(
                "HTTP {}: {}",
                status,
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        response
            .json::<T>()
            .await
            .map(Some)
            .map_err(|e| EnrichmentError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = GoodreadsClient::new(Some("test-key".to_string()));
        assert_eq!(client.base_url, "https://www.goodreads.com");
    }

    #[test]
    fn test_keyed_appends_api_key() {
        let mut client = GoodreadsClient::with_base_url("http://localhost");
        client.api_key = Some("k&y".to_string());

        let bare = client.keyed("http://localhost/book/isbn/1.json".to_string());
        assert_eq!(bare, "http://localhost/book/isbn/1.json?key=k%26y");

        let with_query = client.keyed("http://localhost/search.json?q=dune".to_string());
        assert_eq!(with_query, "http://localhost/search.json?q=dune&key=k%26y");
    }

    #[test]
    fn test_keyed_without_api_key_is_identity() {
        let client = GoodreadsClient::with_base_url("http://localhost");
        let url = client.keyed("http://localhost/search.json?q=dune".to_string());
        assert_eq!(url, "http://localhost/search.json?q=dune");
    }
}
