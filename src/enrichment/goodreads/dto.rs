//! Goodreads API DTOs.
//!
//! Exact response shapes for the three endpoints we call. Converted to
//! domain types by the adapter, never used directly in business logic.

use serde::Deserialize;

/// Response for the by-ISBN and by-id book endpoints.
#[derive(Debug, Deserialize)]
pub struct BookResponse {
    pub book: Option<BookStub>,
}

/// A single book entry as the provider returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct BookStub {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub ratings_count: Option<i64>,
}

/// Response for the title search endpoint.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<BookStub>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_book_response() {
        let json = r#"{"book": {"id": 234225, "title": "Dune", "average_rating": 4.27, "ratings_count": 1400000}}"#;
        let response: BookResponse = serde_json::from_str(json).unwrap();
        let book = response.book.unwrap();
        assert_eq!(book.id, 234225);
        assert_eq!(book.average_rating, Some(4.27));
        assert_eq!(book.ratings_count, Some(1400000));
    }

    #[test]
    fn test_parse_empty_book_response() {
        let response: BookResponse = serde_json::from_str(r#"{"book": null}"#).unwrap();
        assert!(response.book.is_none());
    }

    #[test]
    fn test_parse_search_response() {
        let json = r#"{"results": [
            {"id": 1, "title": "Foo", "average_rating": 3.9, "ratings_count": 12},
            {"id": 2, "title": "Foo Revisited"}
        ]}"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.results.len(), 2);
        assert!(response.results[1].average_rating.is_none());
    }

    #[test]
    fn test_parse_search_response_missing_results() {
        let response: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(response.results.is_empty());
    }
}
