//! OpenAI chat-completions HTTP client.
//!
//! One request per summary: a system instruction derived from the summary
//! type plus a user message assembled from whatever book fields we have.
//! Token usage comes back on every response and feeds the cost ledger.

use super::{adapter, dto};
use crate::enrichment::domain::{EnrichmentError, GeneratedSummary, SummaryRequest};
use crate::model::SummaryType;

/// OpenAI API client
pub struct OpenAiClient {
    api_key: String,
    model: String,
    http_client: reqwest::Client,
    base_url: String,
}

impl OpenAiClient {
    /// Create a new client with the given API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
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
            api_key: api_key.into(),
            model: model.into(),
            http_client,
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    /// Create a client for testing with custom base URL
    #[cfg(test)]
    pub fn with_base_url(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            http_client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Generate one summary.
    ///
    /// `Ok(None)` means the model answered but produced nothing usable;
    /// errors mean the request itself failed.
    pub async fn generate(
        &self,
        request: &SummaryRequest,
    ) -> Result<Option<GeneratedSummary>, EnrichmentError> {
        let response = self.send_completion_request(request).await?;
        adapter::to_generated_summary(response)
    }

    async fn send_completion_request(
        &self,
        request: &SummaryRequest,
    ) -> Result<dto::ChatResponse, EnrichmentError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": instruction_for(request.summary_type)},
                {"role": "user", "content": prompt_for(request)},
            ],
            "temperature": 0.4,
        });

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EnrichmentError::Network(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(EnrichmentError::RateLimited);
        }

        if !status.is_success() {
            // The error body carries a readable message; fall back to raw text
            let raw = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<dto::ErrorResponse>(&raw)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| raw.chars().take(200).collect());
            return Err(EnrichmentError::ApiError(format!(
                "HTTP {status}: {message}"
            )));
        }

        response
            .json::<dto::ChatResponse>()
            .await
            .map_err(|e| EnrichmentError::Parse(e.to_string()))
    }
}

/// System instruction for each summary type.
fn instruction_for(summary_type: SummaryType) -> &'static str {
    match summary_type {
        SummaryType::Overview => {
            "You summarize books for a personal library. Write a concise 2-3 \
             paragraph overview of the given book: what it is about, its scope, \
             and who it is for. Use only widely known information about the \
             book; if you do not know it, say so in one sentence."
        }
        SummaryType::KeyPoints => {
            "You summarize books for a personal library. List the 5-8 most \
             important points or takeaways of the given book as short bullet \
             lines. Use only widely known information about the book."
        }
        SummaryType::Topics => {
            "You summarize books for a personal library. List the main topics \
             and themes the given book covers, one per line, broadest first."
        }
        SummaryType::ReadingGuide => {
            "You summarize books for a personal library. Write a short reading \
             guide for the given book: suggested background, how to approach \
             the chapters, and 3-4 discussion questions."
        }
    }
}

/// User message assembled from whatever book fields are available.
fn prompt_for(request: &SummaryRequest) -> String {
    let mut prompt = format!("Title: {}", request.title);
    if let Some(ref author) = request.author {
        prompt.push_str(&format!("\nAuthor: {author}"));
    }
    if let Some(ref description) = request.description {
        prompt.push_str(&format!("\nDescription: {description}"));
    }
    if let Some(ref excerpt) = request.excerpt {
        prompt.push_str(&format!("\nExcerpt:\n{excerpt}"));
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = OpenAiClient::new("test-key", "gpt-4o-mini");
        assert_eq!(client.base_url, "https://api.openai.com/v1");
        assert_eq!(client.model, "gpt-4o-mini");
    }

    #[test]
    fn test_client_with_custom_url() {
        let client = OpenAiClient::with_base_url("key", "gpt-4o-mini", "http://localhost:8080");
        assert_eq!(client.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_prompt_includes_available_fields() {
        let request = SummaryRequest {
            title: "Dune".to_string(),
            author: Some("Frank Herbert".to_string()),
            description: Some("Desert planet epic".to_string()),
            excerpt: None,
            summary_type: SummaryType::Overview,
        };
        let prompt = prompt_for(&request);
        assert!(prompt.contains("Title: Dune"));
        assert!(prompt.contains("Author: Frank Herbert"));
        assert!(prompt.contains("Description: Desert planet epic"));
        assert!(!prompt.contains("Excerpt"));
    }

    #[test]
    fn test_prompt_title_only() {
        let request = SummaryRequest::from_book("Dune", None, None, SummaryType::Topics);
        assert_eq!(prompt_for(&request), "Title: Dune");
    }

    #[test]
    fn test_prompt_appends_excerpt_when_supplied() {
        let request = SummaryRequest {
            excerpt: Some("In the beginning...".to_string()),
            ..SummaryRequest::from_book("Dune", None, None, SummaryType::Overview)
        };
        let prompt = prompt_for(&request);
        assert!(prompt.ends_with("Excerpt:\nIn the beginning..."));
    }

    #[test]
    fn test_each_type_has_distinct_instruction() {
        let mut seen = std::collections::HashSet::new();
        for ty in SummaryType::ALL {
            assert!(seen.insert(instruction_for(ty)));
        }
    }
}
