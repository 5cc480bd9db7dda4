//! Adapter layer: convert OpenAI DTOs to domain models.
//!
//! This is the ONLY place where OpenAI response types become domain
//! types. The provider reports token usage but not dollars, so the cost
//! figure is computed here from a per-model rate table.

use super::dto;
use crate::enrichment::domain::{EnrichmentError, GeneratedSummary};

/// USD per million tokens for one model.
#[derive(Debug, Clone, Copy)]
pub struct ModelRates {
    pub input_per_mtok: f64,
    pub output_per_mtok: f64,
}

impl ModelRates {
    /// Published rates for the models we generate with.
    ///
    /// Snapshot names ("gpt-4o-mini-2024-07-18") bill at the alias rate,
    /// so match on prefix. Unknown models fall back to the mini rate; the
    /// cost figure is bookkeeping, not billing.
    pub fn for_model(model: &str) -> ModelRates {
        if model.starts_with("gpt-4o-mini") {
            ModelRates { input_per_mtok: 0.15, output_per_mtok: 0.60 }
        } else if model.starts_with("gpt-4o") {
            ModelRates { input_per_mtok: 2.50, output_per_mtok: 10.00 }
        } else if model.starts_with("gpt-4.1-mini") {
            ModelRates { input_per_mtok: 0.40, output_per_mtok: 1.60 }
        } else {
            ModelRates { input_per_mtok: 0.15, output_per_mtok: 0.60 }
        }
    }

    /// Cost in USD for the given token counts.
    pub fn cost(&self, input_tokens: i64, output_tokens: i64) -> f64 {
        (input_tokens as f64 * self.input_per_mtok
            + output_tokens as f64 * self.output_per_mtok)
            / 1_000_000.0
    }
}

/// Convert a chat completion response into a generated summary.
///
/// Returns `Ok(None)` when the model produced no usable text (empty or
/// missing content) - callers treat that as a definitive miss, distinct
/// from an error.
pub fn to_generated_summary(
    response: dto::ChatResponse,
) -> Result<Option<GeneratedSummary>, EnrichmentError> {
    let model_used = response.model;
    let (input_tokens, output_tokens) = response
        .usage
        .map(|u| (u.prompt_tokens, u.completion_tokens))
        .unwrap_or((0, 0));

    let Some(choice) = response.choices.into_iter().next() else {
        return Err(EnrichmentError::InvalidResponse(
            "response contains no choices".to_string(),
        ));
    };

    let content = choice
        .message
        .content
        .map(|c| c.trim().to_string())
        .unwrap_or_default();

    if content.is_empty() {
        return Ok(None);
    }

    let cost_usd = ModelRates::for_model(&model_used).cost(input_tokens, output_tokens);

    Ok(Some(GeneratedSummary {
        content,
        model_used,
        input_tokens,
        output_tokens,
        cost_usd,
    }))
}
