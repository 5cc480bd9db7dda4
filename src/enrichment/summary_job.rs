//! AI summary job runner.
//!
//! Ensures every eligible book ends up with the full set of generated
//! summaries. The batch scan keys off the primary summary type: a book
//! without one is unprocessed. Each (book, type) pair is guarded by an
//! existence check, so an interrupted run resumes where it left off
//! without duplicate generation or duplicate cost.
//!
//! Failure isolation: a single type's failure never aborts the remaining
//! types or the remaining batch. Per-call pacing plus the batch cap bound
//! both run duration and per-run spend.

use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::db;
use crate::enrichment::domain::{RunStats, SummaryRequest};
use crate::enrichment::governor::Governor;
use crate::enrichment::traits::SummaryApi;
use crate::error::{Error, Result};
use crate::model::{BookRecord, SummaryRecord, SummaryType};

/// Days a generated summary is considered fresh.
pub const RETENTION_DAYS: i64 = 90;

/// Tunables for the summary job.
#[derive(Debug, Clone)]
pub struct SummaryJobConfig {
    /// Books per run; bounds per-run cost
    pub batch_size: u32,
    /// Retention horizon stamped on every new summary
    pub retention_days: i64,
}

impl Default for SummaryJobConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            retention_days: RETENTION_DAYS,
        }
    }
}

/// Result of a manual per-book generation request.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    /// True when no generation call errored
    pub success: bool,
    /// Types actually generated this call
    pub generated: Vec<SummaryType>,
    /// Cost accumulated this call
    pub cost_usd: f64,
}

/// What happened across one book's summary types.
struct TypeRunOutcome {
    generated: Vec<SummaryType>,
    errors: u32,
    cost_usd: f64,
}

/// Batch runner for AI summary generation.
pub struct SummaryJobRunner<A, G> {
    pool: SqlitePool,
    api: A,
    governor: G,
    config: SummaryJobConfig,
}

impl<A: SummaryApi, G: Governor> SummaryJobRunner<A, G> {
    /// Create a runner with default tunables.
    pub fn new(pool: SqlitePool, api: A, governor: G) -> Self {
        Self::with_config(pool, api, governor, SummaryJobConfig::default())
    }

    /// Create a runner with custom tunables.
    pub fn with_config(
        pool: SqlitePool,
        api: A,
        governor: G,
        config: SummaryJobConfig,
    ) -> Self {
        Self {
            pool,
            api,
            governor,
            config,
        }
    }

    /// Run one batch: select unprocessed books and generate every summary
    /// type for each.
    ///
    /// A candidate counts `succeeded` once all its types were attempted,
    /// even when some produced nothing - the per-type guard lets a later
    /// run fill the gaps. It counts `failed` only when at least one type
    /// errored and none produced anything.
    pub async fn run(&self) -> Result<RunStats> {
        let batch =
            db::books_missing_summary(&self.pool, SummaryType::PRIMARY, self.config.batch_size)
                .await?;

        info!(candidates = batch.len(), "summary job starting");
        let mut stats = RunStats::default();

        for book in &batch {
            if !book.has_title() {
                warn!(book_id = book.id, "skipping book without a title");
                stats.skipped += 1;
                continue;
            }

            let outcome = self.generate_types(book, &SummaryType::ALL).await?;
            stats.total_cost_usd += outcome.cost_usd;

            if outcome.generated.is_empty() && outcome.errors > 0 {
                stats.failed += 1;
            } else {
                stats.succeeded += 1;
            }
        }

        info!(
            succeeded = stats.succeeded,
            failed = stats.failed,
            skipped = stats.skipped,
            cost_usd = stats.total_cost_usd,
            "summary job finished"
        );
        Ok(stats)
    }

    /// Generate any missing summary types for one book.
    ///
    /// Existing types are left alone; pass `types` to restrict the set.
    pub async fn generate_for_book(
        &self,
        book_id: i64,
        types: Option<&[SummaryType]>,
    ) -> Result<GenerationReport> {
        let book = db::get_book_by_id(&self.pool, book_id)
            .await?
            .ok_or(Error::BookNotFound(book_id))?;

        if !book.has_title() {
            warn!(book_id, "cannot generate summaries for a book without a title");
            return Ok(GenerationReport {
                success: false,
                generated: vec![],
                cost_usd: 0.0,
            });
        }

        let outcome = self
            .generate_types(&book, types.unwrap_or(&SummaryType::ALL))
            .await?;

        Ok(GenerationReport {
            success: outcome.errors == 0,
            generated: outcome.generated,
            cost_usd: outcome.cost_usd,
        })
    }

    /// Force-regenerate one summary type for one book.
    ///
    /// Deletes the existing summary (if any) first, so at most one row
    /// per (book, type) ever exists. Returns the fresh record, or `None`
    /// when generation produced nothing or failed. Regenerating a type
    /// that does not exist yet is just first-time generation.
    pub async fn regenerate(
        &self,
        book_id: i64,
        summary_type: SummaryType,
    ) -> Result<Option<SummaryRecord>> {
        let book = db::get_book_by_id(&self.pool, book_id)
            .await?
            .ok_or(Error::BookNotFound(book_id))?;

        if !book.has_title() {
            warn!(book_id, "cannot regenerate a summary for a book without a title");
            return Ok(None);
        }

        let removed = db::delete_summary(&self.pool, book_id, summary_type).await?;
        if removed > 0 {
            debug!(book_id, %summary_type, "replaced existing summary");
        }

        let request = SummaryRequest::from_book(
            &book.title,
            book.author.as_deref(),
            book.description.as_deref(),
            summary_type,
        );
        let generated = self.api.generate(&request).await;
        self.governor.pace().await;

        match generated {
            Ok(Some(summary)) => {
                self.persist(book_id, summary_type, &summary).await?;
                Ok(db::get_summary(&self.pool, book_id, summary_type).await?)
            }
            Ok(None) => {
                debug!(book_id, %summary_type, "model produced no usable content");
                Ok(None)
            }
            Err(e) => {
                warn!(book_id, %summary_type, error = %e, "regeneration failed");
                Ok(None)
            }
        }
    }

    /// Attempt the given types for one book, in the fixed order.
    ///
    /// Adapter failures are contained here; only store errors propagate.
    async fn generate_types(
        &self,
        book: &BookRecord,
        types: &[SummaryType],
    ) -> Result<TypeRunOutcome> {
        let mut outcome = TypeRunOutcome {
            generated: vec![],
            errors: 0,
            cost_usd: 0.0,
        };

        for &summary_type in types {
            // Idempotency guard: already-satisfied pairs cost nothing
            if db::summary_exists(&self.pool, book.id, summary_type).await? {
                debug!(book_id = book.id, %summary_type, "summary already exists");
                continue;
            }

            let request = SummaryRequest::from_book(
                &book.title,
                book.author.as_deref(),
                book.description.as_deref(),
                summary_type,
            );
            let generated = self.api.generate(&request).await;
            // Pace after every call, success or failure
            self.governor.pace().await;

            match generated {
                Ok(Some(summary)) => {
                    self.persist(book.id, summary_type, &summary).await?;
                    outcome.cost_usd += summary.cost_usd;
                    outcome.generated.push(summary_type);
                }
                Ok(None) => {
                    // No persistent marker: a future run will retry
                    debug!(book_id = book.id, %summary_type, "model produced no usable content");
                }
                Err(e) => {
                    warn!(book_id = book.id, %summary_type, error = %e, "generation failed");
                    outcome.errors += 1;
                }
            }
        }

        Ok(outcome)
    }

    async fn persist(
        &self,
        book_id: i64,
        summary_type: SummaryType,
        summary: &crate::enrichment::domain::GeneratedSummary,
    ) -> Result<()> {
        let generated_at = chrono::Utc::now();
        let expires_at = generated_at + chrono::Duration::days(self.config.retention_days);

        db::insert_summary(
            &self.pool,
            &db::NewSummary {
                book_id,
                summary_type,
                content: summary.content.clone(),
                model_used: summary.model_used.clone(),
                input_tokens: summary.input_tokens,
                output_tokens: summary.output_tokens,
                cost_usd: summary.cost_usd,
                generated_at: generated_at.to_rfc3339(),
                expires_at: expires_at.to_rfc3339(),
            },
        )
        .await?;
        Ok(())
    }
}
