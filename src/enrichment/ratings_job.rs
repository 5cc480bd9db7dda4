//! Ratings enrichment job runner.
//!
//! Populates the external rating fields on books that were never
//! successfully matched, using a two-strategy fallback: ISBN lookup when
//! an ISBN is on file, title search otherwise. The selection query
//! over-fetches a pool larger than the batch cap so the ISBN-first
//! ordering survives slicing.
//!
//! A book that yields nothing gets its source marked `none`; a matched
//! book gets all four rating fields in one update. Adapter failures for
//! one book are caught and counted, never allowed to stop the batch.

use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::db;
use crate::enrichment::domain::{format_rating, EnrichmentError, RatingMatch, RunStats};
use crate::enrichment::governor::Governor;
use crate::enrichment::traits::RatingsApi;
use crate::error::{Error, Result};
use crate::model::BookRecord;

/// Tunables for the ratings job.
#[derive(Debug, Clone)]
pub struct RatingsJobConfig {
    /// Books attempted per run
    pub batch_size: u32,
    /// Selection pool size as a multiple of `batch_size`
    pub pool_multiplier: u32,
}

impl Default for RatingsJobConfig {
    fn default() -> Self {
        Self {
            batch_size: 15,
            pool_multiplier: 3,
        }
    }
}

/// Batch runner for ratings enrichment.
pub struct RatingsJobRunner<A, G> {
    pool: SqlitePool,
    api: A,
    governor: G,
    config: RatingsJobConfig,
}

impl<A: RatingsApi, G: Governor> RatingsJobRunner<A, G> {
    /// Create a runner with default tunables.
    pub fn new(pool: SqlitePool, api: A, governor: G) -> Self {
        Self::with_config(pool, api, governor, RatingsJobConfig::default())
    }

    /// Create a runner with custom tunables.
    pub fn with_config(
        pool: SqlitePool,
        api: A,
        governor: G,
        config: RatingsJobConfig,
    ) -> Self {
        Self {
            pool,
            api,
            governor,
            config,
        }
    }

    /// Run one batch of ratings lookups.
    pub async fn run(&self) -> Result<RunStats> {
        let pool_limit = self.config.batch_size * self.config.pool_multiplier;
        let mut candidates = db::rating_candidates(&self.pool, pool_limit).await?;
        candidates.truncate(self.config.batch_size as usize);

        info!(candidates = candidates.len(), "ratings job starting");
        self.process(&candidates).await
    }

    /// Work through an already-selected candidate list.
    async fn process(&self, candidates: &[BookRecord]) -> Result<RunStats> {
        let mut stats = RunStats::default();

        for book in candidates {
            // Defends against races with the over-fetched pool: the row may
            // have been matched since selection
            if book.has_confirmed_rating() {
                debug!(book_id = book.id, "already matched, skipping");
                stats.skipped += 1;
                continue;
            }

            match self.lookup(book).await {
                Ok(Some(matched)) => {
                    self.persist_match(book.id, &matched).await?;
                    debug!(
                        book_id = book.id,
                        rating = matched.rating,
                        "rating enriched"
                    );
                    stats.succeeded += 1;
                }
                Ok(None) => {
                    // Definitive miss: mark it so routine runs stop
                    // re-probing the same record every day
                    db::mark_rating_unmatched(&self.pool, book.id).await?;
                    debug!(book_id = book.id, "no rating found");
                    stats.failed += 1;
                }
                Err(e) => {
                    warn!(book_id = book.id, error = %e, "rating lookup failed");
                    db::mark_rating_unmatched(&self.pool, book.id).await?;
                    stats.failed += 1;
                }
            }
        }

        info!(
            succeeded = stats.succeeded,
            failed = stats.failed,
            skipped = stats.skipped,
            "ratings job finished"
        );
        Ok(stats)
    }

    /// Re-run the lookup for one book on demand.
    ///
    /// Tries a direct provider-id fetch first when an id is already on
    /// file (cheaper than re-searching), then the usual two strategies.
    /// Returns whether a rating was persisted. Does not touch run stats.
    pub async fn refresh_rating(&self, book_id: i64) -> Result<bool> {
        let book = db::get_book_by_id(&self.pool, book_id)
            .await?
            .ok_or(Error::BookNotFound(book_id))?;

        if let Some(provider_id) = book.external_rating_id.as_deref() {
            let outcome = self.api.fetch_by_id(provider_id).await;
            self.governor.pace().await;
            match outcome {
                Ok(Some(matched)) => {
                    self.persist_match(book.id, &matched).await?;
                    return Ok(true);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(book_id, provider_id, error = %e, "direct fetch failed");
                }
            }
        }

        match self.lookup(&book).await {
            Ok(Some(matched)) => {
                self.persist_match(book.id, &matched).await?;
                Ok(true)
            }
            Ok(None) => {
                db::mark_rating_unmatched(&self.pool, book.id).await?;
                Ok(false)
            }
            Err(e) => {
                warn!(book_id, error = %e, "rating refresh failed");
                Ok(false)
            }
        }
    }

    /// The two-strategy fallback.
    ///
    /// Strategy A: ISBN lookup, when an ISBN is on file. Strategy B:
    /// title[+author] search, when A produced nothing. The governor paces
    /// after every adapter call, hit or miss, before any early return.
    async fn lookup(&self, book: &BookRecord) -> std::result::Result<Option<RatingMatch>, EnrichmentError> {
        if let Some(isbn) = book.isbn.as_deref().filter(|s| !s.trim().is_empty()) {
            let outcome = self.api.search_by_isbn(isbn).await;
            self.governor.pace().await;
            if let Some(matched) = outcome? {
                return Ok(Some(matched));
            }
        }

        if book.has_title() {
            let outcome = self
                .api
                .search_by_title(&book.title, book.author.as_deref())
                .await;
            self.governor.pace().await;
            if let Some(matched) = outcome? {
                return Ok(Some(matched));
            }
        }

        Ok(None)
    }

    async fn persist_match(&self, book_id: i64, matched: &RatingMatch) -> Result<()> {
        db::record_rating_match(
            &self.pool,
            book_id,
            &matched.provider_id,
            &format_rating(matched.rating),
            matched.ratings_count,
        )
        .await?;
        Ok(())
    }
}
