//! Book enrichment module - fills in AI summaries and external ratings
//! from rate-limited third-party services.
//!
//! # Architecture
//!
//! This module follows a clean separation between:
//! - **Domain models** (`domain.rs`) - Internal types that represent our business logic
//! - **API DTOs** (`openai/dto.rs`, `goodreads/dto.rs`) - Exact API response shapes
//! - **Adapters** - Convert DTOs to domain models
//! - **Clients** - HTTP clients for external APIs
//! - **Governor** - Minimum spacing between external calls, per source
//! - **Job runners** - Batch orchestration with per-record failure isolation
//!
//! This decoupling means:
//! 1. API changes don't ripple through our codebase
//! 2. We can test API contracts independently
//! 3. We can swap providers without changing business logic
//!
//! # Usage
//!
//! ```ignore
//! use enrichment::{SummaryJobRunner, IntervalGovernor, OpenAiClient};
//!
//! let client = OpenAiClient::new(api_key, "gpt-4o-mini");
//! let governor = IntervalGovernor::from_millis(1000);
//! let job = SummaryJobRunner::new(pool, client, governor);
//! let stats = job.run().await?;
//! ```
//!
//! Both jobs are designed for unattended scheduled runs: batch caps bound
//! per-run cost, per-pair existence checks make re-runs free, and a
//! failure on one record never aborts the rest of the batch.

pub mod domain;
pub mod goodreads;
pub mod governor;
pub mod openai;
pub mod ratings_job;
pub mod summary_job;
pub mod traits;

pub use domain::{EnrichmentError, GeneratedSummary, RatingMatch, RunStats, SummaryRequest};
pub use goodreads::GoodreadsClient;
pub use governor::{Governor, IntervalGovernor};
pub use openai::OpenAiClient;
pub use ratings_job::{RatingsJobConfig, RatingsJobRunner};
pub use summary_job::{GenerationReport, SummaryJobConfig, SummaryJobRunner};
pub use traits::{RatingsApi, SummaryApi};
