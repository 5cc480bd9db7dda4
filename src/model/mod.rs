//! Core data models for the book library.
//!
//! Defines the primary entities: [`BookRecord`] and [`SummaryRecord`],
//! plus the closed enums used by the enrichment pipeline. These are
//! derived from SQLx for database mapping.
//!
//! # Database Schema
//!
//! The models map to the following tables:
//! - `books` - Book records with optional rating fields
//! - `book_summaries` - One generated summary per (book, summary type)

use sqlx::FromRow;

/// A book in the library.
///
/// Rating fields are populated by the ratings enrichment job and are
/// never touched by anything else. `external_rating` is stored as a
/// fixed 2-decimal string (e.g. "4.50") so the persisted value is exact.
#[derive(Debug, Clone, FromRow)]
pub struct BookRecord {
    /// Database ID (auto-generated)
    pub id: i64,
    /// Book title (required for any enrichment attempt)
    pub title: String,
    /// Author name
    pub author: Option<String>,
    /// Description / blurb, used as context for summary generation
    pub description: Option<String>,
    /// ISBN-10 or ISBN-13, preferred key for ratings lookup
    pub isbn: Option<String>,
    /// NULL = never attempted, "goodreads" = matched, "none" = attempted, no match
    pub external_rating_source: Option<String>,
    /// Average rating as a 2-decimal string
    pub external_rating: Option<String>,
    /// Number of ratings behind the average
    pub external_ratings_count: Option<i64>,
    /// Provider-side book id, kept for cheap re-fetches
    pub external_rating_id: Option<String>,
    /// RFC 3339 creation timestamp
    pub created_at: String,
}

impl BookRecord {
    /// Whether this record carries enough data to attempt summary generation.
    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }

    /// Whether a prior ratings lookup already matched this book.
    pub fn has_confirmed_rating(&self) -> bool {
        self.external_rating_id.is_some()
            && self
                .external_rating_source
                .as_deref()
                .and_then(RatingSource::parse)
                == Some(RatingSource::Goodreads)
    }
}

/// One generated summary artifact for one (book, summary type) pair.
///
/// At most one row exists per pair at any time; regeneration deletes the
/// old row and inserts a fresh one rather than updating in place.
#[derive(Debug, Clone, FromRow)]
pub struct SummaryRecord {
    /// Database ID (auto-generated)
    pub id: i64,
    /// Foreign key to books
    pub book_id: i64,
    /// Summary type tag (one of [`SummaryType`]'s strings)
    pub summary_type: String,
    /// Generated text
    pub content: String,
    /// Model that produced the text
    pub model_used: String,
    /// Prompt tokens consumed
    pub input_tokens: i64,
    /// Completion tokens consumed
    pub output_tokens: i64,
    /// Computed generation cost in USD
    pub cost_usd: f64,
    /// RFC 3339 generation timestamp
    pub generated_at: String,
    /// RFC 3339 retention horizon (generated_at + 90 days)
    pub expires_at: String,
}

/// The fixed set of summary kinds generated per book.
///
/// `Overview` doubles as the existence marker: the batch job treats a book
/// without an overview summary as unprocessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SummaryType {
    Overview,
    KeyPoints,
    Topics,
    ReadingGuide,
}

impl SummaryType {
    /// The type whose presence marks a book as processed.
    pub const PRIMARY: SummaryType = SummaryType::Overview;

    /// All types, in the fixed generation order.
    pub const ALL: [SummaryType; 4] = [
        SummaryType::Overview,
        SummaryType::KeyPoints,
        SummaryType::Topics,
        SummaryType::ReadingGuide,
    ];

    /// Database / wire tag for this type.
    pub fn as_str(self) -> &'static str {
        match self {
            SummaryType::Overview => "overview",
            SummaryType::KeyPoints => "key_points",
            SummaryType::Topics => "topics",
            SummaryType::ReadingGuide => "reading_guide",
        }
    }

    /// Parse a database tag back into a type.
    pub fn parse(s: &str) -> Option<SummaryType> {
        match s {
            "overview" => Some(SummaryType::Overview),
            "key_points" => Some(SummaryType::KeyPoints),
            "topics" => Some(SummaryType::Topics),
            "reading_guide" => Some(SummaryType::ReadingGuide),
            _ => None,
        }
    }
}

impl std::fmt::Display for SummaryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome tag for a ratings lookup, stored in `books.external_rating_source`.
///
/// The unset state is the SQL NULL, not a variant - a NULL row has never
/// been attempted, a `none` row was attempted and found nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingSource {
    /// Matched on Goodreads
    Goodreads,
    /// Attempted, no usable match
    None,
}

impl RatingSource {
    /// Database tag for this source.
    pub fn as_str(self) -> &'static str {
        match self {
            RatingSource::Goodreads => "goodreads",
            RatingSource::None => "none",
        }
    }

    /// Parse a database tag back into a source.
    pub fn parse(s: &str) -> Option<RatingSource> {
        match s {
            "goodreads" => Some(RatingSource::Goodreads),
            "none" => Some(RatingSource::None),
            _ => None,
        }
    }
}

impl std::fmt::Display for RatingSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
