//! Test utilities and fixtures for shelf-minder tests.
//!
//! This module provides common test helpers and database utilities to
//! reduce boilerplate in tests.
//!
//! # Example
//!
//! ```ignore
//! use shelf_minder::test_utils::{temp_db, seed_book};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let (pool, _dir) = temp_db().await;
//!     let id = seed_book(&pool, "Dune", Some("9780441013593")).await;
//!     // ... test logic
//! }
//! ```

use sqlx::sqlite::SqlitePool;
use tempfile::TempDir;

use crate::db::NewSummary;
use crate::model::SummaryType;

/// Creates a temporary database for testing.
///
/// The database is created in a temporary directory that is automatically
/// cleaned up when the returned `TempDir` is dropped. Migrations are run
/// automatically.
///
/// # Returns
///
/// A tuple of (connection pool, temp directory handle).
/// Keep the TempDir alive for the duration of your test.
pub async fn temp_db() -> (SqlitePool, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = dir.path().join("test.db");
    let db_url = format!("sqlite:{}", db_path.display());

    let pool = crate::db::init_db(&db_url)
        .await
        .expect("Failed to initialize test database");

    (pool, dir)
}

/// Insert a book with the given title and optional ISBN, returning its id.
///
/// All other fields start in their untouched state, which is exactly what
/// the enrichment batch queries select for.
pub async fn seed_book(pool: &SqlitePool, title: &str, isbn: Option<&str>) -> i64 {
    crate::db::insert_book(pool, title, None, None, isbn)
        .await
        .expect("Failed to seed book")
}

/// Insert a minimal zero-cost summary row for one (book, type) pair.
pub async fn seed_summary(pool: &SqlitePool, book_id: i64, summary_type: SummaryType) {
    let now = chrono::Utc::now();
    let summary = NewSummary {
        book_id,
        summary_type,
        content: "seeded summary".to_string(),
        model_used: "test-model".to_string(),
        input_tokens: 0,
        output_tokens: 0,
        cost_usd: 0.0,
        generated_at: now.to_rfc3339(),
        expires_at: (now + chrono::Duration::days(90)).to_rfc3339(),
    };
    crate::db::insert_summary(pool, &summary)
        .await
        .expect("Failed to seed summary");
}
