//! Database module for book and summary persistence.
//!
//! Uses SQLx with SQLite for lightweight, embedded database storage.
//! Provides async operations for:
//! - Book CRUD operations
//! - Enrichment batch-selection queries (books missing summaries,
//!   books awaiting a ratings lookup)
//! - Summary insert/delete and all-time aggregate stats
//!
//! # Example
//!
//! ```ignore
//! use shelf_minder::db::{init_db, books_missing_summary};
//!
//! let pool = init_db("sqlite:shelf.db").await?;
//! let batch = books_missing_summary(&pool, SummaryType::PRIMARY, 10).await?;
//! ```

use crate::model::{BookRecord, RatingSource, SummaryRecord, SummaryType};
use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

/// Default database filename.
pub const DEFAULT_DB_NAME: &str = "shelf_minder.db";

const BOOK_COLUMNS: &str = "id, title, author, description, isbn, \
     external_rating_source, external_rating, external_ratings_count, \
     external_rating_id, created_at";

/// Build a SQLite database URL from an optional path.
///
/// If no path is provided, uses [`DEFAULT_DB_NAME`] in the current directory.
pub fn db_url(path: Option<&std::path::Path>) -> String {
    match path {
        Some(p) => format!("sqlite:{}", p.display()),
        None => format!("sqlite:{}", DEFAULT_DB_NAME),
    }
}

/// Initialize the database connection pool and run migrations.
///
/// Creates the database file if it doesn't exist, establishes a connection
/// pool with up to 5 connections, and runs all pending migrations.
///
/// # Errors
///
/// Returns an error if:
/// - Database creation fails
/// - Connection cannot be established
/// - Migration fails
pub async fn init_db(db_url: &str) -> Result<SqlitePool, sqlx::Error> {
    if !sqlx::Sqlite::database_exists(db_url).await.unwrap_or(false) {
        sqlx::Sqlite::create_database(db_url).await?;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// Insert a new book record.
///
/// Rating fields start NULL (never attempted); the enrichment jobs fill
/// them in later. Returns the database ID of the new book.
pub async fn insert_book(
    pool: &SqlitePool,
    title: &str,
    author: Option<&str>,
    description: Option<&str>,
    isbn: Option<&str>,
) -> sqlx::Result<i64> {
    let result = sqlx::query(
        "INSERT INTO books (title, author, description, isbn, created_at) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(title)
    .bind(author)
    .bind(description)
    .bind(isbn)
    .bind(chrono::Utc::now().to_rfc3339())
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

/// Get a book by its database ID.
pub async fn get_book_by_id(pool: &SqlitePool, book_id: i64) -> sqlx::Result<Option<BookRecord>> {
    sqlx::query_as::<_, BookRecord>(&format!(
        "SELECT {BOOK_COLUMNS} FROM books WHERE id = ?"
    ))
    .bind(book_id)
    .fetch_optional(pool)
    .await
}

/// Get all books, ordered by ID.
pub async fn list_books(pool: &SqlitePool) -> sqlx::Result<Vec<BookRecord>> {
    sqlx::query_as::<_, BookRecord>(&format!(
        "SELECT {BOOK_COLUMNS} FROM books ORDER BY id"
    ))
    .fetch_all(pool)
    .await
}

/// Select books that have no summary of the given type yet.
///
/// This is the batch-selection query for the summary job: the primary
/// type's absence marks a book as unprocessed. Never returns more than
/// `limit` rows regardless of how many are eligible.
pub async fn books_missing_summary(
    pool: &SqlitePool,
    summary_type: SummaryType,
    limit: u32,
) -> sqlx::Result<Vec<BookRecord>> {
    sqlx::query_as::<_, BookRecord>(&format!(
        "SELECT {BOOK_COLUMNS} FROM books \
         WHERE id NOT IN (SELECT book_id FROM book_summaries WHERE summary_type = ?) \
         ORDER BY id \
         LIMIT ?"
    ))
    .bind(summary_type.as_str())
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Select books eligible for a ratings lookup.
///
/// Eligible means never successfully matched: the rating is unset, and the
/// source is either unset (never attempted) or marked `none` without a
/// provider id. Books carrying an ISBN sort first since the ISBN lookup is
/// far more precise than a title search; callers over-fetch a pool larger
/// than the batch cap so that ordering stays meaningful after slicing.
pub async fn rating_candidates(pool: &SqlitePool, limit: u32) -> sqlx::Result<Vec<BookRecord>> {
    sqlx::query_as::<_, BookRecord>(&format!(
        "SELECT {BOOK_COLUMNS} FROM books \
         WHERE external_rating IS NULL \
           AND (external_rating_source IS NULL \
                OR (external_rating_source = ? AND external_rating_id IS NULL)) \
         ORDER BY (CASE WHEN isbn IS NOT NULL AND isbn != '' THEN 0 ELSE 1 END), id \
         LIMIT ?"
    ))
    .bind(RatingSource::None.as_str())
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Persist a successful ratings match onto a book row.
///
/// Sets all four rating fields in one single-row update. `rating` must
/// already be formatted to 2 decimals by the caller.
pub async fn record_rating_match(
    pool: &SqlitePool,
    book_id: i64,
    provider_id: &str,
    rating: &str,
    ratings_count: i64,
) -> sqlx::Result<()> {
    sqlx::query(
        "UPDATE books SET external_rating_source = ?, external_rating = ?, \
         external_ratings_count = ?, external_rating_id = ? WHERE id = ?",
    )
    .bind(RatingSource::Goodreads.as_str())
    .bind(rating)
    .bind(ratings_count)
    .bind(provider_id)
    .bind(book_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Mark a book as attempted-but-unmatched.
///
/// Only the source marker changes; any other rating fields are left as
/// they are. Suppresses rescanning the book on every subsequent run.
pub async fn mark_rating_unmatched(pool: &SqlitePool, book_id: i64) -> sqlx::Result<()> {
    sqlx::query("UPDATE books SET external_rating_source = ? WHERE id = ?")
        .bind(RatingSource::None.as_str())
        .bind(book_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Fields for a new summary row, minus the auto-generated ID.
#[derive(Debug, Clone)]
pub struct NewSummary {
    pub book_id: i64,
    pub summary_type: SummaryType,
    pub content: String,
    pub model_used: String,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub cost_usd: f64,
    pub generated_at: String,
    pub expires_at: String,
}

/// Insert a summary row.
///
/// The UNIQUE(book_id, summary_type) constraint makes a duplicate insert
/// an error; callers guard with [`summary_exists`] or delete first.
pub async fn insert_summary(pool: &SqlitePool, summary: &NewSummary) -> sqlx::Result<i64> {
    let result = sqlx::query(
        "INSERT INTO book_summaries \
         (book_id, summary_type, content, model_used, input_tokens, output_tokens, \
          cost_usd, generated_at, expires_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(summary.book_id)
    .bind(summary.summary_type.as_str())
    .bind(&summary.content)
    .bind(&summary.model_used)
    .bind(summary.input_tokens)
    .bind(summary.output_tokens)
    .bind(summary.cost_usd)
    .bind(&summary.generated_at)
    .bind(&summary.expires_at)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

/// Delete the summary for one (book, type) pair.
///
/// Returns the number of rows removed (0 or 1).
pub async fn delete_summary(
    pool: &SqlitePool,
    book_id: i64,
    summary_type: SummaryType,
) -> sqlx::Result<u64> {
    let result = sqlx::query("DELETE FROM book_summaries WHERE book_id = ? AND summary_type = ?")
        .bind(book_id)
        .bind(summary_type.as_str())
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Check whether a summary exists for one (book, type) pair.
///
/// This is the idempotency guard: a run interrupted halfway resumes
/// without duplicate generation or duplicate cost.
pub async fn summary_exists(
    pool: &SqlitePool,
    book_id: i64,
    summary_type: SummaryType,
) -> sqlx::Result<bool> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT 1 FROM book_summaries WHERE book_id = ? AND summary_type = ?")
            .bind(book_id)
            .bind(summary_type.as_str())
            .fetch_optional(pool)
            .await?;
    Ok(row.is_some())
}

/// Get the summary for one (book, type) pair.
pub async fn get_summary(
    pool: &SqlitePool,
    book_id: i64,
    summary_type: SummaryType,
) -> sqlx::Result<Option<SummaryRecord>> {
    sqlx::query_as::<_, SummaryRecord>(
        "SELECT id, book_id, summary_type, content, model_used, input_tokens, \
         output_tokens, cost_usd, generated_at, expires_at \
         FROM book_summaries WHERE book_id = ? AND summary_type = ?",
    )
    .bind(book_id)
    .bind(summary_type.as_str())
    .fetch_optional(pool)
    .await
}

/// All-time summary aggregates across the whole store.
#[derive(Debug, Clone, Copy, PartialEq, sqlx::FromRow)]
pub struct SummaryStats {
    /// Total book rows
    pub total_books: i64,
    /// Distinct books with at least one summary
    pub books_with_summaries: i64,
    /// Total summary rows
    pub total_summaries: i64,
    /// Cumulative recorded generation cost in USD
    pub total_cost_usd: f64,
}

/// Aggregate summary statistics over all persisted rows (not just the
/// current run).
pub async fn summary_stats(pool: &SqlitePool) -> sqlx::Result<SummaryStats> {
    sqlx::query_as::<_, SummaryStats>(
        "SELECT \
            (SELECT COUNT(*) FROM books) AS total_books, \
            (SELECT COUNT(DISTINCT book_id) FROM book_summaries) AS books_with_summaries, \
            (SELECT COUNT(*) FROM book_summaries) AS total_summaries, \
            (SELECT COALESCE(SUM(cost_usd), 0.0) FROM book_summaries) AS total_cost_usd",
    )
    .fetch_one(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{seed_book, seed_summary, temp_db};

    #[tokio::test]
    async fn test_init_db_creates_database() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db_url = format!("sqlite:{}", db_path.display());

        let pool = init_db(&db_url).await.expect("Failed to init db");
        assert!(db_path.exists());

        let books = list_books(&pool).await.expect("Failed to query books");
        assert!(books.is_empty());
    }

    #[tokio::test]
    async fn test_insert_and_get_book() {
        let (pool, _dir) = temp_db().await;

        let id = insert_book(&pool, "Dune", Some("Frank Herbert"), None, Some("9780441013593"))
            .await
            .unwrap();
        assert!(id > 0);

        let book = get_book_by_id(&pool, id).await.unwrap().unwrap();
        assert_eq!(book.title, "Dune");
        assert_eq!(book.author.as_deref(), Some("Frank Herbert"));
        assert_eq!(book.isbn.as_deref(), Some("9780441013593"));
        assert!(book.external_rating_source.is_none());

        assert!(get_book_by_id(&pool, id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_books_missing_summary_respects_limit() {
        let (pool, _dir) = temp_db().await;

        for i in 0..25 {
            seed_book(&pool, &format!("Book {i}"), None).await;
        }

        let batch = books_missing_summary(&pool, SummaryType::PRIMARY, 10)
            .await
            .unwrap();
        assert_eq!(batch.len(), 10);
    }

    #[tokio::test]
    async fn test_books_missing_summary_excludes_processed() {
        let (pool, _dir) = temp_db().await;

        let a = seed_book(&pool, "Has Overview", None).await;
        let b = seed_book(&pool, "No Overview", None).await;
        seed_summary(&pool, a, SummaryType::Overview).await;
        // A non-primary type does not mark a book processed
        seed_summary(&pool, b, SummaryType::Topics).await;

        let batch = books_missing_summary(&pool, SummaryType::PRIMARY, 10)
            .await
            .unwrap();
        let ids: Vec<i64> = batch.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![b]);
    }

    #[tokio::test]
    async fn test_rating_candidates_prefer_isbn() {
        let (pool, _dir) = temp_db().await;

        let no_isbn = seed_book(&pool, "No ISBN", None).await;
        let with_isbn = seed_book(&pool, "With ISBN", Some("123")).await;

        let candidates = rating_candidates(&pool, 10).await.unwrap();
        let ids: Vec<i64> = candidates.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![with_isbn, no_isbn]);
    }

    #[tokio::test]
    async fn test_rating_candidates_excludes_matched_and_identified() {
        let (pool, _dir) = temp_db().await;

        let matched = seed_book(&pool, "Matched", Some("111")).await;
        record_rating_match(&pool, matched, "gr-9", "4.21", 42)
            .await
            .unwrap();

        let unmatched = seed_book(&pool, "Unmatched", Some("222")).await;
        mark_rating_unmatched(&pool, unmatched).await.unwrap();

        let fresh = seed_book(&pool, "Fresh", None).await;

        let candidates = rating_candidates(&pool, 10).await.unwrap();
        let ids: Vec<i64> = candidates.iter().map(|b| b.id).collect();
        // Matched books are out; 'none' books without a provider id stay in
        assert_eq!(ids, vec![unmatched, fresh]);
    }

    #[tokio::test]
    async fn test_record_rating_match_sets_all_fields() {
        let (pool, _dir) = temp_db().await;

        let id = seed_book(&pool, "Rated", Some("999")).await;
        record_rating_match(&pool, id, "gr1", "4.50", 120).await.unwrap();

        let book = get_book_by_id(&pool, id).await.unwrap().unwrap();
        assert_eq!(book.external_rating_source.as_deref(), Some("goodreads"));
        assert_eq!(book.external_rating.as_deref(), Some("4.50"));
        assert_eq!(book.external_ratings_count, Some(120));
        assert_eq!(book.external_rating_id.as_deref(), Some("gr1"));
        assert!(book.has_confirmed_rating());
    }

    #[tokio::test]
    async fn test_mark_unmatched_leaves_other_fields() {
        let (pool, _dir) = temp_db().await;

        let id = seed_book(&pool, "Bar", None).await;
        mark_rating_unmatched(&pool, id).await.unwrap();

        let book = get_book_by_id(&pool, id).await.unwrap().unwrap();
        assert_eq!(book.external_rating_source.as_deref(), Some("none"));
        assert!(book.external_rating.is_none());
        assert!(book.external_ratings_count.is_none());
        assert!(book.external_rating_id.is_none());
    }

    #[tokio::test]
    async fn test_summary_insert_exists_delete() {
        let (pool, _dir) = temp_db().await;

        let book_id = seed_book(&pool, "Summarized", None).await;
        assert!(!summary_exists(&pool, book_id, SummaryType::Overview).await.unwrap());

        seed_summary(&pool, book_id, SummaryType::Overview).await;
        assert!(summary_exists(&pool, book_id, SummaryType::Overview).await.unwrap());
        // Other types are tracked independently
        assert!(!summary_exists(&pool, book_id, SummaryType::Topics).await.unwrap());

        let removed = delete_summary(&pool, book_id, SummaryType::Overview).await.unwrap();
        assert_eq!(removed, 1);
        assert!(!summary_exists(&pool, book_id, SummaryType::Overview).await.unwrap());

        let removed_again = delete_summary(&pool, book_id, SummaryType::Overview).await.unwrap();
        assert_eq!(removed_again, 0);
    }

    #[tokio::test]
    async fn test_duplicate_summary_rejected() {
        let (pool, _dir) = temp_db().await;

        let book_id = seed_book(&pool, "Dup", None).await;
        seed_summary(&pool, book_id, SummaryType::Overview).await;

        let dup = NewSummary {
            book_id,
            summary_type: SummaryType::Overview,
            content: "again".to_string(),
            model_used: "test-model".to_string(),
            input_tokens: 1,
            output_tokens: 1,
            cost_usd: 0.0,
            generated_at: chrono::Utc::now().to_rfc3339(),
            expires_at: chrono::Utc::now().to_rfc3339(),
        };
        assert!(insert_summary(&pool, &dup).await.is_err());
    }

    #[tokio::test]
    async fn test_summary_stats_aggregates() {
        let (pool, _dir) = temp_db().await;

        let a = seed_book(&pool, "A", None).await;
        let b = seed_book(&pool, "B", None).await;
        let _c = seed_book(&pool, "C", None).await;

        for ty in [SummaryType::Overview, SummaryType::Topics] {
            let summary = NewSummary {
                book_id: a,
                summary_type: ty,
                content: "text".to_string(),
                model_used: "test-model".to_string(),
                input_tokens: 100,
                output_tokens: 50,
                cost_usd: 0.002,
                generated_at: chrono::Utc::now().to_rfc3339(),
                expires_at: chrono::Utc::now().to_rfc3339(),
            };
            insert_summary(&pool, &summary).await.unwrap();
        }
        seed_summary(&pool, b, SummaryType::Overview).await;

        let stats = summary_stats(&pool).await.unwrap();
        assert_eq!(stats.total_books, 3);
        assert_eq!(stats.books_with_summaries, 2);
        assert_eq!(stats.total_summaries, 3);
        assert!((stats.total_cost_usd - 0.004).abs() < 1e-9);
    }
}
