//! CLI command definitions and handlers.
//!
//! Each subcommand is implemented as a function that takes the parsed
//! arguments and returns an `anyhow::Result<()>`. The enrichment commands
//! are the scheduler's trigger surface: a cron entry invoking
//! `shelf-minder enrich-summaries` and `enrich-ratings` daily is the
//! intended deployment. Repeated invocations of the same job must be
//! serialized by the caller; different jobs may overlap freely.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::runtime::Runtime;
use tracing::warn;

use crate::enrichment::{
    GoodreadsClient, IntervalGovernor, OpenAiClient, RatingsJobConfig, RatingsJobRunner,
    SummaryJobConfig, SummaryJobRunner,
};
use crate::model::SummaryType;
use crate::{config, db};

/// Shelf Minder CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Database path (defaults to shelf_minder.db in the current directory)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Add a book to the library
    Add {
        /// Book title
        title: String,
        /// Author name
        #[arg(long)]
        author: Option<String>,
        /// Description / blurb (context for summary generation)
        #[arg(long)]
        description: Option<String>,
        /// ISBN (preferred key for ratings lookup)
        #[arg(long)]
        isbn: Option<String>,
    },
    /// List all books with their enrichment state
    List,
    /// Run one batch of AI summary generation
    EnrichSummaries {
        /// OpenAI API key (or set OPENAI_API_KEY env var)
        #[arg(short, long, env = "OPENAI_API_KEY")]
        api_key: Option<String>,
    },
    /// Run one batch of external ratings lookups
    EnrichRatings {
        /// Goodreads API key (or set GOODREADS_API_KEY env var)
        #[arg(short, long, env = "GOODREADS_API_KEY")]
        api_key: Option<String>,
    },
    /// Generate missing summaries for one book
    Summarize {
        /// Book id
        id: i64,
        /// Restrict to specific summary types (default: all)
        #[arg(long, value_enum)]
        types: Vec<SummaryType>,
        /// OpenAI API key (or set OPENAI_API_KEY env var)
        #[arg(short, long, env = "OPENAI_API_KEY")]
        api_key: Option<String>,
    },
    /// Force-regenerate one summary type for one book
    Regenerate {
        /// Book id
        id: i64,
        /// Summary type to replace
        #[arg(value_enum)]
        summary_type: SummaryType,
        /// OpenAI API key (or set OPENAI_API_KEY env var)
        #[arg(short, long, env = "OPENAI_API_KEY")]
        api_key: Option<String>,
    },
    /// Re-run the ratings lookup for one book
    RefreshRating {
        /// Book id
        id: i64,
        /// Goodreads API key (or set GOODREADS_API_KEY env var)
        #[arg(short, long, env = "GOODREADS_API_KEY")]
        api_key: Option<String>,
    },
    /// Show all-time summary statistics
    Stats,
    /// Write a default config file to the OS config directory
    InitConfig,
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let rt = Runtime::new()?;
    let db_path = cli.db.as_deref();

    match &cli.command {
        Commands::Add {
            title,
            author,
            description,
            isbn,
        } => cmd_add(
            &rt,
            db_path,
            title,
            author.as_deref(),
            description.as_deref(),
            isbn.as_deref(),
        ),
        Commands::List => cmd_list(&rt, db_path),
        Commands::EnrichSummaries { api_key } => {
            cmd_enrich_summaries(&rt, db_path, api_key.as_deref())
        }
        Commands::EnrichRatings { api_key } => {
            cmd_enrich_ratings(&rt, db_path, api_key.as_deref())
        }
        Commands::Summarize { id, types, api_key } => {
            cmd_summarize(&rt, db_path, *id, types, api_key.as_deref())
        }
        Commands::Regenerate {
            id,
            summary_type,
            api_key,
        } => cmd_regenerate(&rt, db_path, *id, *summary_type, api_key.as_deref()),
        Commands::RefreshRating { id, api_key } => {
            cmd_refresh_rating(&rt, db_path, *id, api_key.as_deref())
        }
        Commands::Stats => cmd_stats(&rt, db_path),
        Commands::InitConfig => cmd_init_config(),
    }
}

/// Resolve the OpenAI key: CLI/env first, then the config file.
fn openai_key(arg: Option<&str>, config: &config::Config) -> Option<String> {
    arg.map(String::from)
        .or_else(|| config.credentials.openai_api_key.clone())
}

/// Resolve the Goodreads key: CLI/env first, then the config file.
fn goodreads_key(arg: Option<&str>, config: &config::Config) -> Option<String> {
    arg.map(String::from)
        .or_else(|| config.credentials.goodreads_api_key.clone())
}

fn cmd_add(
    rt: &Runtime,
    db_path: Option<&std::path::Path>,
    title: &str,
    author: Option<&str>,
    description: Option<&str>,
    isbn: Option<&str>,
) -> anyhow::Result<()> {
    rt.block_on(async {
        let pool = db::init_db(&db::db_url(db_path)).await?;
        let id = db::insert_book(&pool, title, author, description, isbn).await?;
        println!("Added book {id}: {title}");
        Ok(())
    })
}

fn cmd_list(rt: &Runtime, db_path: Option<&std::path::Path>) -> anyhow::Result<()> {
    rt.block_on(async {
        let pool = db::init_db(&db::db_url(db_path)).await?;
        let books = db::list_books(&pool).await?;

        if books.is_empty() {
            println!("No books in the library yet.");
            return Ok(());
        }

        for book in &books {
            let rating = match (&book.external_rating, &book.external_rating_source) {
                (Some(rating), _) => format!("{rating} stars"),
                (None, Some(source)) if source == "none" => "no match".to_string(),
                _ => "not looked up".to_string(),
            };
            let author = book.author.as_deref().unwrap_or("unknown author");
            println!("{:>4}  {} - {} [{}]", book.id, book.title, author, rating);
        }
        println!("{} book(s)", books.len());
        Ok(())
    })
}

fn cmd_enrich_summaries(
    rt: &Runtime,
    db_path: Option<&std::path::Path>,
    api_key_arg: Option<&str>,
) -> anyhow::Result<()> {
    rt.block_on(async {
        let config = config::load();
        // Deployments without the AI capability configured are fine:
        // the job just reports and does nothing
        let Some(api_key) = openai_key(api_key_arg, &config) else {
            warn!("No OpenAI API key configured; summary job skipped");
            println!("Summary job skipped: no OpenAI API key configured.");
            return Ok(());
        };

        let pool = db::init_db(&db::db_url(db_path)).await?;
        let client = OpenAiClient::new(api_key, &config.enrichment.summary_model);
        let governor = IntervalGovernor::from_millis(config.enrichment.summary_pace_ms);
        let job = SummaryJobRunner::with_config(
            pool,
            client,
            governor,
            SummaryJobConfig {
                batch_size: config.enrichment.summary_batch_size,
                ..Default::default()
            },
        );

        let stats = job.run().await?;
        println!(
            "Summaries: {} succeeded, {} failed, {} skipped, ${:.4} spent",
            stats.succeeded, stats.failed, stats.skipped, stats.total_cost_usd
        );
        Ok(())
    })
}

fn cmd_enrich_ratings(
    rt: &Runtime,
    db_path: Option<&std::path::Path>,
    api_key_arg: Option<&str>,
) -> anyhow::Result<()> {
    rt.block_on(async {
        let config = config::load();
        let pool = db::init_db(&db::db_url(db_path)).await?;
        let client = GoodreadsClient::new(goodreads_key(api_key_arg, &config));
        let governor = IntervalGovernor::from_millis(config.enrichment.ratings_pace_ms);
        let job = RatingsJobRunner::with_config(
            pool,
            client,
            governor,
            RatingsJobConfig {
                batch_size: config.enrichment.ratings_batch_size,
                ..Default::default()
            },
        );

        let stats = job.run().await?;
        println!(
            "Ratings: {} enriched, {} failed, {} skipped",
            stats.succeeded, stats.failed, stats.skipped
        );
        Ok(())
    })
}

fn cmd_summarize(
    rt: &Runtime,
    db_path: Option<&std::path::Path>,
    id: i64,
    types: &[SummaryType],
    api_key_arg: Option<&str>,
) -> anyhow::Result<()> {
    rt.block_on(async {
        let config = config::load();
        let Some(api_key) = openai_key(api_key_arg, &config) else {
            anyhow::bail!("No OpenAI API key configured");
        };

        let pool = db::init_db(&db::db_url(db_path)).await?;
        let client = OpenAiClient::new(api_key, &config.enrichment.summary_model);
        let governor = IntervalGovernor::from_millis(config.enrichment.summary_pace_ms);
        let job = SummaryJobRunner::new(pool, client, governor);

        let requested = if types.is_empty() { None } else { Some(types) };
        let report = job.generate_for_book(id, requested).await?;

        if report.generated.is_empty() {
            println!("Nothing generated for book {id} (already complete, or no usable content).");
        } else {
            let names: Vec<&str> = report.generated.iter().map(|t| t.as_str()).collect();
            println!(
                "Generated {} for book {id} (${:.4})",
                names.join(", "),
                report.cost_usd
            );
        }
        if !report.success {
            anyhow::bail!("Some summary types failed; see log for details");
        }
        Ok(())
    })
}

fn cmd_regenerate(
    rt: &Runtime,
    db_path: Option<&std::path::Path>,
    id: i64,
    summary_type: SummaryType,
    api_key_arg: Option<&str>,
) -> anyhow::Result<()> {
    rt.block_on(async {
        let config = config::load();
        let Some(api_key) = openai_key(api_key_arg, &config) else {
            anyhow::bail!("No OpenAI API key configured");
        };

        let pool = db::init_db(&db::db_url(db_path)).await?;
        let client = OpenAiClient::new(api_key, &config.enrichment.summary_model);
        let governor = IntervalGovernor::from_millis(config.enrichment.summary_pace_ms);
        let job = SummaryJobRunner::new(pool, client, governor);

        match job.regenerate(id, summary_type).await? {
            Some(record) => {
                println!(
                    "Regenerated {summary_type} for book {id} (${:.4}):\n\n{}",
                    record.cost_usd, record.content
                );
                Ok(())
            }
            None => anyhow::bail!("Regeneration produced no summary"),
        }
    })
}

fn cmd_refresh_rating(
    rt: &Runtime,
    db_path: Option<&std::path::Path>,
    id: i64,
    api_key_arg: Option<&str>,
) -> anyhow::Result<()> {
    rt.block_on(async {
        let config = config::load();
        let pool = db::init_db(&db::db_url(db_path)).await?;
        let client = GoodreadsClient::new(goodreads_key(api_key_arg, &config));
        let governor = IntervalGovernor::from_millis(config.enrichment.ratings_pace_ms);
        let job = RatingsJobRunner::new(pool.clone(), client, governor);

        if job.refresh_rating(id).await? {
            let book = db::get_book_by_id(&pool, id).await?;
            let rating = book
                .and_then(|b| b.external_rating)
                .unwrap_or_else(|| "?".to_string());
            println!("Book {id} rating refreshed: {rating} stars");
        } else {
            println!("No rating found for book {id}");
        }
        Ok(())
    })
}

fn cmd_stats(rt: &Runtime, db_path: Option<&std::path::Path>) -> anyhow::Result<()> {
    rt.block_on(async {
        let pool = db::init_db(&db::db_url(db_path)).await?;
        let stats = db::summary_stats(&pool).await?;
        println!("Books:                {}", stats.total_books);
        println!("Books with summaries: {}", stats.books_with_summaries);
        println!("Summaries:            {}", stats.total_summaries);
        println!("Total generation cost: ${:.4}", stats.total_cost_usd);
        Ok(())
    })
}

fn cmd_init_config() -> anyhow::Result<()> {
    let config = config::Config::default();
    config::save(&config)?;
    match config::config_path() {
        Some(path) => println!("Wrote default config to {}", path.display()),
        None => println!("Wrote default config"),
    }
    Ok(())
}
