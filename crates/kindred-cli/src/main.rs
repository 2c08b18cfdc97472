//! Kindred CLI - search the community corpus from the terminal

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, anyhow};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use kindred_core::config::Config;
use kindred_core::domain::search::{
    Cursor, DateRange, EntityType, JsonFileKeyValueStore, RecentQueryStore, SearchFilters,
    SearchQuery, SearchResult, SearchService, SearchSession, SearchType, SortBy,
};
use kindred_core::storage::{Corpus, Database, DatabaseConfig};
use tracing::debug;

#[derive(Parser)]
#[command(name = "kindred")]
#[command(author, version, about = "Search the Kindred community corpus", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Database file (overrides storage.database_path)
    #[arg(long, global = true)]
    database: Option<PathBuf>,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, Debug, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a JSON corpus (posts, communities, profiles)
    Seed {
        /// Corpus file
        file: PathBuf,
    },

    /// Search posts, groups and profiles
    Search(SearchArgs),

    /// Autocomplete a partial term
    Suggest {
        /// Partial search term
        partial: String,
        /// Restrict to one entity type (content, group, profile)
        #[arg(short = 't', long = "type")]
        entity_type: Option<String>,
    },

    /// Recent searches
    Recent {
        #[command(subcommand)]
        action: RecentAction,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Args, Debug)]
struct SearchArgs {
    /// Search term
    term: String,
    /// Entity type to search (all, content, group, profile)
    #[arg(short = 't', long = "type", default_value = "all")]
    search_type: String,
    /// Sort order (relevance, newest, popular); defaults to search.default_sort
    #[arg(short, long)]
    sort: Option<String>,
    /// Candidate window per entity type; defaults to search.default_page_size
    #[arg(long)]
    page_size: Option<u32>,
    /// Paging cursor printed by a previous search
    #[arg(long)]
    cursor: Option<String>,
    /// Only content from this community
    #[arg(long)]
    scope: Option<String>,
    /// Only content by (or groups owned by) this user
    #[arg(long)]
    author: Option<String>,
    /// Require at least one of these tags (repeatable)
    #[arg(long = "tag")]
    tags: Vec<String>,
    /// Minimum popularity (votes, members or rating)
    #[arg(long)]
    min_popularity: Option<i64>,
    /// Created on or after (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    since: Option<String>,
    /// Created on or before (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    until: Option<String>,
}

#[derive(Subcommand)]
enum RecentAction {
    /// List recent searches, most recent first
    List,
    /// Forget all recent searches
    Clear,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration
    List,
    /// Reset to defaults
    Reset,
    /// Show config file path
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing; stdout is reserved for command output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("kindred=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { action } => cmd_config(action, cli.quiet),

        Commands::Recent { action } => {
            let config = Config::load()?;
            cmd_recent(&config, action, cli.format, cli.quiet).await
        }

        Commands::Seed { file } => {
            let config = Config::load()?;
            let db = open_database(&config, cli.database.as_deref()).await?;
            cmd_seed(&db, &file, cli.format, cli.quiet).await
        }

        Commands::Search(args) => {
            let config = Config::load()?;
            let db = open_database(&config, cli.database.as_deref()).await?;
            cmd_search(&db, &config, args, cli.format, cli.quiet).await
        }

        Commands::Suggest {
            partial,
            entity_type,
        } => {
            let config = Config::load()?;
            let db = open_database(&config, cli.database.as_deref()).await?;
            cmd_suggest(&db, &config, &partial, entity_type.as_deref(), cli.format).await
        }
    }
}

async fn open_database(config: &Config, override_path: Option<&Path>) -> anyhow::Result<Database> {
    let path = override_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.database_path());
    debug!(path = %path.display(), "Opening database");
    Database::new(DatabaseConfig::with_path(path)).await
}

fn recent_store(config: &Config) -> RecentQueryStore {
    RecentQueryStore::new(Arc::new(JsonFileKeyValueStore::new(config.recent_file())))
        .with_max_entries(config.recent.max_entries)
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn cmd_seed(db: &Database, file: &Path, format: OutputFormat, quiet: bool) -> anyhow::Result<()> {
    let corpus = Corpus::load(file)?;
    let summary = corpus.import(db).await?;
    db.close().await;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text if !quiet => {
            println!(
                "Imported {} records (posts: {}, communities: {}, profiles: {})",
                summary.total(),
                summary.posts,
                summary.communities,
                summary.profiles
            );
        }
        OutputFormat::Text => {}
    }
    Ok(())
}

async fn cmd_search(
    db: &Database,
    config: &Config,
    args: SearchArgs,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let query = build_query(config, &args)?;

    let service = Arc::new(SearchService::from_config(db.pool().clone(), config));
    let session = SearchSession::from_config(service, config).with_recent(recent_store(config));

    session.search(query.clone()).await;
    let state = session.state();
    if let Some(message) = state.error {
        return Err(anyhow!(message));
    }

    let next_cursor = query.next_page()?.cursor;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "term": query.search_term,
                "type": query.search_type.as_str(),
                "sortBy": query.sort_by.as_str(),
                "count": state.results.len(),
                "results": state.results,
                "nextCursor": next_cursor,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            if state.results.is_empty() {
                if !quiet {
                    println!("No results for '{}'", query.search_term.trim());
                }
                return Ok(());
            }
            if !quiet {
                println!(
                    "Found {} results for '{}' (sorted by {})",
                    state.results.len(),
                    query.search_term.trim(),
                    query.sort_by
                );
                println!();
            }
            for result in &state.results {
                print_result(result, quiet);
            }
            if let (false, Some(cursor)) = (quiet, next_cursor) {
                println!();
                println!("Next page: --cursor {}", cursor.as_str());
            }
        }
    }
    Ok(())
}

fn print_result(result: &SearchResult, quiet: bool) {
    if quiet {
        println!("{}\t{}\t{}", result.entity_type, result.id, result.title);
        return;
    }
    println!(
        "  [{}] {}  (score {}, popularity {})",
        result.entity_type, result.title, result.relevance_score, result.popularity
    );
    if !result.description.is_empty() {
        println!("      {}", truncate(&result.description, 80));
    }
    println!("      id: {}", result.id);
}

fn truncate(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

async fn cmd_suggest(
    db: &Database,
    config: &Config,
    partial: &str,
    entity_type: Option<&str>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let entity_type = entity_type.map(parse_entity_type).transpose()?;
    let service = Arc::new(SearchService::from_config(db.pool().clone(), config));
    let session = SearchSession::from_config(service, config);
    session.suggest(partial, entity_type).await;
    let suggestions = session.state().suggestions;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&suggestions)?),
        OutputFormat::Text => {
            for suggestion in suggestions {
                println!("{}", suggestion);
            }
        }
    }
    Ok(())
}

async fn cmd_recent(
    config: &Config,
    action: RecentAction,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let recent = recent_store(config);
    match action {
        RecentAction::List => {
            let terms = recent.list().await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&terms)?),
                OutputFormat::Text if terms.is_empty() => {
                    if !quiet {
                        println!("No recent searches.");
                    }
                }
                OutputFormat::Text => {
                    for term in terms {
                        println!("{}", term);
                    }
                }
            }
        }
        RecentAction::Clear => {
            recent.clear().await?;
            if !quiet {
                println!("Recent searches cleared.");
            }
        }
    }
    Ok(())
}

fn cmd_config(action: ConfigAction, quiet: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key)?;
            println!("{}", value);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            if !quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let items = config.list()?;
            for (key, value) in items {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Reset => {
            Config::reset()?;
            if !quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

// ============================================================================
// Argument parsing helpers
// ============================================================================

fn build_query(config: &Config, args: &SearchArgs) -> anyhow::Result<SearchQuery> {
    let search_type = SearchType::from_str(&args.search_type).ok_or_else(|| {
        anyhow!(
            "Invalid type: {}. Valid options: all, content, group, profile",
            args.search_type
        )
    })?;
    let sort_by = match &args.sort {
        Some(sort) => SortBy::from_str(sort).ok_or_else(|| {
            anyhow!("Invalid sort order: {}. Valid options: relevance, newest, popular", sort)
        })?,
        None => config.default_sort(),
    };

    let mut filters = SearchFilters::new().with_tags(args.tags.iter().cloned());
    if let Some(scope) = &args.scope {
        filters = filters.with_scope(scope.clone());
    }
    if let Some(author) = &args.author {
        filters = filters.with_author(author.clone());
    }
    if let Some(min) = args.min_popularity {
        filters = filters.with_min_popularity(min);
    }
    if args.since.is_some() || args.until.is_some() {
        let start = match &args.since {
            Some(since) => parse_date(since, false)?,
            None => DateTime::<Utc>::MIN_UTC,
        };
        let end = match &args.until {
            Some(until) => parse_date(until, true)?,
            None => DateTime::<Utc>::MAX_UTC,
        };
        filters = filters.with_date_range(DateRange::new(start, end));
    }

    let mut query = SearchQuery::new(args.term.clone())
        .with_type(search_type)
        .with_sort(sort_by)
        .with_filters(filters)
        .with_page_size(args.page_size.unwrap_or(config.search.default_page_size));
    if let Some(cursor) = &args.cursor {
        query = query.with_cursor(Cursor::from_token(cursor.clone()));
    }
    Ok(query)
}

fn parse_entity_type(value: &str) -> anyhow::Result<EntityType> {
    EntityType::from_str(value).ok_or_else(|| {
        anyhow!(
            "Invalid type: {}. Valid options: content, group, profile",
            value
        )
    })
}

/// Parse `YYYY-MM-DD` (start or end of that day, UTC) or RFC 3339
fn parse_date(value: &str, end_of_day: bool) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Ok(at.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Invalid date: {} (use YYYY-MM-DD or RFC 3339)", value))?;
    let time = if end_of_day {
        NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
    } else {
        Some(NaiveTime::MIN)
    }
    .ok_or_else(|| anyhow!("Invalid time of day"))?;

    Ok(date.and_time(time).and_utc())
}
