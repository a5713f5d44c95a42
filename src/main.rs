//! Instagram Analytics CLI
//!
//! Search posts by hashtag, print dashboard metrics, run AI content analysis,
//! manage API keys, bookmarks and `.env` templates.

use insta_analytics::core::analytics::{caption_preview, format_count, rows};
use insta_analytics::core::{
    all_hashtags, extract_hashtags, hashtag_presets, BookmarkStore, ContentAnalyzer, KeyStatus,
    PostScraper, SaveFormat, SecretsStore,
};
use insta_analytics::models::{
    parse_bool, AppConfig, ContentAnalysis, Post, PostTypeFilter, SearchOutcome, SortBy,
    TimeFilter,
};
use insta_analytics::utils::constants::{
    APP_NAME, APP_VERSION, BOOKMARKS_FILE, DEFAULT_ANALYSIS_CONCURRENCY, ENV_DEBUG_MODE,
};
use insta_analytics::utils::env_file::{lint_env, render_template, IssueSeverity};
use insta_analytics::TelemetryCollector;

use clap::{Args, Parser, Subcommand};
use eyre::{eyre, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Instagram Analytics Dashboard - hashtag search, metrics and AI insights
#[derive(Parser, Debug)]
#[command(name = "insta_analytics")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Debug logging (overrides DEBUG_MODE)
    #[arg(short, long, global = true)]
    debug: bool,

    /// Bookmark file
    #[arg(long, global = true, default_value = BOOKMARKS_FILE, env = "INSTA_BOOKMARKS_FILE")]
    bookmarks_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search posts by hashtag
    Search(SearchArgs),

    /// AI analysis of a caption
    Analyze(AnalyzeArgs),

    /// List hashtag presets
    Hashtags,

    /// Manage API keys
    Keys {
        #[command(subcommand)]
        action: KeysAction,
    },

    /// `.env` template tools
    Env {
        #[command(subcommand)]
        action: EnvAction,
    },

    /// Manage bookmarks
    Bookmarks {
        #[command(subcommand)]
        action: BookmarksAction,
    },
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// Hashtags, with or without '#' (default: #ui #design #tech)
    hashtags: Vec<String>,

    /// today, 48_hours, 4_days, week, month
    #[arg(short, long)]
    time: Option<TimeFilter>,

    /// all, posts, carousels, reels
    #[arg(short = 'k', long = "type")]
    post_type: Option<PostTypeFilter>,

    /// likes, comments, shares, views, recent
    #[arg(short, long)]
    sort: Option<SortBy>,

    /// Maximum number of posts
    #[arg(short, long)]
    limit: Option<usize>,

    /// Bypass the result cache
    #[arg(long)]
    refresh: bool,

    /// Run AI analysis on the top N posts
    #[arg(long, value_name = "N")]
    analyze: Option<usize>,

    /// Print raw JSON instead of the dashboard view
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Post caption
    caption: String,

    /// Hashtags (default: the ones found in the caption)
    #[arg(short = 't', long = "tag")]
    hashtags: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum KeysAction {
    /// Show which keys are set and where they come from
    Status,
    /// Call Apify and the AI provider with the stored keys
    Test,
    /// Write keys to secrets.toml, .env or config.yaml
    Save(SaveArgs),
}

#[derive(Args, Debug)]
struct SaveArgs {
    /// toml, env or yaml
    #[arg(short, long, default_value = "toml")]
    format: SaveFormat,

    #[arg(long, env = "APIFY_TOKEN", hide_env_values = true)]
    apify_token: Option<String>,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: Option<String>,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    #[arg(long, env = "INSTAGRAM_SESSION_ID", hide_env_values = true)]
    instagram_session_id: Option<String>,

    #[arg(long, env = "PROXY_URL", hide_env_values = true)]
    proxy_url: Option<String>,
}

#[derive(Subcommand, Debug)]
enum EnvAction {
    /// Print (or write) the canonical `.env` template
    Template {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Lint an env file
    Check {
        file: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum BookmarksAction {
    /// List bookmarked post ids
    List,
    /// Add or remove a bookmark
    Toggle {
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env first so clap's `env =` fallbacks can see it
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let debug = cli.debug
        || std::env::var(ENV_DEBUG_MODE)
            .ok()
            .and_then(|v| parse_bool(&v))
            .unwrap_or(false);

    FmtSubscriber::builder()
        .with_max_level(if debug { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    match cli.command {
        Commands::Search(args) => run_search(args, &cli.bookmarks_file).await,
        Commands::Analyze(args) => run_analyze(args).await,
        Commands::Hashtags => {
            print_hashtags();
            Ok(())
        }
        Commands::Keys { action } => run_keys(action).await,
        Commands::Env { action } => run_env(action),
        Commands::Bookmarks { action } => run_bookmarks(action, &cli.bookmarks_file),
    }
}

fn open_bookmarks(path: &Path) -> BookmarkStore {
    BookmarkStore::open(path).unwrap_or_else(|e| {
        eprintln!("⚠️  {} - using empty bookmarks", e);
        BookmarkStore::in_memory()
    })
}

// ============================================
// search / analyze
// ============================================

async fn run_search(args: SearchArgs, bookmarks_file: &Path) -> Result<()> {
    let config = AppConfig::from_env();
    let secrets = Arc::new(SecretsStore::from_env(config.ai_provider));
    let telemetry = Arc::new(TelemetryCollector::new());
    let scraper = PostScraper::new(config.clone(), secrets.clone(), telemetry.clone());

    let mut query = scraper.default_query(args.hashtags);
    if let Some(time) = args.time {
        query.time_filter = time;
    }
    if let Some(post_type) = args.post_type {
        query.post_type = post_type;
    }
    if let Some(sort) = args.sort {
        query.sort_by = sort;
    }
    if let Some(limit) = args.limit {
        query.limit = limit;
    }
    query.refresh = args.refresh;

    let outcome = scraper.search(query).await;

    let analyses = match args.analyze.filter(|n| *n > 0) {
        Some(n) => {
            let analyzer = ContentAnalyzer::new(&config, secrets.llm_client(&config), telemetry);
            let top: Vec<Post> = outcome.posts.iter().take(n).cloned().collect();
            analyzer
                .analyze_many(&top, DEFAULT_ANALYSIS_CONCURRENCY)
                .await?
        }
        None => Vec::new(),
    };

    if args.json {
        let json = serde_json::json!({
            "outcome": outcome,
            "analysis": analyses
                .iter()
                .map(|(id, a)| serde_json::json!({ "post_id": id, "analysis": a }))
                .collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    let bookmarks = open_bookmarks(bookmarks_file);
    print_dashboard(&outcome, &bookmarks, config.posts_per_row);
    for (id, analysis) in &analyses {
        println!();
        println!("🤖 {}", id);
        print_analysis(analysis);
    }
    Ok(())
}

async fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    let config = AppConfig::from_env();
    let secrets = SecretsStore::from_env(config.ai_provider);
    let analyzer = ContentAnalyzer::new(
        &config,
        secrets.llm_client(&config),
        Arc::new(TelemetryCollector::new()),
    );
    if !analyzer.ai_available() {
        eprintln!("⚠️  No AI provider configured - showing fallback analysis");
    }

    let hashtags = if args.hashtags.is_empty() {
        extract_hashtags(&args.caption)
    } else {
        args.hashtags
    };
    let analysis = analyzer.analyze(&args.caption, &hashtags).await?;
    print_analysis(&analysis);
    Ok(())
}

fn print_dashboard(outcome: &SearchOutcome, bookmarks: &BookmarkStore, per_row: usize) {
    println!("📸 {} v{}", APP_NAME, APP_VERSION);
    println!(
        "🔍 {}  ({} posts, source: {}, {}ms)",
        outcome.hashtags.join(" "),
        outcome.posts.len(),
        outcome.source.as_str(),
        outcome.latency_ms
    );

    let Some(metrics) = &outcome.metrics else {
        println!("\nNo posts found for the selected filters.");
        return;
    };

    println!();
    println!("📊 Total posts:     {}", metrics.total_posts);
    println!("❤️  Avg likes:       {}", format_count(metrics.avg_likes.round() as u64));
    println!("💬 Avg engagement:  {}", format_count(metrics.avg_engagement.round() as u64));
    println!("👑 Top creator:     @{}", metrics.top_creator);

    for (row_idx, row) in rows(&outcome.posts, per_row).into_iter().enumerate() {
        println!();
        println!("── row {} ──", row_idx + 1);
        for post in row {
            let mark = if bookmarks.contains(&post.id) { "🔖" } else { "  " };
            println!(
                "{} {} @{}  ❤️ {}  💬 {}  👁️ {}  {}",
                mark,
                post.post_type.emoji(),
                post.creator,
                format_count(post.likes),
                format_count(post.comments),
                format_count(post.views),
                post.url
            );
            println!("     {}", caption_preview(&post.caption));
            if !post.hashtags.is_empty() {
                println!("     {}", post.hashtags.join(" "));
            }
        }
    }
}

fn print_analysis(analysis: &ContentAnalysis) {
    println!("   Category:              {}", analysis.category);
    println!("   Sentiment:             {}", analysis.sentiment);
    println!("   Engagement prediction: {}", analysis.engagement_prediction);
    println!("   Content quality:       {}/100", analysis.content_quality);
    if let Some(trend) = analysis.trending_potential {
        println!("   Trending potential:    {}/100", trend);
    }
}

fn print_hashtags() {
    for category in hashtag_presets() {
        println!("{}:", category.name);
        println!("  {}", category.hashtags.join(" "));
    }
    println!();
    println!("{} unique hashtags", all_hashtags().len());
}

// ============================================
// keys
// ============================================

async fn run_keys(action: KeysAction) -> Result<()> {
    let config = AppConfig::from_env();
    let secrets = SecretsStore::from_env(config.ai_provider);

    match action {
        KeysAction::Status => {
            for (name, masked, source) in secrets.summary() {
                let shown = if masked.is_empty() { "-".to_string() } else { masked };
                println!("{:<22} {:<28} {}", name, shown, source.as_str());
            }
            let missing = secrets.missing_keys();
            if missing.is_empty() {
                println!("\n✅ All required keys configured");
            } else {
                println!("\n⚠️  Missing: {}", missing.join(", "));
            }
        }
        KeysAction::Test => {
            let report = secrets.test_keys(&config).await;
            println!("Apify:  {}", report.apify);
            println!("{:<7} {}", format!("{}:", report.ai_provider.as_str()), report.ai);
            if report.apify == KeyStatus::Invalid || report.ai == KeyStatus::Invalid {
                return Err(eyre!("one or more API keys were rejected"));
            }
        }
        KeysAction::Save(args) => {
            let keys: BTreeMap<String, String> = [
                ("apify_token", args.apify_token),
                ("gemini_api_key", args.gemini_api_key),
                ("openai_api_key", args.openai_api_key),
                ("instagram_session_id", args.instagram_session_id),
                ("proxy_url", args.proxy_url),
            ]
            .into_iter()
            .filter_map(|(k, v)| v.map(|v| (k.to_string(), v)))
            .collect();

            if keys.values().all(|v| v.is_empty()) {
                return Err(eyre!("no keys given (use --apify-token etc. or set them in the environment)"));
            }
            let path = secrets.save(&keys, args.format)?;
            println!("💾 Saved to {}", path.display());
        }
    }
    Ok(())
}

// ============================================
// env / bookmarks
// ============================================

fn run_env(action: EnvAction) -> Result<()> {
    match action {
        EnvAction::Template { output: None } => print!("{}", render_template()),
        EnvAction::Template { output: Some(path) } => {
            if path.exists() {
                return Err(eyre!("{} already exists", path.display()));
            }
            std::fs::write(&path, render_template())?;
            println!("📝 Template written to {}", path.display());
        }
        EnvAction::Check { file } => {
            let text = std::fs::read_to_string(&file)?;
            let issues = lint_env(&text);
            for issue in &issues {
                println!(
                    "{}:{}: {}: {}",
                    file.display(),
                    issue.line,
                    issue.severity.as_str(),
                    issue.message
                );
            }
            let errors = issues
                .iter()
                .filter(|i| i.severity == IssueSeverity::Error)
                .count();
            if errors > 0 {
                return Err(eyre!("{} syntax error(s) in {}", errors, file.display()));
            }

            // Values are syntactically fine; now check the typed ones
            let pairs: BTreeMap<String, String> =
                insta_analytics::utils::env_file::parse_pairs(&text)?.into_iter().collect();
            let invalid = AppConfig::validate_lookup(|key| pairs.get(key).cloned());
            for msg in &invalid {
                println!("{}: error: {}", file.display(), msg);
            }
            if !invalid.is_empty() {
                return Err(eyre!("{} invalid value(s) in {}", invalid.len(), file.display()));
            }
            println!("✅ {} is valid", file.display());
        }
    }
    Ok(())
}

fn run_bookmarks(action: BookmarksAction, path: &Path) -> Result<()> {
    let store = BookmarkStore::open(path)?;
    match action {
        BookmarksAction::List => {
            if store.is_empty() {
                println!("No bookmarks yet.");
            }
            for id in store.ids() {
                println!("🔖 {}", id);
            }
        }
        BookmarksAction::Toggle { id } => {
            if store.toggle(&id)? {
                println!("🔖 Post bookmarked: {}", id);
            } else {
                println!("Bookmark removed: {}", id);
            }
        }
    }
    Ok(())
}
