//! CLI administration tool for short-url.
//!
//! Creates and inspects short links directly against the database, without
//! going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Create a link with a random key
//! cargo run --bin admin -- link create https://example.com/landing
//!
//! # Create a single-use link with a chosen key
//! cargo run --bin admin -- link create https://example.com/invite --key invite-42 --single-use
//!
//! # Show a link and its latest visits
//! cargo run --bin admin -- link show invite-42
//!
//! # View statistics
//! cargo run --bin admin -- stats
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` (required): PostgreSQL connection string
//! - `SHORT_URL_*`: link defaults, as for the server (see `short_url::config`)

use short_url::application::services::{LinkBuilder, LinkService};
use short_url::config::LinkConfig;
use short_url::domain::repositories::ShortLinkRepository;
use short_url::infrastructure::persistence::{PgShortLinkRepository, PgVisitRepository};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input};
use sqlx::PgPool;
use std::sync::Arc;

type PgLinkService = LinkService<PgShortLinkRepository, PgVisitRepository>;

/// CLI tool for managing short-url.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Manage short links
    Link {
        #[command(subcommand)]
        action: LinkAction,
    },

    /// Show statistics
    Stats,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Link management subcommands.
#[derive(Subcommand)]
enum LinkAction {
    /// Create a new short link
    Create {
        /// Destination URL (prompted for when omitted)
        destination: Option<String>,

        /// Custom key (random when omitted)
        #[arg(short, long)]
        key: Option<String>,

        /// Deactivate the link after its first visit
        #[arg(long)]
        single_use: bool,

        /// Append the visitor's query string to the destination
        #[arg(long)]
        forward_query: bool,

        /// Redirect status code (300-399)
        #[arg(short, long)]
        status: Option<u16>,

        /// Disable visit tracking for this link
        #[arg(long)]
        no_tracking: bool,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Show a link and its latest visits
    Show {
        /// Short key
        url_key: String,

        /// Number of visits to list
        #[arg(short, long, default_value_t = 10)]
        limit: i64,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

/// Options collected by `link create`.
struct CreateOptions {
    destination: Option<String>,
    key: Option<String>,
    single_use: bool,
    forward_query: bool,
    status: Option<u16>,
    no_tracking: bool,
    yes: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    match cli.command {
        Commands::Link { action } => handle_link_action(action, &pool).await?,
        Commands::Stats => handle_stats(&pool).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

/// Dispatches link management commands.
async fn handle_link_action(action: LinkAction, pool: &PgPool) -> Result<()> {
    let config = LinkConfig::from_env();
    config.validate()?;

    let pool = Arc::new(pool.clone());
    let service = LinkService::new(
        Arc::new(PgShortLinkRepository::new(pool.clone())),
        Arc::new(PgVisitRepository::new(pool)),
        config,
    );

    match action {
        LinkAction::Create {
            destination,
            key,
            single_use,
            forward_query,
            status,
            no_tracking,
            yes,
        } => {
            let options = CreateOptions {
                destination,
                key,
                single_use,
                forward_query,
                status,
                no_tracking,
                yes,
            };
            create_link(&service, options).await?;
        }
        LinkAction::Show { url_key, limit } => {
            show_link(&service, &url_key, limit).await?;
        }
    }

    Ok(())
}

/// Builds and stores a short link.
///
/// The link goes through the same builder as `POST /api/links`, so every
/// validation message matches the API's.
async fn create_link(service: &PgLinkService, options: CreateOptions) -> Result<()> {
    println!("{}", "🔗 Create Short Link".bright_blue().bold());
    println!();

    let destination = match options.destination.clone() {
        Some(d) => d,
        None => Input::new()
            .with_prompt("Destination URL")
            .with_initial_text("https://")
            .interact_text()?,
    };

    println!("{}", "Link details:".bright_white().bold());
    println!("  Destination: {}", destination.cyan());
    println!(
        "  Key:         {}",
        options.key.as_deref().unwrap_or("(random)").cyan()
    );
    println!("  Single use:  {}", options.single_use);
    println!("  Tracking:    {}", !options.no_tracking);
    println!();

    if !options.yes {
        let confirmed = Confirm::new()
            .with_prompt("Create this link?")
            .default(true)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let builder = service.builder()?.destination_url(destination)?;

    let link = apply_options(builder, &options)
        .build()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create link: {}", e))?;

    println!("{}", "✅ Link created successfully!".green().bold());
    println!();
    println!("  {}", link.public_short_url.bright_yellow().bold());
    println!();

    Ok(())
}

/// Applies the command-line flags to `builder`.
///
/// Absent flags leave the option unset so the configured default applies.
fn apply_options<R>(mut builder: LinkBuilder<R>, options: &CreateOptions) -> LinkBuilder<R>
where
    R: ShortLinkRepository + ?Sized,
{
    builder = builder.single_use(options.single_use);

    if options.forward_query {
        builder = builder.forward_query_params(true);
    }
    if let Some(ref key) = options.key {
        builder = builder.url_key(key.clone());
    }
    if let Some(status) = options.status {
        builder = builder.redirect_status_code(status);
    }
    if options.no_tracking {
        builder = builder.track_visits(false);
    }

    builder
}

/// Prints link details and its most recent visits.
///
/// # Output Format
///
/// ```text
/// 🔎 invite-42
///
///   Destination: https://example.com/invite
///   Short URL:   http://localhost:3000/short/invite-42
///   Visits:      2
///
///   Visited              Device   Browser          OS
///   2025-01-16 14:20     mobile   Safari           iOS
/// ```
async fn show_link(service: &PgLinkService, url_key: &str, limit: i64) -> Result<()> {
    let link = service
        .get_by_key(url_key)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    println!("{}", format!("🔎 {}", link.url_key).bright_blue().bold());
    println!();
    println!("  Destination: {}", link.destination_url.cyan());
    println!("  Short URL:   {}", link.public_short_url.bright_yellow());
    println!("  Status code: {}", link.redirect_status_code);
    println!("  Single use:  {}", link.single_use);

    let state = if link.is_active_at(chrono::Utc::now()) {
        "ACTIVE".green()
    } else {
        "INACTIVE".red()
    };
    println!("  State:       {}", state);

    let (visits, total) = service
        .list_visits(&link, 0, limit.max(1))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list visits: {}", e))?;

    println!("  Visits:      {}", total.to_string().bright_white().bold());
    println!();

    if visits.is_empty() {
        return Ok(());
    }

    println!(
        "  {:<20} {:<8} {:<16} {:<16}",
        "Visited".bright_white().bold(),
        "Device".bright_white().bold(),
        "Browser".bright_white().bold(),
        "OS".bright_white().bold()
    );
    println!("  {}", "─".repeat(62).bright_black());

    for visit in &visits {
        let attrs = &visit.attributes;
        println!(
            "  {:<20} {:<8} {:<16} {:<16}",
            visit
                .visited_at
                .format("%Y-%m-%d %H:%M")
                .to_string()
                .bright_black(),
            attrs.device_type.as_ref().map(|d| d.as_str()).unwrap_or("-"),
            attrs.browser.as_deref().unwrap_or("-"),
            attrs.operating_system.as_deref().unwrap_or("-"),
        );
    }
    println!();

    Ok(())
}

/// Displays system statistics.
///
/// Shows:
/// - Total number of links
/// - Total number of visits
/// - Number of single-use links already consumed
async fn handle_stats(pool: &PgPool) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let links_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM short_links")
        .fetch_one(pool)
        .await?;

    let visits_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM short_link_visits")
        .fetch_one(pool)
        .await?;

    let consumed_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM short_links WHERE single_use AND deactivated_at <= NOW()",
    )
    .fetch_one(pool)
    .await?;

    println!(
        "  Links:             {}",
        links_count.to_string().bright_green().bold()
    );
    println!(
        "  Visits:            {}",
        visits_count.to_string().bright_green().bold()
    );
    println!(
        "  Consumed one-offs: {}",
        consumed_count.to_string().bright_green().bold()
    );
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            println!("  PostgreSQL: {}", version.bright_white());
            println!();
        }
    }

    Ok(())
}
