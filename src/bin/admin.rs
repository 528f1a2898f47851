//! CLI administration tool for snaplink.
//!
//! Creates links, shows per-link statistics and applies database migrations
//! without going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Shorten a URL
//! cargo run --bin snaplink-admin -- create --url https://example.com
//!
//! # Show click count for a code
//! cargo run --bin snaplink-admin -- stats --code aZ3kP9
//!
//! # Apply migrations
//! cargo run --bin snaplink-admin -- migrate
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL`, `BASE_URL`, `SHORT_CODE_LENGTH`, `SHORT_CODE_MAX_RETRIES`
//!   as read by the server (see `snaplink::config`)

use snaplink::application::services::{LinkError, LinkService};
use snaplink::config::{self, Config};
use snaplink::domain::repositories::LinkRepository;
use snaplink::infrastructure::persistence::{self, SqliteLinkRepository};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use sqlx::SqlitePool;
use std::sync::Arc;

/// CLI tool for managing snaplink.
#[derive(Parser)]
#[command(name = "snaplink-admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a short link
    Create {
        /// Long URL to shorten (http or https)
        #[arg(short, long)]
        url: String,
    },

    /// Show statistics for a short link
    Stats {
        /// Short code
        #[arg(short, long)]
        code: String,
    },

    /// Apply database migrations
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = config::load_from_env()?;

    let pool = persistence::connect(&config.database_url, 1)
        .await
        .context("Failed to connect to database")?;

    match cli.command {
        Commands::Create { url } => create_link(&pool, &config, &url).await?,
        Commands::Stats { code } => show_stats(&pool, &config, &code).await?,
        Commands::Migrate => run_migrations(&pool).await?,
    }

    pool.close().await;
    Ok(())
}

fn link_service(pool: &SqlitePool, config: &Config) -> LinkService<dyn LinkRepository> {
    let repository: Arc<dyn LinkRepository> = Arc::new(SqliteLinkRepository::new(pool.clone()));
    LinkService::new(repository, config.code_settings())
}

async fn create_link(pool: &SqlitePool, config: &Config, url: &str) -> Result<()> {
    persistence::migrate(pool).await?;

    match link_service(pool, config).create_link(url).await {
        Ok(link) => {
            println!("{}", "✅ Link created".green().bold());
            println!();
            println!("  Code:      {}", link.short_code.bright_yellow().bold());
            println!("  Long URL:  {}", link.long_url.cyan());
            println!(
                "  Short URL: {}",
                format!("{}/{}", config.base_url, link.short_code).bright_white()
            );
            println!();
            Ok(())
        }
        Err(LinkError::InvalidUrl(reason)) => {
            println!("{} {}", "❌ Invalid URL:".red().bold(), reason);
            std::process::exit(2);
        }
        Err(e) => Err(anyhow::anyhow!("Failed to create link: {e}")),
    }
}

async fn show_stats(pool: &SqlitePool, config: &Config, code: &str) -> Result<()> {
    match link_service(pool, config).get_link_stats(code).await {
        Ok((link, total_clicks)) => {
            println!("{}", "📊 Link statistics".bright_blue().bold());
            println!();
            println!("  Code:     {}", link.short_code.bright_yellow());
            println!("  Long URL: {}", link.long_url.cyan());
            println!(
                "  Created:  {}",
                link.created_at
                    .format("%Y-%m-%d %H:%M")
                    .to_string()
                    .bright_black()
            );
            println!(
                "  Clicks:   {}",
                total_clicks.to_string().bright_green().bold()
            );
            println!();
            Ok(())
        }
        Err(LinkError::NotFound) => {
            println!("{} {}", "⚠️  No link with code".yellow(), code.bold());
            std::process::exit(1);
        }
        Err(e) => Err(anyhow::anyhow!("Failed to load statistics: {e}")),
    }
}

async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    println!("{}", "🔧 Applying migrations...".bright_blue());

    persistence::migrate(pool)
        .await
        .context("Failed to run migrations")?;

    println!("{}", "✅ Database is up to date".green().bold());
    Ok(())
}
