//! Application configuration loaded from environment variables.
//!
//! Configuration is loaded once at startup and validated before the server starts.
//! Variables may also come from a `.env` file loaded by the binaries.
//!
//! ## Variables
//!
//! - `DATABASE_URL` - SQLite URL (default: `sqlite://snaplink.db?mode=rwc`)
//! - `LISTEN` - Bind address (default: `0.0.0.0:8080`)
//! - `BASE_URL` - Prefix of returned short URLs (default: `http://localhost:8080`)
//! - `BEHIND_PROXY` - Read client IPs from `X-Forwarded-For` (default: `false`)
//! - `RUST_LOG` - Log level (default: `info`)
//! - `LOG_FORMAT` - Log format: `text` or `json` (default: `text`)
//! - `CLICK_BUFFER_SIZE` - Click queue capacity, 0 drops every click (default: 1000)
//! - `CLICK_WORKER_COUNT` - Click workers (default: 5)
//! - `CLICK_WRITE_RETRIES` - Extra attempts for a failed click write (default: 0)
//! - `MONITOR_INTERVAL_SECS` - Seconds between liveness sweeps, 0 disables (default: 300)
//! - `MONITOR_PROBE_TIMEOUT_SECS` - Per-probe timeout (default: 5)
//! - `MONITOR_CONCURRENCY` - Concurrent probes per sweep (default: 8)
//! - `SHORT_CODE_LENGTH` - Generated code length, 1 to 10 (default: 6)
//! - `SHORT_CODE_MAX_RETRIES` - Generation attempts per link (default: 5)
//! - `SHUTDOWN_TIMEOUT_SECS` - Time allowed to drain the click queue (default: 5)
//! - `DB_MAX_CONNECTIONS` - Pool size (default: 5)

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::application::click_pipeline::PipelineConfig;
use crate::application::monitor::MonitorConfig;
use crate::application::services::CodeSettings;

/// Longest short code the schema accepts.
pub const MAX_CODE_LENGTH: usize = 10;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub listen_addr: String,
    /// Scheme and host prepended to codes in API responses, without trailing slash.
    pub base_url: String,
    /// When true, click IPs are read from X-Forwarded-For / X-Real-IP headers.
    /// Enable only when the service is behind a trusted reverse proxy.
    pub behind_proxy: bool,
    pub log_level: String,
    pub log_format: String,

    pub click_buffer_size: usize,
    pub click_worker_count: usize,
    pub click_write_retries: usize,

    pub monitor_interval_secs: u64,
    pub monitor_probe_timeout_secs: u64,
    pub monitor_concurrency: usize,

    pub short_code_length: usize,
    pub short_code_max_retries: usize,

    pub shutdown_timeout_secs: u64,
    pub db_max_connections: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://snaplink.db?mode=rwc".to_string(),
            listen_addr: "0.0.0.0:8080".to_string(),
            base_url: "http://localhost:8080".to_string(),
            behind_proxy: false,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            click_buffer_size: 1000,
            click_worker_count: 5,
            click_write_retries: 0,
            monitor_interval_secs: 300,
            monitor_probe_timeout_secs: 5,
            monitor_concurrency: 8,
            short_code_length: 6,
            short_code_max_retries: 5,
            shutdown_timeout_secs: 5,
            db_max_connections: 5,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric or boolean variable cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let base_url = env::var("BASE_URL")
            .unwrap_or(defaults.base_url)
            .trim_end_matches('/')
            .to_string();

        let behind_proxy = env::var("BEHIND_PROXY")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false);

        Ok(Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            listen_addr: env::var("LISTEN").unwrap_or(defaults.listen_addr),
            base_url,
            behind_proxy,
            log_level: env::var("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: env::var("LOG_FORMAT").unwrap_or(defaults.log_format),
            click_buffer_size: parse_var("CLICK_BUFFER_SIZE", defaults.click_buffer_size)?,
            click_worker_count: parse_var("CLICK_WORKER_COUNT", defaults.click_worker_count)?,
            click_write_retries: parse_var("CLICK_WRITE_RETRIES", defaults.click_write_retries)?,
            monitor_interval_secs: parse_var(
                "MONITOR_INTERVAL_SECS",
                defaults.monitor_interval_secs,
            )?,
            monitor_probe_timeout_secs: parse_var(
                "MONITOR_PROBE_TIMEOUT_SECS",
                defaults.monitor_probe_timeout_secs,
            )?,
            monitor_concurrency: parse_var("MONITOR_CONCURRENCY", defaults.monitor_concurrency)?,
            short_code_length: parse_var("SHORT_CODE_LENGTH", defaults.short_code_length)?,
            short_code_max_retries: parse_var(
                "SHORT_CODE_MAX_RETRIES",
                defaults.short_code_max_retries,
            )?,
            shutdown_timeout_secs: parse_var(
                "SHUTDOWN_TIMEOUT_SECS",
                defaults.shutdown_timeout_secs,
            )?,
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
        })
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `log_format` is not `text` or `json`
    /// - `listen_addr` is not `host:port`
    /// - `database_url` is not a SQLite URL
    /// - `base_url` is not an http(s) URL
    /// - worker count, code length, retry bound, concurrency or pool size is out of range
    pub fn validate(&self) -> Result<()> {
        if self.log_format != "text" && self.log_format != "json" {
            anyhow::bail!(
                "LOG_FORMAT must be 'text' or 'json', got '{}'",
                self.log_format
            );
        }

        if !self.listen_addr.contains(':') {
            anyhow::bail!(
                "LISTEN must be in format 'host:port', got '{}'",
                self.listen_addr
            );
        }

        if !self.database_url.starts_with("sqlite:") {
            anyhow::bail!(
                "DATABASE_URL must start with 'sqlite:', got '{}'",
                self.database_url
            );
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            anyhow::bail!(
                "BASE_URL must start with 'http://' or 'https://', got '{}'",
                self.base_url
            );
        }

        if self.click_worker_count == 0 || self.click_worker_count > 256 {
            anyhow::bail!(
                "CLICK_WORKER_COUNT must be between 1 and 256, got {}",
                self.click_worker_count
            );
        }

        if self.click_buffer_size > 1_000_000 {
            anyhow::bail!(
                "CLICK_BUFFER_SIZE is too large (max: 1000000), got {}",
                self.click_buffer_size
            );
        }

        if !(1..=MAX_CODE_LENGTH).contains(&self.short_code_length) {
            anyhow::bail!(
                "SHORT_CODE_LENGTH must be between 1 and {MAX_CODE_LENGTH}, got {}",
                self.short_code_length
            );
        }

        if self.short_code_max_retries == 0 {
            anyhow::bail!("SHORT_CODE_MAX_RETRIES must be at least 1");
        }

        if self.monitor_probe_timeout_secs == 0 {
            anyhow::bail!("MONITOR_PROBE_TIMEOUT_SECS must be greater than 0");
        }

        if self.monitor_concurrency == 0 {
            anyhow::bail!("MONITOR_CONCURRENCY must be at least 1");
        }

        if self.db_max_connections == 0 {
            anyhow::bail!("DB_MAX_CONNECTIONS must be at least 1");
        }

        Ok(())
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            buffer_size: self.click_buffer_size,
            worker_count: self.click_worker_count,
            write_retries: self.click_write_retries,
        }
    }

    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            interval: Duration::from_secs(self.monitor_interval_secs),
            concurrency: self.monitor_concurrency,
        }
    }

    pub fn code_settings(&self) -> CodeSettings {
        CodeSettings {
            length: self.short_code_length,
            max_retries: self.short_code_max_retries,
        }
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.monitor_probe_timeout_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Prints configuration summary.
    pub fn print_summary(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  Listen address: {}", self.listen_addr);
        tracing::info!("  Base URL: {}", self.base_url);
        tracing::info!("  Database: {}", self.database_url);
        tracing::info!("  Log level: {}", self.log_level);
        tracing::info!("  Log format: {}", self.log_format);
        tracing::info!(
            "  Click pipeline: buffer {}, {} workers, {} write retries",
            self.click_buffer_size,
            self.click_worker_count,
            self.click_write_retries
        );
        if self.monitor_interval_secs == 0 {
            tracing::info!("  Liveness monitor: disabled");
        } else {
            tracing::info!(
                "  Liveness monitor: every {}s, timeout {}s, {} concurrent probes",
                self.monitor_interval_secs,
                self.monitor_probe_timeout_secs,
                self.monitor_concurrency
            );
        }
        tracing::info!(
            "  Short codes: length {}, {} attempts",
            self.short_code_length,
            self.short_code_max_retries
        );
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{name} has an invalid value: '{value}'")),
        Err(_) => Ok(default),
    }
}

/// Loads and validates configuration from environment variables.
///
/// # Errors
///
/// Returns an error if a variable cannot be parsed or validation fails.
///
/// # Note
///
/// This function expects environment variables to be already loaded
/// (e.g., via `dotenvy::dotenv()` in `main.rs`).
pub fn load_from_env() -> Result<Config> {
    let config = Config::from_env()?;
    config.validate()?;
    Ok(config)
}
