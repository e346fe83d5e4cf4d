//! CLI argument definitions for the askdb server.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// askdb - ask questions of a SQLite database in plain language.
///
/// Only SQLite databases are supported. Connection strings use `sqlite://`,
/// `sqlite:` or `file:` URIs, or a plain path; `postgresql://` and other
/// server URLs are rejected.
#[derive(Parser, Debug)]
#[command(name = "askdb", version)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Address to bind the server to.
    #[arg(long = "host")]
    pub host: Option<String>,

    /// Server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// SQLite database to configure at startup (e.g. sqlite:///data/shop.db).
    #[arg(short = 'd', long = "database-url")]
    pub database_url: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Priority: --config flag > ASKDB_CONFIG env var > ~/.askdb/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("ASKDB_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Priority: --host flag > config file value.
    pub fn resolve_host(&self, config_host: &str) -> String {
        self.host
            .clone()
            .unwrap_or_else(|| config_host.to_string())
    }

    /// Priority: --port flag > ASKDB_PORT env var > config file value.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        if let Some(p) = self.port {
            return p;
        }
        if let Ok(val) = std::env::var("ASKDB_PORT") {
            if let Ok(p) = val.parse::<u16>() {
                return p;
            }
        }
        config_port
    }

    /// Priority: --database-url flag > DATABASE_URL env var > config file value.
    pub fn resolve_database_url(&self, config_url: Option<&str>) -> Option<String> {
        if let Some(ref url) = self.database_url {
            return Some(url.clone());
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            if !url.trim().is_empty() {
                return Some(url);
            }
        }
        config_url.map(str::to_string)
    }

    /// Priority: --log-level flag > ASKDB_LOG env var > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        if let Some(ref level) = self.log_level {
            return level.clone();
        }
        if let Ok(level) = std::env::var("ASKDB_LOG") {
            return level;
        }
        config_level.to_string()
    }
}

fn default_config_path() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".askdb").join("config.toml");
    }
    PathBuf::from("config.toml")
}
