use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::analysis::extractor::MatchStrategy;

const DEFAULT_DATABASE_URL: &str = "sqlite://skillmap.db";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Every field has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    /// Optional JSON taxonomy file. The built-in taxonomy is used when unset.
    pub skill_taxonomy_path: Option<PathBuf>,
    pub match_strategy: MatchStrategy,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            port: parse_env("PORT", 8080).context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            skill_taxonomy_path: optional_env("SKILL_TAXONOMY_PATH").map(PathBuf::from),
            match_strategy: parse_env("MATCH_STRATEGY", MatchStrategy::Phrase)
                .context("MATCH_STRATEGY must be 'phrase' or 'substring'")?,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)
                .context("MAX_UPLOAD_BYTES must be a positive integer")?,
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid value '{raw}' for {key}: {e}")),
        None => Ok(default),
    }
}
