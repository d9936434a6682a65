//! Tropemap: a wiki crawl engine
//!
//! This crate crawls a single fixed wiki host, extracts per-article metadata
//! and inter-article link edges, and persists them to a SQLite store for
//! later querying.

pub mod config;
pub mod crawler;
pub mod faults;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for tropemap operations
#[derive(Debug, Error)]
pub enum TropemapError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for tropemap operations
pub type Result<T> = std::result::Result<T, TropemapError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use self::config::Config;
pub use self::storage::PageRecord;
pub use self::url::{ArticleRef, Canonicalizer};
