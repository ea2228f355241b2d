//! Pagegrep: a bounded-concurrency web page scanner
//!
//! This crate implements a web crawler that starts from a single URL, follows
//! links it discovers, and counts occurrences of a search term in the visible
//! body text of every page it visits. The total number of URLs admitted for
//! crawling is capped by a configurable budget.

pub mod config;
pub mod extract;
pub mod fetch;
pub mod scan;
pub mod sync;
pub mod url;

use thiserror::Error;

/// Main error type for pagegrep operations
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

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

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// A failure in the transport layer while fetching one URL.
///
/// Carries a human-readable description rather than the underlying
/// `reqwest::Error` so task outcomes stay cheap to clone into events.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Task-scoped errors. A task's error terminates that task only; it never
/// aborts the scan or any sibling task.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("download error: {0}")]
    Transport(#[from] TransportError),

    #[error("server returned no data")]
    NoData,

    #[error("server returned a non-UTF-8 document")]
    Decode,

    #[error("canceled")]
    Canceled,
}

/// Result type alias for pagegrep operations
pub type Result<T> = std::result::Result<T, ScanError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use crate::url::normalize_url;
pub use config::Config;
pub use extract::{extract, Extraction};
pub use fetch::{Fetch, HttpFetcher};
pub use scan::{ScanEvent, Scanner, TaskKind};
