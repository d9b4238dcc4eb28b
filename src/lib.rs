//! Prerender-Crawl: a crawl orchestrator for static pre-rendering
//!
//! This crate crawls a locally-served single-page application by driving an
//! externally-provided browser capability, discovering pages by following
//! links, and collecting console/error logs per visited URL. The browser
//! itself is abstract: any [`session::Browser`] implementation can back a
//! crawl, from a real headless browser to the bundled HTTP provider.

pub mod config;
pub mod crawler;
pub mod session;
pub mod url;

use thiserror::Error;

/// Main error type for crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Hook error: {0}")]
    Hook(#[from] anyhow::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The run was shut down before completion. Carries no payload: an
    /// aborted run never yields a partial result.
    #[error("Crawl aborted before completion")]
    Aborted,
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

    #[error("Invalid exclusion pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
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
}

/// Errors surfaced by a page session provider
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Navigation failed for {url}: {message}")]
    Navigation { url: String, message: String },

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Session provider error: {0}")]
    Provider(String),
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{
    crawl, Coordinator, CrawlHooks, CrawlTarget, Frontier, LogEntry, LogRecord, PageLogger,
    ShutdownController,
};
pub use session::{Browser, PageSession, SessionObserver};
