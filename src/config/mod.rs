//! Configuration module for Prerender-Crawl
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use prerender_crawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Crawl restricted to: {}", config.crawl.base_path);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{BrowserSettings, Config, CrawlOptions, CrawlTargetConfig, Viewport};

// Re-export parser functions
pub use parser::load_config;
