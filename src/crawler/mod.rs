//! Crawl orchestration engine
//!
//! This module contains the core crawl machinery:
//! - Deduplicating frontier with the enqueued/processed counters
//! - Run-scoped shutdown control
//! - Per-URL page fetching and log aggregation
//! - Bounded-concurrency worker pool
//! - Overall run coordination

mod coordinator;
mod fetcher;
mod frontier;
mod logs;
mod shutdown;
mod worker;

pub use coordinator::{run_crawl, Coordinator, CrawlHooks, NoopHooks};
pub use fetcher::PageFetcher;
pub use frontier::{CrawlTarget, Frontier};
pub use logs::{LogEntry, LogRecord, PageLogger};
pub use shutdown::{ShutdownController, SignalGuard};
pub use worker::WorkerPool;

use crate::config::Config;
use crate::session::Browser;
use std::sync::Arc;

/// Runs a complete crawl operation
///
/// This is the main entry point for library users. It will:
/// 1. Seed the frontier from the configured entry points
/// 2. Fetch pages through the given browser capability
/// 3. Follow discovered links, when enabled
/// 4. Collect one log record per visited URL
///
/// # Arguments
///
/// * `config` - The crawl configuration
/// * `browser` - The session provider backing the crawl
///
/// # Returns
///
/// * `Ok(Vec<LogRecord>)` - One record per enqueued URL
/// * `Err(CrawlError)` - The run failed or was shut down
pub async fn crawl(config: Config, browser: Arc<dyn Browser>) -> crate::Result<Vec<LogRecord>> {
    run_crawl(config, browser).await
}
