//! Crawl coordination
//!
//! The coordinator ties the pieces together: it installs the run-scoped
//! interrupt listener, seeds the frontier from the configured entry points,
//! runs the worker pool to exhaustion, tears the browser down exactly once,
//! and settles the overall outcome. A run during which shutdown was
//! triggered always rejects, even when every in-flight fetch finished
//! cleanly; callers never receive a partial result.

use crate::config::Config;
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::frontier::{CrawlTarget, Frontier};
use crate::crawler::logs::{LogRecord, PageLogger};
use crate::crawler::shutdown::ShutdownController;
use crate::crawler::worker::WorkerPool;
use crate::session::{Browser, PageSession};
use crate::CrawlError;
use async_trait::async_trait;
use std::sync::Arc;

/// External extension points invoked around each fetch and at run end
///
/// All methods default to no-ops. Hook failures are treated like any other
/// per-page failure: logged against the route and fed into the shutdown
/// policy.
#[async_trait]
pub trait CrawlHooks: Send + Sync {
    /// Runs after the session is configured, before navigation
    async fn before_fetch(
        &self,
        _session: &mut dyn PageSession,
        _route: &str,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs after navigation and link extraction, with the admit capability
    /// and the logs collected so far
    async fn after_fetch(
        &self,
        _session: &mut dyn PageSession,
        _target: &CrawlTarget,
        _frontier: &Frontier,
        _logger: &PageLogger,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs once at run end, after the browser is closed, whatever the
    /// outcome
    async fn on_end(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Hooks implementation that does nothing
pub struct NoopHooks;

#[async_trait]
impl CrawlHooks for NoopHooks {}

/// Main crawl coordinator
pub struct Coordinator {
    config: Arc<Config>,
    browser: Arc<dyn Browser>,
    hooks: Arc<dyn CrawlHooks>,
}

impl Coordinator {
    pub fn new(config: Config, browser: Arc<dyn Browser>) -> Self {
        Self::with_hooks(config, browser, Arc::new(NoopHooks))
    }

    pub fn with_hooks(
        config: Config,
        browser: Arc<dyn Browser>,
        hooks: Arc<dyn CrawlHooks>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            browser,
            hooks,
        }
    }

    /// Runs the crawl to completion
    ///
    /// Resolves with one [`LogRecord`] per URL ever enqueued, or rejects
    /// with [`CrawlError::Aborted`] when shutdown was triggered at any
    /// point during the run.
    pub async fn run(&self) -> crate::Result<Vec<LogRecord>> {
        let shutdown = ShutdownController::new();
        let _signal_guard = shutdown.install_signal_handler();

        let (frontier, queue) = Frontier::new(&self.config, Arc::clone(&shutdown))?;

        tracing::info!(
            "Seeding crawl of {} with {} entry point(s)",
            self.config.crawl.base_path,
            self.config.options.include.len()
        );
        for path in &self.config.options.include {
            frontier.admit(&format!("{}{}", self.config.crawl.base_path, path));
        }
        frontier.finish_seeding();

        let fetcher = Arc::new(PageFetcher::new(
            Arc::clone(&self.config),
            Arc::clone(&frontier),
            Arc::clone(&shutdown),
            Arc::clone(&self.browser),
            Arc::clone(&self.hooks),
        ));

        let pool = WorkerPool::new(self.config.options.concurrency);
        let records = pool
            .run(
                queue,
                fetcher,
                Arc::clone(&frontier),
                Arc::clone(&shutdown),
                self.config.options.ignore_page_errors,
            )
            .await;

        // The browser is torn down exactly once, whatever the outcome.
        let browser_closed = self.browser.close().await;
        self.hooks.on_end().await?;

        if shutdown.is_shutting_down() {
            return Err(CrawlError::Aborted);
        }
        browser_closed?;

        tracing::info!("Crawl completed: {} page(s) visited", records.len());
        Ok(records)
    }
}

/// Runs a complete crawl with default hooks
pub async fn run_crawl(
    config: Config,
    browser: Arc<dyn Browser>,
) -> crate::Result<Vec<LogRecord>> {
    Coordinator::new(config, browser).run().await
}
