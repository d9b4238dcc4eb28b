//! Per-URL unit of work
//!
//! A [`PageFetcher`] turns one [`CrawlTarget`] into one [`LogRecord`]. It
//! never fails: every error is caught, logged against the route, and fed
//! into the shutdown policy, and the processed counter is incremented
//! exactly once on every path, including skips.

use crate::config::Config;
use crate::crawler::coordinator::CrawlHooks;
use crate::crawler::frontier::{CrawlTarget, Frontier};
use crate::crawler::logs::{LogRecord, PageLogger};
use crate::crawler::shutdown::ShutdownController;
use crate::session::{Browser, PageSession, SessionObserver};
use crate::SessionError;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// How many in-flight request URLs a navigation failure reports
const MAX_REPORTED_PENDING_REQUESTS: usize = 10;

/// Fetches single pages through the browser capability
pub struct PageFetcher {
    config: Arc<Config>,
    frontier: Arc<Frontier>,
    shutdown: Arc<ShutdownController>,
    browser: Arc<dyn Browser>,
    hooks: Arc<dyn CrawlHooks>,
}

impl PageFetcher {
    pub fn new(
        config: Arc<Config>,
        frontier: Arc<Frontier>,
        shutdown: Arc<ShutdownController>,
        browser: Arc<dyn Browser>,
        hooks: Arc<dyn CrawlHooks>,
    ) -> Self {
        Self {
            config,
            frontier,
            shutdown,
            browser,
            hooks,
        }
    }

    /// Fetches one target and returns its log record
    ///
    /// Skipped targets (shutdown in progress, or a static asset that already
    /// exists on disk) still count as processed and yield a record with no
    /// entries.
    pub async fn fetch(self: Arc<Self>, target: CrawlTarget) -> LogRecord {
        let logger = Arc::new(PageLogger::new(
            &target.route,
            &self.config.crawl.base_path,
            &self.config.options,
            Arc::clone(&self.shutdown),
        ));

        if self.shutdown.is_shutting_down() || self.should_skip(&target) {
            let (processed, enqueued) = self.frontier.progress();
            tracing::info!(
                "🚧  skipping ({}/{}) {}",
                processed + 1,
                enqueued,
                target.route
            );
        } else {
            match self.fetch_page(&target, &logger).await {
                Ok(()) => {
                    let (processed, enqueued) = self.frontier.progress();
                    tracing::info!(
                        "✅  crawled {} out of {} ({})",
                        processed + 1,
                        enqueued,
                        target.route
                    );
                }
                Err(error) => {
                    if !self.shutdown.is_shutting_down() {
                        tracing::error!("🔥  crawl error at {}: {}", target.route, error);
                        self.shutdown
                            .trigger_unless_ignored(self.config.options.ignore_page_errors);
                    }
                }
            }
        }

        self.frontier.mark_processed();
        LogRecord {
            url: target.url,
            entries: logger.drain(),
        }
    }

    /// Static assets already present under the source directory need no
    /// fetch: anything with a non-empty extension other than ".html" whose
    /// mirrored file exists is skipped.
    fn should_skip(&self, target: &CrawlTarget) -> bool {
        let route_path = Path::new(target.route.trim_start_matches('/'));
        match route_path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext != "html" => self.config.crawl.source_dir.join(route_path).exists(),
            _ => false,
        }
    }

    /// Opens a session, drives it through the fetch, and closes it on every
    /// exit path
    async fn fetch_page(
        &self,
        target: &CrawlTarget,
        logger: &Arc<PageLogger>,
    ) -> crate::Result<()> {
        let observer: Arc<dyn SessionObserver> = Arc::clone(logger) as Arc<dyn SessionObserver>;
        let mut session = self.browser.open_session(observer).await?;

        let outcome = self.drive(session.as_mut(), target, logger).await;
        let closed = session.close().await;

        outcome?;
        closed?;
        Ok(())
    }

    async fn drive(
        &self,
        session: &mut dyn PageSession,
        target: &CrawlTarget,
        logger: &Arc<PageLogger>,
    ) -> crate::Result<()> {
        let options = &self.config.options;

        session.disable_service_workers().await?;
        session.set_cache_enabled(self.config.browser.cache).await?;
        if let Some(viewport) = &options.viewport {
            session.set_viewport(viewport).await?;
        }
        if options.skip_third_party_requests {
            session
                .restrict_requests_to(&self.config.crawl.base_path)
                .await?;
        }

        self.hooks.before_fetch(session, &target.route).await?;
        session.set_user_agent(&options.user_agent).await?;

        if let Err(error) = session.navigate(&target.url).await {
            return Err(augment_navigation_error(error, session.pending_requests()).into());
        }

        if let Some(pattern) = &options.wait_for_response {
            session.wait_for_response(pattern).await?;
        }

        if let Some(wait_for) = options.wait_for {
            tokio::time::sleep(Duration::from_millis(wait_for)).await;
        }

        if options.follow_links {
            for link in session.extract_links().await? {
                self.frontier.admit(&link);
            }
        }

        self.hooks
            .after_fetch(session, target, &self.frontier, logger)
            .await?;
        Ok(())
    }
}

/// Appends the still-pending request URLs to a navigation failure, the most
/// recent first-hand clue to why a page never settled
fn augment_navigation_error(error: SessionError, pending: Vec<String>) -> SessionError {
    match error {
        SessionError::Navigation { url, mut message } if !pending.is_empty() => {
            let start = pending.len().saturating_sub(MAX_REPORTED_PENDING_REQUESTS);
            message.push_str("\nRequests still in flight:");
            for request in &pending[start..] {
                message.push_str("\n  ");
                message.push_str(request);
            }
            SessionError::Navigation { url, message }
        }
        other => other,
    }
}
