//! Bounded-concurrency worker pool
//!
//! Consumes the frontier stream with at most `concurrency` fetches in
//! flight and collects their log records in completion order. The pool
//! terminates when the stream ends and the last in-flight fetch drains;
//! it never aborts a running fetch.

use crate::crawler::fetcher::PageFetcher;
use crate::crawler::frontier::{CrawlTarget, Frontier};
use crate::crawler::logs::LogRecord;
use crate::crawler::shutdown::ShutdownController;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinSet;

pub struct WorkerPool {
    concurrency: usize,
}

impl WorkerPool {
    pub fn new(concurrency: usize) -> Self {
        Self { concurrency }
    }

    /// Drains the frontier stream through the fetcher
    ///
    /// New targets are only pulled while a worker slot is free, so no more
    /// than `concurrency` sessions are ever open at once.
    pub async fn run(
        &self,
        mut queue: UnboundedReceiver<CrawlTarget>,
        fetcher: Arc<PageFetcher>,
        frontier: Arc<Frontier>,
        shutdown: Arc<ShutdownController>,
        ignore_page_errors: bool,
    ) -> Vec<LogRecord> {
        let mut in_flight = JoinSet::new();
        let mut records = Vec::new();
        let mut stream_open = true;

        while stream_open || !in_flight.is_empty() {
            let can_join = !in_flight.is_empty();
            let can_pull = stream_open && in_flight.len() < self.concurrency;

            tokio::select! {
                Some(joined) = in_flight.join_next(), if can_join => {
                    match joined {
                        Ok(record) => records.push(record),
                        Err(error) => {
                            // A fetch that dies instead of returning is the
                            // async analog of an unhandled rejection.
                            tracing::error!("🔥  UnhandledRejection: {}", error);
                            shutdown.trigger_unless_ignored(ignore_page_errors);
                            frontier.mark_processed();
                        }
                    }
                }
                target = queue.recv(), if can_pull => {
                    match target {
                        Some(target) => {
                            in_flight.spawn(Arc::clone(&fetcher).fetch(target));
                        }
                        None => stream_open = false,
                    }
                }
            }
        }

        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BrowserSettings, Config, CrawlOptions, CrawlTargetConfig, Viewport};
    use crate::crawler::coordinator::NoopHooks;
    use crate::session::{Browser, PageSession, SessionObserver};
    use crate::SessionError;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const BASE: &str = "http://localhost:3000";

    /// Tracks how many sessions are open at once
    #[derive(Default)]
    struct Gauge {
        current: AtomicUsize,
        max: AtomicUsize,
    }

    impl Gauge {
        fn enter(&self) {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.max.fetch_max(now, Ordering::SeqCst);
        }

        fn leave(&self) {
            self.current.fetch_sub(1, Ordering::SeqCst);
        }
    }

    struct GaugedBrowser {
        gauge: Arc<Gauge>,
    }

    #[async_trait]
    impl Browser for GaugedBrowser {
        async fn open_session(
            &self,
            _observer: Arc<dyn SessionObserver>,
        ) -> Result<Box<dyn PageSession>, SessionError> {
            self.gauge.enter();
            Ok(Box::new(GaugedSession {
                gauge: Arc::clone(&self.gauge),
            }))
        }

        async fn close(&self) -> Result<(), SessionError> {
            Ok(())
        }
    }

    struct GaugedSession {
        gauge: Arc<Gauge>,
    }

    #[async_trait]
    impl PageSession for GaugedSession {
        async fn disable_service_workers(&mut self) -> Result<(), SessionError> {
            Ok(())
        }

        async fn set_cache_enabled(&mut self, _enabled: bool) -> Result<(), SessionError> {
            Ok(())
        }

        async fn set_viewport(&mut self, _viewport: &Viewport) -> Result<(), SessionError> {
            Ok(())
        }

        async fn set_user_agent(&mut self, _user_agent: &str) -> Result<(), SessionError> {
            Ok(())
        }

        async fn restrict_requests_to(&mut self, _base_path: &str) -> Result<(), SessionError> {
            Ok(())
        }

        async fn navigate(&mut self, _url: &str) -> Result<(), SessionError> {
            // Long enough for the pool to saturate its slots.
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(())
        }

        async fn wait_for_response(&mut self, _pattern: &str) -> Result<(), SessionError> {
            Ok(())
        }

        async fn extract_links(&mut self) -> Result<Vec<String>, SessionError> {
            Ok(Vec::new())
        }

        fn pending_requests(&self) -> Vec<String> {
            Vec::new()
        }

        async fn close(self: Box<Self>) -> Result<(), SessionError> {
            self.gauge.leave();
            Ok(())
        }
    }

    fn test_config(concurrency: usize) -> Arc<Config> {
        let mut config = Config {
            crawl: CrawlTargetConfig {
                base_path: BASE.to_string(),
                public_path: "/".to_string(),
                source_dir: PathBuf::from("./build"),
            },
            options: CrawlOptions {
                concurrency,
                follow_links: false,
                ..CrawlOptions::default()
            },
            browser: BrowserSettings::default(),
        };
        config.normalize();
        Arc::new(config)
    }

    #[tokio::test]
    async fn test_concurrency_bound_is_respected() {
        let config = test_config(2);
        let shutdown = ShutdownController::new();
        let (frontier, queue) = Frontier::new(&config, Arc::clone(&shutdown)).unwrap();

        let gauge = Arc::new(Gauge::default());
        let browser = Arc::new(GaugedBrowser {
            gauge: Arc::clone(&gauge),
        });
        let fetcher = Arc::new(PageFetcher::new(
            Arc::clone(&config),
            Arc::clone(&frontier),
            Arc::clone(&shutdown),
            browser,
            Arc::new(NoopHooks),
        ));

        for route in ["/a", "/b", "/c", "/d", "/e"] {
            frontier.admit(&format!("{}{}", BASE, route));
        }
        frontier.finish_seeding();

        let pool = WorkerPool::new(config.options.concurrency);
        let records = pool
            .run(queue, fetcher, Arc::clone(&frontier), shutdown, false)
            .await;

        assert_eq!(records.len(), 5);
        assert!(gauge.max.load(Ordering::SeqCst) <= 2);
        assert_eq!(gauge.current.load(Ordering::SeqCst), 0);
        assert_eq!(frontier.progress(), (5, 5));
        assert!(frontier.is_closed());
    }

    #[tokio::test]
    async fn test_empty_stream_yields_no_records() {
        let config = test_config(2);
        let shutdown = ShutdownController::new();
        let (frontier, queue) = Frontier::new(&config, Arc::clone(&shutdown)).unwrap();
        frontier.finish_seeding();

        let browser = Arc::new(GaugedBrowser {
            gauge: Arc::new(Gauge::default()),
        });
        let fetcher = Arc::new(PageFetcher::new(
            Arc::clone(&config),
            Arc::clone(&frontier),
            Arc::clone(&shutdown),
            browser,
            Arc::new(NoopHooks),
        ));

        let pool = WorkerPool::new(2);
        let records = pool
            .run(queue, fetcher, Arc::clone(&frontier), shutdown, false)
            .await;

        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_all_records_collected_with_single_worker() {
        let config = test_config(1);
        let shutdown = ShutdownController::new();
        let (frontier, queue) = Frontier::new(&config, Arc::clone(&shutdown)).unwrap();

        let gauge = Arc::new(Gauge::default());
        let browser = Arc::new(GaugedBrowser {
            gauge: Arc::clone(&gauge),
        });
        let fetcher = Arc::new(PageFetcher::new(
            Arc::clone(&config),
            Arc::clone(&frontier),
            Arc::clone(&shutdown),
            browser,
            Arc::new(NoopHooks),
        ));

        for route in ["/a", "/b", "/c"] {
            frontier.admit(&format!("{}{}", BASE, route));
        }
        frontier.finish_seeding();

        let pool = WorkerPool::new(1);
        let records = pool
            .run(queue, fetcher, Arc::clone(&frontier), shutdown, false)
            .await;

        assert_eq!(records.len(), 3);
        assert_eq!(gauge.max.load(Ordering::SeqCst), 1);
    }
}
