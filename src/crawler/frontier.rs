//! Deduplicating crawl frontier
//!
//! The frontier is the single insertion point for work. Admission filters a
//! raw URL, checks-and-inserts it into the visited set, and pushes a
//! [`CrawlTarget`] into the stream the worker pool consumes. The visited set
//! and the enqueued/processed counters live behind one mutex, so concurrent
//! discovery of the same URL can never enqueue it twice and the counters can
//! never skew. The stream closes exactly once, when every enqueued target
//! has been processed.

use crate::config::Config;
use crate::crawler::shutdown::ShutdownController;
use crate::url::UrlFilter;
use crate::UrlError;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// A URL admitted for fetching
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlTarget {
    /// Full normalized URL
    pub url: String,
    /// URL with the base path stripped; used for display and file paths
    pub route: String,
}

/// Deduplicating, exclusion-filtered work queue
pub struct Frontier {
    filter: UrlFilter,
    follow_links: bool,
    not_found_url: String,
    shutdown: Arc<ShutdownController>,
    state: Mutex<FrontierState>,
}

struct FrontierState {
    /// Normalized URLs ever admitted; grows monotonically
    visited: HashSet<String>,
    enqueued: u64,
    processed: u64,
    closed: bool,
    /// Dropped when the frontier closes, ending the stream
    sender: Option<UnboundedSender<CrawlTarget>>,
}

impl Frontier {
    /// Creates the frontier and the stream of targets it will feed
    pub fn new(
        config: &Config,
        shutdown: Arc<ShutdownController>,
    ) -> Result<(Arc<Self>, UnboundedReceiver<CrawlTarget>), UrlError> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let frontier = Arc::new(Self {
            filter: UrlFilter::new(config)?,
            follow_links: config.options.follow_links,
            not_found_url: config.not_found_url(),
            shutdown,
            state: Mutex::new(FrontierState {
                visited: HashSet::new(),
                enqueued: 0,
                processed: 0,
                closed: false,
                sender: Some(sender),
            }),
        });
        Ok((frontier, receiver))
    }

    /// Admits a raw URL into the frontier
    ///
    /// A no-op when the URL fails admission (foreign host, mismatched port,
    /// excluded path, unparseable), was already admitted, the frontier is
    /// closed, or shutdown has been triggered. The second successful
    /// admission of a run additionally admits the conventional not-found
    /// page when link-following is enabled, so a custom 404 page is
    /// exercised even if nothing links to it.
    pub fn admit(&self, raw_url: &str) {
        if self.shutdown.is_shutting_down() {
            return;
        }
        let Some(url) = self.filter.admit(raw_url) else {
            return;
        };

        let bootstrap_not_found;
        {
            let mut state = self.state.lock().unwrap();
            if state.closed || !state.visited.insert(url.clone()) {
                return;
            }
            state.enqueued += 1;
            let target = CrawlTarget {
                route: self.filter.route_of(&url),
                url,
            };
            if let Some(sender) = &state.sender {
                let _ = sender.send(target);
            }
            bootstrap_not_found = state.enqueued == 2 && self.follow_links;
        }

        if bootstrap_not_found {
            self.admit(&self.not_found_url);
        }
    }

    /// Records that one target finished processing
    ///
    /// Called exactly once per target on every exit path. Once processed
    /// catches up with enqueued, the frontier closes and the stream ends.
    pub fn mark_processed(&self) {
        let mut state = self.state.lock().unwrap();
        state.processed += 1;
        debug_assert!(state.processed <= state.enqueued);
        if state.processed == state.enqueued {
            state.closed = true;
            state.sender = None;
        }
    }

    /// Marks the end of seeding
    ///
    /// When every seed was rejected (or none were configured) nothing will
    /// ever call `mark_processed`, so the frontier closes here instead of
    /// leaving the stream open forever.
    pub fn finish_seeding(&self) {
        let mut state = self.state.lock().unwrap();
        if state.enqueued == state.processed {
            state.closed = true;
            state.sender = None;
        }
    }

    /// Current `(processed, enqueued)` counters
    pub fn progress(&self) -> (u64, u64) {
        let state = self.state.lock().unwrap();
        (state.processed, state.enqueued)
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BrowserSettings, CrawlOptions, CrawlTargetConfig};
    use std::path::PathBuf;

    const BASE: &str = "http://localhost:3000";

    fn test_config(follow_links: bool) -> Config {
        let mut config = Config {
            crawl: CrawlTargetConfig {
                base_path: BASE.to_string(),
                public_path: "/".to_string(),
                source_dir: PathBuf::from("./build"),
            },
            options: CrawlOptions {
                follow_links,
                ..CrawlOptions::default()
            },
            browser: BrowserSettings::default(),
        };
        config.normalize();
        config
    }

    fn frontier(follow_links: bool) -> (Arc<Frontier>, UnboundedReceiver<CrawlTarget>) {
        Frontier::new(&test_config(follow_links), ShutdownController::new()).unwrap()
    }

    #[tokio::test]
    async fn test_admit_enqueues_target() {
        let (frontier, mut receiver) = frontier(false);
        frontier.admit(&format!("{}/about", BASE));

        let target = receiver.recv().await.unwrap();
        assert_eq!(target.url, format!("{}/about", BASE));
        assert_eq!(target.route, "/about");
        assert_eq!(frontier.progress(), (0, 1));
    }

    #[tokio::test]
    async fn test_duplicate_admissions_enqueue_once() {
        let (frontier, mut receiver) = frontier(false);
        frontier.admit(&format!("{}/about", BASE));
        frontier.admit(&format!("{}/about", BASE));
        frontier.admit(&format!("{}/about?utm=1", BASE));
        frontier.admit(&format!("{}/about#section", BASE));

        assert_eq!(frontier.progress(), (0, 1));
        assert!(receiver.recv().await.is_some());
        frontier.mark_processed();
        assert!(receiver.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_trailing_slash_is_a_distinct_entry() {
        let (frontier, _receiver) = frontier(false);
        frontier.admit(&format!("{}/about", BASE));
        frontier.admit(&format!("{}/about/", BASE));
        assert_eq!(frontier.progress(), (0, 2));
    }

    #[tokio::test]
    async fn test_foreign_urls_rejected_silently() {
        let (frontier, _receiver) = frontier(false);
        frontier.admit("http://external.example.com/");
        frontier.admit("http://localhost:4000/other-port");
        frontier.admit("not a url at all");
        assert_eq!(frontier.progress(), (0, 0));
    }

    #[tokio::test]
    async fn test_second_admission_bootstraps_not_found_page() {
        let (frontier, mut receiver) = frontier(true);
        frontier.admit(&format!("{}/", BASE));
        frontier.admit(&format!("{}/about", BASE));

        assert_eq!(frontier.progress(), (0, 3));
        assert_eq!(receiver.recv().await.unwrap().route, "/");
        assert_eq!(receiver.recv().await.unwrap().route, "/about");
        assert_eq!(receiver.recv().await.unwrap().route, "/404.html");
    }

    #[tokio::test]
    async fn test_not_found_bootstrap_happens_once() {
        let (frontier, _receiver) = frontier(true);
        frontier.admit(&format!("{}/", BASE));
        frontier.admit(&format!("{}/about", BASE));
        frontier.admit(&format!("{}/contact", BASE));
        frontier.admit(&format!("{}/pricing", BASE));

        // "/", "/about", the bootstrap 404, "/contact", "/pricing"
        assert_eq!(frontier.progress(), (0, 5));
    }

    #[tokio::test]
    async fn test_no_bootstrap_without_link_following() {
        let (frontier, _receiver) = frontier(false);
        frontier.admit(&format!("{}/", BASE));
        frontier.admit(&format!("{}/about", BASE));
        assert_eq!(frontier.progress(), (0, 2));
    }

    #[tokio::test]
    async fn test_closes_when_processed_catches_up() {
        let (frontier, mut receiver) = frontier(false);
        frontier.admit(&format!("{}/", BASE));
        assert!(!frontier.is_closed());

        frontier.mark_processed();
        assert!(frontier.is_closed());
        assert_eq!(frontier.progress(), (1, 1));

        // Stream yields the admitted target, then end-of-stream.
        assert!(receiver.recv().await.is_some());
        assert!(receiver.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_admit_after_close_is_noop() {
        let (frontier, _receiver) = frontier(false);
        frontier.admit(&format!("{}/", BASE));
        frontier.mark_processed();

        frontier.admit(&format!("{}/late", BASE));
        assert_eq!(frontier.progress(), (1, 1));
    }

    #[tokio::test]
    async fn test_admit_during_shutdown_is_noop() {
        let shutdown = ShutdownController::new();
        let (frontier, _receiver) =
            Frontier::new(&test_config(false), Arc::clone(&shutdown)).unwrap();

        shutdown.trigger();
        frontier.admit(&format!("{}/", BASE));
        assert_eq!(frontier.progress(), (0, 0));
    }

    #[tokio::test]
    async fn test_finish_seeding_closes_empty_frontier() {
        let (frontier, mut receiver) = frontier(false);
        frontier.finish_seeding();
        assert!(frontier.is_closed());
        assert!(receiver.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_finish_seeding_keeps_pending_work() {
        let (frontier, _receiver) = frontier(false);
        frontier.admit(&format!("{}/", BASE));
        frontier.finish_seeding();
        assert!(!frontier.is_closed());
    }
}
