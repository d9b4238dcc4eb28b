//! Per-URL event log aggregation
//!
//! Every fetch owns one [`PageLogger`], installed as the session observer
//! for exactly that page. It converts console messages, uncaught page
//! errors, and HTTP warnings into [`LogEntry`] values, mirrors them onto the
//! human-readable side channel, and applies the fatal-error policy.

use crate::config::CrawlOptions;
use crate::crawler::shutdown::ShutdownController;
use crate::session::{ConsoleMessage, PageErrorInfo, ResponseInfo, SessionObserver};
use std::sync::{Arc, Mutex};

/// One captured page event
#[derive(Debug, Clone, PartialEq)]
pub enum LogEntry {
    /// Console output of live object handles, as JSON values
    ConsoleObject(Vec<serde_json::Value>),
    /// Console output of error handles, stringified
    ConsoleError(Vec<String>),
    /// Plain console text with the emitting script's URL
    ConsoleText {
        text: String,
        source_url: Option<String>,
    },
    /// Uncaught page error, stack trace when available
    PageError(String),
    /// HTTP response with status >= 400, attributed to the referring route
    HttpWarning {
        status: u16,
        url: String,
        referer_route: String,
    },
}

/// All events captured while fetching one URL
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub url: String,
    pub entries: Vec<LogEntry>,
}

/// Session observer for a single fetch
///
/// Entries are appended only by the session that owns this logger; the
/// fetcher drains them into the final [`LogRecord`] once the fetch settles.
pub struct PageLogger {
    route: String,
    base_path: String,
    skip_third_party_requests: bool,
    source_maps: bool,
    ignore_page_errors: bool,
    shutdown: Arc<ShutdownController>,
    entries: Mutex<Vec<LogEntry>>,
}

impl PageLogger {
    pub fn new(
        route: &str,
        base_path: &str,
        options: &CrawlOptions,
        shutdown: Arc<ShutdownController>,
    ) -> Self {
        Self {
            route: route.to_string(),
            base_path: base_path.to_string(),
            skip_third_party_requests: options.skip_third_party_requests,
            source_maps: options.source_maps,
            ignore_page_errors: options.ignore_page_errors,
            shutdown,
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Appends an entry directly; used by after-fetch hooks
    pub fn push(&self, entry: LogEntry) {
        self.entries.lock().unwrap().push(entry);
    }

    /// Snapshot of the entries captured so far
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().unwrap().clone()
    }

    /// Takes ownership of all captured entries
    pub fn drain(&self) -> Vec<LogEntry> {
        std::mem::take(&mut *self.entries.lock().unwrap())
    }

    /// Decides whether an uncaught page error is fatal
    ///
    /// A bare "Event" marker and TypeError-category messages are known noise
    /// and stay non-fatal. The matching is literal string inspection,
    /// preserved for compatibility and deliberately not extended.
    fn is_fatal_page_error(message: &str) -> bool {
        message != "Event" && !message.starts_with("TypeError")
    }
}

impl SessionObserver for PageLogger {
    fn on_console(&self, message: ConsoleMessage) {
        match message {
            ConsoleMessage::Object(values) => {
                tracing::info!(
                    "💬  console.log of object at {}: {:?}",
                    self.route,
                    values
                );
                self.push(LogEntry::ConsoleObject(values));
            }
            ConsoleMessage::Error(values) => {
                tracing::info!("💬  console.log of error at {}: {:?}", self.route, values);
                self.push(LogEntry::ConsoleError(values));
            }
            ConsoleMessage::Text { text, source_url } => {
                // Failed fetches of third-party resources are expected noise
                // while request interception is aborting them.
                let third_party_failure = self.skip_third_party_requests
                    && text.contains("ERR_FAILED")
                    && source_url.as_deref().is_some_and(|url| {
                        url.contains("http") && !url.contains(&self.base_path)
                    });
                if third_party_failure {
                    return;
                }

                if text.contains("[webpack-dev-server]") || text.contains("WebSocket") {
                    return;
                }

                if !text.contains("was preloaded") {
                    tracing::info!(
                        "💬  console.log at {}: {} {}",
                        self.route,
                        text,
                        source_url.as_deref().unwrap_or("")
                    );
                }
                self.push(LogEntry::ConsoleText { text, source_url });
            }
        }
    }

    fn on_page_error(&self, error: PageErrorInfo) {
        let detail = if self.source_maps {
            error.stack.clone().unwrap_or_else(|| error.message.clone())
        } else {
            error.message.clone()
        };
        tracing::error!("🔥  pageerror at {}: {}", self.route, detail);
        self.push(LogEntry::PageError(detail));

        if Self::is_fatal_page_error(&error.message) {
            self.shutdown.trigger_unless_ignored(self.ignore_page_errors);
        }
    }

    fn on_response(&self, response: ResponseInfo) {
        if response.status < 400 {
            return;
        }
        let referer_route = response
            .referer
            .as_deref()
            .map(|referer| referer.replacen(&self.base_path, "", 1))
            .unwrap_or_default();
        tracing::warn!(
            "⚠️  warning at {}: got {} HTTP code for {}",
            referer_route,
            response.status,
            response.url
        );
        self.push(LogEntry::HttpWarning {
            status: response.status,
            url: response.url,
            referer_route,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logger(options: CrawlOptions, shutdown: Arc<ShutdownController>) -> PageLogger {
        PageLogger::new("/about", "http://localhost:3000", &options, shutdown)
    }

    fn text(text: &str, source_url: Option<&str>) -> ConsoleMessage {
        ConsoleMessage::Text {
            text: text.to_string(),
            source_url: source_url.map(String::from),
        }
    }

    #[test]
    fn test_console_text_recorded() {
        let log = logger(CrawlOptions::default(), ShutdownController::new());
        log.on_console(text("hello", Some("http://localhost:3000/app.js")));
        assert_eq!(
            log.entries(),
            vec![LogEntry::ConsoleText {
                text: "hello".to_string(),
                source_url: Some("http://localhost:3000/app.js".to_string()),
            }]
        );
    }

    #[test]
    fn test_dev_server_chatter_dropped() {
        let log = logger(CrawlOptions::default(), ShutdownController::new());
        log.on_console(text("[webpack-dev-server] hot reload", None));
        log.on_console(text("WebSocket connection closed", None));
        assert!(log.entries().is_empty());
    }

    #[test]
    fn test_third_party_failure_dropped_when_skipping() {
        let options = CrawlOptions {
            skip_third_party_requests: true,
            ..CrawlOptions::default()
        };
        let log = logger(options, ShutdownController::new());
        log.on_console(text(
            "net::ERR_FAILED loading resource",
            Some("http://cdn.example.com/lib.js"),
        ));
        assert!(log.entries().is_empty());
    }

    #[test]
    fn test_third_party_failure_kept_without_skipping() {
        let log = logger(CrawlOptions::default(), ShutdownController::new());
        log.on_console(text(
            "net::ERR_FAILED loading resource",
            Some("http://cdn.example.com/lib.js"),
        ));
        assert_eq!(log.entries().len(), 1);
    }

    #[test]
    fn test_preload_notice_recorded() {
        let log = logger(CrawlOptions::default(), ShutdownController::new());
        log.on_console(text("resource was preloaded but not used", None));
        assert_eq!(log.entries().len(), 1);
    }

    #[test]
    fn test_page_error_triggers_shutdown() {
        let shutdown = ShutdownController::new();
        let log = logger(CrawlOptions::default(), Arc::clone(&shutdown));
        log.on_page_error(PageErrorInfo {
            message: "ReferenceError: x is not defined".to_string(),
            stack: None,
        });
        assert!(shutdown.is_shutting_down());
        assert_eq!(log.entries().len(), 1);
    }

    #[test]
    fn test_noise_errors_are_not_fatal() {
        let shutdown = ShutdownController::new();
        let log = logger(CrawlOptions::default(), Arc::clone(&shutdown));
        log.on_page_error(PageErrorInfo {
            message: "Event".to_string(),
            stack: None,
        });
        log.on_page_error(PageErrorInfo {
            message: "TypeError: cannot read property".to_string(),
            stack: None,
        });
        assert!(!shutdown.is_shutting_down());
        assert_eq!(log.entries().len(), 2);
    }

    #[test]
    fn test_ignore_page_errors_suppresses_shutdown() {
        let shutdown = ShutdownController::new();
        let options = CrawlOptions {
            ignore_page_errors: true,
            ..CrawlOptions::default()
        };
        let log = logger(options, Arc::clone(&shutdown));
        log.on_page_error(PageErrorInfo {
            message: "boom".to_string(),
            stack: None,
        });
        assert!(!shutdown.is_shutting_down());
    }

    #[test]
    fn test_stack_preferred_with_source_maps() {
        let log = logger(CrawlOptions::default(), ShutdownController::new());
        log.on_page_error(PageErrorInfo {
            message: "Event".to_string(),
            stack: Some("Error: boom\n  at app.js:1:1".to_string()),
        });
        assert_eq!(
            log.entries(),
            vec![LogEntry::PageError(
                "Error: boom\n  at app.js:1:1".to_string()
            )]
        );
    }

    #[test]
    fn test_http_warning_strips_base_path_from_referer() {
        let shutdown = ShutdownController::new();
        let log = logger(CrawlOptions::default(), Arc::clone(&shutdown));
        log.on_response(ResponseInfo {
            status: 404,
            url: "http://localhost:3000/missing.png".to_string(),
            referer: Some("http://localhost:3000/gallery".to_string()),
        });
        assert_eq!(
            log.entries(),
            vec![LogEntry::HttpWarning {
                status: 404,
                url: "http://localhost:3000/missing.png".to_string(),
                referer_route: "/gallery".to_string(),
            }]
        );
        // HTTP warnings are recoverable, never fatal.
        assert!(!shutdown.is_shutting_down());
    }

    #[test]
    fn test_successful_responses_ignored() {
        let log = logger(CrawlOptions::default(), ShutdownController::new());
        log.on_response(ResponseInfo {
            status: 200,
            url: "http://localhost:3000/app.js".to_string(),
            referer: None,
        });
        assert!(log.entries().is_empty());
    }
}
