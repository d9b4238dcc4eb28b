//! Browser capability surface
//!
//! The crawl engine never talks to a browser directly; it drives these
//! traits. A [`Browser`] opens one [`PageSession`] per fetched URL, and the
//! session pushes console output, uncaught page errors, and completed HTTP
//! exchanges into the [`SessionObserver`] supplied at open time. Observer
//! registration lives exactly as long as the session: teardown deregisters.
//!
//! The bundled [`HttpBrowser`] backs a crawl with plain HTTP fetches and
//! HTML parsing; real headless-browser providers implement the same traits
//! out of tree.

mod http;

pub use http::HttpBrowser;

use crate::config::Viewport;
use crate::SessionError;
use async_trait::async_trait;
use std::sync::Arc;

/// A console message emitted by a page
#[derive(Debug, Clone)]
pub enum ConsoleMessage {
    /// `console.log` of live object handles, serialized to JSON values
    Object(Vec<serde_json::Value>),
    /// `console.log` of error handles, stringified
    Error(Vec<String>),
    /// Plain console text with the URL of the script that produced it
    Text {
        text: String,
        source_url: Option<String>,
    },
}

/// An uncaught error raised inside a page
#[derive(Debug, Clone)]
pub struct PageErrorInfo {
    pub message: String,
    /// Stack trace when the provider can supply one, possibly source-mapped
    pub stack: Option<String>,
}

/// A completed HTTP exchange observed by the session
#[derive(Debug, Clone)]
pub struct ResponseInfo {
    pub status: u16,
    pub url: String,
    /// Referer header of the originating request, when present
    pub referer: Option<String>,
}

/// Push-based observation of page activity for the lifetime of one session
pub trait SessionObserver: Send + Sync {
    fn on_console(&self, message: ConsoleMessage);
    fn on_page_error(&self, error: PageErrorInfo);
    fn on_response(&self, response: ResponseInfo);
}

/// One browser tab/context, used to fetch exactly one URL
///
/// Exclusively owned by the fetch that opened it and closed on every exit
/// path. Navigation waits for network activity to settle and carries no
/// timeout.
#[async_trait]
pub trait PageSession: Send {
    /// Disables background service-worker interference for this session
    async fn disable_service_workers(&mut self) -> Result<(), SessionError>;

    async fn set_cache_enabled(&mut self, enabled: bool) -> Result<(), SessionError>;

    async fn set_viewport(&mut self, viewport: &Viewport) -> Result<(), SessionError>;

    async fn set_user_agent(&mut self, user_agent: &str) -> Result<(), SessionError>;

    /// Aborts every outbound request whose URL does not start with the given
    /// base path
    async fn restrict_requests_to(&mut self, base_path: &str) -> Result<(), SessionError>;

    /// Navigates to the URL and waits for network activity to settle
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError>;

    /// Waits, with no timeout, for a response whose URL contains the pattern
    async fn wait_for_response(&mut self, pattern: &str) -> Result<(), SessionError>;

    /// Extracts anchor and alternate-link hrefs plus iframe sources from the
    /// rendered document
    async fn extract_links(&mut self) -> Result<Vec<String>, SessionError>;

    /// URLs of requests still in flight, for navigation-failure reporting
    fn pending_requests(&self) -> Vec<String>;

    async fn close(self: Box<Self>) -> Result<(), SessionError>;
}

/// Factory for page sessions; one instance serves a whole run
#[async_trait]
pub trait Browser: Send + Sync {
    /// Opens a fresh session with the given observer installed
    async fn open_session(
        &self,
        observer: Arc<dyn SessionObserver>,
    ) -> Result<Box<dyn PageSession>, SessionError>;

    /// Tears the browser down; called exactly once at run end
    async fn close(&self) -> Result<(), SessionError>;
}
