use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure for Prerender-Crawl
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawl: CrawlTargetConfig,
    #[serde(default)]
    pub options: CrawlOptions,
    #[serde(default)]
    pub browser: BrowserSettings,
}

/// Where the served application lives and where its built assets are
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlTargetConfig {
    /// Origin the crawl is restricted to (e.g. "http://localhost:45678")
    #[serde(rename = "base-path")]
    pub base_path: String,

    /// Public path prefix the application is served under
    #[serde(rename = "public-path", default = "default_public_path")]
    pub public_path: String,

    /// Local directory mirroring the served static assets
    #[serde(rename = "source-dir")]
    pub source_dir: PathBuf,
}

/// Crawl behavior options
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlOptions {
    /// Seed paths to start crawling from
    #[serde(default = "default_include")]
    pub include: Vec<String>,

    /// Path patterns (regexes) that are never enqueued
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Whether to follow links discovered on fetched pages
    #[serde(rename = "follow-links", default = "default_true")]
    pub follow_links: bool,

    /// Maximum number of concurrently in-flight page fetches
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Port discovered links must be served on; defaults to the base path's
    /// explicit port
    #[serde(default)]
    pub port: Option<u16>,

    /// Abort outbound requests that do not target the base path
    #[serde(rename = "skip-third-party-requests", default)]
    pub skip_third_party_requests: bool,

    /// Prefer source-mapped stack traces for page errors when the session
    /// provider supplies them
    #[serde(rename = "source-maps", default = "default_true")]
    pub source_maps: bool,

    /// Log page errors but keep crawling instead of shutting down
    #[serde(rename = "ignore-page-errors", default)]
    pub ignore_page_errors: bool,

    /// User agent applied to every session
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Viewport applied to every session
    #[serde(default)]
    pub viewport: Option<Viewport>,

    /// Fixed delay after navigation, in milliseconds
    #[serde(rename = "wait-for", default)]
    pub wait_for: Option<u64>,

    /// URL substring a response must match before a fetch is considered
    /// settled; waits with no timeout
    #[serde(rename = "wait-for-response", default)]
    pub wait_for_response: Option<String>,
}

/// Page viewport dimensions
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Settings handed through opaquely to the browser capability
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserSettings {
    #[serde(default = "default_true")]
    pub headless: bool,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(rename = "executable-path", default)]
    pub executable_path: Option<PathBuf>,

    #[serde(rename = "ignore-https-errors", default)]
    pub ignore_https_errors: bool,

    /// Whether sessions keep their resource cache enabled
    #[serde(default = "default_true")]
    pub cache: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            include: default_include(),
            exclude: Vec::new(),
            follow_links: true,
            concurrency: default_concurrency(),
            port: None,
            skip_third_party_requests: false,
            source_maps: true,
            ignore_page_errors: false,
            user_agent: default_user_agent(),
            viewport: None,
            wait_for: None,
            wait_for_response: None,
        }
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            args: Vec::new(),
            executable_path: None,
            ignore_https_errors: false,
            cache: true,
        }
    }
}

impl Config {
    /// Canonicalizes path-like fields after deserialization.
    ///
    /// The base path loses any trailing slash so routes always start with a
    /// single "/", and the public path is reduced to its slash-free stem so
    /// the not-found bootstrap admission is always `{base}{public}/404.html`.
    pub fn normalize(&mut self) {
        while self.crawl.base_path.ends_with('/') {
            self.crawl.base_path.pop();
        }
        self.crawl.public_path = self
            .crawl
            .public_path
            .trim_matches('/')
            .to_string();
        if !self.crawl.public_path.is_empty() {
            self.crawl.public_path = format!("/{}", self.crawl.public_path);
        }
    }

    /// Full URL of the conventional not-found page.
    pub fn not_found_url(&self) -> String {
        format!("{}{}/404.html", self.crawl.base_path, self.crawl.public_path)
    }
}

fn default_public_path() -> String {
    "/".to_string()
}

fn default_include() -> Vec<String> {
    vec!["/".to_string()]
}

fn default_concurrency() -> usize {
    4
}

fn default_user_agent() -> String {
    "PrerenderCrawl".to_string()
}

fn default_true() -> bool {
    true
}
