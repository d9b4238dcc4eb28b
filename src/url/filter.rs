use crate::config::Config;
use crate::UrlError;
use regex::Regex;
use url::Url;

/// Admission filter for discovered URLs
///
/// Built once per run from the configuration; decides which raw URLs are
/// eligible for the frontier and what their normalized crawl identity is.
#[derive(Debug)]
pub struct UrlFilter {
    /// Base path with no trailing slash, used for route computation
    base_prefix: String,
    /// Host the crawl is restricted to
    host: String,
    /// Explicit port discovered links must carry; configured port wins,
    /// otherwise the base path's own explicit port
    port: Option<u16>,
    /// Compiled exclusion patterns, matched against the URL path
    exclude: Vec<Regex>,
}

impl UrlFilter {
    /// Builds the filter from a validated configuration
    pub fn new(config: &Config) -> Result<Self, UrlError> {
        let base = Url::parse(&config.crawl.base_path)
            .map_err(|e| UrlError::Parse(e.to_string()))?;

        let host = base.host_str().ok_or(UrlError::MissingHost)?.to_string();

        // Validation already compiled these once; unknown patterns cannot
        // reach this point.
        let exclude = config
            .options
            .exclude
            .iter()
            .filter_map(|pattern| Regex::new(pattern).ok())
            .collect();

        Ok(Self {
            base_prefix: config.crawl.base_path.clone(),
            host,
            port: config.options.port.or_else(|| base.port()),
            exclude,
        })
    }

    /// Normalizes a raw URL to its crawl identity
    ///
    /// Query string and fragment are stripped: URLs differing only in those
    /// are the same page for crawl purposes. Everything else is preserved,
    /// including trailing slashes, so `/about` and `/about/` stay distinct
    /// entries.
    pub fn normalize(raw_url: &str) -> Result<String, UrlError> {
        let mut url = Url::parse(raw_url).map_err(|e| UrlError::Parse(e.to_string()))?;
        url.set_query(None);
        url.set_fragment(None);
        Ok(url.into())
    }

    /// Evaluates a raw URL for admission
    ///
    /// Returns the normalized URL when it is eligible for the frontier:
    /// same host as the base path, matching explicit port (absence on both
    /// sides counts as a match), and a path that matches no exclusion
    /// pattern. Returns `None` otherwise; rejection is silent by design.
    pub fn admit(&self, raw_url: &str) -> Option<String> {
        let mut url = Url::parse(raw_url).ok()?;
        url.set_query(None);
        url.set_fragment(None);

        if url.host_str() != Some(self.host.as_str()) {
            return None;
        }

        let port_matches = match (url.port(), self.port) {
            (None, None) => true,
            (Some(found), Some(expected)) => found == expected,
            _ => false,
        };
        if !port_matches {
            return None;
        }

        if self.exclude.iter().any(|re| re.is_match(url.path())) {
            return None;
        }

        Some(url.into())
    }

    /// Computes the route of a URL: the URL with the base path stripped
    pub fn route_of(&self, url: &str) -> String {
        match url.strip_prefix(&self.base_prefix) {
            Some("") => "/".to_string(),
            Some(route) => route.to_string(),
            None => url.to_string(),
        }
    }
}
