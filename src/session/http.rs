//! HTTP-backed session provider
//!
//! Backs a crawl with plain HTTP fetches: navigation is a GET of the target
//! URL and link extraction parses the fetched document. Pages are not
//! executed, so browser-only controls (service workers, cache, viewport)
//! acknowledge and do nothing, and the only HTTP exchange the observer sees
//! is the document itself. Good enough for fully server-rendered apps and
//! for exercising the crawl engine end-to-end.

use crate::config::Viewport;
use crate::session::{Browser, PageSession, ResponseInfo, SessionObserver};
use crate::SessionError;
use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use reqwest::Client;
use scraper::{Html, Selector};
use std::sync::Arc;
use url::Url;

/// Session factory backed by a shared reqwest client
pub struct HttpBrowser {
    client: Client,
}

impl HttpBrowser {
    /// Builds the provider with a connection-pooling HTTP client
    ///
    /// No request timeout is configured: navigation deliberately waits as
    /// long as the server takes.
    pub fn new() -> Result<Self, SessionError> {
        let client = Client::builder().gzip(true).brotli(true).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Browser for HttpBrowser {
    async fn open_session(
        &self,
        observer: Arc<dyn SessionObserver>,
    ) -> Result<Box<dyn PageSession>, SessionError> {
        Ok(Box::new(HttpSession {
            client: self.client.clone(),
            observer,
            user_agent: None,
            allowed_prefix: None,
            document: None,
            document_url: None,
        }))
    }

    async fn close(&self) -> Result<(), SessionError> {
        Ok(())
    }
}

struct HttpSession {
    client: Client,
    observer: Arc<dyn SessionObserver>,
    user_agent: Option<String>,
    allowed_prefix: Option<String>,
    /// Body and final URL of the last navigation
    document: Option<String>,
    document_url: Option<Url>,
}

#[async_trait]
impl PageSession for HttpSession {
    async fn disable_service_workers(&mut self) -> Result<(), SessionError> {
        // Nothing runs in this provider, service workers included.
        Ok(())
    }

    async fn set_cache_enabled(&mut self, _enabled: bool) -> Result<(), SessionError> {
        Ok(())
    }

    async fn set_viewport(&mut self, _viewport: &Viewport) -> Result<(), SessionError> {
        Ok(())
    }

    async fn set_user_agent(&mut self, user_agent: &str) -> Result<(), SessionError> {
        self.user_agent = Some(user_agent.to_string());
        Ok(())
    }

    async fn restrict_requests_to(&mut self, base_path: &str) -> Result<(), SessionError> {
        self.allowed_prefix = Some(base_path.to_string());
        Ok(())
    }

    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        if let Some(prefix) = &self.allowed_prefix {
            if !url.starts_with(prefix.as_str()) {
                return Err(SessionError::Navigation {
                    url: url.to_string(),
                    message: "net::ERR_FAILED (request aborted by interception)".to_string(),
                });
            }
        }

        let mut request = self.client.get(url);
        if let Some(user_agent) = &self.user_agent {
            request = request.header(USER_AGENT, user_agent.as_str());
        }

        let response = request.send().await.map_err(|source| SessionError::Http {
            url: url.to_string(),
            source,
        })?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();

        if status >= 400 {
            self.observer.on_response(ResponseInfo {
                status,
                url: final_url.to_string(),
                referer: None,
            });
        }

        let body = response.text().await.map_err(|source| SessionError::Http {
            url: url.to_string(),
            source,
        })?;

        self.document = Some(body);
        self.document_url = Some(final_url);
        Ok(())
    }

    async fn wait_for_response(&mut self, pattern: &str) -> Result<(), SessionError> {
        // The document exchange is the only response this provider can
        // observe; there is nothing further to wait for.
        let matched = self
            .document_url
            .as_ref()
            .is_some_and(|url| url.as_str().contains(pattern));
        if !matched {
            tracing::debug!(
                "HTTP provider cannot observe subresource responses, pattern '{}' unmatched",
                pattern
            );
        }
        Ok(())
    }

    async fn extract_links(&mut self) -> Result<Vec<String>, SessionError> {
        match (&self.document, &self.document_url) {
            (Some(document), Some(base)) => Ok(collect_links(document, base)),
            _ => Ok(Vec::new()),
        }
    }

    fn pending_requests(&self) -> Vec<String> {
        // One request at a time, and it has always settled by the time
        // anyone asks.
        Vec::new()
    }

    async fn close(self: Box<Self>) -> Result<(), SessionError> {
        Ok(())
    }
}

/// Extracts followable URLs from a document: anchors, alternate links, and
/// iframe sources, resolved against the document URL
fn collect_links(document: &str, base: &Url) -> Vec<String> {
    let html = Html::parse_document(document);
    let mut links = Vec::new();

    if let Ok(selector) = Selector::parse("a[href], link[rel='alternate'][href]") {
        for element in html.select(&selector) {
            if let Some(href) = element.value().attr("href") {
                if let Ok(resolved) = base.join(href) {
                    links.push(resolved.to_string());
                }
            }
        }
    }

    if let Ok(selector) = Selector::parse("iframe[src]") {
        for element in html.select(&selector) {
            if let Some(src) = element.value().attr("src") {
                if let Ok(resolved) = base.join(src) {
                    links.push(resolved.to_string());
                }
            }
        }
    }

    links
}
