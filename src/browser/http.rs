//! HTTP browser backend
//!
//! Fetches the server-rendered document with reqwest. There is no script
//! execution, so the DOM is whatever the server (or the rendering proxy)
//! returned, and snapshots are saved as `.html`.

use super::{with_suffix, without_query, Browser, BrowserError, BrowsingContext};
use async_trait::async_trait;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Timeout applied when the caller does not set one
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Browser backend built on a shared HTTP client
pub struct HttpBrowser {
    client: Client,
}

impl HttpBrowser {
    /// Builds the backend with the given user agent
    ///
    /// # Example
    ///
    /// ```no_run
    /// use shopcrawl::browser::HttpBrowser;
    ///
    /// let browser = HttpBrowser::new("Mozilla/5.0").unwrap();
    /// ```
    pub fn new(user_agent: &str) -> Result<Self, BrowserError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| BrowserError::Unavailable(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Browser for HttpBrowser {
    async fn new_context(&self) -> Result<Box<dyn BrowsingContext>, BrowserError> {
        Ok(Box::new(HttpContext {
            client: self.client.clone(),
            body: None,
        }))
    }
}

/// One "tab": holds the last document it navigated to
struct HttpContext {
    client: Client,
    body: Option<String>,
}

#[async_trait]
impl BrowsingContext for HttpContext {
    async fn navigate(&mut self, url: &str, timeout: Option<Duration>) -> Result<(), BrowserError> {
        self.body = None;
        let shown = without_query(url).to_string();

        let mut request = self.client.get(url);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                BrowserError::Timeout {
                    url: shown.clone(),
                    timeout: timeout.unwrap_or(DEFAULT_TIMEOUT),
                }
            } else {
                BrowserError::Navigation {
                    url: shown.clone(),
                    message: e.without_url().to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(BrowserError::Navigation {
                url: shown,
                message: format!("HTTP {}", status.as_u16()),
            });
        }

        let body = response.text().await.map_err(|e| BrowserError::Navigation {
            url: shown.clone(),
            message: e.without_url().to_string(),
        })?;

        self.body = Some(body);
        Ok(())
    }

    async fn content(&self) -> Result<String, BrowserError> {
        self.body.clone().ok_or(BrowserError::NotNavigated)
    }

    async fn snapshot(&self, stem: &Path) -> Result<PathBuf, BrowserError> {
        let path = with_suffix(stem, "html");
        let body = self.body.as_deref().unwrap_or_default();
        tokio::fs::write(&path, body).await?;
        Ok(path)
    }

    async fn close(self: Box<Self>) -> Result<(), BrowserError> {
        Ok(())
    }
}
