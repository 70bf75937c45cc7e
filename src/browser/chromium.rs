//! Headless Chromium backend using chromiumoxide.

use super::{with_suffix, without_query, Browser, BrowserError, BrowsingContext};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig};
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Timeout applied when the caller does not set one
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Chromium-based browser
pub struct ChromiumBrowser {
    browser: CdpBrowser,
}

impl ChromiumBrowser {
    /// Launches a headless Chromium instance
    ///
    /// The executable is located by chromiumoxide (`CHROME` env var, then the
    /// usual install locations).
    pub async fn launch() -> Result<Self, BrowserError> {
        let config = BrowserConfig::builder()
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .build()
            .map_err(|e| BrowserError::Unavailable(format!("failed to build browser config: {e}")))?;

        let (browser, mut handler) = CdpBrowser::launch(config)
            .await
            .map_err(|e| BrowserError::Unavailable(format!("failed to launch Chromium: {e}")))?;

        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        Ok(Self { browser })
    }
}

#[async_trait]
impl Browser for ChromiumBrowser {
    async fn new_context(&self) -> Result<Box<dyn BrowsingContext>, BrowserError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::Unavailable(format!("failed to open page: {e}")))?;

        Ok(Box::new(ChromiumContext { page }))
    }
}

/// A single Chromium page
struct ChromiumContext {
    page: Page,
}

#[async_trait]
impl BrowsingContext for ChromiumContext {
    async fn navigate(&mut self, url: &str, timeout: Option<Duration>) -> Result<(), BrowserError> {
        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let shown = without_query(url).to_string();

        let page = &self.page;
        load_within(&shown, timeout, async move {
            page.goto(url).await?;
            page.wait_for_navigation().await?;
            Ok::<_, chromiumoxide::error::CdpError>(())
        })
        .await
    }

    async fn content(&self) -> Result<String, BrowserError> {
        self.page
            .content()
            .await
            .map_err(|e| BrowserError::Script(format!("failed to read DOM: {e}")))
    }

    async fn snapshot(&self, stem: &Path) -> Result<PathBuf, BrowserError> {
        let path = with_suffix(stem, "png");
        let params = ScreenshotParams::builder().full_page(true).build();
        self.page
            .save_screenshot(params, &path)
            .await
            .map_err(|e| BrowserError::Snapshot(e.to_string()))?;
        Ok(path)
    }

    async fn close(self: Box<Self>) -> Result<(), BrowserError> {
        self.page
            .close()
            .await
            .map_err(|e| BrowserError::Unavailable(format!("failed to close page: {e}")))
    }
}

/// Runs the request and the page load under one deadline
///
/// A load that fails after the request went out is a navigation failure,
/// not a success.
async fn load_within<F, E>(shown: &str, timeout: Duration, load: F) -> Result<(), BrowserError>
where
    F: Future<Output = Result<(), E>>,
    E: fmt::Display,
{
    match tokio::time::timeout(timeout, load).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(BrowserError::Navigation {
            url: shown.to_string(),
            message: without_query(&e.to_string()).to_string(),
        }),
        Err(_) => Err(BrowserError::Timeout {
            url: shown.to_string(),
            timeout,
        }),
    }
}
