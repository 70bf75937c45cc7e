//! Browser abstraction for page rendering
//!
//! Defines the `Browser` and `BrowsingContext` traits the crawler drives, and
//! the `ContextPool` that caps how many contexts are open at once. The crawler
//! only ever needs: context creation and disposal, navigation with a timeout,
//! the rendered DOM (selectors run over it in-process), and a full-page
//! diagnostic snapshot.

#[cfg(feature = "chromium")]
pub mod chromium;
mod http;
#[cfg(test)]
pub(crate) mod testing;

pub use http::HttpBrowser;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Errors raised by a browser backend
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("navigation to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("page script error: {0}")]
    Script(String),

    #[error("no page loaded in this context")]
    NotNavigated,

    #[error("browser unavailable: {0}")]
    Unavailable(String),

    #[error("snapshot failed: {0}")]
    Snapshot(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BrowserError {
    /// True for failures a fresh context may not hit again
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Navigation { .. } | Self::Timeout { .. } | Self::Script(_) | Self::NotNavigated
        )
    }
}

/// A browser engine that can create isolated browsing contexts
#[async_trait]
pub trait Browser: Send + Sync {
    /// Open a new, isolated context
    async fn new_context(&self) -> Result<Box<dyn BrowsingContext>, BrowserError>;
}

/// A single browsing context (tab)
#[async_trait]
pub trait BrowsingContext: Send + Sync {
    /// Navigate to `url`; `None` uses the backend's default timeout
    async fn navigate(&mut self, url: &str, timeout: Option<Duration>) -> Result<(), BrowserError>;

    /// Serialized DOM of the current page
    async fn content(&self) -> Result<String, BrowserError>;

    /// Write a full-page snapshot next to `stem`, returning the written path
    ///
    /// The backend picks the extension (`.png` for an image, `.html` when
    /// only markup is available).
    async fn snapshot(&self, stem: &Path) -> Result<PathBuf, BrowserError>;

    /// Dispose of the context
    async fn close(self: Box<Self>) -> Result<(), BrowserError>;
}

/// Strips the query string so proxied URLs never surface their credential
pub(crate) fn without_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(head, _)| head)
}

/// Appends an extension to a snapshot stem without touching dots in the stem
pub(crate) fn with_suffix(stem: &Path, extension: &str) -> PathBuf {
    let mut name = stem.as_os_str().to_owned();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

/// A context checked out of the pool together with its slot
pub struct Lease {
    pub context: Box<dyn BrowsingContext>,
    _permit: OwnedSemaphorePermit,
}

/// Bounded pool of browsing contexts
///
/// Every fetch attempt acquires its own fresh context and must hand it back
/// through [`ContextPool::release`]; the slot only frees once the context has
/// been closed.
#[derive(Clone)]
pub struct ContextPool {
    browser: Arc<dyn Browser>,
    slots: Arc<Semaphore>,
}

impl ContextPool {
    pub fn new(browser: Arc<dyn Browser>, capacity: usize) -> Self {
        Self {
            browser,
            slots: Arc::new(Semaphore::new(capacity.max(1))),
        }
    }

    /// Waits for a free slot and opens a fresh context in it
    pub async fn acquire(&self) -> Result<Lease, BrowserError> {
        let permit = self
            .slots
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| BrowserError::Unavailable("context pool closed".to_string()))?;

        let context = self.browser.new_context().await?;

        Ok(Lease {
            context,
            _permit: permit,
        })
    }

    /// Closes the leased context, then frees its slot
    pub async fn release(&self, lease: Lease) {
        let Lease { context, _permit } = lease;
        if let Err(e) = context.close().await {
            tracing::warn!("Failed to close browsing context: {}", e);
        }
        drop(_permit);
    }

    /// Slots not currently leased
    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }
}
