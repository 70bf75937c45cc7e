//! Page fetcher with per-attempt browsing contexts
//!
//! Each attempt gets a fresh context from the pool, navigates, and hands the
//! context to the page task for extraction. Whatever happens, the context is
//! released before the next attempt starts or the fetch returns. Transient
//! failures are retried immediately, up to the configured number of attempts;
//! running out of attempts is reported, not raised.

use crate::browser::{BrowsingContext, ContextPool};
use crate::crawler::CancelSignal;
use crate::output::RunStats;
use crate::state::PageState;
use crate::{CrawlError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// One page the fetcher knows how to visit and extract
#[async_trait]
pub trait PageTask: Send + Sync {
    type Output: Send;

    /// URL to navigate to (may carry proxy credentials; never logged)
    fn navigation_url(&self) -> &str;

    /// Human-readable name for logs
    fn label(&self) -> &str;

    /// Navigation timeout; `None` leaves it to the backend
    fn timeout(&self) -> Option<Duration>;

    /// Extracts and emits the page's records from a navigated context
    async fn on_page(&self, context: &mut dyn BrowsingContext) -> Result<Self::Output>;

    /// Called with the failing attempt's context before it is released
    async fn on_failure(&self, _context: &dyn BrowsingContext, _error: &CrawlError) {}
}

/// Outcome of a fetch that did not propagate an error
#[derive(Debug)]
pub struct FetchReport<T> {
    pub state: PageState,
    pub attempts: u32,
    pub output: Option<T>,
    pub last_error: Option<String>,
}

impl<T> FetchReport<T> {
    fn finished(state: PageState, attempts: u32, last_error: Option<String>) -> Self {
        Self {
            state,
            attempts,
            output: None,
            last_error,
        }
    }
}

/// Retry wrapper around a context pool
#[derive(Clone)]
pub struct Fetcher {
    pool: ContextPool,
    max_retries: u32,
    stats: Arc<RunStats>,
}

impl Fetcher {
    pub fn new(pool: ContextPool, max_retries: u32, stats: Arc<RunStats>) -> Self {
        Self {
            pool,
            max_retries: max_retries.max(1),
            stats,
        }
    }

    pub fn pool(&self) -> &ContextPool {
        &self.pool
    }

    /// Fetches one page, retrying transient failures
    ///
    /// # Returns
    ///
    /// * `Ok(FetchReport)` - extracted, exhausted, or cancelled
    /// * `Err(CrawlError)` - a non-retryable error (context acquisition or
    ///   sink failure); the attempt's context has already been released
    pub async fn fetch<T>(&self, task: &T, cancel: &CancelSignal) -> Result<FetchReport<T::Output>>
    where
        T: PageTask + ?Sized,
    {
        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.max_retries {
            if cancel.is_cancelled() {
                tracing::debug!("Skipping {}: cancelled", task.label());
                return Ok(FetchReport::finished(PageState::Cancelled, attempts, last_error));
            }

            let mut lease = self.pool.acquire().await?;
            attempts += 1;
            self.stats.add_attempt();
            tracing::debug!("Fetching {} (attempt {}/{})", task.label(), attempts, self.max_retries);

            let outcome = attempt(task, lease.context.as_mut()).await;

            match outcome {
                Ok(output) => {
                    self.pool.release(lease).await;
                    tracing::info!("Successfully fetched {}", task.label());
                    return Ok(FetchReport {
                        state: PageState::Extracted,
                        attempts,
                        output: Some(output),
                        last_error: None,
                    });
                }
                Err(e) => {
                    task.on_failure(lease.context.as_ref(), &e).await;
                    self.pool.release(lease).await;

                    if !e.is_retryable() {
                        return Err(e);
                    }

                    tracing::warn!(
                        "Attempt {}/{} for {} failed: {}",
                        attempts,
                        self.max_retries,
                        task.label(),
                        e
                    );
                    last_error = Some(e.to_string());
                }
            }
        }

        Ok(FetchReport::finished(PageState::Exhausted, attempts, last_error))
    }
}

async fn attempt<T>(task: &T, context: &mut dyn BrowsingContext) -> Result<T::Output>
where
    T: PageTask + ?Sized,
{
    context
        .navigate(task.navigation_url(), task.timeout())
        .await?;
    task.on_page(context).await
}
