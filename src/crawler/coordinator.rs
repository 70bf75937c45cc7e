//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl flow for each configured query:
//! - Listing phase: pages `1..=N` in ordered batches of at most `C`, every
//!   page of a batch fetched concurrently, the next batch started only once
//!   the whole batch has settled
//! - Detail phase: every listed product visited strictly one at a time
//! - Failure containment: exhausted pages are logged, a batch whose fetch
//!   propagates an error stops its own remaining attempts, and the run always
//!   goes on to the next batch, product, and query

use crate::browser::{Browser, BrowsingContext, ContextPool, HttpBrowser};
use crate::config::{BrowserBackend, Config, ResolvedProxy, SiteConfig};
use crate::crawler::{partition_batches, CancelSignal, FetchReport, Fetcher, PageTask};
use crate::extract::{extract_detail, extract_listings, DetailTarget};
use crate::output::{destination_stem, read_listing_file, CsvSink, RunStats, RunSummary};
use crate::record::{DetailRecord, ListingRecord};
use crate::state::PageState;
use crate::url::{listing_url, navigation_target};
use crate::{CrawlError, Result};
use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    fetcher: Fetcher,
    sink: CsvSink,
    proxy: Option<ResolvedProxy>,
    cancel: CancelSignal,
    stats: Arc<RunStats>,
    config_hash: Option<String>,
}

impl Coordinator {
    /// Creates a coordinator driving `browser`
    ///
    /// The context pool is sized to the configured concurrency, so no more
    /// than that many pages are ever open at once.
    pub fn new(config: Config, browser: Arc<dyn Browser>, proxy: Option<ResolvedProxy>) -> Self {
        let stats = Arc::new(RunStats::new());
        let pool = ContextPool::new(browser, config.crawler.concurrency as usize);
        let fetcher = Fetcher::new(pool, config.crawler.max_retries, Arc::clone(&stats));
        let sink = CsvSink::new(config.output.directory.clone());

        Self {
            config: Arc::new(config),
            fetcher,
            sink,
            proxy,
            cancel: CancelSignal::new(),
            stats,
            config_hash: None,
        }
    }

    /// Creates a coordinator with the browser backend named in the config
    ///
    /// # Errors
    ///
    /// Fails when the backend cannot start, or when the Chromium backend is
    /// requested from a build without the `chromium` feature.
    pub async fn from_config(config: Config, proxy: Option<ResolvedProxy>) -> Result<Self> {
        let browser: Arc<dyn Browser> = match config.browser.backend {
            BrowserBackend::Http => Arc::new(HttpBrowser::new(&config.browser.user_agent)?),
            BrowserBackend::Chromium => launch_chromium().await?,
        };
        Ok(Self::new(config, browser, proxy))
    }

    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    /// Handle to the run-level cancellation signal
    pub fn cancel_signal(&self) -> CancelSignal {
        self.cancel.clone()
    }

    /// Runs the listing phase and, when enabled, the detail phase for every
    /// configured query
    ///
    /// Only failures outside any page (an unreadable listing file, an
    /// uncreatable snapshot directory) surface as errors; page-level failures
    /// are counted in the summary.
    pub async fn run(&self) -> Result<RunSummary> {
        let started_at = Utc::now();
        let crawler = &self.config.crawler;
        tracing::info!(
            "Starting crawl: {} query(ies), {} page(s) each, concurrency {}, {} attempt(s) per page{}",
            crawler.queries.len(),
            if self.config.pipeline.paginate { crawler.pages } else { 1 },
            crawler.concurrency,
            crawler.max_retries,
            if self.proxy.is_some() { ", via proxy" } else { "" },
        );

        for query in &crawler.queries {
            if self.cancel.is_cancelled() {
                tracing::warn!("Crawl cancelled; skipping remaining queries");
                break;
            }

            let listings = self.crawl_listings(query).await;

            if !self.config.pipeline.details {
                continue;
            }

            if self.config.pipeline.persist {
                let path = self.sink.path_for(query);
                if path.exists() {
                    self.crawl_details_from_file(&path).await?;
                } else {
                    tracing::warn!(
                        "No listing file at {}; skipping detail phase for '{}'",
                        path.display(),
                        query
                    );
                }
            } else {
                self.crawl_details(&listings).await?;
            }
        }

        let summary = self.stats.summarize(
            started_at,
            Utc::now(),
            self.config_hash.clone(),
            self.cancel.is_cancelled(),
        );
        tracing::info!(
            "Crawl finished in {}s: listing pages {}/{} ok, details {}/{} ok, {} records written, {} attempts",
            summary.duration_seconds(),
            summary.listing_pages_succeeded,
            summary.listing_pages_attempted,
            summary.details_succeeded,
            summary.details_attempted,
            summary.records_written,
            summary.total_attempts,
        );
        Ok(summary)
    }

    /// Crawls the listing pages of one query, batch by batch
    ///
    /// Returns every record extracted, in batch order. A failed batch is
    /// logged and the next batch still runs.
    pub async fn crawl_listings(&self, query: &str) -> Vec<ListingRecord> {
        let paginate = self.config.pipeline.paginate;
        let batches = listing_batches(&self.config);
        let mut collected = Vec::new();

        tracing::info!("Concurrent crawl started for '{}' ({} batch(es))", query, batches.len());

        for (index, batch) in batches.iter().enumerate() {
            if self.cancel.is_cancelled() {
                tracing::warn!("Crawl cancelled; skipping remaining batches for '{}'", query);
                break;
            }

            tracing::info!(
                "Batch {}/{} for '{}': pages {:?}",
                index + 1,
                batches.len(),
                query,
                batch
            );

            let batch_cancel = self.cancel.child();
            let fetches = batch
                .iter()
                .map(|&page| self.fetch_listing_page(query, paginate.then_some(page), &batch_cancel));
            let results = join_all(fetches).await;

            let mut batch_error = None;
            for result in results {
                match result {
                    Ok(records) => collected.extend(records),
                    Err(e) => {
                        batch_error.get_or_insert(e);
                    }
                }
            }

            if let Some(e) = batch_error {
                self.stats.add_failed_batch();
                tracing::error!("Failed to process batch {} for '{}': {}", index + 1, query, e);
            }
        }

        tracing::info!(
            "Concurrent crawl finished for '{}': {} record(s)",
            query,
            collected.len()
        );
        collected
    }

    /// Fetches one listing page; on a propagated error the batch is told to
    /// stop starting new attempts
    async fn fetch_listing_page(
        &self,
        query: &str,
        page: Option<u32>,
        batch_cancel: &CancelSignal,
    ) -> Result<Vec<ListingRecord>> {
        let result = self.try_listing_page(query, page, batch_cancel).await;
        match &result {
            Ok(report) => self.stats.record_listing(report.state),
            Err(_) => {
                batch_cancel.cancel();
                self.stats.record_listing(PageState::Aborted);
            }
        }
        result.map(|report| report.output.unwrap_or_default())
    }

    async fn try_listing_page(
        &self,
        query: &str,
        page: Option<u32>,
        batch_cancel: &CancelSignal,
    ) -> Result<FetchReport<Vec<ListingRecord>>> {
        let target = listing_url(&self.config.site.base_url, query, page)?;
        let task = ListingTask {
            site: &self.config.site,
            sink: self.config.pipeline.persist.then_some(&self.sink),
            stats: &self.stats,
            destination: query,
            navigation_url: navigation_target(&target, self.proxy.as_ref())?,
            label: target,
            timeout: self.config.crawler.listing_timeout_secs.map(Duration::from_secs),
        };

        let report = self.fetcher.fetch(&task, batch_cancel).await?;
        if report.state == PageState::Exhausted {
            tracing::error!(
                "Giving up on {} after {} attempt(s): {}",
                task.label,
                report.attempts,
                report.last_error.as_deref().unwrap_or("unknown error")
            );
        }
        Ok(report)
    }

    /// Visits the detail page of every listing, strictly one after another
    pub async fn crawl_details(&self, listings: &[ListingRecord]) -> Result<()> {
        if listings.is_empty() {
            tracing::info!("No listings; nothing to scrape in the detail phase");
            return Ok(());
        }

        tokio::fs::create_dir_all(&self.config.output.snapshot_directory).await?;
        tracing::info!("Detail phase started: {} product(s)", listings.len());

        for listing in listings {
            if self.cancel.is_cancelled() {
                tracing::warn!("Crawl cancelled; skipping remaining detail pages");
                break;
            }

            let target = DetailTarget::from_listing(listing);
            let (title, id) = (target.title.clone(), target.id.clone());

            match self.fetch_detail_page(target).await {
                Ok(report) => {
                    tracing::debug!("Detail page '{}' {}", title, report.state);
                    self.stats.record_detail(report.state);
                    if report.state == PageState::Exhausted {
                        tracing::error!(
                            "Failed to scrape detail page '{}' (id {}) after {} attempt(s): {}",
                            title,
                            id,
                            report.attempts,
                            report.last_error.as_deref().unwrap_or("unknown error")
                        );
                    }
                }
                Err(e) => {
                    self.stats.record_detail(PageState::Aborted);
                    tracing::error!("Detail page '{}' (id {}) aborted: {}", title, id, e);
                }
            }
        }

        tracing::info!("Detail phase finished");
        Ok(())
    }

    /// Reads a listing file back and runs the detail phase over its rows
    pub async fn crawl_details_from_file(&self, path: &Path) -> Result<()> {
        let listings = read_listing_file(path)?;
        tracing::info!("Read {} listing(s) from {}", listings.len(), path.display());
        self.crawl_details(&listings).await
    }

    async fn fetch_detail_page(&self, target: DetailTarget) -> Result<FetchReport<DetailRecord>> {
        let navigation_url = navigation_target(&target.url, self.proxy.as_ref())?;
        let snapshot_stem = self
            .config
            .output
            .snapshot_directory
            .join(format!("ERROR-{}", destination_stem(&target.title)));

        let task = DetailTask {
            site: &self.config.site,
            sink: self.config.pipeline.persist.then_some(&self.sink),
            stats: &self.stats,
            label: format!("detail page '{}' ({})", target.title, target.id),
            target,
            navigation_url,
            timeout: Duration::from_secs(self.config.crawler.detail_timeout_secs),
            snapshot_stem,
        };

        self.fetcher.fetch(&task, &self.cancel).await
    }
}

#[cfg(feature = "chromium")]
async fn launch_chromium() -> Result<Arc<dyn Browser>> {
    let browser = crate::browser::chromium::ChromiumBrowser::launch().await?;
    Ok(Arc::new(browser))
}

#[cfg(not(feature = "chromium"))]
async fn launch_chromium() -> Result<Arc<dyn Browser>> {
    Err(crate::ConfigError::Validation(
        "browser.backend = \"chromium\" requires building with the `chromium` feature".to_string(),
    )
    .into())
}

/// Listing pages grouped into batches; a single page 1 when not paginating
fn listing_batches(config: &Config) -> Vec<Vec<u32>> {
    if config.pipeline.paginate {
        partition_batches(config.crawler.pages, config.crawler.concurrency)
    } else {
        vec![vec![1]]
    }
}

/// What a run would do for one query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    pub query: String,
    pub listing_file: Option<PathBuf>,
    /// Listing target URLs grouped by batch
    pub batches: Vec<Vec<String>>,
    pub details: bool,
}

/// Resolves the listing URLs and batches for every query without fetching
pub fn plan(config: &Config) -> Result<Vec<QueryPlan>> {
    let paginate = config.pipeline.paginate;
    let sink = CsvSink::new(config.output.directory.clone());

    config
        .crawler
        .queries
        .iter()
        .map(|query| -> Result<QueryPlan> {
            let batches = listing_batches(config)
                .into_iter()
                .map(|batch| {
                    batch
                        .into_iter()
                        .map(|page| listing_url(&config.site.base_url, query, paginate.then_some(page)))
                        .collect::<crate::UrlResult<Vec<_>>>()
                })
                .collect::<crate::UrlResult<Vec<_>>>()?;

            Ok(QueryPlan {
                query: query.clone(),
                listing_file: config.pipeline.persist.then(|| sink.path_for(query)),
                batches,
                details: config.pipeline.details,
            })
        })
        .collect()
}

/// One search-results page
struct ListingTask<'a> {
    site: &'a SiteConfig,
    sink: Option<&'a CsvSink>,
    stats: &'a RunStats,
    destination: &'a str,
    navigation_url: String,
    label: String,
    timeout: Option<Duration>,
}

#[async_trait]
impl<'a> PageTask for ListingTask<'a> {
    type Output = Vec<ListingRecord>;

    fn navigation_url(&self) -> &str {
        &self.navigation_url
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    async fn on_page(&self, context: &mut dyn BrowsingContext) -> Result<Vec<ListingRecord>> {
        let html = context.content().await?;
        let page = extract_listings(&html, self.site).map_err(|source| CrawlError::Extract {
            url: self.label.clone(),
            source,
        })?;

        tracing::info!(
            "{}: {} candidate(s), {} record(s), {} skipped, {} adjacent duplicate(s)",
            self.label,
            page.candidates,
            page.records.len(),
            page.skipped,
            page.duplicates
        );

        // Each record is written the moment it is extracted
        if let Some(sink) = self.sink {
            for record in &page.records {
                let written = sink
                    .append(std::slice::from_ref(record), self.destination)
                    .await?;
                self.stats.add_records_written(written);
            }
        }

        Ok(page.records)
    }
}

/// One product detail page
struct DetailTask<'a> {
    site: &'a SiteConfig,
    sink: Option<&'a CsvSink>,
    stats: &'a RunStats,
    target: DetailTarget,
    navigation_url: String,
    label: String,
    timeout: Duration,
    snapshot_stem: PathBuf,
}

#[async_trait]
impl<'a> PageTask for DetailTask<'a> {
    type Output = DetailRecord;

    fn navigation_url(&self) -> &str {
        &self.navigation_url
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn timeout(&self) -> Option<Duration> {
        Some(self.timeout)
    }

    async fn on_page(&self, context: &mut dyn BrowsingContext) -> Result<DetailRecord> {
        let html = context.content().await?;
        let record = extract_detail(&html, &self.target, self.site).map_err(|source| {
            CrawlError::Extract {
                url: self.target.url.clone(),
                source,
            }
        })?;

        if let Some(sink) = self.sink {
            let written = sink
                .append(std::slice::from_ref(&record), &self.target.title)
                .await?;
            self.stats.add_records_written(written);
        }

        tracing::info!(
            "Scraped {}: {} feature(s), {} image(s)",
            self.label,
            record.features.len(),
            record.images.len()
        );
        Ok(record)
    }

    async fn on_failure(&self, context: &dyn BrowsingContext, _error: &CrawlError) {
        match context.snapshot(&self.snapshot_stem).await {
            Ok(path) => tracing::warn!("Saved diagnostic snapshot to {}", path.display()),
            Err(e) => tracing::warn!("Could not save snapshot for {}: {}", self.label, e),
        }
    }
}
