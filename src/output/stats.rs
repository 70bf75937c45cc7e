//! Run statistics and the end-of-run summary
//!
//! Counters are shared between concurrently running fetches, so they are
//! plain atomics bumped as pages finish.

use crate::state::PageState;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters for a crawl run
#[derive(Debug, Default)]
pub struct RunStats {
    listing_pages_attempted: AtomicU64,
    listing_pages_succeeded: AtomicU64,
    listing_pages_failed: AtomicU64,
    details_attempted: AtomicU64,
    details_succeeded: AtomicU64,
    details_failed: AtomicU64,
    records_written: AtomicU64,
    total_attempts: AtomicU64,
    batches_failed: AtomicU64,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the final state of one listing page
    pub fn record_listing(&self, state: PageState) {
        Self::record(
            state,
            &self.listing_pages_attempted,
            &self.listing_pages_succeeded,
            &self.listing_pages_failed,
        );
    }

    /// Records the final state of one detail page
    pub fn record_detail(&self, state: PageState) {
        Self::record(
            state,
            &self.details_attempted,
            &self.details_succeeded,
            &self.details_failed,
        );
    }

    fn record(state: PageState, attempted: &AtomicU64, succeeded: &AtomicU64, failed: &AtomicU64) {
        // Pages cancelled before their first attempt were never attempted
        if state == PageState::Cancelled {
            return;
        }
        attempted.fetch_add(1, Ordering::Relaxed);
        if state.is_success() {
            succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn add_attempt(&self) {
        self.total_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_records_written(&self, count: usize) {
        self.records_written.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn add_failed_batch(&self) {
        self.batches_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total_attempts(&self) -> u64 {
        self.total_attempts.load(Ordering::Relaxed)
    }

    /// Freezes the counters into a summary
    pub fn summarize(
        &self,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        config_hash: Option<String>,
        cancelled: bool,
    ) -> RunSummary {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        RunSummary {
            started_at,
            finished_at,
            config_hash,
            cancelled,
            listing_pages_attempted: load(&self.listing_pages_attempted),
            listing_pages_succeeded: load(&self.listing_pages_succeeded),
            listing_pages_failed: load(&self.listing_pages_failed),
            details_attempted: load(&self.details_attempted),
            details_succeeded: load(&self.details_succeeded),
            details_failed: load(&self.details_failed),
            records_written: load(&self.records_written),
            total_attempts: load(&self.total_attempts),
            batches_failed: load(&self.batches_failed),
        }
    }
}

/// Snapshot of a finished run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// SHA-256 of the config file the run was started with
    pub config_hash: Option<String>,

    /// True when the run stopped early on a cancellation request
    pub cancelled: bool,

    pub listing_pages_attempted: u64,
    pub listing_pages_succeeded: u64,
    pub listing_pages_failed: u64,
    pub details_attempted: u64,
    pub details_succeeded: u64,
    pub details_failed: u64,
    pub records_written: u64,
    pub total_attempts: u64,
    pub batches_failed: u64,
}

impl RunSummary {
    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }
}

/// Prints the summary to stdout in a formatted manner
pub fn print_summary(summary: &RunSummary) {
    println!("=== Crawl Summary ===\n");

    println!("Run:");
    println!("  Started:  {}", summary.started_at.to_rfc3339());
    println!("  Finished: {}", summary.finished_at.to_rfc3339());
    println!("  Duration: {}s", summary.duration_seconds());
    if let Some(hash) = &summary.config_hash {
        println!("  Config hash: {}", hash);
    }
    if summary.cancelled {
        println!("  Status: cancelled");
    }
    println!();

    println!("Listing pages:");
    println!("  Attempted: {}", summary.listing_pages_attempted);
    println!("  Succeeded: {}", summary.listing_pages_succeeded);
    println!("  Failed:    {}", summary.listing_pages_failed);
    if summary.batches_failed > 0 {
        println!("  Failed batches: {}", summary.batches_failed);
    }
    println!();

    println!("Detail pages:");
    println!("  Attempted: {}", summary.details_attempted);
    println!("  Succeeded: {}", summary.details_succeeded);
    println!("  Failed:    {}", summary.details_failed);
    println!();

    println!("Records written: {}", summary.records_written);
    println!("Total attempts:  {}", summary.total_attempts);
}
