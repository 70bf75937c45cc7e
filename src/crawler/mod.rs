//! Crawler module for listing and detail page crawling
//!
//! This module contains the core crawling logic, including:
//! - Partitioning listing pages into ordered batches
//! - Fetching a page with a fresh browsing context per attempt and retrying
//! - Overall crawl coordination across queries and phases
//! - Run-scoped and batch-scoped cancellation

mod cancel;
mod coordinator;
mod fetcher;
mod scheduler;

pub use cancel::CancelSignal;
pub use coordinator::{plan, Coordinator, QueryPlan};
pub use fetcher::{FetchReport, Fetcher, PageTask};
pub use scheduler::partition_batches;
