//! State module for tracking crawl progress
//!
//! `PageState` records how each listing or detail page ended up once the
//! fetcher was done with it.

mod page_state;

pub use page_state::PageState;
