//! URL handling module for shopcrawl
//!
//! This module turns raw hrefs into canonical product URLs, derives item
//! identifiers and titles from product URL paths, and builds the listing and
//! proxied navigation targets.

mod normalize;
mod target;

// Re-export main functions
pub use normalize::{canonicalize_url, detail_title, is_sponsored, item_id};
pub use target::{listing_url, navigation_target, proxied_url};
