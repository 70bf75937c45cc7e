//! Page extraction
//!
//! This module turns a rendered page into records:
//! - Listing pages: candidate containers are walked in document order and each
//!   one is validated on its own before it becomes a `ListingRecord`
//! - Detail pages: trusted images, feature bullets and the price are collected
//!   into a single `DetailRecord`
//!
//! Extraction is synchronous and works on the DOM snapshot handed over by the
//! browsing context.

mod detail;
mod listing;
mod price;

pub use detail::{extract_detail, DetailTarget};
pub use listing::{extract_listings, ListingPage};
pub use price::{compose_price, parse_reference_price, PriceError};

use scraper::{ElementRef, Selector};
use thiserror::Error;

/// Errors that make a whole page unusable
///
/// Missing pieces inside a single listing candidate are not errors; the
/// candidate is skipped instead.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid selector '{0}'")]
    Selector(&'static str),

    #[error("no qualifying product images found")]
    NoImages,

    #[error("price element missing: {0}")]
    MissingPrice(&'static str),

    #[error("malformed price: {0}")]
    Price(#[from] PriceError),
}

/// Compiles a fixed CSS selector
fn selector(css: &'static str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|_| ExtractError::Selector(css))
}

/// Text content of an element, all descendant text nodes concatenated
fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect()
}

/// First descendant matching `selector`, as text
fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope.select(selector).next().map(text_of)
}
