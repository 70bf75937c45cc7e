//! Record types produced by the extractor
//!
//! Each record type declares an explicit column schema so the CSV header
//! never depends on field enumeration order.

mod detail;
mod listing;

pub use detail::{DetailRecord, MAX_FEATURES, MAX_IMAGES};
pub use listing::{ListingRecord, RATING_UNAVAILABLE};

/// A record with a fixed CSV column layout
pub trait CsvRecord {
    /// Column names in declaration order
    const HEADER: &'static [&'static str];

    /// Field values in the same order as `HEADER`
    fn row(&self) -> Vec<String>;
}
