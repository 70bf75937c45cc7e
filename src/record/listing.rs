use super::CsvRecord;
use rust_decimal::Decimal;
use serde::Deserialize;

/// Rating text used when a listing shows no rating
pub const RATING_UNAVAILABLE: &str = "n/a";

/// One product surfaced on a search-results page
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingRecord {
    /// Site item identifier taken from the product URL path
    pub id: String,
    pub title: String,
    /// Absolute product URL
    pub url: String,
    pub is_sponsored: bool,
    pub currency_symbol: String,
    /// Displayed price
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    /// Struck-through "was" price, or `price` when none is shown
    #[serde(with = "rust_decimal::serde::str")]
    pub reference_price: Decimal,
    /// Site-formatted rating text, preserved verbatim
    pub rating: String,
}

impl CsvRecord for ListingRecord {
    const HEADER: &'static [&'static str] = &[
        "id",
        "title",
        "url",
        "isSponsored",
        "currencySymbol",
        "price",
        "referencePrice",
        "rating",
    ];

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.title.clone(),
            self.url.clone(),
            self.is_sponsored.to_string(),
            self.currency_symbol.clone(),
            self.price.to_string(),
            self.reference_price.to_string(),
            self.rating.clone(),
        ]
    }
}
