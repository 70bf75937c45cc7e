use super::CsvRecord;
use rust_decimal::Decimal;

/// Maximum number of feature bullets kept per product
pub const MAX_FEATURES: usize = 4;

/// Maximum number of images kept per product
pub const MAX_IMAGES: usize = 4;

/// One product detail page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRecord {
    pub id: String,
    /// Title slug taken from the product URL path
    pub title: String,
    pub url: String,
    pub currency_symbol: String,
    pub price: Decimal,
    /// Distinct feature bullets, at most `MAX_FEATURES`
    pub features: Vec<String>,
    /// Distinct trusted image URLs, at most `MAX_IMAGES`; never empty
    pub images: Vec<String>,
}

impl CsvRecord for DetailRecord {
    const HEADER: &'static [&'static str] = &[
        "id",
        "title",
        "url",
        "currencySymbol",
        "price",
        "feature1",
        "feature2",
        "feature3",
        "feature4",
        "image1",
        "image2",
        "image3",
        "image4",
    ];

    fn row(&self) -> Vec<String> {
        let mut row = vec![
            self.id.clone(),
            self.title.clone(),
            self.url.clone(),
            self.currency_symbol.clone(),
            self.price.to_string(),
        ];
        row.extend(padded(&self.features, MAX_FEATURES));
        row.extend(padded(&self.images, MAX_IMAGES));
        row
    }
}

/// Fixed-width column slice: missing entries become empty cells
fn padded(values: &[String], width: usize) -> impl Iterator<Item = String> + '_ {
    (0..width).map(move |i| values.get(i).cloned().unwrap_or_default())
}
