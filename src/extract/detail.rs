use super::{first_text, selector, text_of, ExtractError};
use crate::config::SiteConfig;
use crate::extract::price::compose_price;
use crate::record::{DetailRecord, ListingRecord, MAX_FEATURES, MAX_IMAGES};
use crate::url::detail_title;
use scraper::Html;

/// A product detail page to visit, derived from a listing record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailTarget {
    pub id: String,
    /// Title slug from the URL path, falling back to the id
    pub title: String,
    pub url: String,
}

impl DetailTarget {
    pub fn from_listing(record: &ListingRecord) -> Self {
        let title = detail_title(&record.url).unwrap_or_else(|| record.id.clone());
        Self {
            id: record.id.clone(),
            title,
            url: record.url.clone(),
        }
    }
}

/// Extracts a detail record from a rendered product page
///
/// Fails with `ExtractError::NoImages` when no image from the trusted host
/// is present; that condition means the page did not render properly and the
/// attempt should be retried.
pub fn extract_detail(
    html: &str,
    target: &DetailTarget,
    site: &SiteConfig,
) -> Result<DetailRecord, ExtractError> {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let image_sel = selector("li img")?;
    let bullet_sel = selector("li.a-spacing-mini")?;
    let bullet_text_sel = selector("span")?;

    let mut images: Vec<String> = Vec::new();
    for img in document.select(&image_sel) {
        let Some(src) = img.value().attr("src") else {
            continue;
        };
        if src.starts_with(&site.image_prefix) && !images.iter().any(|i| i == src) {
            images.push(src.to_string());
            if images.len() == MAX_IMAGES {
                break;
            }
        }
    }

    if images.is_empty() {
        return Err(ExtractError::NoImages);
    }

    let mut features: Vec<String> = Vec::new();
    for bullet in document.select(&bullet_sel) {
        let Some(span) = bullet.select(&bullet_text_sel).next() else {
            continue;
        };
        let text = text_of(span).trim().to_string();
        if !text.is_empty() && !features.contains(&text) {
            features.push(text);
            if features.len() == MAX_FEATURES {
                break;
            }
        }
    }

    let symbol = first_text(root, &selector("span.a-price-symbol")?)
        .ok_or(ExtractError::MissingPrice("symbol"))?;
    let whole = first_text(root, &selector("span.a-price-whole")?)
        .ok_or(ExtractError::MissingPrice("whole"))?;
    let fraction = first_text(root, &selector("span.a-price-fraction")?)
        .ok_or(ExtractError::MissingPrice("fraction"))?;
    let price = compose_price(&whole, &fraction)?;

    Ok(DetailRecord {
        id: target.id.clone(),
        title: target.title.clone(),
        url: target.url.clone(),
        currency_symbol: symbol.trim().to_string(),
        price,
        features,
        images,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    const IMG: &str = "https://m.media-amazon.com/images/I/";

    fn target() -> DetailTarget {
        DetailTarget {
            id: "B0CHX1W1XY".to_string(),
            title: "Apple-iPhone-15".to_string(),
            url: "https://www.amazon.com/Apple-iPhone-15/dp/B0CHX1W1XY/ref=sr_1_1".to_string(),
        }
    }

    const PRICE: &str = r#"<span class="a-price-symbol">$</span><span class="a-price-whole">799.</span><span class="a-price-fraction">00</span>"#;

    #[test]
    fn test_extract_detail_page() {
        let html = format!(
            r#"<html><body>
            <ul>
              <li><img src="https://www.amazon.com/icons/sprite.png"></li>
              <li><img src="{IMG}a.jpg"></li>
              <li><img src="{IMG}b.jpg"></li>
              <li><img src="{IMG}a.jpg"></li>
            </ul>
            <ul>
              <li class="a-spacing-mini"><span> 6.1-inch display </span></li>
              <li class="a-spacing-mini"><span>A16 chip</span></li>
              <li class="a-spacing-mini"><span>6.1-inch display</span></li>
            </ul>
            {PRICE}
            </body></html>"#
        );

        let record = extract_detail(&html, &target(), &SiteConfig::default()).unwrap();

        assert_eq!(record.id, "B0CHX1W1XY");
        assert_eq!(record.title, "Apple-iPhone-15");
        assert_eq!(record.images, vec![format!("{IMG}a.jpg"), format!("{IMG}b.jpg")]);
        assert_eq!(record.features, vec!["6.1-inch display", "A16 chip"]);
        assert_eq!(record.currency_symbol, "$");
        assert_eq!(record.price, Decimal::from_str("799.00").unwrap());
    }

    #[test]
    fn test_images_and_features_capped() {
        let images: String = (0..6)
            .map(|i| format!(r#"<li><img src="{IMG}{i}.jpg"></li>"#))
            .collect();
        let bullets: String = (0..6)
            .map(|i| format!(r#"<li class="a-spacing-mini"><span>feature {i}</span></li>"#))
            .collect();
        let html = format!("<ul>{images}</ul><ul>{bullets}</ul>{PRICE}");

        let record = extract_detail(&html, &target(), &SiteConfig::default()).unwrap();
        assert_eq!(record.images.len(), MAX_IMAGES);
        assert_eq!(record.features.len(), MAX_FEATURES);
        assert_eq!(record.features[3], "feature 3");
    }

    #[test]
    fn test_no_trusted_images_is_failure() {
        let html = format!(
            r#"<ul><li><img src="https://cdn.other.com/x.jpg"></li><li><img></li></ul>{PRICE}"#
        );
        let result = extract_detail(&html, &target(), &SiteConfig::default());
        assert!(matches!(result, Err(ExtractError::NoImages)));
    }

    #[test]
    fn test_missing_price_is_failure() {
        let html = format!(r#"<ul><li><img src="{IMG}a.jpg"></li></ul>"#);
        let result = extract_detail(&html, &target(), &SiteConfig::default());
        assert!(matches!(result, Err(ExtractError::MissingPrice("symbol"))));
    }

    #[test]
    fn test_target_from_listing() {
        let listing = ListingRecord {
            id: "B01".to_string(),
            title: "Widget Pro".to_string(),
            url: "https://www.amazon.com/Widget-Pro/dp/B01/ref=sr_1_3".to_string(),
            is_sponsored: false,
            currency_symbol: "$".to_string(),
            price: Decimal::from_str("5.00").unwrap(),
            reference_price: Decimal::from_str("5.00").unwrap(),
            rating: "n/a".to_string(),
        };
        let target = DetailTarget::from_listing(&listing);
        assert_eq!(target.title, "Widget-Pro");
        assert_eq!(target.id, "B01");

        let short = ListingRecord {
            url: "https://www.amazon.com/dp/B01/x".to_string(),
            ..listing
        };
        assert_eq!(DetailTarget::from_listing(&short).title, "B01");
    }
}
