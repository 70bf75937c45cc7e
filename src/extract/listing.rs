use super::{first_text, selector, text_of, ExtractError};
use crate::config::SiteConfig;
use crate::extract::price::{compose_price, parse_reference_price};
use crate::record::{ListingRecord, RATING_UNAVAILABLE};
use crate::url::{canonicalize_url, is_sponsored, item_id};
use scraper::{ElementRef, Html, Selector};

/// Records found on one search-results page
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    /// Records in document order
    pub records: Vec<ListingRecord>,

    /// Number of structurally matched candidate containers
    pub candidates: usize,

    /// Candidates dropped for missing or malformed fields
    pub skipped: usize,

    /// Candidates dropped because they repeated the previous title
    pub duplicates: usize,
}

struct ListingSelectors {
    ad_holder: Selector,
    candidate: Selector,
    heading: Selector,
    link: Selector,
    symbol: Selector,
    whole: Selector,
    fraction: Selector,
    reference: Selector,
    rating: Selector,
}

impl ListingSelectors {
    fn new() -> Result<Self, ExtractError> {
        Ok(Self {
            ad_holder: selector("div.AdHolder")?,
            candidate: selector("div > span > div")?,
            heading: selector("h2")?,
            link: selector("a")?,
            symbol: selector("span.a-price-symbol")?,
            whole: selector("span.a-price-whole")?,
            fraction: selector("span.a-price-fraction")?,
            reference: selector("span.a-price.a-text-price span")?,
            rating: selector("span.a-icon-alt")?,
        })
    }
}

/// Extracts listing records from a rendered search-results page
///
/// # Candidate Rules
///
/// 1. `div.AdHolder` overlays are removed from the document before any
///    candidate is considered, so an enclosing container cannot reach them
/// 2. A candidate needs an `h2` with an `a[href]` inside it, otherwise it is
///    not parsable and is skipped
/// 3. A parsable candidate whose title equals the previous parsable
///    candidate's title is skipped (local, not global, dedup)
/// 4. Symbol, whole and fractional price parts are all required and must
///    parse; the reference price and rating are optional
///
/// # Example
///
/// ```
/// use shopcrawl::config::SiteConfig;
/// use shopcrawl::extract::extract_listings;
///
/// let html = r#"<div><span><div>
///   <h2><a href="/Widget/dp/B01/ref=sr_1_1">Widget</a></h2>
///   <span class="a-price-symbol">$</span>
///   <span class="a-price-whole">5.</span><span class="a-price-fraction">00</span>
/// </div></span></div>"#;
/// let page = extract_listings(html, &SiteConfig::default()).unwrap();
/// assert_eq!(page.records[0].id, "B01");
/// ```
pub fn extract_listings(html: &str, site: &SiteConfig) -> Result<ListingPage, ExtractError> {
    let mut document = Html::parse_document(html);
    let selectors = ListingSelectors::new()?;
    remove_ad_holders(&mut document, &selectors.ad_holder);

    let mut page = ListingPage::default();
    let mut last_title: Option<String> = None;

    for candidate in document.select(&selectors.candidate) {
        page.candidates += 1;

        let Some(heading) = candidate.select(&selectors.heading).next() else {
            continue;
        };
        let Some(href) = heading
            .select(&selectors.link)
            .next()
            .and_then(|a| a.value().attr("href"))
        else {
            continue;
        };

        let title = text_of(heading).trim().to_string();
        if last_title.as_deref() == Some(title.as_str()) {
            tracing::trace!("Skipping adjacent duplicate: {}", title);
            page.duplicates += 1;
            continue;
        }
        last_title = Some(title.clone());

        match build_record(candidate, &selectors, title, href, site) {
            Some(record) => page.records.push(record),
            None => page.skipped += 1,
        }
    }

    Ok(page)
}

/// Assembles a record from a parsable candidate, or `None` if any required
/// field is missing or malformed
fn build_record(
    candidate: ElementRef<'_>,
    selectors: &ListingSelectors,
    title: String,
    href: &str,
    site: &SiteConfig,
) -> Option<ListingRecord> {
    if title.is_empty() {
        tracing::debug!("Candidate has an empty title");
        return None;
    }

    let url = canonicalize_url(href, &site.base_url);
    let Some(id) = item_id(&url) else {
        tracing::debug!("No item id in {}", url);
        return None;
    };

    let (Some(symbol), Some(whole), Some(fraction)) = (
        first_text(candidate, &selectors.symbol),
        first_text(candidate, &selectors.whole),
        first_text(candidate, &selectors.fraction),
    ) else {
        tracing::debug!("Failed to find price for {}", title);
        return None;
    };
    let currency_symbol = symbol.trim().to_string();

    let price = match compose_price(&whole, &fraction) {
        Ok(p) => p,
        Err(e) => {
            tracing::debug!("Dropping {}: {}", title, e);
            return None;
        }
    };

    let reference_price = match first_text(candidate, &selectors.reference) {
        Some(text) => match parse_reference_price(&text, &currency_symbol) {
            Ok(p) => p,
            Err(e) => {
                tracing::debug!("Dropping {}: reference {}", title, e);
                return None;
            }
        },
        None => price,
    };

    let rating =
        first_text(candidate, &selectors.rating).unwrap_or_else(|| RATING_UNAVAILABLE.to_string());

    Some(ListingRecord {
        id,
        is_sponsored: is_sponsored(&url, &site.sponsored_marker),
        title,
        url,
        currency_symbol,
        price,
        reference_price,
        rating,
    })
}

/// Detaches every sponsored overlay subtree from the document
fn remove_ad_holders(document: &mut Html, ad_holder: &Selector) {
    let holders: Vec<_> = document.select(ad_holder).map(|el| el.id()).collect();
    if !holders.is_empty() {
        tracing::trace!("Removing {} sponsored overlay(s)", holders.len());
    }
    for id in holders {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}
