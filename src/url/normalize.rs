/// Canonicalizes an href found on a listing page
///
/// Absolute `http://` / `https://` hrefs are kept as-is; anything else is
/// treated as site-relative and prefixed with the base origin.
///
/// # Examples
///
/// ```
/// use shopcrawl::url::canonicalize_url;
///
/// let url = canonicalize_url("/Widget/dp/B01/ref=x", "https://shop.example.com");
/// assert_eq!(url, "https://shop.example.com/Widget/dp/B01/ref=x");
/// ```
pub fn canonicalize_url(href: &str, base_url: &str) -> String {
    let href = href.trim();

    if href.starts_with("https://") || href.starts_with("http://") {
        return href.to_string();
    }

    let base = base_url.trim_end_matches('/');
    if href.starts_with('/') {
        format!("{}{}", base, href)
    } else {
        format!("{}/{}", base, href)
    }
}

/// Derives the item identifier from a product URL
///
/// The identifier is the second-to-last `/`-separated segment, e.g. `B0ABC`
/// in `https://shop.example.com/Widget/dp/B0ABC/ref=sr_1_1`.
pub fn item_id(url: &str) -> Option<String> {
    segment_from_end(url, 2)
}

/// Derives the product title slug from a product URL
///
/// The slug is the fourth-from-last segment, e.g. `Widget` in
/// `https://shop.example.com/Widget/dp/B0ABC/ref=sr_1_1`.
pub fn detail_title(url: &str) -> Option<String> {
    segment_from_end(url, 4)
}

/// Returns true if the canonical URL carries the sponsored-link marker
pub fn is_sponsored(url: &str, marker: &str) -> bool {
    !marker.is_empty() && url.contains(marker)
}

fn segment_from_end(url: &str, position: usize) -> Option<String> {
    let segments: Vec<&str> = url.split('/').collect();
    // Never reach into the scheme/host part of an absolute URL
    let floor = if url.contains("://") { 3 } else { 0 };

    let index = segments.len().checked_sub(position)?;
    if index < floor {
        return None;
    }

    let segment = segments[index].trim();
    if segment.is_empty() {
        None
    } else {
        Some(segment.to_string())
    }
}
