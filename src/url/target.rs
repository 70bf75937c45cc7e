use crate::config::ResolvedProxy;
use crate::{UrlError, UrlResult};
use url::Url;

/// Builds the search-results URL for a query
///
/// The query is form-encoded into `k`; `page` is only added when paginating.
///
/// # Examples
///
/// ```
/// use shopcrawl::url::listing_url;
///
/// let url = listing_url("https://www.amazon.com", "usb c cable", Some(2)).unwrap();
/// assert_eq!(url, "https://www.amazon.com/s?k=usb+c+cable&page=2");
/// ```
pub fn listing_url(base_url: &str, query: &str, page: Option<u32>) -> UrlResult<String> {
    let endpoint = format!("{}/s", base_url.trim_end_matches('/'));
    let mut url = Url::parse(&endpoint).map_err(|e| UrlError::Parse(e.to_string()))?;

    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("k", query);
        if let Some(page) = page {
            pairs.append_pair("page", &page.to_string());
        }
    }

    Ok(url.to_string())
}

/// Rewrites a target URL through the pass-through proxy
///
/// Produces `<endpoint>?api_key=<key>&url=<encoded target>&country=<loc>`.
/// The result embeds the credential and must never be logged.
pub fn proxied_url(target: &str, proxy: &ResolvedProxy) -> UrlResult<String> {
    let url = Url::parse_with_params(
        &proxy.endpoint,
        &[
            ("api_key", proxy.api_key.expose()),
            ("url", target),
            ("country", proxy.country.as_str()),
        ],
    )
    .map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.cannot_be_a_base() {
        return Err(UrlError::Malformed(format!(
            "proxy endpoint is not a hierarchical URL: {}",
            url.scheme()
        )));
    }

    Ok(url.to_string())
}

/// Returns the URL the browser should actually navigate to
pub fn navigation_target(target: &str, proxy: Option<&ResolvedProxy>) -> UrlResult<String> {
    match proxy {
        Some(proxy) => proxied_url(target, proxy),
        None => Ok(target.to_string()),
    }
}
