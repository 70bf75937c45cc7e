//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the storefront (and the proxy)
//! and drive the HTTP browser backend through the full listing and detail
//! cycle end-to-end.

use shopcrawl::config::{load_config, resolve_proxy_with, Config};
use shopcrawl::crawler::Coordinator;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const IMG: &str = "https://m.media-amazon.com/images/I/";

fn product_block(title: &str, slug: &str, id: &str, whole: &str, fraction: &str) -> String {
    format!(
        r#"<div><span><div class="s-result-item">
            <h2><a href="/{slug}/dp/{id}/ref=sr_1_1"><span>{title}</span></a></h2>
            <span class="a-price"><span class="a-price-symbol">$</span><span class="a-price-whole">{whole}</span><span class="a-price-fraction">{fraction}</span></span>
            <span class="a-price a-text-price"><span>$1,499.00</span></span>
            <span class="a-icon-alt">4.6 out of 5 stars</span>
        </div></span></div>"#
    )
}

fn results_page(blocks: &[String]) -> String {
    format!("<html><body>{}</body></html>", blocks.concat())
}

fn detail_page(feature: &str) -> String {
    format!(
        r#"<html><body>
        <ul><li><img src="{IMG}front.jpg"></li><li><img src="{IMG}back.jpg"></li></ul>
        <ul><li class="a-spacing-mini"><span>{feature}</span></li></ul>
        <span class="a-price-symbol">$</span><span class="a-price-whole">1,234.</span><span class="a-price-fraction">99</span>
        </body></html>"#
    )
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

/// Writes a config file pointing the site at `base_url` and loads it back
fn write_config(dir: &Path, base_url: &str, extra: &str) -> Config {
    let content = format!(
        r#"
[crawler]
queries = ["phone"]
pages = 2
concurrency = 2
max-retries = 2

[site]
base-url = "{base_url}"

[output]
directory = "{out}"
snapshot-directory = "{snap}"
{extra}
"#,
        out = dir.join("out").display(),
        snap = dir.join("snapshots").display(),
    );
    let config_path = dir.join("shopcrawl.toml");
    std::fs::write(&config_path, content).unwrap();
    load_config(&config_path).unwrap()
}

async fn mount_storefront(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param("page", "1"))
        .respond_with(html(results_page(&[
            product_block("Phone One", "Phone-One", "B001", "1,234.", "99"),
            product_block("Phone One", "Phone-One", "B001", "1,234.", "99"),
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param("page", "2"))
        .respond_with(html(results_page(&[product_block(
            "Phone Two", "Phone-Two", "B002", "99.", "00",
        )])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/Phone-One/dp/B001/ref=sr_1_1"))
        .respond_with(html(detail_page("5G ready")))
        .mount(server)
        .await;
}

fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("reading {}: {}", path.display(), e))
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_full_crawl_writes_listing_and_detail_files() {
    let server = MockServer::start().await;
    mount_storefront(&server).await;

    Mock::given(method("GET"))
        .and(path("/Phone-Two/dp/B002/ref=sr_1_1"))
        .respond_with(html(detail_page("Dual SIM")))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), &server.uri(), "");
    let coordinator = Coordinator::from_config(config, None)
        .await
        .unwrap()
        .with_config_hash("test-hash");

    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.listing_pages_succeeded, 2);
    assert_eq!(summary.details_succeeded, 2);
    assert_eq!(summary.records_written, 4);
    assert_eq!(summary.config_hash.as_deref(), Some("test-hash"));

    let listing = read_lines(&dir.path().join("out").join("phone.csv"));
    assert_eq!(
        listing[0],
        "id,title,url,isSponsored,currencySymbol,price,referencePrice,rating"
    );
    // The adjacent duplicate on page 1 is dropped
    assert_eq!(listing.len(), 1 + 2);
    let phone_one = listing.iter().find(|l| l.starts_with("B001,")).unwrap();
    assert!(phone_one.contains(",Phone One,"));
    assert!(phone_one.contains(",false,$,1234.99,1499.00,4.6 out of 5 stars"));

    let detail = read_lines(&dir.path().join("out").join("Phone-One.csv"));
    assert_eq!(detail.len(), 2);
    assert!(detail[1].starts_with("B001,Phone-One,"));
    assert!(detail[1].contains(",$,1234.99,5G ready,,,,"));
    assert!(detail[1].contains(&format!("{IMG}front.jpg,{IMG}back.jpg,,")));
}

#[tokio::test]
async fn test_failed_detail_page_leaves_snapshot() {
    let server = MockServer::start().await;
    mount_storefront(&server).await;

    Mock::given(method("GET"))
        .and(path("/Phone-Two/dp/B002/ref=sr_1_1"))
        .respond_with(html("<html><body>Sorry, we just need to make sure you're not a robot</body></html>".to_string()))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), &server.uri(), "");
    let coordinator = Coordinator::from_config(config, None).await.unwrap();

    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.details_succeeded, 1);
    assert_eq!(summary.details_failed, 1);
    // 2 listing pages + 1 detail success + 2 attempts at the failing detail
    assert_eq!(summary.total_attempts, 5);

    let snapshot = dir.path().join("snapshots").join("ERROR-Phone-Two.html");
    let saved = std::fs::read_to_string(snapshot).unwrap();
    assert!(saved.contains("not a robot"));
    assert!(!dir.path().join("out").join("Phone-Two.csv").exists());
}

#[tokio::test]
async fn test_crawl_through_proxy_keeps_target_urls() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/"))
        .and(query_param("api_key", "s3cret"))
        .and(query_param("country", "de"))
        .respond_with(html(results_page(&[product_block(
            "Phone One", "Phone-One", "B001", "10.", "50",
        )])))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let extra = format!(
        r#"
[pipeline]
paginate = false
details = false

[proxy]
endpoint = "{}/v1/"
country = "de"
api-key-env = "SHOPCRAWL_TEST_KEY"
"#,
        server.uri()
    );
    let config = write_config(dir.path(), "https://www.amazon.com", &extra);
    let proxy = resolve_proxy_with(&config, |name| {
        (name == "SHOPCRAWL_TEST_KEY").then(|| "s3cret".to_string())
    })
    .unwrap();

    let coordinator = Coordinator::from_config(config, proxy).await.unwrap();
    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.listing_pages_succeeded, 1);
    let listing = read_lines(&dir.path().join("out").join("phone.csv"));
    assert_eq!(listing.len(), 2);
    assert!(listing[1].starts_with("B001,Phone One,https://www.amazon.com/Phone-One/dp/B001/ref=sr_1_1,"));
    assert!(!listing[1].contains("s3cret"));
}

#[tokio::test]
async fn test_unreachable_storefront_completes_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), &server.uri(), "");
    let coordinator = Coordinator::from_config(config, None).await.unwrap();

    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.listing_pages_failed, 2);
    assert_eq!(summary.total_attempts, 4);
    assert_eq!(summary.details_attempted, 0);
    assert!(!dir.path().join("out").join("phone.csv").exists());
}
