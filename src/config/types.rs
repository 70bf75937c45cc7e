use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

/// Main configuration structure for shopcrawl
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub proxy: Option<ProxyConfig>,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawl bounds
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Search terms; each gets its own listing file and detail phase
    pub queries: Vec<String>,

    /// Number of listing pages to visit per query
    pub pages: u32,

    /// Maximum number of listing pages fetched at once
    pub concurrency: u32,

    /// Attempts per page before giving up
    pub max_retries: u32,

    /// Navigation timeout for listing pages; backend default when unset
    #[serde(default)]
    pub listing_timeout_secs: Option<u64>,

    /// Navigation timeout for detail pages
    #[serde(default = "default_detail_timeout")]
    pub detail_timeout_secs: u64,
}

fn default_detail_timeout() -> u64 {
    60
}

/// Which optional stages of the pipeline run
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PipelineConfig {
    /// Visit pages 1..=N; when false only the first results page is visited
    #[serde(default = "default_true")]
    pub paginate: bool,

    /// Write records to CSV files
    #[serde(default = "default_true")]
    pub persist: bool,

    /// Visit every listed product's detail page after the listing phase
    #[serde(default = "default_true")]
    pub details: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            paginate: true,
            persist: true,
            details: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Storefront specifics used by the extractor and normalizer
///
/// Every field is optional; unset fields take the storefront defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SiteConfig {
    /// Origin that relative product links are resolved against
    pub base_url: String,

    /// Substring that marks a sponsored product link
    pub sponsored_marker: String,

    /// Only images whose source starts with this prefix are kept
    pub image_prefix: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.amazon.com".to_string(),
            sponsored_marker: "sspa".to_string(),
            image_prefix: "https://m.media-amazon.com/images/I/".to_string(),
        }
    }
}

/// Browser backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BrowserBackend {
    /// Plain HTTP fetch of the server-rendered document
    Http,
    /// Headless Chromium (requires the `chromium` feature)
    Chromium,
}

/// Browser configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BrowserConfig {
    #[serde(default = "default_backend")]
    pub backend: BrowserBackend,

    /// User agent sent by the HTTP backend
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_backend() -> BrowserBackend {
    BrowserBackend::Http
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/124.0 Safari/537.36"
        .to_string()
}

/// Pass-through proxy configuration
///
/// The API key itself is never stored in the file; it is read from the
/// environment variable named by `api-key-env` when the crawl starts.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProxyConfig {
    pub endpoint: String,

    #[serde(default = "default_country")]
    pub country: String,

    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

fn default_country() -> String {
    "us".to_string()
}

fn default_api_key_env() -> String {
    "PROXY_API_KEY".to_string()
}

/// Output locations
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory receiving `<query>.csv` and `<title>.csv` files
    #[serde(default = "default_dir")]
    pub directory: PathBuf,

    /// Directory receiving diagnostic snapshots of failed detail pages
    #[serde(default = "default_dir")]
    pub snapshot_directory: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_dir(),
            snapshot_directory: default_dir(),
        }
    }
}

fn default_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Opaque proxy credential
///
/// `Debug` and `Display` are redacted so the key cannot leak through logs.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Proxy settings with the credential resolved
#[derive(Debug, Clone)]
pub struct ResolvedProxy {
    pub endpoint: String,
    pub country: String,
    pub api_key: ApiKey,
}
