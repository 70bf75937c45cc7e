//! Configuration module for shopcrawl
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! and resolving the proxy credential from the environment.
//!
//! # Example
//!
//! ```no_run
//! use shopcrawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("shopcrawl.toml")).unwrap();
//! println!("Crawler will visit {} pages per query", config.crawler.pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ApiKey, BrowserBackend, BrowserConfig, Config, CrawlerConfig, OutputConfig, PipelineConfig,
    ProxyConfig, ResolvedProxy, SiteConfig,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, resolve_proxy, resolve_proxy_with,
};
pub use validation::validate;
