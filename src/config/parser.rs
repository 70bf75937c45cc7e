use crate::config::types::{ApiKey, Config, ResolvedProxy};
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// The hash is reported in the run summary so two runs can be compared.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Resolves the proxy credential from the process environment
///
/// Returns `Ok(None)` when no proxy is configured.
pub fn resolve_proxy(config: &Config) -> Result<Option<ResolvedProxy>, ConfigError> {
    resolve_proxy_with(config, |name| std::env::var(name).ok())
}

/// Resolves the proxy credential using the given variable lookup
pub fn resolve_proxy_with<F>(config: &Config, lookup: F) -> Result<Option<ResolvedProxy>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(proxy) = &config.proxy else {
        return Ok(None);
    };

    let key = lookup(&proxy.api_key_env)
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingCredential(proxy.api_key_env.clone()))?;

    Ok(Some(ResolvedProxy {
        endpoint: proxy.endpoint.clone(),
        country: proxy.country.clone(),
        api_key: ApiKey::new(key),
    }))
}
