// # Environment Config Source
//
// Reads the daemon configuration from environment variables, secret files
// and an optional domain document.
//
// ## Variables
//
// - `DDNS_ZONE_ID` / `DDNS_ZONE_ID_FILE`: Cloudflare zone identifier
// - `DDNS_API_TOKEN` / `DDNS_API_TOKEN_FILE`: API token (Zone:DNS:Edit)
// - `DDNS_DOMAINS`: Comma-separated list of A records to manage
// - `DDNS_DOMAIN_FILE`: JSON, YAML or TOML document with a `domains` list
// - `DDNS_CHECK_INTERVAL`: Poll interval in seconds (default 300)
// - `DDNS_IP_CHECK_URL`: Public IP echo service
// - `DDNS_REQUEST_TIMEOUT_SECS`: Timeout for every outbound call
// - `DDNS_RECORD_TTL` / `DDNS_RECORD_PROXIED`: Values written with updates
// - `DDNS_RESOLVE_MAX_ATTEMPTS` / `DDNS_RESOLVE_RETRY_DELAY_SECS`
// - `DDNS_MODE`: `live` (default) or `dry-run`
//
// A `<NAME>_FILE` variable wins over `<NAME>` when it points at an existing
// file, so container secrets can be mounted instead of exported.

use super::{RawConfig, ReconciliationConfig};
use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Anything that can produce a validated [`ReconciliationConfig`]
pub trait ConfigSource {
    /// Load and validate the configuration
    ///
    /// # Returns
    ///
    /// - `Ok(ReconciliationConfig)`: A config satisfying every invariant
    /// - `Err(Error::Config)`: A required value is missing or invalid
    fn load(&self) -> Result<ReconciliationConfig>;
}

/// Shape of the domain document pointed at by `DDNS_DOMAIN_FILE`
#[derive(Debug, Default, Deserialize)]
struct DomainFile {
    #[serde(default)]
    domains: Vec<String>,
}

/// Environment-backed [`ConfigSource`]
///
/// The key lookup is injectable so tests never touch the process
/// environment.
pub struct EnvConfigSource<F = fn(&str) -> Option<String>> {
    lookup: F,
}

impl EnvConfigSource {
    /// Read from the process environment
    pub fn from_process_env() -> Self {
        let lookup: fn(&str) -> Option<String> = |key| std::env::var(key).ok();
        Self { lookup }
    }
}

impl<F> EnvConfigSource<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Read through a custom key lookup
    pub fn with_lookup(lookup: F) -> Self {
        Self { lookup }
    }

    fn var(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
    }

    /// Resolve a secret: `<NAME>_FILE` first, then `<NAME>`
    fn secret(&self, name: &str) -> Result<Option<String>> {
        let file_key = format!("{}_FILE", name);
        if let Some(path) = self.var(&file_key).filter(|p| !p.trim().is_empty()) {
            let path = Path::new(path.trim());
            if path.exists() {
                let value = std::fs::read_to_string(path).map_err(|e| {
                    Error::config(format!(
                        "Error reading secret file '{}' ({}): {}",
                        path.display(),
                        file_key,
                        e
                    ))
                })?;
                return Ok(Some(value.trim().to_string()));
            }
            tracing::warn!(
                "{} points at missing file '{}', falling back to {}",
                file_key,
                path.display(),
                name
            );
        }

        Ok(self.var(name).map(|v| v.trim().to_string()))
    }

    /// Collect domains from `DDNS_DOMAINS` followed by `DDNS_DOMAIN_FILE`
    fn domains(&self) -> Result<Vec<String>> {
        let mut domains: Vec<String> = self
            .var("DDNS_DOMAINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.to_string())
            .collect();

        if let Some(path) = self.var("DDNS_DOMAIN_FILE").filter(|p| !p.trim().is_empty()) {
            domains.extend(read_domain_file(Path::new(path.trim()))?);
        }

        Ok(domains)
    }
}

impl<F> ConfigSource for EnvConfigSource<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn load(&self) -> Result<ReconciliationConfig> {
        let raw = RawConfig {
            zone_id: self.secret("DDNS_ZONE_ID")?,
            api_token: self.secret("DDNS_API_TOKEN")?,
            domains: self.domains()?,
            check_interval: self.var("DDNS_CHECK_INTERVAL"),
            ip_check_url: self.var("DDNS_IP_CHECK_URL"),
            request_timeout_secs: self.var("DDNS_REQUEST_TIMEOUT_SECS"),
            record_ttl: self.var("DDNS_RECORD_TTL"),
            record_proxied: self.var("DDNS_RECORD_PROXIED"),
            resolve_max_attempts: self.var("DDNS_RESOLVE_MAX_ATTEMPTS"),
            resolve_retry_delay_secs: self.var("DDNS_RESOLVE_RETRY_DELAY_SECS"),
            mode: self.var("DDNS_MODE"),
        };

        raw.validate()
    }
}

/// Parse a JSON, YAML or TOML domain document
fn read_domain_file(path: &Path) -> Result<Vec<String>> {
    let wrap = |e: Error| {
        Error::config(format!("Domain file '{}': {}", path.display(), e))
    };

    let text = std::fs::read_to_string(path).map_err(|e| wrap(e.into()))?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let file: DomainFile = match extension.as_str() {
        "json" => serde_json::from_str(&text).map_err(|e| wrap(e.into()))?,
        "yaml" | "yml" => {
            // An empty YAML document deserializes to unit, not a map
            if text.trim().is_empty() {
                DomainFile::default()
            } else {
                serde_yaml::from_str(&text).map_err(|e| wrap(e.into()))?
            }
        }
        "toml" => toml::from_str(&text).map_err(|e| wrap(e.into()))?,
        other => {
            return Err(Error::config(format!(
                "Domain file '{}' has unsupported format '{}'. Supported: json, yaml, yml, toml",
                path.display(),
                other
            )));
        }
    };

    Ok(file.domains)
}
