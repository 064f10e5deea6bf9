// # HTTP Public IP Resolver
//
// This crate provides the `PublicIpResolver` used by the DDNS
// reconciliation daemon: one GET against a plain-text IP echo service
// (e.g. https://api.ipify.org) per call.
//
// ## Behavior
//
// - Body is trimmed and parsed as an IPv4 address
// - Transport failure, timeout, non-success status → `Error::Network`
// - Anything that is not an IPv4 address (including IPv6) → `Error::Format`
// - No caching and no retry; the loop asks once per tick

use ddns_sync_core::{Error, PublicIpResolver, ReconciliationConfig, Result};
use std::net::Ipv4Addr;
use std::time::Duration;

/// Default IP echo service
pub const DEFAULT_IP_SERVICE: &str = ddns_sync_core::config::DEFAULT_IP_CHECK_URL;

/// HTTP-based public IP resolver
#[derive(Debug, Clone)]
pub struct HttpIpResolver {
    /// URL to fetch the IP from
    url: String,

    /// HTTP client, carries the request timeout
    client: reqwest::Client,
}

impl HttpIpResolver {
    /// Create a new HTTP IP resolver
    ///
    /// # Parameters
    ///
    /// - `url`: Echo service returning the caller's IP as plain text
    /// - `timeout`: Bound on the whole request
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// Create a resolver from the validated configuration
    pub fn from_config(config: &ReconciliationConfig) -> Result<Self> {
        Self::new(config.ip_check_url(), config.request_timeout())
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl PublicIpResolver for HttpIpResolver {
    async fn current_ipv4(&self) -> Result<Ipv4Addr> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::network(format!("Request to {} failed: {}", self.url, e)))?;

        if !response.status().is_success() {
            return Err(Error::network(format!(
                "{} returned HTTP {}",
                self.url,
                response.status()
            )));
        }

        let ip_text = response
            .text()
            .await
            .map_err(|e| Error::network(format!("Failed to read response: {}", e)))?;
        let ip_text = ip_text.trim();

        let ip: Ipv4Addr = ip_text
            .parse()
            .map_err(|_| Error::format(format!("Invalid IPv4 address: {:?}", ip_text)))?;

        tracing::debug!("Public IP from {}: {}", self.url, ip);
        Ok(ip)
    }

    fn resolver_name(&self) -> &'static str {
        "http"
    }
}
