// # Cloudflare DNS Provider Client
//
// This crate provides the Cloudflare API v4 implementation of
// `DnsProviderClient` for the DDNS reconciliation daemon.
//
// ## Scope
//
// - ✅ Exact-name A record lookup
// - ✅ Record value read
// - ✅ Record update (type, name, content, ttl, proxied)
// - ✅ Dry-run mode (reads performed, writes logged and skipped)
// - ✅ Every request bounded by the configured timeout
// - ❌ NO retry logic (owned by the reconciliation loop)
// - ❌ NO caching (record IDs are owned by the loop's targets)
// - ❌ NO zone discovery (the zone ID is configuration)
//
// ## Error Mapping
//
// | Response | Error |
// |----------|-------|
// | transport failure / timeout | `Error::Network` |
// | 401, 403 | `Error::Auth` |
// | 404 | `Error::NotFound` |
// | 429, 5xx, other non-success | `Error::Network` |
// | `"success": false` | `Error::Network` with the API's messages |
// | malformed JSON, non-IPv4 content | `Error::Format` |
//
// ## Security Requirements
//
// - API token NEVER appears in logs or `Debug` output
// - Client MUST fail fast if the token is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List DNS Records: GET `/zones/:zone_id/dns_records?type=A&name=...`
// - DNS Record Details: GET `/zones/:zone_id/dns_records/:record_id`
// - Overwrite DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use ddns_sync_core::{DnsProviderClient, Error, ReconciliationConfig, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::time::Duration;

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (10 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Record type managed by this client
const RECORD_TYPE_A: &str = "A";

/// Cloudflare response envelope
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct DnsRecord {
    id: String,
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    content: String,
}

/// PUT payload, a full overwrite of the record
#[derive(Debug, Serialize)]
struct UpdateRequest<'a> {
    #[serde(rename = "type")]
    record_type: &'static str,
    name: &'a str,
    content: String,
    ttl: u32,
    proxied: bool,
}

/// Cloudflare DNS client
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the client will:
/// - Perform all GET requests (record lookup, record read)
/// - Log the intended PUT payload
/// - **NOT** modify DNS records
///
/// # Security
///
/// The Debug implementation does NOT expose the API token.
pub struct CloudflareClient {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// API base URL, overridable for tests
    api_base: String,

    /// TTL written with each update
    ttl: u32,

    /// Proxy flag written with each update
    proxied: bool,

    /// Dry-run mode: if true, perform GET requests but skip PUT updates
    dry_run: bool,

    /// HTTP client for API requests
    client: reqwest::Client,
}

impl std::fmt::Debug for CloudflareClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareClient")
            .field("api_token", &"<REDACTED>")
            .field("api_base", &self.api_base)
            .field("ttl", &self.ttl)
            .field("proxied", &self.proxied)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CloudflareClient {
    /// Create a new Cloudflare client in live mode
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:DNS:Edit permissions
    /// - `timeout`: Bound applied to every request
    ///
    /// # Returns
    ///
    /// - `Err(Error::Config)`: Empty token or the HTTP client could not be built
    pub fn new(api_token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.trim().is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            api_base: CLOUDFLARE_API_BASE.to_string(),
            ttl: ddns_sync_core::config::DEFAULT_RECORD_TTL,
            proxied: false,
            dry_run: false,
            client,
        })
    }

    /// Create a client from the validated configuration
    pub fn from_config(config: &ReconciliationConfig) -> Result<Self> {
        let client = Self::new(config.api_token(), config.request_timeout())?
            .with_record_settings(config.record_ttl(), config.record_proxied())
            .with_dry_run(config.dry_run());

        if client.dry_run {
            tracing::warn!("Cloudflare client running in DRY-RUN mode - no changes will be made");
        }

        Ok(client)
    }

    /// Client with the default timeout
    pub fn with_default_timeout(api_token: impl Into<String>) -> Result<Self> {
        Self::new(api_token, DEFAULT_HTTP_TIMEOUT)
    }

    /// Point the client at another API base (mock servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api_base = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_record_settings(mut self, ttl: u32, proxied: bool) -> Self {
        self.ttl = ttl;
        self.proxied = proxied;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    fn records_url(&self, zone_id: &str) -> String {
        format!("{}/zones/{}/dns_records", self.api_base, zone_id)
    }

    fn record_url(&self, zone_id: &str, record_id: &str) -> String {
        format!("{}/zones/{}/dns_records/{}", self.api_base, zone_id, record_id)
    }

    /// Send a request and unwrap the Cloudflare envelope
    ///
    /// `what` names the resource for error messages.
    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder, what: &str) -> Result<T> {
        let response = request
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| Error::network(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::network(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(map_status(status, &body, what));
        }

        let envelope: ApiResponse<T> = serde_json::from_str(&body)
            .map_err(|e| Error::format(format!("Failed to parse response for {}: {}", what, e)))?;

        if !envelope.success {
            return Err(Error::network(format!(
                "Cloudflare API rejected request for {}: {}",
                what,
                join_messages(&envelope.errors)
            )));
        }

        envelope
            .result
            .ok_or_else(|| Error::format(format!("Response for {} has no result", what)))
    }
}

/// Map a non-success HTTP status to the error taxonomy
fn map_status(status: reqwest::StatusCode, body: &str, what: &str) -> Error {
    let detail = serde_json::from_str::<ApiResponse<serde_json::Value>>(body)
        .map(|envelope| join_messages(&envelope.errors))
        .unwrap_or_else(|_| body.trim().to_string());

    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "Invalid API token or insufficient permissions. Status: {}",
            status
        )),
        404 => Error::not_found(format!("{} ({})", what, status)),
        429 => Error::network(format!("Rate limit exceeded. Status: {}", status)),
        500..=599 => Error::network(format!("Cloudflare server error (transient): {} - {}", status, detail)),
        _ => Error::network(format!("Request for {} failed: {} - {}", what, status, detail)),
    }
}

fn join_messages(messages: &[ApiMessage]) -> String {
    if messages.is_empty() {
        return "no error details".to_string();
    }

    messages
        .iter()
        .map(|m| format!("[{}] {}", m.code, m.message))
        .collect::<Vec<_>>()
        .join("; ")
}

#[async_trait]
impl DnsProviderClient for CloudflareClient {
    /// ```http
    /// GET /zones/:zone_id/dns_records?type=A&name=home.example.com
    /// Authorization: Bearer <token>
    /// ```
    async fn find_record(&self, zone_id: &str, domain_name: &str) -> Result<String> {
        tracing::debug!("Looking up A record: {}", domain_name);

        let request = self
            .client
            .get(self.records_url(zone_id))
            .query(&[("type", RECORD_TYPE_A), ("name", domain_name)]);
        let records: Vec<DnsRecord> = self.send(request, domain_name).await?;

        let record = records
            .into_iter()
            .find(|r| r.name == domain_name && r.record_type == RECORD_TYPE_A)
            .ok_or_else(|| Error::not_found(format!("No A record named {}", domain_name)))?;

        tracing::debug!("Found record ID {} for {}", record.id, domain_name);
        Ok(record.id)
    }

    async fn get_record_value(&self, zone_id: &str, record_id: &str) -> Result<Ipv4Addr> {
        let request = self.client.get(self.record_url(zone_id, record_id));
        let record: DnsRecord = self.send(request, record_id).await?;

        record.content.trim().parse().map_err(|_| {
            Error::format(format!(
                "Record {} content is not an IPv4 address: {:?}",
                record_id, record.content
            ))
        })
    }

    /// ```http
    /// PUT /zones/:zone_id/dns_records/:record_id
    /// { "type": "A", "name": "...", "content": "1.2.3.4", "ttl": 120, "proxied": false }
    /// ```
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        domain_name: &str,
        new_ip: Ipv4Addr,
    ) -> Result<()> {
        let payload = UpdateRequest {
            record_type: RECORD_TYPE_A,
            name: domain_name,
            content: new_ip.to_string(),
            ttl: self.ttl,
            proxied: self.proxied,
        };

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send PUT for {} (record {}) with payload: {}",
                domain_name,
                record_id,
                serde_json::to_string(&payload)?
            );
            return Ok(());
        }

        let request = self
            .client
            .put(self.record_url(zone_id, record_id))
            .json(&payload);
        let _: DnsRecord = self.send(request, domain_name).await?;

        tracing::debug!("Cloudflare accepted update: {} -> {}", domain_name, new_ip);
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}
