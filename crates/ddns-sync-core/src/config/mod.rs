//! Configuration types for the DDNS reconciliation system
//!
//! A [`ReconciliationConfig`] is built exactly once at startup by
//! [`RawConfig::validate`], a pure function over raw string values. Where
//! those values come from is the job of a [`ConfigSource`].

mod env;

pub use env::{ConfigSource, EnvConfigSource};

use crate::error::{Error, Result};

/// Default poll interval (seconds)
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 300;

/// Default public IP echo service
pub const DEFAULT_IP_CHECK_URL: &str = "https://api.ipify.org";

/// Default bound on every outbound HTTP call (seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Default TTL written with each record update
pub const DEFAULT_RECORD_TTL: u32 = 120;

/// Default attempts per domain for the startup record lookup
pub const DEFAULT_RESOLVE_MAX_ATTEMPTS: usize = 3;

/// Default delay between startup record lookup attempts (seconds)
pub const DEFAULT_RESOLVE_RETRY_DELAY_SECS: u64 = 5;

/// Validated, immutable configuration of the reconciliation loop
///
/// # Invariants
///
/// - `zone_id` and `api_token` are non-empty
/// - `domain_names` is non-empty, trimmed, lowercase and free of duplicates
/// - `check_interval_secs >= 1`
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the API token.
#[derive(Clone, PartialEq, Eq)]
pub struct ReconciliationConfig {
    zone_id: String,
    api_token: String,
    domain_names: Vec<String>,
    check_interval_secs: u64,
    ip_check_url: String,
    request_timeout_secs: u64,
    record_ttl: u32,
    record_proxied: bool,
    resolve_max_attempts: usize,
    resolve_retry_delay_secs: u64,
    dry_run: bool,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for ReconciliationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconciliationConfig")
            .field("zone_id", &self.zone_id)
            .field("api_token", &"<REDACTED>")
            .field("domain_names", &self.domain_names)
            .field("check_interval_secs", &self.check_interval_secs)
            .field("ip_check_url", &self.ip_check_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("record_ttl", &self.record_ttl)
            .field("record_proxied", &self.record_proxied)
            .field("resolve_max_attempts", &self.resolve_max_attempts)
            .field("resolve_retry_delay_secs", &self.resolve_retry_delay_secs)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl ReconciliationConfig {
    /// Build a configuration from the three required values, using defaults
    /// for everything else.
    pub fn new(
        zone_id: impl Into<String>,
        api_token: impl Into<String>,
        domain_names: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<Self> {
        RawConfig {
            zone_id: Some(zone_id.into()),
            api_token: Some(api_token.into()),
            domains: domain_names.into_iter().map(Into::into).collect(),
            ..RawConfig::default()
        }
        .validate()
    }

    /// Override the poll interval
    pub fn with_check_interval_secs(mut self, secs: u64) -> Result<Self> {
        if secs == 0 {
            return Err(Error::config("Check interval must be >= 1 second"));
        }
        self.check_interval_secs = secs;
        Ok(self)
    }

    /// Override the startup lookup retry policy
    pub fn with_resolve_policy(mut self, max_attempts: usize, retry_delay_secs: u64) -> Result<Self> {
        if max_attempts == 0 {
            return Err(Error::config("Resolve attempts must be >= 1"));
        }
        self.resolve_max_attempts = max_attempts;
        self.resolve_retry_delay_secs = retry_delay_secs;
        Ok(self)
    }

    pub fn zone_id(&self) -> &str {
        &self.zone_id
    }

    /// ⚠️ NEVER log this value
    pub fn api_token(&self) -> &str {
        &self.api_token
    }

    pub fn domain_names(&self) -> &[String] {
        &self.domain_names
    }

    pub fn check_interval_secs(&self) -> u64 {
        self.check_interval_secs
    }

    pub fn check_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.check_interval_secs)
    }

    pub fn ip_check_url(&self) -> &str {
        &self.ip_check_url
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }

    pub fn record_ttl(&self) -> u32 {
        self.record_ttl
    }

    pub fn record_proxied(&self) -> bool {
        self.record_proxied
    }

    pub fn resolve_max_attempts(&self) -> usize {
        self.resolve_max_attempts
    }

    pub fn resolve_retry_delay(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.resolve_retry_delay_secs)
    }

    /// Dry-run: provider reads happen, writes are only logged
    pub fn dry_run(&self) -> bool {
        self.dry_run
    }
}

/// Unvalidated configuration values, exactly as read from a source
#[derive(Debug, Clone, Default)]
pub struct RawConfig {
    pub zone_id: Option<String>,
    pub api_token: Option<String>,
    /// Domain names in source order; may contain blanks and duplicates
    pub domains: Vec<String>,
    pub check_interval: Option<String>,
    pub ip_check_url: Option<String>,
    pub request_timeout_secs: Option<String>,
    pub record_ttl: Option<String>,
    pub record_proxied: Option<String>,
    pub resolve_max_attempts: Option<String>,
    pub resolve_retry_delay_secs: Option<String>,
    pub mode: Option<String>,
}

impl RawConfig {
    /// Validate raw values into a [`ReconciliationConfig`]
    ///
    /// Fails with [`Error::Config`] on the first missing or invalid value.
    pub fn validate(self) -> Result<ReconciliationConfig> {
        let zone_id = required("zone ID", self.zone_id)?;
        let api_token = required("API token", self.api_token)?;

        let domain_names = normalize_domains(self.domains);
        if domain_names.is_empty() {
            return Err(Error::config("At least one domain name must be configured"));
        }
        for domain in &domain_names {
            validate_domain_name(domain)?;
        }

        let check_interval_secs = parse_number(
            "check interval",
            self.check_interval,
            DEFAULT_CHECK_INTERVAL_SECS,
        )?;
        if check_interval_secs == 0 {
            return Err(Error::config("Check interval must be >= 1 second"));
        }

        let ip_check_url = optional(self.ip_check_url)
            .unwrap_or_else(|| DEFAULT_IP_CHECK_URL.to_string());
        if !ip_check_url.starts_with("https://") && !ip_check_url.starts_with("http://") {
            return Err(Error::config(format!(
                "IP check URL must use HTTP or HTTPS scheme. Got: {}",
                ip_check_url
            )));
        }

        let request_timeout_secs = parse_number(
            "request timeout",
            self.request_timeout_secs,
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;
        if request_timeout_secs == 0 {
            return Err(Error::config("Request timeout must be >= 1 second"));
        }

        // Cloudflare accepts 1 ("automatic") or 60..=86400
        let record_ttl = parse_number("record TTL", self.record_ttl, DEFAULT_RECORD_TTL)?;
        if record_ttl != 1 && !(60..=86400).contains(&record_ttl) {
            return Err(Error::config(format!(
                "Record TTL must be 1 (automatic) or between 60 and 86400. Got: {}",
                record_ttl
            )));
        }

        let record_proxied = parse_bool("record proxied flag", self.record_proxied)?;

        let resolve_max_attempts = parse_number(
            "resolve attempts",
            self.resolve_max_attempts,
            DEFAULT_RESOLVE_MAX_ATTEMPTS,
        )?;
        if resolve_max_attempts == 0 {
            return Err(Error::config("Resolve attempts must be >= 1"));
        }

        let resolve_retry_delay_secs = parse_number(
            "resolve retry delay",
            self.resolve_retry_delay_secs,
            DEFAULT_RESOLVE_RETRY_DELAY_SECS,
        )?;

        let dry_run = match optional(self.mode).map(|m| m.to_lowercase()).as_deref() {
            None | Some("live") => false,
            Some("dry-run") | Some("dry_run") => true,
            Some(other) => {
                return Err(Error::config(format!(
                    "Mode '{}' is not valid. Valid modes: live, dry-run",
                    other
                )));
            }
        };

        Ok(ReconciliationConfig {
            zone_id,
            api_token,
            domain_names,
            check_interval_secs,
            ip_check_url,
            request_timeout_secs,
            record_ttl,
            record_proxied,
            resolve_max_attempts,
            resolve_retry_delay_secs,
            dry_run,
        })
    }
}

/// Trim, lowercase and deduplicate domain names, keeping first-seen order
pub fn normalize_domains(domains: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for domain in domains {
        let domain = domain.trim().to_lowercase();
        if !domain.is_empty() && !out.contains(&domain) {
            out.push(domain);
        }
    }
    out
}

/// Validate that a string is a valid domain name
///
/// Basic RFC 1035 checks; a leading `*` label is accepted for wildcard
/// records.
pub fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.is_empty() {
        return Err(Error::config("Domain name cannot be empty"));
    }

    // Total length limit (RFC 1035: 253 chars max)
    if domain.len() > 253 {
        return Err(Error::config(format!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        )));
    }

    if !domain.contains('.') {
        return Err(Error::config(format!(
            "Domain name must contain at least one dot: '{}'",
            domain
        )));
    }

    for (index, label) in domain.split('.').enumerate() {
        if label.is_empty() {
            return Err(Error::config(format!("Domain name has empty label: '{}'", domain)));
        }

        if index == 0 && label == "*" {
            continue;
        }

        if label.len() > 63 {
            return Err(Error::config(format!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(Error::config(format!(
                "Domain label contains invalid characters. Label: '{}'",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(Error::config(format!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            )));
        }
    }

    Ok(())
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(what: &str, value: Option<String>) -> Result<String> {
    optional(value).ok_or_else(|| Error::config(format!("{} is required and cannot be empty", what)))
}

fn parse_number<T: std::str::FromStr>(what: &str, value: Option<String>, default: T) -> Result<T> {
    match optional(value) {
        None => Ok(default),
        Some(v) => v.parse().map_err(|_| {
            Error::config(format!("{} must be a positive integer. Got: '{}'", what, v))
        }),
    }
}

fn parse_bool(what: &str, value: Option<String>) -> Result<bool> {
    match optional(value).map(|v| v.to_lowercase()).as_deref() {
        None => Ok(false),
        Some("true") | Some("1") | Some("yes") => Ok(true),
        Some("false") | Some("0") | Some("no") => Ok(false),
        Some(other) => Err(Error::config(format!(
            "{} must be true or false. Got: '{}'",
            what, other
        ))),
    }
}
