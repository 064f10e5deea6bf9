//! Per-domain reconciliation state
//!
//! A [`DomainTarget`] is created at startup for every configured domain and
//! owned by the reconciliation loop for the lifetime of the process. It is
//! never persisted: after a restart everything is rebuilt from the provider.

use std::net::Ipv4Addr;

/// Reconciliation state of one managed domain
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DomainTarget {
    /// Fully-qualified record name
    pub name: String,
    /// Provider record ID; `None` until resolved or after invalidation
    pub record_id: Option<String>,
    /// Address the provider is known to hold; `None` forces a provider check
    pub last_known_ip: Option<Ipv4Addr>,
    /// Timestamp of the last confirmed reconciliation
    pub last_updated: Option<chrono::DateTime<chrono::Utc>>,
}

impl DomainTarget {
    /// Create an unresolved target
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            record_id: None,
            last_known_ip: None,
            last_updated: None,
        }
    }

    /// Create a target with a known record ID
    pub fn resolved(name: impl Into<String>, record_id: impl Into<String>) -> Self {
        Self {
            record_id: Some(record_id.into()),
            ..Self::new(name)
        }
    }

    /// Whether the target can currently be updated
    pub fn is_active(&self) -> bool {
        self.record_id.is_some()
    }

    /// Whether a provider call is needed to reconcile against `current_ip`
    pub fn needs_check(&self, current_ip: Ipv4Addr) -> bool {
        self.last_known_ip != Some(current_ip)
    }

    /// Record a confirmed provider-side value
    pub(crate) fn mark_current(&mut self, ip: Ipv4Addr) {
        self.last_known_ip = Some(ip);
        self.last_updated = Some(chrono::Utc::now());
    }

    /// Drop the record ID after the provider reported it missing
    ///
    /// The last known IP is dropped with it: a re-created record may hold
    /// any value.
    pub(crate) fn invalidate(&mut self) {
        self.record_id = None;
        self.last_known_ip = None;
    }
}
