// # DNS Provider Client Trait
//
// Defines the thin contract over a DNS provider's record API.
//
// ## Implementations
//
// - Cloudflare API v4: `ddns-sync-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_sync_core::DnsProviderClient;
//
// #[tokio::main]
// async fn main() -> ddns_sync_core::Result<()> {
//     let client = /* DnsProviderClient implementation */;
//
//     let id = client.find_record("zone", "home.example.com").await?;
//     let ip = client.get_record_value("zone", &id).await?;
//     client
//         .update_record("zone", &id, "home.example.com", std::net::Ipv4Addr::new(1, 2, 3, 4))
//         .await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Trait for DNS provider clients
///
/// Clients only translate calls into provider requests and provider
/// responses into [`crate::Error`] variants. Whether an update is needed,
/// retries, and scheduling are decided by `ReconciliationLoop`.
///
/// # Error mapping
///
/// | Provider outcome | Error |
/// |------------------|-------|
/// | credentials rejected (401/403) | `Error::Auth` |
/// | record or record ID missing | `Error::NotFound` |
/// | transport failure, timeout, 429, 5xx | `Error::Network` |
/// | unparsable response | `Error::Format` |
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait DnsProviderClient: Send + Sync {
    /// Find the ID of the address (A) record whose name matches exactly
    ///
    /// # Parameters
    ///
    /// - `zone_id`: The provider zone holding the record
    /// - `domain_name`: Fully-qualified record name (e.g., "home.example.com")
    async fn find_record(&self, zone_id: &str, domain_name: &str) -> Result<String, crate::Error>;

    /// Read the IPv4 address currently stored in a record
    async fn get_record_value(&self, zone_id: &str, record_id: &str) -> Result<Ipv4Addr, crate::Error>;

    /// Set a record's address
    ///
    /// # Idempotency
    ///
    /// Issuing the same update twice with the same value must leave the
    /// provider in the same state as issuing it once.
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        domain_name: &str,
        new_ip: Ipv4Addr,
    ) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
