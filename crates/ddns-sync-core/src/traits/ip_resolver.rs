// # Public IP Resolver Trait
//
// Defines the interface for discovering the host's current public IPv4
// address.
//
// ## Implementations
//
// - HTTP echo service (ipify and compatibles): `ddns-sync-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_sync_core::PublicIpResolver;
//
// #[tokio::main]
// async fn main() -> ddns_sync_core::Result<()> {
//     let resolver = /* PublicIpResolver implementation */;
//
//     let ip = resolver.current_ipv4().await?;
//     println!("public IP: {}", ip);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Trait for public IP resolver implementations
///
/// Resolvers are treated as unreliable: the reconciliation loop expects
/// timeouts and garbage responses and simply tries again on the next tick.
///
/// # Rules
///
/// - One outbound request per call, bounded by a timeout
/// - No retry logic (owned by `ReconciliationLoop`)
/// - No caching between calls; the value is only valid at the instant it
///   was retrieved
#[async_trait]
pub trait PublicIpResolver: Send + Sync {
    /// Get the current public IPv4 address
    ///
    /// # Returns
    ///
    /// - `Ok(Ipv4Addr)`: The current public address
    /// - `Err(Error::Network)`: Connection failure, timeout or non-success status
    /// - `Err(Error::Format)`: The response is not a valid IPv4 address
    async fn current_ipv4(&self) -> Result<Ipv4Addr, crate::Error>;

    /// Resolver name (for logging/debugging)
    fn resolver_name(&self) -> &'static str;
}
