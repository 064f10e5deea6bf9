//! Domain → record ID resolution
//!
//! Maps every configured domain name to the provider's internal record ID
//! before the first tick, and re-resolves individual targets whose ID was
//! invalidated while running.
//!
//! ## Failure policy
//!
//! | `find_record` outcome | Startup ([`resolve`]) | Mid-run ([`reresolve`]) |
//! |-----------------------|-----------------------|-------------------------|
//! | `NotFound` | warn, exclude domain | stay inactive |
//! | `Network` / `Format` | retry, then fatal | stay inactive, next tick |
//! | `Auth` | fatal | fatal |

use crate::config::ReconciliationConfig;
use crate::error::{Error, Result};
use crate::target::DomainTarget;
use crate::traits::DnsProviderClient;
use tracing::{debug, info, warn};

/// Resolve every configured domain into an active [`DomainTarget`]
///
/// Domains without a matching A record are logged once and left out of the
/// returned set. The output preserves configuration order.
///
/// # Returns
///
/// - `Ok(Vec<DomainTarget>)`: Active targets (possibly empty)
/// - `Err(Error::Auth)`: Credentials rejected
/// - `Err(Error::Network)`: Lookups kept failing after all attempts
pub async fn resolve(
    config: &ReconciliationConfig,
    client: &dyn DnsProviderClient,
) -> Result<Vec<DomainTarget>> {
    let mut targets = Vec::with_capacity(config.domain_names().len());

    for name in config.domain_names() {
        match find_with_retry(config, client, name).await {
            Ok(record_id) => {
                info!("Resolved {} -> record {}", name, record_id);
                targets.push(DomainTarget::resolved(name.clone(), record_id));
            }
            Err(Error::NotFound(msg)) => {
                warn!("No A record for {} ({}), excluding it from updates", name, msg);
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        "{} of {} domain(s) active",
        targets.len(),
        config.domain_names().len()
    );

    Ok(targets)
}

/// Single lookup for a target whose record ID was invalidated
///
/// # Returns
///
/// - `Ok(true)`: The target is active again
/// - `Ok(false)`: Still missing or lookup failed transiently
/// - `Err(Error)`: Fatal failure (authentication)
pub async fn reresolve(
    config: &ReconciliationConfig,
    client: &dyn DnsProviderClient,
    target: &mut DomainTarget,
) -> Result<bool> {
    match client.find_record(config.zone_id(), &target.name).await {
        Ok(record_id) => {
            info!("Re-resolved {} -> record {}", target.name, record_id);
            target.record_id = Some(record_id);
            target.last_known_ip = None;
            Ok(true)
        }
        Err(Error::NotFound(_)) => {
            debug!("{} still has no A record", target.name);
            Ok(false)
        }
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            warn!("Re-resolving {} failed: {}", target.name, e);
            Ok(false)
        }
    }
}

async fn find_with_retry(
    config: &ReconciliationConfig,
    client: &dyn DnsProviderClient,
    name: &str,
) -> Result<String> {
    let max_attempts = config.resolve_max_attempts();
    let mut attempt = 1;

    loop {
        match client.find_record(config.zone_id(), name).await {
            Err(e) if e.is_transient() && attempt < max_attempts => {
                warn!(
                    "Lookup attempt {} of {} failed for {}: {}",
                    attempt, max_attempts, name, e
                );
                tokio::time::sleep(config.resolve_retry_delay()).await;
                attempt += 1;
            }
            other => return other,
        }
    }
}
