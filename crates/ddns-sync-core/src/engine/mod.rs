//! Reconciliation loop
//!
//! The ReconciliationLoop is responsible for:
//! - Resolving the public IP once per tick via PublicIpResolver
//! - Comparing it against each domain's last known provider value
//! - Updating only the records that differ via DnsProviderClient
//! - Sleeping until the next tick, observing shutdown at every await
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │ PublicIpResolver │─── Ipv4Addr ───┐
//! └──────────────────┘                │
//!                                     ▼
//!                          ┌─────────────────────┐
//!                          │ ReconciliationLoop  │◀── Vec<DomainTarget>
//!                          └─────────────────────┘
//!                                     │
//!                   ┌─────────────────┴─────────────────┐
//!                   ▼                                   ▼
//!         ┌───────────────────┐               ┌─────────────────┐
//!         │ DnsProviderClient │               │    LoopEvent    │
//!         │ (read / update)   │               │    (notify)     │
//!         └───────────────────┘               └─────────────────┘
//! ```
//!
//! ## States
//!
//! `Idle → Resolving → Comparing → Updating(0..n) → Sleeping → Resolving …`
//!
//! The loop only terminates on shutdown or on a fatal error
//! (authentication). Every other failure is logged and retried on the next
//! tick.
//!
//! ## Record deletion while running
//!
//! A `NotFound` from the provider clears the target's record ID. At the
//! start of each following tick (after the public IP is known) such targets
//! get one re-resolution attempt; once the record exists again the target
//! is reconciled in that same tick.

use crate::config::ReconciliationConfig;
use crate::error::{Error, Result};
use crate::resolver;
use crate::target::DomainTarget;
use crate::traits::{DnsProviderClient, PublicIpResolver};
use std::net::Ipv4Addr;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

/// Capacity of the monitoring event channel
///
/// When full, new events are dropped (with a warning log).
pub const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Events emitted by the ReconciliationLoop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopEvent {
    /// Loop started
    Started {
        active_domains: usize,
        ip_resolver: &'static str,
        provider: &'static str,
    },

    /// A new tick began
    TickStarted { tick: u64 },

    /// Public IP resolved for this tick
    IpResolved { ip: Ipv4Addr },

    /// Public IP could not be resolved; the tick is skipped
    IpCheckFailed { error: String },

    /// Provider record now holds the current IP
    RecordUpdated {
        domain: String,
        previous_ip: Option<Ipv4Addr>,
        new_ip: Ipv4Addr,
    },

    /// Record already held the current IP, nothing written
    RecordUnchanged { domain: String, current_ip: Ipv4Addr },

    /// Transient failure; the domain is retried next tick
    UpdateFailed { domain: String, error: String },

    /// Provider no longer knows the record ID
    RecordInvalidated { domain: String },

    /// An invalidated record was found again
    RecordReresolved { domain: String },

    /// Loop stopped
    Stopped { reason: String },
}

/// Per-tick counters, also logged as the tick summary line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Public IP of this tick, `None` when the check failed
    pub ip: Option<Ipv4Addr>,
    pub updated: usize,
    pub unchanged: usize,
    pub failed: usize,
    /// Targets without a record ID (after re-resolution)
    pub inactive: usize,
}

/// Outcome of reconciling one target
enum Outcome {
    Updated,
    Unchanged,
    Failed,
    Inactive,
}

/// Core reconciliation loop
///
/// ## Lifecycle
///
/// 1. Create with [`ReconciliationLoop::bootstrap()`] (resolves record IDs)
///    or [`ReconciliationLoop::new()`] (targets supplied by the caller)
/// 2. Start with [`ReconciliationLoop::run()`]
/// 3. Loop runs until shutdown signal or fatal error
///
/// ## Threading
///
/// One cooperative task; ticks never overlap and domains within a tick are
/// reconciled sequentially. Targets are owned by the loop, so no locking is
/// involved.
pub struct ReconciliationLoop {
    /// Public IP resolver
    ip_resolver: Box<dyn PublicIpResolver>,

    /// DNS provider client
    client: Box<dyn DnsProviderClient>,

    /// Immutable configuration
    config: ReconciliationConfig,

    /// Managed domains, in configuration order
    targets: Vec<DomainTarget>,

    /// Number of ticks started
    tick_count: u64,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<LoopEvent>,
}

impl ReconciliationLoop {
    /// Create a loop over already-resolved targets
    ///
    /// # Returns
    ///
    /// A tuple of (loop, event_receiver) where event_receiver yields loop events
    pub fn new(
        ip_resolver: Box<dyn PublicIpResolver>,
        client: Box<dyn DnsProviderClient>,
        config: ReconciliationConfig,
        targets: Vec<DomainTarget>,
    ) -> (Self, mpsc::Receiver<LoopEvent>) {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let reconciliation = Self {
            ip_resolver,
            client,
            config,
            targets,
            tick_count: 0,
            event_tx: tx,
        };

        (reconciliation, rx)
    }

    /// Resolve every configured domain, then create the loop
    ///
    /// # Returns
    ///
    /// - `Err(Error::Auth)` / `Err(Error::Network)`: Resolution failed fatally
    pub async fn bootstrap(
        ip_resolver: Box<dyn PublicIpResolver>,
        client: Box<dyn DnsProviderClient>,
        config: ReconciliationConfig,
    ) -> Result<(Self, mpsc::Receiver<LoopEvent>)> {
        let targets = resolver::resolve(&config, client.as_ref()).await?;

        if targets.is_empty() {
            warn!("None of the configured domains has an A record; only the public IP will be checked");
        }

        Ok(Self::new(ip_resolver, client, config, targets))
    }

    /// Current state of every managed domain
    pub fn targets(&self) -> &[DomainTarget] {
        &self.targets
    }

    /// Number of ticks started so far
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Run the loop until Ctrl-C or a fatal error
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Clean shutdown
    /// - `Err(Error)`: Fatal error (authentication)
    pub async fn run(&mut self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Run the loop until `shutdown_rx` fires (or Ctrl-C when `None`)
    ///
    /// The daemon wires SIGTERM/SIGINT into the channel; tests use it for
    /// deterministic shutdown.
    pub async fn run_with_shutdown(
        &mut self,
        shutdown_rx: Option<oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }

    async fn run_internal(&mut self, shutdown_rx: Option<oneshot::Receiver<()>>) -> Result<()> {
        let ip_resolver = self.ip_resolver.resolver_name();
        let provider = self.client.provider_name();
        self.emit_event(LoopEvent::Started {
            active_domains: self.targets.iter().filter(|t| t.is_active()).count(),
            ip_resolver,
            provider,
        });
        info!(
            "Reconciliation loop started: {} domain(s) via {} / {}, checking every {}s",
            self.targets.len(),
            ip_resolver,
            provider,
            self.config.check_interval_secs()
        );

        let shutdown = async move {
            match shutdown_rx {
                // A dropped sender counts as shutdown
                Some(rx) => {
                    let _ = rx.await;
                }
                None => {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        error!("Failed to listen for Ctrl-C: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            }
        };
        tokio::pin!(shutdown);

        loop {
            // Resolving → Comparing → Updating
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    self.stop("Shutdown signal");
                    return Ok(());
                }

                result = self.tick() => {
                    if let Err(e) = result {
                        error!("Fatal error, stopping reconciliation: {}", e);
                        self.stop(&e.to_string());
                        return Err(e);
                    }
                }
            }

            // Sleeping
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    self.stop("Shutdown signal");
                    return Ok(());
                }

                _ = tokio::time::sleep(self.config.check_interval()) => {}
            }
        }
    }

    /// Run a single tick
    ///
    /// Transient failures are absorbed into the summary; only fatal errors
    /// are returned.
    pub async fn tick(&mut self) -> Result<TickSummary> {
        self.tick_count += 1;
        let tick = self.tick_count;
        self.emit_event(LoopEvent::TickStarted { tick });

        let mut summary = TickSummary::default();

        let ip = match self.ip_resolver.current_ipv4().await {
            Ok(ip) => ip,
            Err(e) => {
                error!(
                    "Tick {}: could not retrieve public IP from {} ({}), skipping update",
                    tick,
                    self.ip_resolver.resolver_name(),
                    e
                );
                self.emit_event(LoopEvent::IpCheckFailed { error: e.to_string() });
                summary.inactive = self.targets.iter().filter(|t| !t.is_active()).count();
                return Ok(summary);
            }
        };
        summary.ip = Some(ip);
        debug!("Tick {}: public IP {}", tick, ip);
        self.emit_event(LoopEvent::IpResolved { ip });

        let client = self.client.as_ref();
        let config = &self.config;
        let events = &self.event_tx;

        for target in self.targets.iter_mut() {
            if !target.is_active() && resolver::reresolve(config, client, target).await? {
                send_event(events, LoopEvent::RecordReresolved { domain: target.name.clone() });
            }

            match reconcile_target(config, client, events, target, ip).await? {
                Outcome::Updated => summary.updated += 1,
                Outcome::Unchanged => summary.unchanged += 1,
                Outcome::Failed => summary.failed += 1,
                Outcome::Inactive => summary.inactive += 1,
            }
        }

        info!(
            "Tick {}: public IP {} | {} updated, {} unchanged, {} failed, {} inactive",
            tick, ip, summary.updated, summary.unchanged, summary.failed, summary.inactive
        );

        Ok(summary)
    }

    fn stop(&self, reason: &str) {
        info!("Reconciliation loop stopped: {}", reason);
        self.emit_event(LoopEvent::Stopped {
            reason: reason.to_string(),
        });
    }

    /// Emit a loop event
    fn emit_event(&self, event: LoopEvent) {
        send_event(&self.event_tx, event);
    }
}

/// Bring one target in line with `ip`
///
/// Only an authentication failure is returned as `Err`.
async fn reconcile_target(
    config: &ReconciliationConfig,
    client: &dyn DnsProviderClient,
    events: &mpsc::Sender<LoopEvent>,
    target: &mut DomainTarget,
    ip: Ipv4Addr,
) -> Result<Outcome> {
    let Some(record_id) = target.record_id.clone() else {
        return Ok(Outcome::Inactive);
    };

    if !target.needs_check(ip) {
        info!("{}: IP has not changed ({})", target.name, ip);
        send_event(events, LoopEvent::RecordUnchanged {
            domain: target.name.clone(),
            current_ip: ip,
        });
        return Ok(Outcome::Unchanged);
    }

    // First contact: ask the provider what it holds before writing
    let mut previous_ip = target.last_known_ip;
    if previous_ip.is_none() {
        match client.get_record_value(config.zone_id(), &record_id).await {
            Ok(current) if current == ip => {
                info!("{}: provider already holds {}", target.name, ip);
                target.mark_current(ip);
                send_event(events, LoopEvent::RecordUnchanged {
                    domain: target.name.clone(),
                    current_ip: ip,
                });
                return Ok(Outcome::Unchanged);
            }
            Ok(current) => previous_ip = Some(current),
            Err(e) => return handle_failure(events, target, e),
        }
    }

    match client
        .update_record(config.zone_id(), &record_id, &target.name, ip)
        .await
    {
        Ok(()) => {
            match previous_ip {
                Some(previous) => info!("{}: updated from {} to {}", target.name, previous, ip),
                None => info!("{}: updated to {}", target.name, ip),
            }
            target.mark_current(ip);
            send_event(events, LoopEvent::RecordUpdated {
                domain: target.name.clone(),
                previous_ip,
                new_ip: ip,
            });
            Ok(Outcome::Updated)
        }
        Err(e) => handle_failure(events, target, e),
    }
}

fn handle_failure(
    events: &mpsc::Sender<LoopEvent>,
    target: &mut DomainTarget,
    error: Error,
) -> Result<Outcome> {
    match error {
        Error::NotFound(msg) => {
            warn!(
                "{}: record no longer exists ({}), will re-resolve next tick",
                target.name, msg
            );
            target.invalidate();
            send_event(events, LoopEvent::RecordInvalidated {
                domain: target.name.clone(),
            });
            Ok(Outcome::Inactive)
        }
        e if e.is_fatal() => {
            error!("{}: {}", target.name, e);
            Err(e)
        }
        e => {
            warn!("{}: update failed, retrying next tick: {}", target.name, e);
            send_event(events, LoopEvent::UpdateFailed {
                domain: target.name.clone(),
                error: e.to_string(),
            });
            Ok(Outcome::Failed)
        }
    }
}

fn send_event(events: &mpsc::Sender<LoopEvent>, event: LoopEvent) {
    match events.try_send(event) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(_)) => {
            warn!("Event channel full, dropping event");
        }
        // Nobody is listening
        Err(mpsc::error::TrySendError::Closed(_)) => {}
    }
}
