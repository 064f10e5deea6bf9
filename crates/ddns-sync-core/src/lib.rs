// # ddns-sync-core
//
// Core library for the DDNS reconciliation daemon.
//
// ## Architecture Overview
//
// This library keeps provider-side A records in sync with the host's
// public IPv4 address:
// - **ConfigSource**: Loads and validates a `ReconciliationConfig`
// - **PublicIpResolver**: Trait for discovering the current public IP
// - **DnsProviderClient**: Trait for finding, reading and updating records
// - **resolver**: Maps configured domain names to provider record IDs
// - **ReconciliationLoop**: Tick loop that updates only what changed
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from HTTP clients
// 2. **Explicit State**: Immutable config plus loop-owned targets, no globals
// 3. **Failure Taxonomy**: Fatal vs transient vs per-domain errors
// 4. **Library-First**: The daemon is a thin wiring layer
// 5. **Idempotency**: No provider write when the known value already matches

pub mod traits;
pub mod engine;
pub mod resolver;
pub mod target;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{PublicIpResolver, DnsProviderClient};
pub use engine::{ReconciliationLoop, LoopEvent, TickSummary};
pub use target::DomainTarget;
pub use config::{ConfigSource, EnvConfigSource, RawConfig, ReconciliationConfig};
pub use error::{Error, Result};
