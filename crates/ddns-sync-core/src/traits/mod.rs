//! Core traits for the DDNS reconciliation system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`PublicIpResolver`]: Discover the current public IPv4 address
//! - [`DnsProviderClient`]: Find, read and update provider-side A records

pub mod ip_resolver;
pub mod dns_provider;

pub use ip_resolver::PublicIpResolver;
pub use dns_provider::DnsProviderClient;
