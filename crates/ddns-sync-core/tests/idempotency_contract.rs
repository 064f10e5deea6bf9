//! Architectural Contract Test: Idempotency
//!
//! The provider's record content is the only durable state. Reconciling
//! the same IP again must converge without extra writes, and a restarted
//! loop must not rewrite records that are already current.
//!
//! Constraints verified:
//! - Applying the same IP twice leaves the provider in the same state
//! - A fresh loop over current records performs zero updates
//! - A changed IP is written exactly once, however many ticks follow

mod common;

use common::*;
use ddns_sync_core::{DnsProviderClient, ReconciliationLoop};

#[tokio::test]
async fn update_with_same_value_is_idempotent() {
    let provider = FakeDnsProvider::new();
    let record_id = provider.create_record("a.example.com", ip(1, 1, 1, 1));

    for _ in 0..2 {
        provider
            .update_record(ZONE, &record_id, "a.example.com", ip(2, 2, 2, 2))
            .await
            .expect("update succeeds");
        assert_eq!(provider.value_of("a.example.com"), Some(ip(2, 2, 2, 2)));
    }
}

#[tokio::test]
async fn restarted_loop_does_not_rewrite_current_records() {
    let domains = ["a.example.com", "b.example.com"];
    let provider = FakeDnsProvider::with_records(&domains, ip(1, 1, 1, 1));
    let ip_resolver = ScriptedIpResolver::fixed(ip(2, 2, 2, 2));

    // First process lifetime brings every record up to date
    {
        let (mut reconciliation, _event_rx) = ReconciliationLoop::bootstrap(
            Box::new(ip_resolver.clone()),
            Box::new(provider.clone()),
            test_config(&domains),
        )
        .await
        .expect("bootstrap succeeds");
        reconciliation.tick().await.expect("tick");
    }
    assert_eq!(provider.update_call_count(), 2);

    // Second lifetime starts with no memory of the first
    let (mut reconciliation, _event_rx) = ReconciliationLoop::bootstrap(
        Box::new(ip_resolver.clone()),
        Box::new(provider.clone()),
        test_config(&domains),
    )
    .await
    .expect("bootstrap succeeds");
    let summary = reconciliation.tick().await.expect("tick");

    assert_eq!(summary.unchanged, 2);
    assert_eq!(provider.update_call_count(), 2, "no write after restart");
}

#[tokio::test]
async fn changed_ip_is_written_exactly_once() {
    let domains = ["a.example.com"];
    let provider = FakeDnsProvider::with_records(&domains, ip(1, 1, 1, 1));
    let ip_resolver = ScriptedIpResolver::fixed(ip(1, 1, 1, 1));

    let (mut reconciliation, _event_rx) = ReconciliationLoop::bootstrap(
        Box::new(ip_resolver.clone()),
        Box::new(provider.clone()),
        test_config(&domains),
    )
    .await
    .expect("bootstrap succeeds");
    reconciliation.tick().await.expect("tick 1");

    ip_resolver.set(Ok(ip(7, 7, 7, 7)));
    for _ in 0..4 {
        reconciliation.tick().await.expect("tick");
    }

    assert_eq!(provider.update_calls(), vec![("a.example.com".to_string(), ip(7, 7, 7, 7))]);
    let target = &reconciliation.targets()[0];
    assert_eq!(target.last_known_ip, Some(ip(7, 7, 7, 7)));
    assert!(target.last_updated.is_some());
}
