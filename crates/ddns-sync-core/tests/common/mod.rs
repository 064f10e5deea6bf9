//! Test doubles and common utilities for contract tests
//!
//! This module provides call-counting fakes for the two trait seams. Fakes
//! are cheap handles over shared state, so a test keeps a clone for
//! assertions after boxing the original into the loop.

#![allow(dead_code)]

use ddns_sync_core::error::{Error, Result};
use ddns_sync_core::traits::{DnsProviderClient, PublicIpResolver};
use ddns_sync_core::ReconciliationConfig;
use std::collections::{HashMap, VecDeque};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const ZONE: &str = "zone-test";

/// Error kinds a fake can be told to produce (Error is not Clone)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fail {
    Auth,
    Network,
    Format,
    NotFound,
}

impl Fail {
    pub fn to_error(self, context: &str) -> Error {
        match self {
            Fail::Auth => Error::auth(format!("401 Unauthorized ({})", context)),
            Fail::Network => Error::network(format!("connection reset ({})", context)),
            Fail::Format => Error::format(format!("garbage body ({})", context)),
            Fail::NotFound => Error::not_found(context.to_string()),
        }
    }
}

/// A public IP resolver that replays scripted answers
///
/// Once the script is exhausted the last scripted answer is repeated.
#[derive(Clone)]
pub struct ScriptedIpResolver {
    script: Arc<Mutex<VecDeque<std::result::Result<Ipv4Addr, Fail>>>>,
    last: Arc<Mutex<std::result::Result<Ipv4Addr, Fail>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedIpResolver {
    /// Always answer `ip`
    pub fn fixed(ip: Ipv4Addr) -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            last: Arc::new(Mutex::new(Ok(ip))),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Answer each entry once, in order
    pub fn scripted(answers: Vec<std::result::Result<Ipv4Addr, Fail>>) -> Self {
        let resolver = Self::fixed(Ipv4Addr::UNSPECIFIED);
        resolver.script.lock().unwrap().extend(answers);
        resolver
    }

    /// Change the answer for all following calls
    pub fn set(&self, answer: std::result::Result<Ipv4Addr, Fail>) {
        self.script.lock().unwrap().clear();
        *self.last.lock().unwrap() = answer;
    }

    /// Get the number of times current_ipv4() was called
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl PublicIpResolver for ScriptedIpResolver {
    async fn current_ipv4(&self) -> Result<Ipv4Addr> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let answer = match self.script.lock().unwrap().pop_front() {
            Some(answer) => {
                *self.last.lock().unwrap() = answer;
                answer
            }
            None => *self.last.lock().unwrap(),
        };

        answer.map_err(|fail| fail.to_error("ip echo"))
    }

    fn resolver_name(&self) -> &'static str {
        "scripted"
    }
}

/// An IP resolver whose request never completes
pub struct HangingIpResolver;

#[async_trait::async_trait]
impl PublicIpResolver for HangingIpResolver {
    async fn current_ipv4(&self) -> Result<Ipv4Addr> {
        std::future::pending::<Result<Ipv4Addr>>().await
    }

    fn resolver_name(&self) -> &'static str {
        "hanging"
    }
}

#[derive(Default)]
struct ProviderState {
    /// record ID -> (name, content)
    records: HashMap<String, (String, Ipv4Addr)>,
    next_id: usize,
    find_failures: HashMap<String, VecDeque<Fail>>,
    get_failure: Option<Fail>,
    update_failure: Option<Fail>,
    find_calls: Vec<String>,
    get_calls: Vec<String>,
    /// (domain, ip) of every update call, failed or not
    update_calls: Vec<(String, Ipv4Addr)>,
}

/// An in-memory DNS provider that tracks calls
#[derive(Clone, Default)]
pub struct FakeDnsProvider {
    state: Arc<Mutex<ProviderState>>,
}

impl FakeDnsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider holding one A record per name, all with `ip`
    pub fn with_records(names: &[&str], ip: Ipv4Addr) -> Self {
        let provider = Self::new();
        for name in names {
            provider.create_record(name, ip);
        }
        provider
    }

    /// Create an A record and return its ID
    pub fn create_record(&self, name: &str, ip: Ipv4Addr) -> String {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("rec-{}", state.next_id);
        state.records.insert(id.clone(), (name.to_string(), ip));
        id
    }

    /// Delete the record(s) with this name, as if removed in the dashboard
    pub fn delete_record(&self, name: &str) {
        self.state
            .lock()
            .unwrap()
            .records
            .retain(|_, (record_name, _)| record_name != name);
    }

    /// Provider-side value of a record, by name
    pub fn value_of(&self, name: &str) -> Option<Ipv4Addr> {
        self.state
            .lock()
            .unwrap()
            .records
            .values()
            .find(|(record_name, _)| record_name == name)
            .map(|(_, ip)| *ip)
    }

    /// Fail the next `find_record` calls for `name`, one entry per call
    pub fn fail_find(&self, name: &str, failures: &[Fail]) {
        self.state
            .lock()
            .unwrap()
            .find_failures
            .entry(name.to_string())
            .or_default()
            .extend(failures.iter().copied());
    }

    /// Fail every `get_record_value` call (or stop failing with `None`)
    pub fn fail_gets(&self, failure: Option<Fail>) {
        self.state.lock().unwrap().get_failure = failure;
    }

    /// Fail every `update_record` call (or stop failing with `None`)
    pub fn fail_updates(&self, failure: Option<Fail>) {
        self.state.lock().unwrap().update_failure = failure;
    }

    pub fn find_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().find_calls.clone()
    }

    pub fn get_call_count(&self) -> usize {
        self.state.lock().unwrap().get_calls.len()
    }

    pub fn update_calls(&self) -> Vec<(String, Ipv4Addr)> {
        self.state.lock().unwrap().update_calls.clone()
    }

    pub fn update_call_count(&self) -> usize {
        self.state.lock().unwrap().update_calls.len()
    }

    /// Total number of provider calls of any kind
    pub fn total_calls(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.find_calls.len() + state.get_calls.len() + state.update_calls.len()
    }

    /// Calls of any kind that mention `name`
    pub fn calls_for(&self, name: &str) -> usize {
        let state = self.state.lock().unwrap();
        let finds = state.find_calls.iter().filter(|n| *n == name).count();
        let updates = state.update_calls.iter().filter(|(n, _)| n == name).count();
        let gets = state
            .get_calls
            .iter()
            .filter(|id| {
                state
                    .records
                    .get(*id)
                    .is_some_and(|(record_name, _)| record_name == name)
            })
            .count();
        finds + updates + gets
    }
}

#[async_trait::async_trait]
impl DnsProviderClient for FakeDnsProvider {
    async fn find_record(&self, zone_id: &str, domain_name: &str) -> Result<String> {
        assert_eq!(zone_id, ZONE, "unexpected zone");
        let mut state = self.state.lock().unwrap();
        state.find_calls.push(domain_name.to_string());

        if let Some(fail) = state
            .find_failures
            .get_mut(domain_name)
            .and_then(|queue| queue.pop_front())
        {
            return Err(fail.to_error(domain_name));
        }

        state
            .records
            .iter()
            .find(|(_, (name, _))| name == domain_name)
            .map(|(id, _)| id.clone())
            .ok_or_else(|| Error::not_found(domain_name.to_string()))
    }

    async fn get_record_value(&self, zone_id: &str, record_id: &str) -> Result<Ipv4Addr> {
        assert_eq!(zone_id, ZONE, "unexpected zone");
        let mut state = self.state.lock().unwrap();
        state.get_calls.push(record_id.to_string());

        if let Some(fail) = state.get_failure {
            return Err(fail.to_error(record_id));
        }

        state
            .records
            .get(record_id)
            .map(|(_, ip)| *ip)
            .ok_or_else(|| Error::not_found(record_id.to_string()))
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        domain_name: &str,
        new_ip: Ipv4Addr,
    ) -> Result<()> {
        assert_eq!(zone_id, ZONE, "unexpected zone");
        let mut state = self.state.lock().unwrap();
        state.update_calls.push((domain_name.to_string(), new_ip));

        if let Some(fail) = state.update_failure {
            return Err(fail.to_error(domain_name));
        }

        match state.records.get_mut(record_id) {
            Some((_, content)) => {
                *content = new_ip;
                Ok(())
            }
            None => Err(Error::not_found(record_id.to_string())),
        }
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

/// Helper to create a test configuration: 1s interval, fast lookup retries
pub fn test_config(domains: &[&str]) -> ReconciliationConfig {
    ReconciliationConfig::new(ZONE, "test-token", domains.iter().copied())
        .expect("valid config")
        .with_check_interval_secs(1)
        .expect("valid interval")
        .with_resolve_policy(3, 0)
        .expect("valid policy")
}

pub fn ip(a: u8, b: u8, c: u8, d: u8) -> Ipv4Addr {
    Ipv4Addr::new(a, b, c, d)
}
