//! Test doubles and common utilities for verifier contract tests
//!
//! The doubles count every collaborator call so tests can assert that
//! rejected requests never reach the DNS service.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use sigdns_core::config::{RecordConfig, VerifierConfig};
use sigdns_core::error::{Error, Result};
use sigdns_core::traits::{ChangeId, DnsProvider, RecordChange, Secret, SecretStore};

/// Shared secret used across the contract tests
pub const TEST_SECRET: &str = "test-secret";

/// A secret store returning a fixed value, counting fetches
pub struct FixedSecretStore {
    secret: String,
    fetch_count: AtomicUsize,
}

impl FixedSecretStore {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.to_string(),
            fetch_count: AtomicUsize::new(0),
        }
    }

    /// Number of times fetch_secret() was called
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretStore for FixedSecretStore {
    async fn fetch_secret(&self, _name: &str) -> Result<Secret> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        Ok(Secret::new(self.secret.clone()))
    }

    fn store_name(&self) -> &'static str {
        "fixed"
    }
}

/// A secret store whose backend is unreachable
pub struct FailingSecretStore;

#[async_trait]
impl SecretStore for FailingSecretStore {
    async fn fetch_secret(&self, _name: &str) -> Result<Secret> {
        Err(Error::secret_store("store offline"))
    }

    fn store_name(&self) -> &'static str {
        "failing"
    }
}

/// A DNS provider that records every change it is asked to apply
pub struct CountingDnsProvider {
    upsert_count: AtomicUsize,
    changes: Mutex<Vec<RecordChange>>,
}

impl CountingDnsProvider {
    pub fn new() -> Self {
        Self {
            upsert_count: AtomicUsize::new(0),
            changes: Mutex::new(Vec::new()),
        }
    }

    /// Number of times upsert_record() was called
    pub fn upsert_count(&self) -> usize {
        self.upsert_count.load(Ordering::SeqCst)
    }

    /// The changes that were submitted
    pub fn changes(&self) -> Vec<RecordChange> {
        self.changes.lock().unwrap().clone()
    }
}

#[async_trait]
impl DnsProvider for CountingDnsProvider {
    async fn upsert_record(&self, change: &RecordChange) -> Result<ChangeId> {
        self.upsert_count.fetch_add(1, Ordering::SeqCst);
        self.changes.lock().unwrap().push(change.clone());
        Ok(ChangeId::new("mock-change-1"))
    }

    fn provider_name(&self) -> &'static str {
        "counting"
    }
}

/// A DNS provider whose service rejects every mutation
pub struct FailingDnsProvider;

#[async_trait]
impl DnsProvider for FailingDnsProvider {
    async fn upsert_record(&self, _change: &RecordChange) -> Result<ChangeId> {
        Err(Error::dns_provider("service unavailable"))
    }

    fn provider_name(&self) -> &'static str {
        "failing"
    }
}

/// Helper to create a minimal VerifierConfig for testing
pub fn verifier_config() -> VerifierConfig {
    VerifierConfig::new("ddns-shared-secret", RecordConfig::new("home.example.com"))
}
