// # DNS Provider Trait
//
// Defines the interface for submitting the A-record UPSERT to a DNS
// service.
//
// ## Implementations
//
// - Cloudflare: `sigdns-provider-cloudflare` crate
//
// Providers are isolated, stateless, single-shot collaborators: one
// upsert per call, full error propagation, no retry or backoff of their
// own, no background tasks, no caching.

use async_trait::async_trait;
use std::fmt;
use std::net::Ipv4Addr;

/// A single A-record UPSERT derived from a verified request
///
/// Constructed only after the signature and freshness checks passed;
/// nothing else in the system is allowed to build one. Zone identity is
/// part of the provider's own configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordChange {
    /// Fully qualified record name
    pub record_name: String,

    /// Record TTL in seconds
    pub ttl: u32,

    /// Address the record should point at
    pub value: Ipv4Addr,
}

impl RecordChange {
    /// Create a change request
    pub fn new(record_name: impl Into<String>, ttl: u32, value: Ipv4Addr) -> Self {
        Self {
            record_name: record_name.into(),
            ttl,
            value,
        }
    }
}

/// Change-tracking identifier returned by the DNS service
///
/// Opaque: it represents an in-flight or completed record mutation and is
/// only ever echoed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeId(String);

impl ChangeId {
    /// Wrap a provider-issued identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trait for DNS provider implementations
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Submit an UPSERT for a single A record
    ///
    /// Create-or-update semantics: if the record exists it is updated in
    /// place, otherwise it is created. Either way the provider's
    /// change-tracking identifier is returned.
    ///
    /// # Parameters
    ///
    /// - `change`: The verified change to apply
    ///
    /// # Returns
    ///
    /// - `Ok(ChangeId)`: The service accepted the mutation
    /// - `Err(Error)`: If the service rejected it or was unreachable
    async fn upsert_record(&self, change: &RecordChange) -> crate::Result<ChangeId>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
