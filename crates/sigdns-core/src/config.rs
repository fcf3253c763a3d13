//! Configuration types for the verifier pipeline
//!
//! Environment parsing lives in the binaries; this module holds the
//! validated shapes they hand to the pipeline.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Default TTL for the managed record, in seconds
pub const DEFAULT_RECORD_TTL: u32 = 300;

/// The single A record this deployment manages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordConfig {
    /// Fully qualified record name (e.g. "home.example.com")
    pub name: String,

    /// Record TTL in seconds
    #[serde(default = "default_ttl")]
    pub ttl: u32,
}

impl RecordConfig {
    /// Create a record configuration with the default TTL
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ttl: DEFAULT_RECORD_TTL,
        }
    }

    /// Set the record TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    /// Validate the record configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        validate_domain_name(&self.name)?;

        if self.ttl == 0 {
            return Err(crate::Error::config("Record TTL must be > 0"));
        }

        Ok(())
    }
}

fn default_ttl() -> u32 {
    DEFAULT_RECORD_TTL
}

/// Policy for requests that omit the timestamp header
///
/// The legacy behavior substituted the verifier's own clock, which makes
/// the freshness check vacuous for that request: the server then checks a
/// timestamp it generated itself rather than one the signer produced.
/// `Reject` is the default; `ServerClock` restores the legacy fallback
/// for deployments that depend on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimestampPolicy {
    /// Fail requests that carry no timestamp header
    #[default]
    Reject,

    /// Substitute the verifier's current time (legacy fallback)
    ServerClock,
}

impl FromStr for TimestampPolicy {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reject" => Ok(Self::Reject),
            "server-clock" => Ok(Self::ServerClock),
            other => Err(crate::Error::config(format!(
                "Unknown timestamp policy '{}'. Valid policies: reject, server-clock",
                other
            ))),
        }
    }
}

/// Verifier pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Secret store key holding the shared secret
    pub parameter_name: String,

    /// The record to upsert on each verified request
    pub record: RecordConfig,

    /// How to treat requests without a timestamp header
    #[serde(default)]
    pub timestamp_policy: TimestampPolicy,
}

impl VerifierConfig {
    /// Create a configuration with the default timestamp policy
    pub fn new(parameter_name: impl Into<String>, record: RecordConfig) -> Self {
        Self {
            parameter_name: parameter_name.into(),
            record,
            timestamp_policy: TimestampPolicy::default(),
        }
    }

    /// Set the timestamp policy
    pub fn with_timestamp_policy(mut self, policy: TimestampPolicy) -> Self {
        self.timestamp_policy = policy;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.parameter_name.is_empty() {
            return Err(crate::Error::config("Secret parameter name cannot be empty"));
        }

        self.record.validate()
    }
}

/// Validate that a string is a plausible DNS domain name
///
/// Basic RFC 1035 shape checks; not comprehensive, but catches the common
/// misconfigurations before the first provider call.
pub fn validate_domain_name(domain: &str) -> Result<(), crate::Error> {
    if domain.is_empty() {
        return Err(crate::Error::config("Domain name cannot be empty"));
    }

    if domain.len() > 253 {
        return Err(crate::Error::config(format!(
            "Domain name too long: {} chars (max 253)",
            domain.len()
        )));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(crate::Error::config(format!(
                "Domain name has empty label: '{}'",
                domain
            )));
        }

        if label.len() > 63 {
            return Err(crate::Error::config(format!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        if !label.chars().all(|c| c.is_alphanumeric() || c == '-') {
            return Err(crate::Error::config(format!(
                "Domain label contains invalid characters. Label: '{}'",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(crate::Error::config(format!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            )));
        }
    }

    Ok(())
}
