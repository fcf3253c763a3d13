//! Verifier request pipeline
//!
//! Decides, for each inbound request, whether it was produced by a holder
//! of the shared secret within the freshness window, and performs the
//! privileged DNS mutation only if so.
//!
//! ## Request Flow
//!
//! ```text
//! RECEIVED → signature check → freshness check → DNS upsert → RESPONDED
//! ```
//!
//! Any failing step short-circuits straight to the response: a signature
//! mismatch answers 401, everything else 500, always as structured JSON.
//! No state survives a request; each invocation fetches the secret fresh
//! and is independent of every other.

use std::net::IpAddr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::{TimestampPolicy, VerifierConfig};
use crate::error::{Error, Result};
use crate::protocol;
use crate::traits::{ChangeId, DnsProvider, RecordChange, SecretStore};

/// An inbound update request, as extracted from the HTTP layer
#[derive(Debug, Clone)]
pub struct InboundRequest {
    /// `X-Signature` header, if present
    pub signature: Option<String>,

    /// `X-Timestamp` header, if present
    pub timestamp: Option<String>,

    /// Observed source address of the caller
    pub source_ip: IpAddr,
}

/// JSON body of a verifier response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseBody {
    /// The record was updated
    Success {
        success: bool,
        /// Address the record now points at
        ip: String,
        /// Name of the updated record
        record: String,
        /// Change-tracking identifier from the DNS service
        #[serde(rename = "changeId")]
        change_id: String,
    },

    /// The request was rejected or a collaborator failed
    Failure { success: bool, error: String },
}

/// Status code plus JSON body, ready for the HTTP layer
#[derive(Debug, Clone, PartialEq)]
pub struct VerifierResponse {
    /// HTTP status code (200, 401 or 500)
    pub status: u16,

    /// Body to serialize as JSON
    pub body: ResponseBody,
}

/// Verifier pipeline with injected collaborators
///
/// The secret store and DNS provider are constructed by the caller and
/// passed in, so tests can substitute fakes without touching process
/// globals.
pub struct Verifier {
    secrets: Arc<dyn SecretStore>,
    provider: Arc<dyn DnsProvider>,
    config: VerifierConfig,
}

impl Verifier {
    /// Create a verifier pipeline
    ///
    /// # Parameters
    ///
    /// - `secrets`: Secret store collaborator
    /// - `provider`: DNS provider collaborator
    /// - `config`: Validated pipeline configuration
    pub fn new(
        secrets: Arc<dyn SecretStore>,
        provider: Arc<dyn DnsProvider>,
        config: VerifierConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            secrets,
            provider,
            config,
        })
    }

    /// Handle one inbound request
    ///
    /// Never returns an error: every failure path is caught, logged with
    /// its detail, and converted into a structured response. Only the
    /// thrown message text reaches the caller.
    pub async fn handle(&self, request: InboundRequest) -> VerifierResponse {
        match self.process(&request).await {
            Ok(change_id) => {
                info!(
                    "Record {} updated to {} (change {})",
                    self.config.record.name, request.source_ip, change_id
                );

                VerifierResponse {
                    status: 200,
                    body: ResponseBody::Success {
                        success: true,
                        ip: request.source_ip.to_string(),
                        record: self.config.record.name.clone(),
                        change_id: change_id.to_string(),
                    },
                }
            }
            Err(e) => {
                error!("Update request failed: {}", e);

                VerifierResponse {
                    status: e.status_code(),
                    body: ResponseBody::Failure {
                        success: false,
                        error: e.to_string(),
                    },
                }
            }
        }
    }

    /// Signature check, freshness check, then the DNS upsert
    async fn process(&self, request: &InboundRequest) -> Result<ChangeId> {
        let timestamp = self.effective_timestamp(request)?;

        self.check_signature(request, &timestamp).await?;
        protocol::check_freshness(&timestamp, protocol::now_ms())?;

        self.apply_change(request.source_ip).await
    }

    /// Resolve the timestamp the signature is checked against
    fn effective_timestamp(&self, request: &InboundRequest) -> Result<String> {
        match (&request.timestamp, self.config.timestamp_policy) {
            (Some(ts), _) => Ok(ts.clone()),
            (None, TimestampPolicy::ServerClock) => {
                // Legacy fallback: the freshness check below then runs
                // against a value we generated ourselves.
                debug!("No timestamp header; substituting server clock");
                Ok(protocol::now_ms().to_string())
            }
            (None, TimestampPolicy::Reject) => {
                Err(Error::invalid_timestamp("missing timestamp header"))
            }
        }
    }

    /// Recompute the expected signature and compare
    async fn check_signature(&self, request: &InboundRequest, timestamp: &str) -> Result<()> {
        // A missing header compares as empty and fails below.
        let signature = request.signature.as_deref().unwrap_or_default();

        let secret = self
            .secrets
            .fetch_secret(&self.config.parameter_name)
            .await?;

        protocol::verify(secret.as_bytes(), timestamp, signature)
    }

    /// Build and submit the change request
    ///
    /// Only reachable after verification succeeded.
    async fn apply_change(&self, source_ip: IpAddr) -> Result<ChangeId> {
        let value = match source_ip {
            IpAddr::V4(v4) => v4,
            IpAddr::V6(v6) => {
                return Err(Error::invalid_input(format!(
                    "Cannot point an A record at IPv6 source {}",
                    v6
                )));
            }
        };

        let change = RecordChange::new(
            self.config.record.name.clone(),
            self.config.record.ttl,
            value,
        );

        debug!(
            "Submitting UPSERT to {}: {} -> {}",
            self.provider.provider_name(),
            change.record_name,
            change.value
        );

        self.provider.upsert_record(&change).await
    }
}
