// # Cloudflare DNS Provider
//
// This crate provides a Cloudflare DNS provider implementation for the
// signed-update system.
//
// The provider performs a single-record A UPSERT in a configured zone:
// look the record up by name, update it in place if it exists, create it
// otherwise, and surface the record id the API returns as the
// change-tracking identifier.
//
// - Makes at most two HTTP requests per call (lookup, then PUT or POST)
// - Full error propagation to the caller; no retry or backoff of its own
// - HTTP timeout configured (30 seconds)
// - Specific error handling for HTTP status codes (403, 404, 429, 5xx)
// - No background tasks, no caching
//
// ## Security Requirements
//
// - API token NEVER appears in logs or `Debug` output
// - Provider MUST fail fast if the token is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List DNS Records: GET `/zones/:zone_id/dns_records?name=...&type=A`
// - Create DNS Record: POST `/zones/:zone_id/dns_records`
// - Update DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use serde_json::Value;
use sigdns_core::traits::{ChangeId, DnsProvider, RecordChange};
use sigdns_core::{Error, Result};
use std::time::Duration;

/// Cloudflare API base URL
const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Cloudflare DNS provider
///
/// Isolated, stateless and single-shot: one UPSERT per call, with the
/// zone fixed at construction time.
pub struct CloudflareProvider {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// The hosted zone this provider mutates
    zone_id: String,

    /// API base URL (overridable for tests)
    api_base: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("zone_id", &self.zone_id)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:DNS:Edit permissions
    /// - `zone_id`: The hosted zone to mutate
    pub fn new(api_token: impl Into<String>, zone_id: impl Into<String>) -> Result<Self> {
        let api_token = api_token.into();
        let zone_id = zone_id.into();

        if api_token.is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }
        if zone_id.is_empty() {
            return Err(Error::config("Cloudflare zone ID cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            zone_id,
            api_base: CLOUDFLARE_API_BASE.to_string(),
            client,
        })
    }

    /// Point the provider at a different API base URL
    ///
    /// Used by tests and API-compatible endpoints.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Map a non-success API response to an error
    async fn api_error(context: &str, response: reqwest::Response) -> Error {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());

        match status.as_u16() {
            401 | 403 => Error::dns_provider(format!(
                "Authentication failed: invalid API token or insufficient permissions. Status: {}",
                status
            )),
            429 => Error::dns_provider(format!(
                "Rate limit exceeded. Please retry later. Status: {}",
                status
            )),
            500..=599 => Error::dns_provider(format!(
                "Cloudflare server error (transient): {} - {}",
                status, error_text
            )),
            _ => Error::dns_provider(format!("{}: {} - {}", context, status, error_text)),
        }
    }

    /// Look up the id of an existing A record, if any
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /zones/:zone_id/dns_records?name=example.com&type=A
    /// Authorization: Bearer <token>
    /// ```
    async fn find_record_id(&self, record_name: &str) -> Result<Option<String>> {
        let url = format!(
            "{}/zones/{}/dns_records?name={}&type=A",
            self.api_base, self.zone_id, record_name
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| Error::dns_provider(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::api_error("Record lookup failed", response).await);
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| Error::dns_provider(format!("Failed to parse response: {}", e)))?;

        let records = json["result"].as_array().ok_or_else(|| {
            Error::dns_provider("Invalid response format: result is not an array")
        })?;

        match records.first() {
            Some(record) => {
                let id = record["id"].as_str().ok_or_else(|| {
                    Error::dns_provider("Invalid response format: record.id is not a string")
                })?;
                Ok(Some(id.to_string()))
            }
            None => Ok(None),
        }
    }

    /// Extract the record id from a create/update response
    fn change_id_from(json: &Value) -> Result<ChangeId> {
        let id = json["result"]["id"].as_str().ok_or_else(|| {
            Error::dns_provider("Invalid response format: result.id is not a string")
        })?;

        Ok(ChangeId::new(id))
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    /// Submit an UPSERT for a single A record
    ///
    /// # API Calls
    ///
    /// ```http
    /// # Look up the record
    /// GET /zones/:zone_id/dns_records?name=...&type=A
    ///
    /// # Update in place if it exists
    /// PUT /zones/:zone_id/dns_records/:record_id
    ///
    /// # Create it otherwise
    /// POST /zones/:zone_id/dns_records
    /// ```
    async fn upsert_record(&self, change: &RecordChange) -> Result<ChangeId> {
        tracing::info!(
            "Upserting Cloudflare DNS record: {} -> {} (ttl {})",
            change.record_name,
            change.value,
            change.ttl
        );

        let payload = serde_json::json!({
            "type": "A",
            "name": change.record_name,
            "content": change.value.to_string(),
            "ttl": change.ttl,
        });

        let response = match self.find_record_id(&change.record_name).await? {
            Some(record_id) => {
                tracing::debug!("Record exists ({}), updating in place", record_id);

                let url = format!(
                    "{}/zones/{}/dns_records/{}",
                    self.api_base, self.zone_id, record_id
                );

                self.client
                    .put(&url)
                    .bearer_auth(&self.api_token)
                    .header("Content-Type", "application/json")
                    .json(&payload)
                    .send()
                    .await
                    .map_err(|e| Error::dns_provider(format!("HTTP request failed: {}", e)))?
            }
            None => {
                tracing::debug!("Record does not exist, creating it");

                let url = format!("{}/zones/{}/dns_records", self.api_base, self.zone_id);

                self.client
                    .post(&url)
                    .bearer_auth(&self.api_token)
                    .header("Content-Type", "application/json")
                    .json(&payload)
                    .send()
                    .await
                    .map_err(|e| Error::dns_provider(format!("HTTP request failed: {}", e)))?
            }
        };

        if !response.status().is_success() {
            return Err(Self::api_error("Record upsert failed", response).await);
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| Error::dns_provider(format!("Failed to parse response: {}", e)))?;

        let change_id = Self::change_id_from(&json)?;
        tracing::info!(
            "DNS record upserted: {} -> {} (change {})",
            change.record_name,
            change.value,
            change_id
        );

        Ok(change_id)
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}
