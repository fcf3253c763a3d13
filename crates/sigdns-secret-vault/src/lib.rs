// # Vault Secret Store
//
// This crate provides a HashiCorp Vault backed secret store for the
// signed-update system.
//
// ## Purpose
//
// Both the signer and the verifier read the shared secret through this
// store, fresh on every invocation. There is deliberately no caching:
// rotation is owned by whoever manages the Vault entry, and a rotated
// value takes effect on the very next call.
//
// ## API Reference
//
// - KV v2 read: GET `/v1/:mount/data/:path`
// - Auth: `X-Vault-Token` header
//
// ## Security Requirements
//
// - The Vault token NEVER appears in logs or `Debug` output
// - The store MUST fail fast if the token is empty

use async_trait::async_trait;
use serde_json::Value;
use sigdns_core::traits::{Secret, SecretStore};
use sigdns_core::{Error, Result};
use std::time::Duration;

/// Default KV v2 mount point
pub const DEFAULT_MOUNT: &str = "secret";

/// Default field holding the secret value inside the KV entry
pub const DEFAULT_FIELD: &str = "value";

/// Default HTTP timeout for store reads (10 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// HashiCorp Vault KV v2 secret store
pub struct VaultSecretStore {
    /// Vault base address, e.g. "https://vault.internal:8200"
    addr: String,

    /// Vault token
    /// ⚠️ NEVER log this value
    token: String,

    /// KV v2 mount point
    mount: String,

    /// Field inside the KV entry that holds the secret
    field: String,

    /// HTTP client for store reads
    client: reqwest::Client,
}

// Custom Debug implementation that hides the token
impl std::fmt::Debug for VaultSecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultSecretStore")
            .field("addr", &self.addr)
            .field("token", &"<REDACTED>")
            .field("mount", &self.mount)
            .field("field", &self.field)
            .finish()
    }
}

impl VaultSecretStore {
    /// Create a new Vault secret store
    ///
    /// # Parameters
    ///
    /// - `addr`: Vault base address
    /// - `token`: Vault token with read access to the secret path
    pub fn new(addr: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        Self::with_timeout(addr, token, DEFAULT_HTTP_TIMEOUT)
    }

    /// Create a store with a custom request timeout
    pub fn with_timeout(
        addr: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let addr = addr.into();
        let token = token.into();

        if addr.is_empty() {
            return Err(Error::config("Vault address cannot be empty"));
        }
        if token.is_empty() {
            return Err(Error::config("Vault token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            addr,
            token,
            mount: DEFAULT_MOUNT.to_string(),
            field: DEFAULT_FIELD.to_string(),
            client,
        })
    }

    /// Use a KV v2 mount other than `secret`
    pub fn with_mount(mut self, mount: impl Into<String>) -> Self {
        self.mount = mount.into();
        self
    }

    /// Read the secret from a field other than `value`
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }
}

#[async_trait]
impl SecretStore for VaultSecretStore {
    async fn fetch_secret(&self, name: &str) -> Result<Secret> {
        let url = format!(
            "{}/v1/{}/data/{}",
            self.addr.trim_end_matches('/'),
            self.mount,
            name
        );

        tracing::debug!("Reading secret {} from Vault", name);

        let response = self
            .client
            .get(&url)
            .header("X-Vault-Token", &self.token)
            .send()
            .await
            .map_err(|e| Error::secret_store(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();

            return Err(match status.as_u16() {
                401 | 403 => Error::secret_store(format!(
                    "Authentication failed: invalid or expired Vault token. Status: {}",
                    status
                )),
                404 => Error::secret_store(format!("Secret not found: {}", name)),
                500..=599 => {
                    Error::secret_store(format!("Vault server error (transient): {}", status))
                }
                _ => Error::secret_store(format!("Read failed: {} - {}", name, status)),
            });
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| Error::secret_store(format!("Failed to parse response: {}", e)))?;

        let value = json["data"]["data"][self.field.as_str()]
            .as_str()
            .ok_or_else(|| {
                Error::secret_store(format!(
                    "Secret {} has no '{}' field in its KV data",
                    name, self.field
                ))
            })?;

        Ok(Secret::new(value))
    }

    fn store_name(&self) -> &'static str {
        "vault"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn kv2_body(field: &str, value: &str) -> Value {
        serde_json::json!({ "data": { "data": { field: value } } })
    }

    #[tokio::test]
    async fn fetches_secret_value() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/secret/data/ddns-shared-secret"))
            .and(header("X-Vault-Token", "root-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(kv2_body("value", "topsecret")))
            .mount(&server)
            .await;

        let store = VaultSecretStore::new(server.uri(), "root-token").unwrap();
        let secret = store.fetch_secret("ddns-shared-secret").await.unwrap();

        assert_eq!(secret.as_bytes(), b"topsecret");
    }

    #[tokio::test]
    async fn custom_mount_and_field() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/kv/data/ddns-shared-secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(kv2_body("shared", "hunter2")))
            .mount(&server)
            .await;

        let store = VaultSecretStore::new(server.uri(), "root-token")
            .unwrap()
            .with_mount("kv")
            .with_field("shared");
        let secret = store.fetch_secret("ddns-shared-secret").await.unwrap();

        assert_eq!(secret.as_bytes(), b"hunter2");
    }

    #[tokio::test]
    async fn missing_secret_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let store = VaultSecretStore::new(server.uri(), "root-token").unwrap();
        let err = store.fetch_secret("nope").await.unwrap_err();

        assert!(matches!(err, Error::SecretStore(_)));
        assert!(err.to_string().contains("not found"), "got '{}'", err);
    }

    #[tokio::test]
    async fn bad_token_is_an_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let store = VaultSecretStore::new(server.uri(), "stale-token").unwrap();
        let err = store.fetch_secret("ddns-shared-secret").await.unwrap_err();

        assert!(err.to_string().contains("Authentication failed"), "got '{}'", err);
    }

    #[tokio::test]
    async fn missing_field_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(kv2_body("other", "x")))
            .mount(&server)
            .await;

        let store = VaultSecretStore::new(server.uri(), "root-token").unwrap();
        let err = store.fetch_secret("ddns-shared-secret").await.unwrap_err();

        assert!(err.to_string().contains("field"), "got '{}'", err);
    }

    #[test]
    fn empty_token_is_rejected() {
        assert!(VaultSecretStore::new("http://127.0.0.1:8200", "").is_err());
        assert!(VaultSecretStore::new("", "root-token").is_err());
    }

    #[test]
    fn debug_redacts_token() {
        let store = VaultSecretStore::new("http://127.0.0.1:8200", "s.supersecret").unwrap();
        let debug = format!("{:?}", store);

        assert!(!debug.contains("supersecret"));
        assert!(debug.contains("<REDACTED>"));
    }
}
