// # Secret Store Trait
//
// Defines the interface for reading the shared secret from an external
// parameter store.
//
// ## Usage
//
// ```rust,ignore
// use sigdns_core::SecretStore;
//
// async fn example(store: &dyn SecretStore) -> sigdns_core::Result<()> {
//     let secret = store.fetch_secret("ddns-shared-secret").await?;
//     let _ = secret.as_bytes();
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::fmt;

use crate::error::Result;

/// An opaque shared secret
///
/// The wrapper keeps the value out of `Debug` output and log lines.
/// Callers only reach the bytes through [`Secret::as_bytes`], which is
/// what the HMAC key wants anyway.
#[derive(Clone)]
pub struct Secret(String);

impl Secret {
    /// Wrap a secret value
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw secret bytes, for use as an HMAC key
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

// Never expose the secret value
impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<REDACTED>)")
    }
}

/// Trait for secret store implementations
///
/// Both the signer and the verifier read the shared secret through this
/// trait. The secret's lifetime is managed entirely outside this system:
/// implementations must fetch on every call and must not cache, so a
/// rotated secret takes effect on the next invocation.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the current value of the named secret
    ///
    /// # Parameters
    ///
    /// - `name`: The store-specific key of the secret
    ///
    /// # Returns
    ///
    /// - `Ok(Secret)`: The current secret value
    /// - `Err(Error)`: If the store is unreachable or the key is missing
    async fn fetch_secret(&self, name: &str) -> Result<Secret>;

    /// Get the store name (for logging/debugging)
    fn store_name(&self) -> &'static str;
}
