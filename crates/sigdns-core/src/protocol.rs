//! Signed-request authentication protocol
//!
//! Both components share this module: the signer produces a
//! [`SignedRequest`] over the current time, the verifier recomputes the
//! expected signature and enforces the freshness window.
//!
//! The scheme is HMAC-SHA256 over the decimal millisecond timestamp,
//! rendered as lowercase hex. Possession of the shared secret is proven
//! without ever transmitting it; the timestamp bounds how long a captured
//! request stays replayable.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{Error, Result};

/// Header carrying the hex-encoded HMAC-SHA256 signature
pub const SIGNATURE_HEADER: &str = "X-Signature";

/// Header carrying the decimal millisecond timestamp that was signed
pub const TIMESTAMP_HEADER: &str = "X-Timestamp";

/// Maximum accepted |now - timestamp| in milliseconds (5 minutes)
pub const FRESHNESS_WINDOW_MS: i64 = 300_000;

type HmacSha256 = Hmac<Sha256>;

/// Current Unix time in milliseconds
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Sign a timestamp with HMAC-SHA256, returning a lowercase hex signature
pub fn sign(secret: &[u8], timestamp: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|_| Error::config("invalid HMAC key"))?;
    mac.update(timestamp.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify a presented signature against the expected HMAC for `timestamp`
///
/// The comparison is constant-time so the expected value cannot be probed
/// byte by byte through response timing.
pub fn verify(secret: &[u8], timestamp: &str, signature: &str) -> Result<()> {
    let expected = sign(secret, timestamp)?;
    if bool::from(expected.as_bytes().ct_eq(signature.as_bytes())) {
        Ok(())
    } else {
        Err(Error::InvalidSignature)
    }
}

/// Enforce the freshness window around `now_ms`
///
/// A drift of exactly [`FRESHNESS_WINDOW_MS`] is still accepted; only a
/// strictly larger drift fails.
pub fn check_freshness(timestamp: &str, now_ms: i64) -> Result<()> {
    let ts: i64 = timestamp
        .parse()
        .map_err(|_| Error::invalid_timestamp(timestamp))?;

    if (now_ms - ts).abs() > FRESHNESS_WINDOW_MS {
        return Err(Error::TimestampExpired);
    }

    Ok(())
}

/// A timestamp plus the signature proving possession of the shared secret
///
/// Produced once per signer invocation, consumed exactly once by the
/// verifier, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    /// Decimal milliseconds since the Unix epoch
    pub timestamp: String,

    /// Lowercase hex HMAC-SHA256 over the timestamp
    pub signature: String,
}

impl SignedRequest {
    /// Sign the given timestamp
    pub fn over(secret: &[u8], timestamp: impl Into<String>) -> Result<Self> {
        let timestamp = timestamp.into();
        let signature = sign(secret, &timestamp)?;
        Ok(Self {
            timestamp,
            signature,
        })
    }

    /// Sign the current time
    pub fn over_current_time(secret: &[u8]) -> Result<Self> {
        Self::over(secret, now_ms().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"topsecret";
    const TIMESTAMP: &str = "1700000000000";

    #[test]
    fn signing_is_deterministic() {
        let first = sign(SECRET, TIMESTAMP).unwrap();
        let second = sign(SECRET, TIMESTAMP).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn known_signature_for_fixed_inputs() {
        assert_eq!(
            sign(SECRET, TIMESTAMP).unwrap(),
            "fa1ef37d34fe02d2c4e31dc9f25dc797312f4c2511e38f06c013ff1a44e05096"
        );
    }

    #[test]
    fn signature_is_lowercase_hex() {
        let sig = sign(SECRET, TIMESTAMP).unwrap();
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn verify_accepts_matching_signature() {
        let sig = sign(SECRET, TIMESTAMP).unwrap();
        assert!(verify(SECRET, TIMESTAMP, &sig).is_ok());
    }

    #[test]
    fn verify_rejects_flipped_character() {
        let sig = sign(SECRET, TIMESTAMP).unwrap();
        let mut bytes = sig.into_bytes();
        bytes[0] = if bytes[0] == b'0' { b'1' } else { b'0' };
        let flipped = String::from_utf8(bytes).unwrap();

        assert!(matches!(
            verify(SECRET, TIMESTAMP, &flipped),
            Err(Error::InvalidSignature)
        ));
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let sig = sign(b"othersecret", TIMESTAMP).unwrap();
        assert!(matches!(
            verify(SECRET, TIMESTAMP, &sig),
            Err(Error::InvalidSignature)
        ));
    }

    #[test]
    fn verify_rejects_empty_signature() {
        assert!(matches!(
            verify(SECRET, TIMESTAMP, ""),
            Err(Error::InvalidSignature)
        ));
    }

    #[test]
    fn freshness_accepts_drift_inside_window() {
        assert!(check_freshness("1700000000000", 1_700_000_000_000 + 299_999).is_ok());
        assert!(check_freshness("1700000000000", 1_700_000_000_000 - 299_999).is_ok());
    }

    #[test]
    fn freshness_boundary_is_inclusive() {
        // drift of exactly the window still passes
        assert!(check_freshness("1700000000000", 1_700_000_000_000 + FRESHNESS_WINDOW_MS).is_ok());
    }

    #[test]
    fn freshness_rejects_drift_beyond_window() {
        assert!(matches!(
            check_freshness("1700000000000", 1_700_000_000_000 + FRESHNESS_WINDOW_MS + 1),
            Err(Error::TimestampExpired)
        ));
        // a timestamp from the future is just as stale
        assert!(matches!(
            check_freshness("1700000000000", 1_700_000_000_000 - FRESHNESS_WINDOW_MS - 1),
            Err(Error::TimestampExpired)
        ));
    }

    #[test]
    fn freshness_rejects_unparseable_timestamp() {
        assert!(matches!(
            check_freshness("not-a-number", 1_700_000_000_000),
            Err(Error::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn signed_request_over_current_time_verifies() {
        let request = SignedRequest::over_current_time(SECRET).unwrap();
        assert!(verify(SECRET, &request.timestamp, &request.signature).is_ok());
        assert!(check_freshness(&request.timestamp, now_ms()).is_ok());
    }
}
