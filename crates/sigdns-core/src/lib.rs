// # sigdns-core
//
// Core library for the HMAC-signed dynamic-DNS updater.
//
// ## Architecture Overview
//
// This library provides everything shared between the signer and the
// verifier daemon:
// - **protocol**: shared-secret HMAC-SHA256 signing over a millisecond
//   timestamp, plus the freshness window that bounds replays
// - **SecretStore**: trait for fetching the shared secret, fresh on every
//   invocation
// - **DnsProvider**: trait for submitting the single-record A UPSERT
// - **Verifier**: request pipeline that gates the DNS change on a
//   successful signature and freshness check
//
// ## Design Principles
//
// 1. **Injected collaborators**: secret store and DNS provider are
//    constructed explicitly and passed in, never module-level singletons
// 2. **Single-shot**: each invocation runs start-to-finish with no state
//    shared across invocations
// 3. **Verification gates mutation**: a DNS change request is only ever
//    constructed after the immediately preceding verification succeeded

pub mod config;
pub mod error;
pub mod protocol;
pub mod traits;
pub mod verifier;

// Re-export core types for convenience
pub use config::{RecordConfig, TimestampPolicy, VerifierConfig};
pub use error::{Error, Result};
pub use protocol::SignedRequest;
pub use traits::{ChangeId, DnsProvider, RecordChange, Secret, SecretStore};
pub use verifier::Verifier;
