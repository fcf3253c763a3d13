//! Core traits for the signed-update system
//!
//! This module defines the abstract interfaces for the two external
//! collaborators.
//!
//! - [`SecretStore`]: fetch the shared secret, fresh on every invocation
//! - [`DnsProvider`]: submit the A-record UPSERT for a verified request

pub mod dns_provider;
pub mod secret_store;

pub use dns_provider::{ChangeId, DnsProvider, RecordChange};
pub use secret_store::{Secret, SecretStore};
