//! # shc-client -- Issuer Key Discovery
//!
//! The only crate in the workspace that talks to the network. It resolves an
//! issuer URL to the JWK set published at `<iss>/.well-known/jwks.json`.
//!
//! ## Failure Policy
//!
//! Transport errors are retried with exponential backoff; a non-200 status,
//! an oversized body or a malformed document fails immediately. Every failure
//! is a `KeyFetchError` and ends the run.

pub mod config;
pub mod discovery;
pub mod error;
pub(crate) mod retry;

pub use config::KeyDiscoveryConfig;
pub use discovery::{jwks_url, HttpKeyDiscovery, KeyDiscovery, StaticKeyDiscovery, JWKS_PATH};
pub use error::KeyFetchError;
