//! # shc-crypto -- Keys and Signatures
//!
//! Everything needed to decide whether a compact token was signed by one of
//! an issuer's published keys:
//!
//! - [`Jwk`] / [`JwkSet`]: key records as served from
//!   `<issuer>/.well-known/jwks.json`, with RFC 7638 thumbprints.
//! - [`KeyStore`]: the validated, per-run map from key id to verification
//!   key (ES256 over P-256, EdDSA over Ed25519).
//! - [`verify_compact`]: signature verification over `header.payload`,
//!   releasing the payload bytes only after the signature checks out.
//!
//! Key discovery over the network lives in `shc-client`; this crate does no
//! I/O.

pub mod base64url;
pub mod error;
pub mod jwk;
pub mod jws;
pub mod keystore;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use error::CryptoError;
pub use jwk::{Jwk, JwkSet};
pub use jws::{decode_header, verify_compact, JwsHeader, VerifiedJws};
pub use keystore::{JwsAlgorithm, KeyStore, VerificationKey};
