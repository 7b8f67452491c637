//! # Verification keystore
//!
//! Turns the key records of an issuer's key-discovery document into an
//! in-memory map from key id to a parsed verification key. The store is built
//! once per verification attempt and never persisted.
//!
//! ## Supported keys
//!
//! | `kty` | `crv`     | `alg`   |
//! |-------|-----------|---------|
//! | `EC`  | `P-256`   | `ES256` |
//! | `OKP` | `Ed25519` | `EdDSA` |
//!
//! `ES256` is the algorithm SMART Health Card issuers use. A record without
//! `alg` is accepted when its key type and curve identify the algorithm
//! unambiguously. Any other record aborts construction with
//! [`CryptoError::UnsupportedKey`].

use std::collections::BTreeMap;
use std::fmt;

use p256::ecdsa::signature::Verifier;

use crate::base64url;
use crate::error::CryptoError;
use crate::jwk::Jwk;

/// Signature algorithms a keystore can verify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JwsAlgorithm {
    /// ECDSA over P-256 with SHA-256, raw `r || s` signatures.
    Es256,
    /// Ed25519.
    EdDsa,
}

impl JwsAlgorithm {
    /// Parse a JOSE `alg` value.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ES256" => Some(Self::Es256),
            "EdDSA" => Some(Self::EdDsa),
            _ => None,
        }
    }

    /// The JOSE `alg` value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Es256 => "ES256",
            Self::EdDsa => "EdDSA",
        }
    }
}

impl fmt::Display for JwsAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed public key ready for signature verification.
#[derive(Debug, Clone)]
pub enum VerificationKey {
    /// P-256 ECDSA key.
    Es256(p256::ecdsa::VerifyingKey),
    /// Ed25519 key.
    EdDsa(ed25519_dalek::VerifyingKey),
}

impl VerificationKey {
    /// The algorithm this key verifies.
    pub fn algorithm(&self) -> JwsAlgorithm {
        match self {
            Self::Es256(_) => JwsAlgorithm::Es256,
            Self::EdDsa(_) => JwsAlgorithm::EdDsa,
        }
    }

    /// Verify `signature` over `message`.
    ///
    /// ES256 signatures are the 64-byte `r || s` concatenation defined by
    /// RFC 7518, not DER.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), String> {
        match self {
            Self::Es256(key) => {
                let sig = p256::ecdsa::Signature::from_slice(signature)
                    .map_err(|_| format!("ES256 signature must be 64 bytes, got {}", signature.len()))?;
                key.verify(message, &sig)
                    .map_err(|_| "ES256 signature does not verify".to_string())
            }
            Self::EdDsa(key) => {
                let sig = ed25519_dalek::Signature::from_slice(signature)
                    .map_err(|_| format!("EdDSA signature must be 64 bytes, got {}", signature.len()))?;
                key.verify_strict(message, &sig)
                    .map_err(|_| "EdDSA signature does not verify".to_string())
            }
        }
    }
}

/// Key id → verification key.
#[derive(Debug, Clone)]
pub struct KeyStore {
    keys: BTreeMap<String, VerificationKey>,
}

impl KeyStore {
    /// Build a keystore from key-discovery records.
    ///
    /// Fails with [`CryptoError::EmptyKeySet`] on an empty input and with
    /// [`CryptoError::UnsupportedKey`] on the first record that cannot be
    /// used. A key id that differs from the key's RFC 7638 thumbprint is
    /// logged but accepted.
    pub fn build(records: &[Jwk]) -> Result<Self, CryptoError> {
        if records.is_empty() {
            return Err(CryptoError::EmptyKeySet);
        }

        let mut keys = BTreeMap::new();
        for record in records {
            let kid = record
                .kid
                .as_deref()
                .filter(|k| !k.is_empty())
                .ok_or_else(|| CryptoError::unsupported(None, "key record has no kid"))?;

            let key = parse_record(kid, record)?;

            match record.thumbprint() {
                Some(thumbprint) if thumbprint != kid => {
                    tracing::warn!(kid, %thumbprint, "key id is not the RFC 7638 thumbprint of its key");
                }
                _ => {}
            }

            if keys.insert(kid.to_string(), key).is_some() {
                return Err(CryptoError::unsupported(Some(kid), "duplicate kid in key set"));
            }
            tracing::debug!(kid, alg = %keys[kid].algorithm(), "added verification key");
        }

        Ok(Self { keys })
    }

    /// Look up a key by id.
    pub fn get(&self, kid: &str) -> Option<&VerificationKey> {
        self.keys.get(kid)
    }

    /// Whether the store holds a key with this id.
    pub fn contains(&self, kid: &str) -> bool {
        self.keys.contains_key(kid)
    }

    /// All key ids, sorted.
    pub fn key_ids(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Always `false` for a successfully built store.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

fn parse_record(kid: &str, record: &Jwk) -> Result<VerificationKey, CryptoError> {
    if let Some(key_use) = record.key_use.as_deref() {
        if key_use != "sig" {
            return Err(CryptoError::unsupported(
                Some(kid),
                format!("key use {key_use:?} is not \"sig\""),
            ));
        }
    }

    let kty = record
        .kty
        .as_deref()
        .ok_or_else(|| CryptoError::unsupported(Some(kid), "missing key type (kty)"))?;
    let crv = record.crv.as_deref();

    let algorithm = match (kty, crv) {
        ("EC", Some("P-256")) => JwsAlgorithm::Es256,
        ("OKP", Some("Ed25519")) => JwsAlgorithm::EdDsa,
        (kty, crv) => {
            return Err(CryptoError::unsupported(
                Some(kid),
                format!("key type {kty} with curve {} is not supported", crv.unwrap_or("<none>")),
            ));
        }
    };

    if let Some(alg) = record.alg.as_deref() {
        if JwsAlgorithm::from_name(alg) != Some(algorithm) {
            return Err(CryptoError::unsupported(
                Some(kid),
                format!("algorithm {alg} does not match {kty}/{}", crv.unwrap_or("<none>")),
            ));
        }
    }

    let x = coordinate(kid, "x", record.x.as_deref())?;
    match algorithm {
        JwsAlgorithm::Es256 => {
            let y = coordinate(kid, "y", record.y.as_deref())?;
            let mut sec1 = Vec::with_capacity(65);
            sec1.push(0x04);
            sec1.extend_from_slice(&x);
            sec1.extend_from_slice(&y);
            p256::ecdsa::VerifyingKey::from_sec1_bytes(&sec1)
                .map(VerificationKey::Es256)
                .map_err(|_| CryptoError::unsupported(Some(kid), "x/y is not a point on P-256"))
        }
        JwsAlgorithm::EdDsa => {
            let bytes: [u8; 32] = x.as_slice().try_into().map_err(|_| {
                CryptoError::unsupported(Some(kid), format!("Ed25519 x must be 32 bytes, got {}", x.len()))
            })?;
            ed25519_dalek::VerifyingKey::from_bytes(&bytes)
                .map(VerificationKey::EdDsa)
                .map_err(|e| CryptoError::unsupported(Some(kid), format!("invalid Ed25519 key: {e}")))
        }
    }
}

/// Decode one 32-byte base64url key coordinate.
fn coordinate(kid: &str, name: &str, value: Option<&str>) -> Result<Vec<u8>, CryptoError> {
    let value =
        value.ok_or_else(|| CryptoError::unsupported(Some(kid), format!("missing {name} coordinate")))?;
    let bytes = base64url::decode(value).map_err(|e| {
        CryptoError::unsupported(Some(kid), format!("{name} coordinate is not base64url: {e}"))
    })?;
    if bytes.len() != 32 {
        return Err(CryptoError::unsupported(
            Some(kid),
            format!("{name} coordinate must be 32 bytes, got {}", bytes.len()),
        ));
    }
    Ok(bytes)
}
