//! # JSON Web Keys
//!
//! Key records as published in an issuer's `/.well-known/jwks.json`.
//!
//! All members are optional at the serde level so that an issuer document
//! with unexpected members still parses; validation happens when the records
//! are turned into a [`KeyStore`](crate::KeyStore).

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::base64url;

/// One public-key entry of a key-discovery document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type (`EC`, `OKP`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kty: Option<String>,
    /// Key identifier referenced by the token header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    /// Intended algorithm (`ES256`, `EdDSA`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    /// Public key use; only `sig` is accepted when present.
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    /// Curve name (`P-256`, `Ed25519`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
    /// Base64url x coordinate (EC) or public key (OKP).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    /// Base64url y coordinate (EC only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    /// X.509 chain; carried through for display, never used for trust.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x5c: Option<Vec<String>>,
}

/// A key-discovery document: `{"keys": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwkSet {
    /// The published keys.
    pub keys: Vec<Jwk>,
}

impl JwkSet {
    /// Parse a key-discovery document.
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

impl Jwk {
    /// RFC 7638 thumbprint: base64url SHA-256 over the required members in
    /// lexicographic order, without whitespace.
    ///
    /// Returns `None` when the members needed for this key type are absent.
    pub fn thumbprint(&self) -> Option<String> {
        let kty = self.kty.as_deref()?;
        let crv = self.crv.as_deref()?;
        let x = self.x.as_deref()?;
        let members = match kty {
            "EC" => {
                let y = self.y.as_deref()?;
                serde_json::json!({ "crv": crv, "kty": kty, "x": x, "y": y })
            }
            "OKP" => serde_json::json!({ "crv": crv, "kty": kty, "x": x }),
            _ => return None,
        };
        // serde_json's default map is ordered by key, which is exactly the
        // member order RFC 7638 requires.
        let canonical = serde_json::to_vec(&members).ok()?;
        Some(base64url::encode(&Sha256::digest(canonical)))
    }
}
