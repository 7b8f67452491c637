//! # Compact JWS verification
//!
//! Verifies a compact token against a [`KeyStore`] and, only on success,
//! releases the decoded payload bytes. The payload is never decoded before
//! the signature over `header.payload` has been checked.

use serde::{Deserialize, Serialize};
use shc_core::{CompactToken, TokenParts};

use crate::base64url;
use crate::error::CryptoError;
use crate::keystore::{JwsAlgorithm, KeyStore};

/// Protected header of a SMART Health Card token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwsHeader {
    /// Signature algorithm.
    pub alg: String,
    /// Key id used to select the verification key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    /// Payload compression; `DEF` for raw DEFLATE.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    /// Media type of the token, when the issuer sets one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
}

/// Decode and parse the header segment.
pub fn decode_header(parts: &TokenParts<'_>) -> Result<JwsHeader, CryptoError> {
    let bytes =
        base64url::decode(parts.header).map_err(|e| CryptoError::HeaderDecode(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| CryptoError::HeaderParse(e.to_string()))
}

/// A token whose signature has been checked.
#[derive(Debug, Clone)]
pub struct VerifiedJws {
    /// The protected header.
    pub header: JwsHeader,
    /// Key id that produced the signature.
    pub kid: String,
    /// Decoded (still compressed when `zip` is set) payload bytes.
    pub payload: Vec<u8>,
}

/// Verify `token` with the key its header names.
///
/// Every defect of the signature segment, including invalid base64url or a
/// wrong length, is reported as [`CryptoError::SignatureMismatch`].
pub fn verify_compact(store: &KeyStore, token: &CompactToken) -> Result<VerifiedJws, CryptoError> {
    let parts = token.split()?;
    let header = decode_header(&parts)?;

    let kid = header.kid.clone().ok_or(CryptoError::MissingKeyId)?;
    let key = store
        .get(&kid)
        .ok_or_else(|| CryptoError::UnknownKeyId(kid.clone()))?;

    if JwsAlgorithm::from_name(&header.alg) != Some(key.algorithm()) {
        return Err(CryptoError::AlgorithmMismatch {
            kid,
            header_alg: header.alg,
            key_alg: key.algorithm().to_string(),
        });
    }

    let signature = base64url::decode(parts.signature).map_err(|e| CryptoError::SignatureMismatch {
        kid: kid.clone(),
        reason: format!("signature segment is not base64url: {e}"),
    })?;

    key.verify(parts.signing_input().as_bytes(), &signature)
        .map_err(|reason| CryptoError::SignatureMismatch {
            kid: kid.clone(),
            reason,
        })?;
    tracing::debug!(%kid, alg = %header.alg, "signature verified");

    let payload =
        base64url::decode(parts.payload).map_err(|e| CryptoError::PayloadDecode(e.to_string()))?;

    Ok(VerifiedJws {
        header,
        kid,
        payload,
    })
}
