//! # Signature-Gated Claims
//!
//! [`verify_credential`] is the only way to obtain [`VerifiedClaims`]: the
//! claims are decoded from payload bytes that `shc-crypto` released after the
//! signature over `header.payload` checked out against the keystore.
//!
//! ## Steps
//!
//! 1. Split the token and parse the protected header.
//! 2. Select the key named by `kid`.
//! 3. Verify the signature (`alg` must match the key).
//! 4. Require `zip: DEF`, then inflate and parse with the same logic as the
//!    unverified path.

use shc_core::CompactToken;
use shc_crypto::{verify_compact, JwsHeader, KeyStore};

use crate::claims::ClaimsObject;
use crate::decode::{decode_compressed, DecodeLimits};
use crate::error::VcError;

/// Claims recovered from a message whose signature verified.
#[derive(Debug, Clone)]
pub struct VerifiedClaims {
    claims: ClaimsObject,
    header: JwsHeader,
    kid: String,
}

impl VerifiedClaims {
    /// The verified claims.
    pub fn claims(&self) -> &ClaimsObject {
        &self.claims
    }

    /// The protected header of the verified token.
    pub fn header(&self) -> &JwsHeader {
        &self.header
    }

    /// Key id that verified the signature.
    pub fn kid(&self) -> &str {
        &self.kid
    }
}

/// Outcome of [`verify_credential`]. Never carries an unverified payload.
#[derive(Debug, Clone)]
pub enum VerificationResult {
    /// The signature checked out and the payload decoded.
    Verified(VerifiedClaims),
    /// Verification or decoding failed; the payload is discarded.
    Failed(VcError),
}

impl VerificationResult {
    /// True for [`VerificationResult::Verified`].
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified(_))
    }

    /// Convert into a `Result` for `?` propagation.
    pub fn into_result(self) -> Result<VerifiedClaims, VcError> {
        match self {
            Self::Verified(claims) => Ok(claims),
            Self::Failed(err) => Err(err),
        }
    }
}

/// Verify `token` against `store` and decode its claims.
pub fn verify_credential(
    store: &KeyStore,
    token: &CompactToken,
    limits: &DecodeLimits,
) -> VerificationResult {
    match verify_inner(store, token, limits) {
        Ok(verified) => {
            tracing::debug!(kid = %verified.kid, issuer = verified.claims.issuer(), "credential verified");
            VerificationResult::Verified(verified)
        }
        Err(err) => {
            tracing::debug!(kind = %err.kind(), error = %err, "credential verification failed");
            VerificationResult::Failed(err)
        }
    }
}

fn verify_inner(
    store: &KeyStore,
    token: &CompactToken,
    limits: &DecodeLimits,
) -> Result<VerifiedClaims, VcError> {
    let jws = verify_compact(store, token)?;

    match jws.header.zip.as_deref() {
        Some("DEF") => {}
        Some(other) => {
            return Err(VcError::Inflate(format!(
                "header declares zip {other:?}, expected \"DEF\""
            )))
        }
        None => {
            return Err(VcError::Inflate(
                "header does not declare zip \"DEF\"".to_string(),
            ))
        }
    }

    let claims = decode_compressed(&jws.payload, limits)?;
    Ok(VerifiedClaims {
        claims,
        header: jws.header,
        kid: jws.kid,
    })
}
