//! # Cryptographic Error Types
//!
//! Structured errors for keystore construction and signature verification.
//! Each variant maps onto one [`FailureKind`] so callers never need to
//! inspect messages to decide what went wrong.

use shc_core::{FailureKind, TokenError};
use thiserror::Error;

/// Errors from key handling and compact JWS verification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// A key record is not usable: unknown algorithm or key type, missing
    /// key id, or invalid key material.
    #[error("unsupported key {kid}: {reason}")]
    UnsupportedKey {
        /// Key id of the offending record, or `<missing>`.
        kid: String,
        /// Why the record was rejected.
        reason: String,
    },

    /// The key-discovery document contained no keys.
    #[error("key set is empty")]
    EmptyKeySet,

    /// The token header names a key id that is not in the keystore.
    #[error("unknown key id: {0}")]
    UnknownKeyId(String),

    /// The token header carries no key id at all.
    #[error("token header has no kid")]
    MissingKeyId,

    /// The header algorithm differs from the algorithm of the selected key.
    #[error("algorithm mismatch for key {kid}: header declares {header_alg}, key is {key_alg}")]
    AlgorithmMismatch {
        /// Key id that was selected.
        kid: String,
        /// Algorithm in the token header.
        header_alg: String,
        /// Algorithm of the key in the keystore.
        key_alg: String,
    },

    /// The signature did not verify.
    #[error("signature mismatch for key {kid}: {reason}")]
    SignatureMismatch {
        /// Key id used for verification.
        kid: String,
        /// Detail of the failure.
        reason: String,
    },

    /// The header segment is not valid base64url.
    #[error("header segment is not valid base64url: {0}")]
    HeaderDecode(String),

    /// The header segment is not a valid JSON header.
    #[error("header segment is not a valid JWS header: {0}")]
    HeaderParse(String),

    /// The payload segment of a verified token is not valid base64url.
    #[error("payload segment is not valid base64url: {0}")]
    PayloadDecode(String),

    /// The token itself could not be split.
    #[error(transparent)]
    Token(#[from] TokenError),
}

impl CryptoError {
    /// The failure kind this error maps to.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::UnsupportedKey { .. } | Self::AlgorithmMismatch { .. } => {
                FailureKind::UnsupportedKey
            }
            Self::EmptyKeySet => FailureKind::EmptyKeySet,
            Self::UnknownKeyId(_) | Self::MissingKeyId => FailureKind::UnknownKeyId,
            Self::SignatureMismatch { .. } => FailureKind::SignatureMismatch,
            Self::HeaderDecode(_) | Self::PayloadDecode(_) => FailureKind::Decode,
            Self::HeaderParse(_) => FailureKind::Parse,
            Self::Token(e) => e.kind(),
        }
    }

    pub(crate) fn unsupported(kid: Option<&str>, reason: impl Into<String>) -> Self {
        Self::UnsupportedKey {
            kid: kid.unwrap_or("<missing>").to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_key_display() {
        let err = CryptoError::unsupported(Some("k1"), "kty RSA is not supported");
        let msg = err.to_string();
        assert!(msg.contains("k1"));
        assert!(msg.contains("RSA"));
        assert_eq!(err.kind(), FailureKind::UnsupportedKey);
    }

    #[test]
    fn unsupported_key_without_kid() {
        let err = CryptoError::unsupported(None, "missing kid");
        assert!(err.to_string().contains("<missing>"));
    }

    #[test]
    fn unknown_key_id_carries_kid() {
        let err = CryptoError::UnknownKeyId("k1".to_string());
        assert_eq!(err.to_string(), "unknown key id: k1");
        assert_eq!(err.kind(), FailureKind::UnknownKeyId);
        assert_eq!(CryptoError::MissingKeyId.kind(), FailureKind::UnknownKeyId);
    }

    #[test]
    fn kinds_cover_decode_and_parse() {
        assert_eq!(
            CryptoError::HeaderDecode("x".into()).kind(),
            FailureKind::Decode
        );
        assert_eq!(
            CryptoError::PayloadDecode("x".into()).kind(),
            FailureKind::Decode
        );
        assert_eq!(CryptoError::HeaderParse("x".into()).kind(), FailureKind::Parse);
        assert_eq!(CryptoError::EmptyKeySet.kind(), FailureKind::EmptyKeySet);
    }

    #[test]
    fn token_error_kind_passes_through() {
        let err = CryptoError::from(TokenError::MalformedToken { segments: 2 });
        assert_eq!(err.kind(), FailureKind::MalformedToken);
    }

    #[test]
    fn algorithm_mismatch_is_unsupported_key() {
        let err = CryptoError::AlgorithmMismatch {
            kid: "k1".into(),
            header_alg: "EdDSA".into(),
            key_alg: "ES256".into(),
        };
        assert_eq!(err.kind(), FailureKind::UnsupportedKey);
        assert!(err.to_string().contains("EdDSA"));
    }
}
