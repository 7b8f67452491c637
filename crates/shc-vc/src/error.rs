//! # Credential Error Types

use shc_core::{FailureKind, TokenError};
use shc_crypto::CryptoError;
use thiserror::Error;

/// Errors from decoding, verifying and reading a health card.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VcError {
    /// The payload segment is not valid base64url.
    #[error("payload is not valid base64url: {0}")]
    Decode(String),

    /// The payload is not a raw DEFLATE stream, exceeds the inflate limit,
    /// or the header does not declare `zip: DEF`.
    #[error("payload could not be inflated: {0}")]
    Inflate(String),

    /// The inflated payload is not UTF-8 JSON with the health card shape.
    #[error("claims could not be parsed: {0}")]
    Parse(String),

    /// A resource lacks a member needed to build a record.
    #[error("{resource} resource has no {field}")]
    MissingField {
        /// FHIR resource type.
        resource: &'static str,
        /// Missing member.
        field: &'static str,
    },

    /// The bundle does not start with a Patient resource.
    #[error("missing patient record: {0}")]
    MissingPatientRecord(String),

    /// Keystore lookup or signature verification failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// The token could not be split into its segments.
    #[error(transparent)]
    Token(#[from] TokenError),
}

impl VcError {
    /// The failure kind this error maps to.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Decode(_) => FailureKind::Decode,
            Self::Inflate(_) => FailureKind::Inflate,
            Self::Parse(_) | Self::MissingField { .. } => FailureKind::Parse,
            Self::MissingPatientRecord(_) => FailureKind::MissingPatientRecord,
            Self::Crypto(e) => e.kind(),
            Self::Token(e) => e.kind(),
        }
    }
}
