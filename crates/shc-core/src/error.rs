//! # Failure Taxonomy
//!
//! Structured error types for the decode-and-verify pipeline, built with
//! `thiserror`. No `Box<dyn Error>`, no `.unwrap()` outside tests.
//!
//! Every crate in the workspace defines its own error enum, and every one of
//! them maps onto a single [`FailureKind`]. The kind is what operators see
//! first (and what the CLI turns into an exit code); the error's `Display`
//! carries the stage-specific context: which position, which segment, which
//! key id.

use std::fmt;

use thiserror::Error;

/// The kind of failure that aborted a decode run.
///
/// Each pipeline stage surfaces its own kind so a failure is never collapsed
/// into a generic error. Exit codes are stable and documented in the CLI help.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The image file could not be read or decoded into pixels.
    ImageRead,
    /// No QR code could be located or decoded in the image.
    QrNotFound,
    /// The scanned text is not a valid numeric token encoding.
    MalformedEncoding,
    /// The compact token does not have exactly three segments.
    MalformedToken,
    /// A base64url segment could not be decoded.
    Decode,
    /// The compressed payload could not be inflated.
    Inflate,
    /// The decoded text is not a well-formed claims document or header.
    Parse,
    /// The issuer's key-discovery document could not be retrieved.
    KeyFetch,
    /// A key record has an unsupported algorithm, key type, or material.
    UnsupportedKey,
    /// The key-discovery document contains no keys.
    EmptyKeySet,
    /// The token's key id is not present in the keystore.
    UnknownKeyId,
    /// The signature does not verify against the identified key.
    SignatureMismatch,
    /// The verified claims differ from the claims decoded from the scan.
    Untrusted,
    /// The health-record bundle has no patient entry.
    MissingPatientRecord,
}

impl FailureKind {
    /// Process exit code reported by the CLI for this failure kind.
    pub fn exit_code(self) -> u8 {
        match self {
            Self::ImageRead => 10,
            Self::QrNotFound => 11,
            Self::MalformedEncoding => 20,
            Self::MalformedToken => 21,
            Self::Decode => 22,
            Self::Inflate => 23,
            Self::Parse => 24,
            Self::KeyFetch => 30,
            Self::UnsupportedKey => 31,
            Self::EmptyKeySet => 32,
            Self::UnknownKeyId => 33,
            Self::SignatureMismatch => 34,
            Self::Untrusted => 35,
            Self::MissingPatientRecord => 40,
        }
    }

    /// Stable identifier used in log fields and CLI output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ImageRead => "ImageReadError",
            Self::QrNotFound => "QRNotFound",
            Self::MalformedEncoding => "MalformedEncoding",
            Self::MalformedToken => "MalformedToken",
            Self::Decode => "DecodeError",
            Self::Inflate => "InflateError",
            Self::Parse => "ParseError",
            Self::KeyFetch => "KeyFetchError",
            Self::UnsupportedKey => "UnsupportedKey",
            Self::EmptyKeySet => "EmptyKeySet",
            Self::UnknownKeyId => "UnknownKeyId",
            Self::SignatureMismatch => "SignatureMismatch",
            Self::Untrusted => "Untrusted",
            Self::MissingPatientRecord => "MissingPatientRecord",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors while turning scanned QR text into a compact token and splitting it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The numeric encoding is malformed.
    #[error("malformed numeric encoding at position {position}: {reason}")]
    MalformedEncoding {
        /// Character offset (after prefix and whitespace removal) of the defect.
        position: usize,
        /// What was wrong at that position.
        reason: String,
    },

    /// The compact token does not split into exactly three segments.
    #[error("malformed compact token: expected 3 dot-separated segments, found {segments}")]
    MalformedToken {
        /// Number of segments actually present.
        segments: usize,
    },
}

impl TokenError {
    /// The failure kind this error maps to.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::MalformedEncoding { .. } => FailureKind::MalformedEncoding,
            Self::MalformedToken { .. } => FailureKind::MalformedToken,
        }
    }
}
