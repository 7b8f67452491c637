//! Key discovery error types.

use std::path::PathBuf;

use shc_core::FailureKind;

/// Errors from fetching or loading an issuer's key set.
///
/// Every variant is a `KeyFetchError` in the failure taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum KeyFetchError {
    /// The issuer is not an absolute URL.
    #[error("invalid issuer {issuer:?}: {reason}")]
    InvalidIssuer { issuer: String, reason: String },
    /// The issuer uses plain HTTP and insecure issuers are not allowed.
    #[error("issuer {issuer} is not https (pass --allow-http-issuer to permit)")]
    InsecureIssuer { issuer: String },
    /// HTTP transport error.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The server answered with a status other than 200.
    #[error("{endpoint} returned {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// The document exceeds the configured body limit.
    #[error("{endpoint} returned more than {limit} bytes")]
    BodyTooLarge { endpoint: String, limit: usize },
    /// The document is not a JWK set.
    #[error("malformed key set from {endpoint}: {reason}")]
    Malformed { endpoint: String, reason: String },
    /// A local key-set file could not be read.
    #[error("failed to read key set {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl KeyFetchError {
    pub fn kind(&self) -> FailureKind {
        FailureKind::KeyFetch
    }
}
