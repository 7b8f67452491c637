//! # Issuer Key Discovery
//!
//! SMART Health Card issuers publish their verification keys at
//! `<iss>/.well-known/jwks.json`. [`KeyDiscovery`] is the seam between the
//! pipeline and wherever the key set comes from:
//!
//! - [`HttpKeyDiscovery`] fetches it with reqwest, honouring the timeout,
//!   retry and body limits of [`KeyDiscoveryConfig`].
//! - [`StaticKeyDiscovery`] serves a document loaded up front (offline use
//!   and tests).

use std::future::Future;
use std::path::Path;

use shc_crypto::JwkSet;
use url::Url;

use crate::config::KeyDiscoveryConfig;
use crate::error::KeyFetchError;
use crate::retry::retry_send;

/// Path of the key-set document below the issuer URL.
pub const JWKS_PATH: &str = ".well-known/jwks.json";

/// Most bytes of an error body read and kept in [`KeyFetchError::Status`].
const MAX_ERROR_BODY_BYTES: usize = 256;

/// Source of an issuer's published key set.
pub trait KeyDiscovery: Send + Sync {
    /// Fetch the key set published by `issuer`.
    fn fetch_key_set(&self, issuer: &str) -> impl Future<Output = Result<JwkSet, KeyFetchError>> + Send;
}

/// The key-set URL for `issuer`: trailing `/` trimmed, then
/// `/.well-known/jwks.json` appended.
///
/// Only `https` issuers are accepted unless `allow_insecure_http` is set.
pub fn jwks_url(issuer: &str, allow_insecure_http: bool) -> Result<Url, KeyFetchError> {
    let base = issuer.trim().trim_end_matches('/');
    let url = Url::parse(&format!("{base}/{JWKS_PATH}")).map_err(|e| KeyFetchError::InvalidIssuer {
        issuer: issuer.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "https" => Ok(url),
        "http" if allow_insecure_http => Ok(url),
        "http" => Err(KeyFetchError::InsecureIssuer {
            issuer: issuer.to_string(),
        }),
        other => Err(KeyFetchError::InvalidIssuer {
            issuer: issuer.to_string(),
            reason: format!("unsupported scheme {other}"),
        }),
    }
}

/// Fetches key sets over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpKeyDiscovery {
    http: reqwest::Client,
    config: KeyDiscoveryConfig,
}

impl HttpKeyDiscovery {
    pub fn new(config: KeyDiscoveryConfig) -> Result<Self, KeyFetchError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("shc-decoder/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| KeyFetchError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &KeyDiscoveryConfig {
        &self.config
    }

    async fn fetch(&self, url: Url) -> Result<JwkSet, KeyFetchError> {
        let endpoint = url.to_string();
        tracing::debug!(%endpoint, "fetching issuer key set");

        let mut resp = retry_send(self.config.max_retries, self.config.retry_base_delay(), || {
            self.http
                .get(url.clone())
                .header(reqwest::header::ACCEPT, "application/json")
                .send()
        })
        .await
        .map_err(|e| KeyFetchError::Http {
            endpoint: endpoint.clone(),
            source: e,
        })?;

        let status = resp.status();
        let limit = self.config.max_body_bytes;
        if status != reqwest::StatusCode::OK {
            let body = read_error_body(&mut resp, &endpoint, MAX_ERROR_BODY_BYTES.min(limit)).await;
            return Err(KeyFetchError::Status {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }

        if resp.content_length().is_some_and(|len| len > limit as u64) {
            return Err(KeyFetchError::BodyTooLarge { endpoint, limit });
        }

        let mut body = Vec::new();
        while let Some(chunk) = resp.chunk().await.map_err(|e| KeyFetchError::Http {
            endpoint: endpoint.clone(),
            source: e,
        })? {
            if body.len() + chunk.len() > limit {
                return Err(KeyFetchError::BodyTooLarge { endpoint, limit });
            }
            body.extend_from_slice(&chunk);
        }

        let key_set = JwkSet::from_json(&body).map_err(|e| KeyFetchError::Malformed {
            endpoint: endpoint.clone(),
            reason: e.to_string(),
        })?;
        tracing::debug!(%endpoint, keys = key_set.keys.len(), "fetched issuer key set");
        Ok(key_set)
    }
}

/// Read at most `cap` bytes of an error response. The rest of the body is
/// left unread.
async fn read_error_body(resp: &mut reqwest::Response, endpoint: &str, cap: usize) -> String {
    let mut body = Vec::new();
    while body.len() < cap {
        match resp.chunk().await {
            Ok(Some(chunk)) => {
                let take = chunk.len().min(cap - body.len());
                body.extend_from_slice(&chunk[..take]);
            }
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(%endpoint, error = %e, "failed to read error body");
                break;
            }
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}

impl KeyDiscovery for HttpKeyDiscovery {
    async fn fetch_key_set(&self, issuer: &str) -> Result<JwkSet, KeyFetchError> {
        let url = jwks_url(issuer, self.config.allow_insecure_http)?;
        self.fetch(url).await
    }
}

/// Serves one key set for every issuer.
#[derive(Debug, Clone)]
pub struct StaticKeyDiscovery {
    key_set: JwkSet,
}

impl StaticKeyDiscovery {
    pub fn new(key_set: JwkSet) -> Self {
        Self { key_set }
    }

    /// Parse a key-set document.
    pub fn from_json(bytes: &[u8]) -> Result<Self, KeyFetchError> {
        JwkSet::from_json(bytes)
            .map(Self::new)
            .map_err(|e| KeyFetchError::Malformed {
                endpoint: "<static>".into(),
                reason: e.to_string(),
            })
    }

    /// Load a key-set document from disk.
    pub fn from_file(path: &Path) -> Result<Self, KeyFetchError> {
        let bytes = std::fs::read(path).map_err(|e| KeyFetchError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        JwkSet::from_json(&bytes)
            .map(Self::new)
            .map_err(|e| KeyFetchError::Malformed {
                endpoint: path.display().to_string(),
                reason: e.to_string(),
            })
    }
}

impl KeyDiscovery for StaticKeyDiscovery {
    async fn fetch_key_set(&self, issuer: &str) -> Result<JwkSet, KeyFetchError> {
        tracing::debug!(issuer, keys = self.key_set.keys.len(), "serving static key set");
        Ok(self.key_set.clone())
    }
}
