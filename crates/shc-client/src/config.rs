//! Key discovery configuration.
//!
//! Defaults suit fetching a public issuer's key set over HTTPS. The CLI
//! overrides individual fields from its flags.

use std::time::Duration;

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Default base delay between retries (doubles each attempt).
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 200;

/// Largest key-set document accepted.
pub const DEFAULT_MAX_BODY_BYTES: usize = 512 * 1024;

/// Configuration for fetching issuer key sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDiscoveryConfig {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Retries on transport errors. HTTP status errors are never retried.
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    pub retry_base_delay_ms: u64,
    /// Accept `http://` issuers. Off by default.
    pub allow_insecure_http: bool,
    /// Response body limit in bytes.
    pub max_body_bytes: usize,
}

impl Default for KeyDiscoveryConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            allow_insecure_http: false,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl KeyDiscoveryConfig {
    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Delay before the first retry.
    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = KeyDiscoveryConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.retry_base_delay(), Duration::from_millis(200));
        assert!(!config.allow_insecure_http);
        assert_eq!(config.max_body_bytes, 524_288);
    }
}
