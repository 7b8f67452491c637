//! # Decode Command
//!
//! Turns command-line arguments into a key-discovery collaborator and decode
//! limits, runs the pipeline with stdout as the output sink, and maps the
//! outcome onto a process exit code.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use shc_client::{HttpKeyDiscovery, KeyDiscovery, KeyDiscoveryConfig, StaticKeyDiscovery};
use shc_vc::decode::DEFAULT_MAX_INFLATED_BYTES;
use shc_vc::DecodeLimits;

use crate::pipeline::decode_and_verify;

/// Default image path when none is given.
pub const DEFAULT_IMAGE_PATH: &str = "./smart-health-card.png";

/// Arguments for decoding one health card image.
#[derive(Args, Debug, Clone)]
pub struct DecodeArgs {
    /// Image file containing the health card QR code (PNG or JPEG).
    #[arg(value_name = "IMAGE", default_value = DEFAULT_IMAGE_PATH)]
    pub image: PathBuf,

    /// Verify against a local JWK set instead of fetching the issuer's.
    #[arg(long, value_name = "FILE")]
    pub jwks: Option<PathBuf>,

    /// Timeout for the key-set request, in seconds.
    #[arg(long, default_value_t = shc_client::config::DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Retries on transport errors while fetching the key set.
    #[arg(long, default_value_t = shc_client::config::DEFAULT_MAX_RETRIES)]
    pub retries: u32,

    /// Accept issuers served over plain http.
    #[arg(long)]
    pub allow_http_issuer: bool,

    /// Largest inflated claims payload accepted, in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_INFLATED_BYTES)]
    pub max_payload_bytes: usize,
}

impl DecodeArgs {
    /// Key discovery configuration from the flags.
    pub fn discovery_config(&self) -> KeyDiscoveryConfig {
        KeyDiscoveryConfig {
            timeout_secs: self.timeout_secs,
            max_retries: self.retries,
            allow_insecure_http: self.allow_http_issuer,
            ..KeyDiscoveryConfig::default()
        }
    }

    pub fn limits(&self) -> DecodeLimits {
        DecodeLimits {
            max_inflated_bytes: self.max_payload_bytes,
        }
    }
}

/// Execute the decode command. Returns the process exit code.
///
/// Pipeline failures become their failure kind's exit code; only errors
/// outside the failure taxonomy (such as a closed stdout) are returned as
/// `Err`.
pub async fn run_decode(args: &DecodeArgs) -> Result<u8> {
    match &args.jwks {
        Some(path) => {
            tracing::debug!(path = %path.display(), "using local key set");
            match StaticKeyDiscovery::from_file(path) {
                Ok(discovery) => run_with(args, &discovery, &mut io::stdout()).await,
                Err(e) => Ok(report(e.kind(), &e)),
            }
        }
        None => match HttpKeyDiscovery::new(args.discovery_config()) {
            Ok(discovery) => run_with(args, &discovery, &mut io::stdout()).await,
            Err(e) => Ok(report(e.kind(), &e)),
        },
    }
}

/// Run the pipeline writing progress to `out`.
///
/// `out` is taken per write (an unlocked `Stdout` in the binary), so no lock
/// is held across the key-set fetch.
async fn run_with<D, W>(args: &DecodeArgs, discovery: &D, out: &mut W) -> Result<u8>
where
    D: KeyDiscovery,
    W: Write,
{
    let result = decode_and_verify(&args.image, discovery, &args.limits(), out).await;
    out.flush().context("failed to flush stdout")?;

    match result {
        Ok(records) => {
            tracing::info!(doses = records.vaccinations.len(), "health card verified");
            Ok(0)
        }
        Err(e) => match e.kind() {
            Some(kind) => Ok(report(kind, &e)),
            None => Err(anyhow::Error::new(e)),
        },
    }
}

fn report(kind: shc_core::FailureKind, error: &dyn std::error::Error) -> u8 {
    tracing::error!(kind = %kind, "{error}");
    kind.exit_code()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        decode: DecodeArgs,
    }

    fn parse(args: &[&str]) -> DecodeArgs {
        TestCli::try_parse_from(std::iter::once("shc").chain(args.iter().copied()))
            .unwrap()
            .decode
    }

    #[test]
    fn defaults() {
        let args = parse(&[]);
        assert_eq!(args.image, PathBuf::from("./smart-health-card.png"));
        assert!(args.jwks.is_none());
        assert_eq!(args.discovery_config(), KeyDiscoveryConfig::default());
        assert_eq!(args.limits(), DecodeLimits::default());
    }

    #[test]
    fn flags_reach_config() {
        let args = parse(&[
            "card.jpg",
            "--timeout-secs",
            "3",
            "--retries",
            "0",
            "--allow-http-issuer",
            "--max-payload-bytes",
            "2048",
        ]);
        assert_eq!(args.image, PathBuf::from("card.jpg"));
        let config = args.discovery_config();
        assert_eq!(config.timeout_secs, 3);
        assert_eq!(config.max_retries, 0);
        assert!(config.allow_insecure_http);
        assert_eq!(args.limits().max_inflated_bytes, 2048);
    }

    #[test]
    fn jwks_flag_takes_a_path() {
        let args = parse(&["--jwks", "keys.json"]);
        assert_eq!(args.jwks, Some(PathBuf::from("keys.json")));
    }

    #[test]
    fn non_numeric_timeout_is_rejected() {
        let result = TestCli::try_parse_from(["shc", "--timeout-secs", "soon"]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn missing_image_exits_with_image_read_code() {
        let dir = tempfile::tempdir().unwrap();
        let jwks = dir.path().join("jwks.json");
        std::fs::write(&jwks, br#"{"keys":[]}"#).unwrap();
        let args = parse(&[
            dir.path().join("missing.png").to_str().unwrap(),
            "--jwks",
            jwks.to_str().unwrap(),
        ]);
        assert_eq!(run_decode(&args).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn progress_goes_to_the_given_sink() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("missing.png");
        let args = parse(&[image.to_str().unwrap()]);
        let discovery = StaticKeyDiscovery::new(shc_crypto::JwkSet { keys: vec![] });

        let mut out = Vec::new();
        assert_eq!(run_with(&args, &discovery, &mut out).await.unwrap(), 10);
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("1. Reading QR image file..."), "{text}");
        assert!(!text.contains("2. Decoding QR code"));
    }

    #[tokio::test]
    async fn unreadable_jwks_file_exits_with_key_fetch_code() {
        let args = parse(&["card.png", "--jwks", "/nonexistent/jwks.json"]);
        assert_eq!(run_decode(&args).await.unwrap(), 30);
    }
}
