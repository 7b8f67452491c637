//! # shc CLI entry point
//!
//! Parses command-line arguments, sets up tracing on stderr, and runs the
//! decode command.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use shc_cli::decode::{run_decode, DecodeArgs};

/// Decode and verify a SMART Health Card QR code.
///
/// Reads the QR code from an image, rebuilds the signed token, fetches the
/// issuer's public keys, verifies the signature and prints the patient's
/// vaccination record.
#[derive(Parser, Debug)]
#[command(name = "shc", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(flatten)]
    decode: DecodeArgs,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "shc starting");

    match run_decode(&cli.decode).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
