//! # shc-cli -- SMART Health Card Reader
//!
//! Provides the `shc` command-line interface:
//!
//! ```bash
//! shc ./smart-health-card.png
//! shc card.png --jwks issuer-keys.json
//! shc card.png --allow-http-issuer -vv
//! ```
//!
//! Progress and the extracted record go to stdout as labeled lines;
//! diagnostics go to stderr through `tracing`. The exit code identifies the
//! failure kind (see [`shc_core::FailureKind::exit_code`]).

pub mod decode;
pub mod image;
pub mod pipeline;
