//! # shc-core -- Foundational Types for the SMART Health Card Decoder
//!
//! This crate defines the types every other crate in the workspace depends
//! on. It has no internal crate dependencies.
//!
//! - [`CompactToken`] and [`TokenParts`]: the numeric QR decoding and the
//!   three-segment split of the signed token.
//! - [`FailureKind`]: the failure taxonomy. Every error type in the workspace
//!   maps onto exactly one kind, and the CLI turns kinds into exit codes.

pub mod error;
pub mod token;

pub use error::{FailureKind, TokenError};
pub use token::{CompactToken, TokenParts, NUMERIC_OFFSET, SHC_SCHEME_PREFIX};
