//! # shc-vc -- SMART Health Card Credentials
//!
//! The credential half of the pipeline:
//!
//! - **Decode** (`decode.rs`): payload segment → base64url → raw inflate →
//!   typed [`ClaimsObject`], without any trust.
//!
//! - **Verify** (`verify.rs`): keystore + token → [`VerificationResult`]. The
//!   only constructor of [`VerifiedClaims`].
//!
//! - **Compare** (`compare.rs`): semantic equality of the unverified and
//!   verified claims.
//!
//! - **Record** (`record.rs`): patient identity and vaccination events from
//!   verified claims.
//!
//! ## Trust Model
//!
//! The unverified claims exist only to learn the issuer, whose published
//! keys decide trust. Records are extracted from verified claims alone, and
//! a card is trusted only when both decodes agree.

pub mod claims;
pub mod compare;
pub mod decode;
pub mod error;
pub mod record;
pub mod verify;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use claims::{ClaimsObject, FhirBundle, HealthCardClaims, Resource};
pub use compare::claims_match;
pub use decode::{decode_payload_segment, decode_unverified, DecodeLimits};
pub use error::VcError;
pub use record::{extract_records, HealthRecords, PatientIdentity, VaccinationEvent};
pub use verify::{verify_credential, VerificationResult, VerifiedClaims};
