//! # Decode-and-Verify Pipeline
//!
//! Composes the pure stages of `shc-core` and `shc-vc` with the two side
//! effects the run needs: fetching the issuer's key set and writing labeled
//! progress lines to an output sink.
//!
//! ## Stages
//!
//! 1. Read the image. 2. Decode the QR code. 3. Numeric text → compact
//! token. 4. Split the token. 5. Decode the unverified claims and learn the
//! issuer. 6. Fetch the issuer's key set. 7. Build the keystore, verify the
//! signature and compare the two decodes. 8. Extract and print the records.
//!
//! Before stage 7 only the issuer and issue time of the unverified claims
//! are printed. The card itself is printed after stage 7 reports a match, and
//! the records only once extraction has fully succeeded; any failure ends the
//! run with no patient data on the output.

use std::io::{self, Write};
use std::path::Path;

use shc_client::{KeyDiscovery, KeyFetchError};
use shc_core::{CompactToken, FailureKind, TokenError};
use shc_crypto::{CryptoError, KeyStore};
use shc_vc::{
    claims_match, decode_unverified, extract_records, verify_credential, DecodeLimits,
    HealthRecords, VcError, VerificationResult,
};
use thiserror::Error;

use crate::image::{decode_qr, read_image, ImageError};

/// A failed run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    KeyFetch(#[from] KeyFetchError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Vc(#[from] VcError),

    /// The signature verified but the verified claims differ from the
    /// claims that were decoded without verification.
    #[error("claims from issuer {issuer} do not match the verified claims")]
    Untrusted { issuer: String },

    /// Writing progress output failed.
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

impl PipelineError {
    /// The failure kind, or `None` for output errors outside the taxonomy.
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            Self::Image(e) => Some(e.kind()),
            Self::Token(e) => Some(e.kind()),
            Self::KeyFetch(e) => Some(e.kind()),
            Self::Crypto(e) => Some(e.kind()),
            Self::Vc(e) => Some(e.kind()),
            Self::Untrusted { .. } => Some(FailureKind::Untrusted),
            Self::Output(_) => None,
        }
    }
}

/// Run every stage on the image at `image_path`.
pub async fn decode_and_verify<D, W>(
    image_path: &Path,
    discovery: &D,
    limits: &DecodeLimits,
    out: &mut W,
) -> Result<HealthRecords, PipelineError>
where
    D: KeyDiscovery,
    W: Write,
{
    writeln!(out, "1. Reading QR image file... {}", image_path.display())?;
    let pixels = read_image(image_path)?;

    writeln!(out)?;
    writeln!(out, "2. Decoding QR code...")?;
    let text = decode_qr(&pixels)?;
    writeln!(out, "   QR CODE==> {text}")?;

    verify_scanned_text(&text, discovery, limits, out).await
}

/// Run stages 3 through 8 on already-scanned QR text.
pub async fn verify_scanned_text<D, W>(
    text: &str,
    discovery: &D,
    limits: &DecodeLimits,
    out: &mut W,
) -> Result<HealthRecords, PipelineError>
where
    D: KeyDiscovery,
    W: Write,
{
    writeln!(out)?;
    writeln!(out, "3. Decoding numeric QR payload...")?;
    let token = CompactToken::from_numeric(text)?;
    writeln!(out, "      JWS==> {token}")?;

    writeln!(out)?;
    writeln!(out, "4. Splitting JWS into its three parts...")?;
    let parts = token.split()?;
    writeln!(out, "   HEADER==> {}", parts.header)?;
    writeln!(out, "  PAYLOAD==> {}", parts.payload)?;
    writeln!(out, "SIGNATURE==> {}", parts.signature)?;

    writeln!(out)?;
    writeln!(out, "5. Decoding and inflating payload...")?;
    let card = decode_unverified(&token, limits)?;
    let issuer = card.issuer().to_string();
    writeln!(out, "   ISSUER==> {issuer}")?;
    if let Some(nbf) = card.claims().not_before() {
        writeln!(out, "   ISSUED==> {}", nbf.to_rfc3339())?;
    }
    tracing::info!(%issuer, "decoded unverified claims");

    writeln!(out)?;
    writeln!(out, "6. Downloading issuer keys...")?;
    let key_set = discovery.fetch_key_set(&issuer).await?;
    writeln!(
        out,
        "     JWKS==> {}",
        serde_json::to_string(&key_set).unwrap_or_default()
    )?;

    writeln!(out)?;
    writeln!(out, "7. Verifying signature...")?;
    let store = match KeyStore::build(&key_set.keys) {
        Ok(store) => store,
        Err(e) => {
            writeln!(out, " VERIFIED==> false")?;
            return Err(e.into());
        }
    };
    let verified = match verify_credential(&store, &token, limits) {
        VerificationResult::Verified(verified) => verified,
        VerificationResult::Failed(e) => {
            writeln!(out, " VERIFIED==> false")?;
            return Err(e.into());
        }
    };
    let trusted = claims_match(&card, &verified);
    writeln!(out, " VERIFIED==> {trusted}")?;
    if !trusted {
        return Err(PipelineError::Untrusted { issuer });
    }
    tracing::info!(kid = verified.kid(), "signature verified");
    writeln!(out, "     CARD==> {}", verified.claims().document())?;

    let records = extract_records(&verified)?;

    writeln!(out)?;
    writeln!(out, "8. Extracting FHIR bundle...")?;
    let bundle = &verified.claims().document()["vc"]["credentialSubject"]["fhirBundle"];
    writeln!(
        out,
        "   Bundle==> {}",
        serde_json::to_string_pretty(bundle).unwrap_or_default()
    )?;

    render_records(&records, out)?;
    Ok(records)
}

/// Print the patient and each dose.
pub fn render_records<W: Write>(records: &HealthRecords, out: &mut W) -> io::Result<()> {
    let unknown = "(unknown)";
    writeln!(out)?;
    writeln!(out, "Vaccination record---")?;
    writeln!(out, "     NAME==> {}", records.patient.display_name)?;
    writeln!(
        out,
        "BIRTHDATE==> {}",
        records.patient.birth_date.as_deref().unwrap_or(unknown)
    )?;
    for dose in &records.vaccinations {
        writeln!(out, "Dose {}:", dose.dose_number)?;
        writeln!(out, "     DATE==> {}", dose.occurrence)?;
        match &dose.vaccine_system {
            Some(system) => writeln!(out, "  VACCINE==> {} ({system})", dose.vaccine_code)?,
            None => writeln!(out, "  VACCINE==> {}", dose.vaccine_code)?,
        }
        writeln!(
            out,
            "      LOT==> {}",
            dose.lot_number.as_deref().unwrap_or(unknown)
        )?;
        if let Some(performer) = &dose.performer {
            writeln!(out, "PERFORMER==> {performer}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shc_client::StaticKeyDiscovery;
    use shc_crypto::testing::TestSigner;
    use shc_crypto::JwkSet;
    use shc_vc::testing::{numeric_qr_text, sample_claims, signed_card};

    const ISSUER: &str = "https://issuer.example";

    fn discovery_for(signer: &TestSigner) -> StaticKeyDiscovery {
        StaticKeyDiscovery::new(JwkSet {
            keys: vec![signer.jwk()],
        })
    }

    async fn run(text: &str, discovery: &StaticKeyDiscovery) -> (Result<HealthRecords, PipelineError>, String) {
        let mut out = Vec::new();
        let result = verify_scanned_text(text, discovery, &DecodeLimits::default(), &mut out).await;
        (result, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn valid_card_prints_records() {
        let signer = TestSigner::es256("k1", 51);
        let token = signed_card(&signer, &sample_claims(ISSUER, 2));
        let (result, output) = run(&numeric_qr_text(&token), &discovery_for(&signer)).await;

        let records = result.unwrap();
        assert_eq!(records.vaccinations.len(), 2);
        assert!(output.contains(" VERIFIED==> true"));
        assert!(output.contains(&format!("   ISSUER==> {ISSUER}")));
        assert!(output.contains("     NAME==> Anyperson John B."));
        assert!(output.contains("BIRTHDATE==> 1951-01-20"));
        assert!(output.contains("Dose 2:"));
        assert!(output.contains("  VACCINE==> 207 (http://hl7.org/fhir/sid/cvx)"));
        assert!(output.contains("      LOT==> 0000007"));
    }

    #[tokio::test]
    async fn wrong_keys_print_no_records() {
        let signer = TestSigner::es256("k1", 51);
        let other = TestSigner::es256("k2", 52);
        let token = signed_card(&signer, &sample_claims(ISSUER, 1));
        let (result, output) = run(&numeric_qr_text(&token), &discovery_for(&other)).await;

        let err = result.unwrap_err();
        assert_eq!(err.kind(), Some(FailureKind::UnknownKeyId));
        assert!(output.contains(" VERIFIED==> false"));
        assert!(!output.contains("Vaccination record"));
        assert!(!output.contains("Dose 1:"));
    }

    #[tokio::test]
    async fn unverified_card_is_not_printed_before_rejection() {
        let signer = TestSigner::es256("k1", 51);
        let other = TestSigner::es256("k1", 52);
        let token = signed_card(&signer, &sample_claims(ISSUER, 2));
        let (result, output) = run(&numeric_qr_text(&token), &discovery_for(&other)).await;

        assert_eq!(result.unwrap_err().kind(), Some(FailureKind::SignatureMismatch));
        assert!(output.contains(&format!("   ISSUER==> {ISSUER}")));
        assert!(!output.contains("CARD==>"));
        assert!(!output.contains("Anyperson"));
        assert!(!output.contains("0000007"));
    }

    #[tokio::test]
    async fn verified_card_is_printed_after_match() {
        let signer = TestSigner::es256("k1", 51);
        let token = signed_card(&signer, &sample_claims(ISSUER, 1));
        let (result, output) = run(&numeric_qr_text(&token), &discovery_for(&signer)).await;

        assert!(result.is_ok());
        let verified_at = output.find(" VERIFIED==> true").unwrap();
        let card_at = output.find("     CARD==> ").unwrap();
        assert!(card_at > verified_at);
    }

    #[tokio::test]
    async fn empty_key_set_is_reported() {
        let signer = TestSigner::es256("k1", 51);
        let token = signed_card(&signer, &sample_claims(ISSUER, 1));
        let discovery = StaticKeyDiscovery::new(JwkSet { keys: vec![] });
        let (result, _) = run(&numeric_qr_text(&token), &discovery).await;
        assert_eq!(result.unwrap_err().kind(), Some(FailureKind::EmptyKeySet));
    }

    #[tokio::test]
    async fn odd_digit_count_stops_before_token() {
        let signer = TestSigner::es256("k1", 51);
        let (result, output) = run("shc:/567", &discovery_for(&signer)).await;
        assert_eq!(result.unwrap_err().kind(), Some(FailureKind::MalformedEncoding));
        assert!(!output.contains("JWS==>"));
    }

    #[tokio::test]
    async fn patient_missing_prints_no_records() {
        let signer = TestSigner::es256("k1", 51);
        let mut claims = sample_claims(ISSUER, 1);
        claims["vc"]["credentialSubject"]["fhirBundle"]["entry"] = serde_json::json!([]);
        let token = signed_card(&signer, &claims);
        let (result, output) = run(&numeric_qr_text(&token), &discovery_for(&signer)).await;

        assert_eq!(result.unwrap_err().kind(), Some(FailureKind::MissingPatientRecord));
        assert!(output.contains(" VERIFIED==> true"));
        assert!(!output.contains("Vaccination record"));
    }

    #[test]
    fn render_marks_missing_optional_fields() {
        let records = HealthRecords {
            patient: shc_vc::PatientIdentity {
                display_name: "Doe Jane".into(),
                birth_date: None,
            },
            vaccinations: vec![shc_vc::VaccinationEvent {
                dose_number: 1,
                occurrence: "2021-05-01".into(),
                vaccine_code: "208".into(),
                vaccine_system: None,
                lot_number: None,
                performer: None,
            }],
        };
        let mut out = Vec::new();
        render_records(&records, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("BIRTHDATE==> (unknown)"));
        assert!(text.contains("  VACCINE==> 208\n"));
        assert!(text.contains("      LOT==> (unknown)"));
        assert!(!text.contains("PERFORMER"));
    }

    #[test]
    fn output_errors_have_no_failure_kind() {
        let err = PipelineError::from(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
        assert_eq!(err.kind(), None);
        let err = PipelineError::Untrusted {
            issuer: ISSUER.into(),
        };
        assert_eq!(err.kind(), Some(FailureKind::Untrusted));
    }
}
