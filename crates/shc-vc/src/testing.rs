//! Health card fixtures for tests.
//!
//! Builds claims documents shaped like the published SMART Health Card
//! examples and mints signed, DEFLATE-compressed tokens from them.

use std::io::Write;

use flate2::write::DeflateEncoder;
use flate2::Compression;
use serde_json::{json, Value};
use shc_core::{CompactToken, NUMERIC_OFFSET, SHC_SCHEME_PREFIX};
use shc_crypto::testing::TestSigner;

const DOSES: [(&str, &str); 2] = [("2021-01-01", "0000002"), ("2021-01-29", "0000007")];

/// A health card claims document for `issuer` with `doses` immunizations.
///
/// Doses beyond the two in the published example reuse the second date.
pub fn sample_claims(issuer: &str, doses: usize) -> Value {
    let mut entries = vec![json!({
        "fullUrl": "resource:0",
        "resource": {
            "resourceType": "Patient",
            "name": [{"family": "Anyperson", "given": ["John", "B."]}],
            "birthDate": "1951-01-20"
        }
    })];
    for n in 0..doses {
        let (date, lot) = DOSES[n.min(DOSES.len() - 1)];
        entries.push(json!({
            "fullUrl": format!("resource:{}", n + 1),
            "resource": {
                "resourceType": "Immunization",
                "status": "completed",
                "vaccineCode": {
                    "coding": [{"system": "http://hl7.org/fhir/sid/cvx", "code": "207"}]
                },
                "patient": {"reference": "resource:0"},
                "occurrenceDateTime": date,
                "performer": [{"actor": {"display": "ABC General Hospital"}}],
                "lotNumber": lot
            }
        }));
    }

    json!({
        "iss": issuer,
        "nbf": 1620847989.837,
        "vc": {
            "type": [
                "https://smarthealth.cards#health-card",
                "https://smarthealth.cards#immunization",
                "https://smarthealth.cards#covid19"
            ],
            "credentialSubject": {
                "fhirVersion": "4.0.1",
                "fhirBundle": {
                    "resourceType": "Bundle",
                    "type": "collection",
                    "entry": entries
                }
            }
        }
    })
}

/// Raw DEFLATE compression, as issuers apply to the payload.
pub fn deflate_raw(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
    encoder
        .write_all(bytes)
        .expect("writing to a Vec cannot fail");
    encoder.finish().expect("writing to a Vec cannot fail")
}

/// Compress `claims` and sign it as a health card.
pub fn signed_card(signer: &TestSigner, claims: &Value) -> CompactToken {
    signer.sign_shc(&deflate_raw(claims.to_string().as_bytes()))
}

/// The numeric QR text for `token`, with the `shc:/` prefix.
pub fn numeric_qr_text(token: &CompactToken) -> String {
    let mut text = String::from(SHC_SCHEME_PREFIX);
    for byte in token.as_str().bytes() {
        text.push_str(&format!("{:02}", byte - NUMERIC_OFFSET));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_text_decodes_back_to_token() {
        let signer = TestSigner::es256("k1", 41);
        let token = signed_card(&signer, &sample_claims("https://issuer.example", 1));
        let text = numeric_qr_text(&token);
        assert!(text.starts_with("shc:/"));
        assert_eq!(CompactToken::from_numeric(&text).unwrap(), token);
    }
}
