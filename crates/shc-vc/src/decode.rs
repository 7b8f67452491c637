//! # Claims Decoding
//!
//! Payload segment → base64url → raw DEFLATE → UTF-8 JSON → [`ClaimsObject`].
//!
//! The unverified path ([`decode_unverified`]) reads the payload straight from
//! the token so the issuer can be learned before any key is fetched. The
//! verified path reuses [`decode_compressed`] on bytes released by signature
//! verification, so both paths inflate and parse identically.

use std::io::Read;

use flate2::read::DeflateDecoder;
use shc_core::CompactToken;
use shc_crypto::base64url;

use crate::claims::ClaimsObject;
use crate::error::VcError;

/// Default ceiling on the inflated payload size.
pub const DEFAULT_MAX_INFLATED_BYTES: usize = 1024 * 1024;

/// Resource limits applied while decoding a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Largest inflated payload accepted, in bytes.
    pub max_inflated_bytes: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_inflated_bytes: DEFAULT_MAX_INFLATED_BYTES,
        }
    }
}

/// Decode the claims of `token` without checking its signature.
pub fn decode_unverified(token: &CompactToken, limits: &DecodeLimits) -> Result<ClaimsObject, VcError> {
    let parts = token.split()?;
    decode_payload_segment(parts.payload, limits)
}

/// Decode a base64url payload segment into claims.
pub fn decode_payload_segment(segment: &str, limits: &DecodeLimits) -> Result<ClaimsObject, VcError> {
    let compressed = base64url::decode(segment).map_err(|e| VcError::Decode(e.to_string()))?;
    decode_compressed(&compressed, limits)
}

/// Inflate raw DEFLATE bytes and parse the claims.
pub fn decode_compressed(compressed: &[u8], limits: &DecodeLimits) -> Result<ClaimsObject, VcError> {
    let json = inflate_raw(compressed, limits.max_inflated_bytes)?;
    tracing::debug!(
        compressed = compressed.len(),
        inflated = json.len(),
        "inflated claims payload"
    );
    ClaimsObject::from_json(&json)
}

/// Raw DEFLATE decompression (no zlib or gzip framing), capped at `limit`
/// output bytes.
pub fn inflate_raw(compressed: &[u8], limit: usize) -> Result<Vec<u8>, VcError> {
    let mut out = Vec::new();
    DeflateDecoder::new(compressed)
        .take(limit as u64 + 1)
        .read_to_end(&mut out)
        .map_err(|e| VcError::Inflate(e.to_string()))?;
    if out.len() > limit {
        return Err(VcError::Inflate(format!(
            "inflated payload exceeds {limit} bytes"
        )));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{deflate_raw, sample_claims};
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use shc_core::FailureKind;
    use std::io::Write;

    fn segment_for(value: &serde_json::Value) -> String {
        base64url::encode(&deflate_raw(value.to_string().as_bytes()))
    }

    #[test]
    fn decodes_sample_card() {
        let value = sample_claims("https://issuer.example", 2);
        let claims = decode_payload_segment(&segment_for(&value), &DecodeLimits::default()).unwrap();
        assert_eq!(claims.issuer(), "https://issuer.example");
        assert_eq!(claims.document(), &value);
        assert_eq!(claims.fhir_bundle().entry.len(), 3);
    }

    #[test]
    fn decoding_is_idempotent() {
        let segment = segment_for(&sample_claims("https://issuer.example", 1));
        let limits = DecodeLimits::default();
        let first = decode_payload_segment(&segment, &limits).unwrap();
        let second = decode_payload_segment(&segment, &limits).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn invalid_base64_is_decode_error() {
        let err = decode_payload_segment("a", &DecodeLimits::default()).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Decode);
    }

    #[test]
    fn corrupt_stream_is_inflate_error() {
        // BTYPE 11 is reserved in DEFLATE.
        let err = inflate_raw(&[0xff; 8], 1024).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Inflate);
    }

    #[test]
    fn zlib_framing_is_not_accepted_as_claims() {
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(sample_claims("https://issuer.example", 1).to_string().as_bytes())
            .unwrap();
        let framed = enc.finish().unwrap();
        assert!(decode_compressed(&framed, &DecodeLimits::default()).is_err());
    }

    #[test]
    fn oversized_payload_is_inflate_error() {
        let compressed = deflate_raw(&vec![b' '; 4096]);
        let err = inflate_raw(&compressed, 1024).unwrap_err();
        assert!(err.to_string().contains("exceeds 1024 bytes"));
        assert_eq!(inflate_raw(&compressed, 4096).unwrap().len(), 4096);
    }

    #[test]
    fn non_json_is_parse_error() {
        let segment = base64url::encode(&deflate_raw(b"not json"));
        let err = decode_payload_segment(&segment, &DecodeLimits::default()).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Parse);
    }

    #[test]
    fn unverified_decode_needs_three_segments() {
        let token = CompactToken::new("abc.def").unwrap();
        let err = decode_unverified(&token, &DecodeLimits::default()).unwrap_err();
        assert_eq!(err.kind(), FailureKind::MalformedToken);
    }
}
