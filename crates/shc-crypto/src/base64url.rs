//! Base64URL encoding/decoding per RFC 4648 §5, without padding.
//!
//! Every segment of a compact token, and every coordinate of a JWK, uses this
//! alphabet. Padded or standard-alphabet input is rejected.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

pub use base64::DecodeError;

/// Decode unpadded base64url text.
pub fn decode(input: &str) -> Result<Vec<u8>, DecodeError> {
    URL_SAFE_NO_PAD.decode(input)
}

/// Encode bytes as unpadded base64url text.
pub fn encode(input: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_header_segment() {
        let bytes = decode("eyJ6aXAiOiJERUYiLCJhbGciOiJFUzI1NiJ9").unwrap();
        assert_eq!(bytes, br#"{"zip":"DEF","alg":"ES256"}"#);
    }

    #[test]
    fn url_safe_characters_round_trip() {
        let bytes = [0xfb, 0xff, 0xbf];
        let text = encode(&bytes);
        assert_eq!(text, "-_-_");
        assert_eq!(decode(&text).unwrap(), bytes);
    }

    #[test]
    fn rejects_padding_and_standard_alphabet() {
        assert!(decode("YQ==").is_err());
        assert!(decode("+/+/").is_err());
        assert!(decode("YQ").is_ok());
    }
}
