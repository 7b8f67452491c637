//! # Compact token decoding and splitting
//!
//! A SMART Health Card QR code does not carry the JWS text directly. It
//! carries a numeric-mode string: every character of the compact token is
//! written as two decimal digits holding `char code - 45`. The offset maps the
//! lowest character of the token alphabet (`-`, code 45) to `00`, so the whole
//! alphabet fits in the digit pairs `00`..=`77`.
//!
//! [`CompactToken::from_numeric`] reverses that encoding and
//! [`CompactToken::split`] breaks the token into its three segments without
//! interpreting them.

use std::fmt;

use crate::error::TokenError;

/// Scheme prefix in front of the numeric payload in a SMART Health Card QR.
pub const SHC_SCHEME_PREFIX: &str = "shc:/";

/// Offset added to every two-digit group to obtain the character code.
pub const NUMERIC_OFFSET: u8 = 45;

/// Returns `true` for characters allowed in a compact token: the base64url
/// alphabet plus the segment separator.
fn is_token_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'-' || c == b'_' || c == b'.'
}

/// A compact serialized signed token: `header.payload.signature`.
///
/// Construction guarantees the text consists only of base64url characters
/// and `.`; the segment count is checked by [`CompactToken::split`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CompactToken(String);

/// The three segments of a [`CompactToken`], borrowed from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenParts<'a> {
    /// Base64url-encoded protected header.
    pub header: &'a str,
    /// Base64url-encoded payload.
    pub payload: &'a str,
    /// Base64url-encoded signature.
    pub signature: &'a str,
}

impl CompactToken {
    /// Wrap already-decoded token text, rejecting characters outside the
    /// token alphabet.
    pub fn new(text: impl Into<String>) -> Result<Self, TokenError> {
        let text = text.into();
        if let Some((position, c)) = text
            .bytes()
            .enumerate()
            .find(|(_, c)| !is_token_char(*c))
        {
            return Err(TokenError::MalformedEncoding {
                position,
                reason: format!("character {:?} is outside the token alphabet", c as char),
            });
        }
        Ok(Self(text))
    }

    /// Decode the numeric QR encoding into a compact token.
    ///
    /// An optional `shc:/` prefix is stripped and whitespace or control
    /// characters are ignored. The remaining text must be an even number of
    /// decimal digits, and every pair plus [`NUMERIC_OFFSET`] must land on a
    /// token-alphabet character. Nothing is silently truncated: an odd
    /// trailing digit is an error.
    pub fn from_numeric(scanned: &str) -> Result<Self, TokenError> {
        let body = scanned
            .trim_start()
            .strip_prefix(SHC_SCHEME_PREFIX)
            .unwrap_or(scanned);

        let mut digits = Vec::with_capacity(body.len());
        for c in body.chars() {
            if c.is_whitespace() || c.is_control() {
                continue;
            }
            if !c.is_ascii_digit() {
                return Err(TokenError::MalformedEncoding {
                    position: digits.len(),
                    reason: format!("non-digit character {c:?}"),
                });
            }
            digits.push(c as u8 - b'0');
        }

        if digits.len() % 2 != 0 {
            return Err(TokenError::MalformedEncoding {
                position: digits.len() - 1,
                reason: format!("odd number of digits ({})", digits.len()),
            });
        }

        let mut text = String::with_capacity(digits.len() / 2);
        for (pair_index, pair) in digits.chunks_exact(2).enumerate() {
            let code = pair[0] * 10 + pair[1] + NUMERIC_OFFSET;
            if !is_token_char(code) {
                return Err(TokenError::MalformedEncoding {
                    position: pair_index * 2,
                    reason: format!(
                        "digit pair {}{} decodes to code {code}, outside the token alphabet",
                        pair[0], pair[1]
                    ),
                });
            }
            text.push(code as char);
        }

        tracing::debug!(digits = digits.len(), chars = text.len(), "decoded numeric QR payload");
        Ok(Self(text))
    }

    /// Split into header, payload and signature segments.
    pub fn split(&self) -> Result<TokenParts<'_>, TokenError> {
        let mut segments = self.0.split('.');
        match (segments.next(), segments.next(), segments.next(), segments.next()) {
            (Some(header), Some(payload), Some(signature), None) => Ok(TokenParts {
                header,
                payload,
                signature,
            }),
            _ => Err(TokenError::MalformedToken {
                segments: self.0.split('.').count(),
            }),
        }
    }

    /// The token text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the token text.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl TokenParts<'_> {
    /// The exact bytes covered by the signature: `header.payload`.
    pub fn signing_input(&self) -> String {
        let mut input = String::with_capacity(self.header.len() + 1 + self.payload.len());
        input.push_str(self.header);
        input.push('.');
        input.push_str(self.payload);
        input
    }

    /// Rejoin the segments into compact form.
    pub fn join(&self) -> String {
        format!("{}.{}.{}", self.header, self.payload, self.signature)
    }
}

impl fmt::Debug for CompactToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompactToken({} chars)", self.0.len())
    }
}

impl fmt::Display for CompactToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CompactToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const FIXTURE_DIGITS: &str = "56762909524320603460292437404460312229595326546034602925407728043360291201064129335312700144620050367703";
    const FIXTURE_TOKEN: &str = "eyJ6aXAiOiJERUYiLCJhbGciOiJFUzI1NiJ9.3VJNb9s.Yk-_Qz0";

    #[test]
    fn numeric_fixture_decodes_exactly() {
        let token = CompactToken::from_numeric(FIXTURE_DIGITS).unwrap();
        assert_eq!(token.as_str(), FIXTURE_TOKEN);
    }

    #[test]
    fn scheme_prefix_is_stripped() {
        let scanned = format!("shc:/{FIXTURE_DIGITS}");
        let token = CompactToken::from_numeric(&scanned).unwrap();
        assert_eq!(token.as_str(), FIXTURE_TOKEN);
    }

    #[test]
    fn whitespace_between_pairs_is_ignored() {
        let spaced: String = FIXTURE_DIGITS
            .as_bytes()
            .chunks(2)
            .map(|p| std::str::from_utf8(p).unwrap())
            .collect::<Vec<_>>()
            .join(" ");
        assert!(spaced.starts_with("56 76 29"));
        let token = CompactToken::from_numeric(&format!("{spaced}\n")).unwrap();
        assert_eq!(token.as_str(), FIXTURE_TOKEN);
    }

    #[test]
    fn odd_length_is_rejected_not_truncated() {
        let err = CompactToken::from_numeric("56762").unwrap_err();
        assert!(matches!(err, TokenError::MalformedEncoding { position: 4, .. }));
    }

    #[test]
    fn non_digit_is_rejected() {
        let err = CompactToken::from_numeric("5676x9").unwrap_err();
        match err {
            TokenError::MalformedEncoding { position, reason } => {
                assert_eq!(position, 4);
                assert!(reason.contains("'x'"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn chunked_qr_prefix_is_rejected() {
        let err = CompactToken::from_numeric("shc:/1/2/5676").unwrap_err();
        assert!(matches!(err, TokenError::MalformedEncoding { .. }));
    }

    #[test]
    fn pair_outside_alphabet_is_rejected() {
        // 99 + 45 = 144, not ASCII.
        let err = CompactToken::from_numeric("5699").unwrap_err();
        assert!(matches!(err, TokenError::MalformedEncoding { position: 2, .. }));
        // 02 + 45 = '/', not in the base64url alphabet.
        assert!(CompactToken::from_numeric("02").is_err());
    }

    #[test]
    fn empty_input_yields_empty_token() {
        let token = CompactToken::from_numeric("").unwrap();
        assert_eq!(token.as_str(), "");
        assert!(matches!(
            token.split(),
            Err(TokenError::MalformedToken { segments: 1 })
        ));
    }

    #[test]
    fn new_rejects_padding_and_spaces() {
        assert!(CompactToken::new("abc=.def.ghi").is_err());
        assert!(CompactToken::new("abc .def.ghi").is_err());
        assert!(CompactToken::new("abc.def.ghi").is_ok());
    }

    #[test]
    fn split_yields_three_segments() {
        let token = CompactToken::new(FIXTURE_TOKEN).unwrap();
        let parts = token.split().unwrap();
        assert_eq!(parts.header, "eyJ6aXAiOiJERUYiLCJhbGciOiJFUzI1NiJ9");
        assert_eq!(parts.payload, "3VJNb9s");
        assert_eq!(parts.signature, "Yk-_Qz0");
        assert_eq!(
            parts.signing_input(),
            "eyJ6aXAiOiJERUYiLCJhbGciOiJFUzI1NiJ9.3VJNb9s"
        );
    }

    #[test]
    fn split_rejects_wrong_segment_counts() {
        for (text, count) in [("a.b", 2), ("a.b.c.d", 4), ("abc", 1), ("a.b.c.d.e", 5)] {
            let token = CompactToken::new(text).unwrap();
            assert_eq!(
                token.split().unwrap_err(),
                TokenError::MalformedToken { segments: count }
            );
        }
    }

    #[test]
    fn debug_does_not_print_token_text() {
        let token = CompactToken::new(FIXTURE_TOKEN).unwrap();
        let debug = format!("{token:?}");
        assert!(!debug.contains("eyJ"));
    }

    fn segment() -> impl Strategy<Value = String> {
        "[A-Za-z0-9_-]{0,40}"
    }

    fn token_char() -> impl Strategy<Value = char> {
        prop::sample::select(
            "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_."
                .chars()
                .collect::<Vec<_>>(),
        )
    }

    proptest! {
        #[test]
        fn split_then_join_reproduces_token(h in segment(), p in segment(), s in segment()) {
            let text = format!("{h}.{p}.{s}");
            let token = CompactToken::new(text.clone()).unwrap();
            let parts = token.split().unwrap();
            prop_assert_eq!(parts.join(), text);
        }

        #[test]
        fn numeric_decode_is_deterministic(chars in prop::collection::vec(token_char(), 0..120)) {
            let digits: String = chars
                .iter()
                .map(|c| format!("{:02}", *c as u8 - NUMERIC_OFFSET))
                .collect();
            let first = CompactToken::from_numeric(&digits).unwrap();
            let second = CompactToken::from_numeric(&digits).unwrap();
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.as_str(), chars.iter().collect::<String>());
        }

        #[test]
        fn odd_digit_strings_always_fail(digits in "[0-7]{0,60}", extra in "[0-9]") {
            let odd = if digits.len() % 2 == 0 { format!("{digits}{extra}") } else { digits };
            let is_malformed = matches!(
                CompactToken::from_numeric(&odd),
                Err(TokenError::MalformedEncoding { .. })
            );
            prop_assert!(is_malformed);
        }
    }
}
