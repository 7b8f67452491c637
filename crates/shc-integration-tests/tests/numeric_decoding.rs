//! Numeric QR decoding against the failure taxonomy.

use proptest::prelude::*;
use shc_core::{CompactToken, FailureKind};
use shc_vc::{decode_unverified, DecodeLimits};

proptest! {
    #[test]
    fn arbitrary_digit_text_never_panics(digits in "[0-9]{0,200}") {
        if let Err(e) = CompactToken::from_numeric(&digits) {
            prop_assert_eq!(e.kind(), FailureKind::MalformedEncoding);
        }
    }

    #[test]
    fn decoded_tokens_fail_with_taxonomy_kinds(digits in "([0-7][0-9]){0,60}") {
        if let Ok(token) = CompactToken::from_numeric(&digits) {
            if let Err(e) = decode_unverified(&token, &DecodeLimits::default()) {
                let kind = e.kind();
                prop_assert!(matches!(
                    kind,
                    FailureKind::MalformedToken
                        | FailureKind::Decode
                        | FailureKind::Inflate
                        | FailureKind::Parse
                ), "unexpected kind {kind:?}");
            }
        }
    }
}

#[test]
fn letters_in_scanned_text_report_their_position() {
    let err = CompactToken::from_numeric("shc:/5676x9").unwrap_err();
    assert_eq!(err.kind(), FailureKind::MalformedEncoding);
    assert!(err.to_string().contains("position 4"), "{err}");
}
