//! Deterministic signing keys for tests.
//!
//! Available to this crate's unit tests and, through the `test-support`
//! feature, to downstream crates that need to mint signed tokens.

use p256::ecdsa::signature::Signer;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use shc_core::CompactToken;

use crate::base64url;
use crate::jwk::Jwk;

enum SigningKey {
    Es256(p256::ecdsa::SigningKey),
    EdDsa(ed25519_dalek::SigningKey),
}

/// A signing key with an assigned key id.
pub struct TestSigner {
    kid: String,
    key: SigningKey,
}

impl TestSigner {
    /// P-256 key derived from a nonzero seed byte.
    pub fn es256(kid: &str, seed: u8) -> Self {
        let key = p256::ecdsa::SigningKey::from_slice(&[seed.max(1); 32])
            .expect("repeated nonzero byte is a valid P-256 scalar");
        Self {
            kid: kid.to_string(),
            key: SigningKey::Es256(key),
        }
    }

    /// Ed25519 key derived from a seed byte.
    pub fn eddsa(kid: &str, seed: u8) -> Self {
        Self {
            kid: kid.to_string(),
            key: SigningKey::EdDsa(ed25519_dalek::SigningKey::from_bytes(&[seed; 32])),
        }
    }

    /// Key id written into the JWK and token headers.
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// The public key record for this signer.
    pub fn jwk(&self) -> Jwk {
        match &self.key {
            SigningKey::Es256(key) => {
                let point = p256::PublicKey::from(key.verifying_key()).to_encoded_point(false);
                Jwk {
                    kty: Some("EC".into()),
                    kid: Some(self.kid.clone()),
                    alg: Some("ES256".into()),
                    key_use: Some("sig".into()),
                    crv: Some("P-256".into()),
                    x: point.x().map(|x| base64url::encode(x)),
                    y: point.y().map(|y| base64url::encode(y)),
                    x5c: None,
                }
            }
            SigningKey::EdDsa(key) => Jwk {
                kty: Some("OKP".into()),
                kid: Some(self.kid.clone()),
                alg: Some("EdDSA".into()),
                key_use: Some("sig".into()),
                crv: Some("Ed25519".into()),
                x: Some(base64url::encode(key.verifying_key().as_bytes())),
                y: None,
                x5c: None,
            },
        }
    }

    /// The JOSE algorithm name of this signer.
    pub fn alg(&self) -> &'static str {
        match self.key {
            SigningKey::Es256(_) => "ES256",
            SigningKey::EdDsa(_) => "EdDSA",
        }
    }

    /// Raw signature over `message` (`r || s` for ES256).
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        match &self.key {
            SigningKey::Es256(key) => {
                let sig: p256::ecdsa::Signature = key.sign(message);
                sig.to_bytes().to_vec()
            }
            SigningKey::EdDsa(key) => {
                let sig: ed25519_dalek::Signature = key.sign(message);
                sig.to_bytes().to_vec()
            }
        }
    }

    /// Sign `payload` under an already-encoded header segment.
    pub fn sign_token(&self, header_segment: &str, payload: &[u8]) -> CompactToken {
        let signing_input = format!("{header_segment}.{}", base64url::encode(payload));
        let signature = base64url::encode(&self.sign(signing_input.as_bytes()));
        CompactToken::new(format!("{signing_input}.{signature}"))
            .expect("base64url segments are always in the token alphabet")
    }

    /// Sign `payload` under a standard SMART Health Card header
    /// (`zip: DEF`, this signer's `alg` and `kid`).
    pub fn sign_shc(&self, payload: &[u8]) -> CompactToken {
        let header = format!(r#"{{"zip":"DEF","alg":"{}","kid":"{}"}}"#, self.alg(), self.kid);
        self.sign_token(&base64url::encode(header.as_bytes()), payload)
    }
}
