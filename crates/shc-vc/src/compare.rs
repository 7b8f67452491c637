//! Comparison of the unverified and verified claims.

use crate::claims::ClaimsObject;
use crate::verify::VerifiedClaims;

/// `true` when the claims decoded without verification are semantically
/// equal to the verified claims.
pub fn claims_match(unverified: &ClaimsObject, verified: &VerifiedClaims) -> bool {
    let matched = unverified == verified.claims();
    if !matched {
        let differing = differing_members(unverified.document(), verified.claims().document());
        tracing::warn!(?differing, "unverified claims differ from verified claims");
    }
    matched
}

/// Top-level members whose values differ between two documents.
fn differing_members(a: &serde_json::Value, b: &serde_json::Value) -> Vec<String> {
    match (a.as_object(), b.as_object()) {
        (Some(a), Some(b)) => {
            let mut keys: Vec<String> = a
                .keys()
                .chain(b.keys())
                .filter(|k| a.get(*k) != b.get(*k))
                .cloned()
                .collect();
            keys.sort();
            keys.dedup();
            keys
        }
        _ => vec!["<document>".to_string()],
    }
}
