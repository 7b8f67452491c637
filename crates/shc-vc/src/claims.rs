//! # Health Card Claims
//!
//! Typed view of the JWT-style claims carried in a SMART Health Card
//! payload, together with the full parsed JSON document.
//!
//! The typed structs model only what the decoder reads. Unknown members are
//! tolerated everywhere, since FHIR resources carry far more than a card
//! reader needs; they are still present in [`ClaimsObject::document`] and
//! take part in comparison.
//!
//! ## Field Naming
//!
//! Serde rename attributes map the camelCase JSON members (`credentialSubject`,
//! `fhirBundle`, `resourceType`, ...) onto snake_case fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::VcError;

/// Parsed claims: typed view plus the document it was read from.
///
/// Two claims objects are equal when their documents are semantically equal
/// JSON values; member order and whitespace do not matter.
#[derive(Debug, Clone)]
pub struct ClaimsObject {
    claims: HealthCardClaims,
    document: serde_json::Value,
}

impl ClaimsObject {
    /// Parse UTF-8 JSON claims.
    pub fn from_json(bytes: &[u8]) -> Result<Self, VcError> {
        let document: serde_json::Value =
            serde_json::from_slice(bytes).map_err(|e| VcError::Parse(e.to_string()))?;
        let claims = HealthCardClaims::deserialize(&document)
            .map_err(|e| VcError::Parse(e.to_string()))?;
        Ok(Self { claims, document })
    }

    /// The typed claims.
    pub fn claims(&self) -> &HealthCardClaims {
        &self.claims
    }

    /// The full parsed document.
    pub fn document(&self) -> &serde_json::Value {
        &self.document
    }

    /// Issuer base URL (`iss`).
    pub fn issuer(&self) -> &str {
        &self.claims.iss
    }

    /// The FHIR bundle inside the credential subject.
    pub fn fhir_bundle(&self) -> &FhirBundle {
        &self.claims.vc.credential_subject.fhir_bundle
    }
}

impl PartialEq for ClaimsObject {
    fn eq(&self, other: &Self) -> bool {
        self.document == other.document
    }
}

impl Eq for ClaimsObject {}

/// Top-level claims of a health card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCardClaims {
    /// Issuer base URL; keys are discovered under it.
    pub iss: String,
    /// Not-before, seconds since the epoch (may be fractional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<f64>,
    /// Expiry, seconds since the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<f64>,
    pub vc: VerifiableCredential,
}

impl HealthCardClaims {
    /// `nbf` as a UTC timestamp.
    pub fn not_before(&self) -> Option<DateTime<Utc>> {
        self.nbf.and_then(numeric_date)
    }

    /// `exp` as a UTC timestamp.
    pub fn expires(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(numeric_date)
    }
}

fn numeric_date(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let mut whole = secs.floor() as i64;
    // Microsecond precision: an f64 epoch value carries no more than that.
    let mut micros = ((secs - secs.floor()) * 1e6).round() as u32;
    if micros >= 1_000_000 {
        whole += 1;
        micros = 0;
    }
    DateTime::from_timestamp(whole, micros * 1_000)
}

/// The `vc` claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiableCredential {
    /// Credential types, e.g. `https://smarthealth.cards#health-card`.
    #[serde(rename = "type", default)]
    pub credential_type: Vec<String>,
    #[serde(rename = "credentialSubject")]
    pub credential_subject: CredentialSubject,
}

/// The credential subject: a FHIR bundle and its version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialSubject {
    #[serde(rename = "fhirVersion", default, skip_serializing_if = "Option::is_none")]
    pub fhir_version: Option<String>,
    #[serde(rename = "fhirBundle")]
    pub fhir_bundle: FhirBundle,
}

/// A FHIR `Bundle` of type `collection`.
///
/// Entry 0 is the Patient; the following entries are the clinical
/// resources in the order the issuer listed them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FhirBundle {
    #[serde(rename = "resourceType", default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub bundle_type: Option<String>,
    #[serde(default)]
    pub entry: Vec<BundleEntry>,
}

/// One bundle entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleEntry {
    /// Short `resource:N` reference used inside the card.
    #[serde(rename = "fullUrl", default, skip_serializing_if = "Option::is_none")]
    pub full_url: Option<String>,
    pub resource: Resource,
}

/// A FHIR resource, discriminated by `resourceType`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "resourceType")]
pub enum Resource {
    Patient(Patient),
    Immunization(Immunization),
    /// Any other resource type (for example lab `Observation`s).
    #[serde(other)]
    Other,
}

impl Resource {
    /// The `resourceType`, or `"Other"` for unmodelled resources.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Patient(_) => "Patient",
            Self::Immunization(_) => "Immunization",
            Self::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    #[serde(default)]
    pub name: Vec<HumanName>,
    /// FHIR date (`YYYY`, `YYYY-MM` or `YYYY-MM-DD`).
    #[serde(rename = "birthDate", default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanName {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(default)]
    pub given: Vec<String>,
}

impl HumanName {
    /// `family` followed by the given names, single-space separated.
    pub fn display(&self) -> String {
        self.family
            .iter()
            .chain(self.given.iter())
            .map(String::as_str)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Immunization {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "vaccineCode", default, skip_serializing_if = "Option::is_none")]
    pub vaccine_code: Option<CodeableConcept>,
    #[serde(
        rename = "occurrenceDateTime",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub occurrence_date_time: Option<String>,
    #[serde(rename = "lotNumber", default, skip_serializing_if = "Option::is_none")]
    pub lot_number: Option<String>,
    #[serde(default)]
    pub performer: Vec<Performer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeableConcept {
    #[serde(default)]
    pub coding: Vec<Coding>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Performer {
    pub actor: Actor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}
