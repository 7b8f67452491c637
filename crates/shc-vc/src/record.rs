//! # Medical Record Extraction
//!
//! Reads the patient identity and the vaccination history out of verified
//! claims. Extraction takes [`VerifiedClaims`] only, so nothing read here can
//! come from an unverified payload.
//!
//! The bundle's first entry must be the Patient. Every later `Immunization`
//! entry yields one [`VaccinationEvent`], numbered from 1 in bundle order;
//! other resource types (lab results, for example) are skipped.

use serde::Serialize;

use crate::claims::{Immunization, Resource};
use crate::error::VcError;
use crate::verify::VerifiedClaims;

/// Who the card is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatientIdentity {
    /// Family name followed by given names, single-space separated.
    pub display_name: String,
    /// FHIR date as written by the issuer.
    pub birth_date: Option<String>,
}

/// One administered dose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VaccinationEvent {
    /// 1-based position among the card's immunizations.
    pub dose_number: usize,
    pub occurrence: String,
    pub vaccine_code: String,
    pub vaccine_system: Option<String>,
    pub lot_number: Option<String>,
    pub performer: Option<String>,
}

/// Everything extracted from a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthRecords {
    pub patient: PatientIdentity,
    pub vaccinations: Vec<VaccinationEvent>,
}

/// Extract the patient and vaccination events from verified claims.
pub fn extract_records(verified: &VerifiedClaims) -> Result<HealthRecords, VcError> {
    let bundle = verified.claims().fhir_bundle();

    let first = bundle
        .entry
        .first()
        .ok_or_else(|| VcError::MissingPatientRecord("bundle has no entries".to_string()))?;
    let patient = match &first.resource {
        Resource::Patient(patient) => patient,
        other => {
            return Err(VcError::MissingPatientRecord(format!(
                "first bundle entry is {}, not Patient",
                other.type_name()
            )))
        }
    };
    let name = patient.name.first().ok_or(VcError::MissingField {
        resource: "Patient",
        field: "name",
    })?;

    let identity = PatientIdentity {
        display_name: name.display(),
        birth_date: patient.birth_date.clone(),
    };

    let mut vaccinations = Vec::new();
    for (index, entry) in bundle.entry.iter().enumerate().skip(1) {
        match &entry.resource {
            Resource::Immunization(immunization) => {
                let event = vaccination_event(vaccinations.len() + 1, immunization)?;
                vaccinations.push(event);
            }
            other => {
                tracing::debug!(index, resource = other.type_name(), "skipping non-immunization entry");
            }
        }
    }

    tracing::debug!(doses = vaccinations.len(), "extracted health records");
    Ok(HealthRecords {
        patient: identity,
        vaccinations,
    })
}

fn vaccination_event(dose_number: usize, immunization: &Immunization) -> Result<VaccinationEvent, VcError> {
    let coding = immunization
        .vaccine_code
        .as_ref()
        .and_then(|concept| concept.coding.first())
        .ok_or(VcError::MissingField {
            resource: "Immunization",
            field: "vaccineCode.coding",
        })?;
    let vaccine_code = coding.code.clone().ok_or(VcError::MissingField {
        resource: "Immunization",
        field: "vaccineCode.coding.code",
    })?;
    let occurrence = immunization
        .occurrence_date_time
        .clone()
        .ok_or(VcError::MissingField {
            resource: "Immunization",
            field: "occurrenceDateTime",
        })?;

    Ok(VaccinationEvent {
        dose_number,
        occurrence,
        vaccine_code,
        vaccine_system: coding.system.clone(),
        lot_number: immunization.lot_number.clone(),
        performer: immunization
            .performer
            .first()
            .and_then(|p| p.actor.display.clone()),
    })
}
