//! Care lifecycle: `Waiting -> InConsultation -> Discharged | Transferred`, plus the direct
//! `Waiting -> Transferred` escalation. Discharged and Transferred are terminal.
//!
//! Every function validates first and mutates last, so a rejected request leaves the record
//! exactly as it was.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{LifecycleStatus, StaffId};
use super::error::{TriageError, ValidationError};
use super::record::PatientRecord;

/// A requested status change together with the fields it sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "transition", rename_all = "snake_case")]
pub enum CareTransition {
    /// A caregiver takes the patient into consultation.
    Claim { caregiver: StaffId },
    Discharge { diagnosis: String },
    Transfer {
        #[serde(default)]
        destination: Option<String>,
    },
}

impl CareTransition {
    pub const fn target(&self) -> LifecycleStatus {
        match self {
            CareTransition::Claim { .. } => LifecycleStatus::InConsultation,
            CareTransition::Discharge { .. } => LifecycleStatus::Discharged,
            CareTransition::Transfer { .. } => LifecycleStatus::Transferred,
        }
    }
}

/// Whether `from -> to` is an edge of the lifecycle graph.
pub const fn is_legal(from: LifecycleStatus, to: LifecycleStatus) -> bool {
    matches!(
        (from, to),
        (LifecycleStatus::Waiting, LifecycleStatus::InConsultation)
            | (LifecycleStatus::Waiting, LifecycleStatus::Transferred)
            | (LifecycleStatus::InConsultation, LifecycleStatus::Discharged)
            | (LifecycleStatus::InConsultation, LifecycleStatus::Transferred)
    )
}

/// Applies `transition`, returning the status the record left.
///
/// `expected` is the status the caller last observed; a mismatch means someone else moved the
/// patient in the meantime and the request is rejected as stale.
pub fn apply_transition(
    record: &mut PatientRecord,
    transition: CareTransition,
    expected: Option<LifecycleStatus>,
    at: DateTime<Utc>,
) -> Result<LifecycleStatus, TriageError> {
    let from = record.status;
    if let Some(expected) = expected {
        if expected != from {
            return Err(TriageError::StaleTransition {
                expected,
                actual: from,
            });
        }
    }

    let requested = transition.target();
    if !is_legal(from, requested) {
        return Err(TriageError::IllegalTransition { from, requested });
    }

    match transition {
        CareTransition::Claim { caregiver } => {
            record.assigned_caregiver = Some(caregiver);
        }
        CareTransition::Discharge { diagnosis } => {
            let diagnosis = diagnosis.trim();
            if diagnosis.is_empty() {
                return Err(ValidationError::EmptyDiagnosis.into());
            }
            record.diagnosis = Some(diagnosis.to_string());
        }
        CareTransition::Transfer { destination } => {
            record.transfer_destination = destination
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty());
        }
    }

    record.status = requested;
    record.updated_at = at;
    Ok(from)
}

/// Notes are append-only and closed once the record reaches a terminal status.
pub fn append_note(
    record: &mut PatientRecord,
    note: &str,
    at: DateTime<Utc>,
) -> Result<(), TriageError> {
    if record.status.is_terminal() {
        return Err(TriageError::ImmutableRecord {
            status: record.status,
        });
    }

    let note = note.trim();
    if note.is_empty() {
        return Err(ValidationError::EmptyNote.into());
    }

    record.notes.push(note.to_string());
    record.updated_at = at;
    Ok(())
}

/// Points the record at another caregiver, or clears the reference. The record itself is
/// untouched otherwise.
pub fn reassign(
    record: &mut PatientRecord,
    caregiver: Option<StaffId>,
    at: DateTime<Utc>,
) -> Result<(), TriageError> {
    if record.status.is_terminal() {
        return Err(TriageError::ImmutableRecord {
            status: record.status,
        });
    }

    record.assigned_caregiver = caregiver;
    record.updated_at = at;
    Ok(())
}
