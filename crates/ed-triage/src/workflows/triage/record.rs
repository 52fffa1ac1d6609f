use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    AdmissionNumber, LifecycleStatus, PatientId, PatientIdentity, Score, StaffId, UrgencyTier,
};
use super::scoring::{ScoreAssessment, TierBoundaries};

/// Everything the triage desk hands to the queue for admission.
#[derive(Debug, Clone)]
pub struct AdmissionRequest {
    pub identity: PatientIdentity,
    pub assessment: Option<ScoreAssessment>,
    pub admitted_by: StaffId,
}

/// Admitted patient. Created once by the queue, then advanced through the care lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub id: PatientId,
    pub admission_number: AdmissionNumber,
    pub sequence: u64,
    pub identity: PatientIdentity,
    pub arrival_time: DateTime<Utc>,
    pub computed_score: Score,
    pub score: Score,
    pub tier: UrgencyTier,
    pub status: LifecycleStatus,
    pub admitted_by: StaffId,
    pub assigned_caregiver: Option<StaffId>,
    pub diagnosis: Option<String>,
    pub transfer_destination: Option<String>,
    pub notes: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl PatientRecord {
    pub fn is_assigned_to(&self, staff: &StaffId) -> bool {
        self.assigned_caregiver.as_ref() == Some(staff)
    }

    pub fn is_urgent_waiting(&self, threshold: Score) -> bool {
        self.status == LifecycleStatus::Waiting && self.score >= threshold
    }

    pub fn wait_minutes(&self, now: DateTime<Utc>) -> i64 {
        (now - self.arrival_time).num_minutes().max(0)
    }

    /// Re-derives the tier from the current score. Returns whether the tier changed.
    pub(crate) fn reclassify(&mut self, boundaries: &TierBoundaries) -> bool {
        let tier = boundaries.classify(self.score);
        if tier == self.tier {
            return false;
        }
        self.tier = tier;
        true
    }

    pub fn view(&self) -> PatientRecordView {
        PatientRecordView {
            id: self.id.clone(),
            admission_number: self.admission_number.clone(),
            display_name: self.identity.display_name(),
            age: self.identity.age,
            reason: self.identity.reason.clone(),
            arrival_time: self.arrival_time,
            score: self.score.value(),
            computed_score: self.computed_score.value(),
            score_adjusted: self.score != self.computed_score,
            tier: self.tier,
            tier_label: self.tier.label(),
            status: self.status,
            status_label: self.status.label(),
            assigned_caregiver: self.assigned_caregiver.clone(),
            diagnosis: self.diagnosis.clone(),
            transfer_destination: self.transfer_destination.clone(),
            notes: self.notes.clone(),
        }
    }
}

/// Presentation snapshot of a record with the ward's display labels resolved.
#[derive(Debug, Clone, Serialize)]
pub struct PatientRecordView {
    pub id: PatientId,
    pub admission_number: AdmissionNumber,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u16>,
    pub reason: String,
    pub arrival_time: DateTime<Utc>,
    pub score: u8,
    pub computed_score: u8,
    pub score_adjusted: bool,
    pub tier: UrgencyTier,
    pub tier_label: &'static str,
    pub status: LifecycleStatus,
    pub status_label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_caregiver: Option<StaffId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_destination: Option<String>,
    pub notes: Vec<String>,
}
