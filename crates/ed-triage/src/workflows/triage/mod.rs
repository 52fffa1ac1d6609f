//! Emergency department triage: questionnaire scoring, urgency tiers, the admitted-patient
//! queue, the care lifecycle, and the role capability matrix guarding every mutation.
//!
//! The core is synchronous and in-memory. Presentation (the HTTP router in [`router`], the
//! CLI in the api service) sits on top of [`TriageDeskService`] and never touches records
//! directly.

pub mod access;
pub mod domain;
pub mod error;
pub mod lifecycle;
pub mod questionnaire;
pub mod queue;
pub mod record;
pub mod router;
pub mod scoring;
pub mod service;
pub mod stats;

#[cfg(test)]
mod tests;

pub use access::{AccessDecision, Actor, CareAction, RoleAccessGuard};
pub use domain::{
    AdmissionNumber, LifecycleStatus, PatientId, PatientIdentity, Role, Score, StaffId,
    UrgencyTier,
};
pub use error::{TriageError, TriageErrorKind, ValidationError};
pub use lifecycle::CareTransition;
pub use questionnaire::{
    standard_questions, AnswerKind, TriageAnswer, TriageAnswerSet, TriageQuestion,
};
pub use queue::{PatientQueue, QueueFilter};
pub use record::{AdmissionRequest, PatientRecord, PatientRecordView};
pub use router::triage_router;
pub use scoring::{
    CareCircuit, ScoreAssessment, ScoreContribution, ScoringEngine, TierBoundaries,
    TriageSettings,
};
pub use service::{AdmissionForm, AlertError, AlertPublisher, TriageDeskService, UrgentAlert};
pub use stats::QueueStatistics;
