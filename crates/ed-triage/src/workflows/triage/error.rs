use serde::Serialize;

use super::access::CareAction;
use super::domain::{LifecycleStatus, PatientId};

/// Input rejected before any state was touched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("patient surname is required")]
    MissingSurname,
    #[error("patient given name is required")]
    MissingGivenName,
    #[error("a triage score must be computed before admission")]
    MissingScore,
    #[error("score {0} is outside the 1-10 range")]
    ScoreOutOfRange(i64),
    #[error("a diagnosis is required to discharge a patient")]
    EmptyDiagnosis,
    #[error("notes cannot be empty")]
    EmptyNote,
    #[error("tier boundaries must satisfy 2 <= moderate < high < critical <= 10 (got critical {critical}, high {high}, moderate {moderate})")]
    InvalidBoundaries { critical: u8, high: u8, moderate: u8 },
    #[error("weight for question {question_id} must be a positive finite number (got {weight})")]
    InvalidWeight { question_id: String, weight: f64 },
    #[error("unknown triage question {0}")]
    UnknownQuestion(String),
    #[error("request body could not be read: {0}")]
    MalformedBody(String),
}

/// Failure of a triage operation. Every variant is local and recoverable by the caller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TriageError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("cannot move a patient from {} to {}", .from.label(), .requested.label())]
    IllegalTransition {
        from: LifecycleStatus,
        requested: LifecycleStatus,
    },
    #[error("stale transition: expected status {}, record is {}", .expected.label(), .actual.label())]
    StaleTransition {
        expected: LifecycleStatus,
        actual: LifecycleStatus,
    },
    #[error("record is closed ({}) and can no longer be modified", .status.label())]
    ImmutableRecord { status: LifecycleStatus },
    #[error("role {role} is not allowed to {}", .action.describe())]
    Authorization { role: String, action: CareAction },
    #[error("patient {0} not found")]
    NotFound(PatientId),
    #[error("triage store unavailable: {0}")]
    Unavailable(String),
}

/// Coarse classification of [`TriageError`] so callers can render an accurate message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriageErrorKind {
    Validation,
    IllegalTransition,
    ImmutableRecord,
    Authorization,
    NotFound,
    Unavailable,
}

impl TriageErrorKind {
    pub const fn label(self) -> &'static str {
        match self {
            TriageErrorKind::Validation => "validation",
            TriageErrorKind::IllegalTransition => "illegal_transition",
            TriageErrorKind::ImmutableRecord => "immutable_record",
            TriageErrorKind::Authorization => "authorization",
            TriageErrorKind::NotFound => "not_found",
            TriageErrorKind::Unavailable => "unavailable",
        }
    }
}

impl TriageError {
    pub fn kind(&self) -> TriageErrorKind {
        match self {
            TriageError::Validation(_) => TriageErrorKind::Validation,
            TriageError::IllegalTransition { .. } | TriageError::StaleTransition { .. } => {
                TriageErrorKind::IllegalTransition
            }
            TriageError::ImmutableRecord { .. } => TriageErrorKind::ImmutableRecord,
            TriageError::Authorization { .. } => TriageErrorKind::Authorization,
            TriageError::NotFound(_) => TriageErrorKind::NotFound,
            TriageError::Unavailable(_) => TriageErrorKind::Unavailable,
        }
    }

    pub(crate) fn poisoned() -> Self {
        TriageError::Unavailable("lock poisoned".to_string())
    }
}
