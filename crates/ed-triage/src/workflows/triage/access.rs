use serde::{Deserialize, Serialize};

use super::domain::{Role, Score, StaffId};
use super::error::TriageError;
use super::record::PatientRecord;

/// Caller identity as tagged by the session: a staff id and, when recognised, a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub staff_id: StaffId,
    pub role: Option<Role>,
}

impl Actor {
    pub fn new(staff_id: impl Into<String>, role: Role) -> Self {
        Self {
            staff_id: StaffId::new(staff_id),
            role: Some(role),
        }
    }

    pub fn unrecognised(staff_id: impl Into<String>) -> Self {
        Self {
            staff_id: StaffId::new(staff_id),
            role: None,
        }
    }

    fn role_label(&self) -> String {
        self.role
            .map(|role| role.code().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// Operations subject to the capability matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CareAction {
    Score,
    Admit,
    ViewQueue,
    ViewRecord,
    ViewStatistics,
    ViewSettings,
    Claim,
    AppendNote,
    Discharge,
    Transfer,
    Reassign,
    ConfigureSettings,
    Reclassify,
}

impl CareAction {
    pub const fn describe(self) -> &'static str {
        match self {
            CareAction::Score => "run the triage questionnaire",
            CareAction::Admit => "admit patients",
            CareAction::ViewQueue => "view the patient queue",
            CareAction::ViewRecord => "view this patient record",
            CareAction::ViewStatistics => "view department statistics",
            CareAction::ViewSettings => "view triage settings",
            CareAction::Claim => "take this patient into consultation",
            CareAction::AppendNote => "add notes to this record",
            CareAction::Discharge => "record a diagnosis and discharge this patient",
            CareAction::Transfer => "transfer this patient",
            CareAction::Reassign => "reassign the caregiver of this record",
            CareAction::ConfigureSettings => "change triage settings",
            CareAction::Reclassify => "reclassify admitted patients",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    Deny,
}

impl AccessDecision {
    pub fn is_allowed(self) -> bool {
        self == AccessDecision::Allow
    }

    fn from_bool(allowed: bool) -> Self {
        if allowed {
            AccessDecision::Allow
        } else {
            AccessDecision::Deny
        }
    }
}

/// Pure capability check from (role, action, record) to a decision.
///
/// Record-scoped actions are denied when no record is supplied.
#[derive(Debug, Clone, Copy)]
pub struct RoleAccessGuard {
    urgent_threshold: Score,
}

impl RoleAccessGuard {
    pub fn new(urgent_threshold: Score) -> Self {
        Self { urgent_threshold }
    }

    pub fn authorize(
        &self,
        actor: &Actor,
        action: CareAction,
        record: Option<&PatientRecord>,
    ) -> AccessDecision {
        let Some(role) = actor.role else {
            return AccessDecision::Deny;
        };

        let allowed = match role {
            Role::Urgentiste => match action {
                CareAction::Score
                | CareAction::Admit
                | CareAction::ViewQueue
                | CareAction::ViewRecord
                | CareAction::ViewStatistics
                | CareAction::ViewSettings => true,
                CareAction::AppendNote | CareAction::Transfer => {
                    record.is_some_and(|record| record.admitted_by == actor.staff_id)
                }
                _ => false,
            },
            Role::Receptionniste => matches!(
                action,
                CareAction::ViewQueue
                    | CareAction::ViewRecord
                    | CareAction::ViewStatistics
                    | CareAction::ViewSettings
            ),
            Role::Medecin => match action {
                CareAction::ViewQueue | CareAction::ViewStatistics | CareAction::ViewSettings => {
                    true
                }
                CareAction::ViewRecord
                | CareAction::Claim
                | CareAction::AppendNote
                | CareAction::Discharge
                | CareAction::Transfer => {
                    record.is_some_and(|record| self.within_caseload(&actor.staff_id, record))
                }
                _ => false,
            },
            Role::Admin => matches!(
                action,
                CareAction::ViewQueue
                    | CareAction::ViewRecord
                    | CareAction::ViewStatistics
                    | CareAction::ViewSettings
                    | CareAction::Reassign
                    | CareAction::ConfigureSettings
                    | CareAction::Reclassify
            ),
        };

        AccessDecision::from_bool(allowed)
    }

    pub fn require(
        &self,
        actor: &Actor,
        action: CareAction,
        record: Option<&PatientRecord>,
    ) -> Result<(), TriageError> {
        if self.authorize(actor, action, record).is_allowed() {
            Ok(())
        } else {
            Err(TriageError::Authorization {
                role: actor.role_label(),
                action,
            })
        }
    }

    /// A doctor works on their own patients, and may pick up unassigned urgent ones.
    fn within_caseload(&self, staff: &StaffId, record: &PatientRecord) -> bool {
        record.is_assigned_to(staff)
            || (record.assigned_caregiver.is_none()
                && record.is_urgent_waiting(self.urgent_threshold))
    }
}
