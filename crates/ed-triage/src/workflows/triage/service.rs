use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::access::{Actor, CareAction, RoleAccessGuard};
use super::domain::{
    AdmissionNumber, LifecycleStatus, PatientId, PatientIdentity, StaffId, UrgencyTier,
};
use super::error::TriageError;
use super::lifecycle::{self, CareTransition};
use super::questionnaire::TriageAnswerSet;
use super::queue::{PatientQueue, QueueFilter};
use super::record::{AdmissionRequest, PatientRecord};
use super::scoring::{
    CareCircuit, ScoreAssessment, ScoringEngine, TierBoundaries, TriageSettings,
};
use super::stats::QueueStatistics;

/// Admission as filled in at the triage desk: identity, questionnaire, optional adjustment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdmissionForm {
    #[serde(flatten)]
    pub identity: PatientIdentity,
    #[serde(default)]
    pub answers: Option<TriageAnswerSet>,
    #[serde(default)]
    pub score_override: Option<i64>,
}

/// Outbound notification that an urgent patient is waiting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrgentAlert {
    pub patient_id: PatientId,
    pub admission_number: AdmissionNumber,
    pub score: u8,
    pub tier: UrgencyTier,
    pub circuit: CareCircuit,
}

/// Outbound hook for urgent admissions (pager, ward display, ...).
pub trait AlertPublisher: Send + Sync {
    fn publish(&self, alert: UrgentAlert) -> Result<(), AlertError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("alert transport unavailable: {0}")]
    Transport(String),
}

/// Front door of the triage core. Every mutation is authorized against the record's state
/// under the record's lock, then applied in full or not at all.
pub struct TriageDeskService<A> {
    queue: Arc<PatientQueue>,
    engine: RwLock<ScoringEngine>,
    alerts: Arc<A>,
}

impl<A> TriageDeskService<A>
where
    A: AlertPublisher + 'static,
{
    pub fn new(settings: TriageSettings, admission_prefix: &str, alerts: Arc<A>) -> Self {
        Self::with_queue(Arc::new(PatientQueue::new(admission_prefix)), settings, alerts)
    }

    pub fn with_queue(
        queue: Arc<PatientQueue>,
        settings: TriageSettings,
        alerts: Arc<A>,
    ) -> Self {
        Self {
            queue,
            engine: RwLock::new(ScoringEngine::new(settings)),
            alerts,
        }
    }

    pub fn queue(&self) -> &PatientQueue {
        &self.queue
    }

    pub fn settings(&self, actor: &Actor) -> Result<TriageSettings, TriageError> {
        let result = self.guard().and_then(|guard| {
            guard.require(actor, CareAction::ViewSettings, None)?;
            Ok(self.engine()?.settings().clone())
        });
        self.logged("view_settings", result)
    }

    pub fn score(
        &self,
        actor: &Actor,
        answers: &TriageAnswerSet,
    ) -> Result<ScoreAssessment, TriageError> {
        let result = self.guard().and_then(|guard| {
            guard.require(actor, CareAction::Score, None)?;
            Ok(self.engine()?.assess(answers))
        });
        self.logged("score", result)
    }

    pub fn admit(&self, actor: &Actor, form: AdmissionForm) -> Result<PatientRecord, TriageError> {
        self.admit_at(actor, form, Utc::now())
    }

    pub fn admit_at(
        &self,
        actor: &Actor,
        form: AdmissionForm,
        arrival_time: DateTime<Utc>,
    ) -> Result<PatientRecord, TriageError> {
        let result = self.guard().and_then(|guard| {
            guard.require(actor, CareAction::Admit, None)?;
            let assessment = self.assessment_for(&form)?;
            let urgent = assessment
                .as_ref()
                .map(|assessment| assessment.circuit == CareCircuit::DirectToReception)
                .unwrap_or(false);

            let record = self.queue.admit_at(
                AdmissionRequest {
                    identity: form.identity,
                    assessment,
                    admitted_by: actor.staff_id.clone(),
                },
                arrival_time,
            )?;

            info!(
                patient_id = %record.id,
                admission_number = %record.admission_number,
                score = record.score.value(),
                tier = record.tier.code(),
                "patient admitted"
            );

            if urgent {
                self.raise_alert(&record);
            }
            Ok(record)
        });
        self.logged("admit", result)
    }

    pub fn record(&self, actor: &Actor, id: &PatientId) -> Result<PatientRecord, TriageError> {
        let result = self.guard().and_then(|guard| {
            let record = self.queue.get(id)?;
            guard.require(actor, CareAction::ViewRecord, Some(&record))?;
            Ok(record)
        });
        self.logged("view_record", result)
    }

    /// Ordered queue slice, narrowed to the records the caller may see.
    pub fn view_queue(
        &self,
        actor: &Actor,
        filter: QueueFilter,
    ) -> Result<Vec<PatientRecord>, TriageError> {
        let result = self.guard().and_then(|guard| {
            guard.require(actor, CareAction::ViewQueue, None)?;
            let visible = self.queue.visible_for(filter)?;
            Ok(readable(&guard, actor, visible))
        });
        self.logged("view_queue", result)
    }

    pub fn urgent_backlog(&self, actor: &Actor) -> Result<Vec<PatientRecord>, TriageError> {
        let result = self.guard().and_then(|guard| {
            guard.require(actor, CareAction::ViewQueue, None)?;
            let threshold = self.engine()?.settings().boundaries().urgent_threshold();
            let backlog = self.queue.urgent_backlog(threshold)?;
            Ok(readable(&guard, actor, backlog))
        });
        self.logged("urgent_backlog", result)
    }

    pub fn statistics(
        &self,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<QueueStatistics, TriageError> {
        let result = self.guard().and_then(|guard| {
            guard.require(actor, CareAction::ViewStatistics, None)?;
            let threshold = self.engine()?.settings().boundaries().urgent_threshold();
            let records = self.queue.snapshot()?;
            Ok(QueueStatistics::compute(&records, threshold, now))
        });
        self.logged("statistics", result)
    }

    /// The caller takes the patient into consultation and becomes the assigned caregiver.
    pub fn claim(
        &self,
        actor: &Actor,
        id: &PatientId,
        expected: Option<LifecycleStatus>,
    ) -> Result<PatientRecord, TriageError> {
        let transition = CareTransition::Claim {
            caregiver: actor.staff_id.clone(),
        };
        self.advance(actor, id, CareAction::Claim, transition, expected)
    }

    pub fn discharge(
        &self,
        actor: &Actor,
        id: &PatientId,
        diagnosis: &str,
        expected: Option<LifecycleStatus>,
    ) -> Result<PatientRecord, TriageError> {
        let transition = CareTransition::Discharge {
            diagnosis: diagnosis.to_string(),
        };
        self.advance(actor, id, CareAction::Discharge, transition, expected)
    }

    pub fn transfer(
        &self,
        actor: &Actor,
        id: &PatientId,
        destination: Option<String>,
        expected: Option<LifecycleStatus>,
    ) -> Result<PatientRecord, TriageError> {
        let transition = CareTransition::Transfer { destination };
        self.advance(actor, id, CareAction::Transfer, transition, expected)
    }

    pub fn append_note(
        &self,
        actor: &Actor,
        id: &PatientId,
        note: &str,
    ) -> Result<PatientRecord, TriageError> {
        let result = self.guard().and_then(|guard| {
            self.queue.update(id, |record| {
                guard.require(actor, CareAction::AppendNote, Some(record))?;
                lifecycle::append_note(record, note, Utc::now())?;
                Ok(record.clone())
            })
        });
        if let Ok(record) = &result {
            info!(patient_id = %record.id, notes = record.notes.len(), "note appended");
        }
        self.logged("append_note", result)
    }

    pub fn reassign(
        &self,
        actor: &Actor,
        id: &PatientId,
        caregiver: Option<StaffId>,
    ) -> Result<PatientRecord, TriageError> {
        let result = self.guard().and_then(|guard| {
            self.queue.update(id, |record| {
                guard.require(actor, CareAction::Reassign, Some(record))?;
                lifecycle::reassign(record, caregiver, Utc::now())?;
                Ok(record.clone())
            })
        });
        if let Ok(record) = &result {
            let caregiver = record
                .assigned_caregiver
                .as_ref()
                .map(|staff| staff.0.as_str())
                .unwrap_or("none");
            info!(patient_id = %record.id, caregiver, "caregiver reassigned");
        }
        self.logged("reassign", result)
    }

    /// New cutoffs apply to future assessments only; see [`Self::reclassify`].
    pub fn update_boundaries(
        &self,
        actor: &Actor,
        critical: u8,
        high: u8,
        moderate: u8,
    ) -> Result<TriageSettings, TriageError> {
        let result = self.guard().and_then(|guard| {
            guard.require(actor, CareAction::ConfigureSettings, None)?;
            let boundaries = TierBoundaries::new(critical, high, moderate)?;
            let mut engine = self.engine_mut()?;
            engine.settings_mut().set_boundaries(boundaries);
            info!(
                critical = boundaries.critical(),
                high = boundaries.high(),
                moderate = boundaries.moderate(),
                "tier boundaries updated"
            );
            Ok(engine.settings().clone())
        });
        self.logged("update_boundaries", result)
    }

    pub fn update_weight(
        &self,
        actor: &Actor,
        question_id: &str,
        weight: f64,
    ) -> Result<TriageSettings, TriageError> {
        let result = self.guard().and_then(|guard| {
            guard.require(actor, CareAction::ConfigureSettings, None)?;
            let mut engine = self.engine_mut()?;
            engine.settings_mut().set_weight(question_id, weight)?;
            info!(question_id, weight, "question weight updated");
            Ok(engine.settings().clone())
        });
        self.logged("update_weight", result)
    }

    /// Explicit pass re-deriving every admitted record's tier with the current boundaries.
    pub fn reclassify(&self, actor: &Actor) -> Result<usize, TriageError> {
        let result = self.guard().and_then(|guard| {
            guard.require(actor, CareAction::Reclassify, None)?;
            let boundaries = *self.engine()?.settings().boundaries();
            let changed = self.queue.reclassify_all(&boundaries)?;
            info!(changed, "admitted records reclassified");
            Ok(changed)
        });
        self.logged("reclassify", result)
    }

    fn advance(
        &self,
        actor: &Actor,
        id: &PatientId,
        action: CareAction,
        transition: CareTransition,
        expected: Option<LifecycleStatus>,
    ) -> Result<PatientRecord, TriageError> {
        let result = self.guard().and_then(|guard| {
            self.queue.update(id, |record| {
                guard.require(actor, action, Some(record))?;
                let from =
                    lifecycle::apply_transition(record, transition, expected, Utc::now())?;
                Ok((from, record.clone()))
            })
        });

        let result = result.map(|(from, record)| {
            info!(
                patient_id = %record.id,
                from = from.code(),
                to = record.status.code(),
                "patient status changed"
            );
            record
        });
        self.logged(action_operation(action), result)
    }

    fn assessment_for(
        &self,
        form: &AdmissionForm,
    ) -> Result<Option<ScoreAssessment>, TriageError> {
        let Some(answers) = &form.answers else {
            return Ok(None);
        };

        let engine = self.engine()?;
        let assessment = engine.assess(answers);
        let assessment = match form.score_override {
            Some(value) => engine.override_score(assessment, value)?,
            None => assessment,
        };
        Ok(Some(assessment))
    }

    fn raise_alert(&self, record: &PatientRecord) {
        let alert = UrgentAlert {
            patient_id: record.id.clone(),
            admission_number: record.admission_number.clone(),
            score: record.score.value(),
            tier: record.tier,
            circuit: CareCircuit::DirectToReception,
        };
        if let Err(err) = self.alerts.publish(alert) {
            warn!(patient_id = %record.id, error = %err, "urgent alert not delivered");
        }
    }

    fn guard(&self) -> Result<RoleAccessGuard, TriageError> {
        let threshold = self.engine()?.settings().boundaries().urgent_threshold();
        Ok(RoleAccessGuard::new(threshold))
    }

    fn engine(&self) -> Result<RwLockReadGuard<'_, ScoringEngine>, TriageError> {
        self.engine.read().map_err(|_| TriageError::poisoned())
    }

    fn engine_mut(&self) -> Result<RwLockWriteGuard<'_, ScoringEngine>, TriageError> {
        self.engine.write().map_err(|_| TriageError::poisoned())
    }

    fn logged<T>(
        &self,
        operation: &'static str,
        result: Result<T, TriageError>,
    ) -> Result<T, TriageError> {
        if let Err(err) = &result {
            warn!(
                operation,
                kind = err.kind().label(),
                error = %err,
                "triage request rejected"
            );
        }
        result
    }
}

fn readable(
    guard: &RoleAccessGuard,
    actor: &Actor,
    records: Vec<PatientRecord>,
) -> Vec<PatientRecord> {
    records
        .into_iter()
        .filter(|record| {
            guard
                .authorize(actor, CareAction::ViewRecord, Some(record))
                .is_allowed()
        })
        .collect()
}

fn action_operation(action: CareAction) -> &'static str {
    match action {
        CareAction::Claim => "claim",
        CareAction::Discharge => "discharge",
        CareAction::Transfer => "transfer",
        _ => "transition",
    }
}
