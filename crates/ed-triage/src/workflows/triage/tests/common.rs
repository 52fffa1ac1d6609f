use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::triage::access::Actor;
use crate::workflows::triage::domain::{
    AdmissionNumber, LifecycleStatus, PatientId, PatientIdentity, Role, Score, StaffId,
};
use crate::workflows::triage::questionnaire::TriageAnswerSet;
use crate::workflows::triage::record::PatientRecord;
use crate::workflows::triage::scoring::{classify, TriageSettings};
use crate::workflows::triage::service::{
    AdmissionForm, AlertError, AlertPublisher, TriageDeskService, UrgentAlert,
};

pub(crate) fn shift_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 8, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(crate) fn identity(surname: &str, given_name: &str) -> PatientIdentity {
    PatientIdentity {
        surname: surname.to_string(),
        given_name: given_name.to_string(),
        age: Some(45),
        reason: "Douleur thoracique aiguë".to_string(),
        contact: "+216 55 123 456".to_string(),
    }
}

pub(crate) fn record_with_score(score: u8) -> PatientRecord {
    let score = Score::new(score).expect("valid score");
    PatientRecord {
        id: PatientId::generate(),
        admission_number: AdmissionNumber::format("URG", 2026, 1),
        sequence: 1,
        identity: identity("Khelifa", "Molka"),
        arrival_time: shift_start(),
        computed_score: score,
        score,
        tier: classify(score),
        status: LifecycleStatus::Waiting,
        admitted_by: StaffId::new("triage-desk"),
        assigned_caregiver: None,
        diagnosis: None,
        transfer_destination: None,
        notes: vec!["Douleur thoracique depuis 2h".to_string()],
        updated_at: shift_start(),
    }
}

pub(crate) fn record_with_status(status: LifecycleStatus) -> PatientRecord {
    PatientRecord {
        status,
        ..record_with_score(6)
    }
}

pub(crate) fn urgentiste() -> Actor {
    Actor::new("nizar", Role::Urgentiste)
}

pub(crate) fn receptionniste() -> Actor {
    Actor::new("amira", Role::Receptionniste)
}

pub(crate) fn medecin() -> Actor {
    Actor::new("dr-mansour", Role::Medecin)
}

pub(crate) fn other_medecin() -> Actor {
    Actor::new("dr-bouazizi", Role::Medecin)
}

pub(crate) fn admin() -> Actor {
    Actor::new("sofiane", Role::Admin)
}

/// q1 = 10 and loss of consciousness: raw 6.0, Moderate.
pub(crate) fn moderate_answers() -> TriageAnswerSet {
    TriageAnswerSet::new()
        .with_number("q1", 10)
        .with_flag("q4", true)
}

/// Every red flag plus maximal pain: capped at 10, Critical.
pub(crate) fn critical_answers() -> TriageAnswerSet {
    TriageAnswerSet::new()
        .with_number("q1", 10)
        .with_flag("q2", true)
        .with_flag("q3", true)
        .with_flag("q4", true)
        .with_flag("q5", true)
        .with_flag("q6", true)
}

pub(crate) fn form(surname: &str, answers: Option<TriageAnswerSet>) -> AdmissionForm {
    AdmissionForm {
        identity: identity(surname, "Patient"),
        answers,
        score_override: None,
    }
}

pub(crate) fn build_service() -> (TriageDeskService<MemoryAlerts>, Arc<MemoryAlerts>) {
    let alerts = Arc::new(MemoryAlerts::default());
    let service = TriageDeskService::new(TriageSettings::default(), "URG", alerts.clone());
    (service, alerts)
}

/// Admits a patient with the given override score, `minutes` after the shift start.
pub(crate) fn admit_scored(
    service: &TriageDeskService<MemoryAlerts>,
    surname: &str,
    score: i64,
    minutes: i64,
) -> PatientRecord {
    let form = AdmissionForm {
        score_override: Some(score),
        ..form(surname, Some(TriageAnswerSet::new()))
    };
    service
        .admit_at(&urgentiste(), form, shift_start() + Duration::minutes(minutes))
        .expect("admission succeeds")
}

#[derive(Default, Clone)]
pub(crate) struct MemoryAlerts {
    events: Arc<Mutex<Vec<UrgentAlert>>>,
}

impl MemoryAlerts {
    pub(crate) fn events(&self) -> Vec<UrgentAlert> {
        self.events.lock().expect("alerts mutex poisoned").clone()
    }
}

impl AlertPublisher for MemoryAlerts {
    fn publish(&self, alert: UrgentAlert) -> Result<(), AlertError> {
        self.events.lock().expect("alerts mutex poisoned").push(alert);
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(crate) struct OfflineAlerts;

impl AlertPublisher for OfflineAlerts {
    fn publish(&self, _alert: UrgentAlert) -> Result<(), AlertError> {
        Err(AlertError::Transport("pager gateway offline".to_string()))
    }
}

pub(crate) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("valid json body")
}
