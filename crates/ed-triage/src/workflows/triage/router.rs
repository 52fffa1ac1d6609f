use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::access::Actor;
use super::domain::{LifecycleStatus, PatientId, Role, StaffId};
use super::error::{TriageError, TriageErrorKind, ValidationError};
use super::queue::QueueFilter;
use super::questionnaire::TriageAnswerSet;
use super::record::{PatientRecord, PatientRecordView};
use super::service::{AdmissionForm, AlertPublisher, TriageDeskService};

pub const STAFF_ID_HEADER: &str = "x-staff-id";
pub const STAFF_ROLE_HEADER: &str = "x-staff-role";

/// Router exposing the triage desk over HTTP. The caller is identified by the
/// `x-staff-id` / `x-staff-role` headers set by the session layer.
pub fn triage_router<A>(service: Arc<TriageDeskService<A>>) -> Router
where
    A: AlertPublisher + 'static,
{
    Router::new()
        .route("/api/v1/triage/score", post(score_handler::<A>))
        .route("/api/v1/triage/admissions", post(admit_handler::<A>))
        .route("/api/v1/triage/queue", get(queue_handler::<A>))
        .route("/api/v1/triage/backlog", get(backlog_handler::<A>))
        .route("/api/v1/triage/statistics", get(statistics_handler::<A>))
        .route("/api/v1/triage/patients/:patient_id", get(record_handler::<A>))
        .route(
            "/api/v1/triage/patients/:patient_id/claim",
            post(claim_handler::<A>),
        )
        .route(
            "/api/v1/triage/patients/:patient_id/discharge",
            post(discharge_handler::<A>),
        )
        .route(
            "/api/v1/triage/patients/:patient_id/transfer",
            post(transfer_handler::<A>),
        )
        .route(
            "/api/v1/triage/patients/:patient_id/notes",
            post(note_handler::<A>),
        )
        .route(
            "/api/v1/triage/patients/:patient_id/assign",
            post(assign_handler::<A>),
        )
        .route("/api/v1/triage/settings", get(settings_handler::<A>))
        .route(
            "/api/v1/triage/settings/boundaries",
            put(boundaries_handler::<A>),
        )
        .route(
            "/api/v1/triage/settings/weights/:question_id",
            put(weight_handler::<A>),
        )
        .route(
            "/api/v1/triage/settings/reclassify",
            post(reclassify_handler::<A>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct QueueQuery {
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ClaimRequest {
    #[serde(default)]
    expected_status: Option<LifecycleStatus>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DischargeRequest {
    #[serde(default)]
    diagnosis: String,
    #[serde(default)]
    expected_status: Option<LifecycleStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TransferRequest {
    #[serde(default)]
    destination: Option<String>,
    #[serde(default)]
    expected_status: Option<LifecycleStatus>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NoteRequest {
    note: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssignRequest {
    caregiver: Option<StaffId>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BoundariesRequest {
    critical: u8,
    high: u8,
    moderate: u8,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WeightRequest {
    weight: f64,
}

/// Resolves the caller from the session headers. A missing or unknown role yields an actor
/// the access guard always denies.
pub fn actor_from_headers(headers: &HeaderMap) -> Actor {
    let staff_id = headers
        .get(STAFF_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or("anonymous")
        .to_string();
    let role = headers
        .get(STAFF_ROLE_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(Role::parse);

    Actor {
        staff_id: StaffId(staff_id),
        role,
    }
}

pub fn status_for(kind: TriageErrorKind) -> StatusCode {
    match kind {
        TriageErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
        TriageErrorKind::IllegalTransition | TriageErrorKind::ImmutableRecord => {
            StatusCode::CONFLICT
        }
        TriageErrorKind::Authorization => StatusCode::FORBIDDEN,
        TriageErrorKind::NotFound => StatusCode::NOT_FOUND,
        TriageErrorKind::Unavailable => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(crate) fn failure(error: TriageError) -> Response {
    let kind = error.kind();
    let payload = json!({
        "error": error.to_string(),
        "kind": kind,
    });
    (status_for(kind), Json(payload)).into_response()
}

fn respond<T, F>(result: Result<T, TriageError>, status: StatusCode, render: F) -> Response
where
    F: FnOnce(T) -> serde_json::Value,
{
    match result {
        Ok(value) => (status, Json(render(value))).into_response(),
        Err(error) => failure(error),
    }
}

/// Unwraps a JSON body, turning axum's plain-text rejection into a validation failure.
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| {
            failure(ValidationError::MalformedBody(rejection.body_text()).into())
        })
}

fn views(records: Vec<PatientRecord>) -> serde_json::Value {
    let views: Vec<PatientRecordView> = records.iter().map(|record| record.view()).collect();
    json!(views)
}

pub(crate) async fn score_handler<A>(
    State(service): State<Arc<TriageDeskService<A>>>,
    headers: HeaderMap,
    payload: Result<Json<TriageAnswerSet>, JsonRejection>,
) -> Response
where
    A: AlertPublisher + 'static,
{
    let answers = match json_body(payload) {
        Ok(answers) => answers,
        Err(response) => return response,
    };
    let actor = actor_from_headers(&headers);
    respond(service.score(&actor, &answers), StatusCode::OK, |assessment| {
        json!({
            "raw": assessment.raw,
            "computed": assessment.computed.value(),
            "score": assessment.effective().value(),
            "tier": assessment.tier,
            "tier_label": assessment.tier.label(),
            "circuit": assessment.circuit,
            "circuit_label": assessment.circuit.label(),
            "contributions": assessment.contributions,
        })
    })
}

pub(crate) async fn admit_handler<A>(
    State(service): State<Arc<TriageDeskService<A>>>,
    headers: HeaderMap,
    payload: Result<Json<AdmissionForm>, JsonRejection>,
) -> Response
where
    A: AlertPublisher + 'static,
{
    let form = match json_body(payload) {
        Ok(form) => form,
        Err(response) => return response,
    };
    let actor = actor_from_headers(&headers);
    respond(service.admit(&actor, form), StatusCode::CREATED, |record| {
        json!(record.view())
    })
}

pub(crate) async fn queue_handler<A>(
    State(service): State<Arc<TriageDeskService<A>>>,
    headers: HeaderMap,
    Query(query): Query<QueueQuery>,
) -> Response
where
    A: AlertPublisher + 'static,
{
    let actor = actor_from_headers(&headers);
    let raw = query.status.unwrap_or_default();
    let Some(filter) = QueueFilter::parse(&raw) else {
        let payload = json!({
            "error": format!("unknown queue filter '{raw}'"),
            "kind": TriageErrorKind::Validation,
        });
        return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
    };

    respond(service.view_queue(&actor, filter), StatusCode::OK, views)
}

pub(crate) async fn backlog_handler<A>(
    State(service): State<Arc<TriageDeskService<A>>>,
    headers: HeaderMap,
) -> Response
where
    A: AlertPublisher + 'static,
{
    let actor = actor_from_headers(&headers);
    respond(service.urgent_backlog(&actor), StatusCode::OK, views)
}

pub(crate) async fn statistics_handler<A>(
    State(service): State<Arc<TriageDeskService<A>>>,
    headers: HeaderMap,
) -> Response
where
    A: AlertPublisher + 'static,
{
    let actor = actor_from_headers(&headers);
    respond(
        service.statistics(&actor, Utc::now()),
        StatusCode::OK,
        |stats| json!(stats),
    )
}

pub(crate) async fn record_handler<A>(
    State(service): State<Arc<TriageDeskService<A>>>,
    headers: HeaderMap,
    Path(patient_id): Path<String>,
) -> Response
where
    A: AlertPublisher + 'static,
{
    let actor = actor_from_headers(&headers);
    respond(
        service.record(&actor, &PatientId(patient_id)),
        StatusCode::OK,
        |record| json!(record.view()),
    )
}

pub(crate) async fn claim_handler<A>(
    State(service): State<Arc<TriageDeskService<A>>>,
    headers: HeaderMap,
    Path(patient_id): Path<String>,
    body: Option<Json<ClaimRequest>>,
) -> Response
where
    A: AlertPublisher + 'static,
{
    let actor = actor_from_headers(&headers);
    let request = body.map(|Json(request)| request).unwrap_or_default();
    respond(
        service.claim(&actor, &PatientId(patient_id), request.expected_status),
        StatusCode::OK,
        |record| json!(record.view()),
    )
}

pub(crate) async fn discharge_handler<A>(
    State(service): State<Arc<TriageDeskService<A>>>,
    headers: HeaderMap,
    Path(patient_id): Path<String>,
    payload: Result<Json<DischargeRequest>, JsonRejection>,
) -> Response
where
    A: AlertPublisher + 'static,
{
    let request = match json_body(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let actor = actor_from_headers(&headers);
    respond(
        service.discharge(
            &actor,
            &PatientId(patient_id),
            &request.diagnosis,
            request.expected_status,
        ),
        StatusCode::OK,
        |record| json!(record.view()),
    )
}

pub(crate) async fn transfer_handler<A>(
    State(service): State<Arc<TriageDeskService<A>>>,
    headers: HeaderMap,
    Path(patient_id): Path<String>,
    body: Option<Json<TransferRequest>>,
) -> Response
where
    A: AlertPublisher + 'static,
{
    let actor = actor_from_headers(&headers);
    let request = body.map(|Json(request)| request).unwrap_or_default();
    respond(
        service.transfer(
            &actor,
            &PatientId(patient_id),
            request.destination,
            request.expected_status,
        ),
        StatusCode::OK,
        |record| json!(record.view()),
    )
}

pub(crate) async fn note_handler<A>(
    State(service): State<Arc<TriageDeskService<A>>>,
    headers: HeaderMap,
    Path(patient_id): Path<String>,
    payload: Result<Json<NoteRequest>, JsonRejection>,
) -> Response
where
    A: AlertPublisher + 'static,
{
    let request = match json_body(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let actor = actor_from_headers(&headers);
    respond(
        service.append_note(&actor, &PatientId(patient_id), &request.note),
        StatusCode::OK,
        |record| json!(record.view()),
    )
}

pub(crate) async fn assign_handler<A>(
    State(service): State<Arc<TriageDeskService<A>>>,
    headers: HeaderMap,
    Path(patient_id): Path<String>,
    payload: Result<Json<AssignRequest>, JsonRejection>,
) -> Response
where
    A: AlertPublisher + 'static,
{
    let request = match json_body(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let actor = actor_from_headers(&headers);
    respond(
        service.reassign(&actor, &PatientId(patient_id), request.caregiver),
        StatusCode::OK,
        |record| json!(record.view()),
    )
}

pub(crate) async fn settings_handler<A>(
    State(service): State<Arc<TriageDeskService<A>>>,
    headers: HeaderMap,
) -> Response
where
    A: AlertPublisher + 'static,
{
    let actor = actor_from_headers(&headers);
    respond(service.settings(&actor), StatusCode::OK, |settings| {
        json!(settings)
    })
}

pub(crate) async fn boundaries_handler<A>(
    State(service): State<Arc<TriageDeskService<A>>>,
    headers: HeaderMap,
    payload: Result<Json<BoundariesRequest>, JsonRejection>,
) -> Response
where
    A: AlertPublisher + 'static,
{
    let request = match json_body(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let actor = actor_from_headers(&headers);
    respond(
        service.update_boundaries(&actor, request.critical, request.high, request.moderate),
        StatusCode::OK,
        |settings| json!(settings),
    )
}

pub(crate) async fn weight_handler<A>(
    State(service): State<Arc<TriageDeskService<A>>>,
    headers: HeaderMap,
    Path(question_id): Path<String>,
    payload: Result<Json<WeightRequest>, JsonRejection>,
) -> Response
where
    A: AlertPublisher + 'static,
{
    let request = match json_body(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let actor = actor_from_headers(&headers);
    respond(
        service.update_weight(&actor, &question_id, request.weight),
        StatusCode::OK,
        |settings| json!(settings),
    )
}

pub(crate) async fn reclassify_handler<A>(
    State(service): State<Arc<TriageDeskService<A>>>,
    headers: HeaderMap,
) -> Response
where
    A: AlertPublisher + 'static,
{
    let actor = actor_from_headers(&headers);
    respond(service.reclassify(&actor), StatusCode::OK, |changed| {
        json!({ "reclassified": changed })
    })
}
