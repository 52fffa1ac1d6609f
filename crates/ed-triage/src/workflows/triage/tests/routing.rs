use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::{admit_scored, build_service, read_json_body, MemoryAlerts};
use crate::workflows::triage::domain::Role;
use crate::workflows::triage::error::TriageErrorKind;
use crate::workflows::triage::router::{
    actor_from_headers, settings_handler, status_for, triage_router, STAFF_ID_HEADER,
    STAFF_ROLE_HEADER,
};
use crate::workflows::triage::service::TriageDeskService;

fn router_with(
    service: TriageDeskService<MemoryAlerts>,
) -> (Router, Arc<TriageDeskService<MemoryAlerts>>) {
    let service = Arc::new(service);
    (triage_router(service.clone()), service)
}

fn request(
    method: &str,
    uri: &str,
    staff: &str,
    role: &str,
    body: Option<Value>,
) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(STAFF_ID_HEADER, staff)
        .header(STAFF_ROLE_HEADER, role);
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds"),
        None => builder.body(Body::empty()).expect("request builds"),
    }
}

fn raw_request(method: &str, uri: &str, staff: &str, role: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(STAFF_ID_HEADER, staff)
        .header(STAFF_ROLE_HEADER, role)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

#[tokio::test]
async fn score_route_returns_tier_and_circuit() {
    let (service, _) = build_service();
    let (router, _) = router_with(service);

    let response = router
        .oneshot(request(
            "POST",
            "/api/v1/triage/score",
            "nizar",
            "urgentiste",
            Some(json!({
                "q1": 10,
                "q2": true,
                "q3": true,
                "q4": true,
                "q5": true,
                "q6": true,
            })),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["score"], 10);
    assert_eq!(body["tier"], "critical");
    assert_eq!(body["tier_label"], "Critique");
    assert_eq!(body["circuit"], "direct_to_reception");
}

#[tokio::test]
async fn score_route_bounds_huge_and_fractional_ratings() {
    let (service, _) = build_service();
    let (router, _) = router_with(service);

    let huge = router
        .clone()
        .oneshot(raw_request(
            "POST",
            "/api/v1/triage/score",
            "nizar",
            "urgentiste",
            r#"{"q1": 99999999999999999999, "q4": true}"#,
        ))
        .await
        .expect("router responds");
    assert_eq!(huge.status(), StatusCode::OK);
    let body = read_json_body(huge).await;
    assert_eq!(body["score"], 6);

    let fractional = router
        .oneshot(raw_request(
            "POST",
            "/api/v1/triage/score",
            "nizar",
            "urgentiste",
            r#"{"q1": 7.5, "q4": true, "q5": "oui"}"#,
        ))
        .await
        .expect("router responds");
    assert_eq!(fractional.status(), StatusCode::OK);
    let body = read_json_body(fractional).await;
    assert_eq!(body["score"], 5);
    assert_eq!(body["tier"], "moderate");
}

#[tokio::test]
async fn admission_route_creates_a_waiting_record() {
    let (service, alerts) = build_service();
    let (router, service) = router_with(service);

    let response = router
        .oneshot(request(
            "POST",
            "/api/v1/triage/admissions",
            "nizar",
            "urgentiste",
            Some(json!({
                "surname": "Ben Salah",
                "given_name": "Ahmed",
                "age": 45,
                "reason": "Douleur thoracique aiguë",
                "contact": "+216 55 123 456",
                "answers": { "q1": 10, "q4": true },
            })),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    let admission_number = body["admission_number"].as_str().expect("admission number");
    assert!(admission_number.starts_with("URG-"));
    assert!(admission_number.ends_with("-001"));
    assert_eq!(body["status"], "waiting");
    assert_eq!(body["status_label"], "En attente");
    assert_eq!(body["score"], 6);
    assert_eq!(body["display_name"], "Ahmed Ben Salah");
    assert_eq!(service.queue().len().expect("queue readable"), 1);
    assert!(alerts.events().is_empty());
}

#[tokio::test]
async fn admission_without_answers_is_unprocessable() {
    let (service, _) = build_service();
    let (router, service) = router_with(service);

    let response = router
        .oneshot(request(
            "POST",
            "/api/v1/triage/admissions",
            "nizar",
            "urgentiste",
            Some(json!({ "surname": "Ben Salah", "given_name": "Ahmed" })),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert_eq!(body["kind"], "validation");
    assert!(service.queue().is_empty().expect("queue readable"));
}

#[tokio::test]
async fn admission_without_surname_reports_the_missing_field() {
    let (service, _) = build_service();
    let (router, service) = router_with(service);

    let response = router
        .oneshot(request(
            "POST",
            "/api/v1/triage/admissions",
            "nizar",
            "urgentiste",
            Some(json!({ "given_name": "Ali", "answers": { "q1": 5 } })),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert_eq!(body["kind"], "validation");
    assert_eq!(body["error"], "patient surname is required");
    assert!(service.queue().is_empty().expect("queue readable"));
}

#[tokio::test]
async fn unreadable_body_is_reported_as_validation() {
    let (service, _) = build_service();
    let (router, _) = router_with(service);

    let response = router
        .oneshot(raw_request(
            "POST",
            "/api/v1/triage/admissions",
            "nizar",
            "urgentiste",
            r#"{"surname": "Ben Salah", "given_name": "#,
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert_eq!(body["kind"], "validation");
    assert!(body["error"]
        .as_str()
        .is_some_and(|message| message.starts_with("request body could not be read")));
}

#[tokio::test]
async fn discharge_by_reception_is_forbidden() {
    let (service, _) = build_service();
    let record = admit_scored(&service, "Gharbi", 8, 0);
    let (router, _) = router_with(service);

    let response = router
        .oneshot(request(
            "POST",
            &format!("/api/v1/triage/patients/{}/discharge", record.id),
            "amira",
            "receptionniste",
            Some(json!({ "diagnosis": "Angine" })),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = read_json_body(response).await;
    assert_eq!(body["kind"], "authorization");
}

#[tokio::test]
async fn claim_then_illegal_claim_conflicts() {
    let (service, _) = build_service();
    let record = admit_scored(&service, "Gharbi", 9, 0);
    let (router, _) = router_with(service);
    let uri = format!("/api/v1/triage/patients/{}/claim", record.id);

    let first = router
        .clone()
        .oneshot(request("POST", &uri, "dr-mansour", "medecin", None))
        .await
        .expect("router responds");
    assert_eq!(first.status(), StatusCode::OK);
    let body = read_json_body(first).await;
    assert_eq!(body["status"], "in_consultation");
    assert_eq!(body["assigned_caregiver"], "dr-mansour");

    let second = router
        .oneshot(request("POST", &uri, "dr-mansour", "medecin", None))
        .await
        .expect("router responds");
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let body = read_json_body(second).await;
    assert_eq!(body["kind"], "illegal_transition");
}

#[tokio::test]
async fn unknown_patients_are_not_found() {
    let (service, _) = build_service();
    let (router, _) = router_with(service);

    let response = router
        .oneshot(request(
            "GET",
            "/api/v1/triage/patients/does-not-exist",
            "amira",
            "receptionniste",
            None,
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn queue_route_rejects_unknown_filters() {
    let (service, _) = build_service();
    let (router, _) = router_with(service);

    let response = router
        .oneshot(request(
            "GET",
            "/api/v1/triage/queue?status=someday",
            "amira",
            "receptionniste",
            None,
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn queue_route_lists_patients_in_priority_order() {
    let (service, _) = build_service();
    admit_scored(&service, "Amri", 4, 0);
    admit_scored(&service, "Bouzid", 9, 10);
    let (router, _) = router_with(service);

    let response = router
        .oneshot(request(
            "GET",
            "/api/v1/triage/queue?status=en_attente",
            "amira",
            "receptionniste",
            None,
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    let scores: Vec<u64> = body
        .as_array()
        .expect("array body")
        .iter()
        .filter_map(|entry| entry["score"].as_u64())
        .collect();
    assert_eq!(scores, vec![9, 4]);
}

#[tokio::test]
async fn invalid_boundaries_are_unprocessable() {
    let (service, _) = build_service();
    let (router, _) = router_with(service);

    let response = router
        .oneshot(request(
            "PUT",
            "/api/v1/triage/settings/boundaries",
            "sofiane",
            "admin",
            Some(json!({ "critical": 7, "high": 7, "moderate": 4 })),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn boundary_changes_by_reception_are_forbidden_even_when_invalid() {
    let (service, _) = build_service();
    let (router, _) = router_with(service);

    let response = router
        .oneshot(request(
            "PUT",
            "/api/v1/triage/settings/boundaries",
            "amira",
            "receptionniste",
            Some(json!({ "critical": 3, "high": 7, "moderate": 4 })),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = read_json_body(response).await;
    assert_eq!(body["kind"], "authorization");
}

#[tokio::test]
async fn settings_route_requires_a_known_role() {
    let (service, _) = build_service();
    let (router, _) = router_with(service);

    let response = router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/triage/settings")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = read_json_body(response).await;
    assert_eq!(body["kind"], "authorization");
}

#[tokio::test]
async fn settings_handler_exposes_questions_and_boundaries() {
    let (service, _) = build_service();
    let mut headers = axum::http::HeaderMap::new();
    headers.insert(STAFF_ID_HEADER, "dr-mansour".parse().expect("header value"));
    headers.insert(STAFF_ROLE_HEADER, "medecin".parse().expect("header value"));

    let response = settings_handler::<MemoryAlerts>(State(Arc::new(service)), headers).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["boundaries"]["critical"], 9);
    assert_eq!(body["questions"].as_array().map(Vec::len), Some(6));
}

#[test]
fn headers_without_a_known_role_resolve_to_an_unrecognised_actor() {
    let mut headers = axum::http::HeaderMap::new();
    headers.insert(STAFF_ID_HEADER, "amira".parse().expect("header value"));
    headers.insert(STAFF_ROLE_HEADER, "infirmier".parse().expect("header value"));
    let actor = actor_from_headers(&headers);
    assert_eq!(actor.staff_id.0, "amira");
    assert_eq!(actor.role, None);

    headers.insert(STAFF_ROLE_HEADER, "MEDECIN".parse().expect("header value"));
    assert_eq!(actor_from_headers(&headers).role, Some(Role::Medecin));
}

#[test]
fn error_kinds_map_to_http_statuses() {
    assert_eq!(
        status_for(TriageErrorKind::Validation),
        StatusCode::UNPROCESSABLE_ENTITY
    );
    assert_eq!(
        status_for(TriageErrorKind::ImmutableRecord),
        StatusCode::CONFLICT
    );
    assert_eq!(
        status_for(TriageErrorKind::Authorization),
        StatusCode::FORBIDDEN
    );
}
