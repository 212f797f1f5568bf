use actix_web::http::StatusCode;
use actix_web::test;
use backend_test_support::unique_helpers::unique_participant;
use serde_json::json;

use super::{create_session, get, pool_json, post};
use crate::common::assert_problem;
use crate::support::{create_test_app, test_state};

#[actix_web::test]
async fn missing_participant_header() {
    let app = create_test_app(test_state().await).await;
    let req = test::TestRequest::post()
        .uri("/api/sessions")
        .set_json(pool_json(&["a"]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem(resp, StatusCode::BAD_REQUEST, "MISSING_PARTICIPANT").await;
}

#[actix_web::test]
async fn malformed_session_id() {
    let app = create_test_app(test_state().await).await;
    let req = get("/api/sessions/not-a-session", "p1").to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem(resp, StatusCode::BAD_REQUEST, "INVALID_SESSION_ID").await;
}

#[actix_web::test]
async fn unknown_session() {
    let app = create_test_app(test_state().await).await;
    let uri = format!("/api/sessions/{}", uuid::Uuid::new_v4());
    let resp = test::call_service(&app, get(&uri, "p1").to_request()).await;
    assert_problem(resp, StatusCode::NOT_FOUND, "SESSION_NOT_FOUND").await;
}

#[actix_web::test]
async fn outsiders_and_guests_are_forbidden() {
    let app = create_test_app(test_state().await).await;
    let host = unique_participant("host");
    let guest = unique_participant("guest");
    let created = create_session(&app, &host, &["a"]).await;
    let id = created["id"].as_str().unwrap();

    let req = get(&format!("/api/sessions/{id}"), "stranger").to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem(resp, StatusCode::FORBIDDEN, "NOT_A_PARTICIPANT").await;

    let req = post(&format!("/api/sessions/{id}/join"), &guest).to_request();
    assert!(test::call_service(&app, req).await.status().is_success());
    let req = post(&format!("/api/sessions/{id}/start"), &guest).to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem(resp, StatusCode::FORBIDDEN, "NOT_HOST").await;
}

#[actix_web::test]
async fn empty_pool_is_rejected() {
    let app = create_test_app(test_state().await).await;
    let req = post("/api/sessions", "host")
        .set_json(json!({ "candidates": [] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem(resp, StatusCode::BAD_REQUEST, "EMPTY_CANDIDATE_POOL").await;
}

#[actix_web::test]
async fn malformed_json_is_a_validation_error() {
    let app = create_test_app(test_state().await).await;
    let req = post("/api/sessions", "host")
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"candidates\": [")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem(resp, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await;
}

#[actix_web::test]
async fn swiping_before_start() {
    let app = create_test_app(test_state().await).await;
    let created = create_session(&app, "host", &["a"]).await;
    let id = created["id"].as_str().unwrap();

    let req = post(&format!("/api/sessions/{id}/votes"), "host")
        .set_json(json!({ "candidate_id": "a", "round_number": 1, "direction": "reject" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem(resp, StatusCode::UNPROCESSABLE_ENTITY, "SESSION_NOT_STARTED").await;
}
