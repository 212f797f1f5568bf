use std::future::poll_fn;
use std::pin::Pin;
use std::time::Duration;

use actix_web::body::{BoxBody, MessageBody};
use actix_web::web::Bytes;
use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::json;

use super::{create_session, get, post};
use crate::common::assert_problem;
use crate::support::{create_test_app, test_state};

async fn next_chunk(body: &mut BoxBody) -> Bytes {
    tokio::time::timeout(
        Duration::from_secs(2),
        poll_fn(|cx| Pin::new(&mut *body).poll_next(cx)),
    )
    .await
    .expect("event within timeout")
    .expect("stream open")
    .expect("chunk")
}

#[actix_web::test]
async fn members_receive_change_notifications() {
    let app = create_test_app(test_state().await).await;
    let created = create_session(&app, "host", &["a", "b"]).await;
    let id = created["id"].as_str().unwrap().to_string();
    let req = post(&format!("/api/sessions/{id}/start"), "host").to_request();
    assert!(test::call_service(&app, req).await.status().is_success());

    let req = get(&format!("/api/sessions/{id}/events"), "host").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "text/event-stream"
    );
    let mut body = resp.into_body();

    assert_eq!(&next_chunk(&mut body).await[..], b": connected\n\n");

    let req = post(&format!("/api/sessions/{id}/votes"), "host")
        .set_json(json!({ "candidate_id": "a", "round_number": 1, "direction": "accept" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let chunk = next_chunk(&mut body).await;
    let text = std::str::from_utf8(&chunk).unwrap();
    assert!(text.starts_with("data: "), "{text}");
    assert!(text.contains("\"type\":\"vote_recorded\""), "{text}");
    assert!(text.ends_with("\n\n"));
}

#[actix_web::test]
async fn outsiders_cannot_listen() {
    let app = create_test_app(test_state().await).await;
    let created = create_session(&app, "host", &["a"]).await;
    let id = created["id"].as_str().unwrap();

    let req = get(&format!("/api/sessions/{id}/events"), "stranger").to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem(resp, StatusCode::FORBIDDEN, "NOT_A_PARTICIPANT").await;
}
