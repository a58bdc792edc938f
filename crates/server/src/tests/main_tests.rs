use super::*;
use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
};
use rand::{rngs::StdRng, SeedableRng};
use shared::domain::{SequenceId, Speed};
use std::time::Duration;
use tower::ServiceExt;

fn test_state() -> AppState {
    AppState::new(SequencePlayer::with_rng(
        SequenceId(1),
        Speed::Normal,
        StdRng::seed_from_u64(3),
    ))
}

fn rpc_request(body: serde_json::Value) -> Request<Body> {
    Request::post("/rpc")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf8")
}

#[tokio::test]
async fn healthz_reports_ok() {
    let app = build_router(test_state());
    let request = Request::get("/healthz")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn status_reports_default_sequence() {
    let app = build_router(test_state());
    let request = Request::get("/status").body(Body::empty()).expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let status: DeviceStatus = serde_json::from_str(&body_text(response).await).expect("json");
    assert_eq!(status, DeviceStatus::new(SequenceId(1), Speed::Normal));
}

#[tokio::test]
async fn set_sequence_is_visible_in_following_status() {
    let state = test_state();
    let app = build_router(state.clone());

    let response = app
        .clone()
        .oneshot(rpc_request(serde_json::json!({
            "command": "setSequence",
            "sequenceID": 3,
            "speed": 500,
        })))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let reply: serde_json::Value =
        serde_json::from_str(&body_text(response).await).expect("json");
    assert_eq!(
        reply,
        serde_json::json!({ "ok": true, "sequenceID": 3, "speed": 500 })
    );

    tokio::time::timeout(Duration::from_secs(1), state.restart.notified())
        .await
        .expect("playback restart requested");

    let request = Request::get("/status").body(Body::empty()).expect("request");
    let response = app.oneshot(request).await.expect("response");
    let status: DeviceStatus = serde_json::from_str(&body_text(response).await).expect("json");
    assert_eq!(status, DeviceStatus::new(SequenceId(3), Speed::Fast));
}

#[tokio::test]
async fn rejected_rpc_replies_with_plain_text_422() {
    let app = build_router(test_state());
    let response = app
        .oneshot(rpc_request(serde_json::json!({
            "command": "setDefault",
            "sequenceID": 2,
        })))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_text(response).await, "Missing required field: speed");
}

#[tokio::test]
async fn set_default_leaves_current_status_alone() {
    let state = test_state();
    let app = build_router(state.clone());
    let response = app
        .oneshot(rpc_request(serde_json::json!({
            "command": "setDefault",
            "sequenceID": 6,
            "speed": 2000,
        })))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let player = state.player.lock().await;
    assert_eq!(
        player.default_status(),
        DeviceStatus::new(SequenceId(6), Speed::Slow)
    );
    assert_eq!(player.status(), DeviceStatus::new(SequenceId(1), Speed::Normal));
}

#[tokio::test]
async fn index_embeds_builtin_sequence_names() {
    let app = build_router(test_state());
    let request = Request::get("/").body(Body::empty()).expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let page = body_text(response).await;
    assert!(page.contains(r#"id="sequencelist">["Chase Single","Chase Double""#));
}
