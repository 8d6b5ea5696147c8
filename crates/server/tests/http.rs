//! Router tests driven through `tower::ServiceExt::oneshot`.
//!
//! The runner loop is not started; time moves only through the manual clock
//! and events are dispatched by hand.

use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use onelane_arbiter::{ArbiterConfig, BridgeArbiter};
use onelane_core::Event;
use onelane_server::{router, BridgeHandle, BridgeRunner, CrossingJournal};
use onelane_test_helpers::{secs, ManualClock};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct Harness {
    app: Router,
    handle: BridgeHandle,
    clock: Arc<ManualClock>,
    // Keeps the timer channel open for timers armed by dispatch.
    _runner: BridgeRunner,
}

fn harness_with(journal: Option<CrossingJournal>) -> Harness {
    let clock = Arc::new(ManualClock::new(secs(1_700_000_000)));
    let runner = BridgeRunner::new(
        BridgeArbiter::new(ArbiterConfig::default()),
        clock.clone(),
        journal,
    )
    .unwrap();
    let handle = runner.handle();
    Harness {
        app: router(handle.clone()),
        handle,
        clock,
        _runner: runner,
    }
}

fn harness() -> Harness {
    harness_with(None)
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            request = request.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register(app: &Router, direction: &str, speed: i64) -> u64 {
    let (status, body) = call(
        app,
        "POST",
        "/vehicles",
        Some(json!({ "direction": direction, "speed": speed })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    body["vehicle"]["id"].as_u64().unwrap()
}

#[tokio::test]
async fn test_health() {
    let h = harness();
    let (status, body) = call(&h.app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_register_admits_first_vehicle() {
    let h = harness();
    let (status, body) = call(
        &h.app,
        "POST",
        "/vehicles",
        Some(json!({ "direction": "NORTE", "speed": 10, "token": "uuid-1" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["vehicle"]["id"], 1);
    assert_eq!(body["vehicle"]["token"], "uuid-1");
    assert_eq!(body["vehicle"]["direction"], "NORTH");
    assert_eq!(body["vehicle"]["status"], "CROSSING");
    assert_eq!(body["vehicle"]["crossing_duration_ms"], 4_000);
    assert_eq!(body["bridge"]["busy"], true);
    assert_eq!(body["bridge"]["current_vehicle_id"], 1);
    assert_eq!(body["bridge"]["traffic_light"], "RED");
}

#[tokio::test]
async fn test_invalid_input_is_400() {
    let h = harness();
    let cases = [
        json!({ "direction": "NORTH", "speed": 0 }),
        json!({ "direction": "NORTH", "speed": 11 }),
        json!({ "direction": "NORTH" }),
        json!({ "speed": 5 }),
        json!({ "direction": "EAST", "speed": 5 }),
        json!({ "direction": "NORTH", "speed": "fast" }),
        json!({ "direction": "NORTH", "speed": 5.5 }),
        json!({ "direction": 7, "speed": 5 }),
        json!(["NORTH", 5]),
    ];
    for case in cases {
        let (status, body) = call(&h.app, "POST", "/vehicles", Some(case.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", case);
        assert_eq!(body["error"], "invalid_input");
    }

    // Nothing entered the system.
    let (_, bridge) = call(&h.app, "GET", "/bridge", None).await;
    assert_eq!(bridge["busy"], false);
    assert_eq!(bridge["traffic_light"], "GREEN");
}

#[tokio::test]
async fn test_unknown_vehicle_is_404() {
    let h = harness();
    for (method, uri) in [
        ("GET", "/vehicles/42"),
        ("POST", "/vehicles/42/heartbeat"),
        ("POST", "/vehicles/42/stop"),
        ("GET", "/vehicles/42/stats"),
    ] {
        let (status, body) = call(&h.app, method, uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{} {}", method, uri);
        assert_eq!(body["error"], "not_found");
    }
}

#[tokio::test]
async fn test_queues_and_bridge() {
    let h = harness();
    let north = register(&h.app, "NORTH", 10).await;
    let south = register(&h.app, "SUR", 1).await;
    let north_2 = register(&h.app, "north", 5).await;

    let (status, queues) = call(&h.app, "GET", "/queues", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(queues, json!({ "north": [north_2], "south": [south] }));

    let (_, bridge) = call(&h.app, "GET", "/bridge", None).await;
    assert_eq!(bridge["current_vehicle_id"], north);
    assert_eq!(bridge["current_direction"], "NORTH");
    assert_eq!(bridge["north_queue"], 1);
    assert_eq!(bridge["south_queue"], 1);
}

#[tokio::test]
async fn test_crossing_then_stats() {
    let h = harness();
    let north = register(&h.app, "NORTH", 10).await;
    let south = register(&h.app, "SOUTH", 1).await;

    h.clock.advance(secs(4));
    h.handle.dispatch(Event::SchedulerTick);

    let (_, bridge) = call(&h.app, "GET", "/bridge", None).await;
    assert_eq!(bridge["current_vehicle_id"], south);

    let (_, vehicle) = call(&h.app, "GET", &format!("/vehicles/{}", north), None).await;
    assert_eq!(vehicle["status"], "RESTING");
    assert_eq!(
        vehicle["can_requeue_at_ms"].as_u64().unwrap(),
        (1_700_000_000 + 4 + 5) * 1_000
    );

    let (status, stats) = call(&h.app, "GET", &format!("/vehicles/{}/stats", north), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_crossings"], 1);
    assert_eq!(stats["avg_crossing_time_sec"], 4.0);
    assert_eq!(stats["total_time_on_bridge_sec"], 4.0);
    assert_eq!(stats["time_in_bridge_percent"], 100.0);
}

#[tokio::test]
async fn test_evicted_vehicle_is_410() {
    let h = harness();
    register(&h.app, "NORTH", 1).await;
    let waiting = register(&h.app, "SOUTH", 5).await;

    h.clock.advance(secs(11));
    h.handle.dispatch(Event::LivenessScan);

    let (_, queues) = call(&h.app, "GET", "/queues", None).await;
    assert_eq!(queues["south"], json!([]));

    for (method, uri) in [
        ("GET", format!("/vehicles/{}", waiting)),
        ("POST", format!("/vehicles/{}/heartbeat", waiting)),
        ("POST", format!("/vehicles/{}/stop", waiting)),
        ("GET", format!("/vehicles/{}/stats", waiting)),
    ] {
        let (status, body) = call(&h.app, method, &uri, None).await;
        assert_eq!(status, StatusCode::GONE, "{} {}", method, uri);
        assert_eq!(body["error"], "expired_session");
    }
}

#[tokio::test]
async fn test_heartbeat_and_idempotent_stop() {
    let h = harness();
    let id = register(&h.app, "NORTH", 10).await;

    h.clock.advance(secs(2));
    let (status, body) = call(&h.app, "POST", &format!("/vehicles/{}/heartbeat", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));
    // Heartbeats reach the published record on the next tick.
    h.handle.dispatch(Event::SchedulerTick);
    let (_, vehicle) = call(&h.app, "GET", &format!("/vehicles/{}", id), None).await;
    assert_eq!(
        vehicle["last_heartbeat_ms"].as_u64().unwrap(),
        (1_700_000_000 + 2) * 1_000
    );

    for _ in 0..2 {
        let (status, _) = call(&h.app, "POST", &format!("/vehicles/{}/stop", id), None).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (_, vehicle) = call(&h.app, "GET", &format!("/vehicles/{}", id), None).await;
    assert_eq!(vehicle["status"], "CROSSING");
    assert_eq!(vehicle["stop_requested"], true);

    h.clock.advance(secs(2));
    h.handle.dispatch(Event::SchedulerTick);
    let (_, vehicle) = call(&h.app, "GET", &format!("/vehicles/{}", id), None).await;
    assert_eq!(vehicle["status"], "RETIRED");
    assert_eq!(vehicle["retire_reason"], "stopped");

    // Stopped vehicles keep their stats but cannot heartbeat.
    let (status, stats) = call(&h.app, "GET", &format!("/vehicles/{}/stats", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_crossings"], 1);
    let (status, _) = call(&h.app, "POST", &format!("/vehicles/{}/heartbeat", id), None).await;
    assert_eq!(status, StatusCode::GONE);
}

#[tokio::test]
async fn test_token_reuse_returns_same_vehicle() {
    let h = harness();
    let request = json!({ "direction": "SOUTH", "speed": 3, "token": "uuid-7" });
    let (_, first) = call(&h.app, "POST", "/vehicles", Some(request.clone())).await;
    let (_, second) = call(&h.app, "POST", "/vehicles", Some(request)).await;

    assert_eq!(first["vehicle"]["id"], second["vehicle"]["id"]);
    let (_, queues) = call(&h.app, "GET", "/queues", None).await;
    assert_eq!(queues, json!({ "north": [], "south": [] }));
}

#[tokio::test]
async fn test_completed_crossings_are_journaled() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("crossings.jsonl");
    let h = harness_with(Some(CrossingJournal::open(&path).unwrap()));

    let id = register(&h.app, "NORTH", 10).await;
    h.clock.advance(secs(4));
    h.handle.dispatch(Event::SchedulerTick);

    let records = CrossingJournal::replay(&path).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].vehicle_id.0, id);

    // A fresh arbiter seeded from the journal reports the same history.
    let mut restored = BridgeArbiter::new(ArbiterConfig::default());
    restored.restore_records(records);
    let next = restored
        .register(onelane_types::Direction::North, 5, None)
        .unwrap();
    assert!(next.0 > id);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let h = harness();
    register(&h.app, "NORTH", 10).await;
    let waiting = register(&h.app, "SOUTH", 5).await;

    h.clock.advance(secs(4));
    h.handle.dispatch(Event::SchedulerTick);
    call(&h.app, "POST", &format!("/vehicles/{}/stop", waiting), None).await;

    let response = h
        .app
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));

    let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    for line in [
        "onelane_admissions_total 2",
        "onelane_crossings_completed_total 1",
        "onelane_vehicles_retired_total{reason=\"evicted\"} 0",
        "onelane_queue_depth{direction=\"NORTH\"} 0",
        "onelane_queue_depth{direction=\"SOUTH\"} 0",
        "onelane_bridge_busy 1",
        "onelane_live_vehicles 2",
    ] {
        assert!(text.lines().any(|l| l == line), "missing {:?} in:\n{}", line, text);
    }
}
