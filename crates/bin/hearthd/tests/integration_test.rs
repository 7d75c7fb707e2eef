//! End-to-end tests for the full hearthd stack.
//!
//! Each test spins up the complete application (seeded registry, real hub,
//! real axum router) and exercises the HTTP layer via
//! `tower::ServiceExt::oneshot` — no TCP port is bound. Scheduler time is
//! driven directly through `Hub::tick` with fixed timestamps instead of
//! the background ticker.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{TimeZone, Utc};
use http_body_util::BodyExt;
use tower::ServiceExt;

use hearth_adapter_http_axum::router;
use hearth_adapter_http_axum::state::AppState;
use hearth_app::hub::Hub;
use hearth_app::registry::DeviceRegistry;
use hearth_domain::device::{Device, DeviceKind};
use hearth_domain::time::Timestamp;

/// Build a fully-wired router and keep a handle on the hub for driving
/// scheduler ticks.
fn app() -> (axum::Router, Arc<Hub>) {
    let registry = Arc::new(DeviceRegistry::new());
    registry
        .register(Device::new("Living Room Light", DeviceKind::Light))
        .expect("seed light");
    registry
        .register(Device::new("Bedroom Thermostat", DeviceKind::Thermostat))
        .expect("seed thermostat");
    registry
        .register(Device::new("Front Door Camera", DeviceKind::SecurityCamera))
        .expect("seed camera");

    let hub = Arc::new(Hub::new(registry));
    let app = router::build(AppState::new(Arc::clone(&hub)));
    (app, hub)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn put_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(resp: axum::response::Response) -> serde_json::Value {
    serde_json::from_slice(&resp.into_body().collect().await.unwrap().to_bytes()).unwrap()
}

fn at(h: u32, m: u32) -> Timestamp {
    Utc.with_ymd_and_hms(2024, 5, 1, h, m, 0).unwrap()
}

// ---------------------------------------------------------------------------
// Health & device queries
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_return_ok_when_health_check_called() {
    let (app, _) = app();
    let resp = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn should_list_seeded_devices_in_order() {
    let (app, _) = app();
    let resp = app.oneshot(get("/api/devices")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = json_body(resp).await;
    let names: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        names,
        vec!["Living Room Light", "Bedroom Thermostat", "Front Door Camera"]
    );
}

#[tokio::test]
async fn should_expose_default_attributes() {
    let (app, _) = app();
    let resp = app
        .oneshot(get("/api/devices/Living%20Room%20Light"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = json_body(resp).await;
    assert_eq!(body["attributes"]["power"], false);
    assert_eq!(body["attributes"]["brightness"], 50);
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_apply_command_and_return_snapshot() {
    let (app, _) = app();
    let resp = app
        .oneshot(post_json(
            "/api/devices/Living%20Room%20Light/command",
            serde_json::json!({"attribute": "power", "value": true}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = json_body(resp).await;
    assert_eq!(body["attributes"]["power"], true);
}

#[tokio::test]
async fn should_clamp_out_of_range_command() {
    let (app, _) = app();
    let resp = app
        .oneshot(post_json(
            "/api/devices/Bedroom%20Thermostat/command",
            serde_json::json!({"attribute": "temperature", "value": 95}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = json_body(resp).await;
    assert_eq!(body["attributes"]["temperature"], 80);
}

#[tokio::test]
async fn should_reject_mistyped_command() {
    let (app, hub) = app();
    let resp = app
        .oneshot(post_json(
            "/api/devices/Living%20Room%20Light/command",
            serde_json::json!({"attribute": "power", "value": 1}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Nothing applied, nothing logged.
    assert!(hub.execution_log(10).is_empty());
}

#[tokio::test]
async fn should_return_not_found_for_unknown_device_command() {
    let (app, _) = app();
    let resp = app
        .oneshot(post_json(
            "/api/devices/Garage%20Door/command",
            serde_json::json!({"attribute": "power", "value": true}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Scheduled tasks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_complete_task_schedule_cancel_cycle() {
    let (app, _) = app();

    let resp = app
        .clone()
        .oneshot(post_json(
            "/api/tasks",
            serde_json::json!({
                "device": "Living Room Light",
                "attribute": "power",
                "value": true,
                "at": "06:00",
                "recurrence": "once"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = json_body(resp).await;
    assert_eq!(body["state"], "pending");
    assert_eq!(body["at"], "06:00");
    let task_id = body["id"].as_str().unwrap().to_string();

    // Listed in creation order.
    let resp = app.clone().oneshot(get("/api/tasks")).await.unwrap();
    let body = json_body(resp).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    // Cancel, then cancel again (idempotent).
    let resp = app
        .clone()
        .oneshot(post_json(
            &format!("/api/tasks/{task_id}/cancel"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app
        .clone()
        .oneshot(post_json(
            &format!("/api/tasks/{task_id}/cancel"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app.oneshot(get("/api/tasks")).await.unwrap();
    let body = json_body(resp).await;
    assert_eq!(body[0]["state"], "cancelled");
}

#[tokio::test]
async fn should_reject_malformed_trigger_time() {
    let (app, _) = app();
    let resp = app
        .oneshot(post_json(
            "/api/tasks",
            serde_json::json!({
                "device": "Living Room Light",
                "attribute": "power",
                "value": true,
                "at": "25:99"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn should_reject_task_for_unknown_device() {
    let (app, _) = app();
    let resp = app
        .oneshot(post_json(
            "/api/tasks",
            serde_json::json!({
                "device": "Garage Door",
                "attribute": "power",
                "value": true,
                "at": "06:00"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn should_fire_scheduled_task_and_conflict_on_late_cancel() {
    let (app, hub) = app();

    let resp = app
        .clone()
        .oneshot(post_json(
            "/api/tasks",
            serde_json::json!({
                "device": "Living Room Light",
                "attribute": "brightness",
                "value": 90,
                "at": "06:00",
                "recurrence": "once"
            }),
        ))
        .await
        .unwrap();
    let task_id = json_body(resp).await["id"].as_str().unwrap().to_string();

    hub.tick(at(6, 0)).await;

    let resp = app
        .clone()
        .oneshot(get("/api/devices/Living%20Room%20Light"))
        .await
        .unwrap();
    let body = json_body(resp).await;
    assert_eq!(body["attributes"]["brightness"], 90);

    // Cancelling after firing conflicts.
    let resp = app
        .oneshot(post_json(
            &format!("/api/tasks/{task_id}/cancel"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn should_purge_terminal_tasks() {
    let (app, hub) = app();

    let resp = app
        .clone()
        .oneshot(post_json(
            "/api/tasks",
            serde_json::json!({
                "device": "Living Room Light",
                "attribute": "power",
                "value": true,
                "at": "06:00",
                "recurrence": "once"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    hub.tick(at(6, 0)).await;

    let resp = app
        .clone()
        .oneshot(post_json("/api/tasks/purge", serde_json::json!({})))
        .await
        .unwrap();
    let body = json_body(resp).await;
    assert_eq!(body["purged"], 1);

    let resp = app.oneshot(get("/api/tasks")).await.unwrap();
    let body = json_body(resp).await;
    assert!(body.as_array().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_cascade_rule_from_command() {
    let (app, _) = app();

    let resp = app
        .clone()
        .oneshot(post_json(
            "/api/rules",
            serde_json::json!({
                "condition": {
                    "device": "Living Room Light",
                    "attribute": "power",
                    "op": "=",
                    "value": true
                },
                "action": {
                    "device": "Bedroom Thermostat",
                    "attribute": "power",
                    "value": true
                }
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = json_body(resp).await;
    assert_eq!(body["enabled"], true);

    app.clone()
        .oneshot(post_json(
            "/api/devices/Living%20Room%20Light/command",
            serde_json::json!({"attribute": "power", "value": true}),
        ))
        .await
        .unwrap();

    let resp = app
        .clone()
        .oneshot(get("/api/devices/Bedroom%20Thermostat"))
        .await
        .unwrap();
    let body = json_body(resp).await;
    assert_eq!(body["attributes"]["power"], true);

    // The log records both origins, newest first.
    let resp = app.oneshot(get("/api/log")).await.unwrap();
    let body = json_body(resp).await;
    let origins: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["origin"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(origins, vec!["rule", "user_command"]);
}

#[tokio::test]
async fn should_not_fire_disabled_rule() {
    let (app, _) = app();

    let resp = app
        .clone()
        .oneshot(post_json(
            "/api/rules",
            serde_json::json!({
                "condition": {
                    "device": "Living Room Light",
                    "attribute": "power",
                    "op": "=",
                    "value": true
                },
                "action": {
                    "device": "Front Door Camera",
                    "attribute": "armed",
                    "value": true
                }
            }),
        ))
        .await
        .unwrap();
    let rule_id = json_body(resp).await["id"].as_str().unwrap().to_string();

    let resp = app
        .clone()
        .oneshot(put_json(
            &format!("/api/rules/{rule_id}/enabled"),
            serde_json::json!({"enabled": false}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    app.clone()
        .oneshot(post_json(
            "/api/devices/Living%20Room%20Light/command",
            serde_json::json!({"attribute": "power", "value": true}),
        ))
        .await
        .unwrap();

    let resp = app
        .oneshot(get("/api/devices/Front%20Door%20Camera"))
        .await
        .unwrap();
    let body = json_body(resp).await;
    assert_eq!(body["attributes"]["armed"], false);
}

#[tokio::test]
async fn should_redefine_rule_and_return_not_found_for_unknown_id() {
    let (app, _) = app();

    let resp = app
        .clone()
        .oneshot(post_json(
            "/api/rules",
            serde_json::json!({
                "condition": {
                    "device": "Living Room Light",
                    "attribute": "power",
                    "op": "=",
                    "value": true
                },
                "action": {
                    "device": "Front Door Camera",
                    "attribute": "armed",
                    "value": true
                }
            }),
        ))
        .await
        .unwrap();
    let rule_id = json_body(resp).await["id"].as_str().unwrap().to_string();

    let redefinition = serde_json::json!({
        "condition": {
            "device": "Bedroom Thermostat",
            "attribute": "temperature",
            "op": ">=",
            "value": 75
        },
        "action": {
            "device": "Front Door Camera",
            "attribute": "armed",
            "value": true
        }
    });

    let resp = app
        .clone()
        .oneshot(put_json(
            &format!("/api/rules/{rule_id}"),
            redefinition.clone(),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app.clone().oneshot(get("/api/rules")).await.unwrap();
    let body = json_body(resp).await;
    assert_eq!(body[0]["condition"]["device"], "Bedroom Thermostat");
    assert_eq!(body[0]["condition"]["op"], ">=");

    let resp = app
        .oneshot(put_json(
            &format!("/api/rules/{}", uuid_that_matches_nothing()),
            redefinition,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

fn uuid_that_matches_nothing() -> String {
    "00000000-0000-4000-8000-000000000000".to_string()
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_report_clean_diagnostics_on_fresh_system() {
    let (app, _) = app();
    let resp = app.oneshot(get("/api/diagnostics")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = json_body(resp).await;
    assert_eq!(body["bus_dropped_events"], 0);
    assert_eq!(body["rule_cycle_breaks"], 0);
}
