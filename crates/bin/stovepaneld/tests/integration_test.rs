//! End-to-end tests for the full stovepaneld stack.
//!
//! Each test spins up the complete application (in-memory `SQLite`, simulated
//! stove and thermostats, real services, real axum router) and exercises the
//! HTTP layer via `tower::ServiceExt::oneshot`, no TCP port is bound.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use stovepanel_adapter_http_axum::router;
use stovepanel_adapter_http_axum::state::AppState;
use stovepanel_adapter_storage_sqlite_sqlx::{
    Config, SqliteCoordinationEventLog, SqliteStateStore,
};
use stovepanel_adapter_virtual::{Seed, VirtualPlant};
use stovepanel_app::ports::{ApplianceController, SystemClock, ZoneGateway};
use stovepanel_app::settings::EngineSettings;
use stovepanel_domain::zone::ZoneMode;
use tower::ServiceExt;

/// Build a fully-wired router backed by an in-memory `SQLite` database.
async fn app() -> (axum::Router, VirtualPlant) {
    let db = Config {
        database_url: "sqlite::memory:".to_string(),
    }
    .build()
    .await
    .expect("in-memory database should initialise");
    let pool = db.pool().clone();

    let plant = VirtualPlant::from_seed(&Seed::default());
    let state = AppState::new(
        SqliteStateStore::new(pool.clone()),
        plant.stove.clone(),
        plant.thermostats.clone(),
        SqliteCoordinationEventLog::new(pool),
        SystemClock,
        &EngineSettings::default(),
    );

    (router::build(state), plant)
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-operator", "alice");
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn all_day_schedule(name: &str) -> Value {
    let slot = json!([{"start": "00:00", "end": "24:00", "power": 3, "fan": 2}]);
    let days = [
        "monday",
        "tuesday",
        "wednesday",
        "thursday",
        "friday",
        "saturday",
        "sunday",
    ];
    let slots: serde_json::Map<String, Value> = days
        .iter()
        .map(|day| ((*day).to_string(), slot.clone()))
        .collect();
    json!({"name": name, "slots": slots})
}

async fn activate_all_day_schedule(app: &axum::Router) {
    let (status, _) = send(app, "POST", "/api/schedules", Some(all_day_schedule("Winter"))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(app, "PUT", "/api/schedules/active", Some(json!({"id": "winter"}))).await;
    assert_eq!(status, StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_return_ok_when_health_check_called() {
    let (app, _) = app().await;
    let resp = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Schedules
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_manage_schedule_lifecycle() {
    let (app, _) = app().await;

    let (status, _) = send(&app, "GET", "/api/schedules/active", None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    activate_all_day_schedule(&app).await;

    let (status, active) = send(&app, "GET", "/api/schedules/active", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(active["id"], "winter");
    assert_eq!(active["updated_by"], "alice");

    let (status, list) = send(&app, "GET", "/api/schedules", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "DELETE", "/api/schedules/winter", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn should_keep_pointer_when_activating_missing_schedule() {
    let (app, _) = app().await;
    activate_all_day_schedule(&app).await;

    let (status, _) = send(&app, "PUT", "/api/schedules/active", Some(json!({"id": "missing-id"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, active) = send(&app, "GET", "/api/schedules/active", None).await;
    assert_eq!(active["id"], "winter");
}

#[tokio::test]
async fn should_replace_one_day_and_reject_invalid_slots() {
    let (app, _) = app().await;
    activate_all_day_schedule(&app).await;

    let slots = json!([{"start": "06:00", "end": "08:00", "power": 4, "fan": 3}]);
    let (status, schedule) = send(&app, "PUT", "/api/schedules/active/days/monday", Some(slots)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(schedule["slots"]["monday"][0]["power"], 4);
    assert_eq!(schedule["slots"]["tuesday"][0]["power"], 3);

    let invalid = json!([{"start": "06:00", "end": "08:00", "power": 9, "fan": 3}]);
    let (status, _) = send(&app, "PUT", "/api/schedules/active/days/tuesday", Some(invalid)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "PUT", "/api/schedules/active/days/someday", Some(json!([]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, active) = send(&app, "GET", "/api/schedules/active", None).await;
    assert_eq!(active["slots"]["tuesday"][0]["power"], 3);
}

// ---------------------------------------------------------------------------
// Scheduler mode and scheduler cycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_ignite_stove_when_automation_enabled() {
    let (app, plant) = app().await;
    activate_all_day_schedule(&app).await;

    let (_, outcome) = send(&app, "POST", "/api/cycles/scheduler", None).await;
    assert_eq!(outcome["outcome"], "manual");

    let (status, mode) = send(&app, "PUT", "/api/scheduler/mode", Some(json!({"enabled": true}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mode["enabled"], true);

    let (status, outcome) = send(&app, "POST", "/api/cycles/scheduler", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["outcome"], "ignited");
    assert_eq!(plant.stove.power().get(), 3);
    assert_eq!(plant.stove.fan().get(), 2);
}

#[tokio::test]
async fn should_hold_and_release_semi_manual() {
    let (app, _) = app().await;
    activate_all_day_schedule(&app).await;
    send(&app, "PUT", "/api/scheduler/mode", Some(json!({"enabled": true}))).await;

    let deadline = chrono::Utc::now() + chrono::Duration::hours(1);
    let (status, mode) = send(
        &app,
        "POST",
        "/api/scheduler/semi-manual",
        Some(json!({"return_to_auto_at": deadline})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mode["semi_manual"], true);

    let (_, outcome) = send(&app, "POST", "/api/cycles/scheduler", None).await;
    assert_eq!(outcome["outcome"], "semi_manual");

    let (status, mode) = send(&app, "DELETE", "/api/scheduler/semi-manual", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mode["enabled"], true);
    assert_eq!(mode["semi_manual"], false);
}

#[tokio::test]
async fn should_reject_semi_manual_deadline_in_the_past() {
    let (app, _) = app().await;
    let deadline = chrono::Utc::now() - chrono::Duration::minutes(1);
    let (status, _) = send(
        &app,
        "POST",
        "/api/scheduler/semi-manual",
        Some(json!({"return_to_auto_at": deadline})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Coordination
// ---------------------------------------------------------------------------

async fn enable_sync(app: &axum::Router) {
    let config = json!({
        "enabled": true,
        "rooms": [{"room_id": "living", "name": "Living room"}],
    });
    let (status, saved) = send(app, "PUT", "/api/coordination/config", Some(config)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["updated_by"], "alice");
}

#[tokio::test]
async fn should_boost_then_restore_synced_rooms() {
    let (app, plant) = app().await;
    enable_sync(&app).await;
    plant.stove.force_heating();

    let (_, outcome) = send(&app, "POST", "/api/cycles/coordination", None).await;
    assert_eq!(outcome["outcome"], "applied");
    assert_eq!(outcome["rooms"], json!(["living"]));

    let zones = plant.thermostats.zone_states().await.unwrap();
    let living = zones.iter().find(|zone| zone.room_id.as_str() == "living").unwrap();
    assert_eq!(living.mode, ZoneMode::Manual);
    assert_eq!(living.setpoint, Some(22.0));

    let (_, outcome) = send(&app, "POST", "/api/cycles/coordination", None).await;
    assert_eq!(outcome["outcome"], "debouncing");

    plant.stove.shutdown().await.unwrap();
    let (_, outcome) = send(&app, "POST", "/api/cycles/coordination", None).await;
    assert_eq!(outcome["outcome"], "restored");

    let zones = plant.thermostats.zone_states().await.unwrap();
    let living = zones.iter().find(|zone| zone.room_id.as_str() == "living").unwrap();
    assert_eq!(living.mode, ZoneMode::Home);
    assert_eq!(living.setpoint, Some(20.0));

    let (_, outcome) = send(&app, "POST", "/api/cycles/coordination", None).await;
    assert_eq!(outcome["outcome"], "noop");

    let (status, events) = send(&app, "GET", "/api/coordination/events?limit=2", None).await;
    assert_eq!(status, StatusCode::OK);
    let events = events.as_array().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["outcome"]["outcome"], "noop");
    assert_eq!(events[1]["outcome"]["outcome"], "restored");
}

#[tokio::test]
async fn should_report_gateway_outage_as_error_outcome() {
    let (app, plant) = app().await;
    enable_sync(&app).await;
    plant.stove.force_heating();
    plant.thermostats.set_offline(true);

    let (status, outcome) = send(&app, "POST", "/api/cycles/coordination", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["outcome"], "error");
    assert_eq!(outcome["stage"], "zone_api");
}

// ---------------------------------------------------------------------------
// Power controller
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_drive_power_level_from_controller() {
    let (app, plant) = app().await;
    send(&app, "PUT", "/api/scheduler/mode", Some(json!({"enabled": true}))).await;
    let config = json!({"enabled": true, "zone_id": "living", "setpoint": 22.0});
    let (status, saved) = send(&app, "PUT", "/api/pid/config", Some(config)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["kp"], 0.5);

    let (_, outcome) = send(&app, "POST", "/api/cycles/power", None).await;
    assert_eq!(outcome["outcome"], "skipped");
    assert_eq!(outcome["reason"], "not_heating");

    plant.stove.force_heating();
    let (_, outcome) = send(&app, "POST", "/api/cycles/power", None).await;
    assert_eq!(outcome["outcome"], "adjusted");
    assert_eq!(outcome["level"], 2);
    assert_eq!(plant.stove.power().get(), 2);
}

#[tokio::test]
async fn should_preview_controller_step() {
    let (app, _) = app().await;
    let request = json!({"setpoint": 21.0, "measured": 19.0, "dt_minutes": 5.0});
    let (status, step) = send(&app, "POST", "/api/pid/preview", Some(request)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(step["level"], 2);

    let invalid = json!({"gains": {"kp": -1.0}, "setpoint": 21.0, "measured": 19.0});
    let (status, _) = send(&app, "POST", "/api/pid/preview", Some(invalid)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
