//! ---
//! ems_section: "15-testing-qa-runbook"
//! ems_subsection: "integration-tests"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Canned in-process DECODER API used by the end-to-end suites."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
//! Answers the DECODER contract with fixed bodies. Nothing is stored or
//! computed: ingest payloads are only captured for assertions, ownership
//! comes from the harness fixtures and forecasts are canned per building.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use decoder_client::ApiClient;
use decoder_testharness::Principal;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpListener;

pub const NORMAL_RECOMMENDATION: &str =
    "Energy consumption within normal range. No action required.";
pub const HIGH_RECOMMENDATION: &str =
    "Forecast exceeds threshold (127.0 > 100.0). Recommendation: Activate energy-saving mode.";
pub const INSUFFICIENT_RECOMMENDATION: &str =
    "Insufficient data for forecast. Collect more readings.";

/// Knobs for misbehaving stubs.
#[derive(Debug, Clone, Default)]
pub struct StubBehaviour {
    /// Skip every authorization check.
    pub open_access: bool,
    /// Answer every forecast with the normal recommendation.
    pub always_normal: bool,
    /// Sensor ids whose ingest is rejected with a 500.
    pub rejected_sensors: Vec<String>,
}

#[derive(Clone)]
struct StubState {
    behaviour: StubBehaviour,
    ingested: Arc<Mutex<Vec<Value>>>,
}

pub struct StubApi {
    pub addr: SocketAddr,
    ingested: Arc<Mutex<Vec<Value>>>,
}

impl StubApi {
    pub async fn spawn() -> Self {
        Self::spawn_with(StubBehaviour::default()).await
    }

    pub async fn spawn_with(behaviour: StubBehaviour) -> Self {
        let ingested = Arc::new(Mutex::new(Vec::new()));
        let state = StubState {
            behaviour,
            ingested: ingested.clone(),
        };
        let router = Router::new()
            .route("/actuator/health", get(health))
            .route("/ingest", post(ingest))
            .route("/buildings/:id/last-readings", get(last_readings))
            .route("/buildings/:id/forecast", get(forecast))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router.into_make_service())
                .await
                .unwrap();
        });
        Self { addr, ingested }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(
            self.base_url().parse().unwrap(),
            Duration::from_secs(2),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    pub fn ingested(&self) -> Vec<Value> {
        self.ingested.lock().clone()
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "UP" }))
}

async fn ingest(State(state): State<StubState>, Json(body): Json<Value>) -> Response {
    let sensor = body["sensorId"].as_str().unwrap_or_default().to_owned();
    if state.behaviour.rejected_sensors.contains(&sensor) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "sensor rejected").into_response();
    }
    state.ingested.lock().push(body.clone());
    (StatusCode::CREATED, Json(body)).into_response()
}

fn authorize(state: &StubState, headers: &HeaderMap, building_id: i64) -> Result<(), StatusCode> {
    if state.behaviour.open_access {
        return Ok(());
    }
    let token = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;
    let principal = Principal::from_token(token).ok_or(StatusCode::UNAUTHORIZED)?;
    if principal.may_access(building_id) {
        Ok(())
    } else {
        Err(StatusCode::FORBIDDEN)
    }
}

async fn last_readings(
    State(state): State<StubState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    if let Err(status) = authorize(&state, &headers, id) {
        return status.into_response();
    }
    Json(json!([
        { "buildingId": id, "sensorId": "sensor-001", "timestamp": "2024-01-01T10:00:00", "value": 50.0 },
        { "buildingId": id, "sensorId": "sensor-001", "timestamp": "2024-01-01T10:01:00", "value": 51.0 }
    ]))
    .into_response()
}

fn canned_points(value: f64) -> Vec<Value> {
    (1..=60)
        .map(|minute| json!({ "timestamp": format!("2024-01-01T11:{:02}:00", minute % 60), "value": value }))
        .collect()
}

async fn forecast(
    State(state): State<StubState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    if let Err(status) = authorize(&state, &headers, id) {
        return status.into_response();
    }
    let (points, recommendation) = match id {
        _ if state.behaviour.always_normal => (canned_points(47.67), NORMAL_RECOMMENDATION),
        1 => (canned_points(127.0), HIGH_RECOMMENDATION),
        2 => (canned_points(47.67), NORMAL_RECOMMENDATION),
        _ => (Vec::new(), INSUFFICIENT_RECOMMENDATION),
    };
    Json(json!({
        "buildingId": id,
        "forecast": points,
        "recommendation": recommendation
    }))
    .into_response()
}
