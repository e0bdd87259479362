use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub const DEFAULT_API_KEY: &str = "test-key";

/// Ids of the pods every fresh server starts with.
pub const SEEDED_PODS: [&str; 2] = ["abc123", "def456"];

const MAX_STATES: usize = 20;
const MAX_DAYS: u32 = 7;
const SAMPLES_PER_DAY: u32 = 4;
/// 2024-03-01T00:00:00Z, start of the synthetic history.
const HISTORY_START: i64 = 1_709_251_200;

#[derive(Debug, Clone)]
pub struct Pod {
    pub info: Map<String, Value>,
    pub ac_state: Map<String, Value>,
    /// Newest first.
    pub history: Vec<Value>,
    pub smart_mode: Map<String, Value>,
}

impl Pod {
    fn seeded(id: &str, room: &str) -> Self {
        let ac_state = as_object(json!({
            "on": false,
            "mode": "cool",
            "fanLevel": "auto",
            "temperatureUnit": "C",
            "temperature": 24,
            "swing": "stopped"
        }));
        let first = json!({
            "id": Uuid::new_v4().to_string(),
            "acState": ac_state,
            "status": "Success",
            "reason": "ExternalIrCommand",
            "changedProperties": [],
            "failureReason": null
        });
        Self {
            info: as_object(json!({
                "id": id,
                "room": {"name": room},
                "productModel": "skyv2",
                "temperatureUnit": "C"
            })),
            ac_state,
            history: vec![first],
            smart_mode: as_object(json!({
                "enabled": false,
                "type": "temperature",
                "lowTemperatureThreshold": 19,
                "highTemperatureThreshold": 26
            })),
        }
    }

    /// Apply a sparse state change and record it in the history.
    fn apply(&mut self, change: &Map<String, Value>) -> Value {
        let changed: Vec<String> = change
            .iter()
            .filter(|(k, v)| self.ac_state.get(*k) != Some(*v))
            .map(|(k, _)| k.clone())
            .collect();
        for (k, v) in change {
            self.ac_state.insert(k.clone(), v.clone());
        }
        let record = json!({
            "id": Uuid::new_v4().to_string(),
            "acState": self.ac_state,
            "status": "Success",
            "reason": "UserAPI",
            "changedProperties": changed,
            "failureReason": null
        });
        self.history.insert(0, record.clone());
        record
    }
}

pub struct AppState {
    pub api_key: String,
    pub pods: RwLock<HashMap<String, Pod>>,
}

pub type Db = Arc<AppState>;

fn as_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// `{"status": "success", "result": ...}`, as the real service answers.
fn success(result: Value) -> Json<Value> {
    Json(json!({"status": "success", "result": result}))
}

pub fn app() -> Router {
    app_with_key(DEFAULT_API_KEY)
}

pub fn app_with_key(api_key: &str) -> Router {
    let pods = HashMap::from([
        (SEEDED_PODS[0].to_string(), Pod::seeded(SEEDED_PODS[0], "Living room")),
        (SEEDED_PODS[1].to_string(), Pod::seeded(SEEDED_PODS[1], "Bedroom")),
    ]);
    let db: Db = Arc::new(AppState {
        api_key: api_key.to_string(),
        pods: RwLock::new(pods),
    });
    Router::new()
        .route("/users/me/pods", get(list_pods))
        .route("/pods/{id}", get(get_pod))
        .route("/pods/{id}/acStates", get(list_states).post(set_state))
        .route(
            "/pods/{id}/acStates/{state}",
            get(get_state).patch(set_state_property),
        )
        .route("/pods/{id}/measurements", get(measurements))
        .route("/pods/{id}/historicalMeasurements", get(historical))
        .route("/pods/{id}/smartmode", get(get_smart_mode).post(set_smart_mode))
        .layer(middleware::from_fn_with_state(db.clone(), require_api_key))
        .with_state(db)
}

pub async fn run(listener: TcpListener, api_key: &str) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock sensibo server listening");
    }
    axum::serve(listener, app_with_key(api_key)).await
}

async fn require_api_key(
    State(db): State<Db>,
    Query(params): Query<HashMap<String, String>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    match params.get("apiKey") {
        Some(key) if *key == db.api_key => Ok(next.run(request).await),
        _ => {
            debug!(uri = %request.uri().path(), "rejected request without valid apiKey");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

#[derive(Deserialize)]
struct FieldsParams {
    fields: Option<String>,
}

async fn list_pods(State(db): State<Db>, Query(params): Query<FieldsParams>) -> Json<Value> {
    let pods = db.pods.read().await;
    let mut ids: Vec<&String> = pods.keys().collect();
    ids.sort();
    let result: Vec<Value> = ids
        .into_iter()
        .map(|id| match params.fields.as_deref() {
            Some("id") => json!({"id": id}),
            _ => Value::Object(pods[id].info.clone()),
        })
        .collect();
    success(Value::Array(result))
}

async fn get_pod(State(db): State<Db>, Path(id): Path<String>) -> Result<Json<Value>, StatusCode> {
    let pods = db.pods.read().await;
    let pod = pods.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(success(Value::Object(pod.info.clone())))
}

#[derive(Deserialize)]
struct LimitParams {
    limit: Option<usize>,
}

async fn list_states(
    State(db): State<Db>,
    Path(id): Path<String>,
    Query(params): Query<LimitParams>,
) -> Result<Json<Value>, StatusCode> {
    let pods = db.pods.read().await;
    let pod = pods.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    let limit = params.limit.unwrap_or(10).clamp(1, MAX_STATES);
    let states: Vec<Value> = pod.history.iter().take(limit).cloned().collect();
    Ok(success(Value::Array(states)))
}

async fn get_state(
    State(db): State<Db>,
    Path((id, state_id)): Path<(String, String)>,
) -> Result<Json<Value>, StatusCode> {
    let pods = db.pods.read().await;
    let pod = pods.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    pod.history
        .iter()
        .find(|record| record["id"] == state_id.as_str())
        .cloned()
        .map(success)
        .ok_or(StatusCode::NOT_FOUND)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetStateBody {
    ac_state: Map<String, Value>,
}

async fn set_state(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(input): Json<SetStateBody>,
) -> Result<Json<Value>, StatusCode> {
    let mut pods = db.pods.write().await;
    let pod = pods.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(success(pod.apply(&input.ac_state)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetPropertyBody {
    new_value: Value,
}

async fn set_state_property(
    State(db): State<Db>,
    Path((id, property)): Path<(String, String)>,
    Json(input): Json<SetPropertyBody>,
) -> Result<Json<Value>, StatusCode> {
    let mut pods = db.pods.write().await;
    let pod = pods.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    let change = Map::from_iter([(property, input.new_value)]);
    Ok(success(pod.apply(&change)))
}

async fn measurements(
    State(db): State<Db>,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let pods = db.pods.read().await;
    if !pods.contains_key(&id) {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(success(json!([{
        "time": {"time": timestamp(0), "secondsAgo": 37},
        "temperature": 23.4,
        "humidity": 51.2
    }])))
}

#[derive(Deserialize)]
struct DaysParams {
    days: Option<u32>,
}

/// Synthetic series, one sample every six hours. The humidity sensor
/// "drops out" on the last temperature sample, so that timestamp only
/// appears in the temperature series.
async fn historical(
    State(db): State<Db>,
    Path(id): Path<String>,
    Query(params): Query<DaysParams>,
) -> Result<Json<Value>, StatusCode> {
    let pods = db.pods.read().await;
    if !pods.contains_key(&id) {
        return Err(StatusCode::NOT_FOUND);
    }
    let days = params.days.unwrap_or(1).clamp(1, MAX_DAYS);
    let samples = i64::from(days * SAMPLES_PER_DAY);

    let temperature: Vec<Value> = (0..samples)
        .map(|i| json!({"time": timestamp(i), "value": 20.0 + (i % 5) as f64}))
        .collect();
    let humidity: Vec<Value> = (0..samples - 1)
        .map(|i| json!({"time": timestamp(i), "value": 50.0 + (i % 3) as f64}))
        .collect();

    Ok(success(json!({"temperature": temperature, "humidity": humidity})))
}

fn timestamp(sample: i64) -> String {
    let time: DateTime<Utc> =
        DateTime::<Utc>::UNIX_EPOCH + TimeDelta::seconds(HISTORY_START + sample * 6 * 3600);
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

async fn get_smart_mode(
    State(db): State<Db>,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let pods = db.pods.read().await;
    let pod = pods.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(success(Value::Object(pod.smart_mode.clone())))
}

#[derive(Deserialize)]
struct SmartModeBody {
    enabled: Option<bool>,
}

async fn set_smart_mode(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(input): Json<SmartModeBody>,
) -> Result<Json<Value>, StatusCode> {
    let mut pods = db.pods.write().await;
    let pod = pods.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    if let Some(enabled) = input.enabled {
        pod.smart_mode.insert("enabled".to_string(), Value::Bool(enabled));
    }
    Ok(success(Value::Object(pod.smart_mode.clone())))
}
