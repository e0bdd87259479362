//! Domain DTOs for the Sensibo API.
//!
//! # Design
//! Pod metadata and smart-mode settings stay opaque (`serde_json::Map`); the
//! client never decomposes them. AC state is typed because it is also the
//! write payload: every field is optional and unset fields are skipped when
//! serializing, so a partially built `AcState` is a sparse partial update.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::ApiError;

/// Opaque JSON object as returned by the service.
pub type JsonObject = Map<String, Value>;

/// Device target for an operation that addresses exactly one pod.
///
/// Accepts a single id or a collection of ids so that passing several ids
/// is a caught error rather than a silently ignored one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodIds(Vec<String>);

impl PodIds {
    /// Resolve to the single pod id, or fail with `InvalidArgument`.
    pub fn single(self) -> Result<String, ApiError> {
        let mut ids = self.0;
        match ids.len() {
            1 => {
                let id = ids.remove(0);
                if id.trim().is_empty() {
                    return Err(ApiError::InvalidArgument(
                        "pod id must not be empty".to_string(),
                    ));
                }
                Ok(id)
            }
            0 => Err(ApiError::InvalidArgument(
                "expected exactly one pod id, got none".to_string(),
            )),
            n => Err(ApiError::InvalidArgument(format!(
                "expected exactly one pod id, got {n}"
            ))),
        }
    }
}

impl From<&str> for PodIds {
    fn from(id: &str) -> Self {
        PodIds(vec![id.to_string()])
    }
}

impl From<String> for PodIds {
    fn from(id: String) -> Self {
        PodIds(vec![id])
    }
}

impl From<&String> for PodIds {
    fn from(id: &String) -> Self {
        PodIds(vec![id.clone()])
    }
}

impl From<Vec<String>> for PodIds {
    fn from(ids: Vec<String>) -> Self {
        PodIds(ids)
    }
}

impl From<Vec<&str>> for PodIds {
    fn from(ids: Vec<&str>) -> Self {
        PodIds(ids.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for PodIds {
    fn from(ids: &[&str]) -> Self {
        PodIds(ids.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for PodIds {
    fn from(ids: [&str; N]) -> Self {
        PodIds(ids.iter().map(|s| s.to_string()).collect())
    }
}

/// `{"status": "...", "result": ...}` wrapper around every response body.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub status: Option<String>,
    pub result: T,
}

/// Element of the `users/me/pods` listing when only ids are requested.
#[derive(Debug, Clone, Deserialize)]
pub struct PodSummary {
    pub id: String,
}

// Every enum keeps values it does not know as `Other`, so a new fan level
// or mode on the service side never fails a whole response.

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Cool,
    #[serde(alias = "hot")]
    Heat,
    Dry,
    Fan,
    Auto,
    #[serde(untagged)]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FanLevel {
    Low,
    Medium,
    High,
    Auto,
    #[serde(untagged)]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemperatureUnit {
    C,
    F,
    #[serde(untagged)]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Swing {
    Stopped,
    RangeFull,
    #[serde(untagged)]
    Other(String),
}

/// AC configuration snapshot, also used as the `set_state` payload.
///
/// ```
/// use sensibo_core::{AcState, Mode};
///
/// let update = AcState::new().on(true).mode(Mode::Cool).temperature(26);
/// let json = serde_json::to_value(&update).unwrap();
/// assert_eq!(json, serde_json::json!({"on": true, "mode": "cool", "temperature": 26}));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fan_level: Option<FanLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_unit: Option<TemperatureUnit>,
    #[serde(
        default,
        alias = "targetTemperature",
        skip_serializing_if = "Option::is_none"
    )]
    pub temperature: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swing: Option<Swing>,
}

impl AcState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, on: bool) -> Self {
        self.on = Some(on);
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn fan_level(mut self, fan_level: FanLevel) -> Self {
        self.fan_level = Some(fan_level);
        self
    }

    pub fn temperature_unit(mut self, unit: TemperatureUnit) -> Self {
        self.temperature_unit = Some(unit);
        self
    }

    /// Integer target temperature. Fractional values go through
    /// `Number::from_f64`.
    pub fn temperature(mut self, temperature: impl Into<Number>) -> Self {
        self.temperature = Some(temperature.into());
        self
    }

    pub fn swing(mut self, swing: Swing) -> Self {
        self.swing = Some(swing);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One entry of a pod's AC state history, or the outcome of a state change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcStateRecord {
    pub id: String,
    pub ac_state: AcState,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub changed_properties: Vec<String>,
    #[serde(default)]
    pub failure_reason: Option<String>,
}

impl AcStateRecord {
    /// Whether the device acknowledged the change.
    pub fn is_success(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("success"))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SetAcStateBody<'a> {
    pub ac_state: &'a AcState,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SetPropertyBody<'a> {
    pub new_value: &'a Value,
}

#[derive(Debug, Serialize)]
pub(crate) struct SmartModeBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MeasurementTime {
    pub time: DateTime<Utc>,
    pub seconds_ago: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawMeasurement {
    pub time: MeasurementTime,
    pub temperature: f64,
    pub humidity: f64,
}

/// Latest sensor reading of a pod.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentMeasurement {
    pub time: DateTime<Utc>,
    /// Age of the reading as reported by the server.
    pub seconds_ago: i64,
    pub temperature: f64,
    pub humidity: f64,
}

impl From<RawMeasurement> for CurrentMeasurement {
    fn from(raw: RawMeasurement) -> Self {
        Self {
            time: raw.time.time,
            seconds_ago: raw.time.seconds_ago,
            temperature: raw.temperature,
            humidity: raw.humidity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Sample {
    pub time: DateTime<Utc>,
    pub value: f64,
}

/// Historical measurements as the service returns them: two series keyed
/// independently by timestamp.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoricalSeries {
    #[serde(default)]
    pub temperature: Vec<Sample>,
    #[serde(default)]
    pub humidity: Vec<Sample>,
}

/// One row of the merged historical table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeasurementRow {
    pub time: DateTime<Utc>,
    pub temperature: f64,
    pub humidity: f64,
}

impl HistoricalSeries {
    /// Join both series on their timestamp, in temperature-series order.
    ///
    /// Inner join: a timestamp missing from either series produces no row,
    /// and a repeated timestamp yields one row per matching pair.
    pub fn merge(self) -> Vec<MeasurementRow> {
        let mut humidity: HashMap<DateTime<Utc>, Vec<f64>> = HashMap::new();
        for sample in self.humidity {
            humidity.entry(sample.time).or_default().push(sample.value);
        }

        self.temperature
            .into_iter()
            .flat_map(|t| {
                humidity
                    .get(&t.time)
                    .into_iter()
                    .flatten()
                    .map(move |&h| MeasurementRow {
                        time: t.time,
                        temperature: t.value,
                        humidity: h,
                    })
            })
            .collect()
    }
}
