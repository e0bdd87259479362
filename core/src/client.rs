//! Stateless HTTP request builder and response parser for the Sensibo API.
//!
//! # Design
//! `SensiboClient` holds the base URL and the default API key, nothing else.
//! Each operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! Argument validation (single pod id, credential present) happens in
//! `build_*`, so a rejected call never produces a request.
//!
//! Out-of-range `count` and `days` values are clamped rather than rejected;
//! callers asking for 50 states simply get the 20 the service allows.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    AcState, AcStateRecord, CurrentMeasurement, Envelope, HistoricalSeries, JsonObject,
    MeasurementRow, PodIds, PodSummary, RawMeasurement, SetAcStateBody, SetPropertyBody,
    SmartModeBody,
};

pub const DEFAULT_STATES_LIMIT: u32 = 10;
pub const MAX_STATES_LIMIT: u32 = 20;
pub const DEFAULT_HISTORY_DAYS: u32 = 1;
pub const MAX_HISTORY_DAYS: u32 = 7;

/// Effective `limit` for a state history request.
pub fn clamp_states_limit(count: Option<u32>) -> u32 {
    count
        .unwrap_or(DEFAULT_STATES_LIMIT)
        .clamp(1, MAX_STATES_LIMIT)
}

/// Effective `days` for a historical measurements request.
pub fn clamp_history_days(days: Option<u32>) -> u32 {
    days.unwrap_or(DEFAULT_HISTORY_DAYS).clamp(1, MAX_HISTORY_DAYS)
}

/// Synchronous, stateless client for the Sensibo API.
#[derive(Debug, Clone)]
pub struct SensiboClient {
    base_url: String,
    api_key: Option<String>,
}

impl SensiboClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// A copy of this client that authenticates with `api_key` instead of
    /// the configured default.
    pub fn with_api_key(&self, api_key: impl Into<String>) -> Self {
        Self {
            base_url: self.base_url.clone(),
            api_key: Some(api_key.into()),
        }
    }

    pub fn build_list_devices(&self) -> Result<HttpRequest> {
        self.request(HttpMethod::Get, "users/me/pods", &[("fields", "id")], None)
    }

    pub fn build_get_device_info(&self, pod: impl Into<PodIds>) -> Result<HttpRequest> {
        let id = pod_segment(pod)?;
        self.request(HttpMethod::Get, &format!("pods/{id}"), &[("fields", "*")], None)
    }

    pub fn build_list_states(
        &self,
        pod: impl Into<PodIds>,
        count: Option<u32>,
    ) -> Result<HttpRequest> {
        let id = pod_segment(pod)?;
        let limit = clamp_states_limit(count).to_string();
        self.request(
            HttpMethod::Get,
            &format!("pods/{id}/acStates"),
            &[("limit", limit.as_str())],
            None,
        )
    }

    pub fn build_get_state(&self, pod: impl Into<PodIds>, state_id: &str) -> Result<HttpRequest> {
        let id = pod_segment(pod)?;
        let state_id = path_segment("state id", state_id)?;
        self.request(
            HttpMethod::Get,
            &format!("pods/{id}/acStates/{state_id}"),
            &[],
            None,
        )
    }

    pub fn build_probe_current(&self, pod: impl Into<PodIds>) -> Result<HttpRequest> {
        let id = pod_segment(pod)?;
        self.request(HttpMethod::Get, &format!("pods/{id}/measurements"), &[], None)
    }

    pub fn build_probe_historical(
        &self,
        pod: impl Into<PodIds>,
        days: Option<u32>,
    ) -> Result<HttpRequest> {
        let id = pod_segment(pod)?;
        let days = clamp_history_days(days).to_string();
        self.request(
            HttpMethod::Get,
            &format!("pods/{id}/historicalMeasurements"),
            &[("days", days.as_str())],
            None,
        )
    }

    /// Only the fields set on `state` are sent; an empty `AcState` produces
    /// `{"acState": {}}`.
    pub fn build_set_state(&self, pod: impl Into<PodIds>, state: &AcState) -> Result<HttpRequest> {
        let id = pod_segment(pod)?;
        if state.is_empty() {
            debug!(pod = %id, "sending empty acState update");
        }
        let body = to_json(&SetAcStateBody { ac_state: state })?;
        self.request(
            HttpMethod::Post,
            &format!("pods/{id}/acStates"),
            &[],
            Some(body),
        )
    }

    /// Change one AC state property, e.g. `("targetTemperature", json!(23))`.
    pub fn build_set_state_property(
        &self,
        pod: impl Into<PodIds>,
        property: &str,
        value: &Value,
    ) -> Result<HttpRequest> {
        let id = pod_segment(pod)?;
        let property = path_segment("property", property)?;
        let body = to_json(&SetPropertyBody { new_value: value })?;
        self.request(
            HttpMethod::Patch,
            &format!("pods/{id}/acStates/{property}"),
            &[],
            Some(body),
        )
    }

    pub fn build_get_smart_mode(&self, pod: impl Into<PodIds>) -> Result<HttpRequest> {
        let id = pod_segment(pod)?;
        self.request(HttpMethod::Get, &format!("pods/{id}/smartmode"), &[], None)
    }

    pub fn build_set_smart_mode(
        &self,
        pod: impl Into<PodIds>,
        enabled: Option<bool>,
    ) -> Result<HttpRequest> {
        let id = pod_segment(pod)?;
        let body = to_json(&SmartModeBody { enabled })?;
        self.request(
            HttpMethod::Post,
            &format!("pods/{id}/smartmode"),
            &[],
            Some(body),
        )
    }

    pub fn parse_list_devices(&self, response: HttpResponse) -> Result<Vec<String>> {
        let pods: Vec<PodSummary> = parse_result(response)?;
        Ok(pods.into_iter().map(|p| p.id).collect())
    }

    pub fn parse_get_device_info(&self, response: HttpResponse) -> Result<JsonObject> {
        parse_result(response)
    }

    pub fn parse_list_states(&self, response: HttpResponse) -> Result<Vec<AcStateRecord>> {
        parse_result(response)
    }

    pub fn parse_get_state(&self, response: HttpResponse) -> Result<AcStateRecord> {
        parse_result(response)
    }

    /// `None` when the pod has not reported any measurement yet.
    pub fn parse_probe_current(
        &self,
        response: HttpResponse,
    ) -> Result<Option<CurrentMeasurement>> {
        let readings: Vec<RawMeasurement> = parse_result(response)?;
        Ok(readings.into_iter().next().map(CurrentMeasurement::from))
    }

    pub fn parse_probe_historical(&self, response: HttpResponse) -> Result<Vec<MeasurementRow>> {
        let series: HistoricalSeries = parse_result(response)?;
        Ok(series.merge())
    }

    pub fn parse_set_state(&self, response: HttpResponse) -> Result<AcStateRecord> {
        parse_result(response)
    }

    pub fn parse_set_state_property(&self, response: HttpResponse) -> Result<AcStateRecord> {
        parse_result(response)
    }

    pub fn parse_get_smart_mode(&self, response: HttpResponse) -> Result<JsonObject> {
        parse_result(response)
    }

    pub fn parse_set_smart_mode(&self, response: HttpResponse) -> Result<JsonObject> {
        parse_result(response)
    }

    fn request(
        &self,
        method: HttpMethod,
        path: &str,
        params: &[(&str, &str)],
        body: Option<String>,
    ) -> Result<HttpRequest> {
        let api_key = self.api_key.as_deref().ok_or(ApiError::MissingApiKey)?;

        let mut query = Vec::with_capacity(params.len() + 1);
        query.push(("apiKey".to_string(), api_key.to_string()));
        query.extend(params.iter().map(|(k, v)| (k.to_string(), v.to_string())));

        let headers = match body {
            Some(_) => vec![("content-type".to_string(), "application/json".to_string())],
            None => Vec::new(),
        };

        let url = format!("{}/{path}", self.base_url);
        debug!(method = method.as_str(), %url, "built request");

        Ok(HttpRequest {
            method,
            url,
            query,
            headers,
            body,
        })
    }
}

fn pod_segment(pod: impl Into<PodIds>) -> Result<String> {
    let id = pod.into().single()?;
    path_segment("pod id", &id)
}

/// Percent-encode one URL path segment. Ids are opaque, so `/`, `?` and
/// `#` must not reach the path unescaped, and dot segments are refused.
fn path_segment(what: &str, value: &str) -> Result<String> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidArgument(format!("{what} must not be empty")));
    }
    if value == "." || value == ".." {
        return Err(ApiError::InvalidArgument(format!("{what} must not be a dot segment")));
    }
    Ok(urlencoding::encode(value).into_owned())
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| ApiError::Serialization(e.to_string()))
}

/// Check the status, then unwrap the `result` field of the envelope.
fn parse_result<T: DeserializeOwned>(response: HttpResponse) -> Result<T> {
    check_status(&response)?;
    debug!(status = response.status, "parsing response");
    let envelope: Envelope<T> = serde_json::from_str(&response.body)
        .map_err(|e| ApiError::Deserialization(e.to_string()))?;
    Ok(envelope.result)
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<()> {
    if response.is_success() {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}
