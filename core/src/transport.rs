//! Executing requests.
//!
//! `Transport` is the seam between the pure client and the network. A
//! `Session` pairs a `SensiboClient` with a transport and exposes each
//! operation as a single blocking call: build, execute, parse. No retries
//! are attempted; a transport failure is returned as `ApiError::Transport`
//! with the underlying error as its source.

use serde_json::Value;
use tracing::{trace, warn};

use crate::client::SensiboClient;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::{HttpRequest, HttpResponse};
use crate::types::{AcState, AcStateRecord, CurrentMeasurement, JsonObject, MeasurementRow, PodIds};

/// Executes one HTTP round-trip. Non-2xx statuses are data, not errors.
pub trait Transport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        (**self).execute(request)
    }
}

#[cfg(feature = "blocking")]
pub use self::blocking::UreqTransport;

#[cfg(feature = "blocking")]
mod blocking {
    use super::Transport;
    use crate::error::{ApiError, Result};
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};

    /// `Transport` backed by a shared `ureq::Agent`.
    #[derive(Debug, Clone)]
    pub struct UreqTransport {
        agent: ureq::Agent,
    }

    impl UreqTransport {
        pub fn new() -> Self {
            // Status interpretation belongs to the client, so 4xx/5xx must
            // come back as responses.
            let agent = ureq::Agent::config_builder()
                .http_status_as_error(false)
                .build()
                .new_agent();
            Self { agent }
        }
    }

    impl Default for UreqTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Transport for UreqTransport {
        fn execute(&self, req: HttpRequest) -> Result<HttpResponse> {
            let result = match req.method {
                HttpMethod::Get => {
                    let mut builder = self.agent.get(&req.url);
                    for (k, v) in &req.query {
                        builder = builder.query(k, v);
                    }
                    for (k, v) in &req.headers {
                        builder = builder.header(k.as_str(), v.as_str());
                    }
                    builder.call()
                }
                HttpMethod::Post | HttpMethod::Patch => {
                    let mut builder = if req.method == HttpMethod::Post {
                        self.agent.post(&req.url)
                    } else {
                        self.agent.patch(&req.url)
                    };
                    for (k, v) in &req.query {
                        builder = builder.query(k, v);
                    }
                    for (k, v) in &req.headers {
                        builder = builder.header(k.as_str(), v.as_str());
                    }
                    match &req.body {
                        Some(body) => builder.send(body.as_bytes()),
                        None => builder.send_empty(),
                    }
                }
            };

            let mut response = result.map_err(|e| ApiError::Transport(Box::new(e)))?;
            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
                .collect();
            let body = response
                .body_mut()
                .read_to_string()
                .map_err(|e| ApiError::Transport(Box::new(e)))?;

            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        }
    }
}

/// A client bound to a transport.
#[derive(Debug, Clone)]
pub struct Session<T> {
    client: SensiboClient,
    transport: T,
}

#[cfg(feature = "blocking")]
impl Session<UreqTransport> {
    /// Session over HTTP using `ureq`.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(SensiboClient::new(config), UreqTransport::new())
    }
}

impl<T: Transport> Session<T> {
    pub fn with_transport(client: SensiboClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &SensiboClient {
        &self.client
    }

    /// A session sharing this transport but authenticating with `api_key`.
    pub fn with_api_key(&self, api_key: impl Into<String>) -> Session<&T> {
        Session {
            client: self.client.with_api_key(api_key),
            transport: &self.transport,
        }
    }

    fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        trace!(method = request.method.as_str(), url = %request.url, "executing request");
        let response = self.transport.execute(request)?;
        if !response.is_success() {
            warn!(status = response.status, "request failed");
        }
        Ok(response)
    }

    pub fn list_devices(&self) -> Result<Vec<String>> {
        let req = self.client.build_list_devices()?;
        self.client.parse_list_devices(self.send(req)?)
    }

    pub fn get_device_info(&self, pod: impl Into<PodIds>) -> Result<JsonObject> {
        let req = self.client.build_get_device_info(pod)?;
        self.client.parse_get_device_info(self.send(req)?)
    }

    /// Newest first. `count` defaults to 10 and is clamped to 1..=20.
    pub fn list_states(
        &self,
        pod: impl Into<PodIds>,
        count: Option<u32>,
    ) -> Result<Vec<AcStateRecord>> {
        let req = self.client.build_list_states(pod, count)?;
        self.client.parse_list_states(self.send(req)?)
    }

    pub fn get_state(&self, pod: impl Into<PodIds>, state_id: &str) -> Result<AcStateRecord> {
        let req = self.client.build_get_state(pod, state_id)?;
        self.client.parse_get_state(self.send(req)?)
    }

    pub fn probe_current(&self, pod: impl Into<PodIds>) -> Result<Option<CurrentMeasurement>> {
        let req = self.client.build_probe_current(pod)?;
        self.client.parse_probe_current(self.send(req)?)
    }

    /// `days` defaults to 1 and is clamped to 1..=7.
    pub fn probe_historical(
        &self,
        pod: impl Into<PodIds>,
        days: Option<u32>,
    ) -> Result<Vec<MeasurementRow>> {
        let req = self.client.build_probe_historical(pod, days)?;
        self.client.parse_probe_historical(self.send(req)?)
    }

    pub fn set_state(&self, pod: impl Into<PodIds>, state: &AcState) -> Result<AcStateRecord> {
        let req = self.client.build_set_state(pod, state)?;
        self.client.parse_set_state(self.send(req)?)
    }

    pub fn set_state_property(
        &self,
        pod: impl Into<PodIds>,
        property: &str,
        value: &Value,
    ) -> Result<AcStateRecord> {
        let req = self.client.build_set_state_property(pod, property, value)?;
        self.client.parse_set_state_property(self.send(req)?)
    }

    pub fn get_smart_mode(&self, pod: impl Into<PodIds>) -> Result<JsonObject> {
        let req = self.client.build_get_smart_mode(pod)?;
        self.client.parse_get_smart_mode(self.send(req)?)
    }

    pub fn set_smart_mode(&self, pod: impl Into<PodIds>, enabled: Option<bool>) -> Result<JsonObject> {
        let req = self.client.build_set_smart_mode(pod, enabled)?;
        self.client.parse_set_smart_mode(self.send(req)?)
    }
}
