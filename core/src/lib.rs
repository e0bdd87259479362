//! Synchronous API client core for the Sensibo thermostat service.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). A `Session` couples the
//! client with a `Transport` for one-call blocking operations; the default
//! `blocking` feature provides a `ureq`-based transport.
//!
//! # Design
//! - `SensiboClient` is stateless: base URL plus default API key, injected
//!   through `ClientConfig`.
//! - Each operation is split into `build_*` (produces request) and
//!   `parse_*` (consumes response), so the I/O boundary is explicit.
//! - Operations addressing one pod take `impl Into<PodIds>` and fail with
//!   `ApiError::InvalidArgument` on anything but exactly one id.
//! - Every response is unwrapped from the service's `{"status", "result"}`
//!   envelope.
//!
//! ```no_run
//! use sensibo_core::{AcState, ClientConfig, Mode, Session};
//!
//! # fn main() -> sensibo_core::Result<()> {
//! let session = Session::new(ClientConfig::from_env());
//! for pod in session.list_devices()? {
//!     let update = AcState::new().on(true).mode(Mode::Cool).temperature(24);
//!     session.set_state(pod.as_str(), &update)?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

pub use client::SensiboClient;
pub use config::ClientConfig;
pub use error::{ApiError, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
#[cfg(feature = "blocking")]
pub use transport::UreqTransport;
pub use transport::{Session, Transport};
pub use types::{
    AcState, AcStateRecord, CurrentMeasurement, FanLevel, HistoricalSeries, JsonObject,
    MeasurementRow, Mode, PodIds, Sample, Swing, TemperatureUnit,
};
