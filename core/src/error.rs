//! Error types for the Sensibo API client.
//!
//! # Design
//! `InvalidArgument` and `MissingApiKey` are raised while building a request,
//! so nothing reaches the network. `NotFound` gets its own variant because
//! an unknown pod or state id is the common failure callers branch on; every
//! other non-2xx response lands in `HttpError` with the raw status and body.
//! Transport failures keep their source error intact.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The caller passed an argument the API cannot accept, e.g. several pod
    /// ids where exactly one is required.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No API key was configured on the client and none was supplied.
    #[error("no API key configured")]
    MissingApiKey,

    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    #[error("deserialization failed: {0}")]
    Deserialization(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_displays_status_and_body() {
        let err = ApiError::HttpError {
            status: 403,
            body: "forbidden".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 403: forbidden");
    }

    #[test]
    fn transport_error_keeps_its_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = ApiError::Transport(Box::new(io));
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "refused");
    }
}
