//! Axum-facing error type. Wraps [`vc_domain::error::Error`] and maps each
//! kind to a status code per §7; response bodies are generic, detail is
//! only ever logged (audit/log records carry the specifics).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Domain(#[from] vc_domain::error::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        use vc_domain::error::Error as DomainError;

        let (status, message) = match &self {
            Error::Domain(DomainError::ConfigMissing(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "configuration error")
            }
            Error::Domain(DomainError::Config(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "configuration error")
            }
            Error::Domain(DomainError::Auth(_)) => (StatusCode::UNAUTHORIZED, "authentication failed"),
            Error::Domain(DomainError::ActionNotAllowed(_)) => {
                (StatusCode::BAD_REQUEST, "action not allowed")
            }
            Error::Domain(DomainError::ConditionSkip) => {
                (StatusCode::BAD_REQUEST, "step condition not satisfied")
            }
            Error::Domain(DomainError::QueueBackendUnavailable(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "queue backend unavailable")
            }
            Error::Domain(DomainError::Redis(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "queue backend unavailable")
            }
            Error::Domain(DomainError::TransientProvider { .. })
            | Error::Domain(DomainError::FatalProvider { .. })
            | Error::Domain(DomainError::Persistence(_)) => {
                (StatusCode::BAD_GATEWAY, "upstream provider error")
            }
            Error::Domain(DomainError::MediaTransportClosed(_)) => {
                (StatusCode::GONE, "media transport closed")
            }
            Error::Domain(DomainError::Timeout(_)) => (StatusCode::GATEWAY_TIMEOUT, "upstream timeout"),
            Error::Domain(_) | Error::Io(_) | Error::Toml(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error")
            }
        };

        tracing::warn!(error = %self, status = status.as_u16(), "request failed");

        let body = json!({ "error": message });
        (status, Json(body)).into_response()
    }
}
