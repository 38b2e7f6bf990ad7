//! Control surface (§6 "thin collaborators", §11): starts/stops the dialer
//! worker pool and exposes read-only status over shared state, mirroring
//! the teacher's pattern of a thin handler delegating to shared services.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde_json::json;

use vc_domain::error::Error as DomainError;
use vc_persistence::PersistenceClient;

use crate::error::Result;
use crate::AppState;

/// POST /v1/dialer/start
pub async fn start_dialer(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let supervisor = state
        .dialer
        .as_ref()
        .ok_or_else(|| DomainError::ConfigMissing("stt/llm/tts/telephony providers not fully configured".into()))?;
    let started = supervisor.start();
    Ok(Json(json!({ "started": started })))
}

/// POST /v1/dialer/stop
pub async fn stop_dialer(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let supervisor = state
        .dialer
        .as_ref()
        .ok_or_else(|| DomainError::ConfigMissing("dialer supervisor not configured".into()))?;
    let stopped = supervisor.stop();
    Ok(Json(json!({ "stopped": stopped })))
}

/// GET /v1/dialer/status
pub async fn dialer_status(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let running = state.dialer.as_ref().map(|s| s.is_running()).unwrap_or(false);
    let worker_count = state.dialer.as_ref().map(|s| s.worker_count()).unwrap_or(0);
    let stats = state.queue.stats().await.map_err(crate::error::Error::Domain)?;

    Ok(Json(json!({
        "running": running,
        "worker_count": worker_count,
        "active_calls": state.sessions.len(),
        "queue": stats,
    })))
}

/// GET /v1/sip/status
///
/// Read-only report of whether a SIP-capable telephony adapter is
/// configured. The SIP media gateway's own RTP/signaling stack is out of
/// scope (§12); this endpoint only reports configuration, not live
/// registration state.
pub async fn sip_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "telephony_configured": state.config.providers.telephony.is_some(),
    }))
}

/// GET /v1/health
///
/// Readiness probe against the persistence store's `health()` check
/// (its doc comment names this as its purpose). `200` when the store
/// answers, `503` with the error otherwise.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match state.persistence.health().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "persistence": "ok" }))),
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "persistence": "unreachable", "error": e.to_string() }))),
    }
}
