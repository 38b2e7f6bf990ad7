pub mod control;
pub mod telephony;

use axum::routing::{get, post};
use axum::Router;

use crate::AppState;

/// Build the full API router: the control surface (§6 "thin
/// collaborators") plus the telephony-provider media-stream accept
/// endpoint the dialer worker's webhook URL points at.
pub fn router() -> Router<AppState> {
    Router::new()
        // ── Control surface ───────────────────────────────────────
        .route("/v1/dialer/start", post(control::start_dialer))
        .route("/v1/dialer/stop", post(control::stop_dialer))
        .route("/v1/dialer/status", get(control::dialer_status))
        .route("/v1/sip/status", get(control::sip_status))
        .route("/v1/health", get(control::health))
        // ── Telephony media bridge ─────────────────────────────────
        .route("/v1/telephony/webhook/:job_id", get(telephony::accept_media_stream))
}
