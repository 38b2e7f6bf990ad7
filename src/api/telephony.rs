//! Accepts the telephony provider's media-stream connection for a placed
//! call and bridges it into a [`vc_media::MediaGateway`], resolving the
//! dialer worker's pending registration (§4.8 step 3).
//!
//! The webhook URL the worker hands to `TelephonyCaller::place_call` points
//! here; the provider's media transport opens a websocket back to this
//! path carrying `provider_call_id` as a query parameter, matching how
//! streaming-telephony providers correlate a call's signaling leg with its
//! media leg.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tokio::sync::mpsc;

use vc_media::{MediaGateway, PcmPassthroughCodec, TelephonyProviderGateway};

use crate::AppState;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Deserialize)]
pub struct MediaStreamParams {
    pub provider_call_id: String,
    /// HMAC-SHA256 of `job_id || provider_call_id` keyed by the configured
    /// telephony provider's auth key, hex-encoded. Only checked when that
    /// key is set — dev deployments with no configured secret accept any
    /// caller.
    #[serde(default)]
    pub signature: Option<String>,
}

/// GET /v1/telephony/webhook/:job_id
pub async fn accept_media_stream(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Query(params): Query<MediaStreamParams>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    if !verify_signature(&state, &job_id, &params) {
        tracing::warn!(job_id = %job_id, "rejected media stream with invalid signature");
        return StatusCode::UNAUTHORIZED.into_response();
    }

    ws.on_upgrade(move |socket| bridge(state, job_id, params.provider_call_id, socket))
}

fn verify_signature(state: &AppState, job_id: &str, params: &MediaStreamParams) -> bool {
    let Some(secret) = state.config.providers.telephony.as_ref().and_then(|e| e.auth.key.clone()) else {
        return true;
    };
    let Some(signature) = &params.signature else {
        return false;
    };

    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(job_id.as_bytes());
    mac.update(params.provider_call_id.as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());

    bool::from(expected.as_bytes().ct_eq(signature.as_bytes()))
}

async fn bridge(state: AppState, job_id: String, provider_call_id: String, socket: WebSocket) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (inbound_tx, inbound_rx) = mpsc::channel::<Vec<u8>>(CHANNEL_CAPACITY);
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<Vec<u8>>(CHANNEL_CAPACITY);

    let gateway: Arc<dyn MediaGateway> = Arc::new(TelephonyProviderGateway::with_capacity(
        provider_call_id.clone(),
        inbound_rx,
        outbound_tx,
        PcmPassthroughCodec,
        state.config.pipeline.outbound_queue_capacity,
    ));

    if !state.pending_calls.resolve(&provider_call_id, gateway.clone()) {
        tracing::warn!(job_id = %job_id, provider_call_id = %provider_call_id, "media stream arrived with no worker waiting");
        gateway.close().await;
        return;
    }

    let writer = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            if ws_tx.send(Message::Binary(frame)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(msg)) = ws_rx.next().await {
        match msg {
            Message::Binary(frame) => {
                if inbound_tx.send(frame).await.is_err() {
                    break;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    drop(inbound_tx);
    gateway.close().await;
    writer.abort();
}
