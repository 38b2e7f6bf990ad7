//! Websocket-based streaming speech-to-text adapter (Deepgram-style wire
//! protocol: binary PCM frames in, JSON transcript events out).
//!
//! Deepgram's wire protocol never emits an explicit "end of turn" message of
//! its own; `is_final` just marks a transcript segment as settled, and
//! `speech_final` (set once the endpointer decides the speaker has stopped)
//! is the model-native end-of-turn signal §4.2 requires. A silence timer is
//! the fallback for endpointers that never fire: if no message arrives for
//! [`SILENCE_TIMEOUT`] while a turn is open, treat that as VAD-derived
//! end-of-turn.

use std::time::Duration;

use crate::traits::SttProvider;
use crate::util::resolve_api_key;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use vc_domain::audio::{AudioChunk, BoxStream, TranscriptErrorKind, TranscriptEvent};
use vc_domain::config::ProviderEntry;
use vc_domain::error::Result;

/// How long to wait for another wire message before treating an open turn
/// as ended by silence.
const SILENCE_TIMEOUT: Duration = Duration::from_millis(1_200);

pub struct WebsocketSttAdapter {
    id: String,
    ws_url: String,
    api_key: String,
}

impl WebsocketSttAdapter {
    pub fn from_config(entry: &ProviderEntry) -> Result<Self> {
        let api_key = resolve_api_key(&entry.auth)?;
        let ws_url = entry
            .base_url
            .clone()
            .unwrap_or_else(|| "wss://api.deepgram.com/v1/listen".into());
        Ok(Self { id: "deepgram_ws".into(), ws_url, api_key })
    }
}

/// One decoded Deepgram transcript message.
struct DeepgramEvent {
    /// `Partial`/`Final` for the transcript text itself, if any.
    event: Option<TranscriptEvent>,
    transcript_nonempty: bool,
    /// Deepgram's endpointer-decided "speaker has stopped" signal.
    speech_final: bool,
    confidence: f32,
}

fn parse_deepgram_event(text: &str) -> Option<DeepgramEvent> {
    let v: Value = serde_json::from_str(text).ok()?;
    let transcript = v
        .get("channel")
        .and_then(|c| c.get("alternatives"))
        .and_then(|a| a.get(0))
        .and_then(|alt| alt.get("transcript"))
        .and_then(|t| t.as_str())
        .unwrap_or("");
    let confidence = v
        .get("channel")
        .and_then(|c| c.get("alternatives"))
        .and_then(|a| a.get(0))
        .and_then(|alt| alt.get("confidence"))
        .and_then(|c| c.as_f64())
        .unwrap_or(0.0) as f32;
    let is_final = v.get("is_final").and_then(|v| v.as_bool()).unwrap_or(false);
    let speech_final = v.get("speech_final").and_then(|v| v.as_bool()).unwrap_or(false);
    let transcript_nonempty = !transcript.is_empty();

    let event = if !transcript_nonempty {
        None
    } else if is_final {
        Some(TranscriptEvent::Final { text: transcript.to_string(), confidence })
    } else {
        Some(TranscriptEvent::Partial { text: transcript.to_string() })
    };

    Some(DeepgramEvent { event, transcript_nonempty, speech_final, confidence })
}

#[async_trait::async_trait]
impl SttProvider for WebsocketSttAdapter {
    async fn start_stream(
        &self,
    ) -> Result<(mpsc::Sender<AudioChunk>, BoxStream<'static, TranscriptEvent>)> {
        let url = format!("{}?encoding=linear16&sample_rate=16000", self.ws_url);
        let mut request = url
            .into_client_request()
            .map_err(|e| vc_domain::error::Error::TransientProvider {
                provider: self.id.clone(),
                message: e.to_string(),
            })?;
        request.headers_mut().insert(
            "Authorization",
            format!("Token {}", self.api_key)
                .parse()
                .expect("header value from resolved api key is ASCII"),
        );

        let (ws_stream, _) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| vc_domain::error::Error::TransientProvider {
                provider: self.id.clone(),
                message: e.to_string(),
            })?;
        let (mut ws_write, mut ws_read) = ws_stream.split();

        let (audio_tx, mut audio_rx) = mpsc::channel::<AudioChunk>(64);
        let (event_tx, event_rx) = mpsc::channel::<TranscriptEvent>(64);

        let provider_id = self.id.clone();
        tokio::spawn(async move {
            while let Some(chunk) = audio_rx.recv().await {
                let bytes: Vec<u8> = chunk.samples.iter().flat_map(|s| s.to_le_bytes()).collect();
                if ws_write.send(WsMessage::Binary(bytes)).await.is_err() {
                    break;
                }
            }
            let _ = ws_write.close().await;
        });

        tokio::spawn(async move {
            let mut in_turn = false;
            loop {
                let next = tokio::time::timeout(SILENCE_TIMEOUT, ws_read.next()).await;
                let msg = match next {
                    Ok(Some(msg)) => msg,
                    Ok(None) => break,
                    Err(_elapsed) => {
                        if in_turn {
                            in_turn = false;
                            if event_tx.send(TranscriptEvent::EndOfTurn { confidence: 0.0 }).await.is_err() {
                                break;
                            }
                        }
                        continue;
                    }
                };

                match msg {
                    Ok(WsMessage::Text(text)) => {
                        let Some(parsed) = parse_deepgram_event(&text) else { continue };

                        if !in_turn && parsed.transcript_nonempty {
                            in_turn = true;
                            if event_tx.send(TranscriptEvent::StartOfTurn).await.is_err() {
                                break;
                            }
                        }

                        if let Some(event) = parsed.event {
                            if event_tx.send(event).await.is_err() {
                                break;
                            }
                        }

                        if parsed.speech_final {
                            in_turn = false;
                            if event_tx
                                .send(TranscriptEvent::EndOfTurn { confidence: parsed.confidence })
                                .await
                                .is_err()
                            {
                                break;
                            }
                        }
                    }
                    Ok(WsMessage::Close(_)) => break,
                    Err(e) => {
                        tracing::warn!(provider = %provider_id, error = %e, "stt websocket error");
                        let _ = event_tx
                            .send(TranscriptEvent::Error { kind: TranscriptErrorKind::Transient })
                            .await;
                        break;
                    }
                    _ => {}
                }
            }
        });

        let stream = tokio_stream::wrappers::ReceiverStream::new(event_rx);
        Ok((audio_tx, Box::pin(stream)))
    }

    fn provider_id(&self) -> &str {
        &self.id
    }
}

use tokio_tungstenite::tungstenite::client::IntoClientRequest;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interim_result_is_partial_and_not_speech_final() {
        let msg = r#"{"is_final":false,"speech_final":false,"channel":{"alternatives":[{"transcript":"hang on","confidence":0.4}]}}"#;
        let parsed = parse_deepgram_event(msg).unwrap();
        assert!(matches!(parsed.event, Some(TranscriptEvent::Partial { .. })));
        assert!(!parsed.speech_final);
        assert!(parsed.transcript_nonempty);
    }

    #[test]
    fn settled_segment_is_final_without_speech_final() {
        let msg = r#"{"is_final":true,"speech_final":false,"channel":{"alternatives":[{"transcript":"I need","confidence":0.9}]}}"#;
        let parsed = parse_deepgram_event(msg).unwrap();
        assert!(matches!(parsed.event, Some(TranscriptEvent::Final { .. })));
        assert!(!parsed.speech_final);
    }

    #[test]
    fn speech_final_marks_end_of_turn() {
        let msg = r#"{"is_final":true,"speech_final":true,"channel":{"alternatives":[{"transcript":"a callback please","confidence":0.95}]}}"#;
        let parsed = parse_deepgram_event(msg).unwrap();
        assert!(parsed.speech_final);
        assert_eq!(parsed.confidence, 0.95);
    }

    #[test]
    fn empty_transcript_yields_no_event() {
        let msg = r#"{"is_final":false,"speech_final":false,"channel":{"alternatives":[{"transcript":"","confidence":0.0}]}}"#;
        let parsed = parse_deepgram_event(msg).unwrap();
        assert!(parsed.event.is_none());
        assert!(!parsed.transcript_nonempty);
    }
}
