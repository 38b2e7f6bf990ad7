//! Voice Pipeline Service (§4.4): per-call orchestrator wiring the media
//! gateway, STT, LLM, and TTS adapters, with barge-in and idle-timeout
//! handling.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use vc_domain::audio::{TranscriptErrorKind, TranscriptEvent};
use vc_domain::config::PipelineConfig;
use vc_domain::error::Result;
use vc_domain::llm::Message;
use vc_domain::trace::TraceEvent;
use vc_domain::types::{CallOutcome, ConversationState, Role};
use vc_media::MediaGateway;
use vc_providers::{LlmProvider, SttProvider, TtsProvider};
use vc_sessions::{call_store::CallSessionStore, idle, recording::RecordingBuffer, transcript};

use crate::dialogue::{self, DialogueEvent};
use crate::inbound_queue::InboundAudioQueue;
use crate::turn::{self, TurnOutcome};

const IDLE_CHECK_INTERVAL: Duration = Duration::from_secs(1);

pub struct VoicePipeline {
    pub call_id: String,
    pub tenant_id: String,
    pub campaign_id: String,
    pub lead_id: String,
    pub config: PipelineConfig,

    pub gateway: Arc<dyn MediaGateway>,
    pub stt: Arc<dyn SttProvider>,
    pub llm: Arc<dyn LlmProvider>,
    pub tts: Arc<dyn TtsProvider>,

    pub sessions: Arc<CallSessionStore>,
    pub transcripts: Arc<transcript::TranscriptWriter>,
    pub recording: Arc<RecordingBuffer>,
}

impl VoicePipeline {
    /// Run the call to completion and return its terminal outcome.
    pub async fn run(self: Arc<Self>, greeting: Option<String>) -> CallOutcome {
        self.sessions.create(
            self.call_id.clone(),
            self.tenant_id.clone(),
            self.campaign_id.clone(),
            self.lead_id.clone(),
        );
        TraceEvent::CallStarted {
            call_id: self.call_id.clone(),
            tenant_id: self.tenant_id.clone(),
            campaign_id: self.campaign_id.clone(),
        }
        .emit();

        let started_at = Utc::now();
        let outcome = self.run_inner(greeting).await.unwrap_or_else(|e| {
            tracing::error!(call_id = %self.call_id, error = %e, "voice pipeline ended with a fatal error");
            CallOutcome::Failed
        });

        self.gateway.close().await;
        self.sessions.transition(&self.call_id, ConversationState::Ended);
        self.sessions.remove(&self.call_id);

        let duration_ms = (Utc::now() - started_at).num_milliseconds().max(0) as u64;
        TraceEvent::CallEnded {
            call_id: self.call_id.clone(),
            outcome: format!("{outcome:?}"),
            duration_ms,
        }
        .emit();

        outcome
    }

    async fn run_inner(&self, greeting: Option<String>) -> Result<CallOutcome> {
        let (audio_tx, mut transcript_rx) = self.stt.start_stream().await?;

        let inbound_queue = Arc::new(InboundAudioQueue::spawn(
            self.call_id.clone(),
            self.config.inbound_queue_capacity,
            audio_tx,
        ));

        let (hangup_tx, mut hangup_rx) = mpsc::channel::<()>(1);
        let inbound_gateway = self.gateway.clone();
        let recording = self.recording.clone();
        let call_id = self.call_id.clone();
        let receive_queue = inbound_queue.clone();
        tokio::spawn(async move {
            loop {
                match inbound_gateway.receive_audio().await {
                    Ok(Some(chunk)) => {
                        recording.push(&chunk);
                        receive_queue.push(&call_id, chunk);
                    }
                    Ok(None) => continue,
                    Err(e) => {
                        tracing::info!(call_id = %call_id, error = %e, "media transport closed");
                        let _ = hangup_tx.send(()).await;
                        break;
                    }
                }
            }
        });

        let mut state = ConversationState::Greeting;
        let mut cancel = CancellationToken::new();
        let mut history = vec![Message::system(self.config.system_prompt.clone())];
        let mut pending_user_text = String::new();
        let mut last_activity = Utc::now();
        let mut turn_index = 0usize;

        if let Some(text) = greeting {
            let _ = turn::speak_text(&self.tts, &self.gateway, &cancel, &text).await;
            history.push(Message::assistant(text.clone()));
            self.transcripts.append(&self.call_id, &transcript::turn(Role::Assistant, text, None))?;
        }
        if let Some(next) = dialogue::next_state(state, DialogueEvent::GreetingComplete) {
            self.sessions.transition(&self.call_id, next);
            state = next;
        }

        loop {
            tokio::select! {
                _ = hangup_rx.recv() => {
                    return Ok(CallOutcome::Answered);
                }
                _ = tokio::time::sleep(IDLE_CHECK_INTERVAL) => {
                    if idle::is_idle(last_activity, Utc::now(), self.config.idle_timeout_secs) {
                        tracing::info!(call_id = %self.call_id, "call idle timeout reached, closing gracefully");
                        return Ok(CallOutcome::Answered);
                    }
                }
                event = transcript_rx.next() => {
                    let Some(event) = event else {
                        return Ok(CallOutcome::Answered);
                    };
                    last_activity = Utc::now();

                    match event {
                        TranscriptEvent::Partial { text } => {
                            if state == ConversationState::Speaking {
                                let nonempty = !text.trim().is_empty();
                                if nonempty {
                                    if let Some(next) = dialogue::next_state(state, DialogueEvent::SttStartOfTurn { partial_nonempty: true }) {
                                        cancel.cancel();
                                        self.gateway.cancel_playback();
                                        self.sessions.record_barge_in(&self.call_id);
                                        self.sessions.transition(&self.call_id, next);
                                        TraceEvent::BargeIn { call_id: self.call_id.clone(), chunks_dropped: 0 }.emit();
                                        state = next;
                                        cancel = CancellationToken::new();
                                    }
                                }
                            }
                        }
                        TranscriptEvent::StartOfTurn | TranscriptEvent::Resumed => {}
                        TranscriptEvent::Final { text, .. } => {
                            pending_user_text = text;
                        }
                        TranscriptEvent::EndOfTurn { confidence } => {
                            let text_nonempty = !pending_user_text.trim().is_empty();
                            let Some(next) = dialogue::next_state(state, DialogueEvent::SttEndOfTurn { text_nonempty }) else {
                                pending_user_text.clear();
                                continue;
                            };
                            self.sessions.transition(&self.call_id, next);
                            state = next;

                            if !text_nonempty {
                                pending_user_text.clear();
                                continue;
                            }

                            let user_text = std::mem::take(&mut pending_user_text);
                            self.transcripts.append(&self.call_id, &transcript::turn(Role::User, user_text.clone(), Some(confidence)))?;
                            history.push(Message::user(user_text));
                            self.sessions.record_turn(&self.call_id);

                            if let Some(speaking) = dialogue::next_state(state, DialogueEvent::LlmFirstToken) {
                                self.sessions.transition(&self.call_id, speaking);
                                state = speaking;
                            }

                            match turn::run_turn(&self.llm, &self.tts, &self.gateway, &cancel, history.clone()).await? {
                                TurnOutcome::Completed { assistant_text } => {
                                    self.transcripts.append(&self.call_id, &transcript::turn(Role::Assistant, assistant_text.clone(), None))?;
                                    history.push(Message::assistant(assistant_text));
                                    if let Some(next) = dialogue::next_state(state, DialogueEvent::TtsComplete) {
                                        self.sessions.transition(&self.call_id, next);
                                        state = next;
                                    }
                                    TraceEvent::TurnCompleted { call_id: self.call_id.clone(), turn_index }.emit();
                                    turn_index += 1;
                                }
                                TurnOutcome::BargedIn { assistant_text_so_far: _ } => {
                                    // A barged-in stream never completed, so it isn't a real
                                    // assistant turn: not appended to the transcript, not
                                    // pushed into LLM history (§8: transcript turn count
                                    // tracks completed TTS streams only).
                                    cancel = CancellationToken::new();
                                }
                                TurnOutcome::LlmFailed { message } => {
                                    tracing::warn!(call_id = %self.call_id, error = %message, "llm turn failed, returning to listening");
                                    if let Some(next) = dialogue::next_state(ConversationState::Speaking, DialogueEvent::TtsComplete) {
                                        self.sessions.transition(&self.call_id, next);
                                        state = next;
                                    }
                                }
                            }
                        }
                        TranscriptEvent::Error { kind } => match kind {
                            TranscriptErrorKind::Transient => {
                                tracing::warn!(call_id = %self.call_id, "stt transient error, continuing");
                            }
                            TranscriptErrorKind::Fatal => {
                                return Ok(CallOutcome::Failed);
                            }
                        },
                    }
                }
            }
        }
    }
}
