//! One dialogue turn: stream the LLM response and forward completed
//! sentences to TTS as they arrive (§4.4 "tokens are forwarded to TTS as
//! they arrive, not batched").
//!
//! Grounded on the teacher's turn-execution loop: accumulate a streaming
//! response, react to each event as it comes in, and know how to stop
//! cleanly mid-stream.

use std::sync::Arc;

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use vc_domain::error::{Error, Result};
use vc_domain::llm::{ChatRequest, LlmStreamEvent, Message};
use vc_media::MediaGateway;
use vc_providers::{LlmProvider, TtsProvider};

const SENTENCE_TERMINATORS: [char; 3] = ['.', '!', '?'];
const FORCE_FLUSH_CHARS: usize = 200;
const FALLBACK_APOLOGY: &str = "Sorry, I'm having trouble right now. Could you say that again?";

pub enum TurnOutcome {
    /// The assistant finished speaking without interruption.
    Completed { assistant_text: String },
    /// The caller barged in; `assistant_text_so_far` is what had already
    /// been generated (for the transcript), but TTS stopped mid-stream.
    BargedIn { assistant_text_so_far: String },
    /// The LLM call failed; a fallback apology was already spoken.
    LlmFailed { message: String },
}

enum SpeakOutcome {
    Completed,
    BargedIn,
}

/// Run one LLM turn against `messages`, streaming the response to `tts`
/// and `gateway` sentence by sentence. `cancel` is checked between every
/// token and every outbound audio chunk so barge-in stops playback within
/// one chunk interval.
pub async fn run_turn(
    llm: &Arc<dyn LlmProvider>,
    tts: &Arc<dyn TtsProvider>,
    gateway: &Arc<dyn MediaGateway>,
    cancel: &CancellationToken,
    messages: Vec<Message>,
) -> Result<TurnOutcome> {
    let req = ChatRequest { messages, ..Default::default() };

    let mut stream = match llm.chat_stream(req).await {
        Ok(s) => s,
        Err(e) => return Ok(speak_fallback(tts, gateway, cancel, &e).await),
    };

    let mut assistant_text = String::new();
    let mut pending = String::new();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                return Ok(TurnOutcome::BargedIn { assistant_text_so_far: assistant_text });
            }
            next = stream.next() => {
                match next {
                    Some(Ok(LlmStreamEvent::Token { text })) => {
                        assistant_text.push_str(&text);
                        pending.push_str(&text);
                        if ends_sentence(&pending) {
                            match speak_chunk(tts, gateway, cancel, &pending).await? {
                                SpeakOutcome::BargedIn => {
                                    return Ok(TurnOutcome::BargedIn { assistant_text_so_far: assistant_text });
                                }
                                SpeakOutcome::Completed => pending.clear(),
                            }
                        }
                    }
                    Some(Ok(LlmStreamEvent::ToolCall { tool_name, .. })) => {
                        // Voice turns don't dispatch tools inline; an action
                        // plan triggered by this conversation is executed
                        // out-of-band by the action-plan executor.
                        tracing::debug!(tool_name = %tool_name, "ignoring inline tool call during voice turn");
                    }
                    Some(Ok(LlmStreamEvent::Done { .. })) => break,
                    Some(Ok(LlmStreamEvent::Error { message })) => {
                        return Ok(TurnOutcome::LlmFailed { message });
                    }
                    Some(Err(e)) => return Ok(speak_fallback(tts, gateway, cancel, &e).await),
                    None => break,
                }
            }
        }
    }

    if !pending.trim().is_empty() {
        if let SpeakOutcome::BargedIn = speak_chunk(tts, gateway, cancel, &pending).await? {
            return Ok(TurnOutcome::BargedIn { assistant_text_so_far: assistant_text });
        }
    }

    Ok(TurnOutcome::Completed { assistant_text })
}

fn ends_sentence(buf: &str) -> bool {
    let trimmed = buf.trim_end();
    !trimmed.is_empty() && (trimmed.ends_with(SENTENCE_TERMINATORS) || buf.chars().count() > FORCE_FLUSH_CHARS)
}

/// Speak a single fixed string end to end, e.g. the opening greeting, which
/// has no LLM stream to chunk against sentence boundaries.
pub async fn speak_text(
    tts: &Arc<dyn TtsProvider>,
    gateway: &Arc<dyn MediaGateway>,
    cancel: &CancellationToken,
    text: &str,
) -> Result<()> {
    speak_chunk(tts, gateway, cancel, text).await?;
    Ok(())
}

async fn speak_chunk(
    tts: &Arc<dyn TtsProvider>,
    gateway: &Arc<dyn MediaGateway>,
    cancel: &CancellationToken,
    text: &str,
) -> Result<SpeakOutcome> {
    let mut audio = match tts.synthesize(text).await {
        Ok(s) => s,
        Err(e) if e.is_transient() => {
            tracing::warn!(error = %e, "tts connect failed transiently, reconnecting once");
            tts.synthesize(text).await?
        }
        Err(e) => return Err(e),
    };

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return Ok(SpeakOutcome::BargedIn),
            next = audio.next() => {
                match next {
                    Some(Ok(chunk)) => gateway.send_audio(chunk).await,
                    Some(Err(e)) if e.is_transient() => {
                        tracing::warn!(error = %e, "tts stream interrupted transiently, ending chunk early");
                        break;
                    }
                    Some(Err(e)) => return Err(e),
                    None => break,
                }
            }
        }
    }
    Ok(SpeakOutcome::Completed)
}

async fn speak_fallback(tts: &Arc<dyn TtsProvider>, gateway: &Arc<dyn MediaGateway>, cancel: &CancellationToken, err: &Error) -> TurnOutcome {
    tracing::warn!(error = %err, "llm call failed, speaking fallback apology");
    let _ = speak_chunk(tts, gateway, cancel, FALLBACK_APOLOGY).await;
    TurnOutcome::LlmFailed { message: err.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ends_sentence_detects_terminal_punctuation() {
        assert!(ends_sentence("Hello there."));
        assert!(ends_sentence("Is that right?"));
        assert!(!ends_sentence("Hello there"));
    }

    #[test]
    fn ends_sentence_force_flushes_long_buffers_without_punctuation() {
        let long = "a".repeat(FORCE_FLUSH_CHARS + 1);
        assert!(ends_sentence(&long));
    }

    #[test]
    fn ends_sentence_ignores_empty_buffer() {
        assert!(!ends_sentence(""));
        assert!(!ends_sentence("   "));
    }
}
