//! Adapter contracts for the four provider kinds a call touches: speech-to-text,
//! chat completion, text-to-speech, and outbound telephony.

use vc_domain::audio::{AudioChunk, BoxStream, TranscriptEvent};
use vc_domain::capability::LlmCapabilities;
use vc_domain::error::Result;
use vc_domain::llm::{ChatRequest, ChatResponse, LlmStreamEvent};

/// Translates a provider's streaming speech-to-text wire format into
/// [`TranscriptEvent`]s.
///
/// Implementations own the transport (websocket, gRPC, ...) and are expected
/// to reconnect once on a transient error before giving up (§4.4).
#[async_trait::async_trait]
pub trait SttProvider: Send + Sync {
    /// Open a streaming transcription session. The caller pushes audio
    /// chunks into the returned sender and reads events from the stream.
    async fn start_stream(
        &self,
    ) -> Result<(
        tokio::sync::mpsc::Sender<AudioChunk>,
        BoxStream<'static, TranscriptEvent>,
    )>;

    fn provider_id(&self) -> &str;
}

/// Trait every chat-completion adapter must implement.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse>;

    async fn chat_stream(&self, req: ChatRequest) -> Result<BoxStream<'static, Result<LlmStreamEvent>>>;

    fn capabilities(&self) -> &LlmCapabilities;

    fn provider_id(&self) -> &str;
}

/// Streaming speech synthesis.
#[async_trait::async_trait]
pub trait TtsProvider: Send + Sync {
    /// Synthesize `text` and return a stream of 16 kHz mono PCM chunks.
    async fn synthesize(&self, text: &str) -> Result<BoxStream<'static, Result<AudioChunk>>>;

    fn provider_id(&self) -> &str;
}

/// Places an outbound call via a telephony/SIP provider and returns an
/// opaque provider-side call identifier used to correlate webhooks.
#[async_trait::async_trait]
pub trait TelephonyCaller: Send + Sync {
    async fn place_call(&self, to_number: &str, webhook_url: &str) -> Result<String>;

    /// Best-effort request to hang up an in-progress call.
    async fn hang_up(&self, provider_call_id: &str) -> Result<()>;

    fn provider_id(&self) -> &str;
}
