//! Uniform media gateway contract (§4.1).

use async_trait::async_trait;
use vc_domain::audio::AudioChunk;
use vc_domain::error::Result;

/// Bidirectional audio transport for one live call. All three variants
/// (browser, SIP, telephony-provider) implement this same contract; the
/// Voice Pipeline depends only on it.
#[async_trait]
pub trait MediaGateway: Send + Sync {
    /// Poll for the next inbound chunk, waiting up to a short timeout.
    /// `Ok(None)` means idle (nothing arrived within the timeout);
    /// `Err(Error::MediaTransportClosed)` means the transport is gone.
    async fn receive_audio(&self) -> Result<Option<AudioChunk>>;

    /// Enqueue outbound PCM for playback. A no-op (logged once per call)
    /// after [`MediaGateway::close`].
    async fn send_audio(&self, chunk: AudioChunk);

    /// Drop any outbound audio not yet flushed to the transport, for
    /// barge-in.
    fn cancel_playback(&self);

    /// Idempotent. Releases transport resources and drops queued audio.
    async fn close(&self);
}
