//! A [`MediaGateway`] backed by a pair of raw-byte channels.
//!
//! Every gateway variant (browser, SIP, telephony-provider) is this same
//! duplex-channel plumbing with a different [`FrameCodec`]; the actual
//! websocket/RTP/provider-stream handling lives at the binary boundary,
//! which bridges its transport into the inbound/outbound channels handed
//! to [`ChannelGateway::new`].

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;

use vc_domain::audio::AudioChunk;
use vc_domain::error::{Error, Result};

use crate::codec::FrameCodec;
use crate::gateway::MediaGateway;

const POLL_TIMEOUT: Duration = Duration::from_millis(20);
const WRITER_IDLE_POLL: Duration = Duration::from_millis(5);

/// Used by call sites (tests, or callers with no configured bound) that
/// don't need to pace playback to a specific queue depth.
pub const DEFAULT_OUTBOUND_QUEUE_CAPACITY: usize = 64;

type OutboundItem = (AudioChunk, OwnedSemaphorePermit);

pub struct ChannelGateway<C: FrameCodec> {
    call_id: String,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<Vec<u8>>>,
    outbound_queue: Arc<Mutex<VecDeque<OutboundItem>>>,
    /// Bounds `outbound_queue`: a permit is acquired before a chunk is
    /// queued and only released once the writer task has sent it, so a
    /// full queue blocks the producer rather than growing without bound
    /// (§5: outbound audio paces to real-time).
    outbound_permits: Arc<Semaphore>,
    closed: Arc<AtomicBool>,
    warned_after_close: AtomicBool,
    writer: JoinHandle<()>,
    codec: C,
}

impl<C: FrameCodec> ChannelGateway<C> {
    pub fn new(call_id: impl Into<String>, inbound_rx: mpsc::Receiver<Vec<u8>>, outbound_tx: mpsc::Sender<Vec<u8>>, codec: C) -> Self {
        Self::with_capacity(call_id, inbound_rx, outbound_tx, codec, DEFAULT_OUTBOUND_QUEUE_CAPACITY)
    }

    pub fn with_capacity(
        call_id: impl Into<String>,
        inbound_rx: mpsc::Receiver<Vec<u8>>,
        outbound_tx: mpsc::Sender<Vec<u8>>,
        codec: C,
        outbound_capacity: usize,
    ) -> Self {
        let call_id = call_id.into();
        let outbound_queue: Arc<Mutex<VecDeque<OutboundItem>>> = Arc::new(Mutex::new(VecDeque::new()));
        let outbound_permits = Arc::new(Semaphore::new(outbound_capacity.max(1)));
        let closed = Arc::new(AtomicBool::new(false));

        let writer_queue = outbound_queue.clone();
        let writer_closed = closed.clone();
        let writer_codec = codec.clone();
        let writer_call_id = call_id.clone();
        let writer = tokio::spawn(async move {
            loop {
                let next = writer_queue.lock().pop_front();
                match next {
                    Some((chunk, permit)) => {
                        let frame = writer_codec.encode(&chunk);
                        if outbound_tx.send(frame).await.is_err() {
                            break;
                        }
                        drop(permit);
                    }
                    None => {
                        if writer_closed.load(Ordering::Relaxed) {
                            break;
                        }
                        tokio::time::sleep(WRITER_IDLE_POLL).await;
                    }
                }
            }
            tracing::debug!(call_id = %writer_call_id, "media gateway writer task exiting");
        });

        Self {
            call_id,
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            outbound_queue,
            outbound_permits,
            closed,
            warned_after_close: AtomicBool::new(false),
            writer,
            codec,
        }
    }
}

#[async_trait]
impl<C: FrameCodec> MediaGateway for ChannelGateway<C> {
    async fn receive_audio(&self) -> Result<Option<AudioChunk>> {
        let mut rx = self.inbound_rx.lock().await;
        match tokio::time::timeout(POLL_TIMEOUT, rx.recv()).await {
            Ok(Some(frame)) => Ok(Some(self.codec.decode(&frame))),
            Ok(None) => Err(Error::MediaTransportClosed(self.call_id.clone())),
            Err(_) => Ok(None),
        }
    }

    async fn send_audio(&self, chunk: AudioChunk) {
        if self.closed.load(Ordering::Relaxed) {
            if !self.warned_after_close.swap(true, Ordering::Relaxed) {
                tracing::warn!(call_id = %self.call_id, "send_audio called after gateway close");
            }
            return;
        }
        // Blocks the caller when the queue is at capacity, pacing TTS
        // playback to the rate the writer task can actually drain it.
        let Ok(permit) = self.outbound_permits.clone().acquire_owned().await else {
            return;
        };
        if self.closed.load(Ordering::Relaxed) {
            return;
        }
        self.outbound_queue.lock().push_back((chunk, permit));
    }

    fn cancel_playback(&self) {
        self.outbound_queue.lock().clear();
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::Relaxed) {
            return;
        }
        self.outbound_queue.lock().clear();
    }
}

impl<C: FrameCodec> Drop for ChannelGateway<C> {
    fn drop(&mut self) {
        self.writer.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::PcmPassthroughCodec;

    #[tokio::test]
    async fn receive_audio_times_out_when_idle() {
        let (_in_tx, in_rx) = mpsc::channel(8);
        let (out_tx, _out_rx) = mpsc::channel(8);
        let gw = ChannelGateway::new("call1", in_rx, out_tx, PcmPassthroughCodec);
        assert!(gw.receive_audio().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn receive_audio_decodes_inbound_frame() {
        let (in_tx, in_rx) = mpsc::channel(8);
        let (out_tx, _out_rx) = mpsc::channel(8);
        let gw = ChannelGateway::new("call1", in_rx, out_tx, PcmPassthroughCodec);
        in_tx.send(vec![1, 0, 2, 0]).await.unwrap();
        let chunk = gw.receive_audio().await.unwrap().unwrap();
        assert_eq!(chunk.samples, vec![1, 2]);
    }

    #[tokio::test]
    async fn receive_audio_errs_when_transport_closed() {
        let (in_tx, in_rx) = mpsc::channel(8);
        let (out_tx, _out_rx) = mpsc::channel(8);
        let gw = ChannelGateway::new("call1", in_rx, out_tx, PcmPassthroughCodec);
        drop(in_tx);
        assert!(gw.receive_audio().await.is_err());
    }

    #[tokio::test]
    async fn cancel_playback_drops_queued_audio() {
        let (_in_tx, in_rx) = mpsc::channel(8);
        let (out_tx, _out_rx) = mpsc::channel(8);
        let gw = ChannelGateway::new("call1", in_rx, out_tx, PcmPassthroughCodec);
        gw.send_audio(AudioChunk::new(vec![1, 2, 3], 16_000)).await;
        gw.cancel_playback();
        assert!(gw.outbound_queue.lock().is_empty());
    }

    #[tokio::test]
    async fn send_audio_after_close_is_a_noop() {
        let (_in_tx, in_rx) = mpsc::channel(8);
        let (out_tx, _out_rx) = mpsc::channel(8);
        let gw = ChannelGateway::new("call1", in_rx, out_tx, PcmPassthroughCodec);
        gw.close().await;
        gw.send_audio(AudioChunk::new(vec![1], 16_000)).await;
        assert!(gw.outbound_queue.lock().is_empty());
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let (_in_tx, in_rx) = mpsc::channel(8);
        let (out_tx, _out_rx) = mpsc::channel(8);
        let gw = ChannelGateway::new("call1", in_rx, out_tx, PcmPassthroughCodec);
        gw.close().await;
        gw.close().await;
    }
}
