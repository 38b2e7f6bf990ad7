//! Bounded inbound-audio buffer sitting between the media gateway's receive
//! loop and the STT provider's audio channel.
//!
//! Unlike the outbound path (§5: bounded, producer blocks), inbound audio
//! must never make the gateway's receive loop wait — a live call can't pause
//! the network read side. So this queue drops the oldest buffered chunk to
//! make room for a new one when full, and counts how many it drops.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use vc_domain::audio::AudioChunk;
use vc_domain::trace::TraceEvent;

const FORWARDER_IDLE_POLL: Duration = Duration::from_millis(5);

pub struct InboundAudioQueue {
    buffer: Arc<Mutex<VecDeque<AudioChunk>>>,
    capacity: usize,
    dropped_total: Arc<AtomicU64>,
    forwarder: JoinHandle<()>,
}

impl InboundAudioQueue {
    /// Spawns the forwarder task that drains into `downstream` and returns
    /// the queue handle the gateway's receive loop pushes chunks into.
    pub fn spawn(call_id: String, capacity: usize, downstream: mpsc::Sender<AudioChunk>) -> Self {
        let capacity = capacity.max(1);
        let buffer: Arc<Mutex<VecDeque<AudioChunk>>> = Arc::new(Mutex::new(VecDeque::with_capacity(capacity)));
        let dropped_total = Arc::new(AtomicU64::new(0));

        let forwarder_buffer = buffer.clone();
        let forwarder = tokio::spawn(async move {
            loop {
                let next = forwarder_buffer.lock().pop_front();
                match next {
                    Some(chunk) => {
                        if downstream.send(chunk).await.is_err() {
                            break;
                        }
                    }
                    None => tokio::time::sleep(FORWARDER_IDLE_POLL).await,
                }
            }
            tracing::debug!(call_id = %call_id, "inbound audio forwarder exiting");
        });

        Self { buffer, capacity, dropped_total, forwarder }
    }

    /// Pushes a chunk, dropping the oldest buffered one if already at
    /// capacity. Never blocks.
    pub fn push(&self, call_id: &str, chunk: AudioChunk) {
        let mut buffer = self.buffer.lock();
        if buffer.len() >= self.capacity {
            buffer.pop_front();
            let dropped_total = self.dropped_total.fetch_add(1, Ordering::Relaxed) + 1;
            drop(buffer);
            TraceEvent::InboundAudioDropped { call_id: call_id.to_string(), dropped_total }.emit();
        }
        self.buffer.lock().push_back(chunk);
    }
}

impl Drop for InboundAudioQueue {
    fn drop(&mut self) {
        self.forwarder.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn drains_in_order_to_downstream() {
        let (tx, mut rx) = mpsc::channel(8);
        let queue = InboundAudioQueue::spawn("call1".into(), 4, tx);
        queue.push("call1", AudioChunk::new(vec![1], 16_000));
        queue.push("call1", AudioChunk::new(vec![2], 16_000));
        assert_eq!(rx.recv().await.unwrap().samples, vec![1]);
        assert_eq!(rx.recv().await.unwrap().samples, vec![2]);
    }

    #[tokio::test]
    async fn drops_oldest_when_full_and_counts_it() {
        let (tx, mut rx) = mpsc::channel(8);
        let queue = InboundAudioQueue::spawn("call1".into(), 2, tx);
        // The forwarder task hasn't run yet (no `.await` below has yielded
        // to the executor), so these three pushes land before any drain.
        queue.push("call1", AudioChunk::new(vec![1], 16_000));
        queue.push("call1", AudioChunk::new(vec![2], 16_000));
        queue.push("call1", AudioChunk::new(vec![3], 16_000));
        assert_eq!(queue.dropped_total.load(Ordering::Relaxed), 1);

        let mut seen = Vec::new();
        for _ in 0..2 {
            seen.push(rx.recv().await.unwrap().samples);
        }
        assert_eq!(seen, vec![vec![2], vec![3]]);
    }
}
