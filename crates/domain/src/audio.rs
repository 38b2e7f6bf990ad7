//! Audio chunk types shared by media gateways and provider adapters.
//!
//! All audio crossing a crate boundary is normalized to 16 kHz mono,
//! 16-bit signed little-endian PCM (§4.1). Gateways performing format
//! conversion (G.711 μ-law 8 kHz for SIP, Float32 for the browser) do so
//! at their own boundary.

use std::pin::Pin;

/// A boxed async stream — used for audio and LLM/STT/TTS event streams.
pub type BoxStream<'a, T> = Pin<Box<dyn futures_core::Stream<Item = T> + Send + 'a>>;

/// A chunk of 16-bit signed little-endian PCM audio, 16 kHz mono.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

impl AudioChunk {
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self { samples, sample_rate }
    }

    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        (self.samples.len() as u64 * 1000) / self.sample_rate as u64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Events emitted by a streaming STT adapter (§4.2).
#[derive(Debug, Clone)]
pub enum TranscriptEvent {
    Partial { text: String },
    Final { text: String, confidence: f32 },
    StartOfTurn,
    EndOfTurn { confidence: f32 },
    Resumed,
    Error { kind: TranscriptErrorKind },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptErrorKind {
    Transient,
    Fatal,
}
