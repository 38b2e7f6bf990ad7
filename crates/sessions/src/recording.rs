//! Call recording buffer.
//!
//! Accumulates raw inbound PCM for a call in memory and flushes it to a
//! mono 16 kHz / 16-bit WAV file on close (§4.3). Only the caller's audio
//! is recorded; outbound TTS never passes through this buffer.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use vc_domain::audio::AudioChunk;
use vc_domain::error::{Error, Result};
use vc_domain::types::RecordingMetadata;

pub struct RecordingBuffer {
    call_id: String,
    samples: Mutex<Vec<i16>>,
    metadata: RecordingMetadata,
}

impl RecordingBuffer {
    pub fn new(call_id: impl Into<String>) -> Self {
        let call_id = call_id.into();
        Self {
            metadata: RecordingMetadata { call_id: call_id.clone(), ..Default::default() },
            call_id,
            samples: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, chunk: &AudioChunk) {
        if chunk.sample_rate != self.metadata.sample_rate {
            tracing::warn!(
                call_id = %self.call_id,
                expected = self.metadata.sample_rate,
                got = chunk.sample_rate,
                "recording buffer received audio at an unexpected sample rate"
            );
        }
        self.samples.lock().extend_from_slice(&chunk.samples);
    }

    pub fn sample_count(&self) -> usize {
        self.samples.lock().len()
    }

    pub fn sample_rate(&self) -> u32 {
        self.metadata.sample_rate
    }

    /// Flush the accumulated samples to `<base_dir>/<call_id>.wav`.
    pub fn flush(&self, base_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(base_dir).map_err(Error::Io)?;
        let path = base_dir.join(format!("{}.wav", self.call_id));

        let spec = hound::WavSpec {
            channels: self.metadata.channels,
            sample_rate: self.metadata.sample_rate,
            bits_per_sample: self.metadata.bit_depth,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec)
            .map_err(|e| Error::Other(format!("creating wav writer: {e}")))?;
        for sample in self.samples.lock().iter() {
            writer
                .write_sample(*sample)
                .map_err(|e| Error::Other(format!("writing wav sample: {e}")))?;
        }
        writer.finalize().map_err(|e| Error::Other(format!("finalizing wav file: {e}")))?;

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tempdir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("vc-sessions-rec-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn push_accumulates_samples() {
        let buf = RecordingBuffer::new("call1");
        buf.push(&AudioChunk::new(vec![1, 2, 3], 16_000));
        buf.push(&AudioChunk::new(vec![4, 5], 16_000));
        assert_eq!(buf.sample_count(), 5);
    }

    #[test]
    fn flush_writes_wav_file() {
        let dir = tempdir();
        let buf = RecordingBuffer::new("call1");
        buf.push(&AudioChunk::new(vec![100, -100, 200], 16_000));
        let path = buf.flush(&dir).unwrap();
        assert!(path.exists());
        std::fs::remove_dir_all(&dir).ok();
    }
}
