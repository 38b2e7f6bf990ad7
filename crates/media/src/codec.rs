//! Wire-format codecs for the media gateway variants (§4.1).
//!
//! Internally all audio is 16 kHz mono, 16-bit signed little-endian PCM.
//! Each [`FrameCodec`] converts between that internal representation and
//! whatever bytes a transport actually carries.

use vc_domain::audio::AudioChunk;

pub const INTERNAL_SAMPLE_RATE: u32 = 16_000;

/// Converts raw transport frames to/from [`AudioChunk`]s.
pub trait FrameCodec: Clone + Send + Sync + 'static {
    fn decode(&self, frame: &[u8]) -> AudioChunk;
    fn encode(&self, chunk: &AudioChunk) -> Vec<u8>;
}

/// Browser and telephony-provider transports already carry 16 kHz PCM16LE;
/// this codec is a pure byte<->sample reinterpretation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PcmPassthroughCodec;

impl FrameCodec for PcmPassthroughCodec {
    fn decode(&self, frame: &[u8]) -> AudioChunk {
        let samples = frame
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        AudioChunk::new(samples, INTERNAL_SAMPLE_RATE)
    }

    fn encode(&self, chunk: &AudioChunk) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(chunk.samples.len() * 2);
        for sample in &chunk.samples {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        bytes
    }
}

/// SIP/RTP transports carry G.711 mu-law at 8 kHz; this codec decodes to
/// 16 kHz PCM on the way in and mu-law-encodes 8 kHz PCM on the way out.
#[derive(Debug, Clone, Copy, Default)]
pub struct MuLawCodec;

impl FrameCodec for MuLawCodec {
    fn decode(&self, frame: &[u8]) -> AudioChunk {
        let narrowband: Vec<i16> = frame.iter().map(|b| ulaw_decode(*b)).collect();
        AudioChunk::new(upsample_2x(&narrowband), INTERNAL_SAMPLE_RATE)
    }

    fn encode(&self, chunk: &AudioChunk) -> Vec<u8> {
        let narrowband = downsample_2x(&chunk.samples);
        narrowband.into_iter().map(ulaw_encode).collect()
    }
}

/// Linear-interpolation upsample by 2x (8 kHz -> 16 kHz).
fn upsample_2x(samples: &[i16]) -> Vec<i16> {
    if samples.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(samples.len() * 2);
    for window in samples.windows(2) {
        out.push(window[0]);
        let mid = (window[0] as i32 + window[1] as i32) / 2;
        out.push(mid as i16);
    }
    out.push(*samples.last().unwrap());
    out.push(*samples.last().unwrap());
    out
}

/// Decimate by 2x (16 kHz -> 8 kHz), dropping every other sample.
fn downsample_2x(samples: &[i16]) -> Vec<i16> {
    samples.iter().step_by(2).copied().collect()
}

const ULAW_BIAS: i16 = 0x84;
const ULAW_CLIP: i16 = 32_635;

/// ITU-T G.711 mu-law decode: one byte -> one 16-bit linear PCM sample.
pub fn ulaw_decode(encoded: u8) -> i16 {
    let encoded = !encoded;
    let sign = encoded & 0x80;
    let exponent = (encoded >> 4) & 0x07;
    let mantissa = encoded & 0x0F;
    let mut sample = ((mantissa as i16) << 3) + ULAW_BIAS;
    sample <<= exponent;
    sample -= ULAW_BIAS;
    if sign != 0 {
        -sample
    } else {
        sample
    }
}

/// ITU-T G.711 mu-law encode: one 16-bit linear PCM sample -> one byte.
pub fn ulaw_encode(sample: i16) -> u8 {
    let sign = if sample < 0 { 0x80u8 } else { 0x00u8 };
    let magnitude = (sample as i32).unsigned_abs().min(ULAW_CLIP as u32) as i16 + ULAW_BIAS;

    let mut exponent: u8 = 7;
    for exp in 0..8u8 {
        if magnitude <= (0x1F << (exp + 1)) {
            exponent = exp;
            break;
        }
    }
    let mantissa = ((magnitude >> (exponent + 3)) & 0x0F) as u8;
    let encoded = sign | (exponent << 4) | mantissa;
    !encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ulaw_round_trip_is_approximately_lossless() {
        for sample in [0i16, 100, -100, 1000, -1000, 20_000, -20_000] {
            let encoded = ulaw_encode(sample);
            let decoded = ulaw_decode(encoded);
            let err = (decoded as i32 - sample as i32).abs();
            assert!(err < 512, "sample {sample} decoded to {decoded}, err {err}");
        }
    }

    #[test]
    fn ulaw_zero_round_trips_near_zero() {
        let encoded = ulaw_encode(0);
        assert!(ulaw_decode(encoded).abs() < 16);
    }

    #[test]
    fn upsample_doubles_length() {
        let out = upsample_2x(&[1, 2, 3]);
        assert_eq!(out.len(), 6);
    }

    #[test]
    fn downsample_halves_length() {
        let out = downsample_2x(&[1, 2, 3, 4, 5]);
        assert_eq!(out, vec![1, 3, 5]);
    }

    #[test]
    fn pcm_passthrough_round_trips() {
        let codec = PcmPassthroughCodec;
        let chunk = AudioChunk::new(vec![1, -1, 1000, -1000], INTERNAL_SAMPLE_RATE);
        let bytes = codec.encode(&chunk);
        let decoded = codec.decode(&bytes);
        assert_eq!(decoded.samples, chunk.samples);
    }

    #[test]
    fn mulaw_codec_resamples_through_telephony_rate() {
        let codec = MuLawCodec;
        let chunk = AudioChunk::new(vec![1000; 160], INTERNAL_SAMPLE_RATE);
        let frame = codec.encode(&chunk);
        assert_eq!(frame.len(), 80);
        let decoded = codec.decode(&frame);
        assert_eq!(decoded.sample_rate, INTERNAL_SAMPLE_RATE);
        assert_eq!(decoded.samples.len(), 160);
    }
}
