//! Voice Pipeline: per-call orchestration of STT, LLM, and TTS adapters
//! over a [`vc_media::MediaGateway`] (§4.4).

pub mod dialogue;
pub mod inbound_queue;
pub mod pipeline;
pub mod turn;

pub use pipeline::VoicePipeline;
