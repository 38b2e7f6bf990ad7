//! Call session management.
//!
//! Owns the in-memory call session table, the idle-timeout check that
//! drives graceful hangups, the append-only transcript accumulator, and
//! the call recording buffer.

pub mod call_store;
pub mod idle;
pub mod recording;
pub mod transcript;

pub use call_store::CallSessionStore;
pub use recording::RecordingBuffer;
pub use transcript::TranscriptWriter;
