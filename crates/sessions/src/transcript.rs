//! Append-only JSONL transcript accumulator.
//!
//! Each call gets a `<call_id>.jsonl` file under the sessions directory.
//! Every user/assistant turn is appended as a single JSON line as soon as
//! it is finalized, so a crash mid-call still leaves a usable partial
//! transcript on disk.

use std::path::{Path, PathBuf};

use vc_domain::error::{Error, Result};
use vc_domain::types::{Role, TranscriptTurn};

/// Writes append-only JSONL transcript files, one per call.
pub struct TranscriptWriter {
    base_dir: PathBuf,
}

impl TranscriptWriter {
    pub fn new(base_dir: &Path) -> Self {
        Self { base_dir: base_dir.to_path_buf() }
    }

    fn path_for(&self, call_id: &str) -> PathBuf {
        self.base_dir.join(format!("{call_id}.jsonl"))
    }

    /// Append one finalized turn to a call's transcript.
    pub fn append(&self, call_id: &str, turn: &TranscriptTurn) -> Result<()> {
        let json = serde_json::to_string(turn)
            .map_err(|e| Error::Other(format!("serializing transcript turn: {e}")))?;

        use std::io::Write;
        std::fs::create_dir_all(&self.base_dir).map_err(Error::Io)?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path_for(call_id))
            .map_err(Error::Io)?;
        file.write_all(json.as_bytes()).map_err(Error::Io)?;
        file.write_all(b"\n").map_err(Error::Io)?;
        Ok(())
    }

    /// Read back a call's full transcript, in turn order.
    pub fn read(&self, call_id: &str) -> Result<Vec<TranscriptTurn>> {
        let path = self.path_for(call_id);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let raw = std::fs::read_to_string(&path).map_err(Error::Io)?;
        let mut turns = Vec::new();
        for line in raw.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<TranscriptTurn>(line) {
                Ok(turn) => turns.push(turn),
                Err(e) => {
                    tracing::warn!(call_id = call_id, error = %e, "skipping malformed transcript line");
                }
            }
        }
        Ok(turns)
    }
}

pub fn turn(role: Role, content: impl Into<String>, confidence: Option<f32>) -> TranscriptTurn {
    TranscriptTurn {
        role,
        content: content.into(),
        timestamp: chrono::Utc::now(),
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_then_read_round_trips_in_order() {
        let dir = tempdir();
        let writer = TranscriptWriter::new(&dir);
        writer.append("call1", &turn(Role::User, "hello", Some(0.95))).unwrap();
        writer.append("call1", &turn(Role::Assistant, "hi there", None)).unwrap();

        let turns = writer.read("call1").unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[1].content, "hi there");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn reading_unknown_call_returns_empty() {
        let dir = tempdir();
        let writer = TranscriptWriter::new(&dir);
        assert!(writer.read("nonexistent").unwrap().is_empty());
        std::fs::remove_dir_all(&dir).ok();
    }

    fn tempdir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("vc-sessions-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}
