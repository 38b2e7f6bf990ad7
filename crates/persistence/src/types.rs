//! Row DTOs for the consumed-only persistence interfaces (§6): `dialer_jobs`,
//! `calls`, `transcripts`, `recordings`, `action_plans`. Every row carries
//! `tenant_id` and is written by upsert, never read back — Vocalis is a
//! producer of these rows, not the store that owns them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vc_domain::types::{ActionPlanStatus, CallOutcome, JobStatus, StepResult, TranscriptTurn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialerJobRow {
    pub id: String,
    pub campaign_id: String,
    pub lead_id: String,
    pub tenant_id: String,
    pub phone_number: String,
    pub priority: u8,
    pub status: JobStatus,
    pub attempt_number: u32,
    pub scheduled_at: DateTime<Utc>,
    #[serde(default)]
    pub last_outcome: Option<CallOutcome>,
    #[serde(default)]
    pub last_error: Option<String>,
    #[serde(default)]
    pub call_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRow {
    pub id: String,
    pub external_call_uuid: String,
    pub tenant_id: String,
    pub campaign_id: String,
    pub lead_id: String,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    #[serde(default)]
    pub outcome: Option<CallOutcome>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptRow {
    pub call_id: String,
    pub tenant_id: String,
    pub turns: Vec<TranscriptTurn>,
    pub full_text: String,
    pub word_count: usize,
    pub turn_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingRow {
    pub call_id: String,
    pub tenant_id: String,
    pub storage_path: String,
    pub duration_seconds: f64,
    pub file_size_bytes: u64,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionPlanRow {
    pub plan_id: String,
    pub tenant_id: String,
    pub intent: String,
    pub context: serde_json::Value,
    pub actions: serde_json::Value,
    pub status: ActionPlanStatus,
    pub current_step: usize,
    pub step_results: Vec<StepResult>,
    #[serde(default)]
    pub error: Option<String>,
}
