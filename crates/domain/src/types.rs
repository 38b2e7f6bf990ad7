//! Core data model shared by the queue, dialer, pipeline, sessions, and
//! action-plan crates. Closed, exhaustively-matched enums stand in for the
//! string-typed statuses and outcomes a dynamic system would use.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of attempts a [`DialerJob`] may make before it is
/// declared terminally `Failed`.
pub const MAX_ATTEMPTS: u32 = 3;

/// Default retry delay, in seconds, applied when a call outcome is
/// retryable. Configurable per [`crate::config::RetryConfig`].
pub const DEFAULT_RETRY_DELAY_SECS: i64 = 7200;

/// Jobs at or above this priority route to the priority queue.
pub const PRIORITY_THRESHOLD: u8 = 8;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Dialer job
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    RetryScheduled,
    Completed,
    Failed,
    NonRetryable,
}

/// A single outbound-call job moving through the queue/dialer pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialerJob {
    pub job_id: String,
    pub campaign_id: String,
    pub lead_id: String,
    pub tenant_id: String,
    pub phone_number: String,
    /// 1–10. Values >= [`PRIORITY_THRESHOLD`] route to the priority queue.
    pub priority: u8,
    pub status: JobStatus,
    pub attempt_number: u32,
    pub scheduled_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub last_outcome: Option<CallOutcome>,
    pub last_error: Option<String>,
    pub call_id: Option<String>,
}

impl DialerJob {
    pub fn new(
        campaign_id: impl Into<String>,
        lead_id: impl Into<String>,
        tenant_id: impl Into<String>,
        phone_number: impl Into<String>,
        priority: u8,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            job_id: uuid::Uuid::new_v4().to_string(),
            campaign_id: campaign_id.into(),
            lead_id: lead_id.into(),
            tenant_id: tenant_id.into(),
            phone_number: phone_number.into(),
            priority: priority.clamp(1, 10),
            status: JobStatus::Pending,
            attempt_number: 1,
            scheduled_at: now,
            created_at: now,
            processed_at: None,
            completed_at: None,
            last_outcome: None,
            last_error: None,
            call_id: None,
        }
    }

    pub fn is_high_priority(&self) -> bool {
        self.priority >= PRIORITY_THRESHOLD
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Call outcomes and retry classification
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOutcome {
    Answered,
    GoalAchieved,
    Busy,
    NoAnswer,
    Timeout,
    Failed,
    Voicemail,
    Spam,
    Invalid,
    Unavailable,
    Disconnected,
    Rejected,
}

/// How a dialer should react to a terminal call outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDisposition {
    /// The call succeeded; no retry needed.
    Success,
    /// The call failed in a way that may succeed on a later attempt.
    Retryable,
    /// The call failed in a way retrying cannot fix.
    NonRetryable,
}

impl CallOutcome {
    /// Classify this outcome per the retry-policy table (§4.7).
    pub fn disposition(self) -> RetryDisposition {
        match self {
            CallOutcome::Answered | CallOutcome::GoalAchieved => RetryDisposition::Success,
            CallOutcome::Busy
            | CallOutcome::NoAnswer
            | CallOutcome::Timeout
            | CallOutcome::Failed
            | CallOutcome::Voicemail => RetryDisposition::Retryable,
            CallOutcome::Spam
            | CallOutcome::Invalid
            | CallOutcome::Unavailable
            | CallOutcome::Disconnected
            | CallOutcome::Rejected => RetryDisposition::NonRetryable,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Conversation / call session state machine
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    Greeting,
    Listening,
    Processing,
    Speaking,
    BargeIn,
    Ending,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptTurn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub confidence: Option<f32>,
}

/// A live call session. Owns its transcript and recording exclusively;
/// the session manager holds only a lookup-only reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallSessionInfo {
    pub call_id: String,
    pub tenant_id: String,
    pub campaign_id: String,
    pub lead_id: String,
    pub state: ConversationState,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub turn_count: usize,
    pub barge_in_count: usize,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Recording buffer
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub call_id: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub bit_depth: u16,
}

impl Default for RecordingMetadata {
    fn default() -> Self {
        Self {
            call_id: String::new(),
            sample_rate: 16_000,
            channels: 1,
            bit_depth: 16,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Action plans
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The closed allowlist of action-plan step types. Any other type string
/// is rejected at plan-creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    BookMeeting,
    UpdateMeeting,
    CancelMeeting,
    CheckAvailability,
    SendEmail,
    SendSms,
    ScheduleReminder,
    InitiateCall,
    StartCampaign,
}

impl ActionType {
    pub const ALL: &'static [ActionType] = &[
        ActionType::BookMeeting,
        ActionType::UpdateMeeting,
        ActionType::CancelMeeting,
        ActionType::CheckAvailability,
        ActionType::SendEmail,
        ActionType::SendSms,
        ActionType::ScheduleReminder,
        ActionType::InitiateCall,
        ActionType::StartCampaign,
    ];

    /// Parse a raw type string against the allowlist. Unknown strings are
    /// rejected rather than silently coerced.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == raw)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActionType::BookMeeting => "book_meeting",
            ActionType::UpdateMeeting => "update_meeting",
            ActionType::CancelMeeting => "cancel_meeting",
            ActionType::CheckAvailability => "check_availability",
            ActionType::SendEmail => "send_email",
            ActionType::SendSms => "send_sms",
            ActionType::ScheduleReminder => "schedule_reminder",
            ActionType::InitiateCall => "initiate_call",
            ActionType::StartCampaign => "start_campaign",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepCondition {
    Always,
    IfPreviousSuccess,
    IfPreviousFailed,
}

impl Default for StepCondition {
    fn default() -> Self {
        StepCondition::Always
    }
}

/// One step of an [`ActionPlan`], as submitted by the caller (not yet
/// validated against the allowlist).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionStep {
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(default)]
    pub params: serde_json::Value,
    #[serde(default)]
    pub condition: StepCondition,
    #[serde(default, rename = "use_result_from")]
    pub use_result_from: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionPlanStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    Success { result: serde_json::Value },
    Failure { error: String },
    Skipped,
}

impl StepOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, StepOutcome::Success { .. })
    }
    pub fn is_failure(&self) -> bool {
        matches!(self, StepOutcome::Failure { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step_index: usize,
    pub outcome: StepOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionPlan {
    pub plan_id: String,
    pub tenant_id: String,
    pub conversation_id: Option<String>,
    pub user_id: Option<String>,
    pub intent: String,
    pub context: serde_json::Value,
    pub steps: Vec<ActionStep>,
    pub status: ActionPlanStatus,
    pub current_step: usize,
    pub step_results: Vec<StepResult>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_boundary() {
        let mut job = DialerJob::new("c", "l", "t", "+15550001111", 8, Utc::now());
        assert!(job.is_high_priority());
        job.priority = 7;
        assert!(!job.is_high_priority());
    }

    #[test]
    fn outcome_disposition_table() {
        assert_eq!(CallOutcome::Answered.disposition(), RetryDisposition::Success);
        assert_eq!(CallOutcome::GoalAchieved.disposition(), RetryDisposition::Success);
        assert_eq!(CallOutcome::Busy.disposition(), RetryDisposition::Retryable);
        assert_eq!(CallOutcome::NoAnswer.disposition(), RetryDisposition::Retryable);
        assert_eq!(CallOutcome::Timeout.disposition(), RetryDisposition::Retryable);
        assert_eq!(CallOutcome::Failed.disposition(), RetryDisposition::Retryable);
        assert_eq!(CallOutcome::Voicemail.disposition(), RetryDisposition::Retryable);
        assert_eq!(CallOutcome::Spam.disposition(), RetryDisposition::NonRetryable);
        assert_eq!(CallOutcome::Invalid.disposition(), RetryDisposition::NonRetryable);
        assert_eq!(CallOutcome::Unavailable.disposition(), RetryDisposition::NonRetryable);
        assert_eq!(CallOutcome::Disconnected.disposition(), RetryDisposition::NonRetryable);
        assert_eq!(CallOutcome::Rejected.disposition(), RetryDisposition::NonRetryable);
    }

    #[test]
    fn action_type_allowlist_rejects_unknown() {
        assert!(ActionType::parse("book_meeting").is_some());
        assert!(ActionType::parse("delete_database").is_none());
    }

    #[test]
    fn job_round_trip_serialization() {
        let job = DialerJob::new("camp", "lead", "tenant", "+15551234567", 9, Utc::now());
        let encoded = serde_json::to_string(&job).unwrap();
        let decoded: DialerJob = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.job_id, job.job_id);
        assert_eq!(decoded.priority, job.priority);
        assert_eq!(decoded.tenant_id, job.tenant_id);
        assert_eq!(decoded.status, job.status);
    }
}
