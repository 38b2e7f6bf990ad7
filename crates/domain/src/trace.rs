use serde::Serialize;

/// Structured trace events emitted across all Vocalis crates.
///
/// Each event is logged as a JSON blob under the `trace_event` field so
/// downstream log processors can parse it without touching the free-text
/// message.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    JobEnqueued {
        job_id: String,
        tenant_id: String,
        priority: u8,
        attempt_number: u32,
    },
    JobDequeued {
        job_id: String,
        tenant_id: String,
        from_priority_queue: bool,
    },
    JobRetryScheduled {
        job_id: String,
        tenant_id: String,
        attempt_number: u32,
        execute_at_unix: i64,
        outcome: String,
    },
    JobTerminal {
        job_id: String,
        tenant_id: String,
        status: String,
        outcome: Option<String>,
    },
    QueuePromotion {
        promoted: usize,
    },
    CallStarted {
        call_id: String,
        tenant_id: String,
        campaign_id: String,
    },
    CallStateTransition {
        call_id: String,
        from: String,
        to: String,
    },
    BargeIn {
        call_id: String,
        chunks_dropped: usize,
    },
    InboundAudioDropped {
        call_id: String,
        dropped_total: u64,
    },
    TurnCompleted {
        call_id: String,
        turn_index: usize,
    },
    CallEnded {
        call_id: String,
        outcome: String,
        duration_ms: u64,
    },
    ProviderFallback {
        kind: String,
        from_provider: String,
        reason: String,
    },
    ActionPlanStarted {
        plan_id: String,
        tenant_id: String,
        step_count: usize,
    },
    ActionStepExecuted {
        plan_id: String,
        step_index: usize,
        action_type: String,
        ok: bool,
    },
    ActionPlanCompleted {
        plan_id: String,
        status: String,
    },
    PersistenceCall {
        endpoint: String,
        status: u16,
        duration_ms: u64,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "vc_event");
    }
}
