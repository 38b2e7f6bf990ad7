//! Append-only audit record for action-plan execution, kept separate from
//! [`vc_domain::trace::TraceEvent`]: trace events are operational telemetry,
//! audit entries are the durable per-tenant business record a deployment is
//! expected to persist (via `vc-persistence`) and never mutate.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vc_domain::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    PlanStarted { step_count: usize },
    StepExecuted { step_index: usize, action_type: String, ok: bool },
    PlanCompleted { status: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub tenant_id: String,
    pub plan_id: String,
    pub event: AuditEvent,
    pub at: DateTime<Utc>,
}

/// Where audit entries go. A deployment wires this to `vc-persistence`; the
/// executor itself only ever appends.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: AuditLogEntry) -> Result<()>;
}

/// Default sink for deployments that haven't wired a persistence backend
/// yet: writes each entry as a structured log line.
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, entry: AuditLogEntry) -> Result<()> {
        let json = serde_json::to_string(&entry)?;
        tracing::info!(audit_entry = %json, "vc_action_audit");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tracing_sink_never_errors() {
        let sink = TracingAuditSink;
        let entry = AuditLogEntry {
            tenant_id: "tenant-1".into(),
            plan_id: "plan-1".into(),
            event: AuditEvent::PlanStarted { step_count: 2 },
            at: Utc::now(),
        };
        assert!(sink.record(entry).await.is_ok());
    }
}
