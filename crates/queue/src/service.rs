//! Enqueue/dequeue policy and scheduled-retry promotion (§4.6), layered
//! over a [`QueueBackend`] so the policy is backend-agnostic.

use std::sync::Arc;
use std::time::Duration;

use vc_domain::error::Result;
use vc_domain::trace::TraceEvent;
use vc_domain::types::{DialerJob, JobStatus, PRIORITY_THRESHOLD};

use crate::backend::QueueBackend;

pub struct QueueService {
    backend: Arc<dyn QueueBackend>,
}

impl QueueService {
    pub fn new(backend: Arc<dyn QueueBackend>) -> Self {
        Self { backend }
    }

    /// Priority >= [`PRIORITY_THRESHOLD`] routes to the priority queue
    /// (LIFO); everything else appends to its tenant's FIFO queue.
    pub async fn enqueue(&self, job: &DialerJob) -> Result<()> {
        if job.priority >= PRIORITY_THRESHOLD {
            self.backend.push_priority(job).await?;
        } else {
            self.backend.push_tenant(&job.tenant_id, job).await?;
        }
        self.backend.incr_stat("enqueued").await?;
        TraceEvent::JobEnqueued {
            job_id: job.job_id.clone(),
            tenant_id: job.tenant_id.clone(),
            priority: job.priority,
            attempt_number: job.attempt_number,
        }
        .emit();
        Ok(())
    }

    /// Pop the priority queue first; otherwise try each tenant in
    /// `tenant_ids` in order. Callers are responsible for rotating that
    /// list themselves for round-robin fairness across tenants (§4.6).
    pub async fn dequeue(&self, tenant_ids: &[String]) -> Result<Option<DialerJob>> {
        if let Some(job) = self.backend.pop_priority().await? {
            self.backend.incr_stat("dequeued").await?;
            TraceEvent::JobDequeued { job_id: job.job_id.clone(), tenant_id: job.tenant_id.clone(), from_priority_queue: true }.emit();
            return Ok(Some(job));
        }
        for tenant_id in tenant_ids {
            if let Some(job) = self.backend.pop_tenant(tenant_id).await? {
                self.backend.incr_stat("dequeued").await?;
                TraceEvent::JobDequeued { job_id: job.job_id.clone(), tenant_id: job.tenant_id.clone(), from_priority_queue: false }.emit();
                return Ok(Some(job));
            }
        }
        Ok(None)
    }

    /// Schedule `job` for retry `delay_secs` from now and drop its
    /// processing-set membership.
    pub async fn schedule_retry(&self, job: &DialerJob, now_unix: i64, delay_secs: i64) -> Result<()> {
        let execute_at = now_unix + delay_secs;
        self.backend.schedule_retry(job, execute_at).await?;
        self.backend.unmark_processing(&job.job_id).await?;
        self.backend.incr_stat("retry_scheduled").await?;
        TraceEvent::JobRetryScheduled {
            job_id: job.job_id.clone(),
            tenant_id: job.tenant_id.clone(),
            attempt_number: job.attempt_number,
            execute_at_unix: execute_at,
            outcome: job.last_outcome.map(|o| format!("{o:?}")).unwrap_or_default(),
        }
        .emit();
        Ok(())
    }

    /// Record a job as terminal (`Completed`, `Failed`, or `NonRetryable`)
    /// and drop its processing-set membership.
    pub async fn mark_terminal(&self, job: &DialerJob, status: JobStatus) -> Result<()> {
        self.backend.unmark_processing(&job.job_id).await?;
        self.backend.incr_stat("terminal").await?;
        TraceEvent::JobTerminal {
            job_id: job.job_id.clone(),
            tenant_id: job.tenant_id.clone(),
            status: format!("{status:?}"),
            outcome: job.last_outcome.map(|o| format!("{o:?}")),
        }
        .emit();
        Ok(())
    }

    pub async fn stats(&self) -> Result<std::collections::HashMap<String, i64>> {
        self.backend.stats().await
    }

    /// Move every due entry out of the scheduled sorted set and back onto
    /// its priority/tenant queue, with `status` reset to `pending` (§4.6).
    pub async fn promote_due(&self, now_unix: i64) -> Result<usize> {
        let due = self.backend.promote_scheduled(now_unix).await?;
        let promoted = due.len();
        for mut job in due {
            job.status = JobStatus::Pending;
            self.enqueue(&job).await?;
        }
        if promoted > 0 {
            TraceEvent::QueuePromotion { promoted }.emit();
        }
        Ok(promoted)
    }

    /// Run [`Self::promote_due`] on a fixed interval until the process
    /// shuts down. Intended to be spawned once per process.
    pub async fn run_promotion_loop(self: Arc<Self>, interval_ms: u64) {
        let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
        loop {
            ticker.tick().await;
            let now = chrono::Utc::now().timestamp();
            if let Err(e) = self.promote_due(now).await {
                tracing::warn!(error = %e, "scheduled-retry promotion pass failed");
            }
        }
    }
}
