//! The [`QueueBackend`] trait every queue implementation satisfies (§4.6).
//!
//! Kept narrow and Redis-shaped (lists/sorted-set/set/hash primitives)
//! rather than modeling `enqueue`/`dequeue` directly, so the priority and
//! tenant-fairness policy lives once in [`crate::service::QueueService`]
//! instead of being duplicated per backend.

use std::collections::HashMap;

use vc_domain::error::Result;
use vc_domain::types::DialerJob;

#[async_trait::async_trait]
pub trait QueueBackend: Send + Sync {
    /// Push to the head of the priority queue (LIFO among high-priority jobs).
    async fn push_priority(&self, job: &DialerJob) -> Result<()>;

    /// Push to the tail of a tenant's FIFO queue.
    async fn push_tenant(&self, tenant_id: &str, job: &DialerJob) -> Result<()>;

    /// Pop from the head of the priority queue, marking it processing
    /// atomically with the pop.
    async fn pop_priority(&self) -> Result<Option<DialerJob>>;

    /// Pop from the head of a tenant's FIFO queue, marking it processing
    /// atomically with the pop.
    async fn pop_tenant(&self, tenant_id: &str) -> Result<Option<DialerJob>>;

    /// Remove a job from the processing set (call completed, one way or another).
    async fn unmark_processing(&self, job_id: &str) -> Result<()>;

    /// Add a job to the scheduled-retry sorted set, keyed by Unix execute-at.
    async fn schedule_retry(&self, job: &DialerJob, execute_at_unix: i64) -> Result<()>;

    /// Atomically remove and return every scheduled job whose execute-at is
    /// at or before `now_unix`.
    async fn promote_scheduled(&self, now_unix: i64) -> Result<Vec<DialerJob>>;

    async fn incr_stat(&self, field: &str) -> Result<()>;

    async fn stats(&self) -> Result<HashMap<String, i64>>;
}
