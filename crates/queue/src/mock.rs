//! In-memory [`QueueBackend`] fake. Used by `vc-queue`'s own integration
//! tests and, per §10.3's dev-mode fallback, by a non-production run with no
//! Redis configured.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use parking_lot::Mutex;

use vc_domain::error::Result;
use vc_domain::types::DialerJob;

use crate::backend::QueueBackend;

#[derive(Default)]
struct State {
    priority: VecDeque<DialerJob>,
    tenant: HashMap<String, VecDeque<DialerJob>>,
    scheduled: BTreeMap<i64, Vec<DialerJob>>,
    processing: HashSet<String>,
    stats: HashMap<String, i64>,
}

#[derive(Default)]
pub struct MockQueueBackend {
    state: Mutex<State>,
}

impl MockQueueBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl QueueBackend for MockQueueBackend {
    async fn push_priority(&self, job: &DialerJob) -> Result<()> {
        self.state.lock().priority.push_front(job.clone());
        Ok(())
    }

    async fn push_tenant(&self, tenant_id: &str, job: &DialerJob) -> Result<()> {
        self.state.lock().tenant.entry(tenant_id.to_string()).or_default().push_back(job.clone());
        Ok(())
    }

    async fn pop_priority(&self) -> Result<Option<DialerJob>> {
        let mut state = self.state.lock();
        let job = state.priority.pop_front();
        if let Some(job) = &job {
            state.processing.insert(job.job_id.clone());
        }
        Ok(job)
    }

    async fn pop_tenant(&self, tenant_id: &str) -> Result<Option<DialerJob>> {
        let mut state = self.state.lock();
        let job = state.tenant.get_mut(tenant_id).and_then(|q| q.pop_front());
        if let Some(job) = &job {
            state.processing.insert(job.job_id.clone());
        }
        Ok(job)
    }

    async fn unmark_processing(&self, job_id: &str) -> Result<()> {
        self.state.lock().processing.remove(job_id);
        Ok(())
    }

    async fn schedule_retry(&self, job: &DialerJob, execute_at_unix: i64) -> Result<()> {
        self.state.lock().scheduled.entry(execute_at_unix).or_default().push(job.clone());
        Ok(())
    }

    async fn promote_scheduled(&self, now_unix: i64) -> Result<Vec<DialerJob>> {
        let mut state = self.state.lock();
        let due_keys: Vec<i64> = state.scheduled.range(..=now_unix).map(|(k, _)| *k).collect();
        let mut due = Vec::new();
        for key in due_keys {
            if let Some(jobs) = state.scheduled.remove(&key) {
                due.extend(jobs);
            }
        }
        Ok(due)
    }

    async fn incr_stat(&self, field: &str) -> Result<()> {
        *self.state.lock().stats.entry(field.to_string()).or_insert(0) += 1;
        Ok(())
    }

    async fn stats(&self) -> Result<HashMap<String, i64>> {
        Ok(self.state.lock().stats.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn job(tenant: &str, priority: u8) -> DialerJob {
        DialerJob::new("camp", "lead", tenant, "+15550001111", priority, Utc::now())
    }

    #[tokio::test]
    async fn priority_queue_is_lifo() {
        let backend = MockQueueBackend::new();
        let a = job("t1", 9);
        let b = job("t1", 9);
        backend.push_priority(&a).await.unwrap();
        backend.push_priority(&b).await.unwrap();
        assert_eq!(backend.pop_priority().await.unwrap().unwrap().job_id, b.job_id);
        assert_eq!(backend.pop_priority().await.unwrap().unwrap().job_id, a.job_id);
    }

    #[tokio::test]
    async fn tenant_queue_is_fifo() {
        let backend = MockQueueBackend::new();
        let a = job("t1", 3);
        let b = job("t1", 3);
        backend.push_tenant("t1", &a).await.unwrap();
        backend.push_tenant("t1", &b).await.unwrap();
        assert_eq!(backend.pop_tenant("t1").await.unwrap().unwrap().job_id, a.job_id);
        assert_eq!(backend.pop_tenant("t1").await.unwrap().unwrap().job_id, b.job_id);
    }

    #[tokio::test]
    async fn pop_marks_processing() {
        let backend = MockQueueBackend::new();
        let a = job("t1", 9);
        backend.push_priority(&a).await.unwrap();
        backend.pop_priority().await.unwrap();
        assert!(backend.state.lock().processing.contains(&a.job_id));
        backend.unmark_processing(&a.job_id).await.unwrap();
        assert!(!backend.state.lock().processing.contains(&a.job_id));
    }

    #[tokio::test]
    async fn promote_scheduled_removes_only_due_entries() {
        let backend = MockQueueBackend::new();
        let early = job("t1", 3);
        let late = job("t1", 3);
        backend.schedule_retry(&early, 100).await.unwrap();
        backend.schedule_retry(&late, 500).await.unwrap();
        let due = backend.promote_scheduled(200).await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].job_id, early.job_id);
    }
}
