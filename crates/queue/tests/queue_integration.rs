use std::sync::Arc;

use chrono::Utc;

use vc_domain::types::{DialerJob, JobStatus, PRIORITY_THRESHOLD};
use vc_queue::{MockQueueBackend, QueueService};

fn job(tenant: &str, priority: u8) -> DialerJob {
    DialerJob::new("camp", "lead", tenant, "+15550001111", priority, Utc::now())
}

#[tokio::test]
async fn high_priority_job_dequeues_before_tenant_jobs() {
    let service = QueueService::new(Arc::new(MockQueueBackend::new()));
    let normal = job("t1", 3);
    let urgent = job("t1", PRIORITY_THRESHOLD);
    service.enqueue(&normal).await.unwrap();
    service.enqueue(&urgent).await.unwrap();

    let first = service.dequeue(&["t1".to_string()]).await.unwrap().unwrap();
    assert_eq!(first.job_id, urgent.job_id);

    let second = service.dequeue(&["t1".to_string()]).await.unwrap().unwrap();
    assert_eq!(second.job_id, normal.job_id);
}

#[tokio::test]
async fn dequeue_tries_tenants_in_caller_supplied_order() {
    let service = QueueService::new(Arc::new(MockQueueBackend::new()));
    let j = job("t2", 3);
    service.enqueue(&j).await.unwrap();

    let result = service.dequeue(&["t1".to_string(), "t2".to_string()]).await.unwrap();
    assert_eq!(result.unwrap().job_id, j.job_id);
}

#[tokio::test]
async fn retry_on_busy_then_promotion_returns_job_to_its_tenant_queue() {
    let service = QueueService::new(Arc::new(MockQueueBackend::new()));
    let mut j = job("t1", 5);
    j.attempt_number = 1;

    let now = Utc::now().timestamp();
    service.schedule_retry(&j, now, 7200).await.unwrap();

    // Not yet due.
    assert_eq!(service.promote_due(now + 100).await.unwrap(), 0);

    // Due once the clock passes the scheduled score.
    let promoted = service.promote_due(now + 7200).await.unwrap();
    assert_eq!(promoted, 1);

    let requeued = service.dequeue(&["t1".to_string()]).await.unwrap().unwrap();
    assert_eq!(requeued.job_id, j.job_id);
    assert_eq!(requeued.status, JobStatus::Pending);
}

#[tokio::test]
async fn mark_terminal_clears_processing_without_requeue() {
    let service = QueueService::new(Arc::new(MockQueueBackend::new()));
    let j = job("t1", 9);
    service.enqueue(&j).await.unwrap();
    let dequeued = service.dequeue(&["t1".to_string()]).await.unwrap().unwrap();
    service.mark_terminal(&dequeued, JobStatus::Completed).await.unwrap();

    let stats = service.stats().await.unwrap();
    assert_eq!(stats.get("terminal").copied(), Some(1));
}
