//! In-memory [`PersistenceClient`] for tests and dry-run deployments.

use async_trait::async_trait;
use parking_lot::Mutex;

use vc_domain::error::Result;

use crate::provider::PersistenceClient;
use crate::types::{ActionPlanRow, CallRow, DialerJobRow, RecordingRow, TranscriptRow};

#[derive(Default)]
struct State {
    dialer_jobs: Vec<DialerJobRow>,
    calls: Vec<CallRow>,
    transcripts: Vec<TranscriptRow>,
    recordings: Vec<RecordingRow>,
    action_plans: Vec<ActionPlanRow>,
}

#[derive(Default)]
pub struct MockPersistenceClient {
    state: Mutex<State>,
}

impl MockPersistenceClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dialer_jobs(&self) -> Vec<DialerJobRow> {
        self.state.lock().dialer_jobs.clone()
    }
    pub fn calls(&self) -> Vec<CallRow> {
        self.state.lock().calls.clone()
    }
    pub fn transcripts(&self) -> Vec<TranscriptRow> {
        self.state.lock().transcripts.clone()
    }
    pub fn recordings(&self) -> Vec<RecordingRow> {
        self.state.lock().recordings.clone()
    }
    pub fn action_plans(&self) -> Vec<ActionPlanRow> {
        self.state.lock().action_plans.clone()
    }
}

#[async_trait]
impl PersistenceClient for MockPersistenceClient {
    async fn upsert_dialer_job(&self, row: DialerJobRow) -> Result<()> {
        let mut state = self.state.lock();
        match state.dialer_jobs.iter_mut().find(|r| r.id == row.id) {
            Some(existing) => *existing = row,
            None => state.dialer_jobs.push(row),
        }
        Ok(())
    }

    async fn upsert_call(&self, row: CallRow) -> Result<()> {
        let mut state = self.state.lock();
        match state.calls.iter_mut().find(|r| r.id == row.id) {
            Some(existing) => *existing = row,
            None => state.calls.push(row),
        }
        Ok(())
    }

    async fn upsert_transcript(&self, row: TranscriptRow) -> Result<()> {
        let mut state = self.state.lock();
        match state.transcripts.iter_mut().find(|r| r.call_id == row.call_id) {
            Some(existing) => *existing = row,
            None => state.transcripts.push(row),
        }
        Ok(())
    }

    async fn upsert_recording(&self, row: RecordingRow) -> Result<()> {
        let mut state = self.state.lock();
        match state.recordings.iter_mut().find(|r| r.call_id == row.call_id) {
            Some(existing) => *existing = row,
            None => state.recordings.push(row),
        }
        Ok(())
    }

    async fn upsert_action_plan(&self, row: ActionPlanRow) -> Result<()> {
        let mut state = self.state.lock();
        match state.action_plans.iter_mut().find(|r| r.plan_id == row.plan_id) {
            Some(existing) => *existing = row,
            None => state.action_plans.push(row),
        }
        Ok(())
    }

    async fn health(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use vc_domain::types::JobStatus;

    fn job(id: &str) -> DialerJobRow {
        DialerJobRow {
            id: id.into(),
            campaign_id: "camp-1".into(),
            lead_id: "lead-1".into(),
            tenant_id: "tenant-1".into(),
            phone_number: "+15555550100".into(),
            priority: 5,
            status: JobStatus::Pending,
            attempt_number: 1,
            scheduled_at: Utc::now(),
            last_outcome: None,
            last_error: None,
            call_id: None,
        }
    }

    #[tokio::test]
    async fn upsert_replaces_the_row_with_matching_id() {
        let client = MockPersistenceClient::new();
        client.upsert_dialer_job(job("job-1")).await.unwrap();
        let mut updated = job("job-1");
        updated.attempt_number = 2;
        client.upsert_dialer_job(updated).await.unwrap();
        let rows = client.dialer_jobs();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].attempt_number, 2);
    }
}
