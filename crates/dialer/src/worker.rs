//! Dialer Worker loop (§4.8): dequeue, place the call, wait for the media
//! gateway to connect, run the Voice Pipeline, apply the retry policy.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use vc_domain::config::{DialerConfig, PipelineConfig};
use vc_domain::error::Result;
use vc_domain::types::{CallOutcome, DialerJob, JobStatus};
use vc_media::MediaGateway;
use vc_persistence::provider::PersistenceClient;
use vc_persistence::types::{CallRow, DialerJobRow, RecordingRow, TranscriptRow};
use vc_pipeline::VoicePipeline;
use vc_providers::{LlmProvider, SttProvider, TelephonyCaller, TtsProvider};
use vc_queue::QueueService;
use vc_sessions::{call_store::CallSessionStore, recording::RecordingBuffer, transcript::TranscriptWriter};

use crate::pending::PendingCallRegistry;
use crate::retry::{self, RetryAction};

const EMPTY_QUEUE_BACKOFF: Duration = Duration::from_millis(500);
const DEFAULT_GREETING: &str = "Hi, this is an automated call. How can I help you today?";

pub struct DialerWorker {
    pub queue: Arc<QueueService>,
    pub telephony: Arc<dyn TelephonyCaller>,
    pub stt: Arc<dyn SttProvider>,
    pub llm: Arc<dyn LlmProvider>,
    pub tts: Arc<dyn TtsProvider>,
    pub sessions: Arc<CallSessionStore>,
    pub transcripts: Arc<TranscriptWriter>,
    pub pending_calls: Arc<PendingCallRegistry>,
    pub persistence: Arc<dyn PersistenceClient>,
    pub dialer_config: DialerConfig,
    pub pipeline_config: PipelineConfig,
    pub recordings_dir: PathBuf,
    pub webhook_base_url: String,
}

fn dialer_job_row(job: &DialerJob) -> DialerJobRow {
    DialerJobRow {
        id: job.job_id.clone(),
        campaign_id: job.campaign_id.clone(),
        lead_id: job.lead_id.clone(),
        tenant_id: job.tenant_id.clone(),
        phone_number: job.phone_number.clone(),
        priority: job.priority,
        status: job.status,
        attempt_number: job.attempt_number,
        scheduled_at: job.scheduled_at,
        last_outcome: job.last_outcome,
        last_error: job.last_error.clone(),
        call_id: job.call_id.clone(),
    }
}

impl DialerWorker {
    /// Run forever, one job at a time. Intended to be spawned
    /// `DialerConfig.worker_count` times per process.
    pub async fn run(self: Arc<Self>) {
        loop {
            match self.process_one().await {
                Ok(true) => {}
                Ok(false) => tokio::time::sleep(EMPTY_QUEUE_BACKOFF).await,
                Err(e) => {
                    tracing::error!(error = %e, "dialer worker iteration failed");
                    tokio::time::sleep(EMPTY_QUEUE_BACKOFF).await;
                }
            }
        }
    }

    /// Process a single dequeued job. Returns `Ok(false)` when the queue
    /// was empty so the caller can back off.
    async fn process_one(&self) -> Result<bool> {
        let Some(job) = self.queue.dequeue(&self.dialer_config.tenant_rotation).await? else {
            return Ok(false);
        };
        self.persist_job(&job).await;

        let webhook_url = format!("{}/v1/telephony/webhook/{}", self.webhook_base_url, job.job_id);
        let provider_call_id = match self.telephony.place_call(&job.phone_number, &webhook_url).await {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(job_id = %job.job_id, error = %e, "failed to place outbound call");
                self.apply_outcome(job, CallOutcome::Failed).await?;
                return Ok(true);
            }
        };

        let max_duration = Duration::from_secs(self.dialer_config.max_call_duration_secs);
        let receiver = self.pending_calls.register(provider_call_id.clone());
        let gateway: Arc<dyn MediaGateway> = match tokio::time::timeout(max_duration, receiver).await {
            Ok(Ok(gateway)) => gateway,
            _ => {
                self.pending_calls.cancel(&provider_call_id);
                let _ = self.telephony.hang_up(&provider_call_id).await;
                self.apply_outcome(job, CallOutcome::NoAnswer).await?;
                return Ok(true);
            }
        };

        let call_id = uuid::Uuid::new_v4().to_string();
        let pipeline = Arc::new(VoicePipeline {
            call_id: call_id.clone(),
            tenant_id: job.tenant_id.clone(),
            campaign_id: job.campaign_id.clone(),
            lead_id: job.lead_id.clone(),
            config: self.pipeline_config.clone(),
            gateway,
            stt: self.stt.clone(),
            llm: self.llm.clone(),
            tts: self.tts.clone(),
            sessions: self.sessions.clone(),
            transcripts: self.transcripts.clone(),
            recording: Arc::new(RecordingBuffer::new(call_id.clone())),
        });

        let recording = pipeline.recording.clone();
        let started_at = Utc::now();
        let outcome = match tokio::time::timeout(max_duration, pipeline.run(Some(DEFAULT_GREETING.to_string()))).await {
            Ok(outcome) => outcome,
            Err(_) => {
                let _ = self.telephony.hang_up(&provider_call_id).await;
                CallOutcome::Timeout
            }
        };
        let ended_at = Utc::now();

        match recording.flush(&self.recordings_dir) {
            Ok(path) => self.persist_recording(&call_id, &job.tenant_id, &path, &recording).await,
            Err(e) => tracing::warn!(call_id = %call_id, error = %e, "failed to flush call recording"),
        }
        self.persist_transcript(&call_id, &job.tenant_id).await;
        self.persist_call(&call_id, &provider_call_id, &job, started_at, ended_at, outcome).await;

        let mut job = job;
        job.call_id = Some(call_id);
        self.apply_outcome(job, outcome).await?;
        Ok(true)
    }

    async fn persist_job(&self, job: &DialerJob) {
        if let Err(e) = self.persistence.upsert_dialer_job(dialer_job_row(job)).await {
            tracing::warn!(job_id = %job.job_id, error = %e, "failed to persist dialer job");
        }
    }

    async fn persist_call(
        &self,
        call_id: &str,
        provider_call_id: &str,
        job: &DialerJob,
        started_at: chrono::DateTime<Utc>,
        ended_at: chrono::DateTime<Utc>,
        outcome: CallOutcome,
    ) {
        let row = CallRow {
            id: call_id.to_string(),
            external_call_uuid: provider_call_id.to_string(),
            tenant_id: job.tenant_id.clone(),
            campaign_id: job.campaign_id.clone(),
            lead_id: job.lead_id.clone(),
            started_at,
            ended_at: Some(ended_at),
            duration_seconds: Some((ended_at - started_at).num_milliseconds().max(0) as f64 / 1000.0),
            outcome: Some(outcome),
        };
        if let Err(e) = self.persistence.upsert_call(row).await {
            tracing::warn!(call_id = %call_id, error = %e, "failed to persist call");
        }
    }

    async fn persist_recording(&self, call_id: &str, tenant_id: &str, path: &std::path::Path, recording: &RecordingBuffer) {
        let file_size_bytes = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        let duration_seconds = recording.sample_count() as f64 / recording.sample_rate() as f64;
        let row = RecordingRow {
            call_id: call_id.to_string(),
            tenant_id: tenant_id.to_string(),
            storage_path: path.display().to_string(),
            duration_seconds,
            file_size_bytes,
            status: "complete".to_string(),
        };
        if let Err(e) = self.persistence.upsert_recording(row).await {
            tracing::warn!(call_id = %call_id, error = %e, "failed to persist recording");
        }
    }

    async fn persist_transcript(&self, call_id: &str, tenant_id: &str) {
        let turns = match self.transcripts.read(call_id) {
            Ok(turns) => turns,
            Err(e) => {
                tracing::warn!(call_id = %call_id, error = %e, "failed to read transcript for persistence");
                return;
            }
        };
        let full_text = turns.iter().map(|t| t.content.as_str()).collect::<Vec<_>>().join(" ");
        let word_count = full_text.split_whitespace().count();
        let row = TranscriptRow {
            call_id: call_id.to_string(),
            tenant_id: tenant_id.to_string(),
            turn_count: turns.len(),
            turns,
            full_text,
            word_count,
        };
        if let Err(e) = self.persistence.upsert_transcript(row).await {
            tracing::warn!(call_id = %call_id, error = %e, "failed to persist transcript");
        }
    }

    async fn apply_outcome(&self, mut job: DialerJob, outcome: CallOutcome) -> Result<()> {
        job.last_outcome = Some(outcome);
        job.processed_at = Some(Utc::now());

        let next_attempt = job.attempt_number + 1;
        let result = match retry::decide(outcome, next_attempt, self.dialer_config.retry.max_attempts, self.dialer_config.retry.retry_delay_secs) {
            RetryAction::Terminal(status) => {
                job.status = status;
                job.completed_at = Some(Utc::now());
                self.queue.mark_terminal(&job, status).await
            }
            RetryAction::Retry { delay_secs } => {
                job.status = JobStatus::RetryScheduled;
                job.attempt_number = next_attempt;
                self.queue.schedule_retry(&job, Utc::now().timestamp(), delay_secs).await
            }
        };
        self.persist_job(&job).await;
        result
    }
}
