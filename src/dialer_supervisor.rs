//! Toggles the dialer worker pool and queue-promotion loop on and off via
//! the control surface, without tearing down the rest of the process.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use vc_dialer::DialerWorker;
use vc_queue::QueueService;

pub struct DialerSupervisor {
    worker: Arc<DialerWorker>,
    worker_count: usize,
    queue: Arc<QueueService>,
    promote_interval_ms: u64,
    handles: Mutex<Option<Vec<JoinHandle<()>>>>,
}

impl DialerSupervisor {
    pub fn new(worker: Arc<DialerWorker>, worker_count: usize, queue: Arc<QueueService>, promote_interval_ms: u64) -> Self {
        Self { worker, worker_count, queue, promote_interval_ms, handles: Mutex::new(None) }
    }

    /// Spawns the worker pool and the promotion loop. Returns `false` if
    /// already running.
    pub fn start(&self) -> bool {
        let mut handles = self.handles.lock();
        if handles.is_some() {
            return false;
        }
        let mut spawned = Vec::with_capacity(self.worker_count + 1);
        for _ in 0..self.worker_count {
            spawned.push(tokio::spawn(Arc::clone(&self.worker).run()));
        }
        spawned.push(tokio::spawn(Arc::clone(&self.queue).run_promotion_loop(self.promote_interval_ms)));
        tracing::info!(worker_count = self.worker_count, "dialer started");
        *handles = Some(spawned);
        true
    }

    /// Aborts the worker pool and promotion loop. Returns `false` if
    /// already stopped.
    pub fn stop(&self) -> bool {
        let mut handles = self.handles.lock();
        match handles.take() {
            Some(hs) => {
                for h in hs {
                    h.abort();
                }
                tracing::info!("dialer stopped");
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handles.lock().is_some()
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::PathBuf;

    use vc_domain::audio::{AudioChunk, BoxStream, TranscriptEvent};
    use vc_domain::capability::LlmCapabilities;
    use vc_domain::config::{DialerConfig, PipelineConfig};
    use vc_domain::error::Result;
    use vc_domain::llm::{ChatRequest, ChatResponse, LlmStreamEvent};
    use vc_dialer::PendingCallRegistry;
    use vc_providers::{LlmProvider, SttProvider, TelephonyCaller, TtsProvider};
    use vc_queue::{MockQueueBackend, QueueService};
    use vc_sessions::call_store::CallSessionStore;
    use vc_sessions::transcript::TranscriptWriter;

    struct StubStt;
    #[async_trait::async_trait]
    impl SttProvider for StubStt {
        async fn start_stream(&self) -> Result<(tokio::sync::mpsc::Sender<AudioChunk>, BoxStream<'static, TranscriptEvent>)> {
            let (tx, _rx) = tokio::sync::mpsc::channel(1);
            Ok((tx, Box::pin(futures_util::stream::empty())))
        }
        fn provider_id(&self) -> &str {
            "stub_stt"
        }
    }

    struct StubLlm(LlmCapabilities);
    #[async_trait::async_trait]
    impl LlmProvider for StubLlm {
        async fn chat(&self, _req: ChatRequest) -> Result<ChatResponse> {
            Ok(ChatResponse { content: String::new(), tool_calls: vec![], usage: None, model: "stub".into(), finish_reason: None })
        }
        async fn chat_stream(&self, _req: ChatRequest) -> Result<BoxStream<'static, Result<LlmStreamEvent>>> {
            Ok(Box::pin(futures_util::stream::empty()))
        }
        fn capabilities(&self) -> &LlmCapabilities {
            &self.0
        }
        fn provider_id(&self) -> &str {
            "stub_llm"
        }
    }

    struct StubTts;
    #[async_trait::async_trait]
    impl TtsProvider for StubTts {
        async fn synthesize(&self, _text: &str) -> Result<BoxStream<'static, Result<AudioChunk>>> {
            Ok(Box::pin(futures_util::stream::empty()))
        }
        fn provider_id(&self) -> &str {
            "stub_tts"
        }
    }

    struct StubTelephony;
    #[async_trait::async_trait]
    impl TelephonyCaller for StubTelephony {
        async fn place_call(&self, _to_number: &str, _webhook_url: &str) -> Result<String> {
            Ok("stub-call".into())
        }
        async fn hang_up(&self, _provider_call_id: &str) -> Result<()> {
            Ok(())
        }
        fn provider_id(&self) -> &str {
            "stub_telephony"
        }
    }

    fn test_worker() -> Arc<DialerWorker> {
        Arc::new(DialerWorker {
            queue: Arc::new(QueueService::new(Arc::new(MockQueueBackend::new()))),
            telephony: Arc::new(StubTelephony),
            stt: Arc::new(StubStt),
            llm: Arc::new(StubLlm(LlmCapabilities::default())),
            tts: Arc::new(StubTts),
            sessions: Arc::new(CallSessionStore::new()),
            transcripts: Arc::new(TranscriptWriter::new(&PathBuf::from(std::env::temp_dir()))),
            pending_calls: Arc::new(PendingCallRegistry::new()),
            persistence: Arc::new(vc_persistence::MockPersistenceClient::new()),
            dialer_config: DialerConfig::default(),
            pipeline_config: PipelineConfig::default(),
            recordings_dir: std::env::temp_dir(),
            webhook_base_url: "http://localhost:8080".into(),
        })
    }

    #[tokio::test]
    async fn start_then_start_again_reports_already_running() {
        let worker = test_worker();
        let queue = worker.queue.clone();
        let supervisor = DialerSupervisor::new(worker, 1, queue, 60_000);
        assert!(supervisor.start());
        assert!(!supervisor.start());
        assert!(supervisor.is_running());
        assert!(supervisor.stop());
    }

    #[tokio::test]
    async fn stop_without_starting_reports_nothing_to_stop() {
        let worker = test_worker();
        let queue = worker.queue.clone();
        let supervisor = DialerSupervisor::new(worker, 1, queue, 60_000);
        assert!(!supervisor.stop());
        assert!(!supervisor.is_running());
    }
}
