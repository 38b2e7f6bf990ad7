pub mod api;
pub mod config;
pub mod dialer_supervisor;
pub mod error;

use std::sync::Arc;

use vc_actions::ActionPlanExecutor;
use vc_dialer::PendingCallRegistry;
use vc_persistence::PersistenceClient;
use vc_providers::ProviderRegistry;
use vc_queue::QueueService;
use vc_sessions::call_store::CallSessionStore;

use dialer_supervisor::DialerSupervisor;

/// Shared application state passed to all API handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Config>,
    pub queue: Arc<QueueService>,
    pub providers: Arc<ProviderRegistry>,
    pub sessions: Arc<CallSessionStore>,
    pub persistence: Arc<dyn PersistenceClient>,
    pub actions: Arc<ActionPlanExecutor>,
    pub pending_calls: Arc<PendingCallRegistry>,
    /// `None` when the STT/LLM/TTS/telephony provider set wasn't fully
    /// configured at startup; the control surface reports that as
    /// `ConfigMissing` rather than panicking.
    pub dialer: Option<Arc<DialerSupervisor>>,
}
