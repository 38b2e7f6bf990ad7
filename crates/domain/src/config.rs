//! Per-component configuration structs, composed into the root binary's
//! top-level `Config` (mirrors the teacher's layered `ServerConfig` /
//! `WorkspaceConfig` style).

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Queue
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Redis connection URL. Required in production; a dev-only in-memory
    /// fallback is used when absent and `production` is false.
    #[serde(default)]
    pub redis_url: Option<String>,
    #[serde(default = "default_promote_interval_ms")]
    pub promote_interval_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self { redis_url: None, promote_interval_ms: default_promote_interval_ms() }
    }
}

fn default_promote_interval_ms() -> u64 {
    1_000
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Dialer / retry
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: i64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retry_delay_secs: default_retry_delay_secs(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_retry_delay_secs() -> i64 {
    crate::types::DEFAULT_RETRY_DELAY_SECS
}
fn default_max_attempts() -> u32 {
    crate::types::MAX_ATTEMPTS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialerConfig {
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    #[serde(default = "default_max_call_duration_secs")]
    pub max_call_duration_secs: u64,
    /// Tenant IDs the worker rotates through for fairness when dequeuing.
    #[serde(default)]
    pub tenant_rotation: Vec<String>,
}

impl Default for DialerConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            worker_count: default_worker_count(),
            max_call_duration_secs: default_max_call_duration_secs(),
            tenant_rotation: Vec::new(),
        }
    }
}

fn default_worker_count() -> usize {
    4
}
fn default_max_call_duration_secs() -> u64 {
    900
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Voice pipeline
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_inbound_poll_ms")]
    pub inbound_poll_ms: u64,
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_inbound_queue_capacity")]
    pub inbound_queue_capacity: usize,
    #[serde(default = "default_outbound_queue_capacity")]
    pub outbound_queue_capacity: usize,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            inbound_poll_ms: default_inbound_poll_ms(),
            idle_timeout_secs: default_idle_timeout_secs(),
            inbound_queue_capacity: default_inbound_queue_capacity(),
            outbound_queue_capacity: default_outbound_queue_capacity(),
            system_prompt: default_system_prompt(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_inbound_poll_ms() -> u64 {
    20
}
fn default_idle_timeout_secs() -> u64 {
    30
}
fn default_inbound_queue_capacity() -> usize {
    64
}
fn default_outbound_queue_capacity() -> usize {
    64
}
fn default_system_prompt() -> String {
    "You are a helpful outbound calling assistant. Keep responses brief.".into()
}
fn default_temperature() -> f32 {
    0.4
}
fn default_max_tokens() -> u32 {
    300
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session manager
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Shared key-value store URL (production-required; see `production`).
    #[serde(default)]
    pub shared_store_url: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { shared_store_url: None }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Action plan executor
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ActionsConfig {
    #[serde(default)]
    pub dry_run: bool,
    /// Webhook URL per action type (e.g. `"book_meeting"` ->
    /// `https://.../calendar/book`). An action type with no entry has no
    /// tool registered and fails any step that reaches it.
    #[serde(default)]
    pub webhooks: std::collections::HashMap<String, String>,
    /// Bearer token attached to every webhook call, shared across action
    /// types since they front the same integration layer.
    #[serde(default)]
    pub auth: AuthConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Server (control surface)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: default_port(), host: default_host() }
    }
}

fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "0.0.0.0".into()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Persistence (consumed-only external store, §6)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    pub base_url: String,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default = "default_persistence_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_persistence_max_retries")]
    pub max_retries: u32,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            auth: AuthConfig::default(),
            timeout_ms: default_persistence_timeout_ms(),
            max_retries: default_persistence_max_retries(),
        }
    }
}

fn default_persistence_timeout_ms() -> u64 {
    5_000
}
fn default_persistence_max_retries() -> u32 {
    2
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Provider credentials
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Plaintext key — discouraged outside local dev.
    #[serde(default)]
    pub key: Option<String>,
    /// Environment variable name to read the key from.
    #[serde(default)]
    pub env: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEntry {
    /// Factory name, e.g. `"openai_compat"`, `"elevenlabs"`, `"deepgram"`.
    pub kind: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    pub stt: Option<ProviderEntry>,
    pub llm: Option<ProviderEntry>,
    pub tts: Option<ProviderEntry>,
    pub telephony: Option<ProviderEntry>,
}
