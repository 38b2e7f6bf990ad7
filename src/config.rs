//! Top-level configuration composing each component's config struct.
//! Credentials live in environment variables, never in the TOML file (§6).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use vc_domain::config::{
    ActionsConfig, DialerConfig, PersistenceConfig, PipelineConfig, ProvidersConfig, QueueConfig,
    ServerConfig, SessionConfig,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Gates the dev-only in-memory fallbacks named in §4.5/§6 (queue
    /// backend, persistence client). Also settable via `VOCALIS_ENV=production`.
    #[serde(default)]
    pub production: bool,

    /// Base URL this process is reachable at, used to build the telephony
    /// webhook URL passed to `TelephonyCaller::place_call`.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    /// Directory call recordings are flushed to on call end.
    #[serde(default = "default_recordings_dir")]
    pub recordings_dir: PathBuf,

    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub dialer: DialerConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub actions: ActionsConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            production: false,
            public_base_url: default_public_base_url(),
            recordings_dir: default_recordings_dir(),
            queue: QueueConfig::default(),
            dialer: DialerConfig::default(),
            pipeline: PipelineConfig::default(),
            session: SessionConfig::default(),
            actions: ActionsConfig::default(),
            server: ServerConfig::default(),
            providers: ProvidersConfig::default(),
            persistence: PersistenceConfig::default(),
        }
    }
}

fn default_public_base_url() -> String {
    "http://localhost:8080".into()
}

fn default_recordings_dir() -> PathBuf {
    PathBuf::from("./data/recordings")
}

impl Config {
    /// Load configuration from a TOML file, falling back to defaults for missing keys.
    pub fn load(path: &str) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load from file if it exists, otherwise return defaults.
    pub fn load_or_default(path: &str) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Whether production mode is active, honoring both the config flag and
    /// the `VOCALIS_ENV` environment variable.
    pub fn is_production(&self) -> bool {
        self.production || std::env::var("VOCALIS_ENV").map(|v| v == "production").unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_dev_mode_with_no_providers() {
        let config = Config::default();
        assert!(!config.is_production());
        assert!(config.persistence.base_url.is_empty());
        assert!(config.queue.redis_url.is_none());
    }

    #[test]
    fn load_falls_back_to_defaults_for_a_missing_file() {
        let config = Config::load_or_default("/nonexistent/path/config.toml");
        assert_eq!(config.server.port, 8080);
    }
}
