//! Provider factory.
//!
//! Builds the four adapter kinds a call touches (STT, LLM, TTS, telephony)
//! from configuration, dispatching on each entry's `kind` string. This
//! replaces the role-based, multi-model-per-role routing an assistant-style
//! gateway needs with the flat "one configured adapter per capability"
//! shape an outbound calling pipeline actually uses.

use crate::anthropic::AnthropicLlm;
use crate::openai_compat::OpenAiCompatLlm;
use crate::stt_ws::WebsocketSttAdapter;
use crate::telephony_http::HttpTelephonyAdapter;
use crate::traits::{LlmProvider, SttProvider, TelephonyCaller, TtsProvider};
use crate::tts_http::HttpTtsAdapter;
use std::sync::Arc;
use vc_domain::config::{ProviderEntry, ProvidersConfig};
use vc_domain::error::{Error, Result};

/// Mask substrings that look like API keys or bearer tokens in an error
/// message before it reaches logs or a readiness endpoint.
fn mask_secrets(msg: &str) -> String {
    let mut result = msg.to_string();
    for word in msg.split(|c: char| c.is_whitespace() || c == '\'' || c == '"' || c == ',') {
        let trimmed = word.trim();
        if trimmed.len() >= 20
            && trimmed.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            let masked = if trimmed.len() > 8 {
                format!("{}...{}", &trimmed[..4], &trimmed[trimmed.len() - 4..])
            } else {
                "***masked***".to_string()
            };
            result = result.replace(trimmed, &masked);
        }
    }
    result
}

fn build_llm(entry: &ProviderEntry) -> Result<Arc<dyn LlmProvider>> {
    match entry.kind.as_str() {
        "openai_compat" => OpenAiCompatLlm::from_config(entry).map(|p| Arc::new(p) as Arc<dyn LlmProvider>),
        "anthropic" => AnthropicLlm::from_config(entry).map(|p| Arc::new(p) as Arc<dyn LlmProvider>),
        other => Err(Error::ConfigMissing(format!("unknown llm provider kind '{other}'"))),
    }
}

fn build_stt(entry: &ProviderEntry) -> Result<Arc<dyn SttProvider>> {
    match entry.kind.as_str() {
        "deepgram_ws" | "websocket" => {
            WebsocketSttAdapter::from_config(entry).map(|p| Arc::new(p) as Arc<dyn SttProvider>)
        }
        other => Err(Error::ConfigMissing(format!("unknown stt provider kind '{other}'"))),
    }
}

fn build_tts(entry: &ProviderEntry) -> Result<Arc<dyn TtsProvider>> {
    match entry.kind.as_str() {
        "elevenlabs_http" | "http" => {
            HttpTtsAdapter::from_config(entry).map(|p| Arc::new(p) as Arc<dyn TtsProvider>)
        }
        other => Err(Error::ConfigMissing(format!("unknown tts provider kind '{other}'"))),
    }
}

fn build_telephony(entry: &ProviderEntry) -> Result<Arc<dyn TelephonyCaller>> {
    match entry.kind.as_str() {
        "telephony_http" | "twilio" => {
            HttpTelephonyAdapter::from_config(entry).map(|p| Arc::new(p) as Arc<dyn TelephonyCaller>)
        }
        other => Err(Error::ConfigMissing(format!("unknown telephony provider kind '{other}'"))),
    }
}

/// Holds the instantiated provider for each configured adapter kind.
///
/// All four are optional at construction time: a process that only runs the
/// dialer worker has no use for an STT/TTS pair, and vice versa for a
/// pipeline-only process. Callers ask for what they need and handle `None`.
pub struct ProviderRegistry {
    stt: Option<Arc<dyn SttProvider>>,
    llm: Option<Arc<dyn LlmProvider>>,
    tts: Option<Arc<dyn TtsProvider>>,
    telephony: Option<Arc<dyn TelephonyCaller>>,
}

impl ProviderRegistry {
    /// Build the registry from the application's [`ProvidersConfig`].
    ///
    /// A configured entry that fails to initialize (e.g. missing API key) is
    /// logged with secrets masked and left absent rather than aborting
    /// startup — callers that need that capability will get a clear error
    /// the first time they reach for it.
    pub fn from_config(config: &ProvidersConfig) -> Self {
        let stt = config.stt.as_ref().and_then(|e| match build_stt(e) {
            Ok(p) => Some(p),
            Err(err) => {
                tracing::warn!(kind = %e.kind, error = %mask_secrets(&err.to_string()), "stt provider init failed");
                None
            }
        });
        let llm = config.llm.as_ref().and_then(|e| match build_llm(e) {
            Ok(p) => Some(p),
            Err(err) => {
                tracing::warn!(kind = %e.kind, error = %mask_secrets(&err.to_string()), "llm provider init failed");
                None
            }
        });
        let tts = config.tts.as_ref().and_then(|e| match build_tts(e) {
            Ok(p) => Some(p),
            Err(err) => {
                tracing::warn!(kind = %e.kind, error = %mask_secrets(&err.to_string()), "tts provider init failed");
                None
            }
        });
        let telephony = config.telephony.as_ref().and_then(|e| match build_telephony(e) {
            Ok(p) => Some(p),
            Err(err) => {
                tracing::warn!(kind = %e.kind, error = %mask_secrets(&err.to_string()), "telephony provider init failed");
                None
            }
        });

        Self { stt, llm, tts, telephony }
    }

    pub fn stt(&self) -> Result<Arc<dyn SttProvider>> {
        self.stt.clone().ok_or_else(|| Error::ConfigMissing("no stt provider configured".into()))
    }

    pub fn llm(&self) -> Result<Arc<dyn LlmProvider>> {
        self.llm.clone().ok_or_else(|| Error::ConfigMissing("no llm provider configured".into()))
    }

    pub fn tts(&self) -> Result<Arc<dyn TtsProvider>> {
        self.tts.clone().ok_or_else(|| Error::ConfigMissing("no tts provider configured".into()))
    }

    pub fn telephony(&self) -> Result<Arc<dyn TelephonyCaller>> {
        self.telephony.clone().ok_or_else(|| Error::ConfigMissing("no telephony provider configured".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_secrets_redacts_long_tokens() {
        let msg = "auth failed for key sk-abcdefghijklmnopqrstuvwxyz";
        let masked = mask_secrets(msg);
        assert!(!masked.contains("sk-abcdefghijklmnopqrstuvwxyz"));
        assert!(masked.contains("sk-a...wxyz"));
    }

    #[test]
    fn mask_secrets_leaves_short_words_alone() {
        let msg = "provider openai_compat returned HTTP 500";
        assert_eq!(mask_secrets(msg), msg);
    }

    #[test]
    fn registry_with_no_providers_configured_returns_none_for_each() {
        let registry = ProviderRegistry::from_config(&ProvidersConfig::default());
        assert!(registry.stt().is_err());
        assert!(registry.llm().is_err());
        assert!(registry.tts().is_err());
        assert!(registry.telephony().is_err());
    }

    #[test]
    fn unknown_llm_kind_is_rejected() {
        let entry = ProviderEntry {
            kind: "not_a_real_provider".into(),
            base_url: None,
            model: None,
            auth: Default::default(),
        };
        assert!(build_llm(&entry).is_err());
    }
}
