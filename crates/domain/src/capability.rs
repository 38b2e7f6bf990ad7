use serde::{Deserialize, Serialize};

/// The adapter kinds the provider factory can construct, keyed by a string
/// name from configuration (§9 — dynamic provider dispatch replaced by
/// concrete capability sets registered in a factory).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterKind {
    Stt,
    Llm,
    Tts,
    Telephony,
}

/// Tool-calling support level advertised by an LLM provider/model pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolSupport {
    None,
    Basic,
    StrictJson,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmCapabilities {
    pub supports_tools: ToolSupport,
    pub supports_streaming: bool,
    pub context_window_tokens: Option<u32>,
}

impl Default for LlmCapabilities {
    fn default() -> Self {
        Self {
            supports_tools: ToolSupport::None,
            supports_streaming: true,
            context_window_tokens: None,
        }
    }
}
