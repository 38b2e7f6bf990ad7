//! Anthropic Messages API adapter.
//!
//! Differs from the OpenAI-compatible wire format in two ways worth noting:
//! system messages go in a separate top-level `system` field, and tool-call
//! argument deltas arrive as partial JSON fragments rather than whole objects.

use crate::traits::LlmProvider;
use crate::util::{from_reqwest, resolve_api_key};
use serde_json::Value;
use vc_domain::audio::BoxStream;
use vc_domain::capability::{LlmCapabilities, ToolSupport};
use vc_domain::config::ProviderEntry;
use vc_domain::error::{Error, Result};
use vc_domain::llm::{ChatRequest, ChatResponse, LlmStreamEvent, Role, ToolCall, Usage};

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicLlm {
    id: String,
    base_url: String,
    api_key: String,
    default_model: String,
    capabilities: LlmCapabilities,
    client: reqwest::Client,
}

impl AnthropicLlm {
    pub fn from_config(entry: &ProviderEntry) -> Result<Self> {
        let api_key = resolve_api_key(&entry.auth)?;
        let base_url = entry.base_url.clone().unwrap_or_else(|| "https://api.anthropic.com".into());
        let default_model = entry.model.clone().unwrap_or_else(|| "claude-sonnet-4-20250514".into());

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(from_reqwest)?;

        Ok(Self {
            id: "anthropic".into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            default_model,
            capabilities: LlmCapabilities {
                supports_tools: ToolSupport::StrictJson,
                supports_streaming: true,
                context_window_tokens: Some(200_000),
            },
            client,
        })
    }

    fn authed_post(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .post(url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
    }

    fn build_messages_body(&self, req: &ChatRequest, stream: bool) -> Value {
        let model = req.model.clone().unwrap_or_else(|| self.default_model.clone());

        let mut system_parts = Vec::new();
        let mut api_messages = Vec::new();
        for msg in &req.messages {
            match msg.role {
                Role::System => system_parts.push(msg.content.clone()),
                Role::User | Role::Tool => {
                    api_messages.push(serde_json::json!({"role": "user", "content": msg.content}));
                }
                Role::Assistant => {
                    api_messages
                        .push(serde_json::json!({"role": "assistant", "content": msg.content}));
                }
            }
        }

        let mut body = serde_json::json!({
            "model": model,
            "messages": api_messages,
            "stream": stream,
            "max_tokens": req.max_tokens.unwrap_or(1024),
        });
        if !system_parts.is_empty() {
            body["system"] = Value::String(system_parts.join("\n\n"));
        }
        if !req.tools.is_empty() {
            let tools: Vec<Value> = req
                .tools
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "name": t.name,
                        "description": t.description,
                        "input_schema": t.parameters,
                    })
                })
                .collect();
            body["tools"] = Value::Array(tools);
        }
        if let Some(temp) = req.temperature {
            body["temperature"] = serde_json::json!(temp);
        }
        body
    }
}

fn parse_anthropic_usage(v: &Value) -> Option<Usage> {
    let input = v.get("input_tokens")?.as_u64()? as u32;
    let output = v.get("output_tokens")?.as_u64()? as u32;
    Some(Usage { prompt_tokens: input, completion_tokens: output, total_tokens: input + output })
}

fn parse_anthropic_response(body: &Value) -> Result<ChatResponse> {
    let content_arr = body.get("content").and_then(|v| v.as_array()).cloned().unwrap_or_default();

    let mut text_parts = Vec::new();
    let mut tool_calls = Vec::new();
    for block in &content_arr {
        match block.get("type").and_then(|v| v.as_str()).unwrap_or("") {
            "text" => {
                if let Some(t) = block.get("text").and_then(|v| v.as_str()) {
                    text_parts.push(t.to_string());
                }
            }
            "tool_use" => {
                tool_calls.push(ToolCall {
                    call_id: block.get("id").and_then(|v| v.as_str()).unwrap_or("").to_string(),
                    tool_name: block.get("name").and_then(|v| v.as_str()).unwrap_or("").to_string(),
                    arguments: block.get("input").cloned().unwrap_or_default(),
                });
            }
            _ => {}
        }
    }

    let model = body.get("model").and_then(|v| v.as_str()).unwrap_or("unknown").to_string();
    let finish_reason = body.get("stop_reason").and_then(|v| v.as_str()).map(|s| match s {
        "end_turn" => "stop".to_string(),
        "tool_use" => "tool_calls".to_string(),
        other => other.to_string(),
    });
    let usage = body.get("usage").and_then(parse_anthropic_usage);

    Ok(ChatResponse { content: text_parts.join(""), tool_calls, usage, model, finish_reason })
}

/// Assembles streamed tool-call argument fragments across `content_block_delta`
/// events until the matching `content_block_stop`.
struct StreamState {
    active_tool_call: Option<(String, String, String)>,
    usage: Option<Usage>,
    done_emitted: bool,
}

fn parse_anthropic_sse(data: &str, state: &mut StreamState) -> Vec<Result<LlmStreamEvent>> {
    let v: Value = match serde_json::from_str(data) {
        Ok(v) => v,
        Err(e) => return vec![Err(Error::Json(e))],
    };

    match v.get("type").and_then(|v| v.as_str()).unwrap_or("") {
        "message_start" => {
            if let Some(msg) = v.get("message") {
                state.usage = msg.get("usage").and_then(parse_anthropic_usage);
            }
            Vec::new()
        }
        "content_block_start" => {
            if let Some(block) = v.get("content_block") {
                if block.get("type").and_then(|v| v.as_str()) == Some("tool_use") {
                    let id = block.get("id").and_then(|v| v.as_str()).unwrap_or("").to_string();
                    let name = block.get("name").and_then(|v| v.as_str()).unwrap_or("").to_string();
                    state.active_tool_call = Some((id, name, String::new()));
                }
            }
            Vec::new()
        }
        "content_block_delta" => {
            let delta = v.get("delta").cloned().unwrap_or(Value::Null);
            match delta.get("type").and_then(|v| v.as_str()).unwrap_or("") {
                "text_delta" => {
                    let text = delta.get("text").and_then(|v| v.as_str()).unwrap_or("");
                    if text.is_empty() {
                        Vec::new()
                    } else {
                        vec![Ok(LlmStreamEvent::Token { text: text.to_string() })]
                    }
                }
                "input_json_delta" => {
                    let partial = delta.get("partial_json").and_then(|v| v.as_str()).unwrap_or("");
                    if let Some((_, _, buf)) = &mut state.active_tool_call {
                        buf.push_str(partial);
                    }
                    Vec::new()
                }
                _ => Vec::new(),
            }
        }
        "content_block_stop" => {
            if let Some((call_id, tool_name, args_str)) = state.active_tool_call.take() {
                let arguments: Value = serde_json::from_str(&args_str).unwrap_or_default();
                vec![Ok(LlmStreamEvent::ToolCall { call_id, tool_name, arguments })]
            } else {
                Vec::new()
            }
        }
        "message_delta" => {
            let stop_reason = v
                .get("delta")
                .and_then(|d| d.get("stop_reason"))
                .and_then(|v| v.as_str())
                .map(|s| match s {
                    "end_turn" => "stop".to_string(),
                    "tool_use" => "tool_calls".to_string(),
                    other => other.to_string(),
                });
            if let Some(reason) = stop_reason {
                state.done_emitted = true;
                vec![Ok(LlmStreamEvent::Done { usage: state.usage.clone(), finish_reason: Some(reason) })]
            } else {
                Vec::new()
            }
        }
        "message_stop" => {
            if state.done_emitted {
                Vec::new()
            } else {
                state.done_emitted = true;
                vec![Ok(LlmStreamEvent::Done { usage: state.usage.clone(), finish_reason: Some("stop".into()) })]
            }
        }
        "error" => {
            let msg = v
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(|v| v.as_str())
                .unwrap_or("unknown error");
            vec![Ok(LlmStreamEvent::Error { message: msg.to_string() })]
        }
        _ => Vec::new(),
    }
}

#[async_trait::async_trait]
impl LlmProvider for AnthropicLlm {
    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = self.build_messages_body(&req, false);

        let resp = self.authed_post(&url).json(&body).send().await.map_err(from_reqwest)?;
        let status = resp.status();
        let resp_text = resp.text().await.map_err(from_reqwest)?;

        if !status.is_success() {
            let err = format!("HTTP {} - {}", status.as_u16(), resp_text);
            return Err(if status.is_server_error() {
                Error::TransientProvider { provider: self.id.clone(), message: err }
            } else {
                Error::FatalProvider { provider: self.id.clone(), message: err }
            });
        }

        let resp_json: Value = serde_json::from_str(&resp_text)?;
        parse_anthropic_response(&resp_json)
    }

    async fn chat_stream(&self, req: ChatRequest) -> Result<BoxStream<'static, Result<LlmStreamEvent>>> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = self.build_messages_body(&req, true);

        let resp = self.authed_post(&url).json(&body).send().await.map_err(from_reqwest)?;
        let status = resp.status();
        if !status.is_success() {
            let err_text = resp.text().await.map_err(from_reqwest)?;
            let err = format!("HTTP {} - {}", status.as_u16(), err_text);
            return Err(if status.is_server_error() {
                Error::TransientProvider { provider: self.id.clone(), message: err }
            } else {
                Error::FatalProvider { provider: self.id.clone(), message: err }
            });
        }

        let mut state = StreamState { active_tool_call: None, usage: None, done_emitted: false };
        Ok(crate::sse::sse_response_stream(resp, move |data| parse_anthropic_sse(data, &mut state)))
    }

    fn capabilities(&self) -> &LlmCapabilities {
        &self.capabilities
    }

    fn provider_id(&self) -> &str {
        &self.id
    }
}
