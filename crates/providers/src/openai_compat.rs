//! OpenAI-compatible chat completion adapter.
//!
//! Works with OpenAI, self-hosted gateways, Ollama, vLLM, and any other
//! endpoint that follows the OpenAI chat completions wire format.

use crate::traits::LlmProvider;
use crate::util::{from_reqwest, resolve_api_key};
use serde_json::Value;
use vc_domain::audio::BoxStream;
use vc_domain::capability::{LlmCapabilities, ToolSupport};
use vc_domain::config::ProviderEntry;
use vc_domain::error::{Error, Result};
use vc_domain::llm::{ChatRequest, ChatResponse, LlmStreamEvent, Message, Role, ToolCall, Usage};

pub struct OpenAiCompatLlm {
    id: String,
    base_url: String,
    api_key: String,
    default_model: String,
    capabilities: LlmCapabilities,
    client: reqwest::Client,
}

impl OpenAiCompatLlm {
    pub fn from_config(entry: &ProviderEntry) -> Result<Self> {
        let api_key = resolve_api_key(&entry.auth)?;
        let base_url = entry
            .base_url
            .clone()
            .unwrap_or_else(|| "https://api.openai.com/v1".into());
        let default_model = entry.model.clone().unwrap_or_else(|| "gpt-4o-mini".into());

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(from_reqwest)?;

        Ok(Self {
            id: "openai_compat".into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            default_model,
            capabilities: LlmCapabilities {
                supports_tools: ToolSupport::StrictJson,
                supports_streaming: true,
                context_window_tokens: Some(128_000),
            },
            client,
        })
    }

    fn authed_post(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
    }

    fn effective_model(&self, req: &ChatRequest) -> String {
        req.model.clone().unwrap_or_else(|| self.default_model.clone())
    }

    fn build_chat_body(&self, req: &ChatRequest, stream: bool) -> Value {
        let messages: Vec<Value> = req.messages.iter().map(msg_to_openai).collect();
        let mut body = serde_json::json!({
            "model": self.effective_model(req),
            "messages": messages,
            "stream": stream,
        });
        if !req.tools.is_empty() {
            let tools: Vec<Value> = req
                .tools
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters,
                        }
                    })
                })
                .collect();
            body["tools"] = Value::Array(tools);
        }
        if let Some(temp) = req.temperature {
            body["temperature"] = serde_json::json!(temp);
        }
        if let Some(max) = req.max_tokens {
            body["max_tokens"] = serde_json::json!(max);
        }
        if stream {
            body["stream_options"] = serde_json::json!({"include_usage": true});
        }
        body
    }
}

fn role_to_str(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    }
}

fn msg_to_openai(msg: &Message) -> Value {
    serde_json::json!({
        "role": role_to_str(msg.role),
        "content": msg.content,
    })
}

fn parse_openai_usage(v: &Value) -> Option<Usage> {
    Some(Usage {
        prompt_tokens: v.get("prompt_tokens")?.as_u64()? as u32,
        completion_tokens: v.get("completion_tokens")?.as_u64()? as u32,
        total_tokens: v.get("total_tokens")?.as_u64()? as u32,
    })
}

fn parse_openai_tool_calls(message: &Value) -> Vec<ToolCall> {
    let arr = match message.get("tool_calls").and_then(|v| v.as_array()) {
        Some(a) => a,
        None => return Vec::new(),
    };
    arr.iter()
        .filter_map(|tc| {
            let call_id = tc.get("id")?.as_str()?.to_string();
            let func = tc.get("function")?;
            let tool_name = func.get("name")?.as_str()?.to_string();
            let args_str = func.get("arguments")?.as_str().unwrap_or("{}");
            let arguments: Value = serde_json::from_str(args_str).unwrap_or_default();
            Some(ToolCall { call_id, tool_name, arguments })
        })
        .collect()
}

fn parse_chat_response(body: &Value) -> Result<ChatResponse> {
    let choice = body
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|a| a.first())
        .ok_or_else(|| Error::TransientProvider {
            provider: "openai_compat".into(),
            message: "no choices in response".into(),
        })?;
    let message = choice.get("message").ok_or_else(|| Error::TransientProvider {
        provider: "openai_compat".into(),
        message: "no message in choice".into(),
    })?;

    let content = message.get("content").and_then(|v| v.as_str()).unwrap_or("").to_string();
    let finish_reason = choice.get("finish_reason").and_then(|v| v.as_str()).map(String::from);
    let model = body.get("model").and_then(|v| v.as_str()).unwrap_or("unknown").to_string();
    let tool_calls = parse_openai_tool_calls(message);
    let usage = body.get("usage").and_then(parse_openai_usage);

    Ok(ChatResponse { content, tool_calls, usage, model, finish_reason })
}

fn parse_sse_data(data: &str) -> Vec<Result<LlmStreamEvent>> {
    if data.trim() == "[DONE]" {
        return vec![Ok(LlmStreamEvent::Done { usage: None, finish_reason: Some("stop".into()) })];
    }

    let v: Value = match serde_json::from_str(data) {
        Ok(v) => v,
        Err(e) => return vec![Err(Error::Json(e))],
    };

    let choice = v.get("choices").and_then(|c| c.as_array()).and_then(|a| a.first());
    let choice = match choice {
        Some(c) => c,
        None => {
            if let Some(usage) = v.get("usage").and_then(parse_openai_usage) {
                return vec![Ok(LlmStreamEvent::Done { usage: Some(usage), finish_reason: None })];
            }
            return Vec::new();
        }
    };

    let delta = choice.get("delta").unwrap_or(&Value::Null);

    if let Some(fr) = choice.get("finish_reason").and_then(|f| f.as_str()) {
        let usage = v.get("usage").and_then(parse_openai_usage);
        return vec![Ok(LlmStreamEvent::Done { usage, finish_reason: Some(fr.to_string()) })];
    }

    if let Some(tc_arr) = delta.get("tool_calls").and_then(|v| v.as_array()) {
        if let Some(tc) = tc_arr.first() {
            if let (Some(id), Some(func)) = (tc.get("id").and_then(|v| v.as_str()), tc.get("function")) {
                let name = func.get("name").and_then(|v| v.as_str()).unwrap_or("");
                let args_str = func.get("arguments").and_then(|v| v.as_str()).unwrap_or("{}");
                let arguments: Value = serde_json::from_str(args_str).unwrap_or_default();
                return vec![Ok(LlmStreamEvent::ToolCall {
                    call_id: id.to_string(),
                    tool_name: name.to_string(),
                    arguments,
                })];
            }
        }
    }

    if let Some(text) = delta.get("content").and_then(|v| v.as_str()) {
        if !text.is_empty() {
            return vec![Ok(LlmStreamEvent::Token { text: text.to_string() })];
        }
    }

    Vec::new()
}

#[async_trait::async_trait]
impl LlmProvider for OpenAiCompatLlm {
    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_chat_body(&req, false);

        tracing::debug!(provider = %self.id, url = %url, "openai_compat chat request");

        let resp = self.authed_post(&url).json(&body).send().await.map_err(from_reqwest)?;
        let status = resp.status();
        let resp_text = resp.text().await.map_err(from_reqwest)?;

        if status.is_server_error() {
            return Err(Error::TransientProvider {
                provider: self.id.clone(),
                message: format!("HTTP {} - {}", status.as_u16(), resp_text),
            });
        }
        if !status.is_success() {
            return Err(Error::FatalProvider {
                provider: self.id.clone(),
                message: format!("HTTP {} - {}", status.as_u16(), resp_text),
            });
        }

        let resp_json: Value = serde_json::from_str(&resp_text)?;
        parse_chat_response(&resp_json)
    }

    async fn chat_stream(&self, req: ChatRequest) -> Result<BoxStream<'static, Result<LlmStreamEvent>>> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_chat_body(&req, true);

        tracing::debug!(provider = %self.id, url = %url, "openai_compat stream request");

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

        Ok(crate::sse::sse_response_stream(resp, parse_sse_data))
    }

    fn capabilities(&self) -> &LlmCapabilities {
        &self.capabilities
    }

    fn provider_id(&self) -> &str {
        &self.id
    }
}
