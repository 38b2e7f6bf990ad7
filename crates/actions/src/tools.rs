//! Concrete [`ActionTool`] implementations dispatched by action type.

use async_trait::async_trait;
use vc_domain::error::{Error, Result};

/// A vetted integration behind one [`vc_domain::types::ActionType`]. Takes
/// the step's resolved params, returns a JSON result other steps may chain
/// off via `use_result_from`.
#[async_trait]
pub trait ActionTool: Send + Sync {
    async fn execute(&self, params: serde_json::Value) -> Result<serde_json::Value>;
}

/// Posts `{action_type, params}` to a configured webhook and returns its
/// JSON body as the step result. Mirrors the provider adapters' plain
/// HTTP-POST-with-bearer-auth shape.
pub struct WebhookActionTool {
    http: reqwest::Client,
    url: String,
    action_type: &'static str,
    bearer: Option<String>,
}

impl WebhookActionTool {
    pub fn new(url: impl Into<String>, action_type: &'static str, bearer: Option<String>) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(15))
                .build()
                .expect("reqwest client"),
            url: url.into(),
            action_type,
            bearer,
        }
    }
}

#[async_trait]
impl ActionTool for WebhookActionTool {
    async fn execute(&self, params: serde_json::Value) -> Result<serde_json::Value> {
        let mut req = self.http.post(&self.url).json(&serde_json::json!({
            "action_type": self.action_type,
            "params": params,
        }));
        if let Some(token) = &self.bearer {
            req = req.bearer_auth(token);
        }
        let resp = req.send().await.map_err(|e| Error::Http(e.to_string()))?;
        let status = resp.status();
        let body: serde_json::Value = resp.json().await.unwrap_or(serde_json::Value::Null);
        if !status.is_success() {
            let msg = format!("{} returned HTTP {}", self.url, status.as_u16());
            return Err(if status.is_server_error() {
                Error::TransientProvider { provider: self.action_type.into(), message: msg }
            } else {
                Error::FatalProvider { provider: self.action_type.into(), message: msg }
            });
        }
        Ok(body)
    }
}

/// Returns a canned success result without calling out anywhere. Used for
/// `ActionsConfig.dry_run` and as a placeholder for action types with no
/// tool registered in a given deployment.
pub struct NoopActionTool;

#[async_trait]
impl ActionTool for NoopActionTool {
    async fn execute(&self, params: serde_json::Value) -> Result<serde_json::Value> {
        Ok(serde_json::json!({"dry_run": true, "params": params}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_tool_echoes_params_under_dry_run_flag() {
        let tool = NoopActionTool;
        let result = tool.execute(serde_json::json!({"to": "a@example.com"})).await.unwrap();
        assert_eq!(result["dry_run"], true);
        assert_eq!(result["params"]["to"], "a@example.com");
    }
}
