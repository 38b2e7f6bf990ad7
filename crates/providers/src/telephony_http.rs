//! HTTP telephony adapter (Twilio-style: POST to create a call, returns an
//! opaque call SID used to correlate status webhooks).

use crate::traits::TelephonyCaller;
use crate::util::{from_reqwest, resolve_api_key};
use vc_domain::config::ProviderEntry;
use vc_domain::error::{Error, Result};

pub struct HttpTelephonyAdapter {
    id: String,
    base_url: String,
    api_key: String,
    from_number: String,
    client: reqwest::Client,
}

impl HttpTelephonyAdapter {
    pub fn from_config(entry: &ProviderEntry) -> Result<Self> {
        let api_key = resolve_api_key(&entry.auth)?;
        let base_url = entry.base_url.clone().ok_or_else(|| {
            Error::ConfigMissing("telephony provider requires base_url".into())
        })?;
        let from_number = entry
            .model
            .clone()
            .ok_or_else(|| Error::ConfigMissing("telephony provider requires 'model' as the caller-id number".into()))?;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .map_err(from_reqwest)?;

        Ok(Self { id: "telephony_http".into(), base_url: base_url.trim_end_matches('/').to_string(), api_key, from_number, client })
    }
}

#[async_trait::async_trait]
impl TelephonyCaller for HttpTelephonyAdapter {
    async fn place_call(&self, to_number: &str, webhook_url: &str) -> Result<String> {
        let url = format!("{}/Calls", self.base_url);
        let params = [
            ("To", to_number),
            ("From", self.from_number.as_str()),
            ("Url", webhook_url),
        ];

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .form(&params)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = resp.status();
        let body: serde_json::Value = resp.json().await.map_err(from_reqwest)?;

        if !status.is_success() {
            let msg = body.get("message").and_then(|v| v.as_str()).unwrap_or("call placement failed");
            let err = format!("HTTP {} - {}", status.as_u16(), msg);
            return Err(if status.is_server_error() {
                Error::TransientProvider { provider: self.id.clone(), message: err }
            } else {
                Error::FatalProvider { provider: self.id.clone(), message: err }
            });
        }

        body.get("sid")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| Error::FatalProvider {
                provider: self.id.clone(),
                message: "call creation response missing 'sid'".into(),
            })
    }

    async fn hang_up(&self, provider_call_id: &str) -> Result<()> {
        let url = format!("{}/Calls/{}", self.base_url, provider_call_id);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .form(&[("Status", "completed")])
            .send()
            .await
            .map_err(from_reqwest)?;

        if !resp.status().is_success() {
            return Err(Error::TransientProvider {
                provider: self.id.clone(),
                message: format!("hang up failed with HTTP {}", resp.status().as_u16()),
            });
        }
        Ok(())
    }

    fn provider_id(&self) -> &str {
        &self.id
    }
}
