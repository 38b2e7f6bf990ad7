//! REST implementation of [`PersistenceClient`].
//!
//! Wraps a `reqwest::Client` and translates every trait method into a PUT
//! against the corresponding row endpoint, with retry + exponential
//! back-off on transient (5xx / timeout) failures. Mirrors the provider
//! adapters' retry shape rather than reinventing one.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use uuid::Uuid;

use vc_domain::config::PersistenceConfig;
use vc_domain::error::{Error, Result};
use vc_domain::trace::TraceEvent;

use crate::provider::PersistenceClient;
use crate::types::{ActionPlanRow, CallRow, DialerJobRow, RecordingRow, TranscriptRow};

fn resolve_api_key(cfg: &PersistenceConfig) -> Option<String> {
    if let Some(key) = &cfg.auth.key {
        return Some(key.clone());
    }
    cfg.auth.env.as_ref().and_then(|var| std::env::var(var).ok())
}

#[derive(Debug, Clone)]
pub struct RestPersistenceClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    max_retries: u32,
}

impl RestPersistenceClient {
    pub fn new(cfg: &PersistenceConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_owned(),
            api_key: resolve_api_key(cfg),
            max_retries: cfg.max_retries,
        })
    }

    fn decorate(&self, rb: RequestBuilder, tenant_id: Option<&str>) -> RequestBuilder {
        let mut rb = rb.header("X-Trace-Id", Uuid::new_v4().to_string());
        if let Some(tenant_id) = tenant_id {
            rb = rb.header("X-Tenant-Id", tenant_id);
        }
        if let Some(key) = &self.api_key {
            rb = rb.bearer_auth(key);
        }
        rb
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Retries on 5xx and timeouts/connection errors; does not retry 4xx.
    /// Emits a `TraceEvent::PersistenceCall` after every attempt.
    async fn execute_with_retry(
        &self,
        endpoint: &str,
        tenant_id: Option<&str>,
        build_request: impl Fn() -> RequestBuilder,
    ) -> Result<Response> {
        let mut last_err: Option<Error> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = Duration::from_millis(100 * 2u64.pow(attempt - 1));
                tokio::time::sleep(backoff).await;
            }

            let start = Instant::now();
            let rb = self.decorate(build_request(), tenant_id);
            let result = rb.send().await;
            let duration_ms = start.elapsed().as_millis() as u64;

            match result {
                Ok(resp) => {
                    let status = resp.status();
                    TraceEvent::PersistenceCall { endpoint: endpoint.to_owned(), status: status.as_u16(), duration_ms }.emit();

                    if status.is_server_error() {
                        let body = resp.text().await.unwrap_or_default();
                        last_err = Some(Error::Persistence(format!("{endpoint} returned {status}: {body}")));
                        continue;
                    }
                    if status.is_client_error() {
                        let body = resp.text().await.unwrap_or_default();
                        return Err(if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                            Error::Auth(format!("{endpoint} auth failed ({status}): {body}"))
                        } else {
                            Error::Persistence(format!("{endpoint} returned {status}: {body}"))
                        });
                    }
                    return Ok(resp);
                }
                Err(e) => {
                    TraceEvent::PersistenceCall { endpoint: endpoint.to_owned(), status: 0, duration_ms }.emit();
                    last_err = Some(from_reqwest(e));
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| Error::Persistence(format!("{endpoint}: all retries exhausted"))))
    }
}

#[async_trait]
impl PersistenceClient for RestPersistenceClient {
    async fn upsert_dialer_job(&self, row: DialerJobRow) -> Result<()> {
        let url = self.url(&format!("/v1/dialer_jobs/{}", row.id));
        let tenant_id = row.tenant_id.clone();
        self.execute_with_retry("PUT /v1/dialer_jobs/:id", Some(&tenant_id), || self.http.put(&url).json(&row))
            .await?;
        Ok(())
    }

    async fn upsert_call(&self, row: CallRow) -> Result<()> {
        let url = self.url(&format!("/v1/calls/{}", row.id));
        let tenant_id = row.tenant_id.clone();
        self.execute_with_retry("PUT /v1/calls/:id", Some(&tenant_id), || self.http.put(&url).json(&row))
            .await?;
        Ok(())
    }

    async fn upsert_transcript(&self, row: TranscriptRow) -> Result<()> {
        let url = self.url(&format!("/v1/calls/{}/transcript", row.call_id));
        let tenant_id = row.tenant_id.clone();
        self.execute_with_retry("PUT /v1/calls/:id/transcript", Some(&tenant_id), || self.http.put(&url).json(&row))
            .await?;
        Ok(())
    }

    async fn upsert_recording(&self, row: RecordingRow) -> Result<()> {
        let url = self.url(&format!("/v1/calls/{}/recording", row.call_id));
        let tenant_id = row.tenant_id.clone();
        self.execute_with_retry("PUT /v1/calls/:id/recording", Some(&tenant_id), || self.http.put(&url).json(&row))
            .await?;
        Ok(())
    }

    async fn upsert_action_plan(&self, row: ActionPlanRow) -> Result<()> {
        let url = self.url(&format!("/v1/action_plans/{}", row.plan_id));
        let tenant_id = row.tenant_id.clone();
        self.execute_with_retry("PUT /v1/action_plans/:id", Some(&tenant_id), || self.http.put(&url).json(&row))
            .await?;
        Ok(())
    }

    async fn health(&self) -> Result<()> {
        let url = self.url("/v1/health");
        self.execute_with_retry("GET /v1/health", None, || self.http.get(&url)).await?;
        Ok(())
    }
}

pub fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}
