//! HTTP streaming text-to-speech adapter (ElevenLabs-style: POST text, read
//! back a chunked raw-PCM body).

use crate::traits::TtsProvider;
use crate::util::{from_reqwest, resolve_api_key};
use futures_util::StreamExt;
use vc_domain::audio::{AudioChunk, BoxStream};
use vc_domain::config::ProviderEntry;
use vc_domain::error::{Error, Result};

pub struct HttpTtsAdapter {
    id: String,
    base_url: String,
    api_key: String,
    voice: String,
    client: reqwest::Client,
}

impl HttpTtsAdapter {
    pub fn from_config(entry: &ProviderEntry) -> Result<Self> {
        let api_key = resolve_api_key(&entry.auth)?;
        let base_url = entry
            .base_url
            .clone()
            .unwrap_or_else(|| "https://api.elevenlabs.io/v1".into());
        let voice = entry.model.clone().unwrap_or_else(|| "default".into());

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(from_reqwest)?;

        Ok(Self { id: "elevenlabs_http".into(), base_url: base_url.trim_end_matches('/').to_string(), api_key, voice, client })
    }
}

#[async_trait::async_trait]
impl TtsProvider for HttpTtsAdapter {
    async fn synthesize(&self, text: &str) -> Result<BoxStream<'static, Result<AudioChunk>>> {
        let url = format!(
            "{}/text-to-speech/{}/stream?output_format=pcm_16000",
            self.base_url, self.voice
        );
        let body = serde_json::json!({ "text": text, "model_id": "eleven_turbo_v2" });

        let resp = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.map_err(from_reqwest)?;
            let err = format!("HTTP {} - {}", status.as_u16(), text);
            return Err(if status.is_server_error() {
                Error::TransientProvider { provider: self.id.clone(), message: err }
            } else {
                Error::FatalProvider { provider: self.id.clone(), message: err }
            });
        }

        let mut byte_stream = resp.bytes_stream();
        let mut leftover: Vec<u8> = Vec::new();

        let stream = async_stream::stream! {
            while let Some(chunk) = byte_stream.next().await {
                let bytes = match chunk {
                    Ok(b) => b,
                    Err(e) => {
                        yield Err(from_reqwest(e));
                        return;
                    }
                };
                leftover.extend_from_slice(&bytes);

                let usable = leftover.len() - (leftover.len() % 2);
                if usable == 0 {
                    continue;
                }
                let samples: Vec<i16> = leftover[..usable]
                    .chunks_exact(2)
                    .map(|b| i16::from_le_bytes([b[0], b[1]]))
                    .collect();
                leftover.drain(..usable);
                yield Ok(AudioChunk::new(samples, 16_000));
            }
        };

        Ok(Box::pin(stream))
    }

    fn provider_id(&self) -> &str {
        &self.id
    }
}
