//! A single HTTP-backed embedding provider, shaped to either a local
//! Ollama-style `/api/embeddings` endpoint or a remote OpenAI-compatible
//! `/v1/embeddings` endpoint — the only two provider kinds the daemon
//! ships (spec §4.D).

use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use signet_core::constants::{EMBEDDING_AVAILABILITY_CACHE_MS, EMBEDDING_HTTP_TIMEOUT_MS};
use signet_core::traits::{EmbeddingProvider, ProviderAvailability};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    LocalHttp,
    RemoteOpenAiCompatible,
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct OllamaResponse {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    data: Vec<OpenAiDatum>,
}

#[derive(Deserialize)]
struct OpenAiDatum {
    embedding: Vec<f32>,
}

struct CachedAvailability {
    checked_at: Instant,
    result: ProviderAvailability,
}

pub struct HttpEmbeddingProvider {
    client: reqwest::Client,
    kind: ProviderKind,
    base_url: String,
    model: String,
    api_key: Option<String>,
    dimensions: usize,
    cache: Mutex<Option<CachedAvailability>>,
}

impl HttpEmbeddingProvider {
    pub fn new(kind: ProviderKind, base_url: String, model: String, api_key: Option<String>, dimensions: usize) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(EMBEDDING_HTTP_TIMEOUT_MS))
            .build()
            .unwrap_or_default();
        Self {
            client,
            kind,
            base_url,
            model,
            api_key,
            dimensions,
            cache: Mutex::new(None),
        }
    }

    async fn request(&self, text: &str) -> Result<Vec<f32>, String> {
        match self.kind {
            ProviderKind::LocalHttp => {
                let body = OllamaRequest { model: &self.model, prompt: text };
                let resp = self
                    .client
                    .post(&self.base_url)
                    .json(&body)
                    .send()
                    .await
                    .map_err(|e| e.to_string())?;
                if !resp.status().is_success() {
                    return Err(format!("local embedding endpoint returned {}", resp.status()));
                }
                let parsed: OllamaResponse = resp.json().await.map_err(|e| e.to_string())?;
                Ok(parsed.embedding)
            }
            ProviderKind::RemoteOpenAiCompatible => {
                let mut req = self.client.post(&self.base_url).json(&OpenAiRequest { model: &self.model, input: text });
                if let Some(key) = &self.api_key {
                    req = req.bearer_auth(key);
                }
                let resp = req.send().await.map_err(|e| e.to_string())?;
                if !resp.status().is_success() {
                    return Err(format!("remote embedding endpoint returned {}", resp.status()));
                }
                let parsed: OpenAiResponse = resp.json().await.map_err(|e| e.to_string())?;
                parsed
                    .data
                    .into_iter()
                    .next()
                    .map(|d| d.embedding)
                    .ok_or_else(|| "empty embedding response".to_string())
            }
        }
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed(&self, text: &str) -> Option<Vec<f32>> {
        match self.request(text).await {
            Ok(vector) => Some(vector),
            Err(reason) => {
                warn!(provider = self.model_name(), error = %reason, "embedding request failed");
                None
            }
        }
    }

    async fn available(&self) -> ProviderAvailability {
        {
            let cache = self.cache.lock().unwrap();
            if let Some(cached) = cache.as_ref() {
                if cached.checked_at.elapsed() < Duration::from_millis(EMBEDDING_AVAILABILITY_CACHE_MS as u64) {
                    return cached.result.clone();
                }
            }
        }

        let result = match self.request("availability probe").await {
            Ok(vector) => ProviderAvailability {
                available: true,
                dimensions: Some(vector.len()),
                error: None,
            },
            Err(reason) => ProviderAvailability {
                available: false,
                dimensions: None,
                error: Some(reason),
            },
        };

        let mut cache = self.cache.lock().unwrap();
        *cache = Some(CachedAvailability {
            checked_at: Instant::now(),
            result: result.clone(),
        });
        result
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
