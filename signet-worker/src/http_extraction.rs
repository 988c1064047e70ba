//! An HTTP-backed `ExtractionProvider`, shaped after the embedding
//! crate's local-http/remote-OpenAI-compatible split: one chat-style
//! endpoint that is asked to return a JSON array of fact proposals.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use signet_core::traits::{ExtractedFact, ExtractionProvider};

const EXTRACTION_PROMPT_PREFIX: &str = "Extract distinct, atomic facts worth remembering from the \
following note. Respond with a JSON array of objects, each with \
\"content\", \"confidence\" (0..1), and \"entities\" (array of strings). \
Return an empty array if nothing is worth keeping.\n\n";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

pub struct HttpExtractionProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl HttpExtractionProvider {
    pub fn new(base_url: String, model: String, api_key: Option<String>, timeout_ms: i64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms.max(100) as u64))
            .build()
            .unwrap_or_default();
        Self { client, base_url, model, api_key }
    }
}

#[async_trait]
impl ExtractionProvider for HttpExtractionProvider {
    async fn extract(&self, memory_content: &str) -> Result<Vec<ExtractedFact>, String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: format!("{EXTRACTION_PROMPT_PREFIX}{memory_content}"),
            }],
        };
        let mut req = self.client.post(&self.base_url).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req.send().await.map_err(|e| e.to_string())?;
        if !resp.status().is_success() {
            return Err(format!("extraction endpoint returned {}", resp.status()));
        }
        let parsed: ChatResponse = resp.json().await.map_err(|e| e.to_string())?;
        let raw = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| "empty extraction response".to_string())?;
        serde_json::from_str::<Vec<ExtractedFact>>(raw.trim()).map_err(|e| format!("malformed extraction payload: {e}"))
    }
}
