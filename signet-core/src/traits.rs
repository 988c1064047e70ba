//! Seams the core depends on but does not implement — the daemon wires
//! concrete implementations in at startup (per spec §1 "external
//! collaborators" and Design Note "dependency-injected handles created
//! in `main`").

use async_trait::async_trait;

/// Result of an embedding call. `None` on transport/non-2xx failure —
/// embedding failures are local and non-fatal (spec §4.D).
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Option<Vec<f32>>;
    async fn available(&self) -> ProviderAvailability;
    fn dimensions(&self) -> usize;
    fn model_name(&self) -> &str;
}

#[derive(Debug, Clone)]
pub struct ProviderAvailability {
    pub available: bool,
    pub dimensions: Option<usize>,
    pub error: Option<String>,
}

/// A structured fact/entity proposal returned by the extraction provider.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ExtractedFact {
    pub content: String,
    pub confidence: f64,
    pub relationship: Option<ExtractedRelationship>,
    pub entities: Vec<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractedRelationship {
    Update { target_memory_id: String },
    Delete { target_memory_id: String },
    Merge { target_memory_id: String },
}

#[async_trait]
pub trait ExtractionProvider: Send + Sync {
    async fn extract(&self, memory_content: &str) -> Result<Vec<ExtractedFact>, String>;
}

/// Key-value secrets interface (spec §1: the core consumes, never owns, secrets storage).
pub trait SecretsStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}
