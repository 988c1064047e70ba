//! Terminal fallback when no real embedding provider is reachable.
//! Always reports available (there's nothing to probe), always
//! returns `None` from `embed` — callers degrade to keyword-only
//! recall rather than treating this as an error (spec §4.D).

use async_trait::async_trait;

use signet_core::traits::{EmbeddingProvider, ProviderAvailability};

pub struct NoopProvider {
    dimensions: usize,
}

impl NoopProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

#[async_trait]
impl EmbeddingProvider for NoopProvider {
    async fn embed(&self, _text: &str) -> Option<Vec<f32>> {
        None
    }

    async fn available(&self) -> ProviderAvailability {
        ProviderAvailability {
            available: false,
            dimensions: None,
            error: Some("no embedding provider configured".to_string()),
        }
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        "none"
    }
}
