//! Ordered provider fallback, generalizing the teacher's multi-tier
//! `cortex-embeddings` chain down to "one real provider, then give up"
//! (spec §4.D). `embed` tries each provider in order and returns the
//! first success; `available` reports whether any non-terminal
//! provider is currently reachable.

use async_trait::async_trait;

use signet_core::traits::{EmbeddingProvider, ProviderAvailability};

pub struct ProviderChain {
    providers: Vec<Box<dyn EmbeddingProvider>>,
    fallback: Box<dyn EmbeddingProvider>,
}

impl ProviderChain {
    pub fn new(providers: Vec<Box<dyn EmbeddingProvider>>, fallback: Box<dyn EmbeddingProvider>) -> Self {
        Self { providers, fallback }
    }
}

#[async_trait]
impl EmbeddingProvider for ProviderChain {
    async fn embed(&self, text: &str) -> Option<Vec<f32>> {
        for provider in &self.providers {
            if let Some(vector) = provider.embed(text).await {
                return Some(vector);
            }
        }
        self.fallback.embed(text).await
    }

    async fn available(&self) -> ProviderAvailability {
        for provider in &self.providers {
            let status = provider.available().await;
            if status.available {
                return status;
            }
        }
        self.fallback.available().await
    }

    fn dimensions(&self) -> usize {
        self.providers.first().map(|p| p.dimensions()).unwrap_or_else(|| self.fallback.dimensions())
    }

    fn model_name(&self) -> &str {
        self.providers.first().map(|p| p.model_name()).unwrap_or_else(|| self.fallback.model_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noop::NoopProvider;

    struct AlwaysFails;

    #[async_trait]
    impl EmbeddingProvider for AlwaysFails {
        async fn embed(&self, _text: &str) -> Option<Vec<f32>> {
            None
        }
        async fn available(&self) -> ProviderAvailability {
            ProviderAvailability { available: false, dimensions: None, error: Some("down".into()) }
        }
        fn dimensions(&self) -> usize {
            8
        }
        fn model_name(&self) -> &str {
            "always-fails"
        }
    }

    #[tokio::test]
    async fn falls_through_to_noop_when_primary_is_down() {
        let chain = ProviderChain::new(vec![Box::new(AlwaysFails)], Box::new(NoopProvider::new(8)));
        assert_eq!(chain.embed("hello").await, None);
        assert!(!chain.available().await.available);
    }
}
