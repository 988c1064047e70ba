//! Embedding provider implementations and the ordered fallback chain
//! that sits behind `signet_core::traits::EmbeddingProvider`.
//!
//! Generalizes the teacher's multi-tier provider chain (cloud API ->
//! ONNX -> TF-IDF) down to the two provider kinds the daemon actually
//! ships: one real HTTP provider, and a terminal no-op that degrades
//! recall to keyword-only (spec §4.D).

pub mod chain;
pub mod http_provider;
pub mod noop;

pub use chain::ProviderChain;
pub use http_provider::{HttpEmbeddingProvider, ProviderKind};
pub use noop::NoopProvider;

use signet_core::config::EmbeddingConfig;

/// Build the provider chain the daemon wires in at startup: the
/// configured HTTP provider first, `NoopProvider` as the terminal
/// fallback.
pub fn build_provider_chain(cfg: &EmbeddingConfig) -> ProviderChain {
    let kind = match cfg.provider.as_str() {
        "remote-openai-compatible" => ProviderKind::RemoteOpenAiCompatible,
        _ => ProviderKind::LocalHttp,
    };
    let http = HttpEmbeddingProvider::new(kind, cfg.base_url.clone(), cfg.model.clone(), cfg.api_key.clone(), cfg.dimensions);
    ProviderChain::new(vec![Box::new(http)], Box::new(NoopProvider::new(cfg.dimensions)))
}
