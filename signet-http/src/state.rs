//! Shared application state, held behind one `Arc` and cloned into
//! every handler via axum's `State` extractor — the same shape the
//! teacher's MCP HTTP transport uses for its session store and shared
//! storage/cognitive handles.

use std::sync::Arc;

use signet_core::config::SignetConfig;
use signet_core::traits::EmbeddingProvider;
use signet_repair::RepairRegistry;
use signet_retrieval::reranker::Reranker;
use signet_session::SessionManager;
use signet_storage::Accessor;

pub struct AppState {
    pub accessor: Arc<Accessor>,
    pub embeddings: Arc<dyn EmbeddingProvider>,
    pub reranker: Option<Arc<dyn Reranker>>,
    pub config: SignetConfig,
    pub repair: RepairRegistry,
    pub sessions: SessionManager,
}

pub type SharedState = Arc<AppState>;
