//! The hybrid keyword + vector + graph recall pipeline (spec §4.G).

pub mod engine;
pub mod fuse;
pub mod graph;
pub mod rehearsal;
pub mod reranker;
pub mod types;

pub use engine::recall;
pub use reranker::Reranker;
pub use types::{Candidate, RecallItem, RecallOutcome, RecallRequest, RecallSource};
