//! The ingress side of the memory core: the `remember()` pipeline and
//! the markdown ingestion feed (spec §4.F, §4.L).

pub mod markdown;
pub mod remember;
pub mod watcher;

pub use markdown::{chunk_markdown, IngestionFeed, MarkdownChunk};
pub use remember::{remember, RememberRequest, RememberResult};
