//! Row-level query helpers, one module per table family. Transaction
//! boundaries live in `signet_storage::tx`; these functions take a
//! bare `&Connection` and do one thing each.

pub mod entities;
pub mod history;
pub mod jobs;
pub mod maintenance;
pub mod memory_crud;
pub mod memory_search;
pub mod session;
pub mod vector_search;
