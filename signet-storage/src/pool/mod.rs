//! The pair of connections every storage handle is built from: a single
//! serialized writer and a pool of read-only connections beside it.

pub mod pragmas;
pub mod read_pool;
pub mod write_connection;

use std::path::{Path, PathBuf};

use signet_core::errors::SignetResult;

pub use read_pool::ReadPool;
pub use write_connection::WriteConnection;

pub struct ConnectionPool {
    pub writer: WriteConnection,
    pub readers: ReadPool,
    pub db_path: Option<PathBuf>,
}

impl ConnectionPool {
    pub fn open(path: &Path, read_pool_size: usize) -> SignetResult<Self> {
        Ok(Self {
            writer: WriteConnection::open(path)?,
            readers: ReadPool::open(path, read_pool_size)?,
            db_path: Some(path.to_path_buf()),
        })
    }

    /// In-memory writer and readers are distinct databases, so reads
    /// issued through `readers` here won't observe the writer's rows.
    /// Callers built this way should go through `writer` for reads too.
    pub fn open_in_memory(read_pool_size: usize) -> SignetResult<Self> {
        Ok(Self {
            writer: WriteConnection::open_in_memory()?,
            readers: ReadPool::open_in_memory(read_pool_size)?,
            db_path: None,
        })
    }
}
