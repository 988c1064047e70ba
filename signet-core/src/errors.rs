//! Error taxonomy shared by every Signet crate.
//!
//! Subsystems raise their own `thiserror` enum; `SignetError` wraps them
//! behind one type so callers at the HTTP boundary need a single
//! `status_code()` match instead of one per crate.

use thiserror::Error;

pub type SignetResult<T> = Result<T, SignetError>;

/// Storage-layer errors (SQLite, migrations, pool).
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {message}")]
    Sqlite { message: String },

    #[error("migration failed at version {version}: {reason}")]
    MigrationFailed { version: u32, reason: String },

    #[error("failed to open database at {path}: {reason}")]
    OpenFailed { path: String, reason: String },

    #[error("connection pool exhausted")]
    PoolExhausted,
}

/// Retrieval pipeline errors.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("search failed: {reason}")]
    SearchFailed { reason: String },

    #[error("ranking failed: {reason}")]
    RankingFailed { reason: String },
}

/// Ingest pipeline errors.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("content is empty")]
    EmptyContent,

    #[error("content exceeds maximum length of {max} characters")]
    ContentTooLong { max: usize },
}

/// Extraction worker errors.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("extraction provider call failed: {reason}")]
    ProviderFailed { reason: String },

    #[error("extraction provider timed out")]
    Timeout,
}

/// Repair action errors.
#[derive(Debug, Error)]
pub enum RepairError {
    #[error("unknown repair action: {name}")]
    UnknownAction { name: String },
}

/// The top-level error type. Every public fallible operation returns
/// `SignetResult<T>` built on this enum.
#[derive(Debug, Error)]
pub enum SignetError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Worker(#[from] WorkerError),

    #[error(transparent)]
    Repair(#[from] RepairError),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("version conflict")]
    VersionConflict,

    #[error("duplicate content hash")]
    DuplicateContentHash,

    #[error("pinned memory requires force=true")]
    PinnedRequiresForce,

    #[error("autonomous actor forbidden from this mutation")]
    AutonomousForceDenied,

    #[error("retention window has expired")]
    RetentionExpired,

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("policy denied: {0}")]
    PolicyDenied(String),

    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// The stable error-kind tag exposed over HTTP, decoupled from the
/// Rust-side `Display` text so wire consumers can match on a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    NotFound,
    VersionConflict,
    DuplicateContentHash,
    PinnedRequiresForce,
    AutonomousForceDenied,
    RetentionExpired,
    RateLimited,
    PolicyDenied,
    ProviderUnavailable,
    InternalError,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::NotFound => "not_found",
            ErrorKind::VersionConflict => "version_conflict",
            ErrorKind::DuplicateContentHash => "duplicate_content_hash",
            ErrorKind::PinnedRequiresForce => "pinned_requires_force",
            ErrorKind::AutonomousForceDenied => "autonomous_force_denied",
            ErrorKind::RetentionExpired => "retention_expired",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::PolicyDenied => "policy_denied",
            ErrorKind::ProviderUnavailable => "provider_unavailable",
            ErrorKind::InternalError => "internal_error",
        }
    }

    /// HTTP status code per spec §7.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::VersionConflict => 409,
            ErrorKind::DuplicateContentHash => 409,
            ErrorKind::PinnedRequiresForce => 409,
            ErrorKind::AutonomousForceDenied => 403,
            ErrorKind::RetentionExpired => 410,
            ErrorKind::RateLimited => 429,
            ErrorKind::PolicyDenied => 403,
            ErrorKind::ProviderUnavailable => 503,
            ErrorKind::InternalError => 500,
        }
    }
}

impl SignetError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SignetError::Storage(_)
            | SignetError::Retrieval(_)
            | SignetError::Worker(_)
            | SignetError::Repair(_)
            | SignetError::Internal(_) => ErrorKind::InternalError,
            SignetError::Ingest(_) | SignetError::BadRequest(_) => ErrorKind::BadRequest,
            SignetError::NotFound(_) => ErrorKind::NotFound,
            SignetError::VersionConflict => ErrorKind::VersionConflict,
            SignetError::DuplicateContentHash => ErrorKind::DuplicateContentHash,
            SignetError::PinnedRequiresForce => ErrorKind::PinnedRequiresForce,
            SignetError::AutonomousForceDenied => ErrorKind::AutonomousForceDenied,
            SignetError::RetentionExpired => ErrorKind::RetentionExpired,
            SignetError::RateLimited(_) => ErrorKind::RateLimited,
            SignetError::PolicyDenied(_) => ErrorKind::PolicyDenied,
            SignetError::ProviderUnavailable(_) => ErrorKind::ProviderUnavailable,
        }
    }
}

pub fn to_storage_err(message: impl Into<String>) -> SignetError {
    SignetError::Storage(StorageError::Sqlite {
        message: message.into(),
    })
}
