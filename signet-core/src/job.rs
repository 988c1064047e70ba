//! Extraction queue row (spec §3 "Memory job").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Leased,
    Done,
    Dead,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Leased => "leased",
            JobStatus::Done => "done",
            JobStatus::Dead => "dead",
        }
    }
}

impl From<&str> for JobStatus {
    fn from(s: &str) -> Self {
        match s {
            "leased" => JobStatus::Leased,
            "done" => JobStatus::Done,
            "dead" => JobStatus::Dead,
            _ => JobStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryJob {
    pub id: String,
    pub memory_id: String,
    pub job_type: String,
    pub status: JobStatus,
    pub attempts: u32,
    pub leased_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}
