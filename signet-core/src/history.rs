//! Append-only audit log entries for memory mutations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryEvent {
    Created,
    Updated,
    Deleted,
    Recovered,
    Merged,
    None,
}

impl HistoryEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            HistoryEvent::Created => "created",
            HistoryEvent::Updated => "updated",
            HistoryEvent::Deleted => "deleted",
            HistoryEvent::Recovered => "recovered",
            HistoryEvent::Merged => "merged",
            HistoryEvent::None => "none",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorType {
    Operator,
    Agent,
    Pipeline,
    Daemon,
    Harness,
}

impl ActorType {
    pub fn as_str(self) -> &'static str {
        match self {
            ActorType::Operator => "operator",
            ActorType::Agent => "agent",
            ActorType::Pipeline => "pipeline",
            ActorType::Daemon => "daemon",
            ActorType::Harness => "harness",
        }
    }
}

impl From<&str> for ActorType {
    fn from(s: &str) -> Self {
        match s {
            "operator" => ActorType::Operator,
            "pipeline" => ActorType::Pipeline,
            "daemon" => ActorType::Daemon,
            "harness" => ActorType::Harness,
            _ => ActorType::Agent,
        }
    }
}

/// Threaded through every transaction closure so history rows carry
/// who/what/why for the audit trail (spec §4.C).
#[derive(Debug, Clone)]
pub struct MutationContext {
    pub actor_type: ActorType,
    pub session_id: Option<String>,
    pub request_id: Option<String>,
}

impl MutationContext {
    pub fn new(actor_type: ActorType) -> Self {
        Self {
            actor_type,
            session_id: None,
            request_id: None,
        }
    }

    pub fn system() -> Self {
        Self::new(ActorType::Daemon)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryHistoryEvent {
    pub id: i64,
    pub memory_id: String,
    pub event: HistoryEvent,
    pub old_content: Option<String>,
    pub new_content: Option<String>,
    pub changed_by: Option<String>,
    pub reason: Option<String>,
    pub metadata: serde_json::Value,
    pub actor_type: ActorType,
    pub session_id: Option<String>,
    pub request_id: Option<String>,
    pub created_at: DateTime<Utc>,
}
