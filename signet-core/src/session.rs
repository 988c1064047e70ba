//! Session candidate records (persisted) and continuity state (in-memory
//! only — see spec §3 "Ownership").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCandidateRecord {
    pub session_key: String,
    pub memory_id: String,
    pub score: f64,
    pub source: String,
    pub injected: bool,
    pub fts_hit: bool,
    pub created_at: DateTime<Utc>,
}

/// Bounded FIFO ring buffer used for recent query terms / remembers /
/// prompt snippets — mirrors the cap-and-drop-oldest shape named in
/// spec §4.K.
#[derive(Debug, Clone, Default)]
pub struct RingBuffer<T> {
    cap: usize,
    items: VecDeque<T>,
}

impl<T> RingBuffer<T> {
    pub fn new(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            items: VecDeque::with_capacity(cap),
        }
    }

    pub fn push(&mut self, item: T) {
        if self.items.len() >= self.cap {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.items.iter().cloned().collect()
    }
}

/// Truncate a string to at most `max_chars` characters (char-boundary safe).
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

/// Per-session continuity state. Lives only in the daemon process
/// (spec §3: "Continuity state is owned by the daemon process only
/// and lost on restart").
#[derive(Debug, Clone)]
pub struct ContinuityState {
    pub session_key: String,
    pub recent_query_terms: RingBuffer<String>,
    pub recent_remembers: RingBuffer<String>,
    pub recent_prompts: RingBuffer<String>,
    pub total_prompts: u64,
    pub prompts_since_checkpoint: u64,
    pub last_checkpoint_at: DateTime<Utc>,
}

pub const MAX_RECENT_QUERY_TERMS: usize = 20;
pub const MAX_RECENT_REMEMBERS: usize = 10;
pub const MAX_RECENT_PROMPTS: usize = 10;
pub const SNIPPET_MAX_CHARS: usize = 200;

impl ContinuityState {
    pub fn new(session_key: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            session_key: session_key.into(),
            recent_query_terms: RingBuffer::new(MAX_RECENT_QUERY_TERMS),
            recent_remembers: RingBuffer::new(MAX_RECENT_REMEMBERS),
            recent_prompts: RingBuffer::new(MAX_RECENT_PROMPTS),
            total_prompts: 0,
            prompts_since_checkpoint: 0,
            last_checkpoint_at: now,
        }
    }

    pub fn record_prompt(&mut self, snippet: &str) {
        self.recent_prompts
            .push(truncate_chars(snippet, SNIPPET_MAX_CHARS));
        self.total_prompts += 1;
        self.prompts_since_checkpoint += 1;
    }

    pub fn record_remember(&mut self, snippet: &str) {
        self.recent_remembers
            .push(truncate_chars(snippet, SNIPPET_MAX_CHARS));
    }

    pub fn record_query(&mut self, term: &str) {
        self.recent_query_terms
            .push(truncate_chars(term, SNIPPET_MAX_CHARS));
    }

    pub fn should_checkpoint(&self, now: DateTime<Utc>, time_interval_ms: i64, prompt_interval: u64) -> bool {
        let elapsed = (now - self.last_checkpoint_at).num_milliseconds();
        elapsed >= time_interval_ms || self.prompts_since_checkpoint >= prompt_interval
    }

    /// Snapshot and reset the interval counters atomically.
    pub fn consume(&mut self, now: DateTime<Utc>) -> ContinuitySnapshot {
        let snapshot = ContinuitySnapshot {
            session_key: self.session_key.clone(),
            recent_query_terms: self.recent_query_terms.to_vec(),
            recent_remembers: self.recent_remembers.to_vec(),
            recent_prompts: self.recent_prompts.to_vec(),
            total_prompts: self.total_prompts,
            prompts_since_checkpoint: self.prompts_since_checkpoint,
        };
        self.prompts_since_checkpoint = 0;
        self.last_checkpoint_at = now;
        snapshot
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContinuitySnapshot {
    pub session_key: String,
    pub recent_query_terms: Vec<String>,
    pub recent_remembers: Vec<String>,
    pub recent_prompts: Vec<String>,
    pub total_prompts: u64,
    pub prompts_since_checkpoint: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_buffer_drops_oldest() {
        let mut rb = RingBuffer::new(2);
        rb.push(1);
        rb.push(2);
        rb.push(3);
        assert_eq!(rb.to_vec(), vec![2, 3]);
    }

    #[test]
    fn checkpoint_fires_on_prompt_count() {
        let now = Utc::now();
        let mut state = ContinuityState::new("s1", now);
        for _ in 0..5 {
            state.record_prompt("hi");
        }
        assert!(state.should_checkpoint(now, 9_999_999, 5));
        assert!(!state.should_checkpoint(now, 9_999_999, 6));
    }
}
