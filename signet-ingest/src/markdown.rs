//! Markdown ingestion feed (spec §4.L): header-level chunking with a
//! paragraph sub-split above the configured target size, and an
//! in-memory path→hash map so re-scanning an unchanged file is a no-op.

use std::collections::HashMap;
use std::path::PathBuf;

use signet_core::memory::{content_hash, normalize_content};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownChunk {
    pub heading: Option<String>,
    pub body: String,
}

/// Split markdown into chunks at `#`-level headers, then sub-split any
/// chunk whose body exceeds `chunk_target_chars` on paragraph
/// boundaries (blank lines).
pub fn chunk_markdown(content: &str, chunk_target_chars: usize) -> Vec<MarkdownChunk> {
    let mut chunks = Vec::new();
    let mut current_heading: Option<String> = None;
    let mut current_body = String::new();

    for line in content.lines() {
        if line.starts_with('#') {
            if !current_body.trim().is_empty() {
                chunks.push(MarkdownChunk { heading: current_heading.clone(), body: current_body.trim().to_string() });
            }
            current_heading = Some(line.trim_start_matches('#').trim().to_string());
            current_body.clear();
        } else {
            current_body.push_str(line);
            current_body.push('\n');
        }
    }
    if !current_body.trim().is_empty() {
        chunks.push(MarkdownChunk { heading: current_heading, body: current_body.trim().to_string() });
    }

    chunks.into_iter().flat_map(|c| split_oversized(c, chunk_target_chars)).collect()
}

fn split_oversized(chunk: MarkdownChunk, target: usize) -> Vec<MarkdownChunk> {
    if chunk.body.len() <= target {
        return vec![chunk];
    }
    let mut out = Vec::new();
    let mut buf = String::new();
    for paragraph in chunk.body.split("\n\n") {
        if !buf.is_empty() && buf.len() + paragraph.len() > target {
            out.push(MarkdownChunk { heading: chunk.heading.clone(), body: buf.trim().to_string() });
            buf.clear();
        }
        buf.push_str(paragraph);
        buf.push_str("\n\n");
    }
    if !buf.trim().is_empty() {
        out.push(MarkdownChunk { heading: chunk.heading.clone(), body: buf.trim().to_string() });
    }
    if out.is_empty() {
        out.push(chunk);
    }
    out
}

/// Tracks which content hash was last ingested per file path so a
/// re-scan of an unchanged file does nothing.
#[derive(Debug, Default)]
pub struct IngestionFeed {
    seen: HashMap<PathBuf, String>,
}

impl IngestionFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the chunks that are new or changed since the last scan
    /// of this path, or `None` if the whole file is unchanged.
    pub fn scan(&mut self, path: &PathBuf, content: &str, chunk_target_chars: usize) -> Option<Vec<MarkdownChunk>> {
        let hash = content_hash(&normalize_content(content));
        if self.seen.get(path) == Some(&hash) {
            return None;
        }
        self.seen.insert(path.clone(), hash);
        Some(chunk_markdown(content, chunk_target_chars))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_header_boundaries() {
        let md = "# Title\nintro\n\n## Section\nbody text";
        let chunks = chunk_markdown(md, 10_000);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].heading.as_deref(), Some("Title"));
        assert_eq!(chunks[1].heading.as_deref(), Some("Section"));
    }

    #[test]
    fn sub_splits_oversized_chunks_on_paragraph_boundaries() {
        let para = "word ".repeat(50);
        let md = format!("# Big\n{para}\n\n{para}\n\n{para}");
        let chunks = chunk_markdown(&md, 200);
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert_eq!(c.heading.as_deref(), Some("Big"));
        }
    }

    #[test]
    fn rescan_of_unchanged_file_returns_none() {
        let mut feed = IngestionFeed::new();
        let path = PathBuf::from("/tmp/notes.md");
        let content = "# Notes\nhello world";
        assert!(feed.scan(&path, content, 2000).is_some());
        assert!(feed.scan(&path, content, 2000).is_none());
        assert!(feed.scan(&path, "# Notes\nchanged", 2000).is_some());
    }
}
