//! Bridges `notify`'s std-channel file events onto a `tokio::mpsc`
//! channel the markdown ingestion task can `.await` on, the same shape
//! as a blocking-callback-to-async-channel bridge for any other
//! native watcher API.

use std::path::{Path, PathBuf};

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

/// Spawns a blocking watcher thread rooted at `root` and returns a
/// channel of paths that were created or modified. The watcher itself
/// lives for as long as the returned `RecommendedWatcher` is held —
/// callers must keep it alive for the lifetime of the feed.
pub fn watch_markdown_dir(root: &Path) -> notify::Result<(RecommendedWatcher, mpsc::UnboundedReceiver<PathBuf>)> {
    let (tx, rx) = mpsc::unbounded_channel();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        let Ok(event) = res else { return };
        if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
            return;
        }
        for path in event.paths {
            if path.extension().and_then(|e| e.to_str()) == Some("md") {
                let _ = tx.send(path);
            }
        }
    })?;

    watcher.watch(root, RecursiveMode::Recursive)?;
    Ok((watcher, rx))
}
