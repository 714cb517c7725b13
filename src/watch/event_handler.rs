// src/watch/event_handler.rs

//! Turns a changed path into task triggers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::engine::{RuntimeEvent, TaskName, TriggerReason};
use crate::fs::FileSystem;
use crate::watch::hash::ContentHashes;
use crate::watch::patterns::{WatchRule, tasks_for_path};

/// State owned by the watcher's event loop.
#[derive(Debug)]
pub struct ChangeProcessor {
    root: PathBuf,
    rules: Vec<WatchRule>,
    fs: Arc<dyn FileSystem>,
    hashes: Option<ContentHashes>,
}

impl ChangeProcessor {
    /// `use_hash` enables content-hash suppression of unchanged files.
    pub fn new(root: PathBuf, rules: Vec<WatchRule>, fs: Arc<dyn FileSystem>, use_hash: bool) -> Self {
        Self {
            root,
            rules,
            fs,
            hashes: use_hash.then(ContentHashes::new),
        }
    }

    /// Tasks to trigger for a change to `path` (absolute or root-relative).
    pub fn triggers_for(&mut self, path: &Path) -> Vec<TaskName> {
        let Some(rel) = relativize(&self.root, path) else {
            debug!(path = ?path, root = ?self.root, "change outside the watch root");
            return Vec::new();
        };

        let tasks = tasks_for_path(&self.rules, &rel);
        if tasks.is_empty() {
            return tasks;
        }

        if let Some(hashes) = self.hashes.as_mut() {
            let abs = self.root.join(&rel);
            if !hashes.changed(self.fs.as_ref(), &abs) {
                debug!(path = %rel, "content unchanged; not triggering");
                return Vec::new();
            }
        }

        debug!(path = %rel, ?tasks, "watch match");
        tasks
    }

    /// Send triggers for `path`. Returns `false` once the runtime is gone.
    pub async fn process(&mut self, path: &Path, runtime_tx: &mpsc::Sender<RuntimeEvent>) -> bool {
        for task in self.triggers_for(path) {
            let event = RuntimeEvent::TaskTriggered {
                task,
                reason: TriggerReason::FileWatch,
            };
            if let Err(err) = runtime_tx.send(event).await {
                warn!("failed to send RuntimeEvent::TaskTriggered: {err}");
                return false;
            }
        }
        true
    }
}

/// `/`-separated path of `path` relative to `root`.
///
/// Watchers may report paths through a different spelling of the root (for
/// example a symlinked temp dir), so the parent is canonicalized as a
/// fallback.
pub fn relativize(root: &Path, path: &Path) -> Option<String> {
    let rel = if path.is_relative() {
        path.to_path_buf()
    } else if let Ok(rel) = path.strip_prefix(root) {
        rel.to_path_buf()
    } else {
        let parent = path.parent()?.canonicalize().ok()?;
        let joined = parent.join(path.file_name()?);
        joined.strip_prefix(root).ok()?.to_path_buf()
    };
    let rel = rel.to_string_lossy().replace('\\', "/");
    (!rel.is_empty()).then_some(rel)
}
