// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling the site's watch rules (globs → task) from the path table.
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//! - Optionally suppressing triggers for files whose content did not change.
//!
//! It does not know about the task graph; it only turns filesystem changes
//! into task-level triggers for the runtime.

pub mod event_handler;
pub mod hash;
pub mod patterns;
pub mod watcher;

pub use event_handler::ChangeProcessor;
pub use hash::{ContentHashes, compute_file_hash};
pub use patterns::{WatchRule, build_watch_rules, tasks_for_path};
pub use watcher::{WatcherHandle, spawn_watcher};
