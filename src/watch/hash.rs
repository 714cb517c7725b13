// src/watch/hash.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::debug;

use crate::fs::FileSystem;

/// blake3 hex digest of a file's contents.
pub fn compute_file_hash(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    let bytes = fs.read(path)?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

/// Last seen content hash per watched file, kept in memory for the life of
/// the watcher.
#[derive(Debug, Default)]
pub struct ContentHashes {
    hashes: HashMap<PathBuf, String>,
}

impl ContentHashes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current content of `path` and report whether it differs
    /// from the last recorded one. Unreadable (e.g. deleted) files always
    /// count as changed.
    pub fn changed(&mut self, fs: &dyn FileSystem, path: &Path) -> bool {
        let hash = match compute_file_hash(fs, path) {
            Ok(h) => h,
            Err(err) => {
                debug!(path = ?path, error = %err, "cannot hash; treating as changed");
                self.hashes.remove(path);
                return true;
            }
        };

        match self.hashes.insert(path.to_path_buf(), hash.clone()) {
            Some(previous) if previous == hash => {
                debug!(path = ?path, "content unchanged");
                false
            }
            _ => true,
        }
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn only_content_changes_count() {
        let fs = MockFileSystem::new();
        let path = Path::new("/site/_app/styles/main.scss");
        fs.add_file(path, "body { margin: 0 }");

        let mut hashes = ContentHashes::new();
        assert!(hashes.changed(&fs, path));
        assert!(!hashes.changed(&fs, path));

        fs.add_file(path, "body { margin: 1px }");
        assert!(hashes.changed(&fs, path));
    }

    #[test]
    fn deleted_files_trigger_and_are_forgotten() {
        let fs = MockFileSystem::new();
        let path = Path::new("/site/_posts/a.md");
        fs.add_file(path, "# a");

        let mut hashes = ContentHashes::new();
        hashes.changed(&fs, path);
        fs.remove_file(path).unwrap();
        assert!(hashes.changed(&fs, path));
        assert!(hashes.is_empty());
    }
}
