// src/fs/mock.rs

//! In-memory [`FileSystem`] for tests.
//!
//! Only files are stored; a directory exists as long as some file lives
//! below it.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Result, anyhow};

use super::FileSystem;

#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: Arc<Mutex<BTreeMap<PathBuf, Vec<u8>>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        self.lock().insert(clean(path.as_ref()), content.into());
    }

    /// All stored file paths, sorted.
    pub fn file_paths(&self) -> Vec<PathBuf> {
        self.lock().keys().cloned().collect()
    }

    /// File paths below `dir`, relative to it, sorted.
    pub fn files_under(&self, dir: impl AsRef<Path>) -> Vec<PathBuf> {
        let dir = clean(dir.as_ref());
        self.lock()
            .keys()
            .filter_map(|p| p.strip_prefix(&dir).ok().map(Path::to_path_buf))
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<PathBuf, Vec<u8>>> {
        // A poisoned lock only means another test thread panicked.
        self.files.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Drop `.` components and trailing separators so lookups are stable.
fn clean(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

impl FileSystem for MockFileSystem {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        self.lock()
            .get(&clean(path))
            .cloned()
            .ok_or_else(|| anyhow!("File not found: {:?}", path))
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.add_file(path, contents);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.is_file(path) || self.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.lock().contains_key(&clean(path))
    }

    fn is_dir(&self, path: &Path) -> bool {
        let path = clean(path);
        self.lock()
            .keys()
            .any(|p| p != &path && p.starts_with(&path))
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        self.lock().remove(&clean(path));
        Ok(())
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        let path = clean(path);
        self.lock().retain(|p, _| !p.starts_with(&path));
        Ok(())
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let dir = clean(path);
        let files = self.lock();
        let children: BTreeSet<PathBuf> = files
            .keys()
            .filter_map(|p| {
                let rel = p.strip_prefix(&dir).ok()?;
                let first = rel.components().next()?;
                Some(dir.join(first))
            })
            .collect();

        if children.is_empty() {
            return Err(anyhow!("Not a directory or not found: {:?}", path));
        }
        Ok(children.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directories_are_implied_by_files() {
        let fs = MockFileSystem::new();
        fs.add_file("/site/_app/scripts/a.js", "a");
        fs.add_file("/site/_app/scripts/lib/b.js", "b");

        assert!(fs.is_dir(Path::new("/site/_app")));
        assert!(!fs.is_dir(Path::new("/site/_app/scripts/a.js")));
        assert_eq!(
            fs.read_dir(Path::new("/site/_app/scripts")).unwrap(),
            vec![
                PathBuf::from("/site/_app/scripts/a.js"),
                PathBuf::from("/site/_app/scripts/lib"),
            ]
        );
    }

    #[test]
    fn remove_dir_all_is_recursive_and_tolerates_missing() {
        let fs = MockFileSystem::new();
        fs.add_file("/site/_site/index.html", "x");
        fs.add_file("/site/_site/images/a.jpg", "x");
        fs.add_file("/site/_sitemap.xml", "x");

        fs.remove_dir_all(Path::new("/site/_site")).unwrap();
        fs.remove_dir_all(Path::new("/site/nothing")).unwrap();
        assert_eq!(fs.file_paths(), vec![PathBuf::from("/site/_sitemap.xml")]);
    }
}
