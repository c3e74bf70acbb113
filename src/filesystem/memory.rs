//! In-memory [`Filesystem`] for tests.

use super::{Filesystem, SourceFile, is_ignored};
use anyhow::{Result, bail};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
};

/// Files and directories kept in sorted maps.
///
/// `PathBuf` ordering is component-wise, so iterating the file map yields the
/// same depth-first, name-sorted order as walking a real directory.
#[derive(Debug, Default)]
pub struct MemoryFilesystem {
    files: Mutex<BTreeMap<PathBuf, String>>,
    directories: Mutex<BTreeSet<PathBuf>>,
    /// Every mutating call, in order: `"write /x"`, `"mkdir /x"`, `"rmdir /x"`
    journal: Mutex<Vec<String>>,
}

impl MemoryFilesystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder helper: add a file without journaling it.
    pub fn with_file(self, path: impl Into<PathBuf>, contents: &str) -> Self {
        let path = path.into();
        self.add_parents(&path);
        self.files.lock().insert(path, contents.to_owned());
        self
    }

    /// Builder helper: add an empty directory without journaling it.
    pub fn with_directory(self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.add_parents(&path);
        self.directories.lock().insert(path);
        self
    }

    pub fn read(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files.lock().get(path.as_ref()).cloned()
    }

    pub fn journal(&self) -> Vec<String> {
        self.journal.lock().clone()
    }

    fn add_parents(&self, path: &Path) {
        let mut directories = self.directories.lock();
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            directories.insert(ancestor.to_path_buf());
        }
    }

    fn record(&self, entry: String) {
        self.journal.lock().push(entry);
    }
}

#[async_trait]
impl Filesystem for MemoryFilesystem {
    async fn list_files(&self, dir: &Path) -> Result<Vec<SourceFile>> {
        Ok(self
            .files
            .lock()
            .iter()
            .filter(|(path, _)| path.starts_with(dir) && !is_ignored(path))
            .map(|(path, contents)| SourceFile::new(path.clone(), contents.clone()))
            .collect())
    }

    async fn exists(&self, path: &Path) -> bool {
        self.files.lock().contains_key(path) || self.directories.lock().contains(path)
    }

    async fn create_directory(&self, path: &Path) -> Result<()> {
        self.record(format!("mkdir {}", path.display()));
        self.add_parents(path);
        self.directories.lock().insert(path.to_path_buf());
        Ok(())
    }

    async fn remove_directory(&self, path: &Path) -> Result<()> {
        self.record(format!("rmdir {}", path.display()));
        self.files.lock().retain(|file, _| !file.starts_with(path));
        self.directories.lock().retain(|dir| !dir.starts_with(path));
        Ok(())
    }

    async fn write_file(&self, path: &Path, contents: &str) -> Result<()> {
        let parent_exists = path
            .parent()
            .is_none_or(|parent| self.directories.lock().contains(parent));
        if !parent_exists {
            bail!("No such directory: {}", path.display());
        }
        self.record(format!("write {}", path.display()));
        self.files.lock().insert(path.to_path_buf(), contents.to_owned());
        Ok(())
    }

    async fn copy_directory_contents(&self, src: &Path, dst: &Path) -> Result<usize> {
        let copies: Vec<(PathBuf, String)> = self
            .files
            .lock()
            .iter()
            .filter(|(path, _)| path.starts_with(src))
            .map(|(path, contents)| {
                let relative = path.strip_prefix(src).unwrap_or(path);
                (dst.join(relative), contents.clone())
            })
            .collect();

        for (target, contents) in &copies {
            self.record(format!("copy {}", target.display()));
            self.add_parents(target);
            self.files.lock().insert(target.clone(), contents.clone());
        }

        Ok(copies.len())
    }
}
