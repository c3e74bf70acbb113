//! Filesystem capability consumed by the build.
//!
//! The build never touches `std::fs` directly: everything goes through
//! [`Filesystem`], so the pipeline can run against the real disk
//! ([`LocalFilesystem`]) or an in-memory tree in tests.
//!
//! # Operations
//!
//! | Method | Used by |
//! |--------|---------|
//! | `list_files` | page, component and config discovery |
//! | `exists` | directory checks, `make:*` commands |
//! | `create_directory` / `remove_directory` | output preparation |
//! | `write_file` | compiled pages, scaffolding |
//! | `copy_directory_contents` | assets |

#[cfg(test)]
pub mod memory;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::future::try_join_all;
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Files to ignore during directory traversal
pub const IGNORED_FILES: &[&str] = &[".DS_Store"];

/// Extensions whose contents are read during discovery: pages, components
/// and global config
pub const SOURCE_EXTENSIONS: &[&str] = &["stencil", "md", "markdown", "toml"];

/// One discovered source file. Immutable once read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Directory containing the file
    pub directory: PathBuf,
    /// File name without extension
    pub name: String,
    /// Full path (directory + file name)
    pub path: PathBuf,
    /// Extension without the leading dot (empty if none)
    pub extension: String,
    pub contents: String,
}

impl SourceFile {
    /// Split `path` into its parts and attach the contents.
    pub fn new(path: PathBuf, contents: String) -> Self {
        let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            directory,
            name,
            path,
            extension,
            contents,
        }
    }
}

/// Check whether a file should be skipped during discovery.
pub fn is_ignored(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_none_or(|name| IGNORED_FILES.contains(&name) || name.starts_with('.'))
}

#[async_trait]
pub trait Filesystem: Send + Sync {
    /// All files under `dir`, recursively, with their contents.
    ///
    /// Order is deterministic: depth-first, entries sorted by name. Only
    /// files with one of the [`SOURCE_EXTENSIONS`] are read; others are
    /// listed with empty contents so discovery can still reject or skip them.
    async fn list_files(&self, dir: &Path) -> Result<Vec<SourceFile>>;

    async fn exists(&self, path: &Path) -> bool;

    /// Create a directory and all missing parents.
    async fn create_directory(&self, path: &Path) -> Result<()>;

    /// Remove a directory recursively. Missing directories are not an error.
    async fn remove_directory(&self, path: &Path) -> Result<()>;

    async fn write_file(&self, path: &Path, contents: &str) -> Result<()>;

    /// Copy every file under `src` to the same relative location under `dst`.
    ///
    /// Returns the number of files copied.
    async fn copy_directory_contents(&self, src: &Path, dst: &Path) -> Result<usize>;
}

/// [`Filesystem`] backed by the local disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFilesystem;

impl LocalFilesystem {
    fn walk(dir: &Path) -> Vec<PathBuf> {
        WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(walkdir::DirEntry::into_path)
            .filter(|path| !is_ignored(path))
            .collect()
    }
}

#[async_trait]
impl Filesystem for LocalFilesystem {
    async fn list_files(&self, dir: &Path) -> Result<Vec<SourceFile>> {
        let reads = Self::walk(dir).into_iter().map(|path| async move {
            let is_source = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext));
            if !is_source {
                return Ok(SourceFile::new(path, String::new()));
            }

            let contents = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok::<_, anyhow::Error>(SourceFile::new(path, contents))
        });

        try_join_all(reads).await
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn create_directory(&self, path: &Path) -> Result<()> {
        tokio::fs::create_dir_all(path)
            .await
            .with_context(|| format!("Failed to create directory {}", path.display()))
    }

    async fn remove_directory(&self, path: &Path) -> Result<()> {
        match tokio::fs::remove_dir_all(path).await {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err)
                .with_context(|| format!("Failed to remove directory {}", path.display())),
            _ => Ok(()),
        }
    }

    async fn write_file(&self, path: &Path, contents: &str) -> Result<()> {
        tokio::fs::write(path, contents)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    async fn copy_directory_contents(&self, src: &Path, dst: &Path) -> Result<usize> {
        let files = Self::walk(src);

        for file in &files {
            let target = dst.join(file.strip_prefix(src)?);
            if let Some(parent) = target.parent() {
                self.create_directory(parent).await?;
            }
            tokio::fs::copy(file, &target)
                .await
                .with_context(|| format!("Failed to copy {}", file.display()))?;
        }

        Ok(files.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_source_file_parts() {
        let file = SourceFile::new(PathBuf::from("/site/Pages/Blog/First.stencil"), "x".into());
        assert_eq!(file.directory, PathBuf::from("/site/Pages/Blog"));
        assert_eq!(file.name, "First");
        assert_eq!(file.extension, "stencil");
        assert_eq!(file.contents, "x");
    }

    #[test]
    fn test_is_ignored() {
        assert!(is_ignored(Path::new("/a/.DS_Store")));
        assert!(is_ignored(Path::new("/a/.hidden.md")));
        assert!(!is_ignored(Path::new("/a/Index.stencil")));
    }

    #[tokio::test]
    async fn test_list_files_is_sorted_and_recursive() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("Blog")).unwrap();
        fs::write(dir.path().join("Index.stencil"), "home").unwrap();
        fs::write(dir.path().join("About.stencil"), "about").unwrap();
        fs::write(dir.path().join("Blog/First.md"), "first").unwrap();
        fs::write(dir.path().join(".DS_Store"), "").unwrap();

        let files = LocalFilesystem.list_files(dir.path()).await.unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();

        assert_eq!(names, vec!["About", "First", "Index"]);
        assert_eq!(files[1].contents, "first");
    }

    #[tokio::test]
    async fn test_binary_files_are_listed_unread() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("logo.png"), [0x89, b'P', b'N', b'G', 0xff, 0xfe]).unwrap();
        fs::write(dir.path().join("Index.stencil"), "home").unwrap();

        let files = LocalFilesystem.list_files(dir.path()).await.unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].name, "Index");
        assert_eq!(files[0].contents, "home");
        assert_eq!(files[1].extension, "png");
        assert!(files[1].contents.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_utf8_source_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Broken.stencil"), [0xff, 0xfe, 0xfd]).unwrap();

        let err = LocalFilesystem.list_files(dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("Broken.stencil"));
    }

    #[tokio::test]
    async fn test_remove_missing_directory_is_ok() {
        let dir = TempDir::new().unwrap();
        let result = LocalFilesystem.remove_directory(&dir.path().join("nope")).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_copy_directory_contents() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("Assets");
        let dst = dir.path().join("Output");
        fs::create_dir_all(src.join("css")).unwrap();
        fs::write(src.join("css/site.css"), "body {}").unwrap();
        fs::write(src.join("logo.svg"), "<svg/>").unwrap();

        let copied = LocalFilesystem.copy_directory_contents(&src, &dst).await.unwrap();

        assert_eq!(copied, 2);
        assert_eq!(fs::read_to_string(dst.join("css/site.css")).unwrap(), "body {}");
        assert!(dst.join("logo.svg").exists());
    }
}
