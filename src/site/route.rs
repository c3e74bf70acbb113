//! Page route - source to output path mapping.
//!
//! # Index folding
//!
//! A file named `Index` stands for its own directory; any other file `X`
//! becomes a directory `x/` holding an index. Every page therefore writes
//! exactly one `index.html`:
//!
//! | Source | Output | URL |
//! |--------|--------|-----|
//! | `Pages/Index.stencil` | `Output/index.html` | `/` |
//! | `Pages/About.stencil` | `Output/about/index.html` | `/about/` |
//! | `Pages/Articles/Index.md` | `Output/articles/index.html` | `/articles/` |
//! | `Pages/MyArticle/SubPage.stencil` | `Output/my-article/sub-page/index.html` | `/my-article/sub-page/` |
//!
//! Note that `Articles.stencil` and `Articles/Index.stencil` both land on
//! `/articles/`; catching that is the conflict detector's job.

use super::key::DottedKey;
use crate::{
    error::BuildError,
    filesystem::SourceFile,
    utils::slug::{slugify_segments, url_from_segments},
};
use std::{
    fmt,
    path::{Path, PathBuf},
};

/// Reserved base name of a directory's own page
pub const INDEX_NAME: &str = "Index";

/// The single file every page emits
pub const OUTPUT_FILE: &str = "index.html";

/// Source language of a page, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceType {
    Stencil,
    Markdown,
}

impl SourceType {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "stencil" => Some(Self::Stencil),
            "md" | "markdown" => Some(Self::Markdown),
            _ => None,
        }
    }

    pub const fn language(self) -> &'static str {
        match self {
            Self::Stencil => "stencil",
            Self::Markdown => "markdown",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.language())
    }
}

/// A discovered page with its derived output location.
#[derive(Debug, Clone)]
pub struct ResolvedPage {
    pub source: SourceFile,
    /// Tree key, e.g. `Articles.Index`
    pub source_key: DottedKey,
    /// Source path for messages, relative to the project root: `Pages/About.stencil`
    pub display_path: String,
    pub output_directory: PathBuf,
    /// Always `<output_directory>/index.html`
    pub output_path: PathBuf,
    /// `/` or `/a/b/`
    pub url_path: String,
    pub source_type: SourceType,
}

impl ResolvedPage {
    pub fn is_index(&self) -> bool {
        self.source.name == INDEX_NAME
    }

    /// Last URL segment, empty for the root page.
    pub fn slug(&self) -> &str {
        self.url_path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
    }
}

/// Resolve a page file found under `pages_root` to its output location under
/// `output_root`.
///
/// Pure: nothing is read or written.
pub fn resolve(
    file: SourceFile,
    pages_root: &Path,
    output_root: &Path,
) -> Result<ResolvedPage, BuildError> {
    let display_path = display_path(&file.path, pages_root);

    let source_type = SourceType::from_extension(&file.extension)
        .ok_or_else(|| BuildError::UnsupportedPageFile(display_path.clone()))?;

    let relative_source = file.path.strip_prefix(pages_root).map_err(|_| {
        BuildError::Internal(format!(
            "{} is not inside {}",
            file.path.display(),
            pages_root.display()
        ))
    })?;
    let source_key = DottedKey::from_relative_path(relative_source);

    // Index files stand for their directory, anything else gets its own
    let unslugged = if file.name == INDEX_NAME {
        file.directory.clone()
    } else {
        file.directory.join(&file.name)
    };
    let relative = unslugged.strip_prefix(pages_root).unwrap_or(Path::new(""));

    let segments = slugify_segments(relative);
    let output_directory = segments
        .iter()
        .fold(output_root.to_path_buf(), |dir, segment| dir.join(segment));
    let output_path = output_directory.join(OUTPUT_FILE);
    let url_path = url_from_segments(&segments);

    Ok(ResolvedPage {
        source: file,
        source_key,
        display_path,
        output_directory,
        output_path,
        url_path,
        source_type,
    })
}

/// Path relative to the directory holding `root`, with `/` separators:
/// `/site/Pages/About.stencil` → `Pages/About.stencil`.
pub fn display_path(path: &Path, root: &Path) -> String {
    let base = root.parent().unwrap_or(root);
    path.strip_prefix(base)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}
