//! Dotted keys: the tree addressing scheme.
//!
//! A page's key is its source path relative to `Pages/`, extension stripped,
//! one segment per path component: `Pages/Blog/First.md` → `Blog.First`.
//! Segments are kept as a list and only joined with `.` for display, so a
//! source folder like `v1.2/` stays a single segment.

use std::{fmt, path::Path};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DottedKey(Vec<String>);

impl DottedKey {
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Split a dotted string. Empty segments are dropped.
    pub fn parse(dotted: &str) -> Self {
        Self(
            dotted
                .split('.')
                .filter(|segment| !segment.is_empty())
                .map(str::to_owned)
                .collect(),
        )
    }

    /// Key for a file path relative to the pages root: the extension of the
    /// last component is removed.
    pub fn from_relative_path(relative: &Path) -> Self {
        let mut segments: Vec<String> = relative
            .iter()
            .map(|part| part.to_string_lossy().into_owned())
            .collect();

        if let (Some(last), Some(stem)) = (segments.last_mut(), relative.file_stem()) {
            *last = stem.to_string_lossy().into_owned();
        }

        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// `Blog` + `Index` → `Blog.Index`
    pub fn child(&self, segment: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.to_owned());
        Self(segments)
    }

    /// `Index` prefixed with `Blog` → `Blog.Index`
    pub fn prefixed(&self, segment: &str) -> Self {
        let mut segments = Vec::with_capacity(self.0.len() + 1);
        segments.push(segment.to_owned());
        segments.extend(self.0.iter().cloned());
        Self(segments)
    }

    /// Whether `self` is a proper prefix of `other`.
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        self.0.len() < other.0.len() && other.0.starts_with(&self.0)
    }
}

impl From<&str> for DottedKey {
    fn from(segment: &str) -> Self {
        Self(vec![segment.to_owned()])
    }
}

impl fmt::Display for DottedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}
