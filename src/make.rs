//! `make:page` and `make:component` scaffolding.
//!
//! Both commands take a loose path and create an empty `.stencil` file at its
//! normalized location, refusing to overwrite anything:
//!
//! | Command | Input | Creates |
//! |---------|-------|---------|
//! | `make:page` | `blog/first-post` | `Pages/Blog/FirstPost.stencil` |
//! | `make:page` | `Blog/Drafts` | `Pages/Blog/Drafts.stencil` |
//! | `make:component` | `ui/Button` | `Components/ui/Button.stencil` |
//!
//! An all-lowercase page path is read as a URL and converted back to the
//! PascalCase source name.

use crate::{
    config::{COMPONENTS_DIR, PAGES_DIR, ProjectPaths},
    filesystem::Filesystem,
    log,
    site::component::COMPONENT_EXTENSION,
    utils::slug::pascal,
};
use anyhow::{Result, bail};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scaffold {
    Page,
    Component,
}

impl Scaffold {
    const fn directory(self) -> &'static str {
        match self {
            Self::Page => PAGES_DIR,
            Self::Component => COMPONENTS_DIR,
        }
    }
}

/// Project-relative path for `input`, with `/` separators.
pub fn normalize(input: &str, kind: Scaffold) -> String {
    let trimmed = input.trim().trim_matches('/');
    let suffix = format!(".{COMPONENT_EXTENSION}");
    let stem = trimmed.strip_suffix(suffix.as_str()).unwrap_or(trimmed);

    let stem = if kind == Scaffold::Page && stem == stem.to_lowercase() {
        stem.split('/').map(pascal).collect::<Vec<_>>().join("/")
    } else {
        stem.to_owned()
    };

    let directory = kind.directory();
    let prefixed = if stem.split('/').next() == Some(directory) {
        stem
    } else {
        format!("{directory}/{stem}")
    };

    format!("{prefixed}{suffix}")
}

/// Create the empty file. Returns its project-relative path.
pub async fn make(
    kind: Scaffold,
    input: &str,
    paths: &ProjectPaths,
    fs: &dyn Filesystem,
) -> Result<String> {
    if input.trim().trim_matches('/').is_empty() {
        bail!("Please provide a path where the new file should be created");
    }

    let relative = normalize(input, kind);
    let path = paths.root.join(&relative);

    if fs.exists(&path).await {
        bail!("'{relative}' already exists");
    }

    if let Some(parent) = path.parent() {
        fs.create_directory(parent).await?;
    }
    fs.write_file(&path, "").await?;

    log!("make"; "'{}' was created", relative);
    Ok(relative)
}
