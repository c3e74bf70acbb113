//! Project directory layout.
//!
//! Every project has the same shape; only the root moves:
//!
//! ```text
//! <root>/
//!   ├── Pages/        page sources        (required)
//!   ├── Components/   component sources   (required)
//!   ├── Assets/       copied verbatim     (optional)
//!   ├── Config/       global *.toml       (optional)
//!   ├── Output/       build result
//!   └── paper.toml    build settings      (optional)
//! ```

use std::path::{Path, PathBuf};

pub const PAGES_DIR: &str = "Pages";
pub const COMPONENTS_DIR: &str = "Components";
pub const ASSETS_DIR: &str = "Assets";
pub const CONFIG_DIR: &str = "Config";
pub const OUTPUT_DIR: &str = "Output";

/// Absolute project directories, resolved once against the root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub pages: PathBuf,
    pub components: PathBuf,
    pub assets: PathBuf,
    pub config: PathBuf,
    pub output: PathBuf,
}

impl ProjectPaths {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            pages: root.join(PAGES_DIR),
            components: root.join(COMPONENTS_DIR),
            assets: root.join(ASSETS_DIR),
            config: root.join(CONFIG_DIR),
            output: root.join(OUTPUT_DIR),
        }
    }
}

/// Project root from `--root` (tilde-expanded) or the current directory,
/// made absolute.
pub fn resolve_root(cli_root: Option<&Path>) -> PathBuf {
    let root = match cli_root {
        Some(path) => PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned()),
        None => PathBuf::from("./"),
    };
    normalize_path(&root)
}

/// Normalize a path to absolute, using canonicalize if the path exists
fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        // For non-existent paths, manually make them absolute
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        }
    })
}
