//! Site configuration management for `paper.toml` and `Config/`.
//!
//! # Sources
//!
//! | Source          | Purpose                                        |
//! |-----------------|------------------------------------------------|
//! | `paper.toml`    | Build settings (`[build]`), optional           |
//! | CLI flags       | Override `paper.toml` (`--jobs`, `--no-clean`) |
//! | `Config/*.toml` | Global values for templates, as `$config.<Stem>` |
//!
//! # Example
//!
//! ```toml
//! [build]
//! jobs = 8
//! clean = true
//!
//! [build.assets]
//! enable = false
//! ```

mod build;
mod defaults;
mod error;
mod paths;

pub use build::BuildConfig;
pub use error::ConfigError;
pub use paths::{COMPONENTS_DIR, PAGES_DIR, ProjectPaths, resolve_root};

use crate::{cli::BuildArgs, filesystem::SourceFile, site::Attributes};
use educe::Educe;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fs, path::Path};

/// Build settings file at the project root
pub const CONFIG_FILE: &str = "paper.toml";

/// Extension of global config files under `Config/`
const GLOBAL_EXTENSION: &str = "toml";

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing paper.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Project directories (set after loading)
    #[serde(skip)]
    pub paths: ProjectPaths,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: SiteConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Load `paper.toml` under `root` if there is one, defaults otherwise.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let file = root.join(CONFIG_FILE);
        let mut config = if file.is_file() {
            Self::from_path(&file)?
        } else {
            Self::default()
        };
        config.paths = ProjectPaths::new(root);
        Ok(config)
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, args: &BuildArgs) {
        Self::update_option(&mut self.build.jobs, args.jobs.as_ref());
        if args.no_clean {
            self.build.clean = false;
        }
        if args.quiet {
            self.build.progress = false;
        }
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Validate configuration before a build
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.build.jobs == 0 {
            return Err(ConfigError::Validation(
                "[build.jobs] must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Global config
// ============================================================================

/// Parse every `Config/*.toml` file into one map keyed by file stem.
///
/// `Config/Site.toml` with `name = "Paper"` becomes `{ "Site": { "name": "Paper" } }`.
/// Other extensions are ignored.
pub fn load_globals(files: Vec<SourceFile>) -> Result<Attributes, ConfigError> {
    let mut globals = Attributes::new();

    for file in files.into_iter().filter(|f| f.extension == GLOBAL_EXTENSION) {
        let value: Value = toml::from_str(&file.contents)
            .map_err(|err| ConfigError::Global(file.name.clone(), err))?;
        globals.insert(file.name, value);
    }

    Ok(globals)
}

// ============================================================================
// Tests
// ============================================================================
