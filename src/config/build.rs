//! `[build]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[build]` section in paper.toml - build pipeline configuration.
///
/// # Example
/// ```toml
/// [build]
/// jobs = 8          # Pages compiled at the same time
/// clean = true      # Remove Output/ before writing
/// progress = true   # Show the page counter
///
/// [build.assets]
/// enable = true
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Maximum number of concurrent page tasks.
    #[serde(default = "defaults::build::jobs")]
    #[educe(Default = defaults::build::jobs())]
    pub jobs: usize,

    /// Remove the output directory before writing.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub clean: bool,

    /// Show the in-place page counter.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub progress: bool,

    /// Asset copying.
    #[serde(default)]
    pub assets: AssetsConfig,
}

/// `[build.assets]` section.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct AssetsConfig {
    /// Copy `Assets/` into the output directory.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub enable: bool,
}
