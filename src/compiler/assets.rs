use crate::{config::ProjectPaths, filesystem::Filesystem, log};
use anyhow::{Context, Result};

/// Copy `Assets/` into the output directory, keeping relative paths.
///
/// A project without `Assets/` copies nothing.
pub async fn copy_assets(paths: &ProjectPaths, fs: &dyn Filesystem) -> Result<usize> {
    if !fs.exists(&paths.assets).await {
        return Ok(0);
    }

    let copied = fs
        .copy_directory_contents(&paths.assets, &paths.output)
        .await
        .with_context(|| format!("Failed to copy assets from {}", paths.assets.display()))?;

    log!("assets"; "copied {} files", copied);
    Ok(copied)
}
