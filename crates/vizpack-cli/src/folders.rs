//! Working directories and placeholder files

use crate::errors::BuildError;
use tokio::fs;
use tracing::debug;
use vizpack_config::ProjectPaths;

/// Create the working folders and an empty plugin-glue file. Existing
/// content is left alone, so this runs on every build.
pub async fn prepare_folders(paths: &ProjectPaths) -> Result<(), BuildError> {
    for dir in [
        &paths.tmp,
        &paths.precompile,
        &paths.drop,
        &paths.package_drop,
    ] {
        fs::create_dir_all(dir).await?;
    }

    if fs::metadata(&paths.plugin_file).await.is_err() {
        debug!("Creating placeholder {}", paths.plugin_file.display());
        fs::write(&paths.plugin_file, "").await?;
    }
    Ok(())
}
