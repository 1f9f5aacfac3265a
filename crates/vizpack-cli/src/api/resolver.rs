use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

#[async_trait]
pub trait ModuleResolver: Send + Sync {
    /// Directory of the installed `package`, searching from `search_root`.
    /// `None` means not installed.
    async fn resolve(&self, search_root: &Path, package: &str) -> Option<PathBuf>;
}

/// Node-style lookup: `node_modules/<package>` in the search root and
/// each of its ancestors
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeModulesResolver;

#[async_trait]
impl ModuleResolver for NodeModulesResolver {
    async fn resolve(&self, search_root: &Path, package: &str) -> Option<PathBuf> {
        for dir in search_root.ancestors() {
            let candidate = dir.join("node_modules").join(package);
            if tokio::fs::metadata(candidate.join("package.json"))
                .await
                .is_ok_and(|m| m.is_file())
            {
                debug!("Resolved {} at {}", package, candidate.display());
                return Some(candidate);
            }
        }
        debug!("{} not found from {}", package, search_root.display());
        None
    }
}
