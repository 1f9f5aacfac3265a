//! Keep the installed API package in line with the manifest
//!
//! One attempt per run, no retries. A package manager report of an
//! unmatched version is fatal; any other install failure is logged and
//! the run continues with whatever version is resolvable afterwards.

use super::package_manager::PackageManager;
use super::resolver::ModuleResolver;
use crate::errors::BuildError;
use std::path::Path;
use tracing::{debug, warn};
use vizpack_logger as logger;
use vizpack_manifest::{ApiPackageInfo, VisualManifest, API_PACKAGE_NAME};

const LATEST: &str = "latest";

fn no_matching_version(package: &str) -> String {
    format!("No matching version found for {}", package)
}

/// Specifier handed to the package manager for a required version
pub fn install_specifier(required: Option<&str>) -> String {
    match required {
        Some(version) => format!("~{}", version),
        None => LATEST.to_string(),
    }
}

pub struct ApiVersionReconciler<'a> {
    package_manager: &'a dyn PackageManager,
    resolver: &'a dyn ModuleResolver,
}

impl<'a> ApiVersionReconciler<'a> {
    pub fn new(package_manager: &'a dyn PackageManager, resolver: &'a dyn ModuleResolver) -> Self {
        Self {
            package_manager,
            resolver,
        }
    }

    async fn installed(&self, project_root: &Path) -> Option<ApiPackageInfo> {
        let package_dir = self.resolver.resolve(project_root, API_PACKAGE_NAME).await?;
        match ApiPackageInfo::load(&package_dir) {
            Ok(info) => Some(info),
            Err(e) => {
                warn!("Ignoring unreadable {}: {}", API_PACKAGE_NAME, e);
                None
            }
        }
    }

    /// Make sure the API package the manifest asks for is installed, and
    /// return what is installed once reconciliation is done
    pub async fn reconcile(
        &self,
        project_root: &Path,
        manifest: &VisualManifest,
    ) -> Result<Option<ApiPackageInfo>, BuildError> {
        let required = manifest.required_api_version();
        let installed = self.installed(project_root).await;

        let needs_install = match (&installed, required) {
            (None, _) => true,
            (Some(info), Some(version)) => info.version != version,
            (Some(_), None) => false,
        };

        if !needs_install {
            debug!(
                "{} {} satisfies {}",
                API_PACKAGE_NAME,
                installed.as_ref().map_or("", |i| i.version.as_str()),
                required.unwrap_or(LATEST)
            );
            return Ok(installed);
        }

        let specifier = install_specifier(required);
        logger::info(&format!(
            "Installing {}@{} (installed: {})",
            API_PACKAGE_NAME,
            specifier,
            installed.as_ref().map_or("none", |i| i.version.as_str())
        ));

        match self
            .package_manager
            .install(project_root, API_PACKAGE_NAME, &specifier)
            .await
        {
            Ok(_) => logger::success(&format!("Installed {}@{}", API_PACKAGE_NAME, specifier)),
            Err(e) if e.to_string().contains(&no_matching_version(API_PACKAGE_NAME)) => {
                return Err(BuildError::InvalidApiVersion(specifier));
            }
            Err(e) => {
                let err = BuildError::PackageInstall(e.to_string());
                logger::error(&err.to_string());
            }
        }

        Ok(self.installed(project_root).await)
    }
}
