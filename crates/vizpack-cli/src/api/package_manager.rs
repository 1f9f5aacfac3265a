use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::process::Command;
use vizpack_config::resolve_tool;
use vizpack_logger as logger;

#[derive(Error, Debug)]
pub enum InstallError {
    #[error("Failed to launch package manager: {0}")]
    Launch(String),

    #[error("`{command}` failed (exit code {status:?}): {stderr}")]
    CommandFailed {
        command: String,
        status: Option<i32>,
        stderr: String,
    },
}

/// Text the package manager produced for a successful install
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallOutput {
    pub stdout: String,
    pub stderr: String,
}

#[async_trait]
pub trait PackageManager: Send + Sync {
    /// Install `package@specifier` into the project at `project_root`
    async fn install(
        &self,
        project_root: &Path,
        package: &str,
        specifier: &str,
    ) -> Result<InstallOutput, InstallError>;
}

/// Installs packages by running `npm install --save`
#[derive(Debug, Clone, Default)]
pub struct NpmPackageManager {
    npm_path: Option<String>,
}

impl NpmPackageManager {
    pub fn new(npm_path: Option<String>) -> Self {
        Self { npm_path }
    }

    fn npm(&self) -> Result<PathBuf, InstallError> {
        resolve_tool("npm", self.npm_path.as_deref())
            .map_err(|e| InstallError::Launch(e.to_string()))
    }
}

#[async_trait]
impl PackageManager for NpmPackageManager {
    async fn install(
        &self,
        project_root: &Path,
        package: &str,
        specifier: &str,
    ) -> Result<InstallOutput, InstallError> {
        let npm = self.npm()?;
        let target = format!("{}@{}", package, specifier);

        let mut cmd = Command::new(&npm);
        cmd.args(["install", "--save", target.as_str()])
            .current_dir(project_root);

        logger::debug(&format!("Running: {:?}", cmd));

        let output = cmd
            .output()
            .await
            .map_err(|e| InstallError::Launch(format!("{}: {}", npm.display(), e)))?;

        let command = format!("npm install --save {}", target);
        logger::capture_output(&command, &output);

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            return Err(InstallError::CommandFailed {
                command,
                status: output.status.code(),
                stderr,
            });
        }

        if !stdout.trim().is_empty() {
            logger::info(stdout.trim());
        }
        if !stderr.trim().is_empty() {
            logger::warn(stderr.trim());
        }

        Ok(InstallOutput { stdout, stderr })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_failure_message_keeps_stderr() {
        let err = InstallError::CommandFailed {
            command: "npm install --save powerbi-visuals-api@~9.9.9".to_string(),
            status: Some(1),
            stderr: "npm ERR! No matching version found for powerbi-visuals-api@~9.9.9"
                .to_string(),
        };
        assert!(err
            .to_string()
            .contains("No matching version found for powerbi-visuals-api"));
    }

    #[tokio::test]
    async fn test_missing_configured_npm_fails_to_launch() {
        let manager = NpmPackageManager::new(Some("/nonexistent/vizpack/npm".to_string()));
        let result = manager
            .install(Path::new("."), "powerbi-visuals-api", "latest")
            .await;
        assert!(matches!(result, Err(InstallError::Launch(_))));
    }
}
