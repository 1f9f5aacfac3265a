//! External build steps for legacy-layout projects
//!
//! Legacy projects compile to one combined file before bundling. The
//! steps run in order: external scripts, TypeScript, stylesheet. Each
//! failure surfaces as [`BuildError::ExternalTool`] without retries.

use crate::errors::BuildError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::process::Command;
use tracing::debug;
use vizpack_config::{resolve_tool, ProjectPaths, ToolSettings};
use vizpack_logger as logger;
use vizpack_manifest::{CompilerConfig, VisualManifest};

pub const LEGACY_TSCONFIG: &str = "tsconfig.legacy.json";
const EXTERNAL_JS: &str = "externalJS";

#[async_trait]
pub trait LegacyToolchain: Send + Sync {
    /// Concatenate the manifest's external scripts into one file
    async fn bundle_external_js(
        &self,
        manifest: &VisualManifest,
        paths: &ProjectPaths,
    ) -> Result<(), BuildError>;

    /// Compile the sources plus the plugin-glue file
    async fn compile_scripts(
        &self,
        compiler: &CompilerConfig,
        paths: &ProjectPaths,
    ) -> Result<(), BuildError>;

    async fn compile_styles(
        &self,
        manifest: &VisualManifest,
        paths: &ProjectPaths,
    ) -> Result<(), BuildError>;
}

/// Runs `tsc` and `lessc` as child processes
#[derive(Debug, Clone)]
pub struct CommandToolchain {
    tools: ToolSettings,
}

fn tool_error(tool: &str, message: impl Into<String>) -> BuildError {
    BuildError::ExternalTool {
        tool: tool.to_string(),
        message: message.into(),
    }
}

impl CommandToolchain {
    pub fn new(tools: &ToolSettings) -> Self {
        Self {
            tools: tools.clone(),
        }
    }

    /// Project-local `node_modules/.bin` first, then PATH
    fn locate(root: &Path, tool: &str) -> Result<PathBuf, BuildError> {
        let local = root.join("node_modules").join(".bin").join(tool);
        if local.is_file() {
            return Ok(local);
        }
        resolve_tool(tool, None).map_err(|e| tool_error(tool, e.to_string()))
    }

    async fn run(tool: &str, program: &Path, args: &[&str], root: &Path) -> Result<(), BuildError> {
        let mut cmd = Command::new(program);
        cmd.args(args).current_dir(root);
        logger::debug(&format!("Running: {:?}", cmd));

        let output = match cmd.output().await {
            Ok(output) => output,
            Err(e) => {
                let message = format!("failed to launch {}: {}", program.display(), e);
                return Err(tool_error(tool, message));
            }
        };
        logger::capture_output(&format!("{} {}", tool, args.join(" ")), &output);

        if output.status.success() {
            return Ok(());
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = format!("{}\n{}", stdout.trim(), stderr.trim());
        Err(tool_error(
            tool,
            format!("exit code {:?}: {}", output.status.code(), detail.trim()),
        ))
    }
}

/// Compiler configuration for the legacy build, with paths made absolute
/// since it is written under the temp folder
pub fn legacy_compiler_config(compiler: &CompilerConfig, paths: &ProjectPaths) -> CompilerConfig {
    let mut config = compiler.clone();
    config.files = compiler
        .files
        .iter()
        .map(|f| paths.root.join(f).to_string_lossy().to_string())
        .collect();
    config
        .files
        .push(paths.plugin_file.to_string_lossy().to_string());
    if let Some(out) = &compiler.compiler_options.out {
        config.compiler_options.out = Some(paths.root.join(out).to_string_lossy().to_string());
    }
    config
}

#[async_trait]
impl LegacyToolchain for CommandToolchain {
    async fn bundle_external_js(
        &self,
        manifest: &VisualManifest,
        paths: &ProjectPaths,
    ) -> Result<(), BuildError> {
        let mut combined = String::new();
        for script in &manifest.external_js {
            let path = manifest.base_path().join(script);
            let content = match fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(e) => {
                    let message = format!("cannot read {}: {}", path.display(), e);
                    return Err(tool_error(EXTERNAL_JS, message));
                }
            };
            combined.push_str(&content);
            combined.push('\n');
        }
        fs::write(&paths.external_js, combined).await?;
        debug!(
            "Wrote {} external scripts to {}",
            manifest.external_js.len(),
            paths.external_js.display()
        );
        Ok(())
    }

    async fn compile_scripts(
        &self,
        compiler: &CompilerConfig,
        paths: &ProjectPaths,
    ) -> Result<(), BuildError> {
        let config = legacy_compiler_config(compiler, paths);
        let config_path = paths.tmp.join(LEGACY_TSCONFIG);
        fs::write(&config_path, serde_json::to_string_pretty(&config)?).await?;

        let tsc = Self::locate(&paths.root, &self.tools.tsc)?;
        let config_arg = config_path.to_string_lossy();
        logger::step("Compiling TypeScript");
        Self::run(&self.tools.tsc, &tsc, &["-p", &*config_arg], &paths.root).await
    }

    async fn compile_styles(
        &self,
        manifest: &VisualManifest,
        paths: &ProjectPaths,
    ) -> Result<(), BuildError> {
        let Some(style) = &manifest.style else {
            debug!("No stylesheet in manifest");
            return Ok(());
        };
        let source = manifest.base_path().join(style);
        let lessc = Self::locate(&paths.root, &self.tools.lessc)?;
        let source_arg = source.to_string_lossy();
        let target_arg = paths.css.to_string_lossy();
        logger::step("Compiling stylesheet");
        let args = [&*source_arg, &*target_arg];
        Self::run(&self.tools.lessc, &lessc, &args, &paths.root).await
    }
}
