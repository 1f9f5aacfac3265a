use crate::api::package_manager::NpmPackageManager;
use crate::api::resolver::NodeModulesResolver;
use crate::dev_server::FileCertificateProvider;
use crate::legacy::CommandToolchain;
use crate::options::{BuildOptions, TransformTarget};
use crate::pipeline::{BuildPipeline, PreparedBuild, ProjectFiles};
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};
use vizpack_config::Settings;
use vizpack_logger as logger;

pub const BUNDLER_CONFIG_FILE: &str = "bundler.config.json";

#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    /// Project directory
    #[arg(long, default_value = ".")]
    pub project: PathBuf,

    /// Manifest file (default: <project>/pbiviz.json)
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Compiler configuration (default: <project>/tsconfig.json)
    #[arg(long)]
    pub tsconfig: Option<PathBuf>,

    /// Dev server port (default: server-port setting)
    #[arg(long)]
    pub port: Option<u16>,

    /// Minify the bundle
    #[arg(long, conflicts_with = "no_minify")]
    pub minify: bool,

    /// Do not minify the bundle
    #[arg(long)]
    pub no_minify: bool,

    /// Package compression level (0-9)
    #[arg(long, default_value_t = 0)]
    pub compression: u8,

    /// Skip type checking
    #[arg(long)]
    pub fast: bool,

    /// Force the legacy layout
    #[arg(long, conflicts_with = "modern")]
    pub legacy: bool,

    /// Force the modern layout
    #[arg(long)]
    pub modern: bool,

    /// ECMAScript target for the TypeScript loader
    #[arg(long, value_enum, default_value_t = TransformTarget::Es2015)]
    pub target: TransformTarget,

    /// Do not generate string resources
    #[arg(long)]
    pub no_resources: bool,

    /// Do not generate the packaged visual
    #[arg(long)]
    pub no_pbiviz: bool,

    /// Where to write the bundler configuration (default: <tmp>/bundler.config.json)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl BuildArgs {
    /// Options for a run; `dev_mode` comes from the subcommand
    pub fn options(&self, dev_mode: bool) -> BuildOptions {
        let minify = if self.no_minify {
            false
        } else {
            self.minify || !dev_mode
        };
        let legacy = if self.legacy {
            Some(true)
        } else if self.modern {
            Some(false)
        } else {
            None
        };
        BuildOptions {
            dev_mode: Some(dev_mode),
            generate_resources: !self.no_resources,
            generate_pbiviz: !self.no_pbiviz,
            minify,
            compression: self.compression,
            port: self.port,
            fast: self.fast,
            legacy,
            target: self.target,
        }
    }

    pub fn project_files(&self, cwd: &Path) -> ProjectFiles {
        let root = cwd.join(&self.project);
        let mut files = ProjectFiles::in_dir(&root);
        if let Some(manifest) = &self.manifest {
            files.manifest = root.join(manifest);
        }
        if let Some(tsconfig) = &self.tsconfig {
            files.compiler = root.join(tsconfig);
        }
        files
    }
}

async fn write_config(prepared: &PreparedBuild, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = prepared.bundler.to_json_pretty()?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// `vizpack build` (dev mode off) and `vizpack start` (dev mode on)
pub async fn handle_build(args: &BuildArgs, dev_mode: bool, settings: &Settings) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let files = args.project_files(&cwd);
    let options = args.options(dev_mode);

    let package_manager = NpmPackageManager::new(settings.tools.npm_path.clone());
    let certificates = FileCertificateProvider::new(&settings.server);
    let toolchain = CommandToolchain::new(&settings.tools);
    let pipeline = BuildPipeline::new(
        settings,
        &package_manager,
        &NodeModulesResolver,
        &certificates,
        &toolchain,
    );

    logger::spinner_start("Preparing bundler configuration");
    let prepared = match pipeline.prepare(&files, &options).await {
        Ok(prepared) => prepared,
        Err(e) => {
            logger::spinner_error("Build preparation failed");
            return Err(e).with_context(|| format!("Cannot build {}", files.root.display()));
        }
    };

    let output = args.output.as_ref().map_or_else(
        || settings.project_paths(&files.root).tmp.join(BUNDLER_CONFIG_FILE),
        |p| cwd.join(p),
    );
    write_config(&prepared, &output).await?;

    let layout = if prepared.legacy { "legacy" } else { "modern" };
    logger::spinner_success(&format!(
        "{} layout, {} mode",
        layout,
        if dev_mode { "development" } else { "production" }
    ));
    println!("{} {}", "Bundler configuration:".bold(), output.display());
    Ok(())
}
