//! Build orchestration
//!
//! [`BuildPipeline::prepare`] runs every step of a build in order on the
//! current task: load descriptors, prepare folders, branch on layout,
//! then assemble plugins, dev server and entry. The first failure ends
//! the run.

use crate::api::package_manager::PackageManager;
use crate::api::reconcile::ApiVersionReconciler;
use crate::api::resolver::ModuleResolver;
use crate::bundler::config::BundlerConfig;
use crate::bundler::plugins::append_plugins;
use crate::dev_server::{configure_dev_server, CertificateProvider};
use crate::entry::configure_entry;
use crate::errors::BuildError;
use crate::folders::prepare_folders;
use crate::legacy::LegacyToolchain;
use crate::options::{BuildOptions, TransformTarget};
use crate::plugin_config::{LayoutSource, PluginConfigAssembler, PluginConfiguration};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use vizpack_config::Settings;
use vizpack_logger as logger;
use vizpack_manifest::{load_dependencies, CompilerConfig, VisualManifest, API_PACKAGE_NAME};

pub const MANIFEST_FILE: &str = "pbiviz.json";
pub const COMPILER_CONFIG_FILE: &str = "tsconfig.json";

const LEGACY_ADVISORY: &str = "This project uses the legacy layout (compilerOptions.out). \
     Switch tsconfig.json to compilerOptions.outDir to build with modules.";

/// Where a project's descriptors live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFiles {
    pub root: PathBuf,
    pub manifest: PathBuf,
    pub compiler: PathBuf,
}

impl ProjectFiles {
    /// Default descriptor names inside `root`
    pub fn in_dir(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            manifest: root.join(MANIFEST_FILE),
            compiler: root.join(COMPILER_CONFIG_FILE),
        }
    }
}

/// Result of a run, ready to hand to the bundler
#[derive(Debug, Clone)]
pub struct PreparedBuild {
    pub bundler: BundlerConfig,
    /// `true` when the legacy layout was used
    pub legacy: bool,
    pub plugin_config: PluginConfiguration,
}

/// Mode, optimization, loader and target settings from the options
pub fn prepare_bundler(bundler: &mut BundlerConfig, options: &BuildOptions) {
    bundler.set_dev_mode(options.dev_mode());
    if options.minify {
        bundler.enable_optimization();
    }
    bundler.set_fast(options.fast);
    bundler.set_transform_target(options.target);
}

pub struct BuildPipeline<'a> {
    settings: &'a Settings,
    package_manager: &'a dyn PackageManager,
    resolver: &'a dyn ModuleResolver,
    certificates: &'a dyn CertificateProvider,
    toolchain: &'a dyn LegacyToolchain,
}

impl<'a> BuildPipeline<'a> {
    pub fn new(
        settings: &'a Settings,
        package_manager: &'a dyn PackageManager,
        resolver: &'a dyn ModuleResolver,
        certificates: &'a dyn CertificateProvider,
        toolchain: &'a dyn LegacyToolchain,
    ) -> Self {
        Self {
            settings,
            package_manager,
            resolver,
            certificates,
            toolchain,
        }
    }

    /// An owned base configuration for one run
    fn base_config(&self, root: &Path) -> Result<BundlerConfig, BuildError> {
        match &self.settings.build.base_config {
            Some(path) => BundlerConfig::load_base(&root.join(path)),
            None => Ok(BundlerConfig::default_base()),
        }
    }

    pub async fn prepare(
        &self,
        files: &ProjectFiles,
        options: &BuildOptions,
    ) -> Result<PreparedBuild, BuildError> {
        options.validate()?;

        let manifest = VisualManifest::load_from_path(&files.manifest)?;
        let compiler = CompilerConfig::load_from_path(&files.compiler)?;
        let dependencies = load_dependencies(&manifest)?;
        let capabilities = manifest.capabilities_path();

        let paths = self.settings.project_paths(&files.root);
        prepare_folders(&paths).await?;

        let mut bundler = self.base_config(&files.root)?;
        prepare_bundler(&mut bundler, options);

        let legacy = options
            .legacy
            .unwrap_or_else(|| compiler.layout().is_legacy());
        info!(
            "Preparing {} build for {}",
            if legacy { "legacy" } else { "modern" },
            manifest.visual.guid
        );

        let api = if legacy {
            logger::warn(LEGACY_ADVISORY);
            self.toolchain.bundle_external_js(&manifest, &paths).await?;
            self.toolchain.compile_scripts(&compiler, &paths).await?;
            self.toolchain.compile_styles(&manifest, &paths).await?;
            // Older loaders choke on the newer transform paths
            bundler.set_transform_target(TransformTarget::Es5);
            None
        } else {
            let reconciler = ApiVersionReconciler::new(self.package_manager, self.resolver);
            let info = reconciler
                .reconcile(&files.root, &manifest)
                .await?
                .ok_or_else(|| BuildError::ApiPackageUnavailable(API_PACKAGE_NAME.to_string()))?;
            Some(info)
        };

        let source = match &api {
            Some(info) => LayoutSource::Modern(info),
            None => LayoutSource::Legacy,
        };
        let plugin_config = PluginConfigAssembler::new(
            &manifest,
            &compiler,
            &dependencies,
            &self.settings.build,
            &paths,
        )
        .assemble(options, source)?;

        let stats = paths.stats_report(&self.settings.build.stats, options.dev_mode());
        append_plugins(&mut bundler, &plugin_config, &stats, &capabilities)?;

        configure_dev_server(
            &mut bundler,
            self.certificates,
            options.port,
            options.dev_mode(),
            &self.settings.server,
            &paths,
        )
        .await?;

        configure_entry(
            &mut bundler,
            &compiler,
            &manifest.visual.guid,
            options.dev_mode(),
            &paths,
        );

        debug!("Plugins: {:?}", bundler.plugin_names());
        Ok(PreparedBuild {
            bundler,
            legacy,
            plugin_config,
        })
    }
}
