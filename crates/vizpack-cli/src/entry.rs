//! Entry points and output naming

use crate::bundler::config::{BundlerConfig, EntryPoint};
use tracing::debug;
use vizpack_config::ProjectPaths;
use vizpack_manifest::CompilerConfig;

pub const OUTPUT_FILE: &str = "visual.js";
const LIBRARY_TARGET: &str = "var";
const DEBUG_SUFFIX: &str = "_DEBUG";

/// Exported library name for the plugin-glue bundle
pub fn library_name(guid: &str, dev_mode: bool) -> String {
    if dev_mode {
        format!("{}{}", guid, DEBUG_SUFFIX)
    } else {
        guid.to_string()
    }
}

/// Set `entry`, `output` and the watch exclusion for the plugin-glue file
pub fn configure_entry(
    bundler: &mut BundlerConfig,
    compiler: &CompilerConfig,
    guid: &str,
    dev_mode: bool,
    paths: &ProjectPaths,
) {
    bundler.entry.clear();
    if let Some(out) = compiler.single_output() {
        bundler.entry.insert(
            OUTPUT_FILE.to_string(),
            EntryPoint::File(paths.root.join(out)),
        );
        bundler.output.library = None;
        bundler.output.library_target = None;
    } else {
        bundler.entry.insert(
            OUTPUT_FILE.to_string(),
            EntryPoint::Files(vec![paths.plugin_file.clone()]),
        );
        bundler.output.library = Some(library_name(guid, dev_mode));
        bundler.output.library_target = Some(LIBRARY_TARGET.to_string());
    }

    bundler.output.path = Some(paths.drop.clone());
    bundler.output.filename = Some(OUTPUT_FILE.to_string());

    let plugin_file = paths.plugin_file.to_string_lossy().to_string();
    if !bundler.watch_options.ignored.contains(&plugin_file) {
        bundler.watch_options.ignored.push(plugin_file);
    }

    debug!("Entry {:?}, output {:?}", bundler.entry, bundler.output);
}
