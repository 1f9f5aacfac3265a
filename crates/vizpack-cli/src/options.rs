use crate::errors::BuildError;
use serde::Serialize;

/// Highest compression level accepted by the packager
pub const MAX_COMPRESSION: u8 = 9;

/// ECMAScript level the TypeScript loader emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TransformTarget {
    Es5,
    Es2015,
    Es2017,
}

impl TransformTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            TransformTarget::Es5 => "es5",
            TransformTarget::Es2015 => "es2015",
            TransformTarget::Es2017 => "es2017",
        }
    }
}

/// Per-run build options
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOptions {
    /// `None` is treated as dev mode
    pub dev_mode: Option<bool>,
    pub generate_resources: bool,
    pub generate_pbiviz: bool,
    pub minify: bool,
    pub compression: u8,
    /// Dev-server port; falls back to the configured default
    pub port: Option<u16>,
    /// Skip type checking in the TypeScript loader
    pub fast: bool,
    /// Force the legacy (`Some(true)`) or modern (`Some(false)`) branch
    pub legacy: Option<bool>,
    pub target: TransformTarget,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            dev_mode: None,
            generate_resources: false,
            generate_pbiviz: false,
            minify: true,
            compression: 0,
            port: None,
            fast: false,
            legacy: None,
            target: TransformTarget::Es2015,
        }
    }
}

impl BuildOptions {
    pub fn dev_mode(&self) -> bool {
        self.dev_mode.unwrap_or(true)
    }

    pub fn validate(&self) -> Result<(), BuildError> {
        if self.compression > MAX_COMPRESSION {
            return Err(BuildError::InvalidOption(format!(
                "compression level must be between 0 and {}, got {}",
                MAX_COMPRESSION, self.compression
            )));
        }
        Ok(())
    }
}
