//! Common types shared across commands

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vizpack_logger as logger;

/// Global CLI options available to all commands
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    #[arg(short, long, global = true, help = "Decrease verbosity")]
    pub quiet: bool,

    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v for debug, -vv for trace)"
    )]
    pub verbose: u8,

    #[arg(
        long,
        global = true,
        help = "Only write to the log file, nothing on the console"
    )]
    pub no_stdout: bool,

    #[arg(long, global = true, help = "Emit diagnostics as JSON lines")]
    pub log_json: bool,
}

impl GlobalOpts {
    /// Get the effective verbosity level
    /// - 0: quiet/warn only
    /// - 1: debug (-v)
    /// - 2: trace (-vv)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Default `tracing` filter for this verbosity
    pub fn tracing_filter(&self) -> &'static str {
        match self.verbosity_level() {
            0 => "vizpack=warn,vizpack_manifest=warn",
            1 => "vizpack=debug,vizpack_manifest=debug",
            _ => "vizpack=trace,vizpack_manifest=trace",
        }
    }

    /// Install the global `tracing` subscriber; `RUST_LOG` overrides the
    /// verbosity filter. Returns whether this call installed it.
    pub fn init_tracing(&self) -> bool {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.tracing_filter()));
        let registry = tracing_subscriber::registry().with(filter);
        let installed = if self.log_json {
            registry
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .try_init()
        } else {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .try_init()
        };
        match installed {
            Ok(()) => true,
            Err(e) => {
                logger::debug(&format!("Tracing subscriber not installed: {}", e));
                false
            }
        }
    }
}
