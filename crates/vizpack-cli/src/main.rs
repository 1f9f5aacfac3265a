use clap::{Parser, Subcommand};
use std::process::ExitCode;
use vizpack::{
    commands::{
        build::{self, BuildArgs},
        config::{self, ConfigAction},
    },
    GlobalOpts,
};
use vizpack_config::Settings;
use vizpack_logger as logger;

#[derive(Parser)]
#[command(name = "vizpack")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Build configuration for custom visual projects",
    long_about = "vizpack prepares the bundler configuration for a custom visual: it picks the modern or legacy layout, keeps the platform API package in line with the manifest, and sets up the dev server."
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prepare a production build
    Build(BuildArgs),
    /// Prepare a development build with the dev server
    Start(BuildArgs),
    /// Show or change vizpack settings
    #[command(subcommand_required = false, arg_required_else_help = false)]
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logger::init_with_verbosity(cli.global.verbosity_level(), cli.global.no_stdout)
    {
        eprintln!("Warning: Failed to initialize logger: {}", e);
    }
    cli.global.init_tracing();

    let result = match &cli.command {
        Commands::Config { action } => config::handle_config(action.clone(), &cli.global),
        Commands::Build(args) | Commands::Start(args) => {
            let dev_mode = matches!(cli.command, Commands::Start(_));
            match Settings::load() {
                Ok(settings) => build::handle_build(args, dev_mode, &settings).await,
                Err(e) => Err(anyhow::anyhow!("Failed to load settings: {}", e)),
            }
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logger::error(&format!("{:#}", e));
            if logger::get_verbosity() > 0 {
                logger::show_log_path();
            }
            ExitCode::FAILURE
        }
    }
}
