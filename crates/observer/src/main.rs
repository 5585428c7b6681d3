//! CMOP Observer - MEDEVAC situational awareness agent

use clap::{Parser, Subcommand};
use cmop_common::Telemetry;
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{chat_command, init_command, observe_command, status_command, tools_command};

/// CMOP Observer - NATO MEDEVAC assistant for the Common Medical Operational Picture
#[derive(Parser)]
#[command(name = "cmop-observer")]
#[command(about = "◆ MEDEVAC situational awareness agent for the CMOP map")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Config file (default: ~/.cmop/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the config file
    Init,
    /// Run one autonomous analysis of the current picture
    Observe {
        /// Override the opening request
        #[arg(short, long)]
        prompt: Option<String>,
    },
    /// Ask questions about the picture interactively
    Chat,
    /// Print the tool schemas offered to the model
    Tools,
    /// Show effective settings
    Status,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cmop_config::resolve_path(cli.config);
    let telemetry = Telemetry::default();

    let result = match cli.command {
        Commands::Init => init_command(&config_path).await,
        Commands::Observe { prompt } => observe_command(&config_path, &telemetry, prompt).await,
        Commands::Chat => chat_command(&config_path, &telemetry).await,
        Commands::Tools => tools_command(&config_path, &telemetry).await,
        Commands::Status => status_command(&config_path).await,
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
