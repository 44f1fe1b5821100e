//! Data protocol server host.
//!
//! # Architecture Overview
//!
//! ```text
//!   config file + --set overrides
//!              │
//!              ▼
//!     ┌─────────────────┐        ┌──────────────────────────────────────┐
//!     │ ConfigSnapshot  │──────▶ │ extension::build                     │
//!     └─────────────────┘        │   disabled → Inert                   │
//!                                │   enabled  → Live(container)         │
//!                                │      1. sessions (StandardSessions)  │
//!                                │      2. socket-transport             │
//!                                └──────────────────┬───────────────────┘
//!                                                   │
//!                                                   ▼
//!                                ┌──────────────────────────────────────┐
//!                                │ host container                       │
//!                                │   start → wait for signal → stop     │
//!                                └──────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use data_protocol_server::config::{load_config, Settings};
use data_protocol_server::lifecycle::signals::wait_for_shutdown_signal;
use data_protocol_server::observability::logging::{init_logging, LogFormat};
use data_protocol_server::{
    build, EmbeddedDatabase, ExtensionDependencies, Lifecycle, LifecycleContainer, EXTENSION_NAME,
};

#[derive(Parser)]
#[command(name = "data-protocol-server")]
#[command(about = "Host process for the data protocol server extension", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override a setting, e.g. `--set experimental.ndp.enabled=true`.
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    overrides: Vec<(String, String)>,

    /// Name of the embedded database passed to the sessions.
    #[arg(long, default_value = "graph.db")]
    database: String,

    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the host and serve until interrupted (default)
    Run,
    /// Print known settings with defaults and descriptions
    Settings,
}

fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {:?}", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err("setting key is empty".to_string());
    }
    Ok((key.to_string(), value.trim().to_string()))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(Commands::Settings) = cli.command {
        println!("{}", serde_json::to_string_pretty(&Settings::describe())?);
        return Ok(());
    }

    init_logging(cli.log_format)?;
    tracing::info!("data-protocol-server v{} starting", env!("CARGO_PKG_VERSION"));

    let config = load_config(cli.config.as_deref(), cli.overrides)?;
    tracing::info!(settings = config.len(), "Configuration loaded");

    let dependencies = ExtensionDependencies::new(Arc::new(EmbeddedDatabase::new(cli.database)));
    let extension = build(&config, &dependencies)?;

    let mut host = LifecycleContainer::new("host");
    host.register(EXTENSION_NAME, Arc::new(extension))?;

    if let Err(e) = host.start().await {
        tracing::error!(error = %e, "Startup failed");
        return Err(e.into());
    }
    tracing::info!("Host started");

    wait_for_shutdown_signal().await;

    // Release failures are reported but never keep the process alive.
    if let Err(e) = host.stop().await {
        tracing::error!(error = %e, "Shutdown completed with errors");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
