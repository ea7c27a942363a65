//! tablescope - read-only JSON browser for SQLite database files

use clap::Parser;
use std::process::ExitCode;
use tablescope::config::{merge_config_with_args, ConfigFile};
use tablescope::{BrowseError, FunctionRegistry, Result, ServeArgs, Server, ServerConfig};
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> ExitCode {
    if let Err(e) = run() {
        eprintln!("tablescope failed to start: {e}");
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn run() -> Result<()> {
    // Parse command-line arguments (before runtime creation)
    let mut args = ServeArgs::parse();

    // Load configuration file if specified or from the working directory
    let config_file = if let Some(ref path) = args.config {
        match ConfigFile::load(path) {
            Ok(config) => Some(config),
            Err(e) => {
                eprintln!("Error loading configuration file: {}", e);
                return Err(e);
            }
        }
    } else {
        ConfigFile::load_default()
    };

    // Merge config file values with CLI args (CLI takes precedence)
    if let Some(ref config) = config_file {
        args = merge_config_with_args(args, config);
    }

    let log_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(log_filter)
        .init();

    if config_file.is_some() {
        info!("Configuration loaded from file");
    }

    let config = match ServerConfig::from_args(args) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e);
        }
    };

    // Databases are opened and checked before the runtime starts
    let server = match Server::new(config, &FunctionRegistry::new()) {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, "Failed to open databases");
            return Err(e);
        }
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| BrowseError::Server(format!("Failed to create Tokio runtime: {}", e)))?;

    runtime.block_on(async {
        if let Err(e) = server.run().await {
            error!(error = %e, "Server error");
            return Err(e);
        }
        Ok(())
    })
}
