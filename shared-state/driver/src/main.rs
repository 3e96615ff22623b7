// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

mod cli;
mod driver_config;
mod scenarios;

use clap::Parser;
use cli::{Cli, Command};
use driver_config::{ConfigError, DriverConfig};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    let shutdown = CancellationToken::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Ctrl+C received, shutting down");
            ctrl_c.cancel();
        }
    });

    match cli.command {
        Command::Store(args) => {
            let mut config = load_config(&cli.config);
            args.apply(&mut config);
            scenarios::run_store(config, shutdown).await
        }
        Command::Counter(args) => scenarios::run_counter(args).await,
        Command::RateLimit(args) => scenarios::run_rate_limit(args, shutdown).await,
        Command::FanIn(args) => scenarios::run_fan_in(args, shutdown).await,
    }
}

fn load_config(path: &std::path::Path) -> DriverConfig {
    match DriverConfig::load(path) {
        Ok(config) => {
            info!(path = %path.display(), "configuration loaded");
            config
        }
        Err(ConfigError::Io { .. }) => {
            info!("Using default configuration...");
            DriverConfig::default()
        }
        Err(e) => {
            warn!("{}; using default configuration", e);
            DriverConfig::default()
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
