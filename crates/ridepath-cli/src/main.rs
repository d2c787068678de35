//! `ridepath` - driver route tools for the ride backend

mod cli;
mod commands;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use ridepath_cache::FileStore;
use ridepath_client::HttpDriverApi;
use ridepath_core::{RidepathConfig, SystemClock};
use ridepath_driver::DriverServices;
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logger(cli.log_json);

    let config = load_config(cli.config.as_deref(), cli.api_url.clone())?;
    tracing::debug!("Using backend {}", config.api.base_url);

    let api = Arc::new(HttpDriverApi::new(&config.api).context("invalid API configuration")?);
    let store = Arc::new(FileStore::new(config.cache.dir.clone()));
    let services = DriverServices::new(api.clone(), api, store, Arc::new(SystemClock), config);

    commands::run(cli.command, &services).await
}

/// File, then environment, then flags
fn load_config(path: Option<&Path>, api_url: Option<String>) -> Result<RidepathConfig> {
    let config = match path {
        Some(path) => RidepathConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => RidepathConfig::default(),
    };
    let config = config.with_env_overrides().with_overrides(api_url, None);
    config.validate()?;
    Ok(config)
}
