pub mod cli;
pub mod core;
pub mod providers;

pub use crate::core::config;

use crate::core::config::AppConfig;
use crate::core::known::KnownEtfs;
use anyhow::Result;
use tracing::{debug, info};

/// Commands that need a loaded configuration.
pub enum AppCommand {
    Show {
        symbol: String,
        json: bool,
    },
    Compare {
        first: String,
        second: String,
        json: bool,
    },
    Popular,
}

fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    Ok(config)
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("etfscope starting...");
    let config = load_config(config_path)?;

    match command {
        AppCommand::Show { symbol, json } => {
            let search = providers::build_search(&config)?;
            cli::show::run(&search, &symbol, json).await
        }
        AppCommand::Compare {
            first,
            second,
            json,
        } => {
            let search = providers::build_search(&config)?;
            cli::compare::run(&search, &first, &second, json).await
        }
        AppCommand::Popular => {
            cli::popular::run(&KnownEtfs::with_extra(&config.known_etfs));
            Ok(())
        }
    }
}
