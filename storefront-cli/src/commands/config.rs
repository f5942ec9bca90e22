//! Config command - show and change the API endpoint

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;

use storefront_core::adapters::HttpStorefront;
use storefront_core::config::{Config, ENV_API_BASE_URL, ENV_TIMEOUT_SECS};
use storefront_core::LogEvent;

use super::{get_logger, get_shop_dir, log_event};
use crate::output;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set the storefront API base URL
    SetUrl {
        /// Base URL, e.g. http://localhost:8080
        url: String,
        /// Request timeout in seconds
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        timeout: Option<u64>,
    },
}

pub fn run(command: ConfigCommands) -> Result<()> {
    let shop_dir = get_shop_dir()?;

    match command {
        ConfigCommands::Show { json } => {
            let config = Config::load(&shop_dir)?;
            let settings_path = shop_dir.join("settings.json");

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "api_base_url": config.api_base_url,
                        "timeout_secs": config.timeout_secs,
                        "shop_dir": shop_dir.to_string_lossy(),
                        "settings_path": settings_path.to_string_lossy(),
                    }))?
                );
                return Ok(());
            }

            println!("{}", "Configuration".bold());
            println!("  API base URL: {}", config.api_base_url);
            println!("  Timeout: {}s", config.timeout_secs);
            println!("  Shop directory: {}", shop_dir.display());
            println!("  Settings file: {}", settings_path.display());

            for var in [ENV_API_BASE_URL, ENV_TIMEOUT_SECS] {
                if std::env::var(var).is_ok() {
                    output::warning(&format!("{} is set and overrides the settings file", var));
                }
            }
        }
        ConfigCommands::SetUrl { url, timeout } => {
            let mut config = Config::load(&shop_dir)?;
            if let Some(timeout) = timeout {
                config.timeout_secs = timeout;
            }

            // Validate before saving
            let client = HttpStorefront::new(&url, config.timeout())?;
            config.api_base_url = client.base_url().as_str().trim_end_matches('/').to_string();

            config
                .save(&shop_dir)
                .with_context(|| format!("Failed to save settings in {}", shop_dir.display()))?;
            log_event(&get_logger(), LogEvent::new("config_updated").with_command("config set-url"));
            output::success(&format!("API base URL set to {}", config.api_base_url));
        }
    }

    Ok(())
}
