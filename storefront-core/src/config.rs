//! Configuration management
//!
//! Settings live in `settings.json` in the shop directory:
//! ```json
//! {
//!   "api": { "baseUrl": "http://localhost:8080", "timeoutSecs": 30 }
//! }
//! ```
//! Fields this crate does not manage are preserved on save.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Environment override for the API base URL
pub const ENV_API_BASE_URL: &str = "SHOP_API_BASE_URL";
/// Environment override for the request timeout
pub const ENV_TIMEOUT_SECS: &str = "SHOP_TIMEOUT_SECS";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    api: ApiSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timeout_secs: Option<u64>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Storefront client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_base_url: String,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Load config from the shop directory
    ///
    /// Precedence: environment variables, then settings.json, then defaults.
    /// An unreadable settings file falls back to defaults.
    pub fn load(shop_dir: &Path) -> Result<Self> {
        let raw = read_settings(shop_dir)?;

        let api_base_url = std::env::var(ENV_API_BASE_URL)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or(raw.api.base_url)
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let timeout_secs = match std::env::var(ENV_TIMEOUT_SECS).ok() {
            Some(value) => parse_timeout(&value)?,
            None => match raw.api.timeout_secs {
                Some(0) => bail!("timeoutSecs in settings.json must be at least 1"),
                Some(secs) => secs,
                None => DEFAULT_TIMEOUT_SECS,
            },
        };

        Ok(Self {
            api_base_url,
            timeout_secs,
        })
    }

    /// Save config to the shop directory, preserving unmanaged settings
    pub fn save(&self, shop_dir: &Path) -> Result<()> {
        let mut settings = read_settings(shop_dir)?;

        settings.api.base_url = Some(self.api_base_url.clone());
        settings.api.timeout_secs = Some(self.timeout_secs);

        std::fs::create_dir_all(shop_dir)?;
        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(shop_dir.join("settings.json"), content)?;
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Timeout from the environment; zero would fail every request
fn parse_timeout(value: &str) -> Result<u64> {
    let secs: u64 = value
        .trim()
        .parse()
        .with_context(|| format!("{} must be a number of seconds", ENV_TIMEOUT_SECS))?;
    if secs == 0 {
        bail!("{} must be at least 1 second", ENV_TIMEOUT_SECS);
    }
    Ok(secs)
}

fn read_settings(shop_dir: &Path) -> Result<SettingsFile> {
    let settings_path = shop_dir.join("settings.json");
    if !settings_path.exists() {
        return Ok(SettingsFile::default());
    }
    let content = std::fs::read_to_string(&settings_path)
        .with_context(|| format!("Failed to read {}", settings_path.display()))?;
    Ok(serde_json::from_str(&content).unwrap_or_default())
}
