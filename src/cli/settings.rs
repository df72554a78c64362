//! Environment-driven runtime settings.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;

/// Configuration read from the environment at `run` time.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Credential for the vision-language endpoint.
    pub vision_api_key: String,
    /// Override for the OpenAI-compatible endpoint base URL.
    pub vision_api_base: Option<String>,
    /// Override for the model fallback list (comma-separated).
    pub vision_models: Option<Vec<String>>,
    /// Browser user-data directory holding the user's logged-in profile.
    pub browser_user_data_dir: PathBuf,
    /// Profile name within the user-data directory.
    pub browser_profile: String,
    /// Dump every captured frame to the OS temp directory.
    pub debug_vision: bool,
    /// Override for the stubborn-click host allowlist (comma-separated).
    pub stubborn_hosts: Option<Vec<String>>,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let vision_api_key = std::env::var("VISION_API_KEY")
            .context("VISION_API_KEY is required to run a mission")?;

        let browser_user_data_dir: PathBuf = std::env::var("BROWSER_USER_DATA_DIR")
            .context("BROWSER_USER_DATA_DIR is required to drive the browser")?
            .into();
        if !browser_user_data_dir.exists() {
            bail!(
                "BROWSER_USER_DATA_DIR does not exist: {}",
                browser_user_data_dir.display()
            );
        }

        Ok(Self {
            vision_api_key,
            vision_api_base: std::env::var("VISION_API_BASE").ok(),
            vision_models: std::env::var("VISION_MODELS").ok().map(parse_list),
            browser_user_data_dir,
            browser_profile: std::env::var("BROWSER_PROFILE")
                .unwrap_or_else(|_| "Default".to_string()),
            debug_vision: flag_set("DEBUG_VISION"),
            stubborn_hosts: std::env::var("STUBBORN_CLICK_HOSTS").ok().map(parse_list),
        })
    }
}

fn parse_list(raw: String) -> Vec<String> {
    raw.split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn flag_set(name: &str) -> bool {
    std::env::var(name)
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}
