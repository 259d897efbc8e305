//! Environment-backed configuration for the bot process.
//!
//! All credentials come from the environment (optionally via a `.env` file
//! loaded in `main`). Required variables abort startup with a clear message
//! when missing; optional ones fall back to defaults.

use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::PathBuf;

/// Runtime configuration gathered from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram bot API token.
    pub telegram_token: String,
    /// AliExpress open-platform app key.
    pub aliexpress_key: String,
    /// AliExpress open-platform app secret, used to sign requests.
    pub aliexpress_secret: String,
    /// Affiliate tracking id attached to generated links.
    pub aliexpress_tracking_id: String,
    /// GitHub personal access token for the feed repository.
    pub git_token: String,
    /// GitHub repository in `owner/name` form.
    pub github_repository: String,
    /// Path of the RSS feed document, both locally and in the repository.
    pub rss_feed_path: String,
    /// Local directory for downloaded photos awaiting upload.
    pub cache_dir: PathBuf,
}

const DEFAULT_RSS_FEED_PATH: &str = "rss-feed_promo.xml";
const DEFAULT_CACHE_DIR: &str = "cache-promo";

impl Config {
    /// Read configuration from the environment, creating the cache
    /// directory if it does not exist yet.
    pub fn from_env() -> Result<Self> {
        let config = Self {
            telegram_token: require("TELEGRAM_API_TOKEN")?,
            aliexpress_key: require("ALIEXPRESS_KEY")?,
            aliexpress_secret: require("ALIEXPRESS_SECRET")?,
            aliexpress_tracking_id: require("ALIEXPRESS_TRACKING_ID")?,
            git_token: require("GIT_TOKEN")?,
            github_repository: require("GITHUB_REPOSITORY")?,
            rss_feed_path: env::var("RSS_FEED_PATH")
                .unwrap_or_else(|_| DEFAULT_RSS_FEED_PATH.to_string()),
            cache_dir: env::var("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CACHE_DIR)),
        };

        fs::create_dir_all(&config.cache_dir).with_context(|| {
            format!(
                "Failed to create cache directory {}",
                config.cache_dir.display()
            )
        })?;

        Ok(config)
    }
}

fn require(name: &str) -> Result<String> {
    env::var(name).with_context(|| format!("{name} must be set"))
}
