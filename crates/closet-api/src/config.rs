//! Configuration management for the Closet API
//!
//! Loads configuration from environment variables with sensible defaults.

use anyhow::{Context, Result};
use closet_backend::vision::DEFAULT_GEMINI_URL;
use closet_backend::CloudConfig;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

/// Which cloud store backs signed-in users
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudBackend {
    /// Signed-in users fall back to guest mode
    None,
    /// In-process store, lost on restart
    Memory,
    Redis,
}

impl FromStr for CloudBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(CloudBackend::None),
            "memory" => Ok(CloudBackend::Memory),
            "redis" => Ok(CloudBackend::Redis),
            other => anyhow::bail!("Unknown CLOUD_BACKEND: {}", other),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server host
    pub api_host: String,

    /// API server port
    pub api_port: u16,

    /// Directory holding the guest snapshots
    pub local_storage_dir: PathBuf,

    pub cloud_backend: CloudBackend,

    /// Raw cloud connection JSON (`{"url": ..., "projectId": ...}`)
    pub cloud_config: Option<String>,

    pub gemini_api_key: Option<String>,

    pub gemini_url: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (for local development)
        dotenvy::dotenv().ok();

        let config = Config {
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),

            api_port: env::var("API_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid API_PORT")?,

            local_storage_dir: env::var("LOCAL_STORAGE_DIR")
                .unwrap_or_else(|_| "./data/closet".to_string())
                .into(),

            cloud_backend: env::var("CLOUD_BACKEND")
                .unwrap_or_else(|_| "none".to_string())
                .parse()?,

            cloud_config: env::var("CLOUD_CONFIG").ok(),

            gemini_api_key: env::var("GEMINI_API_KEY").ok(),

            gemini_url: env::var("GEMINI_URL").unwrap_or_else(|_| DEFAULT_GEMINI_URL.to_string()),
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.api_port == 0 {
            anyhow::bail!("API_PORT must be greater than 0");
        }

        Ok(())
    }

    /// Get the API server address
    pub fn api_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }

    /// Parsed cloud connection settings.
    ///
    /// A missing or malformed CLOUD_CONFIG is logged and yields `None`, which
    /// leaves the service running in guest mode.
    pub fn cloud_settings(&self) -> Option<CloudConfig> {
        let Some(raw) = self.cloud_config.as_deref() else {
            warn!("CLOUD_CONFIG is not set");
            return None;
        };

        match CloudConfig::parse(raw) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!("Ignoring cloud configuration: {}", e);
                None
            }
        }
    }
}
