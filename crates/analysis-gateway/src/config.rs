//! Configuration for the Analysis Gateway
//!
//! Loads configuration from environment variables. Only the provider API key
//! is mandatory.

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

use crate::gateway::{ModelSet, DEFAULT_FLASH_MODEL, DEFAULT_IMAGE_MODEL, DEFAULT_PRO_MODEL};
use crate::provider::{GeminiClient, DEFAULT_BASE_URL};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Provider API key
    pub api_key: String,

    /// Provider REST endpoint
    pub base_url: String,

    pub models: ModelSet,

    /// Per-request provider timeout
    pub provider_timeout_secs: u64,

    /// API server host
    pub api_host: String,

    /// API server port
    pub api_port: u16,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (for local development)
        dotenvy::dotenv().ok();

        let api_key = env::var("GEMINI_API_KEY")
            .or_else(|_| env::var("API_KEY"))
            .context("GEMINI_API_KEY (or API_KEY) must be set")?;

        let config = Config {
            api_key,

            base_url: env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),

            models: ModelSet {
                pro: env::var("ANALYSIS_MODEL_PRO")
                    .unwrap_or_else(|_| DEFAULT_PRO_MODEL.to_string()),
                flash: env::var("ANALYSIS_MODEL_FLASH")
                    .unwrap_or_else(|_| DEFAULT_FLASH_MODEL.to_string()),
                image: env::var("IMAGE_MODEL").unwrap_or_else(|_| DEFAULT_IMAGE_MODEL.to_string()),
            },

            provider_timeout_secs: env::var("PROVIDER_TIMEOUT_SECS")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .context("Invalid PROVIDER_TIMEOUT_SECS")?,

            api_host: env::var("GATEWAY_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),

            api_port: env::var("GATEWAY_PORT")
                .unwrap_or_else(|_| "8091".to_string())
                .parse()
                .context("Invalid GATEWAY_PORT")?,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            anyhow::bail!("GEMINI_API_KEY must not be empty");
        }

        if self.api_port == 0 {
            anyhow::bail!("GATEWAY_PORT must be greater than 0");
        }

        if self.provider_timeout_secs == 0 {
            anyhow::bail!("PROVIDER_TIMEOUT_SECS must be greater than 0");
        }

        Ok(())
    }

    /// Get the API server address
    pub fn api_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    /// Build the provider client
    pub fn provider(&self) -> Result<GeminiClient> {
        GeminiClient::new(&self.base_url, &self.api_key, self.provider_timeout())
            .context("Failed to create provider client")
    }
}
