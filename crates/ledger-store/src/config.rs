//! Configuration management for the Violation Ledger Service
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::ledger::DEFAULT_LEDGER_KEY;
use crate::storage::{BlobStore, MemoryBlobStore, RedisBlobStore};
use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

/// Where the ledger blob is kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Redis,
    /// Process memory; the ledger is lost on exit
    Memory,
}

impl FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "redis" => Ok(Backend::Redis),
            "memory" => Ok(Backend::Memory),
            other => anyhow::bail!("Unknown LEDGER_BACKEND: {} (expected redis/memory)", other),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Redis connection URL
    pub redis_url: String,

    /// Key holding the ledger blob
    pub ledger_key: String,

    /// Storage backend
    pub backend: Backend,

    /// Seed bootstrap records into an empty ledger
    pub seed: bool,

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

        let config = Config {
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),

            ledger_key: env::var("LEDGER_KEY").unwrap_or_else(|_| DEFAULT_LEDGER_KEY.to_string()),

            backend: env::var("LEDGER_BACKEND")
                .unwrap_or_else(|_| "redis".to_string())
                .parse()?,

            seed: env::var("LEDGER_SEED")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .context("Invalid LEDGER_SEED (expected true/false)")?,

            api_host: env::var("LEDGER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),

            api_port: env::var("LEDGER_PORT")
                .unwrap_or_else(|_| "8090".to_string())
                .parse()
                .context("Invalid LEDGER_PORT")?,
        };

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.api_port == 0 {
            anyhow::bail!("LEDGER_PORT must be greater than 0");
        }

        if self.ledger_key.trim().is_empty() {
            anyhow::bail!("LEDGER_KEY must not be empty");
        }

        Ok(())
    }

    /// Get the API server address
    pub fn api_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }

    /// Connect the configured blob backend
    pub async fn open_backend(&self) -> Result<Box<dyn BlobStore>> {
        match self.backend {
            Backend::Redis => {
                let store = RedisBlobStore::new(&self.redis_url)
                    .await
                    .context("Failed to initialize Redis storage")?;
                Ok(Box::new(store))
            }
            Backend::Memory => {
                tracing::warn!("Using in-memory ledger backend; records will not survive restart");
                Ok(Box::new(MemoryBlobStore::new()))
            }
        }
    }
}
