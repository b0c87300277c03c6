use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Corrupt ledger blob: {0}")]
    CorruptLedger(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Ledger store is not initialized")]
    NotInitialized,

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
