//! Blob storage for the ledger
//!
//! The whole ledger lives in one serialized blob under a single key.

use ananse_common::{Error, Result};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::{debug, info};

/// Key-value backend holding the ledger blob
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read the blob stored under `key`, if any
    async fn load(&self, key: &str) -> Result<Option<String>>;

    /// Replace the blob stored under `key`
    async fn save(&self, key: &str, blob: &str) -> Result<()>;

    /// Remove the blob stored under `key`
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Redis-backed blob store
pub struct RedisBlobStore {
    conn: ConnectionManager,
}

impl RedisBlobStore {
    /// Create a new storage instance
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| Error::Persistence(format!("Failed to create Redis client: {}", e)))?;

        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| Error::Persistence(format!("Failed to connect to Redis: {}", e)))?;

        info!("Connected to Redis at {}", redis_url);

        Ok(Self { conn })
    }
}

fn redis_fault(err: redis::RedisError) -> Error {
    Error::Persistence(err.to_string())
}

#[async_trait]
impl BlobStore for RedisBlobStore {
    async fn load(&self, key: &str) -> Result<Option<String>> {
        // ConnectionManager is a cheap handle over one multiplexed connection
        let mut conn = self.conn.clone();
        let blob: Option<String> = conn.get(key).await.map_err(redis_fault)?;
        debug!("Loaded ledger blob {} (present: {})", key, blob.is_some());
        Ok(blob)
    }

    async fn save(&self, key: &str, blob: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(key, blob).await.map_err(redis_fault)?;
        debug!("Saved ledger blob {} ({} bytes)", key, blob.len());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await.map_err(redis_fault)?;
        info!("Deleted ledger blob {}", key);
        Ok(())
    }
}

/// In-process blob store for tests and demo runs
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, String>>,
    fail_writes: AtomicBool,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `blob` already stored under `key`
    pub fn with_blob(key: &str, blob: &str) -> Self {
        let store = Self::default();
        store.lock().insert(key.to_string(), blob.to_string());
        store
    }

    /// Make every subsequent `save`/`delete` fail with a persistence fault
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Current blob under `key`
    pub fn snapshot(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still a valid map
        self.blobs.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Persistence("memory store is read-only".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.snapshot(key))
    }

    async fn save(&self, key: &str, blob: &str) -> Result<()> {
        self.check_writable()?;
        self.lock().insert(key.to_string(), blob.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.check_writable()?;
        self.lock().remove(key);
        Ok(())
    }
}

#[async_trait]
impl<T: BlobStore + ?Sized> BlobStore for std::sync::Arc<T> {
    async fn load(&self, key: &str) -> Result<Option<String>> {
        (**self).load(key).await
    }

    async fn save(&self, key: &str, blob: &str) -> Result<()> {
        (**self).save(key, blob).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key).await
    }
}
