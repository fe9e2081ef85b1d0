//! Per-user remote item collection with a live change feed.

mod memory;
mod redis_store;

pub use self::memory::MemoryCloudStore;
pub use self::redis_store::RedisCloudStore;

use async_trait::async_trait;
use closet_common::{ClothingItem, Error, ItemId, ItemPatch, Result};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Remote document store holding one item collection per user.
#[async_trait]
pub trait CloudStore: Send + Sync {
    /// Open a live feed of the user's collection.
    ///
    /// The first delivery is the current collection; every later change to the
    /// collection produces a new full snapshot, newest item first.
    async fn subscribe_items(&self, uid: &str) -> Result<ItemSubscription>;

    /// Create (or overwrite) an item under its own id
    async fn create_item(&self, uid: &str, item: &ClothingItem) -> Result<()>;

    async fn update_item(&self, uid: &str, id: &ItemId, patch: &ItemPatch) -> Result<()>;
}

/// Receiving end of a collection feed. Dropping it stops the producer.
pub struct ItemSubscription {
    rx: mpsc::Receiver<Vec<ClothingItem>>,
    producer: Option<JoinHandle<()>>,
}

impl ItemSubscription {
    pub fn new(rx: mpsc::Receiver<Vec<ClothingItem>>, producer: JoinHandle<()>) -> Self {
        Self {
            rx,
            producer: Some(producer),
        }
    }

    /// Next full snapshot, or `None` once the feed has closed
    pub async fn next(&mut self) -> Option<Vec<ClothingItem>> {
        self.rx.recv().await
    }
}

impl Drop for ItemSubscription {
    fn drop(&mut self) {
        if let Some(producer) = self.producer.take() {
            producer.abort();
        }
    }
}

/// Connection settings for the cloud backend, supplied as a JSON blob.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudConfig {
    /// Backend endpoint (a `redis://` URL for the Redis store)
    pub url: String,

    /// Namespace isolating this deployment's collections
    pub project_id: String,
}

impl CloudConfig {
    pub fn parse(raw: &str) -> Result<Self> {
        let config: CloudConfig = serde_json::from_str(raw)
            .map_err(|e| Error::Config(format!("invalid cloud config: {}", e)))?;

        if config.url.trim().is_empty() {
            return Err(Error::Config("cloud config url is empty".to_string()));
        }
        if config.project_id.trim().is_empty() {
            return Err(Error::Config("cloud config projectId is empty".to_string()));
        }

        Ok(config)
    }
}

/// Sort a collection the way feeds deliver it: newest first
pub(crate) fn newest_first(items: &mut [ClothingItem]) {
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_parse() {
        let config =
            CloudConfig::parse(r#"{"url":"redis://127.0.0.1:6379","projectId":"closet"}"#).unwrap();
        assert_eq!(config.url, "redis://127.0.0.1:6379");
        assert_eq!(config.project_id, "closet");
    }

    #[test]
    fn test_malformed_config_is_a_config_error() {
        for raw in ["", "{", r#"{"url":"redis://x"}"#, r#"{"url":"","projectId":"p"}"#] {
            assert!(matches!(CloudConfig::parse(raw), Err(Error::Config(_))), "{raw}");
        }
    }
}
