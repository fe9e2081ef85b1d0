//! Redis-backed cloud store.
//!
//! Each user's collection is a hash `{project}:users:{uid}:items` mapping item
//! id to item JSON, next to a counter `{project}:users:{uid}:items:version`
//! bumped by every write. Feeds poll the counter and re-read the whole hash
//! when it moves.
//!
//! Partial updates run as `WATCH`/`MULTI` transactions on a dedicated
//! connection and retry when another writer touches the collection first.

use super::{newest_first, CloudConfig, CloudStore, ItemSubscription};
use anyhow::Context;
use async_trait::async_trait;
use closet_common::{ClothingItem, Error, ItemId, ItemPatch, Result};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, info, warn};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);
const MAX_UPDATE_ATTEMPTS: usize = 5;

pub struct RedisCloudStore {
    /// Opens the dedicated connections transactions need
    client: redis::Client,
    conn: ConnectionManager,
    namespace: String,
    poll_interval: Duration,
}

impl RedisCloudStore {
    /// Connect using a parsed cloud config
    pub async fn connect(config: &CloudConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str())
            .context("Failed to create Redis client")?;

        let conn = ConnectionManager::new(client.clone())
            .await
            .context("Failed to connect to Redis")?;

        info!(
            "Connected to cloud store at {} (project {})",
            config.url, config.project_id
        );

        Ok(Self {
            client,
            conn,
            namespace: config.project_id.clone(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    /// How often feeds check for changes
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn items_key(&self, uid: &str) -> String {
        format!("{}:users:{}:items", self.namespace, uid)
    }

    fn version_key(&self, uid: &str) -> String {
        format!("{}:version", self.items_key(uid))
    }

    fn write_pipeline(&self, uid: &str, item: &ClothingItem) -> Result<redis::Pipeline> {
        let json = serde_json::to_string(item)?;
        let mut pipe = redis::pipe();
        pipe.atomic()
            .hset(self.items_key(uid), item.id.as_str(), json)
            .ignore()
            .incr(self.version_key(uid), 1)
            .ignore();
        Ok(pipe)
    }

    async fn write_item(&self, uid: &str, item: &ClothingItem) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = self
            .write_pipeline(uid, item)?
            .query_async(&mut conn)
            .await
            .map_err(cloud_error)?;

        Ok(())
    }
}

fn cloud_error(e: redis::RedisError) -> Error {
    Error::Cloud(e.to_string())
}

async fn read_version(conn: &mut ConnectionManager, key: &str) -> Result<u64> {
    let version: Option<u64> = conn
        .get(key)
        .await
        .map_err(cloud_error)?;
    Ok(version.unwrap_or(0))
}

/// Read the whole collection, skipping entries that no longer decode
async fn fetch_items(conn: &mut ConnectionManager, key: &str) -> Result<Vec<ClothingItem>> {
    let values: Vec<String> = conn
        .hvals(key)
        .await
        .map_err(cloud_error)?;

    let mut items: Vec<ClothingItem> = values
        .iter()
        .filter_map(|raw| match serde_json::from_str(raw) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!("Skipping undecodable item in {}: {}", key, e);
                None
            }
        })
        .collect();

    newest_first(&mut items);
    Ok(items)
}

#[async_trait]
impl CloudStore for RedisCloudStore {
    async fn subscribe_items(&self, uid: &str) -> Result<ItemSubscription> {
        let items_key = self.items_key(uid);
        let version_key = self.version_key(uid);
        let poll_interval = self.poll_interval;

        let mut conn = self.conn.clone();
        let mut seen = read_version(&mut conn, &version_key).await?;
        let initial = fetch_items(&mut conn, &items_key).await?;

        let (tx, rx) = mpsc::channel(16);
        let producer = tokio::spawn(async move {
            if tx.send(initial).await.is_err() {
                return;
            }

            loop {
                sleep(poll_interval).await;

                let version = match read_version(&mut conn, &version_key).await {
                    Ok(version) => version,
                    Err(e) => {
                        // Keep polling; the connection manager reconnects
                        warn!("Failed to poll {}: {}", version_key, e);
                        continue;
                    }
                };
                if version == seen {
                    continue;
                }

                match fetch_items(&mut conn, &items_key).await {
                    Ok(items) => {
                        seen = version;
                        if tx.send(items).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("Failed to refresh {}: {}", items_key, e),
                }
            }

            debug!("Change feed for {} closed", items_key);
        });

        info!("Watching {} for changes", self.items_key(uid));
        Ok(ItemSubscription::new(rx, producer))
    }

    async fn create_item(&self, uid: &str, item: &ClothingItem) -> Result<()> {
        self.write_item(uid, item).await?;
        debug!("Created item {} for {}", item.id, uid);
        Ok(())
    }

    async fn update_item(&self, uid: &str, id: &ItemId, patch: &ItemPatch) -> Result<()> {
        let items_key = self.items_key(uid);
        let mut conn = self
            .client
            .get_async_connection()
            .await
            .map_err(cloud_error)?;

        for attempt in 1..=MAX_UPDATE_ATTEMPTS {
            let _: () = redis::cmd("WATCH")
                .arg(&items_key)
                .query_async(&mut conn)
                .await
                .map_err(cloud_error)?;

            let raw: Option<String> = conn
                .hget(&items_key, id.as_str())
                .await
                .map_err(cloud_error)?;

            let mut item: ClothingItem = match raw {
                Some(raw) => serde_json::from_str(&raw)?,
                None => {
                    let _: () = redis::cmd("UNWATCH")
                        .query_async(&mut conn)
                        .await
                        .map_err(cloud_error)?;
                    return Err(Error::ItemNotFound(id.clone()));
                }
            };

            item.apply(patch);

            // EXEC answers nil when the watched hash changed underneath us
            let committed: Option<()> = self
                .write_pipeline(uid, &item)?
                .query_async(&mut conn)
                .await
                .map_err(cloud_error)?;

            if committed.is_some() {
                debug!("Updated item {} for {}", id, uid);
                return Ok(());
            }
            debug!(
                "Update of {} raced another write, retrying ({}/{})",
                id, attempt, MAX_UPDATE_ATTEMPTS
            );
        }

        Err(Error::Cloud(format!(
            "item {} kept changing, gave up after {} attempts",
            id, MAX_UPDATE_ATTEMPTS
        )))
    }
}
