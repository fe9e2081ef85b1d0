//! In-process cloud store for tests and local development.

use super::{newest_first, CloudStore, ItemSubscription};
use async_trait::async_trait;
use closet_common::{ClothingItem, Error, ItemId, ItemPatch, Result};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, Mutex};
use tracing::{debug, info};

/// Mock cloud store keeping every collection in memory.
///
/// Change notifications can be held back with [`MemoryCloudStore::hold_echoes`]
/// to observe the window between a write and its redelivery.
#[derive(Clone)]
pub struct MemoryCloudStore {
    inner: Arc<Inner>,
}

struct Inner {
    collections: Mutex<HashMap<String, HashMap<ItemId, ClothingItem>>>,
    changes: broadcast::Sender<String>,
    held: Mutex<Option<Vec<String>>>,
    rejected: Mutex<HashSet<ItemId>>,
}

impl Inner {
    async fn snapshot(&self, uid: &str) -> Vec<ClothingItem> {
        let collections = self.collections.lock().await;
        let mut items: Vec<ClothingItem> = collections
            .get(uid)
            .map(|c| c.values().cloned().collect())
            .unwrap_or_default();
        newest_first(&mut items);
        items
    }

    async fn notify(&self, uid: &str) {
        let mut held = self.held.lock().await;
        match held.as_mut() {
            Some(queue) => queue.push(uid.to_string()),
            None => {
                // No live subscribers is fine
                let _ = self.changes.send(uid.to_string());
            }
        }
    }
}

impl MemoryCloudStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(64);
        info!("Using in-memory cloud store");
        Self {
            inner: Arc::new(Inner {
                collections: Mutex::new(HashMap::new()),
                changes,
                held: Mutex::new(None),
                rejected: Mutex::new(HashSet::new()),
            }),
        }
    }

    /// Current collection of a user, newest first
    pub async fn items(&self, uid: &str) -> Vec<ClothingItem> {
        self.inner.snapshot(uid).await
    }

    /// Queue change notifications instead of delivering them
    pub async fn hold_echoes(&self) {
        let mut held = self.inner.held.lock().await;
        if held.is_none() {
            *held = Some(Vec::new());
        }
    }

    /// Deliver queued notifications and resume immediate delivery
    pub async fn release_echoes(&self) {
        let queued = self.inner.held.lock().await.take().unwrap_or_default();
        for uid in queued {
            let _ = self.inner.changes.send(uid);
        }
    }

    /// Make every create of `id` fail
    pub async fn reject_item(&self, id: ItemId) {
        self.inner.rejected.lock().await.insert(id);
    }
}

impl Default for MemoryCloudStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CloudStore for MemoryCloudStore {
    async fn subscribe_items(&self, uid: &str) -> Result<ItemSubscription> {
        // Subscribe before reading so no change slips between the two
        let mut changes = self.inner.changes.subscribe();
        let initial = self.inner.snapshot(uid).await;

        let inner = Arc::clone(&self.inner);
        let uid = uid.to_string();
        let (tx, rx) = mpsc::channel(16);

        let producer = tokio::spawn(async move {
            if tx.send(initial).await.is_err() {
                return;
            }
            loop {
                match changes.recv().await {
                    Ok(changed) if changed != uid => continue,
                    Ok(_) | Err(RecvError::Lagged(_)) => {
                        let items = inner.snapshot(&uid).await;
                        if tx.send(items).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("Memory feed for {} closed", uid);
        });

        Ok(ItemSubscription::new(rx, producer))
    }

    async fn create_item(&self, uid: &str, item: &ClothingItem) -> Result<()> {
        if self.inner.rejected.lock().await.contains(&item.id) {
            return Err(Error::Cloud(format!("write of item {} rejected", item.id)));
        }

        self.inner
            .collections
            .lock()
            .await
            .entry(uid.to_string())
            .or_default()
            .insert(item.id.clone(), item.clone());

        self.inner.notify(uid).await;
        Ok(())
    }

    async fn update_item(&self, uid: &str, id: &ItemId, patch: &ItemPatch) -> Result<()> {
        {
            let mut collections = self.inner.collections.lock().await;
            let item = collections
                .get_mut(uid)
                .and_then(|c| c.get_mut(id))
                .ok_or_else(|| Error::ItemNotFound(id.clone()))?;
            item.apply(patch);
        }

        self.inner.notify(uid).await;
        Ok(())
    }
}
