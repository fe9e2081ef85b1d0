//! Persistence backends behind the closet.
//!
//! Exactly one strategy is active at a time. Each is bound to the epoch it was
//! created for and refuses to touch state belonging to a later epoch.

use crate::auth::Principal;
use crate::cloud::CloudStore;
use crate::local::{read_json, write_json, LocalStorage, StorageSlot};
use crate::state::{ClosetState, PersistenceMode, SharedCloset};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use closet_common::{timestamp_now, ClothingItem, Error, ItemId, ItemPatch, Result};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

#[async_trait]
pub trait PersistenceStrategy: Send + Sync {
    fn mode(&self) -> PersistenceMode;

    /// Claim the closet for this backend and load what it already holds
    async fn initialize(&self, closet: &SharedCloset) -> Result<()>;

    /// Start pushing remote changes into the closet, if the backend has any
    async fn subscribe(&self, closet: Arc<SharedCloset>) -> Result<Option<JoinHandle<()>>>;

    async fn add(&self, closet: &SharedCloset, item: ClothingItem) -> Result<()>;

    async fn update(&self, closet: &SharedCloset, id: &ItemId, patch: ItemPatch) -> Result<()>;

    async fn soft_delete(&self, closet: &SharedCloset, id: &ItemId, at: DateTime<Utc>) -> Result<()> {
        self.update(closet, id, ItemPatch::trash(at)).await
    }

    async fn hard_delete(&self, closet: &SharedCloset, id: &ItemId) -> Result<()>;

    /// Persist whatever changed in memory. Called after every mutation.
    async fn flush(&self, _closet: &SharedCloset) -> Result<()> {
        Ok(())
    }
}

/// Guest backend: the closet lives in memory and is snapshotted to local storage.
pub struct LocalStrategy {
    storage: Arc<dyn LocalStorage>,
    epoch: u64,
}

impl LocalStrategy {
    pub fn new(storage: Arc<dyn LocalStorage>, epoch: u64) -> Self {
        Self { storage, epoch }
    }

    fn ensure_current(&self, state: &ClosetState) -> Result<()> {
        if state.epoch() != self.epoch || !state.is_loaded() {
            return Err(Error::Loading);
        }
        Ok(())
    }

    /// A slot that fails to decode is reported and treated as absent
    fn load_slot<T: DeserializeOwned>(&self, slot: StorageSlot) -> Option<T> {
        match read_json(self.storage.as_ref(), slot) {
            Ok(value) => value,
            Err(e) => {
                error!("Failed to load {}: {}", slot.key(), e);
                None
            }
        }
    }
}

#[async_trait]
impl PersistenceStrategy for LocalStrategy {
    fn mode(&self) -> PersistenceMode {
        PersistenceMode::Guest
    }

    async fn initialize(&self, closet: &SharedCloset) -> Result<()> {
        let items: Vec<ClothingItem> = self.load_slot(StorageSlot::Items).unwrap_or_default();
        let outfits = self.load_slot(StorageSlot::Outfits);
        let categories = self.load_slot(StorageSlot::Categories);

        let count = items.len();
        {
            let mut state = closet.write().await;
            if !state.activate(self.epoch, PersistenceMode::Guest) {
                debug!("Guest load for epoch {} superseded", self.epoch);
                return Ok(());
            }
            if let Some(outfits) = outfits {
                state.outfits = outfits;
            }
            if let Some(categories) = categories {
                state.categories = categories;
            }
            state.deliver(self.epoch, items);
        }
        closet.notify();

        info!("Loaded {} guest items from local storage", count);
        Ok(())
    }

    async fn subscribe(&self, _closet: Arc<SharedCloset>) -> Result<Option<JoinHandle<()>>> {
        Ok(None)
    }

    async fn add(&self, closet: &SharedCloset, item: ClothingItem) -> Result<()> {
        {
            let mut state = closet.write().await;
            self.ensure_current(&state)?;
            state.items.insert_front(item);
        }
        closet.notify();
        Ok(())
    }

    async fn update(&self, closet: &SharedCloset, id: &ItemId, patch: ItemPatch) -> Result<()> {
        {
            let mut state = closet.write().await;
            self.ensure_current(&state)?;
            state.items.update(id, &patch)?;
        }
        closet.notify();
        Ok(())
    }

    async fn hard_delete(&self, closet: &SharedCloset, id: &ItemId) -> Result<()> {
        {
            let mut state = closet.write().await;
            self.ensure_current(&state)?;
            state.items.remove(id)?;
        }
        closet.notify();
        Ok(())
    }

    async fn flush(&self, closet: &SharedCloset) -> Result<()> {
        let state = closet.read().await;
        if !state.guest_writable(self.epoch) {
            debug!("Skipping local snapshot, guest closet not loaded");
            return Ok(());
        }

        let storage = self.storage.as_ref();
        write_json(storage, StorageSlot::Items, state.items.all())?;
        write_json(storage, StorageSlot::Outfits, &state.outfits)?;
        write_json(storage, StorageSlot::Categories, &state.categories)?;
        Ok(())
    }
}

/// Signed-in backend: the remote collection is the only source of truth.
///
/// Writes go straight to the store and show up locally once the change feed
/// redelivers the collection.
pub struct CloudStrategy {
    cloud: Arc<dyn CloudStore>,
    principal: Principal,
    epoch: u64,
}

impl CloudStrategy {
    pub fn new(cloud: Arc<dyn CloudStore>, principal: Principal, epoch: u64) -> Self {
        Self {
            cloud,
            principal,
            epoch,
        }
    }
}

#[async_trait]
impl PersistenceStrategy for CloudStrategy {
    fn mode(&self) -> PersistenceMode {
        PersistenceMode::Cloud
    }

    async fn initialize(&self, closet: &SharedCloset) -> Result<()> {
        let activated = closet
            .write()
            .await
            .activate(self.epoch, PersistenceMode::Cloud);
        if activated {
            closet.notify();
        }
        Ok(())
    }

    async fn subscribe(&self, closet: Arc<SharedCloset>) -> Result<Option<JoinHandle<()>>> {
        let mut feed = self.cloud.subscribe_items(&self.principal.uid).await?;
        let epoch = self.epoch;
        let uid = self.principal.uid.clone();

        let handle = tokio::spawn(async move {
            while let Some(items) = feed.next().await {
                let count = items.len();
                if !closet.write().await.deliver(epoch, items) {
                    debug!("Dropping stale delivery for {}", uid);
                    break;
                }
                closet.notify();
                debug!("Received {} items for {}", count, uid);
            }
        });

        info!("Listening for item changes of {}", self.principal.uid);
        Ok(Some(handle))
    }

    async fn add(&self, _closet: &SharedCloset, item: ClothingItem) -> Result<()> {
        self.cloud.create_item(&self.principal.uid, &item).await
    }

    async fn update(&self, _closet: &SharedCloset, id: &ItemId, patch: ItemPatch) -> Result<()> {
        self.cloud
            .update_item(&self.principal.uid, id, &patch)
            .await
    }

    /// Cloud items are never physically removed; they stay in the trash.
    async fn hard_delete(&self, closet: &SharedCloset, id: &ItemId) -> Result<()> {
        let trashed_at = closet
            .read()
            .await
            .items
            .get(id)
            .and_then(|item| item.trash_date)
            .unwrap_or_else(timestamp_now);

        info!("Keeping cloud item {} in trash instead of removing it", id);
        self.cloud
            .update_item(&self.principal.uid, id, &ItemPatch::trash(trashed_at))
            .await
    }
}
