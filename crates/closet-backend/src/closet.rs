//! The closet facade: one in-memory view, fed by whichever backend owns it.

use crate::auth::{AuthState, Principal};
use crate::cloud::CloudStore;
use crate::local::{read_json, LocalStorage, StorageSlot};
use crate::state::{PersistenceMode, SharedCloset};
use crate::strategy::{CloudStrategy, LocalStrategy, PersistenceStrategy};
use crate::sync::{upload_all, SyncReport};
use chrono::NaiveDate;
use closet_common::{
    timestamp_now, trash_listing, CategoryL1, CategoryStructure, ClosetFilter, ClothingItem,
    Error, ItemDraft, ItemId, ItemPatch, Outfit, Result,
};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

#[derive(Default)]
struct ActiveBackend {
    strategy: Option<Arc<dyn PersistenceStrategy>>,
    /// Set only while the cloud backend is active
    principal: Option<Principal>,
    feed: Option<JoinHandle<()>>,
}

impl ActiveBackend {
    fn teardown(&mut self) {
        if let Some(feed) = self.feed.take() {
            feed.abort();
        }
        self.strategy = None;
        self.principal = None;
    }
}

impl Drop for ActiveBackend {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Persistence adapter exposing the closet to the rest of the application.
///
/// Until auth resolves the closet is loading: reads fail with
/// [`Error::Loading`] and nothing is written anywhere.
pub struct Closet {
    shared: Arc<SharedCloset>,
    local: Arc<dyn LocalStorage>,
    cloud: Option<Arc<dyn CloudStore>>,
    active: Mutex<ActiveBackend>,
}

impl Closet {
    pub fn new(local: Arc<dyn LocalStorage>, cloud: Option<Arc<dyn CloudStore>>) -> Self {
        Self {
            shared: Arc::new(SharedCloset::new()),
            local,
            cloud,
            active: Mutex::new(ActiveBackend::default()),
        }
    }

    pub fn cloud_available(&self) -> bool {
        self.cloud.is_some()
    }

    /// Switch backends to match an auth transition.
    ///
    /// Every resolved transition discards the current item view and closes the
    /// write guard before the next backend loads.
    pub async fn apply_auth(&self, auth: &AuthState) -> Result<PersistenceMode> {
        let principal = match auth {
            AuthState::Loading => {
                debug!("Auth still resolving, closet stays idle");
                return Ok(self.mode().await);
            }
            AuthState::Resolved(principal) => principal.clone(),
        };

        let mut active = self.active.lock().await;
        active.teardown();
        let epoch = self.shared.write().await.begin_transition();
        self.shared.notify();

        match (principal, &self.cloud) {
            (Some(principal), Some(cloud)) => {
                let strategy: Arc<dyn PersistenceStrategy> = Arc::new(CloudStrategy::new(
                    Arc::clone(cloud),
                    principal.clone(),
                    epoch,
                ));
                match self.start(strategy.clone()).await {
                    Ok(feed) => {
                        info!("Closet backed by cloud store for {}", principal.uid);
                        active.strategy = Some(strategy);
                        active.principal = Some(principal);
                        active.feed = feed;
                        return Ok(PersistenceMode::Cloud);
                    }
                    Err(e) => warn!(
                        "Cloud store unavailable for {}, using guest mode: {}",
                        principal.uid, e
                    ),
                }
            }
            (Some(principal), None) => {
                warn!(
                    "{} signed in but no cloud store is configured, using guest mode",
                    principal.uid
                );
            }
            (None, _) => {}
        }

        let strategy: Arc<dyn PersistenceStrategy> =
            Arc::new(LocalStrategy::new(Arc::clone(&self.local), epoch));
        active.feed = self.start(strategy.clone()).await?;
        active.strategy = Some(strategy);
        info!("Closet backed by local storage");
        Ok(PersistenceMode::Guest)
    }

    async fn start(
        &self,
        strategy: Arc<dyn PersistenceStrategy>,
    ) -> Result<Option<JoinHandle<()>>> {
        debug!("Starting {:?} backend", strategy.mode());
        strategy.initialize(&self.shared).await?;
        strategy.subscribe(Arc::clone(&self.shared)).await
    }

    /// Follow an auth source for as long as it lives
    pub fn spawn_auth_listener(
        self: &Arc<Self>,
        mut auth: watch::Receiver<AuthState>,
    ) -> JoinHandle<()> {
        let closet = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                let state = auth.borrow_and_update().clone();
                if let Err(e) = closet.apply_auth(&state).await {
                    error!("Failed to switch closet backend: {}", e);
                }
                if auth.changed().await.is_err() {
                    debug!("Auth source closed");
                    break;
                }
            }
        })
    }

    async fn strategy(&self) -> Result<Arc<dyn PersistenceStrategy>> {
        self.active
            .lock()
            .await
            .strategy
            .clone()
            .ok_or(Error::Loading)
    }

    pub async fn mode(&self) -> PersistenceMode {
        self.shared.read().await.mode()
    }

    /// Signed-in principal, when the cloud backend is active
    pub async fn principal(&self) -> Option<Principal> {
        self.active.lock().await.principal.clone()
    }

    /// Revision counter bumped on every visible change
    pub fn watch(&self) -> watch::Receiver<u64> {
        self.shared.watch()
    }

    // Item mutations

    pub async fn add_item(&self, item: ClothingItem) -> Result<()> {
        let strategy = self.strategy().await?;
        let id = item.id.clone();
        strategy.add(&self.shared, item).await?;
        strategy.flush(&self.shared).await?;
        info!("Added item {}", id);
        Ok(())
    }

    /// Finalize a draft into a new item and add it
    pub async fn add_draft(&self, draft: ItemDraft) -> Result<ClothingItem> {
        let strategy = self.strategy().await?;
        let item = {
            let mut state = self.shared.write().await;
            draft.into_item(&mut state.categories, timestamp_now())?
        };
        self.shared.notify();

        strategy.add(&self.shared, item.clone()).await?;
        strategy.flush(&self.shared).await?;
        info!("Added item {} ({})", item.id, item.category_l1);
        Ok(item)
    }

    pub async fn update_item(&self, id: &ItemId, patch: ItemPatch) -> Result<()> {
        let strategy = self.strategy().await?;
        strategy.update(&self.shared, id, patch).await?;
        strategy.flush(&self.shared).await
    }

    /// Rewrite an existing item from an edited draft
    pub async fn edit_item(&self, id: &ItemId, draft: ItemDraft) -> Result<()> {
        let strategy = self.strategy().await?;
        let patch = {
            let mut state = self.shared.write().await;
            draft.into_patch(&mut state.categories)?
        };
        self.shared.notify();

        strategy.update(&self.shared, id, patch).await?;
        strategy.flush(&self.shared).await?;
        info!("Edited item {}", id);
        Ok(())
    }

    pub async fn soft_delete(&self, id: &ItemId) -> Result<()> {
        let strategy = self.strategy().await?;
        strategy.soft_delete(&self.shared, id, timestamp_now()).await?;
        strategy.flush(&self.shared).await?;
        info!("Moved item {} to trash", id);
        Ok(())
    }

    pub async fn restore(&self, id: &ItemId) -> Result<()> {
        let strategy = self.strategy().await?;
        strategy.update(&self.shared, id, ItemPatch::restore()).await?;
        strategy.flush(&self.shared).await?;
        info!("Restored item {}", id);
        Ok(())
    }

    pub async fn hard_delete(&self, id: &ItemId) -> Result<()> {
        let strategy = self.strategy().await?;
        strategy.hard_delete(&self.shared, id).await?;
        strategy.flush(&self.shared).await?;
        info!("Deleted item {}", id);
        Ok(())
    }

    // Categories and outfits

    /// Register a new subtype. Returns false for blanks and duplicates.
    pub async fn append_category(&self, category: CategoryL1, subtype: &str) -> Result<bool> {
        let added = self.shared.write().await.categories.append(category, subtype);
        if !added {
            return Ok(false);
        }
        self.shared.notify();

        if let Ok(strategy) = self.strategy().await {
            strategy.flush(&self.shared).await?;
        }
        info!("Added subtype {} to {}", subtype.trim(), category);
        Ok(true)
    }

    pub async fn record_outfit(&self, outfit: Outfit) -> Result<()> {
        let id = outfit.id.clone();
        self.shared.write().await.outfits.append(outfit);
        self.shared.notify();

        if let Ok(strategy) = self.strategy().await {
            strategy.flush(&self.shared).await?;
        }
        info!("Recorded outfit {}", id);
        Ok(())
    }

    // Reads

    /// Every item, trashed ones included, newest first
    pub async fn items(&self) -> Result<Vec<ClothingItem>> {
        let state = self.shared.read().await;
        if !state.is_loaded() {
            return Err(Error::Loading);
        }
        Ok(state.items.all().to_vec())
    }

    pub async fn item(&self, id: &ItemId) -> Result<ClothingItem> {
        let state = self.shared.read().await;
        if !state.is_loaded() {
            return Err(Error::Loading);
        }
        state
            .items
            .get(id)
            .cloned()
            .ok_or_else(|| Error::ItemNotFound(id.clone()))
    }

    /// Active items matching the filter
    pub async fn closet(&self, filter: &ClosetFilter) -> Result<Vec<ClothingItem>> {
        let state = self.shared.read().await;
        if !state.is_loaded() {
            return Err(Error::Loading);
        }
        Ok(filter.apply(state.items.all()).into_iter().cloned().collect())
    }

    /// Trashed items, most recently trashed first
    pub async fn trash(&self) -> Result<Vec<ClothingItem>> {
        let state = self.shared.read().await;
        if !state.is_loaded() {
            return Err(Error::Loading);
        }
        Ok(trash_listing(state.items.all()).into_iter().cloned().collect())
    }

    pub async fn categories(&self) -> CategoryStructure {
        self.shared.read().await.categories.clone()
    }

    pub async fn outfits(&self) -> Vec<Outfit> {
        self.shared.read().await.outfits.iter().cloned().collect()
    }

    pub async fn outfits_on(&self, date: NaiveDate) -> Vec<Outfit> {
        self.shared
            .read()
            .await
            .outfits
            .on_date(date)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Upload the guest snapshot into the signed-in user's collection.
    ///
    /// Items are created as-is; running it twice writes the same ids again.
    pub async fn sync_guest_items(&self) -> Result<SyncReport> {
        let (cloud, uid) = {
            let active = self.active.lock().await;
            match (&active.principal, &self.cloud) {
                (Some(principal), Some(cloud)) => (Arc::clone(cloud), principal.uid.clone()),
                _ => return Err(Error::NotAuthenticated),
            }
        };

        let items: Vec<ClothingItem> =
            read_json(self.local.as_ref(), StorageSlot::Items)?.unwrap_or_default();
        if items.is_empty() {
            return Err(Error::NothingToSync);
        }

        info!("Syncing {} guest items for {}", items.len(), uid);
        Ok(upload_all(cloud, &uid, items).await)
    }
}
