//! In-memory closet state shared between the adapter and its backends.

use closet_common::{CategoryStructure, ClothingItem, Error, ItemId, ItemPatch, Result};
use outfit_shuffle::OutfitArchive;
use serde::Serialize;
use tokio::sync::{watch, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Which backend currently owns the item collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistenceMode {
    /// Auth not resolved, or a backend switch is in progress
    Loading,
    Guest,
    Cloud,
}

/// Ordered item collection, newest first.
#[derive(Debug, Clone, Default)]
pub struct ItemStore {
    items: Vec<ClothingItem>,
}

impl ItemStore {
    pub fn all(&self) -> &[ClothingItem] {
        &self.items
    }

    pub fn get(&self, id: &ItemId) -> Option<&ClothingItem> {
        self.items.iter().find(|i| &i.id == id)
    }

    pub fn replace(&mut self, items: Vec<ClothingItem>) {
        self.items = items;
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn insert_front(&mut self, item: ClothingItem) {
        self.items.insert(0, item);
    }

    pub fn update(&mut self, id: &ItemId, patch: &ItemPatch) -> Result<()> {
        let item = self
            .items
            .iter_mut()
            .find(|i| &i.id == id)
            .ok_or_else(|| Error::ItemNotFound(id.clone()))?;
        item.apply(patch);
        Ok(())
    }

    pub fn remove(&mut self, id: &ItemId) -> Result<ClothingItem> {
        let pos = self
            .items
            .iter()
            .position(|i| &i.id == id)
            .ok_or_else(|| Error::ItemNotFound(id.clone()))?;
        Ok(self.items.remove(pos))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct ClosetState {
    pub items: ItemStore,
    pub outfits: OutfitArchive,
    pub categories: CategoryStructure,
    loaded: bool,
    mode: Option<PersistenceMode>,
    epoch: u64,
}

impl ClosetState {
    /// Whether the active backend has delivered its first collection
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn mode(&self) -> PersistenceMode {
        self.mode.unwrap_or(PersistenceMode::Loading)
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Start a backend switch: drop the item view and close the write guard.
    ///
    /// Returns the epoch that the incoming backend must present on every write.
    pub fn begin_transition(&mut self) -> u64 {
        self.epoch += 1;
        self.loaded = false;
        self.mode = None;
        self.items.clear();
        self.epoch
    }

    /// Complete a switch started at `epoch`. Stale epochs are ignored.
    pub fn activate(&mut self, epoch: u64, mode: PersistenceMode) -> bool {
        if self.epoch != epoch {
            return false;
        }
        self.mode = Some(mode);
        true
    }

    /// Accept a full collection from the backend owning `epoch`
    pub fn deliver(&mut self, epoch: u64, items: Vec<ClothingItem>) -> bool {
        if self.epoch != epoch {
            return false;
        }
        self.items.replace(items);
        self.loaded = true;
        true
    }

    /// Whether a local snapshot may be written now
    pub fn guest_writable(&self, epoch: u64) -> bool {
        self.epoch == epoch && self.loaded && self.mode == Some(PersistenceMode::Guest)
    }
}

/// Closet state plus a revision counter bumped on every visible change.
pub struct SharedCloset {
    state: RwLock<ClosetState>,
    revision: watch::Sender<u64>,
}

impl SharedCloset {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            state: RwLock::new(ClosetState::default()),
            revision,
        }
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, ClosetState> {
        self.state.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, ClosetState> {
        self.state.write().await
    }

    /// Wake everything watching the closet
    pub fn notify(&self) {
        self.revision.send_modify(|r| *r += 1);
    }

    pub fn watch(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}

impl Default for SharedCloset {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use closet_common::{CategoryL1, Color, Season};

    fn item(id: &str) -> ClothingItem {
        ClothingItem::new(
            ItemId::new(id),
            "data".to_string(),
            CategoryL1::Shoes,
            "Sneakers".to_string(),
            Color::White,
            Season::AllYear,
            Utc::now(),
        )
    }

    #[test]
    fn test_stale_epoch_is_ignored() {
        let mut state = ClosetState::default();
        let first = state.begin_transition();
        assert!(state.activate(first, PersistenceMode::Cloud));

        let second = state.begin_transition();
        assert!(!state.deliver(first, vec![item("late")]));
        assert!(state.items.is_empty());
        assert!(!state.is_loaded());

        assert!(state.deliver(second, vec![item("fresh")]));
        assert_eq!(state.items.len(), 1);
    }

    #[test]
    fn test_guest_guard_needs_load_and_guest_mode() {
        let mut state = ClosetState::default();
        let epoch = state.begin_transition();
        state.activate(epoch, PersistenceMode::Guest);
        assert!(!state.guest_writable(epoch));

        state.deliver(epoch, Vec::new());
        assert!(state.guest_writable(epoch));
        assert!(!state.guest_writable(epoch + 1));

        let next = state.begin_transition();
        state.activate(next, PersistenceMode::Cloud);
        state.deliver(next, Vec::new());
        assert!(!state.guest_writable(next));
    }

    #[test]
    fn test_item_store_edits() {
        let mut store = ItemStore::default();
        store.insert_front(item("a"));
        store.insert_front(item("b"));
        assert_eq!(store.all()[0].id.as_str(), "b");

        store.update(&ItemId::new("a"), &ItemPatch::trash(Utc::now())).unwrap();
        assert!(store.get(&ItemId::new("a")).unwrap().is_deleted);

        store.remove(&ItemId::new("b")).unwrap();
        assert!(matches!(
            store.remove(&ItemId::new("b")),
            Err(Error::ItemNotFound(_))
        ));
    }
}
