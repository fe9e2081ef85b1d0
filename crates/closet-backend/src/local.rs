//! Local durable storage: three named slots holding JSON snapshots.

use closet_common::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Named snapshot slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageSlot {
    Items,
    Outfits,
    Categories,
}

impl StorageSlot {
    pub fn key(&self) -> &'static str {
        match self {
            StorageSlot::Items => "smartCloset_items",
            StorageSlot::Outfits => "smartCloset_outfits",
            StorageSlot::Categories => "smartCloset_categories",
        }
    }
}

/// Synchronous get/set over the snapshot slots.
pub trait LocalStorage: Send + Sync {
    fn get(&self, slot: StorageSlot) -> Result<Option<String>>;

    fn set(&self, slot: StorageSlot, value: &str) -> Result<()>;
}

/// Read and decode a slot. `None` when the slot was never written.
pub fn read_json<T: DeserializeOwned>(
    storage: &dyn LocalStorage,
    slot: StorageSlot,
) -> Result<Option<T>> {
    match storage.get(slot)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

pub fn write_json<T: Serialize + ?Sized>(
    storage: &dyn LocalStorage,
    slot: StorageSlot,
    value: &T,
) -> Result<()> {
    let json = serde_json::to_string(value)?;
    storage.set(slot, &json)
}

/// One JSON file per slot inside a directory.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open (and create if needed) a storage directory
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        debug!("Local storage at {}", dir.display());
        Ok(Self { dir })
    }

    fn path(&self, slot: StorageSlot) -> PathBuf {
        self.dir.join(format!("{}.json", slot.key()))
    }
}

impl LocalStorage for FileStorage {
    fn get(&self, slot: StorageSlot) -> Result<Option<String>> {
        match fs::read_to_string(self.path(slot)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, slot: StorageSlot, value: &str) -> Result<()> {
        // Write-then-rename so a crash never leaves a half-written snapshot
        let tmp = self.dir.join(format!(".{}.json.tmp", slot.key()));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, self.path(slot))?;
        Ok(())
    }
}

/// In-process storage, for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStorage {
    slots: Mutex<HashMap<StorageSlot, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStorage for MemoryStorage {
    fn get(&self, slot: StorageSlot) -> Result<Option<String>> {
        let slots = self
            .slots
            .lock()
            .map_err(|_| Error::Storage("memory storage lock poisoned".to_string()))?;
        Ok(slots.get(&slot).cloned())
    }

    fn set(&self, slot: StorageSlot, value: &str) -> Result<()> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| Error::Storage("memory storage lock poisoned".to_string()))?;
        slots.insert(slot, value.to_string());
        Ok(())
    }
}
