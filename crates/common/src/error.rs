use thiserror::Error;

use crate::item::ItemId;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid cloud configuration: {0}")]
    Config(String),

    #[error("Closet is still loading")]
    Loading,

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    #[error("An outfit needs at least two items, got {resolved}")]
    IncompleteOutfit { resolved: usize },

    #[error("No guest items found to sync")]
    NothingToSync,

    #[error("Invalid value: {0}")]
    Validation(String),

    #[error("Local storage error: {0}")]
    Storage(String),

    #[error("Cloud store error: {0}")]
    Cloud(String),

    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Whether the error is a user-facing policy rejection rather than a failure.
    pub fn is_policy(&self) -> bool {
        matches!(
            self,
            Error::IncompleteOutfit { .. } | Error::NothingToSync | Error::Validation(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
