//! Closet Backend
//!
//! Keeps one in-memory closet consistent with either local storage (guests)
//! or a per-user cloud collection (signed-in users), switching on every auth
//! transition.
//!
//! **Components:**
//! - `auth`: principal and auth-state broadcast
//! - `local`: JSON snapshot slots on disk or in memory
//! - `cloud`: remote item collections with live change feeds (Redis, in-memory)
//! - `state`: shared closet state, epoch and write guard
//! - `strategy`: local and cloud persistence backends
//! - `closet`: the adapter the application talks to
//! - `sync`: guest-to-cloud batch upload
//! - `vision`: image tagging and background removal

pub mod auth;
pub mod closet;
pub mod cloud;
pub mod local;
pub mod state;
pub mod strategy;
pub mod sync;
pub mod vision;

pub use auth::{AuthState, Principal, SessionAuth};
pub use closet::Closet;
pub use cloud::{CloudConfig, CloudStore, ItemSubscription, MemoryCloudStore, RedisCloudStore};
pub use local::{FileStorage, LocalStorage, MemoryStorage, StorageSlot};
pub use state::PersistenceMode;
pub use strategy::{CloudStrategy, LocalStrategy, PersistenceStrategy};
pub use sync::{SyncFailure, SyncReport};
pub use vision::{ClothingVision, GeminiVision, NoVision, TagSuggestion};
