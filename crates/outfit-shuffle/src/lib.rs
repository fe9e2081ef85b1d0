//! Outfit Shuffle
//!
//! Picks one clothing item per slot at random, keeping locked slots fixed and
//! steering unlocked slots away from items of the opposite season.
//!
//! **Components:**
//! - `mode`: which slots a shuffle fills
//! - `locks`: per-slot pinned items
//! - `pool`: per-slot candidate resolution (locked, season-filtered, unfiltered, absent)
//! - `generator`: a single generation pass
//! - `session`: shuffle screen state and outfit confirmation
//! - `archive`: confirmed outfits by date

pub mod archive;
pub mod generator;
pub mod locks;
pub mod mode;
pub mod pool;
pub mod session;

pub use archive::OutfitArchive;
pub use generator::{generate, Candidate, SlotPick};
pub use locks::{LockState, LockToggle};
pub use mode::GenerationMode;
pub use pool::SlotSource;
pub use session::ShuffleSession;
