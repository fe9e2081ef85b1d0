pub mod category;
pub mod draft;
pub mod error;
pub mod filter;
pub mod item;
pub mod outfit;

pub use category::CategoryStructure;
pub use draft::ItemDraft;
pub use error::{Error, Result};
pub use filter::{trash_listing, ClosetFilter};
pub use item::{
    timestamp_now, CategoryL1, ClothingItem, Color, ItemId, ItemPatch, Season, TrashChange,
};
pub use outfit::{Outfit, Slot};
