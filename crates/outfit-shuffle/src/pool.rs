//! Per-slot candidate resolution.
//!
//! A slot is filled by the first tier that yields an item:
//! 1. the locked item, if it still exists and is not in the trash
//! 2. a random pick from the slot's items that do not oppose the primary season
//! 3. a random pick from all of the slot's items
//! 4. nothing

use closet_common::{ClothingItem, ItemId, Season, Slot};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

/// Which tier produced a slot's item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotSource {
    Locked,
    SeasonFiltered,
    Unfiltered,
    Absent,
}

/// Look up a pinned item. Missing and trashed items do not resolve.
pub fn resolve_locked<'a>(items: &'a [ClothingItem], id: &ItemId) -> Option<&'a ClothingItem> {
    items.iter().find(|i| &i.id == id && !i.is_deleted)
}

/// Non-deleted items whose category matches the slot
pub fn slot_pool(items: &[ClothingItem], slot: Slot) -> Vec<&ClothingItem> {
    items
        .iter()
        .filter(|i| !i.is_deleted && i.category_l1 == slot.category())
        .collect()
}

/// Drop items whose season opposes `primary`. AllYear items always stay.
pub fn season_filtered<'a>(
    pool: &[&'a ClothingItem],
    primary: Option<Season>,
) -> Vec<&'a ClothingItem> {
    match primary {
        Some(primary) => pool
            .iter()
            .copied()
            .filter(|i| !i.season.opposes(primary))
            .collect(),
        None => pool.to_vec(),
    }
}

/// Pick an item for an unlocked slot (tiers 2 to 4).
pub fn pick_unlocked<'a, R: Rng + ?Sized>(
    items: &'a [ClothingItem],
    slot: Slot,
    primary: Option<Season>,
    rng: &mut R,
) -> (Option<&'a ClothingItem>, SlotSource) {
    let pool = slot_pool(items, slot);

    let filtered = season_filtered(&pool, primary);
    if let Some(item) = filtered.choose(rng) {
        return (Some(*item), SlotSource::SeasonFiltered);
    }

    match pool.choose(rng) {
        Some(item) => (Some(*item), SlotSource::Unfiltered),
        None => (None, SlotSource::Absent),
    }
}
