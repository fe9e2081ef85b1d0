//! One generation pass over the closet.

use closet_common::{ClothingItem, ItemId, Season, Slot};
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::locks::LockState;
use crate::mode::GenerationMode;
use crate::pool::{pick_unlocked, resolve_locked, SlotSource};

/// Item chosen for one slot, with the tier it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotPick {
    pub item: Option<ClothingItem>,
    pub source: SlotSource,
}

/// A proposed outfit: one entry per active slot, each possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Candidate {
    slots: BTreeMap<Slot, SlotPick>,
    primary_season: Option<Season>,
}

impl Candidate {
    /// Item displayed in `slot`, if any
    pub fn get(&self, slot: Slot) -> Option<&ClothingItem> {
        self.slots.get(&slot).and_then(|p| p.item.as_ref())
    }

    pub fn pick(&self, slot: Slot) -> Option<&SlotPick> {
        self.slots.get(&slot)
    }

    /// Whether the slot is part of this candidate at all
    pub fn has_slot(&self, slot: Slot) -> bool {
        self.slots.contains_key(&slot)
    }

    pub fn slots(&self) -> impl Iterator<Item = Slot> + '_ {
        self.slots.keys().copied()
    }

    /// Resolved items in slot order
    pub fn resolved(&self) -> Vec<&ClothingItem> {
        self.slots.values().filter_map(|p| p.item.as_ref()).collect()
    }

    pub fn resolved_count(&self) -> usize {
        self.slots.values().filter(|p| p.item.is_some()).count()
    }

    pub fn primary_season(&self) -> Option<Season> {
        self.primary_season
    }

    pub fn item_id(&self, slot: Slot) -> Option<&ItemId> {
        self.get(slot).map(|i| &i.id)
    }
}

/// Produce a candidate outfit for `mode`.
///
/// Locked slots are resolved first, in slot order; the first locked item with a
/// definite season becomes the primary season. Unlocked slots are then filled in
/// slot order, and the first picked item with a definite season sets the primary
/// season when none is set yet. A lock whose item is gone or trashed is skipped
/// and its slot is filled as if unlocked.
pub fn generate<R: Rng + ?Sized>(
    items: &[ClothingItem],
    locks: &LockState,
    mode: GenerationMode,
    rng: &mut R,
) -> Candidate {
    let mut primary: Option<Season> = None;
    let mut locked: BTreeMap<Slot, &ClothingItem> = BTreeMap::new();

    for &slot in mode.slots() {
        let Some(id) = locks.pinned(slot) else {
            continue;
        };
        match resolve_locked(items, id) {
            Some(item) => {
                if primary.is_none() && item.season.is_definite() {
                    primary = Some(item.season);
                }
                locked.insert(slot, item);
            }
            None => debug!("Lock on {} points at missing item {}, ignoring", slot, id),
        }
    }

    let mut slots = BTreeMap::new();
    for &slot in mode.slots() {
        let pick = match locked.get(&slot) {
            Some(item) => SlotPick {
                item: Some((*item).clone()),
                source: SlotSource::Locked,
            },
            None => {
                let (item, source) = pick_unlocked(items, slot, primary, rng);
                if let Some(item) = item {
                    if primary.is_none() && item.season.is_definite() {
                        primary = Some(item.season);
                    }
                }
                SlotPick {
                    item: item.cloned(),
                    source,
                }
            }
        };
        slots.insert(slot, pick);
    }

    Candidate {
        slots,
        primary_season: primary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use closet_common::{CategoryL1, Color};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn item(id: &str, l1: CategoryL1, season: Season) -> ClothingItem {
        ClothingItem::new(
            ItemId::new(id),
            "AAAA".to_string(),
            l1,
            String::new(),
            Color::Blue,
            season,
            Utc::now(),
        )
    }

    #[test]
    fn test_locked_season_drives_other_slots() {
        let items = vec![
            item("coat", CategoryL1::Top, Season::Cold),
            item("shorts", CategoryL1::Bottom, Season::Warm),
            item("wool", CategoryL1::Bottom, Season::Cold),
            item("sandals", CategoryL1::Shoes, Season::Warm),
            item("boots", CategoryL1::Shoes, Season::Cold),
        ];
        let mut locks = LockState::default();
        locks.toggle(Slot::Top, Some(&ItemId::new("coat")));

        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            let c = generate(&items, &locks, GenerationMode::Standard, &mut rng);
            assert_eq!(c.primary_season(), Some(Season::Cold));
            assert_eq!(c.item_id(Slot::Top).unwrap().as_str(), "coat");
            assert_eq!(c.item_id(Slot::Bottom).unwrap().as_str(), "wool");
            assert_eq!(c.item_id(Slot::Shoes).unwrap().as_str(), "boots");
        }
    }

    #[test]
    fn test_inactive_lock_does_not_set_season() {
        let items = vec![
            item("gown", CategoryL1::Dress, Season::Warm),
            item("tee", CategoryL1::Top, Season::AllYear),
        ];
        let mut locks = LockState::default();
        locks.toggle(Slot::Dress, Some(&ItemId::new("gown")));

        let mut rng = StdRng::seed_from_u64(3);
        let c = generate(&items, &locks, GenerationMode::Standard, &mut rng);
        assert!(c.primary_season().is_none());
        assert!(!c.has_slot(Slot::Dress));
    }

    #[test]
    fn test_missing_lock_fails_open() {
        let items = vec![item("tee", CategoryL1::Top, Season::AllYear)];
        let mut locks = LockState::default();
        locks.toggle(Slot::Top, Some(&ItemId::new("deleted-long-ago")));

        let mut rng = StdRng::seed_from_u64(9);
        let c = generate(&items, &locks, GenerationMode::Standard, &mut rng);
        let pick = c.pick(Slot::Top).unwrap();
        assert_eq!(pick.source, SlotSource::SeasonFiltered);
        assert_eq!(c.item_id(Slot::Top).unwrap().as_str(), "tee");
    }
}
