use closet_common::{ItemId, Slot};
use serde::Serialize;
use std::collections::BTreeMap;

/// Pinned item per slot.
///
/// Locks on slots outside the active mode are kept but ignored by the generator,
/// so they come back into effect when the mode is switched back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LockState {
    pinned: BTreeMap<Slot, ItemId>,
}

/// Outcome of a lock toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "item_id", rename_all = "snake_case")]
pub enum LockToggle {
    Locked(ItemId),
    Unlocked,
    /// Nothing displayed in the slot, nothing to lock
    Ignored,
}

impl LockState {
    pub fn pinned(&self, slot: Slot) -> Option<&ItemId> {
        self.pinned.get(&slot)
    }

    pub fn is_locked(&self, slot: Slot) -> bool {
        self.pinned.contains_key(&slot)
    }

    /// Toggle the lock for `slot` against the item currently displayed there.
    pub fn toggle(&mut self, slot: Slot, displayed: Option<&ItemId>) -> LockToggle {
        let Some(displayed) = displayed else {
            return LockToggle::Ignored;
        };

        if self.pinned.get(&slot) == Some(displayed) {
            self.pinned.remove(&slot);
            LockToggle::Unlocked
        } else {
            self.pinned.insert(slot, displayed.clone());
            LockToggle::Locked(displayed.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_without_item_is_noop() {
        let mut locks = LockState::default();
        assert_eq!(locks.toggle(Slot::Top, None), LockToggle::Ignored);
        assert!(!locks.is_locked(Slot::Top));
    }

    #[test]
    fn test_toggle_pins_then_clears() {
        let mut locks = LockState::default();
        let id = ItemId::new("a");
        assert_eq!(
            locks.toggle(Slot::Shoes, Some(&id)),
            LockToggle::Locked(id.clone())
        );
        assert_eq!(locks.pinned(Slot::Shoes), Some(&id));
        assert_eq!(locks.toggle(Slot::Shoes, Some(&id)), LockToggle::Unlocked);
        assert!(locks.pinned(Slot::Shoes).is_none());
    }

    #[test]
    fn test_toggle_repins_a_different_item() {
        let mut locks = LockState::default();
        locks.toggle(Slot::Top, Some(&ItemId::new("a")));
        let b = ItemId::new("b");
        assert_eq!(locks.toggle(Slot::Top, Some(&b)), LockToggle::Locked(b.clone()));
        assert_eq!(locks.pinned(Slot::Top), Some(&b));
    }
}
