use chrono::NaiveDate;
use closet_common::{ClothingItem, Outfit, Result, Slot};
use rand::Rng;
use tracing::{debug, info};

use crate::generator::{generate, Candidate};
use crate::locks::{LockState, LockToggle};
use crate::mode::GenerationMode;

/// Shuffle screen state: mode, locks and the outfit on display.
#[derive(Debug, Clone, Default)]
pub struct ShuffleSession {
    mode: GenerationMode,
    locks: LockState,
    current: Candidate,
}

impl ShuffleSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> GenerationMode {
        self.mode
    }

    pub fn locks(&self) -> &LockState {
        &self.locks
    }

    pub fn current(&self) -> &Candidate {
        &self.current
    }

    /// Replace the displayed outfit with a fresh one
    pub fn shuffle<R: Rng + ?Sized>(&mut self, items: &[ClothingItem], rng: &mut R) -> &Candidate {
        self.current = generate(items, &self.locks, self.mode, rng);
        debug!(
            "Shuffled {:?} outfit with {} item(s)",
            self.mode,
            self.current.resolved_count()
        );
        &self.current
    }

    /// Switch mode and regenerate. Slots outside the new mode disappear from
    /// the candidate; their locks are kept for when the mode comes back.
    pub fn set_mode<R: Rng + ?Sized>(
        &mut self,
        mode: GenerationMode,
        items: &[ClothingItem],
        rng: &mut R,
    ) -> &Candidate {
        if mode != self.mode {
            info!("Shuffle mode changed: {:?} -> {:?}", self.mode, mode);
            self.mode = mode;
        }
        self.shuffle(items, rng)
    }

    /// Lock or unlock the item currently shown in `slot`
    pub fn toggle_lock(&mut self, slot: Slot) -> LockToggle {
        let displayed = self.current.item_id(slot).cloned();
        self.locks.toggle(slot, displayed.as_ref())
    }

    /// Turn the displayed outfit into an archive entry dated `today`.
    ///
    /// Fails without side effects when fewer than two slots hold an item.
    pub fn confirm(&self, today: NaiveDate, rating: Option<u8>) -> Result<Outfit> {
        let items = self.current.resolved().into_iter().cloned().collect();
        Outfit::new(today, items, rating)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use closet_common::{CategoryL1, Color, Error, ItemId, Season};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn item(id: &str, l1: CategoryL1) -> ClothingItem {
        ClothingItem::new(
            ItemId::new(id),
            "AAAA".to_string(),
            l1,
            String::new(),
            Color::Green,
            Season::AllYear,
            Utc::now(),
        )
    }

    #[test]
    fn test_same_mode_still_regenerates() {
        let items = vec![item("tee", CategoryL1::Top), item("jeans", CategoryL1::Bottom)];
        let mut rng = StdRng::seed_from_u64(5);
        let mut session = ShuffleSession::new();
        assert!(!session.current().has_slot(Slot::Top));

        session.set_mode(GenerationMode::Standard, &items, &mut rng);
        assert_eq!(session.current().resolved_count(), 2);
    }

    #[test]
    fn test_confirm_with_one_item_is_rejected() {
        let items = vec![item("tee", CategoryL1::Top)];
        let mut rng = StdRng::seed_from_u64(5);
        let mut session = ShuffleSession::new();
        session.shuffle(&items, &mut rng);

        let today = Utc::now().date_naive();
        let err = session.confirm(today, None).unwrap_err();
        assert!(matches!(err, Error::IncompleteOutfit { resolved: 1 }));
    }
}
