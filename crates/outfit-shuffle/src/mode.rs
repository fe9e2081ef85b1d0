use closet_common::Slot;
use serde::{Deserialize, Serialize};

/// Which set of slots a shuffle fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GenerationMode {
    /// Top, bottom and shoes
    #[default]
    Standard,
    /// Dress and shoes
    OnePiece,
}

impl GenerationMode {
    /// Active slots in evaluation order
    pub fn slots(&self) -> &'static [Slot] {
        match self {
            GenerationMode::Standard => &[Slot::Top, Slot::Bottom, Slot::Shoes],
            GenerationMode::OnePiece => &[Slot::Dress, Slot::Shoes],
        }
    }

    pub fn includes(&self, slot: Slot) -> bool {
        self.slots().contains(&slot)
    }
}
