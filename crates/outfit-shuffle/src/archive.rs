use chrono::NaiveDate;
use closet_common::Outfit;
use serde::{Deserialize, Serialize};

/// Append-only log of confirmed outfits, newest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutfitArchive {
    outfits: Vec<Outfit>,
}

impl OutfitArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, outfit: Outfit) {
        self.outfits.insert(0, outfit);
    }

    /// Outfits recorded for exactly `date`
    pub fn on_date(&self, date: NaiveDate) -> Vec<&Outfit> {
        self.outfits.iter().filter(|o| o.date == date).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Outfit> {
        self.outfits.iter()
    }

    pub fn len(&self) -> usize {
        self.outfits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outfits.is_empty()
    }
}

impl From<Vec<Outfit>> for OutfitArchive {
    fn from(outfits: Vec<Outfit>) -> Self {
        Self { outfits }
    }
}
