//! Outfit slots and confirmed outfits.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::item::{CategoryL1, ClothingItem};

/// A clothing role filled by at most one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Slot {
    Top,
    Bottom,
    Shoes,
    Dress,
}

impl Slot {
    pub const ALL: [Slot; 4] = [Slot::Top, Slot::Bottom, Slot::Shoes, Slot::Dress];

    /// Category an item must have to fill this slot
    pub fn category(&self) -> CategoryL1 {
        match self {
            Slot::Top => CategoryL1::Top,
            Slot::Bottom => CategoryL1::Bottom,
            Slot::Shoes => CategoryL1::Shoes,
            Slot::Dress => CategoryL1::Dress,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.category().as_str())
    }
}

impl FromStr for Slot {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Slot::ALL
            .into_iter()
            .find(|slot| slot.category().as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::Validation(format!("unknown slot: {}", s)))
    }
}

/// A user-confirmed outfit. Items are copies taken at confirmation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outfit {
    pub id: String,

    /// Calendar day the outfit was worn (`YYYY-MM-DD`)
    pub date: NaiveDate,

    pub items: Vec<ClothingItem>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
}

impl Outfit {
    pub const MIN_ITEMS: usize = 2;

    pub fn new(date: NaiveDate, items: Vec<ClothingItem>, rating: Option<u8>) -> Result<Self> {
        if items.len() < Self::MIN_ITEMS {
            return Err(Error::IncompleteOutfit {
                resolved: items.len(),
            });
        }
        if let Some(r) = rating {
            if !(1..=5).contains(&r) {
                return Err(Error::Validation(format!(
                    "rating must be between 1 and 5, got {}",
                    r
                )));
            }
        }
        Ok(Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            date,
            items,
            rating,
        })
    }
}
