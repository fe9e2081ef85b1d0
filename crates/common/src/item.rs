//! Clothing items and their tag vocabulary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Current time, truncated to the millisecond precision items are stored with
pub fn timestamp_now() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

/// Unique identifier of a clothing item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Wrap an existing identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Top-level clothing category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CategoryL1 {
    Top,
    Bottom,
    Shoes,
    Dress,
    Hat,
}

impl CategoryL1 {
    pub const ALL: [CategoryL1; 5] = [
        CategoryL1::Top,
        CategoryL1::Bottom,
        CategoryL1::Shoes,
        CategoryL1::Dress,
        CategoryL1::Hat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryL1::Top => "Top",
            CategoryL1::Bottom => "Bottom",
            CategoryL1::Shoes => "Shoes",
            CategoryL1::Dress => "Dress",
            CategoryL1::Hat => "Hat",
        }
    }
}

impl fmt::Display for CategoryL1 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryL1 {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        CategoryL1::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::Validation(format!("unknown category: {}", s)))
    }
}

/// Season an item is suitable for.
///
/// The serialized names match the labels used by existing guest snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    #[serde(rename = "Warm (Summer/Spring)", alias = "Warm")]
    Warm,
    #[serde(rename = "Cold (Winter/Fall)", alias = "Cold")]
    Cold,
    #[serde(rename = "All Year", alias = "All", alias = "AllYear")]
    AllYear,
}

impl Season {
    /// Whether this season carries a warm/cold signal
    pub fn is_definite(&self) -> bool {
        !matches!(self, Season::AllYear)
    }

    /// Warm and Cold oppose each other; AllYear opposes nothing.
    pub fn opposes(&self, other: Season) -> bool {
        matches!(
            (self, other),
            (Season::Warm, Season::Cold) | (Season::Cold, Season::Warm)
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            Season::Warm => "Warm (Summer/Spring)",
            Season::Cold => "Cold (Winter/Fall)",
            Season::AllYear => "All Year",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Season {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        if normalized.starts_with("warm") {
            Ok(Season::Warm)
        } else if normalized.starts_with("cold") {
            Ok(Season::Cold)
        } else if normalized.starts_with("all") {
            Ok(Season::AllYear)
        } else {
            Err(Error::Validation(format!("unknown season: {}", s)))
        }
    }
}

/// Fixed color palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Black,
    White,
    Gray,
    Red,
    Blue,
    Yellow,
    Green,
    Purple,
    Pink,
    Brown,
    Beige,
    Orange,
}

impl Color {
    pub const PALETTE: [Color; 12] = [
        Color::Black,
        Color::White,
        Color::Gray,
        Color::Red,
        Color::Blue,
        Color::Yellow,
        Color::Green,
        Color::Purple,
        Color::Pink,
        Color::Brown,
        Color::Beige,
        Color::Orange,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Black => "Black",
            Color::White => "White",
            Color::Gray => "Gray",
            Color::Red => "Red",
            Color::Blue => "Blue",
            Color::Yellow => "Yellow",
            Color::Green => "Green",
            Color::Purple => "Purple",
            Color::Pink => "Pink",
            Color::Brown => "Brown",
            Color::Beige => "Beige",
            Color::Orange => "Orange",
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::PALETTE[0]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Color::PALETTE
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::Validation(format!("unknown color: {}", s)))
    }
}

/// A clothing item in the closet.
///
/// `trash_date` is set exactly when `is_deleted` is true; use [`ClothingItem::apply`]
/// or the trash helpers rather than touching the two fields separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClothingItem {
    pub id: ItemId,

    /// Base64 image payload, optionally with a `data:` URL prefix
    pub image_data: String,

    pub category_l1: CategoryL1,

    pub category_l2: String,

    pub color: Color,

    pub season: Season,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub is_deleted: bool,

    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub trash_date: Option<DateTime<Utc>>,
}

impl ClothingItem {
    pub fn new(
        id: ItemId,
        image_data: String,
        category_l1: CategoryL1,
        category_l2: String,
        color: Color,
        season: Season,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            image_data,
            category_l1,
            category_l2,
            color,
            season,
            created_at,
            is_deleted: false,
            trash_date: None,
        }
    }

    /// Move the item to the trash
    pub fn soft_delete(&mut self, at: DateTime<Utc>) {
        self.is_deleted = true;
        self.trash_date = Some(at);
    }

    /// Take the item back out of the trash
    pub fn restore(&mut self) {
        self.is_deleted = false;
        self.trash_date = None;
    }

    /// Apply a partial update in place
    pub fn apply(&mut self, patch: &ItemPatch) {
        if let Some(image_data) = &patch.image_data {
            self.image_data = image_data.clone();
        }
        if let Some(category_l1) = patch.category_l1 {
            self.category_l1 = category_l1;
        }
        if let Some(category_l2) = &patch.category_l2 {
            self.category_l2 = category_l2.clone();
        }
        if let Some(color) = patch.color {
            self.color = color;
        }
        if let Some(season) = patch.season {
            self.season = season;
        }
        match patch.trash {
            Some(TrashChange::Trash { at }) => self.soft_delete(at),
            Some(TrashChange::Restore) => self.restore(),
            None => {}
        }
    }
}

/// Trash transition carried by a patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum TrashChange {
    Trash {
        #[serde(with = "chrono::serde::ts_milliseconds")]
        at: DateTime<Utc>,
    },
    Restore,
}

/// Partial update of a clothing item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_l1: Option<CategoryL1>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_l2: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<Season>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trash: Option<TrashChange>,
}

impl ItemPatch {
    pub fn trash(at: DateTime<Utc>) -> Self {
        Self {
            trash: Some(TrashChange::Trash { at }),
            ..Default::default()
        }
    }

    pub fn restore() -> Self {
        Self {
            trash: Some(TrashChange::Restore),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == ItemPatch::default()
    }
}
