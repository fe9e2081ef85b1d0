//! Add/edit form payload and how it becomes an item.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::CategoryStructure;
use crate::error::{Error, Result};
use crate::item::{CategoryL1, ClothingItem, Color, ItemId, ItemPatch, Season};

/// Item as submitted from the add/edit form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDraft {
    pub image_data: String,

    #[serde(default = "default_category")]
    pub category_l1: CategoryL1,

    #[serde(default)]
    pub category_l2: Option<String>,

    /// New subtype typed by the user; registered on save
    #[serde(default)]
    pub custom_category_l2: Option<String>,

    #[serde(default)]
    pub color: Color,

    #[serde(default = "default_season")]
    pub season: Season,
}

fn default_category() -> CategoryL1 {
    CategoryL1::Top
}

fn default_season() -> Season {
    Season::AllYear
}

impl ItemDraft {
    pub fn new(image_data: impl Into<String>) -> Self {
        Self {
            image_data: image_data.into(),
            category_l1: default_category(),
            category_l2: None,
            custom_category_l2: None,
            color: Color::default(),
            season: default_season(),
        }
    }

    /// Pick the subtype to store, registering a custom one if given.
    ///
    /// A custom subtype wins; otherwise an empty choice falls back to the first
    /// registered subtype of the category, or stays empty when there is none.
    pub fn resolve_subtype(&self, categories: &mut CategoryStructure) -> String {
        if let Some(custom) = self
            .custom_category_l2
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            categories.append(self.category_l1, custom);
            return custom.to_string();
        }

        match self.category_l2.as_deref().map(str::trim) {
            Some(chosen) if !chosen.is_empty() => chosen.to_string(),
            _ => categories
                .default_subtype(self.category_l1)
                .unwrap_or_default()
                .to_string(),
        }
    }

    /// Build a new item from the draft
    pub fn into_item(
        self,
        categories: &mut CategoryStructure,
        now: DateTime<Utc>,
    ) -> Result<ClothingItem> {
        self.validate()?;
        let category_l2 = self.resolve_subtype(categories);
        Ok(ClothingItem::new(
            ItemId::generate(),
            self.image_data,
            self.category_l1,
            category_l2,
            self.color,
            self.season,
            now,
        ))
    }

    /// Build the patch that rewrites an existing item with this draft
    pub fn into_patch(self, categories: &mut CategoryStructure) -> Result<ItemPatch> {
        self.validate()?;
        let category_l2 = self.resolve_subtype(categories);
        Ok(ItemPatch {
            image_data: Some(self.image_data),
            category_l1: Some(self.category_l1),
            category_l2: Some(category_l2),
            color: Some(self.color),
            season: Some(self.season),
            trash: None,
        })
    }

    fn validate(&self) -> Result<()> {
        if self.image_data.trim().is_empty() {
            return Err(Error::Validation("an image is required".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_subtype_is_registered() {
        let mut cats = CategoryStructure::default();
        let mut draft = ItemDraft::new("AAAA");
        draft.category_l1 = CategoryL1::Bottom;
        draft.category_l2 = Some("Jeans".to_string());
        draft.custom_category_l2 = Some(" Cargo Pants ".to_string());

        let item = draft.into_item(&mut cats, Utc::now()).unwrap();
        assert_eq!(item.category_l2, "Cargo Pants");
        assert!(cats.contains(CategoryL1::Bottom, "Cargo Pants"));
        assert!(!item.is_deleted);
    }

    #[test]
    fn test_empty_subtype_falls_back_to_first() {
        let mut cats = CategoryStructure::default();
        let mut draft = ItemDraft::new("AAAA");
        draft.category_l1 = CategoryL1::Shoes;

        let item = draft.into_item(&mut cats, Utc::now()).unwrap();
        assert_eq!(item.category_l2, "Sneakers");
    }

    #[test]
    fn test_missing_image_is_rejected() {
        let mut cats = CategoryStructure::default();
        let err = ItemDraft::new("  ")
            .into_item(&mut cats, Utc::now())
            .unwrap_err();
        assert!(err.is_policy());
    }

    #[test]
    fn test_patch_carries_every_form_field() {
        let mut cats = CategoryStructure::default();
        let mut draft = ItemDraft::new("BBBB");
        draft.season = Season::Warm;
        let patch = draft.into_patch(&mut cats).unwrap();
        assert_eq!(patch.image_data.as_deref(), Some("BBBB"));
        assert_eq!(patch.category_l2.as_deref(), Some("T-Shirt"));
        assert_eq!(patch.season, Some(Season::Warm));
        assert!(patch.trash.is_none());
    }
}
