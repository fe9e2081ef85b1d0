//! Closet browsing filters.

use serde::{Deserialize, Serialize};

use crate::item::{CategoryL1, ClothingItem, Color, Season};

/// Criteria for listing the closet. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosetFilter {
    #[serde(default)]
    pub category_l1: Option<CategoryL1>,

    /// AllYear items always pass a season filter
    #[serde(default)]
    pub season: Option<Season>,

    #[serde(default)]
    pub color: Option<Color>,

    /// Case-insensitive substring of the subtype
    #[serde(default)]
    pub search: Option<String>,
}

impl ClosetFilter {
    pub fn matches(&self, item: &ClothingItem) -> bool {
        if item.is_deleted {
            return false;
        }
        if self.category_l1.is_some_and(|c| c != item.category_l1) {
            return false;
        }
        if let Some(season) = self.season {
            if item.season != season && item.season != Season::AllYear {
                return false;
            }
        }
        if self.color.is_some_and(|c| c != item.color) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => item
                .category_l2
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            _ => true,
        }
    }

    pub fn apply<'a>(&self, items: &'a [ClothingItem]) -> Vec<&'a ClothingItem> {
        items.iter().filter(|i| self.matches(i)).collect()
    }
}

/// Soft-deleted items, most recently trashed first
pub fn trash_listing(items: &[ClothingItem]) -> Vec<&ClothingItem> {
    let mut trashed: Vec<&ClothingItem> = items.iter().filter(|i| i.is_deleted).collect();
    trashed.sort_by(|a, b| b.trash_date.cmp(&a.trash_date));
    trashed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemId;
    use chrono::{Duration, Utc};

    fn item(id: &str, l1: CategoryL1, l2: &str, color: Color, season: Season) -> ClothingItem {
        ClothingItem::new(
            ItemId::new(id),
            "AAAA".to_string(),
            l1,
            l2.to_string(),
            color,
            season,
            Utc::now(),
        )
    }

    #[test]
    fn test_season_filter_keeps_all_year() {
        let items = vec![
            item("a", CategoryL1::Top, "T-Shirt", Color::White, Season::Warm),
            item("b", CategoryL1::Top, "Coat", Color::Black, Season::Cold),
            item("c", CategoryL1::Top, "Shirt", Color::Blue, Season::AllYear),
        ];
        let filter = ClosetFilter {
            season: Some(Season::Warm),
            ..Default::default()
        };
        let ids: Vec<&str> = filter.apply(&items).iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_search_and_trash_exclusion() {
        let mut hidden = item("b", CategoryL1::Top, "Hoodie", Color::Gray, Season::Cold);
        hidden.soft_delete(Utc::now());
        let items = vec![
            item("a", CategoryL1::Top, "Zip Hoodie", Color::Gray, Season::Cold),
            hidden,
        ];
        let filter = ClosetFilter {
            search: Some("hood".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.apply(&items).len(), 1);
    }

    #[test]
    fn test_trash_listing_order() {
        let now = Utc::now();
        let mut older = item("old", CategoryL1::Hat, "Cap", Color::Red, Season::Warm);
        older.soft_delete(now - Duration::hours(2));
        let mut newer = item("new", CategoryL1::Hat, "Beanie", Color::Red, Season::Cold);
        newer.soft_delete(now);
        let kept = item("kept", CategoryL1::Hat, "Cap", Color::Red, Season::Warm);

        let items = vec![older, kept, newer];
        let ids: Vec<&str> = trash_listing(&items).iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);
    }
}
