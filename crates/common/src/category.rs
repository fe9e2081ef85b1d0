//! User-extensible subtype lists per top-level category.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::item::CategoryL1;

/// Ordered, de-duplicated subtypes for each [`CategoryL1`].
///
/// Subtypes can be appended but never removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryStructure(BTreeMap<CategoryL1, Vec<String>>);

impl CategoryStructure {
    /// Subtypes registered under `category`, in insertion order
    pub fn subtypes(&self, category: CategoryL1) -> &[String] {
        self.0.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First registered subtype, used when an item is saved without one
    pub fn default_subtype(&self, category: CategoryL1) -> Option<&str> {
        self.subtypes(category).first().map(String::as_str)
    }

    pub fn contains(&self, category: CategoryL1, subtype: &str) -> bool {
        self.subtypes(category).iter().any(|s| s == subtype)
    }

    /// Append a subtype. Returns false for blanks and duplicates.
    pub fn append(&mut self, category: CategoryL1, subtype: &str) -> bool {
        let subtype = subtype.trim();
        if subtype.is_empty() || self.contains(category, subtype) {
            return false;
        }
        self.0.entry(category).or_default().push(subtype.to_string());
        true
    }
}

impl Default for CategoryStructure {
    fn default() -> Self {
        let seed = |names: &[&str]| names.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let mut map = BTreeMap::new();
        map.insert(
            CategoryL1::Top,
            seed(&["T-Shirt", "Hoodie", "Shirt", "Jacket", "Coat"]),
        );
        map.insert(
            CategoryL1::Bottom,
            seed(&["Jeans", "Shorts", "Sweatpants", "Skirt"]),
        );
        map.insert(
            CategoryL1::Shoes,
            seed(&["Sneakers", "Boots", "Sandals", "Formal"]),
        );
        map.insert(CategoryL1::Dress, seed(&["Casual", "Evening", "Sundress"]));
        map.insert(CategoryL1::Hat, seed(&["Cap", "Beanie", "Bucket Hat"]));
        Self(map)
    }
}
