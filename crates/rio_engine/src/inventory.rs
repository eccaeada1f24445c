//! Player inventory

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Well-known item ids used by gameplay code
pub mod items {
    pub const HARPOON: &str = "harpoon";
    pub const CAMERA: &str = "camera";
    pub const COMPASS: &str = "compass";
    pub const MEDICINE: &str = "medicine";
    pub const DRIED_FISH: &str = "dried_fish";
}

/// Owned item counts plus gold.
///
/// Counts never go below zero; an item whose count reaches zero is removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    items: BTreeMap<String, u32>,
    gold: u32,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starting kit for a fresh expedition
    pub fn starter() -> Self {
        let mut inventory = Self::new();
        inventory.add(items::HARPOON, 1);
        inventory.add(items::COMPASS, 1);
        inventory.add(items::DRIED_FISH, 3);
        inventory.gold = 50;
        inventory
    }

    /// Add `quantity` of an item. Returns the new count.
    pub fn add(&mut self, item_id: impl Into<String>, quantity: u32) -> u32 {
        let count = self.items.entry(item_id.into()).or_insert(0);
        *count = count.saturating_add(quantity);
        *count
    }

    /// Remove `quantity` of an item; fails without change when short.
    pub fn remove(&mut self, item_id: &str, quantity: u32) -> bool {
        let Some(count) = self.items.get_mut(item_id) else {
            return quantity == 0;
        };
        if *count < quantity {
            return false;
        }
        *count -= quantity;
        if *count == 0 {
            self.items.remove(item_id);
        }
        true
    }

    pub fn count(&self, item_id: &str) -> u32 {
        self.items.get(item_id).copied().unwrap_or(0)
    }

    pub fn has(&self, item_id: &str) -> bool {
        self.count(item_id) > 0
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Items in id order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.items.iter().map(|(id, count)| (id.as_str(), *count))
    }

    pub fn gold(&self) -> u32 {
        self.gold
    }

    pub fn add_gold(&mut self, amount: u32) {
        self.gold = self.gold.saturating_add(amount);
    }

    /// Spend gold; fails without change when short.
    pub fn spend_gold(&mut self, amount: u32) -> bool {
        if self.gold < amount {
            return false;
        }
        self.gold -= amount;
        true
    }

    pub fn harpoons(&self) -> u32 {
        self.count(items::HARPOON)
    }

    pub fn medicine(&self) -> u32 {
        self.count(items::MEDICINE)
    }

    pub fn has_camera(&self) -> bool {
        self.has(items::CAMERA)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_count() {
        let mut inv = Inventory::new();
        assert_eq!(inv.add("rubber", 2), 2);
        assert_eq!(inv.add("rubber", 3), 5);
        assert_eq!(inv.count("rubber"), 5);
        assert_eq!(inv.count("spices"), 0);
        assert!(inv.has("rubber"));
    }

    #[test]
    fn test_remove_insufficient() {
        let mut inv = Inventory::new();
        inv.add(items::MEDICINE, 1);
        assert!(!inv.remove(items::MEDICINE, 2));
        assert_eq!(inv.medicine(), 1);
        assert!(inv.remove(items::MEDICINE, 1));
        assert!(inv.is_empty());
    }

    #[test]
    fn test_gold() {
        let mut inv = Inventory::starter();
        assert_eq!(inv.gold(), 50);
        assert!(!inv.spend_gold(60));
        inv.add_gold(20);
        assert!(inv.spend_gold(60));
        assert_eq!(inv.gold(), 10);
        assert_eq!(inv.harpoons(), 1);
        assert!(!inv.has_camera());
    }
}
