//! Pickups floating downstream

use serde::{Deserialize, Serialize};

/// Downstream drift acceleration (px/s²)
pub const COLLECTIBLE_DRIFT: f32 = 18.0;
/// Pickup sensor radius in px
pub const COLLECTIBLE_RADIUS: f32 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CollectibleType {
    Fish,
    HealthPack,
    Specimen,
    SpeedBoost,
}

impl CollectibleType {
    /// Points for FISH/SPECIMEN, health for HEALTH_PACK, seconds for SPEED_BOOST
    pub fn value(self) -> f32 {
        match self {
            CollectibleType::Fish => 25.0,
            CollectibleType::HealthPack => 30.0,
            CollectibleType::Specimen => 50.0,
            CollectibleType::SpeedBoost => 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Collectible {
    collectible_type: CollectibleType,
    value: f32,
    collected: bool,
    pub drift: f32,
}

impl Collectible {
    pub fn new(collectible_type: CollectibleType) -> Self {
        Self {
            collectible_type,
            value: collectible_type.value(),
            collected: false,
            drift: COLLECTIBLE_DRIFT,
        }
    }

    pub fn collectible_type(&self) -> CollectibleType {
        self.collectible_type
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn is_collected(&self) -> bool {
        self.collected
    }

    /// Mark collected. Only the first call returns true.
    pub(crate) fn collect(&mut self) -> bool {
        if self.collected {
            return false;
        }
        self.collected = true;
        log::debug!("{:?} collected, value {}", self.collectible_type, self.value);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values() {
        assert_eq!(Collectible::new(CollectibleType::Fish).value(), 25.0);
        assert_eq!(Collectible::new(CollectibleType::HealthPack).value(), 30.0);
        assert_eq!(Collectible::new(CollectibleType::Specimen).value(), 50.0);
        assert_eq!(Collectible::new(CollectibleType::SpeedBoost).value(), 5.0);
    }

    #[test]
    fn test_collect_once() {
        let mut fish = Collectible::new(CollectibleType::Fish);
        assert!(fish.collect());
        assert!(!fish.collect());
        assert!(fish.is_collected());
    }
}
