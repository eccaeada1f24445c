//! Authoritative entity store

use crate::entity::{Entity, EntityType};
use crate::error::{EngineError, Result};
use rio_math::Vec2;
use rio_physics::PhysicsSystem;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Owns every live entity, indexed by id and by type.
///
/// Iteration is in id order so updates and queries are deterministic.
#[derive(Debug, Default)]
pub struct EntityManager {
    entities: BTreeMap<String, Entity>,
    by_type: HashMap<EntityType, BTreeSet<String>>,
}

impl EntityManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entity. Ids are unique.
    pub fn add(&mut self, entity: Entity) -> Result<()> {
        if self.entities.contains_key(entity.id()) {
            return Err(EngineError::DuplicateEntity(entity.id().to_string()));
        }
        self.by_type
            .entry(entity.entity_type())
            .or_default()
            .insert(entity.id().to_string());
        self.entities.insert(entity.id().to_string(), entity);
        Ok(())
    }

    /// Remove an entity, releasing its body.
    pub fn remove(&mut self, id: &str, physics: &mut PhysicsSystem) -> Option<Entity> {
        let mut entity = self.entities.remove(id)?;
        if let Some(ids) = self.by_type.get_mut(&entity.entity_type()) {
            ids.remove(id);
        }
        entity.destroy(physics);
        Some(entity)
    }

    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entities.contains_key(id)
    }

    pub fn by_type(&self, entity_type: EntityType) -> Vec<&Entity> {
        self.by_type
            .get(&entity_type)
            .map(|ids| ids.iter().filter_map(|id| self.entities.get(id)).collect())
            .unwrap_or_default()
    }

    /// Ids of one type, in id order
    pub fn ids_of_type(&self, entity_type: EntityType) -> Vec<String> {
        self.by_type
            .get(&entity_type)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn all(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn all_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.values_mut()
    }

    pub fn active(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values().filter(|e| e.is_active())
    }

    /// Active entities within `radius` of `center`
    pub fn in_radius(&self, center: Vec2, radius: f32) -> Vec<&Entity> {
        let r2 = radius * radius;
        self.active()
            .filter(|e| (e.position() - center).length_squared() <= r2)
            .collect()
    }

    /// Update every active entity
    pub fn update_all(&mut self, delta_ms: f32, physics: &mut PhysicsSystem) {
        for entity in self.entities.values_mut() {
            entity.update(delta_ms, physics);
        }
    }

    /// Push pending kinematic changes of every entity to physics
    pub fn flush_all(&mut self, physics: &mut PhysicsSystem) {
        for entity in self.entities.values_mut() {
            entity.flush_to_physics(physics);
        }
    }

    /// Ids whose active flag has gone false
    pub fn inactive_ids(&self) -> Vec<String> {
        self.entities
            .values()
            .filter(|e| !e.is_active())
            .map(|e| e.id().to_string())
            .collect()
    }

    /// Remove every entity and its body
    pub fn clear(&mut self, physics: &mut PhysicsSystem) {
        for (_, mut entity) in std::mem::take(&mut self.entities) {
            entity.destroy(physics);
        }
        self.by_type.clear();
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn count_by_type(&self, entity_type: EntityType) -> usize {
        self.by_type.get(&entity_type).map(|ids| ids.len()).unwrap_or(0)
    }

    pub fn active_count(&self) -> usize {
        self.active().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{CollectibleType, Obstacle, ObstacleType};

    fn populated() -> EntityManager {
        let mut manager = EntityManager::new();
        manager.add(Entity::player("player", Vec2::new(400.0, 450.0))).unwrap();
        manager
            .add(Entity::obstacle("rock_1", Vec2::new(420.0, 400.0), Obstacle::new(ObstacleType::Rock)))
            .unwrap();
        manager
            .add(Entity::obstacle("log_1", Vec2::new(100.0, 50.0), Obstacle::new(ObstacleType::Log)))
            .unwrap();
        manager
            .add(Entity::collectible("fish_1", Vec2::new(390.0, 470.0), CollectibleType::Fish))
            .unwrap();
        manager
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut manager = populated();
        let result = manager.add(Entity::player("player", Vec2::ZERO));
        assert!(matches!(result, Err(EngineError::DuplicateEntity(_))));
        assert_eq!(manager.len(), 4);
    }

    #[test]
    fn test_type_index() {
        let mut manager = populated();
        let mut physics = PhysicsSystem::default();
        assert_eq!(manager.count_by_type(EntityType::Obstacle), 2);
        assert_eq!(manager.ids_of_type(EntityType::Obstacle), vec!["log_1", "rock_1"]);

        manager.remove("rock_1", &mut physics);
        assert_eq!(manager.count_by_type(EntityType::Obstacle), 1);
        assert!(manager.by_type(EntityType::Npc).is_empty());
    }

    #[test]
    fn test_in_radius() {
        let manager = populated();
        let mut near: Vec<&str> = manager
            .in_radius(Vec2::new(400.0, 450.0), 60.0)
            .into_iter()
            .map(|e| e.id())
            .collect();
        near.sort();
        assert_eq!(near, vec!["fish_1", "player", "rock_1"]);
    }

    #[test]
    fn test_inactive_ids() {
        let mut manager = populated();
        manager.get_mut("fish_1").unwrap().deactivate();
        assert_eq!(manager.inactive_ids(), vec!["fish_1".to_string()]);
        assert_eq!(manager.active_count(), 3);
    }

    #[test]
    fn test_clear_releases_bodies() {
        use rio_physics::{BodyOptions, BodyShape};

        let mut manager = EntityManager::new();
        let mut physics = PhysicsSystem::default();
        let mut player = Entity::player("player", Vec2::ZERO);
        let handle = physics
            .create_body("player", BodyShape::rect(40.0, 80.0), Vec2::ZERO, BodyOptions::solid())
            .unwrap();
        player.attach_body(handle);
        manager.add(player).unwrap();

        manager.clear(&mut physics);
        assert!(manager.is_empty());
        assert_eq!(physics.body_count(), 0);
    }
}
