//! Arena of placed entities with an id index

use super::Entity;
use crate::core::types::EntityId;
use ahash::AHashMap;

/// The current placed-entity set
#[derive(Debug, Clone, Default)]
pub struct EntitySet {
    entities: Vec<Entity>,
    index: AHashMap<EntityId, usize>,
}

impl EntitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entities(entities: impl IntoIterator<Item = Entity>) -> Self {
        let mut set = Self::new();
        for entity in entities {
            set.upsert(entity);
        }
        set
    }

    /// Insert or replace an entity, returning the previous version
    pub fn upsert(&mut self, entity: Entity) -> Option<Entity> {
        match self.index.get(&entity.id) {
            Some(&idx) => Some(std::mem::replace(&mut self.entities[idx], entity)),
            None => {
                self.index.insert(entity.id, self.entities.len());
                self.entities.push(entity);
                None
            }
        }
    }

    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let idx = self.index.remove(&id)?;
        let removed = self.entities.swap_remove(idx);
        if let Some(moved) = self.entities.get(idx) {
            self.index.insert(moved.id, idx);
        }
        Some(removed)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.index.get(&id).map(|&idx| &self.entities[idx])
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.index.get(&id).map(|&idx| &mut self.entities[idx])
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.iter().map(|e| e.id)
    }

    pub fn as_slice(&self) -> &[Entity] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityProperties;
    use geo_types::{LineString, Polygon};

    fn entity() -> Entity {
        let poly = Polygon::new(
            LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]),
            vec![],
        );
        Entity::new(EntityId::new(), poly, EntityProperties::default())
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut set = EntitySet::new();
        let mut e = entity();
        assert!(set.upsert(e.clone()).is_none());
        e.properties.name = "renamed".into();
        let previous = set.upsert(e.clone()).unwrap();
        assert_eq!(previous.properties.name, "");
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(e.id).unwrap().properties.name, "renamed");
    }

    #[test]
    fn test_remove_keeps_index_consistent() {
        let a = entity();
        let b = entity();
        let c = entity();
        let mut set = EntitySet::from_entities(vec![a.clone(), b.clone(), c.clone()]);

        assert!(set.remove(a.id).is_some());
        assert!(set.remove(a.id).is_none());
        assert_eq!(set.len(), 2);
        // c was swapped into a's slot
        assert_eq!(set.get(c.id).unwrap().id, c.id);
        assert_eq!(set.get(b.id).unwrap().id, b.id);
    }
}
