use std::{collections::HashMap, time::Duration};

use shipyard::{EntityId, Unique};

use crate::entities::object_guid::ObjectGuid;

#[derive(Unique, Default)]
pub struct DeltaTime(pub Duration);

/// Resolves the stable guid of a unit to its live entity, if it is still in the world.
#[derive(Unique, Default)]
pub struct EntityIndex(HashMap<ObjectGuid, EntityId>);

impl EntityIndex {
    pub fn insert(&mut self, guid: ObjectGuid, entity_id: EntityId) {
        self.0.insert(guid, entity_id);
    }

    pub fn remove(&mut self, guid: &ObjectGuid) -> Option<EntityId> {
        self.0.remove(guid)
    }

    pub fn lookup(&self, guid: &ObjectGuid) -> Option<EntityId> {
        self.0.get(guid).copied()
    }
}
