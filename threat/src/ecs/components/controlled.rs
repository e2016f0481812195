use shipyard::{Component, EntityId};

/// Pets, minions and charmed units
#[derive(Component)]
pub struct Controlled {
    pub master: EntityId,
}
