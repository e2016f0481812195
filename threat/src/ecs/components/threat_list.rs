use shipyard::{Component, EntityId};

use crate::{config::ThreatSettings, game::threat_manager::ThreatManager};

#[derive(Component)]
pub struct ThreatList {
    manager: ThreatManager,
}

impl ThreatList {
    pub fn new(owner: EntityId, settings: ThreatSettings) -> Self {
        Self {
            manager: ThreatManager::new(owner, settings),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.manager.is_threat_list_empty() && self.manager.offline_list().is_empty()
    }

    pub fn manager(&self) -> &ThreatManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut ThreatManager {
        &mut self.manager
    }
}
