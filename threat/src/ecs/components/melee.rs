use shipyard::Component;

use crate::{entities::position::WorldPosition, shared::constants::BASE_MELEE_RANGE_OFFSET};

#[derive(Component)]
pub struct Melee {
    pub melee_reach: f32, // How far the unit can reach with its melee weapons
}

impl Melee {
    pub fn new(melee_reach: f32) -> Self {
        Self { melee_reach }
    }

    pub fn can_reach_target_in_melee(
        &self,
        my_position: &WorldPosition,
        target_position: &WorldPosition,
        target_melee_reach: f32,
    ) -> bool {
        let total_reach = self.melee_reach + target_melee_reach + BASE_MELEE_RANGE_OFFSET;

        my_position
            .distance_to(target_position, true)
            .map(|distance| distance <= total_reach)
            .unwrap_or(false)
    }
}
