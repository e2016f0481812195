use enumflags2::BitFlags;
use shipyard::Component;

use crate::shared::constants::CombatFlag;

/// Unit states relevant to threat: GM mode, roots, immunities...
#[derive(Component, Default)]
pub struct CombatFlags(pub BitFlags<CombatFlag>);

impl CombatFlags {
    pub fn has(&self, flag: CombatFlag) -> bool {
        self.0.contains(flag)
    }

    pub fn set(&mut self, flag: CombatFlag, enabled: bool) {
        if enabled {
            self.0.insert(flag);
        } else {
            self.0.remove(flag);
        }
    }
}
