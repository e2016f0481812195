use enumflags2::BitFlags;
use log::{debug, info};
use shipyard::{EntityId, Get, UniqueView, View};

use crate::{
    entities::{object_guid::ObjectGuid, position::WorldPosition},
    game::combat_context::{AuraAccessor, ThreatListObserver, UnitAccessor},
    shared::constants::{CombatFlag, SpellSchoolMask, PLAYER_DEFAULT_COMBAT_REACH},
};

use super::{
    components::{
        combat_flags::CombatFlags, controlled::Controlled, guid::Guid, health::Health,
        melee::Melee, threat_auras::ThreatAuras,
    },
    resources::EntityIndex,
};

/// Read-only storages the threat engine looks at while a system mutates threat lists
pub type CombatViews<'v> = (
    UniqueView<'v, EntityIndex>,
    View<'v, Guid>,
    View<'v, Health>,
    View<'v, WorldPosition>,
    View<'v, Melee>,
    View<'v, CombatFlags>,
    View<'v, ThreatAuras>,
    View<'v, Controlled>,
);

pub struct EcsCombatContext<'v> {
    index: UniqueView<'v, EntityIndex>,
    v_guid: View<'v, Guid>,
    v_health: View<'v, Health>,
    v_wpos: View<'v, WorldPosition>,
    v_melee: View<'v, Melee>,
    v_flags: View<'v, CombatFlags>,
    v_auras: View<'v, ThreatAuras>,
    v_controlled: View<'v, Controlled>,
}

impl<'v> From<CombatViews<'v>> for EcsCombatContext<'v> {
    fn from(views: CombatViews<'v>) -> Self {
        let (index, v_guid, v_health, v_wpos, v_melee, v_flags, v_auras, v_controlled) = views;

        Self {
            index,
            v_guid,
            v_health,
            v_wpos,
            v_melee,
            v_flags,
            v_auras,
            v_controlled,
        }
    }
}

impl<'v> EcsCombatContext<'v> {
    /// Guid of `unit` for the logs, falling back to its entity id
    pub fn describe(&self, unit: EntityId) -> String {
        self.guid_of(unit)
            .map(|guid| guid.to_string())
            .unwrap_or_else(|| format!("{unit:?}"))
    }

    fn has_flag(&self, unit: EntityId, flag: CombatFlag) -> bool {
        self.v_flags
            .get(unit)
            .map(|flags| flags.has(flag))
            .unwrap_or(false)
    }

    fn melee_reach(&self, unit: EntityId) -> f32 {
        self.v_melee
            .get(unit)
            .map(|melee| melee.melee_reach)
            .unwrap_or(PLAYER_DEFAULT_COMBAT_REACH)
    }
}

impl<'v> UnitAccessor for EcsCombatContext<'v> {
    fn lookup_entity(&self, guid: &ObjectGuid) -> Option<EntityId> {
        self.index.lookup(guid)
    }

    fn guid_of(&self, unit: EntityId) -> Option<ObjectGuid> {
        self.v_guid.get(unit).map(|guid| guid.0).ok()
    }

    fn is_alive(&self, unit: EntityId) -> bool {
        self.v_health
            .get(unit)
            .map(|health| health.is_alive())
            .unwrap_or(false)
    }

    fn is_player(&self, unit: EntityId) -> bool {
        self.guid_of(unit)
            .map(|guid| guid.is_player())
            .unwrap_or(false)
    }

    fn is_game_master(&self, unit: EntityId) -> bool {
        self.has_flag(unit, CombatFlag::GameMaster)
    }

    fn is_offline_target(&self, unit: EntityId, target: EntityId) -> bool {
        self.is_game_master(target)
            || self.has_flag(target, CombatFlag::Unreachable)
            || self.combat_distance(unit, target).is_none()
    }

    fn can_reach_with_melee_attack(&self, attacker: EntityId, target: EntityId) -> bool {
        let (Ok(melee), Ok(my_position), Ok(target_position)) = (
            self.v_melee.get(attacker),
            self.v_wpos.get(attacker),
            self.v_wpos.get(target),
        ) else {
            return false;
        };

        melee.can_reach_target_in_melee(my_position, target_position, self.melee_reach(target))
    }

    fn can_attack(&self, _attacker: EntityId, target: EntityId) -> bool {
        self.is_alive(target) && !self.has_flag(target, CombatFlag::NotAttackable)
    }

    fn combat_distance(&self, unit: EntityId, other: EntityId) -> Option<f32> {
        let my_position = self.v_wpos.get(unit).ok()?;
        let other_position = self.v_wpos.get(other).ok()?;
        let distance = my_position.distance_to(other_position, true)?;

        Some((distance - self.melee_reach(unit) - self.melee_reach(other)).max(0.))
    }

    fn is_ignoring_ranged_targets(&self, unit: EntityId) -> bool {
        self.has_flag(unit, CombatFlag::IgnoreRangedTargets)
    }

    fn is_ignoring_misdirection(&self, unit: EntityId) -> bool {
        self.has_flag(unit, CombatFlag::IgnoreMisdirection)
    }

    fn has_no_threat_state(&self, unit: EntityId) -> bool {
        self.has_flag(unit, CombatFlag::NoThreat)
    }

    fn is_support_threat_only(&self, unit: EntityId) -> bool {
        self.has_flag(unit, CombatFlag::SupportThreatOnly)
    }

    fn master_of(&self, unit: EntityId) -> Option<EntityId> {
        self.v_controlled
            .get(unit)
            .map(|controlled| controlled.master)
            .ok()
    }

    fn is_propagating_threat_to_owner(&self, unit: EntityId) -> bool {
        self.has_flag(unit, CombatFlag::PropagateThreatToOwner)
    }

    fn can_join_in_attacking(&self, unit: EntityId, enemy: EntityId) -> bool {
        self.is_alive(unit)
            && !self.is_game_master(unit)
            && !self.has_flag(unit, CombatFlag::NotAttackable)
            && self.combat_distance(unit, enemy).is_some()
    }

    fn is_suppressed_target(&self, unit: EntityId, target: EntityId) -> bool {
        let Some(target_guid) = self.guid_of(target) else {
            return false;
        };

        self.v_auras
            .get(unit)
            .map(|auras| auras.is_suppressing(&target_guid))
            .unwrap_or(false)
    }

    fn can_have_threat_list(&self, unit: EntityId) -> bool {
        self.is_alive(unit) && !self.is_player(unit)
    }
}

impl<'v> AuraAccessor for EcsCombatContext<'v> {
    fn taunt_casters(&self, unit: EntityId) -> Vec<ObjectGuid> {
        self.v_auras
            .get(unit)
            .map(|auras| auras.taunt_casters().to_vec())
            .unwrap_or_default()
    }

    fn has_detaunt_from(&self, unit: EntityId, caster: EntityId) -> bool {
        self.v_auras
            .get(unit)
            .map(|auras| auras.has_detaunt_from(caster))
            .unwrap_or(false)
    }

    fn critical_threat_multiplier(
        &self,
        unit: EntityId,
        school_mask: BitFlags<SpellSchoolMask>,
    ) -> f32 {
        self.v_auras
            .get(unit)
            .map(|auras| auras.critical_threat_multiplier(school_mask))
            .unwrap_or(1.)
    }

    fn apply_total_threat_modifier(
        &self,
        unit: EntityId,
        threat: f32,
        school_mask: BitFlags<SpellSchoolMask>,
    ) -> f32 {
        self.v_auras
            .get(unit)
            .map(|auras| threat * auras.total_threat_multiplier(school_mask))
            .unwrap_or(threat)
    }

    fn apply_spell_threat_mod(&self, unit: EntityId, spell_id: u32, threat: f32) -> f32 {
        self.v_auras
            .get(unit)
            .map(|auras| threat * auras.spell_threat_multiplier(spell_id))
            .unwrap_or(threat)
    }

    fn threat_redirection_target(&self, unit: EntityId) -> Option<EntityId> {
        self.v_auras.get(unit).ok().and_then(|auras| auras.redirect_to())
    }
}

impl<'v> ThreatListObserver for EcsCombatContext<'v> {
    fn threat_list_cleared(&self, owner: EntityId) {
        info!("SMSG_THREAT_CLEAR for {}", self.describe(owner));
    }

    fn current_victim_changed(&self, owner: EntityId, victim: &ObjectGuid) {
        info!("SMSG_HIGHEST_THREAT_UPDATE: {} now attacks {victim}", self.describe(owner));
    }

    fn removed_from_threat_list(&self, owner: EntityId, victim: &ObjectGuid) {
        info!("SMSG_THREAT_REMOVE: {victim} from {}", self.describe(owner));
    }

    fn aggro_linked(&self, owner: EntityId, victim: EntityId) {
        debug!("{} linked to {}", self.describe(owner), self.describe(victim));
    }
}
