//! Everything the threat engine needs to know about the world it runs in.
//!
//! The engine never owns units: it stores [`ObjectGuid`]s, resolves them to live
//! [`EntityId`]s on demand and asks these traits every question about reach,
//! liveness and auras.

use enumflags2::BitFlags;
use shipyard::EntityId;

use crate::{entities::object_guid::ObjectGuid, shared::constants::SpellSchoolMask};

pub trait UnitAccessor {
    /// Resolve a stable guid to the unit currently living in the world, if any.
    fn lookup_entity(&self, guid: &ObjectGuid) -> Option<EntityId>;

    fn guid_of(&self, unit: EntityId) -> Option<ObjectGuid>;

    fn is_alive(&self, unit: EntityId) -> bool;

    fn is_player(&self, unit: EntityId) -> bool;

    fn is_game_master(&self, unit: EntityId) -> bool;

    /// Whether `target` can currently not be attacked by `unit` (in flight, under water,
    /// evading...). Offline targets live in the offline container.
    fn is_offline_target(&self, unit: EntityId, target: EntityId) -> bool;

    fn can_reach_with_melee_attack(&self, attacker: EntityId, target: EntityId) -> bool;

    fn can_attack(&self, attacker: EntityId, target: EntityId) -> bool;

    /// Distance between the two combat reach spheres. `None` if not measurable (different
    /// maps).
    fn combat_distance(&self, unit: EntityId, other: EntityId) -> Option<f32>;

    /// Rooted units should not switch to targets they cannot hit in melee.
    fn is_ignoring_ranged_targets(&self, unit: EntityId) -> bool;

    fn is_ignoring_misdirection(&self, unit: EntityId) -> bool;

    /// Some NPCs cause no threat
    fn has_no_threat_state(&self, unit: EntityId) -> bool;

    fn is_support_threat_only(&self, unit: EntityId) -> bool;

    fn master_of(&self, unit: EntityId) -> Option<EntityId>;

    fn is_propagating_threat_to_owner(&self, unit: EntityId) -> bool;

    fn can_join_in_attacking(&self, unit: EntityId, enemy: EntityId) -> bool;

    fn is_suppressed_target(&self, unit: EntityId, target: EntityId) -> bool;

    fn can_have_threat_list(&self, unit: EntityId) -> bool;
}

pub trait AuraAccessor {
    /// Casters of the taunt auras currently applied on `unit`, in application order.
    fn taunt_casters(&self, unit: EntityId) -> Vec<ObjectGuid>;

    fn has_detaunt_from(&self, unit: EntityId, caster: EntityId) -> bool;

    /// Total multiplier of the "increased threat from critical hits" auras of `unit`.
    fn critical_threat_multiplier(&self, unit: EntityId, school_mask: BitFlags<SpellSchoolMask>)
        -> f32;

    fn apply_total_threat_modifier(
        &self,
        unit: EntityId,
        threat: f32,
        school_mask: BitFlags<SpellSchoolMask>,
    ) -> f32;

    /// Apply the caster-side spell modifiers on the threat of `spell_id`.
    fn apply_spell_threat_mod(&self, unit: EntityId, spell_id: u32, threat: f32) -> f32;

    /// Misdirection-like effects: the unit threat should be routed to.
    fn threat_redirection_target(&self, unit: EntityId) -> Option<EntityId>;
}

/// Outbound notifications, typically turned into packets for the clients.
pub trait ThreatListObserver {
    fn threat_list_cleared(&self, owner: EntityId);

    fn current_victim_changed(&self, owner: EntityId, victim: &ObjectGuid);

    fn removed_from_threat_list(&self, owner: EntityId, victim: &ObjectGuid);

    /// A new unit entered the threat list of `owner`, nearby allies may want to join.
    fn aggro_linked(&self, owner: EntityId, victim: EntityId);
}

pub trait CombatContext: UnitAccessor + AuraAccessor + ThreatListObserver {}

impl<T> CombatContext for T where T: UnitAccessor + AuraAccessor + ThreatListObserver {}
