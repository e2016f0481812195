use std::collections::HashMap;

use enumflags2::BitFlags;
use parking_lot::Mutex;
use shipyard::{EntityId, World};

use crate::{
    ecs::components::guid::Guid,
    entities::object_guid::ObjectGuid,
    shared::constants::{CombatFlag, HighGuidType, SpellSchoolMask},
};

use super::combat_context::{AuraAccessor, ThreatListObserver, UnitAccessor};

#[derive(Clone, Debug)]
pub struct MockUnit {
    pub alive: bool,
    pub in_world: bool,
    pub flags: BitFlags<CombatFlag>,
    pub offline: bool,
    pub in_melee: bool,
    pub attackable: bool,
    pub suppressed: bool,
    pub distance: f32, // Distance from the center of the fight
    pub master: Option<EntityId>,
    pub taunt_casters: Vec<ObjectGuid>,
    pub detaunted_by: Vec<EntityId>,
    pub spell_threat_multiplier: f32,
    pub critical_threat_multiplier: f32,
    pub total_threat_multiplier: f32,
    pub redirect_to: Option<EntityId>,
}

impl Default for MockUnit {
    fn default() -> Self {
        Self {
            alive: true,
            in_world: true,
            flags: BitFlags::empty(),
            offline: false,
            in_melee: true,
            attackable: true,
            suppressed: false,
            distance: 0.,
            master: None,
            taunt_casters: Vec::new(),
            detaunted_by: Vec::new(),
            spell_threat_multiplier: 1.,
            critical_threat_multiplier: 1.,
            total_threat_multiplier: 1.,
            redirect_to: None,
        }
    }
}

impl MockUnit {
    pub fn flag(mut self, flag: CombatFlag) -> Self {
        self.flags |= flag;
        self
    }

    pub fn ranged(mut self) -> Self {
        self.in_melee = false;
        self
    }

    pub fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    pub fn at_distance(mut self, distance: f32) -> Self {
        self.distance = distance;
        self
    }

    pub fn master(mut self, master: EntityId) -> Self {
        self.master = Some(master);
        self
    }

    pub fn spell_threat_multiplier(mut self, multiplier: f32) -> Self {
        self.spell_threat_multiplier = multiplier;
        self
    }

    pub fn critical_threat_multiplier(mut self, multiplier: f32) -> Self {
        self.critical_threat_multiplier = multiplier;
        self
    }

    pub fn total_threat_multiplier(mut self, multiplier: f32) -> Self {
        self.total_threat_multiplier = multiplier;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Notification {
    Cleared(EntityId),
    VictimChanged(EntityId, ObjectGuid),
    Removed(EntityId, ObjectGuid),
    AggroLinked(EntityId, EntityId),
}

/// In-memory world for the threat engine tests. Entity ids are minted by a real
/// shipyard world so they behave like the ones of a live map.
pub struct MockWorld {
    ecs: World,
    units: HashMap<EntityId, MockUnit>,
    guids: HashMap<EntityId, ObjectGuid>,
    next_counter: u32,
    notifications: Mutex<Vec<Notification>>,
}

impl MockWorld {
    pub fn new() -> Self {
        Self {
            ecs: World::new(),
            units: HashMap::new(),
            guids: HashMap::new(),
            next_counter: 1,
            notifications: Mutex::new(Vec::new()),
        }
    }

    fn spawn(&mut self, guid: ObjectGuid, unit: MockUnit) -> EntityId {
        let entity_id = self.ecs.add_entity((Guid(guid),));
        self.units.insert(entity_id, unit);
        self.guids.insert(entity_id, guid);
        entity_id
    }

    fn next_counter(&mut self) -> u32 {
        let counter = self.next_counter;
        self.next_counter += 1;
        counter
    }

    pub fn spawn_creature(&mut self, unit: MockUnit) -> EntityId {
        let counter = self.next_counter();
        self.spawn(ObjectGuid::with_entry(HighGuidType::Unit, 1, counter), unit)
    }

    pub fn spawn_player(&mut self, unit: MockUnit) -> EntityId {
        let counter = self.next_counter();
        self.spawn(ObjectGuid::new(HighGuidType::Player, counter), unit)
    }

    pub fn spawn_pet(&mut self, unit: MockUnit) -> EntityId {
        let counter = self.next_counter();
        self.spawn(ObjectGuid::with_entry(HighGuidType::Pet, 1, counter), unit)
    }

    pub fn guid(&self, unit: EntityId) -> ObjectGuid {
        self.guids[&unit]
    }

    pub fn unit(&self, unit: EntityId) -> &MockUnit {
        &self.units[&unit]
    }

    pub fn unit_mut(&mut self, unit: EntityId) -> &mut MockUnit {
        self.units.get_mut(&unit).expect("unknown mock unit")
    }

    pub fn take_notifications(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.notifications.lock())
    }
}

impl UnitAccessor for MockWorld {
    fn lookup_entity(&self, guid: &ObjectGuid) -> Option<EntityId> {
        self.guids
            .iter()
            .find(|(entity_id, g)| *g == guid && self.unit(**entity_id).in_world)
            .map(|(entity_id, _)| *entity_id)
    }

    fn guid_of(&self, unit: EntityId) -> Option<ObjectGuid> {
        self.guids.get(&unit).copied()
    }

    fn is_alive(&self, unit: EntityId) -> bool {
        self.unit(unit).alive
    }

    fn is_player(&self, unit: EntityId) -> bool {
        self.guid(unit).is_player()
    }

    fn is_game_master(&self, unit: EntityId) -> bool {
        self.unit(unit).flags.contains(CombatFlag::GameMaster)
    }

    fn is_offline_target(&self, _unit: EntityId, target: EntityId) -> bool {
        let target = self.unit(target);
        target.offline || target.flags.contains(CombatFlag::Unreachable)
    }

    fn can_reach_with_melee_attack(&self, _attacker: EntityId, target: EntityId) -> bool {
        self.unit(target).in_melee
    }

    fn can_attack(&self, _attacker: EntityId, target: EntityId) -> bool {
        let target = self.unit(target);
        target.attackable && !target.flags.contains(CombatFlag::NotAttackable)
    }

    fn combat_distance(&self, unit: EntityId, other: EntityId) -> Option<f32> {
        Some((self.unit(unit).distance - self.unit(other).distance).abs())
    }

    fn is_ignoring_ranged_targets(&self, unit: EntityId) -> bool {
        self.unit(unit)
            .flags
            .contains(CombatFlag::IgnoreRangedTargets)
    }

    fn is_ignoring_misdirection(&self, unit: EntityId) -> bool {
        self.unit(unit).flags.contains(CombatFlag::IgnoreMisdirection)
    }

    fn has_no_threat_state(&self, unit: EntityId) -> bool {
        self.unit(unit).flags.contains(CombatFlag::NoThreat)
    }

    fn is_support_threat_only(&self, unit: EntityId) -> bool {
        self.unit(unit).flags.contains(CombatFlag::SupportThreatOnly)
    }

    fn master_of(&self, unit: EntityId) -> Option<EntityId> {
        self.unit(unit).master
    }

    fn is_propagating_threat_to_owner(&self, unit: EntityId) -> bool {
        self.unit(unit)
            .flags
            .contains(CombatFlag::PropagateThreatToOwner)
    }

    fn can_join_in_attacking(&self, unit: EntityId, _enemy: EntityId) -> bool {
        let unit = self.unit(unit);
        unit.alive && unit.attackable
    }

    fn is_suppressed_target(&self, _unit: EntityId, target: EntityId) -> bool {
        self.unit(target).suppressed
    }

    fn can_have_threat_list(&self, unit: EntityId) -> bool {
        !self.is_player(unit)
    }
}

impl AuraAccessor for MockWorld {
    fn taunt_casters(&self, unit: EntityId) -> Vec<ObjectGuid> {
        self.unit(unit).taunt_casters.clone()
    }

    fn has_detaunt_from(&self, unit: EntityId, caster: EntityId) -> bool {
        self.unit(unit).detaunted_by.contains(&caster)
    }

    fn critical_threat_multiplier(
        &self,
        unit: EntityId,
        _school_mask: BitFlags<SpellSchoolMask>,
    ) -> f32 {
        self.unit(unit).critical_threat_multiplier
    }

    fn apply_total_threat_modifier(
        &self,
        unit: EntityId,
        threat: f32,
        _school_mask: BitFlags<SpellSchoolMask>,
    ) -> f32 {
        threat * self.unit(unit).total_threat_multiplier
    }

    fn apply_spell_threat_mod(&self, unit: EntityId, _spell_id: u32, threat: f32) -> f32 {
        threat * self.unit(unit).spell_threat_multiplier
    }

    fn threat_redirection_target(&self, unit: EntityId) -> Option<EntityId> {
        self.unit(unit).redirect_to
    }
}

impl ThreatListObserver for MockWorld {
    fn threat_list_cleared(&self, owner: EntityId) {
        self.notifications.lock().push(Notification::Cleared(owner));
    }

    fn current_victim_changed(&self, owner: EntityId, victim: &ObjectGuid) {
        self.notifications
            .lock()
            .push(Notification::VictimChanged(owner, *victim));
    }

    fn removed_from_threat_list(&self, owner: EntityId, victim: &ObjectGuid) {
        self.notifications
            .lock()
            .push(Notification::Removed(owner, *victim));
    }

    fn aggro_linked(&self, owner: EntityId, victim: EntityId) {
        self.notifications
            .lock()
            .push(Notification::AggroLinked(owner, victim));
    }
}
