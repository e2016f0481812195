use std::cmp::Ordering;

use log::warn;
use shipyard::EntityId;

use crate::{
    config::ThreatSettings,
    entities::object_guid::ObjectGuid,
    shared::constants::{HostileState, TauntState},
};

use super::{
    combat_context::UnitAccessor,
    hostile_reference::{HostileReference, ThreatEventQueue},
};

/// Unordered bag of references with a lazily refreshed priority order.
#[derive(Debug, Default)]
pub struct ThreatContainer {
    threat_list: Vec<HostileReference>,
    dirty: bool,
}

// Everything the comparator looks at, computed once per reference and sort
struct SortKey {
    is_player: bool,
    can_attack: bool,
    taunt_state: TauntState,
    in_melee: bool,
    hostile_state: HostileState,
    threat: f32,
}

impl SortKey {
    fn new<C: UnitAccessor>(
        ctx: &C,
        owner: EntityId,
        reference: &HostileReference,
        force: bool,
        is_player: bool,
    ) -> Self {
        let (target_is_player, can_attack, in_melee) = match reference.target() {
            Some(target) => (
                is_player && ctx.is_player(target),
                is_player && ctx.can_attack(owner, target),
                force && ctx.can_reach_with_melee_attack(owner, target),
            ),
            None => (false, false, false),
        };

        Self {
            is_player: target_is_player,
            can_attack,
            taunt_state: reference.taunt_state(),
            in_melee,
            hostile_state: reference.hostile_state(),
            threat: reference.threat(),
        }
    }

    // Less means "comes first"
    fn priority(&self, other: &SortKey) -> Ordering {
        other
            .is_player
            .cmp(&self.is_player)
            .then(other.can_attack.cmp(&self.can_attack))
            .then(other.taunt_state.cmp(&self.taunt_state))
            .then(other.in_melee.cmp(&self.in_melee))
            .then(other.hostile_state.cmp(&self.hostile_state))
            .then(other.threat.total_cmp(&self.threat))
    }
}

impl ThreatContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn threat_list(&self) -> &[HostileReference] {
        &self.threat_list
    }

    pub fn threat_list_mut(&mut self) -> &mut [HostileReference] {
        &mut self.threat_list
    }

    pub fn is_empty(&self) -> bool {
        self.threat_list.is_empty()
    }

    pub fn len(&self) -> usize {
        self.threat_list.len()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    pub fn add_reference(&mut self, reference: HostileReference) {
        self.threat_list.push(reference);
    }

    /// Take a reference out of the container, keeping the order of the others.
    pub fn remove(&mut self, guid: &ObjectGuid) -> Option<HostileReference> {
        let index = self.position_of(guid)?;
        Some(self.threat_list.remove(index))
    }

    pub fn clear_references(&mut self) {
        self.threat_list.clear();
    }

    pub fn reference_by_target(&self, guid: &ObjectGuid) -> Option<&HostileReference> {
        self.threat_list.iter().find(|r| r.unit_guid() == *guid)
    }

    pub fn reference_by_target_mut(&mut self, guid: &ObjectGuid) -> Option<&mut HostileReference> {
        self.threat_list.iter_mut().find(|r| r.unit_guid() == *guid)
    }

    fn position_of(&self, guid: &ObjectGuid) -> Option<usize> {
        self.threat_list.iter().position(|r| r.unit_guid() == *guid)
    }

    /// Add the threat if we know the victim. Creating references is up to the manager.
    pub fn add_threat(
        &mut self,
        guid: &ObjectGuid,
        threat: f32,
        events: &mut ThreatEventQueue,
    ) -> Option<&mut HostileReference> {
        let reference = self.reference_by_target_mut(guid)?;
        reference.add_threat(threat, events);
        Some(reference)
    }

    /// -100% and below wipes the reference, otherwise threat is scaled by
    /// (100 + percent) / 100.
    pub fn modify_threat_percent(
        &mut self,
        guid: &ObjectGuid,
        threat_percent: i32,
        events: &mut ThreatEventQueue,
    ) {
        let Some(index) = self.position_of(guid) else {
            return;
        };

        if threat_percent <= -100 {
            let mut reference = self.threat_list.remove(index);
            reference.remove_reference(events);
        } else {
            self.threat_list[index].add_threat_percent(threat_percent, events);
        }
    }

    pub fn modify_all_threat_percent(
        &mut self,
        threat_percent: i32,
        events: &mut ThreatEventQueue,
    ) {
        if threat_percent <= -100 {
            for mut reference in self.threat_list.drain(..) {
                reference.remove_reference(events);
            }
        } else {
            for reference in self.threat_list.iter_mut() {
                reference.add_threat_percent(threat_percent, events);
            }
        }
    }

    /// Re-sort if the order may be stale. `force` also ranks targets in melee reach first,
    /// `is_player` (player-controlled owner) ranks attackable players first.
    pub fn update<C: UnitAccessor>(
        &mut self,
        ctx: &C,
        owner: EntityId,
        force: bool,
        is_player: bool,
    ) {
        if (self.dirty || force || is_player) && self.threat_list.len() > 1 {
            let mut keyed: Vec<(SortKey, HostileReference)> = self
                .threat_list
                .drain(..)
                .map(|r| (SortKey::new(ctx, owner, &r, force, is_player), r))
                .collect();

            // Stable: equal references keep their relative order
            keyed.sort_by(|(a, _), (b, _)| a.priority(b));

            self.threat_list = keyed.into_iter().map(|(_, r)| r).collect();
        }

        self.dirty = false;
    }

    /// Return the next best victim, which could be the current one. The list must be up to
    /// date (see [`ThreatContainer::update`]).
    pub fn select_next_victim<C: UnitAccessor>(
        &self,
        ctx: &C,
        attacker: EntityId,
        current_victim: Option<&ObjectGuid>,
        settings: &ThreatSettings,
    ) -> Option<ObjectGuid> {
        let current_victim = current_victim.and_then(|guid| self.reference_by_target(guid));
        let suppress_ranged = ctx.is_ignoring_ranged_targets(attacker);

        let current_victim_in_melee = match current_victim {
            Some(victim) if suppress_ranged => victim
                .target()
                .map(|t| ctx.can_reach_with_melee_attack(attacker, t))
                .unwrap_or(false),
            _ => true,
        };

        for current_ref in self.threat_list.iter() {
            // If the reference is online the target must be there
            let Some(target) = current_ref.target() else {
                debug_assert!(
                    false,
                    "online hostile reference to {} has no live target",
                    current_ref.unit_guid()
                );
                warn!(
                    "online hostile reference to {} has no live target",
                    current_ref.unit_guid()
                );
                continue;
            };

            let is_in_melee = ctx.can_reach_with_melee_attack(attacker, target);

            let Some(victim) = current_victim else {
                // Select any
                if !suppress_ranged || is_in_melee {
                    return Some(current_ref.unit_guid());
                }

                continue;
            };

            // Normal case: the current victim is still the most hated
            if current_ref.unit_guid() == victim.unit_guid() {
                if suppress_ranged && !current_victim_in_melee {
                    continue;
                }

                return Some(victim.unit_guid());
            }

            // Taunt overrides root skipping
            if current_ref.taunt_state() > victim.taunt_state() {
                return Some(current_ref.unit_guid());
            }

            let victim_is_player = victim.target().map(|t| ctx.is_player(t)).unwrap_or(false);
            if ctx.is_player(target) && !victim_is_player {
                return Some(current_ref.unit_guid());
            }

            // Suppress ranged when rooted
            if suppress_ranged {
                if !is_in_melee {
                    continue;
                } else if !current_victim_in_melee {
                    return Some(current_ref.unit_guid());
                }
            }

            if current_ref.hostile_state() > victim.hostile_state() {
                return Some(current_ref.unit_guid());
            }

            // The list is sorted: nothing further down can beat the current victim by more
            // than 10% either
            if current_ref.threat() <= settings.melee_switch_ratio * victim.threat() {
                return Some(victim.unit_guid());
            }

            // 110% rule for targets in melee range, 130% rule for targets at range
            if current_ref.threat() > settings.ranged_switch_ratio * victim.threat()
                || (current_ref.threat() > settings.melee_switch_ratio * victim.threat()
                    && is_in_melee)
            {
                return Some(current_ref.unit_guid());
            }
        }

        None
    }
}
