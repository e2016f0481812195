use std::{collections::HashMap, time::Duration};

use log::{debug, trace, warn};
use shipyard::EntityId;

use crate::{
    config::ThreatSettings,
    entities::object_guid::ObjectGuid,
    shared::constants::{HostileState, TauntState},
};

use super::{
    combat_context::{CombatContext, UnitAccessor},
    hostile_reference::{HostileReference, ThreatEventQueue, ThreatRefStatusChangeEvent},
    threat_calc::{RawThreat, ThreatCalcHelper},
    threat_container::ThreatContainer,
};

/// Threat list of one combat-capable unit.
///
/// Mobs, NPCs and guards have a threat list made of two containers: units they can
/// currently attack (online) and the ones they cannot (offline: in flight, in water, GM...).
/// References never move between containers on their own: every state change is queued as
/// a [`ThreatRefStatusChangeEvent`] and handled before the mutating call returns.
#[derive(Debug)]
pub struct ThreatManager {
    owner: EntityId,
    current_victim: Option<ObjectGuid>,
    threat_container: ThreatContainer,
    threat_offline_container: ThreatContainer,
    update_timer: Duration,
    settings: ThreatSettings,
    events: ThreatEventQueue,
}

impl ThreatManager {
    pub fn new(owner: EntityId, settings: ThreatSettings) -> Self {
        Self {
            owner,
            current_victim: None,
            threat_container: ThreatContainer::new(),
            threat_offline_container: ThreatContainer::new(),
            update_timer: settings.update_interval,
            settings,
            events: ThreatEventQueue::new(),
        }
    }

    pub fn owner(&self) -> EntityId {
        self.owner
    }

    pub fn current_victim(&self) -> Option<&HostileReference> {
        self.current_victim
            .and_then(|guid| self.threat_container.reference_by_target(&guid))
    }

    pub fn online_list(&self) -> &[HostileReference] {
        self.threat_container.threat_list()
    }

    pub fn offline_list(&self) -> &[HostileReference] {
        self.threat_offline_container.threat_list()
    }

    pub fn is_threat_list_empty(&self) -> bool {
        self.threat_container.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.threat_container.is_dirty()
    }

    fn set_dirty(&mut self, dirty: bool) {
        self.threat_container.set_dirty(dirty);
    }

    /// Drop the whole list, letting the clients know.
    pub fn clear_all_threat<C: CombatContext>(&mut self, ctx: &C) {
        if ctx.can_have_threat_list(self.owner) && !self.is_threat_list_empty() {
            ctx.threat_list_cleared(self.owner);
        }

        self.clear_references();
    }

    pub fn clear_references(&mut self) {
        self.threat_container.clear_references();
        self.threat_offline_container.clear_references();
        self.current_victim = None;
        self.update_timer = self.settings.update_interval;
        self.events.clear();
    }

    /// Entry point of the combat pipeline: `victim` did something that makes the owner hate
    /// it.
    pub fn add_threat<C: CombatContext>(&mut self, ctx: &C, victim: EntityId, raw: RawThreat) {
        // Not to self
        if victim == self.owner {
            return;
        }

        // Not to GM
        if ctx.is_game_master(victim) {
            return;
        }

        // Not to dead and not for dead
        if !ctx.is_alive(victim) || !ctx.is_alive(self.owner) {
            return;
        }

        let mut calculated_threat = ThreatCalcHelper::calc_threat(ctx, victim, self.owner, &raw);

        if calculated_threat > 0. && !ctx.is_ignoring_misdirection(self.owner) {
            if let Some(redirected_target) = ctx.threat_redirection_target(victim) {
                if redirected_target != self.owner && ctx.is_alive(redirected_target) {
                    trace!("threat from {victim:?} redirected to {redirected_target:?}");
                    self.add_threat_directly(ctx, redirected_target, calculated_threat, false);
                    // The victim still needs an entry in the threat list
                    calculated_threat = 0.;
                }
            }
        }

        let no_new = raw
            .spell
            .map(|spell| spell.causes_no_new_threat())
            .unwrap_or(false);

        self.add_threat_directly(ctx, victim, calculated_threat, no_new);
    }

    pub fn add_threat_directly<C: CombatContext>(
        &mut self,
        ctx: &C,
        victim: EntityId,
        threat: f32,
        no_new: bool,
    ) {
        let Some(victim_guid) = ctx.guid_of(victim) else {
            warn!("add_threat_directly: {victim:?} has no guid");
            return;
        };

        let known = self
            .threat_container
            .add_threat(&victim_guid, threat, &mut self.events)
            .is_some()
            // Not in the online refs, search the offline refs next
            || self
                .threat_offline_container
                .add_threat(&victim_guid, threat, &mut self.events)
                .is_some();

        if !known && !no_new {
            debug!("{victim_guid} enters the threat list of {:?}", self.owner);

            // Threat has to be 0 here, the real amount goes through the usual event path
            let mut reference = HostileReference::new(victim, victim_guid, self.owner, 0.);
            reference.add_threat(threat, &mut self.events);

            // GM is always offline
            if ctx.is_offline_target(self.owner, victim) || ctx.is_game_master(victim) {
                reference.set_online_offline_state(false, &mut self.events);
            }

            self.threat_container.add_reference(reference);
            self.process_threat_events(ctx);

            ctx.aggro_linked(self.owner, victim);

            // Create a threat to the owner of a pet, if the pet attacks
            if ctx.is_propagating_threat_to_owner(victim) {
                if let Some(victim_owner) = ctx.master_of(victim) {
                    if ctx.is_alive(victim_owner)
                        && ctx.can_join_in_attacking(victim_owner, self.owner)
                    {
                        self.add_threat(ctx, victim_owner, RawThreat::new(0.));
                    }
                }
            }
        }

        self.process_threat_events(ctx);
    }

    pub fn modify_threat_percent<C: CombatContext>(
        &mut self,
        ctx: &C,
        victim: EntityId,
        percent: i32,
    ) {
        if let Some(guid) = ctx.guid_of(victim) {
            self.threat_container
                .modify_threat_percent(&guid, percent, &mut self.events);
            self.process_threat_events(ctx);
        }
    }

    pub fn modify_all_threat_percent<C: CombatContext>(&mut self, ctx: &C, percent: i32) {
        self.threat_container
            .modify_all_threat_percent(percent, &mut self.events);
        self.process_threat_events(ctx);
    }

    fn update_containers<C: UnitAccessor>(&mut self, ctx: &C) {
        self.threat_container.update(
            ctx,
            self.owner,
            ctx.is_ignoring_ranged_targets(self.owner),
            ctx.is_player(self.owner),
        );
    }

    /// Who should the owner attack now?
    pub fn get_hostile_target<C: CombatContext>(&mut self, ctx: &C) -> Option<EntityId> {
        self.update_containers(ctx);

        let next_victim = self.threat_container.select_next_victim(
            ctx,
            self.owner,
            self.current_victim.as_ref(),
            &self.settings,
        );
        self.set_current_victim(ctx, next_victim);

        self.current_victim().and_then(|victim| victim.target())
    }

    /// Threat toward `victim`, 0 if it is not listed.
    pub fn threat<C: UnitAccessor>(
        &self,
        ctx: &C,
        victim: EntityId,
        also_search_offline: bool,
    ) -> f32 {
        self.find_reference(ctx, victim, also_search_offline)
            .map(|r| r.threat())
            .unwrap_or(0.)
    }

    pub fn highest_threat(&self) -> f32 {
        self.threat_container
            .threat_list()
            .iter()
            .chain(self.threat_offline_container.threat_list())
            .map(|r| r.threat())
            .fold(0., f32::max)
    }

    pub fn has_threat<C: UnitAccessor>(
        &self,
        ctx: &C,
        victim: EntityId,
        also_search_offline: bool,
    ) -> bool {
        self.find_reference(ctx, victim, also_search_offline).is_some()
    }

    fn find_reference<C: UnitAccessor>(
        &self,
        ctx: &C,
        victim: EntityId,
        also_search_offline: bool,
    ) -> Option<&HostileReference> {
        let guid = ctx.guid_of(victim)?;

        self.threat_container
            .reference_by_target(&guid)
            .or_else(|| {
                if also_search_offline {
                    self.threat_offline_container.reference_by_target(&guid)
                } else {
                    None
                }
            })
    }

    /// Rebuild the taunt state of every online reference from the taunt auras currently on
    /// the owner. Fixated references are left alone.
    pub fn taunt_update<C: CombatContext>(&mut self, ctx: &C) {
        let mut taunt_states: HashMap<ObjectGuid, TauntState> = HashMap::new();
        for (rank, caster) in ctx.taunt_casters(self.owner).into_iter().enumerate() {
            taunt_states.insert(caster, TauntState::Taunted(rank as u32 + 1));
        }

        let owner = self.owner;
        for reference in self.threat_container.threat_list_mut() {
            if reference.taunt_state() == TauntState::Fixated {
                continue;
            }

            let state = if let Some(state) = taunt_states.get(&reference.unit_guid()) {
                *state
            } else if reference
                .target()
                .map(|target| ctx.has_detaunt_from(target, owner))
                .unwrap_or(false)
            {
                TauntState::Detaunted
            } else {
                TauntState::None
            };

            reference.set_taunt_state(state);
        }

        self.set_dirty(true);
    }

    /// Only one target can be fixated at a time.
    pub fn fixate_target<C: CombatContext>(&mut self, ctx: &C, target: EntityId) {
        let fixate_guid = ctx.guid_of(target);

        for reference in self.threat_container.threat_list_mut() {
            if Some(reference.unit_guid()) == fixate_guid {
                reference.set_taunt_state(TauntState::Fixated);
            } else if reference.taunt_state() == TauntState::Fixated {
                reference.set_taunt_state(TauntState::None);
            }
        }

        self.taunt_update(ctx);
    }

    fn set_current_victim<C: CombatContext>(&mut self, ctx: &C, victim: Option<ObjectGuid>) {
        if let Some(guid) = victim {
            if self.current_victim != victim {
                debug!("{:?} switches target to {guid}", self.owner);
                ctx.current_victim_changed(self.owner, &guid);
            }
        }

        self.current_victim = victim;
    }

    pub fn set_current_victim_by_target<C: CombatContext>(&mut self, ctx: &C, target: EntityId) {
        let Some(guid) = ctx.guid_of(target) else {
            return;
        };

        if self.current_victim == Some(guid) {
            return;
        }

        if self.threat_container.reference_by_target(&guid).is_some() {
            self.set_current_victim(ctx, Some(guid));
        }
    }

    fn process_threat_events<C: CombatContext>(&mut self, ctx: &C) {
        while let Some(event) = self.events.pop_front() {
            self.process_threat_event(ctx, event);
        }
    }

    /// React to the status change of one of our references. May queue further events.
    fn process_threat_event<C: CombatContext>(
        &mut self,
        ctx: &C,
        event: ThreatRefStatusChangeEvent,
    ) {
        trace!("{:?} processes {event} for {}", self.owner, event.guid());

        match event {
            ThreatRefStatusChangeEvent::ThreatChange { guid, delta } => {
                let is_current_victim = self.current_victim == Some(guid);

                // The order in the threat list might have changed
                if (is_current_victim && delta < 0.) || (!is_current_victim && delta > 0.) {
                    self.set_dirty(true);
                }
            }
            ThreatRefStatusChangeEvent::OnlineStatus { guid, online: false } => {
                if self.current_victim == Some(guid) {
                    self.set_current_victim(ctx, None);
                    self.set_dirty(true);
                }

                if ctx.lookup_entity(&guid).is_some() {
                    ctx.removed_from_threat_list(self.owner, &guid);
                }

                if let Some(reference) = self.threat_container.remove(&guid) {
                    self.threat_offline_container.add_reference(reference);
                }
            }
            ThreatRefStatusChangeEvent::OnlineStatus { guid, online: true } => {
                let Some(reference) = self.threat_offline_container.remove(&guid) else {
                    return;
                };

                if let Some(victim) = self.current_victim() {
                    if reference.threat() > self.settings.melee_switch_ratio * victim.threat() {
                        self.set_dirty(true);
                    }
                }

                self.threat_container.add_reference(reference);
            }
            ThreatRefStatusChangeEvent::RemoveFromList { guid } => {
                if self.current_victim == Some(guid) {
                    self.set_current_victim(ctx, None);
                    self.set_dirty(true);
                }

                ctx.removed_from_threat_list(self.owner, &guid);

                // Containers may already have dropped it
                if self.threat_container.remove(&guid).is_none() {
                    self.threat_offline_container.remove(&guid);
                }
            }
            ThreatRefStatusChangeEvent::SuppressedStatus { guid } => {
                // Only flips queue events and exempted targets never flip, so this settles
                self.release_suppressed(ctx, Some(&guid));
                self.set_dirty(true);
            }
            ThreatRefStatusChangeEvent::AccessibleStatus { .. } => (),
        }
    }

    /// Gate for the periodic threat list packet. `elapsed` is the time since the last call.
    pub fn is_need_update_to_client(&mut self, elapsed: Duration) -> bool {
        if self.is_threat_list_empty() {
            return false;
        }

        if elapsed >= self.update_timer {
            self.update_timer = self.settings.update_interval;
            return true;
        }

        self.update_timer -= elapsed;
        false
    }

    /// Bring every suppressed reference back to normal, except `except` and the targets the
    /// owner still wants suppressed.
    pub fn clear_suppressed<C: CombatContext>(&mut self, ctx: &C, except: Option<&ObjectGuid>) {
        self.release_suppressed(ctx, except);
        self.process_threat_events(ctx);
    }

    fn release_suppressed<C: UnitAccessor>(&mut self, ctx: &C, except: Option<&ObjectGuid>) {
        let owner = self.owner;

        for reference in self.threat_container.threat_list_mut() {
            if reference.hostile_state() != HostileState::Suppressed
                || Some(&reference.unit_guid()) == except
            {
                continue;
            }

            let still_suppressed = reference
                .target()
                .map(|target| ctx.is_suppressed_target(owner, target))
                .unwrap_or(false);

            if !still_suppressed {
                reference.set_hostile_state(HostileState::Normal, &mut self.events);
            }
        }
    }

    /// Suppress `target` until its threat changes again.
    pub fn set_target_suppressed<C: CombatContext>(&mut self, ctx: &C, target: EntityId) {
        let Some(guid) = ctx.guid_of(target) else {
            return;
        };

        if let Some(reference) = self.threat_container.reference_by_target_mut(&guid) {
            reference.set_hostile_state(HostileState::Suppressed, &mut self.events);
            reference.set_suppressability_toggle();
        }

        self.process_threat_events(ctx);
    }

    /// Drop every reference whose target wandered too far. Keeps long ranged fights from
    /// growing the lists forever.
    pub fn delete_out_of_range_references<C: CombatContext>(&mut self, ctx: &C) {
        let owner = self.owner;
        let max_distance = self.settings.max_reference_distance;

        let out_of_range: Vec<ObjectGuid> = self
            .threat_container
            .threat_list()
            .iter()
            .chain(self.threat_offline_container.threat_list())
            .filter(|r| {
                r.target()
                    .and_then(|target| ctx.combat_distance(target, owner))
                    .map(|distance| distance > max_distance)
                    .unwrap_or(false)
            })
            .map(|r| r.unit_guid())
            .collect();

        for guid in out_of_range {
            debug!("{guid} is out of range, removed from the threat list of {owner:?}");

            let reference = self
                .threat_container
                .remove(&guid)
                .or_else(|| self.threat_offline_container.remove(&guid));

            if let Some(mut reference) = reference {
                reference.remove_reference(&mut self.events);
            }
        }

        self.process_threat_events(ctx);
    }

    /// Re-check the reachability of every listed unit, moving references between the online
    /// and offline containers.
    pub fn update_online_statuses<C: CombatContext>(&mut self, ctx: &C) {
        for reference in self
            .threat_container
            .threat_list_mut()
            .iter_mut()
            .chain(self.threat_offline_container.threat_list_mut().iter_mut())
        {
            reference.update_online_status(ctx, &mut self.events);
        }

        self.process_threat_events(ctx);
    }

    /// The unit behind `guid` left the world: its reference goes offline and loses its live
    /// handle until the unit can be resolved again.
    pub fn unit_destroyed<C: CombatContext>(&mut self, ctx: &C, guid: &ObjectGuid) {
        if let Some(reference) = Self::reference_mut(
            &mut self.threat_container,
            &mut self.threat_offline_container,
            guid,
        ) {
            reference.invalidate();
            reference.set_online_offline_state(false, &mut self.events);
        }

        self.process_threat_events(ctx);
    }

    /// Apply a reversible threat reduction (fade, feign...) toward `victim`.
    pub fn set_fadeout_threat_reduction<C: CombatContext>(
        &mut self,
        ctx: &C,
        victim: EntityId,
        value: f32,
    ) {
        let Some(guid) = ctx.guid_of(victim) else {
            return;
        };

        if let Some(reference) = Self::reference_mut(
            &mut self.threat_container,
            &mut self.threat_offline_container,
            &guid,
        ) {
            reference.set_fadeout_threat_reduction(value, &mut self.events);
        }

        self.process_threat_events(ctx);
    }

    pub fn reset_fadeout_threat_reduction<C: CombatContext>(&mut self, ctx: &C, victim: EntityId) {
        let Some(guid) = ctx.guid_of(victim) else {
            return;
        };

        if let Some(reference) = Self::reference_mut(
            &mut self.threat_container,
            &mut self.threat_offline_container,
            &guid,
        ) {
            reference.reset_fadeout_threat_reduction(&mut self.events);
        }

        self.process_threat_events(ctx);
    }

    fn reference_mut<'a>(
        online: &'a mut ThreatContainer,
        offline: &'a mut ThreatContainer,
        guid: &ObjectGuid,
    ) -> Option<&'a mut HostileReference> {
        match online.reference_by_target_mut(guid) {
            Some(reference) => Some(reference),
            None => offline.reference_by_target_mut(guid),
        }
    }
}
