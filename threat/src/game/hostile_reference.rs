use std::collections::VecDeque;

use log::trace;
use shipyard::EntityId;
use strum::Display;

use crate::{
    entities::object_guid::ObjectGuid,
    shared::constants::{HostileState, TauntState},
};

use super::combat_context::UnitAccessor;

/// Status change of a single reference, delivered to the threat manager owning it.
#[derive(Clone, Copy, Debug, PartialEq, Display)]
pub enum ThreatRefStatusChangeEvent {
    ThreatChange { guid: ObjectGuid, delta: f32 },
    OnlineStatus { guid: ObjectGuid, online: bool },
    AccessibleStatus { guid: ObjectGuid, accessible: bool },
    SuppressedStatus { guid: ObjectGuid },
    RemoveFromList { guid: ObjectGuid },
}

impl ThreatRefStatusChangeEvent {
    pub fn guid(&self) -> ObjectGuid {
        match *self {
            ThreatRefStatusChangeEvent::ThreatChange { guid, .. }
            | ThreatRefStatusChangeEvent::OnlineStatus { guid, .. }
            | ThreatRefStatusChangeEvent::AccessibleStatus { guid, .. }
            | ThreatRefStatusChangeEvent::SuppressedStatus { guid }
            | ThreatRefStatusChangeEvent::RemoveFromList { guid } => guid,
        }
    }
}

pub type ThreatEventQueue = VecDeque<ThreatRefStatusChangeEvent>;

/// One "owner hates unit" edge. Lives in exactly one container of exactly one
/// threat manager.
#[derive(Debug)]
pub struct HostileReference {
    unit_guid: ObjectGuid,
    target: Option<EntityId>, // Live handle, None once the link is cut
    source: EntityId,         // Owner of the threat manager holding this reference
    threat: f32,
    fadeout_threat_reduction: f32,
    hostile_state: HostileState,
    taunt_state: TauntState,
    online: bool,
    accessible: bool,
    suppressability_toggle: bool,
}

impl HostileReference {
    pub fn new(target: EntityId, unit_guid: ObjectGuid, source: EntityId, threat: f32) -> Self {
        Self {
            unit_guid,
            target: Some(target),
            source,
            threat,
            fadeout_threat_reduction: 0.,
            hostile_state: HostileState::Normal,
            taunt_state: TauntState::None,
            online: true,
            accessible: true,
            suppressability_toggle: false,
        }
    }

    pub fn unit_guid(&self) -> ObjectGuid {
        self.unit_guid
    }

    pub fn target(&self) -> Option<EntityId> {
        self.target
    }

    pub fn source(&self) -> EntityId {
        self.source
    }

    pub fn threat(&self) -> f32 {
        self.threat
    }

    pub fn fadeout_threat_reduction(&self) -> f32 {
        self.fadeout_threat_reduction
    }

    pub fn hostile_state(&self) -> HostileState {
        self.hostile_state
    }

    pub fn taunt_state(&self) -> TauntState {
        self.taunt_state
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn is_accessible(&self) -> bool {
        self.accessible
    }

    pub fn is_valid(&self) -> bool {
        self.target.is_some()
    }

    /// Returns the delta actually applied, after clamping threat at 0.
    pub fn add_threat(&mut self, modifier: f32, events: &mut ThreatEventQueue) -> f32 {
        let modifier = if self.threat + modifier < 0. {
            -self.threat
        } else {
            modifier
        };

        self.threat += modifier;

        // Any threat change clears a pending suppression
        if self.suppressability_toggle && modifier != 0. {
            self.set_hostile_state(HostileState::Normal, events);
        }

        if modifier != 0. {
            events.push_back(ThreatRefStatusChangeEvent::ThreatChange {
                guid: self.unit_guid,
                delta: modifier,
            });
        }

        modifier
    }

    pub fn add_threat_percent(&mut self, percent: i32, events: &mut ThreatEventQueue) -> f32 {
        self.add_threat(self.threat * percent as f32 / 100., events)
    }

    /// Check if the owner can still reach the target, re-linking the live handle first
    /// if it was cut.
    pub fn update_online_status<C: UnitAccessor>(
        &mut self,
        ctx: &C,
        events: &mut ThreatEventQueue,
    ) {
        if self.target.is_none() {
            self.target = ctx.lookup_entity(&self.unit_guid);
        }

        // Only check for online status if the reference is valid
        let online = match self.target {
            Some(target) => !ctx.is_offline_target(self.source, target),
            None => false,
        };

        self.set_online_offline_state(online, events);
    }

    pub fn set_online_offline_state(&mut self, is_online: bool, events: &mut ThreatEventQueue) {
        if self.online != is_online {
            self.online = is_online;

            events.push_back(ThreatRefStatusChangeEvent::OnlineStatus {
                guid: self.unit_guid,
                online: is_online,
            });
        }
    }

    pub fn set_accessible_state(&mut self, is_accessible: bool, events: &mut ThreatEventQueue) {
        if self.accessible != is_accessible {
            self.accessible = is_accessible;

            events.push_back(ThreatRefStatusChangeEvent::AccessibleStatus {
                guid: self.unit_guid,
                accessible: is_accessible,
            });
        }
    }

    pub fn set_hostile_state(&mut self, state: HostileState, events: &mut ThreatEventQueue) {
        if self.hostile_state != state {
            self.hostile_state = state;

            events.push_back(ThreatRefStatusChangeEvent::SuppressedStatus {
                guid: self.unit_guid,
            });
        }

        self.suppressability_toggle = false;
    }

    /// Arm the auto-clear: the next threat change brings the reference back to normal.
    pub fn set_suppressability_toggle(&mut self) {
        self.suppressability_toggle = true;
    }

    // Taunt changes are batched by the manager, which re-sorts once
    pub fn set_taunt_state(&mut self, state: TauntState) {
        self.taunt_state = state;
    }

    pub fn set_fadeout_threat_reduction(&mut self, value: f32, events: &mut ThreatEventQueue) {
        // Store what was really applied so that the reset is an exact inverse even when
        // the reduction got clamped at 0
        self.fadeout_threat_reduction = self.add_threat(value, events);
    }

    pub fn reset_fadeout_threat_reduction(&mut self, events: &mut ThreatEventQueue) {
        self.add_threat(-self.fadeout_threat_reduction, events);
        self.fadeout_threat_reduction = 0.;
    }

    /// The hated unit left the world, cut the live link. The guid stays so the link can be
    /// rebuilt later.
    pub fn invalidate(&mut self) {
        self.target = None;
    }

    /// Terminal event, the reference must be dropped once the manager processed it.
    pub fn remove_reference(&mut self, events: &mut ThreatEventQueue) {
        trace!("removing hostile reference to {}", self.unit_guid);
        self.invalidate();

        events.push_back(ThreatRefStatusChangeEvent::RemoveFromList {
            guid: self.unit_guid,
        });
    }
}
