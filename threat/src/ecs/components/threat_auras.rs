use std::collections::HashMap;

use enumflags2::BitFlags;
use shipyard::{Component, EntityId};

use crate::{entities::object_guid::ObjectGuid, shared::constants::SpellSchoolMask};

/// The threat-related auras currently applied on a unit.
#[derive(Component)]
pub struct ThreatAuras {
    taunt_casters: Vec<ObjectGuid>, // In application order
    detaunt_casters: Vec<EntityId>,
    suppressed_targets: Vec<ObjectGuid>,
    spell_threat_multipliers: HashMap<u32, f32>,
    critical_threat_multipliers: Vec<(BitFlags<SpellSchoolMask>, f32)>,
    total_threat_multipliers: Vec<(BitFlags<SpellSchoolMask>, f32)>,
    redirect_to: Option<EntityId>,
}

impl Default for ThreatAuras {
    fn default() -> Self {
        Self {
            taunt_casters: Vec::new(),
            detaunt_casters: Vec::new(),
            suppressed_targets: Vec::new(),
            spell_threat_multipliers: HashMap::new(),
            critical_threat_multipliers: Vec::new(),
            total_threat_multipliers: Vec::new(),
            redirect_to: None,
        }
    }
}

impl ThreatAuras {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn taunt_casters(&self) -> &[ObjectGuid] {
        &self.taunt_casters
    }

    /// A renewed taunt moves back to the top.
    pub fn add_taunt(&mut self, caster: ObjectGuid) {
        self.taunt_casters.retain(|guid| *guid != caster);
        self.taunt_casters.push(caster);
    }

    pub fn remove_taunt(&mut self, caster: &ObjectGuid) {
        self.taunt_casters.retain(|guid| guid != caster);
    }

    pub fn add_detaunt(&mut self, caster: EntityId) {
        if !self.detaunt_casters.contains(&caster) {
            self.detaunt_casters.push(caster);
        }
    }

    pub fn remove_detaunt(&mut self, caster: EntityId) {
        self.detaunt_casters.retain(|id| *id != caster);
    }

    pub fn has_detaunt_from(&self, caster: EntityId) -> bool {
        self.detaunt_casters.contains(&caster)
    }

    pub fn suppress_target(&mut self, target: ObjectGuid) {
        if !self.suppressed_targets.contains(&target) {
            self.suppressed_targets.push(target);
        }
    }

    pub fn release_target(&mut self, target: &ObjectGuid) {
        self.suppressed_targets.retain(|guid| guid != target);
    }

    pub fn is_suppressing(&self, target: &ObjectGuid) -> bool {
        self.suppressed_targets.contains(target)
    }

    pub fn set_spell_threat_multiplier(&mut self, spell_id: u32, multiplier: f32) {
        self.spell_threat_multipliers.insert(spell_id, multiplier);
    }

    pub fn spell_threat_multiplier(&self, spell_id: u32) -> f32 {
        self.spell_threat_multipliers
            .get(&spell_id)
            .copied()
            .unwrap_or(1.)
    }

    pub fn add_critical_threat_multiplier(
        &mut self,
        school_mask: BitFlags<SpellSchoolMask>,
        multiplier: f32,
    ) {
        self.critical_threat_multipliers
            .push((school_mask, multiplier));
    }

    /// Multipliers of every aura matching at least one school of `school_mask` stack.
    pub fn critical_threat_multiplier(&self, school_mask: BitFlags<SpellSchoolMask>) -> f32 {
        self.critical_threat_multipliers
            .iter()
            .filter(|(mask, _)| mask.intersects(school_mask))
            .map(|(_, multiplier)| multiplier)
            .product()
    }

    pub fn add_total_threat_multiplier(
        &mut self,
        school_mask: BitFlags<SpellSchoolMask>,
        multiplier: f32,
    ) {
        self.total_threat_multipliers.push((school_mask, multiplier));
    }

    pub fn total_threat_multiplier(&self, school_mask: BitFlags<SpellSchoolMask>) -> f32 {
        self.total_threat_multipliers
            .iter()
            .filter(|(mask, _)| mask.intersects(school_mask))
            .map(|(_, multiplier)| multiplier)
            .product()
    }

    pub fn redirect_to(&self) -> Option<EntityId> {
        self.redirect_to
    }

    pub fn set_redirect_to(&mut self, target: Option<EntityId>) {
        self.redirect_to = target;
    }
}
