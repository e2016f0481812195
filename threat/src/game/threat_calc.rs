use enumflags2::BitFlags;
use shipyard::EntityId;

use crate::shared::constants::{SpellAttributeEx, SpellSchoolMask};

use super::combat_context::{AuraAccessor, UnitAccessor};

#[derive(Clone, Copy, Debug)]
pub struct ThreatSpell {
    pub id: u32,
    pub attributes_ex: BitFlags<SpellAttributeEx>,
}

impl ThreatSpell {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            attributes_ex: BitFlags::empty(),
        }
    }

    pub fn with_attributes_ex(mut self, attributes_ex: BitFlags<SpellAttributeEx>) -> Self {
        self.attributes_ex = attributes_ex;
        self
    }

    pub fn causes_no_new_threat(&self) -> bool {
        self.attributes_ex.contains(SpellAttributeEx::NoThreat)
    }
}

/// Threat as computed by the combat pipeline, before any modifier.
#[derive(Clone, Copy, Debug)]
pub struct RawThreat {
    pub amount: f32,
    pub crit: bool,
    pub school_mask: BitFlags<SpellSchoolMask>,
    pub spell: Option<ThreatSpell>,
    pub assist: bool,
}

impl RawThreat {
    pub fn new(amount: f32) -> Self {
        Self {
            amount,
            crit: false,
            school_mask: SpellSchoolMask::Normal.into(),
            spell: None,
            assist: false,
        }
    }

    pub fn critical(mut self) -> Self {
        self.crit = true;
        self
    }

    pub fn school(mut self, school_mask: BitFlags<SpellSchoolMask>) -> Self {
        self.school_mask = school_mask;
        self
    }

    pub fn spell(mut self, spell: ThreatSpell) -> Self {
        self.spell = Some(spell);
        self
    }

    pub fn assist(mut self) -> Self {
        self.assist = true;
        self
    }
}

pub struct ThreatCalcHelper;

impl ThreatCalcHelper {
    // `hated_unit` generated the threat, `hating_unit` will hold it
    pub fn calc_threat<C: UnitAccessor + AuraAccessor>(
        ctx: &C,
        hated_unit: EntityId,
        hating_unit: EntityId,
        raw: &RawThreat,
    ) -> f32 {
        let mut threat = raw.amount;

        // All flat mods applied early
        if threat == 0. {
            return 0.;
        }

        if ctx.has_no_threat_state(hated_unit) {
            return 0.;
        }

        // Players only keep 0-threat entries (while charmed)
        if ctx.is_player(hating_unit) {
            return 0.;
        }

        if !raw.assist && ctx.is_support_threat_only(hated_unit) {
            return 0.;
        }

        if let Some(spell) = raw.spell {
            threat = ctx.apply_spell_threat_mod(hated_unit, spell.id, threat);

            if raw.crit {
                threat *= ctx.critical_threat_multiplier(hated_unit, raw.school_mask);
            }
        }

        threat = ctx.apply_total_threat_modifier(hated_unit, threat, raw.school_mask);

        // Modifiers may cancel threat but never turn it into a reduction. Reductions
        // (negative input) go through untouched, references clamp at 0 themselves.
        if raw.amount > 0. {
            threat.max(0.)
        } else {
            threat
        }
    }
}
