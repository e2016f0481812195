use std::time::Duration;

use enumflags2::bitflags;
use enumn::N;

// Server should send threat update to client periodically
pub const THREAT_UPDATE_INTERVAL: Duration = Duration::from_millis(2000);
// References whose target wandered farther than this are garbage-collected
pub const THREAT_LIST_MAX_DISTANCE: f32 = 60.0;
// 110% rule for targets in melee range
pub const MELEE_SWITCH_RATIO: f32 = 1.1;
// 130% rule for targets in ranged distances
pub const RANGED_SWITCH_RATIO: f32 = 1.3;

pub const BASE_MELEE_RANGE_OFFSET: f32 = 4.0 / 3.0;
pub const PLAYER_DEFAULT_COMBAT_REACH: f32 = 1.5;

#[allow(dead_code)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, N)]
pub enum HighGuidType {
    Player = 0x0000,
    Gameobject = 0xF110,
    Transport = 0xF120,
    Unit = 0xF130,
    Pet = 0xF140,
    Dynamicobject = 0xF100,
    Corpse = 0xF101,
}

#[allow(dead_code)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, N)]
pub enum SpellSchool {
    Normal = 0,
    Holy = 1,
    Fire = 2,
    Nature = 3,
    Frost = 4,
    Shadow = 5,
    Arcane = 6,
}

impl SpellSchool {
    pub fn mask(self) -> SpellSchoolMask {
        match self {
            SpellSchool::Normal => SpellSchoolMask::Normal,
            SpellSchool::Holy => SpellSchoolMask::Holy,
            SpellSchool::Fire => SpellSchoolMask::Fire,
            SpellSchool::Nature => SpellSchoolMask::Nature,
            SpellSchool::Frost => SpellSchoolMask::Frost,
            SpellSchool::Shadow => SpellSchoolMask::Shadow,
            SpellSchool::Arcane => SpellSchoolMask::Arcane,
        }
    }
}

#[bitflags]
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpellSchoolMask {
    Normal = 0x01,
    Holy = 0x02,
    Fire = 0x04,
    Nature = 0x08,
    Frost = 0x10,
    Shadow = 0x20,
    Arcane = 0x40,
}

#[allow(dead_code)]
#[bitflags]
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpellAttributeEx {
    DismissPet = 0x0000_0001,
    DrainAllPower = 0x0000_0002,
    Channeled1 = 0x0000_0004,
    CantBeRedirected = 0x0000_0008,
    NotBreakStealth = 0x0000_0020,
    Channeled2 = 0x0000_0040,
    CantBeReflected = 0x0000_0080,
    CantTargetInCombat = 0x0000_0100,
    MeleeCombatStart = 0x0000_0200,
    NoThreat = 0x0000_0400, // Never creates a new threat list entry
}

// Ordered: a normal reference outranks a suppressed one
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HostileState {
    Suppressed,
    Normal,
}

// Ordered: a higher taunt state always wins target selection. A detaunted target
// ranks below everyone else. Each taunting caster gets its own rank, in aura
// application order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TauntState {
    Detaunted,
    None,
    Taunted(u32),
    Fixated,
}

#[bitflags]
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CombatFlag {
    GameMaster = 0x0001,
    NoThreat = 0x0002,          // Causes no threat at all
    SupportThreatOnly = 0x0004, // Only assisting actions cause threat
    IgnoreRangedTargets = 0x0008,
    IgnoreMisdirection = 0x0010,
    NotAttackable = 0x0020,
    Unreachable = 0x0040, // In flight, underwater, evading...
    PropagateThreatToOwner = 0x0080,
}
