pub mod combat_flags;
pub mod controlled;
pub mod guid;
pub mod health;
pub mod melee;
pub mod threat_auras;
pub mod threat_list;
pub mod unit;
