pub mod config;
pub mod ecs;
pub mod entities;
pub mod game;
pub mod shared;

pub use game::{
    hostile_reference::{HostileReference, ThreatRefStatusChangeEvent},
    threat_calc::{RawThreat, ThreatCalcHelper, ThreatSpell},
    threat_container::ThreatContainer,
    threat_manager::ThreatManager,
};
