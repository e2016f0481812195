use std::time::Duration;

use config::{Config, ConfigError, File, FileFormat};
use serde::Deserialize;

use crate::shared::constants::{
    MELEE_SWITCH_RATIO, RANGED_SWITCH_RATIO, THREAT_LIST_MAX_DISTANCE, THREAT_UPDATE_INTERVAL,
};

const CONFIG_TEMPLATE: &str = include_str!("../config.template.toml");

#[derive(Debug, Deserialize)]
pub struct ThreatConfig {
    pub threat: ThreatSection,
    pub sim: SimSection,
}

impl ThreatConfig {
    // https://github.com/mehcode/config-rs/blob/master/examples/hierarchical-env/settings.rs
    pub fn load(override_file: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::from_str(CONFIG_TEMPLATE, FileFormat::Toml))
            .add_source(File::with_name(override_file).required(false))
            .build()?;

        s.try_deserialize()
    }
}

#[derive(Debug, Deserialize)]
pub struct ThreatSection {
    pub update_interval_ms: u64,
    pub max_reference_distance: f32,
    pub melee_switch_ratio: f32,
    pub ranged_switch_ratio: f32,
}

#[derive(Debug, Deserialize)]
pub struct SimSection {
    pub ticks: u32,
    pub tick_ms: u64,
}

/// Tunables of a threat manager
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThreatSettings {
    pub update_interval: Duration,
    pub max_reference_distance: f32,
    pub melee_switch_ratio: f32,
    pub ranged_switch_ratio: f32,
}

impl Default for ThreatSettings {
    fn default() -> Self {
        Self {
            update_interval: THREAT_UPDATE_INTERVAL,
            max_reference_distance: THREAT_LIST_MAX_DISTANCE,
            melee_switch_ratio: MELEE_SWITCH_RATIO,
            ranged_switch_ratio: RANGED_SWITCH_RATIO,
        }
    }
}

impl From<&ThreatSection> for ThreatSettings {
    fn from(section: &ThreatSection) -> Self {
        Self {
            update_interval: Duration::from_millis(section.update_interval_ms),
            max_reference_distance: section.max_reference_distance,
            melee_switch_ratio: section.melee_switch_ratio,
            ranged_switch_ratio: section.ranged_switch_ratio,
        }
    }
}
