use std::{collections::HashMap, time::Duration};

use clap::{value_parser, Arg, Command};
use config::ConfigError;
use env_logger::Env;
use log::{info, warn};
use rustbolt_threat::{
    config::{ThreatConfig, ThreatSettings},
    ecs::{
        components::{
            combat_flags::CombatFlags, controlled::Controlled, guid::Guid, health::Health,
            melee::Melee, threat_auras::ThreatAuras, threat_list::ThreatList, unit::Unit,
        },
        resources::{DeltaTime, EntityIndex},
        systems::combat::{
            deal_damage, despawn_unit, register_unit, select_target, send_threat_updates,
            update_threat_lists, with_threat_manager,
        },
    },
    entities::{object_guid::ObjectGuid, position::WorldPosition},
    game::threat_calc::{RawThreat, ThreatSpell},
    shared::constants::{CombatFlag, HighGuidType, SpellSchoolMask},
};
use shipyard::{EntityId, Get, UniqueViewMut, View, ViewMut, World};

#[derive(Debug)]
enum SimError {
    Config(ConfigError),
    UnknownUnit(&'static str),
}

impl From<ConfigError> for SimError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

const CREATURE: &str = "hogger";

enum SimEvent {
    Damage(&'static str, u32),
    Spell(&'static str, u32, RawThreat),
    Heal(&'static str, u32),
    Taunt(&'static str),
    TauntFade(&'static str),
    Fly(&'static str, bool),
    Rooted(bool),
    Fade(&'static str, f32),
    FadeEnd(&'static str),
    Misdirection(&'static str, Option<&'static str>),
    Logout(&'static str),
}

fn script() -> Vec<(u32, SimEvent)> {
    let fireball = ThreatSpell::new(133);

    vec![
        (0, SimEvent::Damage("warrior", 120)),
        (1, SimEvent::Damage("rogue", 90)),
        (2, SimEvent::Spell("mage", 110, RawThreat::new(110.).spell(fireball).critical())),
        (3, SimEvent::Heal("priest", 200)),
        (4, SimEvent::Misdirection("hunter", Some("warrior"))),
        (4, SimEvent::Damage("hunter", 150)),
        (5, SimEvent::Misdirection("hunter", None)),
        (6, SimEvent::Damage("pet", 60)),
        (8, SimEvent::Spell("mage", 160, RawThreat::new(160.).spell(fireball))),
        (10, SimEvent::Taunt("rogue")),
        (14, SimEvent::TauntFade("rogue")),
        (16, SimEvent::Fly("mage", true)),
        (18, SimEvent::Rooted(true)),
        (19, SimEvent::Damage("hunter", 400)),
        (22, SimEvent::Rooted(false)),
        (24, SimEvent::Fly("mage", false)),
        (26, SimEvent::Fade("mage", -500.)),
        (30, SimEvent::FadeEnd("mage")),
        (32, SimEvent::Logout("rogue")),
        (36, SimEvent::Damage("warrior", 800)),
    ]
}

struct Sim {
    world: World,
    units: HashMap<&'static str, EntityId>,
}

impl Sim {
    fn new(settings: ThreatSettings) -> Self {
        let mut world = World::new();
        world.add_unique(DeltaTime::default());
        world.add_unique(EntityIndex::default());

        let mut sim = Self {
            world,
            units: HashMap::new(),
        };

        let creature_guid = ObjectGuid::with_entry(HighGuidType::Unit, 448, 1);
        let creature = sim.spawn(CREATURE, creature_guid, 5000, (0., 0.), 2.);
        sim.world.add_component(
            creature,
            (Unit::new(), ThreatAuras::new(), ThreatList::new(creature, settings)),
        );

        let players = [
            ("warrior", (1.5, 0.)),
            ("rogue", (-1.5, 1.)),
            ("mage", (25., 5.)),
            ("priest", (28., -5.)),
            ("hunter", (30., 0.)),
        ];
        for (counter, (name, at)) in players.into_iter().enumerate() {
            let guid = ObjectGuid::new(HighGuidType::Player, counter as u32 + 1);
            let player = sim.spawn(name, guid, 3000, at, 1.5);
            sim.world.add_component(player, (ThreatAuras::new(),));
        }

        // Burning Soul: less threat from fire spells
        let mage = sim.units["mage"];
        sim.with_auras(mage, |auras| auras.set_spell_threat_multiplier(133, 0.9));

        let pet_guid = ObjectGuid::with_entry(HighGuidType::Pet, 1201, 1);
        let pet = sim.spawn("pet", pet_guid, 1500, (1., -1.), 1.);
        let hunter = sim.units["hunter"];
        sim.world.add_component(pet, (Controlled { master: hunter },));
        sim.set_flag(pet, CombatFlag::PropagateThreatToOwner, true);

        sim
    }

    fn spawn(
        &mut self,
        name: &'static str,
        guid: ObjectGuid,
        health: u32,
        (x, y): (f32, f32),
        melee_reach: f32,
    ) -> EntityId {
        let entity_id = self.world.add_entity((
            Guid(guid),
            Health::new(health, health),
            WorldPosition::new(0, x, y, 0.),
            Melee::new(melee_reach),
            CombatFlags::default(),
        ));
        register_unit(&self.world, guid, entity_id);
        self.units.insert(name, entity_id);

        entity_id
    }

    fn unit(&self, name: &'static str) -> Result<EntityId, SimError> {
        self.units
            .get(name)
            .copied()
            .ok_or(SimError::UnknownUnit(name))
    }

    fn set_flag(&self, unit: EntityId, flag: CombatFlag, enabled: bool) {
        self.world.run(|mut vm_flags: ViewMut<CombatFlags>| {
            if let Ok(mut flags) = (&mut vm_flags).get(unit) {
                flags.set(flag, enabled);
            }
        });
    }

    fn with_auras(&self, unit: EntityId, f: impl FnOnce(&mut ThreatAuras)) {
        self.world.run(|mut vm_auras: ViewMut<ThreatAuras>| {
            if let Ok(mut auras) = (&mut vm_auras).get(unit) {
                f(&mut *auras);
            }
        });
    }

    fn guid(&self, unit: EntityId) -> Option<ObjectGuid> {
        self.world
            .run(|v_guid: View<Guid>| v_guid.get(unit).map(|guid| guid.0).ok())
    }

    fn apply(&mut self, event: &SimEvent) -> Result<(), SimError> {
        let creature = self.unit(CREATURE)?;

        match *event {
            SimEvent::Damage(attacker, amount) => {
                info!("{attacker} hits {CREATURE} for {amount}");
                deal_damage(&self.world, self.unit(attacker)?, creature, amount);
            }
            SimEvent::Spell(caster, amount, raw) => {
                info!("{caster} casts a spell on {CREATURE} for {amount}");
                let caster = self.unit(caster)?;
                self.world.run(|mut vm_health: ViewMut<Health>| {
                    if let Ok(mut health) = (&mut vm_health).get(creature) {
                        health.apply_damage(amount);
                    }
                });
                with_threat_manager(&self.world, creature, |manager, ctx| {
                    manager.add_threat(ctx, caster, raw.school(SpellSchoolMask::Fire.into()));
                });
            }
            SimEvent::Heal(healer, amount) => {
                // Healing threat is split among every enemy, here there is only one
                info!("{healer} heals for {amount}");
                let healer = self.unit(healer)?;
                let raw = RawThreat::new(amount as f32 * 0.5).assist();
                with_threat_manager(&self.world, creature, |manager, ctx| {
                    manager.add_threat(ctx, healer, raw);
                });
            }
            SimEvent::Taunt(caster) => {
                info!("{caster} taunts {CREATURE}");
                let Some(caster_guid) = self.guid(self.unit(caster)?) else {
                    return Ok(());
                };
                self.with_auras(creature, |auras| auras.add_taunt(caster_guid));
                with_threat_manager(&self.world, creature, |manager, ctx| {
                    manager.taunt_update(ctx)
                });
            }
            SimEvent::TauntFade(caster) => {
                info!("taunt from {caster} fades");
                let Some(caster_guid) = self.guid(self.unit(caster)?) else {
                    return Ok(());
                };
                self.with_auras(creature, |auras| auras.remove_taunt(&caster_guid));
                with_threat_manager(&self.world, creature, |manager, ctx| {
                    manager.taunt_update(ctx)
                });
            }
            SimEvent::Fly(unit, flying) => {
                info!("{unit} flying: {flying}");
                self.set_flag(self.unit(unit)?, CombatFlag::Unreachable, flying);
            }
            SimEvent::Rooted(rooted) => {
                info!("{CREATURE} rooted: {rooted}");
                self.set_flag(creature, CombatFlag::IgnoreRangedTargets, rooted);
            }
            SimEvent::Fade(unit, amount) => {
                info!("{unit} fades");
                let unit = self.unit(unit)?;
                with_threat_manager(&self.world, creature, |manager, ctx| {
                    manager.set_fadeout_threat_reduction(ctx, unit, amount)
                });
            }
            SimEvent::FadeEnd(unit) => {
                info!("fade from {unit} wears off");
                let unit = self.unit(unit)?;
                with_threat_manager(&self.world, creature, |manager, ctx| {
                    manager.reset_fadeout_threat_reduction(ctx, unit)
                });
            }
            SimEvent::Misdirection(hunter, target) => {
                let target = target.map(|name| self.unit(name)).transpose()?;
                self.with_auras(self.unit(hunter)?, |auras| auras.set_redirect_to(target));
            }
            SimEvent::Logout(unit) => {
                info!("{unit} logs out");
                let unit = self.units.remove(unit).ok_or(SimError::UnknownUnit(unit))?;
                despawn_unit(&mut self.world, unit);
            }
        }

        Ok(())
    }

    fn tick(&self, elapsed: Duration) {
        self.world.run(|mut dt: UniqueViewMut<DeltaTime>| {
            *dt = DeltaTime(elapsed);
        });
        self.world.run(update_threat_lists);
        self.world.run(select_target);
        self.world.run(send_threat_updates);
    }
}

fn main() -> Result<(), SimError> {
    let matches = Command::new("threat_sim")
        .about("Runs a scripted encounter through the threat engine")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .default_value("threat.toml"),
        )
        .arg(
            Arg::new("ticks")
                .long("ticks")
                .short('t')
                .value_parser(value_parser!(u32)),
        )
        .get_matches();

    // Load config
    let config_file = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("threat.toml");
    let config = ThreatConfig::load(config_file)?;

    // Setup logging
    env_logger::Builder::from_env(Env::default().default_filter_or("debug")).init();

    let ticks = matches
        .get_one::<u32>("ticks")
        .copied()
        .unwrap_or(config.sim.ticks);
    let tick_duration = Duration::from_millis(config.sim.tick_ms);

    let mut sim = Sim::new(ThreatSettings::from(&config.threat));
    let mut script = script().into_iter().peekable();

    for tick in 0..ticks {
        while let Some((_, event)) = script.next_if(|(at, _)| *at == tick) {
            if let Err(e) = sim.apply(&event) {
                warn!("tick {tick}: {e:?}");
            }
        }

        sim.tick(tick_duration);
    }

    if script.peek().is_some() {
        warn!("simulation ended before the end of the script");
    }

    info!("simulation over after {ticks} ticks");
    Ok(())
}
