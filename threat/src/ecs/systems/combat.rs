use log::{info, trace};
use shipyard::{
    EntityId, Get, IntoIter, IntoWithId, UniqueView, UniqueViewMut, View, ViewMut, World,
};

use crate::{
    ecs::{
        combat_context::{CombatViews, EcsCombatContext},
        components::{guid::Guid, health::Health, threat_list::ThreatList, unit::Unit},
        resources::{DeltaTime, EntityIndex},
    },
    entities::object_guid::ObjectGuid,
    game::{combat_context::UnitAccessor, threat_calc::RawThreat, threat_manager::ThreatManager},
};

/// Run `f` against the threat manager of `owner`, if it has one.
pub fn with_threat_manager<R>(
    world: &World,
    owner: EntityId,
    f: impl FnOnce(&mut ThreatManager, &EcsCombatContext) -> R,
) -> Option<R> {
    world.run(
        |views: CombatViews, mut vm_threat_list: ViewMut<ThreatList>| {
            let ctx = EcsCombatContext::from(views);
            let mut threat_list = (&mut vm_threat_list).get(owner).ok()?;

            Some(f(threat_list.manager_mut(), &ctx))
        },
    )
}

/// `attacker` hits `victim`: damage first, then the victim hates the attacker.
pub fn deal_damage(world: &World, attacker: EntityId, victim: EntityId, damage: u32) {
    world.run(|mut vm_health: ViewMut<Health>| {
        if let Ok(mut health) = (&mut vm_health).get(victim) {
            health.apply_damage(damage);
        }
    });

    with_threat_manager(world, victim, |manager, ctx| {
        manager.add_threat(ctx, attacker, RawThreat::new(damage as f32));
    });
}

/// Add `guid` to the world, making it resolvable by the threat lists referencing it.
pub fn register_unit(world: &World, guid: ObjectGuid, entity_id: EntityId) {
    world.run(|mut index: UniqueViewMut<EntityIndex>| index.insert(guid, entity_id));
}

/// The unit leaves the world. References to it go offline until it can be resolved again.
pub fn despawn_unit(world: &mut World, entity_id: EntityId) {
    let guid = world.run(|v_guid: View<Guid>| v_guid.get(entity_id).map(|guid| guid.0).ok());

    if let Some(guid) = guid {
        world.run(|mut index: UniqueViewMut<EntityIndex>| index.remove(&guid));

        world.run(
            |views: CombatViews, mut vm_threat_list: ViewMut<ThreatList>| {
                let ctx = EcsCombatContext::from(views);

                for mut threat_list in (&mut vm_threat_list).iter() {
                    threat_list.manager_mut().unit_destroyed(&ctx, &guid);
                }
            },
        );
    }

    world.delete_entity(entity_id);
}

pub fn select_target(
    views: CombatViews,
    mut vm_unit: ViewMut<Unit>,
    mut vm_threat_list: ViewMut<ThreatList>,
) {
    let ctx = EcsCombatContext::from(views);

    for (entity_id, (mut unit, mut threat_list)) in
        (&mut vm_unit, &mut vm_threat_list).iter().with_id()
    {
        // Reset our target and threat list if we're dead
        if !ctx.is_alive(entity_id) {
            if unit.target().is_some() {
                unit.set_target(None);
            }

            if !threat_list.is_empty() {
                threat_list.manager_mut().clear_all_threat(&ctx);
            }

            continue;
        }

        let target = threat_list.manager_mut().get_hostile_target(&ctx);
        if unit.target() != target {
            trace!("{} changes target to {target:?}", ctx.describe(entity_id));
            unit.set_target(target);
        }
    }
}

/// Reachability and range checks of every threat list
pub fn update_threat_lists(views: CombatViews, mut vm_threat_list: ViewMut<ThreatList>) {
    let ctx = EcsCombatContext::from(views);

    for mut threat_list in (&mut vm_threat_list).iter() {
        let manager = threat_list.manager_mut();

        manager.update_online_statuses(&ctx);
        manager.delete_out_of_range_references(&ctx);
    }
}

pub fn send_threat_updates(
    dt: UniqueView<DeltaTime>,
    v_guid: View<Guid>,
    mut vm_threat_list: ViewMut<ThreatList>,
) {
    for mut threat_list in (&mut vm_threat_list).iter() {
        if !threat_list.manager_mut().is_need_update_to_client(dt.0) {
            continue;
        }

        let Ok(owner_guid) = v_guid.get(threat_list.manager().owner()) else {
            continue;
        };

        let entries: Vec<String> = threat_list
            .manager()
            .online_list()
            .iter()
            .map(|reference| format!("{}={:.0}", reference.unit_guid(), reference.threat()))
            .collect();

        info!("SMSG_THREAT_UPDATE for {}: [{}]", owner_guid.0, entries.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        config::ThreatSettings,
        ecs::components::{
            combat_flags::CombatFlags, melee::Melee, threat_auras::ThreatAuras,
        },
        entities::position::WorldPosition,
        shared::constants::{
            CombatFlag, HighGuidType, HostileState, SpellSchoolMask, TauntState,
        },
    };

    struct Arena {
        world: World,
        creature: EntityId,
        counter: u32,
    }

    impl Arena {
        fn new() -> Self {
            let mut world = World::new();
            world.add_unique(DeltaTime::default());
            world.add_unique(EntityIndex::default());

            let guid = ObjectGuid::with_entry(HighGuidType::Unit, 1, 1);
            let creature = world.add_entity((
                Guid(guid),
                Health::new(1000, 1000),
                WorldPosition::new(0, 0., 0., 0.),
                Melee::new(1.5),
                Unit::new(),
                CombatFlags::default(),
                ThreatAuras::new(),
            ));
            world.add_component(creature, (ThreatList::new(creature, ThreatSettings::default()),));
            register_unit(&world, guid, creature);

            Self {
                world,
                creature,
                counter: 1,
            }
        }

        fn spawn_player(&mut self, x: f32) -> EntityId {
            self.counter += 1;
            let guid = ObjectGuid::new(HighGuidType::Player, self.counter);
            let player = self.world.add_entity((
                Guid(guid),
                Health::new(100, 100),
                WorldPosition::new(0, x, 0., 0.),
                Melee::new(1.5),
                CombatFlags::default(),
            ));
            register_unit(&self.world, guid, player);

            player
        }

        fn creature_target(&self) -> Option<EntityId> {
            self.world
                .run(|v_unit: View<Unit>| v_unit.get(self.creature).ok().and_then(|u| u.target()))
        }

        fn tick(&self) {
            self.world.run(update_threat_lists);
            self.world.run(select_target);
        }
    }

    #[test]
    fn test_damage_builds_threat_and_picks_a_target() {
        let mut arena = Arena::new();
        let warrior = arena.spawn_player(2.);
        let mage = arena.spawn_player(20.);

        deal_damage(&arena.world, warrior, arena.creature, 100);
        deal_damage(&arena.world, mage, arena.creature, 80);
        arena.tick();
        assert_eq!(arena.creature_target(), Some(warrior));

        // At range the mage needs 130%
        deal_damage(&arena.world, mage, arena.creature, 40);
        arena.tick();
        assert_eq!(arena.creature_target(), Some(warrior));

        deal_damage(&arena.world, mage, arena.creature, 11);
        arena.tick();
        assert_eq!(arena.creature_target(), Some(mage));

        let health = arena.world.run(|v_health: View<Health>| {
            v_health.get(arena.creature).map(|h| h.current()).ok()
        });
        assert_eq!(health, Some(1000 - 231));
    }

    #[test]
    fn test_dead_owner_forgets_everything() {
        let mut arena = Arena::new();
        let warrior = arena.spawn_player(2.);

        deal_damage(&arena.world, warrior, arena.creature, 100);
        arena.tick();
        assert_eq!(arena.creature_target(), Some(warrior));

        arena.world.run(|mut vm_health: ViewMut<Health>| {
            if let Ok(mut health) = (&mut vm_health).get(arena.creature) {
                health.apply_damage(5000);
            }
        });
        arena.tick();

        assert_eq!(arena.creature_target(), None);
        let empty = with_threat_manager(&arena.world, arena.creature, |manager, _| {
            manager.is_threat_list_empty()
        });
        assert_eq!(empty, Some(true));
    }

    #[test]
    fn test_unreachable_player_goes_offline() {
        let mut arena = Arena::new();
        let warrior = arena.spawn_player(2.);
        let rogue = arena.spawn_player(3.);

        deal_damage(&arena.world, warrior, arena.creature, 500);
        deal_damage(&arena.world, rogue, arena.creature, 100);
        arena.tick();
        assert_eq!(arena.creature_target(), Some(warrior));

        arena.world.run(|mut vm_flags: ViewMut<CombatFlags>| {
            if let Ok(mut flags) = (&mut vm_flags).get(warrior) {
                flags.set(CombatFlag::Unreachable, true);
            }
        });
        arena.tick();

        assert_eq!(arena.creature_target(), Some(rogue));
        let offline = with_threat_manager(&arena.world, arena.creature, |manager, _| {
            manager.offline_list().len()
        });
        assert_eq!(offline, Some(1));
    }

    #[test]
    fn test_despawned_unit_is_relinked_on_return() {
        let mut arena = Arena::new();
        let warrior = arena.spawn_player(2.);
        let warrior_guid = arena
            .world
            .run(|v_guid: View<Guid>| v_guid.get(warrior).map(|g| g.0).ok())
            .unwrap();

        deal_damage(&arena.world, warrior, arena.creature, 100);
        arena.tick();

        despawn_unit(&mut arena.world, warrior);
        arena.tick();
        assert_eq!(arena.creature_target(), None);

        // Logs back in as a new entity
        let returned = arena.world.add_entity((
            Guid(warrior_guid),
            Health::new(100, 100),
            WorldPosition::new(0, 2., 0., 0.),
            Melee::new(1.5),
            CombatFlags::default(),
        ));
        register_unit(&arena.world, warrior_guid, returned);
        arena.tick();

        assert_eq!(arena.creature_target(), Some(returned));
        let threat = with_threat_manager(&arena.world, arena.creature, |manager, ctx| {
            manager.threat(ctx, returned, false)
        });
        assert_eq!(threat, Some(100.));
    }

    #[test]
    fn test_out_of_range_player_is_dropped() {
        let mut arena = Arena::new();
        let hunter = arena.spawn_player(30.);

        deal_damage(&arena.world, hunter, arena.creature, 100);
        arena.tick();
        assert_eq!(arena.creature_target(), Some(hunter));

        arena.world.run(|mut vm_wpos: ViewMut<WorldPosition>| {
            if let Ok(mut wpos) = (&mut vm_wpos).get(hunter) {
                wpos.x = 100.;
            }
        });
        arena.tick();

        assert_eq!(arena.creature_target(), None);
    }

    fn guid_of(world: &World, unit: EntityId) -> ObjectGuid {
        world
            .run(|v_guid: View<Guid>| v_guid.get(unit).map(|g| g.0).ok())
            .unwrap()
    }

    fn with_auras(world: &World, unit: EntityId, f: impl FnOnce(&mut ThreatAuras)) {
        world.run(|mut vm_auras: ViewMut<ThreatAuras>| {
            let mut auras = (&mut vm_auras).get(unit).unwrap();
            f(&mut *auras);
        });
    }

    #[test]
    fn test_taunt_aura_forces_target() {
        let mut arena = Arena::new();
        let warrior = arena.spawn_player(2.);
        let rogue = arena.spawn_player(3.);
        let rogue_guid = guid_of(&arena.world, rogue);

        deal_damage(&arena.world, warrior, arena.creature, 500);
        deal_damage(&arena.world, rogue, arena.creature, 100);
        arena.tick();
        assert_eq!(arena.creature_target(), Some(warrior));

        with_auras(&arena.world, arena.creature, |auras| auras.add_taunt(rogue_guid));
        with_threat_manager(&arena.world, arena.creature, |manager, ctx| {
            manager.taunt_update(ctx)
        });
        arena.tick();
        assert_eq!(arena.creature_target(), Some(rogue));

        with_auras(&arena.world, arena.creature, |auras| auras.remove_taunt(&rogue_guid));
        with_threat_manager(&arena.world, arena.creature, |manager, ctx| {
            manager.taunt_update(ctx)
        });
        arena.tick();
        assert_eq!(arena.creature_target(), Some(warrior));
    }

    #[test]
    fn test_threat_multiplier_aura() {
        let mut arena = Arena::new();
        let paladin = arena.spawn_player(2.);
        arena.world.add_component(paladin, (ThreatAuras::new(),));
        with_auras(&arena.world, paladin, |auras| {
            auras.add_total_threat_multiplier(SpellSchoolMask::Normal.into(), 1.5);
            auras.add_total_threat_multiplier(SpellSchoolMask::Frost.into(), 0.5);
        });

        deal_damage(&arena.world, paladin, arena.creature, 100);

        let threat = with_threat_manager(&arena.world, arena.creature, |manager, ctx| {
            manager.threat(ctx, paladin, false)
        });
        assert_eq!(threat, Some(150.));
    }

    #[test]
    fn test_suppressed_target_stays_suppressed() {
        let mut arena = Arena::new();
        let warrior = arena.spawn_player(2.);
        let rogue = arena.spawn_player(3.);
        let rogue_guid = guid_of(&arena.world, rogue);

        deal_damage(&arena.world, warrior, arena.creature, 100);
        deal_damage(&arena.world, rogue, arena.creature, 100);

        // The creature keeps the rogue suppressed, suppressing the warrior does not release it
        with_auras(&arena.world, arena.creature, |auras| auras.suppress_target(rogue_guid));
        with_threat_manager(&arena.world, arena.creature, |manager, ctx| {
            manager.set_target_suppressed(ctx, rogue);
            manager.set_target_suppressed(ctx, warrior);
        });

        let states = with_threat_manager(&arena.world, arena.creature, |manager, _| {
            manager
                .online_list()
                .iter()
                .map(|r| r.hostile_state())
                .collect::<Vec<_>>()
        });
        assert_eq!(
            states,
            Some(vec![HostileState::Suppressed, HostileState::Suppressed])
        );

        with_auras(&arena.world, arena.creature, |auras| auras.release_target(&rogue_guid));
        let states = with_threat_manager(&arena.world, arena.creature, |manager, ctx| {
            manager.clear_suppressed(ctx, None);
            manager
                .online_list()
                .iter()
                .map(|r| r.hostile_state())
                .collect::<Vec<_>>()
        });
        assert_eq!(states, Some(vec![HostileState::Normal, HostileState::Normal]));
    }

    #[test]
    fn test_detaunt_aura() {
        let mut arena = Arena::new();
        let warrior = arena.spawn_player(2.);
        let rogue = arena.spawn_player(3.);
        arena.world.add_component(rogue, (ThreatAuras::new(),));
        let rogue_guid = guid_of(&arena.world, rogue);

        deal_damage(&arena.world, warrior, arena.creature, 100);
        deal_damage(&arena.world, rogue, arena.creature, 500);

        let creature = arena.creature;
        with_auras(&arena.world, rogue, |auras| auras.add_detaunt(creature));
        with_threat_manager(&arena.world, creature, |manager, ctx| manager.taunt_update(ctx));
        arena.tick();
        assert_eq!(arena.creature_target(), Some(warrior));

        with_auras(&arena.world, rogue, |auras| auras.remove_detaunt(creature));
        let state = with_threat_manager(&arena.world, creature, |manager, ctx| {
            manager.taunt_update(ctx);
            manager
                .online_list()
                .iter()
                .find(|r| r.unit_guid() == rogue_guid)
                .map(|r| r.taunt_state())
        });
        assert_eq!(state, Some(Some(TauntState::None)));
    }

    #[test]
    fn test_threat_updates_are_throttled() {
        let mut arena = Arena::new();
        let warrior = arena.spawn_player(2.);
        deal_damage(&arena.world, warrior, arena.creature, 100);

        for _ in 0..3 {
            arena.world.run(|mut dt: UniqueViewMut<DeltaTime>| {
                *dt = DeltaTime(Duration::from_millis(500));
            });
            arena.world.run(send_threat_updates);
        }

        // 500ms left before the next update
        let due = with_threat_manager(&arena.world, arena.creature, |manager, _| {
            (
                manager.is_need_update_to_client(Duration::from_millis(499)),
                manager.is_need_update_to_client(Duration::from_millis(1)),
            )
        });
        assert_eq!(due, Some((false, true)));
    }
}
