//! Tests for the melee weapon engine systems (headless app).

#[cfg(test)]
mod tests {
    use crate::ai::{EnemyConfig, Knockback};
    use crate::combat::{
        DamageDealt, DamageKind, DamageRequest, Dead, MeleeWeapon, WeaponContact, WeaponStruck,
    };
    use crate::components::{Grip, GripSignal, Hand, Health};
    use crate::effects::{EffectKind, StatusEffects};
    use crate::{
        create_headless_app, run_fixed_tick, run_fixed_ticks, spawn_enemy, SimulationPlugin,
    };
    use bevy::prelude::*;

    fn combat_app() -> App {
        let mut app = create_headless_app(42);
        app.add_plugins(SimulationPlugin);
        app
    }

    fn spawn_weapon(app: &mut App, weapon: MeleeWeapon, grip: Grip) -> Entity {
        app.world_mut().spawn((weapon, grip, Transform::default())).id()
    }

    fn one_hand() -> Grip {
        Grip {
            primary: Some(Hand::Right),
            secondary: None,
        }
    }

    fn two_hands() -> Grip {
        Grip {
            primary: Some(Hand::Right),
            secondary: Some(Hand::Left),
        }
    }

    fn spawn_agent(app: &mut App, position: Vec3) -> Entity {
        spawn_enemy(app.world_mut(), &EnemyConfig::default(), position)
    }

    fn contact(app: &mut App, weapon: Entity, agent: Entity) {
        app.world_mut()
            .send_event(WeaponContact::new(weapon, agent, Vec3::ZERO));
    }

    fn health(app: &App, entity: Entity) -> f32 {
        app.world().get::<Health>(entity).map(|h| h.current).unwrap_or(-1.0)
    }

    fn drain<E: Event>(app: &mut App) -> Vec<E> {
        app.world_mut().resource_mut::<Events<E>>().drain().collect()
    }

    /// `ticks` тиков, события `E` собираются после каждого
    fn run_collecting<E: Event>(app: &mut App, ticks: u32) -> Vec<E> {
        let mut collected = Vec::new();
        for _ in 0..ticks {
            run_fixed_tick(app);
            collected.extend(drain::<E>(app));
        }
        collected
    }

    #[test]
    fn test_contacts_within_cooldown_apply_once() {
        let mut app = combat_app();
        let sword = spawn_weapon(&mut app, MeleeWeapon::sword(), one_hand());
        let agent = spawn_agent(&mut app, Vec3::new(0.0, 0.0, -1.0));

        // Два контакта в одном тике — один удар
        contact(&mut app, sword, agent);
        contact(&mut app, sword, agent);
        let mut struck = run_collecting::<WeaponStruck>(&mut app, 1);
        assert_eq!(health(&app, agent), 90.0);

        // Контакты внутри cooldown (0.3 с) отбрасываются
        for _ in 0..5 {
            contact(&mut app, sword, agent);
            struck.extend(run_collecting::<WeaponStruck>(&mut app, 1));
        }
        assert_eq!(health(&app, agent), 90.0);

        // После cooldown — снова урон
        run_fixed_ticks(&mut app, 20);
        contact(&mut app, sword, agent);
        struck.extend(run_collecting::<WeaponStruck>(&mut app, 1));
        assert_eq!(health(&app, agent), 80.0);

        assert_eq!(struck.len(), 2);
        assert!(struck.iter().all(|s| s.damage == 10 && !s.critical));
    }

    #[test]
    fn test_weapon_at_rest_is_inert() {
        let mut app = combat_app();
        let sword = spawn_weapon(&mut app, MeleeWeapon::sword(), Grip::default());
        let agent = spawn_agent(&mut app, Vec3::ZERO);

        contact(&mut app, sword, agent);
        run_fixed_tick(&mut app);

        assert_eq!(health(&app, agent), 100.0);
        assert!(drain::<DamageRequest>(&mut app).is_empty());
    }

    #[test]
    fn test_contact_with_dead_agent_ignored() {
        let mut app = combat_app();
        let sword = spawn_weapon(&mut app, MeleeWeapon::sword(), one_hand());
        let agent = spawn_agent(&mut app, Vec3::ZERO);
        app.world_mut().entity_mut(agent).insert(Dead);

        contact(&mut app, sword, agent);
        run_fixed_tick(&mut app);

        assert!(drain::<DamageRequest>(&mut app).is_empty());
        assert_eq!(health(&app, agent), 100.0);
    }

    #[test]
    fn test_contact_from_unknown_weapon_is_absorbed() {
        let mut app = combat_app();
        let agent = spawn_agent(&mut app, Vec3::ZERO);
        let ghost = app.world_mut().spawn_empty().id();
        app.world_mut().despawn(ghost);

        contact(&mut app, ghost, agent);
        run_fixed_tick(&mut app);

        assert_eq!(health(&app, agent), 100.0);
    }

    #[test]
    fn test_curved_dagger_bleeds_for_five_ticks() {
        let mut app = combat_app();
        let dagger = spawn_weapon(&mut app, MeleeWeapon::curved_dagger(), one_hand());
        let agent = spawn_agent(&mut app, Vec3::ZERO);

        contact(&mut app, dagger, agent);
        let mut dealt = run_collecting::<DamageDealt>(&mut app, 1);
        // Удар 10 + первый тик bleed сразу
        assert_eq!(health(&app, agent), 88.0);

        dealt.extend(run_collecting::<DamageDealt>(&mut app, 6 * 60));
        assert_eq!(health(&app, agent), 80.0);

        let bleed_ticks = dealt
            .iter()
            .filter(|dealt| dealt.kind == DamageKind::Bleed)
            .count();
        assert_eq!(bleed_ticks, 5);
        assert!(app.world().resource::<StatusEffects>().is_empty());
    }

    #[test]
    fn test_axe_applies_stun() {
        let mut app = combat_app();
        let axe = spawn_weapon(&mut app, MeleeWeapon::axe(), one_hand());
        let agent = spawn_agent(&mut app, Vec3::ZERO);

        contact(&mut app, axe, agent);
        run_fixed_tick(&mut app);

        assert!(app
            .world()
            .resource::<StatusEffects>()
            .is_active(agent, EffectKind::Stun));

        // Stun 2 с истекает
        run_fixed_ticks(&mut app, 2 * 60 + 5);
        assert!(!app
            .world()
            .resource::<StatusEffects>()
            .is_active(agent, EffectKind::Stun));
    }

    #[test]
    fn test_mace_knockback_pushes_agent_away() {
        let mut app = combat_app();
        let mace = spawn_weapon(&mut app, MeleeWeapon::mace(), one_hand());
        let agent = spawn_agent(&mut app, Vec3::new(0.0, 0.0, -2.0));

        contact(&mut app, mace, agent);
        run_fixed_tick(&mut app);

        let knockback = *app.world().get::<Knockback>(agent).unwrap();
        assert!(knockback.velocity.z < 0.0);
        assert!(knockback.velocity.y > 0.0, "небольшой upward bias");

        run_fixed_ticks(&mut app, 60);
        let position = app.world().get::<Transform>(agent).unwrap().translation;
        assert!(position.z < -2.5, "position = {position:?}");
        assert_eq!(position.y, 0.0, "смещение только в плоскости земли");
    }

    #[test]
    fn test_charge_sweep_strikes_everyone_in_reach() {
        let mut app = combat_app();
        let sword = spawn_weapon(&mut app, MeleeWeapon::two_handed_sword(), two_hands());
        let near = spawn_agent(&mut app, Vec3::new(0.0, 0.0, -1.0));
        let edge = spawn_agent(&mut app, Vec3::new(1.5, 0.0, 0.0));
        let far = spawn_agent(&mut app, Vec3::new(0.0, 0.0, 3.0));

        app.world_mut().send_event(GripSignal::activate(sword));
        run_fixed_tick(&mut app);

        // Во время charge контакты игнорируются
        contact(&mut app, sword, near);
        run_fixed_tick(&mut app);
        assert_eq!(health(&app, near), 100.0);

        // Полный charge (1.5 с) → release
        run_fixed_ticks(&mut app, 100);
        app.world_mut().send_event(GripSignal::activate(sword));
        run_fixed_tick(&mut app);

        // 10 × 1.5 (две руки) × 2.0 (полный charge)
        assert_eq!(health(&app, near), 70.0);
        assert_eq!(health(&app, edge), 70.0);
        assert_eq!(health(&app, far), 100.0);
    }

    #[test]
    fn test_releasing_second_hand_keeps_charge() {
        let mut app = combat_app();
        let sword = spawn_weapon(&mut app, MeleeWeapon::two_handed_sword(), two_hands());
        let agent = spawn_agent(&mut app, Vec3::new(0.0, 0.0, -1.0));

        app.world_mut().send_event(GripSignal::activate(sword));
        run_fixed_tick(&mut app);
        app.world_mut().send_event(GripSignal::release(sword, Hand::Left));
        run_fixed_tick(&mut app);

        // Charge держится и одной рукой: контакты всё ещё игнорируются
        assert!(app.world().get::<MeleeWeapon>(sword).unwrap().damage.suppresses_contact());
        contact(&mut app, sword, agent);
        run_fixed_tick(&mut app);
        assert_eq!(health(&app, agent), 100.0);

        // Release одной рукой: полный charge, без two-handed множителя (10 × 2.0)
        run_fixed_ticks(&mut app, 100);
        app.world_mut().send_event(GripSignal::activate(sword));
        run_fixed_tick(&mut app);
        assert_eq!(health(&app, agent), 80.0);
    }

    #[test]
    fn test_one_handed_grip_cannot_start_charge() {
        let mut app = combat_app();
        let sword = spawn_weapon(&mut app, MeleeWeapon::two_handed_sword(), one_hand());
        let agent = spawn_agent(&mut app, Vec3::new(0.0, 0.0, -1.0));

        // Activate одной рукой не начинает charge, контакт бьёт базовым уроном
        app.world_mut().send_event(GripSignal::activate(sword));
        contact(&mut app, sword, agent);
        run_fixed_tick(&mut app);

        assert!(!app.world().get::<MeleeWeapon>(sword).unwrap().damage.suppresses_contact());
        assert_eq!(health(&app, agent), 90.0);
    }

    #[test]
    fn test_one_handed_sword_combo_builds_up() {
        let mut app = combat_app();
        let sword = spawn_weapon(&mut app, MeleeWeapon::one_handed_sword(), one_hand());
        let agent = spawn_agent(&mut app, Vec3::ZERO);

        // Удары каждые 0.4 с: внутри combo window (0.8 с), вне cooldown (0.3 с)
        let mut damages = Vec::new();
        for _ in 0..4 {
            contact(&mut app, sword, agent);
            run_fixed_tick(&mut app);
            damages.extend(drain::<WeaponStruck>(&mut app).iter().map(|s| s.damage));
            run_fixed_ticks(&mut app, 23);
        }

        // tier 0 → 1 → 2 → 3: 10, 11, 12, 14 (multiplier 1.2)
        assert_eq!(damages, vec![10, 11, 12, 14]);
    }

    #[test]
    fn test_grip_signals_drive_hold_state() {
        let mut app = combat_app();
        let sword = spawn_weapon(&mut app, MeleeWeapon::sword(), Grip::default());

        app.world_mut().send_event(GripSignal::grab(sword, Hand::Left));
        run_fixed_tick(&mut app);
        assert!(app.world().get::<Grip>(sword).unwrap().held());

        app.world_mut().send_event(GripSignal::grab(sword, Hand::Right));
        run_fixed_tick(&mut app);
        assert!(app.world().get::<Grip>(sword).unwrap().two_handed());

        app.world_mut().send_event(GripSignal::release(sword, Hand::Left));
        run_fixed_tick(&mut app);
        assert_eq!(*app.world().get::<Grip>(sword).unwrap(), Grip::default());
    }
}
