//! Ranged integration tests: crossbow, bow, wand + projectile contacts
//!
//! Каждый тест — headless App + SimulationPlugin, host сигналы шлются как события.

use bevy::prelude::*;
use rampart_simulation::combat::DespawnAfter;
use rampart_simulation::ranged::{
    AreaSpell, Bow, CyclicLauncher, DrawSignal, DrawState, LoaderState, Projectile,
    ProjectileContact, ProjectileLaunched, ProjectileSpec, ProjectileState, Wand,
};
use rampart_simulation::*;

fn create_ranged_app() -> App {
    let mut app = create_headless_app(42);
    app.add_plugins(SimulationPlugin);
    app
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

fn grab(app: &mut App, weapon: Entity, hand: Hand) {
    app.world_mut().send_event(GripSignal::grab(weapon, hand));
}

fn activate(app: &mut App, weapon: Entity) {
    app.world_mut().send_event(GripSignal::activate(weapon));
}

fn projectile_count(app: &mut App) -> usize {
    let mut query = app.world_mut().query::<&Projectile>();
    query.iter(app.world()).count()
}

fn health(app: &App, entity: Entity) -> f32 {
    app.world().get::<Health>(entity).map(|h| h.current).unwrap_or(-1.0)
}

/// Снаряд в полёте вдоль -Z из `position`
fn spawn_flying(app: &mut App, spec: ProjectileSpec, position: Vec3) -> Entity {
    let at = Transform::from_translation(position);
    let speed = spec.speed;
    app.world_mut()
        .spawn((Projectile::launch(spec, None, &at, speed), at))
        .id()
}

#[test]
fn test_crossbow_reload_fire_cycle() {
    let mut app = create_ranged_app();
    let crossbow = app.world_mut().spawn(CyclicLauncher::default()).id();

    // Без хвата activate игнорируется
    activate(&mut app, crossbow);
    run_fixed_tick(&mut app);
    assert_eq!(
        app.world().get::<CyclicLauncher>(crossbow).unwrap().state,
        LoaderState::Unloaded
    );

    grab(&mut app, crossbow, Hand::Right);
    run_fixed_tick(&mut app);
    assert!(matches!(
        app.world().get::<CyclicLauncher>(crossbow).unwrap().state,
        LoaderState::Reloading { .. }
    ));

    // Fire во время перезарядки отклоняется
    activate(&mut app, crossbow);
    run_fixed_tick(&mut app);
    assert_eq!(projectile_count(&mut app), 0);

    // reload_time 1.5 с
    run_fixed_ticks(&mut app, 90);
    assert!(app.world().get::<CyclicLauncher>(crossbow).unwrap().is_loaded());

    activate(&mut app, crossbow);
    run_fixed_tick(&mut app);
    assert_eq!(projectile_count(&mut app), 1);

    let launched = drain::<ProjectileLaunched>(&mut app);
    assert_eq!(launched.len(), 1);
    assert_eq!(launched[0].launcher, crossbow);
    assert_eq!(launched[0].speed, 30.0);

    // Сразу после выстрела — снова Reloading, второй болт не вылетает
    activate(&mut app, crossbow);
    run_fixed_tick(&mut app);
    assert_eq!(projectile_count(&mut app), 1);
    assert!(matches!(
        app.world().get::<CyclicLauncher>(crossbow).unwrap().state,
        LoaderState::Reloading { .. }
    ));
}

#[test]
fn test_bow_launch_speed_follows_draw_strength() {
    let mut app = create_ranged_app();
    let bow = app.world_mut().spawn(Bow::default()).id();
    // Рука тянет тетиву на 0.2 назад (+Z) при stretch limit 0.25
    let hand = app.world_mut().spawn(Transform::from_xyz(0.0, 0.0, 0.2)).id();

    grab(&mut app, bow, Hand::Left);
    app.world_mut().send_event(DrawSignal::nock(bow, hand));
    run_fixed_tick(&mut app);

    let draw = *app.world().get::<DrawState>(bow).unwrap();
    assert!(draw.is_drawn());
    assert!((draw.strength - 0.8).abs() < 1e-4, "strength = {}", draw.strength);

    app.world_mut().send_event(DrawSignal::loose(bow));
    run_fixed_tick(&mut app);

    let launched = drain::<ProjectileLaunched>(&mut app);
    assert_eq!(launched.len(), 1);
    assert!((launched[0].speed - 8.0).abs() < 1e-3, "speed = {}", launched[0].speed);
    assert_eq!(*app.world().get::<DrawState>(bow).unwrap(), DrawState::default());

    // Стрела полетела вдоль forward лука (-Z)
    let velocity = app.world().get::<Projectile>(launched[0].projectile).unwrap().velocity;
    assert!(velocity.z < -7.0);
}

#[test]
fn test_bow_release_drops_draw_without_firing() {
    let mut app = create_ranged_app();
    let bow = app.world_mut().spawn(Bow::default()).id();
    let hand = app.world_mut().spawn(Transform::from_xyz(0.0, 0.0, 0.1)).id();

    grab(&mut app, bow, Hand::Left);
    app.world_mut().send_event(DrawSignal::nock(bow, hand));
    run_fixed_tick(&mut app);

    app.world_mut()
        .send_event(GripSignal::release(bow, Hand::Left));
    run_fixed_tick(&mut app);

    assert!(!app.world().get::<DrawState>(bow).unwrap().is_drawn());

    app.world_mut().send_event(DrawSignal::loose(bow));
    run_fixed_tick(&mut app);
    assert_eq!(projectile_count(&mut app), 0);
}

#[test]
fn test_projectile_self_destructs_at_max_range() {
    let mut app = create_ranged_app();
    let spec = ProjectileSpec {
        gravity: false,
        ..ProjectileSpec::bolt()
    };
    // 30 м/с × 1/60 с = 0.5 м за тик, дальность 50 м
    let bolt = spawn_flying(&mut app, spec, Vec3::ZERO);

    run_fixed_ticks(&mut app, 95);
    assert!(app.world().get_entity(bolt).is_ok());

    run_fixed_ticks(&mut app, 10);
    assert!(app.world().get_entity(bolt).is_err());
}

#[test]
fn test_projectile_hits_enemy_once_and_attaches() {
    let mut app = create_ranged_app();
    let enemy = spawn_enemy(app.world_mut(), &EnemyConfig::default(), Vec3::new(0.0, 0.0, -5.0));
    let bolt = spawn_flying(&mut app, ProjectileSpec::bolt(), Vec3::new(0.0, 0.0, -4.0));
    app.world_mut().entity_mut(bolt).insert(DespawnAfter::at(10.0));

    // Два контакта в одном тике: урон только от первого
    for _ in 0..2 {
        app.world_mut().send_event(ProjectileContact::new(
            bolt,
            enemy,
            Vec3::new(0.0, 0.0, -4.5),
            Vec3::Z,
        ));
    }
    run_fixed_tick(&mut app);

    assert_eq!(health(&app, enemy), 75.0);
    let projectile = app.world().get::<Projectile>(bolt).unwrap();
    assert_eq!(projectile.state, ProjectileState::Attached { to: Some(enemy) });
    assert_eq!(projectile.velocity, Vec3::ZERO);
    assert_eq!(app.world().get::<ChildOf>(bolt).unwrap().parent(), enemy);

    // Позиция пересчитана в локальное пространство агента (один тик полёта: -0.5 по Z)
    let local = app.world().get::<Transform>(bolt).unwrap().translation;
    assert!(local.distance(Vec3::new(0.0, 0.0, 0.5)) < 1e-2, "local = {local:?}");

    // Attached снаряд больше не наносит урон
    app.world_mut()
        .send_event(ProjectileContact::new(bolt, enemy, Vec3::ZERO, Vec3::Z));
    run_fixed_tick(&mut app);
    assert_eq!(health(&app, enemy), 75.0);

    // attach_delay болта 5 с (раньше lifetime ceiling 10 с)
    run_fixed_ticks(&mut app, 5 * 60 + 5);
    assert!(app.world().get_entity(bolt).is_err());
    assert!(app.world().get_entity(enemy).is_ok());
}

#[test]
fn test_projectile_embeds_in_environment() {
    let mut app = create_ranged_app();
    let wall = app.world_mut().spawn((Environment, Transform::default())).id();
    let spec = ProjectileSpec {
        gravity: false,
        ..ProjectileSpec::arrow()
    };
    let arrow = spawn_flying(&mut app, spec, Vec3::new(0.0, 1.0, 0.0));

    app.world_mut().send_event(ProjectileContact::new(
        arrow,
        wall,
        Vec3::new(0.0, 1.0, -3.0),
        Vec3::Z,
    ));
    run_fixed_tick(&mut app);

    let projectile = app.world().get::<Projectile>(arrow).unwrap();
    assert_eq!(projectile.state, ProjectileState::Attached { to: None });
    assert!(app.world().get::<ChildOf>(arrow).is_none());

    // Смещение embed_depth 0.1 против отражённого направления (+Z)
    let transform = *app.world().get::<Transform>(arrow).unwrap();
    assert!(transform.translation.distance(Vec3::new(0.0, 1.0, -3.1)) < 1e-4);
    assert!(transform.forward().as_vec3().distance(Vec3::Z) < 1e-4);

    // Воткнутая стрела неподвижна
    run_fixed_ticks(&mut app, 10);
    assert_eq!(app.world().get::<Transform>(arrow).unwrap().translation, transform.translation);
}

#[test]
fn test_projectile_contact_with_dead_enemy_is_ignored() {
    let mut app = create_ranged_app();
    let enemy = spawn_enemy(app.world_mut(), &EnemyConfig::default(), Vec3::new(0.0, 0.0, -5.0));
    app.world_mut().entity_mut(enemy).insert(Dead);
    let bolt = spawn_flying(&mut app, ProjectileSpec::bolt(), Vec3::ZERO);

    app.world_mut()
        .send_event(ProjectileContact::new(bolt, enemy, Vec3::ZERO, Vec3::Z));
    run_fixed_tick(&mut app);

    assert_eq!(health(&app, enemy), 100.0);
    assert_eq!(
        app.world().get::<Projectile>(bolt).unwrap().state,
        ProjectileState::InFlight
    );
}

#[test]
fn test_wand_cast_spawns_magic_bolt() {
    let mut app = create_ranged_app();
    let wand = app.world_mut().spawn(Wand::default()).id();

    grab(&mut app, wand, Hand::Right);
    activate(&mut app, wand);
    run_fixed_tick(&mut app);

    let launched = drain::<ProjectileLaunched>(&mut app);
    assert_eq!(launched.len(), 1);
    assert_eq!(launched[0].speed, 15.0);
    let bolt = app.world().get::<Projectile>(launched[0].projectile).unwrap();
    assert_eq!(bolt.spec.damage, 10.0);
    assert!(!bolt.spec.gravity);

    // cast cooldown 0.5 с
    activate(&mut app, wand);
    run_fixed_tick(&mut app);
    assert!(drain::<ProjectileLaunched>(&mut app).is_empty());

    run_fixed_ticks(&mut app, 30);
    activate(&mut app, wand);
    run_fixed_tick(&mut app);
    assert_eq!(drain::<ProjectileLaunched>(&mut app).len(), 1);
}

#[test]
fn test_wand_area_spell_damages_enemies_in_radius() {
    let mut app = create_ranged_app();
    let wand = app.world_mut().spawn(Wand::default().with_area_damage()).id();
    let near = spawn_enemy(app.world_mut(), &EnemyConfig::default(), Vec3::new(1.0, 0.0, -5.0));
    let far = spawn_enemy(app.world_mut(), &EnemyConfig::default(), Vec3::new(0.0, 0.0, -20.0));

    grab(&mut app, wand, Hand::Right);
    run_fixed_tick(&mut app);
    grab(&mut app, wand, Hand::Left);
    run_fixed_tick(&mut app);
    assert!(app.world().get::<Wand>(wand).unwrap().is_charging());

    // charge 1.5 с
    let spells = run_collecting::<AreaSpell>(&mut app, 95);
    assert_eq!(spells.len(), 1);
    assert!(spells[0].center.distance(Vec3::new(0.0, 0.0, -5.0)) < 1e-4);
    assert_eq!(spells[0].damage, Some(20.0));
    assert_eq!(health(&app, near), 80.0);
    assert_eq!(health(&app, far), 100.0);

    // Secondary cooldown 5 с: новый charge не начинается
    app.world_mut()
        .send_event(GripSignal::release(wand, Hand::Left));
    run_fixed_tick(&mut app);
    grab(&mut app, wand, Hand::Left);
    run_fixed_tick(&mut app);
    assert!(!app.world().get::<Wand>(wand).unwrap().is_charging());
}

#[test]
fn test_wand_area_spell_is_cue_only_by_default() {
    let mut app = create_ranged_app();
    let wand = app.world_mut().spawn(Wand::default()).id();
    let enemy = spawn_enemy(app.world_mut(), &EnemyConfig::default(), Vec3::new(0.0, 0.0, -5.0));

    grab(&mut app, wand, Hand::Right);
    grab(&mut app, wand, Hand::Left);
    let spells = run_collecting::<AreaSpell>(&mut app, 100);
    assert_eq!(spells.len(), 1);
    assert_eq!(spells[0].damage, None);
    assert_eq!(health(&app, enemy), 100.0);
}

#[test]
fn test_wand_charge_cancelled_by_releasing_second_hand() {
    let mut app = create_ranged_app();
    let wand = app.world_mut().spawn(Wand::default().with_area_damage()).id();

    grab(&mut app, wand, Hand::Right);
    grab(&mut app, wand, Hand::Left);
    let mut spells = run_collecting::<AreaSpell>(&mut app, 30);
    app.world_mut()
        .send_event(GripSignal::release(wand, Hand::Left));
    spells.extend(run_collecting::<AreaSpell>(&mut app, 120));

    assert!(spells.is_empty());
    assert!(!app.world().get::<Wand>(wand).unwrap().is_charging());
}
