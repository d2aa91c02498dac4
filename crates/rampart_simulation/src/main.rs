//! Headless демо Rampart
//!
//! `rampart_simulation [config.json]` — волна врагов идёт к кристаллу,
//! у кристалла стоят меч и арбалет (host контакты скриптуются прямо здесь).

use bevy::prelude::*;
use rampart_simulation::combat::WeaponContact;
use rampart_simulation::ranged::{CyclicLauncher, Projectile, ProjectileContact};
use rampart_simulation::*;

const DEMO_TICKS: u32 = 60 * 30;
const SWORD_REACH: f32 = 1.5;
const BOLT_HIT_RADIUS: f32 = 0.6;

fn demo_config() -> SimulationConfig {
    SimulationConfig {
        path: vec![
            Vec3::new(0.0, 0.0, 12.0),
            Vec3::new(0.0, 0.0, 4.0),
            Vec3::new(2.0, 0.0, 1.0),
        ],
        waves: vec![
            Wave {
                start_at: 0.0,
                count: 6,
                spawn_interval: 1.0,
                enemy: EnemyConfig::default(),
            },
            Wave {
                start_at: 12.0,
                count: 3,
                spawn_interval: 2.0,
                enemy: EnemyConfig {
                    max_health: 200.0,
                    reward: 25,
                    move_speed: 0.5,
                    ..Default::default()
                },
            },
        ],
        ..Default::default()
    }
}

fn load_config() -> Result<SimulationConfig, ConfigError> {
    match std::env::args().nth(1) {
        Some(path) => SimulationConfig::from_path(path),
        None => Ok(demo_config()),
    }
}

/// Host stand-in: меч бьёт всех живых врагов в досягаемости
fn scripted_sword_contacts(app: &mut App, sword: Entity) {
    let sword_position = match app.world().get::<Transform>(sword) {
        Some(transform) => transform.translation,
        None => return,
    };

    let mut enemies = app
        .world_mut()
        .query_filtered::<(Entity, &Transform), (With<Enemy>, Without<Dead>)>();
    let mut touching: Vec<(Entity, Vec3)> = enemies
        .iter(app.world())
        .filter(|(_, transform)| transform.translation.distance(sword_position) < SWORD_REACH)
        .map(|(entity, transform)| (entity, transform.translation))
        .collect();
    touching.sort_by_key(|(entity, _)| *entity);

    for (agent, point) in touching {
        app.world_mut().send_event(WeaponContact::new(sword, agent, point));
    }
}

/// Host stand-in: болт в полёте касается ближайшего живого врага
fn scripted_bolt_contacts(app: &mut App) {
    let mut projectiles = app.world_mut().query::<(Entity, &Projectile, &Transform)>();
    let flying: Vec<(Entity, Vec3)> = projectiles
        .iter(app.world())
        .filter(|(_, projectile, _)| !projectile.is_attached())
        .map(|(entity, _, transform)| (entity, transform.translation))
        .collect();

    let mut enemies = app
        .world_mut()
        .query_filtered::<(Entity, &Transform), (With<Enemy>, Without<Dead>)>();
    let targets: Vec<(Entity, Vec3)> = enemies
        .iter(app.world())
        .map(|(entity, transform)| (entity, transform.translation))
        .collect();

    for (bolt, position) in flying {
        let hit = targets
            .iter()
            .filter(|(_, target)| target.distance(position) < BOLT_HIT_RADIUS)
            .min_by(|a, b| a.1.distance(position).total_cmp(&b.1.distance(position)));

        if let Some((agent, point)) = hit {
            app.world_mut()
                .send_event(ProjectileContact::new(bolt, *agent, *point, Vec3::Z));
        }
    }
}

fn main() {
    let config = match load_config() {
        Ok(config) => config,
        Err(error) => {
            init_logger();
            log_error(&format!("Failed to load config: {error}"));
            std::process::exit(1);
        }
    };

    let seed = config.seed;
    let objective_health = config.objective_health;
    let weapons = config.weapons.clone();

    let mut app = create_headless_app(seed);
    app.insert_resource(config);
    app.add_plugins(SimulationPlugin);

    let crystal = spawn_objective(app.world_mut(), Vec3::ZERO, objective_health);

    let sword_weapon = weapons.into_iter().next().unwrap_or_else(MeleeWeapon::sword);
    let sword = app
        .world_mut()
        .spawn((sword_weapon, Transform::from_xyz(2.0, 1.0, 1.5)))
        .id();
    let crossbow = app
        .world_mut()
        .spawn((
            CyclicLauncher::default(),
            // У кристалла, смотрит вдоль пути (+Z)
            Transform::from_xyz(0.0, 0.0, 0.5).looking_to(Vec3::Z, Vec3::Y),
        ))
        .id();

    app.world_mut().send_event(GripSignal::grab(sword, Hand::Right));
    app.world_mut().send_event(GripSignal::grab(crossbow, Hand::Right));

    let mut kills = 0usize;
    let mut game_over = None;

    for tick in 0..DEMO_TICKS {
        scripted_sword_contacts(&mut app, sword);
        scripted_bolt_contacts(&mut app);
        if tick % 30 == 0 {
            app.world_mut().send_event(GripSignal::activate(crossbow));
        }

        run_fixed_tick(&mut app);

        kills += app
            .world_mut()
            .resource_mut::<Events<EntityDied>>()
            .drain()
            .count();
        if let Some(event) = app.world_mut().resource_mut::<Events<GameOver>>().drain().next() {
            game_over = Some(event);
            break;
        }

        if tick % 300 == 0 {
            let crystal_health = app
                .world()
                .get::<Health>(crystal)
                .map(|h| h.current)
                .unwrap_or(0.0);
            log_info(&format!(
                "Tick {}: {} entities, crystal {:.0} HP, {} kills",
                tick,
                app.world().entities().len(),
                crystal_health,
                kills
            ));
        }
    }

    let balance = app.world().resource::<RewardSink>().balance();
    match game_over {
        Some(event) => log_warning(&format!("Game over: {:?} ({:?})", event.cause, event.entity)),
        None => log_info("Crystal survived the demo"),
    }
    log_info(&format!("Demo complete: {kills} kills, balance {balance}"));
}
