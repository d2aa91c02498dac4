//! Rampart Simulation Core
//!
//! ECS-ядро wave-defense боя на Bevy 0.16 (headless)
//!
//! HOST-DRIVEN ARCHITECTURE:
//! - ECS = правила боя (weapon engine, status effects, enemy FSM, projectiles)
//! - Host-движок = коллизии, рендер, звук, input binding
//! - Граница — ECS события: GripSignal / DrawSignal / WeaponContact / ProjectileContact
//!   внутрь, DamageDealt / EntityDied / RewardGranted / GameOver / CombatCue наружу

use bevy::ecs::event::event_update_system;
use bevy::ecs::system::RunSystemOnce;
use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

// Публичные модули
pub mod ai;
pub mod combat;
pub mod components;
pub mod config;
pub mod effects;
pub mod logger;
pub mod ranged;

// Re-export базовых типов для удобства
pub use ai::{AIPlugin, Enemy, EnemyConfig, EnemyState, Wave, WaveSchedule};
pub use combat::{CombatPlugin, DamageDealt, DamageRequest, Dead, EntityDied, GameOver, MeleeWeapon};
pub use components::*;
pub use config::{CombatSettings, ConfigError, SimulationConfig};
pub use effects::{EffectsPlugin, StatusEffects};
pub use logger::{init_logger, log, log_error, log_info, log_warning};
pub use ranged::RangedPlugin;

/// Фазы simulation tick (FixedUpdate), выполняются строго по порядку
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// Host сигналы → состояние хвата / тетивы
    Input,
    /// Таймеры: перезарядка, charge, combo lapse, спавн волн, knockback
    Timers,
    /// Enemy FSM, движение, атаки, полёт снарядов
    Behavior,
    /// Контакты оружия и снарядов → DamageRequest
    Contacts,
    /// Status effects step (bleed ticks)
    Effects,
    /// apply_damage — единственная точка изменения Health
    Damage,
    /// Реакции на смерть: награды, pickups, GameOver, отмена эффектов
    Aftermath,
    /// Despawn по таймауту + cleanup по RemovedComponents
    Cleanup,
}

/// Порядок SimulationSet в FixedUpdate (каждый plugin вызывает, повтор безвреден)
pub fn configure_simulation_sets(app: &mut App) {
    app.configure_sets(
        FixedUpdate,
        (
            SimulationSet::Input,
            SimulationSet::Timers,
            SimulationSet::Behavior,
            SimulationSet::Contacts,
            SimulationSet::Effects,
            SimulationSet::Damage,
            SimulationSet::Aftermath,
            SimulationSet::Cleanup,
        )
            .chain(),
    );
}

/// Главный plugin симуляции (объединяет все подсистемы)
///
/// Читает `SimulationConfig` resource если он вставлен до plugin'а, иначе дефолты.
/// Уже вставленные сервисы (RNG, ActivePath, RewardSink) не перезаписываются.
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        let config = app
            .world()
            .get_resource::<SimulationConfig>()
            .cloned()
            .unwrap_or_default();

        app
            // Fixed timestep для simulation tick
            .insert_resource(Time::<Fixed>::from_hz(config.tick_hz));

        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(config.seed));
        }
        if !app.world().contains_resource::<CombatSettings>() {
            app.insert_resource(config.combat.clone());
        }
        if !app.world().contains_resource::<ActivePath>() {
            app.insert_resource(ActivePath::new(WaypointPath::new(config.path.clone())));
        }
        if !app.world().contains_resource::<WaveSchedule>() {
            app.insert_resource(WaveSchedule::new(config.waves.clone()));
        }
        app.init_resource::<RewardSink>();

        // Подсистемы
        app.add_plugins((EffectsPlugin, CombatPlugin, RangedPlugin, AIPlugin));

        crate::logger::log_info(&format!(
            "🛡️ Simulation ready (seed {}, {} Hz, {} wave(s))",
            config.seed,
            config.tick_hz,
            config.waves.len()
        ));
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(60.0)); // 60Hz FixedUpdate

    app
}

/// Ровно один fixed step: двигает `Time<Fixed>`, подменяет generic `Time`
/// и запускает FixedUpdate (без real-time накопителя `app.update()`).
///
/// После тика event buffers свапаются (как `First` в `app.update()`):
/// событие видно читателям этого и следующего тика, потом выбрасывается.
pub fn run_fixed_tick(app: &mut App) {
    let world = app.world_mut();

    let timestep = world.resource::<Time<Fixed>>().timestep();
    world.resource_mut::<Time<Fixed>>().advance_by(timestep);

    let fixed = world.resource::<Time<Fixed>>().as_generic();
    *world.resource_mut::<Time>() = fixed;

    world.run_schedule(FixedUpdate);

    if let Err(error) = world.run_system_once(event_update_system) {
        log_error(&format!("Event buffer update failed: {error}"));
    }
}

/// `ticks` fixed steps подряд
pub fn run_fixed_ticks(app: &mut App, ticks: u32) {
    for _ in 0..ticks {
        run_fixed_tick(app);
    }
}

/// Snapshot мира для сравнения детерминизма
///
/// Компоненты `T` в порядке Entity index, сериализованные в JSON.
pub fn world_snapshot<T>(world: &mut World) -> Vec<u8>
where
    T: Component + Serialize,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        // Сериализация plain-data компонентов не падает; ошибку пишем как маркер
        match serde_json::to_vec(component) {
            Ok(bytes) => snapshot.extend_from_slice(&bytes),
            Err(error) => snapshot.extend_from_slice(error.to_string().as_bytes()),
        }
    }

    snapshot
}

/// Spawn защищаемого кристалла
pub fn spawn_objective(world: &mut World, position: Vec3, health: f32) -> Entity {
    world
        .spawn((DefendedObjective, Health::new(health), Transform::from_translation(position)))
        .id()
}

/// Spawn игрока как damage target
pub fn spawn_player(world: &mut World, position: Vec3, health: f32) -> Entity {
    world
        .spawn((Player, Health::new(health), Transform::from_translation(position)))
        .id()
}

/// Spawn врага в точке, лицом вдоль -Z
pub fn spawn_enemy(world: &mut World, config: &EnemyConfig, position: Vec3) -> Entity {
    world
        .spawn(ai::enemy_bundle(config, Transform::from_translation(position)))
        .id()
}
