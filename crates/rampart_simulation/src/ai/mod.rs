//! Enemy AI module (behavioral state machine)
//!
//! ECS ответственность:
//! - EnemyState FSM: Traveling → Engaging → Dead
//! - Path following через ActivePath (PathRegistry), target acquisition
//! - Атаки через DamageRequest, смерть → награда + pickups + despawn
//!
//! Host ответственность: анимации (EnemyStateChanged), death effects (CombatCue)

use bevy::prelude::*;

pub mod components;
pub mod events;
pub mod systems;
pub mod waves;

// Re-export основных типов
pub use components::*;
pub use events::{EnemyStateChanged, RewardGranted};
pub use waves::{enemy_bundle, spawn_transform, Wave, WaveSchedule};

use crate::SimulationSet;

/// AI Plugin
///
/// Порядок выполнения (FixedUpdate):
/// 1. Timers: spawn_waves, sync_stun_slowdown, integrate_knockback
/// 2. Behavior: transitions → travel → pursue → attacks (chain)
/// 3. Aftermath: handle_enemy_deaths
pub struct AIPlugin;

impl Plugin for AIPlugin {
    fn build(&self, app: &mut App) {
        crate::configure_simulation_sets(app);

        app.init_resource::<WaveSchedule>()
            .add_event::<RewardGranted>()
            .add_event::<EnemyStateChanged>();

        app.add_systems(
            FixedUpdate,
            (
                (
                    waves::spawn_waves,
                    systems::sync_stun_slowdown,
                    systems::integrate_knockback,
                )
                    .chain()
                    .in_set(SimulationSet::Timers),
                (
                    systems::enemy_fsm_transitions,
                    systems::enemy_travel,
                    systems::enemy_pursue,
                    systems::enemy_attacks,
                )
                    .chain() // Последовательное выполнение для детерминизма
                    .in_set(SimulationSet::Behavior),
                systems::handle_enemy_deaths.in_set(SimulationSet::Aftermath),
            ),
        );
    }
}
