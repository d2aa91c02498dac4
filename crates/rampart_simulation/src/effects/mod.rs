//! Status effects module (stun, bleed)
//!
//! ECS ответственность:
//! - StatusEffects resource: cancelable timed tasks keyed (target, kind)
//! - step раз в тик, liveness-check цели перед каждой мутацией
//! - cancellation: смерть цели, despawn цели, уничтожение оружия-владельца
//!
//! Host ответственность: визуалы эффектов (по CombatCue / EffectEnded)

use bevy::prelude::*;

pub mod scheduler;
pub mod systems;


pub use scheduler::{
    Applied, EffectKind, EffectSpec, EffectStep, PeriodicTick, StatusEffects, StatusTask,
    TaskHandle,
};
pub use systems::{EffectEnded, EffectSource};

use crate::SimulationSet;

/// Effects Plugin
///
/// Порядок выполнения (FixedUpdate):
/// 1. step_status_effects (SimulationSet::Effects) — bleed ticks → DamageRequest
/// 2. cancel_effects_on_death (SimulationSet::Aftermath)
/// 3. cancel_effects_on_despawn (SimulationSet::Cleanup)
pub struct EffectsPlugin;

impl Plugin for EffectsPlugin {
    fn build(&self, app: &mut App) {
        crate::configure_simulation_sets(app);

        // DamageRequest/EntityDied регистрирует и CombatPlugin (add_event идемпотентен)
        app.init_resource::<StatusEffects>()
            .add_event::<EffectEnded>()
            .add_event::<crate::combat::DamageRequest>()
            .add_event::<crate::combat::EntityDied>();

        app.add_systems(
            FixedUpdate,
            (
                systems::step_status_effects.in_set(SimulationSet::Effects),
                systems::cancel_effects_on_death.in_set(SimulationSet::Aftermath),
                systems::cancel_effects_on_despawn.in_set(SimulationSet::Cleanup),
            ),
        );
    }
}
