//! Ranged weapons module (bow, crossbow, wand + projectiles)
//!
//! ECS ответственность:
//! - Launcher state machines: натяжение тетивы, перезарядка, cast cooldown/charge
//! - Projectile flight: velocity, gravity, дальность, lifetime
//! - ProjectileContact → DamageRequest + attach к агенту / embed в окружение
//!
//! Host ответственность: коллизии снарядов (ProjectileContact), визуал тетивы (DrawState)

use bevy::prelude::*;

pub mod bow;
pub mod crossbow;
pub mod projectile;
pub mod wand;

#[cfg(test)]
mod projectile_tests;

pub use bow::{draw_offset, draw_strength, midpoint_offset, Bow, DrawAction, DrawSignal, DrawState};
pub use crossbow::{CyclicLauncher, LoaderState};
pub use projectile::{
    embed_transform, launch_transform, local_to_parent, reflect, spawn_projectile, Projectile,
    ProjectileContact, ProjectileLaunched, ProjectileSpec, ProjectileState,
};
pub use wand::{AreaSpell, Wand};

use crate::SimulationSet;

/// Ranged Plugin
///
/// Порядок выполнения (FixedUpdate):
/// 1. Input: handle_draw_signals (после apply_grip_signals)
/// 2. Timers: crossbow/wand grip reactions, reload + charge таймеры, tracking тетивы
/// 3. Behavior: fly_projectiles
/// 4. Contacts: resolve_projectile_contacts → resolve_area_spells
pub struct RangedPlugin;

impl Plugin for RangedPlugin {
    fn build(&self, app: &mut App) {
        crate::configure_simulation_sets(app);

        app.add_event::<DrawSignal>()
            .add_event::<ProjectileContact>()
            .add_event::<ProjectileLaunched>()
            .add_event::<AreaSpell>();

        app.add_systems(
            FixedUpdate,
            (
                bow::handle_draw_signals
                    .in_set(SimulationSet::Input)
                    .after(crate::combat::systems::apply_grip_signals),
                (
                    bow::reset_draw_on_release,
                    bow::track_draw,
                    crossbow::operate_crossbows,
                    crossbow::advance_reloads,
                    wand::operate_wands,
                    wand::complete_wand_charges,
                )
                    .chain()
                    .in_set(SimulationSet::Timers)
                    // Спавн снарядов после спавна волн: стабильный порядок Entity id
                    .after(crate::ai::waves::spawn_waves),
                projectile::fly_projectiles.in_set(SimulationSet::Behavior),
                (projectile::resolve_projectile_contacts, wand::resolve_area_spells)
                    .chain()
                    .in_set(SimulationSet::Contacts)
                    .after(crate::combat::systems::resolve_weapon_contacts),
            ),
        );
    }
}
