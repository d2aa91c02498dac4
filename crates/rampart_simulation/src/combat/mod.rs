//! Combat system module (host-driven contact architecture)
//!
//! ECS ответственность:
//! - Grip state: held / two-handed (GripSignal → GripChanged)
//! - Melee weapon engine: dedup ledger, damage policies, effect policies, area
//! - Damage pipeline: DamageRequest → Health → DamageDealt / EntityDied
//! - GameOver при смерти кристалла или игрока
//!
//! Host ответственность:
//! - Collision detection клинка → WeaponContact
//! - Анимации, звуки, VFX по CombatCue / WeaponStruck

use bevy::prelude::*;

pub mod components;
pub mod damage;
pub mod systems;
pub mod weapon;

// Re-export основных типов
pub use components::*;
pub use damage::{
    CombatCue, CueKind, DamageDealt, DamageKind, DamageRequest, Dead, DespawnAfter, EntityDied,
    GameOver, GameOverCause,
};
pub use weapon::{ChargeReleased, WeaponContact, WeaponStruck};

use crate::components::{GripChanged, GripSignal};
use crate::config::CombatSettings;
use crate::SimulationSet;

/// Combat Plugin (host-driven contacts)
///
/// Регистрирует combat системы в FixedUpdate (SimulationSet chain).
///
/// Порядок выполнения:
/// 1. Input: apply_grip_signals — GripSignal → Grip → GripChanged
/// 2. Timers: react_to_melee_grip → maintain_melee_weapons (combo lapse, ledger prune)
/// 3. Contacts: resolve_weapon_contacts — WeaponContact/ChargeReleased → DamageRequest
/// 4. Damage: apply_damage — единственная точка изменения Health
/// 5. Aftermath: detect_game_over
/// 6. Cleanup: despawn_after_timeout
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        crate::configure_simulation_sets(app);

        // Регистрация событий
        app.init_resource::<CombatSettings>()
            .add_event::<GripSignal>()
            .add_event::<GripChanged>()
            .add_event::<WeaponContact>()
            .add_event::<ChargeReleased>()
            .add_event::<WeaponStruck>()
            .add_event::<DamageRequest>()
            .add_event::<DamageDealt>()
            .add_event::<EntityDied>()
            .add_event::<GameOver>()
            .add_event::<CombatCue>();

        app.add_systems(
            FixedUpdate,
            (
                systems::apply_grip_signals.in_set(SimulationSet::Input),
                (systems::react_to_melee_grip, systems::maintain_melee_weapons)
                    .chain()
                    .in_set(SimulationSet::Timers),
                systems::resolve_weapon_contacts.in_set(SimulationSet::Contacts),
                systems::apply_damage.in_set(SimulationSet::Damage),
                systems::detect_game_over.in_set(SimulationSet::Aftermath),
                systems::despawn_after_timeout.in_set(SimulationSet::Cleanup),
            ),
        );
    }
}
