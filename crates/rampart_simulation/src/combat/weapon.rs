//! Weapon events (host ↔ ECS)
//!
//! Architecture:
//! - Host: collision detection (blade volume touched agent) → WeaponContact
//! - ECS: dedup, damage policy, effects, area → DamageRequest
//! - Events: WeaponStruck (ECS → host) для hit feedback

use bevy::prelude::*;

/// Event: клинок оружия коснулся агента (host → ECS)
///
/// Host шлёт на каждый physics contact; повторные контакты внутри
/// cooldown окна отбрасывает HitLedger.
#[derive(Event, Debug, Clone, Copy)]
pub struct WeaponContact {
    pub weapon: Entity,
    pub agent: Entity,
    /// Точка контакта (для hit effect и AreaCenter::ContactPoint)
    pub point: Vec3,
}

impl WeaponContact {
    pub fn new(weapon: Entity, agent: Entity, point: Vec3) -> Self {
        Self { weapon, agent, point }
    }
}

/// Event: charge two-handed оружия отпущен → sweep (внутренний)
#[derive(Event, Debug, Clone, Copy)]
pub struct ChargeReleased {
    pub weapon: Entity,
    pub ratio: f32,
    pub radius: f32,
}

/// Event: удар прошёл dedup и применён (ECS → host, для feedback)
#[derive(Event, Debug, Clone, Copy)]
pub struct WeaponStruck {
    pub weapon: Entity,
    pub agent: Entity,
    pub damage: u32,
    pub critical: bool,
}
