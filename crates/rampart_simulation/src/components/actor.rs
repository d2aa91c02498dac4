//! Damage targets: Health + маркеры ролей (objective, player, environment)

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Здоровье любой damage target (враг, кристалл, игрок)
///
/// Инвариант: 0 ≤ current ≤ max, current не растёт пока entity жива.
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100.0)
    }
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }

    /// Списывает урон, clamp на 0.
    ///
    /// Возвращает `true` ровно один раз — на тике, когда health пересёк 0.
    /// На уже мёртвой цели — no-op, `false`.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if !self.is_alive() || amount <= 0.0 {
            return false;
        }

        self.current = (self.current - amount).max(0.0);
        !self.is_alive()
    }

    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            return 0.0;
        }
        self.current / self.max
    }
}

/// Защищаемый объект (кристалл). Смерть → GameOver.
///
/// Health вешается при spawn (`spawn_objective`), по умолчанию `DEFAULT_HEALTH`.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
#[require(Transform)]
pub struct DefendedObjective;

impl DefendedObjective {
    pub const DEFAULT_HEALTH: f32 = 500.0;
}

/// Игрок как damage target (для TargetingPolicy::NearestWithin). Смерть → GameOver.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
#[require(Transform)]
pub struct Player;

impl Player {
    pub const DEFAULT_HEALTH: f32 = 100.0;
}

/// Инертная геометрия окружения (снаряды в неё втыкаются)
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Environment;
