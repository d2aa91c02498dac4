//! Внешние сервисы ядра: path registry, currency sink
//!
//! Инжектятся как Resource при сборке App (не глобальные синглтоны).
//! Ядро видит только узкие контракты: `waypoint(index)` и `add_currency(amount)`.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Контракт path registry: упорядоченная последовательность точек пути
///
/// Стабилен в течение волны, read-only для всех врагов.
pub trait PathRegistry: Send + Sync + 'static {
    /// `None` — путь закончился (враг переходит к acquisition)
    fn waypoint(&self, index: usize) -> Option<Vec3>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Простейший registry: список точек
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaypointPath {
    pub points: Vec<Vec3>,
}

impl WaypointPath {
    pub fn new(points: Vec<Vec3>) -> Self {
        Self { points }
    }
}

impl PathRegistry for WaypointPath {
    fn waypoint(&self, index: usize) -> Option<Vec3> {
        self.points.get(index).copied()
    }

    fn len(&self) -> usize {
        self.points.len()
    }
}

/// Активный путь волны (инжектированный registry)
#[derive(Resource)]
pub struct ActivePath(pub Box<dyn PathRegistry>);

impl ActivePath {
    pub fn new(registry: impl PathRegistry) -> Self {
        Self(Box::new(registry))
    }

    pub fn waypoint(&self, index: usize) -> Option<Vec3> {
        self.0.waypoint(index)
    }
}

impl Default for ActivePath {
    fn default() -> Self {
        Self::new(WaypointPath::default())
    }
}

/// Контракт currency sink: вызывается при смерти врага
pub trait CurrencySink: Send + Sync + 'static {
    fn add_currency(&mut self, amount: u32);

    fn balance(&self) -> u32;
}

/// Дефолтный sink: простой кошелёк игрока
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Treasury {
    pub balance: u32,
}

impl Default for Treasury {
    fn default() -> Self {
        Self { balance: Self::STARTING_BALANCE }
    }
}

impl Treasury {
    pub const STARTING_BALANCE: u32 = 100;

    /// Списывает `amount` если хватает, иначе баланс не меняется
    pub fn spend_currency(&mut self, amount: u32) -> bool {
        if self.balance < amount {
            return false;
        }
        self.balance -= amount;
        true
    }
}

impl CurrencySink for Treasury {
    fn add_currency(&mut self, amount: u32) {
        self.balance = self.balance.saturating_add(amount);
    }

    fn balance(&self) -> u32 {
        self.balance
    }
}

/// Инжектированный currency sink
#[derive(Resource)]
pub struct RewardSink(pub Box<dyn CurrencySink>);

impl RewardSink {
    pub fn new(sink: impl CurrencySink) -> Self {
        Self(Box::new(sink))
    }

    pub fn add_currency(&mut self, amount: u32) {
        self.0.add_currency(amount);
    }

    pub fn balance(&self) -> u32 {
        self.0.balance()
    }
}

impl Default for RewardSink {
    fn default() -> Self {
        Self::new(Treasury::default())
    }
}
