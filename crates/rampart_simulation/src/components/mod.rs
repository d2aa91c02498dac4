//! ECS Components общего назначения
//!
//! Организация по доменам:
//! - actor: damage targets (Health, DefendedObjective, Player, Environment)
//! - world: инжектированные сервисы (ActivePath, RewardSink)
//! - grip: хват оружия и input boundary (Grip, GripSignal)

pub mod actor;
pub mod grip;
pub mod world;

// Re-exports для удобного импорта
pub use actor::*;
pub use grip::*;
pub use world::*;
