//! AI Events — исходящие события enemy FSM (для host и game-state)

use bevy::prelude::*;

/// Враг убит → награда зачислена в RewardSink
#[derive(Event, Debug, Clone, Copy)]
pub struct RewardGranted {
    pub enemy: Entity,
    pub amount: u32,
    /// Баланс sink после зачисления
    pub balance: u32,
}

/// Смена FSM состояния (host переключает анимации)
#[derive(Event, Debug, Clone, Copy)]
pub struct EnemyStateChanged {
    pub entity: Entity,
    pub from: super::EnemyState,
    pub to: super::EnemyState,
}
