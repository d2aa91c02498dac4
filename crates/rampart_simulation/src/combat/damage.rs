//! Damage pipeline: события и маркеры
//!
//! Все источники урона (melee strike, cleave, bleed tick, projectile, атака врага)
//! пишут `DamageRequest`. Единственная система `apply_damage` применяет их
//! к Health в порядке поступления → DamageDealt / EntityDied.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Тип урона (для логов, cues и статистики)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
pub enum DamageKind {
    /// Прямой удар melee оружием
    Strike,
    /// Вторичный урон по области (cleave, falloff, sweep splash)
    Area,
    /// Тик периодического эффекта (bleed)
    Bleed,
    /// Снаряд (стрела, болт, магический снаряд)
    Projectile,
    /// Атака врага по цели (кристалл, игрок)
    Enemy,
}

/// Запрос на урон (Damage Target Contract: takeDamage)
#[derive(Event, Debug, Clone, Copy)]
pub struct DamageRequest {
    /// Кто наносит (оружие, снаряд, враг). None — окружение
    pub source: Option<Entity>,
    pub target: Entity,
    pub amount: f32,
    pub kind: DamageKind,
}

impl DamageRequest {
    pub fn new(source: Entity, target: Entity, amount: f32, kind: DamageKind) -> Self {
        Self {
            source: Some(source),
            target,
            amount,
            kind,
        }
    }
}

/// Событие: урон применён
#[derive(Event, Debug, Clone, Copy)]
pub struct DamageDealt {
    pub source: Option<Entity>,
    pub target: Entity,
    pub amount: f32,
    pub kind: DamageKind,
    /// Health цели после применения
    pub remaining: f32,
}

/// Событие: entity умер (health пересёк 0). Ровно один раз на entity.
#[derive(Event, Debug, Clone, Copy)]
pub struct EntityDied {
    pub entity: Entity,
    pub killer: Option<Entity>,
}

/// Компонент-маркер: entity мертв (Health <= 0)
///
/// Оружие, снаряды и AI игнорируют entity с этим маркером.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Dead;

/// Компонент-маркер: деспавн entity после указанного времени
///
/// Трупы врагов (grace delay), воткнутые снаряды, lifetime ceiling снарядов.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct DespawnAfter {
    /// Время деспавна (в секундах от старта симуляции)
    pub despawn_time: f32,
}

impl DespawnAfter {
    pub fn at(despawn_time: f32) -> Self {
        Self { despawn_time }
    }

    /// Из двух дедлайнов остаётся более ранний
    pub fn sooner(self, other_time: f32) -> Self {
        Self {
            despawn_time: self.despawn_time.min(other_time),
        }
    }
}

/// Кого потеряли (game-state collaborator решает что дальше)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOverCause {
    ObjectiveDestroyed,
    PlayerKilled,
}

/// Событие: игра окончена (кристалл разрушен или игрок убит)
#[derive(Event, Debug, Clone, Copy)]
pub struct GameOver {
    pub cause: GameOverCause,
    pub entity: Entity,
}

/// Вид audio/visual cue (fire-and-forget, логика от них не зависит)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CueKind {
    HitEffect,
    HitSound,
    UseSound,
    CriticalHit,
    StatusVisual,
    Launch,
    Impact,
    Reload,
    Death,
}

/// Событие: host должен проиграть эффект/звук `asset` в точке `position`
#[derive(Event, Debug, Clone)]
pub struct CombatCue {
    pub kind: CueKind,
    pub asset: String,
    pub position: Vec3,
    /// К какой entity привязать (stun visual над врагом и т.п.)
    pub follow: Option<Entity>,
}

impl CombatCue {
    /// Cue только если asset сконфигурирован (пустой prefab → эффект пропускается)
    pub fn configured(kind: CueKind, asset: Option<&String>, position: Vec3) -> Option<Self> {
        asset.map(|asset| Self {
            kind,
            asset: asset.clone(),
            position,
            follow: None,
        })
    }

    pub fn following(mut self, entity: Entity) -> Self {
        self.follow = Some(entity);
        self
    }
}
