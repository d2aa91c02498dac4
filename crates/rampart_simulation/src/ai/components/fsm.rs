//! Enemy FSM components (state machine, config, kinematics).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::Health;

/// Enemy FSM состояния
///
/// Traveling → Engaging → Dead. Dead — терминальное.
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub enum EnemyState {
    /// Следуем по пути (`Enemy::path_index`). За концом пути ждём цель.
    Traveling,

    /// Есть damage target (кристалл или игрок)
    Engaging { target: Entity },

    /// Health пересёк 0; AI отключен, ждём despawn
    Dead,
}

impl Default for EnemyState {
    fn default() -> Self {
        Self::Traveling
    }
}

impl EnemyState {
    pub fn is_dead(&self) -> bool {
        matches!(self, Self::Dead)
    }

    pub fn target(&self) -> Option<Entity> {
        match self {
            Self::Engaging { target } => Some(*target),
            _ => None,
        }
    }
}

/// Кого атакуем в конце пути
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
pub enum TargetingPolicy {
    /// Всегда кристалл, игрок игнорируется
    ObjectiveOnly,
    /// Игрок внутри радиуса и ближе кристалла → игрок (в том числе во время пути)
    NearestWithin { detection_radius: f32 },
}

impl Default for TargetingPolicy {
    fn default() -> Self {
        Self::ObjectiveOnly
    }
}

impl TargetingPolicy {
    /// Выбор цели из живых кандидатов.
    ///
    /// NearestWithin: игрок внутри радиуса, который ближе кристалла (или
    /// кристалла нет), иначе кристалл.
    pub fn choose(
        &self,
        from: Vec3,
        objective: Option<(Entity, Vec3)>,
        players: impl IntoIterator<Item = (Entity, Vec3)>,
    ) -> Option<Entity> {
        let Self::NearestWithin { detection_radius } = *self else {
            return objective.map(|(entity, _)| entity);
        };

        let nearest_player = players
            .into_iter()
            .map(|(entity, position)| (entity, from.distance(position)))
            .filter(|(_, distance)| *distance <= detection_radius)
            .min_by(|a, b| a.1.total_cmp(&b.1));

        match (nearest_player, objective) {
            (Some((player, distance)), Some((_, objective_position)))
                if distance < from.distance(objective_position) =>
            {
                Some(player)
            }
            (Some((player, _)), None) => Some(player),
            _ => objective.map(|(entity, _)| entity),
        }
    }

    /// Opportunistic diversion во время пути: только игрок, не кристалл
    pub fn divert(
        &self,
        from: Vec3,
        objective: Option<(Entity, Vec3)>,
        players: impl IntoIterator<Item = (Entity, Vec3)>,
    ) -> Option<Entity> {
        let objective_entity = objective.map(|(entity, _)| entity);
        self.choose(from, objective, players)
            .filter(|target| Some(*target) != objective_entity)
    }
}

/// Когда атакуем acquired target
///
/// `Immediate` с `NearestWithin` бьёт игрока с любой дистанции внутри
/// detection radius, стоя на месте. Без явного `EnemyConfig::attack`
/// политика выводится из targeting (`EnemyConfig::attack_policy`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect, Serialize, Deserialize)]
pub enum AttackPolicy {
    /// Атака сразу по таймеру, дистанция не проверяется
    Immediate,
    /// Двигаемся к цели пока дальше `attack_range`, атакуем только в радиусе
    InRange,
}

impl AttackPolicy {
    /// Политика по умолчанию для targeting: подвижная цель → подходим на attack_range
    pub fn for_targeting(targeting: TargetingPolicy) -> Self {
        match targeting {
            TargetingPolicy::ObjectiveOnly => Self::Immediate,
            TargetingPolicy::NearestWithin { .. } => Self::InRange,
        }
    }
}

/// Параметры врага (tunables, загружаются из JSON)
#[derive(Component, Debug, Clone, PartialEq, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
#[serde(default)]
pub struct EnemyConfig {
    pub max_health: f32,
    /// Награда в валюте при смерти
    pub reward: u32,
    pub move_speed: f32,
    /// Скорость slerp поворота (доля за секунду)
    pub rotation_speed: f32,
    pub attack_range: f32,
    /// Атак в секунду
    pub attack_rate: f32,
    pub attack_damage: f32,
    pub min_pickups: u32,
    pub max_pickups: u32,
    pub drop_radius: f32,
    /// Waypoint считается достигнутым ближе этой дистанции
    pub waypoint_threshold: f32,
    /// Задержка despawn трупа (death effects)
    pub despawn_delay: f32,
    /// Стоимость одного pickup
    pub pickup_value: u32,
    pub targeting: TargetingPolicy,
    /// `None` → `AttackPolicy::for_targeting(targeting)`
    pub attack: Option<AttackPolicy>,
    pub death_effect: Option<String>,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            reward: 10,
            move_speed: 0.8,
            rotation_speed: 1.0,
            attack_range: 1.5,
            attack_rate: 1.0,
            attack_damage: 10.0,
            min_pickups: 1,
            max_pickups: 3,
            drop_radius: 1.0,
            waypoint_threshold: 0.5,
            despawn_delay: 2.0,
            pickup_value: 1,
            targeting: TargetingPolicy::default(),
            attack: None,
            death_effect: None,
        }
    }
}

impl EnemyConfig {
    pub fn attack_policy(&self) -> AttackPolicy {
        self.attack.unwrap_or_else(|| AttackPolicy::for_targeting(self.targeting))
    }

    /// Интервал между атаками
    pub fn attack_interval(&self) -> f32 {
        if self.attack_rate <= 0.0 {
            return f32::INFINITY;
        }
        1.0 / self.attack_rate
    }
}

/// Enemy runtime state (скорость с учётом stun, таймер атаки)
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
#[require(Transform, Health, Knockback, EnemyState, EnemyConfig)]
pub struct Enemy {
    /// Индекс текущего waypoint в ActivePath
    pub path_index: usize,
    /// Текущий множитель скорости (stun slowdown), 1.0 — норма
    pub speed_multiplier: f32,
    /// Следующая разрешённая атака (секунды симуляции). 0 → первая атака сразу.
    pub next_attack_at: f32,
}

impl Default for Enemy {
    fn default() -> Self {
        Self {
            path_index: 0,
            speed_multiplier: 1.0,
            next_attack_at: 0.0,
        }
    }
}

impl Enemy {
    pub fn effective_speed(&self, config: &EnemyConfig) -> f32 {
        config.move_speed * self.speed_multiplier
    }

    pub fn attack_ready(&self, now: f32) -> bool {
        now >= self.next_attack_at
    }
}

/// Накопленная скорость отбрасывания (knockback impulses)
///
/// Интегрируется в Transform и экспоненциально затухает.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Knockback {
    pub velocity: Vec3,
}

impl Knockback {
    /// Скорость ниже этого порога обнуляется
    pub const REST_SPEED: f32 = 0.01;

    pub fn apply_impulse(&mut self, impulse: Vec3) {
        self.velocity += impulse;
    }

    pub fn is_resting(&self) -> bool {
        self.velocity.length_squared() < Self::REST_SPEED * Self::REST_SPEED
    }

    /// Смещение за `dt` + затухание `exp(-damping·dt)`
    ///
    /// Смещение только в плоскости земли: вертикальная составляющая (hammer
    /// launch) остаётся в velocity для host анимации, но агент не взлетает.
    pub fn integrate(&mut self, dt: f32, damping: f32) -> Vec3 {
        if self.is_resting() {
            self.velocity = Vec3::ZERO;
            return Vec3::ZERO;
        }

        let displacement = Vec3::new(self.velocity.x, 0.0, self.velocity.z) * dt;
        self.velocity *= (-damping * dt).exp();
        displacement
    }
}

/// Выпавший pickup (host подбирает и зачисляет `value`)
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
#[require(Transform)]
pub struct Pickup {
    pub value: u32,
}
