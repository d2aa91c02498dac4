//! Конфигурация симуляции (JSON) + runtime tunables
//!
//! Единственная fallible поверхность ядра: загрузка и валидация конфига.
//! Сама симуляция никогда не падает.

use std::path::{Path, PathBuf};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ai::{EnemyConfig, TargetingPolicy, Wave};
use crate::combat::{DamagePolicy, MeleeWeapon, DEFAULT_PRUNE_INTERVAL};
use crate::components::{DefendedObjective, Player};

/// Ошибка загрузки конфига
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid `{field}`: {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

fn require_positive(field: &str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        return Ok(());
    }
    Err(ConfigError::invalid(field, format!("must be positive, got {value}")))
}

/// Runtime tunables боевых систем (Resource)
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatSettings {
    /// Период pruning HitLedger (пока оружие в руках)
    pub ledger_prune_interval: f32,
    /// Экспоненциальное затухание knockback velocity (1/с)
    pub knockback_damping: f32,
    pub gravity: Vec3,
    /// Насколько снаряд входит в геометрию окружения
    pub embed_depth: f32,
    /// Снаряд поворачивается к velocity только если |v|² выше порога
    pub min_orient_speed_sq: f32,
}

impl Default for CombatSettings {
    fn default() -> Self {
        Self {
            ledger_prune_interval: DEFAULT_PRUNE_INTERVAL,
            knockback_damping: 6.0,
            gravity: Vec3::new(0.0, -9.81, 0.0),
            embed_depth: 0.1,
            min_orient_speed_sq: 0.1,
        }
    }
}

/// Полный конфиг headless симуляции
///
/// Все поля опциональны в JSON (serde default).
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub seed: u64,
    /// Частота FixedUpdate
    pub tick_hz: f64,
    pub combat: CombatSettings,
    /// Шаблон врага для ручного спавна (`spawn_enemy`, demo)
    pub enemy: EnemyConfig,
    pub objective_health: f32,
    pub player_health: f32,
    pub path: Vec<Vec3>,
    pub waves: Vec<Wave>,
    /// Melee пресеты, которые спавнит host/demo
    pub weapons: Vec<MeleeWeapon>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            tick_hz: 60.0,
            combat: CombatSettings::default(),
            enemy: EnemyConfig::default(),
            objective_health: DefendedObjective::DEFAULT_HEALTH,
            player_health: Player::DEFAULT_HEALTH,
            path: Vec::new(),
            waves: Vec::new(),
            weapons: Vec::new(),
        }
    }
}

impl SimulationConfig {
    /// Парсинг + валидация
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tick_hz > 0.0 && self.tick_hz.is_finite()) {
            return Err(ConfigError::invalid(
                "tick_hz",
                format!("must be positive, got {}", self.tick_hz),
            ));
        }
        require_positive("combat.ledger_prune_interval", self.combat.ledger_prune_interval)?;
        require_positive("objective_health", self.objective_health)?;
        require_positive("player_health", self.player_health)?;

        validate_enemy("enemy", &self.enemy)?;

        for (index, wave) in self.waves.iter().enumerate() {
            if wave.count > 1 {
                require_positive(&format!("waves[{index}].spawn_interval"), wave.spawn_interval)?;
            }
            if wave.start_at < 0.0 {
                return Err(ConfigError::invalid(
                    format!("waves[{index}].start_at"),
                    "must not be negative",
                ));
            }
            validate_enemy(&format!("waves[{index}].enemy"), &wave.enemy)?;
        }

        for (index, weapon) in self.weapons.iter().enumerate() {
            validate_weapon(&format!("weapons[{index}]"), weapon)?;
        }

        Ok(())
    }
}

fn validate_enemy(prefix: &str, enemy: &EnemyConfig) -> Result<(), ConfigError> {
    require_positive(&format!("{prefix}.max_health"), enemy.max_health)?;
    require_positive(&format!("{prefix}.attack_rate"), enemy.attack_rate)?;
    require_positive(&format!("{prefix}.attack_range"), enemy.attack_range)?;
    require_positive(&format!("{prefix}.waypoint_threshold"), enemy.waypoint_threshold)?;

    if enemy.min_pickups > enemy.max_pickups {
        return Err(ConfigError::invalid(
            format!("{prefix}.min_pickups"),
            format!("{} exceeds max_pickups {}", enemy.min_pickups, enemy.max_pickups),
        ));
    }
    if enemy.move_speed < 0.0 || enemy.drop_radius < 0.0 || enemy.despawn_delay < 0.0 {
        return Err(ConfigError::invalid(
            prefix,
            "move_speed, drop_radius and despawn_delay must not be negative",
        ));
    }
    if let TargetingPolicy::NearestWithin { detection_radius } = enemy.targeting {
        require_positive(&format!("{prefix}.targeting.detection_radius"), detection_radius)?;
    }

    Ok(())
}

/// Валидация melee пресета (cooldown, шанс крита, окна политик)
pub fn validate_weapon(prefix: &str, weapon: &MeleeWeapon) -> Result<(), ConfigError> {
    require_positive(&format!("{prefix}.attack_cooldown"), weapon.attack_cooldown)?;
    if let Some(interval) = weapon.strike_interval {
        require_positive(&format!("{prefix}.strike_interval"), interval)?;
    }

    match &weapon.damage {
        DamagePolicy::Critical { chance, .. } if !(0.0..=1.0).contains(chance) => {
            return Err(ConfigError::invalid(
                format!("{prefix}.damage.chance"),
                format!("must be within [0, 1], got {chance}"),
            ));
        }
        DamagePolicy::Combo(combo) => {
            require_positive(&format!("{prefix}.damage.window"), combo.window)?;
            if combo.max_tier == 0 {
                return Err(ConfigError::invalid(
                    format!("{prefix}.damage.max_tier"),
                    "must be at least 1",
                ));
            }
        }
        DamagePolicy::Charge(gauge) => {
            require_positive(&format!("{prefix}.damage.charge_time"), gauge.charge_time)?;
        }
        _ => {}
    }

    if let Some(area) = &weapon.area {
        require_positive(&format!("{prefix}.area.radius"), area.radius)?;
    }

    Ok(())
}
