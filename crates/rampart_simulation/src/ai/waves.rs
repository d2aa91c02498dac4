//! Wave schedule: спавн врагов в начале пути по расписанию

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ai::{Enemy, EnemyConfig};
use crate::components::{ActivePath, Health};

/// Одна волна: `count` врагов, по одному каждые `spawn_interval` секунд с `start_at`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wave {
    pub start_at: f32,
    pub count: u32,
    pub spawn_interval: f32,
    #[serde(default)]
    pub enemy: EnemyConfig,
}

/// Resource: расписание волн + прогресс спавна
#[derive(Resource, Debug, Clone, Default)]
pub struct WaveSchedule {
    waves: Vec<Wave>,
    spawned: Vec<u32>,
}

impl WaveSchedule {
    pub fn new(waves: Vec<Wave>) -> Self {
        let spawned = vec![0; waves.len()];
        Self { waves, spawned }
    }

    pub fn waves(&self) -> &[Wave] {
        &self.waves
    }

    pub fn spawned_total(&self) -> u32 {
        self.spawned.iter().sum()
    }

    pub fn is_finished(&self) -> bool {
        self.waves
            .iter()
            .zip(&self.spawned)
            .all(|(wave, spawned)| *spawned >= wave.count)
    }

    /// Конфиги врагов, чьё время спавна наступило (в порядке волн)
    pub fn due(&mut self, now: f32) -> Vec<EnemyConfig> {
        let mut due = Vec::new();

        for (wave, spawned) in self.waves.iter().zip(self.spawned.iter_mut()) {
            while *spawned < wave.count
                && wave.start_at + *spawned as f32 * wave.spawn_interval <= now
            {
                *spawned += 1;
                due.push(wave.enemy.clone());
            }
        }

        due
    }
}

/// Bundle врага с health = config.max_health (остальное через #[require])
pub fn enemy_bundle(config: &EnemyConfig, transform: Transform) -> impl Bundle {
    (Enemy::default(), config.clone(), Health::new(config.max_health), transform)
}

/// Transform спавна: waypoint 0, лицом к waypoint 1
pub fn spawn_transform(path: &ActivePath) -> Transform {
    let origin = path.waypoint(0).unwrap_or(Vec3::ZERO);
    let transform = Transform::from_translation(origin);

    match path.waypoint(1) {
        Some(next) if next.x != origin.x || next.z != origin.z => {
            transform.looking_at(Vec3::new(next.x, origin.y, next.z), Vec3::Y)
        }
        _ => transform,
    }
}

/// Система: спавн врагов по WaveSchedule
pub fn spawn_waves(
    mut commands: Commands,
    mut schedule: ResMut<WaveSchedule>,
    path: Res<ActivePath>,
    time: Res<Time>,
) {
    let now = time.elapsed_secs();

    for config in schedule.due(now) {
        let entity = commands.spawn(enemy_bundle(&config, spawn_transform(&path))).id();
        crate::logger::log(&format!("🌊 Spawned enemy {:?} ({} HP)", entity, config.max_health));
    }
}
