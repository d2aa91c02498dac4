//! Cyclic launcher (crossbow): Unloaded → Reloading → Loaded → (fire) → Reloading

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::projectile::{launch_transform, spawn_projectile, ProjectileLaunched, ProjectileSpec};
use crate::combat::{CombatCue, CueKind};
use crate::components::{Grip, GripChange, GripChanged};

/// Состояние зарядки
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LoaderState {
    #[default]
    Unloaded,
    Reloading {
        ready_at: f32,
    },
    Loaded,
}

/// Арбалет
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[require(Transform, Grip)]
#[serde(default)]
pub struct CyclicLauncher {
    pub reload_time: f32,
    pub bolt: ProjectileSpec,
    /// Точка спавна болта (локально)
    pub spawn_offset: Vec3,
    pub reload_sound: Option<String>,
    pub fire_sound: Option<String>,
    #[serde(skip)]
    pub state: LoaderState,
}

impl Default for CyclicLauncher {
    fn default() -> Self {
        Self {
            reload_time: 1.5,
            bolt: ProjectileSpec::bolt(),
            spawn_offset: Vec3::ZERO,
            reload_sound: None,
            fire_sound: None,
            state: LoaderState::Unloaded,
        }
    }
}

impl CyclicLauncher {
    pub fn is_loaded(&self) -> bool {
        self.state == LoaderState::Loaded
    }

    fn start_reload(&mut self, now: f32) {
        self.state = LoaderState::Reloading {
            ready_at: now + self.reload_time,
        };
    }

    /// Grab: Unloaded → Reloading. В остальных состояниях no-op.
    pub fn on_grab(&mut self, now: f32) -> bool {
        if self.state != LoaderState::Unloaded {
            return false;
        }
        self.start_reload(now);
        true
    }

    /// Fire: только из Loaded → сразу Reloading. `false` — сигнал отклонён.
    pub fn try_fire(&mut self, now: f32) -> bool {
        if !self.is_loaded() {
            return false;
        }
        self.start_reload(now);
        true
    }

    /// Reloading → Loaded по истечении таймера
    pub fn advance(&mut self, now: f32) -> bool {
        match self.state {
            LoaderState::Reloading { ready_at } if now >= ready_at => {
                self.state = LoaderState::Loaded;
                true
            }
            _ => false,
        }
    }
}

/// Система: grab → reload, activate → fire
pub fn operate_crossbows(
    mut commands: Commands,
    mut changes: EventReader<GripChanged>,
    mut launchers: Query<(&mut CyclicLauncher, &Grip, &Transform)>,
    mut launched_events: EventWriter<ProjectileLaunched>,
    mut cues: EventWriter<CombatCue>,
    time: Res<Time>,
) {
    let now = time.elapsed_secs();

    for event in changes.read() {
        let Ok((mut launcher, grip, transform)) = launchers.get_mut(event.weapon) else {
            continue;
        };

        match event.change {
            GripChange::Grabbed(_) => {
                if launcher.on_grab(now) {
                    crate::logger::log(&format!("🔄 Crossbow {:?} reloading", event.weapon));
                    if let Some(cue) = CombatCue::configured(
                        CueKind::Reload,
                        launcher.reload_sound.as_ref(),
                        transform.translation,
                    ) {
                        cues.write(cue);
                    }
                }
            }
            GripChange::Activated => {
                if !grip.held() || !launcher.try_fire(now) {
                    continue;
                }

                let at = launch_transform(transform, launcher.spawn_offset);
                let speed = launcher.bolt.speed;
                let projectile =
                    spawn_projectile(&mut commands, &launcher.bolt, event.weapon, at, speed, now);

                crate::logger::log(&format!(
                    "🎯 Crossbow {:?} fired bolt {:?}, reloading",
                    event.weapon, projectile
                ));
                launched_events.write(ProjectileLaunched {
                    projectile,
                    launcher: event.weapon,
                    speed,
                });
                for (kind, asset) in [
                    (CueKind::Launch, launcher.fire_sound.as_ref()),
                    (CueKind::Reload, launcher.reload_sound.as_ref()),
                ] {
                    if let Some(cue) = CombatCue::configured(kind, asset, at.translation) {
                        cues.write(cue);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Система: Reloading → Loaded
pub fn advance_reloads(mut launchers: Query<(Entity, &mut CyclicLauncher)>, time: Res<Time>) {
    let now = time.elapsed_secs();

    for (entity, mut launcher) in launchers.iter_mut() {
        if launcher.advance(now) {
            crate::logger::log(&format!("✅ Crossbow {:?} loaded", entity));
        }
    }
}
