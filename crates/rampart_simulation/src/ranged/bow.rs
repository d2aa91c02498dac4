//! Pull-draw launcher (bow)
//!
//! Тетива отслеживается только пока второе взаимодействие (Nock) активно.
//! Ось натяжения — локальная +Z лука (назад, к лучнику); стрела летит вдоль
//! forward лука (-Z).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::projectile::{launch_transform, spawn_projectile, ProjectileLaunched, ProjectileSpec};
use crate::combat::{CombatCue, CueKind};
use crate::components::{Grip, GripChange, GripChanged};

/// Лук: stretch limit тетивы + максимальная скорость стрелы
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[require(Transform, Grip, DrawState)]
#[serde(default)]
pub struct Bow {
    pub stretch_limit: f32,
    pub max_launch_speed: f32,
    /// Точка спавна стрелы (локально)
    pub spawn_offset: Vec3,
    pub arrow: ProjectileSpec,
    pub release_sound: Option<String>,
}

impl Default for Bow {
    fn default() -> Self {
        Self {
            stretch_limit: 0.25,
            max_launch_speed: 10.0,
            spawn_offset: Vec3::ZERO,
            arrow: ProjectileSpec::arrow(),
            release_sound: None,
        }
    }
}

/// Draw strength ∈ [0, 1] для offset натяжения вдоль оси
///
/// offset ≤ 0 (у нейтрали или впереди) → 0; ≥ limit → 1; между — линейно.
pub fn draw_strength(offset: f32, stretch_limit: f32) -> f32 {
    if offset <= 0.0 || stretch_limit <= 0.0 {
        return 0.0;
    }
    (offset / stretch_limit).min(1.0)
}

/// Visual midpoint тетивы: нейтраль → 0, иначе offset с clamp на limit
pub fn midpoint_offset(offset: f32, stretch_limit: f32) -> f32 {
    if offset <= 0.0 {
        return 0.0;
    }
    offset.min(stretch_limit.max(0.0))
}

/// Состояние тетивы
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct DrawState {
    /// Что тянет тетиву (рука / grab point), None — тетива отпущена
    pub anchor: Option<Entity>,
    pub strength: f32,
    /// Смещение visual midpoint вдоль оси натяжения (локально)
    pub midpoint: f32,
}

impl DrawState {
    pub fn is_drawn(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn track(&mut self, offset: f32, stretch_limit: f32) {
        self.strength = draw_strength(offset, stretch_limit);
        self.midpoint = midpoint_offset(offset, stretch_limit);
    }

    /// Локальная позиция midpoint (для host string renderer)
    pub fn midpoint_local(&self) -> Vec3 {
        Vec3::new(0.0, 0.0, self.midpoint)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Offset точки `anchor_world` вдоль оси натяжения лука
pub fn draw_offset(bow: &Transform, anchor_world: Vec3) -> f32 {
    bow.compute_matrix().inverse().transform_point3(anchor_world).z
}

/// Тетива: взять (Nock) / отпустить (Loose)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawAction {
    Nock { anchor: Entity },
    Loose,
}

/// Event: взаимодействие с тетивой (host → ECS)
#[derive(Event, Debug, Clone, Copy)]
pub struct DrawSignal {
    pub bow: Entity,
    pub action: DrawAction,
}

impl DrawSignal {
    pub fn nock(bow: Entity, anchor: Entity) -> Self {
        Self {
            bow,
            action: DrawAction::Nock { anchor },
        }
    }

    pub fn loose(bow: Entity) -> Self {
        Self {
            bow,
            action: DrawAction::Loose,
        }
    }
}

/// Система: Nock / Loose
///
/// Loose пересчитывает strength по текущей позиции anchor и запускает стрелу
/// со скоростью `strength × max_launch_speed`, затем тетива сбрасывается.
#[allow(clippy::too_many_arguments)]
pub fn handle_draw_signals(
    mut commands: Commands,
    mut signals: EventReader<DrawSignal>,
    mut bows: Query<(&Bow, &mut DrawState, &Grip, &Transform)>,
    anchors: Query<&Transform, Without<Bow>>,
    mut launched_events: EventWriter<ProjectileLaunched>,
    mut cues: EventWriter<CombatCue>,
    time: Res<Time>,
) {
    let now = time.elapsed_secs();

    for signal in signals.read() {
        let Ok((bow, mut draw, grip, transform)) = bows.get_mut(signal.bow) else {
            crate::logger::log_warning(&format!("⚠️ DrawSignal for unknown bow {:?}", signal.bow));
            continue;
        };

        match signal.action {
            DrawAction::Nock { anchor } => {
                if !grip.held() {
                    continue;
                }
                draw.reset();
                draw.anchor = Some(anchor);
                crate::logger::log(&format!("🏹 Bow {:?} nocked (anchor {:?})", signal.bow, anchor));
            }
            DrawAction::Loose => {
                let Some(anchor) = draw.anchor else {
                    continue;
                };
                if let Ok(anchor_transform) = anchors.get(anchor) {
                    let offset = draw_offset(transform, anchor_transform.translation);
                    draw.track(offset, bow.stretch_limit);
                }

                let speed = draw.strength * bow.max_launch_speed;
                let at = launch_transform(transform, bow.spawn_offset);
                let projectile =
                    spawn_projectile(&mut commands, &bow.arrow, signal.bow, at, speed, now);

                crate::logger::log(&format!(
                    "🏹 Bow {:?} loosed arrow {:?} (strength {:.2}, speed {:.2})",
                    signal.bow, projectile, draw.strength, speed
                ));
                launched_events.write(ProjectileLaunched {
                    projectile,
                    launcher: signal.bow,
                    speed,
                });
                if let Some(cue) = CombatCue::configured(
                    CueKind::Launch,
                    bow.release_sound.as_ref(),
                    at.translation,
                ) {
                    cues.write(cue);
                }

                draw.reset();
            }
        }
    }
}

/// Система: tracking тетивы каждый тик пока anchor активен
///
/// Пропавший anchor (stale reference) сбрасывает тетиву без выстрела.
pub fn track_draw(
    mut bows: Query<(Entity, &Bow, &mut DrawState, &Transform)>,
    anchors: Query<&Transform, Without<Bow>>,
) {
    for (entity, bow, mut draw, transform) in bows.iter_mut() {
        let Some(anchor) = draw.anchor else {
            continue;
        };

        match anchors.get(anchor) {
            Ok(anchor_transform) => {
                let offset = draw_offset(transform, anchor_transform.translation);
                draw.track(offset, bow.stretch_limit);
            }
            Err(_) => {
                crate::logger::log(&format!("🏹 Bow {:?} lost draw anchor {:?}", entity, anchor));
                draw.reset();
            }
        }
    }
}

/// Система: лук отпущен из основной руки → тетива сбрасывается без выстрела
pub fn reset_draw_on_release(
    mut changes: EventReader<GripChanged>,
    mut bows: Query<&mut DrawState, With<Bow>>,
) {
    for event in changes.read() {
        if !matches!(event.change, GripChange::Released(_)) {
            continue;
        }
        if let Ok(mut draw) = bows.get_mut(event.weapon) {
            draw.reset();
        }
    }
}
