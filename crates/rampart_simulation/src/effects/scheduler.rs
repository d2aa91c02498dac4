//! Status Effect Scheduler — cancelable timed tasks
//!
//! Каждый эффект (stun, bleed) = task с handle. Scheduler однопоточный,
//! шагается раз в тик из `step_status_effects`. Перед любой мутацией на resumption
//! task проверяет, жива ли цель (иначе снимается без эффекта).
//!
//! Инвариант: на паре (target, kind) максимум одна task. Новая применённая
//! instance отменяет предыдущую (refresh, не stack).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Handle запущенной task (монотонный, для детерминизма порядка)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

impl TaskHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
pub enum EffectKind {
    Stun,
    Bleed,
}

/// Что применяем (конфиг эффекта из EffectPolicy оружия)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectSpec {
    /// `speed_factor: None` — stun без замедления (только таймер + visual)
    Stun { duration: f32, speed_factor: Option<f32> },
    /// Первый тик — сразу при применении, далее каждые `tick_interval` пока < duration
    Bleed {
        damage_per_tick: f32,
        duration: f32,
        tick_interval: f32,
    },
}

impl EffectSpec {
    pub fn kind(&self) -> EffectKind {
        match self {
            EffectSpec::Stun { .. } => EffectKind::Stun,
            EffectSpec::Bleed { .. } => EffectKind::Bleed,
        }
    }

    pub fn duration(&self) -> f32 {
        match self {
            EffectSpec::Stun { duration, .. } | EffectSpec::Bleed { duration, .. } => *duration,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodicTick {
    pub interval: f32,
    pub magnitude: f32,
    pub next_at: f32,
    pub delivered: u32,
    /// Тики со смещением `k·interval < duration`
    pub total: u32,
}

impl PeriodicTick {
    fn new(started_at: f32, interval: f32, magnitude: f32, duration: f32) -> Self {
        let interval = interval.max(f32::EPSILON);
        Self {
            interval,
            magnitude,
            next_at: started_at,
            delivered: 0,
            total: (duration.max(0.0) / interval).ceil() as u32,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.delivered >= self.total
    }
}

/// Running task
#[derive(Debug, Clone, PartialEq)]
pub struct StatusTask {
    pub handle: TaskHandle,
    pub kind: EffectKind,
    /// Оружие, запустившее эффект (уничтожение оружия отменяет task)
    pub owner: Entity,
    pub target: Entity,
    pub started_at: f32,
    pub ends_at: f32,
    pub periodic: Option<PeriodicTick>,
    pub speed_factor: Option<f32>,
}

impl StatusTask {
    pub fn remaining(&self, now: f32) -> f32 {
        (self.ends_at - now).max(0.0)
    }
}

/// Результат шага scheduler'а (системы превращают в DamageRequest / cues)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectStep {
    Tick {
        handle: TaskHandle,
        kind: EffectKind,
        owner: Entity,
        target: Entity,
        magnitude: f32,
    },
    Expired {
        handle: TaskHandle,
        kind: EffectKind,
        target: Entity,
    },
    /// Цель мертва/удалена на resumption — task снята без эффекта
    Dropped {
        handle: TaskHandle,
        kind: EffectKind,
        target: Entity,
    },
}

/// Результат apply: новый handle + отменённая предыдущая instance (если была)
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub handle: TaskHandle,
    pub superseded: Option<StatusTask>,
}

#[derive(Resource, Debug, Default)]
pub struct StatusEffects {
    next_handle: u64,
    /// Отсортированы по handle (порядок запуска) — детерминированный step
    tasks: Vec<StatusTask>,
}

impl StatusEffects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn tasks(&self) -> impl Iterator<Item = &StatusTask> {
        self.tasks.iter()
    }

    pub fn get(&self, handle: TaskHandle) -> Option<&StatusTask> {
        self.tasks.iter().find(|task| task.handle == handle)
    }

    pub fn active(&self, target: Entity, kind: EffectKind) -> Option<&StatusTask> {
        self.tasks
            .iter()
            .find(|task| task.target == target && task.kind == kind)
    }

    pub fn is_active(&self, target: Entity, kind: EffectKind) -> bool {
        self.active(target, kind).is_some()
    }

    /// Множитель скорости цели от активных эффектов (None — без модификаторов)
    pub fn speed_factor(&self, target: Entity) -> Option<f32> {
        self.tasks
            .iter()
            .filter(|task| task.target == target)
            .filter_map(|task| task.speed_factor)
            .reduce(|acc, factor| acc * factor)
    }

    /// Запускает эффект. Running instance того же kind на той же цели отменяется.
    pub fn apply(&mut self, spec: EffectSpec, owner: Entity, target: Entity, now: f32) -> Applied {
        let superseded = self
            .tasks
            .iter()
            .position(|task| task.target == target && task.kind == spec.kind())
            .map(|index| self.tasks.remove(index));

        let handle = TaskHandle(self.next_handle);
        self.next_handle += 1;

        let (periodic, speed_factor) = match spec {
            EffectSpec::Stun { speed_factor, .. } => (None, speed_factor),
            EffectSpec::Bleed {
                damage_per_tick,
                duration,
                tick_interval,
            } => (Some(PeriodicTick::new(now, tick_interval, damage_per_tick, duration)), None),
        };

        self.tasks.push(StatusTask {
            handle,
            kind: spec.kind(),
            owner,
            target,
            started_at: now,
            ends_at: now + spec.duration(),
            periodic,
            speed_factor,
        });

        Applied { handle, superseded }
    }

    pub fn cancel(&mut self, handle: TaskHandle) -> Option<StatusTask> {
        let index = self.tasks.iter().position(|task| task.handle == handle)?;
        Some(self.tasks.remove(index))
    }

    /// Цель умерла/удалена → снимаем все её эффекты
    pub fn cancel_target(&mut self, target: Entity) -> Vec<StatusTask> {
        self.drain_where(|task| task.target == target)
    }

    /// Оружие уничтожено → снимаем всё, что оно запустило
    pub fn cancel_owner(&mut self, owner: Entity) -> Vec<StatusTask> {
        self.drain_where(|task| task.owner == owner)
    }

    fn drain_where(&mut self, predicate: impl Fn(&StatusTask) -> bool) -> Vec<StatusTask> {
        let (removed, kept): (Vec<_>, Vec<_>) =
            self.tasks.drain(..).partition(|task| predicate(task));
        self.tasks = kept;
        removed
    }

    /// Шаг scheduler'а до момента `now`.
    ///
    /// `is_live(target)` — liveness check на resumption: мёртвая/удалённая цель
    /// снимает task до того, как та что-либо сделает.
    pub fn step(&mut self, now: f32, is_live: impl Fn(Entity) -> bool) -> Vec<EffectStep> {
        let mut steps = Vec::new();
        let mut finished = Vec::new();

        for task in self.tasks.iter_mut() {
            if !is_live(task.target) {
                steps.push(EffectStep::Dropped {
                    handle: task.handle,
                    kind: task.kind,
                    target: task.target,
                });
                finished.push(task.handle);
                continue;
            }

            if let Some(periodic) = task.periodic.as_mut() {
                while !periodic.is_exhausted() && periodic.next_at <= now {
                    steps.push(EffectStep::Tick {
                        handle: task.handle,
                        kind: task.kind,
                        owner: task.owner,
                        target: task.target,
                        magnitude: periodic.magnitude,
                    });
                    periodic.delivered += 1;
                    // От started_at, без накопления ошибки
                    periodic.next_at =
                        task.started_at + periodic.delivered as f32 * periodic.interval;
                }
            }

            if now >= task.ends_at {
                steps.push(EffectStep::Expired {
                    handle: task.handle,
                    kind: task.kind,
                    target: task.target,
                });
                finished.push(task.handle);
            }
        }

        self.tasks.retain(|task| !finished.contains(&task.handle));
        steps
    }
}
