//! Системы scheduler'а: step, cancellation на смерть/despawn цели и оружия

use bevy::prelude::*;

use super::scheduler::{EffectKind, EffectStep, StatusEffects};
use crate::combat::{DamageKind, DamageRequest, Dead, EntityDied};
use crate::components::Health;

/// Маркер: entity может запускать эффекты (оружие)
///
/// Удаление маркера (despawn оружия) отменяет все его tasks.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct EffectSource;

/// Событие: эффект закончился/снят (host гасит visual)
#[derive(Event, Debug, Clone, Copy)]
pub struct EffectEnded {
    pub target: Entity,
    pub kind: EffectKind,
}

/// Система: шаг всех running tasks
///
/// Bleed tick → DamageRequest(Bleed) от имени оружия-владельца.
pub fn step_status_effects(
    time: Res<Time>,
    mut effects: ResMut<StatusEffects>,
    targets: Query<&Health, Without<Dead>>,
    mut damage_events: EventWriter<DamageRequest>,
    mut ended_events: EventWriter<EffectEnded>,
) {
    if effects.is_empty() {
        return;
    }

    let now = time.elapsed_secs();
    let steps = effects.step(now, |target| {
        targets.get(target).map(|health| health.is_alive()).unwrap_or(false)
    });

    for step in steps {
        match step {
            EffectStep::Tick {
                owner,
                target,
                magnitude,
                ..
            } => {
                damage_events.write(DamageRequest::new(
                    owner,
                    target,
                    magnitude,
                    DamageKind::Bleed,
                ));
            }
            EffectStep::Expired { kind, target, .. } => {
                crate::logger::log(&format!("⏱️ {:?} expired on {:?}", kind, target));
                ended_events.write(EffectEnded { target, kind });
            }
            EffectStep::Dropped { kind, target, .. } => {
                crate::logger::log(&format!(
                    "🪦 {:?} dropped: target {:?} gone before resumption",
                    kind, target
                ));
                ended_events.write(EffectEnded { target, kind });
            }
        }
    }
}

/// Система: смерть цели → снимаем все её эффекты
pub fn cancel_effects_on_death(
    mut death_events: EventReader<EntityDied>,
    mut effects: ResMut<StatusEffects>,
    mut ended_events: EventWriter<EffectEnded>,
) {
    for event in death_events.read() {
        for task in effects.cancel_target(event.entity) {
            crate::logger::log(&format!(
                "❌ {:?} cancelled: target {:?} died",
                task.kind, task.target
            ));
            ended_events.write(EffectEnded {
                target: task.target,
                kind: task.kind,
            });
        }
    }
}

/// Система: despawn цели или оружия → отмена keyed tasks
pub fn cancel_effects_on_despawn(
    mut removed_targets: RemovedComponents<Health>,
    mut removed_sources: RemovedComponents<EffectSource>,
    mut effects: ResMut<StatusEffects>,
) {
    for target in removed_targets.read() {
        let cancelled = effects.cancel_target(target);
        if !cancelled.is_empty() {
            crate::logger::log(&format!(
                "❌ {} effect(s) cancelled: target {:?} despawned",
                cancelled.len(),
                target
            ));
        }
    }

    for owner in removed_sources.read() {
        let cancelled = effects.cancel_owner(owner);
        if !cancelled.is_empty() {
            crate::logger::log(&format!(
                "❌ {} effect(s) cancelled: weapon {:?} destroyed",
                cancelled.len(),
                owner
            ));
        }
    }
}
