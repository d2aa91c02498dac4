//! Enemy reactions: death side effects, stun slowdown.

use bevy::prelude::*;
use rand::Rng;

use crate::ai::{
    Enemy, EnemyConfig, EnemyState, EnemyStateChanged, Knockback, Pickup, RewardGranted,
};
use crate::combat::{CombatCue, CueKind, DespawnAfter, EntityDied};
use crate::components::RewardSink;
use crate::effects::StatusEffects;
use crate::DeterministicRng;

/// Высота спавна pickup над позицией смерти
pub const PICKUP_HEIGHT: f32 = 0.1;

/// Случайная точка в диске радиуса `radius` (равномерно по площади)
pub fn disk_offset(rng: &mut impl Rng, radius: f32) -> Vec3 {
    let angle = rng.gen_range(0.0..std::f32::consts::TAU);
    let distance = radius * rng.gen::<f32>().sqrt();
    Vec3::new(angle.cos() * distance, PICKUP_HEIGHT, angle.sin() * distance)
}

/// Система: смерть врага → Dead state, награда, pickups, death cue, despawn
///
/// EntityDied приходит ровно один раз (apply_damage), state == Dead
/// дополнительно защищает от повторной обработки.
#[allow(clippy::too_many_arguments)]
pub fn handle_enemy_deaths(
    mut commands: Commands,
    mut death_events: EventReader<EntityDied>,
    mut enemies: Query<(&mut EnemyState, &EnemyConfig, &Transform, &mut Knockback), With<Enemy>>,
    mut rewards: ResMut<RewardSink>,
    mut rng: ResMut<DeterministicRng>,
    mut granted_events: EventWriter<RewardGranted>,
    mut changed_events: EventWriter<EnemyStateChanged>,
    mut cues: EventWriter<CombatCue>,
    time: Res<Time>,
) {
    let now = time.elapsed_secs();

    for event in death_events.read() {
        let Ok((mut state, config, transform, mut knockback)) = enemies.get_mut(event.entity) else {
            continue;
        };
        if state.is_dead() {
            continue;
        }

        changed_events.write(EnemyStateChanged {
            entity: event.entity,
            from: *state,
            to: EnemyState::Dead,
        });
        *state = EnemyState::Dead;
        knockback.velocity = Vec3::ZERO;

        rewards.add_currency(config.reward);
        let balance = rewards.balance();
        granted_events.write(RewardGranted {
            enemy: event.entity,
            amount: config.reward,
            balance,
        });

        let death_position = transform.translation;
        let (min, max) = (
            config.min_pickups.min(config.max_pickups),
            config.min_pickups.max(config.max_pickups),
        );
        let count = rng.rng.gen_range(min..=max);
        for _ in 0..count {
            let offset = disk_offset(&mut rng.rng, config.drop_radius);
            commands.spawn((
                Pickup {
                    value: config.pickup_value,
                },
                Transform::from_translation(death_position + offset),
            ));
        }

        if let Some(cue) =
            CombatCue::configured(CueKind::Death, config.death_effect.as_ref(), death_position)
        {
            cues.write(cue);
        }

        if let Ok(mut entity_commands) = commands.get_entity(event.entity) {
            entity_commands.try_insert(DespawnAfter::at(now + config.despawn_delay));
        }

        crate::logger::log_info(&format!(
            "💰 {:?} killed: +{} currency (balance {}), {} pickup(s)",
            event.entity, config.reward, balance, count
        ));
    }
}

/// Система: stun speed factor из StatusEffects → Enemy::speed_multiplier
///
/// Stun без factor (или его окончание) возвращает множитель к 1.
pub fn sync_stun_slowdown(mut enemies: Query<(Entity, &mut Enemy)>, effects: Res<StatusEffects>) {
    for (entity, mut enemy) in enemies.iter_mut() {
        let factor = effects.speed_factor(entity).unwrap_or(1.0);
        if enemy.speed_multiplier != factor {
            crate::logger::log(&format!(
                "🐌 {:?} speed multiplier {:.2} → {:.2}",
                entity, enemy.speed_multiplier, factor
            ));
            enemy.speed_multiplier = factor;
        }
    }
}
