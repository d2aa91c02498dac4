//! Damage application and death systems.

use bevy::prelude::*;

use crate::combat::{
    DamageDealt, DamageRequest, Dead, DespawnAfter, EntityDied, GameOver, GameOverCause,
};
use crate::components::{DefendedObjective, Health, Player};

/// Система: применяет все DamageRequest этого тика (в порядке поступления)
///
/// - Мёртвая / отсутствующая цель → запрос молча отбрасывается
/// - Пересечение 0 → EntityDied (ровно один раз) + маркер Dead
pub fn apply_damage(
    mut commands: Commands,
    mut requests: EventReader<DamageRequest>,
    mut targets: Query<&mut Health, Without<Dead>>,
    mut dealt_events: EventWriter<DamageDealt>,
    mut died_events: EventWriter<EntityDied>,
) {
    for request in requests.read() {
        let Ok(mut health) = targets.get_mut(request.target) else {
            continue;
        };
        if !health.is_alive() || request.amount <= 0.0 {
            continue;
        }

        let crossed_zero = health.take_damage(request.amount);

        dealt_events.write(DamageDealt {
            source: request.source,
            target: request.target,
            amount: request.amount,
            kind: request.kind,
            remaining: health.current,
        });

        if crossed_zero {
            crate::logger::log(&format!(
                "💀 {:?} died ({:?} from {:?})",
                request.target, request.kind, request.source
            ));
            died_events.write(EntityDied {
                entity: request.target,
                killer: request.source,
            });
            if let Ok(mut entity_commands) = commands.get_entity(request.target) {
                entity_commands.try_insert(Dead);
            }
        }
    }
}

/// Система: смерть кристалла или игрока → GameOver
pub fn detect_game_over(
    mut death_events: EventReader<EntityDied>,
    objectives: Query<(), With<DefendedObjective>>,
    players: Query<(), With<Player>>,
    mut game_over_events: EventWriter<GameOver>,
) {
    for event in death_events.read() {
        let cause = if objectives.contains(event.entity) {
            GameOverCause::ObjectiveDestroyed
        } else if players.contains(event.entity) {
            GameOverCause::PlayerKilled
        } else {
            continue;
        };

        crate::logger::log_warning(&format!("🏁 Game over: {:?} ({:?})", cause, event.entity));
        game_over_events.write(GameOver {
            cause,
            entity: event.entity,
        });
    }
}

/// Система: деспавн entities с истёкшим DespawnAfter timeout
///
/// Трупы врагов, воткнутые снаряды, lifetime ceiling снарядов.
pub fn despawn_after_timeout(
    mut commands: Commands,
    query: Query<(Entity, &DespawnAfter)>,
    time: Res<Time>,
) {
    let current_time = time.elapsed_secs();

    for (entity, despawn_after) in query.iter() {
        if current_time >= despawn_after.despawn_time {
            crate::logger::log(&format!("⚰️ Despawning entity {:?} (timeout)", entity));
            commands.entity(entity).try_despawn();
        }
    }
}
