//! Enemy FSM systems (target acquisition, attacks).

use bevy::prelude::*;

use crate::ai::{AttackPolicy, Enemy, EnemyConfig, EnemyState, EnemyStateChanged};
use crate::combat::{DamageKind, DamageRequest, Dead};
use crate::components::{ActivePath, DefendedObjective, Health, Player};

/// Живые damage targets заданной роли (кристалл / игрок)
pub type LiveTargets<'w, 's, M> = Query<
    'w,
    's,
    (Entity, &'static Transform, &'static Health),
    (With<M>, Without<Dead>, Without<Enemy>),
>;

/// Снимок живых целей на этот тик
pub fn live_targets<M: Component>(targets: &LiveTargets<M>) -> Vec<(Entity, Vec3)> {
    targets
        .iter()
        .filter(|(_, _, health)| health.is_alive())
        .map(|(entity, transform, _)| (entity, transform.translation))
        .collect()
}

/// Ближайший кандидат к `from`
pub fn nearest(from: Vec3, candidates: &[(Entity, Vec3)]) -> Option<(Entity, Vec3)> {
    candidates
        .iter()
        .copied()
        .min_by(|a, b| from.distance_squared(a.1).total_cmp(&from.distance_squared(b.1)))
}

/// Система: Enemy FSM transitions
///
/// - Traveling: opportunistic diversion на игрока (NearestWithin); конец пути → acquire
/// - Engaging: цель пропала (despawn / смерть) → повторный acquire, без паники
/// - Нет цели в конце пути → остаёмся Traveling (idle), retry каждый тик
pub fn enemy_fsm_transitions(
    mut enemies: Query<(Entity, &mut EnemyState, &Enemy, &EnemyConfig, &Transform), Without<Dead>>,
    path: Res<ActivePath>,
    objectives: LiveTargets<DefendedObjective>,
    players: LiveTargets<Player>,
    mut changed_events: EventWriter<EnemyStateChanged>,
) {
    let objective_list = live_targets(&objectives);
    let player_list = live_targets(&players);

    for (entity, mut state, enemy, config, transform) in enemies.iter_mut() {
        let position = transform.translation;
        let objective = nearest(position, &objective_list);
        let path_finished = path.waypoint(enemy.path_index).is_none();

        let acquire = || {
            config
                .targeting
                .choose(position, objective, player_list.iter().copied())
                .map(|target| EnemyState::Engaging { target })
        };

        let new_state = match *state {
            EnemyState::Dead => continue,

            EnemyState::Traveling => {
                let diverted = config
                    .targeting
                    .divert(position, objective, player_list.iter().copied())
                    .map(|target| EnemyState::Engaging { target });

                match diverted {
                    Some(engaging) => engaging,
                    None if path_finished => acquire().unwrap_or(EnemyState::Traveling),
                    None => EnemyState::Traveling,
                }
            }

            EnemyState::Engaging { target } => {
                let target_alive = objective_list
                    .iter()
                    .chain(player_list.iter())
                    .any(|(candidate, _)| *candidate == target);

                if target_alive {
                    continue;
                }

                crate::logger::log(&format!(
                    "AI: {:?} lost target {:?}, re-acquiring",
                    entity, target
                ));
                if path_finished {
                    acquire().unwrap_or(EnemyState::Traveling)
                } else {
                    EnemyState::Traveling
                }
            }
        };

        if new_state != *state {
            crate::logger::log(&format!("AI: {:?} {:?} → {:?}", entity, *state, new_state));
            changed_events.write(EnemyStateChanged {
                entity,
                from: *state,
                to: new_state,
            });
            *state = new_state;
        }
    }
}

/// Система: атаки Engaging врагов
///
/// Attack когда `now >= next_attack_at` (→ `now + 1/attack_rate`).
/// AttackPolicy::InRange дополнительно требует цель ближе `attack_range`.
pub fn enemy_attacks(
    mut enemies: Query<(Entity, &mut Enemy, &EnemyState, &EnemyConfig, &Transform), Without<Dead>>,
    targets: Query<(&Transform, &Health), (Without<Enemy>, Without<Dead>)>,
    mut damage_events: EventWriter<DamageRequest>,
    time: Res<Time>,
) {
    let now = time.elapsed_secs();

    for (entity, mut enemy, state, config, transform) in enemies.iter_mut() {
        let EnemyState::Engaging { target } = *state else {
            continue;
        };
        let Ok((target_transform, target_health)) = targets.get(target) else {
            continue;
        };
        if !target_health.is_alive() || !enemy.attack_ready(now) {
            continue;
        }

        if config.attack_policy() == AttackPolicy::InRange
            && transform.translation.distance(target_transform.translation) > config.attack_range
        {
            continue;
        }

        damage_events.write(DamageRequest::new(
            entity,
            target,
            config.attack_damage,
            DamageKind::Enemy,
        ));
        enemy.next_attack_at = now + config.attack_interval();

        crate::logger::log(&format!(
            "👹 {:?} attacks {:?} for {} (next at {:.2})",
            entity, target, config.attack_damage, enemy.next_attack_at
        ));
    }
}
