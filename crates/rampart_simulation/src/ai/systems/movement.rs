//! Enemy movement systems (path following, pursuit, knockback).

use bevy::prelude::*;

use crate::ai::{AttackPolicy, Enemy, EnemyConfig, EnemyState, Knockback};
use crate::combat::Dead;
use crate::components::ActivePath;
use crate::config::CombatSettings;

/// Направление в плоскости земли (y = 0)
fn flattened(direction: Vec3) -> Vec3 {
    Vec3::new(direction.x, 0.0, direction.z)
}

/// Поворот к направлению с ограниченной скоростью (slerp на `factor`)
pub fn turn_toward(transform: &mut Transform, direction: Vec3, factor: f32) {
    let direction = flattened(direction);
    if direction.length_squared() < 1e-6 {
        return;
    }

    let target = Transform::default().looking_to(direction, Vec3::Y).rotation;
    transform.rotation = transform.rotation.slerp(target, factor.clamp(0.0, 1.0));
}

/// Система: Traveling — поворот к waypoint, движение вдоль facing, смена waypoint
pub fn enemy_travel(
    mut enemies: Query<
        (Entity, &mut Transform, &mut Enemy, &EnemyState, &EnemyConfig),
        Without<Dead>,
    >,
    path: Res<ActivePath>,
    time: Res<Time>,
) {
    let dt = time.delta_secs();

    for (entity, mut transform, mut enemy, state, config) in enemies.iter_mut() {
        if *state != EnemyState::Traveling {
            continue;
        }
        let Some(waypoint) = path.waypoint(enemy.path_index) else {
            continue;
        };

        let to_waypoint = waypoint - transform.translation;
        turn_toward(&mut transform, to_waypoint, config.rotation_speed * dt);

        let step = enemy.effective_speed(config) * dt;
        let forward = transform.forward();
        transform.translation += forward * step;

        if flattened(waypoint - transform.translation).length() < config.waypoint_threshold {
            enemy.path_index += 1;
            crate::logger::log(&format!(
                "AI: {:?} reached waypoint, next index {}",
                entity, enemy.path_index
            ));
        }
    }
}

/// Система: Engaging — поворот к цели; InRange двигается пока дальше attack_range
pub fn enemy_pursue(
    mut enemies: Query<(&mut Transform, &Enemy, &EnemyState, &EnemyConfig), Without<Dead>>,
    targets: Query<&Transform, Without<Enemy>>,
    time: Res<Time>,
) {
    let dt = time.delta_secs();

    for (mut transform, enemy, state, config) in enemies.iter_mut() {
        let EnemyState::Engaging { target } = *state else {
            continue;
        };
        let Ok(target_transform) = targets.get(target) else {
            continue;
        };

        let to_target = target_transform.translation - transform.translation;
        turn_toward(&mut transform, to_target, config.rotation_speed * dt);

        if config.attack_policy() == AttackPolicy::InRange
            && to_target.length() > config.attack_range
        {
            let direction = flattened(to_target).normalize_or_zero();
            transform.translation += direction * enemy.effective_speed(config) * dt;
        }
    }
}

/// Система: интеграция knockback velocity (physics-engine independent)
pub fn integrate_knockback(
    mut agents: Query<(&mut Transform, &mut Knockback)>,
    settings: Res<CombatSettings>,
    time: Res<Time>,
) {
    let dt = time.delta_secs();

    for (mut transform, mut knockback) in agents.iter_mut() {
        if knockback.velocity == Vec3::ZERO {
            continue;
        }
        transform.translation += knockback.integrate(dt, settings.knockback_damping);
    }
}
