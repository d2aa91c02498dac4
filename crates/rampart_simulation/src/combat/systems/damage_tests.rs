//! Tests for damage systems.

#[cfg(test)]
mod tests {
    use crate::combat::{
        DamageDealt, DamageKind, DamageRequest, Dead, DespawnAfter, EntityDied, GameOver,
        GameOverCause,
    };
    use crate::components::Health;
    use crate::{
        create_headless_app, run_fixed_tick, spawn_objective, spawn_player, SimulationPlugin,
    };
    use bevy::prelude::*;

    fn combat_app() -> App {
        let mut app = create_headless_app(42);
        app.add_plugins(SimulationPlugin);
        app
    }

    fn hit(app: &mut App, target: Entity, amount: f32) {
        let source = Entity::from_raw(9_999);
        app.world_mut()
            .send_event(DamageRequest::new(source, target, amount, DamageKind::Strike));
    }

    fn drain<E: Event>(app: &mut App) -> Vec<E> {
        app.world_mut().resource_mut::<Events<E>>().drain().collect()
    }

    #[test]
    fn test_damage_accumulates_in_arrival_order() {
        let mut app = combat_app();
        let target = app.world_mut().spawn(Health::new(100.0)).id();

        for _ in 0..3 {
            hit(&mut app, target, 20.0);
        }
        run_fixed_tick(&mut app);

        assert_eq!(app.world().get::<Health>(target).unwrap().current, 40.0);

        let remaining: Vec<f32> = drain::<DamageDealt>(&mut app)
            .iter()
            .map(|d| d.remaining)
            .collect();
        assert_eq!(remaining, vec![80.0, 60.0, 40.0]);
    }

    #[test]
    fn test_overkill_clamps_and_dies_once() {
        let mut app = combat_app();
        let target = app.world_mut().spawn(Health::new(30.0)).id();

        hit(&mut app, target, 50.0);
        hit(&mut app, target, 10.0);
        run_fixed_tick(&mut app);

        assert_eq!(app.world().get::<Health>(target).unwrap().current, 0.0);
        assert!(app.world().get::<Dead>(target).is_some());
        assert_eq!(drain::<EntityDied>(&mut app).len(), 1);
        // Второй запрос в том же тике — no-op (цель уже мертва)
        assert_eq!(drain::<DamageDealt>(&mut app).len(), 1);

        // Урон по мёртвой цели на следующих тиках тоже no-op
        hit(&mut app, target, 10.0);
        run_fixed_tick(&mut app);
        assert!(drain::<EntityDied>(&mut app).is_empty());
        assert!(drain::<DamageDealt>(&mut app).is_empty());
    }

    #[test]
    fn test_missing_target_is_ignored() {
        let mut app = combat_app();
        let ghost = app.world_mut().spawn(Health::new(10.0)).id();
        app.world_mut().despawn(ghost);

        hit(&mut app, ghost, 10.0);
        run_fixed_tick(&mut app);

        assert!(drain::<DamageDealt>(&mut app).is_empty());
    }

    #[test]
    fn test_objective_destroyed_is_game_over() {
        let mut app = combat_app();
        let crystal = spawn_objective(app.world_mut(), Vec3::ZERO, 20.0);

        hit(&mut app, crystal, 25.0);
        run_fixed_tick(&mut app);

        let game_over = drain::<GameOver>(&mut app);
        assert_eq!(game_over.len(), 1);
        assert_eq!(game_over[0].cause, GameOverCause::ObjectiveDestroyed);
        assert_eq!(game_over[0].entity, crystal);
    }

    #[test]
    fn test_player_killed_is_game_over() {
        let mut app = combat_app();
        let player = spawn_player(app.world_mut(), Vec3::ZERO, 10.0);

        hit(&mut app, player, 10.0);
        run_fixed_tick(&mut app);

        let game_over = drain::<GameOver>(&mut app);
        assert_eq!(game_over.len(), 1);
        assert_eq!(game_over[0].cause, GameOverCause::PlayerKilled);
    }

    #[test]
    fn test_despawn_after_timeout() {
        let mut app = combat_app();
        let corpse = app.world_mut().spawn(DespawnAfter::at(0.1)).id();

        // 0.1 с = 6 тиков при 60 Hz
        for _ in 0..3 {
            run_fixed_tick(&mut app);
        }
        assert!(app.world().get_entity(corpse).is_ok());

        for _ in 0..6 {
            run_fixed_tick(&mut app);
        }
        assert!(app.world().get_entity(corpse).is_err());
    }

    #[test]
    fn test_despawn_deadline_keeps_sooner() {
        let deadline = DespawnAfter::at(10.0).sooner(2.0).sooner(5.0);
        assert_eq!(deadline.despawn_time, 2.0);
    }
}
