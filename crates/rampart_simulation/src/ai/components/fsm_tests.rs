//! Tests for enemy FSM components.

#[cfg(test)]
mod tests {
    use super::super::fsm::*;
    use bevy::prelude::*;

    fn entity(index: u32) -> Entity {
        Entity::from_raw(index)
    }

    #[test]
    fn test_enemy_defaults() {
        let config = EnemyConfig::default();
        assert_eq!(config.max_health, 100.0);
        assert_eq!(config.reward, 10);
        assert_eq!(config.move_speed, 0.8);
        assert_eq!(config.attack_range, 1.5);
        assert_eq!(config.attack_interval(), 1.0);
        assert_eq!((config.min_pickups, config.max_pickups), (1, 3));

        let enemy = Enemy::default();
        assert!(enemy.attack_ready(0.0), "первая атака сразу");
        assert_eq!(EnemyState::default(), EnemyState::Traveling);
    }

    #[test]
    fn test_stun_slowdown_scales_speed() {
        let config = EnemyConfig::default();
        let mut enemy = Enemy::default();
        enemy.speed_multiplier = 0.5;

        assert!((enemy.effective_speed(&config) - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_objective_only_ignores_player() {
        let policy = TargetingPolicy::ObjectiveOnly;
        let crystal = (entity(1), Vec3::new(0.0, 0.0, 20.0));
        let player = (entity(2), Vec3::new(1.0, 0.0, 0.0));

        assert_eq!(policy.choose(Vec3::ZERO, Some(crystal), [player]), Some(entity(1)));
        assert_eq!(policy.divert(Vec3::ZERO, Some(crystal), [player]), None);
    }

    #[test]
    fn test_nearest_within_prefers_close_player() {
        let policy = TargetingPolicy::NearestWithin { detection_radius: 5.0 };
        let crystal = (entity(1), Vec3::new(0.0, 0.0, 20.0));
        let near = (entity(2), Vec3::new(3.0, 0.0, 0.0));
        let far = (entity(3), Vec3::new(8.0, 0.0, 0.0));

        assert_eq!(policy.choose(Vec3::ZERO, Some(crystal), [far, near]), Some(entity(2)));
        assert_eq!(policy.divert(Vec3::ZERO, Some(crystal), [near]), Some(entity(2)));

        // Вне радиуса → кристалл, без diversion
        assert_eq!(policy.choose(Vec3::ZERO, Some(crystal), [far]), Some(entity(1)));
        assert_eq!(policy.divert(Vec3::ZERO, Some(crystal), [far]), None);
    }

    #[test]
    fn test_nearest_within_keeps_closer_objective() {
        let policy = TargetingPolicy::NearestWithin { detection_radius: 5.0 };
        let crystal = (entity(1), Vec3::new(1.0, 0.0, 0.0));
        let player = (entity(2), Vec3::new(4.0, 0.0, 0.0));

        assert_eq!(policy.choose(Vec3::ZERO, Some(crystal), [player]), Some(entity(1)));
        assert_eq!(policy.choose(Vec3::ZERO, None, [player]), Some(entity(2)));
        assert_eq!(policy.choose(Vec3::ZERO, None, std::iter::empty()), None);
    }

    #[test]
    fn test_knockback_decays_and_stays_grounded() {
        let mut knockback = Knockback::default();
        knockback.apply_impulse(Vec3::new(6.0, 5.0, 0.0));

        let step = knockback.integrate(0.1, 6.0);
        assert!((step - Vec3::new(0.6, 0.0, 0.0)).length() < 1e-5);
        assert!(knockback.velocity.length() < Vec3::new(6.0, 5.0, 0.0).length());

        for _ in 0..200 {
            knockback.integrate(0.1, 6.0);
        }
        assert!(knockback.is_resting());
        assert_eq!(knockback.integrate(0.1, 6.0), Vec3::ZERO);
    }

    #[test]
    fn test_enemy_config_accepts_partial_json() {
        let config: EnemyConfig =
            serde_json::from_str(r#"{ "max_health": 40.0, "attack": "InRange" }"#).unwrap();

        assert_eq!(config.max_health, 40.0);
        assert_eq!(config.attack, Some(AttackPolicy::InRange));
        assert_eq!(config.reward, 10);
    }

    #[test]
    fn test_attack_policy_follows_targeting_unless_set() {
        let objective = EnemyConfig::default();
        assert_eq!(objective.attack_policy(), AttackPolicy::Immediate);

        // Diversion на игрока → сначала подходим на attack_range
        let diverting = EnemyConfig {
            targeting: TargetingPolicy::NearestWithin { detection_radius: 5.0 },
            ..Default::default()
        };
        assert_eq!(diverting.attack_policy(), AttackPolicy::InRange);

        let explicit = EnemyConfig {
            attack: Some(AttackPolicy::Immediate),
            ..diverting
        };
        assert_eq!(explicit.attack_policy(), AttackPolicy::Immediate);
    }
}
