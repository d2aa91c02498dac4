//! Tests for projectile flight and placement math.

#[cfg(test)]
mod tests {
    use super::super::projectile::*;
    use bevy::prelude::*;

    const DT: f32 = 1.0 / 60.0;
    const GRAVITY: Vec3 = Vec3::new(0.0, -9.81, 0.0);

    fn launched(spec: ProjectileSpec, speed: f32) -> (Projectile, Transform) {
        let at = Transform::from_xyz(0.0, 1.0, 0.0).looking_to(Vec3::NEG_Z, Vec3::Y);
        (Projectile::launch(spec, None, &at, speed), at)
    }

    #[test]
    fn test_launch_velocity_along_facing() {
        let (projectile, _) = launched(ProjectileSpec::bolt(), 30.0);

        assert!((projectile.velocity - Vec3::new(0.0, 0.0, -30.0)).length() < 1e-4);
        assert_eq!(projectile.traveled, 0.0);
        assert_eq!(projectile.state, ProjectileState::InFlight);
    }

    #[test]
    fn test_distance_monotonic_until_range_exceeded() {
        let spec = ProjectileSpec {
            max_range: 5.0,
            gravity: false,
            ..ProjectileSpec::bolt()
        };
        let (mut projectile, mut transform) = launched(spec, 30.0);

        let mut previous = 0.0;
        let mut ticks = 0;
        loop {
            ticks += 1;
            let exceeded = projectile.advance(&mut transform, DT, GRAVITY, 0.1);
            assert!(projectile.traveled > previous);
            if exceeded {
                // Срабатывает на первом тике, где дистанция ≥ max_range
                assert!(previous < 5.0);
                break;
            }
            previous = projectile.traveled;
            assert!(ticks < 100, "снаряд должен исчерпать дальность");
        }

        // ~0.5 м за тик
        assert!((10..=11).contains(&ticks), "ticks = {ticks}");
        assert!(projectile.traveled >= 5.0);
    }

    #[test]
    fn test_gravity_bends_flight_and_reorients() {
        let (mut projectile, mut transform) = launched(ProjectileSpec::arrow(), 10.0);

        for _ in 0..30 {
            projectile.advance(&mut transform, DT, GRAVITY, 0.1);
        }

        assert!(transform.translation.y < 1.0);
        assert!(projectile.velocity.y < 0.0);
        // Facing следует за velocity
        let facing = transform.forward().as_vec3();
        assert!(facing.dot(projectile.velocity.normalize()) > 0.999);
    }

    #[test]
    fn test_slow_projectile_keeps_orientation() {
        let spec = ProjectileSpec {
            gravity: false,
            ..ProjectileSpec::arrow()
        };
        // Нулевое натяжение: |v|² = 0 < порога, facing не трогаем
        let (mut projectile, mut transform) = launched(spec, 0.0);
        let rotation = transform.rotation;

        assert!(!projectile.advance(&mut transform, DT, GRAVITY, 0.1));
        assert_eq!(transform.rotation, rotation);
        assert_eq!(projectile.traveled, 0.0);
    }

    #[test]
    fn test_reflect_off_floor() {
        let reflected = reflect(Vec3::new(1.0, -1.0, 0.0), Vec3::Y);
        assert!((reflected - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_embed_offsets_against_reflected_direction() {
        let approach = Vec3::new(0.0, -1.0, -1.0).normalize();
        let embedded = embed_transform(Vec3::ZERO, approach, Vec3::Y, 0.1);

        let reflected = Vec3::new(0.0, 1.0, -1.0).normalize();
        assert!((embedded.translation - (-reflected * 0.1)).length() < 1e-5);
        assert!(embedded.forward().as_vec3().dot(reflected) > 0.999);
    }

    #[test]
    fn test_local_to_parent_roundtrips_world_position() {
        let parent = Transform::from_xyz(3.0, 0.0, -2.0).with_rotation(Quat::from_rotation_y(0.7));
        let child = Transform::from_xyz(3.5, 1.2, -1.0);

        let local = local_to_parent(&parent, &child);
        let world = parent.transform_point(local.translation);
        assert!((world - child.translation).length() < 1e-4);
    }

    #[test]
    fn test_launch_transform_applies_local_offset() {
        let launcher = Transform::from_xyz(0.0, 1.0, 0.0)
            .with_rotation(Quat::from_rotation_y(std::f32::consts::PI));

        let at = launch_transform(&launcher, Vec3::new(0.0, 0.0, -0.5));
        assert!((at.translation - Vec3::new(0.0, 1.0, 0.5)).length() < 1e-5);
        assert_eq!(at.rotation, launcher.rotation);
    }

    #[test]
    fn test_presets() {
        let bolt = ProjectileSpec::bolt();
        assert_eq!((bolt.damage, bolt.speed, bolt.max_range), (25.0, 30.0, 50.0));
        assert_eq!(bolt.attach_delay, 5.0);

        let magic = ProjectileSpec::magic_bolt();
        assert!(!magic.gravity);
        assert_eq!(magic.lifetime, 5.0);
    }
}
