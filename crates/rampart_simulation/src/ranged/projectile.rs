//! Projectile — ballistic entity (flight, range limit, attach/embed)
//!
//! Architecture:
//! - ECS владеет полётом: velocity, gravity, distance traveled, lifetime
//! - Host детектирует коллизии → ProjectileContact (точка + нормаль)
//! - Attached — терминальное состояние: нет движения, нет урона

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ai::Enemy;
use crate::combat::{CombatCue, CueKind, DamageKind, DamageRequest, Dead, DespawnAfter};
use crate::components::{Environment, Health};
use crate::config::CombatSettings;

/// Параметры снаряда (стрела, болт, магический снаряд)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileSpec {
    pub damage: f32,
    /// Стартовая скорость (для лука — верхняя граница, реальная = strength × max)
    pub speed: f32,
    pub max_range: f32,
    /// Абсолютный потолок жизни с момента запуска
    pub lifetime: f32,
    /// Задержка despawn после попадания / втыкания
    pub attach_delay: f32,
    pub gravity: bool,
    pub impact_effect: Option<String>,
    pub impact_sound: Option<String>,
}

impl Default for ProjectileSpec {
    fn default() -> Self {
        Self::arrow()
    }
}

impl ProjectileSpec {
    /// Стрела лука: урон 10, держится 1 с после попадания
    pub fn arrow() -> Self {
        Self {
            damage: 10.0,
            speed: 10.0,
            max_range: 100.0,
            lifetime: 10.0,
            attach_delay: 1.0,
            gravity: true,
            impact_effect: None,
            impact_sound: None,
        }
    }

    /// Болт арбалета: 25 урона, 30 м/с, дальность 50
    pub fn bolt() -> Self {
        Self {
            damage: 25.0,
            speed: 30.0,
            max_range: 50.0,
            lifetime: 10.0,
            attach_delay: 5.0,
            ..Self::arrow()
        }
    }

    /// Магический снаряд жезла: без гравитации, исчезает сразу при попадании
    pub fn magic_bolt() -> Self {
        Self {
            damage: 10.0,
            speed: 15.0,
            max_range: 100.0,
            lifetime: 5.0,
            attach_delay: 0.0,
            gravity: false,
            ..Self::arrow()
        }
    }
}

/// Состояние полёта
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum ProjectileState {
    InFlight,
    /// `to` — агент-родитель (None → воткнулся в окружение)
    Attached { to: Option<Entity> },
}

/// Снаряд в полёте
#[derive(Component, Debug, Clone, PartialEq)]
#[require(Transform)]
pub struct Projectile {
    pub spec: ProjectileSpec,
    /// Кто выстрелил (для предотвращения self-hit)
    pub shooter: Option<Entity>,
    pub velocity: Vec3,
    pub traveled: f32,
    pub last_position: Vec3,
    pub state: ProjectileState,
}

impl Projectile {
    /// Снаряд со стартовой скоростью вдоль facing `at`
    pub fn launch(
        spec: ProjectileSpec,
        shooter: Option<Entity>,
        at: &Transform,
        speed: f32,
    ) -> Self {
        Self {
            spec,
            shooter,
            velocity: at.forward() * speed,
            traveled: 0.0,
            last_position: at.translation,
            state: ProjectileState::InFlight,
        }
    }

    pub fn is_attached(&self) -> bool {
        matches!(self.state, ProjectileState::Attached { .. })
    }

    pub fn range_exceeded(&self) -> bool {
        self.traveled >= self.spec.max_range
    }

    /// Один шаг полёта. Возвращает `true`, когда дальность исчерпана.
    ///
    /// Поворот к velocity только если |v|² > `min_orient_speed_sq`.
    pub fn advance(
        &mut self,
        transform: &mut Transform,
        dt: f32,
        gravity: Vec3,
        min_orient_speed_sq: f32,
    ) -> bool {
        if self.is_attached() {
            return false;
        }

        if self.spec.gravity {
            self.velocity += gravity * dt;
        }
        transform.translation += self.velocity * dt;

        if self.velocity.length_squared() > min_orient_speed_sq {
            transform.look_to(self.velocity, Vec3::Y);
        }

        self.traveled += transform.translation.distance(self.last_position);
        self.last_position = transform.translation;

        self.range_exceeded()
    }

    /// Направление подлёта (velocity, иначе facing)
    pub fn approach_direction(&self, transform: &Transform) -> Vec3 {
        self.velocity.try_normalize().unwrap_or(transform.forward().as_vec3())
    }

    fn attach(&mut self, to: Option<Entity>) {
        self.state = ProjectileState::Attached { to };
        self.velocity = Vec3::ZERO;
    }
}

/// Отражение направления от поверхности с нормалью `normal`
pub fn reflect(direction: Vec3, normal: Vec3) -> Vec3 {
    let normal = normal.normalize_or_zero();
    direction - 2.0 * direction.dot(normal) * normal
}

/// Placement воткнутого в окружение снаряда: `depth` внутрь поверхности
/// против отражённого направления, facing вдоль отражённого.
pub fn embed_transform(point: Vec3, approach: Vec3, normal: Vec3, depth: f32) -> Transform {
    let reflected = reflect(approach, normal).normalize_or_zero();
    let transform = Transform::from_translation(point - reflected * depth);

    if reflected == Vec3::ZERO {
        return transform;
    }
    transform.looking_to(reflected, Vec3::Y)
}

/// Локальный transform ребёнка относительно root-родителя
pub fn local_to_parent(parent: &Transform, child: &Transform) -> Transform {
    Transform::from_matrix(parent.compute_matrix().inverse() * child.compute_matrix())
}

/// Transform точки запуска: offset в пространстве лаунчера, facing лаунчера
pub fn launch_transform(launcher: &Transform, spawn_offset: Vec3) -> Transform {
    Transform {
        translation: launcher.transform_point(spawn_offset),
        rotation: launcher.rotation,
        scale: Vec3::ONE,
    }
}

/// Event: снаряд коснулся тела (host → ECS)
#[derive(Event, Debug, Clone, Copy)]
pub struct ProjectileContact {
    pub projectile: Entity,
    pub other: Entity,
    pub point: Vec3,
    pub normal: Vec3,
}

impl ProjectileContact {
    pub fn new(projectile: Entity, other: Entity, point: Vec3, normal: Vec3) -> Self {
        Self {
            projectile,
            other,
            point,
            normal,
        }
    }
}

/// Event: снаряд запущен (host создаёт визуал)
#[derive(Event, Debug, Clone, Copy)]
pub struct ProjectileLaunched {
    pub projectile: Entity,
    pub launcher: Entity,
    pub speed: f32,
}

/// Spawn снаряда + lifetime ceiling (DespawnAfter)
pub fn spawn_projectile(
    commands: &mut Commands,
    spec: &ProjectileSpec,
    launcher: Entity,
    at: Transform,
    speed: f32,
    now: f32,
) -> Entity {
    commands
        .spawn((
            Projectile::launch(spec.clone(), Some(launcher), &at, speed),
            at,
            DespawnAfter::at(now + spec.lifetime),
        ))
        .id()
}

/// Система: полёт снарядов (gravity, orientation, range limit)
pub fn fly_projectiles(
    mut commands: Commands,
    mut projectiles: Query<(Entity, &mut Projectile, &mut Transform)>,
    settings: Res<CombatSettings>,
    time: Res<Time>,
) {
    let dt = time.delta_secs();

    for (entity, mut projectile, mut transform) in projectiles.iter_mut() {
        if projectile.is_attached() {
            continue;
        }

        if projectile.advance(&mut transform, dt, settings.gravity, settings.min_orient_speed_sq) {
            crate::logger::log(&format!(
                "🏹 Projectile {:?} exceeded range ({:.1} m)",
                entity, projectile.traveled
            ));
            commands.entity(entity).try_despawn();
        }
    }
}

/// Система: ProjectileContact → урон + attach / embed
///
/// Первый квалифицирующий контакт переводит снаряд в Attached; дальнейшие
/// контакты (в том числе в этом же тике) игнорируются.
#[allow(clippy::type_complexity)]
pub fn resolve_projectile_contacts(
    mut commands: Commands,
    mut contacts: EventReader<ProjectileContact>,
    mut projectiles: Query<(&mut Projectile, &mut Transform, Option<&mut DespawnAfter>)>,
    agents: Query<(&Transform, &Health), (With<Enemy>, Without<Dead>, Without<Projectile>)>,
    environment: Query<(), With<Environment>>,
    settings: Res<CombatSettings>,
    mut damage_events: EventWriter<DamageRequest>,
    mut cues: EventWriter<CombatCue>,
    time: Res<Time>,
) {
    let now = time.elapsed_secs();

    for contact in contacts.read() {
        let Ok((mut projectile, mut transform, despawn)) = projectiles.get_mut(contact.projectile)
        else {
            continue;
        };
        if projectile.is_attached() || projectile.shooter == Some(contact.other) {
            continue;
        }

        let live_agent = agents
            .get(contact.other)
            .ok()
            .filter(|(_, health)| health.is_alive());

        if let Some((agent_transform, _)) = live_agent {
            damage_events.write(DamageRequest::new(
                contact.projectile,
                contact.other,
                projectile.spec.damage,
                DamageKind::Projectile,
            ));

            *transform = local_to_parent(agent_transform, &transform);
            commands.entity(contact.projectile).try_insert(ChildOf(contact.other));
            projectile.attach(Some(contact.other));

            crate::logger::log(&format!(
                "🎯 Projectile {:?} hit {:?} for {}",
                contact.projectile, contact.other, projectile.spec.damage
            ));
        } else if environment.contains(contact.other) {
            let approach = projectile.approach_direction(&transform);
            *transform =
                embed_transform(contact.point, approach, contact.normal, settings.embed_depth);
            projectile.attach(None);

            crate::logger::log(&format!(
                "🪵 Projectile {:?} embedded in environment",
                contact.projectile
            ));
        } else {
            // Мёртвый агент, другой снаряд, неизвестное тело
            continue;
        }

        let despawn_at = now + projectile.spec.attach_delay;
        match despawn {
            Some(mut despawn) => *despawn = despawn.sooner(despawn_at),
            None => {
                commands.entity(contact.projectile).try_insert(DespawnAfter::at(despawn_at));
            }
        }

        let impact_cues = [
            (CueKind::Impact, projectile.spec.impact_effect.as_ref()),
            (CueKind::HitSound, projectile.spec.impact_sound.as_ref()),
        ];
        for (kind, asset) in impact_cues {
            if let Some(cue) = CombatCue::configured(kind, asset, contact.point) {
                cues.write(cue);
            }
        }
    }
}
