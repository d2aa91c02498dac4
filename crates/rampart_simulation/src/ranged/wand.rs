//! Cast launcher (magic wand)
//!
//! - activate (held, cast cooldown прошёл) → магический снаряд
//! - второй хват (secondary cooldown прошёл) → charge; отпустили раньше → cancel
//! - charge завершён → AreaSpell впереди жезла

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::projectile::{launch_transform, spawn_projectile, ProjectileLaunched, ProjectileSpec};
use crate::ai::Enemy;
use crate::combat::{CombatCue, CueKind, DamageKind, DamageRequest, Dead};
use crate::components::{Grip, GripChange, GripChanged, Health};

/// Жезл
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[require(Transform, Grip)]
#[serde(default)]
pub struct Wand {
    pub base_damage: f32,
    pub cast_cooldown: f32,
    pub secondary_cooldown: f32,
    pub charge_duration: f32,
    /// Дистанция центра area spell перед жезлом
    pub spell_distance: f32,
    pub spell_radius: f32,
    /// Урон area spell (`base × 2`) — только если включено, иначе spell cue-only
    pub area_damage_enabled: bool,
    pub bolt: ProjectileSpec,
    pub spawn_offset: Vec3,
    pub use_sound: Option<String>,
    pub charge_effect: Option<String>,
    pub spell_effect: Option<String>,
    #[serde(skip)]
    pub next_cast_at: f32,
    #[serde(skip)]
    pub next_secondary_at: f32,
    #[serde(skip)]
    pub charging_since: Option<f32>,
}

impl Default for Wand {
    fn default() -> Self {
        Self {
            base_damage: 10.0,
            cast_cooldown: 0.5,
            secondary_cooldown: 5.0,
            charge_duration: 1.5,
            spell_distance: 5.0,
            spell_radius: 5.0,
            area_damage_enabled: false,
            bolt: ProjectileSpec::magic_bolt(),
            spawn_offset: Vec3::ZERO,
            use_sound: None,
            charge_effect: None,
            spell_effect: None,
            next_cast_at: 0.0,
            next_secondary_at: 0.0,
            charging_since: None,
        }
    }
}

impl Wand {
    pub fn is_charging(&self) -> bool {
        self.charging_since.is_some()
    }

    /// Основной cast: `true` если cooldown прошёл (cooldown перезапускается)
    pub fn try_cast(&mut self, now: f32) -> bool {
        if now < self.next_cast_at {
            return false;
        }
        self.next_cast_at = now + self.cast_cooldown;
        true
    }

    pub fn begin_charge(&mut self, now: f32) -> bool {
        if self.is_charging() || now < self.next_secondary_at {
            return false;
        }
        self.charging_since = Some(now);
        true
    }

    /// Отмена незавершённого charge
    pub fn cancel_charge(&mut self) -> bool {
        self.charging_since.take().is_some()
    }

    /// Charge завершён → secondary cooldown, `true` ровно один раз
    pub fn complete_charge(&mut self, now: f32) -> bool {
        match self.charging_since {
            Some(since) if now - since >= self.charge_duration => {
                self.charging_since = None;
                self.next_secondary_at = now + self.secondary_cooldown;
                true
            }
            _ => false,
        }
    }

    /// Урон area spell (None — policy выключена)
    pub fn spell_damage(&self) -> Option<f32> {
        self.area_damage_enabled.then_some(self.base_damage * 2.0)
    }

    pub fn with_area_damage(mut self) -> Self {
        self.area_damage_enabled = true;
        self
    }
}

/// Event: area spell сотворён (центр, радиус, опциональный урон)
#[derive(Event, Debug, Clone, Copy)]
pub struct AreaSpell {
    pub wand: Entity,
    pub center: Vec3,
    pub radius: f32,
    pub damage: Option<f32>,
}

/// Система: grip события жезла (cast / charge begin / charge cancel)
pub fn operate_wands(
    mut commands: Commands,
    mut changes: EventReader<GripChanged>,
    mut wands: Query<(&mut Wand, &Grip, &Transform)>,
    mut launched_events: EventWriter<ProjectileLaunched>,
    mut cues: EventWriter<CombatCue>,
    time: Res<Time>,
) {
    let now = time.elapsed_secs();

    for event in changes.read() {
        let Ok((mut wand, grip, transform)) = wands.get_mut(event.weapon) else {
            continue;
        };

        match event.change {
            GripChange::Activated => {
                if !grip.held() || !wand.try_cast(now) {
                    continue;
                }

                let at = launch_transform(transform, wand.spawn_offset);
                let speed = wand.bolt.speed;
                let mut bolt = wand.bolt.clone();
                bolt.damage = wand.base_damage;
                let projectile =
                    spawn_projectile(&mut commands, &bolt, event.weapon, at, speed, now);

                crate::logger::log(&format!("✨ Wand {:?} cast {:?}", event.weapon, projectile));
                launched_events.write(ProjectileLaunched {
                    projectile,
                    launcher: event.weapon,
                    speed,
                });
                if let Some(cue) = CombatCue::configured(
                    CueKind::UseSound,
                    wand.use_sound.as_ref(),
                    at.translation,
                ) {
                    cues.write(cue);
                }
            }
            GripChange::SecondGrabbed(_) => {
                if wand.begin_charge(now) {
                    crate::logger::log(&format!("⏳ Wand {:?} charging area spell", event.weapon));
                    if let Some(cue) = CombatCue::configured(
                        CueKind::StatusVisual,
                        wand.charge_effect.as_ref(),
                        transform.translation,
                    ) {
                        cues.write(cue.following(event.weapon));
                    }
                }
            }
            GripChange::SecondReleased(_) | GripChange::Released(_) => {
                if wand.cancel_charge() {
                    crate::logger::log(&format!("❌ Wand {:?} charge cancelled", event.weapon));
                }
            }
            _ => {}
        }
    }
}

/// Система: завершение charge → AreaSpell
pub fn complete_wand_charges(
    mut wands: Query<(Entity, &mut Wand, &Grip, &Transform)>,
    mut spells: EventWriter<AreaSpell>,
    mut cues: EventWriter<CombatCue>,
    time: Res<Time>,
) {
    let now = time.elapsed_secs();

    for (entity, mut wand, grip, transform) in wands.iter_mut() {
        if !wand.is_charging() {
            continue;
        }
        if !grip.held() {
            wand.cancel_charge();
            continue;
        }
        if !wand.complete_charge(now) {
            continue;
        }

        let origin = launch_transform(transform, wand.spawn_offset);
        let center = origin.translation + origin.forward() * wand.spell_distance;
        let damage = wand.spell_damage();

        crate::logger::log(&format!(
            "🌀 Wand {:?} area spell at {:?} (radius {}, damage {:?})",
            entity, center, wand.spell_radius, damage
        ));
        spells.write(AreaSpell {
            wand: entity,
            center,
            radius: wand.spell_radius,
            damage,
        });
        for (kind, asset) in [
            (CueKind::UseSound, wand.use_sound.as_ref()),
            (CueKind::Impact, wand.spell_effect.as_ref()),
        ] {
            if let Some(cue) = CombatCue::configured(kind, asset, center) {
                cues.write(cue);
            }
        }
    }
}

/// Система: урон AreaSpell по живым врагам в радиусе (если damage задан)
pub fn resolve_area_spells(
    mut spells: EventReader<AreaSpell>,
    agents: Query<(Entity, &Transform, &Health), (With<Enemy>, Without<Dead>)>,
    mut damage_events: EventWriter<DamageRequest>,
) {
    for spell in spells.read() {
        let Some(damage) = spell.damage else {
            continue;
        };

        for (agent, transform, health) in agents.iter() {
            if health.is_alive() && transform.translation.distance(spell.center) <= spell.radius {
                damage_events.write(DamageRequest::new(
                    spell.wand,
                    agent,
                    damage,
                    DamageKind::Area,
                ));
            }
        }
    }
}
