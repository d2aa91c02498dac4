//! Melee combat systems (weapon engine).

use bevy::prelude::*;

use crate::ai::{Enemy, Knockback};
use crate::combat::{
    AreaCenter, ChargeReleased, CombatCue, CueKind, DamageKind, DamageRequest, Dead, HitContext,
    HitLedger, MeleeWeapon, StrikeOutcome, WeaponContact, WeaponStruck, STALE_COOLDOWN_MULTIPLIER,
};
use crate::components::{Grip, GripChange, GripChanged, Health};
use crate::config::CombatSettings;
use crate::effects::StatusEffects;
use crate::DeterministicRng;

/// Живые агенты, по которым может бить оружие
type LiveAgents<'w, 's> =
    Query<'w, 's, (Entity, &'static Transform, &'static Health), (With<Enemy>, Without<Dead>)>;

fn live_agent_position(agents: &LiveAgents, agent: Entity) -> Option<Vec3> {
    agents
        .get(agent)
        .ok()
        .filter(|(_, _, health)| health.is_alive())
        .map(|(_, transform, _)| transform.translation)
}

/// System: grab/release/activate → состояние melee политик.
///
/// - Grab / Release: combo reset, charge cancel
/// - Second grip lost: charge продолжается, теряется только two-handed множитель
/// - Activate: начать charge (только двумя руками) / отпустить → ChargeReleased
pub fn react_to_melee_grip(
    mut changes: EventReader<GripChanged>,
    mut weapons: Query<(&mut MeleeWeapon, &Grip)>,
    mut released: EventWriter<ChargeReleased>,
    time: Res<Time>,
) {
    let now = time.elapsed_secs();

    for event in changes.read() {
        let Ok((mut weapon, grip)) = weapons.get_mut(event.weapon) else {
            continue;
        };

        match event.change {
            GripChange::Grabbed(_) | GripChange::Released(_) => {
                weapon.damage.reset();
            }
            GripChange::Activated => {
                let two_handed = grip.two_handed();
                let Some(gauge) = weapon.damage.gauge_mut() else {
                    continue;
                };

                if gauge.is_charging() {
                    if let Some(ratio) = gauge.release(now) {
                        let radius = gauge.sweep_radius_for(ratio);
                        crate::logger::log(&format!(
                            "🗡️ Charge released (weapon: {:?}, ratio: {:.2}, sweep radius: {:.2})",
                            event.weapon, ratio, radius
                        ));
                        released.write(ChargeReleased {
                            weapon: event.weapon,
                            ratio,
                            radius,
                        });
                    }
                } else if two_handed && gauge.begin(now) {
                    crate::logger::log(&format!("⏳ Charge started (weapon: {:?})", event.weapon));
                }
            }
            GripChange::SecondGrabbed(_) | GripChange::SecondReleased(_) | GripChange::Ignored => {}
        }
    }
}

/// System: per-tick обслуживание оружия (combo window lapse + ledger pruning).
///
/// Pruning — только пока оружие в руках, раз в `ledger_prune_interval`.
pub fn maintain_melee_weapons(
    mut weapons: Query<(Entity, &mut MeleeWeapon, &mut HitLedger, &Grip)>,
    agents: Query<&Health, Without<Dead>>,
    settings: Res<CombatSettings>,
    time: Res<Time>,
) {
    let now = time.elapsed_secs();

    for (entity, mut weapon, mut ledger, grip) in weapons.iter_mut() {
        if weapon.damage.tick(now) {
            crate::logger::log(&format!("🔁 Combo lapsed (weapon: {:?})", entity));
        }

        if !grip.held() || !ledger.prune_due(now) {
            continue;
        }

        let stale_after = weapon.attack_cooldown * STALE_COOLDOWN_MULTIPLIER;
        let removed = ledger.prune(now, stale_after, settings.ledger_prune_interval, |agent| {
            agents.get(agent).map(|health| health.is_alive()).unwrap_or(false)
        });
        if removed > 0 {
            crate::logger::log(&format!(
                "🧹 Pruned {} ledger entries (weapon: {:?}, left: {})",
                removed,
                entity,
                ledger.len()
            ));
        }
    }
}

/// System: WeaponContact / ChargeReleased → strikes.
///
/// Порядок внутри тика = порядок поступления событий.
#[allow(clippy::too_many_arguments)]
pub fn resolve_weapon_contacts(
    mut contacts: EventReader<WeaponContact>,
    mut sweeps: EventReader<ChargeReleased>,
    mut weapons: Query<(&mut MeleeWeapon, &mut HitLedger, &Grip, &Transform)>,
    agents: LiveAgents,
    mut knockbacks: Query<&mut Knockback>,
    mut effects: ResMut<StatusEffects>,
    mut rng: ResMut<DeterministicRng>,
    mut damage_events: EventWriter<DamageRequest>,
    mut struck_events: EventWriter<WeaponStruck>,
    mut cues: EventWriter<CombatCue>,
    time: Res<Time>,
) {
    let now = time.elapsed_secs();

    for contact in contacts.read() {
        let Ok((mut weapon, mut ledger, grip, transform)) = weapons.get_mut(contact.weapon) else {
            crate::logger::log(&format!(
                "⚠️ WeaponContact from unknown weapon {:?}",
                contact.weapon
            ));
            continue;
        };

        // Оружие в покое инертно; во время charge контакты игнорируются
        if !grip.held() || weapon.damage.suppresses_contact() {
            continue;
        }

        let Some(agent_position) = live_agent_position(&agents, contact.agent) else {
            continue;
        };

        let ctx = HitContext {
            now,
            two_handed: grip.two_handed(),
            charge_ratio: 0.0,
        };
        let weapon_position = transform.translation;

        let Some(outcome) = weapon.strike(
            &mut ledger,
            &ctx,
            weapon_position,
            contact.agent,
            agent_position,
            &mut rng.rng,
        ) else {
            continue;
        };

        apply_strike(
            contact.weapon,
            &weapon,
            &outcome,
            contact.point,
            now,
            &mut knockbacks,
            &mut effects,
            &mut damage_events,
            &mut struck_events,
            &mut cues,
        );

        // Area: вторичный урон вокруг агента / точки контакта
        if let Some(area) = weapon.area.filter(|area| area.enabled) {
            let center = match area.center {
                AreaCenter::StruckAgent => agent_position,
                AreaCenter::ContactPoint => contact.point,
            };
            let candidates = agents
                .iter()
                .filter(|(_, _, health)| health.is_alive())
                .map(|(entity, transform, _)| (entity, transform.translation));

            let splashes = area.splash(weapon.base_damage, center, contact.agent, candidates);
            for (splashed, damage) in splashes {
                if !ledger.try_register(splashed, now, weapon.attack_cooldown) {
                    continue;
                }
                damage_events.write(DamageRequest::new(
                    contact.weapon,
                    splashed,
                    damage as f32,
                    DamageKind::Area,
                ));
            }
        }
    }

    for sweep in sweeps.read() {
        let Ok((mut weapon, mut ledger, grip, transform)) = weapons.get_mut(sweep.weapon) else {
            continue;
        };
        if !grip.held() {
            continue;
        }

        let ctx = HitContext {
            now,
            two_handed: grip.two_handed(),
            charge_ratio: sweep.ratio,
        };
        let weapon_position = transform.translation;

        if let Some(cue) = CombatCue::configured(
            CueKind::UseSound,
            weapon.cues.use_sound.as_ref(),
            weapon_position,
        ) {
            cues.write(cue);
        }

        let in_reach: Vec<(Entity, Vec3)> = agents
            .iter()
            .filter(|(_, transform, health)| {
                health.is_alive() && transform.translation.distance(weapon_position) <= sweep.radius
            })
            .map(|(entity, transform, _)| (entity, transform.translation))
            .collect();

        for (agent, agent_position) in in_reach {
            let Some(outcome) = weapon.strike(
                &mut ledger,
                &ctx,
                weapon_position,
                agent,
                agent_position,
                &mut rng.rng,
            ) else {
                continue;
            };

            apply_strike(
                sweep.weapon,
                &weapon,
                &outcome,
                agent_position,
                now,
                &mut knockbacks,
                &mut effects,
                &mut damage_events,
                &mut struck_events,
                &mut cues,
            );
        }
    }
}

/// Применяет принятый strike: DamageRequest, статусы, импульс, cues.
#[allow(clippy::too_many_arguments)]
fn apply_strike(
    weapon_entity: Entity,
    weapon: &MeleeWeapon,
    outcome: &StrikeOutcome,
    point: Vec3,
    now: f32,
    knockbacks: &mut Query<&mut Knockback>,
    effects: &mut StatusEffects,
    damage_events: &mut EventWriter<DamageRequest>,
    struck_events: &mut EventWriter<WeaponStruck>,
    cues: &mut EventWriter<CombatCue>,
) {
    damage_events.write(DamageRequest::new(
        weapon_entity,
        outcome.agent,
        outcome.roll.damage as f32,
        DamageKind::Strike,
    ));
    struck_events.write(WeaponStruck {
        weapon: weapon_entity,
        agent: outcome.agent,
        damage: outcome.roll.damage,
        critical: outcome.roll.critical,
    });

    crate::logger::log(&format!(
        "⚔️ {:?} struck {:?} for {}{}",
        weapon.archetype,
        outcome.agent,
        outcome.roll.damage,
        if outcome.roll.critical { " (CRIT)" } else { "" }
    ));

    for spec in &outcome.statuses {
        let applied = effects.apply(*spec, weapon_entity, outcome.agent, now);
        if let Some(previous) = applied.superseded {
            crate::logger::log(&format!(
                "♻️ {:?} refreshed on {:?} (task {} → {})",
                previous.kind,
                outcome.agent,
                previous.handle.id(),
                applied.handle.id()
            ));
        }
        if let Some(cue) = CombatCue::configured(
            CueKind::StatusVisual,
            weapon.cues.status_visual.as_ref(),
            point,
        ) {
            cues.write(cue.following(outcome.agent));
        }
    }

    if outcome.impulse != Vec3::ZERO {
        if let Ok(mut knockback) = knockbacks.get_mut(outcome.agent) {
            knockback.apply_impulse(outcome.impulse);
        }
    }

    let cue_list = [
        (CueKind::HitEffect, weapon.cues.hit_effect.as_ref()),
        (CueKind::HitSound, weapon.cues.hit_sound.as_ref()),
        (
            CueKind::CriticalHit,
            weapon.cues.critical_effect.as_ref().filter(|_| outcome.roll.critical),
        ),
    ];
    for (kind, asset) in cue_list {
        if let Some(cue) = CombatCue::configured(kind, asset, point) {
            cues.write(cue);
        }
    }
}
