//! Melee weapon policies.
//!
//! Damage policy and effect policy vary orthogonally per archetype:
//! `MeleeWeapon` composes one `DamagePolicy`, any number of `EffectPolicy`
//! and an optional `AreaPolicy`.

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::effects::EffectSpec;

// ============================================================================
// Hit context
// ============================================================================

/// Snapshot of weapon state at the moment of a strike.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HitContext {
    pub now: f32,
    pub two_handed: bool,
    /// Fraction of the charge window held before release (0 outside a charged sweep).
    pub charge_ratio: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitRoll {
    pub damage: u32,
    pub critical: bool,
}

impl HitRoll {
    fn plain(damage: u32) -> Self {
        Self {
            damage,
            critical: false,
        }
    }
}

fn scaled(base: u32, factor: f32) -> u32 {
    (base as f32 * factor).round().max(0.0) as u32
}

// ============================================================================
// Damage policies
// ============================================================================

/// Windowed combo counter.
///
/// Damage uses the tier reached *before* the current hit is counted.
/// Tier 0 = no active combo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComboCounter {
    pub window: f32,
    pub multiplier: f32,
    pub max_tier: u32,
    #[serde(skip)]
    pub tier: u32,
    #[serde(skip)]
    pub last_hit_at: Option<f32>,
}

impl ComboCounter {
    pub fn new(window: f32, multiplier: f32, max_tier: u32) -> Self {
        Self {
            window,
            multiplier,
            max_tier,
            tier: 0,
            last_hit_at: None,
        }
    }

    /// `round(base × (1 + tier·0.1·multiplier))`
    pub fn damage(&self, base: u32) -> u32 {
        scaled(base, 1.0 + self.tier as f32 * 0.1 * self.multiplier)
    }

    /// Hit inside the window → tier + 1 (capped), otherwise restart at 1.
    pub fn register_hit(&mut self, now: f32) {
        self.tier = match self.last_hit_at {
            Some(last) if now - last <= self.window => (self.tier + 1).min(self.max_tier),
            _ => 1,
        };
        self.last_hit_at = Some(now);
    }

    /// Drops the combo once the window lapsed. Returns `true` if it was reset.
    pub fn lapse(&mut self, now: f32) -> bool {
        match self.last_hit_at {
            Some(last) if self.tier > 0 && now - last > self.window => {
                self.tier = 0;
                true
            }
            _ => false,
        }
    }

    pub fn reset(&mut self) {
        self.tier = 0;
        self.last_hit_at = None;
    }
}

/// Charge window of a two-handed weapon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeGauge {
    pub charge_time: f32,
    pub multiplier: f32,
    pub two_handed_multiplier: f32,
    /// Sweep radius at full charge (scaled by `0.5 + 0.5 × ratio`).
    pub sweep_radius: f32,
    #[serde(skip)]
    pub charging_since: Option<f32>,
}

impl ChargeGauge {
    pub fn new(
        charge_time: f32,
        multiplier: f32,
        two_handed_multiplier: f32,
        sweep_radius: f32,
    ) -> Self {
        Self {
            charge_time,
            multiplier,
            two_handed_multiplier,
            sweep_radius,
            charging_since: None,
        }
    }

    pub fn is_charging(&self) -> bool {
        self.charging_since.is_some()
    }

    pub fn begin(&mut self, now: f32) -> bool {
        if self.is_charging() {
            return false;
        }
        self.charging_since = Some(now);
        true
    }

    pub fn ratio_at(&self, now: f32) -> f32 {
        match self.charging_since {
            Some(since) if self.charge_time > 0.0 => {
                ((now - since) / self.charge_time).clamp(0.0, 1.0)
            }
            Some(_) => 1.0,
            None => 0.0,
        }
    }

    /// Ends the charge, returning the reached ratio.
    pub fn release(&mut self, now: f32) -> Option<f32> {
        let ratio = self.ratio_at(now);
        self.charging_since.take().map(|_| ratio)
    }

    pub fn cancel(&mut self) {
        self.charging_since = None;
    }

    pub fn sweep_radius_for(&self, ratio: f32) -> f32 {
        self.sweep_radius * (0.5 + 0.5 * ratio.clamp(0.0, 1.0))
    }

    pub fn damage(&self, base: u32, ctx: &HitContext) -> u32 {
        let hands = if ctx.two_handed {
            self.two_handed_multiplier
        } else {
            1.0
        };
        let charge = 1.0 + ctx.charge_ratio.clamp(0.0, 1.0) * (self.multiplier - 1.0);
        scaled(base, hands * charge)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DamagePolicy {
    Fixed,
    Critical { chance: f32, multiplier: f32 },
    Combo(ComboCounter),
    Charge(ChargeGauge),
    TwoHanded { multiplier: f32 },
}

impl Default for DamagePolicy {
    fn default() -> Self {
        DamagePolicy::Fixed
    }
}

impl DamagePolicy {
    /// Computes strike damage. Only `Critical` draws from the RNG.
    pub fn roll(&self, base: u32, ctx: &HitContext, rng: &mut impl Rng) -> HitRoll {
        match self {
            DamagePolicy::Fixed => HitRoll::plain(base),
            DamagePolicy::Critical { chance, multiplier } => {
                if rng.gen::<f32>() < *chance {
                    HitRoll {
                        damage: scaled(base, *multiplier),
                        critical: true,
                    }
                } else {
                    HitRoll::plain(base)
                }
            }
            DamagePolicy::Combo(combo) => HitRoll::plain(combo.damage(base)),
            DamagePolicy::Charge(gauge) => HitRoll::plain(gauge.damage(base, ctx)),
            DamagePolicy::TwoHanded { multiplier } => {
                let factor = if ctx.two_handed { *multiplier } else { 1.0 };
                HitRoll::plain(scaled(base, factor))
            }
        }
    }

    /// Bookkeeping after a hit passed dedup.
    pub fn register_hit(&mut self, now: f32) {
        if let DamagePolicy::Combo(combo) = self {
            combo.register_hit(now);
        }
    }

    /// Per-tick maintenance (combo window lapse).
    pub fn tick(&mut self, now: f32) -> bool {
        match self {
            DamagePolicy::Combo(combo) => combo.lapse(now),
            _ => false,
        }
    }

    /// Grab/release resets combo and cancels a running charge.
    pub fn reset(&mut self) {
        match self {
            DamagePolicy::Combo(combo) => combo.reset(),
            DamagePolicy::Charge(gauge) => gauge.cancel(),
            _ => {}
        }
    }

    /// Contacts are ignored while a charge is being held.
    pub fn suppresses_contact(&self) -> bool {
        matches!(self, DamagePolicy::Charge(gauge) if gauge.is_charging())
    }

    pub fn gauge_mut(&mut self) -> Option<&mut ChargeGauge> {
        match self {
            DamagePolicy::Charge(gauge) => Some(gauge),
            _ => None,
        }
    }

    pub fn combo_tier(&self) -> Option<u32> {
        match self {
            DamagePolicy::Combo(combo) => Some(combo.tier),
            _ => None,
        }
    }
}

// ============================================================================
// Effect policies
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum KnockbackStyle {
    /// Away from the weapon, vertical component replaced by `upward_bias`.
    Push { upward_bias: f32 },
    /// Mostly up: `Y + lateral × away`.
    Launch { lateral: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EffectPolicy {
    /// `speed_factor: None` keeps the target's speed (stun timer + visual only).
    Stun { duration: f32, speed_factor: Option<f32> },
    Bleed {
        damage_per_tick: f32,
        duration: f32,
        tick_interval: f32,
    },
    /// Impulse magnitude `force + charge_bonus × charge_ratio`.
    Knockback {
        force: f32,
        charge_bonus: f32,
        style: KnockbackStyle,
    },
}

impl EffectPolicy {
    /// Status part of the effect (scheduled through `StatusEffects`).
    pub fn status(&self) -> Option<EffectSpec> {
        match *self {
            EffectPolicy::Stun {
                duration,
                speed_factor,
            } => Some(EffectSpec::Stun {
                duration,
                speed_factor,
            }),
            EffectPolicy::Bleed {
                damage_per_tick,
                duration,
                tick_interval,
            } => Some(EffectSpec::Bleed {
                damage_per_tick,
                duration,
                tick_interval,
            }),
            EffectPolicy::Knockback { .. } => None,
        }
    }

    /// Instantaneous impulse part of the effect.
    pub fn impulse(
        &self,
        weapon_position: Vec3,
        agent_position: Vec3,
        charge_ratio: f32,
    ) -> Option<Vec3> {
        match *self {
            EffectPolicy::Knockback {
                force,
                charge_bonus,
                style,
            } => Some(knockback_impulse(
                style,
                force + charge_bonus * charge_ratio.clamp(0.0, 1.0),
                weapon_position,
                agent_position,
            )),
            _ => None,
        }
    }
}

pub fn knockback_impulse(style: KnockbackStyle, force: f32, from: Vec3, to: Vec3) -> Vec3 {
    let away = (to - from).normalize_or_zero();
    let direction = match style {
        KnockbackStyle::Push { upward_bias } => Vec3::new(away.x, upward_bias, away.z),
        KnockbackStyle::Launch { lateral } => Vec3::Y + away * lateral,
    };
    direction * force
}

// ============================================================================
// Area policy (cleave / falloff)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AreaCenter {
    /// Around the struck agent.
    StruckAgent,
    /// Around the contact point reported by the host.
    ContactPoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AreaFalloff {
    /// Integer share: `floor(base × fraction)` (15 × 0.5 → 7).
    Flat { fraction: f32 },
    /// `max(min_fraction, 1 − d/r)`
    Linear { min_fraction: f32 },
}

/// Secondary damage around a primary hit.
///
/// `enabled: false` (baseline) produces zero additional damage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaPolicy {
    pub radius: f32,
    pub falloff: AreaFalloff,
    pub center: AreaCenter,
    pub enabled: bool,
}

impl AreaPolicy {
    pub fn factor_at(&self, distance: f32) -> f32 {
        match self.falloff {
            AreaFalloff::Flat { fraction } => fraction,
            AreaFalloff::Linear { min_fraction } => {
                if self.radius <= 0.0 {
                    return min_fraction;
                }
                (1.0 - distance / self.radius).max(min_fraction)
            }
        }
    }

    /// Secondary damage for an agent `distance` away from the center.
    pub fn damage_at(&self, base: u32, distance: f32) -> u32 {
        match self.falloff {
            AreaFalloff::Flat { fraction } => (base as f32 * fraction).floor().max(0.0) as u32,
            AreaFalloff::Linear { .. } => scaled(base, self.factor_at(distance)),
        }
    }

    /// Splash targets: `(agent, damage)` for every live candidate within radius.
    ///
    /// Candidates are `(entity, position)`; the primary target is excluded.
    pub fn splash(
        &self,
        base: u32,
        center: Vec3,
        primary: Entity,
        candidates: impl IntoIterator<Item = (Entity, Vec3)>,
    ) -> Vec<(Entity, u32)> {
        if !self.enabled {
            return Vec::new();
        }

        candidates
            .into_iter()
            .filter(|(entity, _)| *entity != primary)
            .filter_map(|(entity, position)| {
                let distance = center.distance(position);
                if distance > self.radius {
                    return None;
                }
                let damage = self.damage_at(base, distance);
                (damage > 0).then_some((entity, damage))
            })
            .collect()
    }
}
