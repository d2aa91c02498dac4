//! MeleeWeapon component + archetype presets.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::ledger::HitLedger;
use super::policy::*;
use crate::components::Grip;
use crate::effects::EffectSource;

/// Archetype tag (logs, snapshots, host prefab selection).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
pub enum MeleeArchetype {
    Sword,
    Spear,
    Axe,
    Dagger,
    CurvedDagger,
    Mace,
    OneHandedSword,
    TwoHandedAxe,
    TwoHandedHammer,
    TwoHandedSword,
    Custom,
}

/// Optional presentation assets. Missing entries skip the cue, never the hit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeaponCues {
    pub hit_effect: Option<String>,
    pub hit_sound: Option<String>,
    pub use_sound: Option<String>,
    pub critical_effect: Option<String>,
    pub status_visual: Option<String>,
}

/// Melee weapon (shared contract for all melee archetypes).
///
/// Contact → dedup ledger → `damage.roll` → DamageRequest → effects → area.
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[require(Transform, Grip, HitLedger, EffectSource)]
pub struct MeleeWeapon {
    pub archetype: MeleeArchetype,
    pub base_damage: u32,
    /// Per-agent dedup window (seconds).
    pub attack_cooldown: f32,
    /// Weapon-wide throttle: at most one strike per interval on any agent.
    pub strike_interval: Option<f32>,
    pub damage: DamagePolicy,
    pub effects: Vec<EffectPolicy>,
    pub area: Option<AreaPolicy>,
    pub cues: WeaponCues,
    #[serde(skip)]
    pub last_strike_at: Option<f32>,
}

impl Default for MeleeWeapon {
    fn default() -> Self {
        Self::sword()
    }
}

impl MeleeWeapon {
    pub const DEFAULT_BASE_DAMAGE: u32 = 10;
    pub const DEFAULT_ATTACK_COOLDOWN: f32 = 0.3;

    fn preset(archetype: MeleeArchetype, damage: DamagePolicy, effects: Vec<EffectPolicy>) -> Self {
        Self {
            archetype,
            base_damage: Self::DEFAULT_BASE_DAMAGE,
            attack_cooldown: Self::DEFAULT_ATTACK_COOLDOWN,
            strike_interval: None,
            damage,
            effects,
            area: None,
            cues: WeaponCues::default(),
            last_strike_at: None,
        }
    }

    /// Sword: fixed base damage, no effects.
    pub fn sword() -> Self {
        Self::preset(MeleeArchetype::Sword, DamagePolicy::Fixed, Vec::new())
    }

    pub fn spear() -> Self {
        Self::preset(MeleeArchetype::Spear, DamagePolicy::Fixed, Vec::new())
    }

    /// Axe: 2 s stun (speed reduction off).
    pub fn axe() -> Self {
        Self::preset(
            MeleeArchetype::Axe,
            DamagePolicy::Fixed,
            vec![EffectPolicy::Stun {
                duration: 2.0,
                speed_factor: None,
            }],
        )
    }

    /// Dagger: 15% crit ×2, throttled to one strike per 0.2 s.
    pub fn dagger() -> Self {
        Self {
            strike_interval: Some(0.2),
            ..Self::preset(
                MeleeArchetype::Dagger,
                DamagePolicy::Critical {
                    chance: 0.15,
                    multiplier: 2.0,
                },
                Vec::new(),
            )
        }
    }

    /// Curved dagger: bleed 2/tick, 1 s rate, 5 s.
    pub fn curved_dagger() -> Self {
        Self {
            strike_interval: Some(0.3),
            ..Self::preset(
                MeleeArchetype::CurvedDagger,
                DamagePolicy::Fixed,
                vec![EffectPolicy::Bleed {
                    damage_per_tick: 2.0,
                    duration: 5.0,
                    tick_interval: 1.0,
                }],
            )
        }
    }

    /// Mace: knockback 5 away from the head.
    pub fn mace() -> Self {
        Self::preset(
            MeleeArchetype::Mace,
            DamagePolicy::Fixed,
            vec![EffectPolicy::Knockback {
                force: 5.0,
                charge_bonus: 0.0,
                style: KnockbackStyle::Push { upward_bias: 0.1 },
            }],
        )
    }

    /// One-handed sword: combo window 0.8 s, ×1.2, max tier 3.
    pub fn one_handed_sword() -> Self {
        Self::preset(
            MeleeArchetype::OneHandedSword,
            DamagePolicy::Combo(ComboCounter::new(0.8, 1.2, 3)),
            Vec::new(),
        )
    }

    /// Two-handed axe: 3.5 s stun + cleave (disabled).
    pub fn two_handed_axe() -> Self {
        Self {
            area: Some(AreaPolicy {
                radius: 1.5,
                falloff: AreaFalloff::Flat { fraction: 0.5 },
                center: AreaCenter::StruckAgent,
                enabled: false,
            }),
            ..Self::preset(
                MeleeArchetype::TwoHandedAxe,
                DamagePolicy::Fixed,
                vec![EffectPolicy::Stun {
                    duration: 3.5,
                    speed_factor: None,
                }],
            )
        }
    }

    /// Two-handed hammer: knock-up 5 + stun 2.5 s + ground smash falloff (disabled).
    pub fn two_handed_hammer() -> Self {
        Self {
            area: Some(AreaPolicy {
                radius: 2.5,
                falloff: AreaFalloff::Linear { min_fraction: 0.3 },
                center: AreaCenter::ContactPoint,
                enabled: false,
            }),
            ..Self::preset(
                MeleeArchetype::TwoHandedHammer,
                DamagePolicy::Fixed,
                vec![
                    EffectPolicy::Knockback {
                        force: 5.0,
                        charge_bonus: 0.0,
                        style: KnockbackStyle::Launch { lateral: 0.5 },
                    },
                    EffectPolicy::Stun {
                        duration: 2.5,
                        speed_factor: None,
                    },
                ],
            )
        }
    }

    /// Two-handed sword: charge 1.5 s ×2, two-handed ×1.5, sweep 1.8, knockback 3 + 4·ratio.
    pub fn two_handed_sword() -> Self {
        Self::preset(
            MeleeArchetype::TwoHandedSword,
            DamagePolicy::Charge(ChargeGauge::new(1.5, 2.0, 1.5, 1.8)),
            vec![EffectPolicy::Knockback {
                force: 3.0,
                charge_bonus: 4.0,
                style: KnockbackStyle::Push { upward_bias: 0.1 },
            }],
        )
    }

    pub fn with_base_damage(mut self, base_damage: u32) -> Self {
        self.base_damage = base_damage;
        self
    }

    pub fn with_cooldown(mut self, attack_cooldown: f32) -> Self {
        self.attack_cooldown = attack_cooldown;
        self
    }

    pub fn with_cues(mut self, cues: WeaponCues) -> Self {
        self.cues = cues;
        self
    }

    /// Enables the archetype's area policy (extension point, off by default).
    pub fn with_area_enabled(mut self) -> Self {
        if let Some(area) = self.area.as_mut() {
            area.enabled = true;
        }
        self
    }

    /// Sets the stun speed factor on every stun effect of this weapon.
    pub fn with_stun_slowdown(mut self, factor: f32) -> Self {
        for effect in self.effects.iter_mut() {
            if let EffectPolicy::Stun { speed_factor, .. } = effect {
                *speed_factor = Some(factor);
            }
        }
        self
    }

    /// Weapon-wide strike throttle.
    pub fn strike_throttled(&self, now: f32) -> bool {
        match (self.strike_interval, self.last_strike_at) {
            (Some(interval), Some(last)) => now - last < interval,
            _ => false,
        }
    }
}

/// Result of a strike that passed dedup.
#[derive(Debug, Clone, PartialEq)]
pub struct StrikeOutcome {
    pub agent: Entity,
    pub roll: HitRoll,
    pub statuses: Vec<crate::effects::EffectSpec>,
    /// Sum of knockback impulses (zero when the weapon has none).
    pub impulse: Vec3,
}

impl MeleeWeapon {
    /// onContact core: throttle → ledger → damage → effects.
    ///
    /// Liveness and held-state are checked by the caller. `None` means the
    /// contact was silently rejected (cooldown window or strike throttle).
    pub fn strike(
        &mut self,
        ledger: &mut HitLedger,
        ctx: &HitContext,
        weapon_position: Vec3,
        agent: Entity,
        agent_position: Vec3,
        rng: &mut impl rand::Rng,
    ) -> Option<StrikeOutcome> {
        if self.strike_throttled(ctx.now) {
            return None;
        }
        if !ledger.try_register(agent, ctx.now, self.attack_cooldown) {
            return None;
        }

        let roll = self.damage.roll(self.base_damage, ctx, rng);
        self.damage.register_hit(ctx.now);
        self.last_strike_at = Some(ctx.now);

        let statuses = self.effects.iter().filter_map(EffectPolicy::status).collect();
        let impulse = self
            .effects
            .iter()
            .filter_map(|effect| effect.impulse(weapon_position, agent_position, ctx.charge_ratio))
            .fold(Vec3::ZERO, |acc, impulse| acc + impulse);

        Some(StrikeOutcome {
            agent,
            roll,
            statuses,
            impulse,
        })
    }
}
