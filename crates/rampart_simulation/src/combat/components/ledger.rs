//! Hit deduplication ledger.
//!
//! Per-weapon mapping agent → last-hit time. Owned exclusively by one weapon
//! (component on the weapon entity), never shared.

use bevy::prelude::*;
use std::collections::HashMap;

/// Entries older than `STALE_COOLDOWN_MULTIPLIER × attack_cooldown` are pruned.
pub const STALE_COOLDOWN_MULTIPLIER: f32 = 3.0;

/// How often a held weapon prunes its ledger (seconds).
pub const DEFAULT_PRUNE_INTERVAL: f32 = 0.5;

#[derive(Component, Debug, Clone, Default)]
pub struct HitLedger {
    last_hit: HashMap<Entity, f32>,
    next_prune_at: f32,
}

impl HitLedger {
    pub fn len(&self) -> usize {
        self.last_hit.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_hit.is_empty()
    }

    pub fn last_hit(&self, agent: Entity) -> Option<f32> {
        self.last_hit.get(&agent).copied()
    }

    /// `true` while `now - last_hit[agent] < cooldown`.
    pub fn is_cooling(&self, agent: Entity, now: f32, cooldown: f32) -> bool {
        self.last_hit(agent)
            .is_some_and(|last| now - last < cooldown)
    }

    pub fn record(&mut self, agent: Entity, now: f32) {
        self.last_hit.insert(agent, now);
    }

    /// Registers a hit unless the agent is still inside its cooldown window.
    pub fn try_register(&mut self, agent: Entity, now: f32, cooldown: f32) -> bool {
        if self.is_cooling(agent, now, cooldown) {
            return false;
        }
        self.record(agent, now);
        true
    }

    pub fn clear(&mut self) {
        self.last_hit.clear();
    }

    pub fn prune_due(&self, now: f32) -> bool {
        now >= self.next_prune_at
    }

    /// Drops entries for dead/removed agents and entries older than `stale_after`.
    ///
    /// Returns how many entries were removed.
    pub fn prune(
        &mut self,
        now: f32,
        stale_after: f32,
        interval: f32,
        is_live: impl Fn(Entity) -> bool,
    ) -> usize {
        let before = self.last_hit.len();
        self.last_hit
            .retain(|agent, last| is_live(*agent) && now - *last <= stale_after);
        self.next_prune_at = now + interval;
        before - self.last_hit.len()
    }
}
