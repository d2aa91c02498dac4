//! Grip input boundary: GripSignal (host) → Grip state → GripChanged.

use bevy::prelude::*;

use crate::components::{Grip, GripChange, GripChanged, GripSignal};

/// Система: применяет grab/release/activate к состоянию хвата
///
/// Ignored переходы (повторный grab той же рукой, activate без хвата) не
/// порождают GripChanged.
pub fn apply_grip_signals(
    mut signals: EventReader<GripSignal>,
    mut grips: Query<&mut Grip>,
    mut changed_events: EventWriter<GripChanged>,
) {
    for signal in signals.read() {
        let Ok(mut grip) = grips.get_mut(signal.weapon) else {
            crate::logger::log_warning(&format!(
                "⚠️ GripSignal for unknown weapon {:?}",
                signal.weapon
            ));
            continue;
        };

        let change = grip.apply(signal.action);
        if change == GripChange::Ignored {
            continue;
        }

        crate::logger::log(&format!("✋ {:?}: {:?}", signal.weapon, change));
        changed_events.write(GripChanged {
            weapon: signal.weapon,
            change,
        });
    }
}
