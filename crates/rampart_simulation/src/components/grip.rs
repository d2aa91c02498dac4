//! Grip state оружия: какими руками держат, two-handed
//!
//! Input boundary: host шлёт абстрактные `GripSignal` (grab/release/activate),
//! привязка к физическим контроллерам — забота адаптера.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    pub fn other(self) -> Self {
        match self {
            Hand::Left => Hand::Right,
            Hand::Right => Hand::Left,
        }
    }
}

/// Grip компонент (на любом оружии: melee, bow, crossbow, wand)
///
/// Первый grab → primary (held). Grab второй рукой пока held → secondary (two-handed).
/// Release primary сбрасывает оба хвата.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct Grip {
    pub primary: Option<Hand>,
    pub secondary: Option<Hand>,
}

/// Результат применения сигнала к Grip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GripChange {
    Grabbed(Hand),
    SecondGrabbed(Hand),
    Released(Hand),
    SecondReleased(Hand),
    Activated,
    /// Сигнал не изменил состояние (повторный grab, release чужой руки, activate без хвата)
    Ignored,
}

impl Grip {
    pub fn held(&self) -> bool {
        self.primary.is_some()
    }

    pub fn two_handed(&self) -> bool {
        self.primary.is_some() && self.secondary.is_some()
    }

    pub fn grab(&mut self, hand: Hand) -> GripChange {
        match (self.primary, self.secondary) {
            (None, _) => {
                self.primary = Some(hand);
                self.secondary = None;
                GripChange::Grabbed(hand)
            }
            (Some(primary), None) if primary != hand => {
                self.secondary = Some(hand);
                GripChange::SecondGrabbed(hand)
            }
            _ => GripChange::Ignored,
        }
    }

    pub fn release(&mut self, hand: Hand) -> GripChange {
        if self.primary == Some(hand) {
            self.primary = None;
            self.secondary = None;
            return GripChange::Released(hand);
        }

        if self.secondary == Some(hand) {
            self.secondary = None;
            return GripChange::SecondReleased(hand);
        }

        GripChange::Ignored
    }

    pub fn activate(&self) -> GripChange {
        if self.held() {
            GripChange::Activated
        } else {
            GripChange::Ignored
        }
    }

    pub fn apply(&mut self, action: GripAction) -> GripChange {
        match action {
            GripAction::Grab(hand) => self.grab(hand),
            GripAction::Release(hand) => self.release(hand),
            GripAction::Activate => self.activate(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GripAction {
    Grab(Hand),
    Release(Hand),
    /// Trigger / special (fire, charge toggle, cast)
    Activate,
}

/// Inbound событие от host input adapter
#[derive(Event, Debug, Clone, Copy)]
pub struct GripSignal {
    pub weapon: Entity,
    pub action: GripAction,
}

impl GripSignal {
    pub fn grab(weapon: Entity, hand: Hand) -> Self {
        Self {
            weapon,
            action: GripAction::Grab(hand),
        }
    }

    pub fn release(weapon: Entity, hand: Hand) -> Self {
        Self {
            weapon,
            action: GripAction::Release(hand),
        }
    }

    pub fn activate(weapon: Entity) -> Self {
        Self {
            weapon,
            action: GripAction::Activate,
        }
    }
}

/// Нормализованное изменение хвата (после apply_grip_signals)
///
/// Подсистемы оружия читают только его: Ignored сюда не попадает.
#[derive(Event, Debug, Clone, Copy)]
pub struct GripChanged {
    pub weapon: Entity,
    pub change: GripChange,
}
