//! Switch notifications.
//!
//! Every observable transition of a [`crate::Switch`] is reported synchronously, from
//! inside `update` or the operation that caused it, to the switch's [`SwitchHooks`].

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Sender;
use serde::{Deserialize, Serialize};

use crate::sequence::{PressKind, PressPattern};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SwitchEvent {
    /// Main output turned on
    TurnedOn,
    /// Button released, main output stays on
    Latched,
    /// Main output turned off
    TurnedOff,
    /// On switch moved to voided
    Voided,
    /// Voided switch released
    Unvoided,
    WarningOn,
    WarningOff,
    PilotOn,
    PilotOff,
    SecondaryOn,
    SecondaryOff,
    ComboOn,
    ComboOff,
    /// New slider level
    LevelChanged(u16),
    /// A press of a double-action switch was classified, with the sequence so far
    Press(PressKind, PressPattern),
}

impl SwitchEvent {
    /// Events that change the main state of the switch
    pub fn is_primary(&self) -> bool {
        matches!(
            self,
            SwitchEvent::TurnedOn
                | SwitchEvent::Latched
                | SwitchEvent::TurnedOff
                | SwitchEvent::Voided
                | SwitchEvent::Unvoided
        )
    }
}

/// Receiver of switch notifications
pub trait SwitchHooks {
    fn on_event(&mut self, event: SwitchEvent);
}

impl SwitchHooks for () {
    fn on_event(&mut self, _event: SwitchEvent) {}
}

impl<T: SwitchHooks + ?Sized> SwitchHooks for &mut T {
    fn on_event(&mut self, event: SwitchEvent) {
        (**self).on_event(event)
    }
}

/// Function pointer hooks, one per notification
#[derive(Clone, Copy, Debug, Default)]
pub struct Callbacks {
    pub on_turn_on: Option<fn()>,
    pub on_latched: Option<fn()>,
    pub on_turn_off: Option<fn()>,
    pub on_voided: Option<fn()>,
    pub on_unvoided: Option<fn()>,
    pub on_warning_on: Option<fn()>,
    pub on_warning_off: Option<fn()>,
    pub on_pilot_on: Option<fn()>,
    pub on_pilot_off: Option<fn()>,
    pub on_secondary_on: Option<fn()>,
    pub on_secondary_off: Option<fn()>,
    pub on_combo_on: Option<fn()>,
    pub on_combo_off: Option<fn()>,
    pub on_level_changed: Option<fn(u16)>,
    pub on_press: Option<fn(PressKind, PressPattern)>,
    /// Called for every event, after the specific callback
    pub on_event: Option<fn(SwitchEvent)>,
}

impl SwitchHooks for Callbacks {
    fn on_event(&mut self, event: SwitchEvent) {
        let specific = match event {
            SwitchEvent::TurnedOn => self.on_turn_on,
            SwitchEvent::Latched => self.on_latched,
            SwitchEvent::TurnedOff => self.on_turn_off,
            SwitchEvent::Voided => self.on_voided,
            SwitchEvent::Unvoided => self.on_unvoided,
            SwitchEvent::WarningOn => self.on_warning_on,
            SwitchEvent::WarningOff => self.on_warning_off,
            SwitchEvent::PilotOn => self.on_pilot_on,
            SwitchEvent::PilotOff => self.on_pilot_off,
            SwitchEvent::SecondaryOn => self.on_secondary_on,
            SwitchEvent::SecondaryOff => self.on_secondary_off,
            SwitchEvent::ComboOn => self.on_combo_on,
            SwitchEvent::ComboOff => self.on_combo_off,
            SwitchEvent::LevelChanged(level) => {
                if let Some(f) = self.on_level_changed {
                    f(level);
                }
                None
            }
            SwitchEvent::Press(kind, pattern) => {
                if let Some(f) = self.on_press {
                    f(kind, pattern);
                }
                None
            }
        };
        if let Some(f) = specific {
            f();
        }
        if let Some(f) = self.on_event {
            f(event);
        }
    }
}

/// Forward events to a channel. Hooks can't block, so events are dropped when the channel is full.
impl<M: RawMutex, const N: usize> SwitchHooks for Sender<'_, M, SwitchEvent, N> {
    fn on_event(&mut self, event: SwitchEvent) {
        if self.try_send(event).is_err() {
            warn!("Switch event channel full, dropping {:?}", event);
        }
    }
}
