use serde::{Deserialize, Serialize};

/// Logical state of a switch
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SwitchState {
    #[default]
    Off,
    /// Press debounced, waiting for the start delay
    TurningOn,
    /// On, button held or momentary
    On,
    /// On, button released
    Latched,
    /// Was on, voided while held. Cleared by release
    Voided,
}

impl SwitchState {
    pub fn is_on(&self) -> bool {
        matches!(self, SwitchState::On | SwitchState::Latched)
    }
}

/// Snapshot of every output of a switch
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SwitchOutputs {
    pub is_on: bool,
    pub is_enabled: bool,
    pub pilot_on: bool,
    pub warning_on: bool,
    pub is_voided: bool,
    pub is_on_secondary: bool,
    pub is_combo_on: bool,
    pub level: u16,
}

const IS_ON: u32 = 1 << 0;
const IS_ENABLED: u32 = 1 << 1;
const PILOT_ON: u32 = 1 << 2;
const WARNING_ON: u32 = 1 << 3;
const IS_VOIDED: u32 = 1 << 4;
const IS_ON_SECONDARY: u32 = 1 << 5;
const IS_COMBO_ON: u32 = 1 << 6;
const LEVEL_SHIFT: u32 = 16;

impl SwitchOutputs {
    /// Pack into a notification word: flags in the low bits, level in the high half
    pub fn pack(&self) -> u32 {
        let flags = [
            (self.is_on, IS_ON),
            (self.is_enabled, IS_ENABLED),
            (self.pilot_on, PILOT_ON),
            (self.warning_on, WARNING_ON),
            (self.is_voided, IS_VOIDED),
            (self.is_on_secondary, IS_ON_SECONDARY),
            (self.is_combo_on, IS_COMBO_ON),
        ];
        flags
            .iter()
            .filter(|(set, _)| *set)
            .fold((self.level as u32) << LEVEL_SHIFT, |word, (_, bit)| word | bit)
    }

    pub fn unpack(word: u32) -> Self {
        Self {
            is_on: word & IS_ON != 0,
            is_enabled: word & IS_ENABLED != 0,
            pilot_on: word & PILOT_ON != 0,
            warning_on: word & WARNING_ON != 0,
            is_voided: word & IS_VOIDED != 0,
            is_on_secondary: word & IS_ON_SECONDARY != 0,
            is_combo_on: word & IS_COMBO_ON != 0,
            level: (word >> LEVEL_SHIFT) as u16,
        }
    }
}
