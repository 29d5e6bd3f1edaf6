//! Switch configuration.
//!
//! A [`SwitchConfig`] is a plain value: build it with struct literals or one of the
//! preset constructors, then hand it to [`crate::Switch::new`], which validates it once.
//!
//! ```ignore
//! let config = SwitchConfig::timed(Duration::from_secs(30)).with_debounce(Duration::from_millis(10));
//! ```

use embassy_time::Duration;

pub use crate::slider::SliderConfig;

/// Default debounce window
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(20);
/// Default long press threshold of double-action switches
pub const DEFAULT_LONG_PRESS: Duration = Duration::from_millis(2000);

/// Configuration of a single switch
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SwitchConfig {
    /// Minimum time the raw signal has to be stable
    pub debounce: Duration,
    /// Extra hold time after debounce before the switch turns on
    pub delay: Duration,
    /// What happens when the button is released
    pub latch: LatchMode,
    /// Forced turn-off after a fixed time on
    pub service: Option<ServiceConfig>,
    /// Condition moving an on switch to voided, momentary switches only
    pub voiding: Option<VoidCondition>,
}

impl Default for SwitchConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            delay: Duration::from_millis(0),
            latch: LatchMode::Momentary,
            service: None,
            voiding: None,
        }
    }
}

/// Release behavior
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LatchMode {
    /// On while held
    Momentary,
    /// Stays on after release, until unlatched or the service timer expires
    Latched,
    /// Each new press flips the output
    Toggle,
    /// Latched, unlatched by an external signal level
    External {
        /// Turn off as soon as the signal goes high, otherwise when it goes low again
        turn_off_asap: bool,
    },
    /// Latched on short press, secondary behavior on long press
    DoubleAction(DoubleActionConfig),
}

impl LatchMode {
    pub fn is_latching(&self) -> bool {
        !matches!(self, LatchMode::Momentary)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServiceConfig {
    /// Time the switch stays on
    pub on_duration: Duration,
    /// A new press while on restarts the timer
    pub resettable: bool,
    /// Warning and pilot outputs
    pub hint: Option<HintConfig>,
}

impl ServiceConfig {
    pub fn new(on_duration: Duration) -> Self {
        Self {
            on_duration,
            resettable: false,
            hint: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HintConfig {
    /// The warning output is on for this long before the service timer expires
    pub warning_lead: Duration,
    /// Keep the pilot output on while the switch is off
    pub keep_pilot: bool,
}

impl HintConfig {
    /// Warning lead as a percentage of `on_duration`
    pub fn from_percentage(on_duration: Duration, percentage: u8, keep_pilot: bool) -> Result<Self, ConfigError> {
        if percentage > 100 {
            return Err(ConfigError::InvalidWarningPercentage(percentage));
        }
        let lead = on_duration
            .as_ticks()
            .checked_mul(percentage as u64)
            .ok_or(ConfigError::DurationOverflow)?;
        Ok(Self {
            warning_lead: Duration::from_ticks(lead / 100),
            keep_pilot,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DoubleActionConfig {
    /// Time past qualification after which a held press is long
    pub long_press: Duration,
    /// Max gap between a short press and the next long press for a combo.
    /// `None` disables sequences
    pub sequence_window: Option<Duration>,
    pub secondary: SecondaryMode,
}

impl Default for DoubleActionConfig {
    fn default() -> Self {
        Self {
            long_press: DEFAULT_LONG_PRESS,
            sequence_window: None,
            secondary: SecondaryMode::Momentary,
        }
    }
}

/// Behavior of a long press
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SecondaryMode {
    /// Secondary output on while the long press is held
    Momentary,
    /// Level moving while the long press is held
    Slider(SliderConfig),
}

/// Condition that voids an on switch
#[derive(Clone, Copy, Debug)]
pub enum VoidCondition {
    /// Voided as soon as the function returns `true`
    Predicate(fn() -> bool),
    /// Voided on [`crate::Switch::request_void`]
    External,
    /// Voided after being on for this long
    After(Duration),
    /// Voided right after turning on, then ignores the button until rearmed
    SingleService,
}

#[cfg(feature = "defmt")]
impl defmt::Format for VoidCondition {
    fn format(&self, f: defmt::Formatter) {
        match self {
            VoidCondition::Predicate(_) => defmt::write!(f, "Predicate"),
            VoidCondition::External => defmt::write!(f, "External"),
            VoidCondition::After(d) => defmt::write!(f, "After({})", d),
            VoidCondition::SingleService => defmt::write!(f, "SingleService"),
        }
    }
}

/// Invalid configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    ZeroOnDuration,
    WarningLeadTooLong,
    InvalidWarningPercentage(u8),
    ZeroLongPress,
    ZeroVoidTime,
    InvalidSliderRange,
    ZeroSliderStep,
    ZeroSliderInterval,
    LevelOutOfRange(u16),
    VoidingRequiresMomentary,
    ServiceOnDoubleAction,
    /// Slider operation on a switch without slider
    NoSlider,
    /// Durations add up or scale past the largest representable duration
    DurationOverflow,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::ZeroOnDuration => write!(f, "service on duration must be non-zero"),
            ConfigError::WarningLeadTooLong => write!(f, "warning lead must be shorter than the on duration"),
            ConfigError::InvalidWarningPercentage(p) => write!(f, "warning percentage {} exceeds 100", p),
            ConfigError::ZeroLongPress => write!(f, "long press threshold must be non-zero"),
            ConfigError::ZeroVoidTime => write!(f, "void time must be non-zero"),
            ConfigError::InvalidSliderRange => write!(f, "slider min must be lower than max"),
            ConfigError::ZeroSliderStep => write!(f, "slider step must be non-zero"),
            ConfigError::ZeroSliderInterval => write!(f, "slider step interval must be non-zero"),
            ConfigError::LevelOutOfRange(l) => write!(f, "slider level {} out of range", l),
            ConfigError::VoidingRequiresMomentary => write!(f, "voiding is only supported on momentary switches"),
            ConfigError::ServiceOnDoubleAction => write!(f, "double-action switches can't have a service timer"),
            ConfigError::NoSlider => write!(f, "switch has no slider"),
            ConfigError::DurationOverflow => write!(f, "duration overflows"),
        }
    }
}

impl core::error::Error for ConfigError {}

impl SwitchConfig {
    /// Plain momentary switch
    pub fn momentary() -> Self {
        Self::default()
    }

    /// Momentary switch turning on after `delay`
    pub fn delayed(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn latched() -> Self {
        Self {
            latch: LatchMode::Latched,
            ..Self::default()
        }
    }

    pub fn toggle() -> Self {
        Self {
            latch: LatchMode::Toggle,
            ..Self::default()
        }
    }

    /// Latched switch turning off after `on_duration`
    pub fn timed(on_duration: Duration) -> Self {
        Self {
            latch: LatchMode::Latched,
            service: Some(ServiceConfig::new(on_duration)),
            ..Self::default()
        }
    }

    /// Staircase switch: timed, with warning and pilot outputs
    pub fn hinted(on_duration: Duration, hint: HintConfig) -> Self {
        Self {
            latch: LatchMode::Latched,
            service: Some(ServiceConfig {
                on_duration,
                resettable: false,
                hint: Some(hint),
            }),
            ..Self::default()
        }
    }

    pub fn external_unlatch(turn_off_asap: bool) -> Self {
        Self {
            latch: LatchMode::External { turn_off_asap },
            ..Self::default()
        }
    }

    /// Double-action switch with a secondary momentary output
    pub fn double_action(long_press: Duration) -> Self {
        Self {
            latch: LatchMode::DoubleAction(DoubleActionConfig {
                long_press,
                ..DoubleActionConfig::default()
            }),
            ..Self::default()
        }
    }

    /// Double-action switch with a slider level
    pub fn slider(long_press: Duration, slider: SliderConfig) -> Self {
        Self {
            latch: LatchMode::DoubleAction(DoubleActionConfig {
                long_press,
                sequence_window: None,
                secondary: SecondaryMode::Slider(slider),
            }),
            ..Self::default()
        }
    }

    /// Momentary switch voided when `predicate` returns `true`
    pub fn voidable(predicate: fn() -> bool) -> Self {
        Self {
            voiding: Some(VoidCondition::Predicate(predicate)),
            ..Self::default()
        }
    }

    pub fn time_voidable(void_after: Duration) -> Self {
        Self {
            voiding: Some(VoidCondition::After(void_after)),
            ..Self::default()
        }
    }

    pub fn single_service() -> Self {
        Self {
            voiding: Some(VoidCondition::SingleService),
            ..Self::default()
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_service(mut self, service: ServiceConfig) -> Self {
        self.service = Some(service);
        self
    }

    pub fn with_voiding(mut self, voiding: VoidCondition) -> Self {
        self.voiding = Some(voiding);
        self
    }

    /// Set the combo window, no-op unless double-action
    pub fn with_sequence_window(mut self, window: Duration) -> Self {
        if let LatchMode::DoubleAction(da) = &mut self.latch {
            da.sequence_window = Some(window);
        }
        self
    }

    /// Time a press must be held before it qualifies
    pub(crate) fn press_threshold(&self) -> Result<Duration, ConfigError> {
        self.debounce
            .checked_add(self.delay)
            .ok_or(ConfigError::DurationOverflow)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.press_threshold()?;

        if let Some(service) = &self.service {
            if service.on_duration.as_ticks() == 0 {
                return Err(ConfigError::ZeroOnDuration);
            }
            if let Some(hint) = &service.hint {
                if hint.warning_lead >= service.on_duration {
                    return Err(ConfigError::WarningLeadTooLong);
                }
            }
            if matches!(self.latch, LatchMode::DoubleAction(_)) {
                return Err(ConfigError::ServiceOnDoubleAction);
            }
        }

        if let LatchMode::DoubleAction(da) = &self.latch {
            if da.long_press.as_ticks() == 0 {
                return Err(ConfigError::ZeroLongPress);
            }
            if threshold.checked_add(da.long_press).is_none() {
                return Err(ConfigError::DurationOverflow);
            }
            if let SecondaryMode::Slider(slider) = &da.secondary {
                slider.validate()?;
            }
        }

        if let Some(voiding) = &self.voiding {
            if self.latch.is_latching() {
                return Err(ConfigError::VoidingRequiresMomentary);
            }
            if let VoidCondition::After(d) = voiding {
                if d.as_ticks() == 0 {
                    return Err(ConfigError::ZeroVoidTime);
                }
            }
        }

        Ok(())
    }
}
