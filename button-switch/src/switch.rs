use embassy_time::Instant;
use embedded_hal::digital::InputPin;

use crate::config::{ConfigError, DoubleActionConfig, LatchMode, SecondaryMode, SwitchConfig, VoidCondition};
use crate::debounce::Debouncer;
use crate::event::{SwitchEvent, SwitchHooks};
use crate::input::ButtonInput;
use crate::press::{PressEvent, PressTracker};
use crate::sequence::{PressKind, SequenceTracker};
use crate::slider::{Slider, SliderDirection};
use crate::state::{SwitchOutputs, SwitchState};

/// Pending deadlines of an on switch
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
struct Deadlines {
    /// Service timer expiry
    service: Option<Instant>,
    /// Time voiding
    void: Option<Instant>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum Phase {
    Off,
    TurningOn,
    On(Deadlines),
    Latched(Deadlines),
    Voided,
}

impl Phase {
    fn is_on(&self) -> bool {
        matches!(self, Phase::On(_) | Phase::Latched(_))
    }

    fn deadlines(&self) -> Option<Deadlines> {
        match self {
            Phase::On(d) | Phase::Latched(d) => Some(*d),
            _ => None,
        }
    }
}

/// External unlatch signal handling
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum UnlatchCycle {
    Idle,
    /// Signal went high, turn off when it goes low
    Pending,
    /// Unlatched, the signal must go low before it can unlatch again
    Done,
}

/// Long press output of a double-action switch
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum Secondary {
    Idle,
    Active,
    Combo,
}

/// Qualified press of a double-action switch, still held
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
struct HeldPress {
    /// `Some` once the press has been classified
    kind: Option<PressKind>,
}

/// A push button turned into a switch.
///
/// Feed it raw samples with [`Switch::update`]; every layer (debounce, start delay, latch,
/// service timer, double-action, voiding) is evaluated inside that call and transitions
/// are reported to the hooks `H` synchronously.
#[derive(Debug)]
pub struct Switch<H: SwitchHooks = ()> {
    config: SwitchConfig,
    debouncer: Debouncer,
    press: PressTracker,
    phase: Phase,
    enabled: bool,
    /// Latest timestamp seen, used to clamp out of order samples
    last_update: Option<Instant>,

    unlatch_signal: bool,
    unlatch_cycle: UnlatchCycle,

    warning_on: bool,
    pilot_on: bool,

    sequence: SequenceTracker,
    held: Option<HeldPress>,
    secondary: Secondary,
    slider: Option<Slider>,

    void_requested: bool,
    /// Single-service switch already used, waiting for `rearm`
    spent: bool,

    outputs_changed: bool,
    hooks: H,
}

impl Switch<()> {
    pub fn new(config: SwitchConfig) -> Result<Self, ConfigError> {
        Self::with_hooks(config, ())
    }
}

impl<H: SwitchHooks> Switch<H> {
    pub fn with_hooks(config: SwitchConfig, hooks: H) -> Result<Self, ConfigError> {
        config.validate()?;
        let double_action = double_action_config(&config);
        let mut switch = Self {
            config,
            debouncer: Debouncer::new(config.debounce),
            press: PressTracker::new(config.press_threshold()?),
            phase: Phase::Off,
            enabled: true,
            last_update: None,
            unlatch_signal: false,
            unlatch_cycle: UnlatchCycle::Idle,
            warning_on: false,
            pilot_on: false,
            sequence: SequenceTracker::new(double_action.and_then(|da| da.sequence_window)),
            held: None,
            secondary: Secondary::Idle,
            slider: slider_of(double_action),
            void_requested: false,
            spent: false,
            outputs_changed: false,
            hooks,
        };
        switch.pilot_on = switch.keeps_pilot();
        Ok(switch)
    }

    /// Process one raw sample taken at `now`, returns the resulting state.
    pub fn update(&mut self, raw: bool, now: Instant) -> SwitchState {
        let now = self.clamp(now);
        let debounced = self.debouncer.update(raw, now);
        if !self.enabled {
            return self.state();
        }

        let press = self.press.update(debounced, self.debouncer.stable_since(), now);
        self.press.settle(self.debouncer.is_held());
        // At most one main transition per update
        if !self.handle_press(press, now) && !self.handle_unlatch_signal() && !self.handle_service_timer(now) {
            self.handle_voiding(now);
        }
        self.handle_long_press(now);
        self.update_warning(now);

        self.state()
    }

    /// [`Switch::update`] with the current time
    pub fn update_now(&mut self, raw: bool) -> SwitchState {
        self.update(raw, Instant::now())
    }

    /// Read the button from `input` and process the sample
    pub fn poll<P: InputPin>(&mut self, input: &mut ButtonInput<P>, now: Instant) -> Result<SwitchState, P::Error> {
        let raw = input.is_pressed()?;
        Ok(self.update(raw, now))
    }

    pub fn config(&self) -> &SwitchConfig {
        &self.config
    }

    pub fn state(&self) -> SwitchState {
        match self.phase {
            Phase::Off => SwitchState::Off,
            Phase::TurningOn => SwitchState::TurningOn,
            Phase::On(_) => SwitchState::On,
            Phase::Latched(_) => SwitchState::Latched,
            Phase::Voided => SwitchState::Voided,
        }
    }

    pub fn is_on(&self) -> bool {
        self.phase.is_on()
    }

    pub fn is_latched(&self) -> bool {
        matches!(self.phase, Phase::Latched(_))
    }

    pub fn is_voided(&self) -> bool {
        self.phase == Phase::Voided
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_warning_on(&self) -> bool {
        self.warning_on
    }

    pub fn is_pilot_on(&self) -> bool {
        self.pilot_on
    }

    pub fn is_on_secondary(&self) -> bool {
        self.secondary == Secondary::Active
    }

    pub fn is_combo_on(&self) -> bool {
        self.secondary == Secondary::Combo
    }

    /// Turn a latching switch off. Returns `false` if there was nothing to unlatch.
    pub fn unlatch(&mut self) -> bool {
        if !self.config.latch.is_latching() || !self.phase.is_on() {
            return false;
        }
        debug!("Switch unlatched");
        self.turn_off();
        true
    }

    /// Force the switch off and ignore the button until [`Switch::enable`]
    pub fn disable(&mut self) {
        if !self.enabled {
            return;
        }
        self.force_off();
        self.enabled = false;
        self.outputs_changed = true;
        info!("Switch disabled");
    }

    /// Accept the button again. A press held since before enabling is ignored, even one
    /// still bouncing.
    pub fn enable(&mut self) {
        if self.enabled {
            return;
        }
        self.enabled = true;
        self.press.reset(self.debouncer.is_held());
        self.outputs_changed = true;
        info!("Switch enabled");
    }

    /// Back to off, clearing every pending deadline, request and sequence
    pub fn reset(&mut self) {
        self.force_off();
        self.press.reset(self.debouncer.is_held());
        self.sequence.clear();
        self.spent = false;
    }

    /// Make a spent single-service switch usable again.
    ///
    /// A spent switch ignores new presses. Releasing the press that used it still moves it
    /// from voided to off, with [`SwitchEvent::Unvoided`] closing that same service cycle.
    pub fn rearm(&mut self) -> bool {
        if !self.spent {
            return false;
        }
        self.spent = false;
        self.press.consume();
        debug!("Switch rearmed");
        true
    }

    /// Level of the external unlatch signal, evaluated on the next update
    pub fn set_unlatch_signal(&mut self, level: bool) {
        self.unlatch_signal = level;
    }

    /// Void an on switch on the next update. Only for [`VoidCondition::External`] switches.
    pub fn request_void(&mut self) -> bool {
        if !matches!(self.config.voiding, Some(VoidCondition::External)) || !matches!(self.phase, Phase::On(_)) {
            return false;
        }
        self.void_requested = true;
        true
    }

    /// Slider level, `None` without slider
    pub fn level(&self) -> Option<u16> {
        self.slider.as_ref().map(|s| s.level())
    }

    pub fn set_level(&mut self, level: u16) -> Result<(), ConfigError> {
        let slider = self.slider.as_mut().ok_or(ConfigError::NoSlider)?;
        let before = slider.level();
        slider.set_level(level)?;
        if before != level {
            self.emit(SwitchEvent::LevelChanged(level));
        }
        Ok(())
    }

    pub fn set_slider_direction(&mut self, direction: SliderDirection) -> bool {
        self.slider.as_mut().is_some_and(|s| s.set_direction(direction))
    }

    pub fn swap_slider_direction(&mut self) -> bool {
        self.slider.as_mut().is_some_and(|s| s.swap_direction())
    }

    pub fn slider_direction(&self) -> Option<SliderDirection> {
        self.slider.as_ref().map(|s| s.direction())
    }

    pub fn outputs(&self) -> SwitchOutputs {
        SwitchOutputs {
            is_on: self.is_on(),
            is_enabled: self.enabled,
            pilot_on: self.pilot_on,
            warning_on: self.warning_on,
            is_voided: self.is_voided(),
            is_on_secondary: self.is_on_secondary(),
            is_combo_on: self.is_combo_on(),
            level: self.level().unwrap_or(0),
        }
    }

    /// Whether any output changed since the last call
    pub fn take_outputs_change(&mut self) -> bool {
        core::mem::take(&mut self.outputs_changed)
    }

    /// Replace the configuration. The switch is forced off and a held press is ignored.
    pub fn reconfigure(&mut self, config: SwitchConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let threshold = config.press_threshold()?;
        self.force_off();
        self.config = config;
        self.debouncer.set_window(config.debounce);
        self.press.set_threshold(threshold);
        self.press.reset(self.debouncer.is_held());

        let double_action = double_action_config(&config);
        self.sequence = SequenceTracker::new(double_action.and_then(|da| da.sequence_window));
        self.slider = slider_of(double_action);
        self.spent = false;
        self.set_pilot(self.keeps_pilot());
        self.outputs_changed = true;
        info!("Switch reconfigured: {:?}", self.config.latch);
        Ok(())
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    fn clamp(&mut self, now: Instant) -> Instant {
        match self.last_update {
            Some(last) if now < last => {
                warn!("Timestamp {:?} is earlier than the last update {:?}, clamping", now, last);
                last
            }
            _ => {
                self.last_update = Some(now);
                now
            }
        }
    }

    fn handle_press(&mut self, press: PressEvent, now: Instant) -> bool {
        match press {
            PressEvent::None => false,
            PressEvent::Started => {
                if self.phase == Phase::Off && !self.spent {
                    trace!("Switch turning on");
                    self.phase = Phase::TurningOn;
                    return true;
                }
                false
            }
            PressEvent::Abandoned => {
                if self.phase == Phase::TurningOn {
                    trace!("Press released before the start delay");
                    self.phase = Phase::Off;
                    return true;
                }
                false
            }
            PressEvent::Qualified => self.on_qualified(now),
            PressEvent::Released => self.on_released(now),
        }
    }

    fn on_qualified(&mut self, now: Instant) -> bool {
        if double_action_config(&self.config).is_some() {
            if let Some(started_at) = self.press.started_at() {
                self.sequence.press_started(started_at);
                self.held = Some(HeldPress { kind: None });
            }
        }

        match self.phase {
            Phase::Off | Phase::TurningOn => {
                if self.spent {
                    return false;
                }
                self.turn_on(now);
                true
            }
            Phase::Latched(deadlines) => {
                if self.config.latch == LatchMode::Toggle {
                    self.turn_off();
                    return true;
                }
                if let Some(service) = self.config.service {
                    if service.resettable {
                        debug!("Service timer restarted");
                        self.phase = Phase::Latched(Deadlines {
                            service: now.checked_add(service.on_duration),
                            ..deadlines
                        });
                    }
                }
                false
            }
            _ => false,
        }
    }

    fn on_released(&mut self, now: Instant) -> bool {
        let mut short_press = false;
        if let Some(held) = self.held.take() {
            match held.kind {
                Some(PressKind::Long) => {
                    self.sequence.press_ended(now);
                    self.end_secondary();
                }
                _ => {
                    let pattern = self.sequence.classify(PressKind::Short, now);
                    self.emit(SwitchEvent::Press(PressKind::Short, pattern));
                    short_press = true;
                }
            }
        }

        match self.phase {
            Phase::On(deadlines) => {
                if self.config.latch.is_latching() {
                    self.phase = Phase::Latched(deadlines);
                    self.emit(SwitchEvent::Latched);
                } else {
                    self.turn_off();
                }
                true
            }
            Phase::Latched(_) if short_press => {
                self.turn_off();
                true
            }
            Phase::Voided => {
                self.phase = Phase::Off;
                debug!("Voided switch released");
                self.emit(SwitchEvent::Unvoided);
                self.set_pilot(self.keeps_pilot());
                true
            }
            _ => false,
        }
    }

    fn handle_unlatch_signal(&mut self) -> bool {
        let LatchMode::External { turn_off_asap } = self.config.latch else {
            return false;
        };
        match self.unlatch_cycle {
            UnlatchCycle::Idle => {
                if self.unlatch_signal && self.is_latched() {
                    if turn_off_asap {
                        debug!("Unlatch signal high, turning off");
                        self.unlatch_cycle = UnlatchCycle::Done;
                        self.turn_off();
                        return true;
                    }
                    self.unlatch_cycle = UnlatchCycle::Pending;
                }
                false
            }
            UnlatchCycle::Pending => {
                if self.unlatch_signal {
                    return false;
                }
                self.unlatch_cycle = UnlatchCycle::Idle;
                if self.phase.is_on() {
                    debug!("Unlatch signal low, turning off");
                    self.turn_off();
                    return true;
                }
                false
            }
            UnlatchCycle::Done => {
                if !self.unlatch_signal {
                    self.unlatch_cycle = UnlatchCycle::Idle;
                }
                false
            }
        }
    }

    fn handle_service_timer(&mut self, now: Instant) -> bool {
        match self.phase.deadlines().and_then(|d| d.service) {
            Some(deadline) if now >= deadline => {
                info!("Service time elapsed, turning off");
                self.turn_off();
                true
            }
            _ => false,
        }
    }

    fn handle_voiding(&mut self, now: Instant) -> bool {
        let Phase::On(deadlines) = self.phase else {
            return false;
        };
        let voided = match self.config.voiding {
            None => false,
            Some(VoidCondition::Predicate(f)) => f(),
            Some(VoidCondition::External) => core::mem::take(&mut self.void_requested),
            Some(VoidCondition::After(_)) => deadlines.void.is_some_and(|d| now >= d),
            Some(VoidCondition::SingleService) => true,
        };
        if voided {
            debug!("Switch voided");
            self.phase = Phase::Voided;
            self.emit(SwitchEvent::Voided);
            self.set_warning(false);
        }
        voided
    }

    /// Long press classification and slider steps of double-action switches
    fn handle_long_press(&mut self, now: Instant) {
        let Some(da) = double_action_config(&self.config) else {
            return;
        };

        if let Some(held) = self.held {
            let long = held.kind.is_none()
                && self
                    .press
                    .held_beyond_threshold(now)
                    .is_some_and(|held_for| held_for >= da.long_press);
            if long {
                let combo = da.sequence_window.is_some()
                    && self.sequence.previous().is_some_and(|p| p.kind == PressKind::Short);
                let pattern = self.sequence.classify(PressKind::Long, now);
                self.held = Some(HeldPress {
                    kind: Some(PressKind::Long),
                });
                self.emit(SwitchEvent::Press(PressKind::Long, pattern));
                if combo {
                    self.secondary = Secondary::Combo;
                    self.emit(SwitchEvent::ComboOn);
                } else {
                    self.secondary = Secondary::Active;
                    if let Some(slider) = self.slider.as_mut() {
                        slider.start(now);
                    }
                    self.emit(SwitchEvent::SecondaryOn);
                }
            }
        }

        if self.secondary == Secondary::Active {
            if let Some(slider) = self.slider.as_mut() {
                if slider.advance(now) {
                    let level = slider.level();
                    self.emit(SwitchEvent::LevelChanged(level));
                }
            }
        }
    }

    fn update_warning(&mut self, now: Instant) {
        let Some(hint) = self.config.service.and_then(|s| s.hint) else {
            return;
        };
        if let Some(deadline) = self.phase.deadlines().and_then(|d| d.service) {
            self.set_warning(now.checked_add(hint.warning_lead).is_none_or(|t| t >= deadline));
        }
    }

    /// Deadlines past the end of time never fire
    fn turn_on(&mut self, now: Instant) {
        let deadlines = Deadlines {
            service: self.config.service.and_then(|s| now.checked_add(s.on_duration)),
            void: match self.config.voiding {
                Some(VoidCondition::After(d)) => now.checked_add(d),
                _ => None,
            },
        };
        self.phase = Phase::On(deadlines);
        if matches!(self.config.voiding, Some(VoidCondition::SingleService)) {
            self.spent = true;
        }
        debug!("Switch turned on at {:?}", now);
        self.emit(SwitchEvent::TurnedOn);
        self.set_pilot(false);
    }

    /// Main output off. A press still held is ignored until released, and a pending
    /// external unlatch doesn't carry over to the next latch
    fn turn_off(&mut self) {
        self.phase = Phase::Off;
        self.press.consume();
        self.held = None;
        self.end_secondary();
        self.void_requested = false;
        self.unlatch_cycle = self.settled_unlatch_cycle();
        debug!("Switch turned off");
        self.emit(SwitchEvent::TurnedOff);
        self.set_warning(false);
        self.set_pilot(self.keeps_pilot());
    }

    fn force_off(&mut self) {
        match self.phase {
            Phase::On(_) | Phase::Latched(_) => self.turn_off(),
            Phase::Voided => {
                self.phase = Phase::Off;
                self.emit(SwitchEvent::Unvoided);
                self.set_pilot(self.keeps_pilot());
            }
            Phase::TurningOn => self.phase = Phase::Off,
            Phase::Off => (),
        }
        self.held = None;
        self.end_secondary();
        self.void_requested = false;
        self.unlatch_cycle = self.settled_unlatch_cycle();
        self.set_warning(false);
    }

    fn end_secondary(&mut self) {
        match self.secondary {
            Secondary::Active => {
                if let Some(slider) = self.slider.as_mut() {
                    slider.stop();
                }
                self.secondary = Secondary::Idle;
                self.emit(SwitchEvent::SecondaryOff);
            }
            Secondary::Combo => {
                self.secondary = Secondary::Idle;
                self.emit(SwitchEvent::ComboOff);
            }
            Secondary::Idle => (),
        }
    }

    /// Unlatch cycle after a forced turn-off: a signal still high must go low first
    fn settled_unlatch_cycle(&self) -> UnlatchCycle {
        if self.unlatch_signal {
            UnlatchCycle::Done
        } else {
            UnlatchCycle::Idle
        }
    }

    fn keeps_pilot(&self) -> bool {
        self.config
            .service
            .and_then(|s| s.hint)
            .is_some_and(|h| h.keep_pilot)
    }

    fn set_warning(&mut self, on: bool) {
        if self.warning_on != on {
            self.warning_on = on;
            self.emit(if on { SwitchEvent::WarningOn } else { SwitchEvent::WarningOff });
        }
    }

    fn set_pilot(&mut self, on: bool) {
        if self.pilot_on != on {
            self.pilot_on = on;
            self.emit(if on { SwitchEvent::PilotOn } else { SwitchEvent::PilotOff });
        }
    }

    fn emit(&mut self, event: SwitchEvent) {
        if !matches!(event, SwitchEvent::Latched | SwitchEvent::Press(..)) {
            self.outputs_changed = true;
        }
        trace!("Switch event: {:?}", event);
        self.hooks.on_event(event);
    }
}

fn double_action_config(config: &SwitchConfig) -> Option<DoubleActionConfig> {
    match config.latch {
        LatchMode::DoubleAction(da) => Some(da),
        _ => None,
    }
}

fn slider_of(double_action: Option<DoubleActionConfig>) -> Option<Slider> {
    match double_action?.secondary {
        SecondaryMode::Slider(config) => Some(Slider::new(config)),
        SecondaryMode::Momentary => None,
    }
}
