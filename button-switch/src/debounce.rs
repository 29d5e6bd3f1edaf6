use embassy_time::{Duration, Instant};

/// Result of feeding one raw sample to the [`Debouncer`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DebounceState {
    /// The stable signal just changed to pressed
    Pressed,
    /// The stable signal just changed to released
    Released,
    /// The raw signal differs from the stable one, waiting for it to settle
    InProgress,
    /// Raw and stable signals agree, nothing to do
    Ignored,
}

/// Tracks the debounce state of the input.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum DebounceCounter {
    /// The input is in a stable state (idle).
    Idle,
    /// The input is in a transient state (debouncing).
    /// The payload is the timestamp of the last raw change.
    Debouncing(Instant),
}

/// Debouncer of a single push-button input.
///
/// A new raw value is accepted only after it has been constant for at least `window`.
/// Every raw change restarts the window from that change, so bounces never accumulate
/// partial credit. A zero window accepts every change immediately.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Debouncer {
    window: Duration,
    counter: DebounceCounter,
    /// Last raw sample
    raw: bool,
    /// Debounced signal
    stable: bool,
    /// When the raw signal last took the value that is now stable
    stable_since: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            counter: DebounceCounter::Idle,
            raw: false,
            stable: false,
            stable_since: None,
        }
    }

    pub fn set_window(&mut self, window: Duration) {
        self.window = window;
    }

    /// Button down, or on its way down: either the raw or the debounced signal is pressed
    pub fn is_held(&self) -> bool {
        self.raw || self.stable
    }

    /// Time at which the raw signal started to hold the current stable value.
    ///
    /// For a pressed button this is the start of the press, not the moment the debounce
    /// window elapsed.
    pub fn stable_since(&self) -> Option<Instant> {
        self.stable_since
    }

    /// Feed a raw sample taken at `now`.
    pub fn update(&mut self, raw: bool, now: Instant) -> DebounceState {
        if raw != self.raw {
            // Any raw change restarts the window
            self.raw = raw;
            self.counter = DebounceCounter::Debouncing(now);
        }

        match self.counter {
            DebounceCounter::Idle => DebounceState::Ignored,
            DebounceCounter::Debouncing(changed_at) => {
                if self.raw == self.stable {
                    // Bounced back to the stable value before the window elapsed
                    self.counter = DebounceCounter::Idle;
                    return DebounceState::Ignored;
                }
                if now.saturating_duration_since(changed_at) >= self.window {
                    self.counter = DebounceCounter::Idle;
                    self.stable = self.raw;
                    self.stable_since = Some(changed_at);
                    if self.stable {
                        DebounceState::Pressed
                    } else {
                        DebounceState::Released
                    }
                } else {
                    DebounceState::InProgress
                }
            }
        }
    }
}
