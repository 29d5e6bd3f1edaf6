use embassy_time::{Duration, Instant};

use crate::debounce::DebounceState;

/// Lifecycle of one physical press, as seen after debouncing.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum PressPhase {
    /// The button is released
    Released,
    /// Debounced press, waiting for the start delay to elapse.
    /// The payload is the start of the press
    Pending(Instant),
    /// The press is qualified and still held.
    /// The payload is the start of the press
    Qualified(Instant),
    /// The button is held but the press was already consumed, nothing happens until release
    Consumed,
}

/// What happened to the current press during one update.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PressEvent {
    None,
    /// A debounced press started but the start delay hasn't elapsed yet
    Started,
    /// The press has been held for debounce + delay
    Qualified,
    /// The press was released before it qualified
    Abandoned,
    /// A qualified press was released
    Released,
}

/// Start delay layer: a debounced press qualifies only after it has been held for
/// `debounce + delay` since the raw signal went pressed.
///
/// Each physical press qualifies at most once.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PressTracker {
    threshold: Duration,
    phase: PressPhase,
}

impl PressTracker {
    /// `threshold` is the debounce window plus the start delay
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            phase: PressPhase::Released,
        }
    }

    pub fn set_threshold(&mut self, threshold: Duration) {
        self.threshold = threshold;
    }

    pub fn update(&mut self, debounce: DebounceState, since: Option<Instant>, now: Instant) -> PressEvent {
        match debounce {
            // A press that began before the last reset is still ignored
            DebounceState::Pressed if self.phase == PressPhase::Consumed => PressEvent::None,
            DebounceState::Pressed => {
                self.phase = PressPhase::Pending(since.unwrap_or(now));
                if !self.try_qualify(now) {
                    return PressEvent::Started;
                }
                PressEvent::Qualified
            }
            DebounceState::Released => {
                let event = match self.phase {
                    PressPhase::Pending(_) => PressEvent::Abandoned,
                    PressPhase::Qualified(_) => PressEvent::Released,
                    PressPhase::Released | PressPhase::Consumed => PressEvent::None,
                };
                self.phase = PressPhase::Released;
                event
            }
            DebounceState::InProgress | DebounceState::Ignored => {
                if self.try_qualify(now) {
                    PressEvent::Qualified
                } else {
                    PressEvent::None
                }
            }
        }
    }

    fn try_qualify(&mut self, now: Instant) -> bool {
        if let PressPhase::Pending(since) = self.phase {
            if now.saturating_duration_since(since) >= self.threshold {
                self.phase = PressPhase::Qualified(since);
                return true;
            }
        }
        false
    }

    /// Ignore the press currently held, if any, until it is released.
    pub fn consume(&mut self) {
        if self.phase != PressPhase::Released {
            self.phase = PressPhase::Consumed;
        }
    }

    /// Start over from a released button. If `held` the button is still down, or on its
    /// way down, and the ongoing press must not trigger anything.
    pub fn reset(&mut self, held: bool) {
        self.phase = if held { PressPhase::Consumed } else { PressPhase::Released };
    }

    /// Forget a consumed press once the button is seen released, even if the release
    /// never got through debouncing
    pub fn settle(&mut self, held: bool) {
        if !held && self.phase == PressPhase::Consumed {
            self.phase = PressPhase::Released;
        }
    }

    /// Start of the current press, if it's pending or qualified
    pub fn started_at(&self) -> Option<Instant> {
        match self.phase {
            PressPhase::Pending(since) | PressPhase::Qualified(since) => Some(since),
            _ => None,
        }
    }

    /// Time the current press has been held beyond its qualification threshold.
    pub fn held_beyond_threshold(&self, now: Instant) -> Option<Duration> {
        match self.phase {
            PressPhase::Qualified(since) => Some(
                since
                    .checked_add(self.threshold)
                    .map_or(Duration::from_ticks(0), |at| now.saturating_duration_since(at)),
            ),
            _ => None,
        }
    }
}
