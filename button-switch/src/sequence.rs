use embassy_time::{Duration, Instant};
use heapless::Deque;
use serde::{Deserialize, Serialize};

/// Classification of a qualified press of a double-action switch
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PressKind {
    /// Released before the long press threshold
    Short,
    /// Held past the long press threshold
    Long,
}

/// A sequence of at most 15 short or long presses encoded on an u16:
/// 0x1 when empty, then 0 for short or 1 for long shifted in from the right
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PressPattern(u16);

impl Default for PressPattern {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl PressPattern {
    pub const EMPTY: Self = Self(0b1);
    pub const MAX_LEN: usize = 15;

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn bits(&self) -> u16 {
        self.0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0b1
    }

    pub const fn is_full(&self) -> bool {
        (self.0 & 0b1000_0000_0000_0000) != 0
    }

    pub const fn len(&self) -> usize {
        15usize.saturating_sub(self.0.leading_zeros() as usize)
    }

    pub const fn followed_by(&self, kind: PressKind) -> Self {
        match kind {
            PressKind::Short => Self(self.0 << 1),
            PressKind::Long => Self((self.0 << 1) | 0b1),
        }
    }

    /// Most recent press of the pattern
    pub const fn last(&self) -> Option<PressKind> {
        if self.is_empty() {
            None
        } else if self.0 & 0b1 == 0 {
            Some(PressKind::Short)
        } else {
            Some(PressKind::Long)
        }
    }

    // Common patterns
    pub const fn short() -> Self {
        Self(0b10)
    }
    pub const fn long() -> Self {
        Self(0b11)
    }
    pub const fn double_short() -> Self {
        Self(0b100)
    }
    pub const fn long_after_short() -> Self {
        Self(0b101)
    }
}

/// A classified press kept in the history
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClassifiedPress {
    pub kind: PressKind,
    /// `None` while a long press is still held
    pub ended_at: Option<Instant>,
}

/// Groups consecutive presses into a [`PressPattern`].
///
/// A press continues the current sequence only if it starts within `window` after the
/// previous one ended. Without a window every press starts a new sequence.
#[derive(Debug, Clone)]
pub struct SequenceTracker {
    window: Option<Duration>,
    history: Deque<ClassifiedPress, 2>,
    pattern: PressPattern,
}

impl SequenceTracker {
    pub fn new(window: Option<Duration>) -> Self {
        Self {
            window,
            history: Deque::new(),
            pattern: PressPattern::EMPTY,
        }
    }

    pub fn clear(&mut self) {
        self.history.clear();
        self.pattern = PressPattern::EMPTY;
    }

    /// A new press started at `at`, drop the sequence if the previous press is too old.
    pub fn press_started(&mut self, at: Instant) {
        let continues = match (self.window, self.history.back()) {
            (Some(window), Some(ClassifiedPress { ended_at: Some(end), .. })) => {
                at.saturating_duration_since(*end) <= window
            }
            _ => false,
        };
        if !continues {
            self.clear();
        }
    }

    /// Previous press of the ongoing sequence
    pub fn previous(&self) -> Option<&ClassifiedPress> {
        self.history.back()
    }

    /// Record the classification of the current press and return the updated pattern.
    pub fn classify(&mut self, kind: PressKind, now: Instant) -> PressPattern {
        if self.pattern.is_full() {
            self.pattern = PressPattern::EMPTY;
        }
        self.pattern = self.pattern.followed_by(kind);

        if self.history.is_full() {
            self.history.pop_front();
        }
        let ended_at = match kind {
            PressKind::Short => Some(now),
            PressKind::Long => None,
        };
        // Cannot fail, room was made above
        let _ = self.history.push_back(ClassifiedPress { kind, ended_at });
        self.pattern
    }

    /// The current long press was released at `now`
    pub fn press_ended(&mut self, now: Instant) {
        if let Some(last) = self.history.back_mut() {
            if last.ended_at.is_none() {
                last.ended_at = Some(now);
            }
        }
    }
}
