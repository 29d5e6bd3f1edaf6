use embassy_time::{Duration, Instant};

use crate::config::ConfigError;

/// Slider secondary behavior of a double-action switch.
///
/// The level moves by `step` every `step_interval` while the long press is held.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SliderConfig {
    pub min: u16,
    pub max: u16,
    /// Level at construction
    pub initial: u16,
    pub step: u16,
    pub step_interval: Duration,
    /// Reverse the direction when the level reaches either end
    pub swap_on_end: bool,
    /// Reverse the direction at the start of every slider session
    pub swap_on_press: bool,
}

impl Default for SliderConfig {
    fn default() -> Self {
        Self {
            min: 0,
            max: u16::MAX,
            initial: 0,
            step: 1,
            step_interval: Duration::from_millis(1),
            swap_on_end: true,
            swap_on_press: false,
        }
    }
}

impl SliderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min >= self.max {
            return Err(ConfigError::InvalidSliderRange);
        }
        if self.step == 0 {
            return Err(ConfigError::ZeroSliderStep);
        }
        if self.step_interval.as_ticks() == 0 {
            return Err(ConfigError::ZeroSliderInterval);
        }
        if !(self.min..=self.max).contains(&self.initial) {
            return Err(ConfigError::LevelOutOfRange(self.initial));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SliderDirection {
    Up,
    Down,
}

impl SliderDirection {
    fn reversed(self) -> Self {
        match self {
            SliderDirection::Up => SliderDirection::Down,
            SliderDirection::Down => SliderDirection::Up,
        }
    }
}

#[derive(Clone, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Slider {
    config: SliderConfig,
    level: u16,
    direction: SliderDirection,
    /// Time of the last applied step, `Some` during a slider session
    last_step: Option<Instant>,
}

impl Slider {
    pub fn new(config: SliderConfig) -> Self {
        Self {
            config,
            level: config.initial,
            direction: SliderDirection::Up,
            last_step: None,
        }
    }

    pub fn level(&self) -> u16 {
        self.level
    }

    pub fn direction(&self) -> SliderDirection {
        self.direction
    }

    pub fn set_level(&mut self, level: u16) -> Result<(), ConfigError> {
        if !(self.config.min..=self.config.max).contains(&level) {
            return Err(ConfigError::LevelOutOfRange(level));
        }
        self.level = level;
        Ok(())
    }

    /// Set the moving direction. Fails when the level already sits at the end the
    /// direction points to.
    pub fn set_direction(&mut self, direction: SliderDirection) -> bool {
        let blocked = match direction {
            SliderDirection::Up => self.level == self.config.max,
            SliderDirection::Down => self.level == self.config.min,
        };
        if blocked {
            return false;
        }
        self.direction = direction;
        true
    }

    pub fn swap_direction(&mut self) -> bool {
        self.set_direction(self.direction.reversed())
    }

    /// Start a slider session
    pub fn start(&mut self, now: Instant) {
        if self.config.swap_on_press {
            self.swap_direction();
        }
        // Never start against an end
        if self.level == self.config.max {
            self.direction = SliderDirection::Down;
        } else if self.level == self.config.min {
            self.direction = SliderDirection::Up;
        }
        self.last_step = Some(now);
    }

    pub fn stop(&mut self) {
        self.last_step = None;
    }

    /// Apply every step due at `now`, returns `true` if the level changed.
    pub fn advance(&mut self, now: Instant) -> bool {
        let Some(last_step) = self.last_step else {
            return false;
        };
        let interval = self.config.step_interval.as_ticks();
        let steps = now.saturating_duration_since(last_step).as_ticks() / interval;
        if steps == 0 {
            return false;
        }
        self.last_step = Some(last_step + Duration::from_ticks(steps * interval));

        let before = self.level;
        let delta = steps.saturating_mul(self.config.step as u64);
        let level = self.level as u64;
        match self.direction {
            SliderDirection::Up => {
                let max = self.config.max as u64;
                self.level = level.saturating_add(delta).min(max) as u16;
                if self.level == self.config.max && self.config.swap_on_end {
                    self.direction = SliderDirection::Down;
                }
            }
            SliderDirection::Down => {
                let min = self.config.min as u64;
                self.level = level.saturating_sub(delta).max(min) as u16;
                if self.level == self.config.min && self.config.swap_on_end {
                    self.direction = SliderDirection::Up;
                }
            }
        }
        self.level != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(t: u64) -> Instant {
        Instant::from_millis(t)
    }

    fn config() -> SliderConfig {
        SliderConfig {
            min: 0,
            max: 100,
            initial: 10,
            step: 5,
            step_interval: Duration::from_millis(10),
            swap_on_end: false,
            swap_on_press: false,
        }
    }

    #[test]
    fn test_validate() {
        assert!(config().validate().is_ok());
        assert_eq!(
            SliderConfig { min: 100, ..config() }.validate(),
            Err(ConfigError::InvalidSliderRange)
        );
        assert_eq!(SliderConfig { step: 0, ..config() }.validate(), Err(ConfigError::ZeroSliderStep));
        assert_eq!(
            SliderConfig {
                step_interval: Duration::from_ticks(0),
                ..config()
            }
            .validate(),
            Err(ConfigError::ZeroSliderInterval)
        );
        assert_eq!(
            SliderConfig { initial: 101, ..config() }.validate(),
            Err(ConfigError::LevelOutOfRange(101))
        );
    }

    #[test]
    fn test_step_per_interval() {
        let mut s = Slider::new(config());
        s.start(ms(0));
        assert!(!s.advance(ms(9)));
        assert!(s.advance(ms(10)));
        assert_eq!(s.level(), 15);
        // Late poll applies every missed step
        assert!(s.advance(ms(45)));
        assert_eq!(s.level(), 30);
        // Remainder is kept
        assert!(s.advance(ms(50)));
        assert_eq!(s.level(), 35);
    }

    #[test]
    fn test_clamp_without_swap() {
        let mut s = Slider::new(config());
        s.start(ms(0));
        s.advance(ms(1000));
        assert_eq!(s.level(), 100);
        assert!(!s.advance(ms(1100)));
        assert_eq!(s.direction(), SliderDirection::Up);
    }

    #[test]
    fn test_swap_on_end() {
        let mut s = Slider::new(SliderConfig {
            swap_on_end: true,
            initial: 90,
            ..config()
        });
        s.start(ms(0));
        s.advance(ms(20));
        assert_eq!(s.level(), 100);
        assert_eq!(s.direction(), SliderDirection::Down);
        s.advance(ms(30));
        assert_eq!(s.level(), 95);
    }

    #[test]
    fn test_swap_on_press() {
        let mut s = Slider::new(SliderConfig {
            swap_on_press: true,
            initial: 50,
            ..config()
        });
        s.start(ms(0));
        assert_eq!(s.direction(), SliderDirection::Down);
        s.stop();
        s.start(ms(100));
        assert_eq!(s.direction(), SliderDirection::Up);
    }

    #[test]
    fn test_direction_blocked_at_end() {
        let mut s = Slider::new(config());
        s.set_level(100).unwrap();
        assert!(!s.set_direction(SliderDirection::Up));
        assert!(s.set_direction(SliderDirection::Down));
        assert_eq!(s.set_level(101), Err(ConfigError::LevelOutOfRange(101)));
    }
}
