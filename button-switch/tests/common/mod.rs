use button_switch::{Switch, SwitchConfig, SwitchEvent, SwitchHooks, SwitchState};
use embassy_time::Instant;
use log::debug;

// Init logger for tests
#[ctor::ctor]
pub fn init_log() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

/// Hooks recording every event
#[derive(Debug, Default)]
pub struct Recorder {
    pub events: Vec<SwitchEvent>,
}

impl SwitchHooks for Recorder {
    fn on_event(&mut self, event: SwitchEvent) {
        self.events.push(event);
    }
}

pub fn ms(t: u64) -> Instant {
    Instant::from_millis(t)
}

/// Drives a switch with a simulated button, sampled every millisecond
pub struct Rig {
    pub switch: Switch<Recorder>,
    /// Current time in milliseconds
    pub now: u64,
    raw: bool,
}

impl Rig {
    pub fn new(config: SwitchConfig) -> Self {
        Self {
            switch: Switch::with_hooks(config, Recorder::default()).unwrap(),
            now: 0,
            raw: false,
        }
    }

    /// Sample the current raw level at the current time
    pub fn step(&mut self) -> SwitchState {
        let before = self.switch.hooks().events.len();
        let state = self.switch.update(self.raw, ms(self.now));
        let new_events = &self.switch.hooks().events[before..];
        if !new_events.is_empty() {
            debug!("t={}ms: {:?}", self.now, new_events);
        }
        let primary = new_events.iter().filter(|e| e.is_primary()).count();
        assert!(primary <= 1, "more than one main transition at t={}: {:?}", self.now, new_events);
        state
    }

    /// Change the raw level and sample it at the current time
    pub fn set(&mut self, raw: bool) -> SwitchState {
        self.raw = raw;
        self.step()
    }

    /// Jump to `t` and sample `raw` there
    pub fn sample_at(&mut self, t: u64, raw: bool) -> SwitchState {
        self.now = t;
        self.set(raw)
    }

    /// Keep the raw level for `duration` ms
    pub fn run(&mut self, duration: u64) -> SwitchState {
        let mut state = self.switch.state();
        for _ in 0..duration {
            self.now += 1;
            state = self.step();
        }
        state
    }

    /// Run until `t`
    pub fn run_until(&mut self, t: u64) -> SwitchState {
        self.run(t.saturating_sub(self.now))
    }

    pub fn press(&mut self, duration: u64) -> SwitchState {
        self.set(true);
        self.run(duration)
    }

    pub fn release(&mut self, duration: u64) -> SwitchState {
        self.set(false);
        self.run(duration)
    }

    /// Press for `duration`, then release and wait until the release is debounced
    pub fn click(&mut self, duration: u64) -> SwitchState {
        self.press(duration);
        let debounce = self.switch.config().debounce.as_millis();
        self.release(debounce)
    }

    /// Events recorded since the last call
    pub fn events(&mut self) -> Vec<SwitchEvent> {
        core::mem::take(&mut self.switch.hooks_mut().events)
    }

    /// Main transitions recorded since the last call
    pub fn primary_events(&mut self) -> Vec<SwitchEvent> {
        self.events().into_iter().filter(|e| e.is_primary()).collect()
    }
}
