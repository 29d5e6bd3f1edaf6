pub mod common;

use button_switch::{ConfigError, Switch, SwitchConfig, SwitchEvent, SwitchOutputs, SwitchState};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{Duration, Instant};

use crate::common::{Rig, ms};

#[test]
fn test_momentary_press_release() {
    let mut rig = Rig::new(SwitchConfig::momentary());
    assert_eq!(rig.press(19), SwitchState::Off);
    assert_eq!(rig.run(1), SwitchState::On);
    assert_eq!(rig.now, 20);
    assert_eq!(rig.events(), vec![SwitchEvent::TurnedOn]);

    assert_eq!(rig.release(19), SwitchState::On);
    assert_eq!(rig.run(1), SwitchState::Off);
    assert_eq!(rig.events(), vec![SwitchEvent::TurnedOff]);
}

#[test]
fn test_bounce_restarts_debounce() {
    let mut rig = Rig::new(SwitchConfig::momentary().with_debounce(Duration::from_millis(50)));
    rig.sample_at(0, true);
    rig.sample_at(10, false);
    rig.sample_at(30, true);
    assert_eq!(rig.run_until(79), SwitchState::Off);
    assert_eq!(rig.run(1), SwitchState::On);
    assert_eq!(rig.events(), vec![SwitchEvent::TurnedOn]);
}

#[test]
fn test_noise_never_turns_on() {
    let mut rig = Rig::new(SwitchConfig::momentary());
    for i in 0..100 {
        rig.set(i % 2 == 0);
        assert_eq!(rig.run(5), SwitchState::Off);
    }
    assert!(rig.events().is_empty());
}

#[test]
fn test_zero_debounce() {
    let mut rig = Rig::new(SwitchConfig::momentary().with_debounce(Duration::from_millis(0)));
    assert_eq!(rig.set(true), SwitchState::On);
    assert_eq!(rig.set(false), SwitchState::Off);
}

#[test]
fn test_delayed_turn_on() {
    let mut rig = Rig::new(SwitchConfig::delayed(Duration::from_millis(100)));
    assert_eq!(rig.press(19), SwitchState::Off);
    assert_eq!(rig.run(1), SwitchState::TurningOn);
    assert_eq!(rig.run(99), SwitchState::TurningOn);
    assert_eq!(rig.run(1), SwitchState::On);
    assert_eq!(rig.now, 120);
    assert_eq!(rig.events(), vec![SwitchEvent::TurnedOn]);
}

#[test]
fn test_delayed_release_abandons() {
    let mut rig = Rig::new(SwitchConfig::delayed(Duration::from_millis(100)));
    assert_eq!(rig.press(60), SwitchState::TurningOn);
    assert_eq!(rig.release(20), SwitchState::Off);
    assert_eq!(rig.run(500), SwitchState::Off);
    assert!(rig.events().is_empty());
}

#[test]
fn test_one_turn_on_per_press() {
    let mut rig = Rig::new(SwitchConfig::momentary());
    rig.press(5000);
    assert_eq!(rig.primary_events(), vec![SwitchEvent::TurnedOn]);
}

#[test]
fn test_disable_and_enable() {
    let mut rig = Rig::new(SwitchConfig::momentary());
    assert_eq!(rig.press(20), SwitchState::On);
    rig.events();

    rig.switch.disable();
    assert!(!rig.switch.is_enabled());
    assert_eq!(rig.switch.state(), SwitchState::Off);
    assert_eq!(rig.events(), vec![SwitchEvent::TurnedOff]);

    // Ignored while disabled
    assert_eq!(rig.release(50), SwitchState::Off);
    assert_eq!(rig.press(100), SwitchState::Off);

    // Held since before enabling
    rig.switch.enable();
    assert_eq!(rig.run(100), SwitchState::Off);
    assert!(rig.events().is_empty());

    rig.release(20);
    assert_eq!(rig.press(20), SwitchState::On);
    assert_eq!(rig.events(), vec![SwitchEvent::TurnedOn]);
}

#[test]
fn test_enable_while_press_is_debouncing() {
    let mut rig = Rig::new(SwitchConfig::momentary());
    rig.switch.disable();
    // Pressed while disabled, not debounced yet
    rig.press(5);
    rig.switch.enable();
    assert_eq!(rig.run(100), SwitchState::Off);
    assert_eq!(rig.release(20), SwitchState::Off);
    assert!(rig.events().is_empty());

    assert_eq!(rig.press(20), SwitchState::On);
    assert_eq!(rig.events(), vec![SwitchEvent::TurnedOn]);
}

#[test]
fn test_enable_while_press_bounces_back() {
    let mut rig = Rig::new(SwitchConfig::momentary());
    rig.switch.disable();
    rig.press(5);
    rig.switch.enable();
    // Never debounced, the next press counts
    rig.release(5);
    assert_eq!(rig.press(20), SwitchState::On);
    assert_eq!(rig.events(), vec![SwitchEvent::TurnedOn]);
}

#[test]
fn test_disable_off_switch_fires_nothing() {
    let mut rig = Rig::new(SwitchConfig::momentary());
    rig.switch.disable();
    rig.switch.disable();
    assert!(rig.events().is_empty());
    assert!(!rig.switch.outputs().is_enabled);
}

#[test]
fn test_reset_while_held() {
    let mut rig = Rig::new(SwitchConfig::momentary());
    rig.press(20);
    rig.switch.reset();
    assert_eq!(rig.switch.state(), SwitchState::Off);
    assert_eq!(rig.run(100), SwitchState::Off);
    assert_eq!(rig.events(), vec![SwitchEvent::TurnedOn, SwitchEvent::TurnedOff]);
}

#[test]
fn test_clock_going_backwards_is_clamped() {
    let mut rig = Rig::new(SwitchConfig::momentary());
    rig.sample_at(100, true);
    // Earlier than the last sample, counts as no elapsed time
    assert_eq!(rig.sample_at(50, true), SwitchState::Off);
    assert_eq!(rig.sample_at(119, true), SwitchState::Off);
    assert_eq!(rig.sample_at(120, true), SwitchState::On);
}

#[test]
fn test_huge_durations_never_elapse() {
    let mut rig = Rig::new(SwitchConfig::timed(Duration::MAX));
    assert_eq!(rig.press(20), SwitchState::On);
    assert_eq!(rig.release(20), SwitchState::Latched);
    assert_eq!(rig.run(1000), SwitchState::Latched);

    let mut rig = Rig::new(SwitchConfig::time_voidable(Duration::MAX));
    assert_eq!(rig.press(1000), SwitchState::On);
    assert_eq!(rig.release(20), SwitchState::Off);
}

#[test]
fn test_overflowing_thresholds_are_rejected() {
    let config = SwitchConfig::momentary()
        .with_debounce(Duration::MAX)
        .with_delay(Duration::from_millis(1));
    assert_eq!(Switch::new(config).err(), Some(ConfigError::DurationOverflow));

    let mut switch = Switch::new(SwitchConfig::momentary()).unwrap();
    assert_eq!(switch.reconfigure(config), Err(ConfigError::DurationOverflow));
}

#[test]
fn test_timestamps_near_the_end_of_time() {
    let mut switch = Switch::new(SwitchConfig::timed(Duration::from_secs(1))).unwrap();
    let start = u64::MAX - Duration::from_millis(30).as_ticks();
    assert_eq!(switch.update(true, Instant::from_ticks(start)), SwitchState::Off);
    let debounced = start + Duration::from_millis(20).as_ticks();
    assert_eq!(switch.update(true, Instant::from_ticks(debounced)), SwitchState::On);
    assert_eq!(switch.update(true, Instant::MAX), SwitchState::On);
    assert_eq!(switch.update(false, Instant::MAX), SwitchState::On);
}

#[test]
fn test_outputs_change_flag() {
    let mut rig = Rig::new(SwitchConfig::momentary());
    assert!(!rig.switch.take_outputs_change());
    rig.press(20);
    assert!(rig.switch.take_outputs_change());
    assert!(!rig.switch.take_outputs_change());
    assert_eq!(
        rig.switch.outputs(),
        SwitchOutputs {
            is_on: true,
            is_enabled: true,
            ..Default::default()
        }
    );
    assert_eq!(rig.switch.outputs().pack(), 0b11);
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = SwitchConfig::time_voidable(Duration::from_ticks(0));
    assert_eq!(Switch::new(config).err(), Some(ConfigError::ZeroVoidTime));
}

#[test]
fn test_reconfigure() {
    let mut rig = Rig::new(SwitchConfig::momentary());
    rig.press(20);
    assert!(rig.switch.reconfigure(SwitchConfig::toggle()).is_ok());
    assert_eq!(rig.switch.state(), SwitchState::Off);
    // The held press doesn't toggle the new switch
    assert_eq!(rig.run(50), SwitchState::Off);
    rig.release(20);
    rig.click(20);
    assert_eq!(rig.switch.state(), SwitchState::Latched);

    let invalid = SwitchConfig::timed(Duration::from_ticks(0));
    assert_eq!(rig.switch.reconfigure(invalid), Err(ConfigError::ZeroOnDuration));
    assert_eq!(rig.switch.state(), SwitchState::Latched);
}

#[test]
fn test_channel_hooks() {
    let channel: Channel<NoopRawMutex, SwitchEvent, 4> = Channel::new();
    let mut switch = Switch::with_hooks(SwitchConfig::momentary(), channel.sender()).unwrap();
    switch.update(true, ms(0));
    switch.update(true, ms(20));
    switch.update(false, ms(30));
    switch.update(false, ms(50));
    assert_eq!(switch.state(), SwitchState::Off);
    assert_eq!(channel.try_receive(), Ok(SwitchEvent::TurnedOn));
    assert_eq!(channel.try_receive(), Ok(SwitchEvent::TurnedOff));
    assert!(channel.try_receive().is_err());
}

#[test]
fn test_exact_threshold_press_with_delay() {
    let mut rig = Rig::new(SwitchConfig::delayed(Duration::from_millis(30)));
    // Held exactly debounce + delay
    assert_eq!(rig.press(50), SwitchState::On);
    assert_eq!(rig.release(20), SwitchState::Off);
    assert_eq!(rig.events(), vec![SwitchEvent::TurnedOn, SwitchEvent::TurnedOff]);
}
