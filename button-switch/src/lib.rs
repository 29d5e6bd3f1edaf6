//! Turn a bouncing momentary push button into a switch.
//!
//! A [`Switch`] consumes raw "pressed" samples with timestamps and runs them through a stack of
//! behaviors selected by its [`SwitchConfig`]:
//!
//! - debounce and start delay,
//! - momentary, latched, toggle and externally unlatched release behaviors,
//! - service timer with warning and pilot outputs,
//! - double-action: secondary output, combo or slider on long press,
//! - voiding by predicate, request, time, or after a single service.
//!
//! The crate is `no_std` and never touches hardware by itself. [`ButtonInput`] is a thin
//! adapter reading the raw sample from an [`embedded_hal::digital::InputPin`].
//!
//! ## Feature flags
#![doc = document_features::document_features!()]
#![no_std]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod config;
pub mod debounce;
pub mod event;
pub mod input;
pub mod press;
pub mod sequence;
pub mod slider;
pub mod state;
pub mod switch;

pub use config::{
    ConfigError, DoubleActionConfig, HintConfig, LatchMode, SecondaryMode, ServiceConfig, SwitchConfig,
    VoidCondition,
};
pub use event::{Callbacks, SwitchEvent, SwitchHooks};
pub use input::{ButtonInput, Wiring};
pub use sequence::{PressKind, PressPattern};
pub use slider::{SliderConfig, SliderDirection};
pub use state::{SwitchOutputs, SwitchState};
pub use switch::Switch;
