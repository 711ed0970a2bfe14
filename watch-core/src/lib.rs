#![cfg_attr(not(any(test, feature = "std")), no_std)]

//! # Watch Core
//!
//! Stopwatch app and half-duplex packet radio engine for a radio-equipped
//! wristwatch. Both are plain state structs driven by the host's tick,
//! key and radio interrupt dispatch; hardware access goes through the
//! traits in [`hal`].

pub mod types;
pub mod stopwatch;
pub mod packet;
pub mod controller;
pub mod hal;

#[cfg(feature = "test-utils")]
pub mod test_utils;


pub use types::*;
pub use stopwatch::*;
pub use packet::*;
pub use controller::*;
pub use hal::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default stopwatch configuration: alarm off at 00:03:00, descending four-tone melody
pub fn default_stopwatch_config() -> StopwatchConfig {
    StopwatchConfig::default()
}

/// Default radio configuration: refuse to transmit over an armed receiver
pub fn default_radio_config() -> RadioConfig {
    RadioConfig::default()
}
