//! # RustRotaryEncoder
//!
//! Interrupt-driven quadrature rotary encoder reader for ESP32.
//!
//! ## Architecture
//!
//! The decode logic is hardware-free and lock-free:
//! - [`QuadratureDecoder`] holds (phase, count) packed in one atomic word;
//!   pin ISRs feed it edge notifications, any task reads or resets it
//! - The `hal` layer (espidf targets only) owns the pins and the ISR
//!   registration; it contains no decode logic
//! - Movement is recorded as compact events in a lock-free ring and
//!   rendered by the UART report loop, never in the ISR
//!
//! Core modules build and test on the host; only `hal` and the firmware
//! entry point need the ESP-IDF toolchain.

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod decoder;
pub mod events;
pub mod phase;
pub mod report;
pub mod stats;

#[cfg(target_os = "espidf")]
pub mod hal;

pub use config::{EncoderConfig, CONFIG};
pub use decoder::QuadratureDecoder;
pub use events::{MovementEvent, MovementStream};
pub use phase::{Direction, Phase};
pub use stats::{EncoderStats, StatsSnapshot};

#[cfg(target_os = "espidf")]
pub use hal::{ConfigError, EncoderDriver, EncoderIsrContext};
