//! Hardware Abstraction Layer for RustRotaryEncoder.
//!
//! Thin wrappers around ESP-IDF peripherals.
//! Business logic stays in core modules, HAL is just I/O.

pub mod encoder;

pub use encoder::{ConfigError, EncoderDriver, EncoderIsrContext};
