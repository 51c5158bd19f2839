//! Module: config
//!
//! Purpose: Runtime configuration for the encoder reader.
//!
//! Architecture:
//! - Pin assignment and UART settings are compile-time constants
//! - The few runtime-tunable parameters are plain atomics behind a static
//!   `CONFIG`, lock-free so both the ISR path and the report loop can
//!   read them at any time
//! - A generation counter is bumped on every change so consumers can
//!   detect updates cheaply
//!
//! Safety: RT-safe. All access via atomics, no locks.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// GPIO pin for encoder channel A.
pub const ENCODER_A_PIN: i32 = 14;

/// GPIO pin for encoder channel B.
pub const ENCODER_B_PIN: i32 = 15;

/// Baud rate of the UART report output.
pub const REPORT_BAUD_RATE: u32 = 115200;

/// UART TX pin for report output (UART1 routed to GPIO17; GPIO6-11 are
/// flash pins on the classic ESP32).
pub const REPORT_TX_PIN: i32 = 17;

/// Lock-free runtime configuration.
pub struct EncoderConfig {
    /// Swap the A and B channels at the ISR boundary, inverting the
    /// counting direction without touching the decode table.
    swap_channels: AtomicBool,

    /// Record a `MovementEvent` for every decoded step.
    movement_log: AtomicBool,

    /// Report loop poll interval in milliseconds.
    report_interval_ms: AtomicU32,

    /// Bumped on every change.
    generation: AtomicU32,
}

impl EncoderConfig {
    pub const fn new() -> Self {
        Self {
            swap_channels: AtomicBool::new(false),
            movement_log: AtomicBool::new(true),
            report_interval_ms: AtomicU32::new(100),
            generation: AtomicU32::new(0),
        }
    }

    #[inline]
    pub fn swap_channels(&self) -> bool {
        self.swap_channels.load(Ordering::Relaxed)
    }

    pub fn set_swap_channels(&self, swap: bool) {
        self.swap_channels.store(swap, Ordering::Relaxed);
        self.bump();
    }

    #[inline]
    pub fn movement_log(&self) -> bool {
        self.movement_log.load(Ordering::Relaxed)
    }

    pub fn set_movement_log(&self, enabled: bool) {
        self.movement_log.store(enabled, Ordering::Relaxed);
        self.bump();
    }

    #[inline]
    pub fn report_interval_ms(&self) -> u32 {
        self.report_interval_ms.load(Ordering::Relaxed)
    }

    pub fn set_report_interval_ms(&self, ms: u32) {
        // A zero interval would spin the report loop.
        self.report_interval_ms.store(ms.max(1), Ordering::Relaxed);
        self.bump();
    }

    /// Current generation number.
    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation.load(Ordering::Acquire)
    }

    fn bump(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Global configuration instance.
pub static CONFIG: EncoderConfig = EncoderConfig::new();
