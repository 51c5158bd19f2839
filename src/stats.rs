//! Module: stats
//!
//! Purpose: Diagnostic counters for the quadrature decoder.
//!
//! A dropped edge notification is not an error (see `decoder`): duplicate
//! notifications are expected from the interrupt layer, and a diagonal
//! phase jump means an edge was missed and its tick is deliberately
//! discarded for parity with the reference device. These counters make
//! both cases observable without changing the count semantics.
//!
//! Safety: RT-safe. All access via atomics, no locks.

use core::sync::atomic::{AtomicU32, Ordering};

/// Thread-safe decoder diagnostics.
///
/// Incremented from the edge ISR, read from the reporting loop. Counters
/// are independent of the (phase, count) state and only ever grow.
pub struct EncoderStats {
    /// Valid single Gray-code steps applied (count changed).
    steps: AtomicU32,

    /// Notifications where the observed phase equaled the stored phase.
    spurious: AtomicU32,

    /// Diagonal phase jumps: an intermediate edge was missed and the
    /// tick was discarded.
    skips: AtomicU32,
}

impl EncoderStats {
    /// Create zeroed stats.
    pub const fn new() -> Self {
        Self {
            steps: AtomicU32::new(0),
            spurious: AtomicU32::new(0),
            skips: AtomicU32::new(0),
        }
    }

    #[inline]
    pub(crate) fn record_step(&self) {
        self.steps.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_spurious(&self) {
        self.spurious.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_skip(&self) {
        self.skips.fetch_add(1, Ordering::Relaxed);
    }

    /// Total count-changing steps.
    #[inline]
    pub fn steps(&self) -> u32 {
        self.steps.load(Ordering::Relaxed)
    }

    /// Total filtered duplicate notifications.
    #[inline]
    pub fn spurious(&self) -> u32 {
        self.spurious.load(Ordering::Relaxed)
    }

    /// Total detected missed-edge jumps.
    #[inline]
    pub fn skips(&self) -> u32 {
        self.skips.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all counters at a point in time.
    #[inline]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            steps: self.steps(),
            spurious: self.spurious(),
            skips: self.skips(),
        }
    }
}

impl Default for EncoderStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of decoder diagnostics at a point in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub steps: u32,
    pub spurious: u32,
    pub skips: u32,
}
