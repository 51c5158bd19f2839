//! Module: decoder
//!
//! Purpose: Quadrature decoding state machine. Accumulates a signed
//! position count from the stream of (A, B) level observations delivered
//! by the pin ISRs, and serves lock-free reads and resets from normal
//! task context.
//!
//! Architecture:
//! - The stored phase and the count form one logical unit. Both live
//!   packed in a single `AtomicU64` (count in the low 32 bits, phase bits
//!   above), updated with a compare-and-swap retry loop so two
//!   near-simultaneous edges (one per channel, possibly on different
//!   cores) can never interleave their read-modify-write
//! - `value()` is a single atomic load: a reader sees either the state
//!   before or after any in-flight edge, never a torn mix
//! - No operation blocks, allocates, or formats; everything is safe to
//!   call from ISR context
//!
//! Safety: Safe. No unsafe blocks; coordination is entirely atomic.

use core::sync::atomic::{AtomicU64, Ordering};

use crate::phase::{Direction, Phase};
use crate::stats::{EncoderStats, StatsSnapshot};

/// Low 32 bits: position count as `i32`.
const COUNT_MASK: u64 = 0xFFFF_FFFF;

/// Phase bits sit just above the count.
const PHASE_SHIFT: u32 = 32;

#[inline]
const fn pack(phase: Phase, count: i32) -> u64 {
    ((phase.bits() as u64) << PHASE_SHIFT) | (count as u32 as u64)
}

#[inline]
const fn unpack_phase(state: u64) -> Phase {
    Phase::from_bits((state >> PHASE_SHIFT) as u8)
}

#[inline]
const fn unpack_count(state: u64) -> i32 {
    (state & COUNT_MASK) as u32 as i32
}

/// Quadrature decoder: last-observed phase plus signed position count.
///
/// The decoder itself is hardware-free; the platform layer (`hal`) reads
/// the pins and feeds every edge notification into [`on_edge`]. Multiple
/// independent decoders can coexist, one per encoder.
///
/// [`on_edge`]: QuadratureDecoder::on_edge
///
/// # Example
///
/// ```
/// use rust_rotary_encoder::{Direction, QuadratureDecoder};
///
/// let dec = QuadratureDecoder::new();
/// // One clockwise detent from (0,0): A rises first.
/// assert_eq!(dec.on_edge(true, false), Some(Direction::Clockwise));
/// assert_eq!(dec.value(), 1);
/// ```
pub struct QuadratureDecoder {
    /// Packed (phase, count), updated only as a unit.
    state: AtomicU64,

    /// Diagnostics (separate from the state word; purely informational).
    stats: EncoderStats,
}

impl QuadratureDecoder {
    /// Create a decoder with both channels assumed low and count 0.
    ///
    /// The hardware driver calls [`resync`](Self::resync) with the live
    /// pin levels before enabling interrupts, so the initial phase here
    /// only matters for hardware-free use.
    pub const fn new() -> Self {
        Self::with_phase(Phase::LOW)
    }

    /// Create a decoder starting from a known phase.
    pub const fn with_phase(phase: Phase) -> Self {
        Self {
            state: AtomicU64::new(pack(phase, 0)),
            stats: EncoderStats::new(),
        }
    }

    /// Process one edge notification.
    ///
    /// `a` and `b` are the current levels of both channels, read at
    /// notification time (both are read because the other channel may have
    /// moved too, and because the interrupt layer may deliver duplicates).
    ///
    /// - Phase unchanged: duplicate notification, filtered (returns `None`).
    /// - Valid single Gray-code step: count moves by ±1, returns the
    ///   direction.
    /// - Diagonal jump (both channels flipped, an edge was missed): the
    ///   tick is discarded for parity with the reference device and only
    ///   the skip counter records it; the stored phase still resyncs to
    ///   the observed pair so the next edge is judged from reality.
    ///
    /// Bounded, lock-free, ISR-safe.
    #[inline]
    pub fn on_edge(&self, a: bool, b: bool) -> Option<Direction> {
        let observed = Phase::from_levels(a, b);

        let mut cur = self.state.load(Ordering::Acquire);
        loop {
            let phase = unpack_phase(cur);
            if observed == phase {
                self.stats.record_spurious();
                return None;
            }

            let step = phase.step_to(observed);
            let count = match step {
                Some(dir) => unpack_count(cur).wrapping_add(dir.delta()),
                None => unpack_count(cur),
            };

            match self.state.compare_exchange_weak(
                cur,
                pack(observed, count),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    match step {
                        Some(_) => self.stats.record_step(),
                        None => self.stats.record_skip(),
                    }
                    return step;
                }
                // Lost a race with the other channel's ISR or a reset;
                // re-evaluate against the fresh state.
                Err(actual) => cur = actual,
            }
        }
    }

    /// Current position count. Never torn, never blocks.
    #[inline]
    pub fn value(&self) -> i32 {
        unpack_count(self.state.load(Ordering::Acquire))
    }

    /// Last-observed phase (stored alongside the count).
    #[inline]
    pub fn phase(&self) -> Phase {
        unpack_phase(self.state.load(Ordering::Acquire))
    }

    /// Set the count to 0, leaving the stored phase untouched.
    ///
    /// Against a concurrent edge this is last-writer-wins: the final state
    /// is one of the two consistent outcomes, never a corrupted mix.
    #[inline]
    pub fn reset(&self) {
        let mut cur = self.state.load(Ordering::Acquire);
        loop {
            let cleared = pack(unpack_phase(cur), 0);
            match self.state.compare_exchange_weak(
                cur,
                cleared,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return,
                Err(actual) => cur = actual,
            }
        }
    }

    /// Commit the given levels as the stored phase without counting.
    ///
    /// Used at driver construction (the pins' live levels become the
    /// starting phase) and usable for recovery after a known disturbance.
    pub fn resync(&self, a: bool, b: bool) {
        let observed = Phase::from_levels(a, b);
        let mut cur = self.state.load(Ordering::Acquire);
        loop {
            let synced = pack(observed, unpack_count(cur));
            match self.state.compare_exchange_weak(
                cur,
                synced,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return,
                Err(actual) => cur = actual,
            }
        }
    }

    /// Snapshot of the diagnostic counters.
    #[inline]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

impl Default for QuadratureDecoder {
    fn default() -> Self {
        Self::new()
    }
}
