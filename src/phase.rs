//! Module: phase
//!
//! Purpose: Quadrature phase representation and the Gray-code transition
//! table. A phase is the 2-bit combination of channel A and B levels; the
//! four phases form the cycle 00 → 10 → 11 → 01 → 00 (one direction of
//! rotation traverses it forward, the other backward).
//!
//! Architecture:
//! - `Phase` is a compact bitflag newtype (bit 0 = channel A, bit 1 = B)
//! - Valid successors live in an explicit data table, not nested branches,
//!   so a diagonal jump (both channels flipped, i.e. a missed edge) is a
//!   clear "no matching entry" case
//!
//! Safety: Safe. No unsafe blocks. Copy types only.

/// Rotation direction decoded from a single phase step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Forward traversal of the Gray cycle (00 → 10 → 11 → 01 → 00).
    Clockwise,
    /// Backward traversal.
    CounterClockwise,
}

impl Direction {
    /// Count contribution of one step in this direction.
    #[inline]
    pub const fn delta(self) -> i32 {
        match self {
            Direction::Clockwise => 1,
            Direction::CounterClockwise => -1,
        }
    }

    /// Short label for reports.
    pub const fn as_str(self) -> &'static str {
        match self {
            Direction::Clockwise => "CW",
            Direction::CounterClockwise => "CCW",
        }
    }
}

/// Quadrature phase: the last-observed levels of both channels.
///
/// Bit layout:
/// - Bit 0: channel A level
/// - Bit 1: channel B level
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Phase(u8);

/// Valid successors per phase, indexed by `Phase::bits()`:
/// `(clockwise successor, counter-clockwise successor)`.
///
/// Any observed transition not listed here is a diagonal jump, meaning at
/// least one intermediate edge was missed.
const TRANSITIONS: [(Phase, Phase); 4] = [
    (Phase(Phase::A), Phase(Phase::B)),             // from 00
    (Phase(Phase::A | Phase::B), Phase(0)),         // from A only
    (Phase(0), Phase(Phase::A | Phase::B)),         // from B only
    (Phase(Phase::B), Phase(Phase::A)),             // from AB
];

impl Phase {
    /// Channel A bit mask (bit 0).
    pub const A: u8 = 0x01;

    /// Channel B bit mask (bit 1).
    pub const B: u8 = 0x02;

    /// Phase with both channels low.
    pub const LOW: Self = Self(0);

    /// Build a phase from the two channel levels.
    #[inline]
    pub const fn from_levels(a: bool, b: bool) -> Self {
        Self((a as u8) | ((b as u8) << 1))
    }

    /// Raw 2-bit value.
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Rebuild a phase from its raw bits (upper bits ignored).
    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & (Self::A | Self::B))
    }

    /// Channel A level.
    #[inline]
    pub const fn a(self) -> bool {
        (self.0 & Self::A) != 0
    }

    /// Channel B level.
    #[inline]
    pub const fn b(self) -> bool {
        (self.0 & Self::B) != 0
    }

    /// The phase one clockwise step ahead.
    #[inline]
    pub const fn cw_next(self) -> Self {
        TRANSITIONS[self.0 as usize].0
    }

    /// The phase one counter-clockwise step ahead.
    #[inline]
    pub const fn ccw_next(self) -> Self {
        TRANSITIONS[self.0 as usize].1
    }

    /// Classify the transition from `self` to `next`.
    ///
    /// Returns `None` when `next` is not a valid single Gray-code step:
    /// either the phase did not change, or both channels appear to have
    /// flipped at once (a missed edge). Callers that need to distinguish
    /// the two cases compare the phases first.
    #[inline]
    pub fn step_to(self, next: Phase) -> Option<Direction> {
        let (cw, ccw) = TRANSITIONS[self.0 as usize];
        if next == cw {
            Some(Direction::Clockwise)
        } else if next == ccw {
            Some(Direction::CounterClockwise)
        } else {
            None
        }
    }
}
