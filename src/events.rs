//! Module: events
//!
//! Purpose: ISR-safe movement event stream. The pin ISRs must never
//! format text or touch a blocking API, so movement is recorded as
//! compact `Copy` records in a lock-free ring and rendered later by the
//! reporting loop.
//!
//! Architecture:
//! - Multiple producers (the A and B channel ISRs can race, including
//!   across cores); each claims a unique slot with a compare-and-swap
//!   on the write index
//! - Single consumer (the report loop) drains at its leisure
//! - Push never blocks; when the ring is full the event is dropped and
//!   counted, and no slot is claimed
//!
//! Safety: Uses `UnsafeCell` internally; producers get unique slots from
//! `fetch_add`, the single consumer reads behind the write index.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU32, Ordering};

use crate::phase::Direction;

/// Default ring capacity. Must be a power of 2.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// One decoded movement step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MovementEvent {
    /// Timestamp in microseconds (esp_timer clock).
    pub timestamp_us: i64,
    /// Count value immediately after the step.
    pub count: i32,
    /// Step direction.
    pub direction: Direction,
}

/// Lock-free movement ring (multiple producers, single consumer).
pub struct MovementStream<const N: usize = DEFAULT_EVENT_CAPACITY> {
    slots: UnsafeCell<[MovementEvent; N]>,
    write_idx: AtomicU32,
    read_idx: AtomicU32,
    dropped: AtomicU32,
}

// SAFETY: Producers claim unique slots via compare-and-swap on the
// write index, the single consumer only reads slots behind write_idx.
unsafe impl<const N: usize> Sync for MovementStream<N> {}
unsafe impl<const N: usize> Send for MovementStream<N> {}

const EMPTY_EVENT: MovementEvent = MovementEvent {
    timestamp_us: 0,
    count: 0,
    direction: Direction::Clockwise,
};

impl<const N: usize> MovementStream<N> {
    const MASK: usize = N - 1;

    /// Create an empty stream.
    ///
    /// # Panics
    ///
    /// Panics at compile time if N is not a power of 2.
    pub const fn new() -> Self {
        assert!(N.is_power_of_two(), "Event ring size must be power of 2");

        Self {
            slots: UnsafeCell::new([EMPTY_EVENT; N]),
            write_idx: AtomicU32::new(0),
            read_idx: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    /// Push an event (ISR-safe, never blocks).
    ///
    /// Returns `true` if queued, `false` if dropped (ring full).
    #[inline]
    pub fn push(&self, event: MovementEvent) -> bool {
        // Claim a slot only when there is room. A rejected push must not
        // advance the write index: the consumer would otherwise drain a
        // slot that was never written and the ring would leak one slot
        // of capacity per overflow.
        let mut write = self.write_idx.load(Ordering::Relaxed);
        loop {
            let read = self.read_idx.load(Ordering::Acquire);
            if write.wrapping_sub(read) >= N as u32 {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return false;
            }

            match self.write_idx.compare_exchange_weak(
                write,
                write.wrapping_add(1),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                // Another producer claimed this slot; retry on the
                // fresh index.
                Err(actual) => write = actual,
            }
        }

        // SAFETY: the compare_exchange handed this producer a unique slot.
        unsafe {
            (*self.slots.get())[(write as usize) & Self::MASK] = event;
        }
        true
    }

    /// Drain the next event (report loop only).
    #[inline]
    pub fn drain(&self) -> Option<MovementEvent> {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);

        if read == write {
            return None;
        }

        // SAFETY: Single consumer, slot is behind the write index.
        let event = unsafe { (*self.slots.get())[(read as usize) & Self::MASK] };

        self.read_idx.store(read.wrapping_add(1), Ordering::Release);
        Some(event)
    }

    /// Number of events waiting to be drained.
    #[inline]
    pub fn pending(&self) -> u32 {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);
        write.wrapping_sub(read)
    }

    /// Count of events dropped because the ring was full.
    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Reset the dropped counter (after reporting it).
    #[inline]
    pub fn reset_dropped(&self) {
        self.dropped.store(0, Ordering::Relaxed);
    }
}

impl<const N: usize> Default for MovementStream<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(ts: i64, count: i32, direction: Direction) -> MovementEvent {
        MovementEvent { timestamp_us: ts, count, direction }
    }

    #[test]
    fn test_push_drain_roundtrip() {
        let stream = MovementStream::<8>::new();

        assert!(stream.push(ev(100, 1, Direction::Clockwise)));
        assert!(stream.push(ev(200, 0, Direction::CounterClockwise)));
        assert_eq!(stream.pending(), 2);

        assert_eq!(stream.drain(), Some(ev(100, 1, Direction::Clockwise)));
        assert_eq!(stream.drain(), Some(ev(200, 0, Direction::CounterClockwise)));
        assert_eq!(stream.drain(), None);
    }

    #[test]
    fn test_full_ring_drops() {
        let stream = MovementStream::<4>::new();

        for i in 0..4 {
            assert!(stream.push(ev(i, i as i32, Direction::Clockwise)));
        }
        assert!(!stream.push(ev(9, 9, Direction::Clockwise)));
        assert_eq!(stream.dropped(), 1);

        // The rejected push claimed nothing.
        assert_eq!(stream.pending(), 4);

        // Draining frees a slot.
        stream.drain();
        assert!(stream.push(ev(10, 10, Direction::Clockwise)));

        stream.reset_dropped();
        assert_eq!(stream.dropped(), 0);
    }

    #[test]
    fn test_overflow_keeps_capacity_and_never_replays_stale_slots() {
        let stream = MovementStream::<4>::new();

        for i in 0..4 {
            assert!(stream.push(ev(i, i as i32, Direction::Clockwise)));
        }

        // Overflow repeatedly; none of these may claim a slot.
        for _ in 0..3 {
            assert!(!stream.push(ev(99, 99, Direction::CounterClockwise)));
        }
        assert_eq!(stream.pending(), 4);
        assert_eq!(stream.dropped(), 3);

        // Exactly the four stored events come out, in order, and the
        // ring is empty afterwards (no stale duplicate of slot 0).
        for i in 0..4 {
            assert_eq!(stream.drain(), Some(ev(i, i as i32, Direction::Clockwise)));
        }
        assert_eq!(stream.drain(), None);
        assert_eq!(stream.pending(), 0);

        // Full capacity is available again after the overflow.
        for i in 0..4 {
            assert!(stream.push(ev(10 + i, i as i32, Direction::Clockwise)));
        }
        assert_eq!(stream.pending(), 4);
    }

    #[test]
    fn test_two_producers() {
        use std::sync::Arc;
        use std::thread;

        let stream = Arc::new(MovementStream::<256>::new());
        let mut handles = vec![];

        // Two producers, like the A and B channel ISRs.
        for t in 0..2 {
            let stream = Arc::clone(&stream);
            handles.push(thread::spawn(move || {
                for i in 0..100 {
                    stream.push(ev(i, (t * 100 + i) as i32, Direction::Clockwise));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let mut count = 0;
        while stream.drain().is_some() {
            count += 1;
        }
        assert_eq!(count, 200);
    }
}
