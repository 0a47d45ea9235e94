//! Fixed-capacity single-producer/single-consumer circular byte buffer.
//!
//! Two instances carry the whole bridge: host→device ("downlink", 128
//! bytes, backpressured) and device→host ("uplink", 256 bytes, lossy).
//! The capacity is a power of two so index wraparound is a bitmask, and
//! the cursors are 8-bit so a cursor update is a single-width atomic store
//! on every supported target — that, plus the rule that exactly one
//! context owns each cursor, is the entire synchronization story. No lock,
//! no disabled interrupts.
//!
//! [`ByteRing::split`] hands out one [`Producer`] and one [`Consumer`];
//! the borrow checker enforces the single-owner-per-cursor invariant that
//! the original design only documented.
//!
//! Occupancy reads taken from the "other side" may be stale by one
//! element. That is fine: emptiness/fullness checks only need conservative
//! bounds, never exact ones.

use core::sync::atomic::{AtomicU8, Ordering};

/// Error returned by [`Producer::try_push`] on a full ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PushError {
    /// The ring already holds `capacity` bytes.
    Full,
}

/// SPSC circular byte buffer with `N - 1` usable slots.
///
/// `N` must be a power of two, at most 256. One slot is deliberately
/// sacrificed so that `write == read` unambiguously means empty.
pub struct ByteRing<const N: usize> {
    slots: [AtomicU8; N],
    write: AtomicU8,
    read: AtomicU8,
}

impl<const N: usize> ByteRing<N> {
    const MASK: u8 = {
        assert!(N.is_power_of_two() && N >= 2 && N <= 256);
        (N - 1) as u8
    };

    /// An empty ring with both cursors at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: [const { AtomicU8::new(0) }; N],
            write: AtomicU8::new(0),
            read: AtomicU8::new(0),
        }
    }

    /// Split into the producer and consumer handles.
    ///
    /// The exclusive borrow guarantees this happens before either side
    /// starts running, and that there is never a second handle of either
    /// kind alive.
    pub fn split(&mut self) -> (Producer<'_, N>, Consumer<'_, N>) {
        (Producer { ring: self }, Consumer { ring: self })
    }

    /// Usable capacity (`N - 1`).
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    /// Current occupancy. A point-in-time snapshot; may be stale by one
    /// element relative to the other context.
    #[must_use]
    pub fn len(&self) -> usize {
        let w = self.write.load(Ordering::Acquire);
        let r = self.read.load(Ordering::Acquire);
        (w.wrapping_sub(r) & Self::MASK) as usize
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.len() == self.capacity()
    }
}

impl<const N: usize> Default for ByteRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Write-side handle: the only owner of the write cursor.
pub struct Producer<'a, const N: usize> {
    ring: &'a ByteRing<N>,
}

impl<'a, const N: usize> Producer<'a, N> {
    /// Push a byte, failing when the ring is full. Used on the downlink
    /// path, where the caller provides backpressure.
    pub fn try_push(&mut self, byte: u8) -> Result<(), PushError> {
        if self.ring.is_full() {
            return Err(PushError::Full);
        }
        let w = self.ring.write.load(Ordering::Relaxed);
        self.ring.slots[w as usize].store(byte, Ordering::Relaxed);
        self.ring.write
            .store(w.wrapping_add(1) & ByteRing::<N>::MASK, Ordering::Release);
        Ok(())
    }

    /// Push a byte unconditionally. Used on the uplink path, whose
    /// producer runs in interrupt context and cannot wait.
    ///
    /// On a full ring the write cursor laps the read cursor: occupancy
    /// wraps back through zero and the buffered backlog is silently lost.
    /// That overflow hazard is accepted by design — the read cursor is
    /// never touched, so the single-owner rule still holds.
    pub fn push_lossy(&mut self, byte: u8) {
        let w = self.ring.write.load(Ordering::Relaxed);
        self.ring.slots[w as usize].store(byte, Ordering::Relaxed);
        self.ring.write
            .store(w.wrapping_add(1) & ByteRing::<N>::MASK, Ordering::Release);
    }

    /// Occupancy after this producer's last push; stale only with respect
    /// to concurrent pops, so it is an upper bound.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.ring.is_full()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        N - 1
    }
}

/// Read-side handle: the only owner of the read cursor.
pub struct Consumer<'a, const N: usize> {
    ring: &'a ByteRing<N>,
}

impl<'a, const N: usize> Consumer<'a, N> {
    /// Pop the oldest byte, or `None` when empty. Callers must check
    /// emptiness via the return value — there is no other signal.
    pub fn pop(&mut self) -> Option<u8> {
        let r = self.ring.read.load(Ordering::Relaxed);
        if r == self.ring.write.load(Ordering::Acquire) {
            return None;
        }
        let byte = self.ring.slots[r as usize].load(Ordering::Relaxed);
        self.ring.read
            .store(r.wrapping_add(1) & ByteRing::<N>::MASK, Ordering::Release);
        Some(byte)
    }

    /// Look at the oldest byte without consuming it.
    #[must_use]
    pub fn peek(&self) -> Option<u8> {
        let r = self.ring.read.load(Ordering::Relaxed);
        if r == self.ring.write.load(Ordering::Acquire) {
            return None;
        }
        Some(self.ring.slots[r as usize].load(Ordering::Relaxed))
    }

    /// Occupancy; stale only with respect to concurrent pushes, so it is
    /// a lower bound.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        N - 1
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::vec::Vec;

    #[test]
    fn starts_empty() {
        let ring: ByteRing<16> = ByteRing::new();
        assert_eq!(ring.len(), 0);
        assert!(ring.is_empty());
        assert!(!ring.is_full());
        assert_eq!(ring.capacity(), 15);
    }

    #[test]
    fn push_pop_fifo_order() {
        let mut ring: ByteRing<16> = ByteRing::new();
        let (mut prod, mut cons) = ring.split();

        for b in 0..10u8 {
            prod.try_push(b).unwrap();
        }
        let drained: Vec<u8> = core::iter::from_fn(|| cons.pop()).collect();
        assert_eq!(drained, (0..10).collect::<Vec<u8>>());
        assert!(cons.is_empty());
    }

    #[test]
    fn full_at_capacity_minus_one() {
        let mut ring: ByteRing<8> = ByteRing::new();
        let (mut prod, mut cons) = ring.split();

        for b in 0..7u8 {
            prod.try_push(b).unwrap();
        }
        assert!(prod.is_full());
        assert_eq!(prod.try_push(7), Err(PushError::Full));

        // One pop frees exactly one slot.
        assert_eq!(cons.pop(), Some(0));
        prod.try_push(7).unwrap();
        assert_eq!(prod.try_push(8), Err(PushError::Full));
    }

    #[test]
    fn pop_on_empty_is_none() {
        let mut ring: ByteRing<8> = ByteRing::new();
        let (_prod, mut cons) = ring.split();
        assert_eq!(cons.pop(), None);
        assert_eq!(cons.peek(), None);
    }

    #[test]
    fn count_never_exceeds_capacity_under_interleaving() {
        let mut ring: ByteRing<16> = ByteRing::new();
        let (mut prod, mut cons) = ring.split();

        // Deterministic irregular interleave of pushes and pops.
        let mut pushed = 0usize;
        let mut popped = 0usize;
        for step in 0..1000 {
            if step % 3 != 0 {
                if prod.try_push(step as u8).is_ok() {
                    pushed += 1;
                }
            } else if cons.pop().is_some() {
                popped += 1;
            }
            let len = cons.len();
            assert!(len <= cons.capacity());
            assert_eq!(len, pushed - popped);
        }
    }

    #[test]
    fn wraparound_preserves_order() {
        let mut ring: ByteRing<8> = ByteRing::new();
        let (mut prod, mut cons) = ring.split();

        // Cycle the cursors well past the mask boundary.
        for round in 0..40u8 {
            for i in 0..5u8 {
                prod.try_push(round.wrapping_mul(5).wrapping_add(i)).unwrap();
            }
            for i in 0..5u8 {
                assert_eq!(cons.pop(), Some(round.wrapping_mul(5).wrapping_add(i)));
            }
        }
    }

    #[test]
    fn lossy_push_laps_and_wraps_occupancy() {
        let mut ring: ByteRing<8> = ByteRing::new();
        let (mut prod, mut cons) = ring.split();

        // Fill past capacity: after N blind pushes the write cursor has
        // lapped the read cursor and occupancy reads as zero.
        for b in 0..8u8 {
            prod.push_lossy(b);
        }
        assert_eq!(cons.len(), 0);
        assert_eq!(cons.pop(), None);

        // The ring recovers as soon as new data arrives.
        prod.push_lossy(0xAB);
        assert_eq!(cons.pop(), Some(0xAB));
    }

    #[test]
    fn peek_does_not_consume() {
        let mut ring: ByteRing<8> = ByteRing::new();
        let (mut prod, mut cons) = ring.split();
        prod.try_push(0x42).unwrap();
        assert_eq!(cons.peek(), Some(0x42));
        assert_eq!(cons.peek(), Some(0x42));
        assert_eq!(cons.len(), 1);
        assert_eq!(cons.pop(), Some(0x42));
    }

    #[test]
    fn full_capacity_256_uses_natural_u8_wrap() {
        let mut ring: ByteRing<256> = ByteRing::new();
        let (mut prod, mut cons) = ring.split();
        for b in 0..255u8 {
            prod.try_push(b).unwrap();
        }
        assert!(prod.is_full());
        assert_eq!(prod.try_push(0), Err(PushError::Full));
        for b in 0..255u8 {
            assert_eq!(cons.pop(), Some(b));
        }
        assert!(cons.is_empty());
    }

    #[test]
    fn concurrent_producer_consumer_transfers_everything() {
        let mut ring: ByteRing<128> = ByteRing::new();
        let (mut prod, mut cons) = ring.split();

        std::thread::scope(|s| {
            s.spawn(move || {
                for b in 0..=255u8 {
                    loop {
                        if prod.try_push(b).is_ok() {
                            break;
                        }
                        std::thread::yield_now();
                    }
                }
            });

            let mut received = Vec::new();
            while received.len() < 256 {
                if let Some(b) = cons.pop() {
                    received.push(b);
                } else {
                    std::thread::yield_now();
                }
            }
            assert_eq!(received, (0..=255u8).collect::<Vec<u8>>());
        });
    }
}
