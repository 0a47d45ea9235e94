//! Downlink plumbing: backpressured writes and transmit arm/disarm.
//!
//! The downlink ring sits between the USB OUT endpoint (mainline producer)
//! and the serial transmit-drain context (interrupt consumer). The drain
//! only runs while "armed"; arming and disarming track the ring's
//! idle/non-idle transitions so the peripheral is never left interrupting
//! with nothing to send, and never left asleep with bytes queued.

use crate::ring::{Consumer, Producer};

/// Control over the serial transmit-drain context.
///
/// On hardware this arms or masks the transmit-data-empty interrupt; in
/// the async firmware it wakes or parks the TX task; in tests it counts.
/// Both the writer and the drain hold their own handle, mirroring how the
/// mainline and the ISR each poke the same peripheral register.
pub trait TxControl {
    /// Enable the drain. Called once per idle→non-idle transition.
    fn arm(&mut self);
    /// Disable the drain. Called once per non-idle→idle transition.
    fn disarm(&mut self);
}

/// Producer-side handle for the downlink ring.
///
/// [`push`](Self::push) is the sole backpressure mechanism on the
/// host→device path: it busy-polls while the ring is full. The wait is
/// bounded because the drain is guaranteed armed whenever occupancy is
/// non-zero.
pub struct DownlinkWriter<'a, const N: usize, T: TxControl> {
    prod: Producer<'a, N>,
    tx: T,
}

impl<'a, const N: usize, T: TxControl> DownlinkWriter<'a, N, T> {
    pub fn new(prod: Producer<'a, N>, tx: T) -> Self {
        Self { prod, tx }
    }

    /// Push one byte toward the serial peripheral, waiting for space if
    /// necessary.
    ///
    /// The drain is armed exactly when this push brought occupancy from
    /// zero to one. The check reads occupancy *after* the store so a push
    /// racing a concurrent drain-to-empty still arms; the worst case is
    /// one spurious arm, which the drain shrugs off.
    pub fn push(&mut self, byte: u8) {
        while self.prod.try_push(byte).is_err() {
            core::hint::spin_loop();
        }
        if self.prod.len() == 1 {
            self.tx.arm();
        }
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.prod.is_full()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.prod.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prod.is_empty()
    }
}

/// Consumer-side handle for the downlink ring, owned by the transmit
/// context.
pub struct DownlinkDrain<'a, const N: usize, T: TxControl> {
    cons: Consumer<'a, N>,
    tx: T,
}

impl<'a, const N: usize, T: TxControl> DownlinkDrain<'a, N, T> {
    pub fn new(cons: Consumer<'a, N>, tx: T) -> Self {
        Self { cons, tx }
    }

    /// Take the next byte for transmission.
    ///
    /// Disarms the drain when this pop emptied the ring, then rechecks:
    /// a writer that raced the drain may have skipped its arm, so a
    /// non-empty ring after disarming re-arms immediately.
    pub fn pop(&mut self) -> Option<u8> {
        let byte = self.cons.pop()?;
        if self.cons.is_empty() {
            self.tx.disarm();
            if !self.cons.is_empty() {
                self.tx.arm();
            }
        }
        Some(byte)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cons.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cons.is_empty()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::ring::ByteRing;
    use core::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Shared arm/disarm counter standing in for the peripheral register.
    #[derive(Default)]
    struct TxCounters {
        arms: AtomicUsize,
        disarms: AtomicUsize,
    }

    struct CountingTx<'c>(&'c TxCounters);

    impl TxControl for CountingTx<'_> {
        fn arm(&mut self) {
            self.0.arms.fetch_add(1, Ordering::SeqCst);
        }
        fn disarm(&mut self) {
            self.0.disarms.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn arm_once_per_idle_to_nonidle_transition() {
        let counters = TxCounters::default();
        let mut ring: ByteRing<16> = ByteRing::new();
        let (prod, cons) = ring.split();
        let mut writer = DownlinkWriter::new(prod, CountingTx(&counters));
        let mut drain = DownlinkDrain::new(cons, CountingTx(&counters));

        writer.push(1);
        assert_eq!(counters.arms.load(Ordering::SeqCst), 1);

        // Repeated pushes while non-empty must not re-arm.
        writer.push(2);
        writer.push(3);
        assert_eq!(counters.arms.load(Ordering::SeqCst), 1);

        // Partial drain must not disarm.
        assert_eq!(drain.pop(), Some(1));
        assert_eq!(drain.pop(), Some(2));
        assert_eq!(counters.disarms.load(Ordering::SeqCst), 0);

        // Draining to empty disarms exactly once.
        assert_eq!(drain.pop(), Some(3));
        assert_eq!(counters.disarms.load(Ordering::SeqCst), 1);
        assert_eq!(drain.pop(), None);
        assert_eq!(counters.disarms.load(Ordering::SeqCst), 1);

        // Next idle→non-idle transition arms again.
        writer.push(4);
        assert_eq!(counters.arms.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn push_blocks_until_a_pop_frees_space() {
        let counters = TxCounters::default();
        let mut ring: ByteRing<8> = ByteRing::new();
        let (prod, cons) = ring.split();
        let mut writer = DownlinkWriter::new(prod, CountingTx(&counters));
        let mut drain = DownlinkDrain::new(cons, CountingTx(&counters));

        for b in 0..7u8 {
            writer.push(b);
        }
        assert!(writer.is_full());

        let done = AtomicUsize::new(0);
        std::thread::scope(|s| {
            let done = &done;
            s.spawn(move || {
                // Blocks until the consumer thread pops.
                writer.push(0xEE);
                done.store(1, Ordering::SeqCst);
            });

            std::thread::sleep(Duration::from_millis(20));
            assert_eq!(done.load(Ordering::SeqCst), 0, "push returned on a full ring");

            assert_eq!(drain.pop(), Some(0));
            while done.load(Ordering::SeqCst) == 0 {
                std::thread::yield_now();
            }
        });

        let drained: std::vec::Vec<u8> = core::iter::from_fn(|| drain.pop()).collect();
        assert_eq!(drained, std::vec![1, 2, 3, 4, 5, 6, 0xEE]);
    }
}
