//! Glue between the bridge core's ring handles and the Embassy runtime.
//!
//! The two serial tasks run on a higher-priority interrupt executor, so
//! they preempt the mainline exactly like the UART interrupt handlers
//! they replace. The mainline's busy-wait on a full downlink ring is
//! therefore bounded: the transmit task keeps draining underneath it.

use core::cell::RefCell;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use padlink_core::{Producer, ResponseSink, TxControl};

/// Host→device ring capacity in slots (one is reserved).
pub const DOWNLINK_CAPACITY: usize = 128;
/// Device→host ring capacity in slots (one is reserved).
pub const UPLINK_CAPACITY: usize = 256;

/// Wake signal for the serial transmit task. Stands in for the transmit
/// interrupt enable bit.
pub type TxWake = Signal<CriticalSectionRawMutex, ()>;

/// Arm/disarm by setting or clearing the transmit task's wake signal.
///
/// Both the downlink writer (mainline) and the drain (transmit task)
/// hold one of these, like the two contexts poking the same interrupt
/// enable register.
pub struct SignalTx(&'static TxWake);

impl SignalTx {
    pub fn new(wake: &'static TxWake) -> Self {
        Self(wake)
    }
}

impl TxControl for SignalTx {
    fn arm(&mut self) {
        self.0.signal(());
    }

    fn disarm(&mut self) {
        self.0.reset();
    }
}

/// The uplink producer, shared between the receive task (telemetry and
/// passthrough bytes) and the mainline (config responses).
///
/// Two producing contexts would break the single-writer rule, so every
/// touch goes through a critical section. Each section covers a single
/// byte store; the receive task is never held out longer than that.
pub type SharedUplink = Mutex<CriticalSectionRawMutex, RefCell<Producer<'static, UPLINK_CAPACITY>>>;

/// Enqueue one byte into the uplink ring.
pub fn uplink_push(uplink: &SharedUplink, byte: u8) {
    uplink.lock(|p| p.borrow_mut().push_lossy(byte));
}

/// Routes command responses into the uplink ring, where the next flush
/// ships them to the host alongside any passthrough traffic.
pub struct UplinkResponder {
    uplink: &'static SharedUplink,
}

impl UplinkResponder {
    pub fn new(uplink: &'static SharedUplink) -> Self {
        Self { uplink }
    }
}

impl ResponseSink for UplinkResponder {
    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            uplink_push(self.uplink, byte);
        }
    }
}
