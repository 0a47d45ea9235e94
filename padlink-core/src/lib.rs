//! Platform-agnostic core of the padlink USB bridge.
//!
//! Everything that can be tested on a host lives here: the two SPSC
//! circular buffers that carry the bridge traffic, the downlink
//! backpressure and transmit arm/disarm logic, the device-mode state
//! machine with its configuration protocol, and the uplink report relay.
//! Hardware enters only through the traits in [`platform`], so the
//! firmware crate is a thin shell around these types.
//!
//! `no_std` by default; the `std` feature exists for the host test
//! suite.

#![cfg_attr(not(feature = "std"), no_std)]

pub mod engine;
pub mod link;
pub mod platform;
pub mod relay;
pub mod ring;

pub use engine::{CommandEngine, DeviceMode, PendingCommand, ScalarField};
pub use link::{DownlinkDrain, DownlinkWriter, TxControl};
pub use platform::{DeviceInfo, NonVolatileStorage, ResponseSink, StorageError, SystemControl};
pub use relay::{drain, should_flush, take_report, Report};
pub use ring::{ByteRing, Consumer, Producer, PushError};
