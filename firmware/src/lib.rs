//! USB game controller + serial bridge firmware for RP2040.
//!
//! The embedded shell around `padlink-core`: composite USB device (HID
//! controller endpoint plus CDC virtual serial), hardware UART to the
//! attached game-controller MCU, flash-backed config storage, watchdog,
//! and the bootloader handoff plumbing.

#![no_std]

// Re-export core types for convenience
pub use padlink_core::{
    drain, should_flush, take_report, ByteRing, CommandEngine, DeviceInfo, DeviceMode,
    DownlinkDrain, DownlinkWriter, Report,
};

pub mod nvm;
pub mod serial;
pub mod system;
pub mod usb;

pub use nvm::{FlashConfigStore, FLASH_SIZE};
pub use serial::{
    SharedUplink, SignalTx, TxWake, UplinkResponder, DOWNLINK_CAPACITY, UPLINK_CAPACITY,
};
pub use system::BridgeSystem;
pub use usb::{configure_hid, configure_serial, device_config, BridgeRequestHandler};
