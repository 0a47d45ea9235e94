//! Wire protocol constants and persistent configuration layout for the
//! padlink bridge.
//!
//! The bridge multiplexes three incompatible byte-stream interpretations
//! over one virtual serial channel, disambiguated only by the device mode:
//!
//! - live controller telemetry (marker-framed fixed-size reports, uplink),
//! - a structured configuration protocol (single command bytes, downlink),
//! - raw passthrough for reflashing the attached microcontroller.
//!
//! This crate holds everything both sides of that wire must agree on:
//!
//! - [`commands`]: the command byte values and their sub-selectors
//! - [`config`]: the non-volatile config image (identity record + four
//!   fixed-offset blocks) and its RAM working copy
//! - [`report`]: report-type classification, report sizes and the marker
//!   byte that frames reports on the uplink
//!
//! No I/O and no platform dependencies; usable from host tests and from
//! `no_std` firmware alike.
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod commands;
pub mod config;
pub mod report;

pub use config::{ConfigBlock, ConfigImage, Identity, CONFIG_REGION_SIZE, DEVICE_TAG};
pub use report::{ReportKind, MAX_REPORT_SIZE, REPORT_MARKER};
