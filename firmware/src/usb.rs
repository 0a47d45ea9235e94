//! Composite USB device: game controller HID endpoint plus a CDC ACM
//! virtual serial port.
//!
//! The HID endpoint carries the relayed controller reports; the serial
//! port carries everything else (config protocol, passthrough
//! programming traffic) and its control line state drives the attached
//! MCU's reset line.

use embassy_rp::peripherals::USB;
use embassy_rp::usb::Driver;
use embassy_usb::class::cdc_acm::{self, CdcAcmClass, ControlChanged, Receiver, Sender};
use embassy_usb::class::hid::{self, HidWriter, ReportId, RequestHandler};
use embassy_usb::control::OutResponse;
use embassy_usb::Builder;
use padlink_proto::MAX_REPORT_SIZE;

/// Max packet size for the CDC bulk endpoints and control endpoint 0.
pub const MAX_PACKET_SIZE: u16 = 64;

/// Device-level USB configuration.
///
/// Class/subclass/protocol and the IAD flag mark this as a composite
/// device so hosts bind a driver per interface instead of per device.
pub fn device_config() -> embassy_usb::Config<'static> {
    let mut config = embassy_usb::Config::new(0x1209, 0x0001); // pid.codes test VID/PID
    config.manufacturer = Some("padlink");
    config.product = Some("Padlink Controller Bridge");
    config.serial_number = Some("0001");
    config.max_power = 100;
    config.max_packet_size_0 = MAX_PACKET_SIZE as u8;
    config.device_class = 0xEF;
    config.device_sub_class = 0x02;
    config.device_protocol = 0x01;
    config.composite_with_iads = true;
    config
}

/// Standard HID Gamepad Report Descriptor.
///
/// This descriptor defines a gamepad with:
/// - 16 buttons
/// - 2 analog sticks (X/Y each, signed 8-bit)
/// - 2 triggers (unsigned 8-bit)
pub const REPORT_DESCRIPTOR: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x05, // Usage (Gamepad)
    0xA1, 0x01, // Collection (Application)
    //
    // --- Buttons (16 buttons) ---
    0x05, 0x09, //   Usage Page (Button)
    0x19, 0x01, //   Usage Minimum (Button 1)
    0x29, 0x10, //   Usage Maximum (Button 16)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x95, 0x10, //   Report Count (16)
    0x75, 0x01, //   Report Size (1)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    //
    // --- Left Stick ---
    0x05, 0x01, //   Usage Page (Generic Desktop)
    0x09, 0x30, //   Usage (X)
    0x09, 0x31, //   Usage (Y)
    0x15, 0x81, //   Logical Minimum (-127)
    0x25, 0x7F, //   Logical Maximum (127)
    0x95, 0x02, //   Report Count (2)
    0x75, 0x08, //   Report Size (8)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    //
    // --- Right Stick ---
    0x09, 0x32, //   Usage (Z)
    0x09, 0x35, //   Usage (Rz)
    0x95, 0x02, //   Report Count (2)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    //
    // --- Triggers ---
    0x09, 0x33, //   Usage (Rx) - Left trigger
    0x09, 0x34, //   Usage (Ry) - Right trigger
    0x15, 0x00, //   Logical Minimum (0)
    0x26, 0xFF, 0x00, //   Logical Maximum (255)
    0x95, 0x02, //   Report Count (2)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    //
    0xC0, // End Collection
];

/// Configure the USB HID class in the USB builder.
///
/// The writer is sized for the largest report flavour; `poll_ms` comes
/// from the persisted poll-rate setting.
pub fn configure_hid<'d>(
    builder: &mut Builder<'d, Driver<'d, USB>>,
    state: &'d mut hid::State<'d>,
    poll_ms: u8,
) -> HidWriter<'d, Driver<'d, USB>, MAX_REPORT_SIZE> {
    let config = hid::Config {
        report_descriptor: REPORT_DESCRIPTOR,
        request_handler: None,
        poll_ms,
        max_packet_size: MAX_PACKET_SIZE,
        hid_subclass: hid::HidSubclass::No,
        hid_boot_protocol: hid::HidBootProtocol::None,
    };

    HidWriter::new(builder, state, config)
}

/// Configure the CDC ACM (virtual serial) class in the USB builder.
///
/// Split handles: sender (device→host), receiver (host→device), and the
/// control-change listener that surfaces DTR edges.
pub fn configure_serial<'d>(
    builder: &mut Builder<'d, Driver<'d, USB>>,
    state: &'d mut cdc_acm::State<'d>,
) -> (
    Sender<'d, Driver<'d, USB>>,
    Receiver<'d, Driver<'d, USB>>,
    ControlChanged<'d>,
) {
    CdcAcmClass::new(builder, state, MAX_PACKET_SIZE).split_with_control()
}

/// HID request handler (handles SET_REPORT, etc.).
///
/// Currently a no-op handler since we don't handle output reports.
pub struct BridgeRequestHandler;

impl RequestHandler for BridgeRequestHandler {
    fn get_report(&mut self, _id: ReportId, _buf: &mut [u8]) -> Option<usize> {
        None
    }

    fn set_report(&mut self, _id: ReportId, _data: &[u8]) -> OutResponse {
        OutResponse::Accepted
    }

    fn set_idle_ms(&mut self, _id: Option<ReportId>, _duration_ms: u32) {}

    fn get_idle_ms(&mut self, _id: Option<ReportId>) -> Option<u32> {
        None
    }
}
