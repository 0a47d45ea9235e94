//! Command byte values for the configuration protocol.
//!
//! Commands are single bytes read from the virtual-serial downlink. The
//! device mode decides whether a byte is a command at all: in NORMAL mode
//! only the session/jump commands are recognized, in CONFIG mode the full
//! set applies, and in bootloader handoff every byte is raw passthrough
//! except the one-shot programmer-mode marker.
//!
//! Values are deliberately outside the printable range used by common
//! terminal chatter where possible, and must all stay distinct — the
//! protocol has no framing, a command is exactly one byte.

/// Reboot the bridge (watchdog-assisted reset). CONFIG mode only.
pub const CMD_REBOOT: u8 = 0x30;

/// Hand off to the attached MCU's bootloader: the bridge enters raw
/// passthrough so a host-side programmer can talk to it directly.
pub const CMD_JUMP_BOOTLOADER: u8 = 0x31;

/// Jump this MCU into its own bootloader immediately. Terminal.
pub const CMD_JUMP_BOOTLOADER_SELF: u8 = 0x32;

/// Read a device info string; the next byte is an [`info`] selector.
pub const CMD_READ_INFO: u8 = 0x33;

/// Open a configuration session (NORMAL -> CONFIG).
pub const CMD_START_CONFIG: u8 = 0x34;

/// Persist the RAM working copy of the identity scalars, then reboot.
pub const CMD_APPLY_CONFIG: u8 = 0x35;

/// Write one scalar config value; the next byte is a [`scalar`] selector,
/// the byte after that the value. Cached in RAM until apply-config.
pub const CMD_WRITE_CONFIG_VALUE: u8 = 0x36;

/// Read the main settings block.
pub const CMD_READ_MAIN: u8 = 0x38;
/// Write the main settings block (byte sink of exactly its size).
pub const CMD_WRITE_MAIN: u8 = 0x39;
/// Read the pin mapping block.
pub const CMD_READ_PINS: u8 = 0x3A;
/// Write the pin mapping block.
pub const CMD_WRITE_PINS: u8 = 0x3B;
/// Read the axis calibration block.
pub const CMD_READ_AXIS: u8 = 0x3C;
/// Write the axis calibration block.
pub const CMD_WRITE_AXIS: u8 = 0x3D;
/// Read the key mapping block.
pub const CMD_READ_KEYS: u8 = 0x3E;
/// Write the key mapping block.
pub const CMD_WRITE_KEYS: u8 = 0x3F;

/// Read the most recent controller report seen by the relay.
pub const CMD_READ_CONTROLLER: u8 = 0x40;

/// Read the firmware name string.
pub const CMD_READ_FIRMWARE: u8 = 0x41;

/// Read whether this build can jump to a programmer-capable bootloader.
pub const CMD_READ_PROGRAMMER_CAPABLE: u8 = 0x42;

/// STK500v1 "enter programming mode" marker, latched once inside the
/// bootloader handoff to remember that the host actually flashed something.
pub const STK500_ENTER_PROG_MODE: u8 = 0x50;

/// Selector bytes following [`CMD_WRITE_CONFIG_VALUE`].
pub mod scalar {
    /// Device sub-type (controller flavour, selects the report size).
    pub const SUB_TYPE: u8 = 0x01;
    /// USB polling rate in milliseconds.
    pub const POLL_RATE: u8 = 0x02;
}

/// Selector bytes following [`CMD_READ_INFO`].
pub mod info {
    /// Board / MCU name string.
    pub const BOARD: u8 = 0x01;
    /// CPU clock frequency string.
    pub const CPU_FREQ: u8 = 0x02;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_bytes_are_distinct() {
        let all = [
            CMD_REBOOT,
            CMD_JUMP_BOOTLOADER,
            CMD_JUMP_BOOTLOADER_SELF,
            CMD_READ_INFO,
            CMD_START_CONFIG,
            CMD_APPLY_CONFIG,
            CMD_WRITE_CONFIG_VALUE,
            CMD_READ_MAIN,
            CMD_WRITE_MAIN,
            CMD_READ_PINS,
            CMD_WRITE_PINS,
            CMD_READ_AXIS,
            CMD_WRITE_AXIS,
            CMD_READ_KEYS,
            CMD_WRITE_KEYS,
            CMD_READ_CONTROLLER,
            CMD_READ_FIRMWARE,
            CMD_READ_PROGRAMMER_CAPABLE,
            STK500_ENTER_PROG_MODE,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a, b, "duplicate command byte 0x{a:02X}");
            }
        }
    }
}
