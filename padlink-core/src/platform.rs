//! Traits at the platform seam.
//!
//! The engine never touches hardware directly; everything with a side
//! effect outside RAM goes through one of these traits so the whole state
//! machine runs under host tests with mock implementations.

/// Error type for non-volatile storage operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// Offset or length outside the config region.
    OutOfBounds,
    /// The underlying storage rejected the operation.
    Io,
}

/// Byte-addressed non-volatile storage holding the config region.
///
/// `write_byte` must be durable before it returns: the block-write path
/// persists one byte at a time with no commit step, and an interrupted
/// write is expected to leave exactly the bytes already written.
pub trait NonVolatileStorage {
    /// Read `buf.len()` bytes starting at `offset`.
    fn read(&mut self, offset: usize, buf: &mut [u8]) -> Result<(), StorageError>;

    /// Write a single byte at `offset`.
    fn write_byte(&mut self, offset: usize, value: u8) -> Result<(), StorageError>;

    /// Write a contiguous run of bytes. The default just loops
    /// [`write_byte`](Self::write_byte); implementations with cheaper
    /// batch writes may override.
    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), StorageError> {
        for (i, &b) in data.iter().enumerate() {
            self.write_byte(offset + i, b)?;
        }
        Ok(())
    }
}

/// Process-level control: the two ways execution leaves the program.
pub trait SystemControl {
    /// Reset the device (watchdog-assisted or direct). On hardware this
    /// does not return; mocks record the call instead.
    fn reboot(&mut self);

    /// Transfer control to this MCU's own bootloader, relocating the
    /// interrupt vectors first. Terminal on hardware.
    fn enter_own_bootloader(&mut self);
}

/// Destination for protocol responses (info strings, block snapshots).
///
/// On the device this enqueues into the uplink buffer; in tests it is a
/// plain `Vec`.
pub trait ResponseSink {
    fn write(&mut self, bytes: &[u8]);
}

/// Build-time identity strings served by the read-info commands.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceInfo {
    /// Board / MCU name.
    pub board: &'static str,
    /// CPU clock frequency, as a string.
    pub cpu_freq: &'static str,
    /// Firmware name and version.
    pub firmware: &'static str,
    /// Whether this build can jump to a programmer-capable bootloader.
    pub programmer_capable: bool,
}
