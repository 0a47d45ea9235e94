//! Config persistence in the last sector of the RP2040's external flash.
//!
//! The protocol writes configuration a byte at a time, but flash only
//! erases whole sectors, so every byte write is a read-modify-write of
//! the config sector. Slow and wearing, which is acceptable: config
//! writes happen a handful of times over the device's life, and the
//! byte-at-a-time contract keeps an interrupted block write observable
//! as exactly the bytes that made it.

use embassy_rp::flash::{Blocking, Flash, ERASE_SIZE};
use embassy_rp::peripherals::FLASH;
use padlink_core::{NonVolatileStorage, StorageError};
use padlink_proto::CONFIG_REGION_SIZE;

/// Total flash size of the Pico's W25Q16 part.
pub const FLASH_SIZE: usize = 2 * 1024 * 1024;

/// Byte offset of the config sector: the last erase sector, well clear
/// of the firmware image at the front of flash.
const CONFIG_SECTOR: u32 = (FLASH_SIZE - ERASE_SIZE) as u32;

/// [`NonVolatileStorage`] backed by the config sector.
pub struct FlashConfigStore<'d> {
    flash: Flash<'d, FLASH, Blocking, FLASH_SIZE>,
    scratch: [u8; ERASE_SIZE],
}

impl<'d> FlashConfigStore<'d> {
    pub fn new(flash: FLASH) -> Self {
        Self {
            flash: Flash::new_blocking(flash),
            scratch: [0; ERASE_SIZE],
        }
    }

    fn check_bounds(offset: usize, len: usize) -> Result<(), StorageError> {
        if offset + len > CONFIG_REGION_SIZE {
            return Err(StorageError::OutOfBounds);
        }
        Ok(())
    }

    /// Read-modify-write of the whole config sector.
    fn rewrite_sector(
        &mut self,
        offset: usize,
        data: &[u8],
    ) -> Result<(), StorageError> {
        self.flash
            .blocking_read(CONFIG_SECTOR, &mut self.scratch)
            .map_err(|_| StorageError::Io)?;
        self.scratch[offset..offset + data.len()].copy_from_slice(data);
        self.flash
            .blocking_erase(CONFIG_SECTOR, CONFIG_SECTOR + ERASE_SIZE as u32)
            .map_err(|_| StorageError::Io)?;
        self.flash
            .blocking_write(CONFIG_SECTOR, &self.scratch)
            .map_err(|_| StorageError::Io)
    }
}

impl NonVolatileStorage for FlashConfigStore<'_> {
    fn read(&mut self, offset: usize, buf: &mut [u8]) -> Result<(), StorageError> {
        Self::check_bounds(offset, buf.len())?;
        self.flash
            .blocking_read(CONFIG_SECTOR + offset as u32, buf)
            .map_err(|_| StorageError::Io)
    }

    fn write_byte(&mut self, offset: usize, value: u8) -> Result<(), StorageError> {
        Self::check_bounds(offset, 1)?;
        self.rewrite_sector(offset, &[value])
    }

    // One sector cycle for the whole run instead of one per byte.
    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), StorageError> {
        Self::check_bounds(offset, data.len())?;
        self.rewrite_sector(offset, data)
    }
}
