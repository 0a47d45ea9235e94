//! Device-mode state machine and configuration protocol handler.
//!
//! Every byte arriving from the host is forwarded to the serial peripheral
//! by the caller regardless of mode; this engine decides what the byte
//! *means*. The same values are live controller chatter in NORMAL mode,
//! commands in CONFIG mode, and raw programmer traffic during the
//! bootloader handoff — the mode is the only disambiguator, which is what
//! lets the hot NORMAL path run with zero framing overhead.
//!
//! All transitions take effect synchronously inside
//! [`CommandEngine::handle_host_byte`], before the caller can dispatch the
//! next byte.

use crate::platform::{DeviceInfo, NonVolatileStorage, ResponseSink, StorageError, SystemControl};
use heapless::Vec;
use padlink_proto::commands::{self, info, scalar};
use padlink_proto::config::{ConfigBlock, ConfigImage, Identity, CONFIG_REGION_SIZE, DEVICE_TAG};
use padlink_proto::report::{ReportKind, MAX_REPORT_SIZE};

/// Interpretation context for downlink bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceMode {
    /// Live telemetry; the report relay is active.
    Normal,
    /// Configuration session; bytes are protocol commands.
    Config,
    /// Raw passthrough to the attached MCU's bootloader.
    BootloaderHandoff,
}

/// Scalar fields addressable by write-config-value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScalarField {
    SubType,
    PollRate,
}

/// In-flight multi-byte command. Cleared on any transition out of CONFIG.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PendingCommand {
    /// Read-info armed; the next byte selects the string.
    InfoSelector,
    /// Write-config-value armed; the next byte selects the field.
    ScalarSelector,
    /// Field selected; the next byte is the value.
    ScalarValue(ScalarField),
    /// Block write in progress: `index` bytes already persisted.
    BlockWrite { block: ConfigBlock, index: usize },
}

/// The bridge's central state: current mode, pending command, RAM working
/// copy of the config image, and the platform handles.
pub struct CommandEngine<S, C> {
    mode: DeviceMode,
    pending: Option<PendingCommand>,
    entered_prog: bool,
    image: ConfigImage,
    poll_rate: u8,
    sub_type: u8,
    last_report: Vec<u8, MAX_REPORT_SIZE>,
    info: DeviceInfo,
    storage: S,
    system: C,
}

impl<S: NonVolatileStorage, C: SystemControl> CommandEngine<S, C> {
    /// Boot-time construction: mirror the config region into RAM.
    ///
    /// An unset identity tag is not an error — the working copy falls back
    /// to compiled defaults and the device comes up in NORMAL mode.
    pub fn new(mut storage: S, system: C, device: DeviceInfo) -> Result<Self, StorageError> {
        let mut region = [0u8; CONFIG_REGION_SIZE];
        storage.read(0, &mut region)?;
        let image = ConfigImage::from_region(&region);

        Ok(Self {
            mode: DeviceMode::Normal,
            pending: None,
            entered_prog: false,
            poll_rate: image.identity.poll_rate,
            sub_type: image.identity.sub_type,
            image,
            last_report: Vec::new(),
            info: device,
            storage,
            system,
        })
    }

    #[must_use]
    pub fn mode(&self) -> DeviceMode {
        self.mode
    }

    #[must_use]
    pub fn pending(&self) -> Option<PendingCommand> {
        self.pending
    }

    /// Report flavour currently in effect, from the working sub-type.
    #[must_use]
    pub fn report_kind(&self) -> ReportKind {
        ReportKind::from_sub_type(self.sub_type)
    }

    #[must_use]
    pub fn poll_rate(&self) -> u8 {
        self.poll_rate
    }

    #[must_use]
    pub fn sub_type(&self) -> u8 {
        self.sub_type
    }

    /// Mutable access to the platform control (watchdog feeding etc.).
    pub fn system_mut(&mut self) -> &mut C {
        &mut self.system
    }

    /// Remember the most recent relayed report so the controller-state
    /// read command can answer without a round trip to the attached MCU.
    pub fn record_report(&mut self, report: &[u8]) {
        self.last_report.clear();
        let _ = self.last_report.extend_from_slice(&report[..report.len().min(MAX_REPORT_SIZE)]);
    }

    /// Dispatch one byte read from the host side of the bridge.
    ///
    /// Any mode change is visible to the caller as soon as this returns —
    /// the next byte is already interpreted under the new mode.
    pub fn handle_host_byte(
        &mut self,
        byte: u8,
        sink: &mut impl ResponseSink,
    ) -> Result<(), StorageError> {
        match self.mode {
            DeviceMode::Normal => {
                self.handle_normal(byte);
                Ok(())
            }
            DeviceMode::Config => self.handle_config(byte, sink),
            DeviceMode::BootloaderHandoff => {
                self.handle_handoff(byte);
                Ok(())
            }
        }
    }

    /// Line-state (DTR-equivalent) change from the USB control endpoint.
    ///
    /// After the host-side programmer finished flashing, the first toggle
    /// drops the handoff back into a configuration session.
    pub fn handle_line_state(&mut self, _dtr: bool) {
        if self.entered_prog {
            self.entered_prog = false;
            if self.mode == DeviceMode::BootloaderHandoff {
                self.set_mode(DeviceMode::Config);
            }
        }
    }

    #[must_use]
    pub fn entered_programmer(&self) -> bool {
        self.entered_prog
    }

    fn set_mode(&mut self, mode: DeviceMode) {
        // A pending command never survives the mode it was issued in.
        self.pending = None;
        self.mode = mode;
    }

    fn handle_normal(&mut self, byte: u8) {
        match byte {
            commands::CMD_START_CONFIG => self.set_mode(DeviceMode::Config),
            commands::CMD_JUMP_BOOTLOADER => self.set_mode(DeviceMode::BootloaderHandoff),
            commands::CMD_JUMP_BOOTLOADER_SELF => {
                self.set_mode(DeviceMode::BootloaderHandoff);
                self.system.enter_own_bootloader();
            }
            // Everything else is telemetry passing through.
            _ => {}
        }
    }

    fn handle_handoff(&mut self, byte: u8) {
        if byte == commands::STK500_ENTER_PROG_MODE && !self.entered_prog {
            self.entered_prog = true;
        }
    }

    fn handle_config(
        &mut self,
        byte: u8,
        sink: &mut impl ResponseSink,
    ) -> Result<(), StorageError> {
        match self.pending {
            Some(PendingCommand::BlockWrite { block, index }) => {
                // Live overwrite, one byte straight to storage. A dropped
                // byte desynchronizes the offset counter for the rest of
                // the block; the channel's USB-level reliability is the
                // only guard.
                self.storage.write_byte(block.offset() + index, byte)?;
                self.image.block_mut(block)[index] = byte;
                let next = index + 1;
                if next == block.size() {
                    self.pending = None;
                    self.system.reboot();
                } else {
                    self.pending = Some(PendingCommand::BlockWrite { block, index: next });
                }
                Ok(())
            }
            Some(PendingCommand::InfoSelector) => {
                self.pending = None;
                match byte {
                    info::BOARD => sink.write(self.info.board.as_bytes()),
                    info::CPU_FREQ => sink.write(self.info.cpu_freq.as_bytes()),
                    _ => {}
                }
                Ok(())
            }
            Some(PendingCommand::ScalarSelector) => {
                self.pending = match byte {
                    scalar::SUB_TYPE => Some(PendingCommand::ScalarValue(ScalarField::SubType)),
                    scalar::POLL_RATE => Some(PendingCommand::ScalarValue(ScalarField::PollRate)),
                    _ => None,
                };
                Ok(())
            }
            Some(PendingCommand::ScalarValue(field)) => {
                self.pending = None;
                match field {
                    ScalarField::SubType => self.sub_type = byte,
                    ScalarField::PollRate => self.poll_rate = byte,
                }
                Ok(())
            }
            None => self.dispatch_config_command(byte, sink),
        }
    }

    fn dispatch_config_command(
        &mut self,
        byte: u8,
        sink: &mut impl ResponseSink,
    ) -> Result<(), StorageError> {
        match byte {
            commands::CMD_APPLY_CONFIG => {
                let identity = Identity {
                    tag: DEVICE_TAG,
                    poll_rate: self.poll_rate,
                    sub_type: self.sub_type,
                };
                self.storage.write(0, &identity.to_bytes())?;
                self.image.identity = identity;
                self.set_mode(DeviceMode::Normal);
                self.system.reboot();
            }
            commands::CMD_JUMP_BOOTLOADER => self.set_mode(DeviceMode::BootloaderHandoff),
            commands::CMD_JUMP_BOOTLOADER_SELF => {
                self.set_mode(DeviceMode::BootloaderHandoff);
                self.system.enter_own_bootloader();
            }
            commands::CMD_WRITE_CONFIG_VALUE => {
                self.pending = Some(PendingCommand::ScalarSelector);
            }
            commands::CMD_READ_INFO => {
                self.pending = Some(PendingCommand::InfoSelector);
            }
            commands::CMD_READ_MAIN => sink.write(self.image.block(ConfigBlock::Main)),
            commands::CMD_READ_PINS => sink.write(self.image.block(ConfigBlock::Pins)),
            commands::CMD_READ_AXIS => sink.write(self.image.block(ConfigBlock::Axis)),
            commands::CMD_READ_KEYS => sink.write(self.image.block(ConfigBlock::Keys)),
            commands::CMD_WRITE_MAIN => self.arm_block_write(ConfigBlock::Main),
            commands::CMD_WRITE_PINS => self.arm_block_write(ConfigBlock::Pins),
            commands::CMD_WRITE_AXIS => self.arm_block_write(ConfigBlock::Axis),
            commands::CMD_WRITE_KEYS => self.arm_block_write(ConfigBlock::Keys),
            commands::CMD_READ_CONTROLLER => sink.write(&self.last_report),
            commands::CMD_READ_FIRMWARE => sink.write(self.info.firmware.as_bytes()),
            commands::CMD_READ_PROGRAMMER_CAPABLE => {
                sink.write(&[u8::from(self.info.programmer_capable)]);
            }
            commands::CMD_REBOOT => self.system.reboot(),
            _ => {}
        }
        Ok(())
    }

    fn arm_block_write(&mut self, block: ConfigBlock) {
        self.pending = Some(PendingCommand::BlockWrite { block, index: 0 });
    }
}
