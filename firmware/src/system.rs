//! Reset and bootloader control, plus the boot-hang watchdog.

use embassy_rp::peripherals::WATCHDOG;
use embassy_rp::watchdog::Watchdog;
use embassy_time::Duration;
use padlink_core::SystemControl;

/// How long the mainline may stall before the hardware pulls the plug.
const WATCHDOG_TIMEOUT: Duration = Duration::from_millis(500);

/// [`SystemControl`] backed by the RP2040 watchdog and boot ROM.
pub struct BridgeSystem {
    watchdog: Watchdog,
}

impl BridgeSystem {
    /// Take the watchdog peripheral and start it. From here on the
    /// mainline must call [`feed`](Self::feed) or the chip resets —
    /// that reset is the only recovery from a wedged loop.
    pub fn start(watchdog: WATCHDOG) -> Self {
        let mut watchdog = Watchdog::new(watchdog);
        watchdog.start(WATCHDOG_TIMEOUT);
        Self { watchdog }
    }

    pub fn feed(&mut self) {
        self.watchdog.feed();
    }
}

impl SystemControl for BridgeSystem {
    fn reboot(&mut self) {
        self.watchdog.trigger_reset();
    }

    fn enter_own_bootloader(&mut self) {
        // Boot ROM call; hands the USB port to the mask-ROM UF2
        // bootloader and never returns.
        embassy_rp::rom_data::reset_to_usb_boot(0, 0);
    }
}
