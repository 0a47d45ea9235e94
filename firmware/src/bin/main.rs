#![no_std]
#![no_main]

use core::cell::RefCell;

use defmt::{error, info, unwrap, warn};
use defmt_rtt as _;
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_futures::select::{select, select3, Either, Either3};
use embassy_rp::gpio::{Level, Output};
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_rp::peripherals::{UART1, USB};
use embassy_rp::uart::{Async, Config as UartConfig, Uart, UartRx, UartTx};
use embassy_rp::usb::Driver;
use embassy_rp::{bind_interrupts, interrupt};
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Ticker, Timer};
use embassy_usb::class::cdc_acm::{Sender, State as CdcState};
use embassy_usb::class::hid::{HidWriter, State as HidState};
use embassy_usb::Builder;
use padlink_core::{drain, should_flush, take_report, ByteRing, CommandEngine, Consumer, DeviceInfo, DeviceMode, DownlinkDrain, DownlinkWriter};
use padlink_firmware::{
    configure_hid, configure_serial, device_config, serial::uplink_push, BridgeSystem,
    FlashConfigStore, SharedUplink, SignalTx, TxWake, UplinkResponder, DOWNLINK_CAPACITY,
    UPLINK_CAPACITY,
};
use padlink_proto::MAX_REPORT_SIZE;
use static_cell::StaticCell;

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    UART1_IRQ => embassy_rp::uart::InterruptHandler<UART1>;
    USBCTRL_IRQ => embassy_rp::usb::InterruptHandler<USB>;
});

type Engine = CommandEngine<FlashConfigStore<'static>, BridgeSystem>;

/// The serial tasks run here at interrupt priority, preempting the
/// mainline the way the UART interrupt handlers they replace would.
static SERIAL_EXECUTOR: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn SWI_IRQ_1() {
    SERIAL_EXECUTOR.on_interrupt()
}

/// The two rings that carry all bridge traffic.
static UPLINK_RING: StaticCell<ByteRing<UPLINK_CAPACITY>> = StaticCell::new();
static DOWNLINK_RING: StaticCell<ByteRing<DOWNLINK_CAPACITY>> = StaticCell::new();

/// Uplink producer handle, shared by the receive task and the mainline's
/// response sink.
static UPLINK_PRODUCER: StaticCell<SharedUplink> = StaticCell::new();

/// Transmit-drain wake signal; arm/disarm toggles it.
static TX_WAKE: TxWake = Signal::new();

/// USB device configuration buffers.
static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static MSOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();

static HID_STATE: StaticCell<HidState> = StaticCell::new();
static CDC_STATE: StaticCell<CdcState> = StaticCell::new();

/// Identity strings served by the read-info commands.
const DEVICE_INFO: DeviceInfo = DeviceInfo {
    board: "rp2040",
    cpu_freq: "125000000",
    firmware: concat!("padlink-", env!("CARGO_PKG_VERSION")),
    programmer_capable: true,
};

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("padlink bridge starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    // Watchdog first: from here a wedged init also gets reset.
    let system = BridgeSystem::start(p.WATCHDOG);
    let storage = FlashConfigStore::new(p.FLASH);
    let mut engine = unwrap!(CommandEngine::new(storage, system, DEVICE_INFO));
    let poll_ms = engine.poll_rate().max(1);

    // --- Rings ---
    let (uplink_prod, mut uplink_cons) = UPLINK_RING.init(ByteRing::new()).split();
    let shared_uplink = UPLINK_PRODUCER.init(Mutex::new(RefCell::new(uplink_prod)));
    let mut responder = UplinkResponder::new(shared_uplink);

    let (downlink_prod, downlink_cons) = DOWNLINK_RING.init(ByteRing::new()).split();
    let mut host_out = DownlinkWriter::new(downlink_prod, SignalTx::new(&TX_WAKE));
    let serial_drain = DownlinkDrain::new(downlink_cons, SignalTx::new(&TX_WAKE));

    // --- UART to the controller MCU ---
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = 115_200;

    let uart = Uart::new(
        p.UART1,
        p.PIN_8, // TX
        p.PIN_9, // RX
        Irqs,
        p.DMA_CH0,
        p.DMA_CH1,
        uart_config,
    );
    let (uart_tx, uart_rx) = uart.split();

    // Active-low reset line into the controller MCU.
    let mut target_reset = Output::new(p.PIN_12, Level::High);

    // --- USB Setup ---
    let usb_driver = Driver::new(p.USB, Irqs);

    let mut builder = Builder::new(
        usb_driver,
        device_config(),
        CONFIG_DESCRIPTOR.init([0; 256]),
        BOS_DESCRIPTOR.init([0; 256]),
        MSOS_DESCRIPTOR.init([0; 256]),
        CONTROL_BUF.init([0; 64]),
    );

    let mut hid = configure_hid(&mut builder, HID_STATE.init(HidState::new()), poll_ms);
    let (mut cdc_tx, mut cdc_rx, mut cdc_control) =
        configure_serial(&mut builder, CDC_STATE.init(CdcState::new()));

    let usb_device = builder.build();

    // --- Tasks ---
    interrupt::SWI_IRQ_1.set_priority(Priority::P1);
    let serial_spawner = SERIAL_EXECUTOR.start(interrupt::SWI_IRQ_1);
    unwrap!(serial_spawner.spawn(serial_rx_task(uart_rx, shared_uplink)));
    unwrap!(serial_spawner.spawn(serial_tx_task(uart_tx, serial_drain, &TX_WAKE)));

    unwrap!(spawner.spawn(usb_task(usb_device)));

    info!(
        "padlink up: poll {} ms, report kind {}",
        poll_ms,
        engine.report_kind()
    );

    // --- Mainline ---
    let mut ticker = Ticker::every(Duration::from_millis(poll_ms as u64));
    let mut dtr = false;
    let mut rx_buf = [0u8; 64];
    let mut flush_buf = [0u8; 64];

    // Enumeration can outlast the watchdog timeout, so keep feeding
    // while waiting for the HID endpoint to come up.
    loop {
        engine.system_mut().feed();
        match select(hid.ready(), ticker.next()).await {
            Either::First(()) => break,
            Either::Second(()) => {}
        }
    }
    info!("usb configured");

    loop {
        engine.system_mut().feed();

        let mut tick = false;
        match select3(
            cdc_rx.read_packet(&mut rx_buf),
            ticker.next(),
            cdc_control.control_changed(),
        )
        .await
        {
            Either3::First(Ok(n)) => {
                for &byte in &rx_buf[..n] {
                    // A config byte can cost a flash sector cycle, so a
                    // full packet of them outlasts the watchdog window.
                    engine.system_mut().feed();
                    // Every byte goes down the wire regardless of mode;
                    // the engine decides what it meant.
                    host_out.push(byte);
                    if let Err(e) = engine.handle_host_byte(byte, &mut responder) {
                        error!("config storage error: {}", e);
                    }
                }
            }
            Either3::First(Err(_)) => {
                // Endpoint disabled (bus reset). Back off one tick; the
                // watchdog keeps getting fed while we retry.
                ticker.next().await;
            }
            Either3::Second(()) => tick = true,
            Either3::Third(()) => {
                let asserted = cdc_tx.dtr();
                if asserted != dtr {
                    dtr = asserted;
                    // Same auto-reset convention as a serial-flashed
                    // Arduino: a DTR edge pulses the target's reset.
                    target_reset.set_low();
                    Timer::after_millis(2).await;
                    target_reset.set_high();
                    engine.handle_line_state(asserted);
                }
            }
        }

        service_uplink(
            &mut engine,
            &mut uplink_cons,
            &mut hid,
            &mut cdc_tx,
            &mut flush_buf,
            tick,
        )
        .await;
    }
}

/// Ship whatever the uplink ring holds to the host, per mode: framed
/// reports to the HID endpoint in NORMAL, raw bytes to the serial
/// endpoint otherwise (on a tick, or early once the ring is nearly
/// full).
async fn service_uplink(
    engine: &mut Engine,
    uplink: &mut Consumer<'static, UPLINK_CAPACITY>,
    hid: &mut HidWriter<'static, Driver<'static, USB>, MAX_REPORT_SIZE>,
    cdc_tx: &mut Sender<'static, Driver<'static, USB>>,
    flush_buf: &mut [u8; 64],
    tick: bool,
) {
    match engine.mode() {
        DeviceMode::Normal => {
            while let Some(report) = take_report(uplink, engine.report_kind()) {
                engine.record_report(&report);
                if hid.write(&report).await.is_err() {
                    warn!("hid endpoint not ready, report dropped");
                    break;
                }
            }
        }
        DeviceMode::Config | DeviceMode::BootloaderHandoff => {
            if !tick && !should_flush(uplink) {
                return;
            }
            while !uplink.is_empty() {
                let n = drain(uplink, flush_buf);
                if cdc_tx.write_packet(&flush_buf[..n]).await.is_err() {
                    warn!("serial endpoint stalled, {} bytes dropped", n);
                    break;
                }
            }
        }
    }
}

/// USB device task - runs the USB stack.
#[embassy_executor::task]
async fn usb_task(mut device: embassy_usb::UsbDevice<'static, Driver<'static, USB>>) {
    device.run().await;
}

/// Receive side of the controller UART: every byte lands in the uplink
/// ring, blind. Runs at interrupt priority.
#[embassy_executor::task]
async fn serial_rx_task(mut rx: UartRx<'static, Async>, uplink: &'static SharedUplink) {
    let mut byte = [0u8; 1];
    loop {
        match rx.read(&mut byte).await {
            Ok(()) => uplink_push(uplink, byte[0]),
            Err(e) => warn!("uart rx error: {}", e),
        }
    }
}

/// Transmit side of the controller UART: drains the downlink ring while
/// armed, sleeps otherwise. Runs at interrupt priority.
#[embassy_executor::task]
async fn serial_tx_task(
    mut tx: UartTx<'static, Async>,
    mut downlink: DownlinkDrain<'static, DOWNLINK_CAPACITY, SignalTx>,
    wake: &'static TxWake,
) {
    loop {
        wake.wait().await;
        while let Some(byte) = downlink.pop() {
            if tx.write(&[byte]).await.is_err() {
                warn!("uart tx error, byte dropped");
            }
        }
    }
}
