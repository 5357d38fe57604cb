#![no_std]
#![no_main]

mod usb_serial;

use defmt::*;
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::peripherals::{SPI0, USB};
use embassy_rp::spi::{self, Spi};
use embassy_rp::usb::{Driver, InterruptHandler};
use embassy_usb::class::cdc_acm::{CdcAcmClass, State};
use embassy_usb::{Builder, UsbDevice};
use frser_pico::config::*;
use frser_pico::spi::read_jedec_id;
use frser_pico::{Dispatcher, SpiBusPort};
use panic_probe as _;
use static_cell::StaticCell;

use crate::usb_serial::{UsbDriver, UsbSerial};

// =============================================================================
// Interrupt bindings
// =============================================================================

bind_interrupts!(struct Irqs {
    USBCTRL_IRQ => InterruptHandler<USB>;
});

// =============================================================================
// Concrete protocol stack
// =============================================================================

type FlashPort = SpiBusPort<Spi<'static, SPI0, spi::Blocking>, Output<'static>>;
type SerprogDispatcher = Dispatcher<UsbSerial, FlashPort>;

// =============================================================================
// Entry point
// =============================================================================

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());

    info!("frser-pico starting up");

    // ---- SPI peripheral ----
    let mut spi_config = spi::Config::default();
    spi_config.frequency = DEFAULT_SPI_FREQ_HZ;
    spi_config.phase = spi::Phase::CaptureOnFirstTransition;
    spi_config.polarity = spi::Polarity::IdleLow;

    let spi = Spi::new_blocking(p.SPI0, p.PIN_18, p.PIN_19, p.PIN_16, spi_config);
    let cs = Output::new(p.PIN_17, Level::High); // CS deasserted (high)
    let mut flash = SpiBusPort::new(spi, cs);

    // ---- Chip identification (diagnostic only) ----
    match read_jedec_id(&mut flash) {
        Ok([manufacturer, memory_type, capacity]) => info!(
            "RDID: {:02x}{:02x}{:02x}",
            manufacturer, memory_type, capacity
        ),
        Err(e) => warn!("RDID failed: {}", e),
    }

    // ---- USB driver ----
    let driver = Driver::new(p.USB, Irqs);

    let mut usb_config = embassy_usb::Config::new(USB_VID, USB_PID);
    usb_config.manufacturer = Some(USB_MANUFACTURER);
    usb_config.product = Some(USB_PRODUCT);
    usb_config.serial_number = Some(USB_SERIAL);
    usb_config.max_power = 100;
    usb_config.max_packet_size_0 = 64;

    // CDC-ACM uses an interface association descriptor.
    usb_config.device_class = 0xEF;
    usb_config.device_sub_class = 0x02;
    usb_config.device_protocol = 0x01;
    usb_config.composite_with_iads = true;

    // Descriptor buffers (must be 'static)
    static CONFIG_DESC: StaticCell<[u8; 256]> = StaticCell::new();
    static BOS_DESC: StaticCell<[u8; 256]> = StaticCell::new();
    static MSOS_DESC: StaticCell<[u8; 256]> = StaticCell::new();
    static CONTROL_BUF: StaticCell<[u8; 128]> = StaticCell::new();

    let mut builder = Builder::new(
        driver,
        usb_config,
        CONFIG_DESC.init([0; 256]),
        BOS_DESC.init([0; 256]),
        MSOS_DESC.init([0; 256]),
        CONTROL_BUF.init([0; 128]),
    );

    // ---- CDC-ACM serial function ----
    static CDC_STATE: StaticCell<State> = StaticCell::new();
    let class = CdcAcmClass::new(&mut builder, CDC_STATE.init(State::new()), USB_MAX_PACKET_SIZE);

    // ---- Build and launch ----
    let usb = builder.build();
    let dispatcher = Dispatcher::new(UsbSerial::new(class), flash);

    spawner.must_spawn(usb_device_task(usb));
    spawner.must_spawn(serprog_task(dispatcher));

    info!("frser-pico ready, VID:PID = {:04x}:{:04x}", USB_VID, USB_PID);
}

// =============================================================================
// USB device task: runs the USB stack
// =============================================================================

#[embassy_executor::task]
async fn usb_device_task(mut usb: UsbDevice<'static, UsbDriver>) {
    usb.run().await;
}

// =============================================================================
// serprog task: one host session at a time
// =============================================================================

#[embassy_executor::task]
async fn serprog_task(mut dispatcher: SerprogDispatcher) {
    loop {
        dispatcher.transport_mut().wait_connection().await;
        info!("host connected");

        let err = dispatcher.run().await;
        info!("session ended: {}", err);
    }
}
