/// USB CDC-ACM serial port as the serprog transport.
///
/// The host sees `/dev/ttyACM*`. Incoming packets are buffered and handed
/// out byte by byte; outgoing bytes are packed into full-size packets and
/// the remainder goes out on `flush()`.
use embassy_rp::peripherals::USB;
use embassy_rp::usb::Driver;
use embassy_time::{with_timeout, Duration};
use embassy_usb::class::cdc_acm::CdcAcmClass;
use embassy_usb::driver::EndpointError;
use frser_pico::config::{USB_MAX_PACKET_SIZE, USB_WRITE_TIMEOUT_MS};
use frser_pico::{Transport, TransportError};

const PACKET_SIZE: usize = USB_MAX_PACKET_SIZE as usize;

pub type UsbDriver = Driver<'static, USB>;

pub struct UsbSerial {
    class: CdcAcmClass<'static, UsbDriver>,
    rx_buf: [u8; PACKET_SIZE],
    rx_pos: usize,
    rx_len: usize,
    tx_buf: [u8; PACKET_SIZE],
    tx_len: usize,
    /// The last packet sent was full size; the host needs a ZLP to end the transfer.
    needs_zlp: bool,
}

impl UsbSerial {
    pub fn new(class: CdcAcmClass<'static, UsbDriver>) -> Self {
        Self {
            class,
            rx_buf: [0; PACKET_SIZE],
            rx_pos: 0,
            rx_len: 0,
            tx_buf: [0; PACKET_SIZE],
            tx_len: 0,
            needs_zlp: false,
        }
    }

    /// Wait until the host opens the port (DTR), dropping anything buffered
    /// from a previous session.
    pub async fn wait_connection(&mut self) {
        self.class.wait_connection().await;
        self.rx_pos = 0;
        self.rx_len = 0;
        self.tx_len = 0;
        self.needs_zlp = false;
    }

    async fn fill(&mut self) -> Result<(), TransportError> {
        loop {
            let n = self
                .class
                .read_packet(&mut self.rx_buf)
                .await
                .map_err(endpoint_error)?;
            if n > 0 {
                self.rx_pos = 0;
                self.rx_len = n;
                return Ok(());
            }
        }
    }

    async fn send_packet(&mut self, len: usize) -> Result<(), TransportError> {
        let timeout = Duration::from_millis(USB_WRITE_TIMEOUT_MS);
        with_timeout(timeout, self.class.write_packet(&self.tx_buf[..len]))
            .await
            .map_err(|_| TransportError::Timeout)?
            .map_err(endpoint_error)?;
        self.tx_len = 0;
        self.needs_zlp = len == PACKET_SIZE;
        Ok(())
    }
}

impl Transport for UsbSerial {
    async fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), TransportError> {
        let mut filled = 0;
        while filled < buf.len() {
            if self.rx_pos == self.rx_len {
                self.fill().await?;
            }
            let n = (self.rx_len - self.rx_pos).min(buf.len() - filled);
            buf[filled..filled + n].copy_from_slice(&self.rx_buf[self.rx_pos..self.rx_pos + n]);
            self.rx_pos += n;
            filled += n;
        }
        Ok(())
    }

    async fn write_all(&mut self, mut data: &[u8]) -> Result<(), TransportError> {
        while !data.is_empty() {
            let n = (PACKET_SIZE - self.tx_len).min(data.len());
            self.tx_buf[self.tx_len..self.tx_len + n].copy_from_slice(&data[..n]);
            self.tx_len += n;
            data = &data[n..];
            if self.tx_len == PACKET_SIZE {
                self.send_packet(PACKET_SIZE).await?;
            }
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), TransportError> {
        if self.tx_len > 0 {
            self.send_packet(self.tx_len).await
        } else if self.needs_zlp {
            self.send_packet(0).await
        } else {
            Ok(())
        }
    }
}

fn endpoint_error(e: EndpointError) -> TransportError {
    match e {
        EndpointError::Disabled => TransportError::Disconnected,
        EndpointError::BufferOverflow => {
            defmt::warn!("USB packet larger than buffer");
            TransportError::Disconnected
        }
    }
}
