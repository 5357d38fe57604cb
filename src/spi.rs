/// SPI side of the responder: the transfer port the dispatcher drives, the
/// `S_CMD_O_SPIOP` header, and an adapter over `embedded-hal` SPI buses.
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

use crate::config::{SPI_CMD_RDID, SPI_TRANSFER_CAPACITY};
use crate::error::SpiError;

// =============================================================================
// Transfer port
// =============================================================================

/// One half-duplex SPI exchange with chip select held for its duration.
///
/// Implementations clock out all of `tx`, then clock in `rx.len()` bytes.
pub trait SpiPort {
    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<(), SpiError>;
}

impl<P: SpiPort + ?Sized> SpiPort for &mut P {
    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<(), SpiError> {
        (**self).transfer(tx, rx)
    }
}

/// Read the 3-byte JEDEC identification of the attached chip.
pub fn read_jedec_id<P: SpiPort + ?Sized>(port: &mut P) -> Result<[u8; 3], SpiError> {
    let mut id = [0u8; 3];
    port.transfer(&[SPI_CMD_RDID], &mut id)?;
    Ok(id)
}

// =============================================================================
// S_CMD_O_SPIOP header
// =============================================================================

/// Byte counts announced by the host ahead of an SPI operation.
///
/// Wire layout: `slen[3]` then `rlen[3]`, both little-endian.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpiHeader {
    /// Bytes the host sends next, to be clocked out.
    pub write_count: usize,
    /// Bytes the host expects back after the ACK.
    pub read_count: usize,
}

impl SpiHeader {
    pub const LEN: usize = 6;

    /// Parse from the command's parameter block. `None` if it is too short.
    pub fn parse(params: &[u8]) -> Option<Self> {
        let [w0, w1, w2, r0, r1, r2, ..] = *params else {
            return None;
        };
        Some(Self {
            write_count: u32::from_le_bytes([w0, w1, w2, 0]) as usize,
            read_count: u32::from_le_bytes([r0, r1, r2, 0]) as usize,
        })
    }

    /// Whether both directions fit the transfer buffer together.
    pub fn fits(&self) -> bool {
        self.write_count
            .checked_add(self.read_count)
            .is_some_and(|total| total <= SPI_TRANSFER_CAPACITY)
    }
}

// =============================================================================
// embedded-hal adapter
// =============================================================================

/// [`SpiPort`] over a blocking `embedded-hal` bus and a manual chip select.
pub struct SpiBusPort<SPI, CS> {
    spi: SPI,
    cs: CS,
}

impl<SPI, CS> SpiBusPort<SPI, CS>
where
    SPI: SpiBus,
    CS: OutputPin,
{
    pub fn new(spi: SPI, cs: CS) -> Self {
        Self { spi, cs }
    }

    fn exchange(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<(), SpiError> {
        if !tx.is_empty() {
            self.spi.write(tx).map_err(|_| SpiError::Bus)?;
        }
        // Clock in the response bytes (MOSI sends zeros)
        if !rx.is_empty() {
            self.spi.read(rx).map_err(|_| SpiError::Bus)?;
        }
        self.spi.flush().map_err(|_| SpiError::Bus)
    }
}

impl<SPI, CS> SpiPort for SpiBusPort<SPI, CS>
where
    SPI: SpiBus,
    CS: OutputPin,
{
    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<(), SpiError> {
        self.cs.set_low().map_err(|_| SpiError::ChipSelect)?;
        let result = self.exchange(tx, rx);
        // CS goes high again even if the bus failed mid-transfer.
        let released = self.cs.set_high().map_err(|_| SpiError::ChipSelect);
        result.and(released)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType as PinErrorType;
    use embedded_hal::spi::{ErrorKind, ErrorType};

    #[derive(Debug, PartialEq)]
    enum Event {
        CsLow,
        CsHigh,
        Write(Vec<u8>),
        Read(usize),
        Flush,
    }

    #[derive(Default)]
    struct Log(std::rc::Rc<std::cell::RefCell<Vec<Event>>>);

    impl Log {
        fn events(&self) -> std::cell::Ref<'_, Vec<Event>> {
            self.0.borrow()
        }
    }

    struct FakeBus {
        log: std::rc::Rc<std::cell::RefCell<Vec<Event>>>,
        response: Vec<u8>,
        fail_reads: bool,
    }

    impl ErrorType for FakeBus {
        type Error = ErrorKind;
    }

    impl SpiBus for FakeBus {
        fn read(&mut self, words: &mut [u8]) -> Result<(), ErrorKind> {
            self.log.borrow_mut().push(Event::Read(words.len()));
            if self.fail_reads {
                return Err(ErrorKind::Other);
            }
            words.copy_from_slice(&self.response[..words.len()]);
            Ok(())
        }

        fn write(&mut self, words: &[u8]) -> Result<(), ErrorKind> {
            self.log.borrow_mut().push(Event::Write(words.to_vec()));
            Ok(())
        }

        fn transfer(&mut self, _read: &mut [u8], _write: &[u8]) -> Result<(), ErrorKind> {
            unreachable!("half-duplex port never uses full-duplex transfers")
        }

        fn transfer_in_place(&mut self, _words: &mut [u8]) -> Result<(), ErrorKind> {
            unreachable!("half-duplex port never uses full-duplex transfers")
        }

        fn flush(&mut self) -> Result<(), ErrorKind> {
            self.log.borrow_mut().push(Event::Flush);
            Ok(())
        }
    }

    struct FakeCs {
        log: std::rc::Rc<std::cell::RefCell<Vec<Event>>>,
    }

    impl PinErrorType for FakeCs {
        type Error = Infallible;
    }

    impl OutputPin for FakeCs {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.log.borrow_mut().push(Event::CsLow);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.log.borrow_mut().push(Event::CsHigh);
            Ok(())
        }
    }

    fn port(response: &[u8], fail_reads: bool) -> (SpiBusPort<FakeBus, FakeCs>, Log) {
        let log = Log::default();
        let bus = FakeBus {
            log: log.0.clone(),
            response: response.to_vec(),
            fail_reads,
        };
        let cs = FakeCs { log: log.0.clone() };
        (SpiBusPort::new(bus, cs), log)
    }

    #[test]
    fn header_parses_little_endian_24_bit_counts() {
        let header = SpiHeader::parse(&[0x04, 0x01, 0x00, 0xFC, 0x00, 0x00]).unwrap();
        assert_eq!(header.write_count, 0x104);
        assert_eq!(header.read_count, 0xFC);
    }

    #[test]
    fn header_rejects_short_parameter_block() {
        assert_eq!(SpiHeader::parse(&[1, 0, 0, 3, 0]), None);
    }

    #[test]
    fn header_fits_up_to_transfer_capacity() {
        let at_limit = SpiHeader {
            write_count: 4,
            read_count: SPI_TRANSFER_CAPACITY - 4,
        };
        assert!(at_limit.fits());

        let over = SpiHeader {
            write_count: 4,
            read_count: SPI_TRANSFER_CAPACITY - 3,
        };
        assert!(!over.fits());

        let huge = SpiHeader {
            write_count: 0xFF_FFFF,
            read_count: 0xFF_FFFF,
        };
        assert!(!huge.fits());
    }

    #[test]
    fn transfer_frames_write_then_read_inside_chip_select() {
        let (mut port, log) = port(&[0xEF, 0x40, 0x18], false);
        let mut rx = [0u8; 3];
        port.transfer(&[0x9F], &mut rx).unwrap();

        assert_eq!(rx, [0xEF, 0x40, 0x18]);
        assert_eq!(
            *log.events(),
            vec![
                Event::CsLow,
                Event::Write(vec![0x9F]),
                Event::Read(3),
                Event::Flush,
                Event::CsHigh,
            ]
        );
    }

    #[test]
    fn write_only_transfer_skips_read_phase() {
        let (mut port, log) = port(&[], false);
        port.transfer(&[0x06], &mut []).unwrap();
        assert_eq!(
            *log.events(),
            vec![
                Event::CsLow,
                Event::Write(vec![0x06]),
                Event::Flush,
                Event::CsHigh
            ]
        );
    }

    #[test]
    fn chip_select_released_after_bus_error() {
        let (mut port, log) = port(&[], true);
        let mut rx = [0u8; 2];
        assert_eq!(port.transfer(&[0x05], &mut rx), Err(SpiError::Bus));
        assert_eq!(log.events().last(), Some(&Event::CsHigh));
    }

    #[test]
    fn jedec_id_uses_rdid_opcode() {
        let (mut port, log) = port(&[0xC2, 0x20, 0x17], false);
        assert_eq!(read_jedec_id(&mut port), Ok([0xC2, 0x20, 0x17]));
        assert_eq!(log.events()[1], Event::Write(vec![SPI_CMD_RDID]));
    }
}
