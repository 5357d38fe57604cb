/// serprog request dispatcher: reads one opcode at a time from the host and
/// answers it, driving the SPI port for `S_CMD_O_SPIOP`.
///
/// Every request is fully answered before the next opcode is read. Nothing
/// is carried over between requests; parameter and transfer buffers live on
/// the stack of the call that handles them.
use crate::config::{MAX_PARAM_LEN, SPI_TRANSFER_CAPACITY};
use crate::error::{SpiError, TransportError};
use crate::protocol::{Opcode, S_ACK, S_NAK};
use crate::spi::{SpiHeader, SpiPort};
use crate::tables::{self, Action};
use crate::transport::Transport;

/// What was sent back for one request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reply {
    /// A constant answer from the command table.
    Const(Opcode),
    /// A lone ACK.
    Ack,
    /// A lone NAK.
    Nak(NakReason),
    /// ACK followed by `read_count` bytes of SPI data.
    SpiData { write_count: usize, read_count: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NakReason {
    /// Opcode byte above `MAX_OPCODE`.
    OutOfRange(u8),
    /// Recognized opcode without an implementation.
    Unsupported(Opcode),
    /// SPI-op counts exceed the transfer buffer.
    Oversize(SpiHeader),
    /// SPI-op parameter block could not be parsed.
    MalformedHeader,
    /// The SPI port reported a failure.
    Spi(SpiError),
}

pub struct Dispatcher<T, S> {
    transport: T,
    spi: S,
}

impl<T, S> Dispatcher<T, S>
where
    T: Transport,
    S: SpiPort,
{
    pub fn new(transport: T, spi: S) -> Self {
        Self { transport, spi }
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn spi_mut(&mut self) -> &mut S {
        &mut self.spi
    }

    // =========================================================================
    // Request loop
    // =========================================================================

    /// Serve requests until the transport fails, then return that failure.
    pub async fn run(&mut self) -> TransportError {
        loop {
            if let Err(e) = self.serve_one().await {
                return e;
            }
        }
    }

    /// Read one opcode, answer it and flush the reply.
    pub async fn serve_one(&mut self) -> Result<Reply, TransportError> {
        let byte = self.transport.read_byte().await?;
        let reply = self.handle(byte).await?;
        self.transport.flush().await?;
        Ok(reply)
    }

    /// Answer the request introduced by opcode byte `byte`.
    pub async fn handle(&mut self, byte: u8) -> Result<Reply, TransportError> {
        // Out-of-range bytes never reach the command table.
        let Some(op) = Opcode::from_byte(byte) else {
            warn!("opcode 0x{:02x} out of range", byte);
            return self.nak(NakReason::OutOfRange(byte)).await;
        };
        let cmd = tables::command(op);
        trace!("opcode {}", op);

        if let Action::Answer(bytes) = cmd.action {
            self.transport.write_all(bytes).await?;
            return Ok(Reply::Const(op));
        }

        let mut params = [0u8; MAX_PARAM_LEN];
        let params = &mut params[..cmd.params];
        self.transport.read_exact(params).await?;

        match cmd.action {
            Action::Ack => {
                self.transport.write_byte(S_ACK).await?;
                Ok(Reply::Ack)
            }
            Action::SpiOp => self.cmd_spiop(params).await,
            Action::Answer(_) | Action::Unsupported => {
                debug!("opcode {} not implemented", op);
                self.nak(NakReason::Unsupported(op)).await
            }
        }
    }

    // =========================================================================
    // S_CMD_O_SPIOP (0x13): raw SPI transaction
    // =========================================================================

    /// `params` holds the 6-byte count header; the outgoing payload follows
    /// on the transport.
    async fn cmd_spiop(&mut self, params: &[u8]) -> Result<Reply, TransportError> {
        let Some(header) = SpiHeader::parse(params) else {
            return self.nak(NakReason::MalformedHeader).await;
        };

        if !header.fits() {
            warn!(
                "SPIOP: {} out + {} in exceeds {} byte buffer",
                header.write_count, header.read_count, SPI_TRANSFER_CAPACITY
            );
            // Consume the payload so the next opcode is read in sync.
            self.discard(header.write_count).await?;
            return self.nak(NakReason::Oversize(header)).await;
        }

        let mut tx = [0u8; SPI_TRANSFER_CAPACITY];
        let mut rx = [0u8; SPI_TRANSFER_CAPACITY];
        let tx = &mut tx[..header.write_count];
        let rx = &mut rx[..header.read_count];

        self.transport.read_exact(tx).await?;

        if let Err(e) = self.spi.transfer(tx, rx) {
            error!("SPIOP: transfer failed: {}", e);
            return self.nak(NakReason::Spi(e)).await;
        }

        self.transport.write_byte(S_ACK).await?;
        self.transport.write_all(rx).await?;

        debug!(
            "SPIOP: wrote {} bytes, read {} bytes",
            header.write_count, header.read_count
        );
        Ok(Reply::SpiData {
            write_count: header.write_count,
            read_count: header.read_count,
        })
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn nak(&mut self, reason: NakReason) -> Result<Reply, TransportError> {
        self.transport.write_byte(S_NAK).await?;
        Ok(Reply::Nak(reason))
    }

    async fn discard(&mut self, mut count: usize) -> Result<(), TransportError> {
        let mut scratch = [0u8; 64];
        while count > 0 {
            let n = count.min(scratch.len());
            self.transport.read_exact(&mut scratch[..n]).await?;
            count -= n;
        }
        Ok(())
    }
}
