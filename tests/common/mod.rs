//! In-memory collaborators for driving the dispatcher from tests.

#![allow(dead_code)]

use std::collections::VecDeque;

use frser_pico::{SpiError, SpiPort, Transport, TransportError};

/// Transport fed from a fixed script of host bytes.
///
/// Reads past the end of the script fail with `Disconnected`, which is how
/// tests end a `run()` loop.
#[derive(Default)]
pub struct ScriptedTransport {
    input: VecDeque<u8>,
    pub output: Vec<u8>,
    pub bytes_read: usize,
    pub flushes: usize,
}

impl ScriptedTransport {
    pub fn new(input: &[u8]) -> Self {
        Self {
            input: input.iter().copied().collect(),
            ..Default::default()
        }
    }

    pub fn remaining(&self) -> usize {
        self.input.len()
    }

    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }
}

impl Transport for ScriptedTransport {
    async fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), TransportError> {
        if self.input.len() < buf.len() {
            self.input.clear();
            return Err(TransportError::Disconnected);
        }
        for slot in buf.iter_mut() {
            *slot = self.input.pop_front().unwrap();
        }
        self.bytes_read += buf.len();
        Ok(())
    }

    async fn write_all(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.output.extend_from_slice(data);
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), TransportError> {
        self.flushes += 1;
        Ok(())
    }
}

/// One recorded call to [`FakeSpi::transfer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub tx: Vec<u8>,
    pub rx_len: usize,
}

/// SPI port that records every transfer and answers with a fixed pattern.
///
/// Read data is `response` repeated to the requested length, so the port is
/// stateless: the same request always returns the same bytes.
pub struct FakeSpi {
    response: Vec<u8>,
    fail: Option<SpiError>,
    pub transfers: Vec<Transfer>,
}

impl FakeSpi {
    pub fn answering(response: &[u8]) -> Self {
        Self {
            response: response.to_vec(),
            fail: None,
            transfers: Vec::new(),
        }
    }

    pub fn failing(error: SpiError) -> Self {
        Self {
            response: Vec::new(),
            fail: Some(error),
            transfers: Vec::new(),
        }
    }
}

impl SpiPort for FakeSpi {
    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<(), SpiError> {
        self.transfers.push(Transfer {
            tx: tx.to_vec(),
            rx_len: rx.len(),
        });
        if let Some(e) = self.fail {
            return Err(e);
        }
        for (slot, byte) in rx.iter_mut().zip(self.response.iter().cycle()) {
            *slot = *byte;
        }
        Ok(())
    }
}

/// Build an `S_CMD_O_SPIOP` request: opcode, 24-bit LE counts, payload.
pub fn spiop_request(payload: &[u8], read_count: usize) -> Vec<u8> {
    let w = (payload.len() as u32).to_le_bytes();
    let r = (read_count as u32).to_le_bytes();
    let mut req = vec![0x13, w[0], w[1], w[2], r[0], r[1], r[2]];
    req.extend_from_slice(payload);
    req
}
