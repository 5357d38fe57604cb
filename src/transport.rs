//! Byte stream to the host.
//!
//! The dispatcher only needs blocking-style reads and writes of exact
//! lengths plus a flush at the end of each reply. Timeouts, if any, belong
//! to the implementation and surface as [`TransportError::Timeout`].

use crate::error::TransportError;

#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Fill `buf` completely, waiting as long as the host takes.
    async fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), TransportError>;

    /// Queue all of `data` for the host.
    async fn write_all(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Push any queued bytes out to the host.
    async fn flush(&mut self) -> Result<(), TransportError>;

    async fn read_byte(&mut self) -> Result<u8, TransportError> {
        let mut byte = [0u8; 1];
        self.read_exact(&mut byte).await?;
        Ok(byte[0])
    }

    async fn write_byte(&mut self, byte: u8) -> Result<(), TransportError> {
        self.write_all(&[byte]).await
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    async fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), TransportError> {
        (**self).read_exact(buf).await
    }

    async fn write_all(&mut self, data: &[u8]) -> Result<(), TransportError> {
        (**self).write_all(data).await
    }

    async fn flush(&mut self) -> Result<(), TransportError> {
        (**self).flush().await
    }
}
