//! Error types for the transport and SPI collaborators.
//!
//! Protocol-level failures never show up here: they are answered on the wire
//! with a NAK. Only transport failures propagate out of the dispatcher.

use thiserror::Error;

/// Failure of the byte stream to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// The host went away (endpoint disabled, port closed).
    #[error("host disconnected")]
    Disconnected,

    /// A write did not complete within the transport's deadline.
    #[error("transport timed out")]
    Timeout,
}

/// Failure of a hardware SPI exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiError {
    /// The SPI bus reported an error while clocking data.
    #[error("SPI bus error")]
    Bus,

    /// The chip-select line could not be driven.
    #[error("chip select error")]
    ChipSelect,
}
