//! # frser-pico
//!
//! serprog protocol responder: lets flashrom (`-p serprog:dev=/dev/ttyACM0`)
//! drive a SPI flash chip through a microcontroller.
//!
//! The protocol core is hardware independent. It talks to the host through a
//! [`Transport`] and to the flash chip through a [`SpiPort`], so it runs the
//! same on the RP2040 firmware (feature `rp2040`) and in host tests.
//!
//! ```text
//!  host ──opcode──▶ Dispatcher ──Opcode::from_byte──▶ tables::command
//!                      │                                 │
//!                      │◀──── constant answer ───────────┘
//!                      │
//!                      ├── O_SPIOP ──▶ SpiPort::transfer
//!                      ▼
//!  host ◀──ACK/NAK + data── Transport
//! ```
#![cfg_attr(not(test), no_std)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod protocol;
pub mod spi;
pub mod tables;
pub mod transport;

pub use dispatcher::{Dispatcher, NakReason, Reply};
pub use error::{SpiError, TransportError};
pub use protocol::Opcode;
pub use spi::{SpiBusPort, SpiHeader, SpiPort};
pub use transport::Transport;
