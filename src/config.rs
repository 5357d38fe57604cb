// Device identity, announced protocol limits and hardware constants.

// =============================================================================
// Programmer identity
// =============================================================================

/// Name reported to `S_CMD_Q_PGMNAME`. The wire field is 16 bytes, NUL padded.
pub const PROGRAMMER_NAME: &[u8] = b"Fernly SPI";

/// Width of the programmer-name field on the wire.
pub const PROGRAMMER_NAME_LEN: usize = 16;

/// serprog interface version reported to `S_CMD_Q_IFACE`.
pub const INTERFACE_VERSION: u16 = 0x0001;

// =============================================================================
// Announced buffer sizes
// =============================================================================

/// Reply to `S_CMD_Q_SERBUF`.
pub const SERIAL_BUFFER_SIZE: u16 = 2;

/// Reply to `S_CMD_Q_OPBUF`.
pub const OPERATION_BUFFER_SIZE: u16 = 128;

/// Reply to `S_CMD_Q_WRNMAXLEN` (24-bit on the wire).
pub const WRITE_N_MAX_LEN: u32 = 128;

/// Reply to `S_CMD_Q_RDNMAXLEN` (24-bit on the wire).
pub const READ_N_MAX_LEN: u32 = 128;

// =============================================================================
// Request limits
// =============================================================================

/// Largest fixed parameter block of any command.
pub const MAX_PARAM_LEN: usize = 6;

/// Bytes available to one SPI operation, outgoing and incoming combined.
pub const SPI_TRANSFER_CAPACITY: usize = 256;

// =============================================================================
// Hardware (RP2040 firmware)
// =============================================================================

/// SPI clock at power-on (Hz).
pub const DEFAULT_SPI_FREQ_HZ: u32 = 30_000_000;

/// JEDEC "read identification" opcode, sent once at boot for diagnostics.
pub const SPI_CMD_RDID: u8 = 0x9F;

/// pid.codes test VID:PID.
pub const USB_VID: u16 = 0x1209;
pub const USB_PID: u16 = 0x0001;
pub const USB_MANUFACTURER: &str = "frser-pico";
pub const USB_PRODUCT: &str = "serprog SPI programmer";
pub const USB_SERIAL: &str = "FP0000001";

/// USB max packet size for Full Speed bulk endpoints.
pub const USB_MAX_PACKET_SIZE: u16 = 64;

/// Upper bound on a single USB packet write before the host is considered gone.
pub const USB_WRITE_TIMEOUT_MS: u64 = 500;
