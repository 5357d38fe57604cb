// serprog protocol opcodes and framing bytes.

// =============================================================================
// Framing
// =============================================================================

/// Acknowledgement marker. First byte of every successful reply.
pub const S_ACK: u8 = 0x06;

/// Negative acknowledgement. Sole reply to rejected requests.
pub const S_NAK: u8 = 0x15;

/// Bus-type bit for SPI in `S_CMD_Q_BUSTYPE` / `S_CMD_S_BUSTYPE`.
pub const BUS_SPI: u8 = 1 << 3;

/// Highest opcode this responder recognizes.
pub const MAX_OPCODE: u8 = 0x13;

/// Number of recognized opcodes.
pub const OPCODE_COUNT: usize = MAX_OPCODE as usize + 1;

// =============================================================================
// Opcodes
// =============================================================================

/// A recognized serprog command.
///
/// Raw bytes from the host only become an `Opcode` through
/// [`Opcode::from_byte`], so every value of this type is in
/// `0..=MAX_OPCODE` and safe to use as a table key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Opcode {
    Nop = 0x00,
    QueryIface = 0x01,
    QueryCmdMap = 0x02,
    QueryPgmName = 0x03,
    QuerySerBuf = 0x04,
    QueryBusType = 0x05,
    QueryChipSize = 0x06,
    QueryOpBuf = 0x07,
    QueryWriteNMaxLen = 0x08,
    ReadByte = 0x09,
    ReadN = 0x0A,
    OpBufInit = 0x0B,
    OpBufWriteByte = 0x0C,
    OpBufWriteN = 0x0D,
    OpBufDelay = 0x0E,
    OpBufExec = 0x0F,
    SyncNop = 0x10,
    QueryReadNMaxLen = 0x11,
    SetBusType = 0x12,
    SpiOp = 0x13,
}

impl Opcode {
    /// Every recognized opcode, in wire order.
    pub const ALL: [Opcode; OPCODE_COUNT] = [
        Opcode::Nop,
        Opcode::QueryIface,
        Opcode::QueryCmdMap,
        Opcode::QueryPgmName,
        Opcode::QuerySerBuf,
        Opcode::QueryBusType,
        Opcode::QueryChipSize,
        Opcode::QueryOpBuf,
        Opcode::QueryWriteNMaxLen,
        Opcode::ReadByte,
        Opcode::ReadN,
        Opcode::OpBufInit,
        Opcode::OpBufWriteByte,
        Opcode::OpBufWriteN,
        Opcode::OpBufDelay,
        Opcode::OpBufExec,
        Opcode::SyncNop,
        Opcode::QueryReadNMaxLen,
        Opcode::SetBusType,
        Opcode::SpiOp,
    ];

    /// Validate a raw opcode byte. Anything above [`MAX_OPCODE`] is `None`.
    pub const fn from_byte(b: u8) -> Option<Self> {
        if b > MAX_OPCODE {
            return None;
        }
        Some(Self::ALL[b as usize])
    }

    pub const fn as_byte(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_byte_accepts_every_recognized_opcode() {
        for b in 0..=MAX_OPCODE {
            let op = Opcode::from_byte(b).unwrap();
            assert_eq!(op.as_byte(), b);
        }
    }

    #[test]
    fn from_byte_rejects_everything_above_max() {
        for b in (MAX_OPCODE + 1)..=u8::MAX {
            assert_eq!(Opcode::from_byte(b), None, "opcode 0x{b:02x}");
        }
    }

    #[test]
    fn all_is_in_wire_order() {
        for (i, op) in Opcode::ALL.iter().enumerate() {
            assert_eq!(op.as_byte() as usize, i);
        }
    }
}
