//! Command table: what each opcode replies and how many parameter bytes it
//! consumes.
//!
//! The table is keyed by [`Opcode`], which only exists for in-range bytes, so
//! a lookup can never leave the table. Wire order and the "constant answers
//! take no parameters" rule are checked at compile time.

use crate::config::{
    INTERFACE_VERSION, MAX_PARAM_LEN, OPERATION_BUFFER_SIZE, PROGRAMMER_NAME, PROGRAMMER_NAME_LEN,
    READ_N_MAX_LEN, SERIAL_BUFFER_SIZE, WRITE_N_MAX_LEN,
};
use crate::protocol::{Opcode, BUS_SPI, OPCODE_COUNT, S_ACK, S_NAK};

/// What the dispatcher does once the parameters of a command are read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Write these bytes verbatim. First byte is the framing marker.
    Answer(&'static [u8]),
    /// Accept and acknowledge, nothing else to do.
    Ack,
    /// Run the SPI operation handler.
    SpiOp,
    /// Recognized but not implemented: NAK.
    Unsupported,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Command {
    pub opcode: Opcode,
    /// Fixed parameter bytes the host sends after the opcode.
    pub params: usize,
    pub action: Action,
}

impl Command {
    const fn answer(opcode: Opcode, bytes: &'static [u8]) -> Self {
        Self {
            opcode,
            params: 0,
            action: Action::Answer(bytes),
        }
    }

    const fn with_params(opcode: Opcode, params: usize, action: Action) -> Self {
        Self {
            opcode,
            params,
            action,
        }
    }
}

// =============================================================================
// Constant answers
// =============================================================================

const fn u16_answer(value: u16) -> [u8; 3] {
    let b = value.to_le_bytes();
    [S_ACK, b[0], b[1]]
}

const fn u24_answer(value: u32) -> [u8; 4] {
    let b = value.to_le_bytes();
    [S_ACK, b[0], b[1], b[2]]
}

const fn name_answer() -> [u8; 1 + PROGRAMMER_NAME_LEN] {
    let mut out = [0u8; 1 + PROGRAMMER_NAME_LEN];
    out[0] = S_ACK;
    let mut i = 0;
    while i < PROGRAMMER_NAME.len() {
        out[1 + i] = PROGRAMMER_NAME[i];
        i += 1;
    }
    out
}

/// Command bitmap: 32 bytes, bit `n` set when opcode `n` is supported.
const fn command_map_answer(supported: &[Opcode]) -> [u8; 33] {
    let mut out = [0u8; 33];
    out[0] = S_ACK;
    let mut i = 0;
    while i < supported.len() {
        let op = supported[i] as usize;
        out[1 + op / 8] |= 1 << (op % 8);
        i += 1;
    }
    out
}

/// Opcodes that get a reply other than a lone NAK.
const SUPPORTED: [Opcode; 15] = [
    Opcode::Nop,
    Opcode::QueryIface,
    Opcode::QueryCmdMap,
    Opcode::QueryPgmName,
    Opcode::QuerySerBuf,
    Opcode::QueryBusType,
    Opcode::QueryOpBuf,
    Opcode::QueryWriteNMaxLen,
    Opcode::OpBufInit,
    Opcode::OpBufDelay,
    Opcode::OpBufExec,
    Opcode::SyncNop,
    Opcode::QueryReadNMaxLen,
    Opcode::SetBusType,
    Opcode::SpiOp,
];

const ACK_ANSWER: [u8; 1] = [S_ACK];
const IFACE_ANSWER: [u8; 3] = u16_answer(INTERFACE_VERSION);
const CMDMAP_ANSWER: [u8; 33] = command_map_answer(&SUPPORTED);
const PGMNAME_ANSWER: [u8; 1 + PROGRAMMER_NAME_LEN] = name_answer();
const SERBUF_ANSWER: [u8; 3] = u16_answer(SERIAL_BUFFER_SIZE);
const BUSTYPE_ANSWER: [u8; 2] = [S_ACK, BUS_SPI];
const OPBUF_ANSWER: [u8; 3] = u16_answer(OPERATION_BUFFER_SIZE);
const WRNMAXLEN_ANSWER: [u8; 4] = u24_answer(WRITE_N_MAX_LEN);
const SYNCNOP_ANSWER: [u8; 2] = [S_NAK, S_ACK];
const RDNMAXLEN_ANSWER: [u8; 4] = u24_answer(READ_N_MAX_LEN);

// =============================================================================
// Table
// =============================================================================

const TABLE: [Command; OPCODE_COUNT] = [
    Command::answer(Opcode::Nop, &ACK_ANSWER),
    Command::answer(Opcode::QueryIface, &IFACE_ANSWER),
    Command::answer(Opcode::QueryCmdMap, &CMDMAP_ANSWER),
    Command::answer(Opcode::QueryPgmName, &PGMNAME_ANSWER),
    Command::answer(Opcode::QuerySerBuf, &SERBUF_ANSWER),
    Command::answer(Opcode::QueryBusType, &BUSTYPE_ANSWER),
    Command::with_params(Opcode::QueryChipSize, 0, Action::Unsupported),
    Command::answer(Opcode::QueryOpBuf, &OPBUF_ANSWER),
    Command::answer(Opcode::QueryWriteNMaxLen, &WRNMAXLEN_ANSWER),
    Command::with_params(Opcode::ReadByte, 3, Action::Unsupported),
    Command::with_params(Opcode::ReadN, 6, Action::Unsupported),
    Command::answer(Opcode::OpBufInit, &ACK_ANSWER),
    Command::with_params(Opcode::OpBufWriteByte, 4, Action::Unsupported),
    Command::with_params(Opcode::OpBufWriteN, 0, Action::Unsupported),
    Command::with_params(Opcode::OpBufDelay, 4, Action::Ack),
    Command::answer(Opcode::OpBufExec, &ACK_ANSWER),
    Command::answer(Opcode::SyncNop, &SYNCNOP_ANSWER),
    Command::answer(Opcode::QueryReadNMaxLen, &RDNMAXLEN_ANSWER),
    Command::with_params(Opcode::SetBusType, 1, Action::Ack),
    Command::with_params(Opcode::SpiOp, 6, Action::SpiOp),
];

const _: () = {
    assert!(PROGRAMMER_NAME.len() <= PROGRAMMER_NAME_LEN);
    let mut i = 0;
    while i < OPCODE_COUNT {
        let cmd = &TABLE[i];
        assert!(cmd.opcode as usize == i, "command table out of wire order");
        assert!(cmd.params <= MAX_PARAM_LEN, "parameter block exceeds MAX_PARAM_LEN");
        if let Action::Answer(bytes) = cmd.action {
            assert!(cmd.params == 0, "constant answers take no parameters");
            assert!(!bytes.is_empty());
        }
        i += 1;
    }
};

static COMMANDS: [Command; OPCODE_COUNT] = TABLE;

/// Table entry for `op`.
pub fn command(op: Opcode) -> &'static Command {
    &COMMANDS[op as usize]
}

/// Constant reply for `op`, if its reply never depends on parameters.
pub fn const_reply(op: Opcode) -> Option<&'static [u8]> {
    match command(op).action {
        Action::Answer(bytes) => Some(bytes),
        _ => None,
    }
}

/// Parameter bytes the host sends after `op`.
pub fn param_len(op: Opcode) -> usize {
    command(op).params
}
