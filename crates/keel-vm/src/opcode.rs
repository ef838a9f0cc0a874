//! Opcode definitions and the static instruction table
//!
//! Every defined opcode has an [`InstructionInfo`] entry: mnemonic, stack
//! arguments and results, and gas tier. The table is built at compile time
//! and never mutated.

use std::fmt;

/// A single EVM opcode byte
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Opcode(pub u8);

#[allow(missing_docs)]
impl Opcode {
    // Stop and Arithmetic
    pub const STOP: Opcode = Opcode(0x00);
    pub const ADD: Opcode = Opcode(0x01);
    pub const MUL: Opcode = Opcode(0x02);
    pub const SUB: Opcode = Opcode(0x03);
    pub const DIV: Opcode = Opcode(0x04);
    pub const SDIV: Opcode = Opcode(0x05);
    pub const MOD: Opcode = Opcode(0x06);
    pub const SMOD: Opcode = Opcode(0x07);
    pub const ADDMOD: Opcode = Opcode(0x08);
    pub const MULMOD: Opcode = Opcode(0x09);
    pub const EXP: Opcode = Opcode(0x0a);
    pub const SIGNEXTEND: Opcode = Opcode(0x0b);

    // Comparison & Bitwise Logic
    pub const LT: Opcode = Opcode(0x10);
    pub const GT: Opcode = Opcode(0x11);
    pub const SLT: Opcode = Opcode(0x12);
    pub const SGT: Opcode = Opcode(0x13);
    pub const EQ: Opcode = Opcode(0x14);
    pub const ISZERO: Opcode = Opcode(0x15);
    pub const AND: Opcode = Opcode(0x16);
    pub const OR: Opcode = Opcode(0x17);
    pub const XOR: Opcode = Opcode(0x18);
    pub const NOT: Opcode = Opcode(0x19);
    pub const BYTE: Opcode = Opcode(0x1a);
    pub const SHL: Opcode = Opcode(0x1b);
    pub const SHR: Opcode = Opcode(0x1c);
    pub const SAR: Opcode = Opcode(0x1d);

    pub const SHA3: Opcode = Opcode(0x20);

    // Environmental Information
    pub const ADDRESS: Opcode = Opcode(0x30);
    pub const BALANCE: Opcode = Opcode(0x31);
    pub const ORIGIN: Opcode = Opcode(0x32);
    pub const CALLER: Opcode = Opcode(0x33);
    pub const CALLVALUE: Opcode = Opcode(0x34);
    pub const CALLDATALOAD: Opcode = Opcode(0x35);
    pub const CALLDATASIZE: Opcode = Opcode(0x36);
    pub const CALLDATACOPY: Opcode = Opcode(0x37);
    pub const CODESIZE: Opcode = Opcode(0x38);
    pub const CODECOPY: Opcode = Opcode(0x39);
    pub const GASPRICE: Opcode = Opcode(0x3a);
    pub const EXTCODESIZE: Opcode = Opcode(0x3b);
    pub const EXTCODECOPY: Opcode = Opcode(0x3c);
    pub const RETURNDATASIZE: Opcode = Opcode(0x3d);
    pub const RETURNDATACOPY: Opcode = Opcode(0x3e);
    pub const EXTCODEHASH: Opcode = Opcode(0x3f);

    // Block Information
    pub const BLOCKHASH: Opcode = Opcode(0x40);
    pub const COINBASE: Opcode = Opcode(0x41);
    pub const TIMESTAMP: Opcode = Opcode(0x42);
    pub const NUMBER: Opcode = Opcode(0x43);
    pub const DIFFICULTY: Opcode = Opcode(0x44);
    pub const GASLIMIT: Opcode = Opcode(0x45);
    pub const CHAINID: Opcode = Opcode(0x46);
    pub const SELFBALANCE: Opcode = Opcode(0x47);

    // Stack, Memory, Storage and Flow Operations
    pub const POP: Opcode = Opcode(0x50);
    pub const MLOAD: Opcode = Opcode(0x51);
    pub const MSTORE: Opcode = Opcode(0x52);
    pub const MSTORE8: Opcode = Opcode(0x53);
    pub const SLOAD: Opcode = Opcode(0x54);
    pub const SSTORE: Opcode = Opcode(0x55);
    pub const JUMP: Opcode = Opcode(0x56);
    pub const JUMPI: Opcode = Opcode(0x57);
    pub const PC: Opcode = Opcode(0x58);
    pub const MSIZE: Opcode = Opcode(0x59);
    pub const GAS: Opcode = Opcode(0x5a);
    pub const JUMPDEST: Opcode = Opcode(0x5b);

    pub const PUSH1: Opcode = Opcode(0x60);
    pub const PUSH32: Opcode = Opcode(0x7f);
    pub const DUP1: Opcode = Opcode(0x80);
    pub const DUP16: Opcode = Opcode(0x8f);
    pub const SWAP1: Opcode = Opcode(0x90);
    pub const SWAP16: Opcode = Opcode(0x9f);

    // Logging
    pub const LOG0: Opcode = Opcode(0xa0);
    pub const LOG4: Opcode = Opcode(0xa4);

    // System Operations
    pub const CREATE: Opcode = Opcode(0xf0);
    pub const CALL: Opcode = Opcode(0xf1);
    pub const CALLCODE: Opcode = Opcode(0xf2);
    pub const RETURN: Opcode = Opcode(0xf3);
    pub const DELEGATECALL: Opcode = Opcode(0xf4);
    pub const CREATE2: Opcode = Opcode(0xf5);
    pub const STATICCALL: Opcode = Opcode(0xfa);
    pub const REVERT: Opcode = Opcode(0xfd);
    pub const INVALID: Opcode = Opcode(0xfe);
    pub const SELFDESTRUCT: Opcode = Opcode(0xff);
}

impl Opcode {
    /// Raw byte value
    pub const fn as_u8(self) -> u8 {
        self.0
    }

    /// Table entry, or `None` for undefined bytes (including INVALID)
    pub fn info(self) -> Option<&'static InstructionInfo> {
        INSTRUCTIONS[self.0 as usize].as_ref()
    }

    /// Mnemonic, or `None` for undefined bytes
    pub fn name(self) -> Option<&'static str> {
        self.info().map(|info| info.name)
    }

    /// Number of immediate bytes following a PUSH opcode (0 otherwise)
    pub const fn push_bytes(self) -> usize {
        if self.0 >= Self::PUSH1.0 && self.0 <= Self::PUSH32.0 {
            (self.0 - Self::PUSH1.0) as usize + 1
        } else {
            0
        }
    }

    /// Whether this is PUSH1..PUSH32
    pub const fn is_push(self) -> bool {
        self.push_bytes() != 0
    }

    /// DUP depth (1 for DUP1), or 0
    pub const fn dup_depth(self) -> usize {
        if self.0 >= Self::DUP1.0 && self.0 <= Self::DUP16.0 {
            (self.0 - Self::DUP1.0) as usize + 1
        } else {
            0
        }
    }

    /// SWAP depth (1 for SWAP1), or 0
    pub const fn swap_depth(self) -> usize {
        if self.0 >= Self::SWAP1.0 && self.0 <= Self::SWAP16.0 {
            (self.0 - Self::SWAP1.0) as usize + 1
        } else {
            0
        }
    }

    /// Topic count for LOG0..LOG4, or `None`
    pub const fn log_topics(self) -> Option<usize> {
        if self.0 >= Self::LOG0.0 && self.0 <= Self::LOG4.0 {
            Some((self.0 - Self::LOG0.0) as usize)
        } else {
            None
        }
    }
}

impl From<u8> for Opcode {
    fn from(byte: u8) -> Self {
        Opcode(byte)
    }
}

impl fmt::Debug for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "UNKNOWN(0x{:02x})", self.0),
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Static gas class of an instruction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GasTier {
    /// 0
    Zero,
    /// 2
    Base,
    /// 3
    VeryLow,
    /// 5
    Low,
    /// 8
    Mid,
    /// 10
    High,
    /// 20
    Ext,
    /// Cost computed from the operands
    Special,
}

/// Immutable metadata of one instruction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InstructionInfo {
    /// Mnemonic
    pub name: &'static str,
    /// Stack items consumed
    pub args: usize,
    /// Stack items produced
    pub ret: usize,
    /// Static gas class
    pub tier: GasTier,
}

const fn op(name: &'static str, args: usize, ret: usize, tier: GasTier) -> Option<InstructionInfo> {
    Some(InstructionInfo { name, args, ret, tier })
}

const PUSH_NAMES: [&str; 32] = [
    "PUSH1", "PUSH2", "PUSH3", "PUSH4", "PUSH5", "PUSH6", "PUSH7", "PUSH8", "PUSH9", "PUSH10",
    "PUSH11", "PUSH12", "PUSH13", "PUSH14", "PUSH15", "PUSH16", "PUSH17", "PUSH18", "PUSH19",
    "PUSH20", "PUSH21", "PUSH22", "PUSH23", "PUSH24", "PUSH25", "PUSH26", "PUSH27", "PUSH28",
    "PUSH29", "PUSH30", "PUSH31", "PUSH32",
];

const DUP_NAMES: [&str; 16] = [
    "DUP1", "DUP2", "DUP3", "DUP4", "DUP5", "DUP6", "DUP7", "DUP8", "DUP9", "DUP10", "DUP11",
    "DUP12", "DUP13", "DUP14", "DUP15", "DUP16",
];

const SWAP_NAMES: [&str; 16] = [
    "SWAP1", "SWAP2", "SWAP3", "SWAP4", "SWAP5", "SWAP6", "SWAP7", "SWAP8", "SWAP9", "SWAP10",
    "SWAP11", "SWAP12", "SWAP13", "SWAP14", "SWAP15", "SWAP16",
];

const LOG_NAMES: [&str; 5] = ["LOG0", "LOG1", "LOG2", "LOG3", "LOG4"];

static INSTRUCTIONS: [Option<InstructionInfo>; 256] = build_table();

const fn build_table() -> [Option<InstructionInfo>; 256] {
    use GasTier::*;

    let mut t: [Option<InstructionInfo>; 256] = [None; 256];

    t[0x00] = op("STOP", 0, 0, Zero);
    t[0x01] = op("ADD", 2, 1, VeryLow);
    t[0x02] = op("MUL", 2, 1, Low);
    t[0x03] = op("SUB", 2, 1, VeryLow);
    t[0x04] = op("DIV", 2, 1, Low);
    t[0x05] = op("SDIV", 2, 1, Low);
    t[0x06] = op("MOD", 2, 1, Low);
    t[0x07] = op("SMOD", 2, 1, Low);
    t[0x08] = op("ADDMOD", 3, 1, Mid);
    t[0x09] = op("MULMOD", 3, 1, Mid);
    t[0x0a] = op("EXP", 2, 1, Special);
    t[0x0b] = op("SIGNEXTEND", 2, 1, Low);

    t[0x10] = op("LT", 2, 1, VeryLow);
    t[0x11] = op("GT", 2, 1, VeryLow);
    t[0x12] = op("SLT", 2, 1, VeryLow);
    t[0x13] = op("SGT", 2, 1, VeryLow);
    t[0x14] = op("EQ", 2, 1, VeryLow);
    t[0x15] = op("ISZERO", 1, 1, VeryLow);
    t[0x16] = op("AND", 2, 1, VeryLow);
    t[0x17] = op("OR", 2, 1, VeryLow);
    t[0x18] = op("XOR", 2, 1, VeryLow);
    t[0x19] = op("NOT", 1, 1, VeryLow);
    t[0x1a] = op("BYTE", 2, 1, VeryLow);
    t[0x1b] = op("SHL", 2, 1, VeryLow);
    t[0x1c] = op("SHR", 2, 1, VeryLow);
    t[0x1d] = op("SAR", 2, 1, VeryLow);

    t[0x20] = op("SHA3", 2, 1, Special);

    t[0x30] = op("ADDRESS", 0, 1, Base);
    t[0x31] = op("BALANCE", 1, 1, Ext);
    t[0x32] = op("ORIGIN", 0, 1, Base);
    t[0x33] = op("CALLER", 0, 1, Base);
    t[0x34] = op("CALLVALUE", 0, 1, Base);
    t[0x35] = op("CALLDATALOAD", 1, 1, VeryLow);
    t[0x36] = op("CALLDATASIZE", 0, 1, Base);
    t[0x37] = op("CALLDATACOPY", 3, 0, VeryLow);
    t[0x38] = op("CODESIZE", 0, 1, Base);
    t[0x39] = op("CODECOPY", 3, 0, VeryLow);
    t[0x3a] = op("GASPRICE", 0, 1, Base);
    t[0x3b] = op("EXTCODESIZE", 1, 1, Ext);
    t[0x3c] = op("EXTCODECOPY", 4, 0, Ext);
    t[0x3d] = op("RETURNDATASIZE", 0, 1, Base);
    t[0x3e] = op("RETURNDATACOPY", 3, 0, VeryLow);
    t[0x3f] = op("EXTCODEHASH", 1, 1, Special);

    t[0x40] = op("BLOCKHASH", 1, 1, Ext);
    t[0x41] = op("COINBASE", 0, 1, Base);
    t[0x42] = op("TIMESTAMP", 0, 1, Base);
    t[0x43] = op("NUMBER", 0, 1, Base);
    t[0x44] = op("DIFFICULTY", 0, 1, Base);
    t[0x45] = op("GASLIMIT", 0, 1, Base);
    t[0x46] = op("CHAINID", 0, 1, Base);
    t[0x47] = op("SELFBALANCE", 0, 1, Low);

    t[0x50] = op("POP", 1, 0, Base);
    t[0x51] = op("MLOAD", 1, 1, VeryLow);
    t[0x52] = op("MSTORE", 2, 0, VeryLow);
    t[0x53] = op("MSTORE8", 2, 0, VeryLow);
    t[0x54] = op("SLOAD", 1, 1, Special);
    t[0x55] = op("SSTORE", 2, 0, Special);
    t[0x56] = op("JUMP", 1, 0, Mid);
    t[0x57] = op("JUMPI", 2, 0, High);
    t[0x58] = op("PC", 0, 1, Base);
    t[0x59] = op("MSIZE", 0, 1, Base);
    t[0x5a] = op("GAS", 0, 1, Base);
    t[0x5b] = op("JUMPDEST", 0, 0, Special);

    let mut i = 0;
    while i < 32 {
        t[0x60 + i] = op(PUSH_NAMES[i], 0, 1, VeryLow);
        i += 1;
    }
    let mut i = 0;
    while i < 16 {
        t[0x80 + i] = op(DUP_NAMES[i], i + 1, i + 2, VeryLow);
        t[0x90 + i] = op(SWAP_NAMES[i], i + 2, i + 2, VeryLow);
        i += 1;
    }
    let mut i = 0;
    while i < 5 {
        t[0xa0 + i] = op(LOG_NAMES[i], i + 2, 0, Special);
        i += 1;
    }

    t[0xf0] = op("CREATE", 3, 1, Special);
    t[0xf1] = op("CALL", 7, 1, Special);
    t[0xf2] = op("CALLCODE", 7, 1, Special);
    t[0xf3] = op("RETURN", 2, 0, Zero);
    t[0xf4] = op("DELEGATECALL", 6, 1, Special);
    t[0xf5] = op("CREATE2", 4, 1, Special);
    t[0xfa] = op("STATICCALL", 6, 1, Special);
    t[0xfd] = op("REVERT", 2, 0, Zero);
    t[0xff] = op("SELFDESTRUCT", 1, 0, Special);

    t
}
