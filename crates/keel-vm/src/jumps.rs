//! Jump destination analysis

use std::collections::HashSet;

use keel_primitives::{word, Word};

use crate::opcode::Opcode;

/// Offsets of JUMPDEST bytes that are real instructions, not PUSH data.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JumpSet {
    dests: HashSet<usize>,
}

impl JumpSet {
    /// Scan `code` once, left to right: PUSHn skips its n immediate bytes
    /// and every JUMPDEST reached as an instruction is recorded.
    pub fn analyze(code: &[u8]) -> Self {
        let mut dests = HashSet::new();
        let mut pc = 0;
        while pc < code.len() {
            let op = Opcode(code[pc]);
            if op == Opcode::JUMPDEST {
                dests.insert(pc);
            }
            pc += 1 + op.push_bytes();
        }
        Self { dests }
    }

    /// `Some(target)` when the target is a recorded JUMPDEST.
    ///
    /// `None` is the invalid-argument outcome: the target is not in the set
    /// or does not fit a native offset.
    pub fn verify_jump(&self, target: &Word) -> Option<usize> {
        word::to_usize(target).filter(|pc| self.dests.contains(pc))
    }

    /// Whether `pc` is a valid destination
    pub fn contains(&self, pc: usize) -> bool {
        self.dests.contains(&pc)
    }

    /// Number of valid destinations
    pub fn len(&self) -> usize {
        self.dests.len()
    }

    /// Whether the code has no valid destination
    pub fn is_empty(&self) -> bool {
        self.dests.is_empty()
    }
}
