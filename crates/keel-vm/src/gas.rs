//! Gas schedule and per-frame gasometer

use keel_primitives::{word, Word};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::opcode::GasTier;

/// The frame ran out of gas
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutOfGas;

/// Every gas constant the interpreter and host consult.
///
/// [`Schedule::frontier`] is the default. With the `serde` feature a schedule
/// loads from partial config, missing fields keeping their Frontier values.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct Schedule {
    /// Cost of the zero, base, verylow, low, mid, high and ext tiers
    pub tier_step_gas: [u64; 7],
    /// EXP base cost
    pub exp_gas: u64,
    /// EXP cost per significant exponent byte
    pub exp_byte_gas: u64,
    /// SHA3 base cost
    pub sha3_gas: u64,
    /// SHA3 cost per hashed word
    pub sha3_word_gas: u64,
    /// SLOAD
    pub sload_gas: u64,
    /// SSTORE from zero to non-zero
    pub sstore_set_gas: u64,
    /// SSTORE for every other transition
    pub sstore_reset_gas: u64,
    /// Refund for SSTORE from non-zero to zero
    pub sstore_refund_gas: u64,
    /// JUMPDEST
    pub jumpdest_gas: u64,
    /// LOG base cost
    pub log_gas: u64,
    /// LOG cost per topic
    pub log_topic_gas: u64,
    /// LOG cost per data byte
    pub log_data_gas: u64,
    /// EXTCODEHASH
    pub extcodehash_gas: u64,
    /// Base cost of the CALL family
    pub call_gas: u64,
    /// Surcharge for a CALL that transfers value
    pub call_value_transfer_gas: u64,
    /// Surcharge for a value transfer to an account with no code and no balance
    pub call_new_account_gas: u64,
    /// Free gas handed to a callee that receives value
    pub call_stipend: u64,
    /// CREATE and CREATE2 base cost
    pub create_gas: u64,
    /// Cost per byte of deployed code
    pub create_data_gas: u64,
    /// Copy cost per word for the *COPY family
    pub copy_gas: u64,
    /// Memory cost per word
    pub memory_gas: u64,
    /// Divisor of the quadratic memory term
    pub quad_coeff_div: u64,
    /// SELFDESTRUCT
    pub suicide_gas: u64,
    /// Refund for the first SELFDESTRUCT of an account
    pub suicide_refund_gas: u64,
    /// Intrinsic gas of a message call transaction
    pub tx_gas: u64,
    /// Intrinsic gas of a contract creation transaction
    pub tx_create_gas: u64,
    /// Intrinsic gas per zero data byte
    pub tx_data_zero_gas: u64,
    /// Intrinsic gas per non-zero data byte
    pub tx_data_non_zero_gas: u64,
    /// Callee receives at most `available - available / divisor`
    pub sub_gas_cap_divisor: u64,
}

impl Schedule {
    /// The Frontier-derived schedule
    pub fn frontier() -> Self {
        Self {
            tier_step_gas: [0, 2, 3, 5, 8, 10, 20],
            exp_gas: 10,
            exp_byte_gas: 10,
            sha3_gas: 30,
            sha3_word_gas: 6,
            sload_gas: 50,
            sstore_set_gas: 20000,
            sstore_reset_gas: 5000,
            sstore_refund_gas: 15000,
            jumpdest_gas: 1,
            log_gas: 375,
            log_topic_gas: 375,
            log_data_gas: 8,
            extcodehash_gas: 400,
            call_gas: 40,
            call_value_transfer_gas: 9000,
            call_new_account_gas: 25000,
            call_stipend: 2300,
            create_gas: 32000,
            create_data_gas: 200,
            copy_gas: 3,
            memory_gas: 3,
            quad_coeff_div: 512,
            suicide_gas: 0,
            suicide_refund_gas: 24000,
            tx_gas: 21000,
            tx_create_gas: 53000,
            tx_data_zero_gas: 4,
            tx_data_non_zero_gas: 68,
            sub_gas_cap_divisor: 64,
        }
    }

    /// Static cost of a tier, `None` for [`GasTier::Special`]
    pub fn tier_gas(&self, tier: GasTier) -> Option<u64> {
        let index = match tier {
            GasTier::Zero => 0,
            GasTier::Base => 1,
            GasTier::VeryLow => 2,
            GasTier::Low => 3,
            GasTier::Mid => 4,
            GasTier::High => 5,
            GasTier::Ext => 6,
            GasTier::Special => return None,
        };
        Some(self.tier_step_gas[index])
    }

    /// Total memory cost of `words` words: linear plus quadratic term
    pub fn memory_cost(&self, words: u64) -> u128 {
        let words = words as u128;
        self.memory_gas as u128 * words + words * words / self.quad_coeff_div.max(1) as u128
    }

    /// Cost of copying `size` bytes
    pub fn copy_cost(&self, size: usize) -> u64 {
        self.copy_gas.saturating_mul(words_for(size))
    }

    /// Cost of hashing `size` bytes with SHA3
    pub fn sha3_cost(&self, size: usize) -> u64 {
        self.sha3_gas
            .saturating_add(self.sha3_word_gas.saturating_mul(words_for(size)))
    }

    /// Cost of EXP with the given exponent
    pub fn exp_cost(&self, exponent: &Word) -> u64 {
        self.exp_gas + self.exp_byte_gas * crate::arith::exponent_bytes(exponent)
    }

    /// Cost of a LOG with `topics` topics and `size` data bytes
    pub fn log_cost(&self, topics: usize, size: usize) -> u64 {
        self.log_gas
            .saturating_add(self.log_topic_gas.saturating_mul(topics as u64))
            .saturating_add(self.log_data_gas.saturating_mul(size as u64))
    }

    /// Cost of SSTORE moving a slot from `current` to `new`, plus the refund earned
    pub fn sstore_cost(&self, current: &Word, new: &Word) -> (u64, u64) {
        let cost = if current.is_zero() && !new.is_zero() {
            self.sstore_set_gas
        } else {
            self.sstore_reset_gas
        };
        let refund = if !current.is_zero() && new.is_zero() {
            self.sstore_refund_gas
        } else {
            0
        };
        (cost, refund)
    }

    /// Gas handed to a callee: the request, capped at all but one 64th of `available`
    pub fn call_gas_cap(&self, available: u64, requested: &Word) -> u64 {
        let cap = available - available / self.sub_gas_cap_divisor.max(1);
        word::to_u64(requested).map_or(cap, |requested| requested.min(cap))
    }

    /// Gas charged before a transaction reaches the interpreter
    pub fn intrinsic_gas(&self, data: &[u8], is_create: bool) -> u64 {
        let base = if is_create { self.tx_create_gas } else { self.tx_gas };
        data.iter().fold(base, |acc, byte| {
            acc.saturating_add(if *byte == 0 {
                self.tx_data_zero_gas
            } else {
                self.tx_data_non_zero_gas
            })
        })
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::frontier()
    }
}

fn words_for(size: usize) -> u64 {
    (size as u64).div_ceil(32)
}

/// Byte extent `offset + size` touched by a memory operand pair.
///
/// A zero `size` touches nothing, whatever the offset. An extent that does not
/// fit a native offset can never be paid for.
pub fn memory_extent(offset: &Word, size: &Word) -> Result<usize, OutOfGas> {
    if size.is_zero() {
        return Ok(0);
    }
    let offset = word::to_usize(offset).ok_or(OutOfGas)?;
    let size = word::to_usize(size).ok_or(OutOfGas)?;
    offset.checked_add(size).ok_or(OutOfGas)
}

/// Remaining gas of one frame
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Gasometer {
    gas_left: u64,
}

impl Gasometer {
    /// Start with `gas`
    pub fn new(gas: u64) -> Self {
        Self { gas_left: gas }
    }

    /// Gas still available
    pub fn gas_left(&self) -> u64 {
        self.gas_left
    }

    /// Deduct `amount`, or fail without deducting anything
    pub fn consume(&mut self, amount: u64) -> Result<(), OutOfGas> {
        if amount > self.gas_left {
            return Err(OutOfGas);
        }
        self.gas_left -= amount;
        Ok(())
    }

    /// Give back gas a callee did not use
    pub fn refund_unused(&mut self, amount: u64) {
        self.gas_left = self.gas_left.saturating_add(amount);
    }

    /// Charge the growth of memory from `current_words` to cover `extent`
    /// bytes, returning the new size in words.
    pub fn charge_memory(
        &mut self,
        schedule: &Schedule,
        current_words: usize,
        extent: usize,
    ) -> Result<usize, OutOfGas> {
        let new_words = extent.div_ceil(32);
        if new_words <= current_words {
            return Ok(current_words);
        }
        let delta =
            schedule.memory_cost(new_words as u64) - schedule.memory_cost(current_words as u64);
        let delta = u64::try_from(delta).map_err(|_| OutOfGas)?;
        self.consume(delta)?;
        Ok(new_words)
    }
}
