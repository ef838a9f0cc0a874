//! Recording [`External`] for fixtures

use std::cell::RefCell;
use std::collections::HashMap;

use bytes::Bytes;
use keel_crypto::storage_key;
use keel_primitives::{word, Address, Word, H256};
use keel_vm::{External, Log, PendingState};

/// Host double that answers from fixed responders and records what the VM
/// and the fixture runner ask of it.
#[derive(Debug, Default)]
pub struct MockExternal {
    codes: HashMap<Address, Bytes>,
    balances: HashMap<Address, Word>,
    nonces: HashMap<Address, u64>,
    storage: HashMap<H256, Bytes>,
    code_lookups: RefCell<Vec<Address>>,
    /// Logs received through [`External::log`]
    pub logs: Vec<Log>,
    /// Self-destructs received through [`External::suicide`]
    pub suicides: Vec<Address>,
}

impl MockExternal {
    /// Empty mock
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer code lookups for `address`
    pub fn with_code(mut self, address: Address, code: Bytes) -> Self {
        self.codes.insert(address, code);
        self
    }

    /// Answer balance lookups for `address`
    pub fn with_balance(mut self, address: Address, balance: Word) -> Self {
        self.balances.insert(address, balance);
        self
    }

    /// Answer nonce lookups for `address`
    pub fn with_nonce(mut self, address: Address, nonce: u64) -> Self {
        self.nonces.insert(address, nonce);
        self
    }

    /// Answer the composite key of `(address, key)` with `value`
    pub fn with_storage(mut self, address: &Address, key: &Word, value: &Word) -> Self {
        self.storage.insert(
            storage_key(address, key),
            Bytes::copy_from_slice(&word::to_be_bytes(value)),
        );
        self
    }

    /// Addresses whose code was requested, in order
    pub fn code_lookups(&self) -> Vec<Address> {
        self.code_lookups.borrow().clone()
    }

    /// Slot value after `pending` is applied over the responders
    pub fn storage_after(&self, pending: &PendingState, address: &Address, key: &Word) -> Word {
        match pending.get_storage(address, key) {
            Some(value) => *value,
            None => word::from_be_slice_truncating(&self.storage_at(&storage_key(address, key))),
        }
    }

    /// Forward the logs and self-destructs of a committed change set
    pub fn forward(&mut self, pending: &PendingState) {
        for log in &pending.logs {
            self.log(&log.address, &log.topics, &log.data);
        }
        for address in &pending.suicides {
            self.suicide(address);
        }
    }
}

impl External for MockExternal {
    fn code(&self, address: &Address) -> Bytes {
        self.code_lookups.borrow_mut().push(*address);
        self.codes.get(address).cloned().unwrap_or_default()
    }

    fn balance(&self, address: &Address) -> Word {
        self.balances.get(address).copied().unwrap_or_default()
    }

    fn storage_at(&self, key: &H256) -> Bytes {
        self.storage.get(key).cloned().unwrap_or_default()
    }

    fn nonce(&self, address: &Address) -> u64 {
        self.nonces.get(address).copied().unwrap_or_default()
    }

    fn log(&mut self, address: &Address, topics: &[H256], data: &[u8]) {
        self.logs.push(Log {
            address: *address,
            topics: topics.to_vec(),
            data: Bytes::copy_from_slice(data),
        });
    }

    fn suicide(&mut self, address: &Address) {
        self.suicides.push(*address);
    }
}
