//! In-memory [`External`] implementation, for tests, tooling and benches.

use std::collections::BTreeMap;

use bytes::Bytes;
use keel_crypto::storage_key;
use keel_primitives::{word, Address, Word, H256};

use crate::external::External;
use crate::pending::{Log, PendingState};

/// Account record of the in-memory backend
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InMemoryAccount {
    /// Balance
    pub balance: Word,
    /// Deployed code
    pub code: Bytes,
    /// Contract nonce
    pub nonce: u64,
}

/// Host state kept in ordered maps.
///
/// Storage is keyed by the composite key from [`storage_key`], the same key a
/// ledger host would persist under.
#[derive(Clone, Debug, Default)]
pub struct InMemoryBackend {
    /// Accounts by address
    pub accounts: BTreeMap<Address, InMemoryAccount>,
    /// Storage by composite key
    pub storage: BTreeMap<H256, Bytes>,
    /// Logs received through [`External::log`]
    pub logs: Vec<Log>,
    /// Self-destructs received through [`External::suicide`]
    pub suicides: Vec<Address>,
}

impl InMemoryBackend {
    /// Empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Install code at `address`
    pub fn set_code(&mut self, address: Address, code: impl Into<Bytes>) {
        self.accounts.entry(address).or_default().code = code.into();
    }

    /// Set the balance of `address`
    pub fn set_balance(&mut self, address: Address, balance: Word) {
        self.accounts.entry(address).or_default().balance = balance;
    }

    /// Write a storage slot of `address`
    pub fn set_storage(&mut self, address: &Address, key: &Word, value: &Word) {
        self.storage.insert(
            storage_key(address, key),
            Bytes::copy_from_slice(&word::to_be_bytes(value)),
        );
    }

    /// Read a storage slot of `address`
    pub fn get_storage(&self, address: &Address, key: &Word) -> Word {
        word::from_be_slice_truncating(&self.storage_at(&storage_key(address, key)))
    }

    /// Persist a committed change set and forward its logs and self-destructs.
    pub fn apply(&mut self, pending: &PendingState) {
        for ((address, key), value) in &pending.storage {
            self.set_storage(address, key, value);
        }
        for (address, balance) in &pending.balances {
            self.set_balance(*address, *balance);
        }
        for (address, code) in &pending.codes {
            self.set_code(*address, code.clone());
        }
        for (address, nonce) in &pending.nonces {
            self.accounts.entry(*address).or_default().nonce = *nonce;
        }
        for log in &pending.logs {
            self.log(&log.address, &log.topics, &log.data);
        }
        for address in &pending.suicides {
            self.suicide(address);
        }
    }
}

impl External for InMemoryBackend {
    fn code(&self, address: &Address) -> Bytes {
        self.accounts
            .get(address)
            .map(|account| account.code.clone())
            .unwrap_or_default()
    }

    fn balance(&self, address: &Address) -> Word {
        self.accounts
            .get(address)
            .map(|account| account.balance)
            .unwrap_or_default()
    }

    fn storage_at(&self, key: &H256) -> Bytes {
        self.storage.get(key).cloned().unwrap_or_default()
    }

    fn nonce(&self, address: &Address) -> u64 {
        self.accounts
            .get(address)
            .map(|account| account.nonce)
            .unwrap_or_default()
    }

    fn log(&mut self, address: &Address, topics: &[H256], data: &[u8]) {
        self.logs.push(Log {
            address: *address,
            topics: topics.to_vec(),
            data: Bytes::copy_from_slice(data),
        });
    }

    fn suicide(&mut self, address: &Address) {
        self.accounts.remove(address);
        self.suicides.push(*address);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_under_composite_key() {
        let mut backend = InMemoryBackend::new();
        let address = Address::from_low_bytes(&[0xaa]);
        backend.set_storage(&address, &Word::one(), &Word::from(7u64));

        let key = storage_key(&address, &Word::one());
        assert_eq!(backend.storage_at(&key).len(), 32);
        assert_eq!(backend.get_storage(&address, &Word::one()), Word::from(7u64));
        assert_eq!(backend.get_storage(&address, &Word::zero()), Word::zero());
    }

    #[test]
    fn test_apply_pending() {
        let mut backend = InMemoryBackend::new();
        let address = Address::from_low_bytes(&[0x01]);
        let mut pending = PendingState::new();
        pending.put_storage(address, Word::zero(), Word::from(9u64));
        pending.balances.insert(address, Word::from(100u64));
        pending.codes.insert(address, Bytes::from_static(&[0x00]));
        pending.nonces.insert(address, 2);
        pending.push_log(Log {
            address,
            topics: vec![H256::ZERO],
            data: Bytes::from_static(b"hi"),
        });

        backend.apply(&pending);
        assert_eq!(backend.get_storage(&address, &Word::zero()), Word::from(9u64));
        assert_eq!(backend.balance(&address), Word::from(100u64));
        assert_eq!(backend.code(&address).as_ref(), &[0x00]);
        assert_eq!(backend.nonce(&address), 2);
        assert_eq!(backend.logs, pending.logs);
    }

    #[test]
    fn test_suicide_removes_account() {
        let mut backend = InMemoryBackend::new();
        let address = Address::from_low_bytes(&[0x02]);
        backend.set_balance(address, Word::one());
        backend.suicide(&address);
        assert_eq!(backend.balance(&address), Word::zero());
        assert_eq!(backend.suicides, vec![address]);
    }
}
