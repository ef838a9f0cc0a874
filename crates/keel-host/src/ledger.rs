//! Host-side account tables

use std::collections::HashMap;

use bytes::Bytes;
use keel_primitives::{word, Address, Word, H256};
use keel_vm::{External, Log};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// A ledger account linked to an EVM account identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedAccount {
    /// Ledger account name
    pub name: String,
    /// Derived EVM identifier
    pub identifier: Address,
    /// Nonce of the last accepted transaction
    pub nonce: u64,
    /// Balance
    pub balance: Word,
}

/// Persistent tables a ledger exposes to the executor.
///
/// Reads used by the interpreter come through [`External`]; the methods here
/// are the writes the executor performs after a transaction commits, plus the
/// account lookups it validates against.
pub trait HostLedger: External {
    /// Linked account by EVM identifier
    fn account(&self, identifier: &Address) -> Option<LinkedAccount>;

    /// Linked account by ledger name
    fn account_by_name(&self, name: &str) -> Option<LinkedAccount>;

    /// Link a new account
    fn insert_account(&mut self, account: LinkedAccount);

    /// Record the nonce of the last accepted transaction
    fn set_account_nonce(&mut self, identifier: &Address, nonce: u64);

    /// Persist a storage slot under its composite key
    fn put_storage(&mut self, key: H256, value: Word);

    /// Persist deployed code
    fn put_code(&mut self, address: Address, code: Bytes);

    /// Persist the balance of a linked account or contract
    fn put_balance(&mut self, address: Address, balance: Word);

    /// Persist the nonce of a contract
    fn put_nonce(&mut self, address: Address, nonce: u64);
}

#[derive(Debug, Default, Clone)]
struct ContractAccount {
    code: Bytes,
    balance: Word,
    nonce: u64,
}

#[derive(Debug, Default)]
struct Tables {
    accounts: HashMap<String, LinkedAccount>,
    identifiers: HashMap<Address, String>,
    contracts: HashMap<Address, ContractAccount>,
    storage: HashMap<H256, Word>,
    logs: Vec<Log>,
    suicides: Vec<Address>,
}

impl Tables {
    fn linked(&self, identifier: &Address) -> Option<&LinkedAccount> {
        self.identifiers
            .get(identifier)
            .and_then(|name| self.accounts.get(name))
    }

    fn linked_mut(&mut self, identifier: &Address) -> Option<&mut LinkedAccount> {
        let name = self.identifiers.get(identifier)?;
        self.accounts.get_mut(name)
    }
}

/// In-memory ledger, safe to share between threads.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    tables: RwLock<Tables>,
}

impl MemoryLedger {
    /// Empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit a linked account or contract, as a bridge deposit would
    pub fn set_balance(&self, address: Address, balance: Word) {
        let mut tables = self.tables.write();
        if let Some(account) = tables.linked_mut(&address) {
            account.balance = balance;
        } else {
            tables.contracts.entry(address).or_default().balance = balance;
        }
    }

    /// Install code without running init code
    pub fn set_code(&self, address: Address, code: impl Into<Bytes>) {
        self.tables.write().contracts.entry(address).or_default().code = code.into();
    }

    /// Stored value of a contract slot
    pub fn storage(&self, address: &Address, key: &Word) -> Word {
        self.storage_by_key(&keel_crypto::storage_key(address, key))
    }

    /// Stored value under a composite key
    pub fn storage_by_key(&self, key: &H256) -> Word {
        self.tables
            .read()
            .storage
            .get(key)
            .copied()
            .unwrap_or_default()
    }

    /// Number of persisted storage slots
    pub fn storage_len(&self) -> usize {
        self.tables.read().storage.len()
    }

    /// Logs received so far
    pub fn logs(&self) -> Vec<Log> {
        self.tables.read().logs.clone()
    }

    /// Self-destructs received so far
    pub fn suicides(&self) -> Vec<Address> {
        self.tables.read().suicides.clone()
    }

    /// Number of linked accounts
    pub fn account_count(&self) -> usize {
        self.tables.read().accounts.len()
    }
}

impl External for MemoryLedger {
    fn code(&self, address: &Address) -> Bytes {
        self.tables
            .read()
            .contracts
            .get(address)
            .map(|contract| contract.code.clone())
            .unwrap_or_default()
    }

    fn balance(&self, address: &Address) -> Word {
        let tables = self.tables.read();
        match tables.linked(address) {
            Some(account) => account.balance,
            None => tables
                .contracts
                .get(address)
                .map(|contract| contract.balance)
                .unwrap_or_default(),
        }
    }

    fn storage_at(&self, key: &H256) -> Bytes {
        match self.tables.read().storage.get(key) {
            Some(value) => Bytes::copy_from_slice(&word::to_be_bytes(value)),
            None => Bytes::new(),
        }
    }

    fn nonce(&self, address: &Address) -> u64 {
        self.tables
            .read()
            .contracts
            .get(address)
            .map(|contract| contract.nonce)
            .unwrap_or_default()
    }

    fn log(&mut self, address: &Address, topics: &[H256], data: &[u8]) {
        self.tables.get_mut().logs.push(Log {
            address: *address,
            topics: topics.to_vec(),
            data: Bytes::copy_from_slice(data),
        });
    }

    fn suicide(&mut self, address: &Address) {
        let tables = self.tables.get_mut();
        tables.contracts.remove(address);
        tables.suicides.push(*address);
    }
}

impl HostLedger for MemoryLedger {
    fn account(&self, identifier: &Address) -> Option<LinkedAccount> {
        self.tables.read().linked(identifier).cloned()
    }

    fn account_by_name(&self, name: &str) -> Option<LinkedAccount> {
        self.tables.read().accounts.get(name).cloned()
    }

    fn insert_account(&mut self, account: LinkedAccount) {
        let tables = self.tables.get_mut();
        tables
            .identifiers
            .insert(account.identifier, account.name.clone());
        tables.accounts.insert(account.name.clone(), account);
    }

    fn set_account_nonce(&mut self, identifier: &Address, nonce: u64) {
        if let Some(account) = self.tables.get_mut().linked_mut(identifier) {
            account.nonce = nonce;
        }
    }

    fn put_storage(&mut self, key: H256, value: Word) {
        let storage = &mut self.tables.get_mut().storage;
        if value.is_zero() {
            storage.remove(&key);
        } else {
            storage.insert(key, value);
        }
    }

    fn put_code(&mut self, address: Address, code: Bytes) {
        self.tables.get_mut().contracts.entry(address).or_default().code = code;
    }

    fn put_balance(&mut self, address: Address, balance: Word) {
        MemoryLedger::set_balance(self, address, balance);
    }

    fn put_nonce(&mut self, address: Address, nonce: u64) {
        self.tables.get_mut().contracts.entry(address).or_default().nonce = nonce;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_crypto::storage_key;

    fn linked(name: &str, byte: u8) -> LinkedAccount {
        LinkedAccount {
            name: name.to_string(),
            identifier: Address::from_low_bytes(&[byte]),
            nonce: 0,
            balance: Word::zero(),
        }
    }

    #[test]
    fn test_linked_account_lookup() {
        let mut ledger = MemoryLedger::new();
        ledger.insert_account(linked("alice", 1));

        let account = ledger.account(&Address::from_low_bytes(&[1])).unwrap();
        assert_eq!(account.name, "alice");
        assert_eq!(ledger.account_by_name("alice"), Some(account));
        assert!(ledger.account(&Address::from_low_bytes(&[2])).is_none());
        assert_eq!(ledger.account_count(), 1);
    }

    #[test]
    fn test_balance_routes_to_linked_account() {
        let mut ledger = MemoryLedger::new();
        let alice = linked("alice", 1);
        let contract = Address::from_low_bytes(&[9]);
        ledger.insert_account(alice.clone());

        ledger.put_balance(alice.identifier, Word::from(50u64));
        ledger.put_balance(contract, Word::from(7u64));
        assert_eq!(ledger.account_by_name("alice").unwrap().balance, Word::from(50u64));
        assert_eq!(ledger.balance(&alice.identifier), Word::from(50u64));
        assert_eq!(ledger.balance(&contract), Word::from(7u64));
    }

    #[test]
    fn test_storage_roundtrip_through_external() {
        let mut ledger = MemoryLedger::new();
        let contract = Address::from_low_bytes(&[9]);
        let key = storage_key(&contract, &Word::one());
        ledger.put_storage(key, Word::from(0x2au64));

        let raw = ledger.storage_at(&key);
        assert_eq!(raw.len(), 32);
        assert_eq!(raw[31], 0x2a);
        assert_eq!(ledger.storage(&contract, &Word::one()), Word::from(0x2au64));

        // zero clears the slot
        ledger.put_storage(key, Word::zero());
        assert!(ledger.storage_at(&key).is_empty());
        assert_eq!(ledger.storage_len(), 0);
    }

    #[test]
    fn test_suicide_removes_contract() {
        let mut ledger = MemoryLedger::new();
        let contract = Address::from_low_bytes(&[9]);
        ledger.set_code(contract, vec![0x00]);
        ledger.put_nonce(contract, 3);
        assert_eq!(ledger.nonce(&contract), 3);

        ledger.suicide(&contract);
        assert!(ledger.code(&contract).is_empty());
        assert_eq!(ledger.nonce(&contract), 0);
        assert_eq!(ledger.suicides(), vec![contract]);
    }
}
