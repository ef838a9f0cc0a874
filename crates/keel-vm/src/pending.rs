//! Committed effects of a transaction, awaiting the host

use std::collections::{BTreeMap, BTreeSet};

use bytes::Bytes;
use keel_primitives::{Address, Word, H256};

/// A log entry emitted by LOG0..LOG4
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Log {
    /// Contract that emitted the log
    pub address: Address,
    /// Topics, at most four
    pub topics: Vec<H256>,
    /// Log data
    pub data: Bytes,
}

/// Effects of a frame and its committed descendants.
///
/// Storage, balances, codes and nonces are keyed maps, so a later write to the
/// same key replaces the earlier one. Logs keep emission order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PendingState {
    /// Storage writes keyed by `(contract, slot)`
    pub storage: BTreeMap<(Address, Word), Word>,
    /// Final balances of accounts touched by value transfers
    pub balances: BTreeMap<Address, Word>,
    /// Code deployed by successful creations
    pub codes: BTreeMap<Address, Bytes>,
    /// Contract nonces bumped by CREATE
    pub nonces: BTreeMap<Address, u64>,
    /// Logs in emission order
    pub logs: Vec<Log>,
    /// Accounts that executed SELFDESTRUCT
    pub suicides: BTreeSet<Address>,
    /// Accumulated gas refund
    pub refund: u64,
}

impl PendingState {
    /// Create an empty change set
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a storage write, replacing any earlier write to the slot
    pub fn put_storage(&mut self, address: Address, key: Word, value: Word) {
        self.storage.insert((address, key), value);
    }

    /// Buffered value of a storage slot
    pub fn get_storage(&self, address: &Address, key: &Word) -> Option<&Word> {
        self.storage.get(&(*address, *key))
    }

    /// Append a log
    pub fn push_log(&mut self, log: Log) {
        self.logs.push(log);
    }

    /// Fold a committed child change set into this one.
    ///
    /// Child writes win over ours; child logs follow ours.
    pub fn merge(&mut self, child: PendingState) {
        self.storage.extend(child.storage);
        self.balances.extend(child.balances);
        self.codes.extend(child.codes);
        self.nonces.extend(child.nonces);
        self.logs.extend(child.logs);
        self.suicides.extend(child.suicides);
        self.refund = self.refund.saturating_add(child.refund);
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
            && self.balances.is_empty()
            && self.codes.is_empty()
            && self.nonces.is_empty()
            && self.logs.is_empty()
            && self.suicides.is_empty()
            && self.refund == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::from_low_bytes(&[b])
    }

    #[test]
    fn test_last_write_wins() {
        let mut pending = PendingState::new();
        pending.put_storage(addr(1), Word::zero(), Word::from(1u64));
        pending.put_storage(addr(1), Word::zero(), Word::from(2u64));
        pending.put_storage(addr(2), Word::zero(), Word::from(3u64));
        assert_eq!(pending.storage.len(), 2);
        assert_eq!(
            pending.get_storage(&addr(1), &Word::zero()),
            Some(&Word::from(2u64))
        );
    }

    #[test]
    fn test_merge_child() {
        let mut parent = PendingState::new();
        parent.put_storage(addr(1), Word::one(), Word::from(10u64));
        parent.push_log(Log {
            address: addr(1),
            ..Log::default()
        });
        parent.refund = 100;

        let mut child = PendingState::new();
        child.put_storage(addr(1), Word::one(), Word::from(20u64));
        child.balances.insert(addr(2), Word::from(5u64));
        child.push_log(Log {
            address: addr(2),
            ..Log::default()
        });
        child.suicides.insert(addr(2));
        child.refund = 24000;

        parent.merge(child);
        assert_eq!(
            parent.get_storage(&addr(1), &Word::one()),
            Some(&Word::from(20u64))
        );
        assert_eq!(parent.logs.len(), 2);
        assert_eq!(parent.logs[0].address, addr(1));
        assert_eq!(parent.logs[1].address, addr(2));
        assert_eq!(parent.balances[&addr(2)], Word::from(5u64));
        assert!(parent.suicides.contains(&addr(2)));
        assert_eq!(parent.refund, 24100);
    }

    #[test]
    fn test_is_empty() {
        let mut pending = PendingState::new();
        assert!(pending.is_empty());
        pending.refund = 1;
        assert!(!pending.is_empty());
    }
}
