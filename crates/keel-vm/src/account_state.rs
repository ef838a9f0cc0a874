//! Read-through account overlay, one scope per frame

use bytes::Bytes;
use keel_crypto::storage_key;
use keel_primitives::{word, Address, Word, H256};

use crate::error::TrapKind;
use crate::external::External;
use crate::pending::{Log, PendingState};

/// Account and storage view of the running frame.
///
/// Every open frame owns one scope. Reads fall through the innermost scope's
/// writes, then every enclosing scope, then the host. A scope closed with
/// [`AccountState::exit_commit`] folds its writes into the enclosing one; a
/// scope closed with [`AccountState::exit_discard`] leaves no trace.
pub struct AccountState<'a> {
    external: &'a dyn External,
    // never empty; index 0 is the root scope
    scopes: Vec<PendingState>,
}

impl<'a> AccountState<'a> {
    /// Root scope over the host
    pub fn new(external: &'a dyn External) -> Self {
        Self {
            external,
            scopes: vec![PendingState::new()],
        }
    }

    /// Open a nested scope for a frame
    pub fn enter_scope(&mut self) {
        self.scopes.push(PendingState::new());
    }

    /// Close the innermost scope, folding its writes into the enclosing one
    pub fn exit_commit(&mut self) {
        if self.scopes.len() > 1 {
            if let Some(scope) = self.scopes.pop() {
                self.top_mut().merge(scope);
            }
        }
    }

    /// Close the innermost scope, dropping its writes
    pub fn exit_discard(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        } else {
            self.scopes[0] = PendingState::new();
        }
    }

    /// Number of nested scopes above the root
    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    /// Host backing the whole chain
    pub fn external(&self) -> &dyn External {
        self.external
    }

    fn top_mut(&mut self) -> &mut PendingState {
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    fn lookup<T>(&self, find: impl Fn(&PendingState) -> Option<T>) -> Option<T> {
        self.scopes.iter().rev().find_map(find)
    }

    /// Value of a storage slot
    pub fn storage(&self, address: &Address, key: &Word) -> Word {
        self.lookup(|pending| pending.get_storage(address, key).copied())
            .unwrap_or_else(|| {
                let raw = self.external.storage_at(&storage_key(address, key));
                word::from_be_slice_truncating(&raw)
            })
    }

    /// Buffer a storage write
    pub fn set_storage(&mut self, address: Address, key: Word, value: Word) {
        self.top_mut().put_storage(address, key, value);
    }

    /// Balance of `address`
    pub fn balance(&self, address: &Address) -> Word {
        self.lookup(|pending| pending.balances.get(address).copied())
            .unwrap_or_else(|| self.external.balance(address))
    }

    /// Buffer a balance
    pub fn set_balance(&mut self, address: Address, balance: Word) {
        self.top_mut().balances.insert(address, balance);
    }

    /// Move `value` from `from` to `to`.
    ///
    /// Fails with [`TrapKind::InsufficientFunds`] when `from` cannot cover it
    /// and with [`TrapKind::Overflow`] when the credit does not fit 256 bits.
    /// Nothing is written on failure.
    pub fn transfer(&mut self, from: &Address, to: &Address, value: &Word) -> Result<(), TrapKind> {
        let from_balance = self.balance(from);
        if from_balance < *value {
            return Err(TrapKind::InsufficientFunds);
        }
        if from == to || value.is_zero() {
            return Ok(());
        }
        let to_balance = self
            .balance(to)
            .checked_add(*value)
            .ok_or(TrapKind::Overflow)?;
        self.set_balance(*from, from_balance - *value);
        self.set_balance(*to, to_balance);
        Ok(())
    }

    /// Code at `address`
    pub fn code(&self, address: &Address) -> Bytes {
        self.lookup(|pending| pending.codes.get(address).cloned())
            .unwrap_or_else(|| self.external.code(address))
    }

    /// Deploy code at `address`
    pub fn set_code(&mut self, address: Address, code: Bytes) {
        self.top_mut().codes.insert(address, code);
    }

    /// Nonce of `address`
    pub fn nonce(&self, address: &Address) -> u64 {
        self.lookup(|pending| pending.nonces.get(address).copied())
            .unwrap_or_else(|| self.external.nonce(address))
    }

    /// Bump the nonce of `address`, returning the value before the bump
    pub fn increment_nonce(&mut self, address: &Address) -> u64 {
        let nonce = self.nonce(address);
        self.top_mut().nonces.insert(*address, nonce.saturating_add(1));
        nonce
    }

    /// Whether `address` already self-destructed in this transaction
    pub fn has_suicided(&self, address: &Address) -> bool {
        self.lookup(|pending| pending.suicides.contains(address).then_some(()))
            .is_some()
    }

    /// Record a self-destruct
    pub fn suicide(&mut self, address: Address) {
        self.top_mut().suicides.insert(address);
    }

    /// Record a log entry
    pub fn add_log(&mut self, address: Address, topics: Vec<H256>, data: Bytes) {
        self.top_mut().push_log(Log {
            address,
            topics,
            data,
        });
    }

    /// Add to the refund counter
    pub fn add_refund(&mut self, amount: u64) {
        let pending = self.top_mut();
        pending.refund = pending.refund.saturating_add(amount);
    }

    /// Writes buffered in the innermost scope
    pub fn pending(&self) -> &PendingState {
        &self.scopes[self.scopes.len() - 1]
    }

    /// Fold every open scope down and release the result
    pub fn into_pending(mut self) -> PendingState {
        while self.scopes.len() > 1 {
            self.exit_commit();
        }
        self.scopes.pop().unwrap_or_default()
    }
}
