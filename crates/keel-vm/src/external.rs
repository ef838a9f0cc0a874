//! Host capability consumed by the interpreter

use bytes::Bytes;
use keel_primitives::{Address, Word, H256};

/// Read access to host state plus the two host notifications.
///
/// The interpreter only reads through this trait while running. `log` and
/// `suicide` are invoked by the host after a transaction commits, once per
/// entry of the resulting [`PendingState`](crate::PendingState).
pub trait External {
    /// Code deployed at `address`; empty for accounts without code
    fn code(&self, address: &Address) -> Bytes;

    /// Balance of `address`
    fn balance(&self, address: &Address) -> Word;

    /// Raw stored value under a composite storage key; empty if unset
    fn storage_at(&self, key: &H256) -> Bytes;

    /// Nonce of a contract account, used to derive CREATE addresses
    fn nonce(&self, _address: &Address) -> u64 {
        0
    }

    /// Receive a committed log entry
    fn log(&mut self, address: &Address, topics: &[H256], data: &[u8]);

    /// Receive a committed self-destruct
    fn suicide(&mut self, address: &Address);
}
