//! Deterministic address derivation.
//!
//! Three schemes place a new contract:
//! - `Sender`: the host already supplied a concrete address, use it as is
//! - `Legacy`: `keccak256(rlp([sender, nonce]))[12..]`
//! - `Eip1014`: `keccak256(0xff ++ sender ++ salt ++ keccak256(init_code))[12..]`

use keel_crypto::{keccak256, keccak256_concat};
use keel_primitives::{word, Address, Word};
use keel_rlp::{encode_list, RlpItem};

/// How a contract creation picks its address
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressScheme {
    /// The creating sender's own address
    Sender,
    /// Sender and nonce (CREATE)
    Legacy,
    /// Sender, salt and init-code hash (CREATE2)
    Eip1014,
}

/// `keccak256(rlp([sender, nonce]))`, low 20 bytes.
pub fn legacy_contract_address(sender: &Address, nonce: &Word) -> Address {
    let preimage = encode_list(&[RlpItem::from(sender), RlpItem::word(nonce)]);
    Address::from_low_bytes(keccak256(&preimage).as_bytes())
}

/// `keccak256(0xff ++ sender ++ salt ++ keccak256(init_code))`, low 20 bytes.
pub fn create2_address(sender: &Address, salt: &Word, init_code: &[u8]) -> Address {
    let code_hash = keccak256(init_code);
    let salt = word::to_be_bytes(salt);
    let hash = keccak256_concat(&[
        &[0xffu8][..],
        &sender.as_bytes()[..],
        &salt[..],
        &code_hash.as_bytes()[..],
    ]);
    Address::from_low_bytes(hash.as_bytes())
}

/// Address for a new contract under `scheme`.
///
/// `nonce_or_salt` is the sender nonce for `Legacy` and the salt for
/// `Eip1014`; `Sender` ignores it.
pub fn contract_address(
    scheme: AddressScheme,
    sender: &Address,
    nonce_or_salt: &Word,
    init_code: &[u8],
) -> Address {
    match scheme {
        AddressScheme::Sender => *sender,
        AddressScheme::Legacy => legacy_contract_address(sender, nonce_or_salt),
        AddressScheme::Eip1014 => create2_address(sender, nonce_or_salt, init_code),
    }
}

/// Opaque identifier linking a host account name to an Ethereum address:
/// `keccak256(rlp([name, address]))`, low 20 bytes.
pub fn account_identifier(account_name: &str, address: &Address) -> Address {
    let preimage = encode_list(&[
        RlpItem::bytes(account_name.as_bytes()),
        RlpItem::from(address),
    ]);
    Address::from_low_bytes(keccak256(&preimage).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        Address::from_hex(s).unwrap()
    }

    #[test]
    fn test_legacy_addresses() {
        let sender = addr("0x6ac7ea33f8831ea9dcc53393aaa88b25a785dbf0");
        assert_eq!(
            legacy_contract_address(&sender, &Word::zero()),
            addr("0xcd234a471b72ba2f1ccf0a70fcaba648a5eecd8d")
        );
        assert_eq!(
            legacy_contract_address(&sender, &Word::one()),
            addr("0x343c43a37d37dff08ae8c4a11544c718abb4fcf8")
        );
    }

    #[test]
    fn test_create2_addresses() {
        assert_eq!(
            create2_address(&Address::ZERO, &Word::zero(), &[0x00]),
            addr("0x4d1a2e2bb4f88f0250f26ffff098b0b30b26bf38")
        );
        assert_eq!(
            create2_address(
                &addr("0xdeadbeef00000000000000000000000000000000"),
                &Word::zero(),
                &[0x00]
            ),
            addr("0xb928f69bb1d91cd65274e3c79d8986362984fda3")
        );
    }

    #[test]
    fn test_scheme_dispatch() {
        let sender = addr("0x6ac7ea33f8831ea9dcc53393aaa88b25a785dbf0");
        let code = [0x60, 0x00];
        assert_eq!(
            contract_address(AddressScheme::Sender, &sender, &Word::from(9u64), &code),
            sender
        );
        assert_eq!(
            contract_address(AddressScheme::Legacy, &sender, &Word::one(), &code),
            legacy_contract_address(&sender, &Word::one())
        );
        assert_eq!(
            contract_address(AddressScheme::Eip1014, &sender, &Word::one(), &code),
            create2_address(&sender, &Word::one(), &code)
        );
    }

    #[test]
    fn test_account_identifier_preimage() {
        let address = addr("0x742d35cc6634c0532925a3b844bc9e7595f0ab3d");
        let id = account_identifier("alice", &address);

        // 27-byte list: 0x85 "alice" 0x94 <20 bytes>
        let mut preimage = vec![0xdb, 0x85];
        preimage.extend_from_slice(b"alice");
        preimage.push(0x94);
        preimage.extend_from_slice(address.as_bytes());
        assert_eq!(id, Address::from_low_bytes(keccak256(&preimage).as_bytes()));

        assert_ne!(id, account_identifier("bob", &address));
    }
}
