//! RLP transactions.
//!
//! The wire form is the flat 9-item list
//! `[nonce, gasPrice, gasLimit, to, value, data, v, r, s]`. An empty `to`
//! makes the transaction a contract creation.

use bytes::Bytes;
use keel_crypto::{keccak256, recover_signer, sign, PrivateKey, Signature};
use keel_primitives::{word, Address, Word, H256};
use keel_rlp::{decode, encode_list, RlpItem};

use crate::error::{TypeError, TypeResult};

const FIELD_COUNT: usize = 9;

/// What the transaction does
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Deploy the data payload as init code
    Create,
    /// Message call to an address
    Call(Address),
}

/// Raw signature components as they appear on the wire
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct TxSignature {
    /// Recovery value (27/28, or EIP-155 `chainId * 2 + 35/36`)
    pub v: Word,
    /// r component, minimal big-endian
    pub r: Bytes,
    /// s component, minimal big-endian
    pub s: Bytes,
}

impl TxSignature {
    /// Whether both r and s are present
    pub fn is_present(&self) -> bool {
        !self.r.is_empty() && !self.s.is_empty()
    }

    /// Chain id carried by an EIP-155 `v`
    pub fn chain_id(&self) -> Option<u64> {
        let v = word::to_u64(&self.v)?;
        if v >= 35 {
            Some((v - 35) / 2)
        } else {
            None
        }
    }

    /// The raw parity bit encoded in `v`
    pub fn recovery_id(&self) -> TypeResult<u8> {
        let v = word::to_u64(&self.v).ok_or(TypeError::FieldOverflow("v"))?;
        match v {
            0 | 1 => Ok(v as u8),
            27 | 28 => Ok((v - 27) as u8),
            v if v >= 35 => Ok(((v - 35) % 2) as u8),
            v => Err(TypeError::InvalidSignature(format!("unsupported v value {}", v))),
        }
    }

    fn to_signature(&self) -> TypeResult<Signature> {
        Ok(Signature::new(
            pad_component(&self.r, "r")?,
            pad_component(&self.s, "s")?,
            self.recovery_id()?,
        ))
    }
}

fn pad_component(bytes: &[u8], name: &str) -> TypeResult<H256> {
    if bytes.len() > H256::LEN {
        return Err(TypeError::InvalidSignature(format!(
            "{} is {} bytes",
            name,
            bytes.len()
        )));
    }
    let mut out = [0u8; 32];
    out[H256::LEN - bytes.len()..].copy_from_slice(bytes);
    Ok(H256::from_bytes(out))
}

fn strip_leading_zeros(bytes: &[u8]) -> Bytes {
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    Bytes::copy_from_slice(&bytes[skip..])
}

/// A parsed transaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    /// Create or call
    pub action: Action,
    /// Sender nonce
    pub nonce: Word,
    /// Gas price
    pub gas_price: Word,
    /// Gas limit
    pub gas_limit: Word,
    /// Value transferred
    pub value: Word,
    /// Call data, or init code for a creation
    pub data: Bytes,
    /// Signature (may be absent)
    pub signature: TxSignature,
}

impl Transaction {
    /// Decode the 9-item RLP list.
    pub fn parse(bytes: &[u8]) -> TypeResult<Self> {
        let item = decode(bytes)?;
        let fields = match &item {
            RlpItem::List(fields) => fields,
            RlpItem::String(_) => return Err(TypeError::NotAList),
        };
        if fields.len() != FIELD_COUNT {
            return Err(TypeError::InvalidFieldCount(fields.len()));
        }

        let to = fields[3].as_bytes()?;
        let action = match to.len() {
            0 => Action::Create,
            Address::LEN => Action::Call(Address::from_low_bytes(to)),
            n => return Err(TypeError::InvalidRecipient(n)),
        };

        Ok(Transaction {
            action,
            nonce: fields[0].as_word()?,
            gas_price: fields[1].as_word()?,
            gas_limit: fields[2].as_word()?,
            value: fields[4].as_word()?,
            data: fields[5].as_bytes()?.clone(),
            signature: TxSignature {
                v: fields[6].as_word()?,
                r: fields[7].as_bytes()?.clone(),
                s: fields[8].as_bytes()?.clone(),
            },
        })
    }

    /// Encode back to the 9-item wire form.
    pub fn encode(&self) -> Bytes {
        let mut items = self.payload_items();
        items.push(RlpItem::word(&self.signature.v));
        items.push(RlpItem::from(self.signature.r.clone()));
        items.push(RlpItem::from(self.signature.s.clone()));
        encode_list(&items)
    }

    /// keccak256 of the wire encoding
    pub fn hash(&self) -> H256 {
        keccak256(&self.encode())
    }

    /// Recipient, or `None` for a creation
    pub fn to(&self) -> Option<Address> {
        match self.action {
            Action::Create => None,
            Action::Call(to) => Some(to),
        }
    }

    /// Whether this deploys a contract
    pub fn is_create(&self) -> bool {
        self.action == Action::Create
    }

    /// Whether r and s are both present
    pub fn has_signature(&self) -> bool {
        self.signature.is_present()
    }

    /// Gas limit narrowed to `u64`
    pub fn gas_limit_u64(&self) -> TypeResult<u64> {
        word::to_u64(&self.gas_limit).ok_or(TypeError::FieldOverflow("gas_limit"))
    }

    /// Nonce narrowed to `u64`
    pub fn nonce_u64(&self) -> TypeResult<u64> {
        word::to_u64(&self.nonce).ok_or(TypeError::FieldOverflow("nonce"))
    }

    /// The hash that was signed.
    ///
    /// Pre-EIP-155 it covers the six payload fields; when `v` carries a
    /// chain id, `[chainId, 0, 0]` is appended.
    pub fn signing_hash(&self) -> H256 {
        self.signing_hash_for(self.signature.chain_id())
    }

    fn signing_hash_for(&self, chain_id: Option<u64>) -> H256 {
        let mut items = self.payload_items();
        if let Some(chain_id) = chain_id {
            items.push(RlpItem::uint(chain_id));
            items.push(RlpItem::empty());
            items.push(RlpItem::empty());
        }
        keccak256(&encode_list(&items))
    }

    /// Sign with `key`, replacing any existing signature.
    pub fn sign(mut self, key: &PrivateKey, chain_id: Option<u64>) -> TypeResult<Self> {
        let signature = sign(&self.signing_hash_for(chain_id), key)?;
        let base = match chain_id {
            Some(id) => 35 + 2 * id,
            None => 27,
        };
        self.signature = TxSignature {
            v: Word::from(base + signature.recovery_id as u64),
            r: strip_leading_zeros(signature.r.as_bytes()),
            s: strip_leading_zeros(signature.s.as_bytes()),
        };
        Ok(self)
    }

    /// Recover the signing address.
    pub fn recover_sender(&self) -> TypeResult<Address> {
        if !self.has_signature() {
            return Err(TypeError::InvalidSignature("transaction is unsigned".into()));
        }
        let signature = self.signature.to_signature()?;
        Ok(recover_signer(&self.signing_hash(), &signature)?)
    }

    fn payload_items(&self) -> Vec<RlpItem> {
        let to = match &self.action {
            Action::Create => RlpItem::empty(),
            Action::Call(address) => RlpItem::from(address),
        };
        vec![
            RlpItem::word(&self.nonce),
            RlpItem::word(&self.gas_price),
            RlpItem::word(&self.gas_limit),
            to,
            RlpItem::word(&self.value),
            RlpItem::from(self.data.clone()),
        ]
    }
}
