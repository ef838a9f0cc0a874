//! Transaction executor

use bytes::Bytes;
use keel_crypto::storage_key;
use keel_primitives::{Address, H256};
use keel_types::{account_identifier, legacy_contract_address, Action, Transaction};
use keel_vm::{Env, ExecResult, Log, Params, PendingState, Vm};
use tracing::{debug, info, warn};

use crate::config::ExecutorConfig;
use crate::error::{HostError, HostResult};
use crate::ledger::{HostLedger, LinkedAccount};
use crate::signer::{EcdsaRecovery, SignerResolver};

/// Result of an accepted transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallOutcome {
    /// Hash of the raw transaction
    pub tx_hash: H256,
    /// Account identifier the transaction ran as
    pub sender: Address,
    /// Address of the deployed contract, for creations
    pub contract_address: Option<Address>,
    /// RETURN data of the top frame; deployed code for creations
    pub output: Bytes,
    /// Gas charged after the refund
    pub gas_used: u64,
    /// Gas refunded from SSTORE clears and self-destructs
    pub gas_refunded: u64,
    /// Logs forwarded to the ledger, in emission order
    pub logs: Vec<Log>,
}

/// Validates raw transactions against a ledger, runs them, and commits the
/// effects of the ones that succeed.
pub struct Executor<L, R = EcdsaRecovery> {
    config: ExecutorConfig,
    env: Env,
    ledger: L,
    resolver: R,
}

impl<L: HostLedger> Executor<L> {
    /// Executor recovering signers with secp256k1
    pub fn new(config: ExecutorConfig, ledger: L) -> Self {
        let env = config.env();
        Self {
            config,
            env,
            ledger,
            resolver: EcdsaRecovery,
        }
    }
}

impl<L: HostLedger, R: SignerResolver> Executor<L, R> {
    /// Replace the signer resolver
    pub fn with_resolver<S: SignerResolver>(self, resolver: S) -> Executor<L, S> {
        Executor {
            config: self.config,
            env: self.env,
            ledger: self.ledger,
            resolver,
        }
    }

    /// Configuration
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Backing ledger
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Backing ledger, mutably
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    /// Take back the ledger
    pub fn into_ledger(self) -> L {
        self.ledger
    }

    /// Link ledger account `name` to an EVM account identifier derived from
    /// `address`. Nonce and balance start at zero.
    pub fn create_account(&mut self, name: &str, address: &Address) -> HostResult<Address> {
        if self.ledger.account_by_name(name).is_some() {
            return Err(HostError::AccountExists);
        }
        let identifier = account_identifier(name, address);
        self.ledger.insert_account(LinkedAccount {
            name: name.to_string(),
            identifier,
            nonce: 0,
            balance: Default::default(),
        });
        info!(name, identifier = %identifier, "account linked");
        Ok(identifier)
    }

    /// Validate, execute and commit a raw RLP transaction.
    ///
    /// A signed transaction runs as its recovered signer. An unsigned one runs
    /// as `claimed_sender`, and only when `caller` is the ledger account linked
    /// to it. Any failure leaves the ledger untouched.
    pub fn submit(
        &mut self,
        raw_tx: &[u8],
        claimed_sender: Option<&Address>,
        caller: Option<&str>,
    ) -> HostResult<CallOutcome> {
        self.process(raw_tx, claimed_sender, caller, None)
    }

    /// Run `code` in place of the recipient's code, with the transaction's
    /// sender, value and data. Disabled unless
    /// [`ExecutorConfig::allow_raw_code`] is set.
    pub fn execute_code(
        &mut self,
        code: &[u8],
        raw_tx: &[u8],
        claimed_sender: Option<&Address>,
        caller: Option<&str>,
    ) -> HostResult<CallOutcome> {
        if !self.config.allow_raw_code {
            return Err(HostError::RawCodeDisabled);
        }
        self.process(raw_tx, claimed_sender, caller, Some(Bytes::copy_from_slice(code)))
    }

    fn process(
        &mut self,
        raw_tx: &[u8],
        claimed_sender: Option<&Address>,
        caller: Option<&str>,
        code: Option<Bytes>,
    ) -> HostResult<CallOutcome> {
        let result = self.run(raw_tx, claimed_sender, caller, code);
        if let Err(e) = &result {
            warn!(error = %e, "transaction rejected");
        }
        result
    }

    fn run(
        &mut self,
        raw_tx: &[u8],
        claimed_sender: Option<&Address>,
        caller: Option<&str>,
        code: Option<Bytes>,
    ) -> HostResult<CallOutcome> {
        let tx = Transaction::parse(raw_tx)?;
        let tx_hash = tx.hash();
        let nonce = tx.nonce_u64()?;
        let account = self.authenticate(&tx, nonce, claimed_sender, caller)?;
        let sender = account.identifier;

        let gas_limit = tx.gas_limit_u64()?;
        if gas_limit > self.config.block_gas_limit {
            return Err(HostError::BlockGasLimitExceeded {
                used: gas_limit,
                limit: self.config.block_gas_limit,
            });
        }
        let intrinsic = self
            .config
            .schedule
            .intrinsic_gas(&tx.data, tx.is_create());
        if gas_limit < intrinsic {
            return Err(HostError::InsufficientGas {
                required: intrinsic,
                available: gas_limit,
            });
        }
        let gas = gas_limit - intrinsic;

        let (params, contract_address) = match tx.action {
            Action::Call(to) => {
                let code = code.unwrap_or_else(|| self.ledger.code(&to));
                let params = Params::new(to, sender, gas, code, tx.data.clone());
                (params, None)
            }
            Action::Create => {
                let address = legacy_contract_address(&sender, &tx.nonce);
                let init = code.unwrap_or_else(|| tx.data.clone());
                let params = Params::new(address, sender, gas, init, Bytes::new()).as_create();
                (params, Some(address))
            }
        };
        let params = params
            .with_value(tx.value)
            .with_gas_price(tx.gas_price);

        debug!(tx_hash = %tx_hash, sender = %sender, gas, "executing transaction");
        let outcome = {
            let mut vm = Vm::new(&self.config.schedule, &self.env)
                .with_max_depth(self.config.max_call_depth);
            vm.execute(params, &self.ledger)?
        };

        let gas_left = outcome.result.gas_left();
        let output = match outcome.result {
            ExecResult::Stopped { .. } => Bytes::new(),
            ExecResult::Done { data, .. } => data,
            ExecResult::Reverted { data, .. } => {
                return Err(HostError::Reverted {
                    tx_hash,
                    output: data,
                })
            }
            ExecResult::OutOfGas => return Err(HostError::OutOfGas { tx_hash }),
            ExecResult::Trap(kind) => return Err(HostError::Trap { tx_hash, kind }),
        };

        let gas_used = gas_limit - gas_left;
        let gas_refunded = outcome.pending.refund.min(gas_used / 2);
        let gas_used = gas_used - gas_refunded;

        self.commit(&outcome.pending);
        self.ledger.set_account_nonce(&sender, nonce);
        info!(
            tx_hash = %tx_hash,
            sender = %sender,
            gas_used,
            logs = outcome.pending.logs.len(),
            "transaction committed"
        );

        Ok(CallOutcome {
            tx_hash,
            sender,
            contract_address,
            output,
            gas_used,
            gas_refunded,
            logs: outcome.pending.logs,
        })
    }

    /// Resolve the linked account a transaction runs as, and check its nonce.
    fn authenticate(
        &self,
        tx: &Transaction,
        nonce: u64,
        claimed_sender: Option<&Address>,
        caller: Option<&str>,
    ) -> HostResult<LinkedAccount> {
        let signed = tx.has_signature();
        let account = if signed {
            if let Some(chain_id) = tx.signature.chain_id() {
                if chain_id != self.config.chain_id {
                    return Err(HostError::ChainIdMismatch {
                        expected: self.config.chain_id,
                        got: chain_id,
                    });
                }
            }
            let signer = self.resolver.resolve(tx)?;
            self.ledger
                .account(&signer)
                .ok_or(HostError::UnknownSigner)?
        } else {
            claimed_sender
                .and_then(|sender| self.ledger.account(sender))
                .ok_or(HostError::UnknownSender)?
        };

        if account.nonce.checked_add(1) != Some(nonce) {
            return Err(HostError::InvalidNonce {
                stored: account.nonce,
                got: nonce,
            });
        }
        if !signed && caller != Some(account.name.as_str()) {
            return Err(HostError::Unauthorized);
        }
        Ok(account)
    }

    fn commit(&mut self, pending: &PendingState) {
        for ((address, key), value) in &pending.storage {
            self.ledger.put_storage(storage_key(address, key), *value);
        }
        for (address, balance) in &pending.balances {
            self.ledger.put_balance(*address, *balance);
        }
        for (address, code) in &pending.codes {
            self.ledger.put_code(*address, code.clone());
        }
        for (address, nonce) in &pending.nonces {
            self.ledger.put_nonce(*address, *nonce);
        }
        for log in &pending.logs {
            self.ledger.log(&log.address, &log.topics, &log.data);
        }
        for address in &pending.suicides {
            debug!(address = %address, "self-destruct committed");
            self.ledger.suicide(address);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedger;
    use k256::ecdsa::SigningKey;
    use keel_crypto::{keccak256, public_key_to_address};
    use keel_primitives::Word;
    use keel_types::TxSignature;
    use keel_vm::{External, TrapKind};
    use rand::rngs::OsRng;

    const ALICE: &str = "alice";

    fn contract() -> Address {
        Address::from_low_bytes(&[0xc0, 0x47, 0x2a])
    }

    fn setup(config: ExecutorConfig) -> (Executor<MemoryLedger>, Address) {
        let mut executor = Executor::new(config, MemoryLedger::new());
        let identifier = executor
            .create_account(ALICE, &Address::from_low_bytes(&[0xaa]))
            .unwrap();
        (executor, identifier)
    }

    fn tx(nonce: u64, action: Action, gas_limit: u64) -> Transaction {
        Transaction {
            action,
            nonce: Word::from(nonce),
            gas_price: Word::zero(),
            gas_limit: Word::from(gas_limit),
            value: Word::zero(),
            data: Bytes::new(),
            signature: TxSignature::default(),
        }
    }

    fn raw_call(nonce: u64, to: Address) -> Vec<u8> {
        tx(nonce, Action::Call(to), 121_000).encode().to_vec()
    }

    fn deploy(executor: &Executor<MemoryLedger>, code: &str) {
        executor
            .ledger()
            .set_code(contract(), hex::decode(code).unwrap());
    }

    #[test]
    fn test_create_account() {
        let (mut executor, identifier) = setup(ExecutorConfig::default());
        assert_eq!(
            identifier,
            account_identifier(ALICE, &Address::from_low_bytes(&[0xaa]))
        );
        let account = executor.ledger().account(&identifier).unwrap();
        assert_eq!(account.nonce, 0);
        assert!(account.balance.is_zero());

        let err = executor
            .create_account(ALICE, &Address::from_low_bytes(&[0xbb]))
            .unwrap_err();
        assert!(matches!(err, HostError::AccountExists));
        assert_eq!(executor.ledger().account_count(), 1);
    }

    #[test]
    fn test_nonce_must_advance_by_one() {
        let (mut executor, alice) = setup(ExecutorConfig::default());
        deploy(&executor, "00");

        executor
            .submit(&raw_call(1, contract()), Some(&alice), Some(ALICE))
            .unwrap();
        assert_eq!(executor.ledger().account(&alice).unwrap().nonce, 1);

        for nonce in [1, 3, 0] {
            let err = executor
                .submit(&raw_call(nonce, contract()), Some(&alice), Some(ALICE))
                .unwrap_err();
            assert!(matches!(err, HostError::InvalidNonce { stored: 1, got } if got == nonce));
            assert_eq!(err.to_string(), "Transaction nonce invalid.");
        }

        executor
            .submit(&raw_call(2, contract()), Some(&alice), Some(ALICE))
            .unwrap();
        assert_eq!(executor.ledger().account(&alice).unwrap().nonce, 2);
    }

    #[test]
    fn test_unknown_sender() {
        let (mut executor, _) = setup(ExecutorConfig::default());
        let raw = raw_call(1, contract());

        let err = executor.submit(&raw, None, Some(ALICE)).unwrap_err();
        assert!(matches!(err, HostError::UnknownSender));

        let stranger = Address::from_low_bytes(&[0x99]);
        let err = executor.submit(&raw, Some(&stranger), Some(ALICE)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Could not find sender, did you provide the correct account identifier?"
        );
    }

    #[test]
    fn test_unsigned_requires_owner() {
        let (mut executor, alice) = setup(ExecutorConfig::default());
        let raw = raw_call(1, contract());

        for caller in [None, Some("bob")] {
            let err = executor.submit(&raw, Some(&alice), caller).unwrap_err();
            assert!(matches!(err, HostError::Unauthorized));
        }
        assert_eq!(executor.ledger().account(&alice).unwrap().nonce, 0);
    }

    #[test]
    fn test_signed_transaction_runs_as_signer() {
        let (mut executor, _) = setup(ExecutorConfig::default());
        deploy(&executor, "33600055");

        let key = SigningKey::random(&mut OsRng);
        let signer = public_key_to_address(key.verifying_key());
        executor.ledger_mut().insert_account(LinkedAccount {
            name: "carol".to_string(),
            identifier: signer,
            nonce: 0,
            balance: Word::zero(),
        });

        let raw = tx(1, Action::Call(contract()), 121_000)
            .sign(&key, Some(1))
            .unwrap()
            .encode();
        // claimed sender and caller are ignored for signed transactions
        let outcome = executor.submit(&raw, None, None).unwrap();
        assert_eq!(outcome.sender, signer);
        assert_eq!(
            executor.ledger().storage(&contract(), &Word::zero()),
            signer.to_word()
        );
        assert_eq!(executor.ledger().account(&signer).unwrap().nonce, 1);
    }

    #[test]
    fn test_signed_by_unknown_key() {
        let (mut executor, _) = setup(ExecutorConfig::default());
        let key = SigningKey::random(&mut OsRng);
        let raw = tx(1, Action::Call(contract()), 121_000)
            .sign(&key, None)
            .unwrap()
            .encode();
        let err = executor.submit(&raw, None, None).unwrap_err();
        assert!(matches!(err, HostError::UnknownSigner));
    }

    #[test]
    fn test_chain_id_mismatch() {
        let (mut executor, _) = setup(ExecutorConfig::default());
        let key = SigningKey::random(&mut OsRng);
        let raw = tx(1, Action::Call(contract()), 121_000)
            .sign(&key, Some(5))
            .unwrap()
            .encode();
        let err = executor.submit(&raw, None, None).unwrap_err();
        assert!(matches!(
            err,
            HostError::ChainIdMismatch {
                expected: 1,
                got: 5
            }
        ));
    }

    #[test]
    fn test_storage_committed_under_composite_key() {
        let (mut executor, alice) = setup(ExecutorConfig::default());
        deploy(&executor, "6000600020600055");

        let outcome = executor
            .submit(&raw_call(1, contract()), Some(&alice), Some(ALICE))
            .unwrap();
        assert_eq!(outcome.gas_used, 21_000 + 20_039);
        assert_eq!(outcome.gas_refunded, 0);

        let expected = Word::from(keccak256(&[]));
        let key = storage_key(&contract(), &Word::zero());
        assert_eq!(executor.ledger().storage_by_key(&key), expected);
        assert_eq!(executor.ledger().storage_len(), 1);
    }

    #[test]
    fn test_logs_forwarded() {
        let (mut executor, alice) = setup(ExecutorConfig::default());
        deploy(&executor, "60ff6000533360206000a1");

        let outcome = executor
            .submit(&raw_call(1, contract()), Some(&alice), Some(ALICE))
            .unwrap();
        let logs = executor.ledger().logs();
        assert_eq!(logs, outcome.logs);
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].address, contract());
        assert_eq!(logs[0].topics, vec![H256::from(alice.to_word())]);
        assert_eq!(logs[0].data.len(), 32);
        assert_eq!(logs[0].data[0], 0xff);
    }

    #[test]
    fn test_revert_commits_nothing() {
        let (mut executor, alice) = setup(ExecutorConfig::default());
        // SSTORE then REVERT
        deploy(&executor, "600160005560006000fd");

        let err = executor
            .submit(&raw_call(1, contract()), Some(&alice), Some(ALICE))
            .unwrap_err();
        assert!(matches!(err, HostError::Reverted { ref output, .. } if output.is_empty()));
        assert_eq!(err.to_string(), "MESSAGE_CALL_REVERTED");
        assert_eq!(executor.ledger().storage_len(), 0);
        assert_eq!(executor.ledger().account(&alice).unwrap().nonce, 0);
    }

    #[test]
    fn test_trap_and_out_of_gas() {
        let (mut executor, alice) = setup(ExecutorConfig::default());
        deploy(&executor, "600356");
        let err = executor
            .submit(&raw_call(1, contract()), Some(&alice), Some(ALICE))
            .unwrap_err();
        assert!(matches!(
            err,
            HostError::Trap {
                kind: TrapKind::InvalidJump,
                ..
            }
        ));
        assert_eq!(err.to_string(), "INVALID_JUMP");

        deploy(&executor, "6000600020600055");
        let raw = tx(1, Action::Call(contract()), 21_010).encode();
        let err = executor.submit(&raw, Some(&alice), Some(ALICE)).unwrap_err();
        assert_eq!(err.to_string(), "MESSAGE_CALL_OUT_OF_GAS");
        assert_eq!(executor.ledger().account(&alice).unwrap().nonce, 0);
    }

    #[test]
    fn test_gas_limit_bounds() {
        let (mut executor, alice) = setup(ExecutorConfig::default());
        let raw = tx(1, Action::Call(contract()), 20_000).encode();
        let err = executor.submit(&raw, Some(&alice), Some(ALICE)).unwrap_err();
        assert!(matches!(
            err,
            HostError::InsufficientGas {
                required: 21_000,
                available: 20_000
            }
        ));

        let raw = tx(1, Action::Call(contract()), 20_000_000).encode();
        let err = executor.submit(&raw, Some(&alice), Some(ALICE)).unwrap_err();
        assert!(matches!(err, HostError::BlockGasLimitExceeded { .. }));
    }

    #[test]
    fn test_value_transfer() {
        let (mut executor, alice) = setup(ExecutorConfig::default());
        executor.ledger().set_balance(alice, Word::from(100u64));
        let bob = Address::from_low_bytes(&[0xb0]);

        let mut transfer = tx(1, Action::Call(bob), 21_000);
        transfer.value = Word::from(30u64);
        let outcome = executor
            .submit(&transfer.encode(), Some(&alice), Some(ALICE))
            .unwrap();
        assert_eq!(outcome.gas_used, 21_000);
        assert_eq!(executor.ledger().balance(&alice), Word::from(70u64));
        assert_eq!(executor.ledger().balance(&bob), Word::from(30u64));

        transfer.nonce = Word::from(2u64);
        transfer.value = Word::from(71u64);
        let err = executor
            .submit(&transfer.encode(), Some(&alice), Some(ALICE))
            .unwrap_err();
        assert!(matches!(
            err,
            HostError::Trap {
                kind: TrapKind::InsufficientFunds,
                ..
            }
        ));
    }

    #[test]
    fn test_create_deploys_contract() {
        let (mut executor, alice) = setup(ExecutorConfig::default());
        let mut create = tx(1, Action::Create, 200_000);
        // MSTORE8(0, 1); RETURN(0, 1)
        create.data = Bytes::from(hex::decode("600160005360016000f3").unwrap());

        let outcome = executor
            .submit(&create.encode(), Some(&alice), Some(ALICE))
            .unwrap();
        let address = legacy_contract_address(&alice, &Word::one());
        assert_eq!(outcome.contract_address, Some(address));
        assert_eq!(outcome.output.as_ref(), &[0x01]);
        assert_eq!(executor.ledger().code(&address).as_ref(), &[0x01]);
    }

    #[test]
    fn test_refund_capped_at_half() {
        let (mut executor, alice) = setup(ExecutorConfig::default());
        deploy(&executor, "6000600055");
        executor
            .ledger_mut()
            .put_storage(storage_key(&contract(), &Word::zero()), Word::one());

        let outcome = executor
            .submit(&raw_call(1, contract()), Some(&alice), Some(ALICE))
            .unwrap();
        // 21000 intrinsic + 5006 execution, refund capped at half of it
        assert_eq!(outcome.gas_refunded, 13_003);
        assert_eq!(outcome.gas_used, 13_003);
        assert_eq!(executor.ledger().storage_len(), 0);
    }

    #[test]
    fn test_execute_code_is_gated() {
        let (mut executor, alice) = setup(ExecutorConfig::default());
        let code = hex::decode("6000600020600055").unwrap();
        let raw = raw_call(1, contract());
        let err = executor
            .execute_code(&code, &raw, Some(&alice), Some(ALICE))
            .unwrap_err();
        assert_eq!(err.to_string(), "execute is only available during development.");

        let (mut executor, alice) = setup(ExecutorConfig::default().with_raw_code());
        executor
            .execute_code(&code, &raw, Some(&alice), Some(ALICE))
            .unwrap();
        assert_eq!(
            executor.ledger().storage(&contract(), &Word::zero()),
            Word::from(keccak256(&[]))
        );
        // the recipient's own code is untouched
        assert!(executor.ledger().code(&contract()).is_empty());
    }
}
