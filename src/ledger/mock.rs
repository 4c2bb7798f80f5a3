//! Scripted in-memory collaborators for tests

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use num_bigint::BigInt;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use super::*;
use crate::payload::StateInit;
use crate::utils::method_name_to_id;

type AccountKey = (i8, [u8; 32]);

fn key(address: &Address) -> AccountKey {
    (address.workchain, address.hash_part)
}

/// Ledger whose answers are queued per account
///
/// Each query pops the next scripted answer; once the queue is drained the
/// last successful answer repeats. Accounts without any script are inactive.
#[derive(Default)]
pub struct MockLedger {
    balances: Mutex<HashMap<AccountKey, VecDeque<Result<u128>>>>,
    last_balance: Mutex<HashMap<AccountKey, u128>>,
    get_methods: Mutex<HashMap<(AccountKey, u32), VecDeque<RunMethodResult>>>,
    last_get_method: Mutex<HashMap<(AccountKey, u32), RunMethodResult>>,
    transactions: Mutex<HashMap<AccountKey, VecDeque<Option<BlockRef>>>>,
    get_method_calls: Mutex<Vec<(Address, u32, Vec<StackEntry>)>>,
    waited_blocks: Mutex<Vec<u32>>,
    block_failure: Mutex<Option<LedgerError>>,
    sent: Mutex<Vec<Vec<u8>>>,
    balance_calls: AtomicUsize,
    seqno: AtomicU32,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_balance(&self, account: &Address, answer: Result<u128>) {
        self.balances
            .lock()
            .unwrap()
            .entry(key(account))
            .or_default()
            .push_back(answer);
    }

    pub fn script_balances(&self, account: &Address, balances: &[u128]) {
        for balance in balances {
            self.push_balance(account, Ok(*balance));
        }
    }

    pub fn script_get_method(&self, account: &Address, method_id: u32, result: RunMethodResult) {
        self.get_methods
            .lock()
            .unwrap()
            .entry((key(account), method_id))
            .or_default()
            .push_back(result);
    }

    /// Queues a `get_wallet_data` answer reporting `balance`
    pub fn script_jetton_balance(&self, wallet: &Address, balance: u128) {
        let owner = Address::new(0, [0xee; 32]);
        let master = Address::new(0, [0xdd; 32]);
        self.script_get_method(
            wallet,
            method_name_to_id("get_wallet_data"),
            RunMethodResult {
                exit_code: 0,
                stack: vec![
                    StackEntry::Int(BigInt::from(balance)),
                    StackEntry::address(&owner).unwrap(),
                    StackEntry::address(&master).unwrap(),
                    StackEntry::Cell(Arc::new(Cell::new())),
                ],
            },
        );
    }

    pub fn script_transaction(&self, account: &Address, answers: Vec<Option<BlockRef>>) {
        self.transactions
            .lock()
            .unwrap()
            .entry(key(account))
            .or_default()
            .extend(answers);
    }

    /// The next `wait_for_block` call fails with `error`
    pub fn fail_next_block_wait(&self, error: LedgerError) {
        *self.block_failure.lock().unwrap() = Some(error);
    }

    pub fn set_seqno(&self, seqno: u32) {
        self.seqno.store(seqno, Ordering::SeqCst);
    }

    pub fn balance_calls(&self) -> usize {
        self.balance_calls.load(Ordering::SeqCst)
    }

    pub fn get_method_calls(&self) -> Vec<(Address, u32, Vec<StackEntry>)> {
        self.get_method_calls.lock().unwrap().clone()
    }

    pub fn waited_blocks(&self) -> Vec<u32> {
        self.waited_blocks.lock().unwrap().clone()
    }

    pub fn sent_messages(&self) -> Vec<Vec<u8>> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn connect(&self, _config: &ConfigGlobal) -> Result<()> {
        Ok(())
    }

    async fn send_message(&self, boc: &[u8]) -> Result<Option<TxHash>> {
        self.sent.lock().unwrap().push(boc.to_vec());
        Ok(Some(TxHash(Sha256::digest(boc).into())))
    }

    async fn current_seqno(&self) -> Result<u32> {
        Ok(self.seqno.load(Ordering::SeqCst))
    }

    async fn wait_for_block(&self, seqno: u32) -> Result<BlockRef> {
        self.waited_blocks.lock().unwrap().push(seqno);
        if let Some(error) = self.block_failure.lock().unwrap().take() {
            return Err(error);
        }
        self.seqno.fetch_max(seqno, Ordering::SeqCst);
        Ok(BlockRef {
            workchain: -1,
            seqno,
        })
    }

    async fn get_balance(&self, account: &Address) -> Result<Coins> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .balances
            .lock()
            .unwrap()
            .get_mut(&key(account))
            .and_then(|queue| queue.pop_front());
        let mut last = self.last_balance.lock().unwrap();
        match next {
            Some(Ok(balance)) => {
                last.insert(key(account), balance);
                Ok(Coins::from_nano(balance)?)
            }
            Some(Err(e)) => Err(e),
            None => match last.get(&key(account)) {
                Some(balance) => Ok(Coins::from_nano(*balance)?),
                None => Err(LedgerError::AccountInactive(*account)),
            },
        }
    }

    async fn run_get_method(
        &self,
        account: &Address,
        method_id: u32,
        stack: Vec<StackEntry>,
    ) -> Result<RunMethodResult> {
        self.get_method_calls
            .lock()
            .unwrap()
            .push((*account, method_id, stack));

        let slot = (key(account), method_id);
        let next = self
            .get_methods
            .lock()
            .unwrap()
            .get_mut(&slot)
            .and_then(|queue| queue.pop_front());
        let mut last = self.last_get_method.lock().unwrap();
        match next {
            Some(result) => {
                last.insert(slot, result.clone());
                Ok(result)
            }
            None => last
                .get(&slot)
                .cloned()
                .ok_or(LedgerError::AccountInactive(*account)),
        }
    }

    async fn find_transaction(
        &self,
        account: &Address,
        _hash: &TxHash,
    ) -> Result<Option<BlockRef>> {
        Ok(self
            .transactions
            .lock()
            .unwrap()
            .get_mut(&key(account))
            .and_then(|queue| queue.pop_front())
            .flatten())
    }
}

/// Wallet that records what it was asked to send
pub struct MockWallet {
    address: Address,
    receipt: SendReceipt,
    failure: Mutex<Option<LedgerError>>,
    send_delay: Option<Duration>,
    sent: Mutex<Vec<(OutboundMessage, bool)>>,
}

impl MockWallet {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            receipt: SendReceipt::default(),
            failure: Mutex::new(None),
            send_delay: None,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn with_receipt(mut self, receipt: SendReceipt) -> Self {
        self.receipt = receipt;
        self
    }

    /// The next send fails with `error`
    pub fn failing_with(self, error: LedgerError) -> Self {
        *self.failure.lock().unwrap() = Some(error);
        self
    }

    pub fn with_send_delay(mut self, delay: Duration) -> Self {
        self.send_delay = Some(delay);
        self
    }

    /// Sent messages with whether the caller waited for a transaction
    pub fn sent(&self) -> Vec<(OutboundMessage, bool)> {
        self.sent.lock().unwrap().clone()
    }

    async fn deliver(&self, message: OutboundMessage, waited: bool) -> Result<SendReceipt> {
        if let Some(delay) = self.send_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = self.failure.lock().unwrap().take() {
            return Err(error);
        }
        self.sent.lock().unwrap().push((message, waited));
        Ok(self.receipt.clone())
    }
}

#[async_trait]
impl Wallet for MockWallet {
    fn address(&self) -> Address {
        self.address
    }

    fn version(&self) -> WalletVersion {
        WalletVersion::V4R2
    }

    async fn send(&self, message: OutboundMessage, wait_confirmation: bool) -> Result<SendReceipt> {
        self.deliver(message, wait_confirmation).await
    }

    async fn send_wait_transaction(&self, message: OutboundMessage) -> Result<SendReceipt> {
        self.deliver(message, true).await
    }

    async fn deploy_contract_wait(
        &self,
        amount: Coins,
        body: Option<Arc<Cell>>,
        code: Arc<Cell>,
        data: Arc<Cell>,
    ) -> Result<DeployReceipt> {
        let state_init = StateInit::new(code, data);
        let address = state_init.address(0)?;
        let message = OutboundMessage {
            destination: address,
            amount,
            bounce: false,
            body,
            state_init: Some(state_init),
        };
        let receipt = self.deliver(message, true).await?;
        Ok(DeployReceipt {
            address,
            tx_hash: receipt.tx_hash,
            block: receipt.block,
        })
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    type Wallet = MockWallet;

    async fn from_seed(
        _ledger: Arc<dyn LedgerClient>,
        words: &[String],
        _version: WalletVersion,
    ) -> Result<MockWallet> {
        if words.len() != 24 {
            return Err(LedgerError::Wallet(format!(
                "expected 24 mnemonic words, got {}",
                words.len()
            )));
        }
        let hash: [u8; 32] = Sha256::digest(words.join(" ").as_bytes()).into();
        Ok(MockWallet::new(Address::new(0, hash)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{jetton_code_cell, jetton_system_cell};

    #[tokio::test]
    async fn test_balance_script_repeats_last_value() {
        let ledger = MockLedger::new();
        let account = Address::new(0, [1; 32]);
        assert!(matches!(
            ledger.get_balance(&account).await,
            Err(LedgerError::AccountInactive(_))
        ));

        ledger.script_balances(&account, &[10, 20]);
        assert_eq!(ledger.get_balance(&account).await.unwrap().nano(), 10);
        assert_eq!(ledger.get_balance(&account).await.unwrap().nano(), 20);
        assert_eq!(ledger.get_balance(&account).await.unwrap().nano(), 20);
        assert_eq!(ledger.balance_calls(), 4);
    }

    #[tokio::test]
    async fn test_from_seed_checks_word_count() {
        let ledger: Arc<dyn LedgerClient> = Arc::new(MockLedger::new());
        let words: Vec<String> = (0..24).map(|i| format!("word{i}")).collect();

        let wallet = MockWallet::from_seed(ledger.clone(), &words, WalletVersion::V4R2)
            .await
            .unwrap();
        let again = MockWallet::from_seed(ledger.clone(), &words, WalletVersion::V4R2)
            .await
            .unwrap();
        assert_eq!(wallet.address(), again.address());

        assert!(
            MockWallet::from_seed(ledger, &words[..12], WalletVersion::V4R2)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_deploy_targets_state_init_address() {
        let wallet = MockWallet::new(Address::new(0, [3; 32]));
        let code = jetton_code_cell().unwrap();
        let data = jetton_system_cell().unwrap();

        let receipt = wallet
            .deploy_contract_wait(Coins::from_ton("0.1").unwrap(), None, code.clone(), data.clone())
            .await
            .unwrap();
        let expected = StateInit::new(code, data).address(0).unwrap();
        assert_eq!(receipt.address, expected);

        let sent = wallet.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0.destination, expected);
        assert!(sent[0].0.state_init.is_some());
    }

    #[tokio::test]
    async fn test_default_build_transfer() {
        let wallet = MockWallet::new(Address::new(0, [3; 32]));
        let msg = wallet
            .build_transfer(Address::new(0, [4; 32]), Coins::ZERO, true, None)
            .unwrap();
        assert!(msg.body.is_none());
        assert!(msg.bounce);
    }

    #[tokio::test]
    async fn test_send_message_records_boc() {
        let ledger = MockLedger::new();
        let hash = ledger.send_message(&[1, 2, 3]).await.unwrap();
        assert!(hash.is_some());
        assert_eq!(ledger.sent_messages(), vec![vec![1, 2, 3]]);
    }
}
