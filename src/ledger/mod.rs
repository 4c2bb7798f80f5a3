//! Collaborators the confirmation tracker talks to
//!
//! The ledger client moves bytes to and from the network; the wallet owns the
//! keys and turns outbound messages into signed external messages. Neither is
//! implemented here: integrators plug in their transport and signer.

pub mod error;
#[cfg(test)]
pub mod mock;
mod types;

use async_trait::async_trait;
use std::sync::Arc;

use crate::network_config::{self, ConfigGlobal};
use crate::tvm::{Address, Cell, Coins};

pub use error::{LedgerError, Result};
pub use types::{
    BlockRef, DeployReceipt, OutboundMessage, RunMethodResult, SendReceipt, StackEntry, TxHash,
    WalletVersion,
};

/// Read and submit access to the ledger
///
/// Implementations must be safe to share between concurrently running trackers.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Downloads the global network config
    async fn fetch_config(&self, url: &str) -> Result<ConfigGlobal> {
        let url = url.to_string();
        tokio::task::spawn_blocking(move || network_config::download_config(&url))
            .await
            .map_err(|e| LedgerError::Connection(format!("config download task failed: {e}")))?
    }

    async fn connect(&self, config: &ConfigGlobal) -> Result<()>;

    /// Submits a serialized external message
    async fn send_message(&self, boc: &[u8]) -> Result<Option<TxHash>>;

    /// Sequence number of the latest masterchain block
    async fn current_seqno(&self) -> Result<u32>;

    /// Resolves once a masterchain block with at least `seqno` is known
    async fn wait_for_block(&self, seqno: u32) -> Result<BlockRef>;

    /// Balance in nanotons; inactive accounts report `AccountInactive`
    async fn get_balance(&self, account: &Address) -> Result<Coins>;

    async fn run_get_method(
        &self,
        account: &Address,
        method_id: u32,
        stack: Vec<StackEntry>,
    ) -> Result<RunMethodResult>;

    /// Block that included the transaction, if it has been seen yet
    async fn find_transaction(&self, account: &Address, hash: &TxHash)
    -> Result<Option<BlockRef>>;
}

/// A signing wallet bound to one address
#[async_trait]
pub trait Wallet: Send + Sync {
    fn address(&self) -> Address;

    fn version(&self) -> WalletVersion;

    /// Plain TON transfer with an optional text comment
    fn build_transfer(
        &self,
        destination: Address,
        amount: Coins,
        bounce: bool,
        comment: Option<&str>,
    ) -> Result<OutboundMessage> {
        Ok(OutboundMessage::transfer(destination, amount, bounce, comment)?)
    }

    /// Signs and sends; with `wait_confirmation` the call returns once the
    /// wallet's seqno advanced
    async fn send(&self, message: OutboundMessage, wait_confirmation: bool)
    -> Result<SendReceipt>;

    /// Signs and sends, then waits for the resulting transaction
    async fn send_wait_transaction(&self, message: OutboundMessage) -> Result<SendReceipt>;

    /// Deploys a contract with the given code and data and waits for its transaction
    async fn deploy_contract_wait(
        &self,
        amount: Coins,
        body: Option<Arc<Cell>>,
        code: Arc<Cell>,
        data: Arc<Cell>,
    ) -> Result<DeployReceipt>;
}

/// Derives wallets from mnemonic words
#[async_trait]
pub trait WalletProvider {
    type Wallet: Wallet;

    async fn from_seed(
        ledger: Arc<dyn LedgerClient>,
        words: &[String],
        version: WalletVersion,
    ) -> Result<Self::Wallet>;
}
