//! Submission and confirmation of messages
//!
//! A tracker hands one message to the wallet and then polls the ledger until
//! the watched quantity changes, the attempt budget runs out, or the caller
//! cancels. The lifecycle is
//!
//! ```text
//! Built -> Sent -> AwaitingConfirmation -> Confirmed | TimedOut | Failed
//! ```
//!
//! Running out of attempts is an ordinary outcome (`Outcome::TimedOut`), not
//! an error. Encoding problems never reach this module: messages arrive as
//! finished cells.

pub mod clock;
pub mod error;

use std::mem;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::jetton::JettonWallet;
use crate::ledger::{
    BlockRef, LedgerClient, LedgerError, OutboundMessage, SendReceipt, TxHash, Wallet,
};
use crate::tvm::Address;

pub use clock::{Backoff, Clock, FixedBackoff, TokioClock};
pub use error::TrackerError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Polls made before giving up
    pub max_attempts: u32,
    pub poll_interval_ms: u64,
    /// Blocks to wait past the send receipt's block before the first poll
    pub settle_blocks: u32,
    /// Send with `Wallet::send_wait_transaction` instead of a plain send
    pub wait_transaction: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_attempts: 100,
            poll_interval_ms: 1000,
            settle_blocks: 2,
            wait_transaction: true,
        }
    }
}

impl TrackerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// What a tracker observes to decide that the message took effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Watch {
    /// TON balance of an account
    Balance(Address),
    /// Balance held by a jetton wallet contract
    JettonBalance(Address),
    /// The sent transaction showing up on this account
    Transaction(Address),
}

impl Watch {
    pub fn account(&self) -> Address {
        match self {
            Watch::Balance(account) | Watch::JettonBalance(account) | Watch::Transaction(account) => {
                *account
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    Built,
    Sent,
    AwaitingConfirmation { attempts: u32 },
    Confirmed,
    TimedOut,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    /// Observed balance minus the pre-send baseline; zero for transaction watches
    pub delta: i128,
    /// Polls made, including the one that observed the change
    pub attempts: u32,
    pub tx_hash: Option<TxHash>,
    pub block: Option<BlockRef>,
}

#[derive(Debug)]
pub enum Outcome {
    Confirmed(Confirmation),
    TimedOut { account: Address, attempts: u32 },
    Failed(TrackerError),
}

impl Outcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Outcome::Confirmed(_))
    }

    pub fn into_result(self) -> Result<Confirmation, TrackerError> {
        match self {
            Outcome::Confirmed(confirmation) => Ok(confirmation),
            Outcome::TimedOut { account, attempts } => {
                Err(TrackerError::ConfirmationTimeout { account, attempts })
            }
            Outcome::Failed(error) => Err(error),
        }
    }

    fn state(&self) -> TrackerState {
        match self {
            Outcome::Confirmed(_) => TrackerState::Confirmed,
            Outcome::TimedOut { .. } => TrackerState::TimedOut,
            Outcome::Failed(_) => TrackerState::Failed,
        }
    }
}

enum Sample {
    Balance(u128),
    Included(BlockRef),
    Pending,
}

fn cancelled(attempts: u32) -> Outcome {
    Outcome::Failed(TrackerError::Cancelled { attempts })
}

pub struct ConfirmationTracker {
    ledger: Arc<dyn LedgerClient>,
    wallet: Arc<dyn Wallet>,
    clock: Arc<dyn Clock>,
    backoff: Arc<dyn Backoff>,
    config: TrackerConfig,
    state: TrackerState,
    history: Vec<TrackerState>,
}

impl ConfirmationTracker {
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        wallet: Arc<dyn Wallet>,
        config: TrackerConfig,
    ) -> Self {
        let backoff = Arc::new(FixedBackoff(config.poll_interval()));
        Self {
            ledger,
            wallet,
            clock: Arc::new(TokioClock),
            backoff,
            config,
            state: TrackerState::Built,
            history: vec![TrackerState::Built],
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_backoff(mut self, backoff: Arc<dyn Backoff>) -> Self {
        self.backoff = backoff;
        self
    }

    /// A fresh tracker sharing this one's collaborators and config
    pub fn fork(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
            wallet: self.wallet.clone(),
            clock: self.clock.clone(),
            backoff: self.backoff.clone(),
            config: self.config.clone(),
            state: TrackerState::Built,
            history: vec![TrackerState::Built],
        }
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    /// Distinct states visited so far, in order
    pub fn history(&self) -> &[TrackerState] {
        &self.history
    }

    fn transition(&mut self, next: TrackerState) {
        if mem::discriminant(&self.state) != mem::discriminant(&next) {
            log::debug!("tracker: {:?} -> {:?}", self.state, next);
            self.history.push(next);
        }
        self.state = next;
    }

    /// Sends `message` and waits until `watch` reflects it
    pub async fn submit(
        &mut self,
        message: OutboundMessage,
        watch: Watch,
        cancel: &CancellationToken,
    ) -> Outcome {
        let outcome = self.run(message, watch, cancel).await;
        match &outcome {
            Outcome::Confirmed(confirmation) => log::info!(
                "{} confirmed after {} attempts (delta {})",
                watch.account(),
                confirmation.attempts,
                confirmation.delta
            ),
            Outcome::TimedOut { account, attempts } => {
                log::warn!("{account} unchanged after {attempts} attempts")
            }
            Outcome::Failed(error) => log::warn!("tracking failed: {error}"),
        }
        self.transition(outcome.state());
        outcome
    }

    async fn run(
        &mut self,
        message: OutboundMessage,
        watch: Watch,
        cancel: &CancellationToken,
    ) -> Outcome {
        let account = watch.account();

        let baseline = match watch {
            Watch::Transaction(_) => None,
            _ => {
                let sampled = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return cancelled(0),
                    sampled = self.read_balance(&watch) => sampled,
                };
                match sampled {
                    Ok(balance) => Some(balance),
                    Err(source) => {
                        return Outcome::Failed(TrackerError::BalanceQuery {
                            account,
                            attempt: 0,
                            source,
                        });
                    }
                }
            }
        };

        let destination = message.destination;
        let amount = message.amount;
        let sent = tokio::select! {
            biased;
            _ = cancel.cancelled() => return cancelled(0),
            sent = self.send(message) => sent,
        };
        let receipt = match sent {
            Ok(receipt) => receipt,
            Err(source) => {
                return Outcome::Failed(TrackerError::Send {
                    destination,
                    amount,
                    source,
                });
            }
        };
        self.transition(TrackerState::Sent);
        log::debug!(
            "sent {amount} TON to {destination}, tx {:?}, block {:?}",
            receipt.tx_hash.map(|hash| hash.to_hex()),
            receipt.block
        );

        if let Some(block) = receipt.block.filter(|_| self.config.settle_blocks > 0) {
            let target = block.seqno.saturating_add(self.config.settle_blocks);
            let settled = tokio::select! {
                biased;
                _ = cancel.cancelled() => return cancelled(0),
                settled = self.ledger.wait_for_block(target) => settled,
            };
            match settled {
                Ok(_) => {}
                Err(e) if e.is_retryable() => {
                    log::warn!("waiting for block {target} failed, polling anyway: {e}");
                }
                Err(source) => {
                    return Outcome::Failed(TrackerError::Settle {
                        seqno: target,
                        source,
                    });
                }
            }
        }

        if matches!(watch, Watch::Transaction(_)) && receipt.tx_hash.is_none() {
            return Outcome::Failed(TrackerError::MissingTransactionHash { destination });
        }

        self.poll(watch, baseline, receipt, cancel).await
    }

    async fn send(&self, message: OutboundMessage) -> Result<SendReceipt, LedgerError> {
        if self.config.wait_transaction {
            self.wallet.send_wait_transaction(message).await
        } else {
            self.wallet.send(message, false).await
        }
    }

    async fn poll(
        &mut self,
        watch: Watch,
        baseline: Option<u128>,
        receipt: SendReceipt,
        cancel: &CancellationToken,
    ) -> Outcome {
        let account = watch.account();
        let max_attempts = self.config.max_attempts;
        let mut last_error = None;

        self.transition(TrackerState::AwaitingConfirmation { attempts: 0 });
        for attempt in 1..=max_attempts {
            let sample = tokio::select! {
                biased;
                _ = cancel.cancelled() => return cancelled(attempt - 1),
                sample = self.sample(&watch, receipt.tx_hash.as_ref()) => sample,
            };
            self.transition(TrackerState::AwaitingConfirmation { attempts: attempt });

            match sample {
                Ok(Sample::Balance(observed)) => {
                    last_error = None;
                    let baseline = baseline.unwrap_or(observed);
                    if observed != baseline {
                        return Outcome::Confirmed(Confirmation {
                            delta: observed as i128 - baseline as i128,
                            attempts: attempt,
                            tx_hash: receipt.tx_hash,
                            block: receipt.block,
                        });
                    }
                    log::debug!("attempt {attempt}/{max_attempts}: {account} still at {observed}");
                }
                Ok(Sample::Included(block)) => {
                    return Outcome::Confirmed(Confirmation {
                        delta: 0,
                        attempts: attempt,
                        tx_hash: receipt.tx_hash,
                        block: Some(block),
                    });
                }
                Ok(Sample::Pending) => {
                    last_error = None;
                    log::debug!("attempt {attempt}/{max_attempts}: transaction not seen on {account}");
                }
                Err(source) if source.is_retryable() => {
                    log::warn!("attempt {attempt}/{max_attempts}: querying {account} failed: {source}");
                    last_error = Some(source);
                }
                Err(source) => {
                    return Outcome::Failed(TrackerError::BalanceQuery {
                        account,
                        attempt,
                        source,
                    });
                }
            }

            if attempt < max_attempts {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return cancelled(attempt),
                    _ = self.clock.sleep(self.backoff.delay(attempt)) => {}
                }
            }
        }

        match last_error {
            Some(source) => Outcome::Failed(TrackerError::BalanceQuery {
                account,
                attempt: max_attempts,
                source,
            }),
            None => Outcome::TimedOut {
                account,
                attempts: max_attempts,
            },
        }
    }

    async fn read_balance(&self, watch: &Watch) -> Result<u128, LedgerError> {
        match *watch {
            Watch::Balance(account) => match self.ledger.get_balance(&account).await {
                Ok(balance) => Ok(balance.nano()),
                Err(LedgerError::AccountInactive(_)) => Ok(0),
                Err(e) => Err(e),
            },
            Watch::JettonBalance(wallet) => {
                JettonWallet::new(wallet).get_balance(self.ledger.as_ref()).await
            }
            Watch::Transaction(account) => Err(LedgerError::UnexpectedResponse(format!(
                "{account} is watched for a transaction, not a balance"
            ))),
        }
    }

    async fn sample(&self, watch: &Watch, tx_hash: Option<&TxHash>) -> Result<Sample, LedgerError> {
        match (watch, tx_hash) {
            (Watch::Transaction(account), Some(hash)) => {
                Ok(match self.ledger.find_transaction(account, hash).await? {
                    Some(block) => Sample::Included(block),
                    None => Sample::Pending,
                })
            }
            _ => self.read_balance(watch).await.map(Sample::Balance),
        }
    }
}

/// Runs one forked tracker per message and waits for all of them
pub async fn submit_concurrently(
    template: &ConfirmationTracker,
    jobs: Vec<(OutboundMessage, Watch)>,
    cancel: &CancellationToken,
) -> Vec<Outcome> {
    let runs = jobs.into_iter().map(|(message, watch)| {
        let mut tracker = template.fork();
        async move { tracker.submit(message, watch, cancel).await }
    });
    join_all(runs).await
}
