use crate::ledger::LedgerError;
use crate::tvm::{Address, Coins};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("sending {amount} TON to {destination} failed: {source}")]
    Send {
        destination: Address,
        amount: Coins,
        #[source]
        source: LedgerError,
    },

    #[error("querying {account} failed on attempt {attempt}: {source}")]
    BalanceQuery {
        account: Address,
        attempt: u32,
        #[source]
        source: LedgerError,
    },

    #[error("waiting for block {seqno} failed: {source}")]
    Settle {
        seqno: u32,
        #[source]
        source: LedgerError,
    },

    #[error("no change observed on {account} after {attempts} attempts")]
    ConfirmationTimeout { account: Address, attempts: u32 },

    #[error("ledger did not return a transaction hash for the message to {destination}")]
    MissingTransactionHash { destination: Address },

    #[error("cancelled after {attempts} attempts")]
    Cancelled { attempts: u32 },
}

impl TrackerError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TrackerError::Cancelled { .. })
    }
}
