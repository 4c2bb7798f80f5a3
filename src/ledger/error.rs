use crate::tvm::{Address, EncodingError};
use thiserror::Error;

/// Failures reported by the ledger client and wallet collaborators
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("failed to fetch network config from {url}: {reason}")]
    ConfigFetch { url: String, reason: String },

    #[error("connection error: {0}")]
    Connection(String),

    #[error("message rejected: {0}")]
    Rejected(String),

    #[error("account {0} is not active")]
    AccountInactive(Address),

    #[error("get-method {method_id} on {account} exited with code {exit_code}")]
    GetMethod {
        account: Address,
        method_id: u32,
        exit_code: i32,
    },

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("wallet error: {0}")]
    Wallet(String),

    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),
}

impl LedgerError {
    /// Whether repeating the same request may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Connection(_))
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
