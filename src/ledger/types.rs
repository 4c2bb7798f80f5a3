use crate::payload::{StateInit, build_text_comment};
use crate::tvm::error::{EncodingError, Result};
use crate::tvm::{Address, Cell, Coins, Slice};
use base64::Engine;
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Hash of a transaction or message, as returned by the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHash(pub [u8; 32]);

impl TxHash {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(self.0)
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for TxHash {
    type Err = EncodingError;

    /// Accepts 64 hex digits or standard/url-safe base64
    fn from_str(s: &str) -> Result<Self> {
        let bytes = if s.len() == 64 {
            hex::decode(s).map_err(|e| EncodingError::InvalidBoc(format!("bad tx hash: {e}")))?
        } else {
            base64::engine::general_purpose::STANDARD
                .decode(s)
                .or_else(|_| base64::engine::general_purpose::URL_SAFE.decode(s))
                .map_err(|e| EncodingError::InvalidBoc(format!("bad tx hash: {e}")))?
        };
        let hash: [u8; 32] = bytes
            .try_into()
            .map_err(|_| EncodingError::InvalidBoc("tx hash must be 32 bytes".into()))?;
        Ok(TxHash(hash))
    }
}

/// Block reference returned with a sent or located transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRef {
    pub workchain: i32,
    pub seqno: u32,
}

/// Value on the TVM stack passed to or returned from a get-method
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackEntry {
    Null,
    Int(BigInt),
    Cell(Arc<Cell>),
    Slice(Arc<Cell>),
}

impl StackEntry {
    /// Wraps an address as a slice argument
    pub fn address(address: &Address) -> Result<Self> {
        let mut builder = crate::tvm::Builder::new();
        builder.store_address(Some(address))?;
        Ok(StackEntry::Slice(builder.build()?))
    }

    fn type_name(&self) -> &'static str {
        match self {
            StackEntry::Null => "null",
            StackEntry::Int(_) => "int",
            StackEntry::Cell(_) => "cell",
            StackEntry::Slice(_) => "slice",
        }
    }

    pub fn as_int(&self) -> Result<&BigInt> {
        match self {
            StackEntry::Int(value) => Ok(value),
            other => Err(EncodingError::UnsupportedCell(format!(
                "expected int on stack, got {}",
                other.type_name()
            ))),
        }
    }

    pub fn as_u128(&self) -> Result<u128> {
        let value = self.as_int()?;
        value.to_u128().ok_or_else(|| EncodingError::ValueOutOfRange {
            value: value.to_string(),
            bits: 128,
        })
    }

    /// Cells and slices both carry a cell
    pub fn as_cell(&self) -> Result<&Arc<Cell>> {
        match self {
            StackEntry::Cell(cell) | StackEntry::Slice(cell) => Ok(cell),
            other => Err(EncodingError::UnsupportedCell(format!(
                "expected cell on stack, got {}",
                other.type_name()
            ))),
        }
    }

    /// Reads a `MsgAddress` from a slice entry; `addr_none` gives `None`
    pub fn as_address(&self) -> Result<Option<Address>> {
        Slice::new(self.as_cell()?.clone()).load_address()
    }
}

/// Result of running a get-method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunMethodResult {
    pub exit_code: i32,
    pub stack: Vec<StackEntry>,
}

/// Internal message a wallet signs and sends
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub destination: Address,
    pub amount: Coins,
    pub bounce: bool,
    pub body: Option<Arc<Cell>>,
    pub state_init: Option<StateInit>,
}

impl OutboundMessage {
    /// Bounceable message without StateInit
    pub fn simple(destination: Address, amount: Coins, body: Option<Arc<Cell>>) -> Self {
        Self {
            destination,
            amount,
            bounce: true,
            body,
            state_init: None,
        }
    }

    /// Plain TON transfer, optionally carrying a text comment
    pub fn transfer(
        destination: Address,
        amount: Coins,
        bounce: bool,
        comment: Option<&str>,
    ) -> Result<Self> {
        let body = comment.map(build_text_comment).transpose()?;
        Ok(Self {
            destination,
            amount,
            bounce,
            body,
            state_init: None,
        })
    }
}

/// What the ledger reported after a message was handed over
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendReceipt {
    pub tx_hash: Option<TxHash>,
    pub block: Option<BlockRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployReceipt {
    pub address: Address,
    pub tx_hash: Option<TxHash>,
    pub block: Option<BlockRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletVersion {
    V3R2,
    V4R2,
    V5R1,
}

impl FromStr for WalletVersion {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "v3r2" => Ok(WalletVersion::V3R2),
            "v4r2" => Ok(WalletVersion::V4R2),
            "v5r1" => Ok(WalletVersion::V5R1),
            other => Err(format!("unknown wallet version: {other}")),
        }
    }
}
