//! Mint message for the jetton master.
//!
//! ```text
//! mint#fc708bd2 amount:int257 receiver:MsgAddressInt
//! ```
//!
//! The whole payload is 556 bits in a single cell without references.

use crate::payload::opcodes::Opcode;
use crate::tvm::error::{EncodingError, Result};
use crate::tvm::{Address, Builder, Cell, Slice};
use num_bigint::BigInt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintPayload {
    /// Amount in the jetton's smallest units
    pub amount: BigInt,
    pub receiver: Address,
}

impl MintPayload {
    pub fn new(amount: impl Into<BigInt>, receiver: Address) -> Self {
        Self {
            amount: amount.into(),
            receiver,
        }
    }

    pub fn to_cell(&self) -> Result<Arc<Cell>> {
        let mut builder = Builder::new();
        builder.store_u32(Opcode::Mint.code())?;
        builder.store_int_big(&self.amount, 257)?;
        builder.store_address(Some(&self.receiver))?;
        builder.build()
    }

    pub fn from_cell(cell: &Arc<Cell>) -> Result<Self> {
        let mut slice = Slice::new(cell.clone());
        let op = slice.load_u32()?;
        if op != Opcode::Mint.code() {
            return Err(EncodingError::UnexpectedTag {
                what: "mint payload",
                tag: op as u64,
            });
        }
        let amount = slice.load_int_big(257)?;
        let receiver = slice
            .load_address()?
            .ok_or_else(|| EncodingError::InvalidAddress("mint receiver is addr_none".into()))?;
        Ok(Self { amount, receiver })
    }
}

/// Builds the mint body sent to the jetton master
pub fn build_mint_payload(amount: &BigInt, receiver: &Address) -> Result<Arc<Cell>> {
    MintPayload::new(amount.clone(), *receiver).to_cell()
}
