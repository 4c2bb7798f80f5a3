use crate::payload::opcodes::Opcode;
use crate::tvm::error::Result;
use crate::tvm::{Address, Builder, Cell, Coins};
use std::sync::Arc;

/// TEP-74 jetton transfer, sent to the sender's own jetton wallet
///
/// ```text
/// transfer#0f8a7ea5 query_id:uint64 amount:(VarUInteger 16) destination:MsgAddress
///   response_destination:MsgAddress custom_payload:(Maybe ^Cell)
///   forward_ton_amount:(VarUInteger 16) forward_payload:(Either Cell ^Cell)
/// ```
#[derive(Debug, Clone)]
pub struct JettonTransfer {
    pub query_id: u64,
    /// Jetton amount in smallest units
    pub amount: Coins,
    pub destination: Address,
    pub response_destination: Option<Address>,
    pub custom_payload: Option<Arc<Cell>>,
    pub forward_ton_amount: Coins,
    pub forward_payload: Option<Arc<Cell>>,
}

impl JettonTransfer {
    pub fn new(amount: Coins, destination: Address) -> Self {
        Self {
            query_id: 0,
            amount,
            destination,
            response_destination: None,
            custom_payload: None,
            forward_ton_amount: Coins::ZERO,
            forward_payload: None,
        }
    }

    pub fn to_cell(&self) -> Result<Arc<Cell>> {
        let mut builder = Builder::new();
        builder.store_u32(Opcode::JettonTransfer.code())?;
        builder.store_u64(self.query_id)?;
        builder.store_coins(self.amount.nano())?;
        builder.store_address(Some(&self.destination))?;
        builder.store_address(self.response_destination.as_ref())?;
        builder.store_maybe_ref(self.custom_payload.clone())?;
        builder.store_coins(self.forward_ton_amount.nano())?;
        // Either Cell ^Cell: an empty inline cell, or the payload by reference
        builder.store_maybe_ref(self.forward_payload.clone())?;
        builder.build()
    }
}
