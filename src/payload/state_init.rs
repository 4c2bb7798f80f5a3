use crate::tvm::error::Result;
use crate::tvm::{Address, Builder, Cell};
use std::sync::Arc;

/// Initial code and data of a contract
///
/// ```text
/// _ split_depth:(Maybe (## 5)) special:(Maybe TickTock)
///   code:(Maybe ^Cell) data:(Maybe ^Cell) library:(HashmapE 256 SimpleLib) = StateInit;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateInit {
    pub code: Arc<Cell>,
    pub data: Arc<Cell>,
}

impl StateInit {
    pub fn new(code: Arc<Cell>, data: Arc<Cell>) -> Self {
        Self { code, data }
    }

    pub fn to_cell(&self) -> Result<Arc<Cell>> {
        let mut builder = Builder::new();
        builder.store_bit(false)?; // split_depth
        builder.store_bit(false)?; // special
        builder.store_maybe_ref(Some(self.code.clone()))?;
        builder.store_maybe_ref(Some(self.data.clone()))?;
        builder.store_dict(None)?; // library
        builder.build()
    }

    /// Address the contract gets when deployed with this state
    pub fn address(&self, workchain: i8) -> Result<Address> {
        Ok(Address::new(workchain, self.to_cell()?.hash()))
    }
}
