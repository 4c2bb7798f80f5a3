//! Initial data of the jetton master contract.
//!
//! ```text
//! _ system:^Cell owner_flag:uint1 owner:MsgAddressInt content:^Cell max_supply:int257
//! ```
//!
//! The bundled master code and its system cell come from `assets/` and are
//! parsed on first use.

use crate::payload::content::{JettonContent, OnChainContent};
use crate::payload::state_init::StateInit;
use crate::tvm::error::{EncodingError, Result};
use crate::tvm::{Address, Builder, Cell, Slice, base64_to_boc};
use num_bigint::BigInt;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

static JETTON_CODE: Lazy<Result<Arc<Cell>>> =
    Lazy::new(|| base64_to_boc(include_str!("../../assets/jetton_code.boc.b64")));

static JETTON_SYSTEM: Lazy<Result<Arc<Cell>>> =
    Lazy::new(|| base64_to_boc(include_str!("../../assets/jetton_system.boc.b64")));

/// Code of the bundled jetton master contract
pub fn jetton_code_cell() -> Result<Arc<Cell>> {
    JETTON_CODE.clone()
}

/// System cell the bundled master code expects as its first data reference
pub fn jetton_system_cell() -> Result<Arc<Cell>> {
    JETTON_SYSTEM.clone()
}

/// Human-facing parameters of a new jetton
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JettonParams {
    pub name: String,
    pub description: String,
    pub symbol: String,
    pub image: String,
}

impl JettonParams {
    pub fn content(&self) -> JettonContent {
        JettonContent::OnChain(OnChainContent {
            name: self.name.clone(),
            description: self.description.clone(),
            symbol: self.symbol.clone(),
            image: self.image.clone(),
            ..Default::default()
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractDeployData {
    pub system: Arc<Cell>,
    pub owner_flag: bool,
    pub owner: Address,
    pub content: Arc<Cell>,
    pub max_supply: BigInt,
}

impl ContractDeployData {
    pub fn to_cell(&self) -> Result<Arc<Cell>> {
        let mut builder = Builder::new();
        builder.store_ref(self.system.clone())?;
        builder.store_bit(self.owner_flag)?;
        builder.store_address(Some(&self.owner))?;
        builder.store_ref(self.content.clone())?;
        builder.store_int_big(&self.max_supply, 257)?;
        builder.build()
    }

    pub fn from_cell(cell: &Arc<Cell>) -> Result<Self> {
        let mut slice = Slice::new(cell.clone());
        let system = slice.load_reference()?;
        let owner_flag = slice.load_bit()?;
        let owner = slice
            .load_address()?
            .ok_or_else(|| EncodingError::InvalidAddress("owner is addr_none".into()))?;
        let content = slice.load_reference()?;
        let max_supply = slice.load_int_big(257)?;
        Ok(Self {
            system,
            owner_flag,
            owner,
            content,
            max_supply,
        })
    }
}

/// Builds the master's initial data with the bundled system cell and owner flag `0`
pub fn build_deploy_data(
    owner: &Address,
    max_supply: &BigInt,
    params: &JettonParams,
) -> Result<Arc<Cell>> {
    ContractDeployData {
        system: jetton_system_cell()?,
        owner_flag: false,
        owner: *owner,
        content: params.content().to_cell()?,
        max_supply: max_supply.clone(),
    }
    .to_cell()
}

/// Everything needed to deploy a jetton master
#[derive(Debug, Clone)]
pub struct JettonDeployment {
    pub state_init: StateInit,
    pub address: Address,
}

pub fn prepare_jetton_deployment(
    owner: &Address,
    max_supply: &BigInt,
    params: &JettonParams,
    workchain: i8,
) -> Result<JettonDeployment> {
    let data = build_deploy_data(owner, max_supply, params)?;
    let state_init = StateInit::new(jetton_code_cell()?, data);
    let address = state_init.address(workchain)?;
    Ok(JettonDeployment {
        state_init,
        address,
    })
}
