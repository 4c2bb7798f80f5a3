//! Read-only access to jetton master and wallet contracts through get-methods.

use std::sync::Arc;

use crate::ledger::{
    DeployReceipt, LedgerClient, LedgerError, Result, RunMethodResult, StackEntry, Wallet,
};
use crate::payload::{JettonContent, JettonParams, prepare_jetton_deployment};
use crate::tvm::{Address, Cell, Coins};
use crate::utils::method_name_to_id;
use num_bigint::BigInt;
use num_traits::Zero;

/// State reported by `get_jetton_data`
#[derive(Debug, Clone)]
pub struct JettonData {
    pub total_supply: u128,
    pub mintable: bool,
    /// `None` once admin rights were revoked
    pub admin: Option<Address>,
    pub content: JettonContent,
    pub wallet_code: Arc<Cell>,
}

/// State reported by `get_wallet_data`
#[derive(Debug, Clone)]
pub struct JettonWalletData {
    pub balance: u128,
    pub owner: Address,
    pub master: Address,
    pub wallet_code: Arc<Cell>,
}

fn stack_of(
    result: RunMethodResult,
    account: &Address,
    method_id: u32,
    expected: usize,
) -> Result<Vec<StackEntry>> {
    if result.exit_code != 0 && result.exit_code != 1 {
        return Err(LedgerError::GetMethod {
            account: *account,
            method_id,
            exit_code: result.exit_code,
        });
    }
    if result.stack.len() < expected {
        return Err(LedgerError::UnexpectedResponse(format!(
            "get-method {method_id} returned {} stack entries, expected {expected}",
            result.stack.len()
        )));
    }
    Ok(result.stack)
}

fn required_address(entry: &StackEntry, what: &str) -> Result<Address> {
    entry
        .as_address()?
        .ok_or_else(|| LedgerError::UnexpectedResponse(format!("{what} is addr_none")))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JettonMaster {
    pub address: Address,
}

impl JettonMaster {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    pub async fn get_jetton_data(&self, ledger: &dyn LedgerClient) -> Result<JettonData> {
        let method_id = method_name_to_id("get_jetton_data");
        let result = ledger
            .run_get_method(&self.address, method_id, Vec::new())
            .await?;
        let stack = stack_of(result, &self.address, method_id, 5)?;

        // -1 is true in TVM
        let mintable = !stack[1].as_int()?.is_zero();
        let content = JettonContent::from_cell(stack[3].as_cell()?)?;

        Ok(JettonData {
            total_supply: stack[0].as_u128()?,
            mintable,
            admin: stack[2].as_address()?,
            content,
            wallet_code: stack[4].as_cell()?.clone(),
        })
    }

    /// Address of the jetton wallet that belongs to `owner`
    pub async fn get_wallet_address(
        &self,
        ledger: &dyn LedgerClient,
        owner: &Address,
    ) -> Result<Address> {
        let method_id = method_name_to_id("get_wallet_address");
        let result = ledger
            .run_get_method(&self.address, method_id, vec![StackEntry::address(owner)?])
            .await?;
        let stack = stack_of(result, &self.address, method_id, 1)?;
        required_address(&stack[0], "jetton wallet address")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JettonWallet {
    pub address: Address,
}

impl JettonWallet {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    pub async fn get_wallet_data(&self, ledger: &dyn LedgerClient) -> Result<JettonWalletData> {
        let method_id = method_name_to_id("get_wallet_data");
        let result = ledger
            .run_get_method(&self.address, method_id, Vec::new())
            .await?;
        let stack = stack_of(result, &self.address, method_id, 4)?;

        Ok(JettonWalletData {
            balance: stack[0].as_u128()?,
            owner: required_address(&stack[1], "wallet owner")?,
            master: required_address(&stack[2], "jetton master")?,
            wallet_code: stack[3].as_cell()?.clone(),
        })
    }

    /// Jetton balance; a wallet that was never deployed holds nothing
    pub async fn get_balance(&self, ledger: &dyn LedgerClient) -> Result<u128> {
        match self.get_wallet_data(ledger).await {
            Ok(data) => Ok(data.balance),
            Err(LedgerError::AccountInactive(_)) => Ok(0),
            Err(e) => Err(e),
        }
    }
}

/// Deploys a new jetton master from `wallet` and waits for its transaction
///
/// The master lands in the wallet's workchain with an empty message body.
pub async fn deploy_jetton(
    wallet: &dyn Wallet,
    owner: &Address,
    max_supply: &BigInt,
    params: &JettonParams,
    amount: Coins,
) -> Result<DeployReceipt> {
    let deployment =
        prepare_jetton_deployment(owner, max_supply, params, wallet.address().workchain)?;
    log::info!(
        "deploying jetton {:?} to {} with {amount} TON",
        params.symbol,
        deployment.address
    );

    let state_init = deployment.state_init;
    let receipt = wallet
        .deploy_contract_wait(amount, None, state_init.code, state_init.data)
        .await?;
    if !receipt.address.same_account(&deployment.address) {
        return Err(LedgerError::Wallet(format!(
            "contract deployed to {}, expected {}",
            receipt.address, deployment.address
        )));
    }
    log::info!("jetton master {} deployed", receipt.address);
    Ok(receipt)
}
