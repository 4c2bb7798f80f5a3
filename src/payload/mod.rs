//! Message bodies and contract data for jetton operations
//!
//! - Mint: `mint#fc708bd2` sent to the jetton master
//! - Content: TEP-64 metadata, on-chain dictionary or off-chain URI
//! - Deploy: initial data and StateInit of the jetton master
//! - Transfer: TEP-74 wallet transfer
//! - Comment: plain text comments attached to TON transfers

pub mod comment;
pub mod content;
pub mod deploy;
pub mod mint;
pub mod opcodes;
pub mod state_init;
pub mod transfer;
#[cfg(test)]
mod tests;

pub use comment::{build_text_comment, parse_text_comment};
pub use content::{JettonContent, OnChainContent, build_jetton_content};
pub use deploy::{
    ContractDeployData, JettonDeployment, JettonParams, build_deploy_data, jetton_code_cell,
    jetton_system_cell, prepare_jetton_deployment,
};
pub use mint::{MintPayload, build_mint_payload};
pub use opcodes::Opcode;
pub use state_init::StateInit;
pub use transfer::JettonTransfer;
