pub mod cli;
pub mod config;
pub mod crc;
pub mod jetton;
pub mod ledger;
pub mod network_config;
pub mod payload;
pub mod tracker;
pub mod tvm;
pub mod utils;
