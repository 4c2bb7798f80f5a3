use crate::config::AppConfig;
use crate::ledger::LedgerError;
use crate::network_config::{Network, download_config};
use crate::payload::{
    JettonContent, JettonParams, build_jetton_content, build_mint_payload, build_text_comment,
    prepare_jetton_deployment,
};
use crate::tvm::address::Address;
use crate::tvm::{Cell, Coins, boc_to_base64, boc_to_hex};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use num_bigint::BigInt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

/// tonjetton-rs CLI
#[derive(Parser, Debug)]
#[command(name = "tonjetton-rs")]
#[command(about = "Build jetton payloads and inspect TON addresses", long_about = None)]
pub struct Cli {
    /// JSON config file (defaults apply when absent)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show every text form of an address
    Address {
        /// Raw (`0:abcd...`) or user-friendly address
        address: String,
    },
    /// Build a jetton master mint body
    MintPayload {
        /// Amount in whole jettons, e.g. `100` or `0.5`
        #[arg(short = 'a', long)]
        amount: String,
        #[arg(short = 'd', long, default_value_t = 9)]
        decimals: u32,
        #[arg(short = 'r', long)]
        receiver: String,
    },
    /// Build a text comment body
    Comment { text: String },
    /// Build TEP-64 jetton metadata
    JettonContent {
        #[command(flatten)]
        params: ParamsArgs,
        /// Store only this metadata URI instead of on-chain attributes
        #[arg(long)]
        uri: Option<String>,
    },
    /// Build the jetton master's initial data and its deployment address
    DeployData {
        #[arg(short = 'o', long)]
        owner: String,
        #[arg(short = 'm', long)]
        max_supply: String,
        #[command(flatten)]
        params: ParamsArgs,
        /// JSON file with name, description, symbol and image
        #[arg(long, conflicts_with_all = ["name", "description", "symbol", "image"])]
        params_file: Option<PathBuf>,
        #[arg(short = 'w', long, default_value_t = 0, allow_hyphen_values = true)]
        workchain: i8,
    },
    /// Download the network config and list its liteservers
    FetchConfig {
        /// Overrides the network from the config file
        #[arg(short = 'n', long)]
        network: Option<Network>,
    },
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct ParamsArgs {
    #[arg(long, default_value = "")]
    pub name: String,
    #[arg(long, default_value = "")]
    pub description: String,
    #[arg(long, default_value = "")]
    pub symbol: String,
    #[arg(long, default_value = "")]
    pub image: String,
}

impl From<&ParamsArgs> for JettonParams {
    fn from(args: &ParamsArgs) -> Self {
        JettonParams {
            name: args.name.clone(),
            description: args.description.clone(),
            symbol: args.symbol.clone(),
            image: args.image.clone(),
        }
    }
}

fn print_cell(label: &str, cell: &Arc<Cell>) -> Result<()> {
    println!("{label} hash:   {}", cell.hash_hex());
    println!("{label} hex:    {}", boc_to_hex(cell, false)?);
    println!("{label} base64: {}", boc_to_base64(cell, true)?);
    Ok(())
}

fn parse_address(text: &str) -> Result<Address> {
    Address::from_str(text).with_context(|| format!("invalid address {text}"))
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Execute the command
    pub async fn execute(&self) -> Result<()> {
        let config = AppConfig::load(self.config.as_deref())?;

        match &self.command {
            Commands::Address { address } => self.execute_address(address, config.network),
            Commands::MintPayload {
                amount,
                decimals,
                receiver,
            } => self.execute_mint_payload(amount, *decimals, receiver),
            Commands::Comment { text } => print_cell("comment", &build_text_comment(text)?),
            Commands::JettonContent { params, uri } => {
                let cell = match uri {
                    Some(uri) => JettonContent::OffChain { uri: uri.clone() }.to_cell()?,
                    None => build_jetton_content(
                        &params.name,
                        &params.description,
                        &params.symbol,
                        &params.image,
                    )?,
                };
                print_cell("content", &cell)
            }
            Commands::DeployData {
                owner,
                max_supply,
                params,
                params_file,
                workchain,
            } => self.execute_deploy_data(
                owner,
                max_supply,
                params,
                params_file.as_deref(),
                *workchain,
                config.network,
            ),
            Commands::FetchConfig { network } => {
                self.execute_fetch_config(network.unwrap_or(config.network))
                    .await
            }
        }
    }

    fn execute_address(&self, text: &str, network: Network) -> Result<()> {
        let address = parse_address(text)?.with_test_only(network.is_testnet());
        println!("raw:             {}", address.to_hex());
        println!(
            "bounceable:      {}",
            address.to_formatted(true, true, true, address.is_test_only)
        );
        println!(
            "non-bounceable:  {}",
            address.to_formatted(true, true, false, address.is_test_only)
        );
        Ok(())
    }

    fn execute_mint_payload(&self, amount: &str, decimals: u32, receiver: &str) -> Result<()> {
        let units = Coins::from_decimal(amount, decimals)
            .with_context(|| format!("invalid amount {amount}"))?;
        let receiver = parse_address(receiver)?;
        log::info!("minting {} units to {}", units.nano(), receiver);

        let cell = build_mint_payload(&BigInt::from(units.nano()), &receiver)?;
        print_cell("mint", &cell)
    }

    fn execute_deploy_data(
        &self,
        owner: &str,
        max_supply: &str,
        params: &ParamsArgs,
        params_file: Option<&std::path::Path>,
        workchain: i8,
        network: Network,
    ) -> Result<()> {
        let owner = parse_address(owner)?;
        let max_supply = BigInt::from_str(max_supply)
            .with_context(|| format!("invalid max supply {max_supply}"))?;
        let params: JettonParams = match params_file {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("cannot read {}", path.display()))?;
                serde_json::from_str(&json)
                    .with_context(|| format!("cannot parse {}", path.display()))?
            }
            None => params.into(),
        };

        let deployment = prepare_jetton_deployment(&owner, &max_supply, &params, workchain)?;
        let address = deployment.address.with_test_only(network.is_testnet());
        print_cell("data", &deployment.state_init.data)?;
        print_cell("state_init", &deployment.state_init.to_cell()?)?;
        println!("master address: {address}");
        Ok(())
    }

    async fn execute_fetch_config(&self, network: Network) -> Result<()> {
        let url = network.config_url();
        let started = Instant::now();
        let config = tokio::task::spawn_blocking(move || download_config(url))
            .await
            .map_err(|e| LedgerError::Connection(e.to_string()))??;
        log::info!("⏱️  fetch config: {:.3}s", started.elapsed().as_secs_f64());

        for (i, server) in config.liteservers.iter().enumerate() {
            let key: [u8; 32] = server.id.clone().into();
            println!("#{i} {} {}", server.socket_addr(), hex::encode(key));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_parse_deploy_data_args() {
        let cli = Cli::try_parse_from([
            "tonjetton-rs",
            "deploy-data",
            "--owner",
            "UQDSLbwk6S37jKAqmHrNg6OHo6xBzEgm-FLALjNdQui92Ivo",
            "--max-supply",
            "21000000",
            "--name",
            "jetton of BTC ",
            "--symbol",
            "WBTC",
            "-w",
            "-1",
        ])
        .unwrap();
        match cli.command {
            Commands::DeployData {
                params, workchain, ..
            } => {
                assert_eq!(params.symbol, "WBTC");
                assert_eq!(params.description, "");
                assert_eq!(workchain, -1);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_params_file_conflicts_with_inline_params() {
        let parsed = Cli::try_parse_from([
            "tonjetton-rs",
            "deploy-data",
            "--owner",
            "x",
            "--max-supply",
            "1",
            "--name",
            "a",
            "--params-file",
            "p.json",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_fetch_config_network_arg() {
        let cli = Cli::try_parse_from(["tonjetton-rs", "fetch-config", "-n", "testnet"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::FetchConfig {
                network: Some(Network::Testnet)
            }
        ));
    }

    #[tokio::test]
    async fn test_offline_commands_run() {
        for args in [
            vec!["tonjetton-rs", "comment", "Mint: 100"],
            vec![
                "tonjetton-rs",
                "mint-payload",
                "-a",
                "100",
                "-r",
                "EQBGhqLAZseEqRXz4ByFPTGV7SVMlI4hrbs-Sps_Xzx01x8G",
            ],
            vec![
                "tonjetton-rs",
                "address",
                "0:0000000000000000000000000000000000000000000000000000000000000000",
            ],
            vec![
                "tonjetton-rs",
                "jetton-content",
                "--uri",
                "https://example.com/jetton.json",
            ],
        ] {
            let cli = Cli::try_parse_from(args).unwrap();
            assert_ok!(cli.execute().await);
        }
    }

    #[tokio::test]
    async fn test_bad_address_is_reported() {
        let cli = Cli::try_parse_from(["tonjetton-rs", "address", "not-an-address"]).unwrap();
        let err = assert_err!(cli.execute().await);
        assert!(err.to_string().contains("not-an-address"));
    }
}
