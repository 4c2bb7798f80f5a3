//! TON global network config: the liteservers a ledger client connects to.

use crate::ledger::LedgerError;
use serde::{Deserialize, Serialize};
use serde_with::base64::Base64;
use serde_with::serde_as;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::ops::{Deref, DerefMut};
use std::str::FromStr;

pub const MAINNET_CONFIG_URL: &str = "https://ton.org/global.config.json";
pub const TESTNET_CONFIG_URL: &str = "https://ton.org/testnet-global.config.json";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

impl Network {
    pub fn config_url(&self) -> &'static str {
        match self {
            Network::Mainnet => MAINNET_CONFIG_URL,
            Network::Testnet => TESTNET_CONFIG_URL,
        }
    }

    /// Whether addresses should carry the test-only flag
    pub fn is_testnet(&self) -> bool {
        matches!(self, Network::Testnet)
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            other => Err(format!("unknown network: {other}")),
        }
    }
}

/// IPv4 address stored as a signed 32-bit integer in the config
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub struct LiteServerAddress(pub Ipv4Addr);

impl From<i32> for LiteServerAddress {
    fn from(value: i32) -> Self {
        LiteServerAddress(Ipv4Addr::from(value as u32))
    }
}

impl From<LiteServerAddress> for i32 {
    fn from(address: LiteServerAddress) -> i32 {
        u32::from(address.0) as i32
    }
}

impl Deref for LiteServerAddress {
    type Target = Ipv4Addr;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for LiteServerAddress {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "@type")]
pub enum ConfigPublicKey {
    #[serde(rename = "pub.ed25519")]
    Ed25519 {
        #[serde_as(as = "Base64")]
        key: [u8; 32],
    },
}

impl From<ConfigPublicKey> for [u8; 32] {
    fn from(key: ConfigPublicKey) -> [u8; 32] {
        match key {
            ConfigPublicKey::Ed25519 { key } => key,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigLiteServer {
    pub ip: LiteServerAddress,
    pub port: u16,
    pub id: ConfigPublicKey,
}

impl ConfigLiteServer {
    pub fn socket_addr(&self) -> SocketAddrV4 {
        SocketAddrV4::new(*self.ip, self.port)
    }
}

/// Parsed global config; sections other than the liteservers are kept verbatim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigGlobal {
    pub liteservers: Vec<ConfigLiteServer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator: Option<serde_json::Value>,
}

impl FromStr for ConfigGlobal {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(s)
    }
}

/// Downloads and parses a global config (blocking)
pub fn download_config(url: &str) -> Result<ConfigGlobal, LedgerError> {
    let fetch_error = |reason: String| LedgerError::ConfigFetch {
        url: url.to_string(),
        reason,
    };

    log::debug!("downloading network config from {url}");
    let mut response = ureq::get(url)
        .call()
        .map_err(|e| fetch_error(e.to_string()))?;
    if response.status() != 200 {
        return Err(fetch_error(format!("status {}", response.status())));
    }
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(|e| fetch_error(e.to_string()))?;
    let config = ConfigGlobal::from_str(&body).map_err(|e| fetch_error(e.to_string()))?;
    log::info!("network config from {url}: {} liteservers", config.liteservers.len());
    Ok(config)
}
