//! TEP-64 token metadata.
//!
//! On-chain content is `0x00` followed by a `HashmapE 256 ^Cell` keyed by the
//! SHA-256 of each attribute name. Every value is a snake cell starting with a
//! `0x00` byte. Off-chain content is `0x01` followed by a snake-encoded URI.

use crate::tvm::error::{EncodingError, Result};
use crate::tvm::{Builder, Cell, Dict, Slice};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const ONCHAIN_CONTENT_PREFIX: u8 = 0x00;
pub const OFFCHAIN_CONTENT_PREFIX: u8 = 0x01;
const SNAKE_DATA_PREFIX: u8 = 0x00;
const KEY_BITS: usize = 256;

/// Dictionary key of a metadata attribute
pub fn attribute_key(name: &str) -> [u8; 32] {
    Sha256::digest(name.as_bytes()).into()
}

/// Attribute set of an on-chain (or semi-chain, when `uri` is set) jetton
///
/// Empty strings are omitted from the dictionary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnChainContent {
    pub name: String,
    pub description: String,
    pub symbol: String,
    pub image: String,
    pub decimals: Option<u8>,
    /// Off-chain JSON that completes the on-chain attributes
    pub uri: Option<String>,
    #[serde(skip)]
    pub image_data: Option<Vec<u8>>,
    /// Additional attributes keyed by name
    pub extra: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JettonContent {
    OnChain(OnChainContent),
    OffChain { uri: String },
}

fn snake_value(data: &[u8]) -> Result<Arc<Cell>> {
    let mut snake = Builder::new();
    snake.store_byte(SNAKE_DATA_PREFIX)?;
    snake.store_snake_bytes(data)?;

    let mut value = Builder::new();
    value.store_ref(snake.build()?)?;
    value.build()
}

fn read_snake_value(value: &Arc<Cell>) -> Result<Vec<u8>> {
    let mut slice = Slice::new(value.clone());
    let mut snake = Slice::new(slice.load_reference()?);
    let prefix = snake.load_byte()?;
    if prefix != SNAKE_DATA_PREFIX {
        return Err(EncodingError::UnexpectedTag {
            what: "snake content value",
            tag: prefix as u64,
        });
    }
    snake.load_snake_bytes()
}

impl OnChainContent {
    fn attributes(&self) -> Vec<(&str, Vec<u8>)> {
        let mut attrs: Vec<(&str, Vec<u8>)> = Vec::new();
        let basic = [
            ("name", &self.name),
            ("description", &self.description),
            ("symbol", &self.symbol),
            ("image", &self.image),
        ];
        for (name, value) in basic {
            if !value.is_empty() {
                attrs.push((name, value.as_bytes().to_vec()));
            }
        }
        if let Some(uri) = self.uri.as_ref().filter(|uri| !uri.is_empty()) {
            attrs.push(("uri", uri.as_bytes().to_vec()));
        }
        if let Some(decimals) = self.decimals {
            attrs.push(("decimals", decimals.to_string().into_bytes()));
        }
        if let Some(image_data) = &self.image_data {
            attrs.push(("image_data", image_data.clone()));
        }
        for (name, value) in &self.extra {
            if !value.is_empty() {
                attrs.push((name.as_str(), value.as_bytes().to_vec()));
            }
        }
        attrs
    }

    /// The attribute dictionary, keyed by `sha256(name)`
    pub fn to_dict(&self) -> Result<Dict> {
        let mut dict = Dict::new(KEY_BITS);
        for (name, value) in self.attributes() {
            dict.set(&attribute_key(name), snake_value(&value)?)?;
        }
        Ok(dict)
    }

    /// Reads the well-known attributes; keys with unknown names are skipped
    pub fn from_dict(dict: &Dict) -> Result<Self> {
        let text = |name: &str| -> Result<Option<String>> {
            match dict.get(&attribute_key(name)) {
                Some(value) => String::from_utf8(read_snake_value(value)?)
                    .map(Some)
                    .map_err(|_| EncodingError::InvalidUtf8),
                None => Ok(None),
            }
        };

        let decimals = match text("decimals")? {
            Some(s) => Some(s.trim().parse::<u8>().map_err(|_| {
                EncodingError::Dict(format!("decimals attribute is not a number: {s}"))
            })?),
            None => None,
        };
        let image_data = match dict.get(&attribute_key("image_data")) {
            Some(value) => Some(read_snake_value(value)?),
            None => None,
        };

        Ok(Self {
            name: text("name")?.unwrap_or_default(),
            description: text("description")?.unwrap_or_default(),
            symbol: text("symbol")?.unwrap_or_default(),
            image: text("image")?.unwrap_or_default(),
            decimals,
            uri: text("uri")?,
            image_data,
            extra: BTreeMap::new(),
        })
    }
}

impl JettonContent {
    pub fn to_cell(&self) -> Result<Arc<Cell>> {
        let mut builder = Builder::new();
        match self {
            JettonContent::OnChain(content) => {
                builder.store_byte(ONCHAIN_CONTENT_PREFIX)?;
                builder.store_dictionary(&content.to_dict()?)?;
            }
            JettonContent::OffChain { uri } => {
                builder.store_byte(OFFCHAIN_CONTENT_PREFIX)?;
                builder.store_snake_string(uri, false)?;
            }
        }
        builder.build()
    }

    pub fn from_cell(cell: &Arc<Cell>) -> Result<Self> {
        let mut slice = Slice::new(cell.clone());
        match slice.load_byte()? {
            ONCHAIN_CONTENT_PREFIX => {
                let dict = slice.load_dict(KEY_BITS)?;
                Ok(JettonContent::OnChain(OnChainContent::from_dict(&dict)?))
            }
            OFFCHAIN_CONTENT_PREFIX => Ok(JettonContent::OffChain {
                uri: slice.load_snake_string()?,
            }),
            other => Err(EncodingError::UnexpectedTag {
                what: "jetton content",
                tag: other as u64,
            }),
        }
    }

    /// Decimals declared on-chain, or the TEP-64 default of 9
    pub fn decimals(&self) -> u8 {
        match self {
            JettonContent::OnChain(OnChainContent {
                decimals: Some(decimals),
                ..
            }) => *decimals,
            _ => 9,
        }
    }
}

/// Builds on-chain metadata with the four basic attributes
pub fn build_jetton_content(
    name: &str,
    description: &str,
    symbol: &str,
    image: &str,
) -> Result<Arc<Cell>> {
    JettonContent::OnChain(OnChainContent {
        name: name.to_string(),
        description: description.to_string(),
        symbol: symbol.to_string(),
        image: image.to_string(),
        ..Default::default()
    })
    .to_cell()
}
