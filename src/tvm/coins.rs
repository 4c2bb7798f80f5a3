//! Nano-denominated coin amounts.

use crate::tvm::error::{EncodingError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Decimal places of the native coin
pub const TON_DECIMALS: u32 = 9;

/// Largest amount a `VarUInteger 16` can carry
pub const MAX_COINS: u128 = (1u128 << 120) - 1;

/// An amount in the smallest unit, validated to fit in `VarUInteger 16`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u128", into = "u128")]
pub struct Coins(u128);

impl Coins {
    pub const ZERO: Coins = Coins(0);

    pub fn from_nano(nano: u128) -> Result<Self> {
        if nano > MAX_COINS {
            return Err(EncodingError::InvalidCoins(format!(
                "{nano} exceeds VarUInteger 16"
            )));
        }
        Ok(Self(nano))
    }

    /// Parses a decimal TON amount such as `"1.15"` or `"0.02"`
    pub fn from_ton(amount: &str) -> Result<Self> {
        Self::from_decimal(amount, TON_DECIMALS)
    }

    /// Parses a decimal amount with the given number of fractional digits
    pub fn from_decimal(amount: &str, decimals: u32) -> Result<Self> {
        let invalid = || EncodingError::InvalidCoins(amount.to_string());
        let amount = amount.trim();

        let (whole, fraction) = amount.split_once('.').unwrap_or((amount, ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if fraction.len() > decimals as usize {
            return Err(invalid());
        }
        let digits_only = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if !digits_only(whole) || !digits_only(fraction) {
            return Err(invalid());
        }

        let scale = 10u128.checked_pow(decimals).ok_or_else(invalid)?;
        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let fraction: u128 = if fraction.is_empty() {
            0
        } else {
            let padded = format!("{fraction:0<width$}", width = decimals as usize);
            padded.parse().map_err(|_| invalid())?
        };

        let nano = whole
            .checked_mul(scale)
            .and_then(|v| v.checked_add(fraction))
            .ok_or_else(invalid)?;
        Self::from_nano(nano)
    }

    pub fn nano(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Renders the amount with `decimals` fractional digits, trailing zeros trimmed
    pub fn to_decimal_string(&self, decimals: u32) -> String {
        format_units(self.0, decimals)
    }
}

/// Renders an integer amount of smallest units as a trimmed decimal string
pub fn format_units(value: u128, decimals: u32) -> String {
    if decimals == 0 {
        return value.to_string();
    }
    // any u128 is below 10^39, so wider scales leave the whole part at zero
    let (whole, fraction) = match 10u128.checked_pow(decimals) {
        Some(scale) => (value / scale, value % scale),
        None => (0, value),
    };
    if fraction == 0 {
        return whole.to_string();
    }
    let fraction = format!("{fraction:0>width$}", width = decimals as usize);
    format!("{whole}.{}", fraction.trim_end_matches('0'))
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_decimal_string(TON_DECIMALS))
    }
}

impl FromStr for Coins {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_ton(s)
    }
}

impl TryFrom<u128> for Coins {
    type Error = EncodingError;

    fn try_from(nano: u128) -> Result<Self> {
        Self::from_nano(nano)
    }
}

impl From<Coins> for u128 {
    fn from(coins: Coins) -> u128 {
        coins.0
    }
}
