//! TON Address implementation
//!
//! An internal address is a workchain id plus a 256-bit account hash. The
//! user-friendly form is 36 bytes, `flags | workchain | hash | crc16`, encoded
//! as url-safe base64. Flags and test-only markers survive a parse/format round trip.

use crate::crc::CRC16;
use crate::tvm::error::{EncodingError, Result};
use base64::Engine;
use std::fmt;
use std::str::FromStr;

const TAG_BOUNCEABLE: u8 = 0x11;
const TAG_NON_BOUNCEABLE: u8 = 0x51;
const FLAG_TEST_ONLY: u8 = 0x80;

/// Represents a TON blockchain address
///
/// Equality and hashing include the presentation flags, so `EQ...` and `UQ...`
/// forms of one account compare unequal. Use [`Address::same_account`] to
/// compare accounts; addresses decoded from cells always carry the default
/// flags (bounceable, not test-only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    /// Workchain ID (-1 for masterchain, 0 for basechain)
    pub workchain: i8,
    /// 32-byte hash part of the address
    pub hash_part: [u8; 32],
    /// Whether the address is bounceable
    pub is_bounceable: bool,
    /// Whether this is a test-only address
    pub is_test_only: bool,
}

impl Address {
    /// Creates a new bounceable address from workchain and hash part
    pub fn new(workchain: i8, hash_part: [u8; 32]) -> Self {
        Self {
            workchain,
            hash_part,
            is_bounceable: true,
            is_test_only: false,
        }
    }

    /// Parses address from raw format: "workchain:hash"
    pub fn from_hex(address: &str) -> Result<Self> {
        let invalid = |reason: &str| EncodingError::InvalidAddress(format!("{address}: {reason}"));

        let (workchain, hash_hex) = address
            .split_once(':')
            .ok_or_else(|| invalid("expected workchain:hash"))?;

        let workchain = workchain
            .parse::<i8>()
            .map_err(|_| invalid("bad workchain"))?;

        if hash_hex.len() != 64 {
            return Err(invalid("hash part must be 64 hex characters"));
        }

        let mut hash_part = [0u8; 32];
        hex::decode_to_slice(hash_hex, &mut hash_part).map_err(|_| invalid("bad hex"))?;

        Ok(Self::new(workchain, hash_part))
    }

    /// Parses address from base64 user-friendly format (url-safe or standard alphabet)
    pub fn from_base64(address: &str) -> Result<Self> {
        let invalid = |reason: &str| EncodingError::InvalidAddress(format!("{address}: {reason}"));

        let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(address.trim_end_matches('='))
            .or_else(|_| base64::engine::general_purpose::STANDARD.decode(address))
            .map_err(|_| invalid("not base64"))?;

        if decoded.len() != 36 {
            return Err(invalid("expected 36 bytes"));
        }

        let actual_crc = CRC16.checksum(&decoded[..34]);
        let expected_crc = u16::from_be_bytes([decoded[34], decoded[35]]);
        if expected_crc != actual_crc {
            return Err(invalid("checksum mismatch"));
        }

        let tag = decoded[0];
        let is_test_only = tag & FLAG_TEST_ONLY != 0;
        let is_bounceable = match tag & !FLAG_TEST_ONLY {
            TAG_BOUNCEABLE => true,
            TAG_NON_BOUNCEABLE => false,
            _ => return Err(invalid("unknown tag")),
        };

        let mut hash_part = [0u8; 32];
        hash_part.copy_from_slice(&decoded[2..34]);

        Ok(Self {
            workchain: decoded[1] as i8,
            hash_part,
            is_bounceable,
            is_test_only,
        })
    }

    /// Formats the address with explicit flags
    pub fn to_formatted(
        &self,
        user_friendly: bool,
        url_safe: bool,
        bounceable: bool,
        test_only: bool,
    ) -> String {
        if !user_friendly {
            return self.to_hex();
        }

        let mut tag = if bounceable {
            TAG_BOUNCEABLE
        } else {
            TAG_NON_BOUNCEABLE
        };
        if test_only {
            tag |= FLAG_TEST_ONLY;
        }

        let mut data = Vec::with_capacity(36);
        data.push(tag);
        data.push(self.workchain as u8);
        data.extend_from_slice(&self.hash_part);
        let crc = CRC16.checksum(&data);
        data.extend_from_slice(&crc.to_be_bytes());

        if url_safe {
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&data)
        } else {
            base64::engine::general_purpose::STANDARD.encode(&data)
        }
    }

    /// Converts to raw format (workchain:hash)
    pub fn to_hex(&self) -> String {
        format!("{}:{}", self.workchain, hex::encode(self.hash_part))
    }

    /// Converts to user-friendly base64 format using the address's own flags
    pub fn to_base64(&self) -> String {
        self.to_formatted(true, true, self.is_bounceable, self.is_test_only)
    }

    /// Returns a copy with the bounceable flag replaced
    pub fn with_bounceable(mut self, bounceable: bool) -> Self {
        self.is_bounceable = bounceable;
        self
    }

    /// Returns a copy with the test-only flag replaced
    pub fn with_test_only(mut self, test_only: bool) -> Self {
        self.is_test_only = test_only;
        self
    }

    /// Same account, ignoring the presentation flags
    pub fn same_account(&self, other: &Address) -> bool {
        self.workchain == other.workchain && self.hash_part == other.hash_part
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl FromStr for Address {
    type Err = EncodingError;

    /// Accepts both the raw `wc:hex` and the user-friendly base64 form
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.contains(':') {
            Self::from_hex(s)
        } else {
            Self::from_base64(s)
        }
    }
}
