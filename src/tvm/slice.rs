//! Slice implementation for reading data from cells
//!
//! A Slice provides a way to read data from a Cell sequentially,
//! tracking the current position in both bits and references.

use crate::tvm::address::Address;
use crate::tvm::cell::Cell;
use crate::tvm::error::{EncodingError, Result};
use num_bigint::{BigInt, BigUint};
use num_traits::One;
use std::sync::Arc;

/// A slice for reading data from a cell
#[derive(Debug, Clone)]
pub struct Slice {
    /// The cell being read
    cell: Arc<Cell>,
    /// Current bit position in the cell
    bit_pos: usize,
    /// Current reference position
    ref_pos: usize,
}

impl Slice {
    /// Creates a new slice from a cell
    pub fn new(cell: Arc<Cell>) -> Self {
        Self {
            cell,
            bit_pos: 0,
            ref_pos: 0,
        }
    }

    /// Returns the number of remaining bits
    pub fn remaining_bits(&self) -> usize {
        self.cell.bit_len() - self.bit_pos
    }

    /// Returns the number of remaining references
    pub fn remaining_refs(&self) -> usize {
        self.cell.reference_count() - self.ref_pos
    }

    /// Checks if there are any remaining bits or references
    pub fn is_empty(&self) -> bool {
        self.remaining_bits() == 0 && self.remaining_refs() == 0
    }

    fn ensure_bits(&self, n: usize) -> Result<()> {
        if n > self.remaining_bits() {
            return Err(EncodingError::BitUnderflow {
                requested: n,
                available: self.remaining_bits(),
            });
        }
        Ok(())
    }

    /// Loads a single bit
    pub fn load_bit(&mut self) -> Result<bool> {
        self.ensure_bits(1)?;

        let byte = self.cell.data()[self.bit_pos / 8];
        let bit = (byte >> (7 - self.bit_pos % 8)) & 1;
        self.bit_pos += 1;

        Ok(bit == 1)
    }

    /// Loads `n` bits, returned left-aligned in `ceil(n / 8)` bytes
    pub fn load_bits(&mut self, n: usize) -> Result<Vec<u8>> {
        self.ensure_bits(n)?;

        if self.bit_pos % 8 == 0 {
            let start = self.bit_pos / 8;
            let mut result = self.cell.data()[start..start + n.div_ceil(8)].to_vec();
            if n % 8 != 0 {
                let last = result.len() - 1;
                result[last] &= 0xFFu8 << (8 - n % 8);
            }
            self.bit_pos += n;
            return Ok(result);
        }

        let mut result = vec![0u8; n.div_ceil(8)];
        for i in 0..n {
            if self.load_bit()? {
                result[i / 8] |= 1 << (7 - i % 8);
            }
        }

        Ok(result)
    }

    /// Loads a byte (8 bits)
    pub fn load_byte(&mut self) -> Result<u8> {
        Ok(self.load_uint(8)? as u8)
    }

    /// Loads multiple bytes
    pub fn load_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        self.load_bits(n * 8)
    }

    /// Loads a u16 value (16 bits, big-endian)
    pub fn load_u16(&mut self) -> Result<u16> {
        Ok(self.load_uint(16)? as u16)
    }

    /// Loads a u32 value (32 bits, big-endian)
    pub fn load_u32(&mut self) -> Result<u32> {
        Ok(self.load_uint(32)? as u32)
    }

    /// Loads a u64 value (64 bits, big-endian)
    pub fn load_u64(&mut self) -> Result<u64> {
        self.load_uint(64)
    }

    /// Loads a uint with a specific number of bits
    pub fn load_uint(&mut self, bits: usize) -> Result<u64> {
        if bits > 64 {
            return Err(EncodingError::ValueOutOfRange {
                value: format!("uint{bits}"),
                bits: 64,
            });
        }
        if bits == 0 {
            return Ok(0);
        }

        let bytes = self.load_bits(bits)?;
        let mut result = 0u64;
        for &byte in &bytes {
            result = (result << 8) | byte as u64;
        }
        // Drop the alignment padding of the last byte
        Ok(result >> (bytes.len() * 8 - bits))
    }

    /// Loads a signed integer with a specific number of bits
    pub fn load_int(&mut self, bits: usize) -> Result<i64> {
        if bits == 0 {
            return Ok(0);
        }
        let unsigned = self.load_uint(bits)?;
        if bits == 64 {
            return Ok(unsigned as i64);
        }

        let sign_bit = 1u64 << (bits - 1);
        if unsigned & sign_bit != 0 {
            Ok((unsigned | (!0u64 << bits)) as i64)
        } else {
            Ok(unsigned as i64)
        }
    }

    /// Loads an arbitrary-precision unsigned integer
    pub fn load_uint_big(&mut self, bits: usize) -> Result<BigUint> {
        if bits == 0 {
            return Ok(BigUint::default());
        }
        let bytes = self.load_bits(bits)?;
        Ok(BigUint::from_bytes_be(&bytes) >> (bytes.len() * 8 - bits))
    }

    /// Loads an arbitrary-precision two's complement integer, e.g. `int257`
    pub fn load_int_big(&mut self, bits: usize) -> Result<BigInt> {
        if bits == 0 {
            return Ok(BigInt::default());
        }
        let unsigned = BigInt::from(self.load_uint_big(bits)?);
        let half = BigInt::one() << (bits - 1);
        if unsigned >= half {
            Ok(unsigned - (BigInt::one() << bits))
        } else {
            Ok(unsigned)
        }
    }

    /// Loads a reference to another cell
    pub fn load_reference(&mut self) -> Result<Arc<Cell>> {
        let reference = self
            .cell
            .reference(self.ref_pos)
            .ok_or(EncodingError::RefUnderflow)?
            .clone();

        self.ref_pos += 1;
        Ok(reference)
    }

    /// Loads an optional reference (Maybe ^Cell)
    pub fn load_maybe_ref(&mut self) -> Result<Option<Arc<Cell>>> {
        if self.load_bit()? {
            Ok(Some(self.load_reference()?))
        } else {
            Ok(None)
        }
    }

    /// Skips a number of bits
    pub fn skip_bits(&mut self, n: usize) -> Result<()> {
        self.ensure_bits(n)?;
        self.bit_pos += n;
        Ok(())
    }

    /// Gets the underlying cell
    pub fn cell(&self) -> &Arc<Cell> {
        &self.cell
    }

    /// Loads all remaining references
    pub fn load_remaining_refs(&mut self) -> Result<Vec<Arc<Cell>>> {
        let mut refs = Vec::with_capacity(self.remaining_refs());
        while self.remaining_refs() > 0 {
            refs.push(self.load_reference()?);
        }
        Ok(refs)
    }

    /// Consumes the unread bits and references into a standalone cell
    pub fn load_remainder(&mut self) -> Result<Arc<Cell>> {
        let bit_len = self.remaining_bits();
        let data = self.load_bits(bit_len)?;
        let refs = self.load_remaining_refs()?;
        Ok(Arc::new(Cell::with_references(data, bit_len, refs)?))
    }

    /// Loads coins (VarUInteger 16)
    pub fn load_coins(&mut self) -> Result<u128> {
        let len = self.load_uint(4)? as usize;
        if len == 0 {
            return Ok(0);
        }

        let mut result = 0u128;
        for byte in self.load_bytes(len)? {
            result = (result << 8) | byte as u128;
        }
        Ok(result)
    }

    /// Loads a `MsgAddressInt`; `addr_none` yields `None`
    pub fn load_address(&mut self) -> Result<Option<Address>> {
        let tag = self.load_uint(2)?;
        match tag {
            0b00 => Ok(None),
            0b10 => {
                if self.load_bit()? {
                    return Err(EncodingError::InvalidAddress(
                        "anycast addresses are not supported".to_string(),
                    ));
                }
                let workchain = self.load_int(8)? as i8;
                let mut hash_part = [0u8; 32];
                hash_part.copy_from_slice(&self.load_bytes(32)?);
                Ok(Some(Address::new(workchain, hash_part)))
            }
            other => Err(EncodingError::UnexpectedTag {
                what: "MsgAddressInt",
                tag: other,
            }),
        }
    }

    /// Reads snake-encoded bytes: the rest of this cell, then each first reference in turn
    pub fn load_snake_bytes(&mut self) -> Result<Vec<u8>> {
        if self.remaining_bits() % 8 != 0 {
            return Err(EncodingError::InsufficientData(self.remaining_bits()));
        }

        let mut result = self.load_bytes(self.remaining_bits() / 8)?;
        let mut next = if self.remaining_refs() > 0 {
            Some(self.load_reference()?)
        } else {
            None
        };

        while let Some(cell) = next {
            let mut part = Slice::new(cell);
            if part.remaining_bits() % 8 != 0 {
                return Err(EncodingError::InsufficientData(part.remaining_bits()));
            }
            result.extend(part.load_bytes(part.remaining_bits() / 8)?);
            next = if part.remaining_refs() > 0 {
                Some(part.load_reference()?)
            } else {
                None
            };
        }

        Ok(result)
    }

    /// Reads a snake-encoded UTF-8 string
    pub fn load_snake_string(&mut self) -> Result<String> {
        String::from_utf8(self.load_snake_bytes()?).map_err(|_| EncodingError::InvalidUtf8)
    }
}

impl From<Arc<Cell>> for Slice {
    fn from(cell: Arc<Cell>) -> Self {
        Self::new(cell)
    }
}
