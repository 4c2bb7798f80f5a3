//! Enhanced Builder for constructing cells with convenient methods
//!
//! This module provides a high-level builder (`Builder`) that wraps the low-level
//! `CellBuilder` with TON-specific methods: wide integers, addresses, coins,
//! snake-encoded strings and dictionaries.
//!
//! # Examples
//!
//! ```rust
//! use tonjetton_rs::tvm::{Address, Builder};
//!
//! let mut builder = Builder::new();
//!
//! let addr = Address::new(0, [0u8; 32]);
//! builder.store_address(Some(&addr)).unwrap();
//! builder.store_coins(1_000_000_000).unwrap();
//! builder.store_snake_string("Hello, TON!", false).unwrap();
//!
//! let cell = builder.build().unwrap();
//! assert_eq!(cell.bit_len(), 267 + 4 + 32 + 88);
//! ```

use crate::tvm::address::Address;
use crate::tvm::cell::{Cell, CellBuilder, MAX_CELL_REFS};
use crate::tvm::error::{EncodingError, Result};
use crate::tvm::slice::Slice;
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::One;
use std::sync::Arc;

/// Number of data bytes a snake continuation cell carries
pub const SNAKE_CHUNK_BYTES: usize = 127;

/// Extended builder with convenience methods
#[derive(Debug, Clone, Default)]
pub struct Builder {
    inner: CellBuilder,
}

impl Builder {
    /// Creates a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of bits used
    pub fn bit_len(&self) -> usize {
        self.inner.bit_len()
    }

    /// Returns the number of available bits
    pub fn available_bits(&self) -> usize {
        self.inner.available_bits()
    }

    /// Returns the number of whole bytes that still fit
    pub fn available_bytes(&self) -> usize {
        self.available_bits() / 8
    }

    /// Returns the number of references
    pub fn ref_count(&self) -> usize {
        self.inner.ref_count()
    }

    /// Returns the number of available references
    pub fn available_refs(&self) -> usize {
        self.inner.available_refs()
    }

    /// Stores a single bit
    pub fn store_bit(&mut self, bit: bool) -> Result<&mut Self> {
        self.inner.store_bit(bit)?;
        Ok(self)
    }

    /// Stores the first `bit_len` bits of a byte slice
    pub fn store_bits(&mut self, bits: &[u8], bit_len: usize) -> Result<&mut Self> {
        self.inner.store_bits(bits, bit_len)?;
        Ok(self)
    }

    /// Stores a byte
    pub fn store_byte(&mut self, byte: u8) -> Result<&mut Self> {
        self.inner.store_byte(byte)?;
        Ok(self)
    }

    /// Stores multiple bytes
    pub fn store_bytes(&mut self, bytes: &[u8]) -> Result<&mut Self> {
        self.inner.store_bytes(bytes)?;
        Ok(self)
    }

    /// Stores a u32 value
    pub fn store_u32(&mut self, value: u32) -> Result<&mut Self> {
        self.inner.store_u32(value)?;
        Ok(self)
    }

    /// Stores a u64 value
    pub fn store_u64(&mut self, value: u64) -> Result<&mut Self> {
        self.inner.store_u64(value)?;
        Ok(self)
    }

    /// Stores an unsigned integer with specific bit length
    pub fn store_uint(&mut self, value: u64, bits: usize) -> Result<&mut Self> {
        self.inner.store_uint(value, bits)?;
        Ok(self)
    }

    /// Stores a two's complement signed integer with specific bit length
    pub fn store_int(&mut self, value: i64, bits: usize) -> Result<&mut Self> {
        let out_of_range = || EncodingError::ValueOutOfRange {
            value: value.to_string(),
            bits,
        };
        if bits == 0 || bits > 64 {
            return Err(out_of_range());
        }

        let half = 1i128 << (bits - 1);
        if (value as i128) < -half || (value as i128) >= half {
            return Err(out_of_range());
        }

        let mask = if bits == 64 {
            u64::MAX
        } else {
            (1u64 << bits) - 1
        };
        self.store_uint((value as u64) & mask, bits)
    }

    /// Stores an arbitrary-precision unsigned integer, e.g. `uint256`
    pub fn store_uint_big(&mut self, value: &BigUint, bits: usize) -> Result<&mut Self> {
        if value.bits() as usize > bits {
            return Err(EncodingError::ValueOutOfRange {
                value: value.to_string(),
                bits,
            });
        }
        if bits == 0 {
            return Ok(self);
        }

        let byte_len = bits.div_ceil(8);
        let aligned = value << (byte_len * 8 - bits);
        let raw = aligned.to_bytes_be();
        let mut buf = vec![0u8; byte_len];
        buf[byte_len - raw.len()..].copy_from_slice(&raw);

        self.store_bits(&buf, bits)
    }

    /// Stores an arbitrary-precision signed integer, e.g. `int257`
    pub fn store_int_big(&mut self, value: &BigInt, bits: usize) -> Result<&mut Self> {
        let out_of_range = || EncodingError::ValueOutOfRange {
            value: value.to_string(),
            bits,
        };
        if bits == 0 {
            return Err(out_of_range());
        }

        let half = BigInt::one() << (bits - 1);
        if *value < -&half || *value >= half {
            return Err(out_of_range());
        }

        let twos_complement = match value.sign() {
            Sign::Minus => (BigInt::one() << bits) + value,
            _ => value.clone(),
        };
        let magnitude = twos_complement.to_biguint().ok_or_else(out_of_range)?;

        self.store_uint_big(&magnitude, bits)
    }

    /// Stores a boolean value as a single bit
    pub fn store_bool(&mut self, value: bool) -> Result<&mut Self> {
        self.store_bit(value)
    }

    /// Stores a reference to another cell
    pub fn store_ref(&mut self, cell: Arc<Cell>) -> Result<&mut Self> {
        self.inner.store_reference(cell)?;
        Ok(self)
    }

    /// Stores an optional reference (Maybe ^Cell)
    pub fn store_maybe_ref(&mut self, cell: Option<Arc<Cell>>) -> Result<&mut Self> {
        match cell {
            Some(c) => {
                self.store_bit(true)?;
                self.store_ref(c)?;
            }
            None => {
                self.store_bit(false)?;
            }
        }
        Ok(self)
    }

    /// Appends the bits and references of a finished cell
    pub fn store_cell(&mut self, cell: &Arc<Cell>) -> Result<&mut Self> {
        self.append(cell.data(), cell.bit_len(), cell.references())
    }

    /// Appends the bits and references accumulated by another builder
    pub fn store_builder(&mut self, other: &Builder) -> Result<&mut Self> {
        self.append(other.inner.data(), other.bit_len(), other.inner.references())
    }

    /// Appends whatever is left unread in a slice
    pub fn store_slice(&mut self, slice: &Slice) -> Result<&mut Self> {
        let mut rest = slice.clone();
        let remaining_bits = rest.remaining_bits();
        let bits = rest.load_bits(remaining_bits)?;
        let refs = rest.load_remaining_refs()?;
        self.append(&bits, remaining_bits, &refs)
    }

    fn append(&mut self, data: &[u8], bit_len: usize, refs: &[Arc<Cell>]) -> Result<&mut Self> {
        if self.ref_count() + refs.len() > MAX_CELL_REFS {
            return Err(EncodingError::RefOverflow { max: MAX_CELL_REFS });
        }
        self.store_bits(data, bit_len)?;
        for reference in refs {
            self.store_ref(reference.clone())?;
        }
        Ok(self)
    }

    /// Stores coins (VarUInteger 16)
    pub fn store_coins(&mut self, amount: u128) -> Result<&mut Self> {
        if amount == 0 {
            return self.store_uint(0, 4);
        }

        let byte_len = (128 - amount.leading_zeros() as usize).div_ceil(8);
        if byte_len > 15 {
            return Err(EncodingError::InvalidCoins(format!(
                "{amount} does not fit in VarUInteger 16"
            )));
        }

        self.store_uint(byte_len as u64, 4)?;
        let bytes = amount.to_be_bytes();
        self.store_bytes(&bytes[16 - byte_len..])
    }

    /// Stores a string that must fit in the current cell
    pub fn store_string(&mut self, s: &str) -> Result<&mut Self> {
        self.store_bytes(s.as_bytes())
    }

    /// Stores a string using snake encoding, optionally preceded by a `0x00` prefix byte
    pub fn store_snake_string(&mut self, s: &str, with_prefix: bool) -> Result<&mut Self> {
        if with_prefix {
            self.store_byte(0x00)?;
        }
        self.store_snake_bytes(s.as_bytes())
    }

    /// Stores bytes using snake encoding
    ///
    /// Fills the remaining capacity of this cell, then chains the rest through
    /// single-reference continuation cells of up to 127 bytes each.
    pub fn store_snake_bytes(&mut self, bytes: &[u8]) -> Result<&mut Self> {
        let available = self.available_bytes();
        if bytes.len() <= available {
            return self.store_bytes(bytes);
        }
        if self.available_refs() == 0 {
            return Err(EncodingError::RefOverflow { max: MAX_CELL_REFS });
        }

        self.store_bytes(&bytes[..available])?;

        let mut tail: Option<Arc<Cell>> = None;
        for chunk in bytes[available..].chunks(SNAKE_CHUNK_BYTES).rev() {
            let mut next = Builder::new();
            next.store_bytes(chunk)?;
            if let Some(cell) = tail.take() {
                next.store_ref(cell)?;
            }
            tail = Some(next.build()?);
        }
        if let Some(cell) = tail {
            self.store_ref(cell)?;
        }

        Ok(self)
    }

    /// Stores a `MsgAddressInt` (`addr_std`) or `addr_none` for `None`
    pub fn store_address(&mut self, address: Option<&Address>) -> Result<&mut Self> {
        match address {
            None => {
                // addr_none$00
                self.store_uint(0b00, 2)?;
            }
            Some(addr) => {
                // addr_std$10 anycast:(Maybe Anycast) workchain_id:int8 address:bits256
                self.store_uint(0b10, 2)?;
                self.store_bit(false)?;
                self.store_int(addr.workchain as i64, 8)?;
                self.store_bytes(&addr.hash_part)?;
            }
        }
        Ok(self)
    }

    /// Stores a serialized dictionary root as `HashmapE` (Maybe ^Cell)
    pub fn store_dict(&mut self, dict: Option<Arc<Cell>>) -> Result<&mut Self> {
        self.store_maybe_ref(dict)
    }

    /// Builds the cell
    pub fn build(self) -> Result<Arc<Cell>> {
        self.inner.build()
    }

    /// Converts to a cell (alias for build)
    pub fn end_cell(self) -> Result<Arc<Cell>> {
        self.build()
    }

    /// Converts to a slice
    pub fn to_slice(self) -> Result<Slice> {
        Ok(Slice::new(self.build()?))
    }
}
