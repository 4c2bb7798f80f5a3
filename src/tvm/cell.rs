//! Cell implementation for TON blockchain
//!
//! A cell is a fundamental data structure in TON that can store up to 1023 bits
//! of data and maintain up to 4 references to other cells. Cells are immutable:
//! the representation hash and depth are computed once, when the cell is created.

use crate::tvm::error::{EncodingError, Result};
use sha2::{Digest, Sha256};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Maximum number of bits a cell can store
pub const MAX_CELL_BITS: usize = 1023;

/// Maximum number of references a cell can have
pub const MAX_CELL_REFS: usize = 4;

/// Represents an ordinary cell in the TON blockchain
#[derive(Clone)]
pub struct Cell {
    /// Cell data, `ceil(bit_len / 8)` bytes with unused trailing bits zeroed
    data: Vec<u8>,
    /// Number of bits in the cell (not necessarily a multiple of 8)
    bit_len: usize,
    references: Vec<Arc<Cell>>,
    hash: [u8; 32],
    depth: u16,
}

impl Cell {
    /// Creates a new empty cell
    pub fn new() -> Self {
        Self::finalize(Vec::new(), 0, Vec::new())
    }

    /// Creates a leaf cell with the given data and bit length
    pub fn with_data(data: Vec<u8>, bit_len: usize) -> Result<Self> {
        Self::with_references(data, bit_len, Vec::new())
    }

    /// Creates a cell with data and child references
    pub fn with_references(
        mut data: Vec<u8>,
        bit_len: usize,
        references: Vec<Arc<Cell>>,
    ) -> Result<Self> {
        if bit_len > MAX_CELL_BITS {
            return Err(EncodingError::BitOverflow {
                requested: bit_len,
                available: MAX_CELL_BITS,
            });
        }
        if references.len() > MAX_CELL_REFS {
            return Err(EncodingError::RefOverflow { max: MAX_CELL_REFS });
        }

        let required_bytes = bit_len.div_ceil(8);
        if data.len() < required_bytes {
            return Err(EncodingError::InsufficientData(bit_len));
        }
        data.truncate(required_bytes);
        if bit_len % 8 != 0 {
            let last = required_bytes - 1;
            data[last] &= 0xFFu8 << (8 - bit_len % 8);
        }

        Ok(Self::finalize(data, bit_len, references))
    }

    fn finalize(data: Vec<u8>, bit_len: usize, references: Vec<Arc<Cell>>) -> Self {
        let depth = references
            .iter()
            .map(|r| r.depth + 1)
            .max()
            .unwrap_or(0);

        let mut cell = Self {
            data,
            bit_len,
            references,
            hash: [0u8; 32],
            depth,
        };
        cell.hash = cell.compute_hash();
        cell
    }

    /// Returns the cell's data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the number of bits in the cell
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Returns the cell's references
    pub fn references(&self) -> &[Arc<Cell>] {
        &self.references
    }

    /// Computes the cell's descriptors (2 bytes)
    pub fn descriptors(&self) -> [u8; 2] {
        // Ordinary level-0 cells: d1 is just the reference count
        let refs_descriptor = self.references.len() as u8;
        // floor(b/8) + ceil(b/8)
        let bits_descriptor = (self.bit_len / 8 + self.bit_len.div_ceil(8)) as u8;

        [refs_descriptor, bits_descriptor]
    }

    /// Serializes the cell data, appending the completion tag to a partial last byte
    pub fn serialize_data(&self) -> Vec<u8> {
        let mut result = self.data.clone();

        if self.bit_len % 8 != 0 {
            let last_byte_idx = self.bit_len / 8;
            result[last_byte_idx] |= 1 << (7 - self.bit_len % 8);
        }

        result
    }

    /// Depth of the cell tree: 0 for a leaf, otherwise one more than the deepest child
    pub fn depth(&self) -> u16 {
        self.depth
    }

    /// Representation hash of the cell
    pub fn hash(&self) -> [u8; 32] {
        self.hash
    }

    /// Representation hash as a lowercase hex string
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }

    fn compute_hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();

        hasher.update(self.descriptors());
        hasher.update(self.serialize_data());

        for reference in &self.references {
            hasher.update(reference.depth().to_be_bytes());
        }
        for reference in &self.references {
            hasher.update(Cell::hash(reference));
        }

        hasher.finalize().into()
    }

    /// Returns the number of references
    pub fn reference_count(&self) -> usize {
        self.references.len()
    }

    /// Gets a reference by index
    pub fn reference(&self, index: usize) -> Option<&Arc<Cell>> {
        self.references.get(index)
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for Cell {}

impl Hash for Cell {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write(&self.hash);
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cell")
            .field("bits", &self.bit_len)
            .field("data", &hex::encode(&self.data))
            .field("refs", &self.references)
            .finish()
    }
}

/// Low-level builder for constructing cells
///
/// This is the core, minimal builder that provides basic bit/byte operations.
/// For a higher-level API with TON-specific convenience methods, see [`Builder`](crate::tvm::Builder).
///
/// # Example
///
/// ```rust
/// use tonjetton_rs::tvm::CellBuilder;
///
/// let mut builder = CellBuilder::new();
/// builder.store_u32(0x12345678).unwrap();
/// builder.store_byte(0xFF).unwrap();
/// let cell = builder.build().unwrap();
/// assert_eq!(cell.bit_len(), 40);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CellBuilder {
    data: Vec<u8>,
    bit_len: usize,
    references: Vec<Arc<Cell>>,
}

impl CellBuilder {
    /// Creates a new cell builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bits stored so far
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Number of references stored so far
    pub fn ref_count(&self) -> usize {
        self.references.len()
    }

    pub fn available_bits(&self) -> usize {
        MAX_CELL_BITS - self.bit_len
    }

    pub fn available_refs(&self) -> usize {
        MAX_CELL_REFS - self.references.len()
    }

    pub(crate) fn references(&self) -> &[Arc<Cell>] {
        &self.references
    }

    pub(crate) fn data(&self) -> &[u8] {
        &self.data
    }

    /// Stores the first `bit_len` bits of `bits`, most significant bit first
    pub fn store_bits(&mut self, bits: &[u8], bit_len: usize) -> Result<&mut Self> {
        if bit_len > self.available_bits() {
            return Err(EncodingError::BitOverflow {
                requested: bit_len,
                available: self.available_bits(),
            });
        }

        if bits.len() < bit_len.div_ceil(8) {
            return Err(EncodingError::InsufficientData(bit_len));
        }

        if self.bit_len % 8 == 0 && bit_len % 8 == 0 {
            self.data.extend_from_slice(&bits[..bit_len / 8]);
            self.bit_len += bit_len;
            return Ok(self);
        }

        for i in 0..bit_len {
            let bit = (bits[i / 8] >> (7 - i % 8)) & 1;

            let target_byte_idx = self.bit_len / 8;
            if target_byte_idx >= self.data.len() {
                self.data.push(0);
            }
            if bit == 1 {
                self.data[target_byte_idx] |= 1 << (7 - self.bit_len % 8);
            }

            self.bit_len += 1;
        }

        Ok(self)
    }

    /// Stores a byte
    pub fn store_byte(&mut self, byte: u8) -> Result<&mut Self> {
        self.store_bits(&[byte], 8)
    }

    /// Stores multiple bytes
    pub fn store_bytes(&mut self, bytes: &[u8]) -> Result<&mut Self> {
        self.store_bits(bytes, bytes.len() * 8)
    }

    /// Stores a u32 value
    pub fn store_u32(&mut self, value: u32) -> Result<&mut Self> {
        self.store_bits(&value.to_be_bytes(), 32)
    }

    /// Stores a u64 value
    pub fn store_u64(&mut self, value: u64) -> Result<&mut Self> {
        self.store_bits(&value.to_be_bytes(), 64)
    }

    /// Stores `value` as a `bits`-wide big-endian unsigned integer
    pub fn store_uint(&mut self, value: u64, bits: usize) -> Result<&mut Self> {
        if bits > 64 || (bits < 64 && value >> bits != 0) {
            return Err(EncodingError::ValueOutOfRange {
                value: value.to_string(),
                bits,
            });
        }
        if bits == 0 {
            return Ok(self);
        }

        // Left-align so the most significant stored bit leads the first byte
        let aligned = value << (64 - bits);
        self.store_bits(&aligned.to_be_bytes(), bits)
    }

    /// Stores a single bit
    pub fn store_bit(&mut self, bit: bool) -> Result<&mut Self> {
        self.store_bits(&[if bit { 0x80 } else { 0x00 }], 1)
    }

    /// Adds a reference to another cell
    pub fn store_reference(&mut self, cell: Arc<Cell>) -> Result<&mut Self> {
        if self.references.len() >= MAX_CELL_REFS {
            return Err(EncodingError::RefOverflow { max: MAX_CELL_REFS });
        }
        self.references.push(cell);
        Ok(self)
    }

    /// Builds the cell
    pub fn build(self) -> Result<Arc<Cell>> {
        Ok(Arc::new(Cell::with_references(
            self.data,
            self.bit_len,
            self.references,
        )?))
    }
}
