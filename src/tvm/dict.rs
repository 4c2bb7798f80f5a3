//! TON Dictionary (`Hashmap n X`) implementation
//!
//! Dictionaries in TON are Patricia trees stored in cells. Every edge carries a
//! label (a run of key bits) encoded in the shortest of three forms, then either
//! the value (when all key bits are consumed) or a fork into two child cells.

use crate::tvm::builder::Builder;
use crate::tvm::cell::Cell;
use crate::tvm::error::{EncodingError, Result};
use crate::tvm::slice::Slice;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Dictionary with fixed-size bit-string keys and inline cell values
///
/// A value's bits and references are written directly into the leaf, so a
/// `^Cell` value is represented by a value cell holding a single reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dict {
    key_size: usize,
    /// Keys are `ceil(key_size / 8)` bytes, left-aligned, unused bits zeroed
    entries: BTreeMap<Vec<u8>, Arc<Cell>>,
}

fn bit_at(key: &[u8], index: usize) -> bool {
    (key[index / 8] >> (7 - index % 8)) & 1 == 1
}

/// Bits needed to encode a label length up to `max_len`
fn len_bits(max_len: usize) -> usize {
    (usize::BITS - max_len.leading_zeros()) as usize
}

impl Dict {
    /// Creates a new dictionary with the specified key size
    pub fn new(key_size: usize) -> Self {
        Self {
            key_size,
            entries: BTreeMap::new(),
        }
    }

    fn normalize_key(&self, key: &[u8]) -> Result<Vec<u8>> {
        let byte_len = self.key_size.div_ceil(8);
        if key.len() != byte_len {
            return Err(EncodingError::Dict(format!(
                "key of {} bytes does not match key size {} bits",
                key.len(),
                self.key_size
            )));
        }
        let mut key = key.to_vec();
        if self.key_size % 8 != 0 {
            key[byte_len - 1] &= 0xFFu8 << (8 - self.key_size % 8);
        }
        Ok(key)
    }

    /// Sets a value for a bit-string key given as `ceil(key_size / 8)` bytes
    pub fn set(&mut self, key: &[u8], value: Arc<Cell>) -> Result<Option<Arc<Cell>>> {
        let key = self.normalize_key(key)?;
        Ok(self.entries.insert(key, value))
    }

    /// Sets a value for an unsigned integer key
    pub fn set_uint(&mut self, key: u64, value: Arc<Cell>) -> Result<Option<Arc<Cell>>> {
        if self.key_size > 64 {
            return Err(EncodingError::Dict(format!(
                "integer keys need key size <= 64, got {}",
                self.key_size
            )));
        }
        let mut builder = Builder::new();
        builder.store_uint(key, self.key_size)?;
        let cell = builder.build()?;
        self.set(cell.data(), value)
    }

    /// Gets a value by bit-string key
    pub fn get(&self, key: &[u8]) -> Option<&Arc<Cell>> {
        self.normalize_key(key)
            .ok()
            .and_then(|key| self.entries.get(&key))
    }

    /// Returns the number of entries in the dictionary
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the dictionary is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the key size in bits
    pub fn key_size(&self) -> usize {
        self.key_size
    }

    /// Iterates entries in ascending key order
    pub fn iter(&self) -> impl Iterator<Item = (&Vec<u8>, &Arc<Cell>)> {
        self.entries.iter()
    }

    /// Serializes the dictionary into its root cell; `None` for an empty dictionary
    pub fn serialize(&self) -> Result<Option<Arc<Cell>>> {
        if self.is_empty() {
            return Ok(None);
        }
        let entries: Vec<(&[u8], &Arc<Cell>)> = self
            .entries
            .iter()
            .map(|(k, v)| (k.as_slice(), v))
            .collect();
        serialize_edge(&entries, 0, self.key_size).map(Some)
    }

    /// Parses a dictionary from its root cell
    pub fn deserialize(root: &Arc<Cell>, key_size: usize) -> Result<Self> {
        let mut dict = Self::new(key_size);
        let mut prefix = Vec::with_capacity(key_size);
        parse_edge(root, &mut prefix, key_size, &mut dict)?;
        Ok(dict)
    }
}

/// Writes one edge: `entries` share their first `offset` key bits, `remaining` bits are left
fn serialize_edge(
    entries: &[(&[u8], &Arc<Cell>)],
    offset: usize,
    remaining: usize,
) -> Result<Arc<Cell>> {
    let label_len = if entries.len() == 1 {
        remaining
    } else {
        let first = entries[0].0;
        (0..remaining)
            .take_while(|i| {
                let bit = bit_at(first, offset + i);
                entries.iter().all(|(k, _)| bit_at(k, offset + i) == bit)
            })
            .count()
    };

    let mut builder = Builder::new();
    store_label(&mut builder, entries[0].0, offset, label_len, remaining)?;

    let rest = remaining - label_len;
    if rest == 0 {
        builder.store_cell(entries[0].1)?;
        return builder.build();
    }

    let fork = offset + label_len;
    let split = entries.partition_point(|(k, _)| !bit_at(k, fork));
    if split == 0 || split == entries.len() {
        return Err(EncodingError::Dict("degenerate fork".to_string()));
    }
    builder.store_ref(serialize_edge(&entries[..split], fork + 1, rest - 1)?)?;
    builder.store_ref(serialize_edge(&entries[split..], fork + 1, rest - 1)?)?;
    builder.build()
}

/// Picks the shortest of `hml_short`, `hml_long` and `hml_same`
fn store_label(
    builder: &mut Builder,
    key: &[u8],
    offset: usize,
    len: usize,
    max_len: usize,
) -> Result<()> {
    let k = len_bits(max_len);
    let first = len > 0 && bit_at(key, offset);
    let same = (0..len).all(|i| bit_at(key, offset + i) == first);

    if len > 1 && k < 2 * len - 1 && same {
        // hml_same$11 v:Bit n:(#<= m)
        builder.store_uint(0b11, 2)?;
        builder.store_bit(first)?;
        builder.store_uint(len as u64, k)?;
        return Ok(());
    }

    if k < len {
        // hml_long$10 n:(#<= m) s:(n * Bit)
        builder.store_uint(0b10, 2)?;
        builder.store_uint(len as u64, k)?;
    } else {
        // hml_short$0 len:(Unary ~n) s:(n * Bit)
        builder.store_bit(false)?;
        for _ in 0..len {
            builder.store_bit(true)?;
        }
        builder.store_bit(false)?;
    }
    for i in 0..len {
        builder.store_bit(bit_at(key, offset + i))?;
    }
    Ok(())
}

fn parse_edge(
    cell: &Arc<Cell>,
    prefix: &mut Vec<bool>,
    remaining: usize,
    dict: &mut Dict,
) -> Result<()> {
    let mut slice = Slice::new(cell.clone());
    let k = len_bits(remaining);
    let depth = prefix.len();

    if !slice.load_bit()? {
        let mut len = 0;
        while slice.load_bit()? {
            len += 1;
        }
        check_label(len, remaining)?;
        for _ in 0..len {
            prefix.push(slice.load_bit()?);
        }
    } else if !slice.load_bit()? {
        let len = slice.load_uint(k)? as usize;
        check_label(len, remaining)?;
        for _ in 0..len {
            prefix.push(slice.load_bit()?);
        }
    } else {
        let bit = slice.load_bit()?;
        let len = slice.load_uint(k)? as usize;
        check_label(len, remaining)?;
        prefix.extend(std::iter::repeat_n(bit, len));
    }

    let rest = remaining - (prefix.len() - depth);
    if rest == 0 {
        let mut key = vec![0u8; dict.key_size.div_ceil(8)];
        for (i, bit) in prefix.iter().enumerate() {
            if *bit {
                key[i / 8] |= 1 << (7 - i % 8);
            }
        }
        dict.entries.insert(key, slice.load_remainder()?);
    } else {
        let left = slice.load_reference()?;
        let right = slice.load_reference()?;
        let fork = prefix.len();

        prefix.push(false);
        parse_edge(&left, prefix, rest - 1, dict)?;
        prefix.truncate(fork);

        prefix.push(true);
        parse_edge(&right, prefix, rest - 1, dict)?;
        prefix.truncate(fork);
    }

    prefix.truncate(depth);
    Ok(())
}

fn check_label(len: usize, remaining: usize) -> Result<()> {
    if len > remaining {
        return Err(EncodingError::Dict(format!(
            "label of {len} bits exceeds the {remaining} remaining key bits"
        )));
    }
    Ok(())
}

impl Builder {
    /// Stores a dictionary as `HashmapE`: a `0` bit when empty, otherwise `1` and the root reference
    pub fn store_dictionary(&mut self, dict: &Dict) -> Result<&mut Self> {
        let root = dict.serialize()?;
        self.store_dict(root)
    }
}

impl Slice {
    /// Loads a `HashmapE` with the given key size
    pub fn load_dict(&mut self, key_size: usize) -> Result<Dict> {
        match self.load_maybe_ref()? {
            Some(root) => Dict::deserialize(&root, key_size),
            None => Ok(Dict::new(key_size)),
        }
    }
}
