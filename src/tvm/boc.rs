//! Bag of Cells (BoC) serialization and deserialization
//!
//! BoC is a serialization format that encodes a cell DAG into a byte array.
//! Structurally identical subtrees are stored once, and every cell precedes
//! the cells it references, so reference indices always point forward.

use crate::crc::CRC32C;
use crate::tvm::cell::{Cell, MAX_CELL_REFS};
use crate::tvm::error::{EncodingError, Result};
use base64::Engine;
use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Read};
use std::sync::Arc;

/// BoC magic number for standard format
const BOC_GENERIC_MAGIC: u32 = 0xb5ee9c72;

/// Legacy indexed formats, recognised only to report them clearly
const BOC_INDEXED_MAGIC: u32 = 0x68ff65f3;
const BOC_INDEXED_CRC32C_MAGIC: u32 = 0xacc3a728;

const FLAG_HAS_IDX: u8 = 0x80;
const FLAG_HAS_CRC32C: u8 = 0x40;
const FLAG_HAS_CACHE_BITS: u8 = 0x20;
const SIZE_BYTES_MASK: u8 = 0x07;

fn invalid(reason: impl Into<String>) -> EncodingError {
    EncodingError::InvalidBoc(reason.into())
}

/// Serializes a cell and its references into a Bag of Cells (BoC) format
pub fn serialize_boc(root: &Arc<Cell>, has_crc32: bool) -> Result<Vec<u8>> {
    let cells = collect_cells(root);
    let index: HashMap<[u8; 32], usize> = cells
        .iter()
        .enumerate()
        .map(|(idx, cell)| (cell.hash(), idx))
        .collect();

    let size_bytes = bytes_needed(cells.len());

    let mut cells_data = Vec::new();
    for cell in &cells {
        cells_data.extend_from_slice(&cell.descriptors());
        cells_data.extend_from_slice(&cell.serialize_data());
        for reference in cell.references() {
            let ref_idx = index
                .get(&reference.hash())
                .ok_or_else(|| invalid("reference not found in cell index"))?;
            write_uint(&mut cells_data, *ref_idx, size_bytes);
        }
    }

    let offset_bytes = bytes_needed(cells_data.len());

    let mut result = Vec::with_capacity(cells_data.len() + 32);
    result.extend_from_slice(&BOC_GENERIC_MAGIC.to_be_bytes());

    let mut flags = size_bytes as u8;
    if has_crc32 {
        flags |= FLAG_HAS_CRC32C;
    }
    result.push(flags);
    result.push(offset_bytes as u8);

    write_uint(&mut result, cells.len(), size_bytes);
    // one root, no absent cells
    write_uint(&mut result, 1, size_bytes);
    write_uint(&mut result, 0, size_bytes);
    write_uint(&mut result, cells_data.len(), offset_bytes);
    // the root always comes first in reverse post-order
    write_uint(&mut result, 0, size_bytes);

    result.extend_from_slice(&cells_data);

    if has_crc32 {
        let crc = CRC32C.checksum(&result);
        result.extend_from_slice(&crc.to_le_bytes());
    }

    Ok(result)
}

/// Depth-first walk deduplicated by hash, returned in reverse post-order
fn collect_cells(root: &Arc<Cell>) -> Vec<Arc<Cell>> {
    let mut visited = HashSet::new();
    let mut post_order = Vec::new();
    visit(root, &mut visited, &mut post_order);
    post_order.reverse();
    post_order
}

fn visit(cell: &Arc<Cell>, visited: &mut HashSet<[u8; 32]>, post_order: &mut Vec<Arc<Cell>>) {
    if !visited.insert(cell.hash()) {
        return;
    }
    for reference in cell.references() {
        visit(reference, visited, post_order);
    }
    post_order.push(cell.clone());
}

/// Deserializes a Bag of Cells (BoC) and returns its first root
pub fn deserialize_boc(data: &[u8]) -> Result<Arc<Cell>> {
    deserialize_boc_roots(data)?
        .into_iter()
        .next()
        .ok_or_else(|| invalid("no root cells"))
}

/// Deserializes a Bag of Cells (BoC) and returns every root in order
pub fn deserialize_boc_roots(data: &[u8]) -> Result<Vec<Arc<Cell>>> {
    let eof = |_| invalid("unexpected end of data");
    let mut reader = Cursor::new(data);

    let magic = reader.read_u32::<BigEndian>().map_err(eof)?;
    match magic {
        BOC_GENERIC_MAGIC => {}
        BOC_INDEXED_MAGIC | BOC_INDEXED_CRC32C_MAGIC => {
            return Err(EncodingError::UnsupportedCell(format!(
                "legacy bag of cells format 0x{magic:08x}"
            )));
        }
        _ => return Err(invalid(format!("bad magic 0x{magic:08x}"))),
    }

    let flags = reader.read_u8().map_err(eof)?;
    let has_idx = flags & FLAG_HAS_IDX != 0;
    let has_crc32 = flags & FLAG_HAS_CRC32C != 0;
    let _has_cache_bits = flags & FLAG_HAS_CACHE_BITS != 0;
    let size_bytes = (flags & SIZE_BYTES_MASK) as usize;
    if size_bytes == 0 || size_bytes > 4 {
        return Err(invalid(format!("invalid size_bytes {size_bytes}")));
    }

    let offset_bytes = reader.read_u8().map_err(eof)? as usize;
    if offset_bytes == 0 || offset_bytes > 8 {
        return Err(invalid(format!("invalid offset_bytes {offset_bytes}")));
    }

    let cells_count = reader.read_uint::<BigEndian>(size_bytes).map_err(eof)? as usize;
    let roots_count = reader.read_uint::<BigEndian>(size_bytes).map_err(eof)? as usize;
    let absent_count = reader.read_uint::<BigEndian>(size_bytes).map_err(eof)? as usize;
    let total_cells_size = reader.read_uint::<BigEndian>(offset_bytes).map_err(eof)? as usize;

    // every cell takes at least its two descriptor bytes
    if cells_count > total_cells_size / 2 {
        return Err(invalid(format!(
            "{cells_count} cells cannot fit in {total_cells_size} bytes"
        )));
    }
    if roots_count == 0 || roots_count > cells_count {
        return Err(invalid(format!(
            "{roots_count} roots for {cells_count} cells"
        )));
    }
    if absent_count != 0 {
        return Err(EncodingError::UnsupportedCell(format!(
            "{absent_count} absent cells"
        )));
    }

    let mut root_indices = Vec::with_capacity(roots_count);
    for _ in 0..roots_count {
        let idx = reader.read_uint::<BigEndian>(size_bytes).map_err(eof)? as usize;
        if idx >= cells_count {
            return Err(invalid(format!("root index {idx} out of range")));
        }
        root_indices.push(idx);
    }

    if has_idx {
        let skip = cells_count
            .checked_mul(offset_bytes)
            .ok_or_else(|| invalid("index table too large"))?;
        reader.set_position(reader.position() + skip as u64);
    }

    let cells_start = reader.position() as usize;
    let cells_end = cells_start
        .checked_add(total_cells_size)
        .ok_or_else(|| invalid("cells size overflow"))?;
    let expected_len = cells_end
        .checked_add(if has_crc32 { 4 } else { 0 })
        .ok_or_else(|| invalid("cells size overflow"))?;
    if data.len() < expected_len {
        return Err(invalid("unexpected end of data"));
    }
    if data.len() > expected_len {
        return Err(invalid(format!(
            "{} trailing bytes",
            data.len() - expected_len
        )));
    }

    if has_crc32 {
        let mut trailer = &data[cells_end..];
        let expected = trailer.read_u32::<LittleEndian>().map_err(eof)?;
        let actual = CRC32C.checksum(&data[..cells_end]);
        if expected != actual {
            return Err(EncodingError::ChecksumMismatch { expected, actual });
        }
    }

    let cells = parse_cells(&data[cells_start..cells_end], cells_count, size_bytes)?;

    Ok(root_indices.into_iter().map(|i| cells[i].clone()).collect())
}

struct RawCell {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<usize>,
}

fn parse_cells(data: &[u8], count: usize, size_bytes: usize) -> Result<Vec<Arc<Cell>>> {
    let eof = |_| invalid("unexpected end of cells data");
    let mut reader = Cursor::new(data);
    let mut raw_cells = Vec::with_capacity(count.min(data.len() / 2));

    for idx in 0..count {
        let d1 = reader.read_u8().map_err(eof)?;
        let d2 = reader.read_u8().map_err(eof)?;

        if d1 & 0x08 != 0 {
            return Err(EncodingError::UnsupportedCell(format!(
                "exotic cell at index {idx}"
            )));
        }
        if d1 & 0xF0 != 0 {
            return Err(EncodingError::UnsupportedCell(format!(
                "cell at index {idx} has level or stored hashes (d1 = 0x{d1:02x})"
            )));
        }
        let ref_count = (d1 & 0x07) as usize;
        if ref_count > MAX_CELL_REFS {
            return Err(invalid(format!("cell {idx} has {ref_count} references")));
        }

        let data_size = (d2 as usize).div_ceil(2);
        let mut cell_data = vec![0u8; data_size];
        reader.read_exact(&mut cell_data).map_err(eof)?;

        let bit_len = if d2 % 2 == 0 {
            data_size * 8
        } else {
            let last = cell_data[data_size - 1];
            if last == 0 {
                return Err(invalid(format!("cell {idx} lacks its completion tag")));
            }
            (data_size - 1) * 8 + 7 - last.trailing_zeros() as usize
        };

        let mut refs = Vec::with_capacity(ref_count);
        for _ in 0..ref_count {
            let ref_idx = reader.read_uint::<BigEndian>(size_bytes).map_err(eof)? as usize;
            if ref_idx <= idx || ref_idx >= count {
                return Err(invalid(format!(
                    "cell {idx} references index {ref_idx}"
                )));
            }
            refs.push(ref_idx);
        }

        raw_cells.push(RawCell {
            data: cell_data,
            bit_len,
            refs,
        });
    }

    if reader.position() as usize != data.len() {
        return Err(invalid("cells size does not match the declared total"));
    }

    // Children always come later, so build from the back
    let mut cells: Vec<Option<Arc<Cell>>> = vec![None; count];
    for (idx, raw) in raw_cells.into_iter().enumerate().rev() {
        let references = raw
            .refs
            .iter()
            .map(|&r| cells[r].clone().ok_or_else(|| invalid("unresolved reference")))
            .collect::<Result<Vec<_>>>()?;
        cells[idx] = Some(Arc::new(Cell::with_references(
            raw.data,
            raw.bit_len,
            references,
        )?));
    }

    cells
        .into_iter()
        .map(|c| c.ok_or_else(|| invalid("unresolved cell")))
        .collect()
}

fn bytes_needed(value: usize) -> usize {
    if value == 0 {
        return 1;
    }

    let bits = (usize::BITS - value.leading_zeros()) as usize;
    bits.div_ceil(8)
}

fn write_uint(buf: &mut Vec<u8>, value: usize, size: usize) {
    let bytes = (value as u64).to_be_bytes();
    buf.extend_from_slice(&bytes[8 - size..]);
}

/// Parses a hex-encoded BoC
pub fn hex_to_boc(hex: &str) -> Result<Arc<Cell>> {
    let hex: String = hex.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = hex::decode(&hex).map_err(|e| invalid(format!("bad hex: {e}")))?;
    deserialize_boc(&bytes)
}

/// Serializes a cell to a hex-encoded BoC
pub fn boc_to_hex(cell: &Arc<Cell>, has_crc32: bool) -> Result<String> {
    Ok(hex::encode(serialize_boc(cell, has_crc32)?))
}

/// Serializes a cell to a base64-encoded BoC
pub fn boc_to_base64(cell: &Arc<Cell>, has_crc32: bool) -> Result<String> {
    let bytes = serialize_boc(cell, has_crc32)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
}

/// Parses a base64-encoded BoC
pub fn base64_to_boc(b64: &str) -> Result<Arc<Cell>> {
    let b64: String = b64.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(&b64)
        .map_err(|e| invalid(format!("bad base64: {e}")))?;
    deserialize_boc(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tvm::cell::CellBuilder;

    #[test]
    fn test_serialize_deserialize_simple() {
        let mut builder = CellBuilder::new();
        builder.store_u32(0x12345678).unwrap();
        let cell = builder.build().unwrap();

        let boc = serialize_boc(&cell, false).unwrap();
        let deserialized = deserialize_boc(&boc).unwrap();

        assert_eq!(cell.hash(), deserialized.hash());
    }

    #[test]
    fn test_hex_conversion() {
        let mut builder = CellBuilder::new();
        builder.store_byte(0xFF).unwrap();
        let cell = builder.build().unwrap();

        let hex = boc_to_hex(&cell, false).unwrap();
        let decoded = hex_to_boc(&hex).unwrap();

        assert_eq!(cell.hash(), decoded.hash());
    }

    #[test]
    fn test_bytes_needed() {
        assert_eq!(bytes_needed(0), 1);
        assert_eq!(bytes_needed(255), 1);
        assert_eq!(bytes_needed(256), 2);
        assert_eq!(bytes_needed(4062), 2);
    }

    #[test]
    fn test_bad_magic() {
        let err = deserialize_boc(&[0xde, 0xad, 0xbe, 0xef, 0x01]).unwrap_err();
        assert!(matches!(err, EncodingError::InvalidBoc(_)));
    }

    #[test]
    fn test_truncated() {
        let cell = CellBuilder::new().build().unwrap();
        let boc = serialize_boc(&cell, true).unwrap();
        for len in 0..boc.len() {
            assert!(deserialize_boc(&boc[..len]).is_err(), "prefix of {len} bytes");
        }
    }

    #[test]
    fn test_cells_size_near_usize_max() {
        // crc flag, 1-byte refs, 8-byte offsets, 1 cell, 1 root, 0 absent
        let mut data = vec![0xb5, 0xee, 0x9c, 0x72, 0x41, 0x08, 0x01, 0x01, 0x00];
        // header so far plus the root index is 18 bytes, so cells_end is usize::MAX
        data.extend_from_slice(&(usize::MAX as u64 - 18).to_be_bytes());
        data.push(0x00);
        data.extend_from_slice(&[0x00; 9]);

        let err = deserialize_boc(&data).unwrap_err();
        assert!(matches!(err, EncodingError::InvalidBoc(_)), "{err:?}");
    }
}
