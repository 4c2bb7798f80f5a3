//! Tests for CRC module

use super::*;

#[test]
fn test_crc16_check_value() {
    assert_eq!(CRC16.checksum(b"123456789"), 0x31c3);
}

#[test]
fn test_crc16_empty_data() {
    assert_eq!(CRC16.checksum(b""), 0x0000);
}

#[test]
fn test_crc16_deterministic() {
    let data = b"test data";
    assert_eq!(CRC16.checksum(data), CRC16.checksum(data));
}

#[test]
fn test_crc16_different_data() {
    assert_ne!(CRC16.checksum(b"data1"), CRC16.checksum(b"data2"));
}

#[test]
fn test_crc16_matches_zero_address_checksum() {
    // tag 0x11, workchain 0, zero hash: "EQAA...AM9c"
    let mut data = vec![0x11u8, 0x00];
    data.extend_from_slice(&[0u8; 32]);
    assert_eq!(CRC16.checksum(&data), 0xcf5c);
}

#[test]
fn test_crc16_incremental_digest() {
    let mut digest = CRC16.digest();
    digest.update(b"1234");
    digest.update(b"56789");
    assert_eq!(digest.finalize(), 0x31c3);
}

#[test]
fn test_crc32c_check_value() {
    assert_eq!(CRC32C.checksum(b"123456789"), 0xe3069283);
}

#[test]
fn test_crc32c_empty_data() {
    assert_eq!(CRC32C.checksum(b""), 0);
}

#[test]
fn test_crc32c_is_not_iso_hdlc() {
    // 0xcbf43926 is the plain CRC-32 check value; bag-of-cells trailers must not use it
    assert_ne!(CRC32C.checksum(b"123456789"), 0xcbf43926);
}

#[test]
fn test_crc32c_large_data() {
    let data = vec![0xABu8; 4096];
    let first = CRC32C.checksum(&data);
    let mut altered = data.clone();
    altered[2048] ^= 0x01;
    assert_ne!(first, CRC32C.checksum(&altered));
}
