use crc::{CRC_16_XMODEM, CRC_32_ISCSI, Crc};

/// CRC-16/XMODEM, used by user-friendly addresses and get-method ids
pub const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

/// CRC-32C (Castagnoli), used as the bag-of-cells trailer
pub const CRC32C: Crc<u32> = Crc::<u32>::new(&CRC_32_ISCSI);

#[cfg(test)]
mod tests;
