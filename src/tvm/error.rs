use thiserror::Error;

/// Failures while building, reading or (de)serializing cells
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("Cell overflow: cannot store {requested} bits, only {available} available")]
    BitOverflow { requested: usize, available: usize },
    #[error("Cell overflow: a cell holds at most {max} references")]
    RefOverflow { max: usize },
    #[error("Value {value} does not fit in {bits} bits")]
    ValueOutOfRange { value: String, bits: usize },
    #[error("Not enough bits: requested {requested}, {available} remaining")]
    BitUnderflow { requested: usize, available: usize },
    #[error("No more references to read")]
    RefUnderflow,
    #[error("Insufficient data for {0} bits")]
    InsufficientData(usize),
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Invalid coin amount: {0}")]
    InvalidCoins(String),
    #[error("Invalid bag of cells: {0}")]
    InvalidBoc(String),
    #[error("Bag of cells checksum mismatch: expected 0x{expected:08x}, got 0x{actual:08x}")]
    ChecksumMismatch { expected: u32, actual: u32 },
    #[error("Unsupported cell: {0}")]
    UnsupportedCell(String),
    #[error("Dictionary error: {0}")]
    Dict(String),
    #[error("Invalid UTF-8 in string data")]
    InvalidUtf8,
    #[error("Unexpected tag {tag:#x} while reading {what}")]
    UnexpectedTag { what: &'static str, tag: u64 },
}

pub type Result<T> = std::result::Result<T, EncodingError>;
