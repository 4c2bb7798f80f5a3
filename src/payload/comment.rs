use crate::payload::opcodes::Opcode;
use crate::tvm::error::{EncodingError, Result};
use crate::tvm::{Builder, Cell, Slice};
use std::sync::Arc;

/// Builds a text comment body: a zero opcode followed by the snake-encoded text
pub fn build_text_comment(text: &str) -> Result<Arc<Cell>> {
    let mut builder = Builder::new();
    builder.store_u32(Opcode::TextComment.code())?;
    builder.store_snake_string(text, false)?;
    builder.build()
}

/// Reads back a text comment body
pub fn parse_text_comment(cell: &Arc<Cell>) -> Result<String> {
    let mut slice = Slice::new(cell.clone());
    let op = slice.load_u32()?;
    if op != Opcode::TextComment.code() {
        return Err(EncodingError::UnexpectedTag {
            what: "text comment",
            tag: op as u64,
        });
    }
    slice.load_snake_string()
}
