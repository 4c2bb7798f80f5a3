/// 32-bit operation codes that open a message body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Opcode {
    /// Plain text comment, followed by a snake string
    TextComment = 0x0000_0000,
    /// Jetton master `Mint` message
    Mint = 0xfc70_8bd2,
    /// TEP-74 jetton wallet transfer
    JettonTransfer = 0x0f8a_7ea5,
}

impl Opcode {
    pub const fn code(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for Opcode {
    type Error = u32;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            0x0000_0000 => Ok(Opcode::TextComment),
            0xfc70_8bd2 => Ok(Opcode::Mint),
            0x0f8a_7ea5 => Ok(Opcode::JettonTransfer),
            other => Err(other),
        }
    }
}
