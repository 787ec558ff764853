//! Helpers for extracting data from instruction words.

/// Combine the two bytes at the cursor into a big-endian instruction word.
#[inline(always)]
pub fn instr_word(bytecode: &[u8], cursor: usize) -> u16 {
    ((bytecode[cursor] as u16) << 8) | bytecode[cursor + 1] as u16
}

/// Split an instruction word into its four nibbles, highest first.
#[inline(always)]
pub fn nibbles(word: u16) -> [u8; 4] {
    [
        ((word & 0xF000) >> 12) as u8,
        ((word & 0x0F00) >> 8) as u8,
        ((word & 0x00F0) >> 4) as u8,
        (word & 0x000F) as u8,
    ]
}

/// Extract operand NNN, the lower 12 bits.
#[inline(always)]
pub fn op_nnn(word: u16) -> u16 {
    word & 0x0FFF
}

/// Extract operand NN, the lower byte.
#[inline(always)]
pub fn op_nn(word: u16) -> u8 {
    (word & 0x00FF) as u8
}
