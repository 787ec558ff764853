//! Instruction decoding.
//!
//! Decoding is a pure mapping from a 16-bit instruction word to an [`Op`].
//! The VM evaluates the result with a single exhaustive match, so each
//! opcode's semantics can be tested in isolation.
use std::fmt::{self, Formatter};

use crate::{
    bytecode::{nibbles, op_nn, op_nnn},
    constants::Address,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum Op {
    /// 0000
    ///
    /// No operation. Zeroed memory decodes to this.
    NoOp,
    /// 00E0 (CLS)
    ///
    /// Clear the screen.
    ClearScreen,
    /// 00EE (RET)
    ///
    /// Return from the sub-routine.
    Return,
    /// 1nnn (JP addr)
    ///
    /// Jump to the address in `nnn`.
    JumpAddress { address: Address },
    /// 2nnn (CALL addr)
    ///
    /// Call the sub-routine at address `nnn`.
    Call { address: Address },
    /// 3xnn (SE Vx, byte)
    ///
    /// Skip the next instruction if register `Vx` equals value `nn`
    Skip_Eq_Byte { vx: u8, nn: u8 },
    /// 4xnn (SNE Vx, byte)
    ///
    /// Skip the next instruction if register `Vx` does not equal value `nn`.
    Skip_NotEq_Byte { vx: u8, nn: u8 },
    /// 5xy0 (SE Vx, Vy)
    ///
    /// Skip the next instruction if register `Vx` equals register `Vy`.
    Skip_Eq { vx: u8, vy: u8 },
    /// 6xnn (LD Vx, byte)
    Load_Byte { vx: u8, nn: u8 },
    /// 7xnn (ADD Vx, byte)
    ///
    /// Add byte to the value in register `Vx`, store the result in `Vx`.
    /// Wraps, and the carry flag is not touched.
    Add_Byte { vx: u8, nn: u8 },

    // ------------------------------------------------------------------------
    // Math
    /// 8xy0 (LD Vx, Vy)
    ///
    /// Store the value of register VY in register VX.
    Load_Vx_Vy { vx: u8, vy: u8 },
    /// 8xy1 (OR Vx, Vy)
    Or_Vx_Vy { vx: u8, vy: u8 },
    /// 8xy2 (AND Vx, Vy)
    And_Vx_Vy { vx: u8, vy: u8 },
    /// 8xy3 (XOR Vx, Vy)
    Xor_Vx_Vy { vx: u8, vy: u8 },
    /// 8xy4 (ADD Vx, Vy)
    ///
    /// ADDs VY to VX, and stores the result in VX.
    /// Overflow is wrapped. If overflowed, set VF to 1, else 0.
    Add_Vx_Vy { vx: u8, vy: u8 },
    /// 8xy5 (SUB Vx, Vy)
    ///
    /// Subtracts VY from VX, and stores the result in VX.
    /// VF is set to 0 when there is a borrow, set to 1 when there isn't.
    Sub_Vx_Vy { vx: u8, vy: u8 },
    /// 8xy6 (SHR Vx)
    ///
    /// VF is set to the least-significant bit of Vx before the shift.
    /// Shift VX right by 1. VY is unused.
    ShiftRight { vx: u8 },
    /// 8xy7 (SUBN Vx, Vy)
    ///
    /// Subtracts VX from VY, and stores the result in VX.
    /// VF is set to 0 when there is a borrow, set to 1 when there isn't.
    SubReverse_Vx_Vy { vx: u8, vy: u8 },
    /// 8xyE (SHL Vx)
    ///
    /// VF is set to the most-significant bit of Vx before the shift.
    /// Shift VX left by 1. VY is unused.
    ShiftLeft { vx: u8 },
    /// 9xy0 (SNE Vx, Vy)
    ///
    /// Skip the next instruction if register `Vx` does not equal register `Vy`.
    Skip_NotEq { vx: u8, vy: u8 },

    /// Annn (LD I, addr)
    ///
    /// Load address into register `I`.
    Load_Address { address: Address },
    /// Bnnn (JP V0, addr)
    ///
    /// Jump to location nnn + V0.
    Jump_V0 { address: Address },
    /// Cxnn (RND Vx, byte)
    ///
    /// Generate random number, masked by `nn`.
    Random { vx: u8, nn: u8 },
    /// Dxyn (DRW Vx, Vy, nibble)
    ///
    /// Draw sprite to the display buffer.
    Draw { vx: u8, vy: u8, n: u8 },

    // ------------------------------------------------------------------------
    // Keyboard
    /// Ex9E (SKP Vx)
    Skip_Key_Pressed { vx: u8 },
    /// ExA1 (SKNP Vx)
    Skip_Key_NotPressed { vx: u8 },

    // ------------------------------------------------------------------------
    // Timers and memory
    /// Fx07 (LD Vx, DT)
    Load_Vx_Delay { vx: u8 },
    /// Fx0A (LD Vx, K)
    ///
    /// Stall until a key is pressed, then store the key in `Vx`.
    Wait_Key { vx: u8 },
    /// Fx15 (LD DT, Vx)
    Load_Delay_Vx { vx: u8 },
    /// Fx18 (LD ST, Vx)
    Load_Sound_Vx { vx: u8 },
    /// Fx1E (ADD I, Vx)
    Add_Address_Vx { vx: u8 },
    /// Fx29 (LD F, Vx)
    ///
    /// Point `I` at the font glyph for the digit in `Vx`.
    Load_Font { vx: u8 },
    /// Fx33 (LD B, Vx)
    Store_Bcd { vx: u8 },
    /// Fx55 (LD [I], Vx)
    Store_Registers { vx: u8 },
    /// Fx65 (LD Vx, [I])
    Load_Registers { vx: u8 },
}

/// Instruction word has no defined behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidOpcode(pub u16);

impl std::error::Error for InvalidOpcode {}

impl fmt::Display for InvalidOpcode {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "invalid opcode {:04X}", self.0)
    }
}

impl TryFrom<u16> for Op {
    type Error = InvalidOpcode;

    fn try_from(word: u16) -> Result<Self, Self::Error> {
        let address = op_nnn(word);
        let nn = op_nn(word);

        let op = match nibbles(word) {
            [0x0, 0x0, 0x0, 0x0] => Op::NoOp,
            [0x0, 0x0, 0xE, 0x0] => Op::ClearScreen,
            [0x0, 0x0, 0xE, 0xE] => Op::Return,
            [0x1, _, _, _] => Op::JumpAddress { address },
            [0x2, _, _, _] => Op::Call { address },
            [0x3, vx, _, _] => Op::Skip_Eq_Byte { vx, nn },
            [0x4, vx, _, _] => Op::Skip_NotEq_Byte { vx, nn },
            [0x5, vx, vy, 0x0] => Op::Skip_Eq { vx, vy },
            [0x6, vx, _, _] => Op::Load_Byte { vx, nn },
            [0x7, vx, _, _] => Op::Add_Byte { vx, nn },
            [0x8, vx, vy, 0x0] => Op::Load_Vx_Vy { vx, vy },
            [0x8, vx, vy, 0x1] => Op::Or_Vx_Vy { vx, vy },
            [0x8, vx, vy, 0x2] => Op::And_Vx_Vy { vx, vy },
            [0x8, vx, vy, 0x3] => Op::Xor_Vx_Vy { vx, vy },
            [0x8, vx, vy, 0x4] => Op::Add_Vx_Vy { vx, vy },
            [0x8, vx, vy, 0x5] => Op::Sub_Vx_Vy { vx, vy },
            [0x8, vx, _, 0x6] => Op::ShiftRight { vx },
            [0x8, vx, vy, 0x7] => Op::SubReverse_Vx_Vy { vx, vy },
            [0x8, vx, _, 0xE] => Op::ShiftLeft { vx },
            [0x9, vx, vy, 0x0] => Op::Skip_NotEq { vx, vy },
            [0xA, _, _, _] => Op::Load_Address { address },
            [0xB, _, _, _] => Op::Jump_V0 { address },
            [0xC, vx, _, _] => Op::Random { vx, nn },
            [0xD, vx, vy, n] => Op::Draw { vx, vy, n },
            [0xE, vx, 0x9, 0xE] => Op::Skip_Key_Pressed { vx },
            [0xE, vx, 0xA, 0x1] => Op::Skip_Key_NotPressed { vx },
            [0xF, vx, 0x0, 0x7] => Op::Load_Vx_Delay { vx },
            [0xF, vx, 0x0, 0xA] => Op::Wait_Key { vx },
            [0xF, vx, 0x1, 0x5] => Op::Load_Delay_Vx { vx },
            [0xF, vx, 0x1, 0x8] => Op::Load_Sound_Vx { vx },
            [0xF, vx, 0x1, 0xE] => Op::Add_Address_Vx { vx },
            [0xF, vx, 0x2, 0x9] => Op::Load_Font { vx },
            [0xF, vx, 0x3, 0x3] => Op::Store_Bcd { vx },
            [0xF, vx, 0x5, 0x5] => Op::Store_Registers { vx },
            [0xF, vx, 0x6, 0x5] => Op::Load_Registers { vx },
            _ => return Err(InvalidOpcode(word)),
        };

        Ok(op)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Op::NoOp => write!(f, "NOP"),
            Op::ClearScreen => write!(f, "CLS"),
            Op::Return => write!(f, "RET"),
            Op::JumpAddress { address } => write!(f, "JP 0x{address:03X}"),
            Op::Call { address } => write!(f, "CALL 0x{address:03X}"),
            Op::Skip_Eq_Byte { vx, nn } => write!(f, "SE v{vx:X}, {nn}"),
            Op::Skip_NotEq_Byte { vx, nn } => write!(f, "SNE v{vx:X}, {nn}"),
            Op::Skip_Eq { vx, vy } => write!(f, "SE v{vx:X}, v{vy:X}"),
            Op::Load_Byte { vx, nn } => write!(f, "LD v{vx:X}, {nn}"),
            Op::Add_Byte { vx, nn } => write!(f, "ADD v{vx:X}, {nn}"),
            // ------
            Op::Load_Vx_Vy { vx, vy } => write!(f, "LD v{vx:X}, v{vy:X}"),
            Op::Or_Vx_Vy { vx, vy } => write!(f, "OR v{vx:X}, v{vy:X}"),
            Op::And_Vx_Vy { vx, vy } => write!(f, "AND v{vx:X}, v{vy:X}"),
            Op::Xor_Vx_Vy { vx, vy } => write!(f, "XOR v{vx:X}, v{vy:X}"),
            Op::Add_Vx_Vy { vx, vy } => write!(f, "ADD v{vx:X}, v{vy:X}"),
            Op::Sub_Vx_Vy { vx, vy } => write!(f, "SUB v{vx:X}, v{vy:X}"),
            Op::ShiftRight { vx } => write!(f, "SHR v{vx:X}"),
            Op::SubReverse_Vx_Vy { vx, vy } => write!(f, "SUBN v{vx:X}, v{vy:X}"),
            Op::ShiftLeft { vx } => write!(f, "SHL v{vx:X}"),
            Op::Skip_NotEq { vx, vy } => write!(f, "SNE v{vx:X}, v{vy:X}"),
            // ------
            Op::Load_Address { address } => write!(f, "LD I, 0x{address:03X}"),
            Op::Jump_V0 { address } => write!(f, "JP v0, 0x{address:03X}"),
            Op::Random { vx, nn } => write!(f, "RND v{vx:X}, {nn}"),
            Op::Draw { vx, vy, n } => write!(f, "DRW v{vx:X}, v{vy:X}, {n}"),
            // ------
            Op::Skip_Key_Pressed { vx } => write!(f, "SKP v{vx:X}"),
            Op::Skip_Key_NotPressed { vx } => write!(f, "SKNP v{vx:X}"),
            Op::Load_Vx_Delay { vx } => write!(f, "LD v{vx:X}, DT"),
            Op::Wait_Key { vx } => write!(f, "LD v{vx:X}, K"),
            Op::Load_Delay_Vx { vx } => write!(f, "LD DT, v{vx:X}"),
            Op::Load_Sound_Vx { vx } => write!(f, "LD ST, v{vx:X}"),
            Op::Add_Address_Vx { vx } => write!(f, "ADD I, v{vx:X}"),
            Op::Load_Font { vx } => write!(f, "LD F, v{vx:X}"),
            Op::Store_Bcd { vx } => write!(f, "LD B, v{vx:X}"),
            Op::Store_Registers { vx } => write!(f, "LD [I], v{vx:X}"),
            Op::Load_Registers { vx } => write!(f, "LD v{vx:X}, [I]"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    #[rustfmt::skip]
    fn test_decode_table() {
        let table = [
            (0x0000, Op::NoOp),
            (0x00E0, Op::ClearScreen),
            (0x00EE, Op::Return),
            (0x1ABC, Op::JumpAddress { address: 0xABC }),
            (0x2ABC, Op::Call { address: 0xABC }),
            (0x3F42, Op::Skip_Eq_Byte { vx: 0xF, nn: 0x42 }),
            (0x4F42, Op::Skip_NotEq_Byte { vx: 0xF, nn: 0x42 }),
            (0x5120, Op::Skip_Eq { vx: 1, vy: 2 }),
            (0x6A07, Op::Load_Byte { vx: 0xA, nn: 0x07 }),
            (0x7A07, Op::Add_Byte { vx: 0xA, nn: 0x07 }),
            (0x8120, Op::Load_Vx_Vy { vx: 1, vy: 2 }),
            (0x8121, Op::Or_Vx_Vy { vx: 1, vy: 2 }),
            (0x8122, Op::And_Vx_Vy { vx: 1, vy: 2 }),
            (0x8123, Op::Xor_Vx_Vy { vx: 1, vy: 2 }),
            (0x8124, Op::Add_Vx_Vy { vx: 1, vy: 2 }),
            (0x8125, Op::Sub_Vx_Vy { vx: 1, vy: 2 }),
            (0x8126, Op::ShiftRight { vx: 1 }),
            (0x8127, Op::SubReverse_Vx_Vy { vx: 1, vy: 2 }),
            (0x812E, Op::ShiftLeft { vx: 1 }),
            (0x9120, Op::Skip_NotEq { vx: 1, vy: 2 }),
            (0xA2F0, Op::Load_Address { address: 0x2F0 }),
            (0xB2F0, Op::Jump_V0 { address: 0x2F0 }),
            (0xC30F, Op::Random { vx: 3, nn: 0x0F }),
            (0xD125, Op::Draw { vx: 1, vy: 2, n: 5 }),
            (0xE59E, Op::Skip_Key_Pressed { vx: 5 }),
            (0xE5A1, Op::Skip_Key_NotPressed { vx: 5 }),
            (0xF907, Op::Load_Vx_Delay { vx: 9 }),
            (0xF90A, Op::Wait_Key { vx: 9 }),
            (0xF915, Op::Load_Delay_Vx { vx: 9 }),
            (0xF918, Op::Load_Sound_Vx { vx: 9 }),
            (0xF91E, Op::Add_Address_Vx { vx: 9 }),
            (0xF929, Op::Load_Font { vx: 9 }),
            (0xF933, Op::Store_Bcd { vx: 9 }),
            (0xF955, Op::Store_Registers { vx: 9 }),
            (0xF965, Op::Load_Registers { vx: 9 }),
        ];

        for (word, op) in table {
            assert_eq!(Op::try_from(word), Ok(op), "decoding {word:04X}");
        }
    }

    #[test]
    fn test_decode_unsupported() {
        for word in [
            0x0123, 0x00E1, 0x01E0, 0x5121, 0x8128, 0x812F, 0x9121, 0xE59F, 0xE5A2, 0xF900,
            0xF956, 0xFFFF,
        ] {
            assert_eq!(Op::try_from(word), Err(InvalidOpcode(word)), "decoding {word:04X}");
        }
    }

    #[test]
    fn test_display_mnemonics() {
        assert_eq!(Op::ClearScreen.to_string(), "CLS");
        assert_eq!(Op::Call { address: 0x2A0 }.to_string(), "CALL 0x2A0");
        assert_eq!(Op::Add_Vx_Vy { vx: 1, vy: 0xF }.to_string(), "ADD v1, vF");
        assert_eq!(Op::Draw { vx: 0, vy: 1, n: 4 }.to_string(), "DRW v0, v1, 4");
        assert_eq!(Op::Store_Bcd { vx: 3 }.to_string(), "LD B, v3");
    }
}
