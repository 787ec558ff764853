//! Result and errors.
use std::fmt::{self, Display, Formatter};

use crate::constants::Address;

pub type Chip8Result<T> = std::result::Result<T, Chip8Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chip8Error {
    /// Decoding reached an instruction word with no defined behaviour.
    ///
    /// The address is where the word was fetched from.
    UnsupportedOpcode { opcode: u16, address: Address },
    /// Subroutine call with a full call stack.
    StackOverflow { address: Address },
    /// Return from subroutine with an empty call stack.
    StackUnderflow { address: Address },
    /// Program counter points past the last full instruction in memory.
    ProgramCounterOutOfBounds { pc: Address },
    /// Instruction tried to access memory past the end of RAM.
    MemoryOutOfBounds { address: usize, len: usize },
    /// Attempt to load a bytecode program that can't fit in memory.
    LargeProgram { size: usize, capacity: usize },
}

impl Display for Chip8Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedOpcode { opcode, address } => {
                write!(f, "unsupported opcode {opcode:04X} at 0x{address:03X}")
            }
            Self::StackOverflow { address } => {
                write!(f, "call stack overflow at 0x{address:03X}")
            }
            Self::StackUnderflow { address } => {
                write!(f, "call stack underflow at 0x{address:03X}")
            }
            Self::ProgramCounterOutOfBounds { pc } => {
                write!(f, "program counter 0x{pc:04X} is outside of memory")
            }
            Self::MemoryOutOfBounds { address, len } => write!(
                f,
                "memory access of {len} bytes at 0x{address:04X} is outside of memory"
            ),
            Self::LargeProgram { size, capacity } => write!(
                f,
                "program too large for VM memory: {size} bytes, capacity is {capacity}"
            ),
        }
    }
}

impl std::error::Error for Chip8Error {}
