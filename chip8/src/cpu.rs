//! CPU and memory state.
use crate::{
    bytecode::instr_word,
    constants::*,
    error::{Chip8Error, Chip8Result},
};

/// Core state for a chip8 interpreter.
pub struct Chip8Cpu {
    // ------------------------------------------------------------------------
    // Registers
    /// Program counter pointing to the next instruction to fetch.
    pub(crate) pc: Address,
    /// Stack pointer, the number of return addresses on the stack.
    pub(crate) sp: usize,
    /// General purpose registers for temporary values.
    ///
    /// Register 15 (VF) is used for either the carry flag or borrow switch depending on opcode.
    pub(crate) registers: [u8; REGISTER_COUNT],
    /// Pointer register used for temporarily storing an address.
    pub(crate) address: Address,
    /// (DT) Delay timer that counts down to 0.
    pub(crate) delay_timer: u8,
    /// (ST) Sound timer that counts down to 0.
    pub(crate) sound_timer: u8,
    /// Indicates that the machine is waiting for a keypress.
    pub(crate) key_wait: bool,
    /// Keyboard input state. Pressed is a 1 bit, released is a 0 bit.
    pub(crate) key_state: u16,

    // ------------------------------------------------------------------------
    // Memory
    /// Main memory storage space.
    pub(crate) ram: Box<[u8; MEM_SIZE]>,
    /// Stack of return pointers used for jumping when a routine call finishes.
    pub(crate) stack: Box<[Address; STACK_SIZE]>,
    /// Screen buffer that is drawn to.
    pub(crate) display: Box<[bool; DISPLAY_BUFFER_SIZE]>,
}

impl Default for Chip8Cpu {
    fn default() -> Self {
        Self {
            pc: MEM_START as Address,
            sp: 0,
            registers: [0; REGISTER_COUNT],
            address: 0,
            delay_timer: 0,
            sound_timer: 0,
            key_wait: false,
            key_state: 0,

            ram: Box::new([0; MEM_SIZE]),
            stack: Box::new([0; STACK_SIZE]),
            display: Box::new([false; DISPLAY_BUFFER_SIZE]),
        }
    }
}

impl Chip8Cpu {
    /// Zeroed machine with the font set loaded.
    pub fn new() -> Self {
        let mut cpu = Self::default();
        cpu.load_font();
        cpu
    }

    pub(crate) fn load_font(&mut self) {
        let start = FONTSET_START as usize;
        self.ram[start..start + FONTSET_DATA_LENGTH].copy_from_slice(&FONTSET);
    }

    pub fn clear_display(&mut self) {
        self.display.fill(false);
    }

    pub fn set_key_state(&mut self, key_id: u8, state: bool) {
        if key_id < KEY_COUNT {
            if state {
                self.key_state |= 1 << key_id;
            } else {
                self.key_state &= !(1 << key_id);
            }
        }
    }

    /// Keys outside the keypad are never pressed.
    pub fn key_state(&self, key_id: u8) -> bool {
        if key_id < KEY_COUNT {
            self.key_state & (1 << key_id) > 0
        } else {
            false
        }
    }

    /// Check whether any key is pressed down.
    #[inline(always)]
    pub fn any_key(&self) -> bool {
        self.key_state > 0
    }

    /// Retrieve the value of the first key that is pressed down.
    #[inline]
    pub fn first_key(&self) -> Option<u8> {
        if self.any_key() {
            (0..KEY_COUNT).find(|k| self.key_state(*k))
        } else {
            None
        }
    }

    /// Clear the keyboard input state, setting all keys to up.
    #[inline(always)]
    pub fn clear_keys(&mut self) {
        self.key_state = 0;
    }

    /// Count down the delay timer.
    #[inline]
    pub fn tick_delay(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
    }

    /// Count down the sound timer.
    ///
    /// Returns `true` only when the timer transitions from 1 to 0.
    #[inline]
    pub fn tick_sound(&mut self) -> bool {
        match self.sound_timer {
            0 => false,
            1 => {
                self.sound_timer = 0;
                true
            }
            _ => {
                self.sound_timer -= 1;
                false
            }
        }
    }

    /// Read the instruction word at the program counter and advance past it.
    #[inline]
    pub fn fetch(&mut self) -> Chip8Result<u16> {
        let pc = self.pc as usize;
        if pc + 1 >= MEM_SIZE {
            return Err(Chip8Error::ProgramCounterOutOfBounds { pc: self.pc });
        }

        let word = instr_word(&*self.ram, pc);
        self.pc += 2;

        Ok(word)
    }

    /// Push a return address onto the call stack.
    pub(crate) fn push(&mut self, return_address: Address) -> Chip8Result<()> {
        if self.sp >= STACK_SIZE {
            return Err(Chip8Error::StackOverflow {
                address: return_address.wrapping_sub(2),
            });
        }

        self.stack[self.sp] = return_address;
        self.sp += 1;

        Ok(())
    }

    /// Pop the most recent return address off the call stack.
    pub(crate) fn pop(&mut self) -> Chip8Result<Address> {
        if self.sp == 0 {
            return Err(Chip8Error::StackUnderflow {
                address: self.pc.wrapping_sub(2),
            });
        }

        self.sp -= 1;
        Ok(self.stack[self.sp])
    }

    /// Checks that `len` bytes starting at `address` are inside RAM.
    #[inline]
    pub(crate) fn mem_range(
        &self,
        address: Address,
        len: usize,
    ) -> Chip8Result<std::ops::Range<usize>> {
        let start = address as usize;
        let end = start + len;
        if end > MEM_SIZE {
            Err(Chip8Error::MemoryOutOfBounds {
                address: start,
                len,
            })
        } else {
            Ok(start..end)
        }
    }
}
