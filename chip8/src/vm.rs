//! Virtual machine.
use std::fmt::{self, Write};

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    bcd::to_decimal_digits,
    constants::*,
    cpu::Chip8Cpu,
    devices::KeyCode,
    error::{Chip8Error, Chip8Result},
    op::{InvalidOpcode, Op},
};

pub struct Chip8Vm {
    cpu: Chip8Cpu,
    rng: StdRng,
    conf: Chip8Conf,
}

impl Chip8Vm {
    /// Creates a machine with the font loaded and the program counter at [`MEM_START`].
    pub fn new(conf: Chip8Conf) -> Self {
        let rng = match conf.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Chip8Vm {
            cpu: Chip8Cpu::new(),
            rng,
            conf,
        }
    }

    /// Configuration that was used to instantiate the VM.
    pub fn config(&self) -> &Chip8Conf {
        &self.conf
    }

    /// Zero all registers, memory, timers, keys and the display, then reload the font.
    pub fn reset(&mut self) {
        self.cpu = Chip8Cpu::new();
        log::debug!("machine reset");
    }

    /// Loads a program image at [`MEM_START`].
    ///
    /// The machine is reset first, so no state leaks from a previous program.
    /// Images that don't fit are rejected and the machine is left untouched.
    pub fn load_bytecode(&mut self, bytecode: &[u8]) -> Chip8Result<()> {
        if bytecode.len() > PROGRAM_CAPACITY {
            return Err(Chip8Error::LargeProgram {
                size: bytecode.len(),
                capacity: PROGRAM_CAPACITY,
            });
        }

        self.reset();

        // Load program into virtual RAM
        self.cpu.ram[MEM_START..MEM_START + bytecode.len()].copy_from_slice(bytecode);
        log::debug!("loaded program of {} bytes", bytecode.len());

        Ok(())
    }

    pub fn display_buffer(&self) -> Chip8DisplayBuffer {
        &self.cpu.display
    }

    /// State of the pixel at the given screen coordinate.
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.cpu.display[(x % DISPLAY_WIDTH) + (y % DISPLAY_HEIGHT) * DISPLAY_WIDTH]
    }

    pub fn pc(&self) -> Address {
        self.cpu.pc
    }

    /// Value of general purpose register `Vx`.
    pub fn register(&self, vx: u8) -> u8 {
        self.cpu.registers[vx as usize & 0xF]
    }

    /// Value of the address register `I`.
    pub fn address(&self) -> Address {
        self.cpu.address
    }

    pub fn delay_timer(&self) -> u8 {
        self.cpu.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.cpu.sound_timer
    }

    pub fn ram(&self) -> &[u8] {
        &*self.cpu.ram
    }

    /// Number of return addresses on the call stack.
    pub fn stack_depth(&self) -> usize {
        self.cpu.sp
    }

    /// True while `Fx0A` is stalled waiting for a keypress.
    pub fn is_waiting_for_key(&self) -> bool {
        self.cpu.key_wait
    }
}

/// What happened during a single [`Chip8Vm::tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum Flow {
    Ok,
    /// Program counter has jumped to a new address.
    ///
    /// This is useful for the caller to avoid being
    /// blocked on infinite or long running loops.
    ///
    /// This is returned when the interpreter encounters:
    ///
    /// - 1nnn (`JP addr`)
    /// - 2nnn (`CALL addr`)
    /// - 00EE (`RET`)
    /// - Bnnn (`JP V0, addr`)
    Jump,
    /// The display buffer changed, either cleared or drawn to.
    Draw,
    /// The sound timer was set.
    Sound,
    /// Wait for a keypress.
    ///
    /// This is triggered by the opcode `Fx0A` (`LD Vx, K`), which stops
    /// execution until a key is pressed, and loads the key value into `Vx`.
    KeyWait,
}

/// Outcome of counting down the timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sound {
    Quiet,
    /// The sound timer just reached zero.
    Beep,
}

/// VM Configuration Parameters.
#[derive(Debug, Default, Clone)]
pub struct Chip8Conf {
    /// Seed for the random number generator used by `Cxnn`.
    ///
    /// Seeded from system entropy when `None`.
    pub seed: Option<u64>,
}

/// Interpreter
impl Chip8Vm {
    /// Sets the keyboard key input state.
    ///
    /// If the VM is waiting for keyboard input, a key press clears the
    /// `key_wait` flag so it can be resumed. Releases leave it waiting.
    pub fn set_key(&mut self, key: KeyCode, pressed: bool) {
        self.cpu.set_key_state(key.as_u8(), pressed);
        if pressed {
            self.cpu.key_wait = false;
        }
    }

    /// Clear the keyboard input state, setting all keys to up.
    pub fn clear_keys(&mut self) {
        self.cpu.clear_keys()
    }

    /// Count down the delay and sound timers.
    ///
    /// Must be called at a lower rate than [`Chip8Vm::tick`], canonically 60Hz.
    pub fn tick_timers(&mut self) -> Sound {
        self.cpu.tick_delay();

        if self.cpu.tick_sound() {
            Sound::Beep
        } else {
            Sound::Quiet
        }
    }

    /// Execute up to `step_count` instructions, stopping at the first error.
    pub fn run_steps(&mut self, step_count: usize) -> Chip8Result<Flow> {
        let mut control_flow = Flow::Ok;

        for _ in 0..step_count {
            control_flow = self.tick()?;
        }

        Ok(control_flow)
    }

    /// Fetch, decode and execute exactly one instruction.
    pub fn tick(&mut self) -> Chip8Result<Flow> {
        let address = self.cpu.pc;
        let word = self.cpu.fetch()?;
        let op = Op::try_from(word)
            .map_err(|InvalidOpcode(opcode)| Chip8Error::UnsupportedOpcode { opcode, address })?;

        op_trace(address, &op);

        self.execute(op).map_err(|err| {
            log::warn!("{err}");
            err
        })
    }

    fn execute(&mut self, op: Op) -> Chip8Result<Flow> {
        let mut control_flow = Flow::Ok;

        match op {
            Op::NoOp => { /* No Op */ }
            // 00E0 (CLS)
            Op::ClearScreen => {
                self.cpu.clear_display();
                control_flow = Flow::Draw;
            }
            // 00EE (RET)
            //
            // Return from a subroutine.
            // Set the program counter to the value at the top of the stack.
            Op::Return => {
                self.cpu.pc = self.cpu.pop()?;
                control_flow = Flow::Jump;
            }
            // 1NNN (JP addr)
            Op::JumpAddress { address } => {
                self.cpu.pc = address;
                control_flow = Flow::Jump;
            }
            // 2NNN (CALL addr)
            //
            // The program counter already points at the instruction after the call.
            Op::Call { address } => {
                self.cpu.push(self.cpu.pc)?;
                self.cpu.pc = address;
                control_flow = Flow::Jump;
            }
            // 3XNN (SE Vx, byte)
            Op::Skip_Eq_Byte { vx, nn } => {
                if self.cpu.registers[vx as usize] == nn {
                    self.cpu.pc += 2;
                }
            }
            // 4XNN (SNE Vx, byte)
            Op::Skip_NotEq_Byte { vx, nn } => {
                if self.cpu.registers[vx as usize] != nn {
                    self.cpu.pc += 2;
                }
            }
            // 5XY0 (SE Vx, Vy)
            Op::Skip_Eq { vx, vy } => {
                let x = self.cpu.registers[vx as usize];
                let y = self.cpu.registers[vy as usize];
                if x == y {
                    self.cpu.pc += 2;
                }
            }
            // 6XNN (LD Vx, byte)
            Op::Load_Byte { vx, nn } => {
                self.cpu.registers[vx as usize] = nn;
            }
            // 7XNN (ADD Vx, byte)
            //
            // Carry flag is not set.
            Op::Add_Byte { vx, nn } => {
                let x = self.cpu.registers[vx as usize];
                self.cpu.registers[vx as usize] = x.wrapping_add(nn);
            }
            // ----------------------------------------------------------------
            // Flags are always written after the result, so VF as the
            // destination ends up holding the flag.
            //
            // 8XY0 (LD Vx, Vy)
            Op::Load_Vx_Vy { vx, vy } => {
                self.cpu.registers[vx as usize] = self.cpu.registers[vy as usize];
            }
            // 8XY1 (OR Vx, Vy)
            Op::Or_Vx_Vy { vx, vy } => {
                self.cpu.registers[vx as usize] |= self.cpu.registers[vy as usize];
            }
            // 8XY2 (AND Vx, Vy)
            Op::And_Vx_Vy { vx, vy } => {
                self.cpu.registers[vx as usize] &= self.cpu.registers[vy as usize];
            }
            // 8XY3 (XOR Vx, Vy)
            Op::Xor_Vx_Vy { vx, vy } => {
                self.cpu.registers[vx as usize] ^= self.cpu.registers[vy as usize];
            }
            // 8XY4 (ADD Vx, Vy)
            Op::Add_Vx_Vy { vx, vy } => {
                let (x, y) = self.operands(vx, vy);
                let (result, carry) = x.overflowing_add(y);
                self.cpu.registers[vx as usize] = result;
                self.cpu.registers[FLAG_REGISTER] = carry as u8;
            }
            // 8XY5 (SUB Vx, Vy)
            Op::Sub_Vx_Vy { vx, vy } => {
                let (x, y) = self.operands(vx, vy);
                let (result, borrow) = x.overflowing_sub(y);
                self.cpu.registers[vx as usize] = result;
                self.cpu.registers[FLAG_REGISTER] = !borrow as u8;
            }
            // 8XY6 (SHR Vx)
            Op::ShiftRight { vx } => {
                let x = self.cpu.registers[vx as usize];
                self.cpu.registers[vx as usize] = x >> 1;
                self.cpu.registers[FLAG_REGISTER] = x & 1;
            }
            // 8XY7 (SUBN Vx, Vy)
            Op::SubReverse_Vx_Vy { vx, vy } => {
                let (x, y) = self.operands(vx, vy);
                let (result, borrow) = y.overflowing_sub(x);
                self.cpu.registers[vx as usize] = result;
                self.cpu.registers[FLAG_REGISTER] = !borrow as u8;
            }
            // 8XYE (SHL Vx)
            Op::ShiftLeft { vx } => {
                let x = self.cpu.registers[vx as usize];
                self.cpu.registers[vx as usize] = x << 1;
                self.cpu.registers[FLAG_REGISTER] = (x >> 7) & 1;
            }
            // ----------------------------------------------------------------
            // 9XY0 (SNE Vx, Vy)
            Op::Skip_NotEq { vx, vy } => {
                let (x, y) = self.operands(vx, vy);
                if x != y {
                    self.cpu.pc += 2;
                }
            }
            // ANNN (LD I, addr)
            Op::Load_Address { address } => {
                self.cpu.address = address;
            }
            // BNNN (JP V0, addr)
            Op::Jump_V0 { address } => {
                self.cpu.pc = self.cpu.registers[0] as Address + address;
                control_flow = Flow::Jump;
            }
            // CXNN (RND Vx, byte)
            Op::Random { vx, nn } => {
                self.cpu.registers[vx as usize] = nn & self.rng.gen::<u8>();
            }
            // DXYN (DRW Vx, Vy, nibble)
            Op::Draw { vx, vy, n } => {
                self.draw_sprite(vx, vy, n)?;
                control_flow = Flow::Draw;
            }
            // ----------------------------------------------------------------
            // EX9E (SKP Vx)
            Op::Skip_Key_Pressed { vx } => {
                if self.cpu.key_state(self.cpu.registers[vx as usize]) {
                    self.cpu.pc += 2;
                }
            }
            // EXA1 (SKNP Vx)
            Op::Skip_Key_NotPressed { vx } => {
                if !self.cpu.key_state(self.cpu.registers[vx as usize]) {
                    self.cpu.pc += 2;
                }
            }
            // ----------------------------------------------------------------
            // FX07 (LD Vx, DT)
            Op::Load_Vx_Delay { vx } => {
                self.cpu.registers[vx as usize] = self.cpu.delay_timer;
            }
            // FX0A (LD Vx, K)
            //
            // The machine never blocks. Instead the program counter is rewound
            // so the same instruction is fetched again on the next tick.
            Op::Wait_Key { vx } => {
                if let Some(k) = self.cpu.first_key() {
                    self.cpu.registers[vx as usize] = k;
                    self.cpu.key_wait = false;
                } else {
                    // rewind the program counter to stall the machine
                    self.cpu.pc -= 2;
                    self.cpu.key_wait = true;
                    control_flow = Flow::KeyWait;
                }
            }
            // FX15 (LD DT, Vx)
            Op::Load_Delay_Vx { vx } => {
                self.cpu.delay_timer = self.cpu.registers[vx as usize];
            }
            // FX18 (LD ST, Vx)
            Op::Load_Sound_Vx { vx } => {
                self.cpu.sound_timer = self.cpu.registers[vx as usize];
                control_flow = Flow::Sound;
            }
            // FX1E (ADD I, Vx)
            //
            // VF is not affected.
            Op::Add_Address_Vx { vx } => {
                let x = self.cpu.registers[vx as usize] as Address;
                self.cpu.address = self.cpu.address.wrapping_add(x);
            }
            // FX29 (LD F, Vx)
            Op::Load_Font { vx } => {
                let x = self.cpu.registers[vx as usize] as Address;
                self.cpu.address = FONTSET_START + x * FONTSET_HEIGHT as Address;
            }
            // FX33 (LD B, Vx)
            //
            // Store the decimal digits of Vx in the memory locations I, I+1, and I+2.
            Op::Store_Bcd { vx } => {
                let range = self.cpu.mem_range(self.cpu.address, 3)?;
                let digits = to_decimal_digits(self.cpu.registers[vx as usize]);
                self.cpu.ram[range].copy_from_slice(&digits);
            }
            // FX55 (LD [I], Vx)
            //
            // Store registers V0 through Vx inclusive, starting at location I.
            Op::Store_Registers { vx } => {
                let count = vx as usize + 1;
                let range = self.cpu.mem_range(self.cpu.address, count)?;
                self.cpu.ram[range].copy_from_slice(&self.cpu.registers[..count]);
            }
            // FX65 (LD Vx, [I])
            //
            // Read registers V0 through Vx inclusive, starting at location I.
            Op::Load_Registers { vx } => {
                let count = vx as usize + 1;
                let range = self.cpu.mem_range(self.cpu.address, count)?;
                self.cpu.registers[..count].copy_from_slice(&self.cpu.ram[range]);
            }
        }

        Ok(control_flow)
    }

    #[inline(always)]
    fn operands(&self, vx: u8, vy: u8) -> (u8, u8) {
        (
            self.cpu.registers[vx as usize],
            self.cpu.registers[vy as usize],
        )
    }

    /// Draw sprite to the display buffer, at coordinate as per registers Vx and Vy.
    ///
    /// Sprite is encoded as 8 pixels wide, N pixels high, stored in bits located in
    /// memory pointed to by address register I. Pixels past the edge of the display
    /// wrap around to the other side.
    ///
    /// If the drawing operation erases existing pixels in the display buffer, register VF is set to
    /// 1, and set to 0 if no display bits are unset. This is used for collision detection.
    fn draw_sprite(&mut self, vx: u8, vy: u8, n: u8) -> Chip8Result<()> {
        let rows = self.cpu.mem_range(self.cpu.address, n as usize)?;
        let (x, y) = (
            self.cpu.registers[vx as usize] as usize,
            self.cpu.registers[vy as usize] as usize,
        );
        let mut is_erased = false;

        for (r, row) in rows.enumerate() {
            let bits = self.cpu.ram[row];

            // Each row is 8 bits representing the 8 pixels of the sprite.
            for c in 0..SPRITE_WIDTH {
                if (bits >> (7 - c)) & 1 == 0 {
                    continue;
                }

                let d = ((x + c) % DISPLAY_WIDTH) + ((y + r) % DISPLAY_HEIGHT) * DISPLAY_WIDTH;

                // XOR erases a pixel when the old and new values are both 1.
                is_erased |= self.cpu.display[d];
                self.cpu.display[d] = !self.cpu.display[d];
            }
        }

        // If a pixel was erased, then a collision occurred.
        self.cpu.registers[FLAG_REGISTER] = is_erased as u8;

        Ok(())
    }
}

/// Troubleshooting
impl Chip8Vm {
    pub fn dump_display(&self) -> Result<String, fmt::Error> {
        let mut buf = String::new();

        for y in 0..DISPLAY_HEIGHT {
            for x in 0..DISPLAY_WIDTH {
                if self.cpu.display[x + y * DISPLAY_WIDTH] {
                    write!(buf, "#")?;
                } else {
                    write!(buf, ".")?;
                }
            }
            writeln!(buf)?;
        }

        Ok(buf)
    }

    pub fn dump_keys(&self) -> Result<String, fmt::Error> {
        let mut buf = String::new();

        if self.cpu.any_key() {
            write!(buf, "keys: ")?;
            for i in 0..KEY_COUNT {
                if self.cpu.key_state(i) {
                    write!(buf, "k{i:x}")?;
                }
            }
        }

        Ok(buf)
    }
}

#[cfg(feature = "op_trace")]
#[inline]
fn op_trace(address: Address, op: &Op) {
    log::trace!("{address:04X}: {op}");
}

#[cfg(not(feature = "op_trace"))]
#[inline]
fn op_trace(_: Address, _: &Op) {}
