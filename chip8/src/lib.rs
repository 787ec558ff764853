//! Chip-8 virtual machine.
//!
//! The host owns scheduling: it calls [`prelude::Chip8Vm::tick`] many times per
//! frame, [`prelude::Chip8Vm::tick_timers`] once per frame at 60Hz, then reads the
//! display buffer and reports key state before the next batch of ticks.
mod bcd;
mod bytecode;
pub mod constants;
mod cpu;
mod devices;
mod error;
mod op;
mod vm;

pub use self::{
    bcd::to_decimal_digits,
    devices::{InvalidKeyCode, KeyCode},
    error::{Chip8Error, Chip8Result},
    op::{InvalidOpcode, Op},
};

pub const IMPL_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod prelude {
    pub use super::{
        devices::KeyCode,
        error::{Chip8Error, Chip8Result},
        vm::{Chip8Conf, Chip8Vm, Flow, Sound},
    };
}
