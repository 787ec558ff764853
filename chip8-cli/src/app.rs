//! Headless host loop.
use std::io::Write;

use chip8::prelude::*;
use log::{info, warn};

use crate::{
    clock::{Clock, Hz},
    config::{OnError, RunConfig},
    error::AppError,
};

/// Drives the VM one frame at a time.
pub struct Runner {
    vm: Chip8Vm,
    config: RunConfig,
    clock: Clock,
    frame: u64,
    beeps: usize,
}

impl Runner {
    pub fn new(config: RunConfig) -> Self {
        let vm = Chip8Vm::new(Chip8Conf { seed: config.seed });
        let clock = Clock::new(Hz(config.frame_rate));

        Self {
            vm,
            config,
            clock,
            frame: 0,
            beeps: 0,
        }
    }

    pub fn vm(&self) -> &Chip8Vm {
        &self.vm
    }

    /// Number of frames completed so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Number of times the sound timer has expired.
    pub fn beeps(&self) -> usize {
        self.beeps
    }

    /// Load ROM file into VM
    pub fn load_rom(&mut self, filepath: &str) -> Result<(), AppError> {
        info!("load rom: {filepath}");

        let bytecode = std::fs::read(filepath)?;
        self.load_bytecode(&bytecode)
    }

    pub fn load_bytecode(&mut self, bytecode: &[u8]) -> Result<(), AppError> {
        self.vm.load_bytecode(bytecode)?;
        self.frame = 0;
        self.beeps = 0;
        Ok(())
    }

    /// Run frames until the frame limit or an error.
    pub fn run(&mut self) -> Result<(), AppError> {
        self.clock.reset();

        while self.config.max_frames.map_or(true, |max| self.frame < max) {
            self.step_frame()?;
            self.clock.wait();
        }

        info!("stopped after {} frames", self.frame);

        Ok(())
    }

    /// Advance the machine by a single frame, without pacing.
    pub fn step_frame(&mut self) -> Result<(), AppError> {
        // Scripted input
        for event in self.config.keys_at(self.frame) {
            log::debug!("frame {}: {} pressed={}", self.frame, event.key, event.pressed);
            self.vm.set_key(event.key, event.pressed);
        }

        for _ in 0..self.config.ticks_per_frame {
            match self.vm.tick() {
                // Blocked until the next frame's input
                Ok(Flow::KeyWait) => break,
                Ok(_) => {}
                Err(err @ Chip8Error::UnsupportedOpcode { .. })
                    if self.config.on_error == OnError::Ignore =>
                {
                    warn!("ignoring {err}");
                }
                Err(err) => return Err(err.into()),
            }
        }

        if self.vm.tick_timers() == Sound::Beep {
            self.beeps += 1;
            info!("BEEP");

            if self.config.bell {
                let mut stderr = std::io::stderr();
                stderr.write_all(b"\x07")?;
                stderr.flush()?;
            }
        }

        if log::log_enabled!(log::Level::Debug) {
            let keys = self.vm.dump_keys()?;
            if !keys.is_empty() {
                log::debug!("frame {}: {keys}", self.frame);
            }
        }

        self.frame += 1;

        Ok(())
    }
}
