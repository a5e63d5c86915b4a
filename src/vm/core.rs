use super::{
    disp::Display,
    input::Keypad,
    interp::{Fault, Interpreter, InterpreterRequest},
    mem::{LoadError, Memory},
};

use crate::config::VMConfig;

/// The machine as seen by a host.
///
/// Owns the interpreter (registers, memory, stack, framebuffer, keypad) and the
/// two 8-bit timers. The interpreter asks for timer writes and redraws through
/// [`InterpreterRequest`]s which are applied here after every instruction.
///
/// Hosts call [`VM::step`] for the classic one-instruction-one-timer-tick cycle,
/// or [`VM::execute`] and [`VM::tick_timers`] separately to run instructions and
/// timers at independent rates (see `vm::run`).
#[derive(Debug)]
pub struct VM {
    interp: Interpreter,

    running: bool,

    // Virtualized IO
    display: bool,
    beep: bool,

    delay_timer: u8,
    sound_timer: u8,
}

impl VM {
    pub fn new(config: &VMConfig) -> Self {
        let mut vm = VM {
            interp: Interpreter::from(config),
            running: true,
            display: false,
            beep: false,
            delay_timer: 0,
            sound_timer: 0,
        };
        vm.reset();
        vm
    }

    pub fn with_rom(config: &VMConfig, rom: &[u8]) -> Result<Self, LoadError> {
        let mut vm = VM::new(config);
        vm.load(rom)?;
        Ok(vm)
    }

    pub fn reset(&mut self) {
        self.interp.reset();
        self.running = true;
        self.display = false;
        self.beep = false;
        self.delay_timer = 0;
        self.sound_timer = 0;
    }

    pub fn load(&mut self, rom: &[u8]) -> Result<(), LoadError> {
        self.interp.memory.load(rom).map_err(|err| {
            log::error!("{}", err);
            err
        })?;
        log::info!("loaded {}B ROM", rom.len());
        Ok(())
    }

    /// Executes one instruction then ticks both timers once.
    pub fn step(&mut self) -> Result<(), Fault> {
        if !self.running {
            return Ok(());
        }

        let result = self.execute();
        self.tick_timers();
        result
    }

    /// Executes one instruction without touching the timers.
    pub fn execute(&mut self) -> Result<(), Fault> {
        if !self.running {
            return Ok(());
        }

        // update interpreter input
        self.interp.input.delay_timer = self.delay_timer;

        // interpret next instruction
        let result = self.interp.step();

        // handle any external request by the executed instruction
        if let Some(request) = self.interp.request.take() {
            match request {
                InterpreterRequest::Display => self.display = true,
                InterpreterRequest::SetDelayTimer(ticks) => self.delay_timer = ticks,
                InterpreterRequest::SetSoundTimer(ticks) => self.sound_timer = ticks,
            }
        }

        result.map(|_| ())
    }

    pub fn tick_timers(&mut self) {
        if self.delay_timer > 0 {
            self.delay_timer -= 1;
        }

        if self.sound_timer > 0 {
            self.sound_timer -= 1;
            if self.sound_timer == 0 {
                log::info!("beep");
                self.beep = true;
            }
        }
    }

    /// Returns true once per sound timer expiry.
    pub fn take_beep(&mut self) -> bool {
        std::mem::take(&mut self.beep)
    }

    pub fn draw_flag(&self) -> bool {
        self.display
    }

    pub fn clear_draw_flag(&mut self) {
        self.display = false;
    }

    pub fn extract_new_frame(&mut self) -> Option<Display> {
        if self.display {
            self.display = false;
            Some(self.interp.display.clone())
        } else {
            None
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn halt(&mut self) {
        if self.running {
            log::debug!("halting at {:#05X}", self.interp.pc);
        }
        self.running = false;
    }

    pub fn press_key(&mut self, key: u8) {
        self.interp.input.keypad.press(key);
    }

    pub fn release_key(&mut self, key: u8) {
        self.interp.input.keypad.release(key);
    }

    pub fn keypad(&self) -> &Keypad {
        &self.interp.input.keypad
    }

    pub fn keypad_mut(&mut self) -> &mut Keypad {
        &mut self.interp.input.keypad
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interp
    }

    pub fn display(&self) -> &Display {
        &self.interp.display
    }

    pub fn memory(&self) -> &Memory {
        &self.interp.memory
    }

    pub fn registers(&self) -> &[u8; 16] {
        &self.interp.registers
    }

    pub fn index(&self) -> u16 {
        self.interp.index
    }

    pub fn pc(&self) -> u16 {
        self.interp.pc
    }

    pub fn stack(&self) -> &[u16] {
        &self.interp.stack
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }
}

impl Default for VM {
    fn default() -> Self {
        VM::new(&VMConfig::default())
    }
}
