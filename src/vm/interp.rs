use super::{
    disp::{Display, DisplayMode},
    input::Keypad,
    instruct::{Instruction, InstructionParameters},
    mem::{
        add_addresses, Memory, ADDRESS_MASK, FONT_CHAR_DATA_SIZE, FONT_STARTING_ADDRESS,
        PROGRAM_STARTING_ADDRESS,
    },
};

use crate::config::VMConfig;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const VFLAG: usize = 15;
pub const STACK_CAPACITY: usize = 16;

// COSMAC VIP 64x64 programs boot with a jump over the 64x64 interpreter patch
// and expect to land at 0x2C0 once the taller display is in place
const VIP_HIRES_BOOT_INSTRUCTION: u16 = 0x1260;
const VIP_HIRES_ENTRY_INSTRUCTION: u16 = 0x12C0;

/// Faults raised while executing a single instruction.
/// None of them stop the interpreter: the program counter has already moved
/// past the faulting instruction and no other state was touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    UnknownOpcode(u16),
    StackOverflow(u16),
    StackUnderflow,
}

impl std::fmt::Display for Fault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Fault::UnknownOpcode(bits) => write!(f, "unknown opcode {:#06X}", bits),
            Fault::StackOverflow(address) => write!(
                f,
                "call to {:#05X} overflows the {} entry call stack",
                address, STACK_CAPACITY
            ),
            Fault::StackUnderflow => write!(f, "return with an empty call stack"),
        }
    }
}

impl std::error::Error for Fault {}

// State the interpreter pulls from IO is stored here
#[derive(Debug, Default, Clone)]
pub struct InterpreterInput {
    pub delay_timer: u8,
    pub keypad: Keypad,
}

// Interpreter IO Request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpreterRequest {
    Display,
    SetDelayTimer(u8),
    SetSoundTimer(u8),
}

#[derive(Debug)]
pub struct Interpreter {
    pub memory: Memory,
    pub pc: u16,
    pub index: u16,
    pub stack: Vec<u16>,
    pub registers: [u8; 16],
    pub display: Display,
    pub input: InterpreterInput,
    pub request: Option<InterpreterRequest>,

    vip_hires_quirk: bool,
    seed: Option<u64>,
    rng: StdRng,
}

impl From<&VMConfig> for Interpreter {
    fn from(config: &VMConfig) -> Self {
        Interpreter {
            memory: Memory::default(),
            pc: PROGRAM_STARTING_ADDRESS,
            index: 0,
            stack: Vec::with_capacity(STACK_CAPACITY),
            registers: [0; 16],
            display: Display::default(),
            input: Default::default(),
            request: None,

            vip_hires_quirk: config.vip_hires_quirk,
            seed: config.seed,
            rng: Self::rng(config.seed),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::from(&VMConfig::default())
    }
}

impl Interpreter {
    fn rng(seed: Option<u64>) -> StdRng {
        seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64)
    }

    pub fn reset(&mut self) {
        self.memory.reset();
        self.pc = PROGRAM_STARTING_ADDRESS;
        self.index = 0;
        self.stack.clear();
        self.registers = [0; 16];
        self.display = Display::default();
        self.input = Default::default();
        self.request = None;
        self.rng = Self::rng(self.seed);
    }

    // interpret the next instruction
    pub fn step(&mut self) -> Result<Instruction, Fault> {
        // clear output request
        self.request = None;

        // fetch + decode
        let address = self.pc;
        let params = self.apply_vip_hires_quirk(self.fetch());

        self.pc = (self.pc + 2) & ADDRESS_MASK;

        let inst = Instruction::try_from(params).map_err(|fault| {
            log::warn!("{} at {:#05X}, skipping it", fault, address);
            fault
        })?;

        log::trace!("instruction {:#05X?} {:?} ", address, inst);

        // exec instruction
        self.exec(inst)?;

        Ok(inst)
    }

    pub fn fetch(&self) -> InstructionParameters {
        InstructionParameters::from(self.memory.read_word(self.pc))
    }

    fn apply_vip_hires_quirk(&mut self, params: InstructionParameters) -> InstructionParameters {
        if !self.vip_hires_quirk
            || self.pc != PROGRAM_STARTING_ADDRESS
            || params.bits != VIP_HIRES_BOOT_INSTRUCTION
        {
            return params;
        }

        if self.display.mode() != DisplayMode::Vip {
            log::info!(
                "boot instruction {:#06X} detected, switching to the 64x64 COSMAC VIP display",
                VIP_HIRES_BOOT_INSTRUCTION
            );
            self.display.set_mode(DisplayMode::Vip);
            self.request = Some(InterpreterRequest::Display);
        }

        InstructionParameters::from(VIP_HIRES_ENTRY_INSTRUCTION)
    }

    fn skip_if(&mut self, condition: bool) {
        if condition {
            self.pc = (self.pc + 2) & ADDRESS_MASK;
        }
    }

    fn set_with_flag(&mut self, vx: u8, value: u8, flag: bool) {
        // flag is written last so it wins when vx is VF
        self.registers[vx as usize] = value;
        self.registers[VFLAG] = flag as u8;
    }

    pub fn exec(&mut self, inst: Instruction) -> Result<(), Fault> {
        match inst {
            Instruction::ClearScreen => {
                self.display.clear();
                self.request = Some(InterpreterRequest::Display);
            }

            Instruction::SubroutineReturn => {
                let Some(address) = self.stack.pop() else {
                    log::error!("return with an empty call stack, continuing at {:#05X}", self.pc);
                    return Err(Fault::StackUnderflow);
                };
                self.pc = address;
            }

            Instruction::Jump(address) => self.pc = address,

            Instruction::CallSubroutine(address) => {
                if self.stack.len() >= STACK_CAPACITY {
                    log::error!("call stack is full ({:04X?})", self.stack);
                    return Err(Fault::StackOverflow(address));
                }
                self.stack.push(self.pc);
                self.pc = address;
            }

            Instruction::SkipIfEqualsConstant(vx, value) => {
                self.skip_if(self.registers[vx as usize] == value)
            }

            Instruction::SkipIfNotEqualsConstant(vx, value) => {
                self.skip_if(self.registers[vx as usize] != value)
            }

            Instruction::SkipIfEquals(vx, vy) => {
                self.skip_if(self.registers[vx as usize] == self.registers[vy as usize])
            }

            Instruction::SkipIfNotEquals(vx, vy) => {
                self.skip_if(self.registers[vx as usize] != self.registers[vy as usize])
            }

            Instruction::SetConstant(vx, value) => self.registers[vx as usize] = value,

            Instruction::AddConstant(vx, change) => {
                self.registers[vx as usize] = self.registers[vx as usize].wrapping_add(change)
            }

            Instruction::Set(vx, vy) => self.registers[vx as usize] = self.registers[vy as usize],

            Instruction::Or(vx, vy) => self.registers[vx as usize] |= self.registers[vy as usize],

            Instruction::And(vx, vy) => self.registers[vx as usize] &= self.registers[vy as usize],

            Instruction::Xor(vx, vy) => self.registers[vx as usize] ^= self.registers[vy as usize],

            Instruction::Add(vx, vy) => {
                let (value, overflowed) =
                    self.registers[vx as usize].overflowing_add(self.registers[vy as usize]);
                self.set_with_flag(vx, value, overflowed);
            }

            // vf is 1 when no borrow happens, the opposite of add
            Instruction::Sub(vx, vy) => {
                let (x, y) = (self.registers[vx as usize], self.registers[vy as usize]);
                self.set_with_flag(vx, x.wrapping_sub(y), x > y);
            }

            Instruction::SubReversed(vx, vy) => {
                let (x, y) = (self.registers[vx as usize], self.registers[vy as usize]);
                self.set_with_flag(vx, y.wrapping_sub(x), y >= x);
            }

            Instruction::ShiftRight(vx) => {
                let bits = self.registers[vx as usize];
                self.set_with_flag(vx, bits >> 1, bits & 1 == 1);
            }

            Instruction::ShiftLeft(vx) => {
                let bits = self.registers[vx as usize];
                self.set_with_flag(vx, bits << 1, bits >> 7 == 1);
            }

            Instruction::SetIndex(index) => self.index = index,

            Instruction::JumpWithOffset(address) => {
                self.pc = (address + self.registers[0] as u16) & ADDRESS_MASK
            }

            Instruction::GenerateRandom(vx, bound) => {
                self.registers[vx as usize] = self.rng.gen::<u8>() & bound
            }

            Instruction::Draw(vx, vy, height) => {
                let mut sprite = [0; 0xF];
                let sprite = &mut sprite[..height as usize];
                self.memory.export(self.index, sprite);

                let collided = self.display.draw(
                    self.registers[vx as usize],
                    self.registers[vy as usize],
                    sprite,
                );

                self.registers[VFLAG] = collided as u8;
                self.request = Some(InterpreterRequest::Display);
            }

            Instruction::SkipIfKeyDown(vx) => {
                self.skip_if(self.input.keypad.is_pressed(self.registers[vx as usize]))
            }

            Instruction::SkipIfKeyNotDown(vx) => {
                self.skip_if(!self.input.keypad.is_pressed(self.registers[vx as usize]))
            }

            Instruction::GetDelayTimer(vx) => self.registers[vx as usize] = self.input.delay_timer,

            // no key means we point back at this instruction so the next step runs it again
            Instruction::WaitForKey(vx) => match self.input.keypad.first_pressed() {
                Some(key) => self.registers[vx as usize] = key,
                None => self.pc = self.pc.wrapping_sub(2) & ADDRESS_MASK,
            },

            Instruction::SetDelayTimer(vx) => {
                self.request = Some(InterpreterRequest::SetDelayTimer(self.registers[vx as usize]))
            }

            Instruction::SetSoundTimer(vx) => {
                self.request = Some(InterpreterRequest::SetSoundTimer(self.registers[vx as usize]))
            }

            Instruction::AddToIndex(vx) => {
                let (index, overflowed) = add_addresses(self.index, self.registers[vx as usize] as u16);
                self.index = index;
                self.registers[VFLAG] = overflowed as u8;
            }

            Instruction::SetIndexToHexChar(vx) => {
                self.index = (FONT_STARTING_ADDRESS
                    + FONT_CHAR_DATA_SIZE as u16 * self.registers[vx as usize] as u16)
                    & ADDRESS_MASK
            }

            Instruction::StoreDecimal(vx) => {
                let number = self.registers[vx as usize];
                self.memory
                    .import(&[number / 100, number / 10 % 10, number % 10], self.index);
            }

            Instruction::Store(vx) => {
                self.memory
                    .import(&self.registers[..=vx as usize], self.index);
                self.index = add_addresses(self.index, vx as u16 + 1).0;
            }

            Instruction::Load(vx) => {
                self.memory
                    .export(self.index, &mut self.registers[..=vx as usize]);
                self.index = add_addresses(self.index, vx as u16 + 1).0;
            }
        }

        Ok(())
    }
}
