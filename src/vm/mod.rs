pub mod core;
pub mod disp;
pub mod input;
pub mod instruct;
pub mod interp;
pub mod mem;
pub mod run;

pub use self::{
    core::VM,
    disp::{Display, DisplayMode},
    input::Keypad,
    instruct::{Instruction, InstructionParameters},
    interp::Fault,
    mem::LoadError,
    run::{RunAnalytics, Runner, RunnerCommand, RunnerError, RunnerEvent},
};
