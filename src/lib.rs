//! A CHIP-8 virtual machine: interpreter core, a threaded runner that keeps
//! the 60Hz timers on the wall clock, and a linear disassembler.

pub mod config;
pub mod dasm;
pub mod util;
pub mod vm;
