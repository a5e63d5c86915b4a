use crate::vm::{
    instruct::{Instruction, InstructionParameters},
    mem::{ADDRESS_MASK, PROGRAM_STARTING_ADDRESS},
};

use std::fmt::{self, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Instruction(Instruction),
    // a word that does not decode, most likely sprite or table data
    Unknown,
    // odd trailing byte
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisassembledLine {
    pub address: u16,
    pub bits: u16,
    pub kind: LineKind,
}

impl Display for DisassembledLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            LineKind::Instruction(inst) => {
                write!(f, "{:#05X}: {:#06X} {}", self.address, self.bits, inst)
            }
            LineKind::Unknown => {
                let [byte0, byte1] = self.bits.to_be_bytes();
                let mut graphic = String::with_capacity(16);
                write_byte_str(byte0, &mut graphic)?;
                write_byte_str(byte1, &mut graphic)?;
                write!(f, "{:#05X}: {:#06X} ???  # {}", self.address, self.bits, graphic)
            }
            LineKind::Data => {
                let mut graphic = String::with_capacity(8);
                write_byte_str(self.bits as u8, &mut graphic)?;
                write!(
                    f,
                    "{:#05X}: {:#04X}   db {:#04X}  # {}",
                    self.address, self.bits, self.bits, graphic
                )
            }
        }
    }
}

/// Linear sweep over the ROM as it would sit in memory, one line per word.
/// No control flow is followed so data between routines shows up as `???`.
pub fn disassemble(rom: &[u8]) -> Vec<DisassembledLine> {
    let mut lines = Vec::with_capacity(rom.len() / 2 + 1);
    let mut chunks = rom.chunks_exact(2);

    for (i, chunk) in chunks.by_ref().enumerate() {
        let params = InstructionParameters::from([chunk[0], chunk[1]]);
        let kind = match Instruction::try_from(params) {
            Ok(inst) => LineKind::Instruction(inst),
            Err(_) => LineKind::Unknown,
        };

        lines.push(DisassembledLine {
            address: rom_address(2 * i),
            bits: params.bits,
            kind,
        });
    }

    if let [byte] = chunks.remainder() {
        lines.push(DisassembledLine {
            address: rom_address(rom.len() - 1),
            bits: *byte as u16,
            kind: LineKind::Data,
        });
    }

    log::debug!(
        "disassembled {} lines, {} unknown",
        lines.len(),
        lines.iter().filter(|line| line.kind == LineKind::Unknown).count()
    );

    lines
}

// address the byte at `offset` would occupy once loaded, wrapping like memory does
fn rom_address(offset: usize) -> u16 {
    ((PROGRAM_STARTING_ADDRESS as usize).wrapping_add(offset) & ADDRESS_MASK as usize) as u16
}

fn write_byte_str(byte: u8, f: &mut impl fmt::Write) -> fmt::Result {
    for filled in (0..8).rev().map(|i| byte >> i & 1 == 1) {
        f.write_char(if filled { '@' } else { '.' })?;
    }

    Ok(())
}
