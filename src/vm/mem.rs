use std::fmt::Display;

pub const MEMORY_SIZE: usize = 4096;
pub const ADDRESS_MASK: u16 = 0x0FFF;

pub const PROGRAM_STARTING_ADDRESS: u16 = 0x200;
pub const PROGRAM_MAX_SIZE: usize = 0xDFF;

// font lives at the very bottom of memory so glyph addresses are just Vx * 5
pub const FONT_STARTING_ADDRESS: u16 = 0x000;
pub const FONT_CHAR_DATA_SIZE: u8 = 5;
pub const FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    RomTooLarge { size: usize, max_size: usize },
}

impl Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::RomTooLarge { size, max_size } => write!(
                f,
                "ROM size ({}B) exceeds maximum size ({}B)",
                size, max_size
            ),
        }
    }
}

impl std::error::Error for LoadError {}

/// Adds two 12-bit addresses, wrapping at the top of memory.
/// The returned flag is set when the raw sum did not fit in 12 bits.
pub fn add_addresses(lhs: u16, rhs: u16) -> (u16, bool) {
    let sum = (lhs & ADDRESS_MASK) as u32 + rhs as u32;
    ((sum as u16) & ADDRESS_MASK, sum > ADDRESS_MASK as u32)
}

/// The 4KB address space. Every access wraps modulo [`MEMORY_SIZE`] so that
/// instructions touching the last few bytes never read or write out of bounds.
#[derive(Clone, PartialEq, Eq)]
pub struct Memory {
    bytes: [u8; MEMORY_SIZE],
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memory").field("size", &MEMORY_SIZE).finish()
    }
}

impl Default for Memory {
    fn default() -> Self {
        let mut memory = Memory {
            bytes: [0; MEMORY_SIZE],
        };
        memory.reset();
        memory
    }
}

impl AsRef<[u8]> for Memory {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl Memory {
    pub fn reset(&mut self) {
        self.bytes.fill(0);
        self.import(&FONT, FONT_STARTING_ADDRESS);
    }

    // rom is validated before memory is touched so a failed load leaves it as it was
    pub fn load(&mut self, rom: &[u8]) -> Result<(), LoadError> {
        if rom.len() > PROGRAM_MAX_SIZE {
            return Err(LoadError::RomTooLarge {
                size: rom.len(),
                max_size: PROGRAM_MAX_SIZE,
            });
        }

        self.import(rom, PROGRAM_STARTING_ADDRESS);
        Ok(())
    }

    pub fn read(&self, address: u16) -> u8 {
        self.bytes[address as usize % MEMORY_SIZE]
    }

    pub fn write(&mut self, address: u16, byte: u8) {
        self.bytes[address as usize % MEMORY_SIZE] = byte;
    }

    pub fn read_word(&self, address: u16) -> u16 {
        u16::from_be_bytes([self.read(address), self.read(address.wrapping_add(1))])
    }

    pub fn export(&self, address: u16, dst: &mut [u8]) {
        let address = address as usize % MEMORY_SIZE;

        let pivot = dst.len().min(MEMORY_SIZE - address);
        let (dst0, dst1) = dst.split_at_mut(pivot);

        dst0.copy_from_slice(&self.bytes[address..address + dst0.len()]);
        dst1.copy_from_slice(&self.bytes[..dst1.len()]);
    }

    pub fn import(&mut self, src: &[u8], address: u16) {
        let address = address as usize % MEMORY_SIZE;

        let pivot = src.len().min(MEMORY_SIZE - address);
        let (src0, src1) = src.split_at(pivot);

        self.bytes[address..address + src0.len()].copy_from_slice(src0);
        self.bytes[..src1.len()].copy_from_slice(src1);
    }
}
