use super::interp::Fault;

use std::fmt::Display;

// Takes a 16 bit number (instruction size) and decomposes it into its parts
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InstructionParameters {
    pub bits: u16,
    pub op: u8,
    pub x: u8,
    pub y: u8,
    pub n: u8,
    pub nn: u8,
    pub nnn: u16,
}

impl From<u16> for InstructionParameters {
    fn from(bits: u16) -> Self {
        InstructionParameters {
            bits,
            op:  ((bits & 0xF000) >> 4 * 3) as u8,
            x:   ((bits & 0x0F00) >> 4 * 2) as u8,
            y:   ((bits & 0x00F0) >> 4 * 1) as u8,
            n:   ((bits & 0x000F) >> 4 * 0) as u8,
            nn:  ((bits & 0x00FF) >> 4 * 0) as u8,
            nnn: ((bits & 0x0FFF) >> 4 * 0) as u16,
        }
    }
}

impl From<[u8; 2]> for InstructionParameters {
    fn from(bytes: [u8; 2]) -> Self {
        InstructionParameters::from(u16::from_be_bytes(bytes))
    }
}

/// One variant per CHIP-8 opcode pattern.
/// Register operands are register numbers (0x0..=0xF), not register values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    ClearScreen,
    SubroutineReturn,
    Jump(u16),
    CallSubroutine(u16),
    SkipIfEqualsConstant(u8, u8),
    SkipIfNotEqualsConstant(u8, u8),
    SkipIfEquals(u8, u8),
    SetConstant(u8, u8),
    AddConstant(u8, u8),
    Set(u8, u8),
    Or(u8, u8),
    And(u8, u8),
    Xor(u8, u8),
    Add(u8, u8),
    Sub(u8, u8),
    ShiftRight(u8),
    SubReversed(u8, u8),
    ShiftLeft(u8),
    SkipIfNotEquals(u8, u8),
    SetIndex(u16),
    JumpWithOffset(u16),
    GenerateRandom(u8, u8),
    Draw(u8, u8, u8),
    SkipIfKeyDown(u8),
    SkipIfKeyNotDown(u8),
    GetDelayTimer(u8),
    WaitForKey(u8),
    SetDelayTimer(u8),
    SetSoundTimer(u8),
    AddToIndex(u8),
    SetIndexToHexChar(u8),
    StoreDecimal(u8),
    Store(u8),
    Load(u8),
}

impl TryFrom<InstructionParameters> for Instruction {
    type Error = Fault;

    fn try_from(params: InstructionParameters) -> Result<Self, Self::Error> {
        let InstructionParameters {
            bits,
            op,
            x,
            y,
            n,
            nn,
            nnn,
        } = params;

        let instruction = match (op, x, y, n) {
            (0x0, 0x0, 0xE, 0x0) => Self::ClearScreen,
            (0x0, 0x0, 0xE, 0xE) => Self::SubroutineReturn,
            (0x1, __x, __y, __n) => Self::Jump(nnn),
            (0x2, __x, __y, __n) => Self::CallSubroutine(nnn),
            (0x3, __x, __y, __n) => Self::SkipIfEqualsConstant(x, nn),
            (0x4, __x, __y, __n) => Self::SkipIfNotEqualsConstant(x, nn),
            (0x5, __x, __y, 0x0) => Self::SkipIfEquals(x, y),
            (0x6, __x, __y, __n) => Self::SetConstant(x, nn),
            (0x7, __x, __y, __n) => Self::AddConstant(x, nn),
            (0x8, __x, __y, 0x0) => Self::Set(x, y),
            (0x8, __x, __y, 0x1) => Self::Or(x, y),
            (0x8, __x, __y, 0x2) => Self::And(x, y),
            (0x8, __x, __y, 0x3) => Self::Xor(x, y),
            (0x8, __x, __y, 0x4) => Self::Add(x, y),
            (0x8, __x, __y, 0x5) => Self::Sub(x, y),
            (0x8, __x, __y, 0x6) => Self::ShiftRight(x),
            (0x8, __x, __y, 0x7) => Self::SubReversed(x, y),
            (0x8, __x, __y, 0xE) => Self::ShiftLeft(x),
            (0x9, __x, __y, 0x0) => Self::SkipIfNotEquals(x, y),
            (0xA, __x, __y, __n) => Self::SetIndex(nnn),
            (0xB, __x, __y, __n) => Self::JumpWithOffset(nnn),
            (0xC, __x, __y, __n) => Self::GenerateRandom(x, nn),
            (0xD, __x, __y, __n) => Self::Draw(x, y, n),
            (0xE, __x, 0x9, 0xE) => Self::SkipIfKeyDown(x),
            (0xE, __x, 0xA, 0x1) => Self::SkipIfKeyNotDown(x),
            (0xF, __x, 0x0, 0x7) => Self::GetDelayTimer(x),
            (0xF, __x, 0x0, 0xA) => Self::WaitForKey(x),
            (0xF, __x, 0x1, 0x5) => Self::SetDelayTimer(x),
            (0xF, __x, 0x1, 0x8) => Self::SetSoundTimer(x),
            (0xF, __x, 0x1, 0xE) => Self::AddToIndex(x),
            (0xF, __x, 0x2, 0x9) => Self::SetIndexToHexChar(x),
            (0xF, __x, 0x3, 0x3) => Self::StoreDecimal(x),
            (0xF, __x, 0x5, 0x5) => Self::Store(x),
            (0xF, __x, 0x6, 0x5) => Self::Load(x),
            _ => return Err(Fault::UnknownOpcode(bits)),
        };

        Ok(instruction)
    }
}

impl TryFrom<u16> for Instruction {
    type Error = Fault;

    fn try_from(bits: u16) -> Result<Self, Self::Error> {
        Instruction::try_from(InstructionParameters::from(bits))
    }
}

// Octo-flavoured mnemonics
impl Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::ClearScreen => write!(f, "clear"),
            Self::SubroutineReturn => write!(f, "return"),
            Self::Jump(addr) => write!(f, "jump {:#05X}", addr),
            Self::CallSubroutine(addr) => write!(f, "call {:#05X}", addr),
            Self::SkipIfEqualsConstant(x, nn) => write!(f, "if v{:X} != {:#04X} then", x, nn),
            Self::SkipIfNotEqualsConstant(x, nn) => write!(f, "if v{:X} == {:#04X} then", x, nn),
            Self::SkipIfEquals(x, y) => write!(f, "if v{:X} != v{:X} then", x, y),
            Self::SetConstant(x, nn) => write!(f, "v{:X} := {:#04X}", x, nn),
            Self::AddConstant(x, nn) => write!(f, "v{:X} += {:#04X}", x, nn),
            Self::Set(x, y) => write!(f, "v{:X} := v{:X}", x, y),
            Self::Or(x, y) => write!(f, "v{:X} |= v{:X}", x, y),
            Self::And(x, y) => write!(f, "v{:X} &= v{:X}", x, y),
            Self::Xor(x, y) => write!(f, "v{:X} ^= v{:X}", x, y),
            Self::Add(x, y) => write!(f, "v{:X} += v{:X}", x, y),
            Self::Sub(x, y) => write!(f, "v{:X} -= v{:X}", x, y),
            Self::ShiftRight(x) => write!(f, "v{:X} >>= v{:X}", x, x),
            Self::SubReversed(x, y) => write!(f, "v{:X} =- v{:X}", x, y),
            Self::ShiftLeft(x) => write!(f, "v{:X} <<= v{:X}", x, x),
            Self::SkipIfNotEquals(x, y) => write!(f, "if v{:X} == v{:X} then", x, y),
            Self::SetIndex(addr) => write!(f, "i := {:#05X}", addr),
            Self::JumpWithOffset(addr) => write!(f, "jump0 {:#05X}", addr),
            Self::GenerateRandom(x, nn) => write!(f, "v{:X} := random {:#04X}", x, nn),
            Self::Draw(x, y, n) => write!(f, "sprite v{:X} v{:X} {:#X}", x, y, n),
            Self::SkipIfKeyDown(x) => write!(f, "if v{:X} -key then", x),
            Self::SkipIfKeyNotDown(x) => write!(f, "if v{:X} key then", x),
            Self::GetDelayTimer(x) => write!(f, "v{:X} := delay", x),
            Self::WaitForKey(x) => write!(f, "v{:X} := key", x),
            Self::SetDelayTimer(x) => write!(f, "delay := v{:X}", x),
            Self::SetSoundTimer(x) => write!(f, "buzzer := v{:X}", x),
            Self::AddToIndex(x) => write!(f, "i += v{:X}", x),
            Self::SetIndexToHexChar(x) => write!(f, "i := hex v{:X}", x),
            Self::StoreDecimal(x) => write!(f, "bcd v{:X}", x),
            Self::Store(x) => write!(f, "save v{:X}", x),
            Self::Load(x) => write!(f, "load v{:X}", x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameters_split_nibbles() {
        let params = InstructionParameters::from([0xAB, 0xCD]);
        assert_eq!(params.bits, 0xABCD);
        assert_eq!(params.op, 0xA);
        assert_eq!(params.x, 0xB);
        assert_eq!(params.y, 0xC);
        assert_eq!(params.n, 0xD);
        assert_eq!(params.nn, 0xCD);
        assert_eq!(params.nnn, 0xBCD);
    }

    #[test]
    fn decodes_every_family() {
        let cases: [(u16, Instruction); 34] = [
            (0x00E0, Instruction::ClearScreen),
            (0x00EE, Instruction::SubroutineReturn),
            (0x1234, Instruction::Jump(0x234)),
            (0x2456, Instruction::CallSubroutine(0x456)),
            (0x3A12, Instruction::SkipIfEqualsConstant(0xA, 0x12)),
            (0x4B34, Instruction::SkipIfNotEqualsConstant(0xB, 0x34)),
            (0x5120, Instruction::SkipIfEquals(0x1, 0x2)),
            (0x6C56, Instruction::SetConstant(0xC, 0x56)),
            (0x7D78, Instruction::AddConstant(0xD, 0x78)),
            (0x8120, Instruction::Set(0x1, 0x2)),
            (0x8121, Instruction::Or(0x1, 0x2)),
            (0x8122, Instruction::And(0x1, 0x2)),
            (0x8123, Instruction::Xor(0x1, 0x2)),
            (0x8124, Instruction::Add(0x1, 0x2)),
            (0x8125, Instruction::Sub(0x1, 0x2)),
            (0x8126, Instruction::ShiftRight(0x1)),
            (0x8127, Instruction::SubReversed(0x1, 0x2)),
            (0x812E, Instruction::ShiftLeft(0x1)),
            (0x9340, Instruction::SkipIfNotEquals(0x3, 0x4)),
            (0xA123, Instruction::SetIndex(0x123)),
            (0xB321, Instruction::JumpWithOffset(0x321)),
            (0xC5F0, Instruction::GenerateRandom(0x5, 0xF0)),
            (0xD125, Instruction::Draw(0x1, 0x2, 0x5)),
            (0xE39E, Instruction::SkipIfKeyDown(0x3)),
            (0xE4A1, Instruction::SkipIfKeyNotDown(0x4)),
            (0xF507, Instruction::GetDelayTimer(0x5)),
            (0xF60A, Instruction::WaitForKey(0x6)),
            (0xF715, Instruction::SetDelayTimer(0x7)),
            (0xF818, Instruction::SetSoundTimer(0x8)),
            (0xF91E, Instruction::AddToIndex(0x9)),
            (0xFA29, Instruction::SetIndexToHexChar(0xA)),
            (0xFB33, Instruction::StoreDecimal(0xB)),
            (0xFC55, Instruction::Store(0xC)),
            (0xFD65, Instruction::Load(0xD)),
        ];

        for (bits, expected) in cases {
            assert_eq!(Instruction::try_from(bits), Ok(expected), "{:#06X}", bits);
        }
    }

    #[test]
    fn unmatched_sub_operations_are_unknown() {
        for bits in [0x0000, 0x0123, 0x00E1, 0x5121, 0x8128, 0x812F, 0x9341, 0xE39F, 0xE4A2, 0xF000, 0xF566] {
            assert_eq!(
                Instruction::try_from(bits),
                Err(Fault::UnknownOpcode(bits)),
                "{:#06X}",
                bits
            );
        }
    }

    #[test]
    fn mnemonics() {
        assert_eq!(Instruction::Draw(0x1, 0x2, 0x5).to_string(), "sprite v1 v2 0x5");
        assert_eq!(Instruction::SetIndex(0x2A0).to_string(), "i := 0x2A0");
        assert_eq!(Instruction::StoreDecimal(0xB).to_string(), "bcd vB");
    }
}
