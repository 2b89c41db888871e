use crate::quirks::Quirks;
use std::fmt;

/// A decoded CHIP-8 instruction. `x` and `y` are register numbers (0-F),
/// `nn` an 8-bit literal, `nnn` a 12-bit address and `n` a 4-bit row count.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// 00E0: clear the screen
    ClearScreen,
    /// 00EE: return from subroutine
    Return,
    /// 1NNN: jump to `nnn`
    Jump { nnn: u16 },
    /// 2NNN: call subroutine at `nnn`
    Call { nnn: u16 },
    /// 3XNN: skip next instruction if VX == `nn`
    SkipEqImm { x: u8, nn: u8 },
    /// 4XNN: skip next instruction if VX != `nn`
    SkipNeImm { x: u8, nn: u8 },
    /// 5XY0: skip next instruction if VX == VY
    SkipEqReg { x: u8, y: u8 },
    /// 6XNN: VX = `nn`
    LoadImm { x: u8, nn: u8 },
    /// 7XNN: VX += `nn`, no carry
    AddImm { x: u8, nn: u8 },
    /// 8XY0: VX = VY
    Move { x: u8, y: u8 },
    /// 8XY1: VX |= VY
    Or { x: u8, y: u8 },
    /// 8XY2: VX &= VY
    And { x: u8, y: u8 },
    /// 8XY3: VX ^= VY
    Xor { x: u8, y: u8 },
    /// 8XY4: VX += VY, VF = carry
    AddReg { x: u8, y: u8 },
    /// 8XY5: VX -= VY, VF = not borrow
    SubReg { x: u8, y: u8 },
    /// 8XY6: VX = source >> 1, VF = bit shifted out
    ShiftRight { x: u8, y: u8 },
    /// 8XY7: VX = VY - VX, VF = not borrow
    SubN { x: u8, y: u8 },
    /// 8XYE: VX = source << 1, VF = bit shifted out
    ShiftLeft { x: u8, y: u8 },
    /// 9XY0: skip next instruction if VX != VY
    SkipNeReg { x: u8, y: u8 },
    /// ANNN: I = `nnn`
    LoadIndex { nnn: u16 },
    /// BNNN: jump to `nnn` plus a register
    JumpOffset { nnn: u16 },
    /// CXNN: VX = random & `nn`
    Random { x: u8, nn: u8 },
    /// DXYN: draw `n` rows of sprite from I at (VX, VY)
    Draw { x: u8, y: u8, n: u8 },
    /// EX9E: skip next instruction if key VX is down
    SkipKeyPressed { x: u8 },
    /// EXA1: skip next instruction if key VX is up
    SkipKeyNotPressed { x: u8 },
    /// FX07: VX = delay timer
    LoadDelay { x: u8 },
    /// FX0A: wait for a key and put it in VX
    WaitKey { x: u8 },
    /// FX15: delay timer = VX
    SetDelay { x: u8 },
    /// FX18: sound timer = VX
    SetSound { x: u8 },
    /// FX1E: I += VX
    AddIndex { x: u8 },
    /// FX29: I = address of font glyph for digit VX
    FontChar { x: u8 },
    /// FX33: store the decimal digits of VX at I, I+1, I+2
    StoreBcd { x: u8 },
    /// FX55: store V0..=VX at I
    StoreRegs { x: u8 },
    /// FX65: load V0..=VX from I
    LoadRegs { x: u8 },
}

impl Instruction {
    /// Decode a 16-bit opcode. `None` means nothing in the instruction set
    /// matches, which includes 0NNN machine code calls.
    pub fn decode(opcode: u16) -> Option<Instruction> {
        use Instruction::*;

        let x = ((opcode >> 8) & 0x0f) as u8;
        let y = ((opcode >> 4) & 0x0f) as u8;
        let n = (opcode & 0x0f) as u8;
        let nn = (opcode & 0xff) as u8;
        let nnn = opcode & 0x0fff;

        let i = match (opcode >> 12, n) {
            (0x0, _) => match opcode {
                0x00e0 => ClearScreen,
                0x00ee => Return,
                _ => return None,
            },
            (0x1, _) => Jump { nnn },
            (0x2, _) => Call { nnn },
            (0x3, _) => SkipEqImm { x, nn },
            (0x4, _) => SkipNeImm { x, nn },
            (0x5, 0x0) => SkipEqReg { x, y },
            (0x6, _) => LoadImm { x, nn },
            (0x7, _) => AddImm { x, nn },
            (0x8, 0x0) => Move { x, y },
            (0x8, 0x1) => Or { x, y },
            (0x8, 0x2) => And { x, y },
            (0x8, 0x3) => Xor { x, y },
            (0x8, 0x4) => AddReg { x, y },
            (0x8, 0x5) => SubReg { x, y },
            (0x8, 0x6) => ShiftRight { x, y },
            (0x8, 0x7) => SubN { x, y },
            (0x8, 0xe) => ShiftLeft { x, y },
            (0x9, 0x0) => SkipNeReg { x, y },
            (0xa, _) => LoadIndex { nnn },
            (0xb, _) => JumpOffset { nnn },
            (0xc, _) => Random { x, nn },
            (0xd, _) => Draw { x, y, n },
            (0xe, _) => match nn {
                0x9e => SkipKeyPressed { x },
                0xa1 => SkipKeyNotPressed { x },
                _ => return None,
            },
            (0xf, _) => match nn {
                0x07 => LoadDelay { x },
                0x0a => WaitKey { x },
                0x15 => SetDelay { x },
                0x18 => SetSound { x },
                0x1e => AddIndex { x },
                0x29 => FontChar { x },
                0x33 => StoreBcd { x },
                0x55 => StoreRegs { x },
                0x65 => LoadRegs { x },
                _ => return None,
            },
            _ => return None,
        };
        Some(i)
    }
}

impl Instruction {
    /// mnemonic as the machine will actually run it under `quirks`; only
    /// BNNN reads differently
    pub fn describe(&self, quirks: &Quirks) -> String {
        match *self {
            Instruction::JumpOffset { nnn } if quirks.jump_uses_vx => {
                format!("JP V{:X}, {:#05x}", nnn >> 8, nnn)
            }
            _ => self.to_string(),
        }
    }
}

/// Cowgod-style mnemonics, for disassembly and debug views
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Instruction::*;
        match *self {
            ClearScreen => write!(f, "CLS"),
            Return => write!(f, "RET"),
            Jump { nnn } => write!(f, "JP {:#05x}", nnn),
            Call { nnn } => write!(f, "CALL {:#05x}", nnn),
            SkipEqImm { x, nn } => write!(f, "SE V{:X}, {:#04x}", x, nn),
            SkipNeImm { x, nn } => write!(f, "SNE V{:X}, {:#04x}", x, nn),
            SkipEqReg { x, y } => write!(f, "SE V{:X}, V{:X}", x, y),
            LoadImm { x, nn } => write!(f, "LD V{:X}, {:#04x}", x, nn),
            AddImm { x, nn } => write!(f, "ADD V{:X}, {:#04x}", x, nn),
            Move { x, y } => write!(f, "LD V{:X}, V{:X}", x, y),
            Or { x, y } => write!(f, "OR V{:X}, V{:X}", x, y),
            And { x, y } => write!(f, "AND V{:X}, V{:X}", x, y),
            Xor { x, y } => write!(f, "XOR V{:X}, V{:X}", x, y),
            AddReg { x, y } => write!(f, "ADD V{:X}, V{:X}", x, y),
            SubReg { x, y } => write!(f, "SUB V{:X}, V{:X}", x, y),
            ShiftRight { x, y } => write!(f, "SHR V{:X}, V{:X}", x, y),
            SubN { x, y } => write!(f, "SUBN V{:X}, V{:X}", x, y),
            ShiftLeft { x, y } => write!(f, "SHL V{:X}, V{:X}", x, y),
            SkipNeReg { x, y } => write!(f, "SNE V{:X}, V{:X}", x, y),
            LoadIndex { nnn } => write!(f, "LD I, {:#05x}", nnn),
            JumpOffset { nnn } => write!(f, "JP V0, {:#05x}", nnn),
            Random { x, nn } => write!(f, "RND V{:X}, {:#04x}", x, nn),
            Draw { x, y, n } => write!(f, "DRW V{:X}, V{:X}, {}", x, y, n),
            SkipKeyPressed { x } => write!(f, "SKP V{:X}", x),
            SkipKeyNotPressed { x } => write!(f, "SKNP V{:X}", x),
            LoadDelay { x } => write!(f, "LD V{:X}, DT", x),
            WaitKey { x } => write!(f, "LD V{:X}, K", x),
            SetDelay { x } => write!(f, "LD DT, V{:X}", x),
            SetSound { x } => write!(f, "LD ST, V{:X}", x),
            AddIndex { x } => write!(f, "ADD I, V{:X}", x),
            FontChar { x } => write!(f, "LD F, V{:X}", x),
            StoreBcd { x } => write!(f, "LD B, V{:X}", x),
            StoreRegs { x } => write!(f, "LD [I], V{:X}", x),
            LoadRegs { x } => write!(f, "LD V{:X}, [I]", x),
        }
    }
}

/// Disassemble `bytes` as if loaded at `origin`, one line per two-byte word.
/// Words that don't decode are shown as data.
pub fn disassemble(bytes: &[u8], origin: u16) -> Vec<String> {
    bytes
        .chunks(2)
        .enumerate()
        .map(|(n, word)| {
            let addr = origin.wrapping_add((2 * n) as u16);
            let opcode = match word {
                [hi, lo] => ((*hi as u16) << 8) | *lo as u16,
                [hi] => (*hi as u16) << 8,
                _ => 0,
            };
            match Instruction::decode(opcode) {
                Some(i) => format!("{:03x}: {:04x}  {}", addr, opcode, i),
                None => format!("{:03x}: {:04x}  DW {:#06x}", addr, opcode, opcode),
            }
        })
        .collect()
}
