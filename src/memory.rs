use crate::error::FaultKind;

// NB. addresses are usize here, so that I + offset arithmetic can't overflow
//     before it gets resolved against the address space

/// Represents the machine's addressable memory
pub trait MemoryMap {
    /// map an address onto a byte offset, or refuse it
    fn resolve(&self, addr: usize) -> Result<usize, FaultKind>;

    /// get a r/o view of the whole of memory
    fn as_slice(&self) -> &[u8];

    /// get a r/w view of the whole of memory
    fn as_mut_slice(&mut self) -> &mut [u8];

    /// read a single byte
    fn read(&self, addr: usize) -> Result<u8, FaultKind> {
        let a = self.resolve(addr)?;
        Ok(self.as_slice()[a])
    }

    /// write a single byte
    fn write(&mut self, addr: usize, value: u8) -> Result<(), FaultKind> {
        let a = self.resolve(addr)?;
        self.as_mut_slice()[a] = value;
        Ok(())
    }

    /// get a big-endian two-byte word (opcodes)
    fn read_word(&self, addr: usize) -> Result<u16, FaultKind> {
        let hi = self.read(addr)? as u16;
        let lo = self.read(addr + 1)? as u16;
        Ok((hi << 8) | lo)
    }

    /// make sure every address in `addr..addr + len` resolves, so that
    /// multi-byte stores can't fail half way through
    fn check_range(&self, addr: usize, len: usize) -> Result<(), FaultKind> {
        if len == 0 {
            return Ok(());
        }
        self.resolve(addr)?;
        self.resolve(addr + len - 1)?;
        Ok(())
    }

    /// write a chunk of bytes, all or nothing
    fn write_block(&mut self, addr: usize, data: &[u8]) -> Result<(), FaultKind> {
        self.check_range(addr, data.len())?;
        for (offset, byte) in data.iter().enumerate() {
            self.write(addr + offset, *byte)?;
        }
        Ok(())
    }

    /// read a chunk of bytes, all or nothing
    fn read_block(&self, addr: usize, len: usize) -> Result<Vec<u8>, FaultKind> {
        self.check_range(addr, len)?;
        (0..len).map(|offset| self.read(addr + offset)).collect()
    }
}

/// how much RAM we have
pub const RAM_SIZE: usize = 4096;

/// where the program is loaded
pub const PROGRAM_ADDR: u16 = 0x0200;

/// largest program image that fits between the load address and the top of RAM
pub const MAX_PROGRAM_SIZE: usize = RAM_SIZE - PROGRAM_ADDR as usize;

/// where the hex digit glyphs live
pub const FONT_ADDR: u16 = 0x050;

/// each glyph is 4 pixels wide (high nibble) by 5 rows
pub const FONT_GLYPH_BYTES: u16 = 5;

/// Defines the CHIP-8 memory map as seen by programs:
///   0x0000-0x004f  unused
///   0x0050-0x009f  font
///   0x00a0-0x01ff  unused
///   0x0200-0x0fff  program and scratch data
#[derive(Clone, PartialEq, Eq)]
pub struct Chip8Memory {
    bytes: Box<[u8; RAM_SIZE]>,
    wrap: bool,
}

impl MemoryMap for Chip8Memory {
    fn resolve(&self, addr: usize) -> Result<usize, FaultKind> {
        if self.wrap {
            Ok(addr % RAM_SIZE)
        } else if addr < RAM_SIZE {
            Ok(addr)
        } else {
            Err(FaultKind::AddressOutOfBounds(addr))
        }
    }

    fn as_slice(&self) -> &[u8] {
        &self.bytes[..]
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes[..]
    }
}

impl Chip8Memory {
    /// zeroed memory with the font already in place
    pub fn new(wrap: bool) -> Self {
        let mut mm = Chip8Memory {
            bytes: Box::new([0u8; RAM_SIZE]),
            wrap,
        };
        mm.seed_font();
        mm
    }

    /// (re)write the hex digit glyphs into low memory
    pub fn seed_font(&mut self) {
        let start = FONT_ADDR as usize;
        self.bytes[start..start + CHIP8_FONT.len()].copy_from_slice(&CHIP8_FONT);
    }

    /// copy a program image to 0x200
    pub fn load(&mut self, program: &[u8]) -> Result<(), crate::Chip8Error> {
        if program.len() > MAX_PROGRAM_SIZE {
            return Err(crate::Chip8Error::ProgramTooLarge {
                size: program.len(),
                max: MAX_PROGRAM_SIZE,
            });
        }
        let start = PROGRAM_ADDR as usize;
        self.bytes[start..start + program.len()].copy_from_slice(program);
        Ok(())
    }

    /// zero everything, then put the font back
    pub fn clear(&mut self) {
        self.bytes.fill(0);
        self.seed_font();
    }

    /// address of the glyph for hex digit `digit` (low nibble only)
    pub fn glyph_addr(digit: u8) -> u16 {
        FONT_ADDR + (digit & 0x0f) as u16 * FONT_GLYPH_BYTES
    }
}

impl std::fmt::Debug for Chip8Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        // 4K of bytes is no use to anyone in a failed assertion
        f.debug_struct("Chip8Memory")
            .field("wrap", &self.wrap)
            .field("program", &&self.bytes[PROGRAM_ADDR as usize..PROGRAM_ADDR as usize + 16])
            .finish_non_exhaustive()
    }
}

#[rustfmt::skip]
const CHIP8_FONT: [u8; 80] = [
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
