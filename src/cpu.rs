//! # cpu
//!
//! The fetch/decode/execute engine. Every call to `Machine::step` runs
//! exactly one instruction:
//!
//!  1. fetch the big-endian opcode at PC
//!  2. advance PC by 2, *before* anything else, so jumps and calls just
//!     overwrite it and skips add another 2
//!  3. decode, then execute against memory, registers, screen, keys, timers
//!
//! There is no internal loop. `FX0A` (wait for key) never blocks the thread;
//! it winds PC back onto itself and so gets run again on the next step until
//! the host reports a key held down.
//!
//! A step that faults puts PC and the redraw flag back where they were, and
//! every multi-byte memory access is range-checked before anything is
//! written, so a fault never leaves half an instruction behind.
use crate::error::{Chip8Error, FaultKind};
use crate::framebuffer::FrameBuffer;
use crate::instruction::Instruction;
use crate::keypad::Keypad;
use crate::memory::{Chip8Memory, MemoryMap};
use crate::quirks::{Quirks, UnknownOpcodePolicy};
use crate::registers::Registers;
use crate::timer::Timers;
use log::{trace, warn};
use rand::{Rng, RngCore};

/// All of the machine's volatile state. Two machines compare equal only if
/// every byte of memory, every register, pixel, key and timer matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Machine {
    pub(crate) memory: Chip8Memory,
    pub(crate) registers: Registers,
    pub(crate) framebuffer: FrameBuffer,
    pub(crate) keypad: Keypad,
    pub(crate) timers: Timers,
    pub(crate) redraw: bool,
}

impl Machine {
    /// power-on state with `program` loaded at 0x200
    pub fn boot(program: &[u8], quirks: &Quirks) -> Result<Self, Chip8Error> {
        let mut memory = Chip8Memory::new(quirks.wrap_memory);
        memory.load(program)?;
        Ok(Machine {
            memory,
            registers: Registers::new(),
            framebuffer: FrameBuffer::new(),
            keypad: Keypad::new(),
            timers: Timers::default(),
            redraw: false,
        })
    }

    pub fn memory(&self) -> &Chip8Memory {
        &self.memory
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.framebuffer
    }

    pub fn keypad(&self) -> &Keypad {
        &self.keypad
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    /// whether the most recent step touched the screen
    pub fn redraw(&self) -> bool {
        self.redraw
    }

    /// decode whatever is at PC, without executing it
    pub fn peek_instruction(&self) -> Option<(u16, Option<Instruction>)> {
        let opcode = self.memory.read_word(self.registers.pc as usize).ok()?;
        Some((opcode, Instruction::decode(opcode)))
    }

    /// Run one instruction.
    pub fn step<R: RngCore>(&mut self, quirks: &Quirks, rng: &mut R) -> Result<(), Chip8Error> {
        let pc = self.registers.pc;
        let redraw = self.redraw;
        self.redraw = false;
        self.fetch_execute(quirks, rng).map_err(|kind| {
            self.registers.pc = pc;
            self.redraw = redraw;
            Chip8Error::Fault { pc, kind }
        })
    }

    fn fetch_execute<R: RngCore>(&mut self, quirks: &Quirks, rng: &mut R) -> Result<(), FaultKind> {
        let pc = self.registers.pc;
        let opcode = self.memory.read_word(pc as usize)?;
        self.registers.pc = pc.wrapping_add(2);

        let instruction = match Instruction::decode(opcode) {
            Some(i) => i,
            None => match quirks.unknown_opcode {
                UnknownOpcodePolicy::Halt => return Err(FaultKind::UnknownInstruction(opcode)),
                UnknownOpcodePolicy::Ignore => {
                    warn!("ignoring unknown instruction {:#06x} at {:#05x}", opcode, pc);
                    return Ok(());
                }
            },
        };
        trace!("{:03x}: {:04x}  {}", pc, opcode, instruction);
        self.execute(instruction, quirks, rng)
    }

    fn execute<R: RngCore>(
        &mut self,
        instruction: Instruction,
        quirks: &Quirks,
        rng: &mut R,
    ) -> Result<(), FaultKind> {
        use Instruction::*;

        let r = &mut self.registers;
        match instruction {
            ClearScreen => {
                self.framebuffer.clear();
                self.redraw = true;
            }
            Return => r.pc = r.stack.pop()?,
            Jump { nnn } => r.pc = nnn,
            Call { nnn } => {
                r.stack.push(r.pc)?;
                r.pc = nnn;
            }
            SkipEqImm { x, nn } => skip_if(r.v[x as usize] == nn, r),
            SkipNeImm { x, nn } => skip_if(r.v[x as usize] != nn, r),
            SkipEqReg { x, y } => skip_if(r.v[x as usize] == r.v[y as usize], r),
            SkipNeReg { x, y } => skip_if(r.v[x as usize] != r.v[y as usize], r),
            LoadImm { x, nn } => r.v[x as usize] = nn,
            AddImm { x, nn } => r.v[x as usize] = r.v[x as usize].wrapping_add(nn),
            Move { x, y } => r.v[x as usize] = r.v[y as usize],
            Or { x, y } => {
                r.v[x as usize] |= r.v[y as usize];
                if quirks.vf_reset {
                    r.set_flag(false);
                }
            }
            And { x, y } => {
                r.v[x as usize] &= r.v[y as usize];
                if quirks.vf_reset {
                    r.set_flag(false);
                }
            }
            Xor { x, y } => {
                r.v[x as usize] ^= r.v[y as usize];
                if quirks.vf_reset {
                    r.set_flag(false);
                }
            }
            AddReg { x, y } => {
                let (sum, carry) = r.v[x as usize].overflowing_add(r.v[y as usize]);
                r.v[x as usize] = sum;
                r.set_flag(carry);
            }
            SubReg { x, y } => {
                let (diff, borrow) = r.v[x as usize].overflowing_sub(r.v[y as usize]);
                r.v[x as usize] = diff;
                r.set_flag(!borrow);
            }
            SubN { x, y } => {
                let (diff, borrow) = r.v[y as usize].overflowing_sub(r.v[x as usize]);
                r.v[x as usize] = diff;
                r.set_flag(!borrow);
            }
            ShiftRight { x, y } => {
                let src = shift_source(r, quirks, x, y);
                r.v[x as usize] = src >> 1;
                r.set_flag(src & 0x01 != 0);
            }
            ShiftLeft { x, y } => {
                let src = shift_source(r, quirks, x, y);
                r.v[x as usize] = src << 1;
                r.set_flag(src & 0x80 != 0);
            }
            LoadIndex { nnn } => r.i = nnn,
            JumpOffset { nnn } => {
                let reg = if quirks.jump_uses_vx { (nnn >> 8) as usize } else { 0 };
                r.pc = nnn + r.v[reg] as u16;
            }
            Random { x, nn } => r.v[x as usize] = rng.gen::<u8>() & nn,
            Draw { x, y, n } => {
                let sprite = self.memory.read_block(r.i as usize, n as usize)?;
                let collision = self.framebuffer.blit(
                    r.v[x as usize] as usize,
                    r.v[y as usize] as usize,
                    &sprite,
                );
                r.set_flag(collision);
                self.redraw = true;
            }
            SkipKeyPressed { x } => skip_if(self.keypad.is_pressed(r.v[x as usize]), r),
            SkipKeyNotPressed { x } => skip_if(!self.keypad.is_pressed(r.v[x as usize]), r),
            LoadDelay { x } => r.v[x as usize] = self.timers.delay.get(),
            WaitKey { x } => match self.keypad.first_pressed() {
                Some(key) => r.v[x as usize] = key,
                // go round again
                None => r.pc = r.pc.wrapping_sub(2),
            },
            SetDelay { x } => self.timers.delay.set(r.v[x as usize]),
            SetSound { x } => self.timers.sound.set(r.v[x as usize]),
            AddIndex { x } => r.i = r.i.wrapping_add(r.v[x as usize] as u16),
            FontChar { x } => r.i = Chip8Memory::glyph_addr(r.v[x as usize]),
            StoreBcd { x } => {
                let v = r.v[x as usize];
                self.memory
                    .write_block(r.i as usize, &[v / 100, (v / 10) % 10, v % 10])?;
            }
            StoreRegs { x } => {
                let count = x as usize + 1;
                self.memory.write_block(r.i as usize, &r.v[..count])?;
                if quirks.index_increment {
                    r.i = r.i.wrapping_add(count as u16);
                }
            }
            LoadRegs { x } => {
                let count = x as usize + 1;
                let bytes = self.memory.read_block(r.i as usize, count)?;
                r.v[..count].copy_from_slice(&bytes);
                if quirks.index_increment {
                    r.i = r.i.wrapping_add(count as u16);
                }
            }
        }
        Ok(())
    }
}

fn skip_if(condition: bool, r: &mut Registers) {
    if condition {
        r.pc = r.pc.wrapping_add(2);
    }
}

fn shift_source(r: &Registers, quirks: &Quirks, x: u8, y: u8) -> u8 {
    if quirks.shift_uses_vy {
        r.v[y as usize]
    } else {
        r.v[x as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn boot(program: &[u8]) -> Machine {
        Machine::boot(program, &Quirks::default()).unwrap()
    }

    fn run_with(program: &[u8], quirks: Quirks, steps: usize) -> Machine {
        let mut m = Machine::boot(program, &quirks).unwrap();
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..steps {
            m.step(&quirks, &mut rng).unwrap();
        }
        m
    }

    fn run(program: &[u8], steps: usize) -> Machine {
        run_with(program, Quirks::default(), steps)
    }

    fn step(m: &mut Machine) -> Result<(), Chip8Error> {
        m.step(&Quirks::default(), &mut StdRng::seed_from_u64(8))
    }

    #[test]
    fn test_fetch_advances_pc() {
        let m = run(&[0x60, 0x01], 1);
        assert_eq!(m.registers.pc, 0x202);
    }

    #[test]
    fn test_jump_is_absolute() {
        let m = run(&[0x13, 0x45], 1);
        assert_eq!(m.registers.pc, 0x345);
    }

    #[test]
    fn test_call_and_return() {
        // 200: CALL 206; 202: ...; 206: RET
        let mut m = boot(&[0x22, 0x06, 0x00, 0x00, 0x00, 0x00, 0x00, 0xee]);
        step(&mut m).unwrap();
        assert_eq!(m.registers.pc, 0x206);
        assert_eq!(m.registers.stack.entries(), &[0x202]);
        step(&mut m).unwrap();
        assert_eq!(m.registers.pc, 0x202);
        assert_eq!(m.registers.stack.pointer(), 0);
    }

    #[test]
    fn test_return_on_empty_stack_faults_without_moving_pc() {
        let mut m = boot(&[0x00, 0xee]);
        let before = m.clone();
        let err = step(&mut m).unwrap_err();
        assert_eq!(
            err,
            Chip8Error::Fault {
                pc: 0x200,
                kind: FaultKind::StackUnderflow
            }
        );
        assert_eq!(m, before);
    }

    #[test]
    fn test_recursive_call_overflows() {
        // 200: CALL 200, forever
        let mut m = boot(&[0x22, 0x00]);
        for _ in 0..16 {
            step(&mut m).unwrap();
        }
        let before = m.clone();
        let err = step(&mut m).unwrap_err();
        assert_eq!(err.fault_kind(), Some(FaultKind::StackOverflow));
        assert_eq!(m, before);
    }

    #[test]
    fn test_skips() {
        // V0 = 5; SE V0, 5 (skips); ...
        let m = run(&[0x60, 0x05, 0x30, 0x05], 2);
        assert_eq!(m.registers.pc, 0x206);
        let m = run(&[0x60, 0x05, 0x40, 0x05], 2);
        assert_eq!(m.registers.pc, 0x204);
        let m = run(&[0x60, 0x05, 0x61, 0x05, 0x50, 0x10], 3);
        assert_eq!(m.registers.pc, 0x208);
        let m = run(&[0x60, 0x05, 0x61, 0x05, 0x90, 0x10], 3);
        assert_eq!(m.registers.pc, 0x206);
    }

    #[test]
    fn test_add_immediate_wraps_without_flag() {
        let m = run(&[0x6f, 0x07, 0x60, 0xff, 0x70, 0x02], 3);
        assert_eq!(m.registers.v[0], 0x01);
        assert_eq!(m.registers.v[0xf], 0x07);
    }

    #[test]
    fn test_bitwise_ops() {
        let prog = [0x60, 0b1100, 0x61, 0b1010, 0x80, 0x11];
        assert_eq!(run(&prog, 3).registers.v[0], 0b1110);
        let prog = [0x60, 0b1100, 0x61, 0b1010, 0x80, 0x12];
        assert_eq!(run(&prog, 3).registers.v[0], 0b1000);
        let prog = [0x60, 0b1100, 0x61, 0b1010, 0x80, 0x13];
        assert_eq!(run(&prog, 3).registers.v[0], 0b0110);
    }

    #[test]
    fn test_vf_reset_quirk() {
        let prog = [0x6f, 0x01, 0x80, 0x11];
        assert_eq!(run(&prog, 2).registers.v[0xf], 0);
        let quirks = Quirks {
            vf_reset: false,
            ..Quirks::default()
        };
        assert_eq!(run_with(&prog, quirks, 2).registers.v[0xf], 1);
    }

    #[test]
    fn test_add_with_carry() {
        let m = run(&[0x60, 0xf0, 0x61, 0x20, 0x80, 0x14], 3);
        assert_eq!(m.registers.v[0], 0x10);
        assert_eq!(m.registers.v[0xf], 1);
        let m = run(&[0x60, 0x10, 0x61, 0x20, 0x80, 0x14], 3);
        assert_eq!(m.registers.v[0], 0x30);
        assert_eq!(m.registers.v[0xf], 0);
    }

    #[test]
    fn test_sub_with_borrow() {
        let m = run(&[0x60, 0x30, 0x61, 0x20, 0x80, 0x15], 3);
        assert_eq!(m.registers.v[0], 0x10);
        assert_eq!(m.registers.v[0xf], 1);
        let m = run(&[0x60, 0x20, 0x61, 0x30, 0x80, 0x15], 3);
        assert_eq!(m.registers.v[0], 0xf0);
        assert_eq!(m.registers.v[0xf], 0);
        // equal operands don't borrow
        let m = run(&[0x60, 0x20, 0x61, 0x20, 0x80, 0x15], 3);
        assert_eq!(m.registers.v[0xf], 1);
    }

    #[test]
    fn test_subn() {
        let m = run(&[0x60, 0x20, 0x61, 0x30, 0x80, 0x17], 3);
        assert_eq!(m.registers.v[0], 0x10);
        assert_eq!(m.registers.v[0xf], 1);
        let m = run(&[0x60, 0x30, 0x61, 0x20, 0x80, 0x17], 3);
        assert_eq!(m.registers.v[0], 0xf0);
        assert_eq!(m.registers.v[0xf], 0);
    }

    #[test]
    fn test_flag_wins_when_vf_is_destination() {
        let m = run(&[0x6f, 0xff, 0x61, 0x02, 0x8f, 0x14], 3);
        assert_eq!(m.registers.v[0xf], 1);
    }

    #[test]
    fn test_shift_uses_vy_by_default() {
        let m = run(&[0x60, 0xff, 0x61, 0b0000_0011, 0x80, 0x16], 3);
        assert_eq!(m.registers.v[0], 0b0000_0001);
        assert_eq!(m.registers.v[0xf], 1);
        let m = run(&[0x60, 0x00, 0x61, 0b1000_0001, 0x80, 0x1e], 3);
        assert_eq!(m.registers.v[0], 0b0000_0010);
        assert_eq!(m.registers.v[0xf], 1);
    }

    #[test]
    fn test_shift_in_place_quirk() {
        let quirks = Quirks {
            shift_uses_vy: false,
            ..Quirks::default()
        };
        let m = run_with(&[0x60, 0b0000_0100, 0x61, 0xff, 0x80, 0x16], quirks, 3);
        assert_eq!(m.registers.v[0], 0b0000_0010);
        assert_eq!(m.registers.v[0xf], 0);
        let m = run_with(&[0x60, 0b0100_0000, 0x61, 0xff, 0x80, 0x1e], quirks, 3);
        assert_eq!(m.registers.v[0], 0b1000_0000);
        assert_eq!(m.registers.v[0xf], 0);
    }

    #[test]
    fn test_jump_with_offset() {
        // V0 = 4, V3 = 8; JP V0, 0x300
        let prog = [0x60, 0x04, 0x63, 0x08, 0xb3, 0x00];
        assert_eq!(run(&prog, 3).registers.pc, 0x304);
        let quirks = Quirks {
            jump_uses_vx: true,
            ..Quirks::default()
        };
        assert_eq!(run_with(&prog, quirks, 3).registers.pc, 0x308);
    }

    #[test]
    fn test_random_is_masked() {
        let m = run(&[0xc0, 0x0f, 0xc1, 0x00], 2);
        assert_eq!(m.registers.v[0] & 0xf0, 0);
        assert_eq!(m.registers.v[1], 0);
    }

    #[test]
    fn test_random_repeatable_with_seed() {
        let a = run(&[0xc0, 0xff, 0xc1, 0xff], 2);
        let b = run(&[0xc0, 0xff, 0xc1, 0xff], 2);
        assert_eq!(a.registers.v, b.registers.v);
    }

    #[test]
    fn test_draw_font_glyph() {
        // V0 = 0; LD F, V0; DRW V0, V0, 5
        let m = run(&[0x60, 0x00, 0xf0, 0x29, 0xd0, 0x05], 3);
        assert_eq!(m.registers.i, 0x050);
        assert!(m.redraw);
        assert_eq!(m.registers.v[0xf], 0);
        assert_eq!(m.framebuffer.as_slice()[..4], [1, 1, 1, 1]);
        assert_eq!(m.framebuffer.as_slice()[64..68], [1, 0, 0, 1]);
    }

    #[test]
    fn test_draw_twice_collides() {
        let m = run(&[0x60, 0x00, 0xf0, 0x29, 0xd0, 0x05, 0xd0, 0x05], 4);
        assert_eq!(m.registers.v[0xf], 1);
        assert!(m.framebuffer.is_blank());
    }

    #[test]
    fn test_redraw_cleared_by_next_step() {
        let mut m = boot(&[0x00, 0xe0, 0x60, 0x00]);
        step(&mut m).unwrap();
        assert!(m.redraw);
        step(&mut m).unwrap();
        assert!(!m.redraw);
    }

    #[test]
    fn test_key_skips() {
        let mut m = boot(&[0x60, 0x07, 0xe0, 0x9e, 0x00, 0x00, 0xe0, 0xa1]);
        let mut keys = [false; 16];
        keys[7] = true;
        m.keypad.set(keys);
        step(&mut m).unwrap();
        step(&mut m).unwrap();
        assert_eq!(m.registers.pc, 0x206);
        step(&mut m).unwrap();
        assert_eq!(m.registers.pc, 0x208);
    }

    #[test]
    fn test_wait_key_spins_until_pressed() {
        let mut m = boot(&[0xf3, 0x0a]);
        for _ in 0..3 {
            step(&mut m).unwrap();
            assert_eq!(m.registers.pc, 0x200);
        }
        let mut keys = [false; 16];
        keys[0xc] = true;
        keys[0xe] = true;
        m.keypad.set(keys);
        step(&mut m).unwrap();
        assert_eq!(m.registers.pc, 0x202);
        assert_eq!(m.registers.v[3], 0xc);
    }

    #[test]
    fn test_timer_registers() {
        let m = run(&[0x60, 0x2a, 0xf0, 0x15, 0xf0, 0x18, 0xf1, 0x07], 4);
        assert_eq!(m.timers.delay.get(), 0x2a);
        assert_eq!(m.timers.sound.get(), 0x2a);
        assert_eq!(m.registers.v[1], 0x2a);
    }

    #[test]
    fn test_add_index() {
        let m = run(&[0xa1, 0x00, 0x60, 0x20, 0xf0, 0x1e], 3);
        assert_eq!(m.registers.i, 0x120);
    }

    #[test]
    fn test_bcd() {
        // V0 = 254, I = 0x300; LD B, V0
        let m = run(&[0x60, 0xfe, 0xa3, 0x00, 0xf0, 0x33], 3);
        assert_eq!(m.memory.as_slice()[0x300..0x303], [2, 5, 4]);
    }

    #[test]
    fn test_store_and_load_registers() {
        let prog = [
            0x60, 0x11, 0x61, 0x22, 0x62, 0x33, // V0..V2
            0xa3, 0x00, 0xf2, 0x55, // store
            0xa3, 0x00, 0xf1, 0x65, // load V0..V1 back
        ];
        let mut m = run(&prog, 5);
        assert_eq!(m.memory.as_slice()[0x300..0x304], [0x11, 0x22, 0x33, 0x00]);
        assert_eq!(m.registers.i, 0x303);
        m.registers.v = [0; 16];
        for _ in 0..2 {
            step(&mut m).unwrap();
        }
        assert_eq!(m.registers.v[..3], [0x11, 0x22, 0x00]);
        assert_eq!(m.registers.i, 0x302);
    }

    #[test]
    fn test_store_without_index_increment() {
        let quirks = Quirks {
            index_increment: false,
            ..Quirks::default()
        };
        let m = run_with(&[0xa3, 0x00, 0xf5, 0x55], quirks, 2);
        assert_eq!(m.registers.i, 0x300);
    }

    #[test]
    fn test_strict_memory_store_faults_cleanly() {
        let quirks = Quirks {
            wrap_memory: false,
            ..Quirks::default()
        };
        let mut m = Machine::boot(&[0x60, 0x01, 0xaf, 0xfe, 0xf3, 0x55], &quirks).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        m.step(&quirks, &mut rng).unwrap();
        m.step(&quirks, &mut rng).unwrap();
        let before = m.clone();
        let err = m.step(&quirks, &mut rng).unwrap_err();
        assert_eq!(
            err,
            Chip8Error::Fault {
                pc: 0x204,
                kind: FaultKind::AddressOutOfBounds(0x1001)
            }
        );
        assert_eq!(m, before);
    }

    #[test]
    fn test_unknown_instruction_halts() {
        let mut m = boot(&[0x51, 0x21]);
        let err = step(&mut m).unwrap_err();
        assert_eq!(
            err,
            Chip8Error::Fault {
                pc: 0x200,
                kind: FaultKind::UnknownInstruction(0x5121)
            }
        );
        assert_eq!(m.registers.pc, 0x200);
    }

    #[test]
    fn test_unknown_instruction_ignored() {
        let quirks = Quirks {
            unknown_opcode: UnknownOpcodePolicy::Ignore,
            ..Quirks::default()
        };
        let m = run_with(&[0x51, 0x21, 0x60, 0x09], quirks, 2);
        assert_eq!(m.registers.pc, 0x204);
        assert_eq!(m.registers.v[0], 9);
    }

    #[test]
    fn test_peek_instruction() {
        let m = boot(&[0x00, 0xe0]);
        assert_eq!(
            m.peek_instruction(),
            Some((0x00e0, Some(Instruction::ClearScreen)))
        );
    }
}
