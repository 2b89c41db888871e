//! # chip8vm
//!
//! A CHIP-8 interpreter core plus a small terminal host.
//!
//! ## Design
//!
//! * one call to `step` is one instruction; the host owns the clock
//! * timers tick at 60Hz on their own, never as a side effect of stepping
//! * everything historical interpreters disagree on is a named `Quirks` flag
//! * the host only ever sees shared borrows of machine state
//! * faults (stack over/underflow, unknown opcode, bad address) stop the
//!   machine and say where it happened
//!
//! Model
//!
//! ```text
//! Chip8Interpreter
//!  |-- quirks, rng, program image
//!  `-- Machine
//!       |-- Chip8Memory   4K, font at 0x050, program at 0x200
//!       |-- Registers     V0-VF, I, PC, 16-deep stack
//!       |-- FrameBuffer   64x32, XOR sprites, wrap at the edges
//!       |-- Keypad        16 keys, snapshot
//!       `-- Timers        delay + sound
//!
//! Session (host side)
//!  |-- keys, paused, muted, speed
//!  `-- frame loop
//!       |-- interpreter.update_keys(session.keys)
//!       |-- interpreter.step() x speed
//!       |-- interpreter.tick_timers()
//!       `-- draw if redraw, beep if should_beep
//! ```
pub mod cpu;
pub mod display;
pub mod error;
pub mod framebuffer;
pub mod host;
pub mod input;
pub mod instruction;
pub mod interpreter;
pub mod keypad;
pub mod memory;
pub mod quirks;
pub mod registers;
pub mod session;
pub mod sound;
pub mod timer;

pub use cpu::Machine;
pub use error::{Chip8Error, FaultKind, Result};
pub use framebuffer::{FrameBuffer, HEIGHT, WIDTH};
pub use instruction::{disassemble, Instruction};
pub use interpreter::{Chip8Interpreter, StepOutcome};
pub use keypad::KEY_COUNT;
pub use memory::{FONT_ADDR, MAX_PROGRAM_SIZE, PROGRAM_ADDR, RAM_SIZE};
pub use quirks::{Quirks, UnknownOpcodePolicy};
pub use session::Session;
pub use timer::TIMER_HZ;
