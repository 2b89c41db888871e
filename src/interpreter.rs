/// # interpreter
///
/// The one thing a host talks to. It owns the whole machine and hands out
/// nothing but shared borrows, so the host can look at the screen, memory
/// and registers as often as it likes but can only change them by:
///
///  - `update_keys` -- overwrite the keypad snapshot
///  - `step`        -- execute one instruction
///  - `tick_timers` -- count the delay and sound timers down, 60 times a second
///  - `reset`       -- back to the state straight after construction, RNG included
///
/// A sensible host frame is: update keys, step N times, tick timers once,
/// then look at `should_redraw`/`should_beep`.
///
/// Once a step faults the interpreter stays halted, returning the same fault
/// from every `step`, until it's reset or given a new program.
use crate::cpu::Machine;
use crate::error::{Chip8Error, FaultKind};
use crate::framebuffer::FrameBuffer;
use crate::instruction::Instruction;
use crate::keypad::KEY_COUNT;
use crate::quirks::Quirks;
use crate::registers::REGISTER_COUNT;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// What happened during a single successful step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepOutcome {
    /// the screen changed (or was drawn to) and should be re-rendered
    pub redraw: bool,
    /// the sound timer went from zero to non-zero
    pub sound_started: bool,
}

pub struct Chip8Interpreter<R: RngCore = StdRng> {
    machine: Machine,
    program: Vec<u8>,
    quirks: Quirks,
    rng: R,
    /// the generator as it was handed in, so reset replays the same CXNN values
    seed_rng: R,
    fault: Option<Chip8Error>,
}

impl Chip8Interpreter<StdRng> {
    /// load `program` at 0x200 with the default quirks
    pub fn new(program: &[u8]) -> Result<Self, Chip8Error> {
        Chip8Interpreter::with_quirks(program, Quirks::default())
    }

    pub fn with_quirks(program: &[u8], quirks: Quirks) -> Result<Self, Chip8Error> {
        Chip8Interpreter::with_rng(program, quirks, StdRng::from_entropy())
    }
}

impl<R: RngCore + Clone> Chip8Interpreter<R> {
    /// `rng` feeds CXNN; seed it to get repeatable runs
    pub fn with_rng(program: &[u8], quirks: Quirks, rng: R) -> Result<Self, Chip8Error> {
        let machine = Machine::boot(program, &quirks)?;
        debug!("loaded {} byte program, quirks {:?}", program.len(), quirks);
        Ok(Chip8Interpreter {
            machine,
            program: program.to_vec(),
            quirks,
            rng: rng.clone(),
            seed_rng: rng,
            fault: None,
        })
    }

    /// Back to exactly the state construction left things in: same program,
    /// and the random source rewound, so CXNN repeats itself too.
    pub fn reset(&mut self) {
        match Machine::boot(&self.program, &self.quirks) {
            Ok(machine) => self.machine = machine,
            // the held program was accepted once already, so it still fits
            Err(e) => debug_assert!(false, "held program no longer boots: {}", e),
        }
        self.rng = self.seed_rng.clone();
        self.fault = None;
        debug!("reset");
    }

    /// swap in a different program and reset
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), Chip8Error> {
        let machine = Machine::boot(program, &self.quirks)?;
        self.machine = machine;
        self.program = program.to_vec();
        self.rng = self.seed_rng.clone();
        self.fault = None;
        debug!("loaded {} byte program", program.len());
        Ok(())
    }
}

impl<R: RngCore> Chip8Interpreter<R> {

    /// Execute one instruction.
    pub fn step(&mut self) -> Result<StepOutcome, Chip8Error> {
        if let Some(fault) = &self.fault {
            return Err(fault.clone());
        }
        let was_beeping = self.machine.timers.should_beep();
        match self.machine.step(&self.quirks, &mut self.rng) {
            Ok(()) => Ok(StepOutcome {
                redraw: self.machine.redraw,
                sound_started: !was_beeping && self.machine.timers.should_beep(),
            }),
            Err(e) => {
                info!("{}", e);
                self.fault = Some(e.clone());
                Err(e)
            }
        }
    }

    pub fn update_keys(&mut self, keys: [bool; KEY_COUNT]) {
        self.machine.keypad.set(keys);
    }

    /// count both timers down once; call at 60Hz regardless of step rate
    pub fn tick_timers(&mut self) {
        self.machine.timers.tick();
    }

    /// the last step drew to or cleared the screen
    pub fn should_redraw(&self) -> bool {
        self.machine.redraw
    }

    /// the sound timer is running
    pub fn should_beep(&self) -> bool {
        self.machine.timers.should_beep()
    }

    pub fn pc(&self) -> u16 {
        self.machine.registers.pc
    }

    pub fn index(&self) -> u16 {
        self.machine.registers.i
    }

    pub fn sp(&self) -> u8 {
        self.machine.registers.stack.pointer() as u8
    }

    /// live return addresses, oldest first
    pub fn stack(&self) -> &[u16] {
        self.machine.registers.stack.entries()
    }

    pub fn delay_timer(&self) -> u8 {
        self.machine.timers.delay.get()
    }

    pub fn sound_timer(&self) -> u8 {
        self.machine.timers.sound.get()
    }

    /// general register V`n`; only the low nibble of `n` is used
    pub fn v(&self, n: usize) -> u8 {
        self.machine.registers.v[n & 0x0f]
    }

    pub fn registers(&self) -> &[u8; REGISTER_COUNT] {
        &self.machine.registers.v
    }

    /// all 4K of RAM
    pub fn memory(&self) -> &[u8] {
        use crate::memory::MemoryMap;
        self.machine.memory.as_slice()
    }

    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.machine.framebuffer
    }

    pub fn keys(&self) -> &[bool; KEY_COUNT] {
        self.machine.keypad.as_array()
    }

    pub fn quirks(&self) -> &Quirks {
        &self.quirks
    }

    /// the fault that halted this interpreter, if any
    pub fn fault(&self) -> Option<FaultKind> {
        self.fault.as_ref().and_then(Chip8Error::fault_kind)
    }

    /// the full error the last faulting step returned, while still halted
    pub fn halted_on(&self) -> Option<&Chip8Error> {
        self.fault.as_ref()
    }

    pub fn is_halted(&self) -> bool {
        self.fault.is_some()
    }

    /// the whole machine, for snapshot comparisons
    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    /// opcode at PC and what it decodes to, for debugger overlays
    pub fn current_instruction(&self) -> Option<(u16, Option<Instruction>)> {
        self.machine.peek_instruction()
    }
}
