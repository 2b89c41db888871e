use crate::error::FaultKind;
use crate::memory::PROGRAM_ADDR;

/// number of general purpose registers, V0 to VF
pub const REGISTER_COUNT: usize = 16;

/// VF doubles as the carry/borrow/collision flag
pub const FLAG_REGISTER: usize = 0xf;

/// how many return addresses the call stack holds
pub const STACK_DEPTH: usize = 16;

/// Return addresses for nested subroutine calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stack {
    slots: [u16; STACK_DEPTH],
    sp: usize,
}

impl Stack {
    pub fn new() -> Self {
        Stack {
            slots: [0; STACK_DEPTH],
            sp: 0,
        }
    }

    pub fn push(&mut self, addr: u16) -> Result<(), FaultKind> {
        if self.sp == STACK_DEPTH {
            return Err(FaultKind::StackOverflow);
        }
        self.slots[self.sp] = addr;
        self.sp += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Result<u16, FaultKind> {
        if self.sp == 0 {
            return Err(FaultKind::StackUnderflow);
        }
        self.sp -= 1;
        Ok(self.slots[self.sp])
    }

    /// number of return addresses currently held
    pub fn pointer(&self) -> usize {
        self.sp
    }

    /// the live part of the stack, oldest first
    pub fn entries(&self) -> &[u16] {
        &self.slots[..self.sp]
    }
}

impl Default for Stack {
    fn default() -> Self {
        Stack::new()
    }
}

/// Everything the instruction set can address that isn't RAM or a timer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registers {
    pub v: [u8; REGISTER_COUNT],
    pub i: u16,
    pub pc: u16,
    pub stack: Stack,
}

impl Registers {
    pub fn new() -> Self {
        Registers {
            v: [0; REGISTER_COUNT],
            i: 0,
            pc: PROGRAM_ADDR,
            stack: Stack::new(),
        }
    }

    /// set VF, always after the result register so the flag wins when X is F
    pub fn set_flag(&mut self, on: bool) {
        self.v[FLAG_REGISTER] = on as u8;
    }
}

impl Default for Registers {
    fn default() -> Self {
        Registers::new()
    }
}
