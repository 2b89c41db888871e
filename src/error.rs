use std::fmt;
use thiserror::Error;

/// Why a running program was stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// `2NNN` issued with every stack slot already in use
    StackOverflow,
    /// `00EE` issued with nothing on the stack
    StackUnderflow,
    /// opcode that decodes to nothing this interpreter knows
    UnknownInstruction(u16),
    /// memory access past the end of RAM while address wrapping is off
    AddressOutOfBounds(usize),
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FaultKind::StackOverflow => write!(f, "stack overflow"),
            FaultKind::StackUnderflow => write!(f, "stack underflow"),
            FaultKind::UnknownInstruction(opcode) => {
                write!(f, "unknown instruction {:#06x}", opcode)
            }
            FaultKind::AddressOutOfBounds(addr) => {
                write!(f, "address {:#06x} out of bounds", addr)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Chip8Error {
    #[error("program of {size} bytes is too large (at most {max} bytes fit)")]
    ProgramTooLarge { size: usize, max: usize },

    /// execution fault, attributed to the address of the faulting instruction
    #[error("halted at {pc:#05x}: {kind}")]
    Fault { pc: u16, kind: FaultKind },
}

impl Chip8Error {
    /// fault kind, if this error came from executing an instruction
    pub fn fault_kind(&self) -> Option<FaultKind> {
        match self {
            Chip8Error::Fault { kind, .. } => Some(*kind),
            Chip8Error::ProgramTooLarge { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Chip8Error>;
